use std::time::Duration;

// Storage keys
pub const VERSION_KEY: &str = "cfc.version";
pub const HISTORY_KEY: &str = "cfc.history";
pub const FAVORITES_KEY: &str = "cfc.favorites";

/// Maximum number of entries kept in the history and favorites lists.
pub const MAX_STORED_COLORS: usize = 100;

pub const DEFAULT_PRECISION: u32 = 4;

/// Significant digits beyond this are noise in an `f64`.
pub const MAX_PRECISION: u32 = 15;

/// Delay applied to swatch updates triggered by document edits.
pub const DECORATION_DEBOUNCE: Duration = Duration::from_millis(500);

pub const APP_DIR_NAME: &str = "cfc-nvim";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATE_FILE_NAME: &str = "state.json";

/// Filetypes the extension reacts to.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "css",
    "scss",
    "less",
    "javascript",
    "typescript",
    "html",
    "twig",
    "vue",
    "tsx",
    "typescriptreact",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_are_namespaced() {
        for key in [VERSION_KEY, HISTORY_KEY, FAVORITES_KEY] {
            assert!(key.starts_with("cfc."));
        }
    }

    #[test]
    fn test_supported_languages_include_stylesheets() {
        assert!(SUPPORTED_LANGUAGES.contains(&"css"));
        assert!(SUPPORTED_LANGUAGES.contains(&"scss"));
        assert!(SUPPORTED_LANGUAGES.contains(&"less"));
    }
}
