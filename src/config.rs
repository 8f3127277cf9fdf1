use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::{ConvertOptions, OutputFormat};
use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_PRECISION, MAX_PRECISION, STATE_FILE_NAME,
    SUPPORTED_LANGUAGES,
};

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub conversion: ConversionSettings,
    #[serde(default)]
    pub preview: PreviewSettings,
    #[serde(default)]
    pub languages: LanguageSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConversionSettings {
    pub default_format: String,
    pub precision: u32,
    pub force_alpha: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PreviewSettings {
    pub show_modern_color_preview: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LanguageSettings {
    pub supported: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub path: Option<PathBuf>,
}

/// Settings pushed by the editor at runtime. Absent fields leave the current
/// value untouched.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub default_format: Option<String>,
    pub precision: Option<u32>,
    pub force_alpha: Option<bool>,
    pub show_modern_color_preview: Option<bool>,
    pub supported_languages: Option<Vec<String>>,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::default().name().to_string(),
            precision: DEFAULT_PRECISION,
            force_alpha: false,
        }
    }
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            show_modern_color_preview: true,
        }
    }
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            supported: SUPPORTED_LANGUAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Config::default(),
        }
    }

    pub fn load_from(config_path: &Path) -> Self {
        if !config_path.exists() {
            return Config::default();
        }

        let content = match fs::read_to_string(config_path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to read config file: {}", e);
                return Config::default();
            }
        };

        match toml::from_str::<Config>(&content) {
            Ok(mut config) => {
                config.clamp_precision();
                config
            }
            Err(e) => {
                log::warn!("Failed to parse config file: {}", e);
                Config::default()
            }
        }
    }

    /// The configured target format. Unknown names fall back to OKLCH.
    pub fn default_format(&self) -> OutputFormat {
        match OutputFormat::from_name(&self.conversion.default_format) {
            Some(format) => format,
            None => {
                log::warn!(
                    "Unknown default format {:?}, using {}",
                    self.conversion.default_format,
                    OutputFormat::default()
                );
                OutputFormat::default()
            }
        }
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            precision: self.conversion.precision,
            alpha: self.conversion.force_alpha,
        }
    }

    pub fn is_supported_language(&self, language_id: &str) -> bool {
        self.languages
            .supported
            .iter()
            .any(|lang| lang.eq_ignore_ascii_case(language_id))
    }

    /// Where the history and favorites lists are persisted.
    pub fn state_path(&self) -> Option<PathBuf> {
        self.storage.path.clone().or_else(|| {
            dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join(STATE_FILE_NAME))
        })
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(format) = overrides.default_format {
            self.conversion.default_format = format;
        }
        if let Some(precision) = overrides.precision {
            self.conversion.precision = precision;
            self.clamp_precision();
        }
        if let Some(force_alpha) = overrides.force_alpha {
            self.conversion.force_alpha = force_alpha;
        }
        if let Some(show) = overrides.show_modern_color_preview {
            self.preview.show_modern_color_preview = show;
        }
        if let Some(languages) = overrides.supported_languages {
            self.languages.supported = languages;
        }
    }

    fn clamp_precision(&mut self) {
        if self.conversion.precision > MAX_PRECISION {
            log::warn!(
                "Precision {} is too high, using {}",
                self.conversion.precision,
                MAX_PRECISION
            );
            self.conversion.precision = MAX_PRECISION;
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
        Some(
            PathBuf::from(config_dir)
                .join(APP_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        )
    } else {
        dirs::home_dir().map(|home| {
            home.join(".config")
                .join(APP_DIR_NAME)
                .join(CONFIG_FILE_NAME)
        })
    }
}
