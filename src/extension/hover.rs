use super::Extension;
use crate::color::{color_at, convert_all, ConvertOptions};

impl Extension {
    /// Markdown for the color literal under byte column `col` of `line`.
    pub fn hover(&self, language_id: &str, line: &str, col: usize) -> Option<String> {
        let config = self.config();
        if !config.is_supported_language(language_id) {
            return None;
        }

        let literal = color_at(line, col)?;
        hover_markdown(&literal.text, config.convert_options())
    }
}

/// One `**FORMAT:** value` paragraph per notation.
pub fn hover_markdown(color: &str, options: ConvertOptions) -> Option<String> {
    match convert_all(color, options) {
        Ok(conversions) => Some(
            conversions
                .iter()
                .map(|c| format!("**{}:** {}", c.format, c.value))
                .collect::<Vec<_>>()
                .join("\n\n"),
        ),
        Err(e) => {
            log::debug!("No hover for {:?}: {}", color, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::MemoryState;

    fn extension() -> Extension {
        Extension::activate(Config::default(), Box::new(MemoryState::new())).unwrap()
    }

    #[test]
    fn test_hover_markdown_lists_every_format() {
        let markdown = hover_markdown("#eee", ConvertOptions::default()).unwrap();
        let lines: Vec<&str> = markdown.split("\n\n").collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "**HEX:** #eee");
        assert!(lines[1].starts_with("**OKLCH:** oklch("));
        assert!(lines[9].starts_with("**HWB:** hwb("));
    }

    #[test]
    fn test_hover_markdown_invalid_color() {
        assert_eq!(hover_markdown("rgb(nope)", ConvertOptions::default()), None);
    }

    #[test]
    fn test_hover_on_supported_language() {
        let ext = extension();
        let markdown = ext.hover("css", "  color: white;", 11).unwrap();
        assert!(markdown.contains("**OKLCH:** oklch(100% 0 none)"));
    }

    #[test]
    fn test_hover_outside_literal_or_language() {
        let ext = extension();
        assert_eq!(ext.hover("css", "  color: white;", 2), None);
        assert_eq!(ext.hover("rust", "  color: white;", 11), None);
    }
}
