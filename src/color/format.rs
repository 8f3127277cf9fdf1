use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ColorError;

/// Notations a color can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    Hex,
    #[default]
    Oklch,
    Oklab,
    Lch,
    Lab,
    Rgb,
    Rgba,
    Hsl,
    Hsla,
    Hwb,
}

impl OutputFormat {
    /// Every notation, in the order used for hover text and the format picker.
    pub const ALL: [OutputFormat; 10] = [
        OutputFormat::Hex,
        OutputFormat::Oklch,
        OutputFormat::Oklab,
        OutputFormat::Lch,
        OutputFormat::Lab,
        OutputFormat::Rgb,
        OutputFormat::Rgba,
        OutputFormat::Hsl,
        OutputFormat::Hsla,
        OutputFormat::Hwb,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            OutputFormat::Hex => "HEX",
            OutputFormat::Oklch => "OKLCH",
            OutputFormat::Oklab => "OKLAB",
            OutputFormat::Lch => "LCH",
            OutputFormat::Lab => "LAB",
            OutputFormat::Rgb => "RGB",
            OutputFormat::Rgba => "RGBA",
            OutputFormat::Hsl => "HSL",
            OutputFormat::Hsla => "HSLA",
            OutputFormat::Hwb => "HWB",
        }
    }

    /// Case-insensitive lookup by name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ColorError::UnknownFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(OutputFormat::from_name("oklch"), Some(OutputFormat::Oklch));
        assert_eq!(OutputFormat::from_name("HsLa"), Some(OutputFormat::Hsla));
        assert_eq!(OutputFormat::from_name(" hex "), Some(OutputFormat::Hex));
    }

    #[test]
    fn test_from_name_unknown() {
        assert_eq!(OutputFormat::from_name("cmyk"), None);
        assert!("cmyk".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for format in OutputFormat::ALL {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_default_is_oklch() {
        assert_eq!(OutputFormat::default(), OutputFormat::Oklch);
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&OutputFormat::Oklab).unwrap();
        assert_eq!(json, "\"OKLAB\"");
    }
}
