//! Color parsing, detection and conversion.

mod convert;
mod detect;
mod format;
mod parse;
mod validate;

pub use convert::{
    convert, convert_all, format_color, round_to_precision, try_convert, ConvertOptions,
    ConvertedColor,
};
pub use detect::{color_at, find_colors, replace_colors, ColorMatch};
pub use format::OutputFormat;
pub use parse::{is_valid_color, parse_color, Rgba};
pub use validate::{find_modern_colors, is_valid_lab_lch_oklab_oklch};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("Invalid color format: {0}")]
    InvalidColorFormat(String),

    #[error("Unknown color format: {0}")]
    UnknownFormat(String),
}
