//! User-facing strings.

pub const COLOR_INPUT_PLACEHOLDER: &str = "Enter a color (e.g. #3d5a80, rgb(255 200 100))";
pub const FORMAT_PICK_PLACEHOLDER: &str = "Pick a format to copy";
pub const CLEAR_HISTORY_CONFIRMATION: &str = "Clear the colors history?";
pub const CLEAR_FAVORITES_CONFIRMATION: &str = "Clear the favorite colors?";
pub const HISTORY_VIEW_TITLE: &str = "Colors History";
pub const FAVORITES_VIEW_TITLE: &str = "Favorite Colors";
pub const ADD_COLOR: &str = "Add color";
pub const NEW_COLOR_PLACEHOLDER: &str = " #3d5a80, rgb(255, 200, 100), ...";

pub fn invalid_color(value: &str) -> String {
    format!("Invalid color: {}", value)
}

pub fn copied_to_clipboard(picked: &str) -> String {
    format!("Copied {} to clipboard", picked)
}
