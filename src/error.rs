use std::path::PathBuf;

use crate::color::ColorError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Color(#[from] ColorError),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid panel message: {0}")]
    PanelMessage(#[source] serde_json::Error),

    #[error("Failed to encode panel update: {0}")]
    PanelUpdate(#[source] serde_json::Error),

    #[error("Failed to access storage at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed storage data: {0}")]
    StorageFormat(#[from] serde_json::Error),

    #[error("Editor host error: {0}")]
    Host(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Box<nvim_rs::error::CallError>> for Error {
    fn from(err: Box<nvim_rs::error::CallError>) -> Self {
        Error::Host(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_error_message_is_preserved() {
        let err = Error::from(ColorError::InvalidColorFormat("nope".into()));
        assert_eq!(err.to_string(), "Invalid color format: nope");
    }

    #[test]
    fn test_unknown_command_message() {
        let err = Error::UnknownCommand("cfc.bogus".into());
        assert_eq!(err.to_string(), "Unknown command: cfc.bogus");
    }

    #[test]
    fn test_panel_update_error_is_not_a_storage_error() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = Error::PanelUpdate(source);
        assert!(err.to_string().starts_with("Failed to encode panel update"));
    }
}
