//! The editor seam. Extension logic only talks to an [`EditorHost`].

mod handler;
mod neovim;

pub use handler::{run_notification_loop, Notification, PluginHandler};
pub use neovim::{NeovimHost, NvimWriter};

use std::ops::Range;

use async_trait::async_trait;

use crate::error::Result;
use crate::extension::{ColorDecoration, PanelUpdate, ViewType};

/// Host buffer handle.
pub type BufferId = i64;

/// The state of one editor, captured at the time of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSnapshot {
    pub id: BufferId,
    pub language_id: String,
    /// Whole buffer, lines joined with `\n`.
    pub text: String,
    /// Byte range of the visual selection in `text`, if any.
    pub selection: Option<Range<usize>>,
}

impl EditorSnapshot {
    pub fn selected_text(&self) -> Option<&str> {
        self.selection
            .as_ref()
            .and_then(|range| self.text.get(range.clone()))
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// Zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// Position of byte `offset` in `text`.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text[..offset];
        let line = before.matches('\n').count();
        let col = before.rfind('\n').map_or(offset, |nl| offset - nl - 1);
        Self { line, col }
    }

    /// Byte offset of this position in `text`, clamped to the line end.
    pub fn to_offset(self, text: &str) -> usize {
        let mut offset = 0;
        for (index, line) in text.split('\n').enumerate() {
            if index == self.line {
                return offset + self.col.min(line.len());
            }
            offset += line.len() + 1;
        }
        text.len()
    }
}

#[async_trait]
pub trait EditorHost: Send + Sync {
    /// The editor that currently has focus.
    async fn active_editor(&self) -> Result<Option<EditorSnapshot>>;

    async fn editor(&self, id: BufferId) -> Result<Option<EditorSnapshot>>;

    /// Replaces a byte range of the buffer.
    async fn replace_range(&self, id: BufferId, range: Range<usize>, text: &str) -> Result<()>;

    /// Inserts text at the cursor of the active editor.
    async fn insert_text(&self, text: &str) -> Result<()>;

    /// Returns `None` when the prompt was cancelled.
    async fn show_input_box(&self, placeholder: &str) -> Result<Option<String>>;

    async fn show_quick_pick(&self, items: &[String], placeholder: &str)
        -> Result<Option<String>>;

    async fn write_clipboard(&self, text: &str) -> Result<()>;

    async fn show_message(&self, level: MessageLevel, message: &str) -> Result<()>;

    /// Modal Yes/No question.
    async fn confirm(&self, message: &str) -> Result<bool>;

    /// Replaces every swatch shown in buffer `id`.
    async fn set_decorations(&self, id: BufferId, decorations: &[ColorDecoration]) -> Result<()>;

    /// Brings the panel into view and hands it an update.
    async fn post_panel_message(&self, view: ViewType, update: &PanelUpdate) -> Result<()>;
}
