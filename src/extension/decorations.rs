//! Inline swatches for `lab()`, `lch()`, `oklab()` and `oklch()` literals.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::Extension;
use crate::color::{find_modern_colors, parse_color};
use crate::error::Result;
use crate::host::{BufferId, EditorHost, EditorSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorDecoration {
    /// Byte range of the literal in the buffer text.
    pub range: Range<usize>,
    pub literal: String,
    /// `#rrggbb` approximation used to paint the swatch.
    pub swatch: String,
}

/// Swatches for every valid modern color literal in `text`.
pub fn modern_color_decorations(text: &str) -> Vec<ColorDecoration> {
    find_modern_colors(text)
        .into_iter()
        .filter_map(|m| {
            let color = parse_color(&m.text).ok()?;
            Some(ColorDecoration {
                range: m.range,
                swatch: color.to_hex6(),
                literal: m.text,
            })
        })
        .collect()
}

impl Extension {
    /// `None` when the buffer's language is not handled. An empty list
    /// when previews are turned off, so stale swatches get cleared.
    pub fn decorations_for(&self, snapshot: &EditorSnapshot) -> Option<Vec<ColorDecoration>> {
        let config = self.config();
        if !config.is_supported_language(&snapshot.language_id) {
            return None;
        }
        if !config.preview.show_modern_color_preview {
            return Some(Vec::new());
        }
        Some(modern_color_decorations(&snapshot.text))
    }

    pub async fn update_decorations(&self, host: &dyn EditorHost, id: BufferId) -> Result<()> {
        let Some(snapshot) = host.editor(id).await? else {
            return Ok(());
        };
        match self.decorations_for(&snapshot) {
            Some(decorations) => host.set_decorations(id, &decorations).await,
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationRequest {
    /// Active editor changed: update right away.
    Now(BufferId),
    /// Buffer edited: update once edits settle.
    Debounced(BufferId),
}

/// Sending half of the decoration loop.
#[derive(Clone)]
pub struct DecorationBridge {
    request_tx: mpsc::UnboundedSender<DecorationRequest>,
}

impl DecorationBridge {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DecorationRequest>) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        (Self { request_tx }, request_rx)
    }

    pub fn update_now(&self, id: BufferId) {
        let _ = self.request_tx.send(DecorationRequest::Now(id));
    }

    pub fn update_debounced(&self, id: BufferId) {
        let _ = self.request_tx.send(DecorationRequest::Debounced(id));
    }
}

/// Serves decoration requests until every [`DecorationBridge`] is dropped.
///
/// A debounced request fires after `delay` without further requests. Any
/// newer request replaces a pending one.
pub async fn run_decoration_loop(
    extension: Arc<Extension>,
    host: Arc<dyn EditorHost>,
    mut requests: mpsc::UnboundedReceiver<DecorationRequest>,
    delay: Duration,
) {
    let mut pending: Option<BufferId> = None;

    loop {
        let request = match pending {
            Some(id) => tokio::select! {
                request = requests.recv() => request,
                _ = tokio::time::sleep(delay) => {
                    pending = None;
                    update(&extension, host.as_ref(), id).await;
                    continue;
                }
            },
            None => requests.recv().await,
        };

        match request {
            Some(DecorationRequest::Now(id)) => {
                pending = None;
                update(&extension, host.as_ref(), id).await;
            }
            Some(DecorationRequest::Debounced(id)) => {
                log::trace!("Deferring swatches for buffer {}", id);
                pending = Some(id);
            }
            None => break,
        }
    }

    log::debug!("Decoration loop stopped");
}

async fn update(extension: &Extension, host: &dyn EditorHost, id: BufferId) {
    if let Err(e) = extension.update_decorations(host, id).await {
        log::warn!("Failed to update swatches for buffer {}: {}", id, e);
    }
}
