use std::sync::Arc;

use async_trait::async_trait;
use futures_util::io::AsyncWrite;
use nvim_rs::{Handler, Neovim, Value};
use tokio::sync::mpsc;

use super::neovim::{swatch_map, NeovimHost, NvimWriter};
use super::BufferId;
use crate::config::ConfigOverrides;
use crate::extension::{DecorationBridge, Extension, ViewType};

/// A notification that needs to talk back to Neovim, queued for
/// [`run_notification_loop`].
pub struct Notification<W = NvimWriter>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    pub name: String,
    pub args: Vec<Value>,
    pub neovim: Neovim<W>,
}

/// Routes msgpack-rpc traffic from the Lua side into the [`Extension`].
///
/// nvim-rs reads nothing else while `handle_notify` runs, so notifications
/// only enqueue work and return.
pub struct PluginHandler<W = NvimWriter>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    extension: Arc<Extension>,
    decorations: DecorationBridge,
    notification_tx: mpsc::UnboundedSender<Notification<W>>,
}

impl<W> Clone for PluginHandler<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    fn clone(&self) -> Self {
        Self {
            extension: self.extension.clone(),
            decorations: self.decorations.clone(),
            notification_tx: self.notification_tx.clone(),
        }
    }
}

impl<W> PluginHandler<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    pub fn new(
        extension: Arc<Extension>,
        decorations: DecorationBridge,
    ) -> (Self, mpsc::UnboundedReceiver<Notification<W>>) {
        let (notification_tx, notification_rx) = mpsc::unbounded_channel();
        let handler = Self {
            extension,
            decorations,
            notification_tx,
        };
        (handler, notification_rx)
    }

    fn dispatch_request(&self, name: &str, args: &[Value]) -> Result<Value, Value> {
        match name {
            "hover" => {
                let (Some(language_id), Some(line), Some(col)) = (
                    args.first().and_then(Value::as_str),
                    args.get(1).and_then(Value::as_str),
                    args.get(2).and_then(Value::as_u64),
                ) else {
                    return Err(Value::from("hover expects (filetype, line, col)"));
                };
                Ok(self
                    .extension
                    .hover(language_id, line, col as usize)
                    .map_or(Value::Nil, |markdown| Value::from(markdown.as_str())))
            }
            "resolveView" => {
                let Some(view) = args
                    .first()
                    .and_then(Value::as_str)
                    .and_then(ViewType::from_id)
                else {
                    return Err(Value::from("resolveView expects a view id"));
                };
                let colors = self
                    .extension
                    .resolve_view(view)
                    .into_iter()
                    .map(Value::from)
                    .collect();
                Ok(Value::Array(colors))
            }
            "swatches" => {
                let colors: Vec<String> = args
                    .first()
                    .and_then(Value::as_array)
                    .map(|list| {
                        list.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(swatch_map(&colors))
            }
            _ => Err(Value::from(format!("Unknown request: {}", name))),
        }
    }
}

#[async_trait]
impl<W> Handler for PluginHandler<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    type Writer = W;

    async fn handle_notify(&self, name: String, args: Vec<Value>, neovim: Neovim<Self::Writer>) {
        log::trace!("Notification: {} {:?}", name, args);

        match name.as_str() {
            "activeEditorChanged" => {
                if let Some(id) = buffer_arg(&args) {
                    self.decorations.update_now(id);
                }
            }
            "documentChanged" => {
                if let Some(id) = buffer_arg(&args) {
                    self.decorations.update_debounced(id);
                }
            }
            "configure" => {
                let Some(json) = args.first().and_then(Value::as_str) else {
                    return;
                };
                match serde_json::from_str::<ConfigOverrides>(json) {
                    Ok(overrides) => self.extension.configure(overrides),
                    Err(e) => log::warn!("Ignoring malformed configuration: {}", e),
                }
            }
            "command" | "panel" => {
                let notification = Notification { name, args, neovim };
                if self.notification_tx.send(notification).is_err() {
                    log::warn!("Notification loop is gone, dropping notification");
                }
            }
            _ => {
                log::debug!("Unhandled notification: {}", name);
            }
        }
    }

    async fn handle_request(
        &self,
        name: String,
        args: Vec<Value>,
        _neovim: Neovim<Self::Writer>,
    ) -> Result<Value, Value> {
        log::debug!("Request: {} {:?}", name, args);

        self.dispatch_request(&name, &args)
    }
}

/// Runs queued `command` and `panel` notifications one at a time, in the
/// order Neovim sent them, until every [`PluginHandler`] is dropped.
pub async fn run_notification_loop<W>(
    extension: Arc<Extension>,
    mut notifications: mpsc::UnboundedReceiver<Notification<W>>,
) where
    W: AsyncWrite + Send + Unpin + 'static,
{
    while let Some(Notification { name, args, neovim }) = notifications.recv().await {
        let host = NeovimHost::new(neovim);
        dispatch_notify(&extension, &host, &name, &args).await;
    }

    log::debug!("Notification loop stopped");
}

async fn dispatch_notify<W>(extension: &Extension, host: &NeovimHost<W>, name: &str, args: &[Value])
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    match name {
        "command" => {
            let Some(command) = args.first().and_then(Value::as_str) else {
                log::warn!("command notification without an id: {:?}", args);
                return;
            };
            let command_args: Vec<String> = args
                .get(1)
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            if let Err(e) = extension.execute_command(host, command, &command_args).await {
                log::error!("Command {} failed: {}", command, e);
            }
        }
        "panel" => {
            let (Some(view), Some(json)) = (
                args.first().and_then(Value::as_str).and_then(ViewType::from_id),
                args.get(1).and_then(Value::as_str),
            ) else {
                log::warn!("Malformed panel notification: {:?}", args);
                return;
            };
            if let Err(e) = extension.handle_panel_json(host, view, json).await {
                log::error!("Panel message for {} failed: {}", view.id(), e);
            }
        }
        _ => log::debug!("Unhandled queued notification: {}", name),
    }
}

fn buffer_arg(args: &[Value]) -> Option<BufferId> {
    args.first().and_then(Value::as_i64)
}
