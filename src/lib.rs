pub mod cli;
pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod extension;
pub mod host;
pub mod store;

use std::sync::Arc;

use log::info;

use crate::config::Config;
use crate::constants::DECORATION_DEBOUNCE;
use crate::error::Result;
use crate::extension::{run_decoration_loop, DecorationBridge, Extension};
use crate::host::{run_notification_loop, EditorHost, NeovimHost, PluginHandler};
use crate::store::{JsonFileState, MemoryState, StateBackend};

/// Opens the persisted state, or an in-memory one when no data directory
/// can be determined.
pub fn open_state(config: &Config) -> Box<dyn StateBackend> {
    match config.state_path() {
        Some(path) => {
            log::debug!("Using state file {}", path.display());
            Box::new(JsonFileState::open(path))
        }
        None => {
            log::warn!("No data directory found, history and favorites will not persist");
            Box::new(MemoryState::new())
        }
    }
}

/// Serves the plugin to the Neovim instance on the other end of stdio until
/// it closes the channel.
pub async fn serve(config: Config) -> Result<()> {
    let backend = open_state(&config);
    let extension = Arc::new(Extension::activate(config, backend)?);

    let (decorations, requests) = DecorationBridge::channel();
    let (handler, notifications) = PluginHandler::new(extension.clone(), decorations);

    let (neovim, io_handle) = nvim_rs::create::tokio::new_parent(handler).await?;
    info!("Attached to Neovim");

    tokio::spawn(run_notification_loop(extension.clone(), notifications));

    let host: Arc<dyn EditorHost> = Arc::new(NeovimHost::new(neovim));
    tokio::spawn(run_decoration_loop(
        extension,
        host,
        requests,
        DECORATION_DEBOUNCE,
    ));

    match io_handle.await {
        Ok(Ok(())) => info!("Neovim closed the channel"),
        Ok(Err(e)) => info!("Neovim IO loop ended: {}", e),
        Err(e) => log::error!("Neovim IO task failed: {}", e),
    }
    Ok(())
}
