//! Everything the plugin does, independent of the editor it runs in.

mod commands;
mod decorations;
mod hover;
mod messages;
mod views;

pub use commands::Command;
pub use decorations::{
    modern_color_decorations, run_decoration_loop, ColorDecoration, DecorationBridge,
    DecorationRequest,
};
pub use hover::hover_markdown;
pub use views::{nonce, panel_html, PanelMessage, PanelResources, PanelUpdate, ViewType};

use std::collections::HashSet;
use std::sync::Mutex;

use crate::config::{Config, ConfigOverrides};
use crate::error::Result;
use crate::store::{ColorStore, StateBackend};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct Extension {
    config: Mutex<Config>,
    store: Mutex<ColorStore>,
    resolved_views: Mutex<HashSet<ViewType>>,
}

impl Extension {
    /// Loads the stored lists and records the running version.
    pub fn activate(config: Config, backend: Box<dyn StateBackend>) -> Result<Self> {
        log::info!("Default format: {}", config.default_format());
        log::info!("Precision: {}", config.conversion.precision);
        log::info!("Force alpha: {}", config.conversion.force_alpha);
        log::info!(
            "Show modern color preview: {}",
            config.preview.show_modern_color_preview
        );

        let mut store = ColorStore::new(backend);
        let previous = store.version_info(VERSION);
        if previous != VERSION {
            log::info!("Updated from {} to {}", previous, VERSION);
        }
        store.set_version_info(VERSION)?;

        Ok(Self {
            config: Mutex::new(config),
            store: Mutex::new(store),
            resolved_views: Mutex::new(HashSet::new()),
        })
    }

    pub fn config(&self) -> Config {
        self.config
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn configure(&self, overrides: ConfigOverrides) {
        log::info!("Applying configuration {:?}", overrides);
        self.config
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .apply(overrides);
    }

    pub fn history(&self) -> Vec<String> {
        self.with_store(|store| store.history())
    }

    pub fn favorites(&self) -> Vec<String> {
        self.with_store(|store| store.favorites())
    }

    pub(crate) fn with_store<R>(&self, f: impl FnOnce(&mut ColorStore) -> R) -> R {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut store)
    }

    fn mark_resolved(&self, view: ViewType) {
        self.resolved_views
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(view);
    }

    fn is_resolved(&self, view: ViewType) -> bool {
        self.resolved_views
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&view)
    }
}
