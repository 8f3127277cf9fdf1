//! History and favorites panels: message protocol and page assembly.

use std::collections::BTreeMap;

use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::messages;
use super::Extension;
use crate::color::is_valid_color;
use crate::error::{Error, Result};
use crate::host::{EditorHost, MessageLevel};

const NONCE_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViewType {
    #[serde(rename = "cfc.colorsHistoryView")]
    History,
    #[serde(rename = "cfc.colorsFavoritesView")]
    Favorites,
}

impl ViewType {
    pub const ALL: [ViewType; 2] = [ViewType::History, ViewType::Favorites];

    pub const fn id(self) -> &'static str {
        match self {
            ViewType::History => "cfc.colorsHistoryView",
            ViewType::Favorites => "cfc.colorsFavoritesView",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.id() == id)
    }

    pub const fn title(self) -> &'static str {
        match self {
            ViewType::History => messages::HISTORY_VIEW_TITLE,
            ViewType::Favorites => messages::FAVORITES_VIEW_TITLE,
        }
    }
}

/// Messages posted by a panel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelMessage {
    ColorSelected {
        value: String,
    },
    HistoryColorAdded {
        value: String,
    },
    FavoritesColorAdded {
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    HistoryColorUpdated {
        value: String,
        old_value: String,
    },
    #[serde(rename_all = "camelCase")]
    FavoritesColorUpdated {
        value: String,
        old_value: String,
    },
    HistoryRefreshRequested,
    FavoritesRefreshRequested,
}

/// Messages posted to a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PanelUpdate {
    RefreshHistory(Vec<String>),
    RefreshFavorites(Vec<String>),
}

impl PanelUpdate {
    pub fn colors(&self) -> &[String] {
        match self {
            PanelUpdate::RefreshHistory(colors) | PanelUpdate::RefreshFavorites(colors) => colors,
        }
    }
}

impl Extension {
    /// Called when a panel is opened. Later refreshes are only pushed to
    /// panels that were resolved at least once.
    pub fn resolve_view(&self, view: ViewType) -> Vec<String> {
        log::debug!("Resolved {}", view.id());
        self.mark_resolved(view);
        self.colors(view)
    }

    pub async fn handle_panel_json(
        &self,
        host: &dyn EditorHost,
        view: ViewType,
        json: &str,
    ) -> Result<()> {
        let message = serde_json::from_str(json).map_err(Error::PanelMessage)?;
        self.handle_panel_message(host, view, message).await
    }

    pub async fn handle_panel_message(
        &self,
        host: &dyn EditorHost,
        view: ViewType,
        message: PanelMessage,
    ) -> Result<()> {
        log::debug!("{} posted {:?}", view.id(), message);

        match message {
            PanelMessage::ColorSelected { value } => host.insert_text(&value).await,
            PanelMessage::HistoryColorAdded { value } => {
                self.update_colors(host, ViewType::History, &value, None).await
            }
            PanelMessage::FavoritesColorAdded { value } => {
                self.update_colors(host, ViewType::Favorites, &value, None)
                    .await
            }
            PanelMessage::HistoryColorUpdated { value, old_value } => {
                self.update_colors(host, ViewType::History, &value, Some(&old_value))
                    .await
            }
            PanelMessage::FavoritesColorUpdated { value, old_value } => {
                self.update_colors(host, ViewType::Favorites, &value, Some(&old_value))
                    .await
            }
            PanelMessage::HistoryRefreshRequested => self.refresh(host, ViewType::History).await,
            PanelMessage::FavoritesRefreshRequested => {
                self.refresh(host, ViewType::Favorites).await
            }
        }
    }

    /// Adds, replaces or (with an empty `value`) deletes an entry of the
    /// panel's list. Non-empty values must be valid colors.
    pub async fn update_colors(
        &self,
        host: &dyn EditorHost,
        view: ViewType,
        value: &str,
        old_value: Option<&str>,
    ) -> Result<()> {
        if !value.is_empty() && !is_valid_color(value) {
            log::debug!("Rejected {:?} for {}", value, view.id());
            return host
                .show_message(MessageLevel::Warning, &messages::invalid_color(value))
                .await;
        }

        self.with_store(|store| match view {
            ViewType::History => store.update_history(value, old_value),
            ViewType::Favorites => store.update_favorites(value, old_value),
        })?;
        self.refresh(host, view).await
    }

    /// Pushes the current list to the panel if it has been opened.
    pub async fn refresh(&self, host: &dyn EditorHost, view: ViewType) -> Result<()> {
        if !self.is_resolved(view) {
            return Ok(());
        }
        host.post_panel_message(view, &self.panel_update(view)).await
    }

    pub fn panel_update(&self, view: ViewType) -> PanelUpdate {
        match view {
            ViewType::History => PanelUpdate::RefreshHistory(self.colors(view)),
            ViewType::Favorites => PanelUpdate::RefreshFavorites(self.colors(view)),
        }
    }

    /// Empties the list after a Yes/No confirmation. The panel is refreshed
    /// either way.
    pub async fn clear_colors(&self, host: &dyn EditorHost, view: ViewType) -> Result<()> {
        let question = match view {
            ViewType::History => messages::CLEAR_HISTORY_CONFIRMATION,
            ViewType::Favorites => messages::CLEAR_FAVORITES_CONFIRMATION,
        };

        if host.confirm(question).await? {
            log::info!("Clearing {}", view.id());
            self.with_store(|store| match view {
                ViewType::History => store.clear_history(),
                ViewType::Favorites => store.clear_favorites(),
            })?;
        }
        self.refresh(host, view).await
    }

    fn colors(&self, view: ViewType) -> Vec<String> {
        self.with_store(|store| match view {
            ViewType::History => store.history(),
            ViewType::Favorites => store.favorites(),
        })
    }
}

/// Where a panel page loads its assets from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelResources {
    /// Source allowed for stylesheets by the content security policy.
    pub csp_source: String,
    pub style_uri: String,
    pub script_uri: String,
}

impl PanelResources {
    /// Assets shipped in `resources/` next to the crate.
    pub fn bundled() -> Self {
        let root = concat!(env!("CARGO_MANIFEST_DIR"), "/resources");
        Self {
            csp_source: "file:".to_string(),
            style_uri: format!("file://{}/css/main.css", root),
            script_uri: format!("file://{}/js/panel.js", root),
        }
    }
}

/// Builds the page for `view`. Only the host's stylesheets and scripts
/// carrying a fresh nonce are allowed to run.
pub fn panel_html(view: ViewType, resources: &PanelResources) -> String {
    let nonce = nonce();

    let mut i18n = BTreeMap::new();
    if view == ViewType::Favorites {
        i18n.insert("addColor", messages::ADD_COLOR);
        i18n.insert("newColorPlaceholder", messages::NEW_COLOR_PLACEHOLDER);
    }
    let i18n = serde_json::to_string(&i18n)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    let form = match view {
        ViewType::History => "",
        ViewType::Favorites => "\n    <form id=\"add-color-form\"></form>",
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta http-equiv="Content-Security-Policy" content="default-src 'none'; style-src {csp}; script-src 'nonce-{nonce}';">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <link href="{style}" rel="stylesheet">
    <title>{title}</title>
</head>
<body data-view="{view}">
    <ul class="color-list"></ul>{form}
    <script nonce="{nonce}">const i18nMessages = {i18n};</script>
    <script nonce="{nonce}" src="{script}"></script>
</body>
</html>
"#,
        csp = escape_html(&resources.csp_source),
        nonce = nonce,
        style = escape_html(&resources.style_uri),
        title = escape_html(view.title()),
        view = view.id(),
        form = form,
        i18n = i18n,
        script = escape_html(&resources.script_uri),
    )
}

/// 32 random alphanumerics.
pub fn nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
