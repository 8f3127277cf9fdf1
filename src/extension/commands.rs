use std::ops::Range;

use super::messages;
use super::views::ViewType;
use super::Extension;
use crate::color::{convert_all, replace_colors, try_convert, ConvertOptions, OutputFormat};
use crate::error::{Error, Result};
use crate::host::{EditorHost, EditorSnapshot, MessageLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ConvertColor,
    AddColorToHistory,
    AddColorToFavorites,
    ClearHistory,
    ClearFavorites,
    RefreshHistory,
    RefreshFavorites,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::ConvertColor,
        Command::AddColorToHistory,
        Command::AddColorToFavorites,
        Command::ClearHistory,
        Command::ClearFavorites,
        Command::RefreshHistory,
        Command::RefreshFavorites,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Command::ConvertColor => "cfc.convertColor",
            Command::AddColorToHistory => "cfc.addColorToHistory",
            Command::AddColorToFavorites => "cfc.addColorToFavorites",
            Command::ClearHistory => "cfc.clearHistory",
            Command::ClearFavorites => "cfc.clearFavorites",
            Command::RefreshHistory => "cfc.refreshHistory",
            Command::RefreshFavorites => "cfc.refreshFavorites",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }
}

impl Extension {
    pub async fn execute_command(
        &self,
        host: &dyn EditorHost,
        id: &str,
        args: &[String],
    ) -> Result<()> {
        let command = Command::from_id(id).ok_or_else(|| Error::UnknownCommand(id.to_string()))?;
        log::debug!("Executing {} {:?}", id, args);

        match command {
            Command::ConvertColor => self.convert_color(host).await,
            Command::AddColorToHistory => self.add_color(host, ViewType::History, args).await,
            Command::AddColorToFavorites => self.add_color(host, ViewType::Favorites, args).await,
            Command::ClearHistory => self.clear_colors(host, ViewType::History).await,
            Command::ClearFavorites => self.clear_colors(host, ViewType::Favorites).await,
            Command::RefreshHistory => self.refresh(host, ViewType::History).await,
            Command::RefreshFavorites => self.refresh(host, ViewType::Favorites).await,
        }
    }

    /// Converts the selection in place, or prompts for a color and copies
    /// one of its notations when nothing is selected.
    pub async fn convert_color(&self, host: &dyn EditorHost) -> Result<()> {
        let config = self.config();
        let format = config.default_format();
        let options = config.convert_options();

        if let Some(editor) = host.active_editor().await? {
            if let (Some(range), Some(selected)) = (editor.selection.clone(), editor.selected_text()) {
                return self
                    .convert_selection(host, &editor, range, selected, format, options)
                    .await;
            }
        }

        self.convert_prompted(host, options).await
    }

    async fn convert_selection(
        &self,
        host: &dyn EditorHost,
        editor: &EditorSnapshot,
        range: Range<usize>,
        selected: &str,
        format: OutputFormat,
        options: ConvertOptions,
    ) -> Result<()> {
        if let Some(converted) = try_convert(selected, format, options) {
            log::debug!("Selection {:?} -> {}", selected, converted);
            self.with_store(|store| store.update_history(&converted, None))?;
            self.refresh(host, ViewType::History).await?;
            return host.replace_range(editor.id, range, &converted).await;
        }

        let mut converted_colors = Vec::new();
        let (text, count) = replace_colors(selected, |literal| {
            let converted = try_convert(literal, format, options)?;
            converted_colors.push(converted.clone());
            Some(converted)
        });

        if count == 0 {
            log::debug!("No convertible color in selection");
            return Ok(());
        }

        log::debug!("Converted {} colors in selection", count);
        self.with_store(|store| {
            converted_colors
                .iter()
                .try_for_each(|color| store.update_history(color, None))
        })?;
        self.refresh(host, ViewType::History).await?;
        host.replace_range(editor.id, range, &text).await
    }

    async fn convert_prompted(&self, host: &dyn EditorHost, options: ConvertOptions) -> Result<()> {
        let Some(input) = host
            .show_input_box(messages::COLOR_INPUT_PLACEHOLDER)
            .await?
        else {
            return Ok(());
        };
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }

        let conversions = match convert_all(input, options) {
            Ok(conversions) => conversions,
            Err(e) => return host.show_message(MessageLevel::Error, &e.to_string()).await,
        };

        if let Some(oklch) = conversions.iter().find(|c| c.format == OutputFormat::Oklch) {
            self.with_store(|store| store.update_history(&oklch.value, None))?;
            self.refresh(host, ViewType::History).await?;
        }

        let items: Vec<String> = conversions
            .iter()
            .map(|c| format!("{}: {}", c.format, c.value))
            .collect();
        let Some(picked) = host
            .show_quick_pick(&items, messages::FORMAT_PICK_PLACEHOLDER)
            .await?
        else {
            return Ok(());
        };

        let value = picked.split_once(": ").map_or(picked.as_str(), |(_, v)| v);
        host.write_clipboard(value).await?;
        host.show_message(MessageLevel::Info, &messages::copied_to_clipboard(&picked))
            .await
    }

    /// Adds the first argument, or a prompted color, to the panel's list.
    async fn add_color(&self, host: &dyn EditorHost, view: ViewType, args: &[String]) -> Result<()> {
        let value = match args.first() {
            Some(value) => value.clone(),
            None => match host
                .show_input_box(messages::COLOR_INPUT_PLACEHOLDER)
                .await?
            {
                Some(value) => value,
                None => return Ok(()),
            },
        };
        self.update_colors(host, view, value.trim(), None).await
    }
}
