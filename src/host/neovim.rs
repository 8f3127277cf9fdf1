use std::ops::Range;

use async_trait::async_trait;
use futures_util::io::AsyncWrite;
use nvim_rs::compat::tokio::Compat;
use nvim_rs::{Neovim, Value};

use super::{BufferId, EditorHost, EditorSnapshot, MessageLevel, Position};
use crate::color::parse_color;
use crate::error::{Error, Result};
use crate::extension::{ColorDecoration, PanelUpdate, ViewType};

/// Writer of the stdio channel to the Neovim that started us.
pub type NvimWriter = Compat<tokio::fs::File>;

// `vim.b.cfc_selection` is set by the Lua side right before a ranged command
// and consumed here: {start_row, start_col, end_row, end_col}, 0-based, end
// exclusive.
const SNAPSHOT_LUA: &str = r#"
local buf = ...
if buf == 0 then buf = vim.api.nvim_get_current_buf() end
if not vim.api.nvim_buf_is_valid(buf) then return vim.NIL end
local selection = vim.b[buf].cfc_selection
vim.b[buf].cfc_selection = nil
return {
  id = buf,
  filetype = vim.bo[buf].filetype,
  lines = vim.api.nvim_buf_get_lines(buf, 0, -1, false),
  selection = selection or vim.NIL,
}
"#;

const REPLACE_LUA: &str = r#"
local buf, srow, scol, erow, ecol, text = ...
vim.api.nvim_buf_set_text(buf, srow, scol, erow, ecol, vim.split(text, "\n", { plain = true }))
"#;

const INSERT_LUA: &str = r#"
local text = ...
vim.api.nvim_put(vim.split(text, "\n", { plain = true }), "c", true, true)
"#;

const QUICK_PICK_LUA: &str = r#"
local prompt, items = ...
local choices = { prompt }
for i, item in ipairs(items) do
  choices[#choices + 1] = string.format("%d. %s", i, item)
end
return vim.fn.inputlist(choices)
"#;

const DECORATIONS_LUA: &str = r##"
local buf, items = ...
if not vim.api.nvim_buf_is_valid(buf) then return end
local ns = vim.api.nvim_create_namespace("cfc_swatches")
vim.api.nvim_buf_clear_namespace(buf, ns, 0, -1)
local border = vim.o.background == "dark" and "#eeeeee" or "#000000"
for _, item in ipairs(items) do
  local group = "CfcSwatch_" .. item.color:sub(2)
  vim.api.nvim_set_hl(0, group, { bg = item.color, fg = border })
  pcall(vim.api.nvim_buf_set_extmark, buf, ns, item.row, item.col, {
    virt_text = { { " ", group } },
    virt_text_pos = "inline",
  })
end
"##;

// Swatches travel with the update so the panel never has to call back into
// the plugin while this chunk runs.
const PANEL_LUA: &str = r#"
local view, update, swatches = ...
require("cfc").panel_update(view, vim.json.decode(update), swatches)
"#;

/// [`EditorHost`] backed by a Neovim instance on the other end of `W`.
pub struct NeovimHost<W = NvimWriter>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    neovim: Neovim<W>,
}

impl<W> NeovimHost<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    pub fn new(neovim: Neovim<W>) -> Self {
        Self { neovim }
    }

    async fn lua(&self, code: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.neovim.exec_lua(code, args).await?)
    }

    async fn snapshot(&self, id: BufferId) -> Result<Option<EditorSnapshot>> {
        let value = self.lua(SNAPSHOT_LUA, vec![Value::from(id)]).await?;
        if value.is_nil() {
            return Ok(None);
        }
        parse_snapshot(&value).map(Some)
    }
}

#[async_trait]
impl<W> EditorHost for NeovimHost<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    async fn active_editor(&self) -> Result<Option<EditorSnapshot>> {
        self.snapshot(0).await
    }

    async fn editor(&self, id: BufferId) -> Result<Option<EditorSnapshot>> {
        self.snapshot(id).await
    }

    async fn replace_range(&self, id: BufferId, range: Range<usize>, text: &str) -> Result<()> {
        let Some(snapshot) = self.snapshot(id).await? else {
            return Err(Error::Host(format!("Buffer {} is gone", id)));
        };
        let start = Position::from_offset(&snapshot.text, range.start);
        let end = Position::from_offset(&snapshot.text, range.end);

        log::debug!("Replacing {:?}..{:?} in buffer {}", start, end, id);
        self.lua(
            REPLACE_LUA,
            vec![
                Value::from(id),
                Value::from(start.line as i64),
                Value::from(start.col as i64),
                Value::from(end.line as i64),
                Value::from(end.col as i64),
                Value::from(text),
            ],
        )
        .await?;
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> Result<()> {
        self.lua(INSERT_LUA, vec![Value::from(text)]).await?;
        Ok(())
    }

    async fn show_input_box(&self, placeholder: &str) -> Result<Option<String>> {
        let prompt = format!("{}: ", placeholder);
        let value = self
            .neovim
            .call_function("input", vec![Value::from(prompt.as_str())])
            .await?;
        Ok(value
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    async fn show_quick_pick(
        &self,
        items: &[String],
        placeholder: &str,
    ) -> Result<Option<String>> {
        let choices = items.iter().map(|item| Value::from(item.as_str())).collect();
        let picked = self
            .lua(
                QUICK_PICK_LUA,
                vec![Value::from(placeholder), Value::Array(choices)],
            )
            .await?;

        let index = picked.as_i64().unwrap_or(0);
        if index < 1 {
            return Ok(None);
        }
        Ok(items.get(index as usize - 1).cloned())
    }

    async fn write_clipboard(&self, text: &str) -> Result<()> {
        self.neovim
            .call_function("setreg", vec![Value::from("+"), Value::from(text)])
            .await?;
        Ok(())
    }

    async fn show_message(&self, level: MessageLevel, message: &str) -> Result<()> {
        let level = match level {
            MessageLevel::Info => "INFO",
            MessageLevel::Warning => "WARN",
            MessageLevel::Error => "ERROR",
        };
        self.lua(
            "local msg, level = ...; vim.notify(msg, vim.log.levels[level], { title = 'cfc' })",
            vec![Value::from(message), Value::from(level)],
        )
        .await?;
        Ok(())
    }

    async fn confirm(&self, message: &str) -> Result<bool> {
        let choice = self
            .neovim
            .call_function(
                "confirm",
                vec![
                    Value::from(message),
                    Value::from("&Yes\n&No"),
                    Value::from(2),
                    Value::from("Warning"),
                ],
            )
            .await?;
        Ok(choice.as_i64() == Some(1))
    }

    async fn set_decorations(&self, id: BufferId, decorations: &[ColorDecoration]) -> Result<()> {
        let Some(snapshot) = self.snapshot(id).await? else {
            return Ok(());
        };

        let items = decorations
            .iter()
            .map(|decoration| {
                let start = Position::from_offset(&snapshot.text, decoration.range.start);
                Value::Map(vec![
                    (Value::from("row"), Value::from(start.line as i64)),
                    (Value::from("col"), Value::from(start.col as i64)),
                    (Value::from("color"), Value::from(decoration.swatch.as_str())),
                ])
            })
            .collect();

        log::trace!("Setting {} swatches on buffer {}", decorations.len(), id);
        self.lua(DECORATIONS_LUA, vec![Value::from(id), Value::Array(items)])
            .await?;
        Ok(())
    }

    async fn post_panel_message(&self, view: ViewType, update: &PanelUpdate) -> Result<()> {
        let json = serde_json::to_string(update).map_err(Error::PanelUpdate)?;
        self.lua(
            PANEL_LUA,
            vec![
                Value::from(view.id()),
                Value::from(json.as_str()),
                swatch_map(update.colors()),
            ],
        )
        .await?;
        Ok(())
    }
}

/// `{color: "#rrggbb"}` for every entry that parses as a color.
pub(crate) fn swatch_map(colors: &[String]) -> Value {
    let entries = colors
        .iter()
        .filter_map(|color| {
            let swatch = parse_color(color).ok()?.to_hex6();
            Some((Value::from(color.as_str()), Value::from(swatch)))
        })
        .collect();
    Value::Map(entries)
}

fn map_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .as_map()?
        .iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

fn parse_snapshot(value: &Value) -> Result<EditorSnapshot> {
    let malformed = || Error::Host(format!("Malformed buffer snapshot: {}", value));

    let id = map_get(value, "id")
        .and_then(Value::as_i64)
        .ok_or_else(malformed)?;
    let language_id = map_get(value, "filetype")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let lines: Vec<&str> = map_get(value, "lines")
        .and_then(Value::as_array)
        .ok_or_else(malformed)?
        .iter()
        .map(|line| line.as_str().unwrap_or_default())
        .collect();
    let text = lines.join("\n");

    let selection = map_get(value, "selection")
        .and_then(Value::as_array)
        .and_then(|bounds| {
            let bounds: Vec<usize> = bounds
                .iter()
                .filter_map(Value::as_u64)
                .map(|n| n as usize)
                .collect();
            match bounds.as_slice() {
                [start_row, start_col, end_row, end_col] => {
                    let start = Position {
                        line: *start_row,
                        col: *start_col,
                    }
                    .to_offset(&text);
                    let end = Position {
                        line: *end_row,
                        col: *end_col,
                    }
                    .to_offset(&text);
                    let (start, end) = (start.min(end), start.max(end));
                    Some(floor_char_boundary(&text, start)..ceil_char_boundary(&text, end))
                }
                _ => None,
            }
        });

    Ok(EditorSnapshot {
        id,
        language_id,
        text,
        selection,
    })
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn ceil_char_boundary(text: &str, mut offset: usize) -> usize {
    while offset < text.len() && !text.is_char_boundary(offset) {
        offset += 1;
    }
    offset
}
