use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::color::{
    convert, convert_all, find_colors, is_valid_color, ColorError, ConvertOptions, OutputFormat,
};
use crate::config::Config;
use crate::error::Result;
use crate::extension::{panel_html, PanelResources, ViewType};
use crate::open_state;
use crate::store::ColorStore;

#[derive(Parser)]
#[command(name = "cfc-nvim")]
#[command(version)]
#[command(about = "CSS color format converter for Neovim", long_about = None)]
#[command(after_help = "\
Without a subcommand, cfc-nvim serves the Neovim plugin over stdio.
Start it from Neovim with `require('cfc').setup()`.

LOGGING:
    Logs go to stderr. Set RUST_LOG=debug for more detail.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file to read instead of $XDG_CONFIG_HOME/cfc-nvim/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Convert a color to another notation
    Convert {
        color: String,
        /// Target notation (defaults to the configured one)
        #[arg(short, long, value_parser = parse_format)]
        format: Option<OutputFormat>,
        /// Significant digits per component
        #[arg(short, long)]
        precision: Option<u32>,
        /// Always print the alpha channel
        #[arg(long)]
        alpha: bool,
        /// Print every notation
        #[arg(long, conflicts_with = "format")]
        all: bool,
    },
    /// List the color literals of a file with their conversion
    Scan {
        file: PathBuf,
        #[arg(short, long, value_parser = parse_format)]
        format: Option<OutputFormat>,
    },
    /// Show or edit the colors history
    History {
        #[command(subcommand)]
        action: Option<ListAction>,
    },
    /// Show or edit the favorite colors
    Favorites {
        #[command(subcommand)]
        action: Option<ListAction>,
    },
    /// Print the HTML page of a panel
    Panel {
        #[arg(value_enum)]
        view: PanelKind,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ListAction {
    List,
    Add { color: String },
    Remove { color: String },
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum PanelKind {
    History,
    Favorites,
}

impl From<PanelKind> for ViewType {
    fn from(kind: PanelKind) -> Self {
        match kind {
            PanelKind::History => ViewType::History,
            PanelKind::Favorites => ViewType::Favorites,
        }
    }
}

fn parse_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse().map_err(|e: ColorError| e.to_string())
}

/// Runs a one-shot subcommand, writing its output to `out`.
pub fn execute(command: Command, config: &Config, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Convert {
            color,
            format,
            precision,
            alpha,
            all,
        } => {
            let mut options = config.convert_options();
            if let Some(precision) = precision {
                options.precision = precision;
            }
            options.alpha |= alpha;

            if all {
                for converted in convert_all(&color, options)? {
                    writeln!(out, "{}: {}", converted.format, converted.value)?;
                }
            } else {
                let format = format.unwrap_or_else(|| config.default_format());
                writeln!(out, "{}", convert(&color, format, options)?)?;
            }
        }
        Command::Scan { file, format } => {
            let text = fs::read_to_string(&file)?;
            let format = format.unwrap_or_else(|| config.default_format());
            let options = config.convert_options();
            for line in scan(&text, format, options) {
                writeln!(out, "{}", line)?;
            }
        }
        Command::History { action } => {
            let mut store = ColorStore::new(open_state(config));
            match action.unwrap_or(ListAction::List) {
                ListAction::List => print_list(out, &store.history())?,
                ListAction::Add { color } => {
                    check_color(&color)?;
                    store.update_history(&color, None)?;
                }
                ListAction::Remove { color } => store.update_history("", Some(&color))?,
                ListAction::Clear => store.clear_history()?,
            }
        }
        Command::Favorites { action } => {
            let mut store = ColorStore::new(open_state(config));
            match action.unwrap_or(ListAction::List) {
                ListAction::List => print_list(out, &store.favorites())?,
                ListAction::Add { color } => {
                    check_color(&color)?;
                    store.update_favorites(&color, None)?;
                }
                ListAction::Remove { color } => store.update_favorites("", Some(&color))?,
                ListAction::Clear => store.clear_favorites()?,
            }
        }
        Command::Panel { view } => {
            write!(out, "{}", panel_html(view.into(), &PanelResources::bundled()))?;
        }
    }
    Ok(())
}

/// `line:column  literal -> converted` for every literal of every line.
pub fn scan(text: &str, format: OutputFormat, options: ConvertOptions) -> Vec<String> {
    text.split('\n')
        .enumerate()
        .flat_map(|(index, line)| {
            find_colors(line).into_iter().map(move |m| {
                let converted = convert(&m.text, format, options)
                    .unwrap_or_else(|e| format!("<{}>", e));
                format!("{}:{}  {} -> {}", index + 1, m.start() + 1, m.text, converted)
            })
        })
        .collect()
}

fn check_color(color: &str) -> Result<()> {
    if is_valid_color(color) {
        Ok(())
    } else {
        Err(ColorError::InvalidColorFormat(color.to_string()).into())
    }
}

fn print_list(out: &mut impl Write, colors: &[String]) -> Result<()> {
    for color in colors {
        writeln!(out, "{}", color)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(command: Command, config: &Config) -> String {
        let mut out = Vec::new();
        execute(command, config, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn temp_config(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.storage.path = Some(dir.path().join("state.json"));
        config
    }

    #[test]
    fn test_parse_no_args() {
        let cli = Cli::parse_from(["cfc-nvim"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::parse_from(["cfc-nvim", "convert", "#fff", "-f", "hex", "-p", "2", "--alpha"]);
        assert_eq!(
            cli.command,
            Some(Command::Convert {
                color: "#fff".into(),
                format: Some(OutputFormat::Hex),
                precision: Some(2),
                alpha: true,
                all: false,
            })
        );
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["cfc-nvim", "convert", "#fff", "-f", "cmyk"]).is_err());
    }

    #[test]
    fn test_parse_favorites_add() {
        let cli = Cli::parse_from(["cfc-nvim", "favorites", "add", "red"]);
        assert_eq!(
            cli.command,
            Some(Command::Favorites {
                action: Some(ListAction::Add {
                    color: "red".into()
                })
            })
        );
    }

    #[test]
    fn test_parse_panel() {
        let cli = Cli::parse_from(["cfc-nvim", "panel", "favorites"]);
        assert_eq!(
            cli.command,
            Some(Command::Panel {
                view: PanelKind::Favorites
            })
        );
    }

    #[test]
    fn test_convert_command_uses_default_format() {
        let output = run(
            Command::Convert {
                color: "white".into(),
                format: None,
                precision: None,
                alpha: false,
                all: false,
            },
            &Config::default(),
        );
        assert_eq!(output, "oklch(100% 0 none)\n");
    }

    #[test]
    fn test_convert_command_all() {
        let output = run(
            Command::Convert {
                color: "red".into(),
                format: None,
                precision: None,
                alpha: false,
                all: true,
            },
            &Config::default(),
        );
        assert_eq!(output.lines().count(), 10);
        assert_eq!(output.lines().next(), Some("HEX: #f00"));
    }

    #[test]
    fn test_convert_command_invalid_color() {
        let mut out = Vec::new();
        let command = Command::Convert {
            color: "nope".into(),
            format: None,
            precision: None,
            alpha: false,
            all: false,
        };
        assert!(execute(command, &Config::default(), &mut out).is_err());
    }

    #[test]
    fn test_scan() {
        let text = "a {\n  color: red;\n  background: #fff;\n}";
        let lines = scan(text, OutputFormat::Hex, ConvertOptions::default());
        assert_eq!(lines, vec!["2:10  red -> #f00", "3:15  #fff -> #fff"]);
    }

    #[test]
    fn test_favorites_commands_persist() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let favorites = |action| Command::Favorites {
            action: Some(action),
        };

        run(favorites(ListAction::Add { color: "red".into() }), &config);
        run(favorites(ListAction::Add { color: "#fff".into() }), &config);
        assert_eq!(run(favorites(ListAction::List), &config), "red\n#fff\n");

        run(favorites(ListAction::Remove { color: "red".into() }), &config);
        assert_eq!(run(favorites(ListAction::List), &config), "#fff\n");

        run(favorites(ListAction::Clear), &config);
        assert_eq!(run(Command::Favorites { action: None }, &config), "");
    }

    #[test]
    fn test_history_add_rejects_invalid_color() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let mut out = Vec::new();
        let command = Command::History {
            action: Some(ListAction::Add {
                color: "nope".into(),
            }),
        };
        assert!(execute(command, &config, &mut out).is_err());
        assert_eq!(run(Command::History { action: None }, &config), "");
    }

    #[test]
    fn test_panel_command_prints_html() {
        let output = run(
            Command::Panel {
                view: PanelKind::History,
            },
            &Config::default(),
        );
        assert!(output.starts_with("<!DOCTYPE html>"));
        assert!(output.contains("Colors History"));
    }
}
