//! Finds CSS color literals in arbitrary source text.
//!
//! Recognized literals:
//! * hex: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`
//! * functions: `rgb()`, `rgba()`, `hsl()`, `hsla()`, `hwb()`, `lab()`, `lch()`,
//!   `oklab()`, `oklch()`
//! * the basic CSS keywords plus `orange` and `transparent`
//!
//! A literal only counts when it is not glued to a preceding word character
//! and is followed by `;` or the end of the scanned text (whitespace allowed
//! in between). `color()` is not recognized.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)#(?:[0-9a-f]{3,4}){1,2}\b|(?:rgb|hsl|hwb|lab|lch|oklab|oklch)a?\s*\([^)]+\)|\b(?:aqua|black|blue|fuchsia|gray|green|lime|maroon|navy|olive|orange|purple|red|silver|teal|transparent|white|yellow)",
    )
    .expect("color regex is valid")
});

/// A color literal located in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMatch {
    /// Byte range of the literal in the scanned text.
    pub range: Range<usize>,
    pub text: String,
}

impl ColorMatch {
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }
}

/// Returns every color literal in `text`, in order of appearance.
pub fn find_colors(text: &str) -> Vec<ColorMatch> {
    let mut matches = Vec::new();
    let mut pos = 0;

    while pos <= text.len() {
        let Some(candidate) = COLOR_RE.find_at(text, pos) else {
            break;
        };

        if preceded_by_word_char(text, candidate.start())
            || !followed_by_terminator(text, candidate.end())
        {
            pos = next_char_boundary(text, candidate.start());
            continue;
        }

        matches.push(ColorMatch {
            range: candidate.range(),
            text: candidate.as_str().to_string(),
        });
        pos = candidate.end();
    }

    matches
}

/// Returns the literal on `line` whose range contains byte column `col`.
///
/// Both ends are inclusive, so a cursor resting right after the literal still
/// hits it.
pub fn color_at(line: &str, col: usize) -> Option<ColorMatch> {
    find_colors(line)
        .into_iter()
        .find(|m| m.start() <= col && col <= m.end())
}

/// Rewrites every detected literal through `convert`.
///
/// Literals for which `convert` returns `None` are left untouched. Returns the
/// new text and the number of literals that were replaced.
pub fn replace_colors<F>(text: &str, mut convert: F) -> (String, usize)
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut replaced = 0;

    for m in find_colors(text) {
        out.push_str(&text[last..m.start()]);
        match convert(&m.text) {
            Some(converted) => {
                out.push_str(&converted);
                replaced += 1;
            }
            None => out.push_str(&m.text),
        }
        last = m.end();
    }
    out.push_str(&text[last..]);

    (out, replaced)
}

fn preceded_by_word_char(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn followed_by_terminator(text: &str, end: usize) -> bool {
    let rest = text[end..].trim_start();
    rest.is_empty() || rest.starts_with(';')
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| pos + c.len_utf8())
}
