//! Range checks for `lab()`, `lch()`, `oklab()` and `oklch()` following
//! CSS Color Module Level 4.

use std::sync::LazyLock;

use regex::Regex;

use super::detect::ColorMatch;

static MODERN_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(lab|lch|oklab|oklch)\(\s*([+-]?\d+(?:\.\d+)?%?)\s+([+-]?\d+(?:\.\d+)?)\s+([+-]?\d+(?:\.\d+)?(?:deg|grad|rad|turn)?)(?:\s*/\s*([+-]?\d+(?:\.\d+)?%?))?\s*\)$",
    )
    .expect("modern color regex is valid")
});

static MODERN_COLOR_SCAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"oklch\([^)]+\)|oklab\([^)]+\)|lch\([^)]+\)|lab\([^)]+\)")
        .expect("modern color scan regex is valid")
});

/// Checks syntax and component ranges of a lab-family color.
///
/// Only plain numbers are accepted here: `none` and `calc()` are rejected.
pub fn is_valid_lab_lch_oklab_oklch(input: &str) -> bool {
    let Some(caps) = MODERN_COLOR_RE.captures(input) else {
        return false;
    };

    let function = caps[1].to_ascii_lowercase();
    let l_str = &caps[2];
    let Some(l) = parse_number(l_str) else {
        return false;
    };
    let Some(p2) = parse_number(&caps[3]) else {
        return false;
    };
    let Some(p3) = parse_number(strip_angle_unit(&caps[4])) else {
        return false;
    };

    let l_in_range = |l: f64| {
        if l_str.ends_with('%') || matches!(function.as_str(), "lab" | "lch") {
            (0.0..=100.0).contains(&l)
        } else {
            (0.0..=1.0).contains(&l)
        }
    };

    let components_ok = match function.as_str() {
        "lab" => {
            l_in_range(l) && (-128.0..=127.0).contains(&p2) && (-128.0..=127.0).contains(&p3)
        }
        "oklab" => l_in_range(l) && (-0.4..=0.4).contains(&p2) && (-0.4..=0.4).contains(&p3),
        "lch" | "oklch" => l_in_range(l) && p2 >= 0.0 && (0.0..=360.0).contains(&p3),
        _ => false,
    };
    if !components_ok {
        return false;
    }

    match caps.get(5) {
        Some(alpha) => {
            let alpha_str = alpha.as_str();
            let Some(value) = parse_number(alpha_str) else {
                return false;
            };
            if alpha_str.ends_with('%') {
                (0.0..=100.0).contains(&value)
            } else {
                (0.0..=1.0).contains(&value)
            }
        }
        None => true,
    }
}

/// Finds every valid `oklch()`, `oklab()`, `lch()` and `lab()` literal.
///
/// Unlike [`find_colors`](super::find_colors) this ignores the surrounding
/// context: a literal inside a longer expression still counts.
pub fn find_modern_colors(text: &str) -> Vec<ColorMatch> {
    MODERN_COLOR_SCAN_RE
        .find_iter(text)
        .filter(|m| is_valid_lab_lch_oklab_oklch(m.as_str()))
        .map(|m| ColorMatch {
            range: m.range(),
            text: m.as_str().to_string(),
        })
        .collect()
}

fn parse_number(value: &str) -> Option<f64> {
    value.strip_suffix('%').unwrap_or(value).parse().ok()
}

fn strip_angle_unit(value: &str) -> &str {
    let lower = value.to_ascii_lowercase();
    for unit in ["grad", "turn", "deg", "rad"] {
        if lower.ends_with(unit) {
            return &value[..value.len() - unit.len()];
        }
    }
    value
}
