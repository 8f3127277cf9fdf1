use std::f64::consts::PI;
use std::sync::LazyLock;

use palette::chromatic_adaptation::AdaptFromUnclamped;
use palette::convert::FromColorUnclamped;
use palette::white_point::{D50, D65};
use palette::{Lab, LabHue, Lch, Oklab, OklabHue, Oklch, Srgb, Xyz};
use regex::Regex;

use super::ColorError;

static NONE_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnone\b").expect("none keyword regex is valid"));

/// A color in gamma-encoded sRGB.
///
/// Channels are nominally 0.0..=1.0 but may fall outside that range for
/// lab-family inputs outside the sRGB gamut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Channels clamped into the sRGB gamut.
    pub fn clamped(self) -> Self {
        Self {
            red: self.red.clamp(0.0, 1.0),
            green: self.green.clamp(0.0, 1.0),
            blue: self.blue.clamp(0.0, 1.0),
            alpha: self.alpha.clamp(0.0, 1.0),
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }

    pub fn to_srgb(self) -> Srgb<f64> {
        Srgb::new(self.red, self.green, self.blue)
    }

    /// `#rrggbb` without alpha, as needed by editor highlight groups.
    pub fn to_hex6(self) -> String {
        let c = self.clamped();
        format!(
            "#{:02x}{:02x}{:02x}",
            to_byte(c.red),
            to_byte(c.green),
            to_byte(c.blue)
        )
    }
}

pub(crate) fn to_byte(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Parses any supported CSS color.
pub fn parse_color(input: &str) -> Result<Rgba, ColorError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ColorError::InvalidColorFormat(input.to_string()));
    }

    let lower = trimmed.to_ascii_lowercase();
    let family = LabFamily::ALL.into_iter().find_map(|family| {
        lower
            .strip_prefix(family.name())
            .and_then(|rest| rest.trim_start().strip_prefix('('))
            .map(|args| (family, args))
    });

    let parsed = match family {
        Some((family, args)) => parse_lab_family(family, args),
        None => parse_with_csscolorparser(trimmed),
    };

    parsed.ok_or_else(|| ColorError::InvalidColorFormat(input.to_string()))
}

/// Whether `input` is a color this crate can convert.
pub fn is_valid_color(input: &str) -> bool {
    parse_color(input).is_ok()
}

fn parse_with_csscolorparser(input: &str) -> Option<Rgba> {
    // Our own output uses `none` for powerless hues; csscolorparser wants numbers.
    let normalized = if input.contains('(') {
        NONE_KEYWORD_RE.replace_all(input, "0").into_owned()
    } else {
        input.to_string()
    };

    match csscolorparser::parse(&normalized) {
        Ok(color) => Some(Rgba::new(
            color.r as f64,
            color.g as f64,
            color.b as f64,
            color.a as f64,
        )),
        Err(e) => {
            log::debug!("Rejected color {:?}: {}", input, e);
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabFamily {
    Oklab,
    Oklch,
    Lab,
    Lch,
}

impl LabFamily {
    // Longer names first so "oklab" wins over "lab".
    const ALL: [LabFamily; 4] = [
        LabFamily::Oklab,
        LabFamily::Oklch,
        LabFamily::Lab,
        LabFamily::Lch,
    ];

    fn name(self) -> &'static str {
        match self {
            LabFamily::Oklab => "oklab",
            LabFamily::Oklch => "oklch",
            LabFamily::Lab => "lab",
            LabFamily::Lch => "lch",
        }
    }

    /// Values that 100% maps to, per component.
    fn percent_references(self) -> [f64; 3] {
        match self {
            LabFamily::Lab => [100.0, 125.0, 125.0],
            LabFamily::Lch => [100.0, 150.0, 1.0],
            LabFamily::Oklab => [1.0, 0.4, 0.4],
            LabFamily::Oklch => [1.0, 0.4, 1.0],
        }
    }

    fn is_polar(self) -> bool {
        matches!(self, LabFamily::Lch | LabFamily::Oklch)
    }

    fn lightness_max(self) -> f64 {
        match self {
            LabFamily::Lab | LabFamily::Lch => 100.0,
            LabFamily::Oklab | LabFamily::Oklch => 1.0,
        }
    }
}

fn parse_lab_family(family: LabFamily, args: &str) -> Option<Rgba> {
    let body = args.trim_end().strip_suffix(')')?;
    let (channels, alpha) = match body.split_once('/') {
        Some((channels, alpha)) => (channels, Some(alpha.trim())),
        None => (body, None),
    };

    let parts: Vec<&str> = channels.split_whitespace().collect();
    if parts.len() != 3 {
        return None;
    }

    let refs = family.percent_references();
    let lightness = parse_component(parts[0], refs[0])?.clamp(0.0, family.lightness_max());
    let second = parse_component(parts[1], refs[1])?;
    let third = if family.is_polar() {
        parse_hue(parts[2])?
    } else {
        parse_component(parts[2], refs[2])?
    };
    let alpha = match alpha {
        Some(alpha) => parse_component(alpha, 1.0)?.clamp(0.0, 1.0),
        None => 1.0,
    };

    let srgb = match family {
        LabFamily::Lab => lab_to_srgb(Lab::new(lightness, second, third)),
        LabFamily::Lch => lab_to_srgb(Lab::<D50, f64>::from_color_unclamped(Lch::<D50, f64>::new(
            lightness,
            second.max(0.0),
            LabHue::from_degrees(third),
        ))),
        LabFamily::Oklab => oklab_to_srgb(Oklab::new(lightness, second, third)),
        LabFamily::Oklch => oklab_to_srgb(Oklab::<f64>::from_color_unclamped(Oklch::new(
            lightness,
            second.max(0.0),
            OklabHue::from_degrees(third),
        ))),
    };

    Some(Rgba::new(srgb.red, srgb.green, srgb.blue, alpha))
}

fn parse_component(token: &str, percent_reference: f64) -> Option<f64> {
    if token.eq_ignore_ascii_case("none") {
        return Some(0.0);
    }
    let value = match token.strip_suffix('%') {
        Some(number) => number.parse::<f64>().ok()? / 100.0 * percent_reference,
        None => token.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

fn parse_hue(token: &str) -> Option<f64> {
    if token.eq_ignore_ascii_case("none") {
        return Some(0.0);
    }
    let units: [(&str, f64); 4] = [
        ("grad", 0.9),
        ("turn", 360.0),
        ("deg", 1.0),
        ("rad", 180.0 / PI),
    ];
    let (number, factor) = units
        .iter()
        .find_map(|(unit, factor)| token.strip_suffix(unit).map(|n| (n, *factor)))
        .unwrap_or((token, 1.0));
    let value = number.parse::<f64>().ok()? * factor;
    value.is_finite().then_some(value)
}

fn lab_to_srgb(lab: Lab<D50, f64>) -> Srgb<f64> {
    let xyz = Xyz::<D50, f64>::from_color_unclamped(lab);
    let xyz = Xyz::<D65, f64>::adapt_from_unclamped(xyz);
    Srgb::<f64>::from_color_unclamped(xyz)
}

fn oklab_to_srgb(oklab: Oklab<f64>) -> Srgb<f64> {
    let xyz = Xyz::<D65, f64>::from_color_unclamped(oklab);
    Srgb::<f64>::from_color_unclamped(xyz)
}
