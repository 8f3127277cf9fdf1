use palette::chromatic_adaptation::AdaptFromUnclamped;
use palette::convert::FromColorUnclamped;
use palette::encoding::Srgb as SrgbEncoding;
use palette::white_point::{D50, D65};
use palette::{Hsl, Hwb, Lab, Lch, Oklab, Oklch, Xyz};
use serde::Serialize;

use super::parse::{parse_color, to_byte, Rgba};
use super::{ColorError, OutputFormat};
use crate::constants::{DEFAULT_PRECISION, MAX_PRECISION};

/// Chroma below which a CIE LCh hue is treated as powerless.
const LCH_ACHROMATIC_CHROMA: f64 = 0.02;
/// Chroma below which an OkLCh hue is treated as powerless.
const OKLCH_ACHROMATIC_CHROMA: f64 = 0.0002;
/// Channel spread below which an sRGB color counts as a gray. Must exceed the
/// Lab/OkLab to sRGB round-trip error and stay under half an 8-bit step.
const RGB_ACHROMATIC_SPREAD: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Significant digits kept for each component.
    pub precision: u32,
    /// Always print the alpha channel, even for opaque colors.
    pub alpha: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            alpha: false,
        }
    }
}

/// One entry of a conversion to every notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedColor {
    pub format: OutputFormat,
    pub value: String,
}

/// Converts `input` to a single notation.
pub fn convert(
    input: &str,
    format: OutputFormat,
    options: ConvertOptions,
) -> Result<String, ColorError> {
    let color = parse_color(input)?;
    Ok(format_color(color, format, options))
}

/// Like [`convert`] but swallows the error.
pub fn try_convert(input: &str, format: OutputFormat, options: ConvertOptions) -> Option<String> {
    convert(input, format, options).ok()
}

/// Converts `input` to every notation in [`OutputFormat::ALL`] order.
pub fn convert_all(input: &str, options: ConvertOptions) -> Result<Vec<ConvertedColor>, ColorError> {
    let color = parse_color(input)?;
    Ok(OutputFormat::ALL
        .into_iter()
        .map(|format| ConvertedColor {
            format,
            value: format_color(color, format, options),
        })
        .collect())
}

/// Serializes an already parsed color.
pub fn format_color(color: Rgba, format: OutputFormat, options: ConvertOptions) -> String {
    let precision = options.precision.min(MAX_PRECISION);
    let show_alpha = options.alpha || !color.is_opaque();
    let alpha = number(color.alpha.clamp(0.0, 1.0), precision);
    let slash_alpha = if show_alpha {
        format!(" / {}", alpha)
    } else {
        String::new()
    };

    match format {
        OutputFormat::Hex => hex(color.clamped(), show_alpha),
        OutputFormat::Rgb => {
            let [r, g, b] = rgb_channels(color, precision);
            format!("rgb({} {} {}{})", r, g, b, slash_alpha)
        }
        OutputFormat::Rgba => {
            let [r, g, b] = rgb_channels(color, precision);
            format!("rgba({}, {}, {}, {})", r, g, b, alpha)
        }
        OutputFormat::Hsl => {
            let (hue, saturation, lightness) = hsl(color);
            format!(
                "hsl({} {} {}{})",
                hue_or_none(hue, precision),
                percent(saturation, precision),
                percent(lightness, precision),
                slash_alpha
            )
        }
        OutputFormat::Hsla => {
            let (hue, saturation, lightness) = hsl(color);
            format!(
                "hsla({}, {}, {}, {})",
                number(hue.unwrap_or(0.0), precision),
                percent(saturation, precision),
                percent(lightness, precision),
                alpha
            )
        }
        OutputFormat::Hwb => {
            let (hue, whiteness, blackness) = hwb(color);
            format!(
                "hwb({} {} {}{})",
                hue_or_none(hue, precision),
                percent(whiteness, precision),
                percent(blackness, precision),
                slash_alpha
            )
        }
        OutputFormat::Lab => {
            let lab = to_lab(color);
            let (a, b) = snap_achromatic(lab.a, lab.b, LCH_ACHROMATIC_CHROMA);
            format!(
                "lab({} {} {}{})",
                number(lab.l, precision),
                number(a, precision),
                number(b, precision),
                slash_alpha
            )
        }
        OutputFormat::Lch => {
            let lch = Lch::<D50, f64>::from_color_unclamped(to_lab(color));
            let (chroma, hue) = polar(lch.chroma, lch.hue.into_positive_degrees(), LCH_ACHROMATIC_CHROMA);
            format!(
                "lch({} {} {}{})",
                number(lch.l, precision),
                number(chroma, precision),
                hue_or_none(hue, precision),
                slash_alpha
            )
        }
        OutputFormat::Oklab => {
            let oklab = to_oklab(color);
            let (a, b) = snap_achromatic(oklab.a, oklab.b, OKLCH_ACHROMATIC_CHROMA);
            format!(
                "oklab({} {} {}{})",
                percent(oklab.l, precision),
                number(a, precision),
                number(b, precision),
                slash_alpha
            )
        }
        OutputFormat::Oklch => {
            let oklch = Oklch::<f64>::from_color_unclamped(to_oklab(color));
            let (chroma, hue) = polar(
                oklch.chroma,
                oklch.hue.into_positive_degrees(),
                OKLCH_ACHROMATIC_CHROMA,
            );
            format!(
                "oklch({} {} {}{})",
                percent(oklch.l, precision),
                number(chroma, precision),
                hue_or_none(hue, precision),
                slash_alpha
            )
        }
    }
}

/// Rounds `n` to `precision` significant digits, counting the integer part
/// first: `93.3333 -> 93.33`, `238.4 -> 238.4`, `0.34901 -> 0.349`.
pub fn round_to_precision(n: f64, precision: u32) -> f64 {
    if n == 0.0 || !n.is_finite() {
        return 0.0;
    }
    let precision = precision.min(MAX_PRECISION);

    let integer = n.trunc();
    let digits = if integer != 0.0 && precision > 0 {
        integer.abs().log10().floor() as i32 + 1
    } else {
        0
    };

    let exponent = precision as i32 - digits;
    let rounded = if exponent >= 0 {
        let multiplier = 10f64.powi(exponent);
        (n * multiplier + 0.5).floor() / multiplier
    } else {
        let divisor = 10f64.powi(-exponent);
        (n / divisor + 0.5).floor() * divisor
    };

    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn number(n: f64, precision: u32) -> String {
    round_to_precision(n, precision).to_string()
}

fn percent(fraction: f64, precision: u32) -> String {
    format!("{}%", number(fraction * 100.0, precision))
}

fn hue_or_none(hue: Option<f64>, precision: u32) -> String {
    match hue {
        Some(hue) => number(hue, precision),
        None => "none".to_string(),
    }
}

fn hex(color: Rgba, with_alpha: bool) -> String {
    let mut bytes = vec![to_byte(color.red), to_byte(color.green), to_byte(color.blue)];
    if with_alpha {
        bytes.push(to_byte(color.alpha));
    }

    let collapsible = bytes.iter().all(|b| b % 17 == 0);
    let digits: String = if collapsible {
        bytes.iter().map(|b| format!("{:x}", b / 17)).collect()
    } else {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    };
    format!("#{}", digits)
}

fn rgb_channels(color: Rgba, precision: u32) -> [String; 3] {
    let c = color.clamped();
    [c.red, c.green, c.blue].map(|channel| number(channel * 255.0, precision))
}

fn is_gray(color: Rgba) -> bool {
    let max = color.red.max(color.green).max(color.blue);
    let min = color.red.min(color.green).min(color.blue);
    max - min < RGB_ACHROMATIC_SPREAD
}

fn hsl(color: Rgba) -> (Option<f64>, f64, f64) {
    let color = color.clamped();
    let hsl = Hsl::<SrgbEncoding, f64>::from_color_unclamped(color.to_srgb());
    if is_gray(color) {
        return (None, 0.0, hsl.lightness);
    }
    (Some(hsl.hue.into_positive_degrees()), hsl.saturation, hsl.lightness)
}

fn hwb(color: Rgba) -> (Option<f64>, f64, f64) {
    let color = color.clamped();
    if is_gray(color) {
        let max = color.red.max(color.green).max(color.blue);
        let min = color.red.min(color.green).min(color.blue);
        let level = (max + min) / 2.0;
        return (None, level, 1.0 - level);
    }
    let hwb = Hwb::<SrgbEncoding, f64>::from_color_unclamped(color.to_srgb());
    (Some(hwb.hue.into_positive_degrees()), hwb.whiteness, hwb.blackness)
}

fn to_lab(color: Rgba) -> Lab<D50, f64> {
    let xyz = Xyz::<D65, f64>::from_color_unclamped(color.to_srgb());
    let xyz = Xyz::<D50, f64>::adapt_from_unclamped(xyz);
    Lab::<D50, f64>::from_color_unclamped(xyz)
}

fn to_oklab(color: Rgba) -> Oklab<f64> {
    let xyz = Xyz::<D65, f64>::from_color_unclamped(color.to_srgb());
    Oklab::<f64>::from_color_unclamped(xyz)
}

fn snap_achromatic(a: f64, b: f64, threshold: f64) -> (f64, f64) {
    if a.hypot(b) < threshold {
        (0.0, 0.0)
    } else {
        (a, b)
    }
}

fn polar(chroma: f64, hue: f64, threshold: f64) -> (f64, Option<f64>) {
    if chroma < threshold {
        (0.0, None)
    } else {
        (chroma, Some(hue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ConvertOptions {
        ConvertOptions::default()
    }

    #[test]
    fn test_round_to_precision() {
        assert_eq!(round_to_precision(93.333333, 4), 93.33);
        assert_eq!(round_to_precision(238.0, 4), 238.0);
        assert_eq!(round_to_precision(0.349019, 4), 0.349);
        assert_eq!(round_to_precision(1234.56, 2), 1200.0);
        assert_eq!(round_to_precision(-0.00001, 4), 0.0);
        assert_eq!(round_to_precision(f64::NAN, 4), 0.0);
        assert_eq!(round_to_precision(0.5, u32::MAX), 0.5);
    }

    #[test]
    fn test_negative_zero_prints_as_zero() {
        assert_eq!(number(-0.0, 4), "0");
        assert_eq!(number(-0.00001, 4), "0");
    }

    #[test]
    fn test_hex_collapses_when_possible() {
        assert_eq!(convert("#eeeeee", OutputFormat::Hex, opts()).unwrap(), "#eee");
        assert_eq!(convert("#3d5a80", OutputFormat::Hex, opts()).unwrap(), "#3d5a80");
        assert_eq!(convert("red", OutputFormat::Hex, opts()).unwrap(), "#f00");
    }

    #[test]
    fn test_hex_alpha() {
        assert_eq!(convert("#eeeeee59", OutputFormat::Hex, opts()).unwrap(), "#eeeeee59");
        let forced = ConvertOptions {
            alpha: true,
            ..opts()
        };
        assert_eq!(convert("#fff", OutputFormat::Hex, forced).unwrap(), "#ffff");
    }

    #[test]
    fn test_red_in_srgb_notations() {
        assert_eq!(convert("red", OutputFormat::Rgb, opts()).unwrap(), "rgb(255 0 0)");
        assert_eq!(
            convert("red", OutputFormat::Rgba, opts()).unwrap(),
            "rgba(255, 0, 0, 1)"
        );
        assert_eq!(convert("red", OutputFormat::Hsl, opts()).unwrap(), "hsl(0 100% 50%)");
        assert_eq!(
            convert("red", OutputFormat::Hsla, opts()).unwrap(),
            "hsla(0, 100%, 50%, 1)"
        );
        assert_eq!(convert("red", OutputFormat::Hwb, opts()).unwrap(), "hwb(0 0% 0%)");
    }

    #[test]
    fn test_red_in_oklch() {
        let value = convert("#ff0000", OutputFormat::Oklch, opts()).unwrap();
        assert!(value.starts_with("oklch(62.8% 0.25"), "{}", value);
    }

    #[test]
    fn test_white_is_achromatic_everywhere() {
        assert_eq!(convert("#fff", OutputFormat::Lab, opts()).unwrap(), "lab(100 0 0)");
        assert_eq!(convert("#fff", OutputFormat::Lch, opts()).unwrap(), "lch(100 0 none)");
        assert_eq!(convert("#fff", OutputFormat::Oklab, opts()).unwrap(), "oklab(100% 0 0)");
        assert_eq!(convert("#fff", OutputFormat::Oklch, opts()).unwrap(), "oklch(100% 0 none)");
        assert_eq!(convert("#fff", OutputFormat::Hsl, opts()).unwrap(), "hsl(none 0% 100%)");
        assert_eq!(convert("#fff", OutputFormat::Hwb, opts()).unwrap(), "hwb(none 100% 0%)");
        assert_eq!(
            convert("#fff", OutputFormat::Hsla, opts()).unwrap(),
            "hsla(0, 0%, 100%, 1)"
        );
    }

    #[test]
    fn test_black() {
        assert_eq!(convert("black", OutputFormat::Oklch, opts()).unwrap(), "oklch(0% 0 none)");
        assert_eq!(convert("black", OutputFormat::Lab, opts()).unwrap(), "lab(0 0 0)");
    }

    #[test]
    fn test_translucent_color_keeps_alpha() {
        assert_eq!(
            convert("rgba(255, 255, 255, 0.5)", OutputFormat::Oklch, opts()).unwrap(),
            "oklch(100% 0 none / 0.5)"
        );
        assert_eq!(
            convert("rgba(255, 0, 0, 0.5)", OutputFormat::Rgb, opts()).unwrap(),
            "rgb(255 0 0 / 0.5)"
        );
    }

    #[test]
    fn test_forced_alpha_on_opaque_color() {
        let forced = ConvertOptions {
            alpha: true,
            ..opts()
        };
        assert_eq!(convert("#fff", OutputFormat::Oklch, forced).unwrap(), "oklch(100% 0 none / 1)");
    }

    #[test]
    fn test_precision_controls_digits() {
        let two = ConvertOptions {
            precision: 2,
            ..opts()
        };
        assert_eq!(convert("#eee", OutputFormat::Rgb, two).unwrap(), "rgb(240 240 240)");
        assert_eq!(convert("#eee", OutputFormat::Rgb, opts()).unwrap(), "rgb(238 238 238)");
    }

    #[test]
    fn test_excessive_precision_is_capped() {
        let huge = ConvertOptions {
            precision: 400,
            ..opts()
        };
        let capped = ConvertOptions {
            precision: MAX_PRECISION,
            ..opts()
        };
        for format in OutputFormat::ALL {
            let value = convert("#3d5a80", format, huge).unwrap();
            assert!(!value.contains("NaN"), "{}", value);
            assert_eq!(value, convert("#3d5a80", format, capped).unwrap());
        }
    }

    #[test]
    fn test_lab_family_grays_have_no_hue() {
        for gray in ["lab(93.75 0 0)", "oklch(94.61% 0 none)", "lch(93.75 0 0)"] {
            assert_eq!(convert(gray, OutputFormat::Hsl, opts()).unwrap(), "hsl(none 0% 92.94%)");
            assert_eq!(
                convert(gray, OutputFormat::Hsla, opts()).unwrap(),
                "hsla(0, 0%, 92.94%, 1)"
            );
            let hwb = convert(gray, OutputFormat::Hwb, opts()).unwrap();
            assert!(hwb.starts_with("hwb(none 92.94% 7.0"), "{}", hwb);
        }
    }

    #[test]
    fn test_near_gray_hex_keeps_its_hue() {
        assert_eq!(convert("#eeeeef", OutputFormat::Hsl, opts()).unwrap(), "hsl(240 3.03% 93.53%)");
    }

    #[test]
    fn test_convert_all_order() {
        let all = convert_all("#eee", opts()).unwrap();
        let formats: Vec<OutputFormat> = all.iter().map(|c| c.format).collect();
        assert_eq!(formats, OutputFormat::ALL.to_vec());
        assert_eq!(all[0].value, "#eee");
    }

    #[test]
    fn test_round_trip_through_own_output() {
        for format in OutputFormat::ALL {
            let value = convert("#3d5a80", format, opts()).unwrap();
            let back = convert(&value, OutputFormat::Hex, opts()).unwrap();
            assert_eq!(back, "#3d5a80", "{} -> {}", format, value);
        }
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(
            convert("blurple", OutputFormat::Hex, opts()),
            Err(ColorError::InvalidColorFormat("blurple".into()))
        );
        assert_eq!(try_convert("blurple", OutputFormat::Hex, opts()), None);
        assert!(convert_all("blurple", opts()).is_err());
    }
}
