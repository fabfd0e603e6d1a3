use palette::{FromColor, Hsl, Srgb};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// An opaque sRGB color, always rendered as lowercase `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(Srgb<u8>);

impl HexColor {
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(Srgb::new(red, green, blue))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0.red, self.0.green, self.0.blue)
    }

    /// Scale HSL lightness toward black by `ratio`. Negative ratios scale it up.
    pub fn darken(self, ratio: f64) -> Self {
        let rgb: Srgb<f64> = self.0.into_format();
        let mut hsl: Hsl<palette::encoding::Srgb, f64> = Hsl::from_color(rgb);
        hsl.lightness = (hsl.lightness - hsl.lightness * ratio).clamp(0.0, 1.0);
        let rgb: Srgb<f64> = Srgb::from_color(hsl);
        Self(rgb.into_format())
    }

    /// Calculate relative luminance of a color
    pub fn relative_luminance(self) -> f64 {
        let linearize = |channel: u8| {
            let c = channel as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };

        0.2126 * linearize(self.0.red)
            + 0.7152 * linearize(self.0.green)
            + 0.0722 * linearize(self.0.blue)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for HexColor {
    type Err = palette::rgb::FromHexError;

    /// Accepts `#rgb` and `#rrggbb`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        // Also rejects a second '#' and signs, which `from_str_radix` would take
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("invalid hex code format".into());
        }
        Srgb::<u8>::from_str(hex).map(Self)
    }
}

/// Prefix user text with `#` unless it already starts with one.
pub fn normalize_color_input(input: &str) -> String {
    if input.starts_with('#') {
        input.to_string()
    } else {
        format!("#{}", input)
    }
}

/// Calculate contrast ratio between two colors
pub fn contrast_ratio(color1: HexColor, color2: HexColor) -> f64 {
    let l1 = color1.relative_luminance();
    let l2 = color2.relative_luminance();

    let lighter = l1.max(l2);
    let darker = l1.min(l2);

    (lighter + 0.05) / (darker + 0.05)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContrastRating {
    #[serde(rename = "AAA")]
    Aaa,
    #[serde(rename = "AA")]
    Aa,
    Fail,
}

impl ContrastRating {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 7.0 {
            ContrastRating::Aaa
        } else if ratio > 4.5 {
            ContrastRating::Aa
        } else {
            ContrastRating::Fail
        }
    }
}
