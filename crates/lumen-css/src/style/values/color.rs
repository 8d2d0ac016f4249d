//! CSS Color values and parsing
//!
//! [CSS Color Level 4](https://www.w3.org/TR/css-color-4/)

use serde::Serialize;

use crate::parser::{ComponentValue, parse_component_values};

/// [§ 4 Color syntax](https://www.w3.org/TR/css-color-4/#color-syntax)
/// sRGB color represented as RGBA components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColorValue {
    /// "the red color channel" (0-255)
    pub r: u8,
    /// "the green color channel" (0-255)
    pub g: u8,
    /// "the blue color channel" (0-255)
    pub b: u8,
    /// "the alpha channel" (0-255, 255 = fully opaque)
    pub a: u8,
}

/// [§ 6.1 Named Colors](https://www.w3.org/TR/css-color-4/#named-colors)
///
/// The sixteen HTML colors plus the extended keywords legacy documents use
/// most often.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("aqua", [0, 255, 255]),
    ("black", [0, 0, 0]),
    ("blue", [0, 0, 255]),
    ("brown", [165, 42, 42]),
    ("cyan", [0, 255, 255]),
    ("darkblue", [0, 0, 139]),
    ("darkgray", [169, 169, 169]),
    ("darkgreen", [0, 100, 0]),
    ("darkgrey", [169, 169, 169]),
    ("darkred", [139, 0, 0]),
    ("fuchsia", [255, 0, 255]),
    ("gold", [255, 215, 0]),
    ("gray", [128, 128, 128]),
    ("green", [0, 128, 0]),
    ("grey", [128, 128, 128]),
    ("lightblue", [173, 216, 230]),
    ("lightgray", [211, 211, 211]),
    ("lightgreen", [144, 238, 144]),
    ("lightgrey", [211, 211, 211]),
    ("lightyellow", [255, 255, 224]),
    ("lime", [0, 255, 0]),
    ("magenta", [255, 0, 255]),
    ("maroon", [128, 0, 0]),
    ("navy", [0, 0, 128]),
    ("olive", [128, 128, 0]),
    ("orange", [255, 165, 0]),
    ("pink", [255, 192, 203]),
    ("purple", [128, 0, 128]),
    ("red", [255, 0, 0]),
    ("silver", [192, 192, 192]),
    ("teal", [0, 128, 128]),
    ("violet", [238, 130, 238]),
    ("white", [255, 255, 255]),
    ("whitesmoke", [245, 245, 245]),
    ("yellow", [255, 255, 0]),
];

impl ColorValue {
    /// Black (#000000)
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// White (#ffffff)
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// An opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Whether the color is fully transparent.
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// [§ 4.2 The RGB hexadecimal notations](https://www.w3.org/TR/css-color-4/#hex-notation)
    /// "The syntax of a <hex-color> is a <hash-token> token whose value consists of
    /// 3, 4, 6, or 8 hexadecimal digits."
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        // "The three-digit RGB notation (#RGB) is converted into six-digit form (#RRGGBB)
        // by replicating digits, not by adding zeros."
        let short = |i: usize| u8::from_str_radix(&hex[i..=i].repeat(2), 16).ok();
        let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Some(Self {
                r: short(0)?,
                g: short(1)?,
                b: short(2)?,
                a: short(3)?,
            }),
            6 => Some(Self::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Some(Self {
                r: long(0)?,
                g: long(2)?,
                b: long(4)?,
                a: long(6)?,
            }),
            _ => None,
        }
    }

    /// [§ 6.1 Named Colors](https://www.w3.org/TR/css-color-4/#named-colors)
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower == "transparent" {
            return Some(Self::TRANSPARENT);
        }
        NAMED_COLORS
            .binary_search_by(|(key, _)| (*key).cmp(lower.as_str()))
            .ok()
            .map(|i| {
                let [r, g, b] = NAMED_COLORS[i].1;
                Self::rgb(r, g, b)
            })
    }

    /// Parse a color from raw text such as `"#f00"`, `"red"` or `"rgb(1,2,3)"`.
    ///
    /// Bare hex digits without `#` are accepted, as HTML color attributes
    /// often omit it.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let values = parse_component_values(text);
        match values.as_slice() {
            [single] => parse_single_color(single).or_else(|| Self::from_bare_hex(text)),
            _ => Self::from_bare_hex(text),
        }
    }

    fn from_bare_hex(text: &str) -> Option<Self> {
        let text = text.trim();
        (matches!(text.len(), 3 | 6) && text.bytes().all(|b| b.is_ascii_hexdigit()))
            .then(|| Self::from_hex(text))
            .flatten()
    }

    /// Convert to hex string notation (#RRGGBB or #RRGGBBAA if alpha != 255)
    ///
    /// [§ 4.2 The RGB hexadecimal notations](https://www.w3.org/TR/css-color-4/#hex-notation)
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Scale the RGB channels by `factor` (used for inset/outset shading).
    #[must_use]
    pub fn shade(&self, factor: f32) -> Self {
        let scale = |c: u8| (f32::from(c) * factor).round().clamp(0.0, 255.0) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }
}

/// Parse the first color found in `values`.
#[must_use]
pub fn parse_color_value(values: &[ComponentValue]) -> Option<ColorValue> {
    values.iter().find_map(parse_single_color)
}

/// Parse a single component value as a color.
#[must_use]
pub fn parse_single_color(v: &ComponentValue) -> Option<ColorValue> {
    match v {
        ComponentValue::Hash(value) => ColorValue::from_hex(value),
        ComponentValue::Ident(name) => ColorValue::from_named(name),
        ComponentValue::Function { name, args } => match name.as_str() {
            "rgb" | "rgba" => parse_rgb_function(args),
            "hsl" | "hsla" => parse_hsl_function(args),
            _ => None,
        },
        _ => None,
    }
}

/// A numeric value extracted from a color function argument.
#[derive(Debug, Clone, Copy)]
enum ColorArg {
    Number(f32),
    Percentage(f32),
}

/// Numeric arguments of a color function; commas and `/` are separators.
fn extract_color_args(args: &[ComponentValue]) -> Vec<ColorArg> {
    args.iter()
        .filter_map(|arg| match arg {
            ComponentValue::Number(value) => Some(ColorArg::Number(*value)),
            ComponentValue::Percentage(value) => Some(ColorArg::Percentage(*value)),
            ComponentValue::Dimension { value, unit } if unit == "deg" => {
                Some(ColorArg::Number(*value))
            }
            _ => None,
        })
        .collect()
}

/// [§ 4.1 The RGB Functions](https://www.w3.org/TR/css-color-4/#rgb-functions)
///
/// "Values outside these ranges are not invalid, but are clamped to the
/// ranges defined here at parsed-value time."
fn parse_rgb_function(args: &[ComponentValue]) -> Option<ColorValue> {
    let vals = extract_color_args(args);
    if vals.len() < 3 {
        return None;
    }
    // "If omitted, it defaults to 100%."
    let a = vals.get(3).map_or(255, |&alpha| alpha_to_u8(alpha));
    Some(ColorValue {
        r: color_channel_to_u8(vals[0]),
        g: color_channel_to_u8(vals[1]),
        b: color_channel_to_u8(vals[2]),
        a,
    })
}

/// [§ 4.1 The HSL Functions](https://www.w3.org/TR/css-color-4/#the-hsl-notation)
///
/// "<hue> is a <number> or <angle>, interpreted as degrees."
fn parse_hsl_function(args: &[ComponentValue]) -> Option<ColorValue> {
    let vals = extract_color_args(args);
    if vals.len() < 3 {
        return None;
    }
    let hue = match vals[0] {
        ColorArg::Number(v) => v,
        ColorArg::Percentage(v) => v * 3.6,
    };
    let fraction = |arg: ColorArg| match arg {
        ColorArg::Percentage(v) | ColorArg::Number(v) => v / 100.0,
    };
    let a = vals.get(3).map_or(255, |&alpha| alpha_to_u8(alpha));
    let (r, g, b) = hsl_to_rgb(hue, fraction(vals[1]), fraction(vals[2]));
    Some(ColorValue { r, g, b, a })
}

/// Numbers are clamped to 0-255; percentages map 0%-100% to 0-255.
fn color_channel_to_u8(arg: ColorArg) -> u8 {
    let v = match arg {
        ColorArg::Number(n) => n,
        ColorArg::Percentage(p) => p * 255.0 / 100.0,
    };
    v.round().clamp(0.0, 255.0) as u8
}

/// "The <alpha-value> can be a <number> (clamped to [0, 1]) or a
/// <percentage> (clamped to [0%, 100%])."
fn alpha_to_u8(arg: ColorArg) -> u8 {
    let v = match arg {
        ColorArg::Number(n) => n * 255.0,
        ColorArg::Percentage(p) => p * 255.0 / 100.0,
    };
    v.round().clamp(0.0, 255.0) as u8
}

/// [§ 4.2.4 HSL-to-RGB](https://www.w3.org/TR/css-color-4/#hsl-to-rgb)
fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> (u8, u8, u8) {
    let saturation = saturation.clamp(0.0, 1.0);
    let lightness = lightness.clamp(0.0, 1.0);

    let chroma = (1.0 - 2.0f32.mul_add(lightness, -1.0).abs()) * saturation;
    let sector = hue.rem_euclid(360.0) / 60.0;
    let second = chroma * (1.0 - (sector % 2.0 - 1.0).abs());

    let (r1, g1, b1) = match sector as u32 {
        0 => (chroma, second, 0.0),
        1 => (second, chroma, 0.0),
        2 => (0.0, chroma, second),
        3 => (0.0, second, chroma),
        4 => (second, 0.0, chroma),
        5 => (chroma, 0.0, second),
        _ => (0.0, 0.0, 0.0),
    };

    let lift = lightness - chroma / 2.0;
    let to_u8 = |v: f32| ((v + lift) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r1), to_u8(g1), to_u8(b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_table_is_sorted() {
        assert!(NAMED_COLORS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(ColorValue::parse("#f00"), Some(ColorValue::rgb(255, 0, 0)));
        assert_eq!(ColorValue::parse("Navy"), Some(ColorValue::rgb(0, 0, 128)));
        assert_eq!(ColorValue::parse("ff8000"), Some(ColorValue::rgb(255, 128, 0)));
        assert_eq!(
            ColorValue::parse("rgba(10, 20, 30, 0.5)"),
            Some(ColorValue {
                r: 10,
                g: 20,
                b: 30,
                a: 128
            })
        );
        assert_eq!(ColorValue::parse("hsl(120, 100%, 50%)"), Some(ColorValue::rgb(0, 255, 0)));
        assert_eq!(ColorValue::parse("notacolor"), None);
    }
}
