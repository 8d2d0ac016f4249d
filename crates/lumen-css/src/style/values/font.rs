//! CSS Font value parsing
//!
//! [CSS Fonts Module Level 4](https://www.w3.org/TR/css-fonts-4/)

use serde::Serialize;

use super::length::LengthValue;
use crate::parser::ComponentValue;

/// Parse `font-family` into its family names, in preference order.
///
/// Names are split on commas of the raw text, so unquoted multi-word names
/// such as `Times New Roman` survive.
#[must_use]
pub fn parse_font_family(text: &str) -> Option<Vec<String>> {
    let families: Vec<String> = text
        .split(',')
        .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    (!families.is_empty()).then_some(families)
}

/// [§ 3.2 'font-weight'](https://www.w3.org/TR/css-fonts-4/#font-weight-prop)
///
/// `bolder` and `lighter` follow the relative weight table against
/// `parent`.
#[must_use]
pub fn parse_font_weight(value: &ComponentValue, parent: u16) -> Option<u16> {
    match value {
        ComponentValue::Ident(ident) => match ident.to_ascii_lowercase().as_str() {
            "normal" => Some(400),
            "bold" => Some(700),
            // [§ 3.2.1 Relative Weights](https://www.w3.org/TR/css-fonts-4/#relative-weights)
            "bolder" => Some(match parent {
                0..350 => 400,
                350..550 => 700,
                _ => 900,
            }),
            "lighter" => Some(match parent {
                0..550 => 100,
                550..750 => 400,
                _ => 700,
            }),
            _ => None,
        },
        ComponentValue::Number(value) => {
            let weight = *value as u16;
            ((1..=1000).contains(&weight)).then_some(weight)
        }
        _ => None,
    }
}

/// [§ 4.2 'line-height'](https://www.w3.org/TR/css-inline-3/#line-height-property)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum LineHeight {
    /// Taken from the font metrics.
    #[default]
    Normal,
    /// A multiple of the element's font size; inherited as the number.
    Number(f32),
    /// A fixed length; percentages resolve against the font size at
    /// cascade time.
    Length(LengthValue),
}

impl LineHeight {
    /// Used line height for a font of `font_size` whose normal line height
    /// is `normal`.
    #[must_use]
    pub fn resolve(&self, font_size: f32, normal: f32, root_font_size: f32) -> f32 {
        match self {
            Self::Normal => normal,
            Self::Number(factor) => factor * font_size,
            Self::Length(len) => len.to_px(
                font_size,
                &super::length::LengthContext {
                    font_size,
                    root_font_size,
                    ..super::length::LengthContext::default()
                },
            ),
        }
    }
}

/// [§ 3.5 'font-size'](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
///
/// "<absolute-size>: [ xx-small | x-small | small | medium | large |
/// x-large | xx-large | xxx-large ]"
#[must_use]
pub fn absolute_font_size(keyword: &str) -> Option<f32> {
    let px = match keyword.to_ascii_lowercase().as_str() {
        "xx-small" => 9.0,
        "x-small" => 10.0,
        "small" => 13.0,
        "medium" => 16.0,
        "large" => 18.0,
        "x-large" => 24.0,
        "xx-large" => 32.0,
        "xxx-large" => 48.0,
        _ => return None,
    };
    Some(px)
}

/// `<font size=N>`: legacy sizes 1 to 7 (with `+N`/`-N` relative to 3).
#[must_use]
pub fn legacy_font_size(attr: &str) -> Option<f32> {
    let attr = attr.trim();
    let size = if let Some(delta) = attr.strip_prefix('+') {
        3 + delta.parse::<i32>().ok()?
    } else if attr.starts_with('-') {
        3 + attr.parse::<i32>().ok()?
    } else {
        attr.parse::<i32>().ok()?
    };
    let keyword = match size.clamp(1, 7) {
        1 => "x-small",
        2 => "small",
        3 => "medium",
        4 => "large",
        5 => "x-large",
        6 => "xx-large",
        _ => "xxx-large",
    };
    absolute_font_size(keyword)
}

/// [§ 3 'text-decoration-line'](https://www.w3.org/TR/css-text-decor-3/#text-decoration-line-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TextDecoration {
    /// Line under the text.
    pub underline: bool,
    /// Line over the text.
    pub overline: bool,
    /// Line through the middle of the text.
    pub line_through: bool,
}

impl TextDecoration {
    /// Parse `none` or any combination of the line keywords.
    #[must_use]
    pub fn parse(values: &[ComponentValue]) -> Option<Self> {
        let mut decoration = Self::default();
        for value in values {
            match value.as_ident().map(str::to_ascii_lowercase).as_deref() {
                Some("none") => return Some(Self::default()),
                Some("underline") => decoration.underline = true,
                Some("overline") => decoration.overline = true,
                Some("line-through") => decoration.line_through = true,
                // Style and color components are accepted and ignored.
                Some("solid" | "double" | "dotted" | "dashed" | "wavy" | "blink") => {}
                _ if super::color::parse_single_color(value).is_some() => {}
                _ => return None,
            }
        }
        Some(decoration)
    }

    /// Whether any line is drawn.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        !(self.underline || self.overline || self.line_through)
    }

    /// CSS text for this decoration.
    #[must_use]
    pub fn to_css_string(&self) -> String {
        if self.is_none() {
            return "none".to_string();
        }
        [
            (self.underline, "underline"),
            (self.overline, "overline"),
            (self.line_through, "line-through"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_component_values;

    #[test]
    fn test_family_list_keeps_spaces() {
        assert_eq!(
            parse_font_family("'Times New Roman', Georgia ,serif").unwrap(),
            vec!["Times New Roman", "Georgia", "serif"]
        );
        assert!(parse_font_family(" , ").is_none());
    }

    #[test]
    fn test_relative_weights() {
        let bolder = ComponentValue::Ident("bolder".into());
        assert_eq!(parse_font_weight(&bolder, 400), Some(700));
        assert_eq!(parse_font_weight(&bolder, 700), Some(900));
    }

    #[test]
    fn test_legacy_sizes() {
        assert_eq!(legacy_font_size("3"), Some(16.0));
        assert_eq!(legacy_font_size("+1"), Some(18.0));
        assert_eq!(legacy_font_size("-2"), Some(10.0));
        assert_eq!(legacy_font_size("9"), Some(48.0));
    }

    #[test]
    fn test_decoration() {
        let values = parse_component_values("underline line-through red");
        let decoration = TextDecoration::parse(&values).unwrap();
        assert!(decoration.underline && decoration.line_through && !decoration.overline);
        assert_eq!(decoration.to_css_string(), "underline line-through");
    }
}
