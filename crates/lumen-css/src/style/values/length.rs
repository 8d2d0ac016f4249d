//! CSS Length values and parsing
//!
//! [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)

use serde::Serialize;

use crate::parser::ComponentValue;

/// User agent default font size.
/// [§ 3.5 font-size](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

/// [§ 6.1 Absolute lengths](https://www.w3.org/TR/css-values-4/#absolute-lengths)
/// "1in = 2.54cm = 96px"
const PX_PER_INCH: f32 = 96.0;

/// Everything a relative length may need to become pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    /// Computed font size of the element (for `em`).
    pub font_size: f32,
    /// Font size of the root element (for `rem`).
    pub root_font_size: f32,
    /// Viewport width (for `vw`).
    pub viewport_width: f32,
    /// Viewport height (for `vh`).
    pub viewport_height: f32,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE_PX,
            root_font_size: DEFAULT_FONT_SIZE_PX,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }
}

/// [§ 4.1 Lengths](https://www.w3.org/TR/css-values-4/#lengths)
/// "Lengths refer to distance measurements and are denoted by `<length>` in the
/// property definitions."
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LengthValue {
    /// [§ 6.1 Absolute lengths](https://www.w3.org/TR/css-values-4/#absolute-lengths)
    /// "1px = 1/96th of 1in"
    Px(f32),
    /// "1pt = 1/72nd of 1in"
    Pt(f32),
    /// "1pc = 1/6th of 1in"
    Pc(f32),
    /// "1in = 2.54cm = 96px"
    In(f32),
    /// "1cm = 96px/2.54"
    Cm(f32),
    /// "1mm = 1/10th of 1cm"
    Mm(f32),
    /// [§ 5.1.1 Font-relative lengths](https://www.w3.org/TR/css-values-4/#font-relative-lengths)
    /// "Equal to the computed value of the font-size property of the element"
    Em(f32),
    /// "Equal to the computed value of the font-size property of the root element."
    Rem(f32),
    /// [§ 5.1.2 Viewport-percentage lengths](https://www.w3.org/TR/css-values-4/#viewport-relative-lengths)
    /// "1vw = 1% of viewport width"
    Vw(f32),
    /// "1vh = 1% of viewport height"
    Vh(f32),
    /// [§ 4.3 Percentages](https://www.w3.org/TR/css-values-4/#percentages)
    /// "Percentages are always relative to another quantity"
    Percent(f32),
}

impl LengthValue {
    /// Zero pixels.
    pub const ZERO: Self = Self::Px(0.0);

    /// Resolve to pixels.
    ///
    /// `reference` is what a percentage is relative to (usually the
    /// containing block's width).
    #[must_use]
    pub fn to_px(&self, reference: f32, ctx: &LengthContext) -> f32 {
        match *self {
            Self::Px(px) => px,
            Self::Pt(pt) => pt * PX_PER_INCH / 72.0,
            Self::Pc(pc) => pc * PX_PER_INCH / 6.0,
            Self::In(inches) => inches * PX_PER_INCH,
            Self::Cm(cm) => cm * PX_PER_INCH / 2.54,
            Self::Mm(mm) => mm * PX_PER_INCH / 25.4,
            Self::Em(em) => em * ctx.font_size,
            Self::Rem(rem) => rem * ctx.root_font_size,
            Self::Vw(vw) => vw * ctx.viewport_width / 100.0,
            Self::Vh(vh) => vh * ctx.viewport_height / 100.0,
            Self::Percent(pct) => pct * reference / 100.0,
        }
    }

    /// Whether this length needs a containing block to resolve.
    #[must_use]
    pub const fn is_percent(&self) -> bool {
        matches!(self, Self::Percent(_))
    }

    /// Absolute lengths become pixels; relative ones are returned as is.
    #[must_use]
    pub fn absolutize(self) -> Self {
        match self {
            Self::Pt(_) | Self::Pc(_) | Self::In(_) | Self::Cm(_) | Self::Mm(_) => {
                Self::Px(self.to_px(0.0, &LengthContext::default()))
            }
            other => other,
        }
    }

    /// CSS text for this length, used by HTML export.
    #[must_use]
    pub fn to_css_string(&self) -> String {
        let (value, unit) = match *self {
            Self::Px(v) => (v, "px"),
            Self::Pt(v) => (v, "pt"),
            Self::Pc(v) => (v, "pc"),
            Self::In(v) => (v, "in"),
            Self::Cm(v) => (v, "cm"),
            Self::Mm(v) => (v, "mm"),
            Self::Em(v) => (v, "em"),
            Self::Rem(v) => (v, "rem"),
            Self::Vw(v) => (v, "vw"),
            Self::Vh(v) => (v, "vh"),
            Self::Percent(v) => (v, "%"),
        };
        format!("{}{unit}", format_number(value))
    }
}

/// Shortest decimal form of `value` (no trailing `.0`).
pub(crate) fn format_number(value: f32) -> String {
    if (value - value.round()).abs() < 1e-4 {
        format!("{}", value.round() as i64)
    } else {
        let text = format!("{value:.3}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// [§ 4.4 Automatic values](https://www.w3.org/TR/CSS2/cascade.html#value-def-auto)
///
/// "Some properties can take the keyword 'auto' as a value. This keyword
/// allows the user agent to compute the value based on other properties."
///
/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// "If both 'margin-left' and 'margin-right' are 'auto', their used values
/// are equal. This horizontally centers the element with respect to the
/// edges of the containing block."
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AutoLength {
    /// The value is 'auto' and will be resolved during layout.
    Auto,
    /// A specific length value (px, em, etc.).
    Length(LengthValue),
}

impl AutoLength {
    /// Zero pixels.
    pub const ZERO: Self = Self::Length(LengthValue::ZERO);

    /// Check if the value is 'auto'.
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// Resolve to pixels; `None` for 'auto'.
    #[must_use]
    pub fn to_px(&self, reference: f32, ctx: &LengthContext) -> Option<f32> {
        match self {
            Self::Auto => None,
            Self::Length(len) => Some(len.to_px(reference, ctx)),
        }
    }

    /// Resolve to pixels, or 0.0 for 'auto'.
    #[must_use]
    pub fn to_px_or_zero(&self, reference: f32, ctx: &LengthContext) -> f32 {
        self.to_px(reference, ctx).unwrap_or(0.0)
    }

    /// CSS text for this value.
    #[must_use]
    pub fn to_css_string(&self) -> String {
        match self {
            Self::Auto => "auto".to_string(),
            Self::Length(len) => len.to_css_string(),
        }
    }
}

/// Outcome of parsing one component value as a length.
#[derive(Debug, Clone, PartialEq)]
pub enum LengthParse {
    /// A valid length.
    Length(LengthValue),
    /// A dimension with a unit this engine does not know.
    UnknownUnit(String),
    /// Not a length at all.
    NotALength,
}

/// [§ 4.1 Lengths](https://www.w3.org/TR/css-values-4/#lengths)
/// Parse a single component value as a `<length>` or `<percentage>`.
///
/// Unitless zero is a length; unitless non-zero numbers are accepted as
/// pixels, matching the quirks-mode behaviour of legacy documents.
#[must_use]
pub fn parse_length(v: &ComponentValue) -> LengthParse {
    match v {
        ComponentValue::Dimension { value, unit } => {
            let value = *value;
            let length = match unit.as_str() {
                "px" => LengthValue::Px(value),
                "pt" => LengthValue::Pt(value),
                "pc" => LengthValue::Pc(value),
                "in" => LengthValue::In(value),
                "cm" => LengthValue::Cm(value),
                "mm" => LengthValue::Mm(value),
                "em" => LengthValue::Em(value),
                "rem" => LengthValue::Rem(value),
                "vw" => LengthValue::Vw(value),
                "vh" => LengthValue::Vh(value),
                other => return LengthParse::UnknownUnit(other.to_string()),
            };
            LengthParse::Length(length)
        }
        ComponentValue::Percentage(value) => LengthParse::Length(LengthValue::Percent(*value)),
        ComponentValue::Number(value) => LengthParse::Length(LengthValue::Px(*value)),
        _ => LengthParse::NotALength,
    }
}

/// Parse a single component value as a length, dropping unknown units.
#[must_use]
pub fn parse_single_length(v: &ComponentValue) -> Option<LengthValue> {
    match parse_length(v) {
        LengthParse::Length(len) => Some(len),
        LengthParse::UnknownUnit(_) | LengthParse::NotALength => None,
    }
}

/// Parse a single component value as 'auto' or a length.
#[must_use]
pub fn parse_single_auto_length(v: &ComponentValue) -> Option<AutoLength> {
    if v.is_ident("auto") {
        return Some(AutoLength::Auto);
    }
    parse_single_length(v).map(AutoLength::Length)
}

/// Parse a length from raw declaration text such as `"2em"`.
///
/// Returns `None` unless the text is exactly one length.
#[must_use]
pub fn parse_length_str(text: &str) -> Option<LengthValue> {
    match crate::parser::parse_component_values(text).as_slice() {
        [single] => parse_single_length(single),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_units() {
        let ctx = LengthContext::default();
        assert!((LengthValue::In(1.0).to_px(0.0, &ctx) - 96.0).abs() < 1e-4);
        assert!((LengthValue::Pt(72.0).to_px(0.0, &ctx) - 96.0).abs() < 1e-4);
        assert!((LengthValue::Pc(1.0).to_px(0.0, &ctx) - 16.0).abs() < 1e-4);
        assert!((LengthValue::Mm(25.4).to_px(0.0, &ctx) - 96.0).abs() < 1e-3);
    }

    #[test]
    fn test_unknown_unit_is_reported() {
        let v = ComponentValue::Dimension {
            value: 2.0,
            unit: "ex".into(),
        };
        assert_eq!(parse_length(&v), LengthParse::UnknownUnit("ex".into()));
    }

    #[test]
    fn test_css_string() {
        assert_eq!(LengthValue::Px(12.0).to_css_string(), "12px");
        assert_eq!(LengthValue::Em(1.5).to_css_string(), "1.5em");
        assert_eq!(AutoLength::Auto.to_css_string(), "auto");
    }
}
