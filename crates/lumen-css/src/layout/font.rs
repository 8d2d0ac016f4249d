//! Text measurement interface.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."
//!
//! Layout never touches font files; it asks a [`FontMetrics`] implementation
//! for advances and vertical metrics.

use serde::Serialize;

/// A font request: family, pixel size and style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSpec {
    /// Preferred family name as written in CSS.
    pub family: String,
    /// Size in pixels.
    pub size: f32,
    /// Weight 600 or more.
    pub bold: bool,
    /// `italic` or `oblique`.
    pub italic: bool,
}

impl FontSpec {
    /// A regular font of `size` pixels.
    #[must_use]
    pub fn regular(family: &str, size: f32) -> Self {
        Self {
            family: family.to_string(),
            size,
            bold: false,
            italic: false,
        }
    }
}

/// Vertical metrics of a font.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineMetrics {
    /// Height above the baseline.
    pub ascent: f32,
    /// Depth below the baseline (positive).
    pub descent: f32,
    /// Used value of `line-height: normal`.
    pub line_height: f32,
    /// Distance of the underline below the baseline.
    pub underline_offset: f32,
}

/// Font metrics interface for text measurement during layout.
///
/// Implementors must be deterministic: the same text and font always
/// measure the same, or repeated layouts would not agree.
pub trait FontMetrics {
    /// Total advance width of `text`.
    fn text_width(&self, text: &str, font: &FontSpec) -> f32;

    /// Vertical metrics of `font`.
    fn line_metrics(&self, font: &FontSpec) -> LineMetrics;
}

/// Approximate font metrics using fixed ratios.
///
/// The average advance of Latin glyphs in a proportional font is about
/// 0.6× the font size. Line height uses 1.2×, the upper end of the
/// recommended range for `line-height: normal`: "We recommend a used value
/// for 'normal' between 1.0 and 1.2."
///
/// Used when no font is available, and by tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl ApproximateFontMetrics {
    const CHAR_WIDTH_RATIO: f32 = 0.6;
    const ASCENT_RATIO: f32 = 0.8;
    const DESCENT_RATIO: f32 = 0.2;
    const LINE_HEIGHT_RATIO: f32 = 1.2;
}

impl FontMetrics for ApproximateFontMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * font.size * Self::CHAR_WIDTH_RATIO
    }

    fn line_metrics(&self, font: &FontSpec) -> LineMetrics {
        LineMetrics {
            ascent: font.size * Self::ASCENT_RATIO,
            descent: font.size * Self::DESCENT_RATIO,
            line_height: font.size * Self::LINE_HEIGHT_RATIO,
            underline_offset: font.size * 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approximate_metrics() {
        let font = FontSpec::regular("serif", 10.0);
        let metrics = ApproximateFontMetrics;
        assert!((metrics.text_width("abc", &font) - 18.0).abs() < 1e-4);
        let lm = metrics.line_metrics(&font);
        assert!((lm.line_height - 12.0).abs() < 1e-4);
        assert!((lm.ascent + lm.descent - 10.0).abs() < 1e-4);
    }
}
