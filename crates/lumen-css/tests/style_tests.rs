//! Integration tests for length resolution and computed values.

use lumen_common::WarningLog;
use lumen_css::style::values::{LengthContext, parse_length_str};
use lumen_css::{ComputedStyle, CssData, LengthValue, Origin, compute_styles};
use lumen_dom::{DomTree, ElementData, NodeId};

fn px(text: &str, reference: f32, ctx: &LengthContext) -> f32 {
    parse_length_str(text)
        .unwrap_or_else(|| panic!("'{text}' should parse"))
        .to_px(reference, ctx)
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

/// [§ 6.1 Absolute lengths](https://www.w3.org/TR/css-values-4/#absolute-lengths)
#[test]
fn test_absolute_lengths() {
    let ctx = LengthContext::default();
    assert_close(px("10px", 0.0, &ctx), 10.0);
    assert_close(px("1in", 0.0, &ctx), 96.0);
    assert_close(px("1pt", 0.0, &ctx), 96.0 / 72.0);
    assert_close(px("1cm", 0.0, &ctx), 96.0 / 2.54);
    assert_close(px("1pc", 0.0, &ctx), 16.0);
    assert_close(px("0", 0.0, &ctx), 0.0);
}

/// [§ 5.1.1 Font-relative lengths](https://www.w3.org/TR/css-values-4/#font-relative-lengths)
/// and [§ 4.3 Percentages](https://www.w3.org/TR/css-values-4/#percentages)
#[test]
fn test_relative_lengths() {
    let ctx = LengthContext {
        font_size: 20.0,
        root_font_size: 10.0,
        viewport_width: 1000.0,
        viewport_height: 500.0,
    };
    assert_close(px("2em", 0.0, &ctx), 40.0);
    assert_close(px("2rem", 0.0, &ctx), 20.0);
    assert_close(px("50%", 300.0, &ctx), 150.0);
    assert_close(px("10vw", 0.0, &ctx), 100.0);
    assert_close(px("10vh", 0.0, &ctx), 50.0);
}

#[test]
fn test_unknown_unit_does_not_parse() {
    assert_eq!(parse_length_str("3furlongs"), None);
    assert_eq!(parse_length_str("12px 4px"), None);
    // Legacy documents write unitless pixels.
    assert_eq!(parse_length_str("12"), Some(LengthValue::Px(12.0)));
}

/// Font sizes in `em` resolve against the parent, so nesting compounds.
#[test]
fn test_nested_em_font_sizes_compound() {
    let mut tree = DomTree::new();
    let outer = tree.append_element(NodeId::ROOT, ElementData::new("div"));
    let inner = tree.append_element(outer, ElementData::new("div"));
    let warnings = WarningLog::new();
    let css = CssData::parse("div { font-size: 1.5em }", Origin::Author, "screen", &warnings);
    let styles = compute_styles(&tree, &css, None, &ComputedStyle::default(), &warnings);
    assert_close(styles[&outer].font_size, 24.0);
    assert_close(styles[&inner].font_size, 36.0);
}
