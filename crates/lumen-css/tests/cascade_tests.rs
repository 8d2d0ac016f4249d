//! Integration tests for stylesheet parsing, selector matching and the
//! cascade, run against parsed HTML documents.

use lumen_common::WarningLog;
use lumen_css::style::values::{BorderStyle, DisplayKind, TextAlign};
use lumen_css::{
    AutoLength, ColorValue, ComputedStyle, CssData, LengthValue, Origin, StyleMap, compute_styles,
    default_stylesheet, parse_selector,
};
use lumen_dom::{DomTree, NodeId};

/// Helper: parse `html` and cascade the UA sheet plus `author` over it.
fn style_html(html: &str, author: &str) -> (DomTree, StyleMap) {
    let (dom, _) = lumen_html::parse_html(html);
    let warnings = WarningLog::new();
    let mut css = default_stylesheet(None, "screen", &warnings);
    css.parse_into(author, Origin::Author, "screen", &warnings);
    let styles = compute_styles(&dom, &css, None, &ComputedStyle::default(), &warnings);
    (dom, styles)
}

fn node(dom: &DomTree, id: &str) -> NodeId {
    dom.element_by_id(id).unwrap_or_else(|| panic!("no element #{id}"))
}

// ---------------------------------------------------------------------------
// Stylesheet parsing
// ---------------------------------------------------------------------------

/// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
///
/// An unmatched `{` ends parsing; the complete rules before it survive.
#[test]
fn test_unmatched_brace_keeps_earlier_blocks() {
    let warnings = WarningLog::new();
    let css = CssData::parse(
        "p { color: red } div { color: blue } span { color: green",
        Origin::Author,
        "screen",
        &warnings,
    );
    assert_eq!(css.blocks_for("p").len(), 1);
    assert_eq!(css.blocks_for("div").len(), 1);
    assert!(css.blocks_for("span").is_empty());
    assert!(!warnings.is_empty());
}

/// Rules inside a `@media` block for another media type are dropped.
#[test]
fn test_media_type_filtering() {
    let warnings = WarningLog::new();
    let css = CssData::parse(
        "@media print { p { color: red } } @media screen { div { color: blue } }",
        Origin::Author,
        "screen",
        &warnings,
    );
    assert!(css.blocks_for("p").is_empty());
    assert_eq!(css.blocks_for("div").len(), 1);
}

/// Unsupported selectors are skipped with a warning; the rest of the list
/// still applies.
#[test]
fn test_unsupported_selector_in_list() {
    let (dom, styles) = style_html(
        "<body><p id=p>x</p></body>",
        "a[href], p { color: #0a0 }",
    );
    assert_eq!(styles[&node(&dom, "p")].color, ColorValue::rgb(0, 0xaa, 0));
}

// ---------------------------------------------------------------------------
// Selector matching
// ---------------------------------------------------------------------------

/// [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
/// and [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators)
#[test]
fn test_combinators_match_in_tree() {
    let (dom, _) = lumen_html::parse_html(
        "<body><div class=box><ul><li id=deep>x</li></ul></div><ul><li id=other>y</li></ul></body>",
    );
    let deep = node(&dom, "deep");
    let other = node(&dom, "other");

    let descendant = parse_selector(".box li").expect("valid selector");
    assert!(descendant.matches_in_tree(&dom, deep, None));
    assert!(!descendant.matches_in_tree(&dom, other, None));

    let child = parse_selector("div > li").expect("valid selector");
    assert!(!child.matches_in_tree(&dom, deep, None));

    let chain = parse_selector("div.box > ul > li#deep").expect("valid selector");
    assert!(chain.matches_in_tree(&dom, deep, None));
}

/// [§ 9.2 The pointer hover pseudo-class](https://www.w3.org/TR/selectors-4/#the-hover-pseudo)
///
/// "An element also matches :hover if one of its descendants ... matches
/// :hover."
#[test]
fn test_hover_matches_ancestors_of_hovered() {
    let (dom, _) = lumen_html::parse_html("<body><div id=d><a id=a href=x>x</a></div><p id=p>y</p></body>");
    let selector = parse_selector("div:hover").expect("valid selector");
    let d = node(&dom, "d");
    assert!(!selector.matches_in_tree(&dom, d, None));
    assert!(selector.matches_in_tree(&dom, d, Some(node(&dom, "a"))));
    assert!(!selector.matches_in_tree(&dom, d, Some(node(&dom, "p"))));
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// [§ 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// Specificity outranks source order; source order breaks ties.
#[test]
fn test_specificity_then_order() {
    let (dom, styles) = style_html(
        "<body><p id=a class=c>x</p><p id=b>y</p></body>",
        "p.c { color: red } p { color: blue } p { color: green }",
    );
    assert_eq!(styles[&node(&dom, "a")].color, ColorValue::rgb(255, 0, 0));
    assert_eq!(styles[&node(&dom, "b")].color, ColorValue::rgb(0, 128, 0));
}

/// Author rules override the user-agent sheet.
#[test]
fn test_author_overrides_user_agent() {
    let (dom, styles) = style_html("<body><h1 id=h>x</h1></body>", "h1 { font-weight: normal }");
    assert_eq!(styles[&node(&dom, "h")].font_weight, 400);
}

/// The `style` attribute beats selectors, but not `!important` ones.
#[test]
fn test_inline_style_and_important() {
    let (dom, styles) = style_html(
        "<body><p id=p style='color: blue; text-align: right'>x</p></body>",
        "#p { color: red; text-align: center !important }",
    );
    let p = &styles[&node(&dom, "p")];
    assert_eq!(p.color, ColorValue::rgb(0, 0, 255));
    assert_eq!(p.text_align, Some(TextAlign::Center));
}

/// [§ 7 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting)
///
/// Inherited properties flow down; non-inherited ones do not.
#[test]
fn test_inheritance() {
    let (dom, styles) = style_html(
        "<body><div id=d><span id=s>x</span></div></body>",
        "div { color: #123456; border: 1px solid red; font-size: 20px } span { font-size: 2em }",
    );
    let span = &styles[&node(&dom, "s")];
    assert_eq!(span.color, ColorValue::rgb(0x12, 0x34, 0x56));
    assert!(span.border.top.style.is_none());
    assert!((span.font_size - 40.0).abs() < 1e-4);
    assert_eq!(styles[&node(&dom, "d")].border.top.style, BorderStyle::Solid);
}

/// [§ 7.3 Explicit Defaulting](https://www.w3.org/TR/css-cascade-4/#defaulting-keywords)
#[test]
fn test_inherit_keyword_on_non_inherited_property() {
    let (dom, styles) = style_html(
        "<body><div id=d><p id=p>x</p></div></body>",
        "div { width: 120px } p { width: inherit }",
    );
    assert_eq!(
        styles[&node(&dom, "p")].width,
        AutoLength::Length(LengthValue::Px(120.0))
    );
}

/// Presentational hints sit below author rules.
#[test]
fn test_presentational_hints_lose_to_author_rules() {
    let (dom, styles) = style_html(
        "<body><table><tr><td id=a bgcolor=red>a</td><td id=b bgcolor=red>b</td></tr></table></body>",
        "#b { background-color: blue }",
    );
    assert_eq!(styles[&node(&dom, "a")].background_color, ColorValue::rgb(255, 0, 0));
    assert_eq!(styles[&node(&dom, "b")].background_color, ColorValue::rgb(0, 0, 255));
}

/// [§ 15.3.1 Hidden elements](https://html.spec.whatwg.org/multipage/rendering.html#hidden-elements)
#[test]
fn test_user_agent_display_values() {
    let (dom, styles) = style_html(
        "<body><div id=d>x</div><span id=s>y</span><li id=l>z</li><p id=h hidden>w</p></body>",
        "",
    );
    assert_eq!(styles[&node(&dom, "d")].display, DisplayKind::Block);
    assert_eq!(styles[&node(&dom, "s")].display, DisplayKind::Inline);
    assert_eq!(styles[&node(&dom, "l")].display, DisplayKind::ListItem);
    assert_eq!(styles[&node(&dom, "h")].display, DisplayKind::None);
}

/// Invalid declarations are dropped without disturbing valid ones.
#[test]
fn test_invalid_declaration_is_ignored() {
    let (dom, styles) = style_html(
        "<body><p id=p>x</p></body>",
        "p { color: notacolor; width: 10zz; margin-left: 5px }",
    );
    let p = &styles[&node(&dom, "p")];
    assert_eq!(p.color, ColorValue::BLACK);
    assert!(p.width.is_auto());
    assert_eq!(p.margin.left, AutoLength::Length(LengthValue::Px(5.0)));
}
