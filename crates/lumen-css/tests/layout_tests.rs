//! Integration tests for box generation and layout, driven from HTML source.

use std::collections::HashMap;

use lumen_common::WarningLog;
use lumen_css::layout::{FragmentKind, MAX_BOX_DEPTH};
use lumen_css::{
    ApproximateFontMetrics, BoxType, ComputedStyle, LayoutBox, LayoutContext, Origin, StylesheetSource,
    build_box_tree, collect_stylesheet_sources, compute_styles, default_stylesheet, layout_document,
};
use lumen_dom::DomTree;

/// Helper: parse HTML, cascade the UA sheet and `<style>` elements, build
/// the box tree and lay it out in a `vw` x `vh` viewport.
fn layout_html_with_viewport(html: &str, vw: f32, vh: f32) -> (DomTree, LayoutBox) {
    let (dom, _) = lumen_html::parse_html(html);
    let warnings = WarningLog::new();
    let mut css = default_stylesheet(None, "screen", &warnings);
    for source in collect_stylesheet_sources(&dom) {
        if let StylesheetSource::Inline { text } = source {
            css.parse_into(&text, Origin::Author, "screen", &warnings);
        }
    }
    let base = ComputedStyle::default();
    let styles = compute_styles(&dom, &css, None, &base, &warnings);
    let mut root = build_box_tree(&dom, &styles, &base, &warnings);
    let images = HashMap::new();
    let ctx = LayoutContext {
        viewport: (vw, vh),
        fonts: &ApproximateFontMetrics,
        images: &images,
        warnings: &warnings,
        placeholder_size: 20.0,
        root_font_size: base.font_size,
    };
    let _ = layout_document(&mut root, &ctx);
    (dom, root)
}

/// Helper: lay out in an 800 x 600 viewport.
fn layout_html(html: &str) -> (DomTree, LayoutBox) {
    layout_html_with_viewport(html, 800.0, 600.0)
}

/// Helper: the principal box of the element with `id`.
fn box_by_id<'a>(dom: &DomTree, root: &'a LayoutBox, id: &str) -> &'a LayoutBox {
    let node = dom.element_by_id(id).unwrap_or_else(|| panic!("no element #{id}"));
    root.find_node(node).unwrap_or_else(|| panic!("no box for #{id}"))
}

fn words(b: &LayoutBox) -> Vec<Vec<String>> {
    b.lines
        .iter()
        .map(|line| {
            line.fragments
                .iter()
                .filter_map(|f| match &f.kind {
                    FragmentKind::Word(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

// ---------------------------------------------------------------------------
// Inline formatting
// ---------------------------------------------------------------------------

/// [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// `<p>Hello <b>World</b></p>` at 200px: one line, two fragments, the
/// paragraph one line tall, the body holding it plus its margins.
#[test]
fn test_hello_world_single_line() {
    let (dom, root) = layout_html_with_viewport("<body><p id=p>Hello <b>World</b></p></body>", 200.0, 0.0);
    let p = box_by_id(&dom, &root, "p");

    // body margin 8px each side.
    assert!(approx(p.dimensions.content.width, 184.0));
    assert_eq!(p.lines.len(), 1);
    let line = &p.lines[0];
    assert_eq!(line.fragments.len(), 2);

    // 16px approximate glyphs are 9.6px wide; "Hello" plus one space.
    let world = &line.fragments[1];
    assert_eq!(world.text(), Some("World"));
    assert!(approx(world.rect.x - p.dimensions.content.x, 57.6));
    assert!(world.style.font.bold);

    // line-height: normal is 1.2em.
    assert!(approx(p.dimensions.content.height, 19.2));
    let body = &root.children[0];
    assert!(approx(body.dimensions.content.height, 19.2 + 16.0 + 16.0));
}

/// [§ 4.2 'line-height'](https://www.w3.org/TR/css-inline-3/#line-height-property)
///
/// A length, a number and the `font` shorthand's `/line-height` each set
/// the height of a one-line paragraph.
#[test]
fn test_line_height_forms() {
    let (dom, root) = layout_html(
        "<body><p id=a style='line-height: 30px'>x</p><p id=b style='line-height: 2'>x</p>\
         <p id=c style='font: 10px/2 serif'>x</p></body>",
    );
    assert!(approx(box_by_id(&dom, &root, "a").dimensions.content.height, 30.0));
    assert!(approx(box_by_id(&dom, &root, "b").dimensions.content.height, 32.0));
    assert!(approx(box_by_id(&dom, &root, "c").dimensions.content.height, 20.0));
}

/// Fragments serialize with the id of the box they came from.
#[test]
fn test_fragment_serializes_source_box() {
    let (dom, root) = layout_html("<body><p id=p>hi</p></body>");
    let fragment = &box_by_id(&dom, &root, "p").lines[0].fragments[0];
    let value = serde_json::to_value(fragment).unwrap();
    assert_eq!(value["source"], serde_json::json!(fragment.source.0));
    assert_eq!(value["kind"], serde_json::json!({ "Word": "hi" }));
}

/// [§ 5.1 Line Breaking Details](https://www.w3.org/TR/css-text-3/#line-break-details)
///
/// A soft wrap opportunity at the space puts "dog" on a second line.
#[test]
fn test_words_wrap_at_spaces() {
    let (dom, root) = layout_html("<body><div id=d style='width: 57.6px'>cat dog</div></body>");
    let div = box_by_id(&dom, &root, "d");
    assert_eq!(words(div), vec![vec!["cat".to_string()], vec!["dog".to_string()]]);
    assert!(div.lines[1].rect.y > div.lines[0].rect.y);
    assert!(approx(div.dimensions.content.height, 2.0 * 19.2));
}

/// A word wider than the line is placed alone rather than dropped.
#[test]
fn test_overlong_word_overflows() {
    let (dom, root) = layout_html("<body><div id=d style='width: 20px'>elephant</div></body>");
    let div = box_by_id(&dom, &root, "d");
    assert_eq!(words(div), vec![vec!["elephant".to_string()]]);
}

/// [§ 16.6 White space](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
///
/// `pre` keeps newlines as forced breaks.
#[test]
fn test_pre_preserves_newlines() {
    let (dom, root) = layout_html("<body><pre id=p>one\ntwo\nthree</pre></body>");
    let pre = box_by_id(&dom, &root, "p");
    assert_eq!(pre.lines.len(), 3);
}

/// `<br>` forces a break even where the line has room.
#[test]
fn test_br_breaks_line() {
    let (dom, root) = layout_html("<body><p id=p>a<br>b</p></body>");
    let p = box_by_id(&dom, &root, "p");
    assert_eq!(p.lines.len(), 2);
    assert!(p.lines[0].forced_break);
}

/// [§ 16.2 Alignment](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[test]
fn test_text_align_center() {
    let (dom, root) = layout_html_with_viewport(
        "<body style='margin: 0'><p id=p style='text-align: center; margin: 0'>ab</p></body>",
        100.0,
        0.0,
    );
    let p = box_by_id(&dom, &root, "p");
    let fragment = &p.lines[0].fragments[0];
    // "ab" is 19.2px wide in a 100px line.
    assert!(approx(fragment.rect.x, (100.0 - 19.2) / 2.0));
}

/// `vertical-align: sub` lowers the baseline by a fifth of the font size.
#[test]
fn test_subscript_lowers_baseline() {
    let (dom, root) = layout_html("<body><p id=p>x<sub>2</sub></p></body>");
    let p = box_by_id(&dom, &root, "p");
    let line = &p.lines[0];
    let base = line.fragments[0].baseline;
    let sub = line.fragments[1].baseline;
    assert!(sub > base, "subscript baseline {sub} should be below {base}");
}

// ---------------------------------------------------------------------------
// Block formatting
// ---------------------------------------------------------------------------

/// [§ 8.3.1](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// Two adjacent siblings with positive margins: the gap between their border
/// edges is `max(mb_A, mt_B)`, not `mb_A + mt_B`.
#[test]
fn test_sibling_margin_collapsing() {
    let (dom, root) = layout_html("<body><h1 id=a>A</h1><p id=b>B</p></body>");
    let h1 = box_by_id(&dom, &root, "a");
    let p = box_by_id(&dom, &root, "b");
    let gap = p.dimensions.border_box().y - h1.dimensions.border_box().bottom();
    let expected = h1.dimensions.margin.bottom.max(p.dimensions.margin.top);
    assert!(approx(gap, expected), "gap {gap} should be {expected}");
}

/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// "If both 'margin-left' and 'margin-right' are 'auto', their used values
/// are equal."
#[test]
fn test_auto_margins_center_block() {
    let (dom, root) = layout_html(
        "<body style='margin: 0'><div id=d style='width: 200px; margin: 0 auto'>x</div></body>",
    );
    let div = box_by_id(&dom, &root, "d");
    assert!(approx(div.dimensions.content.x, 300.0));
    assert!(approx(div.dimensions.margin.left, div.dimensions.margin.right));
}

/// [§ 10.2 Content width](https://www.w3.org/TR/CSS2/visudet.html#the-width-property)
///
/// A percentage width is relative to the containing block.
#[test]
fn test_percentage_width() {
    let (dom, root) = layout_html("<body style='margin: 0'><div id=d style='width: 50%'>x</div></body>");
    let div = box_by_id(&dom, &root, "d");
    assert!(approx(div.dimensions.content.width, 400.0));
}

/// [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
#[test]
fn test_padding_and_border_surround_content() {
    let (dom, root) = layout_html(
        "<body style='margin: 0'><div id=d style='padding: 5px; border: 2px solid black; width: 100px'>x</div></body>",
    );
    let div = box_by_id(&dom, &root, "d");
    let border_box = div.dimensions.border_box();
    assert!(approx(border_box.width, 114.0));
    assert!(approx(div.dimensions.content.x, 7.0));
}

/// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
///
/// A float holding only an image shrinks to the image's width.
#[test]
fn test_float_shrinks_to_image_width() {
    let (dom, root) = layout_html("<body><div id=f style='float: left'><img style='width: 30px; height: 10px'></div></body>");
    assert!(approx(box_by_id(&dom, &root, "f").dimensions.content.width, 30.0));
}

/// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
///
/// Line boxes next to a left float are shortened.
#[test]
fn test_text_flows_around_float() {
    let (dom, root) = layout_html(
        "<body style='margin: 0'><div id=d><div style='float: left; width: 100px; height: 50px'></div>text</div></body>",
    );
    let div = box_by_id(&dom, &root, "d");
    let anon = div
        .children
        .iter()
        .find(|c| !c.lines.is_empty())
        .unwrap_or_else(|| panic!("no line box holder in #d"));
    assert_eq!(words(anon), vec![vec!["text".to_string()]]);
    assert!(approx(anon.lines[0].fragments[0].rect.x, 100.0));
}

/// Nesting past the box depth limit keeps the text of the deepest elements
/// and records a warning instead of recursing further.
#[test]
fn test_deep_nesting_is_flattened() {
    let depth = 300;
    let html = format!("<body>{}deep{}</body>", "<div>".repeat(depth), "</div>".repeat(depth));
    let (dom, _) = lumen_html::parse_html(&html);
    let warnings = WarningLog::new();
    let css = default_stylesheet(None, "screen", &warnings);
    let base = ComputedStyle::default();
    let styles = compute_styles(&dom, &css, None, &base, &warnings);
    let root = build_box_tree(&dom, &styles, &base, &warnings);

    let mut max_depth = 0;
    let mut texts = Vec::new();
    let mut stack = vec![(&root, 0)];
    while let Some((b, level)) = stack.pop() {
        max_depth = max_depth.max(level);
        if let Some(text) = b.text() {
            texts.push(text.to_string());
        }
        stack.extend(b.children.iter().map(|c| (c, level + 1)));
    }
    assert!(max_depth <= MAX_BOX_DEPTH + 2, "{max_depth}");
    assert_eq!(texts, ["deep"]);
    assert!(warnings.warnings().iter().any(|w| w.component == "Layout"));
}

/// [§ 12.5 Lists](https://www.w3.org/TR/CSS2/generate.html#lists)
#[test]
fn test_ordered_list_markers() {
    let (dom, root) = layout_html("<body><ol start=3><li id=a>a</li><li id=b>b</li></ol></body>");
    let b = box_by_id(&dom, &root, "b");
    assert_eq!(b.marker, Some(lumen_css::layout::ListMarker::Text("4.".to_string())));
}

/// `display: none` generates no box at all.
#[test]
fn test_display_none_has_no_box() {
    let (dom, root) = layout_html("<body><div id=d style='display: none'>x</div></body>");
    let node = dom.element_by_id("d").expect("element exists");
    assert!(root.find_node(node).is_none());
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
///
/// A `rowspan=2` cell leaves exactly one spacing box in the second row, and
/// its height is not counted in both rows.
#[test]
fn test_rowspan_spacing_box() {
    let (dom, root) = layout_html(
        "<body><table id=t><tr><td id=a rowspan=2 style='height: 100px'>A</td><td>B</td></tr>\
         <tr id=r2><td>C</td></tr></table></body>",
    );
    let row2 = box_by_id(&dom, &root, "r2");
    let spacing: Vec<_> = row2.children.iter().filter(|c| c.is_spacing()).collect();
    assert_eq!(spacing.len(), 1);
    let a = box_by_id(&dom, &root, "a");
    assert!(matches!(spacing[0].box_type, BoxType::Spacing { cell, .. } if cell == a.id));

    // Cell A's border box is 102px (1px padding); with 2px spacing the
    // table is 2 + 21.2 + 2 + 78.8 + 2.
    let table = box_by_id(&dom, &root, "t");
    assert!(
        approx(table.dimensions.content.height, 106.0),
        "table height {}",
        table.dimensions.content.height
    );
    assert!(approx(a.dimensions.border_box().bottom(), row2.dimensions.content.bottom()));
}

/// [§ 17.5.2.2 Automatic table layout](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
///
/// Columns are as wide as their widest content when there is room.
#[test]
fn test_table_columns_fit_content() {
    let (dom, root) = layout_html(
        "<body><table><tr><td id=a>aaaa</td><td id=b>b</td></tr><tr><td>a</td><td>bb</td></tr></table></body>",
    );
    let a = box_by_id(&dom, &root, "a");
    let b = box_by_id(&dom, &root, "b");
    // Content plus 1px padding on each side.
    assert!(approx(a.dimensions.border_box().width, 4.0 * 9.6 + 2.0));
    assert!(approx(b.dimensions.border_box().width, 2.0 * 9.6 + 2.0));
    assert!(b.dimensions.border_box().x > a.dimensions.border_box().right());
}

/// A colspan cell covers both columns.
#[test]
fn test_colspan_covers_columns() {
    let (dom, root) = layout_html(
        "<body><table><tr><td id=w colspan=2>wide</td></tr><tr><td id=a>a</td><td id=b>b</td></tr></table></body>",
    );
    let w = box_by_id(&dom, &root, "w");
    let a = box_by_id(&dom, &root, "a");
    let b = box_by_id(&dom, &root, "b");
    assert!(approx(w.dimensions.border_box().x, a.dimensions.border_box().x));
    assert!(approx(w.dimensions.border_box().right(), b.dimensions.border_box().right()));
}

// ---------------------------------------------------------------------------
// Replaced and positioned
// ---------------------------------------------------------------------------

/// An image whose size is unknown takes the placeholder size.
#[test]
fn test_unloaded_image_uses_placeholder() {
    let (dom, root) = layout_html("<body><img id=i src='missing.png'></body>");
    let img = box_by_id(&dom, &root, "i");
    assert!(approx(img.dimensions.content.width, 20.0));
    assert!(approx(img.dimensions.content.height, 20.0));
}

/// `width`/`height` attributes size the image without loading it.
#[test]
fn test_image_dimension_attributes() {
    let (dom, root) = layout_html("<body><img id=i src='x.png' width=64 height=32></body>");
    let img = box_by_id(&dom, &root, "i");
    assert!(approx(img.dimensions.content.width, 64.0));
    assert!(approx(img.dimensions.content.height, 32.0));
}

/// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
#[test]
fn test_relative_offset_moves_box() {
    let (dom, root) = layout_html(
        "<body><div id=a>a</div><div id=b style='position: relative; left: 10px; top: 5px'>b</div></body>",
    );
    let a = box_by_id(&dom, &root, "a");
    let b = box_by_id(&dom, &root, "b");
    assert!(approx(b.dimensions.content.x - a.dimensions.content.x, 10.0));
    assert!(approx(b.dimensions.content.y - a.dimensions.border_box().bottom(), 5.0));
}

/// [§ 10.3.7 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
///
/// With no positioned ancestor the containing block is the viewport.
#[test]
fn test_absolute_box_against_viewport() {
    let (dom, root) = layout_html(
        "<body><div id=a style='position: absolute; right: 10px; bottom: 20px; width: 50px; height: 30px'></div></body>",
    );
    let a = box_by_id(&dom, &root, "a");
    let border_box = a.dimensions.border_box();
    assert!(approx(border_box.right(), 790.0));
    assert!(approx(border_box.bottom(), 580.0));
}

// ---------------------------------------------------------------------------
// Whole-document properties
// ---------------------------------------------------------------------------

/// Laying out the same tree twice gives the same geometry.
#[test]
fn test_layout_is_idempotent() {
    let html = "<body><p>Some <b>bold</b> and <i>italic</i> text that wraps.</p>\
                <table><tr><td rowspan=2>x</td><td>y</td></tr><tr><td>z</td></tr></table>\
                <div style='float: right; width: 30px'>f</div><ul><li>one</li></ul></body>";
    let (dom, mut root) = layout_html_with_viewport(html, 120.0, 0.0);
    let first = root.dump(Some(&dom));

    let warnings = WarningLog::new();
    let images = HashMap::new();
    let ctx = LayoutContext {
        viewport: (120.0, 0.0),
        fonts: &ApproximateFontMetrics,
        images: &images,
        warnings: &warnings,
        placeholder_size: 20.0,
        root_font_size: 16.0,
    };
    let _ = layout_document(&mut root, &ctx);
    assert_eq!(root.dump(Some(&dom)), first);
}

/// Fragments are numbered in document order without gaps.
#[test]
fn test_fragments_numbered_in_document_order() {
    let (_, root) = layout_html("<body><p>a b</p><p>c <img src=x> d</p></body>");
    let mut indices = Vec::new();
    root.walk(&mut |b| indices.extend(b.lines.iter().flat_map(|l| l.fragments.iter().map(|f| f.index))));
    let mut sorted = indices.clone();
    sorted.sort_unstable();
    assert_eq!(indices, sorted);
    assert_eq!(sorted, (0..sorted.len()).collect::<Vec<_>>());
}

/// An empty document still lays out.
#[test]
fn test_empty_document() {
    let (_, root) = layout_html("");
    assert!(root.dimensions.content.height >= 0.0);
}
