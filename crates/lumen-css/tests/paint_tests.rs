//! Integration tests for the paint dispatcher: clipping, paint order and
//! border rendering, checked on the display list.

use std::collections::{HashMap, HashSet};

use lumen_common::WarningLog;
use lumen_css::paint::{LineDash, PathElement};
use lumen_css::{
    ApproximateFontMetrics, ColorValue, ComputedStyle, DisplayCommand, DisplayList, LayoutBox, LayoutContext,
    PaintContext, Painter, Rect, build_box_tree, compute_styles, default_stylesheet, layout_document,
};
use lumen_dom::DomTree;

/// Helper: parse, style, lay out at 400 x 300 and paint the whole document.
fn paint_html(html: &str) -> (DomTree, LayoutBox, DisplayList) {
    let (dom, _) = lumen_html::parse_html(html);
    let warnings = WarningLog::new();
    let css = default_stylesheet(None, "screen", &warnings);
    let base = ComputedStyle::default();
    let styles = compute_styles(&dom, &css, None, &base, &warnings);
    let mut root = build_box_tree(&dom, &styles, &base, &warnings);
    let images = HashMap::new();
    let ctx = LayoutContext {
        viewport: (400.0, 300.0),
        fonts: &ApproximateFontMetrics,
        images: &images,
        warnings: &warnings,
        placeholder_size: 20.0,
        root_font_size: base.font_size,
    };
    let _ = layout_document(&mut root, &ctx);

    let failed = HashSet::new();
    let output = Painter::new(PaintContext {
        fonts: &ApproximateFontMetrics,
        images: &images,
        failed_images: &failed,
        selection: None,
        selection_text: ColorValue::WHITE,
        selection_background: ColorValue::rgb(0x33, 0x99, 0xff),
        visible: None,
        offset: (0.0, 0.0),
        root_font_size: base.font_size,
        viewport: (400.0, 300.0),
    })
    .paint(&root);
    (dom, root, output.list)
}

fn box_rect(dom: &DomTree, root: &LayoutBox, id: &str) -> Rect {
    let node = dom.element_by_id(id).unwrap_or_else(|| panic!("no element #{id}"));
    root.find_node(node)
        .unwrap_or_else(|| panic!("no box for #{id}"))
        .dimensions
        .padding_box()
}

/// Position of the first rectangle fill in `color`.
fn fill_position(list: &DisplayList, color: ColorValue) -> usize {
    list.commands()
        .iter()
        .position(|c| matches!(c, DisplayCommand::FillRect { color: fill, .. } if *fill == color))
        .unwrap_or_else(|| panic!("no fill in {color:?}"))
}

// ---------------------------------------------------------------------------
// Overflow
// ---------------------------------------------------------------------------

/// [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
///
/// A block's own lines are drawn inside its clip, not only its children.
#[test]
fn test_overflow_hidden_clips_own_text() {
    let (dom, root, list) =
        paint_html("<div id=d style='overflow: hidden; height: 10px; width: 50px'>aaaa bbbb cccc dddd</div>");
    let clip = box_rect(&dom, &root, "d");

    let mut clips: Vec<Rect> = Vec::new();
    let mut drawn = 0;
    for command in list.commands() {
        match command {
            DisplayCommand::PushClip { rect } => clips.push(*rect),
            DisplayCommand::PopClip => {
                let _ = clips.pop();
            }
            DisplayCommand::DrawText { text, .. } => {
                drawn += 1;
                assert_eq!(clips.last(), Some(&clip), "'{text}' drawn outside the clip");
            }
            _ => {}
        }
    }
    assert_eq!(drawn, 4);
    assert!(clips.is_empty());
}

/// Text of a box without `overflow: hidden` is not clipped.
#[test]
fn test_visible_overflow_pushes_no_clip() {
    let (_, _, list) = paint_html("<div style='height: 10px; width: 50px'>aaaa bbbb</div>");
    assert!(!list.commands().iter().any(|c| matches!(c, DisplayCommand::PushClip { .. })));
    assert_eq!(list.texts(), ["aaaa", "bbbb"]);
}

// ---------------------------------------------------------------------------
// Paint order
// ---------------------------------------------------------------------------

/// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
///
/// In-flow block backgrounds, then floats, then text, then positioned
/// boxes, whatever their order in the source.
#[test]
fn test_paint_order_blocks_floats_text_positioned() {
    let (_, _, list) = paint_html(
        "<body style='margin: 0'>\
         <div style='position: relative; background-color: #0000ff; width: 10px; height: 10px'></div>\
         <p style='margin: 0'>word</p>\
         <div style='float: left; background-color: #00ff00; width: 10px; height: 10px'></div>\
         <div style='background-color: #ff0000; height: 10px'></div></body>",
    );
    let block = fill_position(&list, ColorValue::rgb(255, 0, 0));
    let float = fill_position(&list, ColorValue::rgb(0, 255, 0));
    let text = list
        .commands()
        .iter()
        .position(|c| matches!(c, DisplayCommand::DrawText { text, .. } if text == "word"))
        .unwrap();
    let positioned = fill_position(&list, ColorValue::rgb(0, 0, 255));
    assert!(block < float, "{list:?}");
    assert!(float < text, "{list:?}");
    assert!(text < positioned, "{list:?}");
}

// ---------------------------------------------------------------------------
// Borders
// ---------------------------------------------------------------------------

/// [§ 5.3 Corner Shaping](https://www.w3.org/TR/css-backgrounds-3/#corner-shaping)
#[test]
fn test_rounded_border_is_one_ring_with_arcs() {
    let (_, _, list) = paint_html(
        "<div style='border: 2px solid #000000; border-radius: 6px; width: 20px; height: 20px'></div>",
    );
    let black = ColorValue::rgb(0, 0, 0);
    let rings: Vec<_> = list
        .commands()
        .iter()
        .filter_map(|c| match c {
            DisplayCommand::FillPath { path, color } if *color == black => Some(path),
            _ => None,
        })
        .collect();
    assert_eq!(rings.len(), 1);
    let arcs = rings[0]
        .elements()
        .iter()
        .filter(|e| matches!(e, PathElement::Arc { .. }))
        .count();
    // Four outer corners and four inner corners.
    assert_eq!(arcs, 8);
    assert!(!list
        .commands()
        .iter()
        .any(|c| matches!(c, DisplayCommand::FillRect { color, .. } if *color == black)));
}

/// [§ 4.2 'border-style'](https://www.w3.org/TR/css-backgrounds-3/#border-style)
#[test]
fn test_dashed_and_dotted_borders_stroke_each_side() {
    let strokes = |style: &str| -> Vec<(LineDash, f32)> {
        let html = format!("<div style='border: 3px {style} #ff0000; width: 20px; height: 20px'></div>");
        let (_, _, list) = paint_html(&html);
        list.commands()
            .iter()
            .filter_map(|c| match c {
                DisplayCommand::StrokeLine { dash, width, .. } => Some((*dash, *width)),
                _ => None,
            })
            .collect()
    };
    assert_eq!(strokes("dashed"), vec![(LineDash::Dashed, 3.0); 4]);
    assert_eq!(strokes("dotted"), vec![(LineDash::Dotted, 3.0); 4]);
    assert!(strokes("solid").is_empty());
}
