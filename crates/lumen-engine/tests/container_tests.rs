//! Integration tests for the document container: layout negotiation,
//! painting, selection, links, hover and HTML export.

use lumen_common::{EngineConfig, ErrorKind};
use lumen_css::layout::FragmentKind;
use lumen_css::{ColorValue, DisplayCommand, LayoutBox};
use lumen_engine::{DrawCall, HtmlContainer, HtmlGenerationStyle, LayoutRestriction, RecordingGraphics};

/// Helper: set `html` and lay it out at a fixed `width`.
fn layout_html(html: &str, width: f32) -> HtmlContainer {
    let mut container = HtmlContainer::default();
    container.set_html(html);
    let _ = container.perform_layout(LayoutRestriction::fixed(width)).unwrap();
    container
}

/// Helper: the box of the element with `id`.
fn box_by_id<'a>(container: &'a HtmlContainer, id: &str) -> &'a LayoutBox {
    let node = container
        .document()
        .element_by_id(id)
        .unwrap_or_else(|| panic!("no element #{id}"));
    container
        .root_box()
        .and_then(|root| root.find_node(node))
        .unwrap_or_else(|| panic!("no box for #{id}"))
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

fn drain_events(container: &HtmlContainer) -> Vec<ErrorKind> {
    container.error_events().try_iter().map(|e| e.kind).collect()
}

// ---------------------------------------------------------------------------
// Layout negotiation
// ---------------------------------------------------------------------------

#[test]
fn test_hello_world_single_line() {
    let container = layout_html("<p id=p>Hello World</p>", 200.0);
    let p = box_by_id(&container, "p");
    assert_eq!(words(p), vec![vec!["Hello".to_string(), "World".to_string()]]);
    assert_eq!(p.lines[0].fragments.len(), 2);
    assert!(approx(container.actual_size().0, 200.0));
}

#[test]
fn test_layout_is_idempotent() {
    let mut container = HtmlContainer::default();
    container.set_html(
        "<div style='float: left; width: 30%'>side</div>\
         <p>Some <b>bold</b> text that wraps across a few lines of output</p>\
         <table border=1><tr><td>a</td><td>bb</td></tr></table>",
    );
    let first = container.perform_layout(LayoutRestriction::fixed(240.0)).unwrap();
    let dump = container.dump_tree();
    let second = container.perform_layout(LayoutRestriction::fixed(240.0)).unwrap();
    assert_eq!(first, second);
    assert_eq!(dump, container.dump_tree());
}

#[test]
fn test_auto_size_with_percentage_width_converges() {
    let mut container = HtmlContainer::default();
    container.set_html("<div id=d style='width: 50%'>Hello World</div>");
    let (width, _) = container.perform_layout(LayoutRestriction::auto(800.0)).unwrap();

    // 16px margins on the body plus the 11 characters of "Hello World".
    assert!(approx(width, 16.0 + 11.0 * 9.6), "{width}");
    let d = box_by_id(&container, "d");
    assert!(approx(d.dimensions.content.width, (width - 16.0) / 2.0));
    assert_eq!(words(d).len(), 2);
    assert!(!drain_events(&container).contains(&ErrorKind::Layout));
}

#[test]
fn test_auto_size_respects_limits() {
    let mut container = HtmlContainer::default();
    container.set_html("<p>a fairly long paragraph that cannot fit in the limit</p>");
    let (width, _) = container.perform_layout(LayoutRestriction::auto(120.0)).unwrap();
    assert!(width <= 120.0 + 0.01, "{width}");

    container.set_html("<p>x</p>");
    let restriction = LayoutRestriction {
        min_width: 300.0,
        min_height: 500.0,
        ..LayoutRestriction::auto(800.0)
    };
    let (width, height) = container.perform_layout(restriction).unwrap();
    assert!(width >= 300.0);
    assert!(approx(height, 500.0));
}

#[test]
fn test_unbounded_width_uses_natural_width() {
    let mut container = HtmlContainer::default();
    container.set_html("<body style='margin: 0'><span>abcde</span></body>");
    let (width, _) = container.perform_layout(LayoutRestriction::fixed(0.0)).unwrap();
    assert!(approx(width, 5.0 * 9.6), "{width}");
}

#[test]
fn test_non_finite_restriction_is_rejected() {
    let mut container = HtmlContainer::default();
    container.set_html("<p>x</p>");
    let err = container
        .perform_layout(LayoutRestriction::fixed(f32::NAN))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Layout);
}

#[test]
fn test_default_font_size_from_config() {
    let config = EngineConfig {
        default_font_size: 20.0,
        ..EngineConfig::default()
    };
    let mut container = HtmlContainer::new(config);
    container.set_html("<p id=p>x</p>");
    let _ = container.perform_layout(LayoutRestriction::fixed(200.0)).unwrap();
    assert!(approx(box_by_id(&container, "p").dimensions.content.height, 24.0));
}

// ---------------------------------------------------------------------------
// Paint
// ---------------------------------------------------------------------------

#[test]
fn test_paint_records_text_calls() {
    let mut container = layout_html("<p style='color: red'>Hello World</p>", 200.0);
    let mut gfx = RecordingGraphics::new();
    container.perform_paint(&mut gfx, None);
    assert_eq!(gfx.texts(), ["Hello", "World"]);
    assert!(gfx.calls().iter().any(|call| matches!(
        call,
        DrawCall::Text { color, .. } if *color == ColorValue::rgb(255, 0, 0)
    )));
}

#[test]
fn test_paint_before_layout_reports_event() {
    let mut container = HtmlContainer::default();
    container.set_html("<p>x</p>");
    let _ = drain_events(&container);
    let mut gfx = RecordingGraphics::new();
    container.perform_paint(&mut gfx, None);
    assert!(gfx.calls().is_empty());
    assert_eq!(drain_events(&container), vec![ErrorKind::Paint]);
}

#[test]
fn test_scroll_offset_translates_output() {
    let mut container = layout_html("<body style='margin: 0'><p style='margin: 0'>x</p></body>", 100.0);
    let baseline = |list: &lumen_css::DisplayList| {
        list.commands().iter().find_map(|c| match c {
            DisplayCommand::DrawText { origin, .. } => Some(origin.1),
            _ => None,
        })
    };
    let top = baseline(&container.display_list(None)).unwrap();
    container.set_scroll_offset((0.0, 5.0));
    let scrolled = baseline(&container.display_list(None)).unwrap();
    assert!(approx(top - scrolled, 5.0));
}

#[test]
fn test_invalid_css_raises_event_and_warns() {
    let mut container = HtmlContainer::default();
    container.set_html("<style>p { color: red; } /* never closed</style><p>x</p>");
    assert!(drain_events(&container).contains(&ErrorKind::CssParsing));
    assert!(container.warnings().iter().any(|w| w.component == "CSS"));
}

#[test]
fn test_events_from_other_threads() {
    let container = HtmlContainer::default();
    let reporter = container.error_reporter();
    std::thread::spawn(move || reporter.report_kind(ErrorKind::Iframe, "frame failed"))
        .join()
        .unwrap();
    let event = container.error_events().try_recv().unwrap();
    assert_eq!(event.kind, ErrorKind::Iframe);
    assert_eq!(event.message, "frame failed");
}

#[test]
fn test_clear_releases_document() {
    let mut container = layout_html("<p>x</p>", 100.0);
    let generation = container.generation();
    container.clear();
    assert!(container.root_box().is_none());
    assert!(container.dump_tree().is_empty());
    assert_eq!(container.generation(), generation + 1);
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[test]
fn test_select_all_text() {
    let mut container = layout_html("<p>Hello World</p><p>Second <b>para</b></p>", 400.0);
    assert_eq!(container.selected_text(), "");
    container.select_all();
    assert_eq!(container.selected_text(), "Hello World\nSecond para");
}

#[test]
fn test_partial_selection_highlights() {
    let mut container = layout_html("<p>one two three</p>", 400.0);
    container.set_selection(2, 1);
    assert_eq!(container.selection(), Some((1, 2)));
    assert_eq!(container.selected_text(), "two three");

    let list = container.display_list(None);
    let highlight = container.config().selection_background.clone();
    assert_eq!(highlight, "#3399ff");
    assert!(list.commands().iter().any(|c| matches!(
        c,
        DisplayCommand::FillRect { color, .. } if *color == ColorValue::rgb(0x33, 0x99, 0xff)
    )));

    container.clear_selection();
    assert_eq!(container.selected_text(), "");
}

// ---------------------------------------------------------------------------
// Links and hover
// ---------------------------------------------------------------------------

const LINK_PAGE: &str = "<body style='margin: 0'>\
    <p><a href=' #target '>go</a> <a href='http://example.test/'>out</a></p>\
    <div style='height: 400px'></div>\
    <h2 id=target>Target</h2></body>";

#[test]
fn test_links_and_hit_testing() {
    let container = layout_html(LINK_PAGE, 300.0);
    let links = container.links();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].href, "#target");
    assert_eq!(links[1].href, "http://example.test/");

    let rect = links[1].rects[0];
    let hit = container
        .link_at(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
        .unwrap();
    assert_eq!(hit.href, "http://example.test/");
    assert!(container.link_at(290.0, 200.0).is_none());
}

#[test]
fn test_anchor_and_element_rects() {
    let container = layout_html(LINK_PAGE, 300.0);
    let target = container.anchor_rect("target").unwrap();
    assert!(target.y > 400.0);
    assert_eq!(container.element_rect("target"), Some(target));
    assert!(container.anchor_rect("missing").is_none());

    let named = layout_html("<p>x</p><a name=here>anchor</a>", 300.0);
    assert!(named.anchor_rect("here").is_some());
}

#[test]
fn test_hover_restyles_link() {
    let mut container = layout_html(
        "<style>a:hover { color: red }</style><p><a id=l href=x>link</a></p>",
        300.0,
    );
    let rect = container.element_rect("l").unwrap();
    let (x, y) = (rect.x + 1.0, rect.y + rect.height / 2.0);
    assert_eq!(box_by_id(&container, "l").style.color, ColorValue::rgb(0, 0, 255));

    assert!(container.set_hover(x, y));
    assert_eq!(container.hovered(), container.document().element_by_id("l"));
    assert_eq!(box_by_id(&container, "l").style.color, ColorValue::rgb(255, 0, 0));
    assert!(container.needs_layout());
    assert!(!container.set_hover(x, y));

    let mut gfx = RecordingGraphics::new();
    container.perform_paint(&mut gfx, None);
    assert!(gfx.calls().iter().any(|call| matches!(
        call,
        DrawCall::Text { text, color, .. } if text == "link" && *color == ColorValue::rgb(255, 0, 0)
    )));
}

#[test]
fn test_hover_without_hover_rules_is_free() {
    let mut container = layout_html("<p><a id=l href=x>link</a></p>", 300.0);
    let rect = container.element_rect("l").unwrap();
    assert!(!container.set_hover(rect.x + 1.0, rect.y + 1.0));
    assert!(!container.needs_layout());
}

// ---------------------------------------------------------------------------
// HTML export
// ---------------------------------------------------------------------------

#[test]
fn test_inline_export_writes_computed_styles() {
    let container = layout_html("<p>a <b>x</b></p>", 200.0);
    let html = container.get_html(HtmlGenerationStyle::Inline);
    assert!(html.contains(r#"<b style="font-weight: bold">x</b>"#), "{html}");

    let plain = container.get_html(HtmlGenerationStyle::None);
    assert!(plain.contains("<b>x</b>"), "{plain}");
}

#[test]
fn test_inline_export_replaces_style_attribute() {
    let container = layout_html("<div style='color: red'>x</div>", 200.0);
    let html = container.get_html(HtmlGenerationStyle::Inline);
    assert!(html.contains(r#"<div style="color: #ff0000"#), "{html}");
    assert!(!html.contains("color: red"), "{html}");
}
