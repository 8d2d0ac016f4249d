//! Integration tests for paged output.

use lumen_css::DisplayCommand;
use lumen_engine::{HtmlContainer, LayoutRestriction, LinkTarget, PageError, Pager};

const DOCUMENT: &str = "<body style='margin: 0'>\
    <p style='margin: 0'><a href='#end'>jump</a> <a href='http://example.test/'>out</a></p>\
    <div style='height: 450px'></div>\
    <p id=end style='margin: 0'>End</p></body>";

fn texts_of(list: &lumen_css::DisplayList) -> Vec<(String, f32)> {
    list.commands()
        .iter()
        .filter_map(|c| match c {
            DisplayCommand::DrawText { text, origin, .. } => Some((text.clone(), origin.1)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_document_is_split_into_pages() {
    let mut container = HtmlContainer::default();
    container.set_html(DOCUMENT);
    let pager = Pager::new(300.0, 200.0).unwrap();
    let pages = pager.paginate(&mut container).unwrap();

    // 19.2 + 450 + 19.2 pixels of content.
    assert_eq!(pages.len(), 3);
    assert_eq!(pages.iter().map(|p| p.index).collect::<Vec<_>>(), [0, 1, 2]);

    let first: Vec<String> = texts_of(&pages[0].list).into_iter().map(|(t, _)| t).collect();
    assert_eq!(first, ["jump", "out"]);
    assert!(texts_of(&pages[1].list).is_empty());
    let last = texts_of(&pages[2].list);
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].0, "End");
    assert!(last[0].1 > 0.0 && last[0].1 < 200.0, "{last:?}");
}

#[test]
fn test_links_become_annotations() {
    let mut container = HtmlContainer::default();
    container.set_html(DOCUMENT);
    let pager = Pager::new(300.0, 200.0).unwrap();
    let pages = pager.paginate(&mut container).unwrap();

    let links = &pages[0].links;
    assert_eq!(links.len(), 2);
    let end = container.anchor_rect("end").unwrap();
    assert_eq!(
        links[0].target,
        LinkTarget::Anchor {
            page: 2,
            y: end.y - 400.0
        }
    );
    assert_eq!(
        links[1].target,
        LinkTarget::External {
            href: "http://example.test/".to_string()
        }
    );
    assert!(pages[1].links.is_empty());

    let json = serde_json::to_value(&links[1]).unwrap();
    assert_eq!(json["target"]["kind"], "external");
}

#[test]
fn test_scroll_offset_is_restored() {
    let mut container = HtmlContainer::default();
    container.set_html(DOCUMENT);
    container.set_scroll_offset((0.0, 12.0));
    let pager = Pager::new(300.0, 200.0).unwrap();
    let _ = pager.paginate(&mut container).unwrap();
    assert_eq!(container.scroll_offset(), (0.0, 12.0));
}

#[test]
fn test_empty_document_has_one_page() {
    let mut container = HtmlContainer::default();
    container.set_html("");
    let pages = Pager::new(100.0, 100.0).unwrap().paginate(&mut container).unwrap();
    assert_eq!(pages.len(), 1);
}

#[test]
fn test_page_size_is_laid_out_width() {
    let mut container = HtmlContainer::default();
    container.set_html(DOCUMENT);
    let pager = Pager::new(250.0, 100.0).unwrap();
    assert_eq!(pager.page_size(), (250.0, 100.0));
    let count = pager.layout(&mut container).unwrap();
    assert_eq!(count, 5);
    assert!((container.actual_size().0 - 250.0).abs() < 0.01);

    // Laying out again with another restriction changes nothing for the pager.
    let _ = container.perform_layout(LayoutRestriction::fixed(600.0)).unwrap();
    assert_eq!(pager.layout(&mut container).unwrap(), 5);
}

#[test]
fn test_non_finite_page_size_fails_fast() {
    assert!(matches!(
        Pager::new(f32::INFINITY, 100.0),
        Err(PageError::InvalidPageSize { .. })
    ));
}
