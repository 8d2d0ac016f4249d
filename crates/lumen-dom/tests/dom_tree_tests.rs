//! Tests for DOM tree construction and queries.

use lumen_dom::{DomTree, ElementData, NodeId};

/// Helper to create an element with a single attribute.
fn element_with(tag: &str, attr: &str, value: &str) -> ElementData {
    let mut data = ElementData::new(tag);
    let _ = data.attrs.insert(attr.to_string(), value.to_string());
    data
}

#[test]
fn test_append_preserves_order() {
    let mut tree = DomTree::new();
    let div = tree.append_element(NodeId::ROOT, ElementData::new("div"));
    let a = tree.append_element(div, ElementData::new("a"));
    let b = tree.append_element(div, ElementData::new("b"));

    assert_eq!(tree.children(div), &[a, b]);
    assert_eq!(tree.parent(b), Some(div));
}

#[test]
fn test_append_moves_existing_child() {
    let mut tree = DomTree::new();
    let first = tree.append_element(NodeId::ROOT, ElementData::new("div"));
    let second = tree.append_element(NodeId::ROOT, ElementData::new("div"));
    let span = tree.append_element(first, ElementData::new("span"));

    tree.append_child(second, span);

    assert!(tree.children(first).is_empty());
    assert_eq!(tree.children(second), &[span]);
}

#[test]
fn test_adjacent_text_is_merged() {
    let mut tree = DomTree::new();
    let p = tree.append_element(NodeId::ROOT, ElementData::new("p"));
    tree.append_text(p, "Hello ");
    tree.append_text(p, "World");

    assert_eq!(tree.children(p).len(), 1);
    assert_eq!(tree.text_content(p), "Hello World");
}

#[test]
fn test_ancestors_nearest_first() {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));
    let p = tree.append_element(body, ElementData::new("p"));

    let chain: Vec<NodeId> = tree.ancestors(p).collect();
    assert_eq!(chain, vec![body, html, NodeId::ROOT]);
    assert_eq!(tree.document_element(), Some(html));
    assert_eq!(tree.body(), Some(body));
}

#[test]
fn test_element_by_id_and_classes() {
    let mut tree = DomTree::new();
    let div = tree.append_element(NodeId::ROOT, element_with("div", "class", "note  wide"));
    let target = tree.append_element(div, element_with("span", "id", "target"));

    assert_eq!(tree.element_by_id("target"), Some(target));
    assert_eq!(tree.element_by_id("missing"), None);
    let classes: Vec<&str> = tree.as_element(div).unwrap().classes().collect();
    assert_eq!(classes, vec!["note", "wide"]);
}
