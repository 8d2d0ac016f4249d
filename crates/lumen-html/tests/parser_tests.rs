//! Integration tests for the HTML parser.

use lumen_dom::{DomTree, NodeId, NodeType};
use lumen_html::{HTMLParser, HTMLTokenizer, IssueKind, parse_html};

/// Helper to parse HTML and return the DOM tree
fn parse(html: &str) -> DomTree {
    let mut tokenizer = HTMLTokenizer::new(html.to_string());
    tokenizer.run();
    HTMLParser::new(tokenizer.into_tokens()).run()
}

/// Helper to get element by tag name (first match, depth-first)
fn find_element(tree: &DomTree, from: NodeId, tag: &str) -> Option<NodeId> {
    if let Some(data) = tree.as_element(from)
        && data.tag_name == tag
    {
        return Some(from);
    }
    tree.children(from)
        .iter()
        .find_map(|&child| find_element(tree, child, tag))
}

#[test]
fn test_full_document() {
    let tree = parse(
        "<!DOCTYPE html><html><head><title>T</title></head><body><p>Hi</p></body></html>",
    );
    let title = find_element(&tree, NodeId::ROOT, "title").unwrap();
    assert_eq!(tree.text_content(title), "T");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(tree.parent(p), tree.body());
}

#[test]
fn test_body_attributes_are_kept() {
    let tree = parse("<body bgcolor=\"#ff0000\"><p>x</p>");
    let body = tree.body().unwrap();
    assert_eq!(tree.as_element(body).unwrap().attr("bgcolor"), Some("#ff0000"));
}

#[test]
fn test_whitespace_before_body_is_dropped() {
    let tree = parse("  \n <p>x</p>");
    let body = tree.body().unwrap();
    assert_eq!(tree.children(body).len(), 1);
}

#[test]
fn test_end_br_acts_as_start_br() {
    let tree = parse("<p>a</br>b</p>");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    let br = find_element(&tree, p, "br");
    assert!(br.is_some());
    assert_eq!(tree.text_content(p), "ab");
}

#[test]
fn test_comments_are_kept_but_not_text() {
    let tree = parse("<div><!-- note -->x</div>");
    let div = find_element(&tree, NodeId::ROOT, "div").unwrap();
    let first = tree.children(div)[0];
    assert!(matches!(
        tree.get(first).map(|n| &n.node_type),
        Some(NodeType::Comment(_))
    ));
    assert_eq!(tree.text_content(div), "x");
}

#[test]
fn test_unterminated_comment_runs_to_end() {
    let (tree, issues) = parse_html("<p>a<!-- never closed <b>x</b>");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(tree.text_content(p), "a");
    assert!(find_element(&tree, NodeId::ROOT, "b").is_none());
    assert_eq!(issues[0].kind, IssueKind::UnterminatedComment);
}

#[test]
fn test_unclosed_elements_end_at_eof() {
    let tree = parse("<div><span>deep");
    let span = find_element(&tree, NodeId::ROOT, "span").unwrap();
    assert_eq!(tree.text_content(span), "deep");
}

#[test]
fn test_rowspan_attribute_survives() {
    let tree = parse("<table><tr><td rowspan=\"2\">a</td><td>b</td></tr><tr><td>c</td></tr></table>");
    let td = find_element(&tree, NodeId::ROOT, "td").unwrap();
    assert_eq!(tree.as_element(td).unwrap().attr("rowspan"), Some("2"));
}

#[test]
fn test_entities_in_text_and_attributes() {
    let tree = parse("<a href=\"?a=1&amp;b=2\">x &lt; y&nbsp;z</a>");
    let a = find_element(&tree, NodeId::ROOT, "a").unwrap();
    assert_eq!(tree.as_element(a).unwrap().attr("href"), Some("?a=1&b=2"));
    assert_eq!(tree.text_content(a), "x < y\u{a0}z");
}
