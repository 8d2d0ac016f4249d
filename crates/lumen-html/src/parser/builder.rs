//! Tree construction.
//!
//! A reduced version of the HTML tree builder: a stack of open elements,
//! implied `html`/`head`/`body`, void elements, and the implied end tags
//! that matter for ordinary documents. Misnested table content is left in
//! place; the box tree builder repairs table structure later.

use strum_macros::Display;

use lumen_dom::{DomTree, ElementData, NodeId, NodeType};

use crate::tokenizer::{Attribute, Token};

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
///
/// "Void elements only have a start tag; end tags must not be specified."
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements that belong in `<head>` when seen before any body content.
const HEAD_ELEMENTS: &[&str] = &["base", "link", "meta", "script", "style", "title"];

/// Start tags that close an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "dd", "div", "dl", "dt", "fieldset",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Elements that stop the search for an element to close.
const SCOPE_BOUNDARIES: &[&str] = &["table", "td", "th", "html", "button", "caption"];

/// Category of a recovered parse problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IssueKind {
    /// A comment was never closed.
    UnterminatedComment,
    /// A tag ran into the end of input.
    UnterminatedTag,
    /// An end tag had no matching open element.
    StrayEndTag,
    /// An element was closed implicitly by another tag or end of input.
    ImpliedEndTag,
}

/// A problem the parser recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// What kind of problem it was.
    pub kind: IssueKind,
    /// Description including the offending tag.
    pub message: String,
}

/// Builds a [`DomTree`] from scanner tokens.
pub struct HTMLParser {
    tokens: Vec<Token>,
    tree: DomTree,
    open: Vec<NodeId>,
    html: Option<NodeId>,
    head: Option<NodeId>,
    body: Option<NodeId>,
    issues: Vec<ParseIssue>,
}

impl HTMLParser {
    /// Create a tree builder for a token stream.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            tree: DomTree::new(),
            open: Vec::new(),
            html: None,
            head: None,
            body: None,
            issues: Vec::new(),
        }
    }

    /// Build the tree, discarding issues.
    #[must_use]
    pub fn run(self) -> DomTree {
        self.run_with_issues().0
    }

    /// Build the tree and return the recovered problems alongside it.
    #[must_use]
    pub fn run_with_issues(mut self) -> (DomTree, Vec<ParseIssue>) {
        let tokens = std::mem::take(&mut self.tokens);
        for token in tokens {
            match token {
                Token::Doctype { .. } | Token::EndOfFile => {}
                Token::Comment { data } => {
                    let parent = self.current();
                    let id = self.tree.alloc(NodeType::Comment(data));
                    self.tree.append_child(parent, id);
                }
                Token::Text { data } => self.insert_text(&data),
                Token::StartTag {
                    name, attributes, ..
                } => self.start_tag(&name, attributes),
                Token::EndTag { name } => self.end_tag(&name),
            }
        }
        let _ = self.ensure_body();
        (self.tree, self.issues)
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(NodeId::ROOT)
    }

    fn current_tag(&self) -> Option<&str> {
        self.open.last().and_then(|&id| self.tree.tag_name(id))
    }

    fn ensure_html(&mut self) -> NodeId {
        if let Some(html) = self.html {
            return html;
        }
        let html = self
            .tree
            .append_element(NodeId::ROOT, ElementData::new("html"));
        self.html = Some(html);
        self.open = vec![html];
        html
    }

    fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head {
            return head;
        }
        let html = self.ensure_html();
        let head = self.tree.append_element(html, ElementData::new("head"));
        self.head = Some(head);
        head
    }

    fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }
        let _ = self.ensure_head();
        let html = self.ensure_html();
        let body = self.tree.append_element(html, ElementData::new("body"));
        self.body = Some(body);
        self.open = vec![html, body];
        body
    }

    /// "For each attribute on the token, check to see if the attribute is
    /// already present on the top element ... If it is not, add the attribute."
    fn merge_attributes(&mut self, target: NodeId, attributes: Vec<Attribute>) {
        if let Some(data) = self.tree.as_element_mut(target) {
            for attr in attributes {
                let _ = data.attrs.entry(attr.name).or_insert(attr.value);
            }
        }
    }

    fn insert_text(&mut self, data: &str) {
        // Before the body exists, only text inside an open head element
        // (title, style, script) stays in the head.
        if self.body.is_none() && self.open.len() <= 1 {
            if data.trim().is_empty() {
                return;
            }
            let _ = self.ensure_body();
        }
        let parent = self.current();
        self.tree.append_text(parent, data);
    }

    fn start_tag(&mut self, name: &str, attributes: Vec<Attribute>) {
        match name {
            "html" => {
                let html = self.ensure_html();
                self.merge_attributes(html, attributes);
                return;
            }
            "head" => {
                let _ = self.ensure_head();
                return;
            }
            "body" => {
                let body = self.ensure_body();
                self.merge_attributes(body, attributes);
                return;
            }
            _ => {}
        }

        let parent = if self.body.is_none() && HEAD_ELEMENTS.contains(&name) {
            self.ensure_head()
        } else {
            let _ = self.ensure_body();
            self.close_implied(name);
            self.current()
        };

        let mut data = ElementData::new(name);
        for attr in attributes {
            let _ = data.attrs.entry(attr.name).or_insert(attr.value);
        }
        let id = self.tree.append_element(parent, data);

        // The self-closing flag is ignored, so `<div/>` still opens a div.
        if !VOID_ELEMENTS.contains(&name) {
            self.open.push(id);
        }
    }

    /// Pop elements implicitly closed by a new `name` start tag.
    fn close_implied(&mut self, name: &str) {
        if CLOSES_PARAGRAPH.contains(&name) {
            self.close_in_scope("p", true);
        }
        match name {
            "li" => self.close_until_any(&["li"], &["ul", "ol"]),
            "dt" | "dd" => self.close_until_any(&["dt", "dd"], &["dl"]),
            "tr" => self.close_until_any(&["tr"], &["table", "tbody", "thead", "tfoot"]),
            "td" | "th" => self.close_until_any(&["td", "th"], &["tr", "table"]),
            "thead" | "tbody" | "tfoot" => {
                self.close_until_any(&["thead", "tbody", "tfoot"], &["table"]);
            }
            "option" => self.close_until_any(&["option"], &["select"]),
            _ => {}
        }
    }

    /// Close the nearest open `tag` unless a scope boundary comes first.
    fn close_in_scope(&mut self, tag: &str, implied: bool) {
        let Some(index) = self.find_open(tag, SCOPE_BOUNDARIES) else {
            return;
        };
        if implied {
            self.issues.push(ParseIssue {
                kind: IssueKind::ImpliedEndTag,
                message: format!("<{tag}> closed implicitly"),
            });
        }
        self.open.truncate(index);
    }

    /// Close the nearest open element among `tags`, stopping at `boundaries`.
    fn close_until_any(&mut self, tags: &[&str], boundaries: &[&str]) {
        for (index, &id) in self.open.iter().enumerate().rev() {
            let Some(tag) = self.tree.tag_name(id) else {
                continue;
            };
            if tags.contains(&tag) {
                self.open.truncate(index);
                return;
            }
            if boundaries.contains(&tag) {
                return;
            }
        }
    }

    fn find_open(&self, tag: &str, boundaries: &[&str]) -> Option<usize> {
        for (index, &id) in self.open.iter().enumerate().rev() {
            let current = self.tree.tag_name(id)?;
            if current == tag {
                return Some(index);
            }
            if boundaries.contains(&current) {
                return None;
            }
        }
        None
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "html" | "body" | "head" => return,
            // [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
            // "An end tag whose tag name is "br": ... act as described in the
            // entry for a start tag token with the tag name "br"."
            "br" => {
                self.start_tag("br", Vec::new());
                return;
            }
            _ => {}
        }

        let boundaries: &[&str] = match name {
            "td" | "th" | "tr" | "table" | "tbody" | "thead" | "tfoot" => &["html"],
            _ => SCOPE_BOUNDARIES,
        };
        if let Some(index) = self.find_open(name, boundaries) {
            if index + 1 < self.open.len() {
                let unclosed = self.current_tag().unwrap_or_default().to_string();
                self.issues.push(ParseIssue {
                    kind: IssueKind::ImpliedEndTag,
                    message: format!("<{unclosed}> closed by </{name}>"),
                });
            }
            self.open.truncate(index);
        } else {
            self.issues.push(ParseIssue {
                kind: IssueKind::StrayEndTag,
                message: format!("no open element for </{name}>"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_html;

    fn tags(tree: &DomTree, parent: NodeId) -> Vec<String> {
        tree.children(parent)
            .iter()
            .filter_map(|&id| tree.tag_name(id).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_missing_structure_is_synthesized() {
        let (tree, _) = parse_html("<p>hi");
        let html = tree.document_element().unwrap();
        assert_eq!(tags(&tree, html), vec!["head", "body"]);
        let body = tree.body().unwrap();
        assert_eq!(tags(&tree, body), vec!["p"]);
    }

    #[test]
    fn test_paragraph_closed_by_block() {
        let (tree, issues) = parse_html("<p>one<div>two</div>");
        let body = tree.body().unwrap();
        assert_eq!(tags(&tree, body), vec!["p", "div"]);
        assert!(issues.iter().any(|i| i.kind == IssueKind::ImpliedEndTag));
    }

    #[test]
    fn test_list_items_close_each_other() {
        let (tree, _) = parse_html("<ul><li>a<li>b</ul>");
        let body = tree.body().unwrap();
        let ul = tree.children(body)[0];
        assert_eq!(tags(&tree, ul), vec!["li", "li"]);
    }

    #[test]
    fn test_table_cells_and_rows() {
        let (tree, _) = parse_html("<table><tr><td>1<td>2<tr><td>3</table>");
        let body = tree.body().unwrap();
        let table = tree.children(body)[0];
        let rows = tags(&tree, table);
        assert_eq!(rows, vec!["tr", "tr"]);
        let first_row = tree.children(table)[0];
        assert_eq!(tags(&tree, first_row), vec!["td", "td"]);
    }

    #[test]
    fn test_style_goes_to_head() {
        let (tree, _) = parse_html("<style>p{color:red}</style><p>x</p>");
        let html = tree.document_element().unwrap();
        let head = tree.children(html)[0];
        assert_eq!(tags(&tree, head), vec!["style"]);
        assert_eq!(tree.text_content(head), "p{color:red}");
    }

    #[test]
    fn test_stray_end_tag_is_reported() {
        let (tree, issues) = parse_html("<b>x</i></b>");
        assert_eq!(tree.text_content(tree.body().unwrap()), "x");
        assert!(issues.iter().any(|i| i.kind == IssueKind::StrayEndTag));
    }

    #[test]
    fn test_void_elements_have_no_children() {
        let (tree, _) = parse_html("<p>a<br>b<img src=x.png>c</p>");
        let body = tree.body().unwrap();
        let p = tree.children(body)[0];
        assert_eq!(tags(&tree, p), vec!["br", "img"]);
        assert_eq!(tree.text_content(p), "abc");
    }
}
