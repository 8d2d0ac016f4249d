//! HTML regeneration from a rendered document.
//!
//! [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)

use std::collections::HashMap;
use std::fmt::Write;

use lumen_css::{ComputedStyle, LayoutBox};
use lumen_dom::{DomTree, NodeId, NodeType};

/// How styles are written into regenerated HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlGenerationStyle {
    /// Markup only; `style` attributes are kept as authored.
    #[default]
    None,
    /// Each rendered element carries its computed, non-default style in a
    /// `style` attribute; stylesheets are not needed to reproduce it.
    Inline,
}

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Serialize the children of the document node.
///
/// `root` supplies computed styles in [`HtmlGenerationStyle::Inline`]
/// mode; elements without a box are written without a `style` attribute.
#[must_use]
pub fn generate_html(tree: &DomTree, root: Option<&LayoutBox>, mode: HtmlGenerationStyle) -> String {
    let mut styles = HashMap::new();
    if mode == HtmlGenerationStyle::Inline
        && let Some(root) = root
    {
        root.walk(&mut |b| {
            if let Some(node) = b.node() {
                let _ = styles.entry(node).or_insert(&b.style);
            }
        });
    }
    let mut writer = HtmlWriter {
        tree,
        mode,
        styles,
        out: String::new(),
    };
    for &child in tree.children(tree.root()) {
        writer.node(child, None);
    }
    writer.out
}

struct HtmlWriter<'a> {
    tree: &'a DomTree,
    mode: HtmlGenerationStyle,
    styles: HashMap<NodeId, &'a ComputedStyle>,
    out: String,
}

impl<'a> HtmlWriter<'a> {
    fn node(&mut self, id: NodeId, parent_style: Option<&'a ComputedStyle>) {
        let Some(node) = self.tree.get(id) else { return };
        match &node.node_type {
            NodeType::Document => {}
            NodeType::Text(text) => {
                let raw = self
                    .tree
                    .parent(id)
                    .and_then(|p| self.tree.tag_name(p))
                    .is_some_and(|tag| matches!(tag, "style" | "script"));
                if raw {
                    self.out.push_str(text);
                } else {
                    escape_into(text, false, &mut self.out);
                }
            }
            NodeType::Comment(text) => {
                let _ = write!(self.out, "<!--{text}-->");
            }
            NodeType::Element(element) => {
                let tag = element.tag_name.as_str();
                let style = self.styles.get(&id).copied();
                let _ = write!(self.out, "<{tag}");

                let mut attrs: Vec<(&String, &String)> = element.attrs.iter().collect();
                attrs.sort();
                let inline = self.mode == HtmlGenerationStyle::Inline;
                for (name, value) in attrs {
                    if inline && name == "style" {
                        continue;
                    }
                    let _ = write!(self.out, " {name}=\"");
                    escape_into(value, true, &mut self.out);
                    self.out.push('"');
                }
                if inline && let Some(style) = style {
                    let declarations: Vec<String> = style
                        .css_declarations(parent_style)
                        .into_iter()
                        .map(|(name, value)| format!("{name}: {value}"))
                        .collect();
                    if !declarations.is_empty() {
                        self.out.push_str(" style=\"");
                        escape_into(&declarations.join("; "), true, &mut self.out);
                        self.out.push('"');
                    }
                }
                self.out.push('>');

                if VOID_ELEMENTS.contains(&tag) {
                    return;
                }
                // Elements without a box (head, display: none) pass the
                // nearest rendered ancestor's style down.
                let inherited = style.or(parent_style);
                for &child in self.tree.children(id) {
                    self.node(child, inherited);
                }
                let _ = write!(self.out, "</{tag}>");
            }
        }
    }
}

/// [§ 13.3 Escaping a string](https://html.spec.whatwg.org/multipage/parsing.html#escapingString)
fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_markup_round_trips() {
        let (tree, _) = lumen_html::parse_html("<p class=x title='a\"b'>1 &lt; 2<br>&amp;</p>");
        let html = generate_html(&tree, None, HtmlGenerationStyle::None);
        assert!(html.contains(r#"<p class="x" title="a&quot;b">1 &lt; 2<br>&amp;</p>"#), "{html}");
        assert!(!html.contains("</br>"));
    }

    #[test]
    fn test_style_element_text_is_raw() {
        let (tree, _) = lumen_html::parse_html("<style>a > b { color: red }</style>");
        let html = generate_html(&tree, None, HtmlGenerationStyle::None);
        assert!(html.contains("<style>a > b { color: red }</style>"), "{html}");
    }
}
