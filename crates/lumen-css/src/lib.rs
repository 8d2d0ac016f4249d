//! CSS parsing, cascade, box tree, layout, and painting for the Lumen renderer.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Parser** ([§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - Comment stripping, brace-matched rule blocks, `@media` filtering
//!   - Declaration parsing with `!important`
//!
//! - **CSS Selectors** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Type, class, ID, and universal selectors, `:hover` and `:link`
//!   - Descendant and child combinators
//!   - Specificity calculation
//!
//! - **CSS Cascade** ([CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/))
//!   - Origin, importance, specificity and source order
//!   - HTML presentational hints
//!   - Property inheritance and `inherit`
//!
//! - **Box Tree and Layout** ([CSS 2.1 Visual Formatting Model](https://www.w3.org/TR/CSS2/visuren.html))
//!   - Anonymous block and table fixup boxes, list markers, rowspan spacing boxes
//!   - Block, inline, inline-block, table, float, replaced, and positioned layout
//!
//! - **Painting** ([CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html))
//!   - Display list in painting order
//!
//! # Not Implemented
//!
//! - Flexbox, grid, transforms
//! - `z-index` other than `auto`
//! - Media feature queries (only media types are matched)

/// CSS cascade and style computation per [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/).
pub mod cascade;
/// Box tree and layout per [CSS 2.1 § 9-10, 17](https://www.w3.org/TR/CSS2/visuren.html).
pub mod layout;
/// Display list and painting per [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html).
pub mod paint;
/// CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// CSS selector parsing and matching per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// Computed style representation per [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/).
pub mod style;
/// Style blocks indexed by selector.
pub mod stylesheet;
/// User-agent stylesheet per [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html).
pub mod ua_stylesheet;

pub use cascade::{StyleMap, compute_styles};
pub use layout::{
    ApproximateFontMetrics, BoxDimensions, BoxId, BoxType, EdgeSizes, FontMetrics, FontSpec, LayoutBox,
    LayoutContext, LineMetrics, Rect, build_box_tree, layout_document,
};
pub use paint::{DisplayCommand, DisplayList, PaintContext, PaintOutput, Painter};
pub use parser::{ComponentValue, Declaration};
pub use selector::{ParsedSelector, Specificity, parse_selector};
pub use style::{AutoLength, ColorValue, ComputedStyle, DEFAULT_FONT_SIZE_PX, DisplayKind, LengthValue};
pub use stylesheet::{CssData, Origin};
pub use ua_stylesheet::default_stylesheet;

use lumen_dom::{DomTree, ElementData, NodeId, NodeType};

/// [§ 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// "Declarations from style sheets independently linked by the originating
/// document are treated as if they were concatenated in linking order."
///
/// Where a document stylesheet comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetSource {
    /// [§ 4.2.4 The link element](https://html.spec.whatwg.org/multipage/semantics.html#the-link-element)
    External {
        /// The `href` attribute.
        href: String,
    },
    /// [§ 4.2.6 The style element](https://html.spec.whatwg.org/multipage/semantics.html#the-style-element)
    Inline {
        /// Text content of the `<style>` element.
        text: String,
    },
}

/// Every `<link rel="stylesheet">` and `<style>` in document order.
///
/// [§ 6.1](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
/// "The last declaration in document order wins."
#[must_use]
pub fn collect_stylesheet_sources(tree: &DomTree) -> Vec<StylesheetSource> {
    let mut sources = Vec::new();
    collect_sources_recursive(tree, tree.root(), &mut sources);
    sources
}

fn collect_sources_recursive(tree: &DomTree, id: NodeId, sources: &mut Vec<StylesheetSource>) {
    let Some(node) = tree.get(id) else { return };

    if let NodeType::Element(data) = &node.node_type {
        if data.tag_name.eq_ignore_ascii_case("link") {
            // [§ 4.2.4](https://html.spec.whatwg.org/multipage/semantics.html#the-link-element)
            // "The href attribute gives the address (a valid non-empty URL
            // potentially surrounded by spaces) of the linked resource."
            if is_stylesheet_link(data)
                && let Some(href) = data.attr("href")
                && !href.trim().is_empty()
            {
                sources.push(StylesheetSource::External {
                    href: href.trim().to_string(),
                });
            }
        } else if data.tag_name.eq_ignore_ascii_case("style") {
            let text: String = tree
                .children(id)
                .iter()
                .filter_map(|&child| tree.as_text(child))
                .collect();
            sources.push(StylesheetSource::Inline { text });
            return;
        }
    }

    for &child_id in tree.children(id) {
        collect_sources_recursive(tree, child_id, sources);
    }
}

/// [§ 4.2.4 The link element](https://html.spec.whatwg.org/multipage/semantics.html#the-link-element)
///
/// "If the rel attribute's value contains the token stylesheet, then the
/// link is a stylesheet link."
///
/// [§ 2.4.7 Space-separated tokens](https://html.spec.whatwg.org/multipage/common-microsyntaxes.html#space-separated-tokens)
fn is_stylesheet_link(data: &ElementData) -> bool {
    data.attr("rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_sources_in_document_order() {
        let (tree, _) = lumen_html::parse_html(
            "<html><head><link rel='icon' href='a.ico'><link rel='Stylesheet' href=' main.css '>\
             <style>p { color: red }</style></head><body></body></html>",
        );
        assert_eq!(
            collect_stylesheet_sources(&tree),
            vec![
                StylesheetSource::External {
                    href: "main.css".to_string()
                },
                StylesheetSource::Inline {
                    text: "p { color: red }".to_string()
                },
            ]
        );
    }
}
