//! CSS Cascading and Style Computation
//!
//! This module implements style computation per
//! [CSS Cascading and Inheritance Level 4](https://www.w3.org/TR/css-cascade-4/).

mod hints;

use std::collections::{HashMap, HashSet};

use lumen_common::WarningLog;
use lumen_dom::{DomTree, ElementData, NodeId, NodeType};

use crate::parser::{Declaration, parse_declarations};
use crate::selector::Specificity;
use crate::style::ComputedStyle;
use crate::style::computed::CascadeContext;
use crate::stylesheet::{CssData, Origin, StyleBlock};

pub use hints::presentational_hints;

/// Computed styles keyed by element.
pub type StyleMap = HashMap<NodeId, ComputedStyle>;

/// [§ 6.4.2 Cascade Origins](https://www.w3.org/TR/css-cascade-4/#cascade-origin)
///
/// "Declarations from origins earlier in this list win over declarations
/// from later origins" (listed here lowest first). Presentational hints sit
/// between user-agent and author rules; the `style` attribute beats
/// stylesheet rules of the same importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    UserAgentNormal,
    PresentationalHint,
    AuthorNormal,
    InlineNormal,
    AuthorImportant,
    InlineImportant,
    UserAgentImportant,
}

impl Precedence {
    const fn of(origin: Origin, important: bool) -> Self {
        match (origin, important) {
            (Origin::UserAgent, false) => Self::UserAgentNormal,
            (Origin::UserAgent, true) => Self::UserAgentImportant,
            (Origin::Author, false) => Self::AuthorNormal,
            (Origin::Author, true) => Self::AuthorImportant,
        }
    }
}

/// A declaration waiting to be applied, with its sort key.
struct CascadedDeclaration<'a> {
    precedence: Precedence,
    specificity: Specificity,
    order: usize,
    declaration: &'a Declaration,
}

/// Inputs shared by every element of one cascade run.
struct Cascade<'a> {
    tree: &'a DomTree,
    css: &'a CssData,
    hovered: Option<NodeId>,
    warnings: &'a WarningLog,
    root_font_size: f32,
}

/// [§ 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
/// "The cascade takes an unordered list of declared values for a given property
/// on a given element, sorts them by their declaration's precedence..."
///
/// Compute styles for every element. `base` is the style the root element
/// inherits from (the configured default font and color); `hovered` is the
/// element under the pointer, for `:hover` rules.
#[must_use]
pub fn compute_styles(
    tree: &DomTree,
    css: &CssData,
    hovered: Option<NodeId>,
    base: &ComputedStyle,
    warnings: &WarningLog,
) -> StyleMap {
    let mut cascade = Cascade {
        tree,
        css,
        hovered,
        warnings,
        root_font_size: base.font_size,
    };
    let mut styles = HashMap::new();
    cascade.compute_node(tree.root(), base, true, &mut styles);
    log::debug!("cascade computed {} element styles", styles.len());
    styles
}

impl Cascade<'_> {
    fn compute_node(&mut self, id: NodeId, inherited: &ComputedStyle, is_root: bool, styles: &mut StyleMap) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else { return };
        match &node.node_type {
            NodeType::Element(element) => {
                let parent = (!is_root).then_some(inherited);
                let computed = self.compute_element(id, element, inherited, parent);
                if is_root {
                    // [§ 6.1.1 'rem'](https://www.w3.org/TR/css-values-4/#rem)
                    // "Equal to the computed value of font-size on the root element."
                    self.root_font_size = computed.font_size;
                }
                for &child in tree.children(id) {
                    self.compute_node(child, &computed, false, styles);
                }
                let _ = styles.insert(id, computed);
            }
            NodeType::Document => {
                for &child in tree.children(id) {
                    self.compute_node(child, inherited, is_root, styles);
                }
            }
            NodeType::Text(_) | NodeType::Comment(_) => {}
        }
    }

    fn compute_element(
        &self,
        id: NodeId,
        element: &ElementData,
        inherited: &ComputedStyle,
        parent: Option<&ComputedStyle>,
    ) -> ComputedStyle {
        // [§ 7 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting)
        let mut computed = ComputedStyle::inherit_from(inherited);

        // STEP 1: Gather declarations from every matching block.
        let hints = presentational_hints(self.tree, id, element);
        let inline = element.attr("style").map(parse_declarations).unwrap_or_default();
        let mut cascaded: Vec<CascadedDeclaration<'_>> = Vec::new();
        for block in self.candidate_blocks(element) {
            if !block.selector.matches_in_tree(self.tree, id, self.hovered) {
                continue;
            }
            cascaded.extend(block.declarations.iter().map(|declaration| CascadedDeclaration {
                precedence: Precedence::of(block.origin, declaration.important),
                specificity: block.selector.specificity,
                order: block.order,
                declaration,
            }));
        }
        cascaded.extend(hints.iter().map(|declaration| CascadedDeclaration {
            precedence: Precedence::PresentationalHint,
            specificity: Specificity::default(),
            order: 0,
            declaration,
        }));
        cascaded.extend(inline.iter().map(|declaration| CascadedDeclaration {
            precedence: if declaration.important {
                Precedence::InlineImportant
            } else {
                Precedence::InlineNormal
            },
            specificity: Specificity::default(),
            order: 0,
            declaration,
        }));

        // STEP 2: [§ 6.4 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
        // Lowest precedence first, so later declarations override.
        cascaded.sort_by_key(|c| (c.precedence, c.specificity, c.order));

        // STEP 3: Apply in order.
        let ctx = CascadeContext {
            parent,
            root_font_size: self.root_font_size,
            warnings: self.warnings,
        };
        for c in &cascaded {
            computed.apply_declaration(c.declaration, &ctx);
        }

        // STEP 4: [§ 4.4 Computed Values](https://www.w3.org/TR/css-cascade-4/#computed)
        computed.finalize(self.root_font_size);
        computed
    }

    /// Blocks indexed under any key this element can match: its id, its
    /// classes, its tag and `*`.
    fn candidate_blocks(&self, element: &ElementData) -> Vec<&StyleBlock> {
        let mut keys: Vec<String> = Vec::new();
        if let Some(id) = element.id() {
            keys.push(format!("#{id}"));
        }
        let mut seen = HashSet::new();
        for class in element.classes() {
            if seen.insert(class) {
                keys.push(format!(".{class}"));
            }
        }
        keys.push(element.tag_name.clone());
        keys.push("*".to_string());
        keys.iter().flat_map(|key| self.css.blocks_for(key)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::values::{AutoLength, ColorValue, LengthValue};

    fn element(tree: &mut DomTree, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new(tag);
        for (name, value) in attrs {
            let _ = data.attrs.insert((*name).to_string(), (*value).to_string());
        }
        tree.append_element(parent, data)
    }

    fn styles_for(tree: &DomTree, css: &str) -> StyleMap {
        let warnings = WarningLog::new();
        let css = CssData::parse(css, Origin::Author, "screen", &warnings);
        compute_styles(tree, &css, None, &ComputedStyle::default(), &warnings)
    }

    #[test]
    fn test_specificity_beats_order() {
        let mut tree = DomTree::new();
        let p = element(&mut tree, NodeId::ROOT, "p", &[("id", "x")]);
        let styles = styles_for(&tree, "#x { color: red } p { color: blue }");
        assert_eq!(styles[&p].color, ColorValue::rgb(255, 0, 0));
    }

    #[test]
    fn test_important_beats_inline() {
        let mut tree = DomTree::new();
        let p = element(&mut tree, NodeId::ROOT, "p", &[("style", "color: green; width: 5px")]);
        let styles = styles_for(&tree, "p { color: red !important; width: 9px }");
        assert_eq!(styles[&p].color, ColorValue::rgb(255, 0, 0));
        assert_eq!(
            styles[&p].width,
            AutoLength::Length(LengthValue::Px(5.0))
        );
    }

    #[test]
    fn test_inheritance_and_em_font_size() {
        let mut tree = DomTree::new();
        let div = element(&mut tree, NodeId::ROOT, "div", &[]);
        let span = element(&mut tree, div, "span", &[]);
        let styles = styles_for(&tree, "div { font-size: 20px; color: #00f } span { font-size: 1.5em }");
        assert_eq!(styles[&span].color, ColorValue::rgb(0, 0, 255));
        assert!((styles[&span].font_size - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_hover_only_applies_to_hovered_chain() {
        let mut tree = DomTree::new();
        let div = element(&mut tree, NodeId::ROOT, "div", &[]);
        let a = element(&mut tree, div, "a", &[]);
        let warnings = WarningLog::new();
        let css = CssData::parse("div:hover { color: red }", Origin::Author, "screen", &warnings);
        let base = ComputedStyle::default();
        let idle = compute_styles(&tree, &css, None, &base, &warnings);
        assert_eq!(idle[&div].color, ColorValue::BLACK);
        let hovered = compute_styles(&tree, &css, Some(a), &base, &warnings);
        assert_eq!(hovered[&div].color, ColorValue::rgb(255, 0, 0));
    }
}
