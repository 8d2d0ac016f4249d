//! Layout box types.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! A [`LayoutBox`] owns its children. Layout writes each box's
//! [`BoxDimensions`]; containing blocks are passed down the recursive layout
//! calls, so no box refers back to an ancestor.

use std::fmt::Write as _;

use lumen_dom::{DomTree, NodeId};
use serde::Serialize;

use crate::style::ComputedStyle;
use crate::style::values::{DisplayKind, Overflow, Position};

use super::box_model::{BoxDimensions, Rect};
use super::inline::{Fragment, LineBox};

/// Identity of a box, unique within one box tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct BoxId(pub usize);

/// [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
#[derive(Debug, Clone, PartialEq)]
pub enum BoxType {
    /// "A principal block-level box" or inline box generated by an element.
    Principal(NodeId),
    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    /// and the anonymous table parts of
    /// [§ 17.2.1](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes).
    Anonymous,
    /// A run of character data.
    Text(String),
    /// `<br>`: a forced line break.
    LineBreak,
    /// [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width):
    /// an image.
    Replaced {
        /// The `img` element.
        node: NodeId,
        /// Its `src`, if any.
        src: Option<String>,
    },
    /// The slot a `rowspan` cell reserves in a later row.
    Spacing {
        /// The spanning cell.
        cell: BoxId,
        /// Grid column of the cell.
        column: usize,
        /// First row the cell spans.
        start_row: usize,
        /// Last row the cell spans.
        end_row: usize,
    },
}

/// [§ 12.5 Lists](https://www.w3.org/TR/CSS2/generate.html#lists): the
/// marker drawn before a list item's first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMarker {
    /// Filled circle.
    Disc,
    /// Hollow circle.
    Circle,
    /// Filled square.
    Square,
    /// A counter such as `"3."` or `"iv."`.
    Text(String),
}

/// A box in the layout tree.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    /// Identity used by spacing boxes, fragments and selection.
    pub id: BoxId,
    /// What generated the box.
    pub box_type: BoxType,
    /// Resolved style; anonymous and text boxes inherit their parent's.
    pub style: ComputedStyle,
    /// Display kind used for layout (may differ from the style for
    /// anonymous boxes and promoted inlines).
    pub display: DisplayKind,
    /// Geometry, written only by layout.
    pub dimensions: BoxDimensions,
    /// Child boxes in document order.
    pub children: Vec<LayoutBox>,
    /// Line boxes, for block containers with inline content.
    pub lines: Vec<LineBox>,
    /// Per-line rectangles of an inline element (border box per line).
    pub line_rects: Vec<Rect>,
    /// List item marker.
    pub marker: Option<ListMarker>,
    /// Grid column of a table cell.
    pub column: usize,
    /// `colspan` of a table cell.
    pub colspan: usize,
    /// `rowspan` of a table cell, clamped to the rows that exist.
    pub rowspan: usize,
    /// Where an absolutely positioned box would have been in flow.
    pub static_position: (f32, f32),
}

impl LayoutBox {
    /// A box with default geometry.
    #[must_use]
    pub fn new(id: BoxId, box_type: BoxType, style: ComputedStyle, display: DisplayKind) -> Self {
        Self {
            id,
            box_type,
            style,
            display,
            dimensions: BoxDimensions::default(),
            children: Vec::new(),
            lines: Vec::new(),
            line_rects: Vec::new(),
            marker: None,
            column: 0,
            colspan: 1,
            rowspan: 1,
            static_position: (0.0, 0.0),
        }
    }

    /// The element that generated the box.
    #[must_use]
    pub const fn node(&self) -> Option<NodeId> {
        match &self.box_type {
            BoxType::Principal(node) | BoxType::Replaced { node, .. } => Some(*node),
            _ => None,
        }
    }

    /// Whether this is a rowspan spacing box.
    #[must_use]
    pub const fn is_spacing(&self) -> bool {
        matches!(self.box_type, BoxType::Spacing { .. })
    }

    /// Text of a text box.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.box_type {
            BoxType::Text(text) => Some(text),
            _ => None,
        }
    }

    /// [§ 9.2.1 Block-level elements and block boxes](https://www.w3.org/TR/CSS2/visuren.html#block-boxes)
    #[must_use]
    pub fn is_block_level(&self) -> bool {
        match self.box_type {
            BoxType::Text(_) | BoxType::LineBreak => false,
            _ => self.display.is_block_level(),
        }
    }

    /// [§ 9.3.1 'position'](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
    /// `absolute` or `fixed`.
    #[must_use]
    pub fn is_absolutely_positioned(&self) -> bool {
        self.style.position.is_out_of_flow() && self.node().is_some()
    }

    /// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
    #[must_use]
    pub fn is_floated(&self) -> bool {
        self.node().is_some() && self.style.is_floated()
    }

    /// Floated or absolutely positioned.
    #[must_use]
    pub fn is_out_of_flow(&self) -> bool {
        self.is_floated() || self.is_absolutely_positioned()
    }

    /// Whether the box takes part in inline layout of its parent.
    #[must_use]
    pub fn is_inline_level(&self) -> bool {
        !self.is_out_of_flow() && !self.is_block_level()
    }

    /// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// "Floats, absolutely positioned elements, block containers (such as
    /// inline-blocks, table-cells, and table-captions) that are not block
    /// boxes, and block boxes with 'overflow' other than 'visible' ...
    /// establish new block formatting contexts for their contents."
    #[must_use]
    pub fn establishes_bfc(&self) -> bool {
        self.is_out_of_flow()
            || matches!(
                self.display,
                DisplayKind::InlineBlock | DisplayKind::TableCell | DisplayKind::Table
            )
            || self.style.overflow != Overflow::Visible
    }

    /// Whether the box is a containing block for absolutely positioned
    /// descendants.
    #[must_use]
    pub fn is_positioned(&self) -> bool {
        self.node().is_some() && self.style.position != Position::Static
    }

    /// Whether the children are laid out as lines.
    #[must_use]
    pub fn has_inline_content(&self) -> bool {
        !self.children.is_empty()
            && self
                .children
                .iter()
                .all(|c| c.is_inline_level() || c.is_out_of_flow())
            && self.children.iter().any(LayoutBox::is_inline_level)
    }

    /// Move the box, its lines and every descendant by `(dx, dy)`.
    pub fn shift(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.dimensions.translate(dx, dy);
        self.static_position = (self.static_position.0 + dx, self.static_position.1 + dy);
        for line in &mut self.lines {
            line.shift(dx, dy);
        }
        for rect in &mut self.line_rects {
            *rect = rect.translate(dx, dy);
        }
        for child in &mut self.children {
            child.shift(dx, dy);
        }
    }

    /// The box with the given id in this subtree.
    #[must_use]
    pub fn find(&self, id: BoxId) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Mutable access to the box with the given id in this subtree.
    pub fn find_mut(&mut self, id: BoxId) -> Option<&mut Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// The principal box generated by `node`; anonymous boxes never match.
    #[must_use]
    pub fn find_node(&self, node: NodeId) -> Option<&Self> {
        if self.node() == Some(node) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_node(node))
    }

    /// Visit this box and its descendants in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Baseline of the first line in this subtree, if any.
    #[must_use]
    pub fn first_baseline(&self) -> Option<f32> {
        self.lines
            .first()
            .map(|line| line.baseline)
            .or_else(|| {
                self.children
                    .iter()
                    .filter(|c| !c.is_out_of_flow())
                    .find_map(Self::first_baseline)
            })
    }

    /// Number of boxes in this subtree.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }

    /// Indented dump of the subtree: type, display and border box.
    #[must_use]
    pub fn dump(&self, tree: Option<&DomTree>) -> String {
        let mut out = String::new();
        self.dump_into(tree, 0, &mut out);
        out
    }

    fn dump_into(&self, tree: Option<&DomTree>, depth: usize, out: &mut String) {
        let label = match &self.box_type {
            BoxType::Principal(node) => {
                format!("<{}>", tree.and_then(|t| t.tag_name(*node)).unwrap_or("element"))
            }
            BoxType::Anonymous => "anonymous".to_string(),
            BoxType::Text(text) => format!("text {:?}", text.trim()),
            BoxType::LineBreak => "<br>".to_string(),
            BoxType::Replaced { src, .. } => format!("<img src={:?}>", src.as_deref().unwrap_or("")),
            BoxType::Spacing { cell, start_row, end_row, .. } => {
                format!("spacing for #{} rows {start_row}..={end_row}", cell.0)
            }
        };
        let r = self.dimensions.border_box();
        let _ = writeln!(
            out,
            "{}#{} {label} {} [{:.1}, {:.1}, {:.1} x {:.1}]",
            "  ".repeat(depth),
            self.id.0,
            self.display,
            r.x,
            r.y,
            r.width,
            r.height
        );
        for line in &self.lines {
            let words: Vec<String> = line.fragments.iter().map(Fragment::describe).collect();
            let _ = writeln!(
                out,
                "{}line [{:.1}, {:.1}, {:.1} x {:.1}] {}",
                "  ".repeat(depth + 1),
                line.rect.x,
                line.rect.y,
                line.rect.width,
                line.rect.height,
                words.join(" ")
            );
        }
        for child in &self.children {
            child.dump_into(tree, depth + 1, out);
        }
    }
}
