//! CSS Layout Engine
//!
//! This module implements the CSS Visual Formatting Model for laying out
//! the box tree.
//!
//! # Relevant Specifications
//!
//! - [CSS 2.1 Visual Formatting Model](https://www.w3.org/TR/CSS2/visuren.html)
//! - [CSS 2.1 Visual Formatting Model Details](https://www.w3.org/TR/CSS2/visudet.html)
//! - [CSS 2.1 Tables](https://www.w3.org/TR/CSS2/tables.html)
//! - [CSS Text Module Level 3](https://www.w3.org/TR/css-text-3/)
//!
//! # Module Structure
//!
//! - [`builder`] - Box tree construction with anonymous and table fixup boxes
//! - [`box_model`] - Box dimensions, rectangles, and edge sizes
//! - [`layout_box`] - The box tree
//! - [`block`] - Block formatting context and sizing
//! - [`inline`] - Inline formatting context with line boxes
//! - [`intrinsic`] - Min/max-content widths
//! - [`float`] - Float placement and clearance
//! - [`table`] - Table layout algorithm
//! - [`positioned`] - Relative, absolute and fixed positioning
//! - [`font`] - Text measurement interface

pub mod block;
pub mod box_model;
pub mod builder;
pub mod float;
pub mod font;
pub mod inline;
pub mod intrinsic;
pub mod layout_box;
pub mod positioned;
pub mod table;

use std::collections::{HashMap, HashSet};

use lumen_common::WarningLog;

use crate::style::ComputedStyle;
use crate::style::values::LengthContext;

pub use block::ContainingBlock;
pub use box_model::{BoxDimensions, EdgeSizes, Rect};
pub use builder::{BoxTreeBuilder, MAX_BOX_DEPTH, build_box_tree};
pub use float::FloatContext;
pub use font::{ApproximateFontMetrics, FontMetrics, FontSpec, LineMetrics};
pub use inline::{Fragment, FragmentKind, LineBox, TextStyle};
pub use layout_box::{BoxId, BoxType, LayoutBox, ListMarker};

/// Everything layout needs from outside the box tree.
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    /// Viewport size; a height of zero means unbounded.
    pub viewport: (f32, f32),
    /// Text measurement.
    pub fonts: &'a dyn FontMetrics,
    /// Natural sizes of images loaded so far, by source.
    pub images: &'a HashMap<String, (f32, f32)>,
    /// Sink for deduplicated layout warnings.
    pub warnings: &'a WarningLog,
    /// Size of the box drawn for an image that has not loaded.
    pub placeholder_size: f32,
    /// Computed font size of the root element, for `rem`.
    pub root_font_size: f32,
}

impl LayoutContext<'_> {
    /// Context for resolving lengths in `style`.
    #[must_use]
    pub const fn lengths(&self, style: &ComputedStyle) -> LengthContext {
        style.length_context(self.root_font_size, self.viewport)
    }
}

/// Lay out the whole box tree in the viewport and return the bounds of
/// everything laid out.
///
/// STEP 1: normal flow (blocks, inlines, floats, tables).
/// STEP 2: positioned boxes.
/// STEP 3: number fragments in document order, for selection.
pub fn layout_document(root: &mut LayoutBox, ctx: &LayoutContext<'_>) -> Rect {
    let cb = ContainingBlock {
        x: 0.0,
        y: 0.0,
        width: ctx.viewport.0,
        height: (ctx.viewport.1 > 0.0).then_some(ctx.viewport.1),
    };
    block::layout_root(root, &cb, ctx);
    positioned::layout_positioned(root, ctx);
    let mut next = 0;
    number_fragments(root, &mut next, &mut HashSet::new());

    #[cfg(feature = "layout-trace")]
    log::trace!("layout tree:\n{}", root.dump(None));

    let bounds = document_bounds(root);
    log::debug!(
        "layout: {} boxes, {next} fragments, bounds {:.1} x {:.1}",
        root.count(),
        bounds.right(),
        bounds.bottom()
    );
    bounds
}

/// Give every fragment an index in document order. The content of an
/// atomic inline is numbered where its fragment sits in the line.
fn number_fragments(b: &mut LayoutBox, next: &mut usize, numbered: &mut HashSet<BoxId>) {
    if !numbered.insert(b.id) {
        return;
    }
    for line in &mut b.lines {
        for fragment in &mut line.fragments {
            fragment.index = *next;
            *next += 1;
            if let FragmentKind::Atomic(id) = fragment.kind
                && let Some(atomic) = b.children.iter_mut().find_map(|c| c.find_mut(id))
            {
                number_fragments(atomic, next, numbered);
            }
        }
    }
    for child in &mut b.children {
        number_fragments(child, next, numbered);
    }
}

fn document_bounds(root: &LayoutBox) -> Rect {
    let mut bounds = root.dimensions.margin_box();
    root.walk(&mut |b| {
        if b.is_spacing() {
            return;
        }
        bounds = bounds.union(&b.dimensions.border_box());
        for line in &b.lines {
            bounds = bounds.union(&line.rect);
        }
    });
    bounds
}
