//! Block formatting context.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block. The vertical
//! distance between two sibling boxes is determined by the 'margin'
//! properties. Vertical margins between adjacent block-level boxes in a
//! block formatting context collapse."

use crate::style::values::{AutoLength, BorderSide, Clear, Direction, DisplayKind, LengthValue};

use super::LayoutContext;
use super::box_model::EdgeSizes;
use super::float::FloatContext;
use super::inline;
use super::intrinsic;
use super::layout_box::{BoxType, LayoutBox};
use super::table;

/// [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainingBlock {
    /// Left edge of the content area.
    pub x: f32,
    /// Top edge of the content area.
    pub y: f32,
    /// Width; percentages of widths, margins and padding resolve against it.
    pub width: f32,
    /// Height, when it does not depend on the content.
    pub height: Option<f32>,
}

/// Lay out the root box across the containing block, growing it to
/// contain its floats.
pub fn layout_root(root: &mut LayoutBox, cb: &ContainingBlock, ctx: &LayoutContext<'_>) {
    let mut floats = FloatContext::new();
    layout_block_box(root, cb, cb.y, &mut floats, ctx);
    if root.style.height.is_auto()
        && let Some(bottom) = floats.max_bottom()
    {
        let content = &mut root.dimensions.content;
        content.height = content.height.max(bottom - content.y);
    }
}

/// Resolve padding, border widths and margins against the containing
/// block width. `auto` margins resolve to zero here.
pub(crate) fn resolve_edges(b: &mut LayoutBox, cb_width: f32, ctx: &LayoutContext<'_>) {
    let lengths = ctx.lengths(&b.style);
    let style = &b.style;
    let padding = |side: &LengthValue| side.to_px(cb_width, &lengths).max(0.0);
    let border = |side: &BorderSide| {
        if side.style.is_none() {
            0.0
        } else {
            side.width.to_px(0.0, &lengths).max(0.0)
        }
    };
    let margin = |side: &AutoLength| side.to_px_or_zero(cb_width, &lengths);
    b.dimensions.padding = EdgeSizes {
        top: padding(&style.padding.top),
        right: padding(&style.padding.right),
        bottom: padding(&style.padding.bottom),
        left: padding(&style.padding.left),
    };
    b.dimensions.border = EdgeSizes {
        top: border(&style.border.top),
        right: border(&style.border.right),
        bottom: border(&style.border.bottom),
        left: border(&style.border.left),
    };
    b.dimensions.margin = EdgeSizes {
        top: margin(&style.margin.top),
        right: margin(&style.margin.right),
        bottom: margin(&style.margin.bottom),
        left: margin(&style.margin.left),
    };
}

/// Content width from `width`, honoring `box-sizing`. Edges must be resolved.
pub(crate) fn specified_width(b: &LayoutBox, cb_width: f32, ctx: &LayoutContext<'_>) -> Option<f32> {
    let lengths = ctx.lengths(&b.style);
    let width = b.style.width.to_px(cb_width, &lengths)?;
    Some(to_content_width(b, width))
}

/// Content height from `height`; percentages need a definite containing
/// block height.
pub(crate) fn specified_height(b: &LayoutBox, cb_height: Option<f32>, ctx: &LayoutContext<'_>) -> Option<f32> {
    let lengths = ctx.lengths(&b.style);
    let height = match b.style.height {
        AutoLength::Auto => return None,
        AutoLength::Length(len) if len.is_percent() => len.to_px(cb_height?, &lengths),
        AutoLength::Length(len) => len.to_px(0.0, &lengths),
    };
    Some(if b.style.box_sizing_border_box {
        (height - b.dimensions.vertical_chrome()).max(0.0)
    } else {
        height
    })
}

fn to_content_width(b: &LayoutBox, width: f32) -> f32 {
    if b.style.box_sizing_border_box {
        (width - b.dimensions.horizontal_chrome()).max(0.0)
    } else {
        width.max(0.0)
    }
}

/// [§ 10.4 Minimum and maximum widths](https://www.w3.org/TR/CSS2/visudet.html#min-max-widths)
pub(crate) fn clamp_width(b: &LayoutBox, width: f32, cb_width: f32, ctx: &LayoutContext<'_>) -> f32 {
    let lengths = ctx.lengths(&b.style);
    let mut width = width;
    if let Some(max) = b.style.max_width {
        width = width.min(to_content_width(b, max.to_px(cb_width, &lengths)));
    }
    let min = b.style.min_width.to_px(cb_width, &lengths);
    if min > 0.0 {
        width = width.max(to_content_width(b, min));
    }
    width.max(0.0)
}

/// [§ 10.7 Minimum and maximum heights](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
fn clamp_height(b: &LayoutBox, height: f32, cb_height: Option<f32>, ctx: &LayoutContext<'_>) -> f32 {
    let lengths = ctx.lengths(&b.style);
    let chrome = if b.style.box_sizing_border_box {
        b.dimensions.vertical_chrome()
    } else {
        0.0
    };
    let resolve = |len: LengthValue| {
        if len.is_percent() {
            cb_height.map(|h| len.to_px(h, &lengths) - chrome)
        } else {
            Some(len.to_px(0.0, &lengths) - chrome)
        }
    };
    let mut height = height;
    if let Some(max) = b.style.max_height.and_then(resolve) {
        height = height.min(max);
    }
    if let Some(min) = resolve(b.style.min_height) {
        height = height.max(min);
    }
    height.max(0.0)
}

/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// "'margin-left' + 'border-left-width' + 'padding-left' + 'width' +
/// 'padding-right' + 'border-right-width' + 'margin-right' = width of
/// containing block"
///
/// Solves the horizontal margins for a box whose content width is known.
pub(crate) fn solve_horizontal_margins(b: &mut LayoutBox, cb_width: f32, width: f32) {
    let mut left_auto = b.style.margin.left.is_auto();
    let mut right_auto = b.style.margin.right.is_auto();
    let used = width + b.dimensions.horizontal_chrome();
    let margin = &mut b.dimensions.margin;
    let fixed = used + margin.left + margin.right;
    // "If 'width' is not 'auto' and [the total] is larger than the width of
    // the containing block, then any 'auto' values for 'margin-left' or
    // 'margin-right' are, for the following rules, treated as zero."
    if fixed > cb_width {
        left_auto = false;
        right_auto = false;
    }
    let free = cb_width - fixed;
    match (left_auto, right_auto) {
        // "If both 'margin-left' and 'margin-right' are 'auto', their used
        // values are equal."
        (true, true) => {
            margin.left = free / 2.0;
            margin.right = free / 2.0;
        }
        (true, false) => margin.left = free,
        (false, true) => margin.right = free,
        // "If all of the above have a computed value other than 'auto', the
        // values are said to be 'over-constrained' and one of the used
        // values will have to be different from its computed value."
        (false, false) => {
            if b.style.direction == Direction::Rtl {
                margin.left = cb_width - used - margin.right;
            } else {
                margin.right = cb_width - used - margin.left;
            }
        }
    }
}

/// Margin-top of a box that is about to be laid out in `cb_width`.
fn margin_top(b: &LayoutBox, cb_width: f32, ctx: &LayoutContext<'_>) -> f32 {
    let lengths = ctx.lengths(&b.style);
    b.style.margin.top.to_px_or_zero(cb_width, &lengths)
}

/// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "When two or more margins collapse, the resulting margin width is the
/// maximum of the collapsing margins' widths. In the case of negative
/// margins, the maximum of the absolute values of the negative adjoining
/// margins is deducted from the maximum of the positive adjoining margins."
fn collapse_margins(a: f32, b: f32) -> f32 {
    a.max(b).max(0.0) + a.min(b).min(0.0)
}

/// Lay out an in-flow block-level box whose top margin edge is at `top`.
pub fn layout_block_box(b: &mut LayoutBox, cb: &ContainingBlock, top: f32, floats: &mut FloatContext, ctx: &LayoutContext<'_>) {
    if b.display == DisplayKind::Table {
        table::layout_table(b, cb, (cb.x, top), true, ctx);
        return;
    }
    resolve_edges(b, cb.width, ctx);

    let width = if matches!(b.box_type, BoxType::Replaced { .. }) {
        replaced_size(b, cb, ctx).0
    } else {
        let margins = b.dimensions.margin.horizontal();
        let width = specified_width(b, cb.width, ctx)
            .unwrap_or_else(|| cb.width - margins - b.dimensions.horizontal_chrome());
        clamp_width(b, width, cb.width, ctx)
    };
    solve_horizontal_margins(b, cb.width, width);

    let d = &mut b.dimensions;
    d.content.width = width;
    d.content.x = cb.x + d.margin.left + d.border.left + d.padding.left;
    d.content.y = top + d.margin.top + d.border.top + d.padding.top;

    if matches!(b.box_type, BoxType::Replaced { .. }) {
        b.dimensions.content.height = replaced_size(b, cb, ctx).1;
        return;
    }
    layout_contents(b, cb.height, Some(floats), ctx);
}

/// Lay out a box that is not in normal flow (inline-block, float, table
/// cell, absolutely positioned box) with its margin box at `origin`.
///
/// `border_width` forces the border-box width; otherwise `width` or
/// shrink-to-fit decides.
pub(crate) fn layout_sized(
    b: &mut LayoutBox,
    cb: &ContainingBlock,
    origin: (f32, f32),
    border_width: Option<f32>,
    ctx: &LayoutContext<'_>,
) {
    if b.display == DisplayKind::Table {
        table::layout_table(b, cb, origin, false, ctx);
        return;
    }
    resolve_edges(b, cb.width, ctx);
    let chrome = b.dimensions.horizontal_chrome();
    let (width, height) = if matches!(b.box_type, BoxType::Replaced { .. }) {
        let (w, h) = replaced_size(b, cb, ctx);
        (w, Some(h))
    } else {
        let width = match border_width {
            Some(w) => (w - chrome).max(0.0),
            None => {
                let width = specified_width(b, cb.width, ctx).unwrap_or_else(|| {
                    let available = cb.width - b.dimensions.margin.horizontal() - chrome;
                    shrink_to_fit(b, available, ctx)
                });
                clamp_width(b, width, cb.width, ctx)
            }
        };
        (width, None)
    };

    let d = &mut b.dimensions;
    d.content.width = width;
    d.content.x = origin.0 + d.margin.left + d.border.left + d.padding.left;
    d.content.y = origin.1 + d.margin.top + d.border.top + d.padding.top;
    match height {
        Some(h) => d.content.height = h,
        None => layout_contents(b, cb.height, None, ctx),
    }
}

/// Inline-block, inline image or float, laid out at the origin.
pub(crate) fn layout_atomic(b: &mut LayoutBox, cb_width: f32, ctx: &LayoutContext<'_>) {
    let cb = ContainingBlock {
        x: 0.0,
        y: 0.0,
        width: cb_width,
        height: None,
    };
    layout_sized(b, &cb, (0.0, 0.0), None, ctx);
}

/// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
///
/// "the shrink-to-fit width is: min(max(preferred minimum width, available
/// width), preferred width)."
pub(crate) fn shrink_to_fit(b: &LayoutBox, available: f32, ctx: &LayoutContext<'_>) -> f32 {
    let (min, max) = intrinsic::content_widths(b, ctx);
    min.max(available).min(max)
}

/// [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
///
/// Content size of an image: `width`/`height` (including the HTML
/// attributes), else the decoded size keeping its ratio, else a
/// placeholder square.
pub(crate) fn replaced_size(b: &LayoutBox, cb: &ContainingBlock, ctx: &LayoutContext<'_>) -> (f32, f32) {
    let intrinsic = match &b.box_type {
        BoxType::Replaced { src: Some(src), .. } => ctx.images.get(src).copied(),
        _ => None,
    };
    let placeholder = ctx.placeholder_size;
    let (width, height) = match (specified_width(b, cb.width, ctx), specified_height(b, cb.height, ctx), intrinsic) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some((iw, ih))) if iw > 0.0 => (w, w * ih / iw),
        (None, Some(h), Some((iw, ih))) if ih > 0.0 => (h * iw / ih, h),
        (None, None, Some(size)) => size,
        (Some(w), None, _) => (w, placeholder),
        (None, Some(h), _) => (placeholder, h),
        (None, None, None) => (placeholder, placeholder),
    };
    (
        clamp_width(b, width, cb.width, ctx),
        clamp_height(b, height, cb.height, ctx),
    )
}

/// Lay out the children of `b`, whose content position and width are set,
/// and resolve its height.
///
/// Boxes that establish a block formatting context (or have no parent
/// context) get their own [`FloatContext`] and grow to contain its floats.
fn layout_contents(b: &mut LayoutBox, cb_height: Option<f32>, parent_floats: Option<&mut FloatContext>, ctx: &LayoutContext<'_>) {
    let specified = specified_height(b, cb_height, ctx);
    let mut own = FloatContext::new();
    let (floats, is_root) = match parent_floats {
        Some(floats) if !b.establishes_bfc() => (floats, false),
        _ => (&mut own, true),
    };

    let content = b.dimensions.content;
    let mut height = if b.has_inline_content() {
        inline::layout_inline_content(b, floats, ctx)
    } else {
        let child_cb = ContainingBlock {
            x: content.x,
            y: content.y,
            width: content.width,
            height: specified,
        };
        layout_block_children(b, &child_cb, floats, ctx)
    };
    // [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    if is_root && let Some(bottom) = floats.max_bottom() {
        height = height.max(bottom - content.y);
    }
    let height = specified.unwrap_or(height);
    b.dimensions.content.height = clamp_height(b, height, cb_height, ctx);
}

/// Stack block-level children; returns the content height used.
fn layout_block_children(b: &mut LayoutBox, cb: &ContainingBlock, floats: &mut FloatContext, ctx: &LayoutContext<'_>) -> f32 {
    let extent = (cb.x, cb.x + cb.width);
    let mut cursor = cb.y;
    let mut pending_margin: Option<f32> = None;

    for child in &mut b.children {
        if child.is_absolutely_positioned() {
            // [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
            // The static position is where the box would have been in flow.
            child.static_position = (cb.x, cursor + pending_margin.unwrap_or(0.0));
            continue;
        }
        if child.is_floated() {
            layout_atomic(child, cb.width, ctx);
            let margin_box = child.dimensions.margin_box();
            let y = cursor + pending_margin.unwrap_or(0.0);
            let placed = floats.place(child.style.float, (margin_box.width, margin_box.height), extent, y);
            child.shift(placed.x - margin_box.x, placed.y - margin_box.y);
            continue;
        }

        // STEP 1: collapse with the previous sibling's bottom margin.
        let top_margin = margin_top(child, cb.width, ctx);
        let gap = pending_margin.map_or(top_margin, |prev| collapse_margins(prev, top_margin));
        let mut top = cursor + gap - top_margin;

        // STEP 2: clearance.
        // [§ 9.5.2 Controlling flow next to floats](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
        if child.style.clear != Clear::None {
            let border_top = top + top_margin;
            let cleared = floats.clear(child.style.clear, border_top);
            if cleared > border_top {
                top = cleared - top_margin;
            }
        }

        // STEP 3: "The border box of a table, a block-level replaced element,
        // or an element in the normal flow that establishes a new block
        // formatting context ... must not overlap the margin box of any
        // floats in the same block formatting context."
        let mut child_cb = *cb;
        if !floats.is_empty() && (child.establishes_bfc() || matches!(child.box_type, BoxType::Replaced { .. })) {
            let (left, right) = floats.band(top + top_margin, 1.0, extent);
            child_cb.x = left;
            child_cb.width = right - left;
        }

        layout_block_box(child, &child_cb, top, floats, ctx);
        cursor = child.dimensions.border_box().bottom();
        pending_margin = Some(child.dimensions.margin.bottom);
    }
    cursor + pending_margin.unwrap_or(0.0) - cb.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_margins() {
        assert!((collapse_margins(10.0, 20.0) - 20.0).abs() < f32::EPSILON);
        assert!((collapse_margins(-10.0, 20.0) - 10.0).abs() < f32::EPSILON);
        assert!((collapse_margins(-10.0, -5.0) + 10.0).abs() < f32::EPSILON);
    }
}
