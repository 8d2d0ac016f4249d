//! Positioned layout.
//!
//! [§ 9.3 Positioning schemes](https://www.w3.org/TR/CSS2/visuren.html#positioning-scheme)
//!
//! Runs after normal flow: relatively positioned boxes are shifted by
//! their offsets, absolutely positioned and fixed boxes are sized and
//! placed against their containing block.

use crate::style::values::{AutoLength, Position};

use super::LayoutContext;
use super::block::{self, ContainingBlock};
use super::box_model::Rect;
use super::layout_box::{BoxType, LayoutBox};

/// Place every positioned box under `root`.
///
/// [§ 10.1](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
/// "If the element has 'position: absolute', the containing block is
/// established by the nearest ancestor with a 'position' of 'absolute',
/// 'relative' or 'fixed' ... If there is no such ancestor, the containing
/// block is the initial containing block."
pub fn layout_positioned(root: &mut LayoutBox, ctx: &LayoutContext<'_>) {
    let viewport = Rect::new(0.0, 0.0, ctx.viewport.0, ctx.viewport.1);
    if root.style.position == Position::Relative {
        offset_relative(root, &viewport, ctx);
    }
    let cb = if root.is_positioned() {
        root.dimensions.padding_box()
    } else {
        viewport
    };
    position_children(root, cb, viewport, ctx);
}

fn position_children(parent: &mut LayoutBox, cb: Rect, viewport: Rect, ctx: &LayoutContext<'_>) {
    for child in &mut parent.children {
        match child.style.position {
            Position::Static => {}
            Position::Relative => offset_relative(child, &cb, ctx),
            Position::Absolute => layout_absolute(child, &cb, ctx),
            Position::Fixed => layout_absolute(child, &viewport, ctx),
        }
        let child_cb = if child.is_positioned() {
            child.dimensions.padding_box()
        } else {
            cb
        };
        position_children(child, child_cb, viewport, ctx);
    }
}

/// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
///
/// "If both 'left' and 'right' are not 'auto' ... 'right' is ignored."
/// Likewise 'bottom' yields to 'top'.
fn offset_relative(b: &mut LayoutBox, cb: &Rect, ctx: &LayoutContext<'_>) {
    let lengths = ctx.lengths(&b.style);
    let offsets = &b.style.offsets;
    let dx = offsets
        .left
        .to_px(cb.width, &lengths)
        .or_else(|| offsets.right.to_px(cb.width, &lengths).map(|r| -r))
        .unwrap_or(0.0);
    let dy = offsets
        .top
        .to_px(cb.height, &lengths)
        .or_else(|| offsets.bottom.to_px(cb.height, &lengths).map(|b| -b))
        .unwrap_or(0.0);
    b.shift(dx, dy);
}

/// [§ 10.3.7 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
///
/// Width comes from `width`, from `left` and `right` together, or from
/// shrink-to-fit. A box with neither `left` nor `right` (or neither `top`
/// nor `bottom`) keeps its static position on that axis.
fn layout_absolute(b: &mut LayoutBox, cb: &Rect, ctx: &LayoutContext<'_>) {
    let lengths = ctx.lengths(&b.style);
    let offsets = b.style.offsets;
    let left = offsets.left.to_px(cb.width, &lengths);
    let right = offsets.right.to_px(cb.width, &lengths);
    let top = offsets.top.to_px(cb.height, &lengths);
    let bottom = offsets.bottom.to_px(cb.height, &lengths);
    let replaced = matches!(b.box_type, BoxType::Replaced { .. });
    let static_position = b.static_position;

    let block_cb = ContainingBlock {
        x: cb.x,
        y: cb.y,
        width: cb.width,
        height: Some(cb.height),
    };
    block::resolve_edges(b, cb.width, ctx);
    let border_width = match (left, right) {
        (Some(l), Some(r)) if !replaced && block::specified_width(b, cb.width, ctx).is_none() => {
            let chrome = b.dimensions.horizontal_chrome();
            Some((cb.width - l - r - b.dimensions.margin.horizontal()).max(chrome))
        }
        _ => None,
    };
    block::layout_sized(b, &block_cb, (0.0, 0.0), border_width, ctx);

    // [§ 10.6.4](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-height)
    // 'top' and 'bottom' set with 'height: auto' fill the space between them.
    if let (Some(t), Some(bm), AutoLength::Auto, false) = (top, bottom, b.style.height, replaced) {
        let d = &b.dimensions;
        let height = cb.height - t - bm - d.margin.vertical() - d.vertical_chrome();
        b.dimensions.content.height = height.max(0.0);
    }

    let margin_box = b.dimensions.margin_box();
    let x = match (left, right) {
        (Some(l), _) => cb.x + l,
        (None, Some(r)) => cb.right() - r - margin_box.width,
        (None, None) => static_position.0,
    };
    let y = match (top, bottom) {
        (Some(t), _) => cb.y + t,
        (None, Some(bm)) => cb.bottom() - bm - margin_box.height,
        (None, None) => static_position.1,
    };
    b.shift(x - margin_box.x, y - margin_box.y);
    b.static_position = static_position;
}
