//! CSS Float Layout.
//!
//! [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//!
//! "A float is a box that is shifted to the left or right on the current line.
//! The most interesting characteristic of a float is that content may flow along
//! its side (or be prohibited from doing so by the 'clear' property)."
//!
//! One [`FloatContext`] is shared by every block of a block formatting
//! context. Coordinates are absolute, so nested blocks query it with their
//! own horizontal extent.

use crate::style::values::{Clear, Float};

use super::box_model::Rect;

/// A single float that has been placed in the flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedFloat {
    /// Which side this float is on.
    pub side: Float,
    /// The margin box of the float.
    pub margin_box: Rect,
}

/// Placed floats of one block formatting context.
///
/// "Since a float is not in the flow, non-positioned block boxes created
/// before and after the float box flow vertically as if the float did not
/// exist. However, the current and subsequent line boxes created next to
/// the float are shortened as necessary to make room for the margin box
/// of the float."
#[derive(Debug, Clone, Default)]
pub struct FloatContext {
    floats: Vec<PlacedFloat>,
}

impl FloatContext {
    /// An empty context for a new block formatting context.
    #[must_use]
    pub const fn new() -> Self {
        Self { floats: Vec::new() }
    }

    /// Whether no float has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.floats.is_empty()
    }

    /// Every placed float, in placement order.
    #[must_use]
    pub fn floats(&self) -> &[PlacedFloat] {
        &self.floats
    }

    /// [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// "If the element has any floating descendants whose bottom margin edge
    /// is below the element's bottom content edge, then the height is
    /// increased to include those edges."
    #[must_use]
    pub fn max_bottom(&self) -> Option<f32> {
        self.floats
            .iter()
            .map(|f| f.margin_box.bottom())
            .reduce(f32::max)
    }

    /// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// Place a float of the given margin-box size inside the horizontal
    /// extent `[left, right)`, no higher than `current_y`, and return its
    /// margin box.
    ///
    /// - Rule 1: the float stays inside the containing block edges.
    /// - Rules 4, 5, 8: it is placed as high as possible, not above earlier floats.
    /// - Rule 9: left floats go as far left as possible, right floats as far right.
    /// - Rules 2, 3, 7: floats do not overlap each other.
    pub fn place(&mut self, side: Float, size: (f32, f32), extent: (f32, f32), current_y: f32) -> Rect {
        let (width, height) = size;
        // Rule 5: "The outer top of a floating box may not be higher than
        // the outer top of any block or floated box generated by an element
        // earlier in the source document."
        let mut y = self
            .floats
            .iter()
            .map(|f| f.margin_box.y)
            .fold(current_y, f32::max);
        loop {
            let (left, right) = self.band(y, height.max(0.01), extent);
            let fits = right - left >= width;
            let next = self.next_bottom_after(y);
            if fits || next.is_none() {
                let x = match side {
                    Float::Right => (right - width).max(left),
                    _ => left,
                };
                let rect = Rect::new(x, y, width, height);
                self.floats.push(PlacedFloat { side, margin_box: rect });
                return rect;
            }
            if let Some(next) = next {
                y = next;
            }
        }
    }

    /// [§ 9.5.2 The 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// "Requires that the top border edge of the box be below the bottom
    /// outer edge of any left-floating boxes" (and the analogues for
    /// `right` and `both`). Returns the cleared y, at least `current_y`.
    #[must_use]
    pub fn clear(&self, clear: Clear, current_y: f32) -> f32 {
        self.floats
            .iter()
            .filter(|f| match clear {
                Clear::None => false,
                Clear::Left => f.side == Float::Left,
                Clear::Right => f.side == Float::Right,
                Clear::Both => true,
            })
            .map(|f| f.margin_box.bottom())
            .fold(current_y, f32::max)
    }

    /// The free horizontal band `(left, right)` inside `extent` for content
    /// occupying `[y, y + height)`.
    #[must_use]
    pub fn band(&self, y: f32, height: f32, extent: (f32, f32)) -> (f32, f32) {
        let (mut left, mut right) = extent;
        for f in &self.floats {
            let active = f.margin_box.y < y + height && f.margin_box.bottom() > y;
            if !active {
                continue;
            }
            match f.side {
                Float::Left => left = left.max(f.margin_box.right()),
                Float::Right => right = right.min(f.margin_box.x),
                Float::None => {}
            }
        }
        (left, right.max(left))
    }

    /// The smallest float bottom strictly below `y`.
    #[must_use]
    pub fn next_bottom_after(&self, y: f32) -> Option<f32> {
        self.floats
            .iter()
            .map(|f| f.margin_box.bottom())
            .filter(|&bottom| bottom > y)
            .reduce(f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floats_stack_side_by_side_then_wrap() {
        let mut floats = FloatContext::new();
        let a = floats.place(Float::Left, (60.0, 20.0), (0.0, 100.0), 0.0);
        let b = floats.place(Float::Left, (30.0, 10.0), (0.0, 100.0), 0.0);
        let c = floats.place(Float::Left, (30.0, 10.0), (0.0, 100.0), 0.0);
        assert_eq!(a, Rect::new(0.0, 0.0, 60.0, 20.0));
        assert_eq!(b, Rect::new(60.0, 0.0, 30.0, 10.0));
        // No room beside a and b: drops below b.
        assert_eq!(c, Rect::new(60.0, 10.0, 30.0, 10.0));
    }

    #[test]
    fn test_band_and_clear() {
        let mut floats = FloatContext::new();
        let _ = floats.place(Float::Left, (20.0, 30.0), (0.0, 100.0), 0.0);
        let _ = floats.place(Float::Right, (10.0, 50.0), (0.0, 100.0), 0.0);
        assert_eq!(floats.band(0.0, 10.0, (0.0, 100.0)), (20.0, 90.0));
        assert_eq!(floats.band(40.0, 10.0, (0.0, 100.0)), (0.0, 90.0));
        assert!((floats.clear(Clear::Left, 5.0) - 30.0).abs() < f32::EPSILON);
        assert!((floats.clear(Clear::Both, 5.0) - 50.0).abs() < f32::EPSILON);
        assert!((floats.clear(Clear::None, 5.0) - 5.0).abs() < f32::EPSILON);
    }
}
