//! CSS Box Model types.
//!
//! [CSS Box Model Module Level 3](https://www.w3.org/TR/css-box-3/)
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ margin                        │
//! │   ┌───────────────────────┐   │
//! │   │ border                │   │
//! │   │   ┌───────────────┐   │   │
//! │   │   │ padding       │   │   │
//! │   │   │   ┌───────┐   │   │   │
//! │   │   │   │content│   │   │   │
//! │   │   │   └───────┘   │   │   │
//! │   │   └───────────────┘   │   │
//! │   └───────────────────────┘   │
//! └───────────────────────────────┘
//! ```
//!
//! All coordinates are absolute document pixels.

use serde::Serialize;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width, never negative after layout.
    pub width: f32,
    /// Height, never negative after layout.
    pub height: f32,
}

impl Rect {
    /// A rectangle from its origin and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the point lies inside (right and bottom edges exclusive).
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlap of two rectangles; `None` when they do not intersect.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > x && bottom > y).then(|| Self::new(x, y, right - x, bottom - y))
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// The rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// The rectangle grown outward by `edges`.
    #[must_use]
    pub fn expand(&self, edges: &EdgeSizes) -> Self {
        Self::new(
            self.x - edges.left,
            self.y - edges.top,
            self.width + edges.left + edges.right,
            self.height + edges.top + edges.bottom,
        )
    }

    /// The rectangle shrunk inward by `edges`, clamped to zero size.
    #[must_use]
    pub fn shrink(&self, edges: &EdgeSizes) -> Self {
        Self::new(
            self.x + edges.left,
            self.y + edges.top,
            (self.width - edges.horizontal()).max(0.0),
            (self.height - edges.vertical()).max(0.0),
        )
    }
}

/// Edge sizes for padding, border, or margin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EdgeSizes {
    /// Top edge size.
    pub top: f32,
    /// Right edge size.
    pub right: f32,
    /// Bottom edge size.
    pub bottom: f32,
    /// Left edge size.
    pub left: f32,
}

impl EdgeSizes {
    /// `left + right`.
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// `top + bottom`.
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// [§ 3. The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
///
/// "Each box has a content area and optional surrounding padding, border,
/// and margin areas."
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoxDimensions {
    /// Content area.
    pub content: Rect,
    /// Padding widths.
    pub padding: EdgeSizes,
    /// Border widths.
    pub border: EdgeSizes,
    /// Margin widths (used values, after auto resolution).
    pub margin: EdgeSizes,
}

impl BoxDimensions {
    /// [§ 3.2 Padding](https://www.w3.org/TR/css-box-3/#paddings)
    /// "The padding box contains both the content and padding areas."
    #[must_use]
    pub fn padding_box(&self) -> Rect {
        self.content.expand(&self.padding)
    }

    /// [§ 3.3 Borders](https://www.w3.org/TR/css-box-3/#borders)
    /// "The border box contains content, padding, and border areas."
    #[must_use]
    pub fn border_box(&self) -> Rect {
        self.padding_box().expand(&self.border)
    }

    /// [§ 3.1 Margins](https://www.w3.org/TR/css-box-3/#margins)
    /// "The margin box is the outermost box, and contains all four areas."
    #[must_use]
    pub fn margin_box(&self) -> Rect {
        self.border_box().expand(&self.margin)
    }

    /// Horizontal padding plus border.
    #[must_use]
    pub fn horizontal_chrome(&self) -> f32 {
        self.padding.horizontal() + self.border.horizontal()
    }

    /// Vertical padding plus border.
    #[must_use]
    pub fn vertical_chrome(&self) -> f32 {
        self.padding.vertical() + self.border.vertical()
    }

    /// Move every area by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.content = self.content.translate(dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_areas_nest() {
        let dims = BoxDimensions {
            content: Rect::new(20.0, 20.0, 100.0, 50.0),
            padding: EdgeSizes { top: 5.0, right: 5.0, bottom: 5.0, left: 5.0 },
            border: EdgeSizes { top: 1.0, right: 1.0, bottom: 1.0, left: 1.0 },
            margin: EdgeSizes { top: 10.0, right: 0.0, bottom: 10.0, left: 0.0 },
        };
        assert_eq!(dims.padding_box(), Rect::new(15.0, 15.0, 110.0, 60.0));
        assert_eq!(dims.border_box(), Rect::new(14.0, 14.0, 112.0, 62.0));
        assert_eq!(dims.margin_box(), Rect::new(14.0, 4.0, 112.0, 82.0));
    }

    #[test]
    fn test_intersect_and_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 15.0, 15.0));
        assert_eq!(a.intersect(&Rect::new(20.0, 0.0, 1.0, 1.0)), None);
        assert!(a.contains(0.0, 9.9));
        assert!(!a.contains(10.0, 0.0));
    }
}
