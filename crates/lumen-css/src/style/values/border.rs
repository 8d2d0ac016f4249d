//! CSS Border values and four-sided boxes
//!
//! [CSS Backgrounds and Borders Level 3](https://www.w3.org/TR/css-backgrounds-3/)

use serde::Serialize;

use super::color::ColorValue;
use super::keywords::BorderStyle;
use super::length::LengthValue;

/// A value for each physical side of a box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Sides<T> {
    /// Top side.
    pub top: T,
    /// Right side.
    pub right: T,
    /// Bottom side.
    pub bottom: T,
    /// Left side.
    pub left: T,
}

impl<T: Clone> Sides<T> {
    /// The same value on every side.
    #[must_use]
    pub fn all(value: T) -> Self {
        Self {
            top: value.clone(),
            right: value.clone(),
            bottom: value.clone(),
            left: value,
        }
    }

    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    ///
    /// "If there is only one component value, it applies to all sides. If
    /// there are two values, the top and bottom margins are set to the first
    /// value and the right and left margins are set to the second. If there
    /// are three values, the top is set to the first value, the left and
    /// right are set to the second, and the bottom is set to the third. If
    /// there are four values, they apply to the top, right, bottom, and
    /// left, respectively."
    #[must_use]
    pub fn from_shorthand(values: &[T]) -> Option<Self> {
        match values {
            [all] => Some(Self::all(all.clone())),
            [vertical, horizontal] => Some(Self {
                top: vertical.clone(),
                right: horizontal.clone(),
                bottom: vertical.clone(),
                left: horizontal.clone(),
            }),
            [top, horizontal, bottom] => Some(Self {
                top: top.clone(),
                right: horizontal.clone(),
                bottom: bottom.clone(),
                left: horizontal.clone(),
            }),
            [top, right, bottom, left] => Some(Self {
                top: top.clone(),
                right: right.clone(),
                bottom: bottom.clone(),
                left: left.clone(),
            }),
            _ => None,
        }
    }

    /// Mutable access to one side by its CSS name.
    pub fn side_mut(&mut self, side: &str) -> Option<&mut T> {
        match side {
            "top" => Some(&mut self.top),
            "right" => Some(&mut self.right),
            "bottom" => Some(&mut self.bottom),
            "left" => Some(&mut self.left),
            _ => None,
        }
    }

    /// One side by its CSS name.
    #[must_use]
    pub fn get(&self, side: &str) -> Option<T> {
        match side {
            "top" => Some(self.top.clone()),
            "right" => Some(self.right.clone()),
            "bottom" => Some(self.bottom.clone()),
            "left" => Some(self.left.clone()),
            _ => None,
        }
    }

    /// Apply `f` to every side.
    #[must_use]
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Sides<U> {
        Sides {
            top: f(&self.top),
            right: f(&self.right),
            bottom: f(&self.bottom),
            left: f(&self.left),
        }
    }
}

/// [§ 4 Borders](https://www.w3.org/TR/css-backgrounds-3/#borders)
///
/// Border value representing width, style, and color of one side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BorderSide {
    /// [§ 4.3 'border-width'](https://www.w3.org/TR/css-backgrounds-3/#border-width)
    ///
    /// "Initial: medium"
    pub width: LengthValue,
    /// [§ 4.2 'border-style'](https://www.w3.org/TR/css-backgrounds-3/#border-style)
    pub style: BorderStyle,
    /// [§ 4.1 'border-color'](https://www.w3.org/TR/css-backgrounds-3/#border-color)
    ///
    /// `None` is `currentColor`.
    pub color: Option<ColorValue>,
}

impl Default for BorderSide {
    fn default() -> Self {
        Self {
            width: LengthValue::Px(MEDIUM_BORDER_PX),
            style: BorderStyle::None,
            color: None,
        }
    }
}

/// "thin ≤ medium ≤ thick"
pub const THIN_BORDER_PX: f32 = 1.0;
/// Width of `medium` borders.
pub const MEDIUM_BORDER_PX: f32 = 3.0;
/// Width of `thick` borders.
pub const THICK_BORDER_PX: f32 = 5.0;

/// [§ 5 'border-radius'](https://www.w3.org/TR/css-backgrounds-3/#border-radius)
///
/// One (circular) radius per corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CornerRadii {
    /// Top-left corner.
    pub top_left: LengthValue,
    /// Top-right corner.
    pub top_right: LengthValue,
    /// Bottom-right corner.
    pub bottom_right: LengthValue,
    /// Bottom-left corner.
    pub bottom_left: LengthValue,
}

impl Default for CornerRadii {
    fn default() -> Self {
        Self {
            top_left: LengthValue::ZERO,
            top_right: LengthValue::ZERO,
            bottom_right: LengthValue::ZERO,
            bottom_left: LengthValue::ZERO,
        }
    }
}

impl CornerRadii {
    /// "The four values for each radii are given in the order top-left,
    /// top-right, bottom-right, bottom-left. If bottom-left is omitted it is
    /// the same as top-right. If bottom-right is omitted it is the same as
    /// top-left. If top-right is omitted it is the same as top-left."
    #[must_use]
    pub fn from_shorthand(values: &[LengthValue]) -> Option<Self> {
        let (tl, tr, br, bl) = match *values {
            [all] => (all, all, all, all),
            [a, b] => (a, b, a, b),
            [a, b, c] => (a, b, c, b),
            [a, b, c, d] => (a, b, c, d),
            _ => return None,
        };
        Some(Self {
            top_left: tl,
            top_right: tr,
            bottom_right: br,
            bottom_left: bl,
        })
    }

    /// Whether every corner is zero pixels.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
            .iter()
            .all(|r| *r == LengthValue::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_expansion() {
        let sides = Sides::from_shorthand(&[1, 2, 3]).unwrap();
        assert_eq!((sides.top, sides.right, sides.bottom, sides.left), (1, 2, 3, 2));
        assert!(Sides::<i32>::from_shorthand(&[]).is_none());
        assert!(Sides::from_shorthand(&[1, 2, 3, 4, 5]).is_none());
    }
}
