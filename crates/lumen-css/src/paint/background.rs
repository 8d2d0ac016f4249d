//! CSS Backgrounds
//!
//! [CSS Backgrounds and Borders Module Level 3](https://www.w3.org/TR/css-backgrounds-3/)
//!
//! Canvas background propagation and background image tiling.

use crate::layout::{BoxId, BoxType, LayoutBox, Rect};
use crate::style::ColorValue;
use crate::style::values::{BackgroundRepeat, DisplayKind};

/// Tiles past this many are dropped.
const MAX_TILES: usize = 4096;

/// [§ 2.11.2 The Canvas Background and the HTML `<body>` Element](https://www.w3.org/TR/css-backgrounds-3/#special-backgrounds)
///
/// "The background of the root element becomes the canvas background and its
/// background painting area extends to cover the entire canvas."
///
/// "if the computed value of background-image on the root element is
/// `none` and its background-color is `transparent`, user agents must
/// instead propagate the computed values of the background properties from
/// that element's first HTML `body` child element."
///
/// Returns the box whose background was taken (it paints no background of
/// its own) and the canvas color.
#[must_use]
pub fn canvas_background(root: &LayoutBox) -> Option<(BoxId, ColorValue)> {
    if !root.style.background_color.is_transparent() {
        return Some((root.id, root.style.background_color));
    }
    if root.style.background_image.is_some() {
        return None;
    }
    // The body is the root's first principal child that generates a box.
    let body = root
        .children
        .iter()
        .find(|c| matches!(c.box_type, BoxType::Principal(_)) && c.display != DisplayKind::None)?;
    (!body.style.background_color.is_transparent()).then_some((body.id, body.style.background_color))
}

/// [§ 3.5 'background-repeat'](https://www.w3.org/TR/css-backgrounds-3/#background-repeat)
///
/// Destination rectangles of the tiles of an `image_size` image placed at
/// `anchor` that intersect `area`.
#[must_use]
pub fn tile_rects(area: &Rect, anchor: (f32, f32), image_size: (f32, f32), repeat: BackgroundRepeat) -> Vec<Rect> {
    let (w, h) = image_size;
    if w <= 0.0 || h <= 0.0 {
        return Vec::new();
    }
    let (repeat_x, repeat_y) = match repeat {
        BackgroundRepeat::Repeat => (true, true),
        BackgroundRepeat::RepeatX => (true, false),
        BackgroundRepeat::RepeatY => (false, true),
        BackgroundRepeat::NoRepeat => (false, false),
    };
    // Tiles run from the first one at or before the area's edge.
    let axis = |anchor: f32, size: f32, start: f32, end: f32, repeat: bool| {
        if repeat {
            let first = anchor - ((anchor - start) / size).ceil() * size;
            (first, end)
        } else {
            (anchor, anchor + size)
        }
    };
    let (x0, x_end) = axis(anchor.0, w, area.x, area.right(), repeat_x);
    let (y0, y_end) = axis(anchor.1, h, area.y, area.bottom(), repeat_y);

    let mut tiles = Vec::new();
    let mut y = y0;
    while y < y_end && tiles.len() < MAX_TILES {
        let mut x = x0;
        while x < x_end && tiles.len() < MAX_TILES {
            let tile = Rect::new(x, y, w, h);
            if tile.intersect(area).is_some() {
                tiles.push(tile);
            }
            x += w;
        }
        y += h;
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_repeat_is_one_tile() {
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        let tiles = tile_rects(&area, (10.0, 20.0), (30.0, 30.0), BackgroundRepeat::NoRepeat);
        assert_eq!(tiles, vec![Rect::new(10.0, 20.0, 30.0, 30.0)]);
    }

    #[test]
    fn test_repeat_x_starts_before_area() {
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        let tiles = tile_rects(&area, (10.0, 0.0), (40.0, 40.0), BackgroundRepeat::RepeatX);
        let xs: Vec<f32> = tiles.iter().map(|t| t.x).collect();
        assert_eq!(xs, vec![-30.0, 10.0, 50.0, 90.0]);
        assert!(tiles.iter().all(|t| t.y == 0.0));
    }

    #[test]
    fn test_repeat_fills_both_axes() {
        let area = Rect::new(0.0, 0.0, 50.0, 50.0);
        let tiles = tile_rects(&area, (0.0, 0.0), (25.0, 25.0), BackgroundRepeat::Repeat);
        assert_eq!(tiles.len(), 4);
    }
}
