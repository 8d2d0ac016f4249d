//! Graphics backends.
//!
//! The painter produces a [`DisplayList`]; [`replay`] executes it against
//! any [`Graphics`] implementation:
//!
//! ```text
//! Style → Layout → Paint → Graphics
//!                    ↓         ↓
//!              DisplayList → RasterGraphics (pixels)
//!                          → RecordingGraphics (draw calls)
//! ```
//!
//! Backends know nothing about CSS, layout, or the DOM. They only execute
//! drawing operations in document pixel coordinates.

mod raster;
mod recording;

use std::collections::HashMap;

use lumen_common::LoadedImage;
use lumen_css::paint::{LineDash, Path, PlaceholderKind};
use lumen_css::{ColorValue, DisplayCommand, DisplayList, FontSpec, Rect};

pub use raster::RasterGraphics;
pub use recording::{DrawCall, RecordingGraphics};

const PLACEHOLDER_FILL: ColorValue = ColorValue::rgb(0xee, 0xee, 0xee);
const PLACEHOLDER_EDGE: ColorValue = ColorValue::rgb(0x99, 0x99, 0x99);
const PLACEHOLDER_ERROR: ColorValue = ColorValue::rgb(0xcc, 0x00, 0x00);

/// Drawing capability of an output device.
pub trait Graphics {
    /// Fill `rect` with a solid color.
    fn fill_rect(&mut self, rect: &Rect, color: ColorValue);

    /// Fill `path` with the even-odd rule.
    fn fill_path(&mut self, path: &Path, color: ColorValue);

    /// Stroke a straight line.
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: ColorValue, dash: LineDash);

    /// Draw `text` with its baseline starting at `origin`.
    fn draw_text(&mut self, origin: (f32, f32), text: &str, font: &FontSpec, color: ColorValue);

    /// Draw `image` (or its `source` sub-rectangle, in image pixels) scaled
    /// into `dest`.
    fn draw_image(&mut self, image: &LoadedImage, dest: &Rect, source: Option<&Rect>, opacity: f32);

    /// Draw the box shown in place of an unavailable image: a grey frame,
    /// crossed out in red when the load failed.
    fn draw_placeholder(&mut self, rect: &Rect, kind: PlaceholderKind) {
        self.fill_rect(rect, PLACEHOLDER_FILL);
        let (left, top, right, bottom) = (rect.x + 0.5, rect.y + 0.5, rect.right() - 0.5, rect.bottom() - 0.5);
        let edges = [
            ((left, top), (right, top)),
            ((right, top), (right, bottom)),
            ((right, bottom), (left, bottom)),
            ((left, bottom), (left, top)),
        ];
        for (from, to) in edges {
            self.stroke_line(from, to, 1.0, PLACEHOLDER_EDGE, LineDash::Solid);
        }
        if kind == PlaceholderKind::Error {
            self.stroke_line((left, top), (right, bottom), 1.0, PLACEHOLDER_ERROR, LineDash::Solid);
            self.stroke_line((right, top), (left, bottom), 1.0, PLACEHOLDER_ERROR, LineDash::Solid);
        }
    }

    /// Intersect the clip region with `rect` until the matching
    /// [`Graphics::pop_clip`].
    fn push_clip(&mut self, rect: &Rect);

    /// Restore the clip region saved by the last [`Graphics::push_clip`].
    fn pop_clip(&mut self);
}

/// Execute `list` against `gfx`, looking images up by source in `images`.
///
/// An image that is not in `images` is drawn as an error placeholder.
#[allow(clippy::implicit_hasher)]
pub fn replay<G: Graphics + ?Sized>(list: &DisplayList, images: &HashMap<String, LoadedImage>, gfx: &mut G) {
    for command in list.commands() {
        match command {
            DisplayCommand::FillRect { rect, color } => gfx.fill_rect(rect, *color),
            DisplayCommand::FillPath { path, color } => gfx.fill_path(path, *color),
            DisplayCommand::StrokeLine {
                from,
                to,
                width,
                color,
                dash,
            } => gfx.stroke_line(*from, *to, *width, *color, *dash),
            DisplayCommand::DrawText {
                origin,
                text,
                font,
                color,
            } => gfx.draw_text(*origin, text, font, *color),
            DisplayCommand::DrawImage {
                src,
                dest,
                source,
                opacity,
            } => match images.get(src) {
                Some(image) => gfx.draw_image(image, dest, source.as_ref(), *opacity),
                None => gfx.draw_placeholder(dest, PlaceholderKind::Error),
            },
            DisplayCommand::DrawPlaceholder { rect, kind } => gfx.draw_placeholder(rect, *kind),
            DisplayCommand::PushClip { rect } => gfx.push_clip(rect),
            DisplayCommand::PopClip => gfx.pop_clip(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_substitutes_missing_images() {
        let mut list = DisplayList::new();
        list.push(DisplayCommand::PushClip {
            rect: Rect::new(0.0, 0.0, 50.0, 50.0),
        });
        list.push(DisplayCommand::DrawImage {
            src: "gone.png".to_string(),
            dest: Rect::new(1.0, 2.0, 10.0, 10.0),
            source: None,
            opacity: 1.0,
        });
        list.push(DisplayCommand::PopClip);

        let mut gfx = RecordingGraphics::new();
        replay(&list, &HashMap::new(), &mut gfx);
        assert_eq!(
            gfx.calls(),
            &[
                DrawCall::PushClip {
                    rect: Rect::new(0.0, 0.0, 50.0, 50.0)
                },
                DrawCall::Placeholder {
                    rect: Rect::new(1.0, 2.0, 10.0, 10.0),
                    kind: PlaceholderKind::Error
                },
                DrawCall::PopClip,
            ]
        );
    }

    #[test]
    fn test_replay_passes_images_through() {
        let mut list = DisplayList::new();
        list.push(DisplayCommand::DrawImage {
            src: "a.png".to_string(),
            dest: Rect::new(0.0, 0.0, 8.0, 4.0),
            source: Some(Rect::new(0.0, 0.0, 2.0, 1.0)),
            opacity: 0.5,
        });
        let images = HashMap::from([("a.png".to_string(), LoadedImage::solid(2, 1, [0, 0, 0, 255]))]);
        let mut gfx = RecordingGraphics::new();
        replay(&list, &images, &mut gfx);
        assert_eq!(
            gfx.calls(),
            &[DrawCall::Image {
                size: (2, 1),
                dest: Rect::new(0.0, 0.0, 8.0, 4.0),
                source: Some(Rect::new(0.0, 0.0, 2.0, 1.0)),
                opacity: 0.5
            }]
        );
    }
}
