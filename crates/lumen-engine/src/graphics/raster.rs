//! Software raster backend: tiny-skia for geometry, fontdue for glyphs.

use std::path::Path as FsPath;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use lumen_common::LoadedImage;
use lumen_css::paint::{LineDash, Path, PathElement};
use lumen_css::{ColorValue, FontSpec, Rect};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash, Transform,
};

use super::Graphics;
use crate::font::FontFamilyMap;

/// Renders into an RGBA pixel buffer, initially white.
pub struct RasterGraphics {
    pixmap: Pixmap,
    fonts: Arc<FontFamilyMap>,
    /// Effective clip rectangles; the last one is current.
    clips: Vec<Rect>,
    /// Coverage mask of the current clip.
    mask: Option<Mask>,
    warned_no_font: bool,
}

impl std::fmt::Debug for RasterGraphics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterGraphics")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("clips", &self.clips)
            .finish_non_exhaustive()
    }
}

impl RasterGraphics {
    /// A white canvas of `width` × `height` pixels drawing text with `fonts`.
    ///
    /// # Errors
    ///
    /// Fails when either dimension is zero or the buffer cannot be
    /// allocated.
    pub fn new(width: u32, height: u32, fonts: Arc<FontFamilyMap>) -> Result<Self> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        pixmap.fill(tiny_skia::Color::WHITE);
        Ok(Self {
            pixmap,
            fonts,
            clips: Vec::new(),
            mask: None,
            warned_no_font: false,
        })
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha RGBA of the pixel at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Copy the canvas into an `image` buffer.
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        let data = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RgbaImage::from_raw(self.width(), self.height(), data).unwrap_or_default()
    }

    /// Write the canvas to `path`; the format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be encoded or written.
    pub fn save(&self, path: &FsPath) -> Result<()> {
        self.to_rgba_image()
            .save(path)
            .with_context(|| format!("failed to save image to '{}'", path.display()))
    }

    /// Whether the current clip leaves nothing visible.
    fn clipped_out(&self) -> bool {
        self.clips.last().is_some_and(|r| r.width <= 0.0 || r.height <= 0.0)
    }

    fn rebuild_mask(&mut self) {
        self.mask = self.clips.last().and_then(|clip| {
            let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())?;
            if let Some(path) = skia_rect(clip).map(PathBuilder::from_rect) {
                mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
            }
            Some(mask)
        });
    }

    fn draw_glyphs(&mut self, origin: (f32, f32), text: &str, spec: &FontSpec, color: ColorValue) {
        let Some(font) = self.fonts.font(spec) else {
            if !self.warned_no_font {
                self.warned_no_font = true;
                log::warn!("no font available for '{}'; text is not drawn", spec.family);
            }
            return;
        };
        let mut cursor = origin.0;
        for ch in text.chars().filter(|ch| !ch.is_control()) {
            let (metrics, coverage) = font.rasterize(ch, spec.size);
            let advance = metrics.advance_width;
            if metrics.width > 0 && metrics.height > 0 {
                // fontdue's ymin is the offset of the bitmap bottom from the baseline.
                let left = (cursor + metrics.xmin as f32).round() as i32;
                let top = (origin.1 - metrics.ymin as f32 - metrics.height as f32).round() as i32;
                if let Some(glyph) = glyph_pixmap(&coverage, metrics.width as u32, metrics.height as u32, color) {
                    self.pixmap.draw_pixmap(
                        left,
                        top,
                        glyph.as_ref(),
                        &PixmapPaint::default(),
                        Transform::identity(),
                        self.mask.as_ref(),
                    );
                }
            }
            cursor += advance;
        }
    }
}

impl Graphics for RasterGraphics {
    fn fill_rect(&mut self, rect: &Rect, color: ColorValue) {
        if self.clipped_out() || color.is_transparent() {
            return;
        }
        if let Some(r) = skia_rect(rect) {
            self.pixmap
                .fill_rect(r, &solid_paint(color), Transform::identity(), self.mask.as_ref());
        }
    }

    fn fill_path(&mut self, path: &Path, color: ColorValue) {
        if self.clipped_out() || color.is_transparent() {
            return;
        }
        if let Some(p) = skia_path(path) {
            self.pixmap.fill_path(
                &p,
                &solid_paint(color),
                FillRule::EvenOdd,
                Transform::identity(),
                self.mask.as_ref(),
            );
        }
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: ColorValue, dash: LineDash) {
        if self.clipped_out() || color.is_transparent() || width <= 0.0 {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        let Some(path) = pb.finish() else { return };
        let mut stroke = Stroke {
            width,
            ..Stroke::default()
        };
        stroke.dash = match dash {
            LineDash::Solid => None,
            LineDash::Dashed => StrokeDash::new(vec![3.0 * width, width], 0.0),
            LineDash::Dotted => StrokeDash::new(vec![width, width], 0.0),
        };
        self.pixmap.stroke_path(
            &path,
            &solid_paint(color),
            &stroke,
            Transform::identity(),
            self.mask.as_ref(),
        );
    }

    fn draw_text(&mut self, origin: (f32, f32), text: &str, font: &FontSpec, color: ColorValue) {
        if self.clipped_out() || color.is_transparent() {
            return;
        }
        self.draw_glyphs(origin, text, font, color);
    }

    fn draw_image(&mut self, image: &LoadedImage, dest: &Rect, source: Option<&Rect>, opacity: f32) {
        if self.clipped_out() || dest.width <= 0.0 || dest.height <= 0.0 || opacity <= 0.0 {
            return;
        }
        let cropped;
        let image = match source {
            Some(src) => {
                let Some(part) = image.crop(
                    src.x.max(0.0) as u32,
                    src.y.max(0.0) as u32,
                    src.width.ceil().max(1.0) as u32,
                    src.height.ceil().max(1.0) as u32,
                ) else {
                    return;
                };
                cropped = part;
                &cropped
            }
            None => image,
        };
        let Some(pixmap) = image_pixmap(image) else { return };
        let paint = PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0),
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let transform = Transform::from_row(
            dest.width / image.width() as f32,
            0.0,
            0.0,
            dest.height / image.height() as f32,
            dest.x,
            dest.y,
        );
        self.pixmap
            .draw_pixmap(0, 0, pixmap.as_ref(), &paint, transform, self.mask.as_ref());
    }

    fn push_clip(&mut self, rect: &Rect) {
        let clip = match self.clips.last() {
            Some(current) => current.intersect(rect).unwrap_or_default(),
            None => *rect,
        };
        self.clips.push(clip);
        self.rebuild_mask();
    }

    fn pop_clip(&mut self) {
        if self.clips.pop().is_none() {
            log::warn!("unbalanced clip pop ignored");
        }
        self.rebuild_mask();
    }
}

fn solid_paint(color: ColorValue) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn skia_rect(rect: &Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

/// Convert a display-list path. Arcs become cubic Béziers of at most a
/// quarter turn each, with control distance `4/3 · tan(θ/4)`.
fn skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    let mut has_point = false;
    for element in path.elements() {
        match *element {
            PathElement::MoveTo(x, y) => {
                pb.move_to(x, y);
                has_point = true;
            }
            PathElement::LineTo(x, y) => {
                if has_point {
                    pb.line_to(x, y);
                } else {
                    pb.move_to(x, y);
                    has_point = true;
                }
            }
            PathElement::Arc {
                center,
                radius,
                start,
                sweep,
            } => {
                let point = |angle: f32| (center.0 + radius.0 * angle.cos(), center.1 + radius.1 * angle.sin());
                let tangent = |angle: f32| (-radius.0 * angle.sin(), radius.1 * angle.cos());
                let (sx, sy) = point(start);
                if has_point {
                    pb.line_to(sx, sy);
                } else {
                    pb.move_to(sx, sy);
                    has_point = true;
                }
                let segments = (sweep.abs() / std::f32::consts::FRAC_PI_2).ceil().max(1.0) as usize;
                let step = sweep / segments as f32;
                let k = 4.0 / 3.0 * (step / 4.0).tan();
                for i in 0..segments {
                    let a0 = (i as f32).mul_add(step, start);
                    let a1 = a0 + step;
                    let (p0, p1) = (point(a0), point(a1));
                    let (t0, t1) = (tangent(a0), tangent(a1));
                    pb.cubic_to(
                        k.mul_add(t0.0, p0.0),
                        k.mul_add(t0.1, p0.1),
                        (-k).mul_add(t1.0, p1.0),
                        (-k).mul_add(t1.1, p1.1),
                        p1.0,
                        p1.1,
                    );
                }
            }
            PathElement::Close => {
                pb.close();
                has_point = false;
            }
        }
    }
    pb.finish()
}

/// Premultiplied copy of `image` for tiny-skia.
fn image_pixmap(image: &LoadedImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.rgba_data().chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

/// A glyph coverage bitmap tinted with `color`.
fn glyph_pixmap(coverage: &[u8], width: u32, height: u32, color: ColorValue) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    for (dst, &cov) in pixmap.pixels_mut().iter_mut().zip(coverage) {
        let alpha = (u16::from(cov) * u16::from(color.a) / 255) as u8;
        *dst = ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(width: u32, height: u32) -> RasterGraphics {
        RasterGraphics::new(width, height, Arc::new(FontFamilyMap::new("sans-serif"))).unwrap()
    }

    const RED: ColorValue = ColorValue::rgb(255, 0, 0);

    #[test]
    fn test_zero_size_canvas_is_an_error() {
        assert!(RasterGraphics::new(0, 10, Arc::new(FontFamilyMap::new("serif"))).is_err());
    }

    #[test]
    fn test_fill_rect_respects_clip() {
        let mut gfx = canvas(20, 20);
        gfx.push_clip(&Rect::new(0.0, 0.0, 10.0, 20.0));
        gfx.fill_rect(&Rect::new(0.0, 0.0, 20.0, 20.0), RED);
        gfx.pop_clip();
        assert_eq!(gfx.pixel(5, 5), Some([255, 0, 0, 255]));
        assert_eq!(gfx.pixel(15, 5), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_disjoint_clips_hide_everything() {
        let mut gfx = canvas(20, 20);
        gfx.push_clip(&Rect::new(0.0, 0.0, 5.0, 5.0));
        gfx.push_clip(&Rect::new(10.0, 10.0, 5.0, 5.0));
        gfx.fill_rect(&Rect::new(0.0, 0.0, 20.0, 20.0), RED);
        assert_eq!(gfx.pixel(12, 12), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_image_is_scaled_into_dest() {
        let mut gfx = canvas(10, 10);
        let image = LoadedImage::solid(1, 1, [0, 0, 255, 255]);
        gfx.draw_image(&image, &Rect::new(2.0, 2.0, 4.0, 4.0), None, 1.0);
        assert_eq!(gfx.pixel(3, 3), Some([0, 0, 255, 255]));
        assert_eq!(gfx.pixel(8, 8), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_circle_path_fills_center_not_corner() {
        let mut gfx = canvas(20, 20);
        let mut path = Path::new();
        let _ = path.add_circle((10.0, 10.0), 8.0);
        gfx.fill_path(&path, RED);
        assert_eq!(gfx.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(gfx.pixel(1, 1), Some([255, 255, 255, 255]));
    }
}
