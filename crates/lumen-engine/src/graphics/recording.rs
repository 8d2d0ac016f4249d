//! A backend that records draw calls instead of drawing.

use lumen_common::LoadedImage;
use lumen_css::paint::{LineDash, Path, PlaceholderKind};
use lumen_css::{ColorValue, FontSpec, Rect};

use super::Graphics;

/// One recorded [`Graphics`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// [`Graphics::fill_rect`].
    FillRect {
        /// Filled area.
        rect: Rect,
        /// Fill color.
        color: ColorValue,
    },
    /// [`Graphics::fill_path`].
    FillPath {
        /// Outline.
        path: Path,
        /// Fill color.
        color: ColorValue,
    },
    /// [`Graphics::stroke_line`].
    StrokeLine {
        /// Start point.
        from: (f32, f32),
        /// End point.
        to: (f32, f32),
        /// Line width.
        width: f32,
        /// Line color.
        color: ColorValue,
        /// Dash pattern.
        dash: LineDash,
    },
    /// [`Graphics::draw_text`].
    Text {
        /// Left end of the baseline.
        origin: (f32, f32),
        /// Drawn text.
        text: String,
        /// Font.
        font: FontSpec,
        /// Text color.
        color: ColorValue,
    },
    /// [`Graphics::draw_image`].
    Image {
        /// Pixel size of the image.
        size: (u32, u32),
        /// Destination.
        dest: Rect,
        /// Source sub-rectangle.
        source: Option<Rect>,
        /// Opacity.
        opacity: f32,
    },
    /// [`Graphics::draw_placeholder`].
    Placeholder {
        /// Where the image would be.
        rect: Rect,
        /// Loading or error.
        kind: PlaceholderKind,
    },
    /// [`Graphics::push_clip`].
    PushClip {
        /// Clip rectangle.
        rect: Rect,
    },
    /// [`Graphics::pop_clip`].
    PopClip,
}

/// Records every call, for tests and for hosts that post-process drawing.
#[derive(Debug, Clone, Default)]
pub struct RecordingGraphics {
    calls: Vec<DrawCall>,
}

impl RecordingGraphics {
    /// An empty recording.
    #[must_use]
    pub const fn new() -> Self {
        Self { calls: Vec::new() }
    }

    /// Calls in the order they were made.
    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Take the recorded calls, leaving the recording empty.
    pub fn take(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Text of every text call, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Graphics for RecordingGraphics {
    fn fill_rect(&mut self, rect: &Rect, color: ColorValue) {
        self.calls.push(DrawCall::FillRect { rect: *rect, color });
    }

    fn fill_path(&mut self, path: &Path, color: ColorValue) {
        self.calls.push(DrawCall::FillPath {
            path: path.clone(),
            color,
        });
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: ColorValue, dash: LineDash) {
        self.calls.push(DrawCall::StrokeLine {
            from,
            to,
            width,
            color,
            dash,
        });
    }

    fn draw_text(&mut self, origin: (f32, f32), text: &str, font: &FontSpec, color: ColorValue) {
        self.calls.push(DrawCall::Text {
            origin,
            text: text.to_string(),
            font: font.clone(),
            color,
        });
    }

    fn draw_image(&mut self, image: &LoadedImage, dest: &Rect, source: Option<&Rect>, opacity: f32) {
        self.calls.push(DrawCall::Image {
            size: (image.width(), image.height()),
            dest: *dest,
            source: source.copied(),
            opacity,
        });
    }

    fn draw_placeholder(&mut self, rect: &Rect, kind: PlaceholderKind) {
        self.calls.push(DrawCall::Placeholder { rect: *rect, kind });
    }

    fn push_clip(&mut self, rect: &Rect) {
        self.calls.push(DrawCall::PushClip { rect: *rect });
    }

    fn pop_clip(&mut self) {
        self.calls.push(DrawCall::PopClip);
    }
}
