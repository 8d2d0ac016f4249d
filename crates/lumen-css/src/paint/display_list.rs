//! Display List - a sequence of drawing commands
//!
//! [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! The display list is the output of the painting phase. It contains all the
//! drawing commands needed to render a page, in the correct z-order. A
//! graphics backend replays it.

use std::f32::consts::{FRAC_PI_2, PI};

use crate::layout::{FontSpec, Rect};
use crate::style::ColorValue;

/// One step of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathElement {
    /// Start a new subpath.
    MoveTo(f32, f32),
    /// Straight segment to a point.
    LineTo(f32, f32),
    /// Elliptical arc around `center`, starting at `start` radians and
    /// sweeping `sweep` radians (positive is clockwise in y-down space).
    Arc {
        /// Center of the ellipse.
        center: (f32, f32),
        /// Horizontal and vertical radius.
        radius: (f32, f32),
        /// Start angle.
        start: f32,
        /// Sweep angle.
        sweep: f32,
    },
    /// Close the current subpath.
    Close,
}

/// A vector outline, filled with the even-odd rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    /// An empty path.
    #[must_use]
    pub const fn new() -> Self {
        Self { elements: Vec::new() }
    }

    /// Start a subpath at `(x, y)`.
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.elements.push(PathElement::MoveTo(x, y));
        self
    }

    /// Straight segment to `(x, y)`.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.elements.push(PathElement::LineTo(x, y));
        self
    }

    /// Elliptical arc; the backend connects it to the current point.
    pub fn arc(&mut self, center: (f32, f32), radius: (f32, f32), start: f32, sweep: f32) -> &mut Self {
        self.elements.push(PathElement::Arc {
            center,
            radius,
            start,
            sweep,
        });
        self
    }

    /// Close the current subpath.
    pub fn close(&mut self) -> &mut Self {
        self.elements.push(PathElement::Close);
        self
    }

    /// The recorded elements.
    #[must_use]
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Move every point by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        for element in &mut self.elements {
            match element {
                PathElement::MoveTo(x, y) | PathElement::LineTo(x, y) => {
                    *x += dx;
                    *y += dy;
                }
                PathElement::Arc { center, .. } => *center = (center.0 + dx, center.1 + dy),
                PathElement::Close => {}
            }
        }
    }

    /// Append a rounded rectangle as a clockwise subpath.
    ///
    /// [§ 5.5 Overlapping Curves](https://www.w3.org/TR/css-backgrounds-3/#corner-overlap)
    /// "Corner curves must not overlap: When the sum of any two adjacent
    /// border radii exceeds the size of the border box, UAs must
    /// proportionally reduce the used values of all border radii until none
    /// of them overlap."
    pub fn add_rounded_rect(&mut self, rect: &Rect, radii: [f32; 4]) -> &mut Self {
        let [tl, tr, br, bl] = radii.map(|r| r.max(0.0));
        let mut scale: f32 = 1.0;
        for (sum, side) in [
            (tl + tr, rect.width),
            (bl + br, rect.width),
            (tl + bl, rect.height),
            (tr + br, rect.height),
        ] {
            if sum > side && sum > 0.0 {
                scale = scale.min(side / sum);
            }
        }
        let [tl, tr, br, bl] = [tl, tr, br, bl].map(|r| r * scale);
        let (x, y, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());

        let _ = self.move_to(x + tl, y).line_to(right - tr, y);
        if tr > 0.0 {
            let _ = self.arc((right - tr, y + tr), (tr, tr), -FRAC_PI_2, FRAC_PI_2);
        }
        let _ = self.line_to(right, bottom - br);
        if br > 0.0 {
            let _ = self.arc((right - br, bottom - br), (br, br), 0.0, FRAC_PI_2);
        }
        let _ = self.line_to(x + bl, bottom);
        if bl > 0.0 {
            let _ = self.arc((x + bl, bottom - bl), (bl, bl), FRAC_PI_2, FRAC_PI_2);
        }
        let _ = self.line_to(x, y + tl);
        if tl > 0.0 {
            let _ = self.arc((x + tl, y + tl), (tl, tl), PI, FRAC_PI_2);
        }
        self.close()
    }

    /// Append a full circle.
    pub fn add_circle(&mut self, center: (f32, f32), radius: f32) -> &mut Self {
        let _ = self
            .move_to(center.0 + radius, center.1)
            .arc(center, (radius, radius), 0.0, 2.0 * PI);
        self.close()
    }

    /// Append a closed polygon.
    pub fn add_polygon(&mut self, points: &[(f32, f32)]) -> &mut Self {
        let Some((&(x0, y0), rest)) = points.split_first() else {
            return self;
        };
        let _ = self.move_to(x0, y0);
        for &(x, y) in rest {
            let _ = self.line_to(x, y);
        }
        self.close()
    }
}

/// Dash pattern of a stroked line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineDash {
    /// Continuous.
    #[default]
    Solid,
    /// Dashes three times the line width.
    Dashed,
    /// Dots as long as the line width.
    Dotted,
}

/// What an unresolved image shows instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// The load has been requested and not answered yet.
    Loading,
    /// The load failed or the source is missing.
    Error,
}

/// A single drawing command.
///
/// [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
///
/// Commands are added to the display list in painting order (back to front).
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCommand {
    /// Fill a rectangle with a solid color.
    FillRect {
        /// Rectangle to fill.
        rect: Rect,
        /// Fill color.
        color: ColorValue,
    },
    /// Fill a path (rounded backgrounds and borders, border trapezoids,
    /// list bullets).
    FillPath {
        /// Outline, filled even-odd.
        path: Path,
        /// Fill color.
        color: ColorValue,
    },
    /// Stroke a straight line (dashed and dotted borders, text decoration).
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
    /// Draw text.
    ///
    /// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
    /// Step 7: "the element's text"
    DrawText {
        /// Left end of the baseline.
        origin: (f32, f32),
        /// The text content to draw.
        text: String,
        /// Font to draw with.
        font: FontSpec,
        /// Text color.
        color: ColorValue,
    },
    /// Draw an image (replaced content or a background tile).
    ///
    /// The `src` string is used as a key to look up the loaded image data
    /// in the container's image store.
    DrawImage {
        /// Image source.
        src: String,
        /// Destination rectangle.
        dest: Rect,
        /// Part of the image to draw, in image pixels; `None` is all of it.
        source: Option<Rect>,
        /// [§ 3.2 'opacity'](https://www.w3.org/TR/css-color-4/#transparency)
        opacity: f32,
    },
    /// Draw the box shown for an image that is not available.
    DrawPlaceholder {
        /// Where the image would be.
        rect: Rect,
        /// Loading or error.
        kind: PlaceholderKind,
    },
    /// Push a clip rectangle onto the clip stack.
    ///
    /// [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
    ///
    /// All subsequent drawing commands are clipped to the intersection of
    /// all active clip rectangles.
    PushClip {
        /// Clip rectangle.
        rect: Rect,
    },
    /// Pop the most recent clip rectangle from the clip stack.
    PopClip,
}

/// A list of drawing commands in painting order.
///
/// [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    commands: Vec<DisplayCommand>,
}

impl DisplayList {
    /// Create an empty display list.
    #[must_use]
    pub const fn new() -> Self {
        Self { commands: Vec::new() }
    }

    /// Add a command to the display list.
    pub fn push(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    /// Get the commands in painting order.
    #[must_use]
    pub fn commands(&self) -> &[DisplayCommand] {
        &self.commands
    }

    /// Get the number of commands.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the display list is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Move every command by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let point = |(x, y): (f32, f32)| (x + dx, y + dy);
        for command in &mut self.commands {
            match command {
                DisplayCommand::FillRect { rect, .. }
                | DisplayCommand::DrawImage { dest: rect, .. }
                | DisplayCommand::DrawPlaceholder { rect, .. }
                | DisplayCommand::PushClip { rect } => *rect = rect.translate(dx, dy),
                DisplayCommand::FillPath { path, .. } => path.translate(dx, dy),
                DisplayCommand::StrokeLine { from, to, .. } => {
                    *from = point(*from);
                    *to = point(*to);
                }
                DisplayCommand::DrawText { origin, .. } => *origin = point(*origin),
                DisplayCommand::PopClip => {}
            }
        }
    }

    /// Text of every `DrawText` command, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DisplayCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_rect_scales_overlapping_radii() {
        let mut path = Path::new();
        let _ = path.add_rounded_rect(&Rect::new(0.0, 0.0, 20.0, 100.0), [20.0, 20.0, 0.0, 0.0]);
        // tl + tr = 40 over a 20px wide box: both radii halve to 10.
        assert_eq!(path.elements()[0], PathElement::MoveTo(10.0, 0.0));
        assert_eq!(path.elements()[1], PathElement::LineTo(10.0, 0.0));
    }

    #[test]
    fn test_square_corners_have_no_arcs() {
        let mut path = Path::new();
        let _ = path.add_rounded_rect(&Rect::new(0.0, 0.0, 10.0, 10.0), [0.0; 4]);
        assert!(
            !path
                .elements()
                .iter()
                .any(|e| matches!(e, PathElement::Arc { .. }))
        );
        assert_eq!(path.elements().last(), Some(&PathElement::Close));
    }
}
