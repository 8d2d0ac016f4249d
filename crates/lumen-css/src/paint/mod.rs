//! CSS Painting
//!
//! [CSS 2.1 Appendix E - Elaborate description of Stacking Contexts](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! This module converts a laid-out box tree into a display list of drawing
//! commands. A graphics backend (raster, recording, paged output) then
//! replays the list.
//!
//! # Architecture
//!
//! ```text
//! Style → Layout → Paint → Graphics
//!                    ↓
//!              DisplayList
//! ```

mod background;
mod display_list;
mod painter;

pub use background::{canvas_background, tile_rects};
pub use display_list::{DisplayCommand, DisplayList, LineDash, Path, PathElement, PlaceholderKind};
pub use painter::{ImageUse, PaintContext, PaintOutput, Painter};
