//! Document container and output backends for the Lumen renderer.
//!
//! # Scope
//!
//! This crate provides:
//! - **Document Container** - [`HtmlContainer`] parses HTML, applies
//!   stylesheets, lays out under a [`LayoutRestriction`], and paints
//! - **Graphics** - the [`Graphics`] capability with a tiny-skia raster
//!   backend and a recording backend
//! - **Fonts** - fontdue-backed text measurement and font family lookup
//! - **Images** - asynchronous request/response loading with raster and SVG
//!   decoders
//! - **Paged Output** - [`Pager`] splits a document into pages with link
//!   annotations
//! - **HTML Export** - regenerate markup, optionally with inline styles
//!
//! # Example
//!
//! ```
//! use lumen_engine::{HtmlContainer, LayoutRestriction, RecordingGraphics};
//!
//! let mut container = HtmlContainer::default();
//! container.set_html("<p>Hello World</p>");
//! let (width, _height) = container.perform_layout(LayoutRestriction::fixed(200.0)).unwrap();
//! assert_eq!(width, 200.0);
//!
//! let mut gfx = RecordingGraphics::new();
//! container.perform_paint(&mut gfx, None);
//! assert_eq!(gfx.texts(), ["Hello", "World"]);
//! ```
//!
//! # Not Yet Implemented
//!
//! - Network fetching (remote images and stylesheets fail to load)
//! - Scripting

pub mod container;
pub mod export;
pub mod font;
pub mod graphics;
pub mod image_loader;
pub mod pager;

pub use lumen_common as common;
pub use lumen_css as css;
pub use lumen_dom as dom;
pub use lumen_html as html;

pub use container::{ContentChanged, HtmlContainer, LayoutRestriction, LinkInfo};
pub use export::{HtmlGenerationStyle, generate_html};
pub use font::{FontFamilyMap, FontdueFontMetrics};
pub use graphics::{DrawCall, Graphics, RasterGraphics, RecordingGraphics, replay};
pub use image_loader::{
    FileImageLoader, ImageCompletion, ImageLoadError, ImageLoader, ImageRequest, ImageResponse, ImageTicket,
};
pub use pager::{LinkAnnotation, LinkTarget, Page, PageError, Pager};
