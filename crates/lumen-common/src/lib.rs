//! Common utilities for the Lumen renderer.
//!
//! This crate provides shared infrastructure used by every engine component:
//! - **Warning Log** - owned, deduplicating sink for recovered content problems
//! - **Error Events** - the [`ErrorKind`] taxonomy reported to the host
//! - **Configuration** - [`EngineConfig`], loadable from JSON
//! - **Images** - decoded image data and resource locations

pub mod config;
pub mod error;
pub mod image;
pub mod resource;
pub mod warning;

pub use config::{ConfigError, EngineConfig};
pub use error::{ErrorKind, ErrorReporter, RenderError};
pub use image::LoadedImage;
pub use resource::{DataUrl, ResourceLocation};
pub use warning::WarningLog;
