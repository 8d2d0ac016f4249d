//! CSS Computed Style representation and value parsing
//!
//! - [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)
//! - [CSS Cascading and Inheritance Level 4](https://www.w3.org/TR/css-cascade-4/)

pub mod computed;
pub mod values;

pub use computed::{CascadeContext, ComputedStyle};
pub use values::{AutoLength, ColorValue, DEFAULT_FONT_SIZE_PX, DisplayKind, LengthValue};
