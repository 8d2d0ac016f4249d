//! CSS parser module.
//!
//! [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing)

/// Stylesheet and declaration-list parsing.
pub mod sheet;
/// Component-value lexing of declaration values.
pub mod value;

pub use sheet::{Declaration, ParsedSheet, RawRule, parse_declarations, parse_stylesheet};
pub use value::{ComponentValue, parse_component_values};
