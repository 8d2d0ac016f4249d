//! HTML tokenizer module.

/// Character reference decoding.
pub mod character_reference;
/// The scanner itself.
pub mod scanner;
/// Token types produced by the tokenizer.
pub mod token;

pub use scanner::HTMLTokenizer;
pub use token::{Attribute, Token};
