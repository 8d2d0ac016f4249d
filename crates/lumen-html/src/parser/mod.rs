//! HTML parser module for tree construction.

/// Tree builder implementation.
pub mod builder;

pub use builder::{HTMLParser, IssueKind, ParseIssue};
