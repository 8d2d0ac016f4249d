//! HTML tokenizer and tree builder for the Lumen renderer.
//!
//! # Scope
//!
//! - **Tokenizer** - a forgiving scanner producing start/end tags, text,
//!   comments, and doctypes. Attribute values may be double-quoted,
//!   single-quoted, or unquoted; character references are decoded.
//! - **Tree builder** - places tokens into a [`lumen_dom::DomTree`],
//!   synthesizing `html`/`head`/`body`, closing void elements, and applying
//!   the common implied end tags (`p`, `li`, `td`, `tr`, ...).
//!
//! Malformed input never fails: unterminated constructs stop at end of input
//! and unrecognized markup becomes text. Recovered problems are reported as
//! [`ParseIssue`]s.

/// Tree construction.
pub mod parser;
/// Tokenization.
pub mod tokenizer;

pub use lumen_dom::print_tree;
pub use parser::{HTMLParser, IssueKind, ParseIssue};
pub use tokenizer::{Attribute, HTMLTokenizer, Token};

use lumen_dom::DomTree;

/// Tokenize and build a tree in one step.
#[must_use]
pub fn parse_html(source: &str) -> (DomTree, Vec<ParseIssue>) {
    let mut tokenizer = HTMLTokenizer::new(source.to_string());
    tokenizer.run();
    let mut issues = tokenizer.take_issues();
    let (tree, tree_issues) = HTMLParser::new(tokenizer.into_tokens()).run_with_issues();
    issues.extend(tree_issues);
    (tree, issues)
}
