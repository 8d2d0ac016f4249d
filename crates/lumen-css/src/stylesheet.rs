//! Parsed style data.
//!
//! [§ 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
//!
//! A [`CssData`] indexes style blocks by the key of their subject compound
//! selector, so the cascade only looks at blocks that can possibly match a
//! given element.

use std::collections::HashMap;

use lumen_common::WarningLog;

use crate::parser::{Declaration, parse_stylesheet};
use crate::selector::{ParsedSelector, parse_selector};

/// [§ 6.2 Cascade Origins](https://www.w3.org/TR/css-cascade-4/#cascading-origins)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// "The user agent stylesheet"
    UserAgent,
    /// "The author specifies style sheets for a source document"
    Author,
}

/// A selector with its declarations.
///
/// Blocks with an identical selector and origin merge: a later declaration
/// of a property replaces the earlier one in place.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleBlock {
    /// The selector, subject first.
    pub selector: ParsedSelector,
    /// Where the block came from.
    pub origin: Origin,
    /// Source order of the block's first appearance; breaks ties.
    pub order: usize,
    /// Declarations keyed by property name, in first-seen order.
    pub declarations: Vec<Declaration>,
}

impl StyleBlock {
    /// Whether any part of the selector needs `:hover`.
    #[must_use]
    pub fn is_hover(&self) -> bool {
        self.selector.uses_hover()
    }

    /// The declaration for `name`, if this block sets it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    fn merge(&mut self, declarations: &[Declaration]) {
        for decl in declarations {
            if let Some(existing) = self.declarations.iter_mut().find(|d| d.name == decl.name) {
                // An important declaration is not overridden by a later
                // normal one in the same block.
                if existing.important && !decl.important {
                    continue;
                }
                *existing = decl.clone();
            } else {
                self.declarations.push(decl.clone());
            }
        }
    }
}

/// A stylesheet: style blocks indexed by selector key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CssData {
    blocks: HashMap<String, Vec<StyleBlock>>,
    next_order: usize,
}

impl CssData {
    /// An empty stylesheet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source` and merge its rules into this stylesheet.
    ///
    /// Problems (unsupported selectors, unterminated comments, an unmatched
    /// `{`) are recorded in `warnings`; parsing itself never fails.
    pub fn parse_into(&mut self, source: &str, origin: Origin, media_type: &str, warnings: &WarningLog) {
        let sheet = parse_stylesheet(source, media_type);
        for problem in &sheet.problems {
            let _ = warnings.warn_once("CSS", problem);
        }
        for rule in &sheet.rules {
            for raw_selector in rule.prelude.split(',') {
                match parse_selector(raw_selector) {
                    Some(selector) => self.add_block(selector, origin, &rule.declarations),
                    None => {
                        let _ = warnings.warn_once(
                            "CSS",
                            &format!("unsupported selector '{}'", raw_selector.trim()),
                        );
                    }
                }
            }
        }
        log::debug!(
            "stylesheet parsed: {} rules, {} blocks",
            sheet.rules.len(),
            self.len()
        );
    }

    /// Parse a standalone stylesheet.
    #[must_use]
    pub fn parse(source: &str, origin: Origin, media_type: &str, warnings: &WarningLog) -> Self {
        let mut data = Self::new();
        data.parse_into(source, origin, media_type, warnings);
        data
    }

    /// Add (or merge) one block.
    pub fn add_block(&mut self, selector: ParsedSelector, origin: Origin, declarations: &[Declaration]) {
        let bucket = self.blocks.entry(selector.key()).or_default();
        if let Some(existing) = bucket
            .iter_mut()
            .find(|b| b.origin == origin && b.selector.text == selector.text)
        {
            existing.merge(declarations);
            return;
        }
        let mut block = StyleBlock {
            selector,
            origin,
            order: self.next_order,
            declarations: Vec::new(),
        };
        block.merge(declarations);
        self.next_order += 1;
        bucket.push(block);
    }

    /// Blocks indexed under `key` (`#id`, `.class`, tag, or `*`).
    #[must_use]
    pub fn blocks_for(&self, key: &str) -> &[StyleBlock] {
        self.blocks.get(key).map_or(&[], Vec::as_slice)
    }

    /// Whether any block depends on `:hover`.
    #[must_use]
    pub fn has_hover_rules(&self) -> bool {
        self.blocks.values().flatten().any(StyleBlock::is_hover)
    }

    /// Number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }

    /// Whether there are no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_selectors_merge() {
        let warnings = WarningLog::new();
        let css = CssData::parse(
            "p { color: red; margin: 0 } p { color: blue }",
            Origin::Author,
            "screen",
            &warnings,
        );
        let blocks = css.blocks_for("p");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].get("color").unwrap().value, "blue");
        assert_eq!(blocks[0].declarations[0].name, "color");
    }

    #[test]
    fn test_selector_list_and_keys() {
        let warnings = WarningLog::new();
        let css = CssData::parse("h1, .x, #y p, a:hover { color: red }", Origin::Author, "screen", &warnings);
        assert_eq!(css.blocks_for("h1").len(), 1);
        assert_eq!(css.blocks_for(".x").len(), 1);
        assert_eq!(css.blocks_for("p").len(), 1);
        assert!(css.has_hover_rules());
        assert_eq!(css.len(), 4);
    }

    #[test]
    fn test_unsupported_selector_warns() {
        let warnings = WarningLog::new();
        let css = CssData::parse("a[href], b { color: red }", Origin::Author, "screen", &warnings);
        assert_eq!(css.len(), 1);
        assert_eq!(warnings.len(), 1);
    }
}
