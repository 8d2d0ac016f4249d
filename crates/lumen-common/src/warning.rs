//! Engine warnings with deduplication.
//!
//! Content problems (unsupported units, unknown properties, malformed markup)
//! are recovered locally and reported here once per unique message. The log
//! is an owned value: each `HtmlContainer` keeps its own, so loading a new
//! document or running tests in parallel never shares state.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// A single recorded warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Component that raised the warning (e.g. `"CSS"`, `"Layout"`).
    pub component: String,
    /// Human-readable description.
    pub message: String,
}

#[derive(Debug, Default)]
struct WarningState {
    seen: HashSet<String>,
    entries: Vec<Warning>,
}

/// Deduplicating warning sink.
///
/// Every new message is forwarded to [`log::warn!`] and kept for later
/// inspection through [`WarningLog::warnings`].
#[derive(Debug, Default)]
pub struct WarningLog {
    state: Mutex<WarningState>,
}

impl WarningLog {
    /// Create an empty warning log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning unless the same `[component] message` was already seen.
    ///
    /// Returns `true` when the warning was new.
    ///
    /// # Example
    /// ```
    /// let log = lumen_common::WarningLog::new();
    /// assert!(log.warn_once("CSS", "unsupported unit 'ex'"));
    /// assert!(!log.warn_once("CSS", "unsupported unit 'ex'"));
    /// ```
    pub fn warn_once(&self, component: &str, message: &str) -> bool {
        let key = format!("[{component}] {message}");
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.seen.insert(key) {
            return false;
        }
        log::warn!(target: "lumen", "[{component}] {message}");
        state.entries.push(Warning {
            component: component.to_string(),
            message: message.to_string(),
        });
        true
    }

    /// Snapshot of every distinct warning recorded so far, in order.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    /// Number of distinct warnings recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget all recorded warnings (called when a new document is loaded).
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.seen.clear();
        state.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_are_suppressed() {
        let log = WarningLog::new();
        assert!(log.warn_once("Layout", "retry limit reached"));
        assert!(!log.warn_once("Layout", "retry limit reached"));
        assert!(log.warn_once("CSS", "retry limit reached"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_clear_allows_repeat() {
        let log = WarningLog::new();
        let _ = log.warn_once("HTML", "stray end tag </div>");
        log.clear();
        assert!(log.is_empty());
        assert!(log.warn_once("HTML", "stray end tag </div>"));
    }
}
