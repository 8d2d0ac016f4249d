//! Error events reported to the embedding host.
//!
//! Content problems never abort layout or paint. Anything the host may want
//! to know about (an image that failed to load, a layout that did not
//! converge) is sent as a [`RenderError`] through an [`ErrorReporter`],
//! which may be used from any thread.

use std::sync::mpsc::{Receiver, Sender, channel};

use strum_macros::{Display, EnumIter};
use thiserror::Error;

/// Category of a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ErrorKind {
    /// Anything not covered by a more specific category.
    General,
    /// A stylesheet could not be parsed completely.
    CssParsing,
    /// The HTML source could not be parsed completely.
    HtmlParsing,
    /// An image failed to load or decode.
    Image,
    /// A failure while producing or executing draw commands.
    Paint,
    /// Layout fell back to a degraded result.
    Layout,
    /// Pointer or keyboard handling failed.
    KeyboardMouse,
    /// Embedded frame content failed.
    Iframe,
    /// Context menu handling failed.
    ContextMenu,
}

/// An error event carrying its category and an optional underlying cause.
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct RenderError {
    /// Category of the error.
    pub kind: ErrorKind,
    /// Description of what went wrong.
    pub message: String,
    /// Underlying cause, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RenderError {
    /// Create an error without an underlying cause.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Cloneable, thread-safe handle for raising [`RenderError`] events.
///
/// Sending never blocks and never fails loudly: if the host dropped its
/// receiver the event is discarded.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    sender: Sender<RenderError>,
}

impl ErrorReporter {
    /// Create a reporter together with the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, Receiver<RenderError>) {
        let (sender, receiver) = channel();
        (Self { sender }, receiver)
    }

    /// Raise an error event.
    pub fn report(&self, error: RenderError) {
        if let Err(unsent) = self.sender.send(error) {
            log::debug!("error event dropped, no listener: {}", unsent.0);
        }
    }

    /// Shorthand for reporting an error without a cause.
    pub fn report_kind(&self, kind: ErrorKind, message: impl Into<String>) {
        self.report(RenderError::new(kind, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_kinds_are_complete() {
        let names: Vec<String> = ErrorKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(
            names,
            [
                "General",
                "CssParsing",
                "HtmlParsing",
                "Image",
                "Paint",
                "Layout",
                "KeyboardMouse",
                "Iframe",
                "ContextMenu"
            ]
        );
    }

    #[test]
    fn test_report_from_other_thread() {
        let (reporter, events) = ErrorReporter::channel();
        let remote = reporter.clone();
        std::thread::spawn(move || remote.report_kind(ErrorKind::Image, "decode failed"))
            .join()
            .expect("reporter thread panicked");
        let event = events.recv().expect("event should arrive");
        assert_eq!(event.kind, ErrorKind::Image);
        assert_eq!(event.to_string(), "Image error: decode failed");
    }

    #[test]
    fn test_report_without_listener_is_silent() {
        let (reporter, events) = ErrorReporter::channel();
        drop(events);
        reporter.report_kind(ErrorKind::General, "nobody is listening");
    }
}
