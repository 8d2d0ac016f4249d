//! Engine configuration.
//!
//! Every field has a default, so a JSON file only needs to name the values it
//! overrides:
//!
//! ```json
//! { "media_type": "print", "font_fallbacks": { "Helvetica": "Arial" } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The JSON was malformed or had wrongly typed fields.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunables shared by the parser, layout engine, and painter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Media type used to filter `@media` blocks (`screen` or `print`).
    pub media_type: String,
    /// Font family used when no `font-family` applies.
    pub default_font_family: String,
    /// Root font size in pixels.
    pub default_font_size: f32,
    /// Unavailable family → replacement family (matched case-insensitively).
    pub font_fallbacks: BTreeMap<String, String>,
    /// Replaces the built-in user agent stylesheet when set.
    pub base_stylesheet: Option<String>,
    /// Size of the box reserved for an image whose size is not yet known.
    pub image_placeholder_size: f32,
    /// Extra auto-size layout passes allowed before giving up.
    pub max_relayout_retries: u32,
    /// Background of selected text, as a CSS color.
    pub selection_background: String,
    /// Foreground of selected text, as a CSS color.
    pub selection_foreground: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let font_fallbacks = [
            ("Helvetica", "Arial"),
            ("Helvetica Neue", "Arial"),
            ("Times", "Times New Roman"),
            ("Courier", "Courier New"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            media_type: "screen".to_string(),
            default_font_family: "sans-serif".to_string(),
            default_font_size: 16.0,
            font_fallbacks,
            base_stylesheet: None,
            image_placeholder_size: 20.0,
            max_relayout_retries: 2,
            selection_background: "#3399ff".to_string(),
            selection_foreground: "white".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] when the text is not valid configuration.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if it cannot be parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "media_type": "print" }"#).unwrap();
        assert_eq!(config.media_type, "print");
        assert_eq!(config.max_relayout_retries, 2);
        assert_eq!(config.font_fallbacks.get("Helvetica").unwrap(), "Arial");
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let err = EngineConfig::from_json_str(r#"{ "default_font_size": "big" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
