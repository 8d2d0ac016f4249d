//! Fonts: family resolution and fontdue-backed text measurement.
//!
//! [§ 5 Font Matching Algorithm](https://www.w3.org/TR/css-fonts-4/#font-matching-algorithm)
//!
//! A [`FontFamilyMap`] owns every loaded face, keyed by lowercased family
//! name. Lookups go through the configured fallback map (e.g. `Helvetica`
//! to `Arial`) and finally to the default family, so a request never comes
//! back empty while any font is loaded. The map is owned by whoever builds
//! it; nothing is cached globally.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use lumen_css::{ApproximateFontMetrics, FontMetrics, FontSpec, LineMetrics};
use thiserror::Error;

/// Candidate files for one generic family, tried in order.
struct SystemFamily {
    name: &'static str,
    regular: &'static [&'static str],
    bold: &'static [&'static str],
    italic: &'static [&'static str],
    bold_italic: &'static [&'static str],
}

const SANS_SERIF: SystemFamily = SystemFamily {
    name: "sans-serif",
    regular: &[
        // macOS
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        // Linux
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
        // Windows
        "C:\\Windows\\Fonts\\arial.ttf",
    ],
    bold: &[
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "C:\\Windows\\Fonts\\arialbd.ttf",
    ],
    italic: &[
        "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
        "C:\\Windows\\Fonts\\ariali.ttf",
    ],
    bold_italic: &[
        "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
        "C:\\Windows\\Fonts\\arialbi.ttf",
    ],
};

const SERIF: SystemFamily = SystemFamily {
    name: "serif",
    regular: &[
        "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
        "/usr/share/fonts/TTF/DejaVuSerif.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
        "C:\\Windows\\Fonts\\times.ttf",
    ],
    bold: &[
        "/System/Library/Fonts/Supplemental/Times New Roman Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
        "C:\\Windows\\Fonts\\timesbd.ttf",
    ],
    italic: &[
        "/System/Library/Fonts/Supplemental/Times New Roman Italic.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Italic.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSerif-Italic.ttf",
        "C:\\Windows\\Fonts\\timesi.ttf",
    ],
    bold_italic: &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSerif-BoldItalic.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSerif-BoldItalic.ttf",
        "C:\\Windows\\Fonts\\timesbi.ttf",
    ],
};

const MONOSPACE: SystemFamily = SystemFamily {
    name: "monospace",
    regular: &[
        "/System/Library/Fonts/Supplemental/Courier New.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
        "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
        "C:\\Windows\\Fonts\\cour.ttf",
    ],
    bold: &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationMono-Bold.ttf",
        "C:\\Windows\\Fonts\\courbd.ttf",
    ],
    italic: &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Oblique.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationMono-Italic.ttf",
        "C:\\Windows\\Fonts\\couri.ttf",
    ],
    bold_italic: &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-BoldOblique.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationMono-BoldItalic.ttf",
        "C:\\Windows\\Fonts\\courbi.ttf",
    ],
};

/// Failure to load a font file.
#[derive(Debug, Error)]
pub enum FontLoadError {
    /// The file could not be read.
    #[error("failed to read font '{path}': {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// fontdue rejected the data.
    #[error("invalid font data: {0}")]
    Parse(&'static str),
}

/// Parse a TrueType/OpenType font from memory.
///
/// # Errors
///
/// Returns [`FontLoadError::Parse`] when fontdue cannot read the data.
pub fn font_from_bytes(data: Vec<u8>) -> Result<Font, FontLoadError> {
    Font::from_bytes(data, FontSettings::default()).map_err(FontLoadError::Parse)
}

/// Read and parse a font file.
///
/// # Errors
///
/// Returns [`FontLoadError::Io`] or [`FontLoadError::Parse`].
pub fn font_from_path(path: &Path) -> Result<Font, FontLoadError> {
    let data = std::fs::read(path).map_err(|source| FontLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    font_from_bytes(data)
}

fn first_loadable(paths: &[&str]) -> Option<Font> {
    paths.iter().find_map(|path| match font_from_path(Path::new(path)) {
        Ok(font) => {
            log::debug!("loaded font {path}");
            Some(font)
        }
        Err(_) => None,
    })
}

/// The four style variants of one family. Missing variants fall back to
/// the nearest available one.
#[derive(Clone, Default)]
pub struct FontFace {
    /// Upright, normal weight.
    pub regular: Option<Font>,
    /// Bold.
    pub bold: Option<Font>,
    /// Italic or oblique.
    pub italic: Option<Font>,
    /// Bold italic.
    pub bold_italic: Option<Font>,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .field("italic", &self.italic.is_some())
            .field("bold_italic", &self.bold_italic.is_some())
            .finish()
    }
}

impl FontFace {
    /// Best variant for the requested weight and slant: exact match, then
    /// partial match, then regular.
    #[must_use]
    pub fn select(&self, bold: bool, italic: bool) -> Option<&Font> {
        let regular = self.regular.as_ref();
        match (bold, italic) {
            (true, true) => self
                .bold_italic
                .as_ref()
                .or(self.bold.as_ref())
                .or(self.italic.as_ref())
                .or(regular),
            (true, false) => self.bold.as_ref().or(regular),
            (false, true) => self.italic.as_ref().or(regular),
            (false, false) => regular,
        }
        .or_else(|| [&self.bold, &self.italic, &self.bold_italic].into_iter().find_map(Option::as_ref))
    }

    fn is_empty(&self) -> bool {
        self.regular.is_none() && self.bold.is_none() && self.italic.is_none() && self.bold_italic.is_none()
    }
}

/// Family name to loaded face, with fallbacks for unavailable families.
#[derive(Debug, Clone)]
pub struct FontFamilyMap {
    faces: HashMap<String, FontFace>,
    fallbacks: BTreeMap<String, String>,
    default_family: String,
}

impl FontFamilyMap {
    /// An empty map; every lookup fails until a face is registered.
    #[must_use]
    pub fn new(default_family: &str) -> Self {
        Self {
            faces: HashMap::new(),
            fallbacks: BTreeMap::new(),
            default_family: default_family.to_ascii_lowercase(),
        }
    }

    /// Load the generic families from well-known system locations.
    #[must_use]
    pub fn system(default_family: &str) -> Self {
        let mut map = Self::new(default_family);
        for family in [&SANS_SERIF, &SERIF, &MONOSPACE] {
            let face = FontFace {
                regular: first_loadable(family.regular),
                bold: first_loadable(family.bold),
                italic: first_loadable(family.italic),
                bold_italic: first_loadable(family.bold_italic),
            };
            if face.is_empty() {
                log::warn!("no system font found for '{}'", family.name);
            } else {
                map.register(family.name, face);
            }
        }
        map
    }

    /// Add the configured replacements for unavailable families.
    #[must_use]
    pub fn with_fallbacks(mut self, fallbacks: &BTreeMap<String, String>) -> Self {
        self.fallbacks.extend(
            fallbacks
                .iter()
                .map(|(from, to)| (from.to_ascii_lowercase(), to.to_ascii_lowercase())),
        );
        self
    }

    /// Register (or replace) the face for `family`.
    pub fn register(&mut self, family: &str, face: FontFace) {
        let _ = self.faces.insert(family.to_ascii_lowercase(), face);
    }

    /// Whether no face is loaded at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// The face used for `family`: the family itself, its fallback chain,
    /// the default family, then any loaded face.
    #[must_use]
    pub fn resolve(&self, family: &str) -> Option<&FontFace> {
        let mut name = family.trim().trim_matches(['"', '\'']).to_ascii_lowercase();
        // Bounded walk: fallback entries may form a cycle.
        for _ in 0..=self.fallbacks.len() {
            if let Some(face) = self.faces.get(&name) {
                return Some(face);
            }
            match self.fallbacks.get(&name) {
                Some(next) => name.clone_from(next),
                None => break,
            }
        }
        self.faces
            .get(&self.default_family)
            .or_else(|| self.faces.get(SANS_SERIF.name))
            .or_else(|| self.faces.values().next())
    }

    /// The font for `spec`, if any face is loaded.
    #[must_use]
    pub fn font(&self, spec: &FontSpec) -> Option<&Font> {
        self.resolve(&spec.family)?.select(spec.bold, spec.italic)
    }
}

/// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
///
/// "CSS assumes that every font has font metrics that specify a
/// characteristic height above the baseline and a depth below it."
///
/// Measures with fontdue glyph metrics (no rasterization). Text in a font
/// that is not loaded is measured with [`ApproximateFontMetrics`].
#[derive(Debug, Clone)]
pub struct FontdueFontMetrics {
    fonts: Arc<FontFamilyMap>,
}

impl FontdueFontMetrics {
    /// Metrics over `fonts`.
    #[must_use]
    pub const fn new(fonts: Arc<FontFamilyMap>) -> Self {
        Self { fonts }
    }

    /// The shared family map.
    #[must_use]
    pub const fn fonts(&self) -> &Arc<FontFamilyMap> {
        &self.fonts
    }
}

impl FontMetrics for FontdueFontMetrics {
    fn text_width(&self, text: &str, spec: &FontSpec) -> f32 {
        let Some(font) = self.fonts.font(spec) else {
            return ApproximateFontMetrics.text_width(text, spec);
        };
        text.chars()
            .filter(|ch| !ch.is_control())
            .map(|ch| font.metrics(ch, spec.size).advance_width)
            .sum()
    }

    fn line_metrics(&self, spec: &FontSpec) -> LineMetrics {
        let Some(lines) = self.fonts.font(spec).and_then(|f| f.horizontal_line_metrics(spec.size)) else {
            return ApproximateFontMetrics.line_metrics(spec);
        };
        // fontdue reports the descent as a negative offset.
        let descent = -lines.descent;
        LineMetrics {
            ascent: lines.ascent,
            descent,
            line_height: lines.new_line_size.max(lines.ascent + descent),
            underline_offset: (descent * 0.5).max(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_map_measures_approximately() {
        let metrics = FontdueFontMetrics::new(Arc::new(FontFamilyMap::new("sans-serif")));
        let spec = FontSpec::regular("Arial", 10.0);
        assert!((metrics.text_width("abcd", &spec) - 24.0).abs() < 1e-4);
        assert!((metrics.line_metrics(&spec).line_height - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_resolve_follows_fallbacks_and_stops_on_cycles() {
        let fallbacks: BTreeMap<String, String> = [("A", "B"), ("B", "A")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let map = FontFamilyMap::new("sans-serif").with_fallbacks(&fallbacks);
        assert!(map.resolve("a").is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_face_selection_prefers_exact_variant() {
        let face = FontFace::default();
        assert!(face.select(true, true).is_none());
    }
}
