//! Image loading: the request/response protocol between the container and
//! the host, and the built-in file loader with its decoders.
//!
//! [§ 4.8.3 The img element](https://html.spec.whatwg.org/multipage/embedded-content.html#the-img-element)
//!
//! The first paint of an image the container does not have yet issues an
//! [`ImageRequest`]. The [`ImageLoader`] answers at once:
//!
//! - [`ImageResponse::Ready`] with the decoded image,
//! - [`ImageResponse::Failed`] when it cannot be loaded, or
//! - [`ImageResponse::Pending`], promising to call
//!   [`ImageCompletion::complete`] later, from any thread.
//!
//! Completions are drained by `HtmlContainer::poll_images`.
//!
//! The built-in [`FileImageLoader`] reads `data:` URLs and local files and
//! runs the bytes through an [`ImageLoaderPipeline`]:
//!
//! 1. **Detect** - [`detect_format()`] decides between SVG and raster using
//!    extension, media type, and magic-byte sniffing.
//! 2. **Decode** - [`ImageDecoder`] implementations [`SvgDecoder`] and
//!    [`RasterDecoder`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use lumen_common::{LoadedImage, ResourceLocation};
use thiserror::Error;

/// Why an image could not be produced.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    /// The file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Resolved file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A `data:` URL payload could not be decoded.
    #[error("invalid data URL: {0}")]
    DataUrl(String),
    /// Raster decoding failed.
    #[error("could not decode image: {0}")]
    Raster(#[from] image::ImageError),
    /// SVG parsing failed.
    #[error("failed to parse SVG: {0}")]
    Svg(#[from] usvg::Error),
    /// The decoded image has no pixels or is too large to allocate.
    #[error("image has unusable dimensions {width}x{height}")]
    InvalidSize {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },
    /// The loader does not handle this kind of source.
    #[error("unsupported image source '{0}'")]
    Unsupported(String),
}

/// Detected image format.
///
/// The `image` crate sniffs raster sub-formats (PNG, JPEG, GIF, ...) itself,
/// so only the SVG/raster split is decided here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// SVG vector image (usvg + resvg).
    Svg,
    /// Raster image (`image` crate).
    Raster,
}

/// Strip the query string and fragment from `src`, leaving the part that
/// can carry a file extension.
///
/// [URL Standard § 4.1](https://url.spec.whatwg.org/#concept-url-path)
#[must_use]
pub fn strip_url_decorations(src: &str) -> &str {
    let end = src.find(['?', '#']).unwrap_or(src.len());
    &src[..end]
}

/// Decide whether `bytes` are SVG or raster data.
///
/// STEP 1: a `.svg` extension on `path`.
/// STEP 2: an `image/svg+xml` media type (from a `data:` URL).
/// STEP 3: an XML or `<svg` prefix within the first 256 bytes.
/// Anything else is raster.
#[must_use]
pub fn detect_format(path: &str, media_type: Option<&str>, bytes: &[u8]) -> ImageFormat {
    let has_svg_extension = Path::new(strip_url_decorations(path))
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    if has_svg_extension || media_type.is_some_and(|m| m.starts_with("image/svg")) {
        return ImageFormat::Svg;
    }
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let head = &bytes[start..bytes.len().min(start + 256)];
    if head.starts_with(b"<?xml") || head.starts_with(b"<svg") {
        ImageFormat::Svg
    } else {
        ImageFormat::Raster
    }
}

/// Turns raw bytes of one format into a [`LoadedImage`].
pub trait ImageDecoder: Send {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this decoder handles `format`.
    fn supports(&self, format: ImageFormat) -> bool;

    /// Decode `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an [`ImageLoadError`] describing why the bytes were rejected.
    fn decode(&self, bytes: &[u8]) -> Result<LoadedImage, ImageLoadError>;
}

/// Rasterizes SVG documents at their intrinsic size.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgDecoder;

impl ImageDecoder for SvgDecoder {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn supports(&self, format: ImageFormat) -> bool {
        format == ImageFormat::Svg
    }

    fn decode(&self, bytes: &[u8]) -> Result<LoadedImage, ImageLoadError> {
        let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())?;
        let size = tree.size().to_int_size();
        let (width, height) = (size.width(), size.height());
        let invalid = ImageLoadError::InvalidSize { width, height };
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(invalid)?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        // tiny-skia stores premultiplied pixels; LoadedImage is straight RGBA.
        let rgba = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        LoadedImage::new(width, height, rgba).ok_or(ImageLoadError::InvalidSize { width, height })
    }
}

/// Decodes PNG, JPEG, GIF and the other formats of the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn supports(&self, format: ImageFormat) -> bool {
        format == ImageFormat::Raster
    }

    fn decode(&self, bytes: &[u8]) -> Result<LoadedImage, ImageLoadError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageLoadError::InvalidSize { width, height });
        }
        LoadedImage::new(width, height, rgba.into_raw()).ok_or(ImageLoadError::InvalidSize { width, height })
    }
}

/// Format detection followed by the first decoder that supports the format.
pub struct ImageLoaderPipeline {
    decoders: Vec<Box<dyn ImageDecoder>>,
}

impl std::fmt::Debug for ImageLoaderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.decoders.iter().map(|d| d.name()).collect();
        f.debug_struct("ImageLoaderPipeline").field("decoders", &names).finish()
    }
}

impl ImageLoaderPipeline {
    /// A pipeline with the SVG and raster decoders.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decoders: vec![Box::new(SvgDecoder), Box::new(RasterDecoder)],
        }
    }

    /// Detect the format of `bytes` and decode them.
    ///
    /// `path` is only consulted for its extension.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error, or [`ImageLoadError::Unsupported`] when
    /// no decoder handles the detected format.
    pub fn decode(&self, bytes: &[u8], path: &str, media_type: Option<&str>) -> Result<LoadedImage, ImageLoadError> {
        let format = detect_format(path, media_type, bytes);
        let decoder = self
            .decoders
            .iter()
            .find(|d| d.supports(format))
            .ok_or_else(|| ImageLoadError::Unsupported(format!("{format:?} data in '{path}'")))?;
        log::debug!("decoding '{path}' with the {} decoder", decoder.name());
        decoder.decode(bytes)
    }
}

impl Default for ImageLoaderPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies one image request.
///
/// The generation is the container's document generation when the request
/// was made; completions for an older generation are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageTicket {
    /// Document generation of the request.
    pub generation: u64,
    /// Request number within the generation.
    pub id: u64,
}

/// What the container asks the loader for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Image source as written in the document.
    pub src: String,
    /// Attributes of the element showing the image (empty for CSS
    /// backgrounds).
    pub attrs: BTreeMap<String, String>,
    /// Ticket to hand back with a later completion.
    pub ticket: ImageTicket,
}

/// The loader's immediate answer to an [`ImageRequest`].
#[derive(Debug)]
pub enum ImageResponse {
    /// The image is available now.
    Ready(LoadedImage),
    /// The loader will call [`ImageCompletion::complete`] later.
    Pending,
    /// The image cannot be loaded.
    Failed(ImageLoadError),
}

/// Outcome of a pending load.
pub type ImageResult = Result<LoadedImage, ImageLoadError>;

/// Cloneable, thread-safe handle for finishing pending image loads.
#[derive(Debug, Clone)]
pub struct ImageCompletion {
    sender: Sender<(ImageTicket, ImageResult)>,
}

impl ImageCompletion {
    pub(crate) const fn new(sender: Sender<(ImageTicket, ImageResult)>) -> Self {
        Self { sender }
    }

    /// Deliver the result for `ticket`.
    ///
    /// Returns `false` when the container no longer exists.
    #[must_use]
    pub fn complete(&self, ticket: ImageTicket, result: ImageResult) -> bool {
        self.sender.send((ticket, result)).is_ok()
    }
}

/// Host capability that resolves image sources.
pub trait ImageLoader {
    /// Answer `request` now, or return [`ImageResponse::Pending`] and use
    /// `completion` later.
    fn load(&mut self, request: &ImageRequest, completion: &ImageCompletion) -> ImageResponse;
}

/// Loads `data:` URLs and local files synchronously.
///
/// Network sources are answered with [`ImageLoadError::Unsupported`]; hosts
/// that fetch remotely install their own [`ImageLoader`].
#[derive(Debug, Default)]
pub struct FileImageLoader {
    base_dir: Option<PathBuf>,
    pipeline: ImageLoaderPipeline,
}

impl FileImageLoader {
    /// A loader resolving relative paths against `base_dir`.
    #[must_use]
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            pipeline: ImageLoaderPipeline::new(),
        }
    }

    /// Read and decode `src`.
    ///
    /// # Errors
    ///
    /// Returns an [`ImageLoadError`] when the source cannot be read or
    /// decoded.
    pub fn load_source(&self, src: &str) -> Result<LoadedImage, ImageLoadError> {
        match ResourceLocation::resolve(src, self.base_dir.as_deref()) {
            ResourceLocation::Data(data) => {
                let bytes = data.decode().map_err(ImageLoadError::DataUrl)?;
                self.pipeline.decode(&bytes, "", Some(&data.media_type))
            }
            ResourceLocation::File(path) => {
                let bytes = std::fs::read(&path).map_err(|source| ImageLoadError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                self.pipeline.decode(&bytes, &path.to_string_lossy(), None)
            }
            ResourceLocation::Remote(url) => Err(ImageLoadError::Unsupported(url)),
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&mut self, request: &ImageRequest, _completion: &ImageCompletion) -> ImageResponse {
        match self.load_source(&request.src) {
            Ok(image) => ImageResponse::Ready(image),
            Err(e) => ImageResponse::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="4" height="2" fill="#ff0000"/></svg>"##;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("icons/a.SVG?v=2", None, b""), ImageFormat::Svg);
        assert_eq!(detect_format("", Some("image/svg+xml"), b""), ImageFormat::Svg);
        assert_eq!(detect_format("x", None, b"  \n<svg>"), ImageFormat::Svg);
        assert_eq!(detect_format("a.png", None, b"\x89PNG"), ImageFormat::Raster);
    }

    #[test]
    fn test_strip_url_decorations() {
        assert_eq!(strip_url_decorations("a.svg#frag"), "a.svg");
        assert_eq!(strip_url_decorations("a.png?w=1#x"), "a.png");
        assert_eq!(strip_url_decorations("plain"), "plain");
    }

    #[test]
    fn test_svg_decodes_straight_alpha() {
        let image = SvgDecoder.decode(SVG.as_bytes()).unwrap();
        assert_eq!((image.width(), image.height()), (4, 2));
        assert_eq!(&image.rgba_data()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_percent_encoded_svg_data_url() {
        let src = format!("data:image/svg+xml,{}", SVG.replace('#', "%23"));
        let image = FileImageLoader::new(None).load_source(&src).unwrap();
        assert_eq!(image.dimensions_f32(), (4.0, 2.0));
    }

    #[test]
    fn test_missing_file_and_remote_fail() {
        let loader = FileImageLoader::new(Some(PathBuf::from("/nonexistent-dir")));
        assert!(matches!(loader.load_source("a.png"), Err(ImageLoadError::Io { .. })));
        assert!(matches!(
            loader.load_source("https://example.com/a.png"),
            Err(ImageLoadError::Unsupported(_))
        ));
    }

    #[test]
    fn test_garbage_is_a_raster_error() {
        assert!(matches!(
            ImageLoaderPipeline::new().decode(b"not an image", "a.png", None),
            Err(ImageLoadError::Raster(_))
        ));
    }
}
