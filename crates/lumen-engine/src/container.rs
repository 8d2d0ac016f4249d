//! The document container.
//!
//! An [`HtmlContainer`] owns one document and everything derived from it:
//!
//! ```text
//! set_html ─► DomTree ─► CssData ─► StyleMap ─► LayoutBox
//!                                                  │
//!            perform_layout(restriction) ◄─────────┘
//!                     │
//!            perform_paint(gfx) ─► DisplayList ─► Graphics
//!                     │
//!            ImageLoader ◄─ requests ─┘   poll_images ◄─ completions
//! ```
//!
//! Box geometry is valid after [`HtmlContainer::perform_layout`] until the
//! next change that marks the layout dirty (new images, hover restyle);
//! painting re-runs layout with the last restriction when needed.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};

use lumen_common::warning::Warning;
use lumen_common::{EngineConfig, ErrorKind, ErrorReporter, LoadedImage, RenderError, ResourceLocation, WarningLog};
use lumen_css::layout::intrinsic::margin_box_widths;
use lumen_css::layout::{BoxTreeBuilder, Fragment, FragmentKind};
use lumen_css::paint::ImageUse;
use lumen_css::style::values::Visibility;
use lumen_css::{
    ApproximateFontMetrics, BoxId, BoxType, ColorValue, ComputedStyle, CssData, DisplayList, FontMetrics, LayoutBox,
    LayoutContext, Origin, PaintContext, PaintOutput, Painter, Rect, StyleMap, StylesheetSource, build_box_tree,
    collect_stylesheet_sources, compute_styles, default_stylesheet, layout_document,
};
use lumen_dom::{DomTree, NodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::{HtmlGenerationStyle, generate_html};
use crate::graphics::{Graphics, replay};
use crate::image_loader::{
    FileImageLoader, ImageCompletion, ImageLoadError, ImageLoader, ImageRequest, ImageResponse, ImageResult,
    ImageTicket,
};

/// Overflow below this many pixels does not trigger an auto-size retry.
const WIDTH_EPSILON: f32 = 0.5;

/// Size constraints for one layout pass.
///
/// A `max_width` of zero means "no limit": the document is laid out at its
/// natural (max-content) width. A `max_height` of zero leaves the viewport
/// height unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutRestriction {
    /// Widest the document may be laid out.
    pub max_width: f32,
    /// Viewport height, for `vh` units and positioned boxes.
    pub max_height: f32,
    /// Smallest reported width.
    pub min_width: f32,
    /// Smallest reported height.
    pub min_height: f32,
    /// Shrink to the content's natural width instead of filling
    /// `max_width`.
    pub auto_size: bool,
}

impl LayoutRestriction {
    /// Fill exactly `width` pixels.
    #[must_use]
    pub const fn fixed(width: f32) -> Self {
        Self {
            max_width: width,
            max_height: 0.0,
            min_width: 0.0,
            min_height: 0.0,
            auto_size: false,
        }
    }

    /// Shrink to fit the content, up to `max_width`.
    #[must_use]
    pub const fn auto(max_width: f32) -> Self {
        Self {
            auto_size: true,
            ..Self::fixed(max_width)
        }
    }

    fn validate(&self) -> Result<(), RenderError> {
        let values = [self.max_width, self.max_height, self.min_width, self.min_height];
        if values.iter().all(|v| v.is_finite() && *v >= 0.0) {
            Ok(())
        } else {
            Err(RenderError::new(
                ErrorKind::Layout,
                format!("invalid layout restriction {self:?}: sizes must be finite and non-negative"),
            ))
        }
    }
}

/// Returned by [`HtmlContainer::poll_images`] when completed images change
/// what the document shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentChanged {
    /// An image without a specified size arrived, so boxes move; the next
    /// paint lays out again before drawing.
    pub layout_required: bool,
}

/// A hyperlink and where it is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkInfo {
    /// Trimmed `href` attribute.
    pub href: String,
    /// The `a` element.
    pub node: NodeId,
    /// Border box per line, in document coordinates.
    pub rects: Vec<Rect>,
}

/// Failure to load a `<link rel=stylesheet>` target.
#[derive(Debug, Error)]
enum StylesheetLoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid data URL: {0}")]
    DataUrl(String),
    #[error("remote stylesheet '{0}' is not fetched")]
    Remote(String),
}

/// Owns one document from parsing to painting.
pub struct HtmlContainer {
    config: EngineConfig,
    fonts: Box<dyn FontMetrics>,
    loader: Box<dyn ImageLoader>,
    custom_loader: bool,
    base_dir: Option<PathBuf>,
    warnings: WarningLog,
    reporter: ErrorReporter,
    events: Receiver<RenderError>,
    completion: ImageCompletion,
    completions: Receiver<(ImageTicket, ImageResult)>,
    /// Bumped by every new document; stale image tickets are dropped.
    generation: u64,
    next_ticket: u64,
    dom: DomTree,
    css: CssData,
    base_style: ComputedStyle,
    styles: StyleMap,
    root: Option<LayoutBox>,
    images: HashMap<String, LoadedImage>,
    image_sizes: HashMap<String, (f32, f32)>,
    failed_images: HashSet<String>,
    requested: HashSet<String>,
    pending: HashMap<u64, ImageUse>,
    restriction: Option<LayoutRestriction>,
    viewport: (f32, f32),
    actual_size: (f32, f32),
    layout_dirty: bool,
    scroll: (f32, f32),
    selection: Option<(usize, usize)>,
    hovered: Option<NodeId>,
    selection_text: ColorValue,
    selection_background: ColorValue,
}

impl std::fmt::Debug for HtmlContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlContainer")
            .field("generation", &self.generation)
            .field("nodes", &self.dom.len())
            .field("boxes", &self.root.as_ref().map(LayoutBox::count))
            .field("actual_size", &self.actual_size)
            .field("layout_dirty", &self.layout_dirty)
            .finish_non_exhaustive()
    }
}

impl Default for HtmlContainer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl HtmlContainer {
    /// An empty container measuring text with [`ApproximateFontMetrics`]
    /// and loading images with a [`FileImageLoader`].
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let warnings = WarningLog::new();
        let (reporter, events) = ErrorReporter::channel();
        let (sender, completions) = channel();
        let selection_text = config_color(&config.selection_foreground, ColorValue::WHITE, &warnings);
        let selection_background = config_color(&config.selection_background, ColorValue::rgb(0x33, 0x99, 0xff), &warnings);

        let font_size = if config.default_font_size.is_finite() && config.default_font_size > 0.0 {
            config.default_font_size
        } else {
            let _ = warnings.warn_once("Config", "default_font_size must be positive; using the initial value");
            lumen_css::DEFAULT_FONT_SIZE_PX
        };
        let base_style = ComputedStyle {
            font_family: vec![config.default_font_family.clone()],
            font_size,
            ..ComputedStyle::default()
        };

        Self {
            config,
            fonts: Box::new(ApproximateFontMetrics),
            loader: Box::new(FileImageLoader::new(None)),
            custom_loader: false,
            base_dir: None,
            warnings,
            reporter,
            events,
            completion: ImageCompletion::new(sender),
            completions,
            generation: 0,
            next_ticket: 0,
            dom: DomTree::new(),
            css: CssData::new(),
            base_style,
            styles: StyleMap::new(),
            root: None,
            images: HashMap::new(),
            image_sizes: HashMap::new(),
            failed_images: HashSet::new(),
            requested: HashSet::new(),
            pending: HashMap::new(),
            restriction: None,
            viewport: (0.0, 0.0),
            actual_size: (0.0, 0.0),
            layout_dirty: false,
            scroll: (0.0, 0.0),
            selection: None,
            hovered: None,
            selection_text,
            selection_background,
        }
    }

    /// Measure text with `fonts`.
    #[must_use]
    pub fn with_fonts(mut self, fonts: impl FontMetrics + 'static) -> Self {
        self.fonts = Box::new(fonts);
        self
    }

    /// Resolve images with `loader` instead of the built-in file loader.
    #[must_use]
    pub fn with_image_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self.custom_loader = true;
        self
    }

    /// Directory that relative stylesheet and image paths resolve against.
    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.custom_loader {
            self.loader = Box::new(FileImageLoader::new(Some(dir.clone())));
        }
        self.base_dir = Some(dir);
    }

    /// The configuration the container was created with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Document lifecycle
    // -----------------------------------------------------------------------

    /// Replace the document with `html`.
    ///
    /// STEP 1: parse the markup (never fails; problems become warnings and
    ///         one `HtmlParsing` event).
    /// STEP 2: load the user agent sheet, then every `<style>` and
    ///         `<link rel=stylesheet>` in document order.
    /// STEP 3: cascade and build the box tree.
    pub fn set_html(&mut self, html: &str) {
        self.clear();

        let (dom, issues) = lumen_html::parse_html(html);
        for issue in &issues {
            let _ = self.warnings.warn_once("HTML", &issue.message);
        }
        if !issues.is_empty() {
            self.reporter.report_kind(
                ErrorKind::HtmlParsing,
                format!("recovered from {} problem(s) while parsing HTML", issues.len()),
            );
        }
        self.dom = dom;

        self.css = default_stylesheet(self.config.base_stylesheet.as_deref(), &self.config.media_type, &self.warnings);
        for source in collect_stylesheet_sources(&self.dom) {
            let text = match source {
                StylesheetSource::Inline { text } => text,
                StylesheetSource::External { href } => match self.read_stylesheet(&href) {
                    Ok(text) => text,
                    Err(e) => {
                        let _ = self.warnings.warn_once("CSS", &e.to_string());
                        self.reporter.report(
                            RenderError::new(ErrorKind::CssParsing, format!("stylesheet '{href}' not loaded"))
                                .with_source(e),
                        );
                        continue;
                    }
                },
            };
            let before = self.warnings.len();
            self.css
                .parse_into(&text, Origin::Author, &self.config.media_type, &self.warnings);
            if self.warnings.len() > before {
                self.reporter
                    .report_kind(ErrorKind::CssParsing, "stylesheet contained errors; invalid parts were skipped");
            }
        }

        self.rebuild_boxes();
        log::debug!(
            "document generation {}: {} nodes, {} style blocks",
            self.generation,
            self.dom.len(),
            self.css.len()
        );
    }

    /// Read `path` and set it as the document. Relative resources resolve
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub fn load_file(&mut self, path: &Path) -> std::io::Result<()> {
        let html = std::fs::read_to_string(path)?;
        if let Some(dir) = path.parent() {
            self.set_base_dir(dir);
        }
        self.set_html(&html);
        Ok(())
    }

    /// Release the document, the box tree, and every cache.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.next_ticket = 0;
        self.dom = DomTree::new();
        self.css = CssData::new();
        self.styles.clear();
        self.root = None;
        self.images.clear();
        self.image_sizes.clear();
        self.failed_images.clear();
        self.requested.clear();
        self.pending.clear();
        self.restriction = None;
        self.viewport = (0.0, 0.0);
        self.actual_size = (0.0, 0.0);
        self.layout_dirty = false;
        self.scroll = (0.0, 0.0);
        self.selection = None;
        self.hovered = None;
        self.warnings.clear();
    }

    fn read_stylesheet(&self, href: &str) -> Result<String, StylesheetLoadError> {
        match ResourceLocation::resolve(href, self.base_dir.as_deref()) {
            ResourceLocation::Data(data) => data
                .decode()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(StylesheetLoadError::DataUrl),
            ResourceLocation::File(path) => std::fs::read_to_string(&path).map_err(|source| StylesheetLoadError::Io {
                path: path.display().to_string(),
                source,
            }),
            ResourceLocation::Remote(url) => Err(StylesheetLoadError::Remote(url)),
        }
    }

    fn rebuild_boxes(&mut self) {
        self.styles = compute_styles(&self.dom, &self.css, self.hovered, &self.base_style, &self.warnings);
        self.root = Some(build_box_tree(&self.dom, &self.styles, &self.base_style, &self.warnings));
        self.layout_dirty = true;
    }

    fn root_font_size(&self) -> f32 {
        self.dom
            .document_element()
            .and_then(|html| self.styles.get(&html))
            .map_or(self.base_style.font_size, |style| style.font_size)
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    /// Lay the document out under `restriction` and return its actual size.
    ///
    /// In auto-size mode the first pass uses the natural width (capped by
    /// `max_width`); when content still overflows, the pass is repeated at
    /// the overflowing width, at most `max_relayout_retries` times.
    ///
    /// # Errors
    ///
    /// Returns a `Layout` [`RenderError`] when a size in `restriction` is
    /// negative or not finite. Content problems never fail.
    pub fn perform_layout(&mut self, restriction: LayoutRestriction) -> Result<(f32, f32), RenderError> {
        restriction.validate()?;
        self.restriction = Some(restriction);
        self.layout_dirty = false;

        let root_font_size = self.root_font_size();
        let Some(root) = self.root.as_mut() else {
            self.actual_size = (restriction.min_width, restriction.min_height);
            return Ok(self.actual_size);
        };
        let fonts = self.fonts.as_ref();
        let images = &self.image_sizes;
        let warnings = &self.warnings;
        let placeholder_size = self.config.image_placeholder_size;
        let context = |width: f32| LayoutContext {
            viewport: (width, restriction.max_height),
            fonts,
            images,
            warnings,
            placeholder_size,
            root_font_size,
        };

        let limit = if restriction.max_width > 0.0 {
            restriction.max_width
        } else {
            f32::INFINITY
        };
        let natural = margin_box_widths(root, &context(if limit.is_finite() { limit } else { 0.0 })).1;
        let mut width = if restriction.auto_size || !limit.is_finite() {
            natural.min(limit)
        } else {
            limit
        }
        .max(restriction.min_width);

        let mut bounds = layout_document(root, &context(width));
        if restriction.auto_size {
            let mut retries = 0;
            while bounds.right() > width + WIDTH_EPSILON && width < limit {
                if retries >= self.config.max_relayout_retries {
                    let message = format!("auto-size layout did not settle after {retries} extra pass(es)");
                    let _ = warnings.warn_once("Layout", &message);
                    self.reporter.report_kind(ErrorKind::Layout, message);
                    break;
                }
                retries += 1;
                width = bounds.right().min(limit).max(restriction.min_width);
                log::debug!("auto-size retry {retries} at width {width:.1}");
                bounds = layout_document(root, &context(width));
            }
        }

        self.viewport = (width, restriction.max_height);
        self.actual_size = (
            bounds.right().max(restriction.min_width),
            bounds.bottom().max(restriction.min_height),
        );
        log::debug!(
            "layout at width {width:.1}: actual size {:.1} x {:.1}",
            self.actual_size.0,
            self.actual_size.1
        );
        Ok(self.actual_size)
    }

    /// Re-run layout with the last restriction if something invalidated it.
    fn ensure_layout(&mut self) {
        if !self.layout_dirty {
            return;
        }
        if let Some(restriction) = self.restriction
            && let Err(e) = self.perform_layout(restriction)
        {
            self.reporter.report(e);
        }
    }

    /// Size of the laid-out document.
    #[must_use]
    pub const fn actual_size(&self) -> (f32, f32) {
        self.actual_size
    }

    /// Whether geometry is out of date.
    #[must_use]
    pub const fn needs_layout(&self) -> bool {
        self.layout_dirty
    }

    // -----------------------------------------------------------------------
    // Paint
    // -----------------------------------------------------------------------

    /// Scroll position: the document point shown at the viewport origin.
    pub const fn set_scroll_offset(&mut self, offset: (f32, f32)) {
        self.scroll = offset;
    }

    /// Current scroll position.
    #[must_use]
    pub const fn scroll_offset(&self) -> (f32, f32) {
        self.scroll
    }

    /// Paint into a display list in viewport coordinates. `clip` limits
    /// painting to a viewport rectangle.
    ///
    /// Images the paint needs are requested here, once per source. When a
    /// loader answers synchronously the document is laid out (if needed)
    /// and painted again so the result already shows the images.
    pub fn display_list(&mut self, clip: Option<Rect>) -> DisplayList {
        if self.restriction.is_none() {
            if self.root.is_some() {
                self.reporter
                    .report_kind(ErrorKind::Paint, "paint requested before the first layout");
            }
            return DisplayList::new();
        }
        self.ensure_layout();
        let Some(mut output) = self.paint_pass(clip) else {
            return DisplayList::new();
        };
        let missing = std::mem::take(&mut output.missing_images);
        if let Some(change) = self.request_images(missing) {
            if change.layout_required {
                self.layout_dirty = true;
                self.ensure_layout();
            }
            if let Some(again) = self.paint_pass(clip) {
                output = again;
            }
        }
        output.list
    }

    /// Paint the document into `gfx`. See [`HtmlContainer::display_list`].
    pub fn perform_paint<G: Graphics + ?Sized>(&mut self, gfx: &mut G, clip: Option<Rect>) {
        let list = self.display_list(clip);
        replay(&list, &self.images, gfx);
    }

    fn paint_pass(&self, clip: Option<Rect>) -> Option<PaintOutput> {
        let root = self.root.as_ref()?;
        let (sx, sy) = self.scroll;
        let context = PaintContext {
            fonts: self.fonts.as_ref(),
            images: &self.image_sizes,
            failed_images: &self.failed_images,
            selection: self.selection,
            selection_text: self.selection_text,
            selection_background: self.selection_background,
            visible: clip.map(|r| r.translate(sx, sy)),
            offset: (-sx, -sy),
            root_font_size: self.root_font_size(),
            viewport: self.viewport,
        };
        Some(Painter::new(context).paint(root))
    }

    // -----------------------------------------------------------------------
    // Images
    // -----------------------------------------------------------------------

    /// Handle the host can use to complete image loads out of band.
    #[must_use]
    pub fn image_completion(&self) -> ImageCompletion {
        self.completion.clone()
    }

    /// Current document generation; it changes with every [`set_html`].
    ///
    /// [`set_html`]: HtmlContainer::set_html
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Decoded images by source.
    #[must_use]
    pub const fn images(&self) -> &HashMap<String, LoadedImage> {
        &self.images
    }

    fn request_images(&mut self, uses: Vec<ImageUse>) -> Option<ContentChanged> {
        let mut change = None;
        for image_use in uses {
            if !self.requested.insert(image_use.src.clone()) {
                continue;
            }
            let ticket = ImageTicket {
                generation: self.generation,
                id: self.next_ticket,
            };
            self.next_ticket += 1;
            let attrs = image_use
                .node
                .and_then(|node| self.dom.as_element(node))
                .map(|element| {
                    element
                        .attrs
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default();
            let request = ImageRequest {
                src: image_use.src.clone(),
                attrs,
                ticket,
            };
            log::debug!("requesting image '{}'", request.src);
            match self.loader.load(&request, &self.completion) {
                ImageResponse::Ready(image) => {
                    let layout = self.store_image(&image_use, image);
                    note_change(&mut change, layout);
                }
                ImageResponse::Pending => {
                    let _ = self.pending.insert(ticket.id, image_use);
                }
                ImageResponse::Failed(e) => {
                    self.image_failed(&image_use.src, e);
                    note_change(&mut change, false);
                }
            }
        }
        change
    }

    /// Drain completed image loads.
    ///
    /// Completions from an earlier document, or for an element that no
    /// longer has a box, are discarded. Returns `None` when nothing visible
    /// changed.
    pub fn poll_images(&mut self) -> Option<ContentChanged> {
        let mut change = None;
        while let Ok((ticket, result)) = self.completions.try_recv() {
            if ticket.generation != self.generation {
                log::debug!("discarding image ticket {ticket:?} from an older document");
                continue;
            }
            let Some(image_use) = self.pending.remove(&ticket.id) else {
                continue;
            };
            let present = match (image_use.node, &self.root) {
                (Some(node), Some(root)) => root.find_node(node).is_some(),
                (None, Some(_)) => true,
                (_, None) => false,
            };
            if !present {
                log::debug!("discarding image '{}' for a removed box", image_use.src);
                continue;
            }
            match result {
                Ok(image) => {
                    let layout = self.store_image(&image_use, image);
                    note_change(&mut change, layout);
                }
                Err(e) => {
                    self.image_failed(&image_use.src, e);
                    note_change(&mut change, false);
                }
            }
        }
        if change.is_some_and(|c| c.layout_required) {
            self.layout_dirty = true;
        }
        change
    }

    /// Store a decoded image; returns whether boxes need a new layout.
    fn store_image(&mut self, image_use: &ImageUse, image: LoadedImage) -> bool {
        let layout_required = !image_use.background
            && image_use
                .node
                .and_then(|node| self.root.as_ref()?.find_node(node))
                .is_none_or(|b| b.style.width.is_auto() || b.style.height.is_auto());
        let _ = self
            .image_sizes
            .insert(image_use.src.clone(), image.dimensions_f32());
        let _ = self.images.insert(image_use.src.clone(), image);
        layout_required
    }

    fn image_failed(&mut self, src: &str, error: ImageLoadError) {
        let _ = self.failed_images.insert(src.to_string());
        let _ = self
            .warnings
            .warn_once("Image", &format!("failed to load '{src}': {error}"));
        self.reporter
            .report(RenderError::new(ErrorKind::Image, format!("failed to load image '{src}'")).with_source(error));
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Every fragment with the box holding its line, in document order.
    fn fragments(&self) -> Vec<(BoxId, &Fragment)> {
        let mut all = Vec::new();
        if let Some(root) = &self.root {
            root.walk(&mut |b| {
                for line in &b.lines {
                    all.extend(line.fragments.iter().map(|f| (b.id, f)));
                }
            });
        }
        all.sort_by_key(|(_, f)| f.index);
        all
    }

    /// Select every fragment of the document.
    pub fn select_all(&mut self) {
        let count = self.fragments().len();
        self.selection = (count > 0).then(|| (0, count - 1));
    }

    /// Select fragments `start..=end` (in either order).
    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.selection = Some((start.min(end), start.max(end)));
    }

    /// Remove the selection.
    pub const fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Current selection as inclusive fragment indices.
    #[must_use]
    pub const fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    /// Text of the selected fragments: words joined by single spaces,
    /// blocks and `<br>` separated by newlines.
    #[must_use]
    pub fn selected_text(&self) -> String {
        let Some((start, end)) = self.selection else {
            return String::new();
        };
        let mut out = String::new();
        let mut previous: Option<(BoxId, &Fragment)> = None;
        for (container, fragment) in self.fragments() {
            if !(start..=end).contains(&fragment.index) {
                continue;
            }
            if let Some((last_container, last)) = previous
                && !out.is_empty()
                && !out.ends_with(char::is_whitespace)
            {
                if last_container != container {
                    out.push('\n');
                } else if last.space_after || fragment.space_before {
                    out.push(' ');
                }
            }
            match &fragment.kind {
                FragmentKind::Word(text) | FragmentKind::Whitespace(text) => out.push_str(text),
                FragmentKind::LineBreak => out.push('\n'),
                FragmentKind::Atomic(_) => {}
            }
            previous = Some((container, fragment));
        }
        out
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The parsed document.
    #[must_use]
    pub const fn document(&self) -> &DomTree {
        &self.dom
    }

    /// The box tree, once a document is set.
    #[must_use]
    pub const fn root_box(&self) -> Option<&LayoutBox> {
        self.root.as_ref()
    }

    /// Indented dump of the box tree.
    #[must_use]
    pub fn dump_tree(&self) -> String {
        self.root
            .as_ref()
            .map(|root| root.dump(Some(&self.dom)))
            .unwrap_or_default()
    }

    /// Regenerate HTML from the rendered document.
    #[must_use]
    pub fn get_html(&self, mode: HtmlGenerationStyle) -> String {
        generate_html(&self.dom, self.root.as_ref(), mode)
    }

    fn node_rect(&self, node: NodeId) -> Option<Rect> {
        let b = self.root.as_ref()?.find_node(node)?;
        Some(
            b.line_rects
                .iter()
                .copied()
                .reduce(|a, r| a.union(&r))
                .unwrap_or_else(|| b.dimensions.border_box()),
        )
    }

    /// Border box (in document coordinates) of the element with this `id`.
    #[must_use]
    pub fn element_rect(&self, id: &str) -> Option<Rect> {
        self.node_rect(self.dom.element_by_id(id)?)
    }

    /// [§ 7.4.6.4 Scrolling to a fragment](https://html.spec.whatwg.org/multipage/browsing-the-web.html#scroll-to-fragid)
    ///
    /// "If there is an element in the document tree that has an ID equal to
    /// `decodedFragid`, then return the first such element... If there is an
    /// a element in the document tree that has a name attribute whose value
    /// is equal to `fragid`, then return the first such element."
    #[must_use]
    pub fn anchor_rect(&self, fragment: &str) -> Option<Rect> {
        let node = self.dom.element_by_id(fragment).or_else(|| {
            self.dom.iter_all().into_iter().find(|&n| {
                self.dom
                    .as_element(n)
                    .is_some_and(|e| e.tag_name == "a" && e.attr("name") == Some(fragment))
            })
        })?;
        self.node_rect(node)
    }

    /// Every `<a href>` with a box, in document order.
    #[must_use]
    pub fn links(&self) -> Vec<LinkInfo> {
        let mut links = Vec::new();
        let Some(root) = &self.root else { return links };
        root.walk(&mut |b| {
            let &BoxType::Principal(node) = &b.box_type else { return };
            let Some(element) = self.dom.as_element(node) else { return };
            if element.tag_name != "a" {
                return;
            }
            let Some(href) = element.attr("href") else { return };
            let rects = if b.line_rects.is_empty() {
                vec![b.dimensions.border_box()]
            } else {
                b.line_rects.clone()
            };
            links.push(LinkInfo {
                href: href.trim().to_string(),
                node,
                rects,
            });
        });
        links
    }

    /// The link under the viewport point `(x, y)`.
    #[must_use]
    pub fn link_at(&self, x: f32, y: f32) -> Option<LinkInfo> {
        let (px, py) = (x + self.scroll.0, y + self.scroll.1);
        self.links()
            .into_iter()
            .find(|link| link.rects.iter().any(|r| r.contains(px, py)))
    }

    /// The innermost visible element under the viewport point `(x, y)`.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32) -> Option<NodeId> {
        let (px, py) = (x + self.scroll.0, y + self.scroll.1);
        let mut hit = None;
        self.root.as_ref()?.walk(&mut |b| {
            let Some(node) = b.node() else { return };
            if b.style.visibility != Visibility::Visible {
                return;
            }
            let inside = if b.line_rects.is_empty() {
                b.dimensions.border_box().contains(px, py)
            } else {
                b.line_rects.iter().any(|r| r.contains(px, py))
            };
            if inside {
                hit = Some(node);
            }
        });
        hit
    }

    /// [§ 9.2 The pointer hover pseudo-class](https://www.w3.org/TR/selectors-4/#the-hover-pseudo)
    ///
    /// Move the pointer to the viewport point `(x, y)`. Returns `true` when
    /// `:hover` rules changed styles; the next paint lays out again.
    pub fn set_hover(&mut self, x: f32, y: f32) -> bool {
        let hit = self.element_at(x, y);
        if hit == self.hovered {
            return false;
        }
        self.hovered = hit;
        if !self.css.has_hover_rules() {
            return false;
        }
        self.styles = compute_styles(&self.dom, &self.css, self.hovered, &self.base_style, &self.warnings);
        if let Some(root) = self.root.as_mut() {
            BoxTreeBuilder::restyle(root, &self.styles);
        }
        self.layout_dirty = true;
        true
    }

    /// Element under the pointer.
    #[must_use]
    pub const fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Deduplicated warnings raised for the current document.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.warnings()
    }

    /// Error events raised so far; receive with `try_recv`.
    #[must_use]
    pub const fn error_events(&self) -> &Receiver<RenderError> {
        &self.events
    }

    /// A reporter that raises events on this container's channel, for
    /// collaborators running elsewhere.
    #[must_use]
    pub fn error_reporter(&self) -> ErrorReporter {
        self.reporter.clone()
    }
}

fn note_change(change: &mut Option<ContentChanged>, layout_required: bool) {
    let entry = change.get_or_insert(ContentChanged {
        layout_required: false,
    });
    entry.layout_required |= layout_required;
}

fn config_color(text: &str, fallback: ColorValue, warnings: &WarningLog) -> ColorValue {
    ColorValue::parse(text).unwrap_or_else(|| {
        let _ = warnings.warn_once("Config", &format!("invalid selection color '{text}'"));
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restriction_validation() {
        assert!(LayoutRestriction::fixed(100.0).validate().is_ok());
        assert!(LayoutRestriction::fixed(f32::NAN).validate().is_err());
        assert!(LayoutRestriction::auto(f32::INFINITY).validate().is_err());
        let negative = LayoutRestriction {
            min_height: -1.0,
            ..LayoutRestriction::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_restriction_from_json() {
        let r: LayoutRestriction = serde_json::from_str(r#"{ "max_width": 300, "auto_size": true }"#).unwrap();
        assert_eq!(r, LayoutRestriction::auto(300.0));
    }

    #[test]
    fn test_layout_without_document() {
        let mut container = HtmlContainer::default();
        assert_eq!(container.perform_layout(LayoutRestriction::fixed(100.0)).unwrap(), (0.0, 0.0));
        assert!(container.display_list(None).is_empty());
    }

    #[test]
    fn test_invalid_config_color_falls_back() {
        let config = EngineConfig {
            selection_background: "nonsense".to_string(),
            ..EngineConfig::default()
        };
        let container = HtmlContainer::new(config);
        assert_eq!(container.selection_background, ColorValue::rgb(0x33, 0x99, 0xff));
        assert_eq!(container.warnings().len(), 1);
    }

    #[test]
    fn test_missing_stylesheet_raises_css_event() {
        let mut container = HtmlContainer::default();
        container.set_base_dir("/nonexistent-dir");
        container.set_html("<link rel=stylesheet href=missing.css><p>x</p>");
        let event = container
            .error_events()
            .try_iter()
            .find(|e| e.kind == ErrorKind::CssParsing)
            .unwrap();
        assert!(std::error::Error::source(&event).is_some());
    }
}
