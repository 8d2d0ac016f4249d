//! Painter - generates a display list from the laid-out box tree
//!
//! [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
//!
//! The painter walks the box tree and generates drawing commands in the
//! correct painting order (back to front). Every positioned box, float and
//! atomic inline is painted as a layer of its own:
//!
//! 1. its background and borders,
//! 2. backgrounds and borders of in-flow block descendants,
//! 3. floats,
//! 4. inline content: inline element decorations, text, images, atomic
//!    inlines and list markers,
//! 5. positioned descendants.

use std::collections::{HashMap, HashSet};

use lumen_dom::NodeId;

use crate::layout::{BoxId, BoxType, EdgeSizes, FontMetrics, Fragment, FragmentKind, LayoutBox, ListMarker, Rect};
use crate::style::ColorValue;
use crate::style::values::{BorderSide, BorderStyle, Direction, DisplayKind, LengthContext, Overflow, Visibility};

use super::background::{canvas_background, tile_rects};
use super::display_list::{DisplayCommand, DisplayList, LineDash, Path, PlaceholderKind};

/// Inputs of a paint pass.
#[derive(Clone, Copy)]
pub struct PaintContext<'a> {
    /// Text measurement, for list markers and decoration offsets.
    pub fonts: &'a dyn FontMetrics,
    /// Natural sizes of loaded images, by source.
    pub images: &'a HashMap<String, (f32, f32)>,
    /// Sources whose load failed.
    pub failed_images: &'a HashSet<String>,
    /// Selected fragment indices, inclusive.
    pub selection: Option<(usize, usize)>,
    /// Text color of selected fragments.
    pub selection_text: ColorValue,
    /// Highlight behind selected fragments.
    pub selection_background: ColorValue,
    /// Area of the document to paint, in document coordinates.
    pub visible: Option<Rect>,
    /// Translation applied to the finished list (the negated scroll offset).
    pub offset: (f32, f32),
    /// Font size of the root element, for `rem`.
    pub root_font_size: f32,
    /// Viewport size, for `vw` and `vh`.
    pub viewport: (f32, f32),
}

/// An image the painted content needs but that is not available yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUse {
    /// Image source.
    pub src: String,
    /// Element that shows it.
    pub node: Option<NodeId>,
    /// Used as a CSS background rather than replaced content.
    pub background: bool,
}

/// Result of a paint pass.
#[derive(Debug, Clone, Default)]
pub struct PaintOutput {
    /// Drawing commands, back to front.
    pub list: DisplayList,
    /// Images that should be requested.
    pub missing_images: Vec<ImageUse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Blocks,
    Floats,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Painter that generates a display list from a box tree.
pub struct Painter<'a> {
    ctx: PaintContext<'a>,
    list: DisplayList,
    missing: Vec<ImageUse>,
    canvas_owner: Option<BoxId>,
}

impl<'a> Painter<'a> {
    /// Create a painter for one pass.
    #[must_use]
    pub fn new(ctx: PaintContext<'a>) -> Self {
        Self {
            ctx,
            list: DisplayList::new(),
            missing: Vec::new(),
            canvas_owner: None,
        }
    }

    /// Paint a laid-out box tree.
    #[must_use]
    pub fn paint(mut self, root: &LayoutBox) -> PaintOutput {
        let canvas_area = self.ctx.visible.unwrap_or_else(|| root.dimensions.margin_box());
        if let Some(visible) = self.ctx.visible {
            self.list.push(DisplayCommand::PushClip { rect: visible });
        }
        // [§ 2.11.2](https://www.w3.org/TR/css-backgrounds-3/#special-backgrounds)
        if let Some((owner, color)) = canvas_background(root) {
            self.canvas_owner = Some(owner);
            self.list.push(DisplayCommand::FillRect {
                rect: canvas_area,
                color,
            });
        }
        self.paint_layer(root);
        if self.ctx.visible.is_some() {
            self.list.push(DisplayCommand::PopClip);
        }
        self.list.translate(self.ctx.offset.0, self.ctx.offset.1);
        log::debug!(
            "paint: {} commands, {} images missing",
            self.list.len(),
            self.missing.len()
        );
        PaintOutput {
            list: self.list,
            missing_images: self.missing,
        }
    }

    /// Whether `rect` lies entirely outside the visible area.
    fn is_culled(&self, rect: &Rect) -> bool {
        self.ctx.visible.is_some_and(|visible| visible.intersect(rect).is_none())
    }

    fn length_context(&self, font_size: f32) -> LengthContext {
        LengthContext {
            font_size,
            root_font_size: self.ctx.root_font_size,
            viewport_width: self.ctx.viewport.0,
            viewport_height: self.ctx.viewport.1,
        }
    }

    /// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
    fn paint_layer(&mut self, b: &LayoutBox) {
        // STEP 1: "background color of element", "background image of
        // element", "border of element".
        self.paint_decorations(b);
        if matches!(b.box_type, BoxType::Replaced { .. }) {
            self.paint_replaced(b);
            return;
        }
        let clipped = self.push_overflow_clip(b);

        // STEP 2: "for all its in-flow, non-positioned, block-level
        // descendants in tree order: background color, background image,
        // border".
        self.walk_children(b, Phase::Blocks);
        // STEP 3: "All non-positioned floating descendants, in tree order."
        self.walk_children(b, Phase::Floats);
        // STEP 4: inline content, in tree order.
        self.paint_content(b);
        self.walk_children(b, Phase::Content);
        // STEP 5: "All positioned descendants with 'z-index: auto' or
        // 'z-index: 0', in tree order."
        let mut positioned = Vec::new();
        collect_positioned(b, &mut positioned);
        for p in positioned {
            self.paint_layer(p);
        }

        if clipped {
            self.list.push(DisplayCommand::PopClip);
        }
    }

    fn walk_children(&mut self, b: &LayoutBox, phase: Phase) {
        for child in &b.children {
            self.walk(child, phase);
        }
    }

    fn walk(&mut self, b: &LayoutBox, phase: Phase) {
        if b.is_spacing() || is_layer_positioned(b) || is_atomic_inline(b) {
            return;
        }
        if b.is_floated() {
            if phase == Phase::Floats {
                self.paint_layer(b);
            }
            return;
        }
        if phase == Phase::Blocks && b.display != DisplayKind::Inline {
            self.paint_decorations(b);
        }
        // The box's own lines are clipped along with its children.
        let clipped = self.push_overflow_clip(b);
        if phase == Phase::Content {
            self.paint_content(b);
            // Replaced content of a block-level image.
            if matches!(b.box_type, BoxType::Replaced { .. }) {
                self.paint_replaced(b);
            }
        }
        self.walk_children(b, phase);
        if clipped {
            self.list.push(DisplayCommand::PopClip);
        }
    }

    /// [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
    /// "'hidden': This value indicates that the content is clipped".
    fn push_overflow_clip(&mut self, b: &LayoutBox) -> bool {
        if b.style.overflow != Overflow::Hidden || b.display == DisplayKind::Inline {
            return false;
        }
        self.list.push(DisplayCommand::PushClip {
            rect: b.dimensions.padding_box(),
        });
        true
    }

    /// Lines and list marker of `b`.
    fn paint_content(&mut self, b: &LayoutBox) {
        self.paint_marker(b);
        if b.lines.is_empty() {
            return;
        }
        self.paint_inline_decorations(b);
        for line in &b.lines {
            for fragment in &line.fragments {
                match fragment.kind {
                    FragmentKind::Word(_) | FragmentKind::Whitespace(_) => self.paint_text(fragment),
                    FragmentKind::Atomic(id) => {
                        if let Some(atomic) = b.children.iter().find_map(|c| c.find(id))
                            && !is_layer_positioned(atomic)
                        {
                            self.paint_layer(atomic);
                        }
                    }
                    FragmentKind::LineBreak => {}
                }
            }
        }
    }

    /// Background and borders of inline elements, one piece per line.
    fn paint_inline_decorations(&mut self, parent: &LayoutBox) {
        for child in &parent.children {
            if child.display != DisplayKind::Inline || child.is_out_of_flow() || child.line_rects.is_empty() {
                continue;
            }
            if child.style.visibility == Visibility::Visible {
                let count = child.line_rects.len();
                for (i, rect) in child.line_rects.iter().enumerate() {
                    let mut edges = child.dimensions.border;
                    if i > 0 {
                        edges.left = 0.0;
                    }
                    if i + 1 < count {
                        edges.right = 0.0;
                    }
                    let color = child.style.background_color;
                    if !color.is_transparent() {
                        self.list.push(DisplayCommand::FillRect { rect: *rect, color });
                    }
                    self.paint_border_sides(child, rect, &rect.shrink(&edges), &edges);
                }
            }
            self.paint_inline_decorations(child);
        }
    }

    fn paint_text(&mut self, fragment: &Fragment) {
        if !fragment.style.visible || self.is_culled(&fragment.rect) {
            return;
        }
        let selected = self
            .ctx
            .selection
            .is_some_and(|(start, end)| (start..=end).contains(&fragment.index));
        if selected {
            self.list.push(DisplayCommand::FillRect {
                rect: fragment.rect,
                color: self.ctx.selection_background,
            });
        }
        let color = if selected {
            self.ctx.selection_text
        } else {
            fragment.style.color
        };
        let font = &fragment.style.font;
        if let FragmentKind::Word(text) = &fragment.kind {
            self.list.push(DisplayCommand::DrawText {
                origin: (fragment.rect.x, fragment.baseline),
                text: text.clone(),
                font: font.clone(),
                color,
            });
        }

        // [§ 3 'text-decoration-line'](https://www.w3.org/TR/css-text-decoration-3/#text-decoration-line-property)
        let decoration = fragment.style.decoration;
        if !(decoration.underline || decoration.overline || decoration.line_through) {
            return;
        }
        let metrics = self.ctx.fonts.line_metrics(font);
        let thickness = (font.size / 14.0).max(1.0);
        let baseline = fragment.baseline;
        let offsets = [
            (decoration.underline, metrics.underline_offset),
            (decoration.overline, -metrics.ascent),
            (decoration.line_through, -metrics.ascent * 0.35),
        ];
        for (_, dy) in offsets.into_iter().filter(|(on, _)| *on) {
            self.list.push(DisplayCommand::StrokeLine {
                from: (fragment.rect.x, baseline + dy),
                to: (fragment.rect.right(), baseline + dy),
                width: thickness,
                color,
                dash: LineDash::Solid,
            });
        }
    }

    /// [§ 12.5 Lists](https://www.w3.org/TR/CSS2/generate.html#lists)
    ///
    /// Markers sit outside the principal box, on its first line.
    fn paint_marker(&mut self, b: &LayoutBox) {
        let Some(marker) = &b.marker else { return };
        if b.style.visibility != Visibility::Visible {
            return;
        }
        let font = b.style.font_spec();
        let metrics = self.ctx.fonts.line_metrics(&font);
        let content = b.dimensions.content;
        let baseline = b.first_baseline().unwrap_or(content.y + metrics.ascent);
        let gap = font.size * 0.5;
        let rtl = b.style.direction == Direction::Rtl;
        let color = b.style.color;

        if let ListMarker::Text(text) = marker {
            let width = self.ctx.fonts.text_width(text, &font);
            let x = if rtl { content.right() + gap } else { content.x - gap - width };
            self.list.push(DisplayCommand::DrawText {
                origin: (x, baseline),
                text: text.clone(),
                font,
                color,
            });
            return;
        }
        let size = (font.size * 0.35).max(2.0);
        let x = if rtl { content.right() + gap } else { content.x - gap - size };
        let bullet = Rect::new(x, baseline - metrics.ascent * 0.5 - size / 2.0, size, size);
        let center = (bullet.x + size / 2.0, bullet.y + size / 2.0);
        match marker {
            ListMarker::Square => self.list.push(DisplayCommand::FillRect { rect: bullet, color }),
            ListMarker::Disc => {
                let mut path = Path::new();
                let _ = path.add_circle(center, size / 2.0);
                self.list.push(DisplayCommand::FillPath { path, color });
            }
            ListMarker::Circle => {
                let mut path = Path::new();
                let ring = (size / 5.0).max(1.0);
                let _ = path
                    .add_circle(center, size / 2.0)
                    .add_circle(center, (size / 2.0 - ring).max(0.0));
                self.list.push(DisplayCommand::FillPath { path, color });
            }
            ListMarker::Text(_) => {}
        }
    }

    /// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
    /// "the replaced content of replaced inline-level elements"
    fn paint_replaced(&mut self, b: &LayoutBox) {
        let BoxType::Replaced { node, src } = &b.box_type else { return };
        let rect = b.dimensions.content;
        if b.style.visibility != Visibility::Visible || self.is_culled(&rect) {
            return;
        }
        let command = match src {
            Some(src) if self.ctx.images.contains_key(src) => DisplayCommand::DrawImage {
                src: src.clone(),
                dest: rect,
                source: None,
                opacity: b.style.opacity.clamp(0.0, 1.0),
            },
            Some(src) if !self.ctx.failed_images.contains(src) => {
                self.request(src, Some(*node), false);
                DisplayCommand::DrawPlaceholder {
                    rect,
                    kind: PlaceholderKind::Loading,
                }
            }
            _ => DisplayCommand::DrawPlaceholder {
                rect,
                kind: PlaceholderKind::Error,
            },
        };
        self.list.push(command);
    }

    fn request(&mut self, src: &str, node: Option<NodeId>, background: bool) {
        if self.missing.iter().any(|m| m.src == src) {
            return;
        }
        self.missing.push(ImageUse {
            src: src.to_string(),
            node,
            background,
        });
    }

    /// Background and borders of a block-level or atomic box.
    fn paint_decorations(&mut self, b: &LayoutBox) {
        if b.style.visibility != Visibility::Visible || b.display == DisplayKind::Inline {
            return;
        }
        let border_box = b.dimensions.border_box();
        if self.is_culled(&border_box) {
            return;
        }
        let radii = self.corner_radii(b, &border_box);
        if Some(b.id) != self.canvas_owner {
            self.paint_background(b, &border_box, radii);
        }
        let inner = b.dimensions.padding_box();
        if radii.iter().any(|r| *r > 0.0) && self.paint_rounded_border(b, &border_box, &inner, radii) {
            return;
        }
        self.paint_border_sides(b, &border_box, &inner, &b.dimensions.border);
    }

    fn corner_radii(&self, b: &LayoutBox, border_box: &Rect) -> [f32; 4] {
        let r = &b.style.border_radius;
        if r.is_zero() {
            return [0.0; 4];
        }
        let lengths = self.length_context(b.style.font_size);
        let reference = border_box.width.min(border_box.height);
        [r.top_left, r.top_right, r.bottom_right, r.bottom_left].map(|len| len.to_px(reference, &lengths).max(0.0))
    }

    /// [§ 3 Backgrounds](https://www.w3.org/TR/css-backgrounds-3/#backgrounds)
    ///
    /// "The initial value of 'background-clip' is 'border-box'", while
    /// images are positioned against the padding box.
    fn paint_background(&mut self, b: &LayoutBox, area: &Rect, radii: [f32; 4]) {
        let color = b.style.background_color;
        if !color.is_transparent() {
            if radii.iter().any(|r| *r > 0.0) {
                let mut path = Path::new();
                let _ = path.add_rounded_rect(area, radii);
                self.list.push(DisplayCommand::FillPath { path, color });
            } else {
                self.list.push(DisplayCommand::FillRect { rect: *area, color });
            }
        }

        let Some(src) = &b.style.background_image else { return };
        let Some(&(width, height)) = self.ctx.images.get(src) else {
            if !self.ctx.failed_images.contains(src) {
                self.request(src, b.node(), true);
            }
            return;
        };
        // [§ 3.6 'background-position'](https://www.w3.org/TR/css-backgrounds-3/#background-position)
        // "A percentage for the horizontal offset is relative to (width of
        // background positioning area - width of background image)."
        let origin = b.dimensions.padding_box();
        let lengths = self.length_context(b.style.font_size);
        let (pos_x, pos_y) = b.style.background_position;
        let anchor = (
            origin.x + pos_x.to_px(origin.width - width, &lengths),
            origin.y + pos_y.to_px(origin.height - height, &lengths),
        );
        let tiles = tile_rects(area, anchor, (width, height), b.style.background_repeat);
        if tiles.is_empty() {
            return;
        }
        self.list.push(DisplayCommand::PushClip { rect: *area });
        for dest in tiles {
            self.list.push(DisplayCommand::DrawImage {
                src: src.clone(),
                dest,
                source: None,
                opacity: 1.0,
            });
        }
        self.list.push(DisplayCommand::PopClip);
    }

    /// [§ 5.3 Corner Shaping](https://www.w3.org/TR/css-backgrounds-3/#corner-shaping)
    ///
    /// A uniform solid border with rounded corners is painted as one ring:
    /// the outer curve and the inner curve (radius minus border width).
    /// Returns false when the sides differ and need painting one by one.
    fn paint_rounded_border(&mut self, b: &LayoutBox, outer: &Rect, inner: &Rect, radii: [f32; 4]) -> bool {
        let sides = [&b.style.border.top, &b.style.border.right, &b.style.border.bottom, &b.style.border.left];
        let widths = b.dimensions.border;
        if widths.horizontal() + widths.vertical() <= 0.0 {
            return true;
        }
        let color = b.style.border_color(sides[0]);
        let uniform = sides
            .iter()
            .all(|s| s.style == BorderStyle::Solid && b.style.border_color(s) == color);
        if !uniform {
            return false;
        }
        let [tl, tr, br, bl] = radii;
        let inner_radii = [
            tl - widths.left.max(widths.top),
            tr - widths.right.max(widths.top),
            br - widths.right.max(widths.bottom),
            bl - widths.left.max(widths.bottom),
        ];
        let mut path = Path::new();
        let _ = path.add_rounded_rect(outer, radii).add_rounded_rect(inner, inner_radii);
        self.list.push(DisplayCommand::FillPath { path, color });
        true
    }

    /// [§ 4 Borders](https://www.w3.org/TR/css-backgrounds-3/#borders)
    ///
    /// Each side is the trapezoid between the outer and inner border edges,
    /// so corners meet on the diagonal.
    fn paint_border_sides(&mut self, b: &LayoutBox, outer: &Rect, inner: &Rect, widths: &EdgeSizes) {
        let border = &b.style.border;
        for (side, spec, width) in [
            (Side::Top, &border.top, widths.top),
            (Side::Right, &border.right, widths.right),
            (Side::Bottom, &border.bottom, widths.bottom),
            (Side::Left, &border.left, widths.left),
        ] {
            if width > 0.0 && !spec.style.is_none() {
                let color = b.style.border_color(spec);
                self.paint_border_side(side, spec, color, width, outer, inner);
            }
        }
    }

    fn paint_border_side(&mut self, side: Side, spec: &BorderSide, color: ColorValue, width: f32, outer: &Rect, inner: &Rect) {
        if color.is_transparent() {
            return;
        }
        // "inset: Looks as if the content on the inside of the border is
        // sunken into the canvas." Top and left are darker for inset and
        // groove; bottom and right for outset and ridge.
        let dark = color.shade(0.5);
        let leading = matches!(side, Side::Top | Side::Left);
        match spec.style {
            BorderStyle::None | BorderStyle::Hidden => {}
            BorderStyle::Solid => self.fill_band(side, outer, inner, color),
            BorderStyle::Inset | BorderStyle::Groove => {
                self.fill_band(side, outer, inner, if leading { dark } else { color });
            }
            BorderStyle::Outset | BorderStyle::Ridge => {
                self.fill_band(side, outer, inner, if leading { color } else { dark });
            }
            BorderStyle::Double if width >= 3.0 => {
                self.fill_band(side, outer, &lerp_rect(outer, inner, 1.0 / 3.0), color);
                self.fill_band(side, &lerp_rect(outer, inner, 2.0 / 3.0), inner, color);
            }
            BorderStyle::Double => self.fill_band(side, outer, inner, color),
            BorderStyle::Dashed | BorderStyle::Dotted => {
                let mid = lerp_rect(outer, inner, 0.5);
                let (from, to) = match side {
                    Side::Top => ((mid.x, mid.y), (mid.right(), mid.y)),
                    Side::Right => ((mid.right(), mid.y), (mid.right(), mid.bottom())),
                    Side::Bottom => ((mid.x, mid.bottom()), (mid.right(), mid.bottom())),
                    Side::Left => ((mid.x, mid.y), (mid.x, mid.bottom())),
                };
                let dash = if spec.style == BorderStyle::Dashed {
                    LineDash::Dashed
                } else {
                    LineDash::Dotted
                };
                self.list.push(DisplayCommand::StrokeLine {
                    from,
                    to,
                    width,
                    color,
                    dash,
                });
            }
        }
    }

    /// Fill one side's band between two nested rectangles.
    fn fill_band(&mut self, side: Side, outer: &Rect, inner: &Rect, color: ColorValue) {
        let (o, i) = (outer, inner);
        let points = match side {
            Side::Top => [(o.x, o.y), (o.right(), o.y), (i.right(), i.y), (i.x, i.y)],
            Side::Right => [(o.right(), o.y), (o.right(), o.bottom()), (i.right(), i.bottom()), (i.right(), i.y)],
            Side::Bottom => [(o.right(), o.bottom()), (o.x, o.bottom()), (i.x, i.bottom()), (i.right(), i.bottom())],
            Side::Left => [(o.x, o.bottom()), (o.x, o.y), (i.x, i.y), (i.x, i.bottom())],
        };
        // Axis-aligned bands (no diagonal corner) are plain rectangles.
        let straight = match side {
            Side::Top | Side::Bottom => same(o.x, i.x) && same(o.right(), i.right()),
            Side::Left | Side::Right => same(o.y, i.y) && same(o.bottom(), i.bottom()),
        };
        if straight {
            let xs = points.map(|p| p.0);
            let ys = points.map(|p| p.1);
            let left = xs.iter().copied().fold(f32::INFINITY, f32::min);
            let top = ys.iter().copied().fold(f32::INFINITY, f32::min);
            let right = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let bottom = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            self.list.push(DisplayCommand::FillRect {
                rect: Rect::new(left, top, right - left, bottom - top),
                color,
            });
            return;
        }
        let mut path = Path::new();
        let _ = path.add_polygon(&points);
        self.list.push(DisplayCommand::FillPath { path, color });
    }
}

/// The rectangle `t` of the way from `outer` to `inner`, edge by edge.
fn lerp_rect(outer: &Rect, inner: &Rect, t: f32) -> Rect {
    let lerp = |a: f32, b: f32| a + (b - a) * t;
    let x = lerp(outer.x, inner.x);
    let y = lerp(outer.y, inner.y);
    Rect::new(x, y, lerp(outer.right(), inner.right()) - x, lerp(outer.bottom(), inner.bottom()) - y)
}

fn same(a: f32, b: f32) -> bool {
    (a - b).abs() < f32::EPSILON
}

/// Positioned boxes other than inline elements paint as layers.
fn is_layer_positioned(b: &LayoutBox) -> bool {
    b.is_positioned() && !(b.display == DisplayKind::Inline && matches!(b.box_type, BoxType::Principal(_)))
}

/// Inline-level boxes that sit in a line as one fragment.
fn is_atomic_inline(b: &LayoutBox) -> bool {
    b.is_inline_level()
        && !matches!(b.box_type, BoxType::Text(_) | BoxType::LineBreak)
        && !(b.display == DisplayKind::Inline && matches!(b.box_type, BoxType::Principal(_) | BoxType::Anonymous))
}

/// Positioned descendants painted by the layer of `b`, in tree order.
fn collect_positioned<'b>(b: &'b LayoutBox, out: &mut Vec<&'b LayoutBox>) {
    for child in &b.children {
        if is_layer_positioned(child) {
            out.push(child);
        } else if !child.is_floated() && !is_atomic_inline(child) {
            collect_positioned(child, out);
        }
    }
}
