//! CSS Inline Layout and Line Box Model.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block. Horizontal
//! margins, borders, and padding are respected between these boxes."
//!
//! [§ 10.8 Line height calculations: the 'line-height' and 'vertical-align' properties](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! Layout happens in two passes over the container's inline content:
//!
//! 1. The inline subtree is flattened into [`Item`]s: words, preserved
//!    spaces, forced breaks, atomic boxes (laid out first so their size is
//!    known), floats, and the open/close edges of inline elements.
//! 2. Items are fitted into line boxes, which are then aligned vertically
//!    and horizontally.

use std::collections::HashMap;

use serde::Serialize;

use crate::style::ComputedStyle;
use crate::style::values::{
    ColorValue, Direction, DisplayKind, Float, TextAlign, TextDecoration, VerticalAlign, Visibility,
    WhiteSpace, WordBreak,
};

use super::LayoutContext;
use super::block;
use super::box_model::{EdgeSizes, Rect};
use super::float::FloatContext;
use super::font::FontSpec;
use super::layout_box::{BoxId, BoxType, LayoutBox};

/// Tab stops in preserved text, in spaces.
const TAB_SIZE: usize = 8;

/// [§ 10.8.1](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
/// "sub: Lower the baseline of the box to the proper position for
/// subscripts of the parent's box." Offsets as a fraction of the font size.
const SUB_OFFSET: f32 = 0.2;
const SUPER_OFFSET: f32 = 0.35;

/// Tolerance for width comparisons.
const EPSILON: f32 = 0.01;

/// How text in a fragment is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    /// Font of the run.
    pub font: FontSpec,
    /// Text color.
    pub color: ColorValue,
    /// Lines drawn with the text.
    pub decoration: TextDecoration,
    /// `visibility: visible`.
    pub visible: bool,
    /// Alignment of the fragment in its line.
    pub vertical_align: VerticalAlign,
}

impl TextStyle {
    /// Text style of a box.
    #[must_use]
    pub fn from_style(style: &ComputedStyle) -> Self {
        Self {
            font: style.font_spec(),
            color: style.color,
            decoration: style.text_decoration,
            visible: style.visibility == Visibility::Visible,
            vertical_align: style.vertical_align,
        }
    }
}

/// What a fragment shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FragmentKind {
    /// A word, drawn as text.
    Word(String),
    /// Preserved spaces.
    Whitespace(String),
    /// A forced line break.
    LineBreak,
    /// An inline-block or image, laid out as its own box.
    Atomic(BoxId),
}

/// A piece of inline content placed on a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    /// Content.
    pub kind: FragmentKind,
    /// Glyph box for text, margin box for atomic boxes.
    pub rect: Rect,
    /// Absolute y of the fragment's baseline.
    pub baseline: f32,
    /// Collapsible whitespace preceded the fragment in the source.
    pub space_before: bool,
    /// Collapsible whitespace followed the fragment in the source.
    pub space_after: bool,
    /// Text, `<br>` or atomic box that produced the fragment.
    pub source: BoxId,
    /// Inline element ancestors inside the container, outermost first.
    pub owners: Vec<BoxId>,
    /// Drawing style.
    pub style: TextStyle,
    /// Position in document order, for selection.
    pub index: usize,
}

impl Fragment {
    /// Text of a word or whitespace fragment.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            FragmentKind::Word(text) | FragmentKind::Whitespace(text) => Some(text),
            _ => None,
        }
    }

    /// Short description used by tree dumps.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            FragmentKind::Word(text) => format!("{text:?}@{:.1}", self.rect.x),
            FragmentKind::Whitespace(text) => format!("ws({})@{:.1}", text.chars().count(), self.rect.x),
            FragmentKind::LineBreak => "br".to_string(),
            FragmentKind::Atomic(id) => format!("box#{}@{:.1}", id.0, self.rect.x),
        }
    }
}

/// [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// "The rectangular area that contains the boxes that form a line is called
/// a line box."
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineBox {
    /// Line box rectangle; its width is the space left by floats.
    pub rect: Rect,
    /// Absolute y of the line's baseline.
    pub baseline: f32,
    /// Fragments in visual order.
    pub fragments: Vec<Fragment>,
    /// Whether the line ended with a forced break.
    pub forced_break: bool,
}

impl LineBox {
    /// Move the line and its fragments.
    pub fn shift(&mut self, dx: f32, dy: f32) {
        self.rect = self.rect.translate(dx, dy);
        self.baseline += dy;
        for fragment in &mut self.fragments {
            fragment.rect = fragment.rect.translate(dx, dy);
            fragment.baseline += dy;
        }
    }
}

/// Per-run data shared by the items of one text box.
#[derive(Debug, Clone)]
struct RunStyle {
    text: TextStyle,
    white_space: WhiteSpace,
    word_break: WordBreak,
    metrics: VerticalMetrics,
    space_width: f32,
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
#[derive(Debug, Clone, Copy, Default)]
struct VerticalMetrics {
    ascent: f32,
    descent: f32,
    half_leading: f32,
    font_size: f32,
}

impl VerticalMetrics {
    fn of(style: &ComputedStyle, ctx: &LayoutContext<'_>) -> Self {
        let font = style.font_spec();
        let lm = ctx.fonts.line_metrics(&font);
        let line_height = style.line_height.resolve(font.size, lm.line_height, ctx.root_font_size);
        Self {
            ascent: lm.ascent,
            descent: lm.descent,
            half_leading: (line_height - (lm.ascent + lm.descent)) / 2.0,
            font_size: font.size,
        }
    }

    /// Top of the inline box relative to its baseline.
    fn top(&self) -> f32 {
        -(self.ascent + self.half_leading)
    }

    /// Bottom of the inline box relative to its baseline.
    fn bottom(&self) -> f32 {
        self.descent + self.half_leading
    }
}

#[derive(Debug, Clone)]
enum Item {
    Word {
        text: String,
        space_before: bool,
        space_after: bool,
        source: BoxId,
        owners: Vec<BoxId>,
        run: usize,
    },
    Space {
        text: String,
        source: BoxId,
        owners: Vec<BoxId>,
        run: usize,
    },
    Break {
        source: BoxId,
        owners: Vec<BoxId>,
        run: usize,
    },
    Atomic {
        id: BoxId,
        size: (f32, f32),
        space_before: bool,
        space_after: bool,
        owners: Vec<BoxId>,
        run: usize,
    },
    Edge {
        owner: BoxId,
        open: bool,
        margin: f32,
        chrome: f32,
    },
    Float {
        path: Vec<usize>,
        side: Float,
        size: (f32, f32),
    },
    Absolute {
        path: Vec<usize>,
    },
}

/// Flattens an inline subtree into items.
struct Collector<'c, 'x> {
    ctx: &'c LayoutContext<'x>,
    cb_width: f32,
    items: Vec<Item>,
    runs: Vec<RunStyle>,
    atomic_paths: HashMap<BoxId, Vec<usize>>,
    /// Index of the last word or atomic item since the last forced break.
    last_content: Option<usize>,
    pending_space: bool,
    /// `vertical-align` of the innermost enclosing inline element that sets one.
    enclosing_align: VerticalAlign,
}

impl Collector<'_, '_> {
    fn run_for(&mut self, style: &ComputedStyle) -> usize {
        let font = style.font_spec();
        let mut text = TextStyle::from_style(style);
        if text.vertical_align == VerticalAlign::Baseline {
            text.vertical_align = self.enclosing_align;
        }
        self.runs.push(RunStyle {
            text,
            white_space: style.white_space,
            word_break: style.word_break,
            metrics: VerticalMetrics::of(style, self.ctx),
            space_width: self.ctx.fonts.text_width(" ", &font),
        });
        self.runs.len() - 1
    }

    fn collect(&mut self, parent: &mut LayoutBox, path: &mut Vec<usize>, owners: &mut Vec<BoxId>) {
        for (i, child) in parent.children.iter_mut().enumerate() {
            path.push(i);
            if child.is_absolutely_positioned() {
                self.items.push(Item::Absolute { path: path.clone() });
            } else if child.is_floated() {
                block::layout_atomic(child, self.cb_width, self.ctx);
                let margin_box = child.dimensions.margin_box();
                self.items.push(Item::Float {
                    path: path.clone(),
                    side: child.style.float,
                    size: (margin_box.width, margin_box.height),
                });
            } else {
                match &child.box_type {
                    BoxType::Text(text) => {
                        let text = text.clone();
                        let run = self.run_for(&child.style);
                        self.push_text(&text, child.id, owners, run);
                    }
                    BoxType::LineBreak => {
                        let run = self.run_for(&child.style);
                        self.items.push(Item::Break {
                            source: child.id,
                            owners: owners.clone(),
                            run,
                        });
                        self.last_content = None;
                        self.pending_space = false;
                    }
                    BoxType::Principal(_) | BoxType::Anonymous
                        if child.display == DisplayKind::Inline =>
                    {
                        block::resolve_edges(child, self.cb_width, self.ctx);
                        let dims = child.dimensions;
                        self.items.push(Item::Edge {
                            owner: child.id,
                            open: true,
                            margin: dims.margin.left,
                            chrome: dims.padding.left + dims.border.left,
                        });
                        owners.push(child.id);
                        let outer_align = self.enclosing_align;
                        if child.style.vertical_align != VerticalAlign::Baseline {
                            self.enclosing_align = child.style.vertical_align;
                        }
                        self.collect(child, path, owners);
                        self.enclosing_align = outer_align;
                        let _ = owners.pop();
                        self.items.push(Item::Edge {
                            owner: child.id,
                            open: false,
                            margin: dims.margin.right,
                            chrome: dims.padding.right + dims.border.right,
                        });
                    }
                    _ => {
                        block::layout_atomic(child, self.cb_width, self.ctx);
                        let margin_box = child.dimensions.margin_box();
                        let run = self.run_for(&child.style);
                        let _ = self.atomic_paths.insert(child.id, path.clone());
                        self.items.push(Item::Atomic {
                            id: child.id,
                            size: (margin_box.width, margin_box.height),
                            space_before: std::mem::take(&mut self.pending_space),
                            space_after: false,
                            owners: owners.clone(),
                            run,
                        });
                        self.last_content = Some(self.items.len() - 1);
                    }
                }
            }
            let _ = path.pop();
        }
    }

    /// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
    fn push_text(&mut self, text: &str, source: BoxId, owners: &[BoxId], run: usize) {
        let mode = self.runs[run].white_space;
        let mut word = String::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            let is_newline = c == '\n' || c == '\r';
            if is_newline && mode.preserves_newlines() {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    let _ = chars.next();
                }
                self.flush_word(&mut word, source, owners, run);
                self.items.push(Item::Break {
                    source,
                    owners: owners.to_vec(),
                    run,
                });
                self.last_content = None;
                self.pending_space = false;
                continue;
            }
            if !c.is_ascii_whitespace() {
                word.push(c);
                continue;
            }
            self.flush_word(&mut word, source, owners, run);
            if mode.collapses_spaces() {
                if let Some(index) = self.last_content {
                    match &mut self.items[index] {
                        Item::Word { space_after, .. } | Item::Atomic { space_after, .. } => *space_after = true,
                        _ => {}
                    }
                }
                self.pending_space = true;
            } else {
                let mut spaces = if c == '\t' { " ".repeat(TAB_SIZE) } else { " ".to_string() };
                while let Some(&next) = chars.peek() {
                    if next == ' ' || next == '\t' {
                        spaces.push_str(if next == '\t' { "        " } else { " " });
                        let _ = chars.next();
                    } else {
                        break;
                    }
                }
                self.items.push(Item::Space {
                    text: spaces,
                    source,
                    owners: owners.to_vec(),
                    run,
                });
                self.last_content = None;
                self.pending_space = false;
            }
        }
        self.flush_word(&mut word, source, owners, run);
    }

    fn flush_word(&mut self, word: &mut String, source: BoxId, owners: &[BoxId], run: usize) {
        if word.is_empty() {
            return;
        }
        self.items.push(Item::Word {
            text: std::mem::take(word),
            space_before: std::mem::take(&mut self.pending_space),
            space_after: false,
            source,
            owners: owners.to_vec(),
            run,
        });
        self.last_content = Some(self.items.len() - 1);
    }
}

#[derive(Debug, Clone)]
enum Piece {
    Content {
        fragment: Fragment,
        gap: f32,
        metrics: VerticalMetrics,
        /// Margin-box height of an atomic box.
        atomic_height: Option<f32>,
    },
    Edge {
        owner: BoxId,
        open: bool,
        x: f32,
        margin: f32,
        chrome: f32,
    },
}

impl Piece {
    fn end(&self) -> f32 {
        match self {
            Self::Content { fragment, .. } => fragment.rect.right(),
            Self::Edge { x, margin, chrome, .. } => x + margin + chrome,
        }
    }
}

/// One line under construction. `x` positions are relative to `left`.
#[derive(Debug, Default)]
struct LineState {
    y: f32,
    left: f32,
    right: f32,
    x: f32,
    pieces: Vec<Piece>,
}

impl LineState {
    fn available(&self) -> f32 {
        self.right - self.left
    }

    fn has_content(&self) -> bool {
        self.pieces.iter().any(|p| matches!(p, Piece::Content { .. }))
    }

    fn last_fragment(&self) -> Option<&Fragment> {
        self.pieces.iter().rev().find_map(|p| match p {
            Piece::Content { fragment, .. } => Some(fragment),
            Piece::Edge { .. } => None,
        })
    }
}

struct Formatter<'a, 'x> {
    ctx: &'a LayoutContext<'x>,
    floats: &'a mut FloatContext,
    runs: Vec<RunStyle>,
    extent: (f32, f32),
    strut: VerticalMetrics,
    align: TextAlign,
    rtl: bool,
    indent: f32,
    line: LineState,
    lines: Vec<LineBox>,
    /// Inline element edges per finished line.
    edges: Vec<Vec<(BoxId, Rect)>>,
    line_is_final: bool,
    pending_floats: Vec<(Vec<usize>, Float, (f32, f32))>,
    shifts: Vec<(Vec<usize>, f32, f32)>,
    statics: Vec<(Vec<usize>, (f32, f32))>,
}

impl Formatter<'_, '_> {
    fn strut_height(&self) -> f32 {
        self.strut.bottom() - self.strut.top()
    }

    fn start_line(&mut self, y: f32) {
        let (left, right) = self.floats.band(y, self.strut_height(), self.extent);
        let mut x = if self.lines.is_empty() { self.indent } else { 0.0 };
        // Only edges are ever carried into a new line.
        let mut pieces = std::mem::take(&mut self.line.pieces);
        for piece in &mut pieces {
            if let Piece::Edge { x: edge_x, margin, chrome, .. } = piece {
                *edge_x = x;
                x += *margin + *chrome;
            }
        }
        self.line = LineState {
            y,
            left,
            right,
            x,
            pieces,
        };
    }

    /// Soft wrap: end the line, carrying trailing open edges to the next.
    fn wrap(&mut self) {
        let mut carried = Vec::new();
        while let Some(Piece::Edge { open: true, .. }) = self.line.pieces.last() {
            if let Some(piece) = self.line.pieces.pop() {
                carried.push(piece);
            }
        }
        carried.reverse();
        self.finish_line(false);
        self.line.pieces.extend(carried);
        let y = self.line.y;
        self.start_line(y);
    }

    /// Move the current (empty) line below the next float bottom.
    fn drop_below_float(&mut self) -> bool {
        let narrowed = self.line.available() + EPSILON < self.extent.1 - self.extent.0;
        match self.floats.next_bottom_after(self.line.y) {
            Some(bottom) if narrowed => {
                self.start_line(bottom);
                true
            }
            _ => false,
        }
    }

    fn place_float(&mut self, path: Vec<usize>, side: Float, size: (f32, f32), y: f32) {
        let rect = self.floats.place(side, size, self.extent, y);
        self.shifts.push((path, rect.x, rect.y));
    }

    fn gap_before(&self, space_before: bool, run: usize) -> f32 {
        match self.line.last_fragment() {
            Some(prev) if prev.space_after || space_before => self.runs[run].space_width,
            _ => 0.0,
        }
    }

    fn push_content(&mut self, mut fragment: Fragment, width: f32, gap: f32, run: usize, atomic_height: Option<f32>) {
        fragment.rect = Rect::new(self.line.x + gap, 0.0, width, 0.0);
        self.line.x += gap + width;
        self.line.pieces.push(Piece::Content {
            fragment,
            gap,
            metrics: self.runs[run].metrics,
            atomic_height,
        });
    }

    fn fragment(&self, kind: FragmentKind, source: BoxId, owners: Vec<BoxId>, run: usize) -> Fragment {
        Fragment {
            kind,
            rect: Rect::default(),
            baseline: 0.0,
            space_before: false,
            space_after: false,
            source,
            owners,
            style: self.runs[run].text.clone(),
            index: 0,
        }
    }

    fn measure(&self, text: &str, run: usize) -> f32 {
        self.ctx.fonts.text_width(text, &self.runs[run].text.font)
    }

    /// Longest prefix of `text` (at least one char) that fits in `width`.
    fn split_point(&self, text: &str, run: usize, width: f32) -> usize {
        let mut end = 0;
        for (i, c) in text.char_indices() {
            let next = i + c.len_utf8();
            if end > 0 && self.measure(&text[..next], run) > width + EPSILON {
                break;
            }
            end = next;
        }
        end
    }

    fn place_item(&mut self, item: Item) {
        match item {
            Item::Word {
                text,
                space_before,
                space_after,
                source,
                owners,
                run,
            } => self.place_word(text, space_before, space_after, source, owners, run),
            Item::Space { text, source, owners, run } => {
                let width = self.measure(&text, run);
                let wraps = self.runs[run].white_space.wraps();
                if wraps && self.line.x + width > self.line.available() + EPSILON && self.line.has_content() {
                    // Preserved spaces at a wrap point hang; the next line starts clean.
                    self.wrap();
                    return;
                }
                let fragment = self.fragment(FragmentKind::Whitespace(text), source, owners, run);
                self.push_content(fragment, width, 0.0, run, None);
            }
            Item::Break { source, owners, run } => {
                let fragment = self.fragment(FragmentKind::LineBreak, source, owners, run);
                self.push_content(fragment, 0.0, 0.0, run, None);
                self.finish_line(true);
            }
            Item::Atomic {
                id,
                size,
                space_before,
                space_after,
                owners,
                run,
            } => {
                let mut gap = self.gap_before(space_before, run);
                let wraps = self.runs[run].white_space.wraps();
                if wraps
                    && self.line.has_content()
                    && self.line.x + gap + size.0 > self.line.available() + EPSILON
                {
                    self.wrap();
                    gap = 0.0;
                }
                while !self.line.has_content() && size.0 > self.line.available() + EPSILON {
                    if !self.drop_below_float() {
                        break;
                    }
                }
                let mut fragment = self.fragment(FragmentKind::Atomic(id), id, owners, run);
                fragment.space_before = space_before;
                fragment.space_after = space_after;
                self.push_content(fragment, size.0, gap, run, Some(size.1));
            }
            Item::Edge { owner, open, margin, chrome } => {
                self.line.pieces.push(Piece::Edge {
                    owner,
                    open,
                    x: self.line.x,
                    margin,
                    chrome,
                });
                self.line.x += margin + chrome;
            }
            Item::Float { path, side, size } => {
                if self.line.has_content() {
                    self.pending_floats.push((path, side, size));
                } else {
                    self.place_float(path, side, size, self.line.y);
                    let (left, right) = self.floats.band(self.line.y, self.strut_height(), self.extent);
                    self.line.left = left;
                    self.line.right = right;
                }
            }
            Item::Absolute { path } => {
                let x = self.line.left + self.line.x;
                self.statics.push((path, (x, self.line.y)));
            }
        }
    }

    fn place_word(
        &mut self,
        text: String,
        space_before: bool,
        space_after: bool,
        source: BoxId,
        owners: Vec<BoxId>,
        run: usize,
    ) {
        let wraps = self.runs[run].white_space.wraps();
        let word_break = self.runs[run].word_break;
        let mut rest = text;
        let mut first = true;
        loop {
            let width = self.measure(&rest, run);
            let mut gap = if first { self.gap_before(space_before, run) } else { 0.0 };
            let remaining = self.line.available() - self.line.x - gap;

            if wraps && width > remaining + EPSILON && self.line.has_content() {
                // break-all fills the current line before wrapping.
                if word_break == WordBreak::BreakAll {
                    let end = self.split_point(&rest, run, remaining);
                    if end < rest.len() && self.measure(&rest[..end], run) <= remaining + EPSILON {
                        let head = rest[..end].to_string();
                        let head_width = self.measure(&head, run);
                        let mut fragment = self.fragment(FragmentKind::Word(head), source, owners.clone(), run);
                        fragment.space_before = first && space_before;
                        self.push_content(fragment, head_width, gap, run, None);
                        rest = rest[end..].to_string();
                        first = false;
                        self.wrap();
                        continue;
                    }
                }
                self.wrap();
                gap = 0.0;
            }

            if wraps && !self.line.has_content() {
                while width > self.line.available() - self.line.x + EPSILON {
                    if !self.drop_below_float() {
                        break;
                    }
                }
            }

            let fits = width <= self.line.available() - self.line.x - gap + EPSILON;
            if wraps && !fits && word_break != WordBreak::Normal {
                let end = self.split_point(&rest, run, self.line.available() - self.line.x - gap);
                if end < rest.len() {
                    let head = rest[..end].to_string();
                    let head_width = self.measure(&head, run);
                    let mut fragment = self.fragment(FragmentKind::Word(head), source, owners.clone(), run);
                    fragment.space_before = first && space_before;
                    self.push_content(fragment, head_width, gap, run, None);
                    rest = rest[end..].to_string();
                    first = false;
                    self.wrap();
                    continue;
                }
            }

            let mut fragment = self.fragment(FragmentKind::Word(rest), source, owners, run);
            fragment.space_before = first && space_before;
            fragment.space_after = space_after;
            self.push_content(fragment, width, gap, run, None);
            return;
        }
    }

    /// Close the current line: vertical alignment, then horizontal.
    fn finish_line(&mut self, forced_break: bool) {
        if !self.line.has_content() {
            // Only edges of empty inline elements: no line box.
            return;
        }
        let line = std::mem::take(&mut self.line);

        // STEP 1: baseline shifts and line extent.
        // [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
        let strut = self.strut;
        let shift_of = |metrics: &VerticalMetrics, align: VerticalAlign, atomic: Option<f32>| -> f32 {
            match (align, atomic) {
                (VerticalAlign::Sub, _) => SUB_OFFSET * metrics.font_size,
                (VerticalAlign::Super, _) => -SUPER_OFFSET * metrics.font_size,
                (VerticalAlign::Middle, Some(h)) => -0.25 * strut.font_size + h / 2.0,
                (VerticalAlign::Middle, None) => -0.25 * strut.font_size - (metrics.descent - metrics.ascent) / 2.0,
                (VerticalAlign::TextTop, Some(h)) => -strut.ascent + h,
                (VerticalAlign::TextTop, None) => -strut.ascent + metrics.ascent,
                (VerticalAlign::TextBottom, Some(_)) => strut.descent,
                (VerticalAlign::TextBottom, None) => strut.descent - metrics.descent,
                _ => 0.0,
            }
        };
        let extent_of = |metrics: &VerticalMetrics, atomic: Option<f32>, shift: f32| match atomic {
            Some(h) => (shift - h, shift),
            None => (shift + metrics.top(), shift + metrics.bottom()),
        };

        let mut top = strut.top();
        let mut bottom = strut.bottom();
        let mut edge_aligned_height: f32 = 0.0;
        for piece in &line.pieces {
            if let Piece::Content { fragment, metrics, atomic_height, .. } = piece {
                let align = fragment.style.vertical_align;
                let (t, b) = extent_of(metrics, *atomic_height, shift_of(metrics, align, *atomic_height));
                if matches!(align, VerticalAlign::Top | VerticalAlign::Bottom) {
                    edge_aligned_height = edge_aligned_height.max(b - t);
                } else {
                    top = top.min(t);
                    bottom = bottom.max(b);
                }
            }
        }
        if bottom - top < edge_aligned_height {
            bottom = top + edge_aligned_height;
        }
        let height = bottom - top;
        let baseline = line.y - top;

        // STEP 2: horizontal alignment.
        // [§ 16.2 Alignment](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
        let available = line.available();
        let used = line
            .pieces
            .iter()
            .rev()
            .find(|p| match p {
                Piece::Content { fragment, .. } => !matches!(
                    fragment.kind,
                    FragmentKind::Whitespace(_) | FragmentKind::LineBreak
                ),
                Piece::Edge { .. } => true,
            })
            .map_or(0.0, Piece::end);
        let extra = available - used;
        let is_last = forced_break || self.line_is_final;
        let align = match (self.align, self.rtl) {
            (TextAlign::Left, true) => TextAlign::Right,
            (TextAlign::Right, true) => TextAlign::Left,
            (align, _) => align,
        };
        let gaps = line
            .pieces
            .iter()
            .filter(|p| matches!(p, Piece::Content { gap, .. } if *gap > 0.0))
            .count();
        let (offset, per_gap) = match align {
            TextAlign::Right => (extra, 0.0),
            TextAlign::Center => (extra / 2.0, 0.0),
            TextAlign::Justify if !is_last && gaps > 0 && extra > 0.0 => (0.0, extra / gaps as f32),
            TextAlign::Left | TextAlign::Justify => (0.0, 0.0),
        };
        let offset = if matches!(align, TextAlign::Right | TextAlign::Center) {
            offset.max(0.0)
        } else {
            offset
        };

        let place_x = |x: f32, width: f32| {
            let absolute = line.left + x;
            if self.rtl {
                line.left + line.right - (absolute + width)
            } else {
                absolute
            }
        };

        let mut fragments = Vec::new();
        let mut edges: Vec<(BoxId, Rect)> = Vec::new();
        let mut justify_shift = 0.0;
        for piece in line.pieces {
            match piece {
                Piece::Content {
                    mut fragment,
                    gap,
                    metrics,
                    atomic_height,
                } => {
                    if gap > 0.0 {
                        justify_shift += per_gap;
                    }
                    let x = place_x(fragment.rect.x + offset + justify_shift, fragment.rect.width);
                    let align = fragment.style.vertical_align;
                    let shift = match (align, atomic_height) {
                        (VerticalAlign::Top, Some(h)) => top + h,
                        (VerticalAlign::Top, None) => top - metrics.top(),
                        (VerticalAlign::Bottom, Some(_)) => bottom,
                        (VerticalAlign::Bottom, None) => bottom - metrics.bottom(),
                        _ => shift_of(&metrics, align, atomic_height),
                    };
                    fragment.baseline = baseline + shift;
                    fragment.rect = match atomic_height {
                        Some(h) => Rect::new(x, fragment.baseline - h, fragment.rect.width, h),
                        None => Rect::new(
                            x,
                            fragment.baseline - metrics.ascent,
                            fragment.rect.width,
                            metrics.ascent + metrics.descent,
                        ),
                    };
                    fragments.push(fragment);
                }
                Piece::Edge { owner, open, x, margin, chrome } => {
                    let ink_x = if open { x + margin } else { x };
                    let rx = place_x(ink_x + offset + justify_shift, chrome);
                    edges.push((owner, Rect::new(rx, baseline, chrome, 0.0)));
                }
            }
        }
        if self.rtl {
            fragments.reverse();
        }

        self.edges.push(edges);
        self.lines.push(LineBox {
            rect: Rect::new(line.left, line.y, available, height),
            baseline,
            fragments,
            forced_break,
        });

        let next_y = line.y + height;
        for (path, side, size) in std::mem::take(&mut self.pending_floats) {
            self.place_float(path, side, size, next_y);
        }
        self.start_line(next_y);
    }
}

/// Lay out the inline content of `container`, whose content box position
/// and width are already set. Writes `container.lines` and positions every
/// atomic child, float and text box inside.
///
/// Returns the height of the lines; floats are excluded.
pub fn layout_inline_content(container: &mut LayoutBox, floats: &mut FloatContext, ctx: &LayoutContext<'_>) -> f32 {
    let content = container.dimensions.content;
    let lengths = ctx.lengths(&container.style);

    let mut collector = Collector {
        ctx,
        cb_width: content.width,
        items: Vec::new(),
        runs: Vec::new(),
        atomic_paths: HashMap::new(),
        last_content: None,
        pending_space: false,
        enclosing_align: VerticalAlign::Baseline,
    };
    collector.collect(container, &mut Vec::new(), &mut Vec::new());
    let Collector {
        items,
        runs,
        atomic_paths,
        ..
    } = collector;

    let mut formatter = Formatter {
        ctx,
        floats,
        runs,
        extent: (content.x, content.right()),
        strut: VerticalMetrics::of(&container.style, ctx),
        align: container.style.used_text_align(),
        rtl: container.style.direction == Direction::Rtl,
        indent: container.style.text_indent.to_px(content.width, &lengths),
        line: LineState::default(),
        lines: Vec::new(),
        edges: Vec::new(),
        line_is_final: false,
        pending_floats: Vec::new(),
        shifts: Vec::new(),
        statics: Vec::new(),
    };
    formatter.start_line(content.y);
    for item in items {
        formatter.place_item(item);
    }
    formatter.line_is_final = true;
    if formatter.line.has_content() {
        formatter.finish_line(false);
    }
    let trailing_y = formatter.line.y;
    for (path, side, size) in std::mem::take(&mut formatter.pending_floats) {
        formatter.place_float(path, side, size, trailing_y);
    }

    let Formatter {
        lines,
        edges,
        shifts,
        statics,
        ..
    } = formatter;

    // STEP 3: move atomic boxes and floats to their final positions.
    for line in &lines {
        for fragment in &line.fragments {
            if let FragmentKind::Atomic(id) = fragment.kind
                && let Some(child) = atomic_paths.get(&id).and_then(|p| box_at_mut(container, p))
            {
                let origin = child.dimensions.margin_box();
                child.shift(fragment.rect.x - origin.x, fragment.rect.y - origin.y);
            }
        }
    }
    for (path, x, y) in shifts {
        if let Some(child) = box_at_mut(container, &path) {
            let origin = child.dimensions.margin_box();
            child.shift(x - origin.x, y - origin.y);
        }
    }
    for (path, position) in statics {
        if let Some(child) = box_at_mut(container, &path) {
            child.static_position = position;
        }
    }

    // STEP 4: geometry of inline elements and text boxes.
    let mut owned: HashMap<BoxId, Vec<Rect>> = HashMap::new();
    let mut sources: HashMap<BoxId, Rect> = HashMap::new();
    for (line, line_edges) in lines.iter().zip(&edges) {
        let mut per_line: HashMap<BoxId, Rect> = HashMap::new();
        for fragment in &line.fragments {
            let _ = sources
                .entry(fragment.source)
                .and_modify(|r| *r = r.union(&fragment.rect))
                .or_insert(fragment.rect);
            for owner in &fragment.owners {
                let _ = per_line
                    .entry(*owner)
                    .and_modify(|r| *r = r.union(&fragment.rect))
                    .or_insert(fragment.rect);
            }
        }
        for (owner, rect) in line_edges {
            let _ = per_line
                .entry(*owner)
                .and_modify(|r| *r = r.union(rect))
                .or_insert(*rect);
        }
        let mut ordered: Vec<(BoxId, Rect)> = per_line.into_iter().collect();
        ordered.sort_by_key(|(id, _)| *id);
        for (owner, rect) in ordered {
            owned.entry(owner).or_default().push(rect);
        }
    }
    assign_inline_geometry(container, &owned, &sources);

    let height = lines.last().map_or(0.0, |line| line.rect.bottom() - content.y);
    log::trace!("inline layout: {} lines, height {height:.1}", lines.len());
    container.lines = lines;
    height
}

fn assign_inline_geometry(parent: &mut LayoutBox, owned: &HashMap<BoxId, Vec<Rect>>, sources: &HashMap<BoxId, Rect>) {
    for child in &mut parent.children {
        if child.is_out_of_flow() {
            continue;
        }
        match child.box_type {
            BoxType::Text(_) | BoxType::LineBreak => {
                if let Some(rect) = sources.get(&child.id) {
                    child.dimensions.content = *rect;
                }
            }
            BoxType::Principal(_) | BoxType::Anonymous if child.display == DisplayKind::Inline => {
                let chrome = EdgeSizes {
                    top: child.dimensions.padding.top + child.dimensions.border.top,
                    bottom: child.dimensions.padding.bottom + child.dimensions.border.bottom,
                    left: 0.0,
                    right: 0.0,
                };
                let rects: Vec<Rect> = owned
                    .get(&child.id)
                    .map(|rects| rects.iter().map(|r| r.expand(&chrome)).collect())
                    .unwrap_or_default();
                if let Some(union) = rects.iter().copied().reduce(|a, b| a.union(&b)) {
                    let inner = EdgeSizes {
                        top: child.dimensions.padding.top + child.dimensions.border.top,
                        bottom: child.dimensions.padding.bottom + child.dimensions.border.bottom,
                        left: child.dimensions.padding.left + child.dimensions.border.left,
                        right: child.dimensions.padding.right + child.dimensions.border.right,
                    };
                    child.dimensions.content = union.shrink(&inner);
                }
                child.line_rects = rects;
                assign_inline_geometry(child, owned, sources);
            }
            _ => {}
        }
    }
}

/// The descendant of `root` at `path` (child indices).
pub(crate) fn box_at_mut<'b>(root: &'b mut LayoutBox, path: &[usize]) -> Option<&'b mut LayoutBox> {
    let mut current = root;
    for &i in path {
        current = current.children.get_mut(i)?;
    }
    Some(current)
}
