//! Intrinsic (preferred) widths.
//!
//! [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
//!
//! "Calculate the preferred width by formatting the content without
//! breaking lines other than where explicit line breaks occur, and also
//! calculate the preferred minimum width, e.g., by trying all possible line
//! breaks."
//!
//! Used by shrink-to-fit widths and by the table column algorithm.

use crate::style::values::{AutoLength, BorderSide, DisplayKind, LengthValue, WordBreak};

use super::LayoutContext;
use super::block::{self, ContainingBlock};
use super::layout_box::{BoxType, LayoutBox};
use super::table;

/// Nesting depth after which intrinsic sizing gives up and reports zero.
const MAX_DEPTH: usize = 64;

/// `(min-content, max-content)` width of `b`'s content box.
#[must_use]
pub fn content_widths(b: &LayoutBox, ctx: &LayoutContext<'_>) -> (f32, f32) {
    content_widths_at(b, ctx, 0)
}

/// `(min-content, max-content)` width of `b`'s margin box; the natural
/// width of a document is the second value for its root box.
#[must_use]
pub fn margin_box_widths(b: &LayoutBox, ctx: &LayoutContext<'_>) -> (f32, f32) {
    outer_widths(b, ctx, 0)
}

pub(crate) fn content_widths_at(b: &LayoutBox, ctx: &LayoutContext<'_>, depth: usize) -> (f32, f32) {
    if depth > MAX_DEPTH {
        let _ = ctx.warnings.warn_once("Layout", "box nesting too deep for intrinsic sizing");
        return (0.0, 0.0);
    }
    if b.display == DisplayKind::Table {
        return table::intrinsic_widths(b, ctx, depth);
    }
    if let BoxType::Replaced { .. } = b.box_type {
        let (w, _) = block::replaced_size(b, &unsized_cb(), ctx);
        return (w, w);
    }
    if b.has_inline_content() {
        let mut acc = InlineWidths::default();
        acc.walk(b, ctx, depth);
        acc.finish();
        return (acc.min, acc.max);
    }
    b.children
        .iter()
        .filter(|c| !c.is_absolutely_positioned())
        .map(|c| outer_widths(c, ctx, depth + 1))
        .fold((0.0_f32, 0.0_f32), |(min, max), (cmin, cmax)| (min.max(cmin), max.max(cmax)))
}

/// `(min, max)` margin-box widths of `b`. Percentages count as zero.
pub(crate) fn outer_widths(b: &LayoutBox, ctx: &LayoutContext<'_>, depth: usize) -> (f32, f32) {
    let lengths = ctx.lengths(&b.style);
    let fixed = |len: &LengthValue| if len.is_percent() { 0.0 } else { len.to_px(0.0, &lengths) };
    let style = &b.style;
    let border = |side: &BorderSide| {
        if side.style.is_none() { 0.0 } else { fixed(&side.width) }
    };
    let margin = |m: &AutoLength| match m {
        AutoLength::Length(len) => fixed(len),
        AutoLength::Auto => 0.0,
    };
    let chrome = fixed(&style.padding.left)
        + fixed(&style.padding.right)
        + border(&style.border.left)
        + border(&style.border.right);
    let margins = margin(&style.margin.left) + margin(&style.margin.right);

    let specified = match style.width {
        AutoLength::Length(len) if !len.is_percent() && !matches!(b.box_type, BoxType::Replaced { .. }) => {
            let w = len.to_px(0.0, &lengths);
            Some(if style.box_sizing_border_box { (w - chrome).max(0.0) } else { w })
        }
        _ => None,
    };
    let (mut min, mut max) = specified.map_or_else(|| content_widths_at(b, ctx, depth), |w| (w, w));
    if let Some(limit) = style.max_width.filter(|l| !l.is_percent()) {
        let limit = limit.to_px(0.0, &lengths);
        min = min.min(limit);
        max = max.min(limit);
    }
    if !style.min_width.is_percent() {
        let floor = style.min_width.to_px(0.0, &lengths);
        min = min.max(floor);
        max = max.max(floor);
    }
    (min + chrome + margins, max.max(min) + chrome + margins)
}

fn unsized_cb() -> ContainingBlock {
    ContainingBlock {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: None,
    }
}

/// Running min/max-content widths over an inline subtree.
#[derive(Debug, Default)]
struct InlineWidths {
    min: f32,
    max: f32,
    /// Width of the current unbreakable run.
    word: f32,
    /// Width of the current line when nothing wraps.
    line: f32,
}

impl InlineWidths {
    fn end_word(&mut self) {
        self.min = self.min.max(self.word);
        self.word = 0.0;
    }

    fn end_line(&mut self) {
        self.end_word();
        self.max = self.max.max(self.line);
        self.line = 0.0;
    }

    fn finish(&mut self) {
        self.end_line();
    }

    /// Width that never breaks: counts toward both the word and the line.
    fn add_glued(&mut self, width: f32) {
        self.word += width;
        self.line += width;
    }

    fn walk(&mut self, parent: &LayoutBox, ctx: &LayoutContext<'_>, depth: usize) {
        for child in &parent.children {
            if child.is_absolutely_positioned() {
                continue;
            }
            if child.is_floated() {
                let (min, max) = outer_widths(child, ctx, depth + 1);
                self.min = self.min.max(min);
                self.line += max;
                continue;
            }
            match &child.box_type {
                BoxType::Text(text) => self.add_text(text, child, ctx),
                BoxType::LineBreak => self.end_line(),
                BoxType::Principal(_) | BoxType::Anonymous if child.display == DisplayKind::Inline => {
                    let (left, right) = inline_edges(child, ctx);
                    self.add_glued(left);
                    self.walk(child, ctx, depth + 1);
                    self.add_glued(right);
                }
                _ => {
                    let (min, max) = outer_widths(child, ctx, depth + 1);
                    self.end_word();
                    self.min = self.min.max(min);
                    self.line += max;
                }
            }
        }
    }

    fn add_text(&mut self, text: &str, b: &LayoutBox, ctx: &LayoutContext<'_>) {
        let font = b.style.font_spec();
        let mode = b.style.white_space;
        let space = ctx.fonts.text_width(" ", &font);
        let measure = |s: &str| ctx.fonts.text_width(s, &font);

        if !mode.collapses_spaces() {
            // pre / pre-wrap: keep the source lines.
            for (i, segment) in text.split('\n').enumerate() {
                if i > 0 {
                    self.end_line();
                }
                let expanded = segment.replace('\t', "        ");
                let width = measure(&expanded);
                if mode.wraps() {
                    for word in expanded.split(' ').filter(|w| !w.is_empty()) {
                        self.min = self.min.max(measure(word));
                    }
                    self.line += width;
                } else {
                    self.add_glued(width);
                }
            }
            return;
        }

        let starts_with_space = text.starts_with(|c: char| c.is_ascii_whitespace());
        let mut first = true;
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 && mode.preserves_newlines() {
                self.end_line();
                first = true;
            }
            for word in segment.split(|c: char| c.is_ascii_whitespace()).filter(|w| !w.is_empty()) {
                let breakable = mode.wraps();
                if (!first || starts_with_space) && self.line > 0.0 {
                    if breakable {
                        self.end_word();
                        self.line += space;
                    } else {
                        self.add_glued(space);
                    }
                }
                let width = measure(word);
                if breakable && b.style.word_break != WordBreak::Normal {
                    let widest = word.chars().map(|c| measure(c.encode_utf8(&mut [0; 4]))).fold(0.0, f32::max);
                    self.min = self.min.max(widest);
                    self.line += width;
                } else {
                    self.add_glued(width);
                }
                first = false;
            }
        }
        if text.ends_with(|c: char| c.is_ascii_whitespace()) && mode.wraps() {
            self.end_word();
        }
    }
}

/// Start and end inline edges of an inline element: margin, border and padding.
fn inline_edges(b: &LayoutBox, ctx: &LayoutContext<'_>) -> (f32, f32) {
    let lengths = ctx.lengths(&b.style);
    let px = |len: &LengthValue| if len.is_percent() { 0.0 } else { len.to_px(0.0, &lengths) };
    let border = |side: &BorderSide| {
        if side.style.is_none() { 0.0 } else { px(&side.width) }
    };
    let margin = |m: &AutoLength| match m {
        AutoLength::Length(len) => px(len),
        AutoLength::Auto => 0.0,
    };
    let s = &b.style;
    (
        margin(&s.margin.left) + border(&s.border.left) + px(&s.padding.left),
        margin(&s.margin.right) + border(&s.border.right) + px(&s.padding.right),
    )
}
