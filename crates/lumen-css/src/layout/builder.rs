//! Box tree construction.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//! and [§ 17.2.1 Anonymous table objects](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes).
//!
//! One box per rendered element, one per text node, plus the anonymous
//! boxes CSS requires. `display: none` subtrees produce nothing.

use std::collections::HashMap;

use lumen_common::WarningLog;
use lumen_dom::{DomTree, NodeId, NodeType};

use crate::cascade::StyleMap;
use crate::style::ComputedStyle;
use crate::style::values::{DisplayKind, ListStyleType};

use super::layout_box::{BoxId, BoxType, LayoutBox, ListMarker};

/// Largest accepted `colspan`/`rowspan`, as in HTML.
const MAX_SPAN: usize = 1000;

/// Element nesting depth past which descendants are flattened into their
/// text content.
pub const MAX_BOX_DEPTH: usize = 64;

/// Builds a box tree from a styled DOM.
pub struct BoxTreeBuilder<'a> {
    tree: &'a DomTree,
    styles: &'a StyleMap,
    warnings: &'a WarningLog,
    next_id: usize,
}

/// Build the box tree for `tree`. The root box is the document element's;
/// a document with nothing to render yields an empty anonymous block.
#[must_use]
pub fn build_box_tree(tree: &DomTree, styles: &StyleMap, base: &ComputedStyle, warnings: &WarningLog) -> LayoutBox {
    let mut builder = BoxTreeBuilder {
        tree,
        styles,
        warnings,
        next_id: 0,
    };
    let mut root = tree
        .document_element()
        .and_then(|html| builder.build_element(html, base, None, 0))
        .unwrap_or_else(|| {
            let id = builder.alloc();
            LayoutBox::new(id, BoxType::Anonymous, base.clone(), DisplayKind::Block)
        });
    // The root box is always a block container.
    if !root.display.is_block_level() {
        root.display = DisplayKind::Block;
        builder.fix_children(&mut root);
    }
    builder.insert_spacing_boxes(&mut root);
    log::debug!("box tree built: {} boxes", root.count());
    root
}

impl BoxTreeBuilder<'_> {
    fn alloc(&mut self) -> BoxId {
        let id = BoxId(self.next_id);
        self.next_id += 1;
        id
    }

    fn anonymous(&mut self, parent_style: &ComputedStyle, display: DisplayKind, children: Vec<LayoutBox>) -> LayoutBox {
        let id = self.alloc();
        let mut style = ComputedStyle::inherit_from(parent_style);
        style.display = display;
        let mut anon = LayoutBox::new(id, BoxType::Anonymous, style, display);
        anon.children = children;
        anon
    }

    fn build_element(
        &mut self,
        node: NodeId,
        parent_style: &ComputedStyle,
        ordinal: Option<usize>,
        depth: usize,
    ) -> Option<LayoutBox> {
        let element = self.tree.as_element(node)?;
        let style = self
            .styles
            .get(&node)
            .cloned()
            .unwrap_or_else(|| ComputedStyle::inherit_from(parent_style));
        if style.display == DisplayKind::None {
            return None;
        }
        let display = style.display;
        let id = self.alloc();
        let box_type = match element.tag_name.as_str() {
            "br" => BoxType::LineBreak,
            "img" => BoxType::Replaced {
                node,
                src: element.attr("src").map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            },
            _ => BoxType::Principal(node),
        };
        let is_leaf = !matches!(box_type, BoxType::Principal(_));
        let mut layout_box = LayoutBox::new(id, box_type, style, display);

        if display == DisplayKind::TableCell {
            layout_box.colspan = span_attr(element.attr("colspan"), 1);
            // 0 means "to the end of the table"; clamped later.
            layout_box.rowspan = span_attr(element.attr("rowspan"), 1);
            if element.attr("rowspan").is_some_and(|v| v.trim() == "0") {
                layout_box.rowspan = MAX_SPAN;
            }
        }
        if display == DisplayKind::ListItem {
            layout_box.marker = list_marker(layout_box.style.list_style_type, ordinal.unwrap_or(1));
        }
        if is_leaf {
            return Some(layout_box);
        }
        if depth >= MAX_BOX_DEPTH {
            let message = format!("elements nested deeper than {MAX_BOX_DEPTH} levels are flattened to text");
            let _ = self.warnings.warn_once("Layout", &message);
            let text = self.tree.text_content(node);
            if !text.is_empty() {
                let child = self.text_box(&layout_box.style, text);
                layout_box.children.push(child);
            }
            return Some(layout_box);
        }

        // [§ 12.4 Automatic counters](https://www.w3.org/TR/CSS2/generate.html#counters)
        // List items count from the list's `start`, or from their own `value`.
        let mut counter = element
            .attr("start")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1);
        for &child in self.tree.children(node) {
            let Some(child_node) = self.tree.get(child) else { continue };
            match &child_node.node_type {
                NodeType::Element(child_el) => {
                    let is_item = self
                        .styles
                        .get(&child)
                        .is_some_and(|s| s.display == DisplayKind::ListItem);
                    if is_item && let Some(value) = child_el.attr("value").and_then(|v| v.trim().parse().ok()) {
                        counter = value;
                    }
                    let ordinal = is_item.then_some(counter);
                    if let Some(child_box) = self.build_element(child, &layout_box.style, ordinal, depth + 1) {
                        layout_box.children.push(child_box);
                    }
                    if is_item {
                        counter += 1;
                    }
                }
                NodeType::Text(text) if !text.is_empty() => {
                    let text_box = self.text_box(&layout_box.style, text.clone());
                    layout_box.children.push(text_box);
                }
                _ => {}
            }
        }

        // [§ 9.2.1.1](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
        // An inline containing block-level boxes is treated as a block.
        if layout_box.display == DisplayKind::Inline && layout_box.children.iter().any(LayoutBox::is_block_level) {
            layout_box.display = DisplayKind::Block;
        }
        self.fix_children(&mut layout_box);
        Some(layout_box)
    }

    fn text_box(&mut self, parent_style: &ComputedStyle, text: String) -> LayoutBox {
        let id = self.alloc();
        let mut style = ComputedStyle::inherit_from(parent_style);
        style.display = DisplayKind::Inline;
        LayoutBox::new(id, BoxType::Text(text), style, DisplayKind::Inline)
    }

    /// Apply the anonymous box rules to `parent`'s children.
    fn fix_children(&mut self, parent: &mut LayoutBox) {
        let children = std::mem::take(&mut parent.children);
        let style = parent.style.clone();
        parent.children = match parent.display {
            DisplayKind::Table => self.fix_table_children(&style, children, DisplayKind::Table),
            DisplayKind::TableRowGroup => self.fix_table_children(&style, children, DisplayKind::TableRowGroup),
            DisplayKind::TableRow => self.fix_row_children(&style, children),
            _ => {
                let wrapped = self.wrap_misparented_table_parts(&style, children);
                if parent.display.is_block_level() || parent.display == DisplayKind::InlineBlock {
                    self.wrap_inline_runs(&style, wrapped)
                } else {
                    wrapped
                }
            }
        };
    }

    /// [§ 17.2.1](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes) rules 1 and 2:
    /// whitespace is dropped, stray cells get a row, other content a row and a cell.
    fn fix_table_children(&mut self, style: &ComputedStyle, children: Vec<LayoutBox>, kind: DisplayKind) -> Vec<LayoutBox> {
        let mut out = Vec::new();
        let mut cells: Vec<LayoutBox> = Vec::new();
        let mut content: Vec<LayoutBox> = Vec::new();
        for child in children {
            if is_whitespace_text(&child) {
                continue;
            }
            match child.display {
                DisplayKind::TableRow => {
                    self.flush_cells(style, &mut cells, &mut out);
                    self.flush_content(style, &mut content, &mut out);
                    out.push(child);
                }
                DisplayKind::TableRowGroup if kind == DisplayKind::Table => {
                    self.flush_cells(style, &mut cells, &mut out);
                    self.flush_content(style, &mut content, &mut out);
                    out.push(child);
                }
                DisplayKind::TableCell => {
                    self.flush_content(style, &mut content, &mut out);
                    cells.push(child);
                }
                _ => {
                    self.flush_cells(style, &mut cells, &mut out);
                    content.push(child);
                }
            }
        }
        self.flush_cells(style, &mut cells, &mut out);
        self.flush_content(style, &mut content, &mut out);
        out
    }

    fn fix_row_children(&mut self, style: &ComputedStyle, children: Vec<LayoutBox>) -> Vec<LayoutBox> {
        let mut out = Vec::new();
        let mut content: Vec<LayoutBox> = Vec::new();
        for child in children {
            if is_whitespace_text(&child) {
                continue;
            }
            if child.display == DisplayKind::TableCell {
                if !content.is_empty() {
                    let cell = self.anonymous_cell(style, std::mem::take(&mut content));
                    out.push(cell);
                }
                out.push(child);
            } else {
                content.push(child);
            }
        }
        if !content.is_empty() {
            out.push(self.anonymous_cell(style, content));
        }
        out
    }

    fn anonymous_cell(&mut self, style: &ComputedStyle, content: Vec<LayoutBox>) -> LayoutBox {
        let mut cell = self.anonymous(style, DisplayKind::TableCell, content);
        self.fix_children(&mut cell);
        cell
    }

    fn flush_cells(&mut self, style: &ComputedStyle, cells: &mut Vec<LayoutBox>, out: &mut Vec<LayoutBox>) {
        if !cells.is_empty() {
            out.push(self.anonymous(style, DisplayKind::TableRow, std::mem::take(cells)));
        }
    }

    fn flush_content(&mut self, style: &ComputedStyle, content: &mut Vec<LayoutBox>, out: &mut Vec<LayoutBox>) {
        if !content.is_empty() {
            let cell = self.anonymous_cell(style, std::mem::take(content));
            out.push(self.anonymous(style, DisplayKind::TableRow, vec![cell]));
        }
    }

    /// [§ 17.2.1](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes) rule 3:
    /// cells outside a row get an anonymous row, rows outside a table an
    /// anonymous table.
    fn wrap_misparented_table_parts(&mut self, style: &ComputedStyle, children: Vec<LayoutBox>) -> Vec<LayoutBox> {
        let mut rows_wrapped = Vec::new();
        let mut cells = Vec::new();
        for child in children {
            if child.display == DisplayKind::TableCell {
                cells.push(child);
            } else if !cells.is_empty() && is_whitespace_text(&child) {
                // Whitespace between cells belongs to the row.
            } else {
                self.flush_cells(style, &mut cells, &mut rows_wrapped);
                rows_wrapped.push(child);
            }
        }
        self.flush_cells(style, &mut cells, &mut rows_wrapped);

        let mut out = Vec::new();
        let mut rows: Vec<LayoutBox> = Vec::new();
        for child in rows_wrapped {
            if matches!(child.display, DisplayKind::TableRow | DisplayKind::TableRowGroup) {
                rows.push(child);
            } else if !rows.is_empty() && is_whitespace_text(&child) {
            } else {
                if !rows.is_empty() {
                    out.push(self.anonymous(style, DisplayKind::Table, std::mem::take(&mut rows)));
                }
                out.push(child);
            }
        }
        if !rows.is_empty() {
            out.push(self.anonymous(style, DisplayKind::Table, rows));
        }
        out
    }

    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// "If a block container box has a block-level box inside it, then we
    /// force it to have only block-level boxes inside it." Runs of inline
    /// content become anonymous blocks; runs of collapsible whitespace are
    /// dropped.
    fn wrap_inline_runs(&mut self, style: &ComputedStyle, children: Vec<LayoutBox>) -> Vec<LayoutBox> {
        if !children.iter().any(LayoutBox::is_block_level) {
            return children;
        }
        let mut out = Vec::new();
        let mut run: Vec<LayoutBox> = Vec::new();
        for child in children {
            if child.is_inline_level() {
                run.push(child);
            } else {
                self.flush_inline_run(style, &mut run, &mut out);
                out.push(child);
            }
        }
        self.flush_inline_run(style, &mut run, &mut out);
        out
    }

    fn flush_inline_run(&mut self, style: &ComputedStyle, run: &mut Vec<LayoutBox>, out: &mut Vec<LayoutBox>) {
        if run.is_empty() {
            return;
        }
        let content = std::mem::take(run);
        if content.iter().all(is_whitespace_text) {
            return;
        }
        out.push(self.anonymous(style, DisplayKind::Block, content));
    }

    /// Assign grid columns to cells and insert one spacing box into every
    /// later row a `rowspan` cell covers, for every table in the subtree.
    fn insert_spacing_boxes(&mut self, root: &mut LayoutBox) {
        if root.display == DisplayKind::Table {
            self.place_table_cells(root);
        }
        for child in &mut root.children {
            self.insert_spacing_boxes(child);
        }
    }

    fn place_table_cells(&mut self, table: &mut LayoutBox) {
        let mut rows: Vec<&mut LayoutBox> = Vec::new();
        for child in &mut table.children {
            match child.display {
                DisplayKind::TableRow => rows.push(child),
                DisplayKind::TableRowGroup => rows.extend(
                    child
                        .children
                        .iter_mut()
                        .filter(|r| r.display == DisplayKind::TableRow),
                ),
                _ => {}
            }
        }
        let row_count = rows.len();

        // (cell, column, colspan, start_row, end_row)
        let mut spans: Vec<(BoxId, usize, usize, usize, usize)> = Vec::new();
        for (r, row) in rows.iter_mut().enumerate() {
            let occupied = |col: usize, spans: &[(BoxId, usize, usize, usize, usize)]| {
                spans
                    .iter()
                    .any(|&(_, c, span, start, end)| start < r && r <= end && col >= c && col < c + span)
            };
            let mut col = 0;
            for cell in row.children.iter_mut().filter(|c| c.display == DisplayKind::TableCell) {
                while occupied(col, &spans) {
                    col += 1;
                }
                cell.column = col;
                cell.rowspan = cell.rowspan.clamp(1, row_count - r);
                if cell.rowspan > 1 {
                    spans.push((cell.id, col, cell.colspan, r, r + cell.rowspan - 1));
                }
                col += cell.colspan;
            }

            let row_style = row.style.clone();
            for &(cell, column, colspan, start_row, end_row) in &spans {
                if !(start_row < r && r <= end_row) {
                    continue;
                }
                let id = self.alloc();
                let mut spacing = LayoutBox::new(
                    id,
                    BoxType::Spacing { cell, column, start_row, end_row },
                    ComputedStyle::inherit_from(&row_style),
                    DisplayKind::TableCell,
                );
                spacing.column = column;
                spacing.colspan = colspan;
                let at = row
                    .children
                    .iter()
                    .position(|c| c.column > column && c.display == DisplayKind::TableCell)
                    .unwrap_or(row.children.len());
                row.children.insert(at, spacing);
            }
        }
    }

    /// Re-apply styles after a `:hover` change, keeping the structure.
    #[allow(clippy::implicit_hasher)]
    pub fn restyle(root: &mut LayoutBox, styles: &HashMap<NodeId, ComputedStyle>) {
        let parent = root.style.clone();
        restyle_box(root, styles, &parent);
    }
}

fn restyle_box(b: &mut LayoutBox, styles: &HashMap<NodeId, ComputedStyle>, parent: &ComputedStyle) {
    match &b.box_type {
        BoxType::Principal(node) | BoxType::Replaced { node, .. } => {
            if let Some(style) = styles.get(node) {
                b.style = style.clone();
            }
        }
        BoxType::Text(_) | BoxType::Anonymous | BoxType::Spacing { .. } => {
            b.style = ComputedStyle::inherit_from(parent);
            b.style.display = b.display;
        }
        BoxType::LineBreak => {}
    }
    for child in &mut b.children {
        restyle_box(child, styles, &b.style);
    }
}

fn is_whitespace_text(b: &LayoutBox) -> bool {
    b.text().is_some_and(|t| t.chars().all(char::is_whitespace))
}

fn span_attr(value: Option<&str>, default: usize) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
        .map_or(default, |v| v.min(MAX_SPAN))
}

/// [§ 12.6.2 Lists: the 'list-style-type' property](https://www.w3.org/TR/CSS2/generate.html#lists)
fn list_marker(kind: ListStyleType, ordinal: usize) -> Option<ListMarker> {
    let text = match kind {
        ListStyleType::None => return None,
        ListStyleType::Disc => return Some(ListMarker::Disc),
        ListStyleType::Circle => return Some(ListMarker::Circle),
        ListStyleType::Square => return Some(ListMarker::Square),
        ListStyleType::Decimal => ordinal.to_string(),
        ListStyleType::LowerAlpha => alphabetic(ordinal),
        ListStyleType::UpperAlpha => alphabetic(ordinal).to_ascii_uppercase(),
        ListStyleType::LowerRoman => roman(ordinal),
        ListStyleType::UpperRoman => roman(ordinal).to_ascii_uppercase(),
    };
    Some(ListMarker::Text(format!("{text}.")))
}

/// "a", ..., "z", "aa", "ab", ...
fn alphabetic(mut n: usize) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Lowercase roman numerals; decimal beyond 3999.
fn roman(mut n: usize) -> String {
    if n == 0 || n > 3999 {
        return n.to_string();
    }
    const TABLE: [(usize, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for &(value, digits) in &TABLE {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_counters() {
        assert_eq!(alphabetic(1), "a");
        assert_eq!(alphabetic(27), "aa");
        assert_eq!(roman(4), "iv");
        assert_eq!(roman(1994), "mcmxciv");
        assert_eq!(
            list_marker(ListStyleType::UpperRoman, 3),
            Some(ListMarker::Text("III.".to_string()))
        );
        assert_eq!(list_marker(ListStyleType::None, 3), None);
    }

    #[test]
    fn test_span_attr() {
        assert_eq!(span_attr(Some("3"), 1), 3);
        assert_eq!(span_attr(Some("0"), 1), 1);
        assert_eq!(span_attr(Some("x"), 1), 1);
        assert_eq!(span_attr(Some("5000"), 1), MAX_SPAN);
    }
}
