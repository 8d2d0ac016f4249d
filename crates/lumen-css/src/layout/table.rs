//! CSS Table Layout.
//!
//! [§ 17 Tables](https://www.w3.org/TR/CSS2/tables.html)
//!
//! The automatic table layout algorithm (§ 17.5.2) in the separated
//! borders model:
//! - rows directly in the table or in row groups
//! - `colspan` and `rowspan` (cells are already placed on the grid by the
//!   box tree builder, with spacing boxes in the rows a cell spans into)
//! - pixel and percentage widths on cells
//! - `vertical-align` within cells
//!
//! Not implemented: `border-collapse: collapse`, `table-layout: fixed`.

use crate::style::values::{AutoLength, DisplayKind, LengthValue, VerticalAlign};

use super::LayoutContext;
use super::block::{self, ContainingBlock};
use super::box_model::Rect;
use super::inline::box_at_mut;
use super::intrinsic;
use super::layout_box::LayoutBox;

/// Width constraints of one grid column, border-box widths of its cells.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Column {
    min: f32,
    max: f32,
    fixed: Option<f32>,
    percent: Option<f32>,
}

/// Paths (child indices from the table) of every row, in order.
fn row_paths(table: &LayoutBox) -> Vec<Vec<usize>> {
    let mut rows = Vec::new();
    for (i, child) in table.children.iter().enumerate() {
        match child.display {
            DisplayKind::TableRow => rows.push(vec![i]),
            DisplayKind::TableRowGroup => rows.extend(
                child
                    .children
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| row.display == DisplayKind::TableRow)
                    .map(|(j, _)| vec![i, j]),
            ),
            _ => {}
        }
    }
    rows
}

fn box_at<'b>(root: &'b LayoutBox, path: &[usize]) -> Option<&'b LayoutBox> {
    let mut current = root;
    for &i in path {
        current = current.children.get(i)?;
    }
    Some(current)
}

fn is_cell(b: &LayoutBox) -> bool {
    b.display == DisplayKind::TableCell && !b.is_spacing()
}

fn column_count(table: &LayoutBox, rows: &[Vec<usize>]) -> usize {
    rows.iter()
        .filter_map(|path| box_at(table, path))
        .flat_map(|row| row.children.iter())
        .filter(|c| c.display == DisplayKind::TableCell)
        .map(|cell| cell.column + cell.colspan.max(1))
        .max()
        .unwrap_or(0)
}

fn spacing(table: &LayoutBox, ctx: &LayoutContext<'_>) -> (f32, f32) {
    let lengths = ctx.lengths(&table.style);
    (
        table.style.border_spacing.0.to_px(0.0, &lengths).max(0.0),
        table.style.border_spacing.1.to_px(0.0, &lengths).max(0.0),
    )
}

/// [§ 17.5.2.2 Automatic table layout](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
///
/// "Calculate the minimum content width (MCW) of each cell ... For each
/// column, determine a maximum and minimum column width from the cells
/// that span only that column." Spanning cells then widen the columns
/// they span evenly.
fn column_constraints(
    table: &LayoutBox,
    rows: &[Vec<usize>],
    ncols: usize,
    h_spacing: f32,
    ctx: &LayoutContext<'_>,
    depth: usize,
) -> Vec<Column> {
    let mut columns = vec![Column::default(); ncols];
    let mut spans = Vec::new();
    for row in rows.iter().filter_map(|path| box_at(table, path)) {
        for cell in row.children.iter().filter(|c| is_cell(c)) {
            if cell.column >= ncols {
                continue;
            }
            let span = cell.colspan.clamp(1, ncols - cell.column);
            let (min, max) = intrinsic::outer_widths(cell, ctx, depth + 1);
            if span > 1 {
                spans.push((cell.column, span, min, max));
                continue;
            }
            let column = &mut columns[cell.column];
            column.min = column.min.max(min);
            column.max = column.max.max(max);
            match cell.style.width {
                AutoLength::Length(LengthValue::Percent(pct)) => {
                    column.percent = Some(column.percent.map_or(pct, |p| p.max(pct)));
                }
                AutoLength::Length(_) => column.fixed = Some(column.fixed.map_or(max, |f| f.max(max))),
                AutoLength::Auto => {}
            }
        }
    }
    for (start, span, min, max) in spans {
        let spanned = &mut columns[start..start + span];
        let inner = h_spacing * (span - 1) as f32;
        let have_min = spanned.iter().map(|c| c.min).sum::<f32>() + inner;
        if min > have_min {
            let add = (min - have_min) / span as f32;
            spanned.iter_mut().for_each(|c| c.min += add);
        }
        let have_max = spanned.iter().map(|c| c.max).sum::<f32>() + inner;
        if max > have_max {
            let add = (max - have_max) / span as f32;
            spanned.iter_mut().for_each(|c| c.max += add);
        }
    }
    for column in &mut columns {
        column.max = column.max.max(column.min);
    }
    columns
}

/// Split `target` (the table content width minus spacing) over the columns.
///
/// Percentage and fixed columns get their width first (never below their
/// minimum). Auto columns share what is left: each gets its maximum plus a
/// share of any surplus proportional to it, or, when space is short, a
/// width interpolated between its minimum and maximum.
fn distribute(columns: &[Column], target: f32) -> Vec<f32> {
    let mut widths: Vec<f32> = columns.iter().map(|c| c.min).collect();
    let mut auto = Vec::new();
    let mut used = 0.0;
    for (i, column) in columns.iter().enumerate() {
        let constrained = column
            .percent
            .map(|pct| pct * target / 100.0)
            .or(column.fixed)
            .map(|w| w.max(column.min));
        match constrained {
            Some(width) => {
                widths[i] = width;
                used += width;
            }
            None => auto.push(i),
        }
    }
    let remaining = target - used;

    if auto.is_empty() {
        let total: f32 = widths.iter().sum();
        if remaining > 0.0 && !widths.is_empty() {
            let n = widths.len() as f32;
            for width in &mut widths {
                *width += if total > 0.0 { remaining * *width / total } else { remaining / n };
            }
        }
        return widths;
    }

    let sum_min: f32 = auto.iter().map(|&i| columns[i].min).sum();
    let sum_max: f32 = auto.iter().map(|&i| columns[i].max).sum();
    for &i in &auto {
        let Column { min, max, .. } = columns[i];
        widths[i] = if remaining >= sum_max {
            let extra = remaining - sum_max;
            max + if sum_max > 0.0 {
                extra * max / sum_max
            } else {
                extra / auto.len() as f32
            }
        } else if remaining > sum_min && sum_max > sum_min {
            min + (max - min) * (remaining - sum_min) / (sum_max - sum_min)
        } else {
            min
        };
    }
    widths
}

/// `(min, max)` content widths of a table.
pub(crate) fn intrinsic_widths(table: &LayoutBox, ctx: &LayoutContext<'_>, depth: usize) -> (f32, f32) {
    let rows = row_paths(table);
    let ncols = column_count(table, &rows);
    if ncols == 0 {
        return (0.0, 0.0);
    }
    let (h_spacing, _) = spacing(table, ctx);
    let columns = column_constraints(table, &rows, ncols, h_spacing, ctx, depth);
    let spacing_total = h_spacing * (ncols + 1) as f32;
    (
        columns.iter().map(|c| c.min).sum::<f32>() + spacing_total,
        columns.iter().map(|c| c.max).sum::<f32>() + spacing_total,
    )
}

/// Lay out a table with its margin box at `origin`. In-flow tables solve
/// their horizontal margins against the containing block (so
/// `margin: auto` centers them); other tables sit at `origin.0`.
pub(crate) fn layout_table(
    table: &mut LayoutBox,
    cb: &ContainingBlock,
    origin: (f32, f32),
    in_flow: bool,
    ctx: &LayoutContext<'_>,
) {
    block::resolve_edges(table, cb.width, ctx);
    let (h_spacing, v_spacing) = spacing(table, ctx);
    let rows = row_paths(table);
    let ncols = column_count(table, &rows);

    // STEP 1: column widths.
    let columns = column_constraints(table, &rows, ncols, h_spacing, ctx, 0);
    let spacing_total = if ncols > 0 { h_spacing * (ncols + 1) as f32 } else { 0.0 };
    let min_total = columns.iter().map(|c| c.min).sum::<f32>() + spacing_total;
    let max_total = columns.iter().map(|c| c.max).sum::<f32>() + spacing_total;
    let available = cb.width - table.dimensions.margin.horizontal() - table.dimensions.horizontal_chrome();
    let target = match block::specified_width(table, cb.width, ctx) {
        Some(width) => block::clamp_width(table, width, cb.width, ctx).max(min_total),
        None => max_total.min(available).max(min_total),
    };
    let widths = distribute(&columns, target - spacing_total);
    let content_width = if ncols == 0 {
        target
    } else {
        widths.iter().sum::<f32>() + spacing_total
    };

    // STEP 2: position the table box.
    if in_flow {
        block::solve_horizontal_margins(table, cb.width, content_width);
    }
    let x0 = if in_flow { cb.x } else { origin.0 };
    let d = &mut table.dimensions;
    d.content.width = content_width;
    d.content.x = x0 + d.margin.left + d.border.left + d.padding.left;
    d.content.y = origin.1 + d.margin.top + d.border.top + d.padding.top;
    let content = d.content;

    let mut col_x = Vec::with_capacity(ncols);
    let mut x = content.x + h_spacing;
    for width in &widths {
        col_x.push(x);
        x += width + h_spacing;
    }
    let span_width = |col: usize, span: usize| {
        widths[col..(col + span).min(ncols)].iter().sum::<f32>() + h_spacing * span.saturating_sub(1) as f32
    };
    let cell_cb = ContainingBlock {
        x: content.x,
        y: content.y,
        width: content_width,
        height: None,
    };

    // STEP 3: lay out rows top to bottom.
    //
    // [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
    // A row is as tall as its tallest single-row cell. A cell spanning
    // several rows only adds the height the rows it spans lack, and only to
    // its last row, so spanned heights are never counted twice.
    let mut row_tops = Vec::with_capacity(rows.len());
    let mut row_heights: Vec<f32> = Vec::with_capacity(rows.len());
    let mut spanning: Vec<(usize, usize, f32)> = Vec::new();
    let mut y = content.y + if rows.is_empty() { 0.0 } else { v_spacing };
    for (r, path) in rows.iter().enumerate() {
        let Some(row) = box_at_mut(table, path) else { continue };
        let mut height = block::specified_height(row, None, ctx).unwrap_or(0.0);
        for cell in row.children.iter_mut().filter(|c| is_cell(c)) {
            if cell.column >= ncols {
                continue;
            }
            let span = cell.colspan.clamp(1, ncols - cell.column);
            block::layout_sized(cell, &cell_cb, (col_x[cell.column], y), Some(span_width(cell.column, span)), ctx);
            let cell_height = cell.dimensions.border_box().height;
            if cell.rowspan > 1 {
                spanning.push((r, r + cell.rowspan - 1, cell_height));
            } else {
                height = height.max(cell_height);
            }
        }
        for &(start, end, cell_height) in &spanning {
            if end == r {
                let above = row_heights[start..r].iter().sum::<f32>() + v_spacing * (r - start) as f32;
                height = height.max(cell_height - above);
            }
        }
        row_tops.push(y);
        row_heights.push(height);
        y += height + v_spacing;
    }

    // STEP 4: stretch cells to their slots; place rows and spacing boxes.
    for (r, path) in rows.iter().enumerate() {
        let Some(row) = box_at_mut(table, path) else { continue };
        row.dimensions.content = Rect::new(content.x, row_tops[r], content_width, row_heights[r]);
        for cell in row.children.iter_mut().filter(|c| c.display == DisplayKind::TableCell) {
            if cell.column >= ncols {
                continue;
            }
            let span = cell.colspan.clamp(1, ncols - cell.column);
            if cell.is_spacing() {
                cell.dimensions.content = Rect::new(col_x[cell.column], row_tops[r], span_width(cell.column, span), row_heights[r]);
                continue;
            }
            let end = (r + cell.rowspan.max(1) - 1).min(rows.len() - 1);
            let slot = row_heights[r..=end].iter().sum::<f32>() + v_spacing * (end - r) as f32;
            stretch_cell(cell, slot);
        }
    }
    for group in table
        .children
        .iter_mut()
        .filter(|c| c.display == DisplayKind::TableRowGroup)
    {
        let rect = group
            .children
            .iter()
            .map(|row| row.dimensions.content)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Rect::new(content.x, content.y, content_width, 0.0));
        group.dimensions.content = rect;
    }

    let rows_height = if rows.is_empty() { 0.0 } else { y - content.y };
    let height = block::specified_height(table, cb.height, ctx).map_or(rows_height, |h| h.max(rows_height));
    table.dimensions.content.height = height;
    log::trace!(
        "table: {} rows x {ncols} columns, {content_width:.1} x {height:.1}",
        rows.len()
    );
}

/// [§ 17.5.3](https://www.w3.org/TR/CSS2/tables.html#height-layout)
/// Grow a cell to the height of its slot, moving its content for
/// `vertical-align: middle` and `bottom`.
fn stretch_cell(cell: &mut LayoutBox, slot: f32) {
    let extra = slot - cell.dimensions.border_box().height;
    if extra <= 0.0 {
        return;
    }
    let offset = match cell.style.vertical_align {
        VerticalAlign::Middle => extra / 2.0,
        VerticalAlign::Bottom => extra,
        _ => 0.0,
    };
    if offset > 0.0 {
        for child in &mut cell.children {
            child.shift(0.0, offset);
        }
        for line in &mut cell.lines {
            line.shift(0.0, offset);
        }
    }
    cell.dimensions.content.height += extra;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto(min: f32, max: f32) -> Column {
        Column {
            min,
            max,
            ..Column::default()
        }
    }

    #[test]
    fn test_distribute_surplus_proportional_to_max() {
        let widths = distribute(&[auto(10.0, 20.0), auto(10.0, 60.0)], 160.0);
        assert!((widths[0] - 40.0).abs() < 1e-3);
        assert!((widths[1] - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_distribute_short_space_interpolates() {
        let widths = distribute(&[auto(10.0, 20.0), auto(10.0, 60.0)], 50.0);
        // Halfway between the minimum (20) and maximum (80) totals.
        assert!((widths[0] - 15.0).abs() < 1e-3);
        assert!((widths[1] - 35.0).abs() < 1e-3);
    }

    #[test]
    fn test_distribute_fixed_and_percent() {
        let fixed = Column {
            fixed: Some(30.0),
            ..auto(5.0, 30.0)
        };
        let pct = Column {
            percent: Some(50.0),
            ..auto(0.0, 10.0)
        };
        let widths = distribute(&[fixed, pct, auto(0.0, 10.0)], 100.0);
        assert!((widths[0] - 30.0).abs() < 1e-3);
        assert!((widths[1] - 50.0).abs() < 1e-3);
        assert!((widths[2] - 20.0).abs() < 1e-3);
    }
}
