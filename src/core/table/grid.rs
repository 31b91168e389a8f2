//! Dense-grid resolution of merged cells
//!
//! Extractors deliver rows that list only anchor cells; positions covered
//! by a row or column span are implicit. The builder walks the rows while
//! tracking, per column, how many more rows an earlier row span covers, and
//! places each anchor at the next free column.

use super::cell::{Cell, CellId, CellSpec};
use super::Table;
use crate::utils::error::{TableError, TableResult};

/// A row as delivered by an extractor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSpec {
    /// Anchor cells in reading order
    pub cells: Vec<CellSpec>,
    /// Whether the source marked this row as a header row
    pub header: bool,
}

impl RowSpec {
    /// Create a new empty body row
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body<I, C>(cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CellSpec>,
    {
        RowSpec {
            cells: cells.into_iter().map(Into::into).collect(),
            header: false,
        }
    }

    pub fn header<I, C>(cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CellSpec>,
    {
        RowSpec {
            header: true,
            ..RowSpec::body(cells)
        }
    }

    pub fn push(&mut self, cell: CellSpec) {
        self.cells.push(cell);
    }
}

/// Builder turning extractor rows into an immutable [`Table`]
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    rows: Vec<RowSpec>,
    declared_columns: Option<usize>,
    caption: Option<String>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the grid width; spans reaching beyond it are rejected
    pub fn declared_columns(mut self, columns: usize) -> Self {
        self.declared_columns = Some(columns);
        self
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn row(mut self, row: RowSpec) -> Self {
        self.rows.push(row);
        self
    }

    pub fn push_row(&mut self, row: RowSpec) {
        self.rows.push(row);
    }

    pub fn header_row<I, C>(self, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CellSpec>,
    {
        self.row(RowSpec::header(cells))
    }

    pub fn body_row<I, C>(self, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CellSpec>,
    {
        self.row(RowSpec::body(cells))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve spans into a dense grid
    pub fn build(self) -> TableResult<Table> {
        let width = match self.declared_columns {
            Some(width) => width,
            None => infer_width(&self.rows),
        };
        let row_count = self.rows.len();

        let mut cells: Vec<Cell> = Vec::new();
        let mut grid: Vec<Vec<CellId>> = Vec::with_capacity(row_count);
        // Per column: anchor of an active row span and the rows it still covers
        let mut coverage: Vec<Option<(CellId, usize)>> = vec![None; width];

        for (r, row) in self.rows.iter().enumerate() {
            let mut slots: Vec<Option<CellId>> = vec![None; width];

            for (c, cover) in coverage.iter_mut().enumerate() {
                if let Some((id, remaining)) = *cover {
                    slots[c] = Some(id);
                    *cover = if remaining > 1 {
                        Some((id, remaining - 1))
                    } else {
                        None
                    };
                }
            }

            let mut col = 0;
            for spec in &row.cells {
                while col < width && slots[col].is_some() {
                    col += 1;
                }

                if spec.rowspan == 0 || spec.colspan == 0 {
                    return Err(TableError::malformed_at("cell has a zero span", r, col));
                }
                if col + spec.colspan > width {
                    return Err(TableError::malformed_at(
                        format!(
                            "cell spans columns {}..{} beyond the declared width of {}",
                            col,
                            col + spec.colspan,
                            width
                        ),
                        r,
                        col,
                    ));
                }
                if let Some(taken) = (col..col + spec.colspan).find(|&c| slots[c].is_some()) {
                    return Err(TableError::malformed_at(
                        "column span overlaps a cell merged from an earlier row",
                        r,
                        taken,
                    ));
                }
                if r + spec.rowspan > row_count {
                    return Err(TableError::malformed_at(
                        format!(
                            "row span of {} extends past the last row",
                            spec.rowspan
                        ),
                        r,
                        col,
                    ));
                }

                let id = CellId(cells.len());
                cells.push(Cell::from_spec(spec, (r, col)));
                for c in col..col + spec.colspan {
                    slots[c] = Some(id);
                    if spec.rowspan > 1 {
                        coverage[c] = Some((id, spec.rowspan - 1));
                    }
                }
                col += spec.colspan;
            }

            let filled = slots.iter().filter(|s| s.is_some()).count();
            if filled != width {
                return Err(TableError::malformed_at_row(
                    format!(
                        "row covers {} of {} grid positions; cell boundaries and cell counts disagree",
                        filled, width
                    ),
                    r,
                ));
            }
            grid.push(slots.into_iter().flatten().collect());
        }

        let header_flags: Vec<bool> = self.rows.iter().map(|row| row.header).collect();
        let header_rows = detect_header_rows(&header_flags, &grid, &cells);

        Ok(Table {
            cells,
            grid,
            header_flags,
            width,
            header_rows,
            caption: self.caption,
        })
    }
}

/// Widest row, counting positions covered by row spans from above
fn infer_width(rows: &[RowSpec]) -> usize {
    let mut col_coverage: Vec<usize> = Vec::new();
    let mut width = 0;

    for row in rows {
        let mut current_col = 0;
        let mut next_coverage = col_coverage.clone();

        for spec in &row.cells {
            while current_col < col_coverage.len() && col_coverage[current_col] > 0 {
                current_col += 1;
            }
            let span = spec.colspan.max(1);
            if current_col + span > next_coverage.len() {
                next_coverage.resize(current_col + span, 0);
            }
            for slot in next_coverage.iter_mut().skip(current_col).take(span) {
                *slot = spec.rowspan.max(1);
            }
            current_col += span;
        }

        let covered_tail = col_coverage.iter().rposition(|&n| n > 0).map_or(0, |i| i + 1);
        width = width.max(current_col).max(covered_tail);

        col_coverage = next_coverage.iter().map(|n| n.saturating_sub(1)).collect();
    }

    width
}

/// Header depth: explicitly flagged leading rows, else the leading rows that
/// carry a horizontal merge plus the row beneath them (at least one row).
fn detect_header_rows(flags: &[bool], grid: &[Vec<CellId>], cells: &[Cell]) -> usize {
    let flagged = flags.iter().take_while(|&&h| h).count();
    if flagged > 0 || grid.is_empty() {
        return flagged;
    }

    let spanning = grid
        .iter()
        .take_while(|row| row.iter().any(|id| cells[id.0].colspan > 1))
        .count();

    (spanning + 1).min(grid.len())
}
