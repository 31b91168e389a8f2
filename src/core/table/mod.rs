//! Table Model
//!
//! The normalized in-memory representation of one extracted table.
//!
//! Merged regions are resolved into a dense grid over an index-addressed
//! arena of anchor cells: every grid position stores the [`CellId`] of the
//! anchor that owns its content, so covered positions never duplicate text
//! and there are no gaps.
//!
//! # Architecture
//!
//! ```text
//! Extractor rows -> TableBuilder (span resolution) -> Table (immutable)
//! ```
//!
//! # Example
//!
//! ```
//! use tabcmp::core::table::{CellSpec, TableBuilder};
//!
//! let table = TableBuilder::new()
//!     .header_row([CellSpec::new("Variable"), CellSpec::with_span("Placebo", 1, 2)])
//!     .header_row(["", "n", "%"])
//!     .body_row(["Age", "60", "100.0"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(table.column_count(), 3);
//! assert_eq!(table.header_row_count(), 2);
//! assert_eq!(table.anchor(0, 2).content.display, "Placebo");
//! ```

mod cell;
mod grid;


// Re-export public API
pub use cell::{Cell, CellId, CellSpec, CellStyle, HAlign};
pub use grid::{RowSpec, TableBuilder};

/// An immutable table with a fully resolved grid
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    cells: Vec<Cell>,
    /// Row-major grid of anchor references
    grid: Vec<Vec<CellId>>,
    header_flags: Vec<bool>,
    width: usize,
    header_rows: usize,
    caption: Option<String>,
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the row belongs to the header block
    pub fn is_header(&self) -> bool {
        self.index < self.table.header_rows
    }

    /// Whether the source document flagged the row as a header row
    pub fn is_flagged_header(&self) -> bool {
        self.table.header_flags[self.index]
    }

    /// Anchor of every grid position, covered positions included
    pub fn positions(&self) -> impl Iterator<Item = &'a Cell> + 'a {
        let table = self.table;
        table.grid[self.index].iter().map(move |id| table.cell(*id))
    }

    /// Anchors whose origin lies in this row
    pub fn cells(&self) -> impl Iterator<Item = &'a Cell> + 'a {
        let index = self.index;
        let table = self.table;
        table.grid[index]
            .iter()
            .enumerate()
            .filter(move |(c, id)| table.cell(**id).origin == (index, *c))
            .map(move |(_, id)| table.cell(*id))
    }
}

impl Table {
    pub fn builder() -> TableBuilder {
        TableBuilder::new()
    }

    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    pub fn column_count(&self) -> usize {
        self.width
    }

    /// Header depth detected at build time
    pub fn header_row_count(&self) -> usize {
        self.header_rows
    }

    /// Header depth after applying an override, clamped to the row count
    pub fn effective_header_rows(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.header_rows).min(self.row_count())
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// All anchor cells in creation order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    pub fn row(&self, index: usize) -> Row<'_> {
        assert!(index < self.row_count(), "row index out of bounds");
        Row { table: self, index }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.row_count()).map(move |index| Row { table: self, index })
    }

    pub fn anchor_id(&self, row: usize, col: usize) -> CellId {
        self.grid[row][col]
    }

    /// Anchor owning the content at a grid position
    pub fn anchor(&self, row: usize, col: usize) -> &Cell {
        self.cell(self.grid[row][col])
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.grid
            .get(row)
            .and_then(|r| r.get(col))
            .map(|id| self.cell(*id))
    }

    /// Whether the position is the top-left corner of its anchor
    pub fn is_anchor_position(&self, row: usize, col: usize) -> bool {
        self.anchor(row, col).origin == (row, col)
    }

    /// Display text of every position, covered positions repeating their anchor
    pub fn to_text_grid(&self) -> Vec<Vec<String>> {
        self.grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|id| self.cell(*id).content.display.clone())
                    .collect()
            })
            .collect()
    }
}
