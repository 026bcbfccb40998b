//! Untyped 2-D cell grids as exchanged with spreadsheet readers and writers

use std::borrow::Cow;

use crate::address::CellRange;
use crate::error::{CodecError, Result};

/// A raw spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// Check if the cell is blank or empty text
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Blank => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// General-purpose textual representation
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            Cell::Blank => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s),
            Cell::Number(n) => Cow::Owned(n.to_string()),
            Cell::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Blank
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

/// A rectangular block of cells, row-major
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl Grid {
    /// Build a grid from possibly ragged rows; short rows are padded with blanks
    pub fn new(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut padded = 0usize;
        for row in &mut rows {
            if row.len() < width {
                row.resize(width, Cell::Blank);
                padded += 1;
            }
        }
        if padded > 0 {
            tracing::warn!(padded, width, "padded ragged rows with blank cells");
        }
        Self { rows, width }
    }

    /// Grid with zero rows but a fixed width
    pub fn with_width(width: usize) -> Self {
        Self {
            rows: Vec::new(),
            width,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }

    /// Append a row; it must match the grid width
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        if self.rows.is_empty() && self.width == 0 {
            self.width = row.len();
        }
        row.resize(self.width, Cell::Blank);
        self.rows.push(row);
    }

    /// All cells of one column, top to bottom
    pub fn column(&self, column: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |r| r.get(column))
    }
}

/// A growable in-memory worksheet.
///
/// Implements the range-write half of the sheet collaborator: blocks are
/// placed at their A1 range and the sheet grows to fit.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    cells: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `grid` into `range`; dimensions must agree
    pub fn write(&mut self, grid: &Grid, range: &CellRange) -> Result<()> {
        if grid.row_count() != range.row_count() || grid.column_count() != range.column_count()
        {
            return Err(CodecError::invalid_file(
                range.to_string(),
                format!(
                    "block of {}x{} cells does not fit range",
                    grid.row_count(),
                    grid.column_count()
                ),
            ));
        }

        let last_row = range.end.row;
        let last_col = range.end.column;
        if self.cells.len() < last_row {
            self.cells.resize_with(last_row, Vec::new);
        }

        for (offset, src) in grid.rows().iter().enumerate() {
            let row = &mut self.cells[range.start.row - 1 + offset];
            if row.len() < last_col {
                row.resize(last_col, Cell::Blank);
            }
            let start = range.start.column - 1;
            row[start..last_col].clone_from_slice(src);
        }

        Ok(())
    }

    /// Current contents as a rectangular grid
    pub fn to_grid(&self) -> Grid {
        Grid::new(self.cells.clone())
    }

    pub fn into_grid(self) -> Grid {
        Grid::new(self.cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_are_padded() {
        let grid = Grid::new(vec![vec![Cell::from("a"), Cell::from(1.0)], vec![]]);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.get(1, 1), Some(&Cell::Blank));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(1.0).display(), "1");
        assert_eq!(Cell::Number(0.25).display(), "0.25");
        assert_eq!(Cell::Bool(true).display(), "true");
        assert!(Cell::text("").is_empty());
        assert!(!Cell::Number(0.0).is_empty());
    }

    #[test]
    fn test_sheet_range_write() {
        let mut sheet = Sheet::new();
        let header = Grid::new(vec![vec![Cell::from("a"), Cell::from("b")]]);
        let data = Grid::new(vec![vec![Cell::from(1.0), Cell::from(2.0)]]);

        sheet
            .write(&header, &CellRange::for_block(1, 1, 1, 2).unwrap())
            .unwrap();
        sheet
            .write(&data, &CellRange::for_block(3, 1, 1, 2).unwrap())
            .unwrap();

        let grid = sheet.to_grid();
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.get(1, 0), Some(&Cell::Blank));
        assert_eq!(grid.get(2, 1), Some(&Cell::Number(2.0)));
    }

    #[test]
    fn test_sheet_rejects_mismatched_range() {
        let mut sheet = Sheet::new();
        let block = Grid::new(vec![vec![Cell::from("a")]]);
        let range = CellRange::for_block(1, 1, 2, 1).unwrap();
        assert!(sheet.write(&block, &range).is_err());
    }
}
