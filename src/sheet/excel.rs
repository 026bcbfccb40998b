//! Workbook sheets (xlsx, xls, ods), read only

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::debug;

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::model::{Cell, Grid};

use super::GridReader;

/// Reader for workbook files
pub struct ExcelSheet;

impl GridReader for ExcelSheet {
    fn read(&self, path: &Path, config: &CodecConfig) -> Result<Grid> {
        let file = path.display().to_string();
        let mut workbook =
            open_workbook_auto(path).map_err(|e| CodecError::invalid_file(&file, e))?;

        let sheet_name = match config.sheet_name {
            Some(ref name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| CodecError::invalid_file(&file, "no sheets found in workbook"))?,
        };

        let range: Range<Data> = workbook.worksheet_range(&sheet_name).map_err(|e| {
            CodecError::invalid_file(&file, format!("failed to read sheet '{}': {}", sheet_name, e))
        })?;

        debug!(sheet = %sheet_name, size = ?range.get_size(), start = ?range.start(), "read sheet");
        Ok(range_to_grid(&range))
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "ods" | "xlsm" | "xlsb")
    }
}

/// calamine trims leading empty rows and columns; put them back so the
/// header block stays anchored at A1
fn range_to_grid(range: &Range<Data>) -> Grid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Blank; col_offset];
        cells.extend(row.iter().map(convert_cell));
        rows.push(cells);
    }
    Grid::new(rows)
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Blank,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        // Serial day number; the decoder turns it into a datetime
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("#{}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Empty), Cell::Blank);
        assert_eq!(convert_cell(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(convert_cell(&Data::Bool(true)), Cell::Bool(true));
        assert_eq!(
            convert_cell(&Data::String("NaN".to_string())),
            Cell::text("NaN")
        );
    }

    #[test]
    fn test_range_offset_is_restored() {
        let mut range: Range<Data> = Range::new((1, 2), (2, 3));
        range.set_value((1, 2), Data::String("x".to_string()));
        range.set_value((2, 3), Data::Float(1.5));

        let grid = range_to_grid(&range);
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.column_count(), 4);
        assert_eq!(grid.get(1, 2), Some(&Cell::text("x")));
        assert_eq!(grid.get(2, 3), Some(&Cell::Number(1.5)));
        assert_eq!(grid.get(0, 0), Some(&Cell::Blank));
    }

    #[test]
    fn test_missing_workbook() {
        let err = ExcelSheet
            .read(Path::new("/nonexistent/book.xlsx"), &CodecConfig::default())
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidFile { .. }));
    }
}
