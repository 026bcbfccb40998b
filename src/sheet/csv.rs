//! Delimited text sheets (csv, tsv)

use std::path::Path;

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::model::{Cell, Grid};

use super::{GridReader, GridWriter};

/// Reads and writes delimited text. Every non-empty field reads as text;
/// the decoder parses it according to the column type.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvSheet;

/// `\t` for tsv files, `,` otherwise
fn delimiter_for(path: &Path) -> u8 {
    let is_tsv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    if is_tsv {
        b'\t'
    } else {
        b','
    }
}

impl GridReader for CsvSheet {
    fn read(&self, path: &Path, _config: &CodecConfig) -> Result<Grid> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter_for(path))
            .from_path(path)
            .map_err(|e| CodecError::invalid_file(path.display().to_string(), e))?;

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                CodecError::invalid_file(
                    path.display().to_string(),
                    format!("row {}: {}", line + 1, e),
                )
            })?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            Cell::Blank
                        } else {
                            Cell::text(field)
                        }
                    })
                    .collect(),
            );
        }

        Ok(Grid::new(rows))
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

impl GridWriter for CsvSheet {
    fn write(&self, path: &Path, grid: &Grid) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter_for(path))
            .from_path(path)
            .map_err(|e| CodecError::invalid_file(path.display().to_string(), e))?;

        for row in grid.rows() {
            writer
                .write_record(row.iter().map(|c| c.display().into_owned()))
                .map_err(|e| CodecError::invalid_file(path.display().to_string(), e))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.tsv");

        let grid = Grid::new(vec![
            vec![Cell::from("a,b"), Cell::from(1.5)],
            vec![Cell::Blank, Cell::from(true)],
        ]);
        CsvSheet.write(&path, &grid).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("a,b\t1.5"));

        let back = CsvSheet.read(&path, &CodecConfig::default()).unwrap();
        assert_eq!(back.get(0, 0), Some(&Cell::text("a,b")));
        assert_eq!(back.get(0, 1), Some(&Cell::text("1.5")));
        assert_eq!(back.get(1, 0), Some(&Cell::Blank));
        assert_eq!(back.get(1, 1), Some(&Cell::text("true")));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvSheet
            .read(Path::new("/nonexistent/x.csv"), &CodecConfig::default())
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidFile { .. }));
    }
}
