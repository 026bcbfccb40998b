//! Sheet layer: reading and writing raw cell grids from files

mod csv;
mod excel;

use std::path::Path;

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::model::Grid;

pub use self::csv::CsvSheet;
pub use self::excel::ExcelSheet;

/// Reads a file into a cell grid
pub trait GridReader: Send + Sync {
    /// Read the whole sheet, top-left cell at (0, 0)
    fn read(&self, path: &Path, config: &CodecConfig) -> Result<Grid>;

    /// Check if this reader can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Writes a cell grid to a file
pub trait GridWriter: Send + Sync {
    fn write(&self, path: &Path, grid: &Grid) -> Result<()>;

    fn supports_extension(&self, ext: &str) -> bool;
}

/// Picks a reader or writer based on file extension
pub struct SheetFactory {
    readers: Vec<Box<dyn GridReader>>,
    writers: Vec<Box<dyn GridWriter>>,
}

impl Default for SheetFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

impl SheetFactory {
    /// Create a factory with all supported formats
    pub fn new() -> Self {
        Self {
            readers: vec![Box::new(CsvSheet), Box::new(ExcelSheet)],
            writers: vec![Box::new(CsvSheet)],
        }
    }

    /// Get a reader for the given file path
    pub fn reader(&self, path: &Path) -> Result<&dyn GridReader> {
        let ext = extension(path);
        self.readers
            .iter()
            .find(|r| r.supports_extension(&ext))
            .map(|r| r.as_ref())
            .ok_or_else(|| {
                CodecError::invalid_file(
                    path.display().to_string(),
                    format!("unsupported file format for reading: '{}'", ext),
                )
            })
    }

    /// Get a writer for the given file path
    pub fn writer(&self, path: &Path) -> Result<&dyn GridWriter> {
        let ext = extension(path);
        self.writers
            .iter()
            .find(|w| w.supports_extension(&ext))
            .map(|w| w.as_ref())
            .ok_or_else(|| {
                CodecError::invalid_file(
                    path.display().to_string(),
                    format!("unsupported file format for writing: '{}'", ext),
                )
            })
    }

    /// Read a file using the appropriate reader
    pub fn read(&self, path: &Path, config: &CodecConfig) -> Result<Grid> {
        self.reader(path)?.read(path, config)
    }

    /// Write a grid using the appropriate writer
    pub fn write(&self, path: &Path, grid: &Grid) -> Result<()> {
        self.writer(path)?.write(path, grid)
    }
}
