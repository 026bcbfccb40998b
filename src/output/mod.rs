//! Output formatting for decoded tables

mod json;
mod terminal;

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::config::OutputFormat;
use crate::model::Table;

pub use json::JsonOutput;
pub use terminal::{write_status, TerminalOutput};

/// Trait for output formatters
pub trait OutputFormatter {
    /// Render a table read from `source` to a writer
    fn render(&self, table: &Table, source: &Path, writer: &mut dyn Write) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter based on format type
    pub fn create(format: OutputFormat) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Render a table to stdout
pub fn render_to_stdout(table: &Table, source: &Path, format: OutputFormat) -> Result<()> {
    let formatter = OutputFactory::create(format);
    let mut stdout = std::io::stdout().lock();
    formatter.render(table, source, &mut stdout)
}
