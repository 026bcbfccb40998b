//! Terminal output

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::model::Table;
use crate::registry::FormatSpec;

use super::OutputFormatter;

/// Box-drawn table with the header block above the data
pub struct TerminalOutput {
    max_rows: Option<usize>,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self { max_rows: None }
    }

    /// Show at most `max_rows` data rows
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            max_rows: Some(max_rows),
        }
    }

    fn build(&self, table: &Table) -> String {
        let columns = table.columns();
        let mut builder = Builder::default();

        builder.push_record(columns.iter().map(|c| c.name.clone()));
        builder.push_record(columns.iter().map(|c| c.unit.clone()));
        builder.push_record(columns.iter().map(|c| FormatSpec::new(c.type_tag).to_token()));

        let shown = self
            .max_rows
            .map_or(table.row_count(), |max| max.min(table.row_count()));
        for row in 0..shown {
            builder.push_record(columns.iter().map(|c| c.values[row].to_string()));
        }

        let mut rendered = builder.build();
        rendered.with(Style::modern());
        rendered.to_string()
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, table: &Table, source: &Path, writer: &mut dyn Write) -> Result<()> {
        writeln!(
            writer,
            "{}: {} columns, {} rows",
            source.display(),
            table.column_count(),
            table.row_count()
        )?;

        if table.column_count() == 0 {
            return Ok(());
        }

        writeln!(writer, "{}", self.build(table))?;

        if let Some(max) = self.max_rows {
            if table.row_count() > max {
                writeln!(writer, "... {} more rows", table.row_count() - max)?;
            }
        }
        Ok(())
    }
}

/// Print a one-line pass/fail status to stdout, colored when attached to a terminal
pub fn write_status(ok: bool, message: &str, choice: ColorChoice) -> Result<()> {
    let mut stdout = StandardStream::stdout(choice);
    let (label, color) = if ok {
        ("OK", Color::Green)
    } else {
        ("FAILED", Color::Red)
    };

    stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(stdout, "{}", label)?;
    stdout.reset()?;
    writeln!(stdout, " {}", message)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, Value};
    use crate::registry::TypeTag;

    fn sample() -> Table {
        Table::new(vec![
            Column::new("speed", TypeTag::Float64, vec![1.5.into(), Value::Missing])
                .with_unit("m/s"),
            Column::new("mode", TypeTag::Categorical, vec![Value::category("A"), Value::Undefined]),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_contains_header_and_values() {
        let mut out = Vec::new();
        TerminalOutput::new()
            .render(&sample(), Path::new("data.csv"), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("data.csv: 2 columns, 2 rows"));
        assert!(text.contains("speed"));
        assert!(text.contains("m/s"));
        assert!(text.contains("%C"));
        assert!(text.contains("1.5"));
        assert!(text.contains("<undefined>"));
    }

    #[test]
    fn test_max_rows_truncates() {
        let mut out = Vec::new();
        TerminalOutput::with_max_rows(1)
            .render(&sample(), Path::new("data.csv"), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("... 1 more rows"));
        assert!(!text.contains("<missing>"));
    }
}
