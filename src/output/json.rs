//! JSON output format

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::codec::{NEG_INF_LITERAL, POS_INF_LITERAL};
use crate::format::duration::to_nanos;
use crate::model::{Table, Value};
use crate::registry::{FormatSpec, TypeTag};

use super::OutputFormatter;

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonTable {
    source: String,
    rows: usize,
    columns: Vec<JsonColumn>,
}

#[derive(Serialize)]
struct JsonColumn {
    name: String,
    unit: String,
    description: String,
    #[serde(rename = "type")]
    type_tag: TypeTag,
    format: String,
    values: Vec<serde_json::Value>,
}

/// Missing and undefined become null, infinities their literal text,
/// durations seconds
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Missing | Value::Undefined => serde_json::Value::Null,
        Value::PosInfinity => serde_json::Value::String(POS_INF_LITERAL.to_string()),
        Value::NegInfinity => serde_json::Value::String(NEG_INF_LITERAL.to_string()),
        Value::Float(f) => serde_json::json!(*f),
        Value::Int(i) => serde_json::json!(*i),
        Value::UInt(u) => serde_json::json!(*u),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::DateTime(dt) => serde_json::Value::String(dt.to_string()),
        Value::Duration(d) => serde_json::json!(to_nanos(*d) as f64 / 1e9),
        Value::Category(s) | Value::Text(s) => serde_json::Value::String(s.clone()),
    }
}

impl OutputFormatter for JsonOutput {
    fn render(&self, table: &Table, source: &Path, writer: &mut dyn Write) -> Result<()> {
        let output = JsonTable {
            source: source.display().to_string(),
            rows: table.row_count(),
            columns: table
                .columns()
                .iter()
                .map(|c| JsonColumn {
                    name: c.name.clone(),
                    unit: c.unit.clone(),
                    description: c.description.clone(),
                    type_tag: c.type_tag,
                    format: FormatSpec::new(c.type_tag).to_token(),
                    values: c.values.iter().map(value_to_json).collect(),
                })
                .collect(),
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}
