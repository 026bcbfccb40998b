//! Schema declarations and table validation

use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CodecError, Result};
use crate::model::{Column, Table};
use crate::registry::{Registry, TokenMatch, TypeTag};

/// One required column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
    /// Format token such as `%f` or `%{yyyy-MM-dd}D`
    pub format: String,
}

impl SchemaColumn {
    pub fn new(name: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: String::new(),
            description: String::new(),
            format: format.into(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Ordered set of required columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<SchemaColumn>,
}

impl Schema {
    pub fn new(columns: Vec<SchemaColumn>) -> Self {
        Self { columns }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CodecError::InvalidSchema(e.to_string()))
    }

    /// Load a schema from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Resolve each column's type, keyed by name in declaration order
    fn resolve(&self) -> Result<IndexMap<&str, (TypeTag, &SchemaColumn)>> {
        let registry = Registry::global();
        let mut resolved = IndexMap::with_capacity(self.columns.len());

        for column in &self.columns {
            if !identifier_pattern().is_match(&column.name) {
                return Err(CodecError::InvalidSchema(format!(
                    "'{}' is not a valid column name",
                    column.name
                )));
            }

            let tag = match registry.match_token(&column.format) {
                TokenMatch::Unique(spec) if !spec.skip => spec.type_tag,
                _ => {
                    return Err(CodecError::InvalidSchema(format!(
                        "column '{}' has invalid format token '{}'",
                        column.name, column.format
                    )))
                }
            };

            if resolved.insert(column.name.as_str(), (tag, column)).is_some() {
                return Err(CodecError::InvalidSchema(format!(
                    "column '{}' is declared more than once",
                    column.name
                )));
            }
        }

        Ok(resolved)
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
    })
}

/// Check a table against a schema and return the schema's view of it
///
/// Checks run in order: schema well-formedness, presence of every required
/// name, then the type of each required column. The returned table holds
/// only the schema's columns, in schema order, with units and descriptions
/// taken from the schema. When the table repeats a name, the first
/// occurrence is used.
pub fn validate(table: &Table, schema: &Schema) -> Result<Table> {
    let required = schema.resolve()?;

    let mut by_name: FxHashMap<&str, usize> = FxHashMap::default();
    for (index, name) in table.column_names().enumerate() {
        by_name.entry(name).or_insert(index);
    }

    let missing: Vec<String> = required
        .keys()
        .filter(|name| !by_name.contains_key(*name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CodecError::MissingVariableNames(missing));
    }

    let mut columns = Vec::with_capacity(required.len());
    for (name, (expected, declared)) in &required {
        let source = &table.columns()[by_name[name]];
        if source.type_tag != *expected {
            return Err(CodecError::InvalidDataType {
                column: name.to_string(),
                expected: *expected,
                actual: source.type_tag,
            });
        }

        columns.push(Column {
            unit: declared.unit.clone(),
            description: declared.description.clone(),
            ..source.clone()
        });
    }

    debug!(
        kept = columns.len(),
        dropped = table.column_count() - columns.len(),
        "table matches schema"
    );
    Table::new(columns)
}
