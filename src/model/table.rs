//! Table and Column data structures

use crate::error::{CodecError, Result};
use crate::registry::TypeTag;

use super::value::Value;

/// A named, typed column annotated with unit and description
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Variable name (header row 1)
    pub name: String,
    /// Physical unit (header row 2)
    pub unit: String,
    /// Free-form description (header row 3)
    pub description: String,
    /// Declared type (header row 4)
    pub type_tag: TypeTag,
    /// One value per table row
    pub values: Vec<Value>,
}

impl Column {
    /// Create a column with empty unit and description
    pub fn new(name: impl Into<String>, type_tag: TypeTag, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            unit: String::new(),
            description: String::new(),
            type_tag,
            values,
        }
    }

    /// Create a column of `len` default values for its type
    pub fn filled(name: impl Into<String>, type_tag: TypeTag, len: usize) -> Self {
        Self::new(name, type_tag, vec![type_tag.default_value(); len])
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of the first value the column type does not admit
    pub fn first_invalid(&self) -> Option<usize> {
        self.values.iter().position(|v| !self.type_tag.admits(v))
    }
}

/// An ordered sequence of equally long columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create a table; every column must have the same number of values
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(CodecError::ColumnLengthMismatch {
                    column: bad.name.clone(),
                    expected,
                    actual: bad.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get column index by name (first match)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get column by name (first match)
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Values of one row in column order
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }
}
