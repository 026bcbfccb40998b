//! Error types for table encoding, decoding and schema validation

use thiserror::Error;

use crate::registry::TypeTag;

/// Result alias used throughout the codec
pub type Result<T> = std::result::Result<T, CodecError>;

/// Every failure the codec can report.
///
/// Structural errors (header, format tokens) are raised before any data cell
/// is converted, so a malformed file never decodes partially.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The sheet collaborator could not open or parse the file
    #[error("Invalid file {path}: {reason}")]
    InvalidFile { path: String, reason: String },

    /// Fewer than the four header rows are present
    #[error("Missing header: expected at least 4 header rows, found {found}")]
    MissingHeader { found: usize },

    /// A format token matched more than one type pattern
    #[error("Invalid format spec '{token}' in column {column}")]
    InvalidFormatSpec { column: usize, token: String },

    /// A format token matched no type pattern
    #[error("No valid format spec found for column {column}: '{token}'")]
    NoValidFormatSpecFound { column: usize, token: String },

    /// A datetime column holds text but declares no parse format
    #[error("Column {column} contains datetime text but its format token has no {{format}} block")]
    NonExcelDateWithoutFormatSpec { column: usize },

    #[error("Invalid duration format '{0}'")]
    DurationFormatError(String),

    #[error("Invalid datetime format '{format}': {reason}")]
    DateTimeFormatError { format: String, reason: String },

    /// A single cell could not be converted to (or from) the column type
    #[error("Cannot convert column {column}, row {row} to {target}: {cause}")]
    ConversionError {
        column: usize,
        target: TypeTag,
        row: usize,
        cause: String,
    },

    /// A text-typed column holds a non-text value
    #[error("Column {column} is declared text but holds a non-text value")]
    NonTextCellError { column: usize },

    #[error("Missing variable names: {}", .0.join(", "))]
    MissingVariableNames(Vec<String>),

    #[error("Invalid data type for column '{column}': expected {expected}, found {actual}")]
    InvalidDataType {
        column: String,
        expected: TypeTag,
        actual: TypeTag,
    },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Columns of one table must share a row count
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Build an `InvalidFile` error from any displayable cause
    pub fn invalid_file(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        CodecError::InvalidFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a `ConversionError` for one cell
    pub fn conversion(
        column: usize,
        target: TypeTag,
        row: usize,
        cause: impl std::fmt::Display,
    ) -> Self {
        CodecError::ConversionError {
            column,
            target,
            row,
            cause: cause.to_string(),
        }
    }

    /// Column index the error refers to, if any
    pub fn column(&self) -> Option<usize> {
        match self {
            CodecError::InvalidFormatSpec { column, .. }
            | CodecError::NoValidFormatSpecFound { column, .. }
            | CodecError::NonExcelDateWithoutFormatSpec { column }
            | CodecError::ConversionError { column, .. }
            | CodecError::NonTextCellError { column } => Some(*column),
            _ => None,
        }
    }
}
