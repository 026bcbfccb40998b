//! Configuration handling for tablecodec

use crate::error::Result;
use crate::format::{DateTimeFormat, DurationFormat, DEFAULT_DATETIME_FORMAT, DEFAULT_DURATION_FORMAT};

/// Output format for decoded tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Configuration for encode and decode operations
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Pattern written into `%{...}D` tokens on encode.
    ///
    /// Fields the pattern lacks are lost on encode. The default has no
    /// fractional seconds, so sub-second values need a pattern ending in
    /// `.SSS`, `.SSSSSS` or `.SSSSSSSSS` to round-trip.
    pub datetime_format: String,
    /// Sub-format written into `%{...}T` tokens on encode
    pub duration_format: String,
    /// For workbook files: which sheet to read
    pub sheet_name: Option<String>,
    /// Decode columns on the rayon thread pool
    pub parallel: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            duration_format: DEFAULT_DURATION_FORMAT.to_string(),
            sheet_name: None,
            parallel: true,
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the datetime encode pattern
    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = format.into();
        self
    }

    /// Set the duration encode sub-format
    pub fn with_duration_format(mut self, format: impl Into<String>) -> Self {
        self.duration_format = format.into();
        self
    }

    /// Set workbook sheet name
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    /// Enable or disable parallel column decoding
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check both encode formats
    pub fn validate(&self) -> Result<(DateTimeFormat, DurationFormat)> {
        let datetime = DateTimeFormat::parse(&self.datetime_format)?;
        let duration = DurationFormat::parse(&self.duration_format)?;
        Ok((datetime, duration))
    }
}
