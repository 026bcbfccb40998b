//! tablecodec - Typed tables in spreadsheet grids
//!
//! Tables of named, typed columns with units and descriptions are stored in
//! a sheet as a four-row header block (names, units, descriptions, format
//! tokens) followed by the data. This crate encodes tables into that layout
//! and decodes them back, reads and writes the sheets as CSV or workbook
//! files, and validates decoded tables against a declared schema.

pub mod address;
pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod output;
pub mod registry;
pub mod schema;
pub mod sheet;

pub use codec::{decode, encode, EncodedTable, TableCodec, TableDecoder, TableEncoder};
pub use config::CodecConfig;
pub use error::{CodecError, Result};
pub use model::{Cell, Column, Grid, Table, Value};
pub use registry::{is_valid_format_spec, FormatSpec, Registry, TypeTag};
pub use schema::{validate, Schema, SchemaColumn};
