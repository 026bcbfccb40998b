//! Table codec: typed tables to and from spreadsheet grids
//!
//! A sheet holds a four-row header block followed by one row per record:
//!
//! | row | content            |
//! |-----|--------------------|
//! | 1   | column names       |
//! | 2   | units              |
//! | 3   | descriptions       |
//! | 4   | format tokens      |
//! | 5.. | data               |

pub mod decoder;
pub mod encoder;

use std::path::Path;

use tracing::info;

use crate::config::CodecConfig;
use crate::error::Result;
use crate::model::{Grid, Sheet, Table};
use crate::sheet::SheetFactory;

pub use crate::model::UNDEFINED_LITERAL;
pub use decoder::{decode, TableDecoder};
pub use encoder::{
    encode, EncodedTable, TableEncoder, NAN_LITERAL, NAT_LITERAL, NEG_INF_LITERAL,
    POS_INF_LITERAL,
};

/// Number of header rows preceding the data block
pub const HEADER_ROWS: usize = 4;

/// Encoder, decoder and file access bundled under one configuration
pub struct TableCodec {
    config: CodecConfig,
    encoder: TableEncoder,
    decoder: TableDecoder,
    sheets: SheetFactory,
}

impl TableCodec {
    /// Fails if the configured datetime or duration format is invalid
    pub fn new(config: CodecConfig) -> Result<Self> {
        let encoder = TableEncoder::new(&config)?;
        let decoder = TableDecoder::new(&config);
        Ok(Self {
            config,
            encoder,
            decoder,
            sheets: SheetFactory::new(),
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode(&self, table: &Table) -> Result<EncodedTable> {
        self.encoder.encode(table)
    }

    pub fn decode(&self, grid: &Grid) -> Result<Table> {
        self.decoder.decode(grid)
    }

    /// Read the raw grid of a file without decoding it
    pub fn read_grid(&self, path: &Path) -> Result<Grid> {
        self.sheets.read(path, &self.config)
    }

    /// Read and decode a table file
    pub fn read_table(&self, path: &Path) -> Result<Table> {
        let grid = self.read_grid(path)?;
        let table = self.decode(&grid)?;
        info!(
            path = %path.display(),
            columns = table.column_count(),
            rows = table.row_count(),
            "read table"
        );
        Ok(table)
    }

    /// Encode a table and write it to a file
    pub fn write_table(&self, table: &Table, path: &Path) -> Result<()> {
        let encoded = self.encode(table)?;
        let mut sheet = Sheet::new();
        encoded.write_to(&mut sheet)?;
        self.sheets.write(path, &sheet.into_grid())?;
        info!(
            path = %path.display(),
            columns = table.column_count(),
            rows = table.row_count(),
            "wrote table"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, Value};
    use crate::registry::TypeTag;

    #[test]
    fn test_encode_decode_through_sheet() {
        let codec = TableCodec::new(CodecConfig::default()).unwrap();
        let table = Table::new(vec![
            Column::new("x", TypeTag::Float64, vec![1.5.into(), Value::Missing]).with_unit("s"),
            Column::new("n", TypeTag::Int16, vec![Value::Int(-3), Value::Int(7)]),
        ])
        .unwrap();

        let encoded = codec.encode(&table).unwrap();
        let mut sheet = Sheet::new();
        encoded.write_to(&mut sheet).unwrap();
        let back = codec.decode(&sheet.into_grid()).unwrap();

        assert_eq!(back.columns()[0].unit, "s");
        assert_eq!(back.columns()[0].values, table.columns()[0].values);
        assert_eq!(back.columns()[1].values, table.columns()[1].values);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CodecConfig::new().with_datetime_format("");
        assert!(TableCodec::new(config).is_err());
    }
}
