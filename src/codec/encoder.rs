//! Table -> header block + data grid

use tracing::{debug, trace, warn};

use crate::address::CellRange;
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::format::{DateTimeFormat, DurationFormat};
use crate::model::{Cell, Column, Grid, Sheet, Table, Value};
use crate::registry::{FormatSpec, TypeTag};

use super::HEADER_ROWS;

/// Literal written for missing floats and durations
pub const NAN_LITERAL: &str = "NaN";
/// Literal written for missing datetimes
pub const NAT_LITERAL: &str = "NaT";
pub const POS_INF_LITERAL: &str = "Inf";
pub const NEG_INF_LITERAL: &str = "-Inf";

/// Encoded header and data blocks with their destination ranges
#[derive(Debug, Clone)]
pub struct EncodedTable {
    /// Names, units, descriptions and format tokens
    pub header: Grid,
    /// One row per table row
    pub data: Grid,
    /// `A1:<col>4`; `None` for a table without columns
    pub header_range: Option<CellRange>,
    /// `A5:<col><4+M>`; `None` when there are no rows
    pub data_range: Option<CellRange>,
}

impl EncodedTable {
    /// Format tokens of header row 4
    pub fn tokens(&self) -> Vec<String> {
        self.header
            .rows()
            .get(HEADER_ROWS - 1)
            .map(|row| row.iter().map(|c| c.display().into_owned()).collect())
            .unwrap_or_default()
    }

    /// Place both blocks at their ranges
    pub fn write_to(&self, sheet: &mut Sheet) -> Result<()> {
        if let Some(range) = &self.header_range {
            debug!(range = %range, "writing header block");
            sheet.write(&self.header, range)?;
        }
        if let Some(range) = &self.data_range {
            debug!(range = %range, "writing data block");
            sheet.write(&self.data, range)?;
        }
        Ok(())
    }

    /// Header and data stacked into one grid
    pub fn to_grid(&self) -> Grid {
        let mut rows = self.header.rows().to_vec();
        rows.extend(self.data.rows().iter().cloned());
        Grid::new(rows)
    }
}

/// Converts tables into spreadsheet cells
#[derive(Debug, Clone)]
pub struct TableEncoder {
    datetime: DateTimeFormat,
    duration: DurationFormat,
}

impl TableEncoder {
    /// Create an encoder using the config's datetime and duration formats
    pub fn new(config: &CodecConfig) -> Result<Self> {
        let (datetime, duration) = config.validate()?;
        Ok(Self { datetime, duration })
    }

    pub fn encode(&self, table: &Table) -> Result<EncodedTable> {
        let width = table.column_count();
        let rows = table.row_count();
        debug!(columns = width, rows, "encoding table");

        let mut header: Vec<Vec<Cell>> = vec![Vec::with_capacity(width); HEADER_ROWS];
        let mut columns: Vec<Vec<Cell>> = Vec::with_capacity(width);

        for (index, column) in table.columns().iter().enumerate() {
            let (token, cells) = self.encode_column(index, column)?;
            trace!(column = index, token = %token, "encoded column");
            header[0].push(Cell::text(column.name.clone()));
            header[1].push(Cell::text(column.unit.clone()));
            header[2].push(Cell::text(column.description.clone()));
            header[3].push(Cell::text(token));
            columns.push(cells);
        }

        // Transpose column-major cells into rows
        let mut data = Grid::with_width(width);
        let mut iters: Vec<_> = columns.into_iter().map(Vec::into_iter).collect();
        for _ in 0..rows {
            data.push_row(iters.iter_mut().filter_map(Iterator::next).collect());
        }

        Ok(EncodedTable {
            header: Grid::new(header),
            data,
            header_range: CellRange::for_block(1, 1, HEADER_ROWS, width),
            data_range: CellRange::for_block(HEADER_ROWS + 1, 1, rows, width),
        })
    }

    /// Format token and cells of one column
    fn encode_column(&self, index: usize, column: &Column) -> Result<(String, Vec<Cell>)> {
        let tag = column.type_tag;

        if let Some(row) = column.first_invalid() {
            if tag == TypeTag::Text {
                return Err(CodecError::NonTextCellError { column: index });
            }
            return Err(CodecError::conversion(
                index,
                tag,
                row,
                format!("{} value is not valid here", column.values[row].kind()),
            ));
        }

        let values = &column.values;
        let mut spec = FormatSpec::new(tag);

        let cells = match tag {
            TypeTag::Float64 | TypeTag::Float32 => {
                if values.iter().any(Value::is_sentinel) {
                    values.iter().map(|v| Cell::Text(float_text(tag, v))).collect()
                } else {
                    values
                        .iter()
                        .map(|v| match v {
                            Value::Float(f) if tag == TypeTag::Float32 => {
                                Cell::Number(*f as f32 as f64)
                            }
                            Value::Float(f) => Cell::Number(*f),
                            _ => Cell::Blank,
                        })
                        .collect()
                }
            }
            TypeTag::Int8 | TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64 => values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => integer_cell(i128::from(*i)),
                    _ => Cell::Blank,
                })
                .collect(),
            TypeTag::UInt8 | TypeTag::UInt16 | TypeTag::UInt32 | TypeTag::UInt64 => values
                .iter()
                .map(|v| match v {
                    Value::UInt(u) => integer_cell(i128::from(*u)),
                    _ => Cell::Blank,
                })
                .collect(),
            TypeTag::Boolean => values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Cell::Bool(*b),
                    _ => Cell::Blank,
                })
                .collect(),
            TypeTag::Text => values
                .iter()
                .map(|v| match v {
                    Value::Text(s) => Cell::Text(s.clone()),
                    _ => Cell::Blank,
                })
                .collect(),
            TypeTag::DateTime => {
                spec = spec.with_subformat(self.datetime.pattern());
                let lossy = values
                    .iter()
                    .filter(|v| matches!(v, Value::DateTime(dt) if !self.datetime.is_exact(dt)))
                    .count();
                if lossy > 0 {
                    warn!(
                        column = index,
                        rows = lossy,
                        pattern = self.datetime.pattern(),
                        "datetime pattern drops precision; these values will not decode unchanged"
                    );
                }
                values
                    .iter()
                    .map(|v| {
                        Cell::Text(match v {
                            Value::DateTime(dt) => self.datetime.format(dt),
                            Value::PosInfinity => POS_INF_LITERAL.to_string(),
                            Value::NegInfinity => NEG_INF_LITERAL.to_string(),
                            _ => NAT_LITERAL.to_string(),
                        })
                    })
                    .collect()
            }
            TypeTag::Duration => {
                spec = spec.with_subformat(self.duration.to_string());
                self.encode_durations(values)
            }
            TypeTag::Categorical => values
                .iter()
                .map(|v| match v {
                    Value::Category(label) => Cell::Text(label.clone()),
                    _ => Cell::Text(String::new()),
                })
                .collect(),
        };

        Ok((spec.to_token(), cells))
    }

    /// Durations share one padded width across the column
    fn encode_durations(&self, values: &[Value]) -> Vec<Cell> {
        let finite: Vec<_> = values
            .iter()
            .filter_map(|v| match v {
                Value::Duration(d) => Some(*d),
                _ => None,
            })
            .collect();
        let mut texts = self.duration.format_all(&finite).into_iter();

        values
            .iter()
            .map(|v| {
                Cell::Text(match v {
                    Value::Duration(_) => texts.next().unwrap_or_default(),
                    Value::PosInfinity => POS_INF_LITERAL.to_string(),
                    Value::NegInfinity => NEG_INF_LITERAL.to_string(),
                    _ => NAN_LITERAL.to_string(),
                })
            })
            .collect()
    }
}

/// Largest integer magnitude a numeric cell holds exactly
const MAX_EXACT_INTEGER: i128 = 1 << 53;

/// Numeric cell, or decimal text once an f64 would round the value
fn integer_cell(n: i128) -> Cell {
    if n.abs() <= MAX_EXACT_INTEGER {
        Cell::Number(n as f64)
    } else {
        Cell::Text(n.to_string())
    }
}

/// Text form of a float cell in a column that holds sentinels
fn float_text(tag: TypeTag, value: &Value) -> String {
    match value {
        Value::Float(f) if tag == TypeTag::Float32 => (*f as f32).to_string(),
        Value::Float(f) => f.to_string(),
        Value::PosInfinity => POS_INF_LITERAL.to_string(),
        Value::NegInfinity => NEG_INF_LITERAL.to_string(),
        _ => NAN_LITERAL.to_string(),
    }
}

/// Encode with the default configuration
pub fn encode(table: &Table) -> Result<EncodedTable> {
    TableEncoder::new(&CodecConfig::default())?.encode(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn texts(grid: &Grid, column: usize) -> Vec<String> {
        grid.column(column).map(|c| c.display().into_owned()).collect()
    }

    #[test]
    fn test_header_and_ranges() {
        let table = Table::new(vec![
            Column::new("x", TypeTag::Float64, vec![1.0.into(), 2.0.into()])
                .with_unit("m")
                .with_description("distance"),
            Column::new("n", TypeTag::UInt8, vec![Value::UInt(3), Value::UInt(4)]),
        ])
        .unwrap();

        let encoded = encode(&table).unwrap();
        assert_eq!(encoded.tokens(), vec!["%f", "%u8"]);
        assert_eq!(encoded.header.get(1, 0), Some(&Cell::text("m")));
        assert_eq!(encoded.header.get(2, 0), Some(&Cell::text("distance")));
        assert_eq!(encoded.header_range.unwrap().to_string(), "A1:B4");
        assert_eq!(encoded.data_range.unwrap().to_string(), "A5:B6");
        assert_eq!(encoded.data.get(1, 1), Some(&Cell::Number(4.0)));
    }

    #[test]
    fn test_float_sentinels_convert_whole_column() {
        let table = Table::new(vec![Column::new(
            "x",
            TypeTag::Float64,
            vec![
                1.0.into(),
                0.1.into(),
                Value::Missing,
                Value::PosInfinity,
                Value::NegInfinity,
            ],
        )])
        .unwrap();

        let encoded = encode(&table).unwrap();
        assert_eq!(texts(&encoded.data, 0), vec!["1", "0.1", "NaN", "Inf", "-Inf"]);
        assert!(encoded.data.column(0).all(|c| matches!(c, Cell::Text(_))));
    }

    #[test]
    fn test_text_column_rejects_other_values() {
        let table = Table::new(vec![
            Column::new("a", TypeTag::Float64, vec![1.0.into()]),
            Column::new("b", TypeTag::Text, vec![Value::Int(1)]),
        ])
        .unwrap();
        assert!(matches!(
            encode(&table),
            Err(CodecError::NonTextCellError { column: 1 })
        ));
    }

    #[test]
    fn test_datetime_and_duration_tokens() {
        let when = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let table = Table::new(vec![
            Column::new(
                "t",
                TypeTag::DateTime,
                vec![when.into(), Value::Missing, Value::NegInfinity],
            ),
            Column::new(
                "d",
                TypeTag::Duration,
                vec![
                    TimeDelta::seconds(90).into(),
                    Value::Missing,
                    Value::PosInfinity,
                ],
            ),
        ])
        .unwrap();

        let encoder =
            TableEncoder::new(&CodecConfig::new().with_duration_format("mm:ss")).unwrap();
        let encoded = encoder.encode(&table).unwrap();
        assert_eq!(
            encoded.tokens(),
            vec!["%{yyyy-MM-dd HH:mm:ss}D", "%{mm:ss}T"]
        );
        assert_eq!(
            texts(&encoded.data, 0),
            vec!["2024-02-29 08:00:00", "NaT", "-Inf"]
        );
        assert_eq!(texts(&encoded.data, 1), vec!["01:30", "NaN", "Inf"]);
    }

    #[test]
    fn test_categorical_undefined_is_empty() {
        let table = Table::new(vec![Column::new(
            "c",
            TypeTag::Categorical,
            vec![Value::category("A"), Value::Undefined],
        )])
        .unwrap();
        let encoded = encode(&table).unwrap();
        assert_eq!(texts(&encoded.data, 0), vec!["A", ""]);
    }

    #[test]
    fn test_wide_integers_are_written_as_text() {
        let table = Table::new(vec![
            Column::new(
                "i",
                TypeTag::Int64,
                vec![Value::Int(i64::MAX), Value::Int(i64::MIN), Value::Int(1 << 53)],
            ),
            Column::new(
                "u",
                TypeTag::UInt64,
                vec![Value::UInt(u64::MAX), Value::UInt((1 << 53) + 1), Value::UInt(7)],
            ),
        ])
        .unwrap();

        let encoded = encode(&table).unwrap();
        assert_eq!(
            encoded.data.column(0).cloned().collect::<Vec<_>>(),
            vec![
                Cell::text("9223372036854775807"),
                Cell::text("-9223372036854775808"),
                Cell::Number(9007199254740992.0),
            ]
        );
        assert_eq!(
            encoded.data.column(1).cloned().collect::<Vec<_>>(),
            vec![
                Cell::text("18446744073709551615"),
                Cell::text("9007199254740993"),
                Cell::Number(7.0),
            ]
        );
    }

    #[test]
    fn test_unreadable_categories_are_rejected() {
        for label in ["", "<undefined>"] {
            let table = Table::new(vec![Column::new(
                "c",
                TypeTag::Categorical,
                vec![Value::category("A"), Value::category(label)],
            )])
            .unwrap();
            assert!(matches!(
                encode(&table),
                Err(CodecError::ConversionError {
                    column: 0,
                    target: TypeTag::Categorical,
                    row: 1,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_float32_must_be_exact() {
        let table = Table::new(vec![Column::new(
            "y",
            TypeTag::Float32,
            vec![0.5.into(), 0.1.into()],
        )])
        .unwrap();
        assert!(matches!(
            encode(&table),
            Err(CodecError::ConversionError { column: 0, row: 1, .. })
        ));
    }

    #[test]
    fn test_empty_table() {
        let encoded = encode(&Table::empty()).unwrap();
        assert!(encoded.header_range.is_none());
        assert!(encoded.data_range.is_none());

        let mut sheet = Sheet::new();
        encoded.write_to(&mut sheet).unwrap();
        assert_eq!(sheet.to_grid().row_count(), 0);
    }
}
