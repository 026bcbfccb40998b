//! Header block + data grid -> Table
//!
//! Decoding runs in two phases. The header phase reads all four header rows,
//! resolves every format token and validates every sub-format; any failure
//! there aborts before a single data cell is touched. The data phase then
//! converts each kept column independently, optionally on the rayon pool.

use std::borrow::Cow;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::format::{from_excel_serial, DateTimeFormat, DurationFormat, DurationParser, DurationUnit};
use crate::model::{Cell, Column, Grid, Table, Value, UNDEFINED_LITERAL};
use crate::registry::{FormatSpec, Registry, TokenMatch, TypeTag};

use super::encoder::{NAN_LITERAL, NAT_LITERAL};
use super::HEADER_ROWS;

/// Everything needed to convert one kept input column
#[derive(Debug)]
struct ColumnPlan {
    /// Position in the input grid
    source: usize,
    name: String,
    unit: String,
    description: String,
    spec: FormatSpec,
    datetime: Option<DateTimeFormat>,
    duration: Option<DurationParser>,
}

/// Converts spreadsheet grids into typed tables
#[derive(Debug, Clone)]
pub struct TableDecoder {
    parallel: bool,
}

impl Default for TableDecoder {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl TableDecoder {
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            parallel: config.parallel,
        }
    }

    /// Decode a grid whose first four rows are the header block
    pub fn decode(&self, grid: &Grid) -> Result<Table> {
        if grid.row_count() < HEADER_ROWS {
            return Err(CodecError::MissingHeader {
                found: grid.row_count(),
            });
        }

        let width = header_width(grid);
        let plans = plan_columns(grid, width)?;
        let data = &grid.rows()[HEADER_ROWS..];

        debug!(
            columns = width,
            kept = plans.len(),
            skipped = width - plans.len(),
            rows = data.len(),
            parallel = self.parallel,
            "decoding table"
        );

        let results: Vec<Result<Column>> = if self.parallel && plans.len() > 1 {
            plans.par_iter().map(|plan| decode_column(plan, data)).collect()
        } else {
            plans.iter().map(|plan| decode_column(plan, data)).collect()
        };

        // Ordered collect: the lowest-indexed failing column wins
        let columns = results.into_iter().collect::<Result<Vec<_>>>()?;
        Table::new(columns)
    }
}

/// Decode with the default configuration
pub fn decode(grid: &Grid) -> Result<Table> {
    TableDecoder::default().decode(grid)
}

/// Header cells are text; anything else reads as empty
fn header_text(grid: &Grid, row: usize, column: usize) -> String {
    match grid.get(row, column) {
        Some(Cell::Text(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Columns up to the last non-empty header cell; data beyond it is ignored
fn header_width(grid: &Grid) -> usize {
    grid.rows()[..HEADER_ROWS]
        .iter()
        .filter_map(|row| row.iter().rposition(|cell| !cell.is_empty()))
        .max()
        .map_or(0, |last| last + 1)
}

/// Resolve tokens and sub-formats of every header column, dropping starred ones
fn plan_columns(grid: &Grid, width: usize) -> Result<Vec<ColumnPlan>> {
    let registry = Registry::global();
    let mut plans = Vec::new();

    for column in 0..width {
        let token = header_text(grid, 3, column);
        let spec = match registry.match_token(&token) {
            TokenMatch::Unique(spec) => spec,
            TokenMatch::NoMatch => {
                return Err(CodecError::NoValidFormatSpecFound { column, token })
            }
            TokenMatch::Ambiguous(_) => {
                return Err(CodecError::InvalidFormatSpec { column, token })
            }
        };

        if spec.skip {
            trace!(column, token = %token, "skipping column");
            continue;
        }

        let sub = spec.subformat.as_deref();
        let datetime = match (spec.type_tag, sub) {
            (TypeTag::DateTime, Some(pattern)) => Some(DateTimeFormat::parse(pattern)?),
            _ => None,
        };
        let duration = match (spec.type_tag, sub) {
            (TypeTag::Duration, Some(format)) => Some(DurationFormat::parse(format)?.parser()),
            _ => None,
        };

        plans.push(ColumnPlan {
            source: column,
            name: header_text(grid, 0, column),
            unit: header_text(grid, 1, column),
            description: header_text(grid, 2, column),
            spec,
            datetime,
            duration,
        });
    }

    Ok(plans)
}

/// Check if a cell carries no data for the given target type
fn is_no_data(tag: TypeTag, cell: &Cell) -> bool {
    match cell {
        Cell::Blank => true,
        Cell::Text(s) if tag == TypeTag::Text => s.is_empty(),
        Cell::Text(s) => {
            let s = s.trim();
            s.is_empty()
                || match tag {
                    t if t.is_numeric() => s == NAN_LITERAL,
                    TypeTag::DateTime | TypeTag::Duration => s == NAN_LITERAL || s == NAT_LITERAL,
                    _ => false,
                }
        }
        Cell::Number(_) | Cell::Bool(_) => false,
    }
}

/// `Some(true)` for `+Inf`/`Inf`, `Some(false)` for `-Inf`
fn infinity_sign(text: &str) -> Option<bool> {
    let text = text.trim();
    let (positive, rest) = match text.as_bytes().first() {
        Some(b'-') => (false, &text[1..]),
        Some(b'+') => (true, &text[1..]),
        _ => (true, text),
    };
    rest.eq_ignore_ascii_case("inf").then_some(positive)
}

fn decode_column(plan: &ColumnPlan, data: &[Vec<Cell>]) -> Result<Column> {
    let tag = plan.spec.type_tag;
    let blank = Cell::Blank;
    let blank_ref = &blank;
    let source = plan.source;
    let cells = move || {
        data.iter()
            .map(move |row| row.get(source).unwrap_or(blank_ref))
    };

    // Datetime text needs a declared pattern; check before converting anything
    if tag == TypeTag::DateTime && plan.datetime.is_none() {
        let has_text = cells().any(|cell| match cell {
            Cell::Text(s) => !is_no_data(tag, cell) && infinity_sign(s).is_none(),
            _ => false,
        });
        if has_text {
            return Err(CodecError::NonExcelDateWithoutFormatSpec {
                column: plan.source,
            });
        }
    }

    let mut values = vec![tag.default_value(); data.len()];
    for (row, cell) in cells().enumerate() {
        if is_no_data(tag, cell) {
            continue;
        }
        values[row] = convert_cell(plan, cell)
            .map_err(|cause| CodecError::conversion(plan.source, tag, row, cause))?;
    }

    trace!(column = plan.source, tag = %tag, rows = values.len(), "decoded column");

    Ok(Column {
        name: plan.name.clone(),
        unit: plan.unit.clone(),
        description: plan.description.clone(),
        type_tag: tag,
        values,
    })
}

/// Convert one non-empty cell; errors are the bare cause text
fn convert_cell(plan: &ColumnPlan, cell: &Cell) -> std::result::Result<Value, String> {
    let tag = plan.spec.type_tag;
    match tag {
        TypeTag::Float64 | TypeTag::Float32 => {
            let f = match cell {
                Cell::Number(n) => *n,
                Cell::Bool(b) => f64::from(u8::from(*b)),
                Cell::Text(s) => parse_float(s)?,
                Cell::Blank => f64::NAN,
            };
            let f = if tag == TypeTag::Float32 { f as f32 as f64 } else { f };
            Ok(Value::float(f))
        }
        t if t.is_numeric() => convert_integer(t, cell),
        TypeTag::Boolean => match cell {
            Cell::Bool(b) => Ok(Value::Bool(*b)),
            Cell::Number(n) => Ok(Value::Bool(*n != 0.0)),
            Cell::Text(s) => parse_bool(s).map(Value::Bool),
            Cell::Blank => Ok(Value::Bool(false)),
        },
        TypeTag::Text => Ok(Value::Text(cell.display().into_owned())),
        TypeTag::DateTime => match cell {
            Cell::Text(s) => match infinity_sign(s) {
                Some(true) => Ok(Value::PosInfinity),
                Some(false) => Ok(Value::NegInfinity),
                None => {
                    let format = plan
                        .datetime
                        .as_ref()
                        .ok_or_else(|| "no datetime format declared".to_string())?;
                    format.parse_value(s).map(Value::DateTime)
                }
            },
            Cell::Number(n) => from_excel_serial(*n)
                .map(Value::DateTime)
                .ok_or_else(|| format!("{} is not a valid date serial", n)),
            Cell::Bool(_) | Cell::Blank => Err(format!("'{}' is not a date", cell.display())),
        },
        TypeTag::Duration => match cell {
            Cell::Text(s) => match infinity_sign(s) {
                Some(true) => Ok(Value::PosInfinity),
                Some(false) => Ok(Value::NegInfinity),
                None => {
                    let parser = plan
                        .duration
                        .as_ref()
                        .ok_or_else(|| format!("'{}' has no duration format to parse with", s))?;
                    parser.parse(s).map(Value::Duration)
                }
            },
            Cell::Number(n) => {
                let unit = plan
                    .duration
                    .as_ref()
                    .map(|p| p.format().numeric_unit())
                    .unwrap_or(DurationUnit::Days);
                unit.to_duration(*n)
                    .map(Value::Duration)
                    .ok_or_else(|| format!("{} is out of range", n))
            }
            Cell::Bool(_) | Cell::Blank => {
                Err(format!("'{}' is not a duration", cell.display()))
            }
        },
        TypeTag::Categorical => {
            let label: Cow<'_, str> = cell.display();
            if label == UNDEFINED_LITERAL {
                Ok(Value::Undefined)
            } else {
                Ok(Value::Category(label.into_owned()))
            }
        }
        _ => Err(format!("unsupported type {}", tag)),
    }
}

fn parse_float(text: &str) -> std::result::Result<f64, String> {
    let text = text.trim();
    match infinity_sign(text) {
        Some(true) => Ok(f64::INFINITY),
        Some(false) => Ok(f64::NEG_INFINITY),
        None => text
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", text)),
    }
}

fn parse_bool(text: &str) -> std::result::Result<bool, String> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" => Ok(true),
        "false" | "f" => Ok(false),
        _ => Err(format!("'{}' is not a boolean", text)),
    }
}

fn convert_integer(tag: TypeTag, cell: &Cell) -> std::result::Result<Value, String> {
    let n: i128 = match cell {
        Cell::Number(n) => float_to_int(*n)?,
        Cell::Bool(b) => i128::from(*b),
        Cell::Text(s) => {
            let s = s.trim();
            match s.parse::<i128>() {
                Ok(n) => n,
                Err(_) => float_to_int(parse_float(s)?)?,
            }
        }
        Cell::Blank => 0,
    };

    let (lo, hi) = tag
        .int_range()
        .ok_or_else(|| format!("{} is not an integer type", tag))?;
    if n < lo || n > hi {
        return Err(format!("{} is outside the {} range", n, tag));
    }

    // Range checked above
    if tag.is_unsigned_int() {
        Ok(Value::UInt(n as u64))
    } else {
        Ok(Value::Int(n as i64))
    }
}

fn float_to_int(f: f64) -> std::result::Result<i128, String> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(format!("{} is not an integer", f));
    }
    if f.abs() >= 2f64.powi(127) {
        return Err(format!("{} is out of range", f));
    }
    Ok(f as i128)
}
