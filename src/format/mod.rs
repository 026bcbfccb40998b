//! Sub-format grammars carried inside datetime and duration tokens

pub mod datetime;
pub mod duration;

pub use datetime::{from_excel_serial, DateTimeFormat, DEFAULT_DATETIME_FORMAT};
pub use duration::{interpret, DurationFormat, DurationParser, DurationUnit, TimerLayout};

/// Default digital-timer format used when encoding duration columns
pub const DEFAULT_DURATION_FORMAT: &str = "dd:hh:mm:ss.SSS";
