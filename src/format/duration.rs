//! Duration sub-format interpreter
//!
//! Two grammars are accepted inside `%{...}T`:
//! - a single unit tag (`y`, `d`, `h`, `m`, `s`): the cell holds a decimal
//!   count of that unit;
//! - a digital timer (`dd:hh:mm:ss`, `hh:mm:ss`, `mm:ss`, `hh:mm`), optionally
//!   followed by `.` and 1-9 `S` characters for fractional seconds.
//!
//! A sign is only accepted on the leading field and applies to the whole
//! value, as on a clock display.

use std::fmt;

use chrono::TimeDelta;
use regex::Regex;

use crate::error::{CodecError, Result};

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Total nanoseconds of a duration
pub(crate) fn to_nanos(d: TimeDelta) -> i128 {
    d.num_seconds() as i128 * NANOS_PER_SEC + d.subsec_nanos() as i128
}

/// Duration from total nanoseconds, `None` when out of range
pub(crate) fn from_nanos(nanos: i128) -> Option<TimeDelta> {
    let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC)).ok()?;
    let sub = nanos.rem_euclid(NANOS_PER_SEC) as u32;
    TimeDelta::new(secs, sub)
}

/// Unit of a single-unit duration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    /// 365.2425 days
    Years,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl DurationUnit {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "y" => Some(DurationUnit::Years),
            "d" => Some(DurationUnit::Days),
            "h" => Some(DurationUnit::Hours),
            "m" => Some(DurationUnit::Minutes),
            "s" => Some(DurationUnit::Seconds),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            DurationUnit::Years => "y",
            DurationUnit::Days => "d",
            DurationUnit::Hours => "h",
            DurationUnit::Minutes => "m",
            DurationUnit::Seconds => "s",
        }
    }

    /// Length of one unit in whole seconds
    pub fn seconds(self) -> i64 {
        match self {
            DurationUnit::Years => 31_556_952,
            DurationUnit::Days => 86_400,
            DurationUnit::Hours => 3_600,
            DurationUnit::Minutes => 60,
            DurationUnit::Seconds => 1,
        }
    }

    /// Duration of `count` units, rounded to the nearest nanosecond
    pub fn to_duration(self, count: f64) -> Option<TimeDelta> {
        if !count.is_finite() {
            return None;
        }
        let nanos = count * self.seconds() as f64 * 1e9;
        if nanos.abs() >= i128::MAX as f64 {
            return None;
        }
        from_nanos(nanos.round() as i128)
    }

    /// Number of units in `d`
    pub fn count(self, d: TimeDelta) -> f64 {
        to_nanos(d) as f64 / (self.seconds() as f64 * 1e9)
    }
}

/// Field combination of a digital-timer format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerLayout {
    DaysHoursMinutesSeconds,
    HoursMinutesSeconds,
    MinutesSeconds,
    HoursMinutes,
}

impl TimerLayout {
    fn from_template(template: &str) -> Option<Self> {
        match template {
            "dd:hh:mm:ss" => Some(TimerLayout::DaysHoursMinutesSeconds),
            "hh:mm:ss" => Some(TimerLayout::HoursMinutesSeconds),
            "mm:ss" => Some(TimerLayout::MinutesSeconds),
            "hh:mm" => Some(TimerLayout::HoursMinutes),
            _ => None,
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            TimerLayout::DaysHoursMinutesSeconds => "dd:hh:mm:ss",
            TimerLayout::HoursMinutesSeconds => "hh:mm:ss",
            TimerLayout::MinutesSeconds => "mm:ss",
            TimerLayout::HoursMinutes => "hh:mm",
        }
    }

    /// Seconds per field, leading field first
    fn field_seconds(self) -> &'static [i128] {
        match self {
            TimerLayout::DaysHoursMinutesSeconds => &[86_400, 3_600, 60, 1],
            TimerLayout::HoursMinutesSeconds => &[3_600, 60, 1],
            TimerLayout::MinutesSeconds => &[60, 1],
            TimerLayout::HoursMinutes => &[3_600, 60],
        }
    }

    /// Smallest field, in seconds
    fn resolution(self) -> i128 {
        self.field_seconds().last().copied().unwrap_or(1)
    }
}

/// A validated duration sub-format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationFormat {
    Unit(DurationUnit),
    Timer {
        layout: TimerLayout,
        /// Number of fractional-second digits, 0-9
        fraction_digits: u32,
    },
}

impl DurationFormat {
    /// Parse a sub-format string, e.g. `hh:mm:ss.SSS` or `h`
    pub fn parse(subformat: &str) -> Result<Self> {
        let invalid = || CodecError::DurationFormatError(subformat.to_string());

        if let Some(unit) = DurationUnit::from_tag(subformat) {
            return Ok(DurationFormat::Unit(unit));
        }

        let (template, fraction) = match subformat.split_once('.') {
            Some((t, f)) => (t, Some(f)),
            None => (subformat, None),
        };
        let layout = TimerLayout::from_template(template).ok_or_else(invalid)?;

        let fraction_digits = match fraction {
            None => 0,
            Some(marks) => {
                let valid = (1..=9).contains(&marks.len()) && marks.chars().all(|c| c == 'S');
                // Fractions need a seconds field to attach to
                if !valid || layout == TimerLayout::HoursMinutes {
                    return Err(invalid());
                }
                marks.len() as u32
            }
        };

        Ok(DurationFormat::Timer {
            layout,
            fraction_digits,
        })
    }

    /// Unit used for native numeric cells: the named unit, otherwise days
    pub fn numeric_unit(&self) -> DurationUnit {
        match self {
            DurationFormat::Unit(unit) => *unit,
            DurationFormat::Timer { .. } => DurationUnit::Days,
        }
    }

    /// Build the text parser for this format
    pub fn parser(&self) -> DurationParser {
        let pattern = match self {
            DurationFormat::Unit(_) => None,
            DurationFormat::Timer {
                layout,
                fraction_digits,
            } => {
                let fields = vec![r"(\d+)"; layout.field_seconds().len()].join(":");
                let fraction = if *fraction_digits > 0 {
                    format!(r"(?:\.(\d{{{}}}))?", fraction_digits)
                } else {
                    String::new()
                };
                let source = format!(r"^([+-])?{}{}$", fields, fraction);
                // Built only from fixed fragments and a digit count
                Some(Regex::new(&source).expect("timer pattern is well-formed"))
            }
        };
        DurationParser {
            format: self.clone(),
            pattern,
        }
    }

    /// Format finite durations as text. Timer output is padded so every
    /// entry has the same width.
    pub fn format_all(&self, values: &[TimeDelta]) -> Vec<String> {
        match self {
            DurationFormat::Unit(unit) => values.iter().map(|d| unit.count(*d).to_string()).collect(),
            DurationFormat::Timer {
                layout,
                fraction_digits,
            } => {
                let parts: Vec<TimerParts> = values
                    .iter()
                    .map(|d| TimerParts::split(*d, *layout, *fraction_digits))
                    .collect();
                let width = parts
                    .iter()
                    .map(|p| p.lead.len() + usize::from(p.negative))
                    .max()
                    .unwrap_or(0)
                    .max(2);
                parts.iter().map(|p| p.render(width)).collect()
            }
        }
    }

    /// Format a single duration (no cross-row padding beyond two digits)
    pub fn format(&self, value: TimeDelta) -> String {
        self.format_all(&[value]).remove(0)
    }
}

impl fmt::Display for DurationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationFormat::Unit(unit) => f.write_str(unit.tag()),
            DurationFormat::Timer {
                layout,
                fraction_digits,
            } => {
                f.write_str(layout.template())?;
                if *fraction_digits > 0 {
                    write!(f, ".{}", "S".repeat(*fraction_digits as usize))?;
                }
                Ok(())
            }
        }
    }
}

/// Fields of one timer rendering before padding
struct TimerParts {
    negative: bool,
    lead: String,
    rest: String,
}

impl TimerParts {
    fn split(d: TimeDelta, layout: TimerLayout, fraction_digits: u32) -> Self {
        let nanos = to_nanos(d);
        let negative = nanos < 0;
        let magnitude = nanos.unsigned_abs() as i128;

        // Round to the smallest displayed step
        let step = if fraction_digits > 0 {
            10i128.pow(9 - fraction_digits)
        } else {
            layout.resolution() * NANOS_PER_SEC
        };
        let ticks = (magnitude + step / 2) / step;

        let (mut remaining, fraction) = if fraction_digits > 0 {
            let per_sec = 10i128.pow(fraction_digits);
            (ticks / per_sec, ticks % per_sec)
        } else {
            (ticks * layout.resolution(), 0)
        };

        let mut fields = Vec::new();
        for &secs in layout.field_seconds() {
            fields.push(remaining / secs);
            remaining %= secs;
        }

        let lead = fields[0].to_string();
        let mut rest: String = fields[1..]
            .iter()
            .map(|v| format!(":{:02}", v))
            .collect();
        if fraction_digits > 0 {
            rest.push_str(&format!(
                ".{:0width$}",
                fraction,
                width = fraction_digits as usize
            ));
        }

        Self {
            // A value that rounds to zero is printed unsigned
            negative: negative && ticks > 0,
            lead,
            rest,
        }
    }

    fn render(&self, width: usize) -> String {
        let sign = if self.negative { "-" } else { "" };
        format!(
            "{}{:0>pad$}{}",
            sign,
            self.lead,
            self.rest,
            pad = width - sign.len()
        )
    }
}

/// Text -> duration conversion for one sub-format
#[derive(Debug, Clone)]
pub struct DurationParser {
    format: DurationFormat,
    pattern: Option<Regex>,
}

impl DurationParser {
    pub fn format(&self) -> &DurationFormat {
        &self.format
    }

    /// Parse one cell's text
    pub fn parse(&self, text: &str) -> std::result::Result<TimeDelta, String> {
        let text = text.trim();
        match (&self.format, &self.pattern) {
            (DurationFormat::Unit(unit), _) => {
                let count: f64 = text
                    .parse()
                    .map_err(|_| format!("'{}' is not a number of {}", text, unit.tag()))?;
                unit.to_duration(count)
                    .ok_or_else(|| format!("'{}' is out of range", text))
            }
            (
                DurationFormat::Timer {
                    layout,
                    fraction_digits,
                },
                Some(pattern),
            ) => {
                let caps = pattern
                    .captures(text)
                    .ok_or_else(|| format!("'{}' does not match '{}'", text, self.format))?;
                let out_of_range = || format!("'{}' is out of range", text);

                let mut nanos: i128 = 0;
                for (i, &secs) in layout.field_seconds().iter().enumerate() {
                    let field: i128 = caps[i + 2].parse().map_err(|_| out_of_range())?;
                    nanos = field
                        .checked_mul(secs * NANOS_PER_SEC)
                        .and_then(|v| v.checked_add(nanos))
                        .ok_or_else(out_of_range)?;
                }

                let fraction_group = layout.field_seconds().len() + 2;
                if let Some(frac) = caps.get(fraction_group) {
                    let digits: i128 = frac.as_str().parse().map_err(|_| out_of_range())?;
                    nanos += digits * NANOS_PER_SEC / 10i128.pow(*fraction_digits);
                }

                if caps.get(1).is_some_and(|m| m.as_str() == "-") {
                    nanos = -nanos;
                }
                from_nanos(nanos).ok_or_else(out_of_range)
            }
            (DurationFormat::Timer { .. }, None) => {
                Err(format!("no text pattern for '{}'", self.format))
            }
        }
    }
}

/// Interpret a sub-format: the parser plus its field layout
pub fn interpret(subformat: &str) -> Result<DurationParser> {
    Ok(DurationFormat::parse(subformat)?.parser())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: i64, m: i64, s: i64, ms: i64) -> TimeDelta {
        TimeDelta::hours(h) + TimeDelta::minutes(m) + TimeDelta::seconds(s) + TimeDelta::milliseconds(ms)
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(
            DurationFormat::parse("h").unwrap(),
            DurationFormat::Unit(DurationUnit::Hours)
        );
        assert_eq!(
            DurationFormat::parse("dd:hh:mm:ss.SSS").unwrap(),
            DurationFormat::Timer {
                layout: TimerLayout::DaysHoursMinutesSeconds,
                fraction_digits: 3
            }
        );
        assert_eq!(
            DurationFormat::parse("mm:ss").unwrap().to_string(),
            "mm:ss"
        );
        for bad in ["", "hh", "hh:mm:ss.", "hh:mm:ss.SSSSSSSSSS", "hh:mm:ss.SSx", "hh:mm.S", "x"] {
            assert!(
                matches!(DurationFormat::parse(bad), Err(CodecError::DurationFormatError(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_width_stable_round_trip() {
        let format = DurationFormat::parse("hh:mm:ss.SSS").unwrap();
        let value = hms(11, 2, 59, 539);
        let text = format.format(value);
        assert_eq!(text, "11:02:59.539");
        assert_eq!(format.parser().parse(&text).unwrap(), value);
    }

    #[test]
    fn test_column_padding() {
        let format = DurationFormat::parse("hh:mm:ss").unwrap();
        let texts = format.format_all(&[hms(1, 0, 0, 0), hms(123, 4, 5, 0), -hms(0, 30, 0, 0)]);
        assert_eq!(texts, vec!["001:00:00", "123:04:05", "-00:30:00"]);
        assert!(texts.iter().all(|t| t.len() == texts[0].len()));

        let parser = format.parser();
        assert_eq!(parser.parse("-00:30:00").unwrap(), -hms(0, 30, 0, 0));
        assert_eq!(parser.parse("001:00:00").unwrap(), hms(1, 0, 0, 0));
    }

    #[test]
    fn test_days_layout() {
        let format = DurationFormat::parse("dd:hh:mm:ss.SSS").unwrap();
        let value = TimeDelta::days(2) + hms(3, 4, 5, 6);
        assert_eq!(format.format(value), "02:03:04:05.006");
        assert_eq!(format.parser().parse("02:03:04:05.006").unwrap(), value);
    }

    #[test]
    fn test_rounding_carries() {
        let format = DurationFormat::parse("mm:ss.S").unwrap();
        assert_eq!(format.format(hms(0, 0, 59, 960)), "01:00.0");

        let format = DurationFormat::parse("hh:mm").unwrap();
        assert_eq!(format.format(hms(1, 29, 45, 0)), "01:30");
    }

    #[test]
    fn test_timer_rejects_bad_text() {
        let parser = interpret("hh:mm:ss.SS").unwrap();
        assert!(parser.parse("1:2").is_err());
        assert!(parser.parse("01:02:03.4").is_err());
        assert!(parser.parse("01:-02:03").is_err());
        assert!(parser.parse("01:02:03").is_ok());
        assert_eq!(
            parser.parse("+00:00:01.25").unwrap(),
            TimeDelta::milliseconds(1250)
        );
    }

    #[test]
    fn test_unit_format() {
        let parser = interpret("h").unwrap();
        assert_eq!(parser.parse("1.5").unwrap(), TimeDelta::minutes(90));
        assert!(parser.parse("abc").is_err());

        let format = DurationFormat::parse("m").unwrap();
        assert_eq!(format.format(TimeDelta::seconds(90)), "1.5");

        assert_eq!(
            DurationUnit::Years.to_duration(1.0).unwrap(),
            TimeDelta::seconds(31_556_952)
        );
        assert_eq!(
            DurationFormat::parse("hh:mm:ss").unwrap().numeric_unit(),
            DurationUnit::Days
        );
    }

    #[test]
    fn test_nanos_round_trip() {
        let d = -TimeDelta::milliseconds(1500);
        assert_eq!(to_nanos(d), -1_500_000_000);
        assert_eq!(from_nanos(-1_500_000_000), Some(d));
    }
}
