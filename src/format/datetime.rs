//! Datetime sub-formats and spreadsheet date serials
//!
//! Datetime columns carry a pattern such as `yyyy-MM-dd HH:mm:ss` in their
//! `%{...}D` token. Patterns are translated once into chrono format items and
//! used for both directions, independent of locale.

use chrono::format::{self, Item, Parsed, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::{CodecError, Result};

/// Default pattern used when encoding datetime columns
pub const DEFAULT_DATETIME_FORMAT: &str = "yyyy-MM-dd HH:mm:ss";

/// A validated datetime pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeFormat {
    pattern: String,
    strftime: String,
}

impl DateTimeFormat {
    /// Translate a `yyyy-MM-dd HH:mm:ss` style pattern
    pub fn parse(pattern: &str) -> Result<Self> {
        let err = |reason: String| CodecError::DateTimeFormatError {
            format: pattern.to_string(),
            reason,
        };

        if pattern.trim().is_empty() {
            return Err(err("empty pattern".to_string()));
        }

        let chars: Vec<char> = pattern.chars().collect();
        let mut strftime = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '\'' {
                // Quoted literal; '' is an escaped quote inside or outside quotes
                if chars.get(i + 1) == Some(&'\'') {
                    strftime.push('\'');
                    i += 2;
                    continue;
                }
                i += 1;
                loop {
                    match (chars.get(i), chars.get(i + 1)) {
                        (None, _) => return Err(err("unterminated quote".to_string())),
                        (Some('\''), Some('\'')) => {
                            strftime.push('\'');
                            i += 2;
                        }
                        (Some('\''), _) => {
                            i += 1;
                            break;
                        }
                        (Some(&lit), _) => {
                            push_literal(&mut strftime, lit);
                            i += 1;
                        }
                    }
                }
                continue;
            }

            if !c.is_ascii_alphabetic() {
                push_literal(&mut strftime, c);
                i += 1;
                continue;
            }

            let run = chars[i..].iter().take_while(|&&x| x == c).count();
            let spec = match (c, run) {
                ('y', 4) => "%Y",
                ('y', 2) => "%y",
                ('M', 4) => "%B",
                ('M', 3) => "%b",
                ('M', 2) => "%m",
                ('d', 2) => "%d",
                ('H', 2) => "%H",
                ('h', 2) => "%I",
                ('m', 2) => "%M",
                ('s', 2) => "%S",
                ('S', 3) => "%3f",
                ('S', 6) => "%6f",
                ('S', 9) => "%9f",
                ('a', 1) => "%p",
                _ => {
                    return Err(err(format!(
                        "unsupported field '{}'",
                        c.to_string().repeat(run)
                    )))
                }
            };
            strftime.push_str(spec);
            i += run;
        }

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(err("pattern does not translate".to_string()));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            strftime,
        })
    }

    /// The pattern as written in the format token
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, value: &NaiveDateTime) -> String {
        value.format(&self.strftime).to_string()
    }

    /// Check that a value survives format then parse unchanged
    pub fn is_exact(&self, value: &NaiveDateTime) -> bool {
        self.parse_value(&self.format(value))
            .is_ok_and(|back| back == *value)
    }

    /// Parse text; date-only patterns yield midnight
    pub fn parse_value(&self, text: &str) -> std::result::Result<NaiveDateTime, String> {
        let text = text.trim();
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, text, StrftimeItems::new(&self.strftime))
            .map_err(|e| format!("'{}' does not match '{}': {}", text, self.pattern, e))?;

        let date = parsed
            .to_naive_date()
            .map_err(|e| format!("'{}' has no complete date: {}", text, e))?;
        match parsed.to_naive_time() {
            Ok(time) => Ok(date.and_time(time)),
            Err(_) => date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| format!("'{}' is out of range", text)),
        }
    }
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Convert a 1900-system spreadsheet serial number to a datetime.
///
/// Serial 1 is 1900-01-01. The system counts a non-existent 1900-02-29
/// (serial 60), so serials from 61 on are offset by one day.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = if serial >= 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    };
    let millis = (serial * 86_400_000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    let offset = TimeDelta::try_milliseconds(millis as i64)?;
    epoch.and_hms_opt(0, 0, 0)?.checked_add_signed(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_default_pattern() {
        let format = DateTimeFormat::parse(DEFAULT_DATETIME_FORMAT).unwrap();
        let value = dt(2021, 3, 14, 15, 9, 26);
        assert_eq!(format.format(&value), "2021-03-14 15:09:26");
        assert_eq!(format.parse_value("2021-03-14 15:09:26").unwrap(), value);
    }

    #[test]
    fn test_quoted_literals_and_fractions() {
        let format = DateTimeFormat::parse("yyyy-MM-dd'T'HH:mm:ss.SSS").unwrap();
        let value = dt(2020, 1, 2, 3, 4, 5) + TimeDelta::milliseconds(678);
        assert_eq!(format.format(&value), "2020-01-02T03:04:05.678");
        assert_eq!(format.parse_value("2020-01-02T03:04:05.678").unwrap(), value);

        let format = DateTimeFormat::parse("dd 'o''clock' yyyy").unwrap();
        assert_eq!(format.format(&dt(2020, 1, 5, 0, 0, 0)), "05 o'clock 2020");
    }

    #[test]
    fn test_date_only_is_midnight() {
        let format = DateTimeFormat::parse("dd.MM.yyyy").unwrap();
        assert_eq!(
            format.parse_value("31.12.1999").unwrap(),
            dt(1999, 12, 31, 0, 0, 0)
        );
        assert!(format.parse_value("1999-12-31").is_err());
    }

    #[test]
    fn test_sub_second_precision() {
        let value = dt(2024, 6, 1, 12, 0, 0) + TimeDelta::milliseconds(250);

        let default = DateTimeFormat::parse(DEFAULT_DATETIME_FORMAT).unwrap();
        assert!(default.is_exact(&dt(2024, 6, 1, 12, 0, 0)));
        assert!(!default.is_exact(&value));

        let millis = DateTimeFormat::parse("yyyy-MM-dd HH:mm:ss.SSS").unwrap();
        assert!(millis.is_exact(&value));
    }

    #[test]
    fn test_twelve_hour_clock() {
        let format = DateTimeFormat::parse("MMM dd yyyy hh:mm a").unwrap();
        let value = dt(2022, 7, 4, 18, 30, 0);
        assert_eq!(format.format(&value), "Jul 04 2022 06:30 PM");
        assert_eq!(format.parse_value("Jul 04 2022 06:30 PM").unwrap(), value);
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["yyy-MM", "yyyy-MM-dd'T", "yyyy Q", "HH:mm:ss.SS"] {
            assert!(
                matches!(
                    DateTimeFormat::parse(bad),
                    Err(CodecError::DateTimeFormatError { .. })
                ),
                "accepted {:?}",
                bad
            );
        }
        // Percent signs are literal
        let format = DateTimeFormat::parse("yyyy%").unwrap();
        assert_eq!(format.format(&dt(2001, 1, 1, 0, 0, 0)), "2001%");
    }

    #[test]
    fn test_excel_serials() {
        assert_eq!(from_excel_serial(1.0).unwrap(), dt(1900, 1, 1, 0, 0, 0));
        assert_eq!(from_excel_serial(59.0).unwrap(), dt(1900, 2, 28, 0, 0, 0));
        assert_eq!(from_excel_serial(61.0).unwrap(), dt(1900, 3, 1, 0, 0, 0));
        assert_eq!(from_excel_serial(44197.5).unwrap(), dt(2021, 1, 1, 12, 0, 0));
        assert!(from_excel_serial(f64::NAN).is_none());
    }
}
