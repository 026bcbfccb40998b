//! Spreadsheet cell addresses ("A1" notation)
//!
//! Column letters use bijective base-26: there is no zero digit, so column 26
//! is `Z`, column 27 is `AA` and column 703 is `AAA`. Rows and columns are
//! 1-based throughout this module.

use std::fmt;

/// Convert a 1-based column number to its letters. Returns `None` for 0.
pub fn column_name(column: usize) -> Option<String> {
    if column == 0 {
        return None;
    }

    let mut letters = Vec::new();
    let mut n = column;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();

    // Only ASCII capitals are ever pushed
    Some(letters.into_iter().map(char::from).collect())
}

/// Inverse of [`column_name`]. Accepts upper or lower case letters.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }

    letters.chars().try_fold(0usize, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// A single cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: usize,
    pub column: usize,
}

impl CellAddress {
    /// Create an address; both coordinates must be at least 1
    pub fn new(row: usize, column: usize) -> Option<Self> {
        if row == 0 || column == 0 {
            return None;
        }
        Some(Self { row, column })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = column_name(self.column).unwrap_or_default();
        write!(f, "{}{}", letters, self.row)
    }
}

impl std::str::FromStr for CellAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| format!("Invalid cell address: {}", s))?;
        let (letters, digits) = s.split_at(split);
        let column =
            column_index(letters).ok_or_else(|| format!("Invalid column letters: {}", s))?;
        let row: usize = digits
            .parse()
            .map_err(|_| format!("Invalid row number: {}", s))?;
        CellAddress::new(row, column).ok_or_else(|| format!("Invalid cell address: {}", s))
    }
}

/// A rectangular block of cells, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Range covering `rows` x `columns` cells starting at the given corner.
    /// Returns `None` for an empty block.
    pub fn for_block(
        first_row: usize,
        first_column: usize,
        rows: usize,
        columns: usize,
    ) -> Option<Self> {
        if rows == 0 || columns == 0 {
            return None;
        }
        let start = CellAddress::new(first_row, first_column)?;
        let end = CellAddress::new(first_row + rows - 1, first_column + columns - 1)?;
        Some(Self { start, end })
    }

    pub fn row_count(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn column_count(&self) -> usize {
        self.end.column - self.start.column + 1
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), None);
        assert_eq!(column_name(1).as_deref(), Some("A"));
        assert_eq!(column_name(26).as_deref(), Some("Z"));
        assert_eq!(column_name(27).as_deref(), Some("AA"));
        assert_eq!(column_name(52).as_deref(), Some("AZ"));
        assert_eq!(column_name(702).as_deref(), Some("ZZ"));
        assert_eq!(column_name(703).as_deref(), Some("AAA"));
        assert_eq!(column_name(16384).as_deref(), Some("XFD"));
    }

    #[test]
    fn test_column_index_inverts_name() {
        for col in [1, 25, 26, 27, 700, 702, 703, 18278, 18279] {
            let name = column_name(col).unwrap();
            assert_eq!(column_index(&name), Some(col));
        }
        assert_eq!(column_index("xfd"), Some(16384));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_range_display() {
        let range = CellRange::for_block(1, 1, 4, 3).unwrap();
        assert_eq!(range.to_string(), "A1:C4");

        let data = CellRange::for_block(5, 1, 10, 27).unwrap();
        assert_eq!(data.to_string(), "A5:AA14");
        assert_eq!(data.row_count(), 10);
        assert_eq!(data.column_count(), 27);

        assert!(CellRange::for_block(5, 1, 0, 3).is_none());
    }

    #[test]
    fn test_parse_address() {
        let addr: CellAddress = "AB12".parse().unwrap();
        assert_eq!(addr, CellAddress { row: 12, column: 28 });
        assert!("12".parse::<CellAddress>().is_err());
        assert!("A0".parse::<CellAddress>().is_err());
    }
}
