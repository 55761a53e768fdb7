//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between cell keys (e.g., "A1", "B2",
//! "AA100") and zero-indexed column/row coordinates. Column labels are
//! bijective base-26: there is no zero digit, so `Z` is followed by `AA`.
//!
//! # Examples
//!
//! ```
//! use minisheet_engine::engine::CellRef;
//!
//! let cell: CellRef = "B3".parse().unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{EngineError, Result};

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<letters>[A-Z]+)(?<numbers>[0-9]+)$").expect("cell key regex must compile")
});

/// A reference to a cell by column and row indices (0-indexed).
///
/// Ordering is row-major (row first, then column), which is the order batch
/// and sort operations walk a selection in.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell key (e.g., "A1", "B2", "AA10"). Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(key: &str) -> Option<CellRef> {
        let (label, row) = parse_key(key).ok()?;
        let col = letters_to_col(&label)?;
        Some(CellRef::new(col, row - 1))
    }

    /// Convert column index to a bijective base-26 label (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Column label of this reference.
    pub fn label(&self) -> String {
        Self::col_to_letters(self.col)
    }

    /// Same column, next row.
    pub fn next_row(&self) -> CellRef {
        CellRef::new(self.col, self.row + 1)
    }

    /// Next column, same row.
    pub fn next_col(&self) -> CellRef {
        CellRef::new(self.col + 1, self.row)
    }

    /// Move by a delta, clamping at column A and row 1. Moving right/down is unbounded.
    pub fn offset(&self, d_col: isize, d_row: isize) -> CellRef {
        CellRef::new(
            self.col.saturating_add_signed(d_col),
            self.row.saturating_add_signed(d_row),
        )
    }
}

/// Inverse of [`CellRef::col_to_letters`]. Returns None for empty, non-uppercase
/// or overflowing labels.
pub fn letters_to_col(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }
    let mut acc = 0usize;
    for c in label.bytes() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        let digit = (c - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    acc.checked_sub(1)
}

/// Split a key into its column label and 1-based row number.
pub fn parse_key(key: &str) -> Result<(String, usize)> {
    let invalid = || EngineError::InvalidKey(key.to_string());
    let caps = KEY_RE.captures(key).ok_or_else(invalid)?;
    let label = &caps["letters"];
    let row = caps["numbers"].parse::<usize>().map_err(|_| invalid())?;
    if row == 0 || letters_to_col(label).is_none() {
        return Err(invalid());
    }
    Ok((label.to_string(), row))
}

/// Build a key from a column label and a 1-based row number.
pub fn build_key(label: &str, row: usize) -> String {
    format!("{}{}", label, row)
}

impl std::str::FromStr for CellRef {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let (label, row) = parse_key(s)?;
        let col = letters_to_col(&label).ok_or_else(|| EngineError::InvalidKey(s.to_string()))?;
        Ok(CellRef::new(col, row - 1))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_spot_values() {
        assert_eq!(CellRef::col_to_letters(0), "A");
        assert_eq!(CellRef::col_to_letters(25), "Z");
        assert_eq!(CellRef::col_to_letters(26), "AA");
        assert_eq!(CellRef::col_to_letters(701), "ZZ");
        assert_eq!(CellRef::col_to_letters(702), "AAA");
    }

    #[test]
    fn test_label_roundtrip_over_length_boundaries() {
        for i in (0..20_000).chain([18_277, 18_278, 475_253, 475_254]) {
            let label = CellRef::col_to_letters(i);
            assert_eq!(letters_to_col(&label), Some(i), "label {}", label);
        }
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("B12").unwrap(), ("B".to_string(), 12));
        assert_eq!(parse_key("AB3").unwrap(), ("AB".to_string(), 3));
        assert_eq!(
            parse_key("3B"),
            Err(EngineError::InvalidKey("3B".to_string()))
        );
    }

    #[test]
    fn test_parse_key_rejects_malformed() {
        for key in ["", "A", "12", "A0", "a1", "A 1", "A1B", "A-1"] {
            assert!(parse_key(key).is_err(), "{:?} should be invalid", key);
        }
    }

    #[test]
    fn test_parse_key_overflow_is_invalid() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(parse_key(&huge).is_err());
        assert!(CellRef::from_str(&huge).is_none());
    }

    #[test]
    fn test_build_parse_roundtrip() {
        for key in ["A1", "Z99", "AA1", "ZZ700", "AAA3"] {
            let (label, row) = parse_key(key).unwrap();
            assert_eq!(build_key(&label, row), key);
        }
    }

    #[test]
    fn test_display_and_from_str() {
        let cell: CellRef = "AB3".parse().unwrap();
        assert_eq!(cell, CellRef::new(27, 2));
        assert_eq!(cell.to_string(), "AB3");
    }

    #[test]
    fn test_offset_clamps_at_origin() {
        let a1 = CellRef::new(0, 0);
        assert_eq!(a1.offset(-1, 0), a1);
        assert_eq!(a1.offset(0, -1), a1);
        assert_eq!(a1.offset(1, 1), CellRef::new(1, 1));
        assert_eq!(CellRef::new(25, 0).next_col().to_string(), "AA1");
    }

    #[test]
    fn test_ordering_is_row_major() {
        let mut refs = vec![CellRef::new(1, 0), CellRef::new(0, 1), CellRef::new(0, 0)];
        refs.sort();
        assert_eq!(
            refs,
            vec![CellRef::new(0, 0), CellRef::new(1, 0), CellRef::new(0, 1)]
        );
    }
}
