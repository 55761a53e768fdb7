//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellType`] - What a cell holds (empty, literal value, or formula), decided at write time
//! - [`Style`] - Per-cell presentation (font, size, alignment, weight)
//! - [`Cell`] - Content plus optional style
//! - [`NumericSnapshot`] - Read-only numeric view of a sheet used as formula scope

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::cell_ref::CellRef;

/// Read-only numeric view of every stored cell (non-numeric values are `0`).
pub type NumericSnapshot = HashMap<CellRef, f64>;

/// The type of content stored in a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    Empty,
    /// Literal text, number-like or not, exactly as entered.
    Value(String),
    /// Formula source without the leading `=`.
    Formula(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn from_name(name: &str) -> Option<TextAlign> {
        match name.to_ascii_lowercase().as_str() {
            "left" | "l" => Some(TextAlign::Left),
            "center" | "centre" | "c" => Some(TextAlign::Center),
            "right" | "r" => Some(TextAlign::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Presentation attributes of a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    pub font_family: String,
    pub font_size: u16,
    pub text_align: TextAlign,
    pub font_weight: FontWeight,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            font_family: "Calibri".to_string(),
            font_size: 14,
            text_align: TextAlign::Left,
            font_weight: FontWeight::Normal,
        }
    }
}

impl Style {
    /// Style used for cells written by batch operations.
    pub fn emphasis() -> Style {
        Style {
            font_weight: FontWeight::Bold,
            ..Style::default()
        }
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }
}

/// A partial style; `None` fields leave the target untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StylePatch {
    pub font_family: Option<String>,
    pub font_size: Option<u16>,
    pub text_align: Option<TextAlign>,
    pub font_weight: Option<FontWeight>,
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        self.font_family.is_none()
            && self.font_size.is_none()
            && self.text_align.is_none()
            && self.font_weight.is_none()
    }

    pub fn apply(&self, style: &mut Style) {
        if let Some(family) = &self.font_family {
            style.font_family = family.clone();
        }
        if let Some(size) = self.font_size {
            style.font_size = size;
        }
        if let Some(align) = self.text_align {
            style.text_align = align;
        }
        if let Some(weight) = self.font_weight {
            style.font_weight = weight;
        }
    }
}

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub contents: CellType,
    pub style: Option<Style>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell {
            contents: CellType::Empty,
            style: None,
        }
    }

    pub fn new_value(text: &str) -> Cell {
        Cell {
            contents: CellType::Value(text.to_string()),
            style: None,
        }
    }

    /// Create a formula cell from its source without the leading `=`.
    pub fn new_formula(source: &str) -> Cell {
        Cell {
            contents: CellType::Formula(source.to_string()),
            style: None,
        }
    }

    pub fn with_style(mut self, style: Option<Style>) -> Cell {
        self.style = style;
        self
    }

    /// Classify user input once, at write time.
    /// - Empty string or whitespace -> Empty
    /// - Starts with '=' (after leading whitespace) -> Formula (without the '=')
    /// - Otherwise -> Value, kept as typed
    pub fn from_input(input: &str) -> Cell {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Cell::new_empty();
        }
        if let Some(formula) = trimmed.strip_prefix('=') {
            return Cell::new_formula(formula);
        }
        Cell::new_value(input)
    }

    /// Raw (unformatted) text, as seeded into the editor.
    pub fn to_input_string(&self) -> String {
        match &self.contents {
            CellType::Empty => String::new(),
            CellType::Value(s) => s.clone(),
            CellType::Formula(s) => format!("={}", s),
        }
    }

    pub fn has_value(&self) -> bool {
        !matches!(self.contents, CellType::Empty)
    }

    /// A cell with neither a value nor a style is not stored at all.
    pub fn is_empty(&self) -> bool {
        !self.has_value() && self.style.is_none()
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.contents, CellType::Formula(_))
    }

    /// Numeric value of a literal cell, if it parses as a number.
    pub fn as_number(&self) -> Option<f64> {
        match &self.contents {
            CellType::Value(s) => parse_number(s),
            _ => None,
        }
    }

    /// Numeric coercion used by snapshots and aggregates (non-numeric -> 0).
    pub fn numeric(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }
}

/// Strict number detection: the whole (trimmed) string must be a finite float.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Reject words Rust's float parser accepts ("inf", "NaN", "infinity").
    if trimmed.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_classifies_once() {
        assert_eq!(Cell::from_input("  ").contents, CellType::Empty);
        assert_eq!(Cell::from_input("=A1+1").contents, CellType::Formula("A1+1".into()));
        assert_eq!(Cell::from_input("42").contents, CellType::Value("42".into()));
        assert_eq!(Cell::from_input("hello").contents, CellType::Value("hello".into()));
    }

    #[test]
    fn test_to_input_string_restores_equals() {
        assert_eq!(Cell::from_input("=2+2").to_input_string(), "=2+2");
        assert_eq!(Cell::new_empty().to_input_string(), "");
    }

    #[test]
    fn test_styled_blank_is_not_empty() {
        let cell = Cell::new_empty().with_style(Some(Style::emphasis()));
        assert!(!cell.has_value());
        assert!(!cell.is_empty());
        assert!(Cell::new_empty().is_empty());
    }

    #[test]
    fn test_parse_number_is_strict() {
        assert_eq!(parse_number("3"), Some(3.0));
        assert_eq!(parse_number(" -1.5 "), Some(-1.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_formula_cells_coerce_to_zero() {
        assert_eq!(Cell::from_input("=1+1").numeric(), 0.0);
        assert_eq!(Cell::from_input("text").numeric(), 0.0);
        assert_eq!(Cell::from_input("7").numeric(), 7.0);
    }

    #[test]
    fn test_style_patch_merges() {
        let mut style = Style::default();
        let patch = StylePatch {
            font_size: Some(20),
            text_align: Some(TextAlign::Right),
            ..StylePatch::default()
        };
        patch.apply(&mut style);
        assert_eq!(style.font_family, "Calibri");
        assert_eq!(style.font_size, 20);
        assert_eq!(style.text_align, TextAlign::Right);
    }
}
