//! Spreadsheet engine API.
//!
//! This module provides the computation side of the grid:
//!
//! - [`Cell`], [`CellType`], [`Style`] - Cell content model
//! - [`CellRef`], [`parse_key`], [`build_key`] - Cell key codec (A1 notation ↔ col/row indices)
//! - [`preprocess_formula`] - Rewrite formulas for Rhai evaluation
//! - [`FormulaEvaluator`], [`evaluate_formula`] - Evaluate formulas against a numeric snapshot
//! - [`Aggregate`] - Aggregate kernels shared with batch operations
//! - [`format_number`] - Lossless number text for display and storage

mod aggregate;
mod cell;
mod cell_ref;
mod eval;
mod format;
mod preprocess;

pub use aggregate::Aggregate;
pub use cell::{
    Cell, CellType, FontWeight, NumericSnapshot, Style, StylePatch, TextAlign, parse_number,
};
pub use cell_ref::{CellRef, build_key, letters_to_col, parse_key};
pub use eval::{ERROR_MARKER, FormulaEvaluator, FormulaValue, create_engine, evaluate_formula};
pub use format::format_number;
pub use preprocess::preprocess_formula;

pub use rhai::Dynamic;
