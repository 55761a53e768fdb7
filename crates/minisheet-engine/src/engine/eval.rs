//! Rhai engine creation and formula evaluation.
//!
//! Creates the Rhai scripting engine with the spreadsheet built-ins registered
//! against a numeric snapshot of the sheet, and evaluates `=` formulas to a
//! [`FormulaValue`]. Any parse or evaluation failure becomes
//! [`FormulaValue::Error`], displayed as `#ERR`.
//!
//! There is no dependency graph or result cache: every evaluation recomputes
//! from the snapshot it is given.

use rhai::Engine;
use std::fmt;
use std::sync::Arc;

use super::format::format_number;
use super::preprocess::preprocess_formula;
use super::{Dynamic, NumericSnapshot};

/// Marker displayed in place of a failed formula.
pub const ERROR_MARKER: &str = "#ERR";

/// Result of evaluating a cell's raw text.
#[derive(Clone, Debug, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
    Error,
}

impl FormulaValue {
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error)
    }

    fn from_dynamic(value: Dynamic) -> FormulaValue {
        if value.is_unit() {
            FormulaValue::Empty
        } else if let Ok(n) = value.as_float() {
            if n.is_finite() {
                FormulaValue::Number(n)
            } else {
                FormulaValue::Error
            }
        } else if let Ok(n) = value.as_int() {
            FormulaValue::Number(n as f64)
        } else if let Ok(b) = value.as_bool() {
            FormulaValue::Bool(b)
        } else if value.is_string() {
            value
                .into_string()
                .map(FormulaValue::Text)
                .unwrap_or(FormulaValue::Error)
        } else {
            FormulaValue::Error
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Number(n) => f.write_str(&format_number(*n)),
            FormulaValue::Text(s) => f.write_str(s),
            FormulaValue::Bool(true) => f.write_str("TRUE"),
            FormulaValue::Bool(false) => f.write_str("FALSE"),
            FormulaValue::Empty => Ok(()),
            FormulaValue::Error => f.write_str(ERROR_MARKER),
        }
    }
}

/// Create a Rhai engine with built-ins registered against `snapshot`.
pub fn create_engine(snapshot: Arc<NumericSnapshot>) -> Engine {
    let mut engine = Engine::new();
    crate::builtins::register_builtins(&mut engine, snapshot);
    engine
}

/// Evaluates formulas against one snapshot.
///
/// Build one per render pass (or per evaluation); it holds no state besides
/// the snapshot, so the same formula always yields the same value.
pub struct FormulaEvaluator {
    engine: Engine,
}

impl FormulaEvaluator {
    pub fn new(snapshot: Arc<NumericSnapshot>) -> Self {
        FormulaEvaluator {
            engine: create_engine(snapshot),
        }
    }

    /// Evaluate raw cell text. Text not starting with `=` is returned unchanged.
    pub fn evaluate(&self, raw: &str) -> FormulaValue {
        match raw.trim_start().strip_prefix('=') {
            Some(source) => self.evaluate_source(source),
            None => FormulaValue::Text(raw.to_string()),
        }
    }

    /// Evaluate formula source (without the leading `=`).
    pub fn evaluate_source(&self, source: &str) -> FormulaValue {
        let Ok(script) = preprocess_formula(source) else {
            return FormulaValue::Error;
        };
        match self.engine.eval::<Dynamic>(&script) {
            Ok(value) => FormulaValue::from_dynamic(value),
            Err(_) => FormulaValue::Error,
        }
    }
}

/// One-shot evaluation of raw cell text against a snapshot.
pub fn evaluate_formula(raw: &str, snapshot: &NumericSnapshot) -> FormulaValue {
    FormulaEvaluator::new(Arc::new(snapshot.clone())).evaluate(raw)
}
