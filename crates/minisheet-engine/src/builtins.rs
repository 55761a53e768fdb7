//! Built-in spreadsheet functions (Rust) registered into the Rhai engine.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `PRINT`).
//! - Aggregates take one array argument; the preprocessor collects call
//!   arguments into `[...]`, and nested arrays from `RANGE` are flattened.
//! - `CELL`/`RANGE` read the numeric snapshot only; missing cells are `0`.

use crate::engine::{Aggregate, CellRef, NumericSnapshot};
use rhai::{Array, Dynamic, Engine, EvalAltResult, Position};

use std::sync::Arc;

/// Refuse ranges larger than this many cells.
const MAX_RANGE_CELLS: usize = 1_000_000;

fn invalid_arg(message: &str) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into(), Position::NONE).into()
}

fn to_index(value: i64) -> Result<usize, Box<EvalAltResult>> {
    usize::try_from(value).map_err(|_| invalid_arg("cell index must be >= 0"))
}

fn flatten_numbers(values: Array, out: &mut Vec<f64>) -> Result<(), Box<EvalAltResult>> {
    for value in values {
        if value.is_array() {
            let inner = value
                .into_array()
                .map_err(|_| invalid_arg("expected an array"))?;
            flatten_numbers(inner, out)?;
        } else if let Ok(n) = value.as_float() {
            out.push(n);
        } else if let Ok(n) = value.as_int() {
            out.push(n as f64);
        } else if let Ok(b) = value.as_bool() {
            out.push(if b { 1.0 } else { 0.0 });
        } else {
            return Err(invalid_arg("aggregate arguments must be numeric"));
        }
    }
    Ok(())
}

/// Truthiness of a condition: booleans as-is, non-zero numbers, non-empty strings.
fn truthy(value: &Dynamic) -> bool {
    if let Ok(b) = value.as_bool() {
        b
    } else if let Ok(n) = value.as_float() {
        n != 0.0
    } else if let Ok(n) = value.as_int() {
        n != 0
    } else if value.is_string() {
        value.clone().into_string().is_ok_and(|s| !s.is_empty())
    } else {
        !value.is_unit()
    }
}

/// Register all built-in functions into the Rhai engine.
pub fn register_builtins(engine: &mut Engine, snapshot: Arc<NumericSnapshot>) {
    // CELL(col, row): numeric value at cell, 0 when absent
    let cells = snapshot.clone();
    engine.register_fn(
        "CELL",
        move |col: i64, row: i64| -> Result<f64, Box<EvalAltResult>> {
            let cell_ref = CellRef::new(to_index(col)?, to_index(row)?);
            Ok(cells.get(&cell_ref).copied().unwrap_or(0.0))
        },
    );

    // RANGE(c1, r1, c2, r2): row-major array of the rectangle's numeric values
    let cells = snapshot;
    engine.register_fn(
        "RANGE",
        move |c1: i64, r1: i64, c2: i64, r2: i64| -> Result<Array, Box<EvalAltResult>> {
            let (c1, r1, c2, r2) = (to_index(c1)?, to_index(r1)?, to_index(c2)?, to_index(r2)?);
            let (min_col, max_col) = (c1.min(c2), c1.max(c2));
            let (min_row, max_row) = (r1.min(r2), r1.max(r2));
            let count = (max_col - min_col + 1).saturating_mul(max_row - min_row + 1);
            if count > MAX_RANGE_CELLS {
                return Err(invalid_arg("range too large"));
            }
            let mut values = Array::with_capacity(count);
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    let n = cells.get(&CellRef::new(col, row)).copied().unwrap_or(0.0);
                    values.push(Dynamic::from(n));
                }
            }
            Ok(values)
        },
    );

    engine.register_fn("TRUTHY", |value: Dynamic| -> bool { truthy(&value) });

    // PRINT(x): the argument, verbatim
    engine.register_fn("PRINT", |value: Dynamic| -> Dynamic { value });

    for agg in Aggregate::ALL.into_iter().filter(|agg| agg.is_variadic()) {
        let mut names = vec![agg.name().to_ascii_uppercase()];
        if agg == Aggregate::Average {
            names.push("AVG".to_string());
        }
        for name in names {
            engine.register_fn(
                name,
                move |values: Array| -> Result<f64, Box<EvalAltResult>> {
                    let mut numbers = Vec::with_capacity(values.len());
                    flatten_numbers(values, &mut numbers)?;
                    agg.apply(&numbers)
                        .ok_or_else(|| invalid_arg("aggregate of no values"))
                },
            );
        }
    }

    engine.register_fn("ABS", |x: f64| -> f64 { x.abs() });
    engine.register_fn("ROUND", |x: f64| -> f64 { x.round_ties_even() });
    engine.register_fn(
        "ROUND",
        |x: f64, digits: f64| -> Result<f64, Box<EvalAltResult>> {
            const MAX_DECIMALS: f64 = 12.0;
            if !(0.0..=MAX_DECIMALS).contains(&digits) {
                return Err(invalid_arg("digits must be between 0 and 12"));
            }
            let factor = 10f64.powi(digits as i32);
            Ok((x * factor).round_ties_even() / factor)
        },
    );
}
