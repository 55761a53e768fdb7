//! minisheet_engine - Cell addressing, cell model and Rhai-backed formulas.

pub(crate) mod builtins;
pub mod engine;
pub mod error;

pub use error::{EngineError, Result};

#[cfg(test)]
mod tests {
    use crate::engine::*;
    use std::sync::Arc;

    fn snapshot(values: &[(&str, f64)]) -> NumericSnapshot {
        values
            .iter()
            .map(|(key, n)| (CellRef::from_str(key).unwrap(), *n))
            .collect()
    }

    fn eval(raw: &str, values: &[(&str, f64)]) -> String {
        evaluate_formula(raw, &snapshot(values)).to_string()
    }

    #[test]
    fn test_plain_text_is_returned_unchanged() {
        assert_eq!(eval("hello", &[]), "hello");
        assert_eq!(eval("42", &[]), "42");
        assert_eq!(eval("", &[]), "");
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("=2+2", &[]), "4");
        assert_eq!(eval("=7/2", &[]), "3.5");
        assert_eq!(eval("=2^10", &[]), "1024");
        assert_eq!(eval("=-(3 - 5) * 2", &[]), "4");
        assert_eq!(eval("=10 % 4", &[]), "2");
    }

    #[test]
    fn test_cell_references() {
        assert_eq!(eval("=A1+B1", &[("A1", 3.0), ("B1", 4.0)]), "7");
        assert_eq!(eval("=A1+B1", &[("B1", 4.0)]), "4");
        assert_eq!(eval("=aa10*2", &[("AA10", 1.25)]), "2.5");
    }

    #[test]
    fn test_malformed_formulas_are_errors() {
        assert_eq!(eval("=(", &[]), ERROR_MARKER);
        assert_eq!(eval("=", &[]), ERROR_MARKER);
        assert_eq!(eval("=1 +", &[]), ERROR_MARKER);
        assert_eq!(eval("=NOSUCH(1)", &[]), ERROR_MARKER);
        assert_eq!(eval("=1/0", &[]), ERROR_MARKER);
        assert_eq!(eval("=\"a\" * 2", &[]), ERROR_MARKER);
    }

    #[test]
    fn test_block_conditional() {
        let formula = "=IF(A1>10) PRINT(\"High\") ELSEIF(A1>5) PRINT(\"Mid\") ELSE PRINT(\"Low\")";
        assert_eq!(eval(formula, &[("A1", 12.0)]), "High");
        assert_eq!(eval(formula, &[("A1", 7.0)]), "Mid");
        assert_eq!(eval(formula, &[("A1", 1.0)]), "Low");
        assert_eq!(eval(formula, &[]), "Low");
    }

    #[test]
    fn test_block_conditional_without_else_is_empty() {
        assert_eq!(eval("=IF(A1) PRINT(1)", &[]), "");
        assert_eq!(eval("=IF(A1) PRINT(1)", &[("A1", 2.0)]), "1");
    }

    #[test]
    fn test_function_conditional() {
        assert_eq!(eval("=IF(A1 = 3, \"yes\", \"no\")", &[("A1", 3.0)]), "yes");
        assert_eq!(eval("=IF(A1 <> 3, 1, 0)", &[("A1", 3.0)]), "0");
        assert_eq!(eval("=IF(A1 > 0 AND B1 > 0, 1, 0)", &[("A1", 1.0)]), "0");
    }

    #[test]
    fn test_print_returns_argument() {
        assert_eq!(eval("=PRINT(\"hi\")", &[]), "hi");
        assert_eq!(eval("=PRINT(A1)", &[("A1", 1.5)]), "1.5");
    }

    #[test]
    fn test_booleans_display_upper_case() {
        assert_eq!(eval("=1 < 2", &[]), "TRUE");
        assert_eq!(eval("=NOT TRUE", &[]), "FALSE");
    }

    #[test]
    fn test_aggregates_over_ranges() {
        let values = [("A1", 1.0), ("A2", 2.0), ("A3", 3.0), ("B1", 10.0)];
        assert_eq!(eval("=SUM(A1:A3)", &values), "6");
        assert_eq!(eval("=AVERAGE(A1:A3)", &values), "2");
        assert_eq!(eval("=AVG(A1:A3, B1)", &values), "4");
        assert_eq!(eval("=MAX(A1:B3)", &values), "10");
        assert_eq!(eval("=MIN(A1:B3)", &values), "0");
        assert_eq!(eval("=COUNT(A1:A3)", &values), "3");
        assert_eq!(eval("=PRODUCT(A1:A3)", &values), "6");
        assert_eq!(eval("=SUM()", &values), ERROR_MARKER);
    }

    #[test]
    fn test_scalar_functions() {
        assert_eq!(eval("=ABS(-2.5)", &[]), "2.5");
        assert_eq!(eval("=ROUND(2.5)", &[]), "2");
        assert_eq!(eval("=ROUND(3.5)", &[]), "4");
        assert_eq!(eval("=ROUND(-2.5)", &[]), "-2");
        assert_eq!(eval("=ROUND(0.125, 2)", &[]), "0.12");
        assert_eq!(eval("=ROUND(3.14159, 2)", &[]), "3.14");
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let snap = Arc::new(snapshot(&[("A1", 2.0), ("B2", 5.0)]));
        let evaluator = FormulaEvaluator::new(snap.clone());
        let first = evaluator.evaluate("=A1*B2 + SUM(A1:B2)");
        for _ in 0..10 {
            assert_eq!(evaluator.evaluate("=A1*B2 + SUM(A1:B2)"), first);
            assert_eq!(FormulaEvaluator::new(snap.clone()).evaluate("=A1*B2 + SUM(A1:B2)"), first);
        }
        assert_eq!(first, FormulaValue::Number(17.0));
    }

    #[test]
    fn test_format_number_display() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(eval("=A1", &[("A1", 0.123456789012)]), "0.123456789012");
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let deep = format!("={}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(eval(&deep, &[]), ERROR_MARKER);
        let calls = format!("={}1{}", "ABS(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(eval(&calls, &[]), ERROR_MARKER);
        assert_eq!(eval("=((((1 + 2))))", &[]), "3");
    }
}
