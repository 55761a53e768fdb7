//! Aggregate kernels shared by formula built-ins and batch operations.

use serde::{Deserialize, Serialize};

/// An aggregate over a list of numbers.
///
/// `Round` and `Abs` act on the first value only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Average,
    Min,
    Max,
    Count,
    Product,
    Round,
    Abs,
}

impl Aggregate {
    pub const ALL: [Aggregate; 8] = [
        Aggregate::Sum,
        Aggregate::Average,
        Aggregate::Min,
        Aggregate::Max,
        Aggregate::Count,
        Aggregate::Product,
        Aggregate::Round,
        Aggregate::Abs,
    ];

    /// Wire name, as sent to the remote math endpoint.
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Average => "average",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Count => "count",
            Aggregate::Product => "product",
            Aggregate::Round => "round",
            Aggregate::Abs => "abs",
        }
    }

    pub fn from_name(name: &str) -> Option<Aggregate> {
        match name.to_ascii_lowercase().as_str() {
            "sum" => Some(Aggregate::Sum),
            "average" | "avg" => Some(Aggregate::Average),
            "min" => Some(Aggregate::Min),
            "max" => Some(Aggregate::Max),
            "count" => Some(Aggregate::Count),
            "product" => Some(Aggregate::Product),
            "round" => Some(Aggregate::Round),
            "abs" => Some(Aggregate::Abs),
            _ => None,
        }
    }

    /// Whether the formula built-in of the same name takes a list of arguments.
    pub fn is_variadic(&self) -> bool {
        !matches!(self, Aggregate::Round | Aggregate::Abs)
    }

    /// Compute the aggregate. Returns None for an empty input.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        let first = *values.first()?;
        let result = match self {
            Aggregate::Sum => values.iter().sum(),
            Aggregate::Average => values.iter().sum::<f64>() / values.len() as f64,
            Aggregate::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregate::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregate::Count => values.len() as f64,
            Aggregate::Product => values.iter().product(),
            Aggregate::Round => first.round_ties_even(),
            Aggregate::Abs => first.abs(),
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::Aggregate;

    #[test]
    fn test_aggregates() {
        let values = [1.0, 2.0, 3.0, -4.0];
        assert_eq!(Aggregate::Sum.apply(&values), Some(2.0));
        assert_eq!(Aggregate::Average.apply(&values), Some(0.5));
        assert_eq!(Aggregate::Min.apply(&values), Some(-4.0));
        assert_eq!(Aggregate::Max.apply(&values), Some(3.0));
        assert_eq!(Aggregate::Count.apply(&values), Some(4.0));
        assert_eq!(Aggregate::Product.apply(&values), Some(-24.0));
    }

    #[test]
    fn test_scalar_aggregates_use_first_value() {
        assert_eq!(Aggregate::Round.apply(&[2.5, 100.0]), Some(2.0));
        assert_eq!(Aggregate::Round.apply(&[3.5]), Some(4.0));
        assert_eq!(Aggregate::Round.apply(&[-0.5]), Some(-0.0));
        assert_eq!(Aggregate::Abs.apply(&[-7.25, 1.0]), Some(7.25));
    }

    #[test]
    fn test_empty_input() {
        for agg in Aggregate::ALL {
            assert_eq!(agg.apply(&[]), None);
        }
    }

    #[test]
    fn test_names_roundtrip() {
        for agg in Aggregate::ALL {
            assert_eq!(Aggregate::from_name(agg.name()), Some(agg));
        }
        assert_eq!(Aggregate::from_name("AVG"), Some(Aggregate::Average));
        assert_eq!(Aggregate::from_name("median"), None);
    }
}
