/// Format a number for display and storage.
///
/// Whole numbers print without a decimal point. Everything else prints in
/// the shortest form that parses back to the same `f64`, so text produced
/// here can be stored and re-read without losing digits.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::NAN), "#NAN!");
        assert_eq!(format_number(f64::INFINITY), "#INF!");
    }

    #[test]
    fn test_format_number_keeps_every_digit() {
        for n in [0.123456789012, 1e-12, 3.14159265358979, 0.1 + 0.2, 1e20, -2.5e-7] {
            let text = format_number(n);
            assert_eq!(text.parse::<f64>().unwrap(), n, "{} lost precision", text);
        }
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }
}
