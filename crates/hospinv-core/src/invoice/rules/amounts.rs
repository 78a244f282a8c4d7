//! Amount and quantity normalisation for invoice tokens.
//!
//! Invoice amounts are often recognized without their decimal point
//! ("1050" for 10.50). When no point is present one is inserted two digits
//! from the right.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::ExtractionError;

/// Clean an amount token: keep digits and periods, then apply the cents
/// convention when no period is present.
///
/// `"1050"` → `"10.50"`, `"10.50"` → `"10.50"`, `"5"` → `"0.05"`.
pub fn normalize_amount(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() || cleaned.contains('.') {
        return cleaned;
    }

    let padded = format!("{:0>3}", cleaned);
    let split = padded.len() - 2;
    format!("{}.{}", &padded[..split], &padded[split..])
}

/// Clean a quantity token to its digits, or `None` when it has none.
pub fn normalize_quantity(text: &str) -> Option<String> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// Normalize and parse an amount token.
pub fn parse_amount(text: &str) -> Result<Decimal, ExtractionError> {
    let normalized = normalize_amount(text);
    Decimal::from_str(&normalized).map_err(|_| ExtractionError::MalformedNumericToken {
        text: text.to_string(),
    })
}

/// Normalize and parse an amount token to a float.
pub fn amount_value(text: &str) -> Result<f64, ExtractionError> {
    parse_amount(text)?
        .to_f64()
        .ok_or_else(|| ExtractionError::MalformedNumericToken {
            text: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("1050"), "10.50");
        assert_eq!(normalize_amount("10.50"), "10.50");
        assert_eq!(normalize_amount("5"), "0.05");
        assert_eq!(normalize_amount("$1,234.50"), "1234.50");
        assert_eq!(normalize_amount("S$ 123450"), "1234.50");
        assert_eq!(normalize_amount("AMOUNT"), "");
    }

    #[test]
    fn test_normalize_quantity() {
        assert_eq!(normalize_quantity("2"), Some("2".to_string()));
        assert_eq!(normalize_quantity("x12"), Some("12".to_string()));
        assert_eq!(normalize_quantity("Subtotal Charges"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1050").unwrap(), Decimal::from_str("10.50").unwrap());
        assert_eq!(
            parse_amount("1.2.3"),
            Err(ExtractionError::MalformedNumericToken {
                text: "1.2.3".to_string()
            })
        );
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_amount_value() {
        assert_eq!(amount_value("1050").unwrap(), 10.5);
    }
}
