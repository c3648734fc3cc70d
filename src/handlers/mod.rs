pub mod auth;
pub mod catalog;
pub mod orders;
pub mod providers;

use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::domain::pricing::format_cents;
use crate::errors::AppError;

/// Parse a decimal that arrives as a JSON string, e.g. "4.5".
pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("{} must be a decimal number, got '{}'", field, raw)))
}

/// Money on the wire: two decimals, half-up.
pub(crate) fn money(amount: &BigDecimal) -> String {
    format_cents(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_are_parsed_from_strings() {
        assert_eq!(parse_decimal("weight_kg", " 4.5 ").unwrap(), BigDecimal::from_str("4.5").unwrap());
        assert!(matches!(
            parse_decimal("weight_kg", "four"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn money_always_has_two_decimals() {
        assert_eq!(money(&BigDecimal::from(60)), "60.00");
        assert_eq!(money(&BigDecimal::from_str("12.655").unwrap()), "12.66");
        assert_eq!(money(&BigDecimal::from(0)), "0.00");
    }
}
