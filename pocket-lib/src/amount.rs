//! Conversion between the decimal amounts clients send and the integer minor units stored in the
//! database

use crate::error::HandlerError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::str::FromStr;

/// Amount as it appears in a request body: either `"12,50"` or `12.5`
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl AmountInput {
    pub fn to_minor_units(&self) -> Result<i64, HandlerError> {
        let amount = match self {
            AmountInput::Text(text) => parse_amount(text)?,
            AmountInput::Number(number) => parse_amount(&number.to_string())?,
        };
        to_minor_units(amount)
    }

    /// Like [AmountInput::to_minor_units] but zero is rejected as well
    pub fn to_positive_minor_units(&self) -> Result<i64, HandlerError> {
        match self.to_minor_units()? {
            0 => Err(HandlerError::bad_request("Amount must be greater than zero")),
            minor => Ok(minor),
        }
    }
}

/// Accepts both `.` and `,` as decimal separator
pub fn parse_amount(text: &str) -> Result<Decimal, HandlerError> {
    let normalized = text.trim().replace(',', ".");
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|_| HandlerError::bad_request("Amount must be numeric"))
}

/// Rounds half away from zero to cents
pub fn to_minor_units(amount: Decimal) -> Result<i64, HandlerError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(HandlerError::bad_request("Amount must not be negative"));
    }
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| HandlerError::bad_request("Amount is too large"))
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[cfg(test)]
mod tests {
    use super::{from_minor_units, parse_amount, to_minor_units, AmountInput};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[rstest]
    #[case("12,50", "12.50")]
    #[case("12.50", "12.50")]
    #[case(" 7 ", "7")]
    #[case("0,05", "0.05")]
    fn parses_either_separator(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(
            parse_amount(text).unwrap(),
            Decimal::from_str(expected).unwrap()
        );
    }

    #[rstest]
    #[case("")]
    #[case("twelve")]
    #[case("12,50,1")]
    fn rejects_non_numeric(#[case] text: &str) {
        assert!(parse_amount(text).is_err());
    }

    #[rstest]
    #[case("12.50", 1250)]
    #[case("0.005", 1)]
    #[case("0.004", 0)]
    #[case("19.999", 2000)]
    #[case("3", 300)]
    fn rounds_to_cents(#[case] amount: &str, #[case] expected: i64) {
        let amount = Decimal::from_str(amount).unwrap();
        assert_eq!(to_minor_units(amount).unwrap(), expected);
    }

    #[test]
    fn rejects_negative() {
        assert!(to_minor_units(Decimal::from_str("-1.00").unwrap()).is_err());
    }

    #[test]
    fn rejects_overflow() {
        assert!(to_minor_units(Decimal::MAX).is_err());
    }

    #[test]
    fn json_numbers_and_strings() {
        let text: AmountInput = serde_json::from_str(r#""12,50""#).unwrap();
        let number: AmountInput = serde_json::from_str("12.5").unwrap();
        assert_eq!(text.to_minor_units().unwrap(), 1250);
        assert_eq!(number.to_minor_units().unwrap(), 1250);

        let zero: AmountInput = serde_json::from_str("0").unwrap();
        assert_eq!(zero.to_minor_units().unwrap(), 0);
        assert!(zero.to_positive_minor_units().is_err());
    }

    #[test]
    fn minor_units_back_to_decimal() {
        assert_eq!(from_minor_units(1250).to_string(), "12.50");
        assert_eq!(from_minor_units(0).to_string(), "0.00");
    }
}
