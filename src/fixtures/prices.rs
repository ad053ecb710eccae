//! Price and Percentage Parsing

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Findable, Money,
    iso::Currency,
};

use crate::fixtures::FixtureError;

/// Parse a price string (e.g. "2.99 GBP") into minor units and currency.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount is not a
/// decimal that fits the currency's minor units, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = Currency::find(currency_code)
        .ok_or_else(|| FixtureError::UnknownCurrency((*currency_code).to_string()))?;

    let scale = 10_i64
        .checked_pow(currency.exponent)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::from(scale))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Parse a price string into [`Money`].
///
/// # Errors
///
/// See [`parse_price`].
pub fn parse_money(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value / 100.0))
    } else {
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{EUR, GBP, JPY, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("2.99GBP");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_scales_by_currency_exponent() -> TestResult {
        assert_eq!(parse_price("2.99 GBP")?, (299, GBP));
        assert_eq!(parse_price("1.00 USD")?, (100, USD));
        assert_eq!(parse_price("2.50 EUR")?, (250, EUR));
        assert_eq!(parse_price("500 JPY")?, (500, JPY));

        Ok(())
    }

    #[test]
    fn parse_money_builds_money() -> TestResult {
        assert_eq!(parse_money("10.00 USD")?, Money::from_minor(1000, USD));

        Ok(())
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> TestResult {
        assert_eq!(parse_percentage("15%")?, Percentage::from(0.15));
        assert_eq!(parse_percentage("0.15")?, Percentage::from(0.15));

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_garbage() {
        assert!(matches!(
            parse_percentage("lots"),
            Err(FixtureError::InvalidPercentage(_))
        ));
    }
}
