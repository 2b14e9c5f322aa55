//! Pricing
//!
//! Money parsing, discount arithmetic and the shipping policy. All amounts are handled in
//! minor units so that derived totals are exact and reproducible.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money, MoneyError,
    iso::{self, Currency},
};
use thiserror::Error;

/// A price in a concrete ISO currency.
pub type Price = Money<'static, Currency>;

/// Errors that can occur while parsing or calculating prices.
#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    /// The string was not in `AMOUNT CODE` form or the amount was not a number.
    #[error("invalid price format: {0}")]
    InvalidFormat(String),

    /// The currency code is not a known ISO currency.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// The amount cannot be represented in minor units.
    #[error("price overflowed minor units: {0}")]
    Overflow(String),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Parse a price string (e.g. `"28000 KRW"` or `"2.99 GBP"`) into a [`Price`].
///
/// # Errors
///
/// Returns an error if the string is not in the format `AMOUNT CODE`, if the amount cannot be
/// parsed as a decimal, or if the currency code is not recognised.
pub fn parse_price(s: &str) -> Result<Price, PriceError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(PriceError::InvalidFormat(format!(
            "expected 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| PriceError::InvalidFormat(s.to_string()))?;

    let currency = iso::find(code).ok_or_else(|| PriceError::UnknownCurrency(code.to_string()))?;

    let minor_units = amount
        .checked_mul(minor_unit_scale(currency))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| PriceError::Overflow(s.to_string()))?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Render a price as the `AMOUNT CODE` string understood by [`parse_price`].
pub fn price_to_string(price: &Price) -> String {
    format!("{} {}", price.amount(), price.currency().iso_alpha_code)
}

/// Render a price for display, with currency symbol and digit grouping.
pub fn format_price(price: &Price) -> String {
    price.to_string()
}

/// A zero amount in the given currency.
pub fn zero(currency: &'static Currency) -> Price {
    Money::from_minor(0, currency)
}

fn minor_unit_scale(currency: &Currency) -> Decimal {
    Decimal::from(10_u64.pow(currency.exponent))
}

/// Convert whole discount percent points (e.g. `20`) into a [`Percentage`], clamped to 0..=100.
pub fn discount_rate(percent_points: u8) -> Percentage {
    let points = Decimal::from(percent_points.min(100));

    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Unit price after a percentage discount, floored to a whole minor unit.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the discounted amount cannot be represented.
pub fn discounted_price(price: &Price, percent_points: u8) -> Result<Price, PriceError> {
    if percent_points == 0 {
        return Ok(*price);
    }

    let discount = percent_of_minor(discount_rate(percent_points), price.to_minor_units())?;

    Ok(Money::from_minor(
        price.to_minor_units() - discount,
        price.currency(),
    ))
}

/// Amount taken off a unit price by a percentage discount.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the discounted amount cannot be represented.
pub fn discount_amount(price: &Price, percent_points: u8) -> Result<Price, PriceError> {
    let discounted = discounted_price(price, percent_points)?;

    Ok(price.sub(discounted)?)
}

/// Percentage of a minor unit amount, rounded up so the discounted remainder is floored.
fn percent_of_minor(percent: Percentage, minor: i64) -> Result<i64, PriceError> {
    let Some(minor_dec) = Decimal::from_i64(minor) else {
        return Err(PriceError::Overflow(minor.to_string()));
    };

    let applied = percent * minor_dec;

    applied
        .round_dp_with_strategy(0, RoundingStrategy::ToPositiveInfinity)
        .to_i64()
        .ok_or_else(|| PriceError::Overflow(applied.to_string()))
}

/// Percentage of a price in minor units, floored (used for member discounts and points).
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the result cannot be represented.
pub fn floor_percent_of(price: &Price, percent: Percentage) -> Result<i64, PriceError> {
    let Some(minor_dec) = Decimal::from_i64(price.to_minor_units()) else {
        return Err(PriceError::Overflow(price.to_minor_units().to_string()));
    };

    let applied = percent * minor_dec;

    applied
        .round_dp_with_strategy(0, RoundingStrategy::ToNegativeInfinity)
        .to_i64()
        .ok_or_else(|| PriceError::Overflow(applied.to_string()))
}

/// Multiply a unit price by a quantity.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the product overflows minor units.
pub fn extend_price(unit: &Price, quantity: u32) -> Result<Price, PriceError> {
    let minor = unit
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| PriceError::Overflow(format!("{} x {quantity}", price_to_string(unit))))?;

    Ok(Money::from_minor(minor, unit.currency()))
}

/// Flat-fee shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShippingPolicy {
    /// Orders whose discounted total reaches this amount ship free.
    pub free_shipping_threshold: Price,

    /// Fee charged below the threshold.
    pub flat_fee: Price,
}

impl ShippingPolicy {
    /// Create a new shipping policy.
    pub fn new(free_shipping_threshold: Price, flat_fee: Price) -> Self {
        Self {
            free_shipping_threshold,
            flat_fee,
        }
    }

    /// Currency the policy is expressed in.
    pub fn currency(&self) -> &'static Currency {
        self.flat_fee.currency()
    }

    /// Whether a total qualifies for free shipping.
    pub fn is_free_for(&self, total: &Price) -> bool {
        total.to_minor_units() >= self.free_shipping_threshold.to_minor_units()
    }

    /// Shipping fee for a discounted goods total.
    pub fn fee_for(&self, total: &Price) -> Price {
        if self.is_free_for(total) {
            zero(self.currency())
        } else {
            self.flat_fee
        }
    }

    /// How much more must be spent to reach free shipping (never negative).
    pub fn remaining_for_free(&self, total: &Price) -> Price {
        let remaining =
            (self.free_shipping_threshold.to_minor_units() - total.to_minor_units()).max(0);

        Money::from_minor(remaining, self.currency())
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self::new(
            Money::from_minor(30_000, iso::KRW),
            Money::from_minor(3_000, iso::KRW),
        )
    }
}

/// Serde adapter storing a [`Price`] as an `AMOUNT CODE` string.
pub mod money_serde {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use super::{Price, parse_price, price_to_string};

    /// Serialize a price.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&price_to_string(price))
    }

    /// Deserialize a price.
    ///
    /// # Errors
    ///
    /// Returns a deserializer error if the string is not a valid price.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Price, D::Error> {
        let raw = String::deserialize(deserializer)?;

        parse_price(&raw).map_err(D::Error::custom)
    }
}

/// Serde adapter storing an optional [`Price`] as an `AMOUNT CODE` string.
pub mod option_money_serde {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use super::{Price, parse_price, price_to_string};

    /// Serialize an optional price.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        price: &Option<Price>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match price {
            Some(price) => serializer.serialize_some(&price_to_string(price)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional price.
    ///
    /// # Errors
    ///
    /// Returns a deserializer error if the string is not a valid price.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Price>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_price(&raw).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, KRW};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_reads_whole_won() -> TestResult {
        let price = parse_price("28000 KRW")?;

        assert_eq!(price, Money::from_minor(28_000, KRW));

        Ok(())
    }

    #[test]
    fn parse_price_scales_minor_units() -> TestResult {
        let price = parse_price("2.99 GBP")?;

        assert_eq!(price.to_minor_units(), 299);
        assert_eq!(price.currency(), GBP);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        assert!(matches!(
            parse_price("2.99GBP"),
            Err(PriceError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_price("1 KRW extra"),
            Err(PriceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(PriceError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn price_string_round_trips_through_parse() -> TestResult {
        let price = Money::from_minor(18_000, KRW);

        assert_eq!(parse_price(&price_to_string(&price))?, price);

        Ok(())
    }

    #[test]
    fn discounted_price_floors_to_whole_units() -> TestResult {
        // 19% off 42,000 is 34,020 exactly; 17% off 25,000 is 20,750 exactly;
        // 16% off 38,001 is 31,920.84, which floors to 31,920.
        assert_eq!(
            discounted_price(&Money::from_minor(42_000, KRW), 19)?,
            Money::from_minor(34_020, KRW)
        );
        assert_eq!(
            discounted_price(&Money::from_minor(25_000, KRW), 17)?,
            Money::from_minor(20_750, KRW)
        );
        assert_eq!(
            discounted_price(&Money::from_minor(38_001, KRW), 16)?,
            Money::from_minor(31_920, KRW)
        );

        Ok(())
    }

    #[test]
    fn zero_discount_keeps_price() -> TestResult {
        let price = Money::from_minor(8_000, KRW);

        assert_eq!(discounted_price(&price, 0)?, price);
        assert_eq!(discount_amount(&price, 0)?, Money::from_minor(0, KRW));

        Ok(())
    }

    #[test]
    fn discount_rate_clamps_above_one_hundred() -> TestResult {
        let price = Money::from_minor(5_000, KRW);

        assert_eq!(discounted_price(&price, 250)?, Money::from_minor(0, KRW));

        Ok(())
    }

    #[test]
    fn shipping_is_free_at_threshold() {
        let policy = ShippingPolicy::default();

        assert_eq!(
            policy.fee_for(&Money::from_minor(30_000, KRW)),
            Money::from_minor(0, KRW)
        );
        assert_eq!(
            policy.fee_for(&Money::from_minor(29_999, KRW)),
            Money::from_minor(3_000, KRW)
        );
    }

    #[test]
    fn remaining_for_free_never_negative() {
        let policy = ShippingPolicy::default();

        assert_eq!(
            policy.remaining_for_free(&Money::from_minor(12_000, KRW)),
            Money::from_minor(18_000, KRW)
        );
        assert_eq!(
            policy.remaining_for_free(&Money::from_minor(45_000, KRW)),
            Money::from_minor(0, KRW)
        );
    }

    #[test]
    fn extend_price_multiplies_minor_units() -> TestResult {
        let unit = Money::from_minor(22_400, KRW);

        assert_eq!(extend_price(&unit, 3)?, Money::from_minor(67_200, KRW));

        Ok(())
    }
}
