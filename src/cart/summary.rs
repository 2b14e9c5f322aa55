//! Cart totals and grouping

use serde::Serialize;

use crate::{
    cart::{Cart, CartLine},
    pricing::{Price, PriceError, ShippingPolicy, money_serde, zero},
    products::ProductId,
};

/// Totals derived from the current cart lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Units across all lines
    pub total_quantity: u64,

    /// Sum of undiscounted line totals
    #[serde(with = "money_serde")]
    pub subtotal: Price,

    /// Sum of discounted line totals
    #[serde(with = "money_serde")]
    pub total_price: Price,

    /// `subtotal - total_price`
    #[serde(with = "money_serde")]
    pub total_discount: Price,

    /// Shipping charged on `total_price`
    #[serde(with = "money_serde")]
    pub shipping_fee: Price,

    /// `total_price + shipping_fee`
    #[serde(with = "money_serde")]
    pub final_price: Price,

    /// Spend still needed for free shipping
    #[serde(with = "money_serde")]
    pub free_shipping_remaining: Price,

    /// Whether the cart has no lines
    pub is_empty: bool,
}

/// Lines of one product across its options.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductGroup<'a> {
    /// Product id
    pub product_id: ProductId,

    /// Product title
    pub title: &'a str,

    /// Product image
    pub image: &'a str,

    /// Lines in cart order
    pub lines: Vec<&'a CartLine>,

    /// Units across the lines
    pub total_quantity: u64,
}

impl Cart {
    /// Sum of undiscounted line totals.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the sum overflows.
    pub fn subtotal(&self) -> Result<Price, PriceError> {
        self.sum(CartLine::original_total)
    }

    /// Sum of discounted line totals.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the sum overflows.
    pub fn total_price(&self) -> Result<Price, PriceError> {
        self.sum(CartLine::line_total)
    }

    fn sum(
        &self,
        line_amount: impl Fn(&CartLine) -> Result<Price, PriceError>,
    ) -> Result<Price, PriceError> {
        self.lines
            .iter()
            .try_fold(zero(self.currency), |total, line| {
                Ok(total.add(line_amount(line)?)?)
            })
    }

    /// Recompute every derived total.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if a total overflows or the shipping policy is in another
    /// currency.
    pub fn summary(&self, shipping: &ShippingPolicy) -> Result<CartSummary, PriceError> {
        let subtotal = self.subtotal()?;
        let total_price = self.total_price()?;
        let shipping_fee = shipping.fee_for(&total_price);

        Ok(CartSummary {
            total_quantity: self.total_quantity(),
            subtotal,
            total_price,
            total_discount: subtotal.sub(total_price)?,
            shipping_fee,
            final_price: total_price.add(shipping_fee)?,
            free_shipping_remaining: shipping.remaining_for_free(&total_price),
            is_empty: self.is_empty(),
        })
    }

    /// Lines grouped by product, in order of first appearance.
    pub fn grouped(&self) -> Vec<ProductGroup<'_>> {
        let mut groups: Vec<ProductGroup<'_>> = Vec::new();

        for line in &self.lines {
            if let Some(group) = groups
                .iter_mut()
                .find(|group| group.product_id == line.product.id)
            {
                group.lines.push(line);
                group.total_quantity += u64::from(line.quantity);
            } else {
                groups.push(ProductGroup {
                    product_id: line.product.id,
                    title: &line.product.title,
                    image: &line.product.image,
                    lines: vec![line],
                    total_quantity: u64::from(line.quantity),
                });
            }
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::{
        Money, MoneyError,
        iso::{KRW, USD},
    };
    use testresult::TestResult;

    use super::*;
    use crate::products::test_support::product;

    fn krw(amount: i64) -> Price {
        Money::from_minor(amount, KRW)
    }

    #[test]
    fn summary_of_empty_cart_charges_flat_fee() -> TestResult {
        let cart = Cart::new(KRW, 99);
        let summary = cart.summary(&ShippingPolicy::default())?;

        assert!(summary.is_empty);
        assert_eq!(summary.total_price, krw(0));
        assert_eq!(summary.shipping_fee, krw(3_000));
        assert_eq!(summary.final_price, krw(3_000));
        assert_eq!(summary.free_shipping_remaining, krw(30_000));

        Ok(())
    }

    #[test]
    fn summary_applies_discounts_per_unit() -> TestResult {
        let mut cart = Cart::new(KRW, 99);

        // 28,000 at 20% is 22,400; 8,000 with no discount.
        cart.add(&product(1, 28_000, 20, 25), 2, "", Timestamp::UNIX_EPOCH)?;
        cart.add(&product(8, 8_000, 0, 156), 1, "", Timestamp::UNIX_EPOCH)?;

        let summary = cart.summary(&ShippingPolicy::default())?;

        assert_eq!(summary.total_quantity, 3);
        assert_eq!(summary.subtotal, krw(64_000));
        assert_eq!(summary.total_price, krw(52_800));
        assert_eq!(summary.total_discount, krw(11_200));
        assert_eq!(summary.shipping_fee, krw(0));
        assert_eq!(summary.final_price, krw(52_800));
        assert_eq!(summary.free_shipping_remaining, krw(0));

        Ok(())
    }

    #[test]
    fn summary_below_threshold_adds_fee() -> TestResult {
        let mut cart = Cart::new(KRW, 99);

        cart.add(&product(14, 8_000, 0, 189), 3, "", Timestamp::UNIX_EPOCH)?;

        let summary = cart.summary(&ShippingPolicy::default())?;

        assert_eq!(summary.shipping_fee, krw(3_000));
        assert_eq!(summary.final_price, krw(27_000));
        assert_eq!(summary.free_shipping_remaining, krw(6_000));

        Ok(())
    }

    #[test]
    fn summary_rejects_policy_in_other_currency() -> TestResult {
        let mut cart = Cart::new(KRW, 99);
        cart.add(&product(1, 28_000, 0, 5), 1, "", Timestamp::UNIX_EPOCH)?;

        let dollars = ShippingPolicy::new(
            Money::from_minor(5_000, USD),
            Money::from_minor(500, USD),
        );

        assert!(matches!(
            cart.summary(&dollars),
            Err(PriceError::Money(MoneyError::CurrencyMismatch { .. }))
        ));

        Ok(())
    }

    #[test]
    fn grouped_collects_options_of_one_product() -> TestResult {
        let mut cart = Cart::new(KRW, 99);
        let hoodie = product(9, 42_000, 19, 34);

        cart.add(&hoodie, 1, "M", Timestamp::UNIX_EPOCH)?;
        cart.add(&product(5, 18_000, 0, 67), 1, "", Timestamp::UNIX_EPOCH)?;
        cart.add(&hoodie, 2, "L", Timestamp::UNIX_EPOCH)?;

        let groups = cart.grouped();

        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups.first().map(|g| (g.product_id, g.lines.len(), g.total_quantity)),
            Some((ProductId(9), 2, 3))
        );

        Ok(())
    }
}
