//! Order export
//!
//! A frozen snapshot of the cart handed to checkout.

use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    cart::{Cart, CartError, CartSummary},
    pricing::{Price, ShippingPolicy, money_serde},
    products::ProductId,
};

/// One ordered line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product id
    pub product_id: ProductId,

    /// Product title
    pub title: String,

    /// Product image
    pub image: String,

    /// Units ordered
    pub quantity: u32,

    /// Price paid per unit
    #[serde(with = "money_serde")]
    pub unit_price: Price,

    /// Undiscounted unit price
    #[serde(with = "money_serde")]
    pub original_price: Price,

    /// Discount in percent points
    pub discount: u8,

    /// Chosen option
    pub option: String,

    /// Cart line the order line came from
    pub line_id: Uuid,
}

/// Cart contents and totals at the moment of ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderExport {
    /// Ordered lines
    pub items: Vec<OrderLine>,

    /// Totals
    pub summary: CartSummary,

    /// When the snapshot was taken
    pub ordered_at: Timestamp,
}

impl Cart {
    /// Snapshot the cart for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if a price cannot be computed.
    pub fn export_for_order(
        &self,
        shipping: &ShippingPolicy,
        now: Timestamp,
    ) -> Result<OrderExport, CartError> {
        let items = self
            .lines
            .iter()
            .map(|line| {
                Ok(OrderLine {
                    product_id: line.product.id,
                    title: line.product.title.clone(),
                    image: line.product.image.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price()?,
                    original_price: line.product.price,
                    discount: line.product.discount,
                    option: line.option.clone(),
                    line_id: line.line_id,
                })
            })
            .collect::<Result<Vec<_>, CartError>>()?;

        Ok(OrderExport {
            items,
            summary: self.summary(shipping)?,
            ordered_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::KRW};
    use testresult::TestResult;

    use super::*;
    use crate::products::test_support::product;

    #[test]
    fn export_snapshots_lines_and_totals() -> TestResult {
        let mut cart = Cart::new(KRW, 99);
        cart.add(&product(9, 42_000, 19, 34), 1, "M", Timestamp::UNIX_EPOCH)?;

        let now = Timestamp::from_second(1_700_000_000)?;
        let export = cart.export_for_order(&ShippingPolicy::default(), now)?;

        let line = export.items.first().ok_or("missing order line")?;

        assert_eq!(line.unit_price, Money::from_minor(34_020, KRW));
        assert_eq!(line.original_price, Money::from_minor(42_000, KRW));
        assert_eq!(line.option, "M");
        assert_eq!(export.summary.final_price, Money::from_minor(34_020, KRW));
        assert_eq!(export.ordered_at, now);

        let json = serde_json::to_value(&export)?;
        assert_eq!(
            json.pointer("/items/0/unitPrice").and_then(|v| v.as_str()),
            Some("34020 KRW")
        );

        Ok(())
    }
}
