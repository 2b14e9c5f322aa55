//! Checkout
//!
//! Turns a cart snapshot into a priced order for the signed-in member. Member discounts come off
//! the goods total; shipping is charged on the goods total before the member discount.

use rusty_money::Money;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::Grade,
    cart::OrderExport,
    pricing::{Price, PriceError, floor_percent_of, money_serde},
};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order id
    pub order_id: Uuid,

    /// Ordered lines and cart totals
    #[serde(flatten)]
    pub cart: OrderExport,

    /// Member grade at the time of ordering
    pub grade: Grade,

    /// Discount granted by the member grade
    #[serde(with = "money_serde")]
    pub member_discount: Price,

    /// Cart final price less the member discount
    #[serde(with = "money_serde")]
    pub amount_due: Price,

    /// Points credited for the order
    pub points_earned: u64,
}

impl Order {
    /// Price a cart snapshot for a member of the given grade.
    ///
    /// The member discount and the points earned are both floored to whole minor units. Points
    /// are earned on the goods total after the member discount.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if an amount overflows.
    pub fn new(cart: OrderExport, grade: Grade) -> Result<Self, PriceError> {
        let goods = cart.summary.total_price;
        let currency = goods.currency();

        let member_discount = Money::from_minor(
            floor_percent_of(&goods, grade.discount_rate())?,
            currency,
        );
        let amount_due = cart.summary.final_price.sub(member_discount)?;

        let earning_base = goods.sub(member_discount)?;
        let points_earned =
            u64::try_from(floor_percent_of(&earning_base, grade.point_rate())?).unwrap_or_default();

        Ok(Self {
            order_id: Uuid::now_v7(),
            cart,
            grade,
            member_discount,
            amount_due,
            points_earned,
        })
    }
}
