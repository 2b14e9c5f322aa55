//! Cart
//!
//! Cart lines keyed by product and chosen option. The cart only stores lines; every total is
//! derived on demand by [`Cart::summary`].

use jiff::Timestamp;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    pricing::{Price, PriceError, extend_price},
    products::{Product, ProductId},
};

mod order;
mod summary;
mod validation;

pub use order::{OrderExport, OrderLine};
pub use summary::{CartSummary, ProductGroup};
pub use validation::{CartIssue, CartIssueKind, CartValidation};

/// Errors raised by cart operations.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Quantities must be at least one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The product has no stock.
    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    /// No line has the given id.
    #[error("cart line {0} not found")]
    LineNotFound(Uuid),

    /// The product is priced in a different currency from the cart.
    #[error("product {product} is priced in {found}, cart currency is {expected}")]
    CurrencyMismatch {
        /// Offending product
        product: ProductId,

        /// Cart currency code
        expected: &'static str,

        /// Product currency code
        found: &'static str,
    },

    /// Price arithmetic failed.
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// A product in the cart with its quantity and chosen option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Synthetic line id
    pub line_id: Uuid,

    /// Product snapshot taken when the line was created
    pub product: Product,

    /// Units ordered
    pub quantity: u32,

    /// Chosen option; empty when the product has none
    #[serde(default)]
    pub option: String,

    /// When the line was created
    pub added_at: Timestamp,
}

impl CartLine {
    /// Product id of the line.
    pub fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Whether this line holds the given product and option.
    pub fn is_for(&self, product: ProductId, option: &str) -> bool {
        self.product.id == product && self.option == option
    }

    /// Unit price after the product discount.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the discounted price cannot be represented.
    pub fn unit_price(&self) -> Result<Price, PriceError> {
        self.product.unit_price()
    }

    /// Undiscounted line total.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the total overflows.
    pub fn original_total(&self) -> Result<Price, PriceError> {
        extend_price(&self.product.price, self.quantity)
    }

    /// Discounted line total.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the total overflows.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        extend_price(&self.unit_price()?, self.quantity)
    }
}

/// Result of adding a product to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// Line that received the units
    pub line_id: Uuid,

    /// Line quantity after the add
    pub quantity: u32,

    /// Whether the requested quantity was cut down to the stock or line maximum
    pub clamped: bool,
}

/// Result of changing a line's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineUpdate {
    /// The line was removed
    Removed,

    /// The line now holds this many units
    Quantity {
        /// New quantity
        quantity: u32,

        /// Whether the requested quantity was cut down
        clamped: bool,
    },
}

/// A cart operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Add units of a product with an option
    Add {
        /// Product snapshot
        product: Product,

        /// Units to add
        quantity: u32,

        /// Chosen option
        option: String,
    },

    /// Drop a line
    Remove(Uuid),

    /// Set a line's quantity; zero removes it
    SetQuantity(Uuid, u32),

    /// Remove one unit from a line
    Decrement(Uuid),

    /// Empty the cart
    Clear,

    /// Drop sold-out lines and fit the rest to stock
    Cleanup,
}

/// Shopping cart
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    currency: &'static Currency,
    max_quantity: u32,
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new(currency: &'static Currency, max_quantity: u32) -> Self {
        Self {
            currency,
            max_quantity: max_quantity.max(1),
            lines: Vec::new(),
        }
    }

    /// Rebuild a cart from stored lines.
    ///
    /// Lines priced in another currency, with no units, or for a sold-out product are dropped.
    /// Lines for the same product and option are merged, and every quantity is clamped to the line
    /// limits.
    pub fn restore(
        currency: &'static Currency,
        max_quantity: u32,
        lines: impl IntoIterator<Item = CartLine>,
    ) -> Self {
        let mut cart = Self::new(currency, max_quantity);

        for line in lines {
            if line.product.price.currency() != currency
                || line.quantity == 0
                || !line.product.in_stock()
            {
                warn!(product = %line.product.id, "dropping unusable stored cart line");

                continue;
            }

            let limit = cart.limit_for(&line.product);

            if let Some(existing) = cart
                .lines
                .iter_mut()
                .find(|existing| existing.is_for(line.product.id, &line.option))
            {
                existing.quantity = existing
                    .quantity
                    .saturating_add(line.quantity)
                    .min(limit);
            } else {
                let quantity = line.quantity.min(limit);

                cart.lines.push(CartLine { quantity, ..line });
            }
        }

        cart
    }

    /// Cart currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Maximum units of one line.
    pub fn max_quantity(&self) -> u32 {
        self.max_quantity
    }

    /// Cart lines, in the order they were added.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a line by id.
    pub fn line(&self, line_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.line_id == line_id)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Units of a product and option in the cart.
    pub fn quantity_of(&self, product: ProductId, option: &str) -> u32 {
        self.lines
            .iter()
            .find(|line| line.is_for(product, option))
            .map_or(0, |line| line.quantity)
    }

    /// Whether a product and option is in the cart.
    pub fn contains(&self, product: ProductId, option: &str) -> bool {
        self.lines.iter().any(|line| line.is_for(product, option))
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    fn limit_for(&self, product: &Product) -> u32 {
        product.stock.min(self.max_quantity)
    }

    fn position(&self, line_id: Uuid) -> Result<usize, CartError> {
        self.lines
            .iter()
            .position(|line| line.line_id == line_id)
            .ok_or(CartError::LineNotFound(line_id))
    }

    /// Add units of a product. Adding a product and option already in the cart tops up that line.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is zero, the product is sold out, or it is priced in a
    /// different currency.
    pub fn add(
        &mut self,
        product: &Product,
        quantity: u32,
        option: &str,
        now: Timestamp,
    ) -> Result<AddOutcome, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let product_currency = product.price.currency();

        if product_currency != self.currency {
            return Err(CartError::CurrencyMismatch {
                product: product.id,
                expected: self.currency.iso_alpha_code,
                found: product_currency.iso_alpha_code,
            });
        }

        if !product.in_stock() {
            return Err(CartError::OutOfStock(product.id));
        }

        let limit = self.limit_for(product);

        let outcome = if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.is_for(product.id, option))
        {
            let wanted = line.quantity.saturating_add(quantity);

            line.quantity = wanted.min(limit);

            AddOutcome {
                line_id: line.line_id,
                quantity: line.quantity,
                clamped: wanted > limit,
            }
        } else {
            let line = CartLine {
                line_id: Uuid::now_v7(),
                product: product.clone(),
                quantity: quantity.min(limit),
                option: option.to_string(),
                added_at: now,
            };

            let outcome = AddOutcome {
                line_id: line.line_id,
                quantity: line.quantity,
                clamped: quantity > limit,
            };

            self.lines.push(line);

            outcome
        };

        debug!(
            product = %product.id,
            option,
            quantity = outcome.quantity,
            clamped = outcome.clamped,
            "added to cart"
        );

        Ok(outcome)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown line id.
    pub fn remove(&mut self, line_id: Uuid) -> Result<CartLine, CartError> {
        let position = self.position(line_id)?;

        let line = self.lines.remove(position);

        debug!(%line_id, product = %line.product.id, "removed from cart");

        Ok(line)
    }

    /// Set a line's quantity. Zero removes the line; other values are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown line id, or
    /// [`CartError::OutOfStock`] when the line's product has sold out.
    pub fn set_quantity(&mut self, line_id: Uuid, quantity: u32) -> Result<LineUpdate, CartError> {
        if quantity == 0 {
            self.remove(line_id)?;

            return Ok(LineUpdate::Removed);
        }

        let position = self.position(line_id)?;
        let max_quantity = self.max_quantity;

        let Some(line) = self.lines.get_mut(position) else {
            return Err(CartError::LineNotFound(line_id));
        };

        if !line.product.in_stock() {
            return Err(CartError::OutOfStock(line.product.id));
        }

        let limit = line.product.stock.min(max_quantity);

        line.quantity = quantity.min(limit);

        debug!(%line_id, quantity = line.quantity, "cart quantity updated");

        Ok(LineUpdate::Quantity {
            quantity: line.quantity,
            clamped: quantity > limit,
        })
    }

    /// Remove one unit from a line. The last unit removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown line id.
    pub fn decrement(&mut self, line_id: Uuid) -> Result<LineUpdate, CartError> {
        let position = self.position(line_id)?;

        let quantity = self.lines.get(position).map_or(0, |line| line.quantity);

        self.set_quantity(line_id, quantity.saturating_sub(1))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();

        debug!("cart cleared");
    }

    /// Drop sold-out lines and clamp the rest to their stock. Returns the number of lines changed
    /// or removed.
    pub fn cleanup(&mut self) -> usize {
        let before = self.lines.len();

        self.lines.retain(|line| line.product.in_stock());

        let mut changed = before - self.lines.len();

        for line in &mut self.lines {
            if line.quantity > line.product.stock {
                line.quantity = line.product.stock;
                changed += 1;
            }
        }

        debug!(changed, "cart cleaned up");

        changed
    }

    /// Apply an operation.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying operation.
    pub fn apply(&mut self, action: CartAction, now: Timestamp) -> Result<(), CartError> {
        match action {
            CartAction::Add {
                product,
                quantity,
                option,
            } => {
                self.add(&product, quantity, &option, now)?;
            }
            CartAction::Remove(line_id) => {
                self.remove(line_id)?;
            }
            CartAction::SetQuantity(line_id, quantity) => {
                self.set_quantity(line_id, quantity)?;
            }
            CartAction::Decrement(line_id) => {
                self.decrement(line_id)?;
            }
            CartAction::Clear => self.clear(),
            CartAction::Cleanup => {
                self.cleanup();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{KRW, USD},
    };
    use testresult::TestResult;

    use super::*;
    use crate::products::test_support::product;

    fn cart() -> Cart {
        Cart::new(KRW, 99)
    }

    #[test]
    fn adding_same_product_and_option_tops_up_line() -> TestResult {
        let mut cart = cart();
        let plush = product(1, 28_000, 20, 25);

        let first = cart.add(&plush, 1, "", Timestamp::UNIX_EPOCH)?;
        let second = cart.add(&plush, 2, "", Timestamp::UNIX_EPOCH)?;

        assert_eq!(cart.len(), 1);
        assert_eq!(first.line_id, second.line_id);
        assert_eq!(cart.quantity_of(ProductId(1), ""), 3);

        Ok(())
    }

    #[test]
    fn different_options_get_separate_lines() -> TestResult {
        let mut cart = cart();
        let hoodie = product(9, 42_000, 19, 34);

        cart.add(&hoodie, 1, "M", Timestamp::UNIX_EPOCH)?;
        cart.add(&hoodie, 1, "L", Timestamp::UNIX_EPOCH)?;

        assert_eq!(cart.len(), 2);
        assert!(cart.contains(ProductId(9), "M"));
        assert!(!cart.contains(ProductId(9), ""));

        Ok(())
    }

    #[test]
    fn add_clamps_to_stock() -> TestResult {
        let mut cart = cart();
        let figure = product(3, 45_000, 0, 8);

        let outcome = cart.add(&figure, 5, "", Timestamp::UNIX_EPOCH)?;
        assert!(!outcome.clamped);

        let outcome = cart.add(&figure, 5, "", Timestamp::UNIX_EPOCH)?;

        assert_eq!(outcome.quantity, 8);
        assert!(outcome.clamped);

        Ok(())
    }

    #[test]
    fn add_clamps_to_line_maximum() -> TestResult {
        let mut cart = Cart::new(KRW, 3);
        let stickers = product(20, 6_000, 0, 167);

        let outcome = cart.add(&stickers, 10, "", Timestamp::UNIX_EPOCH)?;

        assert_eq!(outcome.quantity, 3);
        assert!(outcome.clamped);

        Ok(())
    }

    #[test]
    fn add_rejects_zero_quantity_and_sold_out() {
        let mut cart = cart();

        assert_eq!(
            cart.add(&product(1, 1_000, 0, 5), 0, "", Timestamp::UNIX_EPOCH),
            Err(CartError::InvalidQuantity)
        );
        assert_eq!(
            cart.add(&product(2, 1_000, 0, 0), 1, "", Timestamp::UNIX_EPOCH),
            Err(CartError::OutOfStock(ProductId(2)))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn add_rejects_other_currency() {
        let mut cart = cart();
        let mut dollars = product(1, 1_000, 0, 5);
        dollars.price = Money::from_minor(1_000, USD);

        let result = cart.add(&dollars, 1, "", Timestamp::UNIX_EPOCH);

        assert!(matches!(
            result,
            Err(CartError::CurrencyMismatch { found: "USD", .. })
        ));
    }

    #[test]
    fn decrementing_last_unit_removes_line() -> TestResult {
        let mut cart = cart();
        let outcome = cart.add(&product(1, 1_000, 0, 5), 2, "", Timestamp::UNIX_EPOCH)?;

        assert_eq!(
            cart.decrement(outcome.line_id)?,
            LineUpdate::Quantity {
                quantity: 1,
                clamped: false
            }
        );
        assert_eq!(cart.decrement(outcome.line_id)?, LineUpdate::Removed);
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn set_quantity_zero_removes_and_unknown_line_errors() -> TestResult {
        let mut cart = cart();
        let outcome = cart.add(&product(1, 1_000, 0, 5), 2, "", Timestamp::UNIX_EPOCH)?;

        assert_eq!(cart.set_quantity(outcome.line_id, 0)?, LineUpdate::Removed);
        assert_eq!(
            cart.set_quantity(outcome.line_id, 1),
            Err(CartError::LineNotFound(outcome.line_id))
        );

        Ok(())
    }

    #[test]
    fn set_quantity_clamps_to_stock() -> TestResult {
        let mut cart = cart();
        let outcome = cart.add(&product(1, 1_000, 0, 5), 1, "", Timestamp::UNIX_EPOCH)?;

        assert_eq!(
            cart.set_quantity(outcome.line_id, 50)?,
            LineUpdate::Quantity {
                quantity: 5,
                clamped: true
            }
        );

        Ok(())
    }

    #[test]
    fn cleanup_drops_sold_out_and_clamps() -> TestResult {
        let mut cart = cart();

        cart.add(&product(1, 1_000, 0, 5), 5, "", Timestamp::UNIX_EPOCH)?;
        cart.add(&product(2, 1_000, 0, 5), 1, "", Timestamp::UNIX_EPOCH)?;

        // Stock moved after the lines were added.
        if let Some(line) = cart.lines.get_mut(0) {
            line.product.stock = 2;
        }
        if let Some(line) = cart.lines.get_mut(1) {
            line.product.stock = 0;
        }

        assert_eq!(cart.cleanup(), 2);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(ProductId(1), ""), 2);

        Ok(())
    }

    #[test]
    fn restore_merges_duplicates_and_drops_foreign_lines() -> TestResult {
        let mut source = cart();
        source.add(&product(1, 1_000, 0, 50), 2, "", Timestamp::UNIX_EPOCH)?;

        let mut lines = source.lines().to_vec();
        let mut duplicate = lines.first().cloned().ok_or("missing line")?;
        duplicate.line_id = Uuid::now_v7();
        duplicate.quantity = 3;
        let mut foreign = duplicate.clone();
        foreign.product.price = Money::from_minor(1_000, USD);
        lines.extend([duplicate, foreign]);

        let restored = Cart::restore(KRW, 99, lines);

        assert_eq!(restored.len(), 1);
        assert_eq!(restored.quantity_of(ProductId(1), ""), 5);

        Ok(())
    }

    #[test]
    fn restore_drops_sold_out_lines() -> TestResult {
        let mut source = cart();
        source.add(&product(1, 1_000, 0, 5), 3, "", Timestamp::UNIX_EPOCH)?;
        source.add(&product(2, 1_000, 0, 5), 2, "", Timestamp::UNIX_EPOCH)?;

        let mut lines = source.lines().to_vec();
        if let Some(line) = lines.first_mut() {
            line.product.stock = 0;
        }

        let restored = Cart::restore(KRW, 99, lines);

        assert!(!restored.contains(ProductId(1), ""));
        assert_eq!(restored.quantity_of(ProductId(2), ""), 2);
        assert!(
            restored
                .lines()
                .iter()
                .all(|line| line.quantity <= line.product.stock)
        );

        Ok(())
    }

    #[test]
    fn set_quantity_on_sold_out_line_errors() -> TestResult {
        let mut cart = cart();
        let outcome = cart.add(&product(4, 1_000, 0, 5), 3, "", Timestamp::UNIX_EPOCH)?;

        // Stock ran out after the line was added.
        if let Some(line) = cart.lines.get_mut(0) {
            line.product.stock = 0;
        }

        assert_eq!(
            cart.set_quantity(outcome.line_id, 2),
            Err(CartError::OutOfStock(ProductId(4)))
        );
        assert_eq!(cart.quantity_of(ProductId(4), ""), 3);
        assert_eq!(cart.set_quantity(outcome.line_id, 0)?, LineUpdate::Removed);

        Ok(())
    }

    #[test]
    fn apply_dispatches_actions() -> TestResult {
        let mut cart = cart();

        cart.apply(
            CartAction::Add {
                product: product(1, 1_000, 0, 5),
                quantity: 2,
                option: String::new(),
            },
            Timestamp::UNIX_EPOCH,
        )?;

        let line_id = cart.lines().first().map(|line| line.line_id).ok_or("no line")?;

        cart.apply(CartAction::Decrement(line_id), Timestamp::UNIX_EPOCH)?;
        assert_eq!(cart.total_quantity(), 1);

        cart.apply(CartAction::Clear, Timestamp::UNIX_EPOCH)?;
        assert!(cart.is_empty());

        Ok(())
    }
}
