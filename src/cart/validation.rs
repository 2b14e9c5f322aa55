//! Cart validation

use std::fmt;

use uuid::Uuid;

use crate::{cart::Cart, products::ProductId};

/// What is wrong with a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartIssueKind {
    /// Fewer units in stock than ordered
    Shortage {
        /// Units in stock
        available: u32,
    },

    /// No units in stock
    OutOfStock,

    /// More units than one line may hold
    OverMaximum {
        /// Line limit
        max: u32,
    },
}

/// A problem with one cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartIssue {
    /// Offending line
    pub line_id: Uuid,

    /// Product on the line
    pub product_id: ProductId,

    /// Product title
    pub title: String,

    /// The problem
    pub kind: CartIssueKind,
}

impl fmt::Display for CartIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CartIssueKind::Shortage { available } => {
                write!(f, "{} is low on stock ({available} left)", self.title)
            }
            CartIssueKind::OutOfStock => write!(f, "{} is sold out", self.title),
            CartIssueKind::OverMaximum { max } => {
                write!(f, "{} is limited to {max} per order", self.title)
            }
        }
    }
}

/// Outcome of checking a cart against stock and line limits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartValidation {
    /// Problems found, in line order
    pub issues: Vec<CartIssue>,
}

impl CartValidation {
    /// Whether the cart can be ordered as it is.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

impl Cart {
    /// Check every line against its stock snapshot and the line maximum.
    pub fn validate(&self) -> CartValidation {
        let mut issues = Vec::new();

        for line in &self.lines {
            let stock = line.product.stock;

            let kind = if stock == 0 {
                Some(CartIssueKind::OutOfStock)
            } else if stock < line.quantity {
                Some(CartIssueKind::Shortage { available: stock })
            } else if line.quantity > self.max_quantity {
                Some(CartIssueKind::OverMaximum {
                    max: self.max_quantity,
                })
            } else {
                None
            };

            if let Some(kind) = kind {
                issues.push(CartIssue {
                    line_id: line.line_id,
                    product_id: line.product.id,
                    title: line.product.title.clone(),
                    kind,
                });
            }
        }

        CartValidation { issues }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::iso::KRW;
    use testresult::TestResult;

    use super::*;
    use crate::products::test_support::product;

    #[test]
    fn fresh_cart_is_valid() -> TestResult {
        let mut cart = Cart::new(KRW, 99);
        cart.add(&product(1, 1_000, 0, 5), 5, "", Timestamp::UNIX_EPOCH)?;

        assert!(cart.validate().is_valid());

        Ok(())
    }

    #[test]
    fn stale_snapshots_raise_issues() -> TestResult {
        let mut cart = Cart::new(KRW, 99);
        cart.add(&product(1, 1_000, 0, 5), 4, "", Timestamp::UNIX_EPOCH)?;
        cart.add(&product(2, 1_000, 0, 5), 1, "", Timestamp::UNIX_EPOCH)?;

        for line in &mut cart.lines {
            line.product.stock = if line.product.id == ProductId(1) { 2 } else { 0 };
        }

        let validation = cart.validate();
        let kinds: Vec<_> = validation.issues.iter().map(|issue| issue.kind).collect();

        assert!(!validation.is_valid());
        assert_eq!(
            kinds,
            vec![
                CartIssueKind::Shortage { available: 2 },
                CartIssueKind::OutOfStock
            ]
        );
        assert_eq!(
            validation.issues.first().map(ToString::to_string),
            Some("Product 1 is low on stock (2 left)".to_string())
        );

        Ok(())
    }

    #[test]
    fn lowered_maximum_is_reported() -> TestResult {
        let mut cart = Cart::new(KRW, 99);
        cart.add(&product(1, 1_000, 0, 50), 10, "", Timestamp::UNIX_EPOCH)?;
        cart.max_quantity = 3;

        assert_eq!(
            cart.validate().issues.first().map(|issue| issue.kind),
            Some(CartIssueKind::OverMaximum { max: 3 })
        );

        Ok(())
    }
}
