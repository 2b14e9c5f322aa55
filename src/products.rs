//! Products

use std::{collections::BTreeMap, fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::pricing::{Price, PriceError, discounted_price, money_serde, option_money_serde};

/// Category id that selects every product.
pub const ALL_CATEGORY: &str = "all";

/// Product identifier, unique within a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u32);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ProductId)
    }
}

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id (`all` is reserved)
    pub id: String,

    /// Display name
    pub name: String,

    /// Menu icon
    #[serde(default)]
    pub icon: String,
}

/// Product
///
/// Products are immutable catalog records. Carts and wishlists hold snapshots, so a product
/// serializes completely and round-trips through local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product title
    pub title: String,

    /// Long description
    #[serde(default)]
    pub description: String,

    /// Selling price before the product discount
    #[serde(with = "money_serde")]
    pub price: Price,

    /// Reference "was" price shown alongside the selling price
    #[serde(default, with = "option_money_serde", skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Price>,

    /// Discount in whole percent points
    #[serde(default)]
    pub discount: u8,

    /// Category id
    pub category: String,

    /// Main image path
    #[serde(default)]
    pub image: String,

    /// Gallery image paths
    #[serde(default)]
    pub images: Vec<String>,

    /// Average rating out of 5
    #[serde(default)]
    pub rating: Decimal,

    /// Number of reviews
    #[serde(default)]
    pub review_count: u32,

    /// Units in stock
    #[serde(default)]
    pub stock: u32,

    /// Newly released
    #[serde(default)]
    pub is_new: bool,

    /// Best seller
    #[serde(default)]
    pub is_best_seller: bool,

    /// Limited edition
    #[serde(default)]
    pub is_limited: bool,

    /// Search tags
    #[serde(default)]
    pub tags: SmallVec<[String; 5]>,

    /// Free-form attribute table (material, size and so on)
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
}

impl Product {
    /// Whether the product carries a discount.
    pub fn is_discounted(&self) -> bool {
        self.discount > 0
    }

    /// Whether any units are in stock.
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Unit price after the product discount.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the discounted amount cannot be represented.
    pub fn unit_price(&self) -> Result<Price, PriceError> {
        discounted_price(&self.price, self.discount)
    }

    /// Whether the product has the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive match of an already lowercased needle against title, description and
    /// tags.
    pub(crate) fn matches_text(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::KRW};
    use smallvec::smallvec;

    use super::*;

    /// Minimal product for unit tests.
    pub(crate) fn product(id: u32, price: i64, discount: u8, stock: u32) -> Product {
        Product {
            id: ProductId(id),
            title: format!("Product {id}"),
            description: String::new(),
            price: Money::from_minor(price, KRW),
            compare_at_price: None,
            discount,
            category: "plush".to_string(),
            image: String::new(),
            images: Vec::new(),
            rating: Decimal::new(45, 1),
            review_count: 0,
            stock,
            is_new: false,
            is_best_seller: false,
            is_limited: false,
            tags: smallvec![],
            specs: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::KRW};
    use testresult::TestResult;

    use super::{test_support::product, *};

    #[test]
    fn unit_price_applies_discount() -> TestResult {
        let plush = product(1, 28_000, 20, 25);

        assert_eq!(plush.unit_price()?, Money::from_minor(22_400, KRW));
        assert!(plush.is_discounted());

        Ok(())
    }

    #[test]
    fn product_round_trips_through_json() -> TestResult {
        let mut plush = product(1, 28_000, 20, 25);
        plush.compare_at_price = Some(Money::from_minor(35_000, KRW));
        plush.tags.push("plush".to_string());
        plush.specs.insert("size".to_string(), "20cm".to_string());

        let json = serde_json::to_string(&plush)?;
        let restored: Product = serde_json::from_str(&json)?;

        assert!(json.contains("\"price\":\"28000 KRW\""));
        assert_eq!(restored, plush);

        Ok(())
    }

    #[test]
    fn product_id_parses_with_whitespace() -> TestResult {
        assert_eq!(" 12 ".parse::<ProductId>()?, ProductId(12));

        Ok(())
    }

    #[test]
    fn matches_text_checks_tags() {
        let mut mug = product(5, 18_000, 0, 67);
        mug.tags.push("Coffee".to_string());

        assert!(mug.matches_text("coffee"));
        assert!(!mug.matches_text("tea"));
    }
}
