//! Catalog
//!
//! The static product catalog. Catalogs are loaded from YAML fixtures and validated once; every
//! query afterwards is a plain filter over the product list.

use std::{collections::BTreeSet, fs, path::Path};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    pricing::Price,
    products::{ALL_CATEGORY, Category, Product, ProductId},
};

pub mod query;

pub use query::{Page, ProductQuery, ProductSort};

const BUNDLED_CATALOG: &str = include_str!("../../fixtures/catalog/kirby.yml");

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Two products share an id
    #[error("duplicate product id {0}")]
    DuplicateProduct(ProductId),

    /// A category uses the reserved `all` id or appears twice
    #[error("invalid category id: {0}")]
    InvalidCategory(String),

    /// A product references a category that does not exist
    #[error("product {product} references unknown category {category}")]
    UnknownCategory {
        /// Offending product
        product: ProductId,

        /// Missing category id
        category: String,
    },

    /// A product is priced in a different currency from the catalog
    #[error("product {product} is priced in {found}, catalog currency is {expected}")]
    CurrencyMismatch {
        /// Offending product
        product: ProductId,

        /// Catalog currency code
        expected: &'static str,

        /// Product currency code
        found: &'static str,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFixture {
    currency: String,

    categories: Vec<Category>,

    #[serde(default)]
    popular_searches: Vec<String>,

    products: Vec<Product>,
}

/// Per-category product count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    /// Category id
    pub id: String,

    /// Category display name
    pub name: String,

    /// Number of products
    pub count: usize,
}

/// Catalog summary figures.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStats {
    /// Number of products
    pub total: usize,

    /// Mean selling price, rounded to a whole minor unit
    pub average_price: Price,

    /// Mean rating to one decimal place
    pub average_rating: Decimal,

    /// Counts per category, starting with `all`
    pub categories: Vec<CategoryCount>,

    /// Number of best sellers
    pub best_sellers: usize,

    /// Number of new products
    pub new_products: usize,

    /// Number of limited products
    pub limited_products: usize,
}

/// Catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    currency: &'static Currency,
    categories: Vec<Category>,
    products: Vec<Product>,
    index: FxHashMap<ProductId, usize>,
    popular_searches: Vec<String>,
}

impl Catalog {
    /// Load the catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled fixture fails validation.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_yaml(BUNDLED_CATALOG)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path.as_ref())?;

        Self::from_yaml(&contents)
    }

    /// Load a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or the catalog is inconsistent.
    pub fn from_yaml(contents: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(contents)?;

        let currency = iso::find(&fixture.currency)
            .ok_or_else(|| CatalogError::UnknownCurrency(fixture.currency.clone()))?;

        Self::new(
            currency,
            fixture.categories,
            fixture.products,
            fixture.popular_searches,
        )
    }

    /// Build a catalog from already-parsed parts.
    ///
    /// # Errors
    ///
    /// Returns an error if product ids repeat, a category is unknown or reserved, or a product is
    /// priced in a different currency.
    pub fn new(
        currency: &'static Currency,
        categories: Vec<Category>,
        products: Vec<Product>,
        popular_searches: Vec<String>,
    ) -> Result<Self, CatalogError> {
        let mut category_ids = BTreeSet::new();

        for category in &categories {
            if category.id == ALL_CATEGORY || !category_ids.insert(category.id.as_str()) {
                return Err(CatalogError::InvalidCategory(category.id.clone()));
            }
        }

        let mut index = FxHashMap::default();

        for (position, product) in products.iter().enumerate() {
            if !category_ids.contains(product.category.as_str()) {
                return Err(CatalogError::UnknownCategory {
                    product: product.id,
                    category: product.category.clone(),
                });
            }

            let product_currency = product.price.currency();

            if product_currency != currency {
                return Err(CatalogError::CurrencyMismatch {
                    product: product.id,
                    expected: currency.iso_alpha_code,
                    found: product_currency.iso_alpha_code,
                });
            }

            if index.insert(product.id, position).is_some() {
                return Err(CatalogError::DuplicateProduct(product.id));
            }
        }

        debug!(
            products = products.len(),
            categories = categories.len(),
            currency = currency.iso_alpha_code,
            "catalog loaded"
        );

        Ok(Self {
            currency,
            categories,
            products,
            index,
            popular_searches,
        })
    }

    /// Catalog currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// All categories, in menu order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a category by id.
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Display name of a category id, falling back to the id itself.
    pub fn category_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.category(id).map_or(id, |category| category.name.as_str())
    }

    /// All products, in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.index
            .get(&id)
            .and_then(|position| self.products.get(*position))
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Suggested search terms.
    pub fn popular_searches(&self) -> &[String] {
        &self.popular_searches
    }

    /// Products in a category. The reserved `all` id returns every product.
    pub fn by_category(&self, category: &str) -> Vec<&Product> {
        if category == ALL_CATEGORY {
            return self.products.iter().collect();
        }

        self.products
            .iter()
            .filter(|product| product.category == category)
            .collect()
    }

    /// Best-selling products.
    pub fn best_sellers(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_best_seller).collect()
    }

    /// Newly released products.
    pub fn new_arrivals(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_new).collect()
    }

    /// Limited edition products.
    pub fn limited(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_limited).collect()
    }

    /// Products carrying a discount.
    pub fn discounted(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_discounted()).collect()
    }

    /// Case-insensitive search over title, description, category name and tags.
    ///
    /// A blank query matches every product.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();

        self.products
            .iter()
            .filter(|product| self.matches_text(product, &needle))
            .collect()
    }

    pub(crate) fn matches_text(&self, product: &Product, needle: &str) -> bool {
        needle.is_empty()
            || product.matches_text(needle)
            || self
                .category_name(&product.category)
                .to_lowercase()
                .contains(needle)
    }

    /// Run a filter/sort query over the whole catalog.
    pub fn query(&self, query: &ProductQuery) -> Vec<&Product> {
        query.apply(self, self.products.iter())
    }

    /// Every distinct tag, sorted.
    pub fn all_tags(&self) -> Vec<&str> {
        self.products
            .iter()
            .flat_map(|product| product.tags.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Cheapest and dearest selling prices, or `None` for an empty catalog.
    pub fn price_bounds(&self) -> Option<(Price, Price)> {
        let min = self
            .products
            .iter()
            .min_by_key(|p| p.price.to_minor_units())?;
        let max = self
            .products
            .iter()
            .max_by_key(|p| p.price.to_minor_units())?;

        Some((min.price, max.price))
    }

    /// Summary statistics for the catalog.
    pub fn stats(&self) -> CatalogStats {
        let total = self.products.len();

        let mut categories = vec![CategoryCount {
            id: ALL_CATEGORY.to_string(),
            name: "All".to_string(),
            count: total,
        }];

        categories.extend(self.categories.iter().map(|category| CategoryCount {
            id: category.id.clone(),
            name: category.name.clone(),
            count: self.by_category(&category.id).len(),
        }));

        CatalogStats {
            total,
            average_price: self.average_price(),
            average_rating: self.average_rating(),
            categories,
            best_sellers: self.best_sellers().len(),
            new_products: self.new_arrivals().len(),
            limited_products: self.limited().len(),
        }
    }

    fn average_price(&self) -> Price {
        let Some(count) = nonzero_len(self.products.len()) else {
            return Money::from_minor(0, self.currency);
        };

        let sum: i64 = self.products.iter().map(|p| p.price.to_minor_units()).sum();

        let mean = (Decimal::from(sum) / count)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or_default();

        Money::from_minor(mean, self.currency)
    }

    fn average_rating(&self) -> Decimal {
        let Some(count) = nonzero_len(self.products.len()) else {
            return Decimal::ZERO;
        };

        let sum: Decimal = self.products.iter().map(|p| p.rating).sum();

        (sum / count).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    }
}

fn nonzero_len(len: usize) -> Option<Decimal> {
    (len > 0).then(|| Decimal::from(len))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{KRW, USD};
    use testresult::TestResult;

    use super::*;
    use crate::products::test_support::product;

    fn categories() -> Vec<Category> {
        vec![Category {
            id: "plush".to_string(),
            name: "Plush & Figures".to_string(),
            icon: String::new(),
        }]
    }

    #[test]
    fn bundled_catalog_loads() -> TestResult {
        let catalog = Catalog::bundled()?;

        assert_eq!(catalog.len(), 20);
        assert_eq!(catalog.currency(), KRW);
        assert_eq!(catalog.categories().len(), 6);

        Ok(())
    }

    #[test]
    fn by_category_all_returns_everything() -> TestResult {
        let catalog = Catalog::bundled()?;

        assert_eq!(catalog.by_category(ALL_CATEGORY).len(), 20);
        assert_eq!(catalog.by_category("plush").len(), 4);
        assert_eq!(catalog.by_category("lifestyle").len(), 6);
        assert!(catalog.by_category("unknown").is_empty());

        Ok(())
    }

    #[test]
    fn flag_queries_count_products() -> TestResult {
        let catalog = Catalog::bundled()?;

        assert_eq!(catalog.best_sellers().len(), 6);
        assert_eq!(catalog.new_arrivals().len(), 6);
        assert_eq!(catalog.limited().len(), 1);
        assert_eq!(catalog.discounted().len(), 6);

        Ok(())
    }

    #[test]
    fn search_matches_title_tags_and_category_name() -> TestResult {
        let catalog = Catalog::bundled()?;

        let mugs = catalog.search("MUG");
        assert_eq!(mugs.len(), 1);
        assert_eq!(mugs.first().map(|p| p.id), Some(ProductId(5)));

        // "snack" is only a tag on the cookies, "Snacks" is in the food category name.
        let snacks: Vec<_> = catalog.search("snack").iter().map(|p| p.id).collect();
        assert_eq!(snacks, vec![ProductId(13), ProductId(14)]);

        assert_eq!(catalog.search("   ").len(), 20);
        assert!(catalog.search("zzz").is_empty());

        Ok(())
    }

    #[test]
    fn stats_summarise_catalog() -> TestResult {
        let catalog = Catalog::bundled()?;
        let stats = catalog.stats();

        assert_eq!(stats.total, 20);
        assert_eq!(stats.average_price, Money::from_minor(22_650, KRW));
        assert_eq!(stats.best_sellers, 6);
        assert_eq!(stats.limited_products, 1);
        assert_eq!(
            stats.categories.first().map(|c| (c.id.as_str(), c.count)),
            Some((ALL_CATEGORY, 20))
        );
        assert_eq!(stats.categories.len(), 7);

        Ok(())
    }

    #[test]
    fn price_bounds_span_catalog() -> TestResult {
        let catalog = Catalog::bundled()?;

        assert_eq!(
            catalog.price_bounds(),
            Some((Money::from_minor(6_000, KRW), Money::from_minor(45_000, KRW)))
        );

        Ok(())
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = Catalog::new(
            KRW,
            categories(),
            vec![product(1, 1_000, 0, 1), product(1, 2_000, 0, 1)],
            Vec::new(),
        );

        assert!(matches!(
            result,
            Err(CatalogError::DuplicateProduct(ProductId(1)))
        ));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut stray = product(1, 1_000, 0, 1);
        stray.category = "garden".to_string();

        let result = Catalog::new(KRW, categories(), vec![stray], Vec::new());

        assert!(matches!(
            result,
            Err(CatalogError::UnknownCategory { category, .. }) if category == "garden"
        ));
    }

    #[test]
    fn reserved_category_is_rejected() {
        let reserved = vec![Category {
            id: ALL_CATEGORY.to_string(),
            name: "All".to_string(),
            icon: String::new(),
        }];

        let result = Catalog::new(KRW, reserved, Vec::new(), Vec::new());

        assert!(matches!(result, Err(CatalogError::InvalidCategory(_))));
    }

    #[test]
    fn currency_mismatch_is_rejected() {
        let mut dollars = product(1, 1_000, 0, 1);
        dollars.price = Money::from_minor(1_000, USD);

        let result = Catalog::new(KRW, categories(), vec![dollars], Vec::new());

        assert!(matches!(
            result,
            Err(CatalogError::CurrencyMismatch { found: "USD", .. })
        ));
    }

    #[test]
    fn all_tags_are_sorted_and_unique() -> TestResult {
        let catalog = Catalog::bundled()?;
        let tags = catalog.all_tags();

        assert!(tags.windows(2).all(|pair| pair.first() < pair.last()));
        assert!(tags.contains(&"plush"));

        Ok(())
    }
}
