//! Product Queries
//!
//! Filter, sort and paginate catalog listings.

use std::cmp::Reverse;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    pricing::Price,
    products::{ALL_CATEGORY, Product},
};

/// Listing sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Best sellers, then new arrivals, then by rating
    #[default]
    Recommended,

    /// New arrivals first, then most recently added
    Newest,

    /// Cheapest first
    PriceLow,

    /// Dearest first
    PriceHigh,

    /// Highest rated first
    Rating,

    /// Most reviewed first
    Reviews,

    /// Biggest discount first
    Discount,

    /// Alphabetical by title
    Name,
}

impl ProductSort {
    /// Sort products in place. The sort is stable, so ties keep catalog order.
    pub fn sort(self, products: &mut [&Product]) {
        match self {
            ProductSort::Recommended => products
                .sort_by_key(|p| (Reverse(p.is_best_seller), Reverse(p.is_new), Reverse(p.rating))),
            ProductSort::Newest => products.sort_by_key(|p| (Reverse(p.is_new), Reverse(p.id))),
            ProductSort::PriceLow => products.sort_by_key(|p| p.price.to_minor_units()),
            ProductSort::PriceHigh => products.sort_by_key(|p| Reverse(p.price.to_minor_units())),
            ProductSort::Rating => products.sort_by_key(|p| Reverse(p.rating)),
            ProductSort::Reviews => products.sort_by_key(|p| Reverse(p.review_count)),
            ProductSort::Discount => products.sort_by_key(|p| Reverse(p.discount)),
            ProductSort::Name => products.sort_by_cached_key(|p| p.title.to_lowercase()),
        }
    }
}

/// Filters and sort order for a product listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    /// Category ids to include; empty (or containing `all`) means every category
    pub categories: Vec<String>,

    /// Products must carry at least one of these tags; empty means no tag filter
    pub tags: Vec<String>,

    /// Lowest list price to include
    pub min_price: Option<Price>,

    /// Highest list price to include
    pub max_price: Option<Price>,

    /// Only products with stock
    pub in_stock_only: bool,

    /// Only new arrivals
    pub new_only: bool,

    /// Only discounted products
    pub discounted_only: bool,

    /// Free-text search
    pub text: String,

    /// Sort order
    pub sort: ProductSort,
}

impl ProductQuery {
    /// Whether any filter or a non-default sort is set.
    pub fn has_active_filters(&self) -> bool {
        !self.categories.is_empty()
            || !self.tags.is_empty()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.in_stock_only
            || self.new_only
            || self.discounted_only
            || !self.text.trim().is_empty()
            || self.sort != ProductSort::default()
    }

    /// Whether a product passes every filter except the text search.
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|c| c == ALL_CATEGORY || *c == product.category);

        let tags_ok = self.tags.is_empty() || self.tags.iter().any(|tag| product.has_tag(tag));

        let minor = product.price.to_minor_units();
        let min_ok = self
            .min_price
            .is_none_or(|min| minor >= min.to_minor_units());
        let max_ok = self
            .max_price
            .is_none_or(|max| minor <= max.to_minor_units());

        category_ok
            && tags_ok
            && min_ok
            && max_ok
            && (!self.in_stock_only || product.in_stock())
            && (!self.new_only || product.is_new)
            && (!self.discounted_only || product.is_discounted())
    }

    /// Filter and sort products drawn from a catalog.
    pub fn apply<'a>(
        &self,
        catalog: &Catalog,
        products: impl IntoIterator<Item = &'a Product>,
    ) -> Vec<&'a Product> {
        let needle = self.text.trim().to_lowercase();

        let mut selected: Vec<&Product> = products
            .into_iter()
            .filter(|product| self.matches(product) && catalog.matches_text(product, &needle))
            .collect();

        self.sort.sort(&mut selected);

        selected
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// 1-based page number actually shown
    pub page: usize,

    /// Page size
    pub per_page: usize,

    /// Number of pages (0 for an empty listing)
    pub total_pages: usize,

    /// Number of items across all pages
    pub total_items: usize,
}

impl<T> Page<T> {
    /// Cut one page out of a listing.
    ///
    /// Page numbers are 1-based and clamped into `1..=max(total_pages, 1)`. A zero page size is
    /// treated as one item per page.
    pub fn of(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(per_page);
        let page = page.clamp(1, total_pages.max(1));

        let items = items
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Self {
            items,
            page,
            per_page,
            total_pages,
            total_items,
        }
    }

    /// Whether a later page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
