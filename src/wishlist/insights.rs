//! Wishlist insights
//!
//! Grouping, sorting, filtering and statistics over saved products.

use std::{cmp::Reverse, collections::BTreeMap, fmt};

use clap::ValueEnum;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    pricing::{Price, PriceError, discount_amount, zero},
    wishlist::{Wishlist, WishlistEntry},
};

/// Price bucket used to group saved products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceBand {
    /// Below 10,000
    Under10k,

    /// 10,000 up to 30,000
    From10kTo30k,

    /// 30,000 up to 50,000
    From30kTo50k,

    /// 50,000 and over
    Over50k,
}

impl PriceBand {
    /// Band of a price, by its amount in minor units.
    pub fn of(price: &Price) -> Self {
        match price.to_minor_units() {
            ..10_000 => PriceBand::Under10k,
            10_000..30_000 => PriceBand::From10kTo30k,
            30_000..50_000 => PriceBand::From30kTo50k,
            _ => PriceBand::Over50k,
        }
    }
}

impl fmt::Display for PriceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PriceBand::Under10k => "under 10,000",
            PriceBand::From10kTo30k => "10,000 - 30,000",
            PriceBand::From30kTo50k => "30,000 - 50,000",
            PriceBand::Over50k => "50,000 and over",
        })
    }
}

/// Wishlist sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WishlistSort {
    /// Most recently saved first
    #[default]
    Newest,

    /// Earliest saved first
    Oldest,

    /// Cheapest first
    PriceLow,

    /// Dearest first
    PriceHigh,

    /// Alphabetical by title
    Name,

    /// Biggest discount first
    Discount,
}

/// Read-only wishlist filter. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WishlistFilter {
    /// Only this category
    pub category: Option<String>,

    /// Lowest price to include
    pub min_price: Option<Price>,

    /// Highest price to include
    pub max_price: Option<Price>,

    /// Only products with stock
    pub in_stock_only: bool,

    /// Only discounted products
    pub discounted_only: bool,
}

impl WishlistFilter {
    fn matches(&self, entry: &WishlistEntry) -> bool {
        let product = &entry.product;
        let minor = product.price.to_minor_units();

        self.category
            .as_deref()
            .is_none_or(|category| product.category == category)
            && self
                .min_price
                .is_none_or(|min| minor >= min.to_minor_units())
            && self
                .max_price
                .is_none_or(|max| minor <= max.to_minor_units())
            && (!self.in_stock_only || product.in_stock())
            && (!self.discounted_only || product.is_discounted())
    }
}

/// Wishlist summary figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistStats {
    /// Saved products
    pub total_count: usize,

    /// Sum of list prices
    #[serde(with = "crate::pricing::money_serde")]
    pub total_value: Price,

    /// Mean list price, rounded to a whole minor unit
    #[serde(with = "crate::pricing::money_serde")]
    pub average_price: Price,

    /// Discounted products
    pub discounted_count: usize,

    /// Sum of per-unit discounts
    #[serde(with = "crate::pricing::money_serde")]
    pub total_discount_value: Price,

    /// Sold-out products
    pub out_of_stock_count: usize,

    /// Products low on stock
    pub low_stock_count: usize,

    /// Saved products per category id
    pub category_counts: BTreeMap<String, usize>,
}

impl Wishlist {
    /// Entries grouped by category id.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&WishlistEntry>> {
        let mut groups: BTreeMap<&str, Vec<&WishlistEntry>> = BTreeMap::new();

        for entry in &self.entries {
            groups
                .entry(entry.product.category.as_str())
                .or_default()
                .push(entry);
        }

        groups
    }

    /// Entries grouped by price band.
    pub fn by_price_band(&self) -> BTreeMap<PriceBand, Vec<&WishlistEntry>> {
        let mut groups: BTreeMap<PriceBand, Vec<&WishlistEntry>> = BTreeMap::new();

        for entry in &self.entries {
            groups
                .entry(PriceBand::of(&entry.product.price))
                .or_default()
                .push(entry);
        }

        groups
    }

    /// The most recently saved entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&WishlistEntry> {
        let mut entries: Vec<&WishlistEntry> = self.entries.iter().collect();

        entries.sort_by_key(|entry| Reverse(entry.added_at));
        entries.truncate(limit);

        entries
    }

    /// Entries with a discount.
    pub fn discounted(&self) -> Vec<&WishlistEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.product.is_discounted())
            .collect()
    }

    /// Sold-out entries.
    pub fn out_of_stock(&self) -> Vec<&WishlistEntry> {
        self.entries
            .iter()
            .filter(|entry| !entry.product.in_stock())
            .collect()
    }

    /// Entries in stock but at or below the threshold.
    pub fn low_stock(&self, threshold: u32) -> Vec<&WishlistEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.product.in_stock() && entry.product.stock <= threshold)
            .collect()
    }

    /// Reorder the entries. The sort is stable.
    pub fn sort(&mut self, order: WishlistSort) {
        let entries = &mut self.entries;

        match order {
            WishlistSort::Newest => entries.sort_by_key(|entry| Reverse(entry.added_at)),
            WishlistSort::Oldest => entries.sort_by_key(|entry| entry.added_at),
            WishlistSort::PriceLow => {
                entries.sort_by_key(|entry| entry.product.price.to_minor_units());
            }
            WishlistSort::PriceHigh => {
                entries.sort_by_key(|entry| Reverse(entry.product.price.to_minor_units()));
            }
            WishlistSort::Name => {
                entries.sort_by_cached_key(|entry| entry.product.title.to_lowercase());
            }
            WishlistSort::Discount => entries.sort_by_key(|entry| Reverse(entry.product.discount)),
        }
    }

    /// Entries passing a filter.
    pub fn filter(&self, filter: &WishlistFilter) -> Vec<&WishlistEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .collect()
    }

    /// Case-insensitive search over title, description and tags.
    pub fn search(&self, query: &str) -> Vec<&WishlistEntry> {
        let needle = query.trim().to_lowercase();

        self.entries
            .iter()
            .filter(|entry| entry.product.matches_text(&needle))
            .collect()
    }

    /// Summary figures in the given currency.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if a sum overflows or an entry is priced in another currency.
    pub fn stats(
        &self,
        currency: &'static Currency,
        low_stock_threshold: u32,
    ) -> Result<WishlistStats, PriceError> {
        let total_value = self
            .entries
            .iter()
            .try_fold(zero(currency), |sum, entry| sum.add(entry.product.price))?;

        let discounted = self.discounted();

        let total_discount_value = discounted.iter().try_fold(zero(currency), |sum, entry| {
            let saving = discount_amount(&entry.product.price, entry.product.discount)?;

            Ok::<_, PriceError>(sum.add(saving)?)
        })?;

        let average_price = if self.entries.is_empty() {
            zero(currency)
        } else {
            let count = Decimal::from(self.entries.len());
            let mean = (Decimal::from(total_value.to_minor_units()) / count)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

            let minor = mean
                .to_i64()
                .ok_or_else(|| PriceError::Overflow(mean.to_string()))?;

            Money::from_minor(minor, currency)
        };

        let category_counts = self
            .by_category()
            .into_iter()
            .map(|(category, entries)| (category.to_string(), entries.len()))
            .collect();

        Ok(WishlistStats {
            total_count: self.entries.len(),
            total_value,
            average_price,
            discounted_count: discounted.len(),
            total_discount_value,
            out_of_stock_count: self.out_of_stock().len(),
            low_stock_count: self.low_stock(low_stock_threshold).len(),
            category_counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use rusty_money::iso::KRW;
    use testresult::TestResult;

    use super::*;
    use crate::products::{ProductId, test_support::product};

    fn krw(amount: i64) -> Price {
        Money::from_minor(amount, KRW)
    }

    fn wishlist() -> Wishlist {
        let mut wishlist = Wishlist::new();
        let start = Timestamp::UNIX_EPOCH;

        let mut hoodie = product(9, 42_000, 19, 34);
        hoodie.category = "fashion".to_string();
        hoodie.title = "Kirby Hoodie".to_string();

        let mut candy = product(14, 8_000, 0, 3);
        candy.category = "food".to_string();
        candy.title = "Kirby Candy".to_string();

        let mut figure = product(3, 45_000, 0, 0);
        figure.title = "Meta Knight Figure".to_string();
        figure.tags.push("collection".to_string());

        let mut blanket = product(7, 55_000, 10, 19);
        blanket.title = "Kirby Blanket".to_string();

        for (offset, item) in [hoodie, candy, figure, blanket].iter().enumerate() {
            let secs = i64::try_from(offset).unwrap_or_default();
            wishlist.add(item, start + SignedDuration::from_secs(secs));
        }

        wishlist
    }

    fn ids(entries: &[&WishlistEntry]) -> Vec<u32> {
        entries.iter().map(|entry| entry.product.id.0).collect()
    }

    #[test]
    fn price_bands_split_at_boundaries() {
        assert_eq!(PriceBand::of(&krw(9_999)), PriceBand::Under10k);
        assert_eq!(PriceBand::of(&krw(10_000)), PriceBand::From10kTo30k);
        assert_eq!(PriceBand::of(&krw(30_000)), PriceBand::From30kTo50k);
        assert_eq!(PriceBand::of(&krw(50_000)), PriceBand::Over50k);
    }

    #[test]
    fn groups_by_band_and_category() {
        let wishlist = wishlist();

        let bands = wishlist.by_price_band();
        assert_eq!(bands.get(&PriceBand::From30kTo50k).map(Vec::len), Some(2));
        assert_eq!(bands.get(&PriceBand::Under10k).map(Vec::len), Some(1));

        let categories = wishlist.by_category();
        assert_eq!(categories.get("plush").map(Vec::len), Some(2));
    }

    #[test]
    fn stock_and_discount_views() {
        let wishlist = wishlist();

        assert_eq!(ids(&wishlist.discounted()), vec![9, 7]);
        assert_eq!(ids(&wishlist.out_of_stock()), vec![3]);
        assert_eq!(ids(&wishlist.low_stock(5)), vec![14]);
        assert_eq!(ids(&wishlist.recent(2)), vec![7, 3]);
    }

    #[test]
    fn sort_reorders_entries() {
        let mut wishlist = wishlist();

        wishlist.sort(WishlistSort::PriceLow);
        assert_eq!(
            wishlist.ids(),
            [ProductId(14), ProductId(9), ProductId(3), ProductId(7)]
        );

        wishlist.sort(WishlistSort::Name);
        assert_eq!(
            wishlist.ids(),
            [ProductId(7), ProductId(14), ProductId(9), ProductId(3)]
        );

        wishlist.sort(WishlistSort::Oldest);
        assert_eq!(
            wishlist.ids(),
            [ProductId(9), ProductId(14), ProductId(3), ProductId(7)]
        );
    }

    #[test]
    fn filter_and_search_are_read_only() {
        let wishlist = wishlist();

        let filter = WishlistFilter {
            in_stock_only: true,
            min_price: Some(krw(40_000)),
            ..WishlistFilter::default()
        };

        assert_eq!(ids(&wishlist.filter(&filter)), vec![9, 7]);
        assert_eq!(ids(&wishlist.search("COLLECTION")), vec![3]);
        assert_eq!(wishlist.len(), 4);
    }

    #[test]
    fn stats_sum_values() -> TestResult {
        let stats = wishlist().stats(KRW, 5)?;

        assert_eq!(stats.total_count, 4);
        assert_eq!(stats.total_value, krw(150_000));
        assert_eq!(stats.average_price, krw(37_500));
        assert_eq!(stats.discounted_count, 2);
        // 19% of 42,000 plus 10% of 55,000
        assert_eq!(stats.total_discount_value, krw(7_980 + 5_500));
        assert_eq!(stats.out_of_stock_count, 1);
        assert_eq!(stats.low_stock_count, 1);
        assert_eq!(stats.category_counts.get("fashion"), Some(&1));

        Ok(())
    }

    #[test]
    fn stats_of_empty_wishlist_are_zero() -> TestResult {
        let stats = Wishlist::new().stats(KRW, 5)?;

        assert_eq!(stats.average_price, krw(0));
        assert!(stats.category_counts.is_empty());

        Ok(())
    }
}
