//! Wishlist
//!
//! Saved-for-later products, at most one entry per product.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    pricing::PriceError,
    products::{Product, ProductId},
};

mod insights;
mod transfer;

pub use insights::{PriceBand, WishlistFilter, WishlistSort, WishlistStats};
pub use transfer::{ExportedItem, WishlistExport};

/// Wishlist errors
#[derive(Debug, Error)]
pub enum WishlistError {
    /// Exported wishlist data could not be read.
    #[error("invalid wishlist export: {0}")]
    InvalidExport(#[from] serde_json::Error),

    /// Price arithmetic failed.
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// A saved product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// Synthetic entry id
    pub wishlist_id: Uuid,

    /// Product snapshot
    pub product: Product,

    /// When the product was saved
    pub added_at: Timestamp,
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The product was saved
    Added,

    /// The product was removed
    Removed,
}

/// Wishlist
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wishlist {
    entries: Vec<WishlistEntry>,
}

impl Wishlist {
    /// Create an empty wishlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a wishlist from stored entries, keeping the first entry of each product.
    pub fn restore(entries: impl IntoIterator<Item = WishlistEntry>) -> Self {
        let mut wishlist = Self::new();

        for entry in entries {
            if !wishlist.contains(entry.product.id) {
                wishlist.entries.push(entry);
            }
        }

        wishlist
    }

    /// Entries in list order.
    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    /// Number of saved products.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is saved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a product is saved.
    pub fn contains(&self, id: ProductId) -> bool {
        self.entries.iter().any(|entry| entry.product.id == id)
    }

    /// Ids of saved products, in list order.
    pub fn ids(&self) -> Vec<ProductId> {
        self.entries.iter().map(|entry| entry.product.id).collect()
    }

    /// Save a product. Returns `false` if it was already saved.
    pub fn add(&mut self, product: &Product, now: Timestamp) -> bool {
        if self.contains(product.id) {
            return false;
        }

        self.entries.push(WishlistEntry {
            wishlist_id: Uuid::now_v7(),
            product: product.clone(),
            added_at: now,
        });

        debug!(product = %product.id, "added to wishlist");

        true
    }

    /// Remove a product. Returns `false` if it was not saved.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.entries.len();

        self.entries.retain(|entry| entry.product.id != id);

        let removed = self.entries.len() != before;

        if removed {
            debug!(product = %id, "removed from wishlist");
        }

        removed
    }

    /// Save the product if it is not saved, otherwise remove it.
    pub fn toggle(&mut self, product: &Product, now: Timestamp) -> Toggle {
        if self.remove(product.id) {
            Toggle::Removed
        } else {
            self.add(product, now);

            Toggle::Added
        }
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::test_support::product;

    #[test]
    fn toggle_twice_restores_membership() {
        let mut wishlist = Wishlist::new();
        let plush = product(1, 28_000, 20, 25);

        assert_eq!(wishlist.toggle(&plush, Timestamp::UNIX_EPOCH), Toggle::Added);
        assert!(wishlist.contains(plush.id));

        assert_eq!(
            wishlist.toggle(&plush, Timestamp::UNIX_EPOCH),
            Toggle::Removed
        );
        assert!(wishlist.is_empty());
    }

    #[test]
    fn add_is_idempotent() {
        let mut wishlist = Wishlist::new();
        let plush = product(1, 28_000, 20, 25);

        assert!(wishlist.add(&plush, Timestamp::UNIX_EPOCH));
        assert!(!wishlist.add(&plush, Timestamp::UNIX_EPOCH));
        assert_eq!(wishlist.ids(), vec![ProductId(1)]);
    }

    #[test]
    fn remove_reports_missing() {
        let mut wishlist = Wishlist::new();

        assert!(!wishlist.remove(ProductId(7)));
    }

    #[test]
    fn restore_drops_duplicates() {
        let mut source = Wishlist::new();
        source.add(&product(1, 1_000, 0, 1), Timestamp::UNIX_EPOCH);
        source.add(&product(2, 1_000, 0, 1), Timestamp::UNIX_EPOCH);

        let mut entries = source.entries().to_vec();
        entries.extend(source.entries().iter().cloned());

        let restored = Wishlist::restore(entries);

        assert_eq!(restored.ids(), vec![ProductId(1), ProductId(2)]);
    }
}
