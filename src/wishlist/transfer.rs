//! Wishlist export and import

use jiff::Timestamp;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    catalog::Catalog,
    pricing::{Price, money_serde},
    products::ProductId,
    wishlist::{Wishlist, WishlistError, WishlistStats},
};

/// A shared wishlist item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedItem {
    /// Product id
    pub id: ProductId,

    /// Product title
    pub title: String,

    /// List price
    #[serde(with = "money_serde")]
    pub price: Price,

    /// Product image
    #[serde(default)]
    pub image: String,

    /// Category id
    #[serde(default)]
    pub category: String,

    /// When the product was saved
    pub added_at: Timestamp,
}

/// A wishlist prepared for sharing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistExport {
    /// Saved products
    pub items: Vec<ExportedItem>,

    /// Figures at export time; informational only and not read back
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub stats: Option<WishlistStats>,

    /// When the export was made
    pub exported_at: Timestamp,
}

impl WishlistExport {
    /// Parse a shared wishlist.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::InvalidExport`] if the text is not a wishlist export.
    pub fn from_json(raw: &str) -> Result<Self, WishlistError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Render as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::InvalidExport`] if serialization fails.
    pub fn to_json(&self) -> Result<String, WishlistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Wishlist {
    /// Prepare the wishlist for sharing.
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics cannot be computed.
    pub fn export(
        &self,
        currency: &'static Currency,
        low_stock_threshold: u32,
        now: Timestamp,
    ) -> Result<WishlistExport, WishlistError> {
        let items = self
            .entries
            .iter()
            .map(|entry| ExportedItem {
                id: entry.product.id,
                title: entry.product.title.clone(),
                price: entry.product.price,
                image: entry.product.image.clone(),
                category: entry.product.category.clone(),
                added_at: entry.added_at,
            })
            .collect();

        Ok(WishlistExport {
            items,
            stats: Some(self.stats(currency, low_stock_threshold)?),
            exported_at: now,
        })
    }

    /// Add the products of a shared wishlist. Products already saved, or missing from the
    /// catalog, are skipped. Returns the number of products added.
    pub fn import(&mut self, export: &WishlistExport, catalog: &Catalog, now: Timestamp) -> usize {
        let mut added = 0;

        for item in &export.items {
            let Some(product) = catalog.product(item.id) else {
                warn!(product = %item.id, "skipping unknown product in wishlist import");

                continue;
            };

            if self.add(product, now) {
                added += 1;
            }
        }

        debug!(added, offered = export.items.len(), "wishlist imported");

        added
    }
}
