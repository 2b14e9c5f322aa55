//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    auth::{
        Auth, AuthError, Grade, LoginForm, Permission, ProfileUpdate, SignupForm, SocialProvider,
        UserSession,
    },
    cart::{AddOutcome, Cart, CartAction, CartError, CartLine, CartSummary, LineUpdate},
    catalog::{Catalog, CatalogError, Page, ProductQuery, ProductSort},
    clock::{Clock, ManualClock, SystemClock},
    config::ShopConfig,
    pricing::{Price, PriceError, ShippingPolicy},
    products::{Category, Product, ProductId},
    receipt::ReceiptError,
    search::RecentSearches,
    storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageKeys},
    storefront::{Notification, NotificationLevel, Order, Storefront, StorefrontError},
    wishlist::{Toggle, Wishlist, WishlistEntry, WishlistError, WishlistExport, WishlistSort},
};
