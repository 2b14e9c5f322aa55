//! Storefront
//!
//! State and rules for a Kirby-themed character goods shop: a browsable catalog, a cart and
//! wishlist with derived totals, a mock member session with grades and points, and a local
//! key-value store that keeps it all between runs.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod search;
pub mod storage;
pub mod storefront;
pub mod wishlist;
