//! Shop Configuration
//!
//! Policy values for the storefront. Every field can be set from the command line or a `SHOP_*`
//! environment variable; [`ShopConfig::default`] gives the stock shop settings.

use std::{thread, time::Duration};

use clap::{ArgAction, Args};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;
use tracing::trace;

use crate::{
    pricing::ShippingPolicy,
    storage::{StorageKeys, validate_key},
};

/// Default free-shipping threshold, in minor units.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 30_000;

/// Default flat shipping fee, in minor units.
pub const DEFAULT_SHIPPING_FEE: i64 = 3_000;

/// Default maximum quantity of one cart line.
pub const DEFAULT_MAX_CART_QUANTITY: u32 = 99;

/// Default stock level at or below which a product counts as low on stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

/// Default number of products per listing page.
pub const DEFAULT_PRODUCTS_PER_PAGE: usize = 12;

/// Default number of remembered search terms.
pub const DEFAULT_RECENT_SEARCH_LIMIT: usize = 5;

/// Default notification lifetime in milliseconds.
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 3_000;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Unknown currency code
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A shipping amount is negative
    #[error("shipping amounts must not be negative")]
    NegativeShipping,

    /// Max cart quantity must be at least one
    #[error("max cart quantity must be at least 1")]
    ZeroMaxQuantity,

    /// The storage prefix cannot be part of a key
    #[error("storage prefix must be non-empty and contain no path separators: {0:?}")]
    InvalidStoragePrefix(String),
}

/// Operations that pretend to talk to a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedCall {
    /// Email login
    Login,

    /// Account creation
    Signup,

    /// Social provider login
    SocialLogin,

    /// Profile update
    UpdateProfile,

    /// Password change
    ChangePassword,

    /// Account deletion
    DeleteAccount,

    /// Order placement
    Checkout,
}

impl SimulatedCall {
    /// Artificial round-trip time of the call.
    pub fn delay(self) -> Duration {
        let millis = match self {
            SimulatedCall::UpdateProfile => 800,
            SimulatedCall::Login | SimulatedCall::ChangePassword | SimulatedCall::Checkout => 1_000,
            SimulatedCall::SocialLogin => 1_200,
            SimulatedCall::Signup | SimulatedCall::DeleteAccount => 1_500,
        };

        Duration::from_millis(millis)
    }
}

/// Storefront settings
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ShopConfig {
    /// ISO currency code prices are quoted in
    #[arg(long, env = "SHOP_CURRENCY", default_value = "KRW")]
    pub currency: String,

    /// Discounted total (minor units) at which shipping becomes free
    #[arg(long, env = "SHOP_FREE_SHIPPING_THRESHOLD", default_value_t = DEFAULT_FREE_SHIPPING_THRESHOLD)]
    pub free_shipping_threshold: i64,

    /// Flat shipping fee (minor units) below the threshold
    #[arg(long, env = "SHOP_SHIPPING_FEE", default_value_t = DEFAULT_SHIPPING_FEE)]
    pub shipping_fee: i64,

    /// Maximum quantity of a single cart line
    #[arg(long, env = "SHOP_MAX_CART_QUANTITY", default_value_t = DEFAULT_MAX_CART_QUANTITY)]
    pub max_cart_quantity: u32,

    /// Stock level at or below which a product is low on stock
    #[arg(long, env = "SHOP_LOW_STOCK_THRESHOLD", default_value_t = DEFAULT_LOW_STOCK_THRESHOLD)]
    pub low_stock_threshold: u32,

    /// Products shown per listing page
    #[arg(long, env = "SHOP_PRODUCTS_PER_PAGE", default_value_t = DEFAULT_PRODUCTS_PER_PAGE)]
    pub products_per_page: usize,

    /// Number of recent search terms remembered
    #[arg(long, env = "SHOP_RECENT_SEARCH_LIMIT", default_value_t = DEFAULT_RECENT_SEARCH_LIMIT)]
    pub recent_search_limit: usize,

    /// Prefix for every storage key
    #[arg(long, env = "SHOP_STORAGE_PREFIX", default_value = "kirby-shop")]
    pub storage_prefix: String,

    /// Notification lifetime in milliseconds
    #[arg(long, env = "SHOP_NOTIFICATION_TTL_MS", default_value_t = DEFAULT_NOTIFICATION_TTL_MS)]
    pub notification_ttl_ms: u64,

    /// Sleep through simulated server round trips
    #[arg(
        long,
        env = "SHOP_SIMULATE_LATENCY",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub simulate_latency: bool,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            currency: "KRW".to_string(),
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
            shipping_fee: DEFAULT_SHIPPING_FEE,
            max_cart_quantity: DEFAULT_MAX_CART_QUANTITY,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            products_per_page: DEFAULT_PRODUCTS_PER_PAGE,
            recent_search_limit: DEFAULT_RECENT_SEARCH_LIMIT,
            storage_prefix: "kirby-shop".to_string(),
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
            simulate_latency: true,
        }
    }
}

impl ShopConfig {
    /// Default settings with simulated latency switched off.
    pub fn instant() -> Self {
        Self {
            simulate_latency: false,
            ..Self::default()
        }
    }

    /// Check that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.currency()?;

        if self.free_shipping_threshold < 0 || self.shipping_fee < 0 {
            return Err(ConfigError::NegativeShipping);
        }

        if self.max_cart_quantity == 0 {
            return Err(ConfigError::ZeroMaxQuantity);
        }

        validate_key(&self.storage_prefix)
            .map_err(|_err| ConfigError::InvalidStoragePrefix(self.storage_prefix.clone()))?;

        Ok(())
    }

    /// Resolve the configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the code is not an ISO currency.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        iso::find(&self.currency).ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }

    /// Shipping policy in the configured currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is unknown.
    pub fn shipping_policy(&self) -> Result<ShippingPolicy, ConfigError> {
        let currency = self.currency()?;

        Ok(ShippingPolicy::new(
            Money::from_minor(self.free_shipping_threshold, currency),
            Money::from_minor(self.shipping_fee, currency),
        ))
    }

    /// Storage key names under the configured prefix.
    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::with_prefix(&self.storage_prefix)
    }

    /// Notification lifetime.
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    /// Block for the round-trip time of a simulated call, if latency is enabled.
    pub fn simulate(&self, call: SimulatedCall) {
        if !self.simulate_latency {
            return;
        }

        let delay = call.delay();

        trace!(?call, ?delay, "simulating server round trip");

        thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rusty_money::iso::KRW;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        shop: ShopConfig,
    }

    #[test]
    fn clap_defaults_match_default_impl() -> TestResult {
        let parsed = Harness::try_parse_from(["storefront"])?;

        assert_eq!(parsed.shop, ShopConfig::default());

        Ok(())
    }

    #[test]
    fn latency_can_be_switched_off() -> TestResult {
        let parsed = Harness::try_parse_from(["storefront", "--simulate-latency", "false"])?;

        assert!(!parsed.shop.simulate_latency);

        Ok(())
    }

    #[test]
    fn shipping_policy_uses_currency() -> TestResult {
        let policy = ShopConfig::default().shipping_policy()?;

        assert_eq!(policy.flat_fee, Money::from_minor(3_000, KRW));
        assert_eq!(policy.free_shipping_threshold, Money::from_minor(30_000, KRW));

        Ok(())
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let unknown = ShopConfig {
            currency: "XYZ".to_string(),
            ..ShopConfig::instant()
        };
        let zero_max = ShopConfig {
            max_cart_quantity: 0,
            ..ShopConfig::instant()
        };

        assert_eq!(
            unknown.validate(),
            Err(ConfigError::UnknownCurrency("XYZ".to_string()))
        );
        assert_eq!(zero_max.validate(), Err(ConfigError::ZeroMaxQuantity));
        assert_eq!(ShopConfig::instant().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_path_like_storage_prefix() {
        for prefix in ["", "..", "kirby/shop", "kirby\\shop"] {
            let config = ShopConfig {
                storage_prefix: prefix.to_string(),
                ..ShopConfig::instant()
            };

            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidStoragePrefix(prefix.to_string())),
                "prefix {prefix:?}"
            );
        }
    }

    #[test]
    fn call_delays_match_shop_timings() {
        assert_eq!(SimulatedCall::Login.delay(), Duration::from_millis(1_000));
        assert_eq!(SimulatedCall::Signup.delay(), Duration::from_millis(1_500));
        assert_eq!(SimulatedCall::UpdateProfile.delay(), Duration::from_millis(800));
    }
}
