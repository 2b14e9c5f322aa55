//! Storefront
//!
//! The page controller. It owns the catalog, the browsing state and the cart, wishlist, session
//! and search history, and writes each of those back to the store as soon as it changes.

use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    auth::{Auth, AuthError, LoginForm, ProfileUpdate, SignupForm, SocialProvider, UserSession},
    cart::{AddOutcome, Cart, CartError, CartLine, CartSummary, CartValidation, LineUpdate},
    catalog::{Catalog, CatalogError, Page, ProductQuery, ProductSort},
    clock::{Clock, SystemClock},
    config::{ConfigError, ShopConfig, SimulatedCall},
    pricing::{PriceError, ShippingPolicy, format_price},
    products::{ALL_CATEGORY, Product, ProductId},
    search::{RecentSearches, suggestions},
    storage::{
        KeyValueStore, StorageError, StorageKeys, read_json, read_json_opt, write_json,
    },
    wishlist::{Toggle, Wishlist, WishlistEntry, WishlistError, WishlistExport, WishlistSort},
};

mod checkout;
mod notifications;

pub use checkout::Order;
pub use notifications::{Notification, NotificationLevel, Notifications};

/// Storefront errors
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Invalid settings
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Catalog could not be loaded
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Cart operation failed
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Wishlist operation failed
    #[error(transparent)]
    Wishlist(#[from] WishlistError),

    /// Session operation failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Price arithmetic failed
    #[error(transparent)]
    Price(#[from] PriceError),

    /// No product has the given id
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// No category has the given id
    #[error("category {0:?} not found")]
    UnknownCategory(String),

    /// The operation needs a signed-in user
    #[error("please sign in first")]
    LoginRequired,

    /// Checkout of an empty cart
    #[error("the cart is empty")]
    EmptyCart,

    /// Checkout of a cart with stock or quantity problems
    #[error("the cart has {} problem(s)", .0.issues.len())]
    InvalidCart(CartValidation),

    /// The catalog is priced in a different currency from the shop settings
    #[error("catalog is priced in {catalog}, shop is configured for {configured}")]
    CurrencyMismatch {
        /// Catalog currency code
        catalog: &'static str,

        /// Configured currency code
        configured: &'static str,
    },
}

/// Storefront controller over a key-value store and a clock.
#[derive(Debug)]
pub struct Storefront<S, C = SystemClock> {
    store: S,
    clock: C,
    catalog: Catalog,
    config: ShopConfig,
    keys: StorageKeys,
    shipping: ShippingPolicy,
    cart: Cart,
    wishlist: Wishlist,
    auth: Auth,
    recent_searches: RecentSearches,
    query: ProductQuery,
    page: usize,
    notifications: Notifications,
    login_prompt: bool,
}

impl<S: KeyValueStore> Storefront<S> {
    /// Open a storefront on the wall clock.
    ///
    /// # Errors
    ///
    /// See [`Storefront::open_with_clock`].
    pub fn open(store: S, catalog: Catalog, config: ShopConfig) -> Result<Self, StorefrontError> {
        Self::open_with_clock(store, catalog, config, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> Storefront<S, C> {
    /// Open a storefront, restoring the cart, wishlist, search history and session from the
    /// store. Unreadable entries are discarded and start out empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid, the catalog currency differs from the
    /// configured one, or the store cannot be accessed.
    pub fn open_with_clock(
        mut store: S,
        catalog: Catalog,
        config: ShopConfig,
        clock: C,
    ) -> Result<Self, StorefrontError> {
        config.validate()?;

        let currency: &'static Currency = config.currency()?;

        if catalog.currency() != currency {
            return Err(StorefrontError::CurrencyMismatch {
                catalog: catalog.currency().iso_alpha_code,
                configured: currency.iso_alpha_code,
            });
        }

        let keys = config.storage_keys();

        let lines: Vec<CartLine> = read_json(&mut store, &keys.cart)?;
        let cart = Cart::restore(currency, config.max_cart_quantity, lines);

        let entries: Vec<WishlistEntry> = read_json(&mut store, &keys.wishlist)?;
        let wishlist = Wishlist::restore(entries);

        let terms: Vec<String> = read_json(&mut store, &keys.recent_searches)?;
        let recent_searches = RecentSearches::restore(terms, config.recent_search_limit);

        let user: Option<UserSession> = read_json_opt(&mut store, &keys.user)?;
        let token: Option<String> = read_json_opt(&mut store, &keys.token)?;
        let had_session = user.is_some() || token.is_some();
        let auth = Auth::restore(user, token);

        if had_session && !auth.is_authenticated() {
            for key in keys.session() {
                store.remove(key)?;
            }
        }

        debug!(
            cart_lines = cart.len(),
            wishlist = wishlist.len(),
            signed_in = auth.is_authenticated(),
            "storefront opened"
        );

        Ok(Self {
            store,
            clock,
            shipping: config.shipping_policy()?,
            notifications: Notifications::new(config.notification_ttl()),
            catalog,
            config,
            keys,
            cart,
            wishlist,
            auth,
            recent_searches,
            query: ProductQuery::default(),
            page: 1,
            login_prompt: false,
        })
    }

    /// The product catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shop settings.
    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    /// The clock timestamps come from.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The wishlist.
    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    /// The session.
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Recent search terms.
    pub fn recent_searches(&self) -> &RecentSearches {
        &self.recent_searches
    }

    /// Pending notifications.
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Whether an action asked the user to sign in.
    pub fn login_prompt(&self) -> bool {
        self.login_prompt
    }

    /// Close the sign-in prompt.
    pub fn dismiss_login_prompt(&mut self) {
        self.login_prompt = false;
    }

    fn product(&self, id: ProductId) -> Result<&Product, StorefrontError> {
        self.catalog
            .product(id)
            .ok_or(StorefrontError::ProductNotFound(id))
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let now = self.clock.now();

        self.notifications.push(level, message, now);
    }

    /// Drop notifications older than their lifetime.
    pub fn expire_notifications(&mut self) -> usize {
        let now = self.clock.now();

        self.notifications.expire(now)
    }

    /// Dismiss one notification.
    pub fn dismiss_notification(&mut self, id: Uuid) -> bool {
        self.notifications.dismiss(id)
    }

    fn save_cart(&mut self) -> Result<(), StorageError> {
        write_json(&mut self.store, &self.keys.cart, self.cart.lines())
    }

    fn save_wishlist(&mut self) -> Result<(), StorageError> {
        write_json(&mut self.store, &self.keys.wishlist, self.wishlist.entries())
    }

    fn save_recent_searches(&mut self) -> Result<(), StorageError> {
        write_json(
            &mut self.store,
            &self.keys.recent_searches,
            self.recent_searches.terms(),
        )
    }

    fn save_session(&mut self) -> Result<(), StorageError> {
        match (self.auth.user(), self.auth.token()) {
            (Some(user), Some(token)) => {
                write_json(&mut self.store, &self.keys.user, user)?;
                write_json(&mut self.store, &self.keys.token, token)
            }
            _ => {
                for key in self.keys.session() {
                    self.store.remove(key)?;
                }

                Ok(())
            }
        }
    }

    fn require_session(&mut self, action: &str) -> Result<(), StorefrontError> {
        if self.auth.is_authenticated() {
            return Ok(());
        }

        self.login_prompt = true;
        self.notify(
            NotificationLevel::Warning,
            format!("Please sign in to {action}."),
        );

        Err(StorefrontError::LoginRequired)
    }

    // Browsing

    /// Selected category id, `all` when unfiltered.
    pub fn selected_category(&self) -> &str {
        self.query
            .categories
            .first()
            .map_or(ALL_CATEGORY, String::as_str)
    }

    /// Active search text.
    pub fn search_query(&self) -> &str {
        &self.query.text
    }

    /// Active listing query.
    pub fn query(&self) -> &ProductQuery {
        &self.query
    }

    /// Current listing page.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Show one category. Clears the search and returns to the first page.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::UnknownCategory`] for an unknown category id.
    pub fn select_category(&mut self, category: &str) -> Result<(), StorefrontError> {
        if category == ALL_CATEGORY {
            self.query.categories.clear();
        } else if self.catalog.category(category).is_some() {
            self.query.categories = vec![category.to_string()];
        } else {
            return Err(StorefrontError::UnknownCategory(category.to_string()));
        }

        self.query.text.clear();
        self.page = 1;

        debug!(category, "category selected");

        Ok(())
    }

    /// Search the catalog. The term is remembered, the category resets to `all` and the listing
    /// returns to the first page.
    ///
    /// # Errors
    ///
    /// Returns an error if the search history cannot be stored.
    pub fn submit_search(&mut self, query: &str) -> Result<(), StorefrontError> {
        if self.recent_searches.record(query) {
            self.save_recent_searches()?;
        }

        self.query.text = query.trim().to_string();
        self.query.categories.clear();
        self.page = 1;

        debug!(query = %self.query.text, "search submitted");

        Ok(())
    }

    /// Replace the listing query and return to the first page.
    pub fn set_query(&mut self, query: ProductQuery) {
        self.query = query;
        self.page = 1;
    }

    /// Change the listing sort order and return to the first page.
    pub fn set_sort(&mut self, sort: ProductSort) {
        self.query.sort = sort;
        self.page = 1;
    }

    /// Jump to a listing page. Out-of-range pages are clamped when the listing is built.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// The current page of the listing.
    pub fn visible_products(&self) -> Page<&Product> {
        Page::of(
            self.catalog.query(&self.query),
            self.page,
            self.config.products_per_page,
        )
    }

    /// Popular searches matching a partial query.
    pub fn suggestions(&self, query: &str) -> Vec<&str> {
        suggestions(query, self.catalog.popular_searches())
    }

    /// Forget one recent search term.
    ///
    /// # Errors
    ///
    /// Returns an error if the search history cannot be stored.
    pub fn remove_recent_search(&mut self, term: &str) -> Result<bool, StorefrontError> {
        let removed = self.recent_searches.remove(term);

        if removed {
            self.save_recent_searches()?;
        }

        Ok(removed)
    }

    /// Forget every recent search term.
    ///
    /// # Errors
    ///
    /// Returns an error if the search history cannot be stored.
    pub fn clear_recent_searches(&mut self) -> Result<(), StorefrontError> {
        self.recent_searches.clear();
        self.save_recent_searches()?;

        Ok(())
    }

    /// Look at a product. Signed-in views are recorded as activity.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::ProductNotFound`] for an unknown id.
    pub fn view_product(&mut self, id: ProductId) -> Result<&Product, StorefrontError> {
        self.product(id)?;

        if self.auth.is_authenticated() {
            let now = self.clock.now();
            self.auth.track_activity("view_product", &id.to_string(), now)?;
            self.save_session()?;
        }

        self.product(id)
    }

    // Wishlist

    /// Save or unsave a product.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown product or if the wishlist cannot be stored.
    pub fn toggle_wishlist(&mut self, id: ProductId) -> Result<Toggle, StorefrontError> {
        let now = self.clock.now();
        let product = self
            .catalog
            .product(id)
            .ok_or(StorefrontError::ProductNotFound(id))?;

        let toggle = self.wishlist.toggle(product, now);
        let title = product.title.clone();

        self.save_wishlist()?;

        match toggle {
            Toggle::Added => self.notify(
                NotificationLevel::Success,
                format!("{title} was added to your wishlist."),
            ),
            Toggle::Removed => self.notify(
                NotificationLevel::Info,
                format!("{title} was removed from your wishlist."),
            ),
        }

        Ok(toggle)
    }

    /// Reorder the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the wishlist cannot be stored.
    pub fn sort_wishlist(&mut self, order: WishlistSort) -> Result<(), StorefrontError> {
        self.wishlist.sort(order);
        self.save_wishlist()?;

        Ok(())
    }

    /// Empty the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the wishlist cannot be stored.
    pub fn clear_wishlist(&mut self) -> Result<(), StorefrontError> {
        self.wishlist.clear();
        self.save_wishlist()?;

        Ok(())
    }

    /// Snapshot the wishlist for sharing.
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics cannot be computed.
    pub fn export_wishlist(&self) -> Result<WishlistExport, StorefrontError> {
        Ok(self.wishlist.export(
            self.catalog.currency(),
            self.config.low_stock_threshold,
            self.clock.now(),
        )?)
    }

    /// Add the products of a shared wishlist. Returns the number added.
    ///
    /// # Errors
    ///
    /// Returns an error if the wishlist cannot be stored.
    pub fn import_wishlist(&mut self, export: &WishlistExport) -> Result<usize, StorefrontError> {
        let now = self.clock.now();
        let added = self.wishlist.import(export, &self.catalog, now);

        if added > 0 {
            self.save_wishlist()?;
        }

        self.notify(
            NotificationLevel::Success,
            format!("{added} product(s) imported into your wishlist."),
        );

        Ok(added)
    }

    // Cart

    /// Totals for the current cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if a total overflows.
    pub fn cart_summary(&self) -> Result<CartSummary, PriceError> {
        self.cart.summary(&self.shipping)
    }

    /// Add a product to the cart. Needs a session; without one the sign-in prompt is raised.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::LoginRequired`] without a session, or the cart error.
    pub fn add_to_cart(
        &mut self,
        id: ProductId,
        quantity: u32,
        option: &str,
    ) -> Result<AddOutcome, StorefrontError> {
        self.require_session("add items to your cart")?;

        let now = self.clock.now();
        let product = self
            .catalog
            .product(id)
            .ok_or(StorefrontError::ProductNotFound(id))?;

        let outcome = self.cart.add(product, quantity, option, now)?;
        let title = product.title.clone();

        self.save_cart()?;

        if outcome.clamped {
            self.notify(
                NotificationLevel::Warning,
                format!("Only {} of {title} can be in the cart.", outcome.quantity),
            );
        } else {
            self.notify(
                NotificationLevel::Success,
                format!("{title} was added to your cart."),
            );
        }

        Ok(outcome)
    }

    /// Order one product straight away, leaving the cart untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::LoginRequired`] without a session, or an error if the product
    /// cannot be ordered.
    pub fn buy_now(&mut self, id: ProductId, quantity: u32) -> Result<Order, StorefrontError> {
        self.require_session("buy this product")?;

        let now = self.clock.now();
        let product = self.product(id)?;

        let mut single = Cart::new(self.cart.currency(), self.cart.max_quantity());
        single.add(product, quantity, "", now)?;

        self.place_order(&single)
    }

    /// Change a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::LoginRequired`] without a session, or the cart error.
    pub fn update_cart_quantity(
        &mut self,
        line_id: Uuid,
        quantity: u32,
    ) -> Result<LineUpdate, StorefrontError> {
        self.require_session("change your cart")?;

        let update = self.cart.set_quantity(line_id, quantity)?;
        self.save_cart()?;

        Ok(update)
    }

    /// Remove one unit from a line; the last unit removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::LoginRequired`] without a session, or the cart error.
    pub fn decrement_cart_line(&mut self, line_id: Uuid) -> Result<LineUpdate, StorefrontError> {
        self.require_session("change your cart")?;

        let update = self.cart.decrement(line_id)?;
        self.save_cart()?;

        Ok(update)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::LoginRequired`] without a session, or the cart error.
    pub fn remove_cart_line(&mut self, line_id: Uuid) -> Result<CartLine, StorefrontError> {
        self.require_session("change your cart")?;

        let line = self.cart.remove(line_id)?;
        self.save_cart()?;

        self.notify(
            NotificationLevel::Info,
            format!("{} was removed from your cart.", line.product.title),
        );

        Ok(line)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::LoginRequired`] without a session, or a storage error.
    pub fn clear_cart(&mut self) -> Result<(), StorefrontError> {
        self.require_session("change your cart")?;

        self.cart.clear();
        self.save_cart()?;

        Ok(())
    }

    /// Place an order for the whole cart, credit the points earned and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::LoginRequired`] without a session,
    /// [`StorefrontError::EmptyCart`] or [`StorefrontError::InvalidCart`] if the cart cannot be
    /// ordered, or a pricing or storage error.
    pub fn checkout(&mut self) -> Result<Order, StorefrontError> {
        self.require_session("place an order")?;

        let cart = self.cart.clone();
        let order = self.place_order(&cart)?;

        self.cart.clear();
        self.save_cart()?;

        Ok(order)
    }

    fn place_order(&mut self, cart: &Cart) -> Result<Order, StorefrontError> {
        if cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }

        let validation = cart.validate();

        if !validation.is_valid() {
            return Err(StorefrontError::InvalidCart(validation));
        }

        let grade = self
            .auth
            .user()
            .map(|user| user.grade)
            .ok_or(StorefrontError::LoginRequired)?;

        self.config.simulate(SimulatedCall::Checkout);

        let now = self.clock.now();
        let order = Order::new(cart.export_for_order(&self.shipping, now)?, grade)?;

        if order.points_earned > 0 {
            self.auth
                .add_points(order.points_earned, &format!("Order {}", order.order_id), now)?;
        }
        self.auth
            .track_activity("checkout", &order.order_id.to_string(), now)?;
        self.save_session()?;

        info!(
            order = %order.order_id,
            lines = order.cart.items.len(),
            amount_due = %format_price(&order.amount_due),
            points = order.points_earned,
            "order placed"
        );

        self.notify(
            NotificationLevel::Success,
            format!(
                "Order placed: {} paid, {} points earned.",
                format_price(&order.amount_due),
                order.points_earned
            ),
        );

        Ok(order)
    }

    // Session

    fn signed_in(&mut self) -> Result<&UserSession, StorefrontError> {
        self.login_prompt = false;
        self.save_session()?;

        let name = self
            .auth
            .user()
            .map(|user| user.name.clone())
            .unwrap_or_default();
        self.notify(NotificationLevel::Success, format!("Welcome, {name}!"));

        Ok(self.auth.user().ok_or(AuthError::NotAuthenticated)?)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid or the session cannot be stored.
    pub fn login(&mut self, form: &LoginForm) -> Result<&UserSession, StorefrontError> {
        self.config.simulate(SimulatedCall::Login);

        let now = self.clock.now();
        self.auth.login(form, now)?;

        self.signed_in()
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid or the session cannot be stored.
    pub fn signup(&mut self, form: &SignupForm) -> Result<&UserSession, StorefrontError> {
        self.config.simulate(SimulatedCall::Signup);

        let now = self.clock.now();
        self.auth.signup(form, now)?;

        self.signed_in()
    }

    /// Sign in through a social provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be stored.
    pub fn social_login(
        &mut self,
        provider: SocialProvider,
    ) -> Result<&UserSession, StorefrontError> {
        self.config.simulate(SimulatedCall::SocialLogin);

        let now = self.clock.now();
        self.auth.social_login(provider, now);

        self.signed_in()
    }

    /// Sign out. The cart and wishlist stay on the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be removed from the store.
    pub fn logout(&mut self) -> Result<Option<UserSession>, StorefrontError> {
        let user = self.auth.logout();
        self.save_session()?;

        if user.is_some() {
            self.notify(NotificationLevel::Info, "You have been signed out.");
        }

        Ok(user)
    }

    /// Change profile fields.
    ///
    /// # Errors
    ///
    /// Returns an error without a session, for invalid fields, or if the session cannot be
    /// stored.
    pub fn update_profile(
        &mut self,
        update: ProfileUpdate,
    ) -> Result<&UserSession, StorefrontError> {
        self.config.simulate(SimulatedCall::UpdateProfile);

        let now = self.clock.now();
        self.auth.update_profile(update, now)?;
        self.save_session()?;

        Ok(self.auth.user().ok_or(AuthError::NotAuthenticated)?)
    }

    /// Change the password.
    ///
    /// # Errors
    ///
    /// Returns an error without a session or if either password is rejected.
    pub fn change_password(&mut self, current: &str, new: &str) -> Result<(), StorefrontError> {
        self.config.simulate(SimulatedCall::ChangePassword);

        self.auth.change_password(current, new)?;
        self.notify(NotificationLevel::Success, "Your password has been changed.");

        Ok(())
    }

    /// Replace the session token.
    ///
    /// # Errors
    ///
    /// Returns an error without a session or if the session cannot be stored.
    pub fn refresh_token(&mut self) -> Result<(), StorefrontError> {
        let now = self.clock.now();
        self.auth.refresh_token(now)?;
        self.save_session()?;

        Ok(())
    }

    /// Delete the account, sign out and wipe the cart and wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error without a session or if the store cannot be written.
    pub fn delete_account(&mut self) -> Result<UserSession, StorefrontError> {
        self.config.simulate(SimulatedCall::DeleteAccount);

        let user = self.auth.delete_account()?;

        self.cart.clear();
        self.wishlist.clear();

        self.save_session()?;
        self.save_cart()?;
        self.save_wishlist()?;

        self.notify(NotificationLevel::Info, "Your account has been deleted.");

        Ok(user)
    }

    /// Credit points to the signed-in user. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns an error without a session or if the session cannot be stored.
    pub fn add_points(&mut self, amount: u64, reason: &str) -> Result<u64, StorefrontError> {
        let now = self.clock.now();
        let balance = self.auth.add_points(amount, reason, now)?;
        self.save_session()?;

        Ok(balance)
    }

    /// Spend points of the signed-in user. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns an error without a session, on an insufficient balance, or if the session cannot
    /// be stored.
    pub fn use_points(&mut self, amount: u64, reason: &str) -> Result<u64, StorefrontError> {
        let now = self.clock.now();
        let balance = self.auth.use_points(amount, reason, now)?;
        self.save_session()?;

        Ok(balance)
    }
}
