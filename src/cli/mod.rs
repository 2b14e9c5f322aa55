use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use storefront::{
    catalog::Catalog,
    config::ShopConfig,
    storage::FileStore,
    storefront::{NotificationLevel, Storefront},
};

use crate::cli::logging::LoggingConfig;

mod account;
mod cart;
pub(crate) mod logging;
mod products;
mod search;
mod wishlist;

pub(crate) type Shop = Storefront<FileStore>;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Kirby character goods shop", long_about = None)]
pub(crate) struct Cli {
    /// Directory holding the cart, wishlist, session and search history
    #[arg(long, env = "SHOP_DATA_DIR", default_value = ".storefront")]
    data_dir: PathBuf,

    /// Catalog YAML file; the bundled catalog is used when omitted
    #[arg(long, env = "SHOP_CATALOG")]
    catalog: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    shop: ShopConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Browse the catalog
    Products(products::ProductsCommand),

    /// Search the catalog
    Search(search::SearchCommand),

    /// Manage the cart and place orders
    Cart(cart::CartCommand),

    /// Manage saved products
    Wishlist(wishlist::WishlistCommand),

    /// Sign in and manage the account
    Account(account::AccountCommand),
}

impl Cli {
    pub(crate) fn run(self) -> Result<(), String> {
        let catalog = match &self.catalog {
            Some(path) => Catalog::load(path),
            None => Catalog::bundled(),
        }
        .map_err(|error| format!("failed to load catalog: {error}"))?;

        let store = FileStore::open(&self.data_dir)
            .map_err(|error| format!("failed to open data directory: {error}"))?;

        let mut shop = Storefront::open(store, catalog, self.shop)
            .map_err(|error| format!("failed to open shop: {error}"))?;

        let result = match self.command {
            Commands::Products(command) => products::run(command, &mut shop),
            Commands::Search(command) => search::run(command, &mut shop),
            Commands::Cart(command) => cart::run(command, &mut shop),
            Commands::Wishlist(command) => wishlist::run(command, &mut shop),
            Commands::Account(command) => account::run(command, &mut shop),
        };

        write_notifications(&shop)?;

        result
    }
}

fn write_notifications(shop: &Shop) -> Result<(), String> {
    let mut out = io::stdout().lock();

    for notification in shop.notifications().iter() {
        let badge = match notification.level {
            NotificationLevel::Info => "\x1b[36minfo\x1b[0m",
            NotificationLevel::Success => "\x1b[32mdone\x1b[0m",
            NotificationLevel::Warning => "\x1b[33mwarn\x1b[0m",
            NotificationLevel::Error => "\x1b[31mfail\x1b[0m",
        };

        writeln!(out, "{badge}: {}", notification.message).map_err(output_error)?;
    }

    Ok(())
}

pub(crate) fn output_error(error: io::Error) -> String {
    format!("failed to write output: {error}")
}
