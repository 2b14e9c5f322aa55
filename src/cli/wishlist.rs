use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Args, Subcommand};
use storefront::{
    products::ProductId,
    receipt,
    wishlist::{Toggle, WishlistExport, WishlistFilter, WishlistSort},
};

use crate::cli::{Shop, output_error};

#[derive(Debug, Args)]
pub(crate) struct WishlistCommand {
    #[command(subcommand)]
    command: WishlistSubcommand,
}

#[derive(Debug, Subcommand)]
enum WishlistSubcommand {
    /// Show saved products
    Show(ShowArgs),

    /// Save a product, or unsave it if already saved
    Toggle {
        /// Product id
        id: u32,
    },

    /// Remove every saved product
    Clear,

    /// Write the wishlist as JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add the products of an exported wishlist
    Import {
        /// Exported wishlist file
        file: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Reorder the wishlist; the new order is kept
    #[arg(long, value_enum)]
    sort: Option<WishlistSort>,

    /// Only products in this category
    #[arg(long)]
    category: Option<String>,

    /// Only products in stock
    #[arg(long)]
    in_stock: bool,

    /// Only discounted products
    #[arg(long)]
    sale: bool,

    /// Only products matching this text
    #[arg(long)]
    search: Option<String>,
}

pub(crate) fn run(command: WishlistCommand, shop: &mut Shop) -> Result<(), String> {
    match command.command {
        WishlistSubcommand::Show(args) => show(args, shop),
        WishlistSubcommand::Toggle { id } => {
            let toggle = shop
                .toggle_wishlist(ProductId(id))
                .map_err(|error| error.to_string())?;

            let state = match toggle {
                Toggle::Added => "saved",
                Toggle::Removed => "removed",
            };

            writeln!(io::stdout().lock(), "product {id} {state}").map_err(output_error)
        }
        WishlistSubcommand::Clear => shop
            .clear_wishlist()
            .map_err(|error| format!("failed to clear wishlist: {error}")),
        WishlistSubcommand::Export { output } => export(output, shop),
        WishlistSubcommand::Import { file } => import(&file, shop),
    }
}

fn show(args: ShowArgs, shop: &mut Shop) -> Result<(), String> {
    if let Some(order) = args.sort {
        shop.sort_wishlist(order)
            .map_err(|error| format!("failed to sort wishlist: {error}"))?;
    }

    let low_stock_threshold = shop.config().low_stock_threshold;
    let wishlist = shop.wishlist();

    let filter = WishlistFilter {
        category: args.category,
        in_stock_only: args.in_stock,
        discounted_only: args.sale,
        ..WishlistFilter::default()
    };

    let mut entries = wishlist.filter(&filter);

    if let Some(text) = args.search.as_deref() {
        let matching: Vec<_> = wishlist
            .search(text)
            .into_iter()
            .map(|entry| entry.wishlist_id)
            .collect();

        entries.retain(|entry| matching.contains(&entry.wishlist_id));
    }

    let stats = wishlist
        .stats(shop.catalog().currency(), low_stock_threshold)
        .map_err(|error| format!("failed to total the wishlist: {error}"))?;

    receipt::write_wishlist(io::stdout().lock(), &entries, &stats, low_stock_threshold)
        .map_err(|error| format!("failed to write wishlist: {error}"))
}

fn export(output: Option<PathBuf>, shop: &Shop) -> Result<(), String> {
    let json = shop
        .export_wishlist()
        .and_then(|export| Ok(export.to_json()?))
        .map_err(|error| format!("failed to export wishlist: {error}"))?;

    match output {
        Some(path) => fs::write(&path, json)
            .map_err(|error| format!("failed to write {}: {error}", path.display())),
        None => writeln!(io::stdout().lock(), "{json}").map_err(output_error),
    }
}

fn import(file: &Path, shop: &mut Shop) -> Result<(), String> {
    let raw = fs::read_to_string(file)
        .map_err(|error| format!("failed to read {}: {error}", file.display()))?;

    let export = WishlistExport::from_json(&raw)
        .map_err(|error| format!("invalid wishlist export: {error}"))?;

    let added = shop
        .import_wishlist(&export)
        .map_err(|error| format!("failed to import wishlist: {error}"))?;

    writeln!(
        io::stdout().lock(),
        "{added} of {} product(s) imported",
        export.items.len()
    )
    .map_err(output_error)
}
