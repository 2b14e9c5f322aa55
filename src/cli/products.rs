use std::io::{self, Write};

use clap::{Args, Subcommand};
use rusty_money::Money;
use storefront::{
    catalog::ProductSort,
    products::{ALL_CATEGORY, ProductId},
    receipt,
};

use crate::cli::{Shop, output_error};

#[derive(Debug, Args)]
pub(crate) struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductsSubcommand {
    /// List products, one page at a time
    List(ListArgs),

    /// Show one product
    Show(ShowArgs),

    /// Catalog summary figures
    Stats,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Category id
    #[arg(long, default_value = ALL_CATEGORY)]
    category: String,

    /// Sort order
    #[arg(long, value_enum, default_value_t = ProductSort::Recommended)]
    sort: ProductSort,

    /// Page number
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Only products with one of these tags
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Lowest list price, in minor units
    #[arg(long)]
    min: Option<i64>,

    /// Highest list price, in minor units
    #[arg(long)]
    max: Option<i64>,

    /// Only products in stock
    #[arg(long)]
    in_stock: bool,

    /// Only new arrivals
    #[arg(long)]
    new: bool,

    /// Only discounted products
    #[arg(long)]
    sale: bool,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Product id
    id: u32,
}

pub(crate) fn run(command: ProductsCommand, shop: &mut Shop) -> Result<(), String> {
    match command.command {
        ProductsSubcommand::List(args) => list(args, shop),
        ProductsSubcommand::Show(args) => show(&args, shop),
        ProductsSubcommand::Stats => {
            receipt::write_catalog_stats(io::stdout().lock(), &shop.catalog().stats())
                .map_err(|error| format!("failed to write stats: {error}"))
        }
    }
}

fn list(args: ListArgs, shop: &mut Shop) -> Result<(), String> {
    shop.select_category(&args.category)
        .map_err(|error| error.to_string())?;

    let currency = shop.catalog().currency();

    let mut query = shop.query().clone();
    query.tags = args.tags;
    query.min_price = args.min.map(|amount| Money::from_minor(amount, currency));
    query.max_price = args.max.map(|amount| Money::from_minor(amount, currency));
    query.in_stock_only = args.in_stock;
    query.new_only = args.new;
    query.discounted_only = args.sale;
    query.sort = args.sort;

    shop.set_query(query);
    shop.set_page(args.page);

    let page = shop.visible_products();

    receipt::write_product_list(
        io::stdout().lock(),
        &page,
        shop.catalog(),
        shop.wishlist(),
        shop.config().low_stock_threshold,
    )
    .map_err(|error| format!("failed to write listing: {error}"))
}

fn show(args: &ShowArgs, shop: &mut Shop) -> Result<(), String> {
    let product = shop
        .view_product(ProductId(args.id))
        .map_err(|error| error.to_string())?
        .clone();

    receipt::write_product_detail(
        io::stdout().lock(),
        &product,
        shop.catalog(),
        shop.config().low_stock_threshold,
    )
    .map_err(|error| format!("failed to write product: {error}"))?;

    if shop.wishlist().contains(product.id) {
        writeln!(io::stdout().lock(), " ♥ saved to your wishlist\n").map_err(output_error)?;
    }

    Ok(())
}
