use std::io::{self, Write};

use clap::{Args, Subcommand};
use storefront::{
    cart::LineUpdate,
    products::ProductId,
    receipt::{self, short_line_id},
    storefront::Order,
};
use uuid::Uuid;

use crate::cli::{Shop, output_error};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart and its totals
    Show,

    /// Add a product
    Add(AddArgs),

    /// Set a line's quantity; zero removes the line
    Set {
        /// Line id, full or the short form shown by `cart show`
        line: String,

        /// New quantity
        quantity: u32,
    },

    /// Remove a line
    Remove {
        /// Line id, full or the short form shown by `cart show`
        line: String,
    },

    /// Empty the cart
    Clear,

    /// Order everything in the cart
    Checkout,

    /// Order one product without touching the cart
    BuyNow {
        /// Product id
        id: u32,

        /// Units to order
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id
    id: u32,

    /// Units to add
    #[arg(short, long, default_value_t = 1)]
    quantity: u32,

    /// Product option, e.g. a size
    #[arg(short, long, default_value = "")]
    option: String,
}

pub(crate) fn run(command: CartCommand, shop: &mut Shop) -> Result<(), String> {
    match command.command {
        CartSubcommand::Show => show(shop),
        CartSubcommand::Add(args) => {
            shop.add_to_cart(ProductId(args.id), args.quantity, &args.option)
                .map_err(|error| error.to_string())?;

            show(shop)
        }
        CartSubcommand::Set { line, quantity } => {
            let line_id = resolve_line(shop, &line)?;

            let update = shop
                .update_cart_quantity(line_id, quantity)
                .map_err(|error| error.to_string())?;

            if let LineUpdate::Quantity {
                quantity,
                clamped: true,
            } = update
            {
                writeln!(io::stdout().lock(), "quantity limited to {quantity}")
                    .map_err(output_error)?;
            }

            show(shop)
        }
        CartSubcommand::Remove { line } => {
            let line_id = resolve_line(shop, &line)?;

            shop.remove_cart_line(line_id)
                .map_err(|error| error.to_string())?;

            show(shop)
        }
        CartSubcommand::Clear => shop.clear_cart().map_err(|error| error.to_string()),
        CartSubcommand::Checkout => {
            let order = shop.checkout().map_err(|error| error.to_string())?;

            write_order(&order)
        }
        CartSubcommand::BuyNow { id, quantity } => {
            let order = shop
                .buy_now(ProductId(id), quantity)
                .map_err(|error| error.to_string())?;

            write_order(&order)
        }
    }
}

fn show(shop: &Shop) -> Result<(), String> {
    let summary = shop
        .cart_summary()
        .map_err(|error| format!("failed to total the cart: {error}"))?;

    receipt::write_cart(io::stdout().lock(), shop.cart(), &summary)
        .map_err(|error| format!("failed to write cart: {error}"))?;

    let validation = shop.cart().validate();

    if !validation.is_valid() {
        let mut out = io::stdout().lock();

        for issue in &validation.issues {
            writeln!(out, " ! {issue}").map_err(output_error)?;
        }
    }

    Ok(())
}

fn write_order(order: &Order) -> Result<(), String> {
    receipt::write_order(io::stdout().lock(), order)
        .map_err(|error| format!("failed to write order: {error}"))
}

fn resolve_line(shop: &Shop, reference: &str) -> Result<Uuid, String> {
    if let Ok(line_id) = reference.parse::<Uuid>() {
        return Ok(line_id);
    }

    let reference = reference.to_ascii_lowercase();

    let matches: Vec<Uuid> = shop
        .cart()
        .lines()
        .iter()
        .map(|line| line.line_id)
        .filter(|line_id| short_line_id(*line_id) == reference)
        .collect();

    match matches.as_slice() {
        [line_id] => Ok(*line_id),
        [] => Err(format!("no cart line {reference}")),
        _ => Err(format!("{reference} matches more than one cart line; use the full id")),
    }
}
