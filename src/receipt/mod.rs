//! Receipts
//!
//! Terminal tables for listings, the cart, the wishlist and placed orders.

use std::{fmt::Write, io, ops::Range};

use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    cart::{Cart, CartSummary},
    catalog::{Catalog, CatalogStats, Page},
    pricing::{PriceError, discount_amount, extend_price, format_price},
    products::Product,
    storefront::Order,
    wishlist::{Wishlist, WishlistEntry, WishlistStats},
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// A displayed amount could not be computed
    #[error(transparent)]
    Price(#[from] PriceError),

    /// IO error
    #[error("IO error")]
    IO,
}

type ColorOps = SmallVec<[(usize, usize, Color); 32]>;

/// Short form of a cart line id: the last eight hex digits, which are random in a v7 id.
pub fn short_line_id(id: Uuid) -> String {
    format!("{:08x}", id.as_u128() & 0xffff_ffff)
}

fn flags(product: &Product) -> String {
    let mut flags: SmallVec<[&str; 3]> = SmallVec::new();

    if product.is_new {
        flags.push("NEW");
    }
    if product.is_best_seller {
        flags.push("BEST");
    }
    if product.is_limited {
        flags.push("LIMITED");
    }

    flags.join(" ")
}

fn stock_cell(product: &Product, low_stock_threshold: u32) -> (String, Option<Color>) {
    match product.stock {
        0 => ("Sold out".to_string(), Some(Color::FG_RED)),
        stock if stock <= low_stock_threshold => (format!("{stock} left"), Some(Color::FG_YELLOW)),
        stock => (stock.to_string(), None),
    }
}

/// Write one page of a product listing. Saved products are marked with a heart.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if a sale price cannot be computed or the output cannot be written.
pub fn write_product_list(
    mut out: impl io::Write,
    page: &Page<&Product>,
    catalog: &Catalog,
    wishlist: &Wishlist,
    low_stock_threshold: u32,
) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();
    let mut color_ops = ColorOps::new();

    builder.push_record([
        "", "ID", "Product", "Category", "Price", "Sale Price", "Stock", "Rating", "",
    ]);

    for (idx, product) in page.items.iter().enumerate() {
        let row = idx + 1;
        let saved = if wishlist.contains(product.id) { "♥" } else { "" };
        let (stock, stock_color) = stock_cell(product, low_stock_threshold);

        let sale_price = if product.is_discounted() {
            color_ops.push((row, 5, Color::FG_GREEN));

            format!(
                "({}%) {}",
                product.discount,
                format_price(&product.unit_price()?)
            )
        } else {
            String::new()
        };

        if let Some(color) = stock_color {
            color_ops.push((row, 6, color));
        }

        color_ops.push((row, 3, color_dark_grey()));
        color_ops.push((row, 0, Color::FG_MAGENTA));

        builder.push_record([
            saved.to_string(),
            product.id.to_string(),
            product.title.clone(),
            catalog.category_name(&product.category).to_string(),
            format_price(&product.price),
            sale_price,
            stock,
            format!("{} ({})", product.rating, product.review_count),
            flags(product),
        ]);
    }

    let table = render_table(builder, 4..8, color_ops);

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;
    writeln!(
        out,
        " Page {} of {} ({} products)\n",
        page.page,
        page.total_pages.max(1),
        page.total_items
    )
    .map_err(|_err| ReceiptError::IO)
}

/// Write the full details of one product.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if a sale price cannot be computed or the output cannot be written.
pub fn write_product_detail(
    mut out: impl io::Write,
    product: &Product,
    catalog: &Catalog,
    low_stock_threshold: u32,
) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();
    let mut color_ops = ColorOps::new();

    builder.push_record([format!("#{}", product.id), product.title.clone()]);

    let (stock, stock_color) = stock_cell(product, low_stock_threshold);

    let mut rows: Vec<(&str, String)> = vec![
        ("Description", product.description.clone()),
        ("Category", catalog.category_name(&product.category).to_string()),
        ("Price", format_price(&product.price)),
    ];

    if product.is_discounted() {
        rows.push((
            "Sale Price",
            format!(
                "({}%) {}",
                product.discount,
                format_price(&product.unit_price()?)
            ),
        ));
    }

    if let Some(compare_at) = &product.compare_at_price {
        rows.push(("Was", format_price(compare_at)));
    }

    rows.push(("Stock", stock));
    rows.push((
        "Rating",
        format!("{} ({} reviews)", product.rating, product.review_count),
    ));
    rows.push(("Tags", product.tags.join(", ")));

    let badges = flags(product);
    if !badges.is_empty() {
        rows.push(("Badges", badges));
    }

    for (key, value) in &product.specs {
        rows.push((key.as_str(), value.clone()));
    }

    for (idx, (label, value)) in rows.into_iter().enumerate() {
        let row = idx + 1;

        color_ops.push((row, 0, color_dark_grey()));

        match label {
            "Sale Price" => color_ops.push((row, 1, Color::FG_GREEN)),
            "Stock" => {
                if let Some(color) = stock_color.clone() {
                    color_ops.push((row, 1, color));
                }
            }
            _ => {}
        }

        builder.push_record([label.to_string(), value]);
    }

    let table = render_table(builder, 0..0, color_ops);

    writeln!(out, "\n{table}\n").map_err(|_err| ReceiptError::IO)
}

/// Write catalog summary figures.
///
/// # Errors
///
/// Returns [`ReceiptError::IO`] if the output cannot be written.
pub fn write_catalog_stats(mut out: impl io::Write, stats: &CatalogStats) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["Category", "Products"]);

    for category in &stats.categories {
        builder.push_record([category.name.clone(), category.count.to_string()]);
    }

    let table = render_table(builder, 1..2, ColorOps::new());

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;

    let lines = [
        (" Average price:", format_price(&stats.average_price)),
        (" Average rating:", stats.average_rating.to_string()),
        (" Best sellers:", stats.best_sellers.to_string()),
        (" New arrivals:", stats.new_products.to_string()),
        (" Limited editions:", stats.limited_products.to_string()),
    ];

    write_summary(&mut out, &lines)
}

/// Write the cart and its totals.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if a line total cannot be computed or the output cannot be written.
pub fn write_cart(
    mut out: impl io::Write,
    cart: &Cart,
    summary: &CartSummary,
) -> Result<(), ReceiptError> {
    if cart.is_empty() {
        return writeln!(out, "\n Your cart is empty.\n").map_err(|_err| ReceiptError::IO);
    }

    let mut builder = Builder::default();
    let mut color_ops = ColorOps::new();

    builder.push_record([
        "Line", "Product", "Option", "Qty", "Unit Price", "Line Total", "Savings",
    ]);

    for (idx, line) in cart.lines().iter().enumerate() {
        let row = idx + 1;
        let original = line.original_total()?;
        let total = line.line_total()?;

        let savings = if total == original {
            String::new()
        } else {
            color_ops.push((row, 5, Color::FG_GREEN));

            format!("-{}", format_price(&original.sub(total).map_err(PriceError::from)?))
        };

        color_ops.push((row, 0, color_dark_grey()));

        builder.push_record([
            short_line_id(line.line_id),
            line.product.title.clone(),
            line.option.clone(),
            line.quantity.to_string(),
            format_price(&line.unit_price()?),
            format_price(&total),
            savings,
        ]);
    }

    let table = render_table(builder, 3..7, color_ops);

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;

    write_cart_summary(&mut out, summary)
}

fn write_cart_summary(out: &mut impl io::Write, summary: &CartSummary) -> Result<(), ReceiptError> {
    let shipping = if summary.shipping_fee.is_zero() {
        "Free".to_string()
    } else {
        format_price(&summary.shipping_fee)
    };

    let mut lines = vec![
        (" Subtotal:", format_price(&summary.subtotal)),
        (" Discount:", format!("-{}", format_price(&summary.total_discount))),
        (" Shipping:", shipping),
        (
            " \x1b[1mTotal:\x1b[0m",
            format!("\x1b[1m{}\x1b[0m", format_price(&summary.final_price)),
        ),
    ];

    if summary.free_shipping_remaining.is_positive() {
        lines.push((
            " Free shipping in:",
            format_price(&summary.free_shipping_remaining),
        ));
    }

    write_summary(out, &lines)
}

/// Write a placed order.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if a line total cannot be computed or the output cannot be written.
pub fn write_order(mut out: impl io::Write, order: &Order) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();
    let mut color_ops = ColorOps::new();

    builder.push_record(["", "Product", "Option", "Qty", "Price", "Paid"]);

    for (idx, item) in order.cart.items.iter().enumerate() {
        let row = idx + 1;

        if item.unit_price != item.original_price {
            color_ops.push((row, 5, Color::FG_GREEN));
        }

        builder.push_record([
            format!("#{:<3}", idx + 1),
            item.title.clone(),
            item.option.clone(),
            item.quantity.to_string(),
            format_price(&item.original_price),
            format_price(&extend_price(&item.unit_price, item.quantity)?),
        ]);
    }

    let table = render_table(builder, 3..6, color_ops);

    writeln!(out, "\n Order {}\n{table}", order.order_id).map_err(|_err| ReceiptError::IO)?;

    let summary = &order.cart.summary;
    let shipping = if summary.shipping_fee.is_zero() {
        "Free".to_string()
    } else {
        format_price(&summary.shipping_fee)
    };

    let lines = [
        (" Subtotal:", format_price(&summary.subtotal)),
        (" Discount:", format!("-{}", format_price(&summary.total_discount))),
        (
            " Member discount:",
            format!("({}) -{}", order.grade, format_price(&order.member_discount)),
        ),
        (" Shipping:", shipping),
        (
            " \x1b[1mAmount due:\x1b[0m",
            format!("\x1b[1m{}\x1b[0m", format_price(&order.amount_due)),
        ),
        (" Points earned:", order.points_earned.to_string()),
    ];

    write_summary(&mut out, &lines)
}

/// Write wishlist entries followed by the wishlist figures.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if a sale price cannot be computed or the output cannot be written.
pub fn write_wishlist(
    mut out: impl io::Write,
    entries: &[&WishlistEntry],
    stats: &WishlistStats,
    low_stock_threshold: u32,
) -> Result<(), ReceiptError> {
    if entries.is_empty() {
        return writeln!(out, "\n Your wishlist is empty.\n").map_err(|_err| ReceiptError::IO);
    }

    let mut builder = Builder::default();
    let mut color_ops = ColorOps::new();

    builder.push_record(["ID", "Product", "Price", "Sale", "Stock", "Saved"]);

    for (idx, entry) in entries.iter().enumerate() {
        let row = idx + 1;
        let product = &entry.product;
        let (stock, stock_color) = stock_cell(product, low_stock_threshold);

        let sale = if product.is_discounted() {
            color_ops.push((row, 3, Color::FG_GREEN));

            format!(
                "-{}",
                format_price(&discount_amount(&product.price, product.discount)?)
            )
        } else {
            String::new()
        };

        if let Some(color) = stock_color {
            color_ops.push((row, 4, color));
        }

        color_ops.push((row, 5, color_dark_grey()));

        builder.push_record([
            product.id.to_string(),
            product.title.clone(),
            format_price(&product.price),
            sale,
            stock,
            entry.added_at.strftime("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    let table = render_table(builder, 2..5, color_ops);

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;

    let lines = [
        (" Saved:", stats.total_count.to_string()),
        (" Total value:", format_price(&stats.total_value)),
        (" Average price:", format_price(&stats.average_price)),
        (
            " On sale:",
            format!(
                "{} (-{})",
                stats.discounted_count,
                format_price(&stats.total_discount_value)
            ),
        ),
        (" Sold out:", stats.out_of_stock_count.to_string()),
        (" Low on stock:", stats.low_stock_count.to_string()),
    ];

    write_summary(&mut out, &lines)
}

fn render_table(builder: Builder, right_aligned: Range<usize>, color_ops: ColorOps) -> String {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);

    if !right_aligned.is_empty() {
        table.modify(Columns::new(right_aligned), Alignment::right());
    }

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    colorize_borders(&table.to_string())
}

fn write_summary(out: &mut impl io::Write, lines: &[(&str, String)]) -> Result<(), ReceiptError> {
    let label_width = lines
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or_default();

    let value_width = lines
        .iter()
        .map(|(_, value)| visible_width(value) + 2)
        .max()
        .unwrap_or_default();

    for (label, value) in lines {
        write_summary_line(out, label, &format!("{value}  "), label_width, value_width)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}
