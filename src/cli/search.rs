use std::io::{self, Write};

use clap::{Args, Subcommand};
use storefront::{catalog::ProductSort, receipt};

use crate::cli::{Shop, output_error};

#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct SearchCommand {
    #[command(subcommand)]
    command: Option<SearchSubcommand>,

    /// Search text
    query: Vec<String>,

    /// Sort order
    #[arg(long, value_enum, default_value_t = ProductSort::Recommended)]
    sort: ProductSort,

    /// Page number
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[derive(Debug, Subcommand)]
enum SearchSubcommand {
    /// Show recent searches
    Recent,

    /// Forget one recent search, or all of them when no term is given
    Clear {
        /// Term to forget
        term: Option<String>,
    },

    /// Popular searches matching a partial query
    Suggest {
        /// Partial query
        query: Vec<String>,
    },
}

pub(crate) fn run(command: SearchCommand, shop: &mut Shop) -> Result<(), String> {
    match command.command {
        Some(SearchSubcommand::Recent) => recent(shop),
        Some(SearchSubcommand::Clear { term }) => clear(term.as_deref(), shop),
        Some(SearchSubcommand::Suggest { query }) => suggest(&query.join(" "), shop),
        None => search(&command.query.join(" "), command.sort, command.page, shop),
    }
}

fn search(query: &str, sort: ProductSort, page: usize, shop: &mut Shop) -> Result<(), String> {
    if query.trim().is_empty() {
        return Err("search text cannot be empty".to_string());
    }

    shop.submit_search(query)
        .map_err(|error| format!("failed to save search: {error}"))?;
    shop.set_sort(sort);
    shop.set_page(page);

    let page = shop.visible_products();

    if page.total_items == 0 {
        let mut out = io::stdout().lock();

        writeln!(out, "no products match {query:?}").map_err(output_error)?;

        let suggestions = shop.suggestions(query);
        if !suggestions.is_empty() {
            writeln!(out, "try: {}", suggestions.join(", ")).map_err(output_error)?;
        }

        return Ok(());
    }

    receipt::write_product_list(
        io::stdout().lock(),
        &page,
        shop.catalog(),
        shop.wishlist(),
        shop.config().low_stock_threshold,
    )
    .map_err(|error| format!("failed to write listing: {error}"))
}

fn recent(shop: &Shop) -> Result<(), String> {
    let mut out = io::stdout().lock();
    let terms = shop.recent_searches().terms();

    if terms.is_empty() {
        writeln!(out, "no recent searches").map_err(output_error)?;
    }

    for term in terms {
        writeln!(out, "{term}").map_err(output_error)?;
    }

    Ok(())
}

fn clear(term: Option<&str>, shop: &mut Shop) -> Result<(), String> {
    match term {
        Some(term) => {
            let removed = shop
                .remove_recent_search(term)
                .map_err(|error| format!("failed to update searches: {error}"))?;

            if !removed {
                return Err(format!("{term:?} is not a recent search"));
            }
        }
        None => shop
            .clear_recent_searches()
            .map_err(|error| format!("failed to clear searches: {error}"))?,
    }

    Ok(())
}

fn suggest(query: &str, shop: &Shop) -> Result<(), String> {
    let mut out = io::stdout().lock();

    for suggestion in shop.suggestions(query) {
        writeln!(out, "{suggestion}").map_err(output_error)?;
    }

    Ok(())
}
