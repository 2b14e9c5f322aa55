//! Storefront CLI

use std::process;

use clap::Parser;

use crate::cli::Cli;

mod cli;

pub fn main() {
    // A missing .env file is fine.
    _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = cli::logging::init(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging is not initialised, so the error goes straight to stderr"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }

    if let Err(error) = cli.run() {
        #[expect(clippy::print_stderr, reason = "command errors are reported to the user")]
        {
            eprintln!("error: {error}");
        }

        process::exit(1);
    }
}
