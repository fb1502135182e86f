//! payintent command-line entrypoint.
//!
//! Commands:
//! - `quote` - Price the corridors for a prospective payment
//! - `pay` - Sign a payment intent with `PRIVATE_KEY`, submit it, and poll until terminal
//! - `status` - Print a payment
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` points at the JSON configuration file
//! - `RUST_LOG` controls log verbosity (logs go to stderr)

mod cli;
mod run;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
