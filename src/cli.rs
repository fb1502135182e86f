use clap::{Args, Parser, Subcommand};
use payintent::types::util::MoneyAmount;
use std::path::PathBuf;

/// CLI arguments for the payintent client.
#[derive(Parser, Debug)]
#[command(name = "payintent", version)]
#[command(about = "Sign, submit, and track cross-chain payment intents")]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json", global = true)]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Price the corridors between two network-and-token pairs
    Quote(QuoteArgs),
    /// Sign a payment intent, submit it, and wait for a terminal status
    Pay(PayArgs),
    /// Print a payment
    Status {
        /// Payment id returned on submission
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct QuoteArgs {
    #[arg(long)]
    pub source_network: String,
    #[arg(long)]
    pub source_token: String,
    #[arg(long)]
    pub destination_network: String,
    #[arg(long)]
    pub destination_token: String,
    #[arg(long)]
    pub destination_account: String,
    /// Amount in the destination currency, e.g. `10.50` or `$10.50`
    #[arg(long)]
    pub amount: MoneyAmount,
}

#[derive(Args, Debug)]
pub struct PayArgs {
    /// Path to the payment intent JSON file
    #[arg(long)]
    pub intent: PathBuf,
    /// Also sign a legacy permit approving Permit2 for the source token
    #[arg(long)]
    pub legacy_permit: bool,
    /// Return right after submission
    #[arg(long)]
    pub no_wait: bool,
    /// Hex-encoded private key of the payer
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,
}
