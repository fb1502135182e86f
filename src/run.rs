use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use dotenvy::dotenv;
use payintent::client::{ClearingClient, PollOptions};
use payintent::eip155::{AuthorizeOptions, PaymentIntentAuthorizer, Registry};
use payintent::types::config::ClientConfig;
use payintent::types::intent::PaymentIntent;
use payintent::types::quote::CorridorQuoteRequest;
use payintent::util::{SigDown, init_tracing};
use serde::Serialize;
use std::sync::Arc;

use crate::cli::{Cli, Command, PayArgs, QuoteArgs};

/// Runs one CLI command.
///
/// - Loads `.env` variables.
/// - Installs the log subscriber.
/// - Loads and validates the configuration.
/// - Dispatches to the command, printing results as JSON on stdout.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env variables
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::load(&cli.config)?;
    let client = ClearingClient::from_config(&config)?;
    tracing::debug!(
        api = %client.base_url(),
        environment = %config.environment,
        "Client configured"
    );

    match cli.command {
        Command::Quote(args) => quote(&client, args).await,
        Command::Pay(args) => pay(&client, &config, args).await,
        Command::Status { id } => {
            let payment = client.get_payment(&id).await?;
            print_json(&payment)
        }
    }
}

async fn quote(
    client: &ClearingClient,
    args: QuoteArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = CorridorQuoteRequest {
        source_network: args.source_network,
        source_token: args.source_token,
        destination_network: args.destination_network,
        destination_token: args.destination_token,
        destination_account: args.destination_account,
        amount: args.amount.to_cents()?,
    };
    let response = client.request_corridor_quotes(&request).await?;
    print_json(&response)
}

async fn pay(
    client: &ClearingClient,
    config: &ClientConfig,
    args: PayArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let intent: PaymentIntent = serde_json::from_str(&std::fs::read_to_string(&args.intent)?)?;
    let signer: PrivateKeySigner = args.private_key.trim().parse()?;

    let registry = Registry::default()
        .with_environment(config.environment)
        .with_rpc_overrides(&config.rpc)?;
    let authorizer = PaymentIntentAuthorizer::new(registry)
        .with_quote_source(Arc::new(client.clone()));
    let options = AuthorizeOptions {
        legacy_permit: args.legacy_permit,
        ..Default::default()
    };

    let (_signed, created) = client
        .authorize_and_submit(&authorizer, &signer, intent, &options)
        .await?;
    tracing::info!(id = %created.id, status = %created.status, "Payment submitted");
    if args.no_wait {
        return print_json(&created);
    }

    let sig_down = SigDown::try_new()?;
    let result = client
        .poll_payment(
            &created.id,
            &PollOptions::from_config(config),
            &sig_down.cancellation_token(),
        )
        .await;
    sig_down.close().await;
    print_json(&result?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
