#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Submission and tracking of payment intents against the clearing service.
//!
//! [`ClearingClient`] posts signed intents, requests corridor quotes, and
//! polls payments until they reach a terminal status. It also serves as the
//! [`FeeQuoteSource`](payintent_types::quote::FeeQuoteSource) that the
//! authorizer consults when the payer carries corridor fees.
//!
//! # Example
//!
//! ```ignore
//! use payintent_client::{ClearingClient, PollOptions};
//! use payintent_chain_eip155::{AuthorizeOptions, PaymentIntentAuthorizer};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = ClearingClient::from_config(&config)?;
//! let authorizer = PaymentIntentAuthorizer::default()
//!     .with_quote_source(std::sync::Arc::new(client.clone()));
//! let signed = authorizer.authorize_intent(&signer, intent, &AuthorizeOptions::default()).await?;
//! let payment = client
//!     .submit_and_wait(&signed, &PollOptions::from_config(&config), &CancellationToken::new())
//!     .await?;
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - `tracing` spans for requests and poll progress

pub mod client;
pub mod error;
pub mod polling;

pub use client::{API_KEY_HEADER, ClearingClient};
pub use error::ClientError;
pub use polling::PollOptions;

#[cfg(test)]
pub(crate) mod tests {
    /// A base USDC to polygon USDC intent of 10.00.
    pub fn intent_json() -> serde_json::Value {
        serde_json::json!({
            "paymentType": "ONE_TIME",
            "operatorData": {
                "id": "0x00000000000000000000000000000000000000000000000000000000000000ff",
                "operator": "0x1111111111111111111111111111111111111111",
                "treasury": "0x2222222222222222222222222222222222222222",
                "feeBps": 50
            },
            "amount": 1000,
            "source": {
                "address": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
                "network": "base",
                "token": "USDC"
            },
            "destination": {
                "address": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                "network": "polygon",
                "token": "USDC"
            },
            "expirationDate": 1900000000
        })
    }
}
