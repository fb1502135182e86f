#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Sign, submit, and track cross-chain payment intents.
//!
//! A payment intent describes a one-time or recurring stablecoin payment from
//! an account on one EVM network to an account on another. The payer signs a
//! Permit2 batch transfer whose witness is the intent, and a remote clearing
//! service executes it.
//!
//! This crate re-exports the workspace crates under one roof:
//!
//! - [`types`] - Chain-agnostic wire model, configuration, corridor quotes
//! - [`eip155`] - Registry, fee split, EIP-712 payloads and signing for EVM networks
//! - [`client`] - HTTP client for the clearing service and the poll loop
//! - [`util`] - Shutdown signal handling and log setup used by the `payintent` binary
//!
//! # Example
//!
//! ```ignore
//! use payintent::client::{ClearingClient, PollOptions};
//! use payintent::eip155::{AuthorizeOptions, PaymentIntentAuthorizer};
//! use payintent::types::config::ClientConfig;
//!
//! let config = ClientConfig::load("config.json")?;
//! let client = ClearingClient::from_config(&config)?;
//! let authorizer = PaymentIntentAuthorizer::default();
//! let (signed, created) = client
//!     .authorize_and_submit(&authorizer, &signer, intent, &AuthorizeOptions::default())
//!     .await?;
//! let payment = client
//!     .poll_payment(&created.id, &PollOptions::from_config(&config), &cancel)
//!     .await?;
//! ```

pub use payintent_chain_eip155 as eip155;
pub use payintent_client as client;
pub use payintent_types as types;

pub mod util;
