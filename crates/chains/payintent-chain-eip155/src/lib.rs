#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-155 (EVM) authorization for payment intents.
//!
//! A payment intent is authorized by a Permit2 batch signature transfer whose
//! witness is the intent itself. The permit lets the source network's gateway
//! pull three legs of the source token (payee, operator fee, gateway fee),
//! and only for this intent. Tokens that have not approved Permit2 yet can
//! additionally carry a legacy single-token permit.
//!
//! # Architecture
//!
//! - [`chain`] - Checksummed addresses, token deployments, read-only ledger calls
//! - [`registry`] - Static network and token tables
//! - [`fee`] - Exact three-way fee split
//! - [`permit`] - EIP-712 payloads: the batch-witness permit and legacy permits
//! - [`signer`] - The [`SignerLike`] capability and the typed-data signing façade
//! - [`nonce`] - Batch permit nonce sources
//! - [`authorizer`] - [`PaymentIntentAuthorizer`], which ties everything together
//!
//! # Feature Flags
//!
//! - `telemetry` - `tracing` spans and events
//!
//! # Example
//!
//! ```ignore
//! use payintent_chain_eip155::{AuthorizeOptions, PaymentIntentAuthorizer};
//! use alloy_signer_local::PrivateKeySigner;
//!
//! let signer: PrivateKeySigner = std::env::var("PRIVATE_KEY")?.parse()?;
//! let authorizer = PaymentIntentAuthorizer::default();
//! let signed = authorizer
//!     .authorize_intent(&signer, intent, &AuthorizeOptions::default())
//!     .await?;
//! assert!(signed.authorizations.permit2.is_some());
//! ```

pub mod authorizer;
pub mod chain;
pub mod error;
pub mod fee;
pub mod nonce;
pub mod permit;
pub mod registry;
pub mod signer;

pub use authorizer::{AuthorizeOptions, PaymentIntentAuthorizer};
pub use error::AuthorizationError;
pub use registry::{Registry, RegistryError};
pub use signer::{HashOnlySigner, SignerLike, sign_typed_data};
