#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for payment intents.
//!
//! A payment intent is a declarative cross-chain payment instruction. The client
//! signs it for authorization, submits it to a remote clearing service, and
//! tracks it until the service reports a terminal status. This crate holds the
//! chain-agnostic pieces of that flow; chain-specific signing lives in separate
//! crates (e.g. `payintent-chain-eip155`).
//!
//! # Modules
//!
//! - [`intent`] - The [`PaymentIntent`](intent::PaymentIntent) wire model and its parts
//! - [`api`] - Responses and statuses reported by the clearing service
//! - [`quote`] - Corridor fee quotes and the [`FeeQuoteSource`](quote::FeeQuoteSource) capability
//! - [`config`] - Client configuration, eager validation, and environment variable resolution
//! - [`timestamp`] - Unix timestamp utilities for processing dates and permit deadlines
//! - [`util`] - Helper types (money amounts, decimal `U256` serialization)

pub mod api;
pub mod config;
pub mod intent;
pub mod quote;
pub mod timestamp;
pub mod util;
