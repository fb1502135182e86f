//! Corridor fee quotes.
//!
//! A corridor quote prices a transfer between a source and a destination
//! network-and-token pair. When the payer carries the corridor fees, the
//! effective quote for the intent's `quoteId` is added to the gross amount
//! before it is signed. Fetching that quote is abstracted by
//! [`FeeQuoteSource`] so the signing layer does not depend on an HTTP client.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::timestamp::UnixTimestamp;

/// Body of `POST /corridors/quotes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorridorQuoteRequest {
    pub source_network: String,
    pub source_token: String,
    pub destination_network: String,
    pub destination_token: String,
    pub destination_account: String,
    /// Amount in cents.
    pub amount: u64,
}

/// A single priced corridor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorridorQuote {
    pub quote_id: String,
    /// Total fees in the source token's whole units.
    pub estimated_total_fees: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<UnixTimestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorridorQuoteResponse {
    pub corridor_quotes: Vec<CorridorQuote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<UnixTimestamp>,
}

/// The quote currently in force for a `quoteId` and destination account,
/// as returned by `GET /corridors/quotes/{quoteId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveQuote {
    pub quote_id: String,
    pub estimated_total_fees: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<UnixTimestamp>,
}

/// Error type returned by [`FeeQuoteSource`] implementations.
pub type QuoteSourceError = Box<dyn std::error::Error + Send + Sync>;

/// Capability to look up the effective corridor fee quote.
#[async_trait]
pub trait FeeQuoteSource: Send + Sync {
    async fn get_effective_quote(
        &self,
        quote_id: &str,
        destination_account: &str,
    ) -> Result<EffectiveQuote, QuoteSourceError>;
}

#[async_trait]
impl<T: FeeQuoteSource + ?Sized> FeeQuoteSource for Arc<T> {
    async fn get_effective_quote(
        &self,
        quote_id: &str,
        destination_account: &str,
    ) -> Result<EffectiveQuote, QuoteSourceError> {
        (**self)
            .get_effective_quote(quote_id, destination_account)
            .await
    }
}
