//! Signing a payment intent end to end.
//!
//! [`PaymentIntentAuthorizer`] owns the collaborators the payload builders
//! need (registry, nonce source, optional corridor quote source, ledgers)
//! and turns an unsigned [`PaymentIntent`] into one with its
//! `authorizations` filled in.

use alloy_primitives::{Address, U256};
use payintent_types::intent::{Authorizations, PaymentIntent, SignedPermit};
use payintent_types::quote::FeeQuoteSource;
use payintent_types::timestamp::UnixTimestamp;
use payintent_types::util::MoneyAmount;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::chain::{ChecksummedAddress, LedgerQuery};
use crate::error::AuthorizationError;
use crate::nonce::{NonceSource, ProcessNonce};
use crate::permit::{
    BatchPermit, BatchPermitParams, DEFAULT_DEADLINE_SECS, LegacyPermit, LegacyPermitRequest,
    build_batch_permit, build_legacy_permit,
};
use crate::registry::Registry;
use crate::signer::SignerLike;

/// Per-call overrides for [`PaymentIntentAuthorizer::authorize_intent`].
#[derive(Debug, Clone, Default)]
pub struct AuthorizeOptions {
    /// Batch permit nonce. Drawn from the nonce source when absent.
    pub nonce: Option<U256>,
    /// Also sign a legacy single-token permit approving Permit2.
    pub legacy_permit: bool,
    /// Legacy permit nonce. Read from the token when absent.
    pub legacy_nonce: Option<U256>,
    /// Legacy permit spender. Defaults to the Permit2 contract.
    pub legacy_spender: Option<Address>,
}

/// Builds and signs authorization payloads for payment intents.
#[derive(Clone)]
pub struct PaymentIntentAuthorizer {
    registry: Registry,
    nonce_source: Arc<dyn NonceSource>,
    quotes: Option<Arc<dyn FeeQuoteSource>>,
    ledgers: HashMap<String, Arc<dyn LedgerQuery>>,
}

impl std::fmt::Debug for PaymentIntentAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntentAuthorizer")
            .field("registry", &self.registry)
            .field("quotes", &self.quotes.is_some())
            .field("ledgers", &self.ledgers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for PaymentIntentAuthorizer {
    fn default() -> Self {
        Self::new(Registry::default())
    }
}

impl PaymentIntentAuthorizer {
    /// Creates an authorizer drawing nonces from the process-wide monotonic source.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            nonce_source: Arc::new(ProcessNonce),
            quotes: None,
            ledgers: HashMap::new(),
        }
    }

    pub fn with_nonce_source(mut self, nonce_source: Arc<dyn NonceSource>) -> Self {
        self.nonce_source = nonce_source;
        self
    }

    /// Enables corridor fee adjustment for intents whose payer carries a quoted fee.
    pub fn with_quote_source(mut self, quotes: Arc<dyn FeeQuoteSource>) -> Self {
        self.quotes = Some(quotes);
        self
    }

    /// Uses `ledger` for contract reads on `network` instead of its RPC endpoint.
    pub fn with_ledger(
        mut self,
        network: impl Into<String>,
        ledger: Arc<dyn LedgerQuery>,
    ) -> Self {
        self.ledgers.insert(network.into(), ledger);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn ledger_for(&self, network: &str) -> Result<Arc<dyn LedgerQuery>, AuthorizationError> {
        if let Some(ledger) = self.ledgers.get(network) {
            return Ok(ledger.clone());
        }
        Ok(Arc::new(self.registry.ledger(network)?))
    }

    fn deadline_for(intent: &PaymentIntent) -> UnixTimestamp {
        intent
            .expiration_date
            .unwrap_or_else(|| UnixTimestamp::now() + DEFAULT_DEADLINE_SECS)
    }

    /// The intent amount in source token native units.
    ///
    /// When the payer carries a quoted corridor fee, the effective quote is
    /// added before conversion. A failed lookup or a negative quoted fee is
    /// logged and the unadjusted amount is used.
    pub async fn gross_amount(&self, intent: &PaymentIntent) -> Result<U256, AuthorizationError> {
        let token = self
            .registry
            .get_token(&intent.source.token, &intent.source.network)?;
        let base = MoneyAmount::from_cents(intent.amount);
        let amount = match intent.payer_quote_id() {
            Some(quote_id) => self.add_quoted_fee(base, quote_id, intent).await,
            None => base,
        };
        amount
            .to_native_units(token.decimals)
            .map_err(|e| AuthorizationError::invalid("amount", e))
    }

    async fn add_quoted_fee(
        &self,
        base: MoneyAmount,
        quote_id: &str,
        intent: &PaymentIntent,
    ) -> MoneyAmount {
        let Some(quotes) = &self.quotes else {
            #[cfg(feature = "telemetry")]
            tracing::warn!(
                quote_id,
                "No quote source configured, signing the unadjusted amount"
            );
            return base;
        };
        let quote = match quotes
            .get_effective_quote(quote_id, &intent.destination.address)
            .await
        {
            Ok(quote) => quote,
            Err(_e) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(
                    quote_id,
                    error = %_e,
                    "Corridor quote lookup failed, signing the unadjusted amount"
                );
                return base;
            }
        };
        if quote.estimated_total_fees.is_sign_negative() {
            #[cfg(feature = "telemetry")]
            tracing::warn!(
                quote_id,
                fee = %quote.estimated_total_fees,
                "Quoted fee is negative, signing the unadjusted amount"
            );
            return base;
        }
        let fee = MoneyAmount::from(quote.estimated_total_fees);
        match base.checked_add(&fee) {
            Some(total) => total,
            None => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(
                    quote_id,
                    fee = %fee,
                    "Quoted fee overflows the amount, signing the unadjusted amount"
                );
                base
            }
        }
    }

    /// Builds the Permit2 batch permit for `intent`.
    pub async fn build_batch_permit(
        &self,
        intent: &PaymentIntent,
        nonce: Option<U256>,
    ) -> Result<BatchPermit, AuthorizationError> {
        let gross = self.gross_amount(intent).await?;
        let params = BatchPermitParams {
            gross,
            nonce: nonce.unwrap_or_else(|| self.nonce_source.next_nonce()),
            deadline: Self::deadline_for(intent),
        };
        build_batch_permit(intent, &self.registry, params)
    }

    /// Builds the legacy permit approving the source token for Permit2.
    ///
    /// The approved value and the deadline are taken from `batch`, so both
    /// signatures commit to the same gross amount and expire together.
    pub async fn build_legacy_permit(
        &self,
        intent: &PaymentIntent,
        batch: &BatchPermit,
        options: &AuthorizeOptions,
    ) -> Result<LegacyPermit, AuthorizationError> {
        let network = &intent.source.network;
        let token = self.registry.get_token(&intent.source.token, network)?;
        let owner = ChecksummedAddress::parse_field("source.address", &intent.source.address)?;
        let request = LegacyPermitRequest {
            owner: owner.into(),
            spender: options.legacy_spender,
            value: batch.gross,
            nonce: options.legacy_nonce,
            deadline: batch.deadline,
        };
        let ledger = self.ledger_for(network)?;
        build_legacy_permit(ledger.as_ref(), network, token, &request).await
    }

    /// Signs the batch permit (and the legacy permit when requested) and
    /// returns `intent` with its authorizations attached.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "payintent.authorize_intent",
            skip_all,
            err,
            fields(
                signer = %signer.address(),
                source = %intent.source.network,
                destination = %intent.destination.network,
                amount = intent.amount,
            )
        )
    )]
    pub async fn authorize_intent<S>(
        &self,
        signer: &S,
        intent: PaymentIntent,
        options: &AuthorizeOptions,
    ) -> Result<PaymentIntent, AuthorizationError>
    where
        S: SignerLike + ?Sized,
    {
        let batch = self.build_batch_permit(&intent, options.nonce).await?;
        let signature = batch.payload.sign(signer).await?;
        let permit2 = SignedPermit {
            signature,
            nonce: batch.nonce,
            deadline: batch.deadline,
        };

        let legacy_permit = if options.legacy_permit {
            let permit = self.build_legacy_permit(&intent, &batch, options).await?;
            let signature = permit.sign(signer).await?;
            Some(SignedPermit {
                signature,
                nonce: permit.nonce(),
                deadline: batch.deadline,
            })
        } else {
            None
        };

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            nonce = %batch.nonce,
            deadline = %batch.deadline,
            legacy = legacy_permit.is_some(),
            "Signed payment intent"
        );

        Ok(intent.with_authorizations(Authorizations {
            permit2: Some(permit2),
            legacy_permit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ledger::tests::FakeLedger;
    use crate::nonce::FixedNonce;
    use crate::permit::batch::tests::sample_intent;
    use crate::signer::HashOnlySigner;
    use crate::signer::tests::test_signer;
    use alloy_primitives::Signature;
    use async_trait::async_trait;
    use payintent_types::intent::{ChargeBearer, ProcessingFees};
    use payintent_types::quote::{EffectiveQuote, QuoteSourceError};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticQuote {
        fee: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeeQuoteSource for StaticQuote {
        async fn get_effective_quote(
            &self,
            quote_id: &str,
            _destination_account: &str,
        ) -> Result<EffectiveQuote, QuoteSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fee {
                Some(fee) => Ok(EffectiveQuote {
                    quote_id: quote_id.to_string(),
                    estimated_total_fees: Decimal::from_str(fee)?,
                    expires_at: None,
                }),
                None => Err("quote expired".into()),
            }
        }
    }

    /// Answers the first lookup with `fee` after `delay` and fails every later one.
    struct FirstQuoteOnly {
        fee: &'static str,
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeeQuoteSource for FirstQuoteOnly {
        async fn get_effective_quote(
            &self,
            quote_id: &str,
            _destination_account: &str,
        ) -> Result<EffectiveQuote, QuoteSourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if call > 0 {
                return Err("quote already consumed".into());
            }
            Ok(EffectiveQuote {
                quote_id: quote_id.to_string(),
                estimated_total_fees: Decimal::from_str(self.fee)?,
                expires_at: None,
            })
        }
    }

    fn recover(signature: &[u8], hash: &alloy_primitives::B256) -> Address {
        Signature::try_from(signature)
            .unwrap()
            .recover_address_from_prehash(hash)
            .unwrap()
    }

    fn payer_quoted_intent() -> PaymentIntent {
        let mut intent = sample_intent();
        intent.amount = 1000;
        intent.processing_fees = Some(ProcessingFees {
            corridor_fees: Decimal::from_str("0.10").unwrap(),
            charge_bearer: ChargeBearer::Payer,
            quote_id: Some("q-1".to_string()),
        });
        intent
    }

    #[tokio::test]
    async fn test_gross_amount_converts_cents() {
        let mut intent = sample_intent();
        intent.amount = 1000;
        let authorizer = PaymentIntentAuthorizer::default();
        assert_eq!(
            authorizer.gross_amount(&intent).await.unwrap(),
            U256::from(10_000_000u64)
        );
    }

    #[tokio::test]
    async fn test_gross_amount_includes_payer_quote() {
        let quotes = Arc::new(StaticQuote {
            fee: Some("0.123456789"),
            calls: AtomicUsize::new(0),
        });
        let authorizer = PaymentIntentAuthorizer::default().with_quote_source(quotes.clone());
        assert_eq!(
            authorizer.gross_amount(&payer_quoted_intent()).await.unwrap(),
            U256::from(10_123_456u64)
        );
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_quote_failure_falls_back_to_unadjusted_amount() {
        let quotes = Arc::new(StaticQuote {
            fee: None,
            calls: AtomicUsize::new(0),
        });
        let authorizer = PaymentIntentAuthorizer::default().with_quote_source(quotes.clone());
        assert_eq!(
            authorizer.gross_amount(&payer_quoted_intent()).await.unwrap(),
            U256::from(10_000_000u64)
        );
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_negative_quote_falls_back_to_unadjusted_amount() {
        let quotes = Arc::new(StaticQuote {
            fee: Some("-0.25"),
            calls: AtomicUsize::new(0),
        });
        let authorizer = PaymentIntentAuthorizer::default().with_quote_source(quotes.clone());
        assert_eq!(
            authorizer.gross_amount(&payer_quoted_intent()).await.unwrap(),
            U256::from(10_000_000u64)
        );
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_quote_ignored_when_payer_does_not_bear_fees() {
        let quotes = Arc::new(StaticQuote {
            fee: Some("5"),
            calls: AtomicUsize::new(0),
        });
        let authorizer = PaymentIntentAuthorizer::default().with_quote_source(quotes.clone());
        let mut intent = payer_quoted_intent();
        if let Some(fees) = intent.processing_fees.as_mut() {
            fees.charge_bearer = ChargeBearer::Operator;
        }
        assert_eq!(
            authorizer.gross_amount(&intent).await.unwrap(),
            U256::from(10_000_000u64)
        );
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authorize_intent_attaches_recoverable_batch_signature() {
        let signer = test_signer();
        let authorizer = PaymentIntentAuthorizer::default()
            .with_nonce_source(Arc::new(FixedNonce(U256::from(77u8))));
        let intent = sample_intent();
        let expected_hash = authorizer
            .build_batch_permit(&intent, None)
            .await
            .unwrap()
            .payload
            .signing_hash();

        let signed = authorizer
            .authorize_intent(&signer, intent, &AuthorizeOptions::default())
            .await
            .unwrap();
        let permit2 = signed.authorizations.permit2.as_ref().unwrap();
        assert_eq!(permit2.nonce, U256::from(77u8));
        assert_eq!(permit2.deadline, UnixTimestamp::from_secs(1_900_000_000));
        assert!(signed.authorizations.legacy_permit.is_none());

        let recovered = Signature::try_from(permit2.signature.as_ref())
            .unwrap()
            .recover_address_from_prehash(&expected_hash)
            .unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[tokio::test]
    async fn test_hash_only_signer_produces_same_authorization() {
        let options = AuthorizeOptions {
            nonce: Some(U256::from(1u8)),
            ..Default::default()
        };
        let authorizer = PaymentIntentAuthorizer::default();
        let native = authorizer
            .authorize_intent(&test_signer(), sample_intent(), &options)
            .await
            .unwrap();
        let fallback = authorizer
            .authorize_intent(&HashOnlySigner(test_signer()), sample_intent(), &options)
            .await
            .unwrap();
        assert_eq!(native.authorizations, fallback.authorizations);
    }

    #[tokio::test]
    async fn test_authorize_intent_with_legacy_permit() {
        let ledger = Arc::new(
            FakeLedger::default()
                .with_nonces(4)
                .with_name("USD Coin")
                .with_version("2"),
        );
        let authorizer = PaymentIntentAuthorizer::default().with_ledger("base", ledger);
        let options = AuthorizeOptions {
            legacy_permit: true,
            ..Default::default()
        };
        let signed = authorizer
            .authorize_intent(&test_signer(), sample_intent(), &options)
            .await
            .unwrap();
        let legacy = signed.authorizations.legacy_permit.unwrap();
        assert_eq!(legacy.nonce, U256::from(4u8));
        assert_eq!(legacy.signature.len(), 65);
    }

    #[tokio::test]
    async fn test_legacy_permit_agrees_with_batch_permit() {
        let signer = test_signer();
        let ledger = Arc::new(
            FakeLedger::default()
                .with_nonces(4)
                .with_name("USD Coin")
                .with_version("2"),
        );
        // The slow lookup pushes any second deadline computation into a later second.
        let quotes = Arc::new(FirstQuoteOnly {
            fee: "0.50",
            delay: Duration::from_millis(1100),
            calls: AtomicUsize::new(0),
        });
        let authorizer = PaymentIntentAuthorizer::default()
            .with_ledger("base", ledger.clone())
            .with_quote_source(quotes.clone());
        let mut intent = payer_quoted_intent();
        intent.expiration_date = None;
        let options = AuthorizeOptions {
            legacy_permit: true,
            ..Default::default()
        };

        let signed = authorizer
            .authorize_intent(&signer, intent.clone(), &options)
            .await
            .unwrap();
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 1);
        let permit2 = signed.authorizations.permit2.unwrap();
        let legacy = signed.authorizations.legacy_permit.unwrap();
        assert_eq!(legacy.deadline, permit2.deadline);

        let gross = U256::from(10_500_000u64);
        let batch = build_batch_permit(
            &intent,
            authorizer.registry(),
            BatchPermitParams {
                gross,
                nonce: permit2.nonce,
                deadline: permit2.deadline,
            },
        )
        .unwrap();
        assert_eq!(
            recover(&permit2.signature, &batch.payload.signing_hash()),
            signer.address()
        );

        let token = authorizer.registry().get_token("USDC", "base").unwrap();
        let request = LegacyPermitRequest {
            owner: signer.address(),
            spender: None,
            value: gross,
            nonce: Some(legacy.nonce),
            deadline: legacy.deadline,
        };
        let rebuilt = build_legacy_permit(ledger.as_ref(), "base", token, &request)
            .await
            .unwrap();
        assert_eq!(
            recover(&legacy.signature, &rebuilt.signing_hash()),
            signer.address()
        );
    }

    #[tokio::test]
    async fn test_environment_mismatch_is_rejected() {
        let authorizer = PaymentIntentAuthorizer::new(
            Registry::default().with_environment(payintent_types::config::Environment::Testnet),
        );
        let result = authorizer
            .authorize_intent(&test_signer(), sample_intent(), &AuthorizeOptions::default())
            .await;
        assert!(matches!(
            result,
            Err(AuthorizationError::UnsupportedNetworkOrToken(
                crate::registry::RegistryError::WrongEnvironment { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_missing_deadline_defaults_to_an_hour() {
        let mut intent = sample_intent();
        intent.expiration_date = None;
        let before = UnixTimestamp::now().as_secs();
        let permit = PaymentIntentAuthorizer::default()
            .build_batch_permit(&intent, Some(U256::ZERO))
            .await
            .unwrap();
        let deadline = permit.deadline.as_secs();
        assert!(deadline >= before + DEFAULT_DEADLINE_SECS);
        assert!(deadline <= UnixTimestamp::now().as_secs() + DEFAULT_DEADLINE_SECS);
    }
}
