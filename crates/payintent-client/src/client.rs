//! A JSON HTTP client for the remote clearing service.
//!
//! [`ClearingClient`] handles `POST /payments`, `GET /payments/{id}`,
//! `POST /corridors/quotes` and `GET /corridors/quotes/{quoteId}`. Every
//! request carries the API key in the `x-api-key` header.
//!
//! ## Example
//!
//! ```rust
//! use payintent_client::ClearingClient;
//!
//! let client = ClearingClient::try_from("https://api.sandbox.payintent.io/v1")
//!     .unwrap()
//!     .with_api_key("sk_test_123")
//!     .unwrap();
//! assert_eq!(client.payments_url().as_str(), "https://api.sandbox.payintent.io/v1/payments");
//! ```
//!
//! ## Retries
//!
//! Idempotent `GET` requests are retried on transport failures (connect
//! errors, timeouts) up to `max_retries` times, waiting a constant delay in
//! between. `POST` requests and HTTP error statuses are never retried.

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue};
use payintent_types::api::{CreatePaymentRequest, CreatePaymentResponse, Payment};
use payintent_types::config::ClientConfig;
use payintent_types::intent::PaymentIntent;
use payintent_types::quote::{
    CorridorQuoteRequest, CorridorQuoteResponse, EffectiveQuote, FeeQuoteSource, QuoteSourceError,
};
use reqwest::{Client, RequestBuilder};
use std::fmt::Display;
use std::time::Duration;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::error::ClientError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// A client for the remote clearing service.
#[derive(Clone, Debug)]
pub struct ClearingClient {
    /// Base URL of the service (e.g. `https://api.payintent.io/v1/`)
    base_url: Url,
    /// Full URL to `POST /payments`
    payments_url: Url,
    /// Full URL to `POST /corridors/quotes`
    quotes_url: Url,
    client: Client,
    /// Headers sent with each request, including the API key
    headers: HeaderMap,
    /// Optional per-request timeout
    timeout: Option<Duration>,
    /// Retries of transport failures for idempotent requests
    max_retries: u32,
    /// Constant delay between retries
    retry_delay: Duration,
}

impl ClearingClient {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

    /// Constructs a client from a base URL.
    ///
    /// Endpoint URLs are resolved relative to the base, so the base should end with `/`.
    pub fn try_new(base_url: Url) -> Result<Self, ClientError> {
        let payments_url = base_url
            .join("./payments")
            .map_err(|e| ClientError::UrlParse {
                context: "Failed to construct ./payments URL",
                source: e,
            })?;
        let quotes_url = base_url
            .join("./corridors/quotes")
            .map_err(|e| ClientError::UrlParse {
                context: "Failed to construct ./corridors/quotes URL",
                source: e,
            })?;
        Ok(Self {
            base_url,
            payments_url,
            quotes_url,
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: None,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        })
    }

    /// Constructs a client from a validated [`ClientConfig`].
    ///
    /// The configuration is validated first; an invalid one never yields a client.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let base_url = config.api_url()?;
        let client = ClearingClient::try_from(base_url.as_str())?
            .with_api_key(config.api_key.inner())?
            .with_timeout(config.timeout())
            .with_retries(config.max_retries, config.poll_interval());
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the computed `./payments` URL relative to [`ClearingClient::base_url`].
    pub fn payments_url(&self) -> &Url {
        &self.payments_url
    }

    /// Returns the computed `./corridors/quotes` URL relative to [`ClearingClient::base_url`].
    pub fn quotes_url(&self) -> &Url {
        &self.quotes_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Sets the API key sent as `x-api-key` with every request.
    pub fn with_api_key(&self, api_key: &str) -> Result<Self, ClientError> {
        let mut value = HeaderValue::from_str(api_key).map_err(ClientError::InvalidApiKey)?;
        value.set_sensitive(true);
        let mut this = self.clone();
        this.headers.insert(API_KEY_HEADER, value);
        Ok(this)
    }

    /// Attaches custom headers to all future requests. Keeps the API key if one is set.
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        let mut this = self.clone();
        let api_key = this.headers.remove(API_KEY_HEADER);
        this.headers = headers;
        if let Some(api_key) = api_key {
            this.headers.insert(API_KEY_HEADER, api_key);
        }
        this
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut this = self.clone();
        this.timeout = Some(timeout);
        this
    }

    /// Sets how many times idempotent requests are retried on transport failures.
    pub fn with_retries(&self, max_retries: u32, retry_delay: Duration) -> Self {
        let mut this = self.clone();
        this.max_retries = max_retries;
        this.retry_delay = retry_delay;
        this
    }

    /// `./payments/{id}`, with the id percent-encoded as a single path segment.
    pub fn payment_url(&self, id: &str) -> Result<Url, ClientError> {
        append_segment(&self.payments_url, id, "Failed to construct ./payments/{id} URL")
    }

    /// `./corridors/quotes/{quoteId}?destinationAccount=...`
    pub fn effective_quote_url(
        &self,
        quote_id: &str,
        destination_account: &str,
    ) -> Result<Url, ClientError> {
        let mut url = append_segment(
            &self.quotes_url,
            quote_id,
            "Failed to construct ./corridors/quotes/{quoteId} URL",
        )?;
        url.query_pairs_mut()
            .append_pair("destinationAccount", destination_account);
        Ok(url)
    }

    /// Submits a signed payment intent with `POST /payments`.
    ///
    /// Never retried: a lost response could otherwise create the payment twice.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "payintent.client.create_payment",
            skip_all,
            fields(
                amount = intent.amount,
                source = %intent.source.network,
                destination = %intent.destination.network,
            ),
            err
        )
    )]
    pub async fn create_payment(
        &self,
        intent: &PaymentIntent,
    ) -> Result<CreatePaymentResponse, ClientError> {
        let request = CreatePaymentRequest {
            payment_intent: intent,
        };
        self.post_json(&self.payments_url, "POST /payments", &request)
            .await
    }

    /// Fetches a payment with `GET /payments/{id}`.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "payintent.client.get_payment", skip(self), err)
    )]
    pub async fn get_payment(&self, id: &str) -> Result<Payment, ClientError> {
        let url = self.payment_url(id)?;
        self.get_json(&url, "GET /payments/{id}").await
    }

    /// Prices the corridors for a prospective payment with `POST /corridors/quotes`.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "payintent.client.request_corridor_quotes", skip_all, err)
    )]
    pub async fn request_corridor_quotes(
        &self,
        request: &CorridorQuoteRequest,
    ) -> Result<CorridorQuoteResponse, ClientError> {
        self.post_json(&self.quotes_url, "POST /corridors/quotes", request)
            .await
    }

    /// Fetches the quote in force for `quote_id` with `GET /corridors/quotes/{quoteId}`.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "payintent.client.get_effective_quote", skip(self), err)
    )]
    pub async fn get_effective_quote(
        &self,
        quote_id: &str,
        destination_account: &str,
    ) -> Result<EffectiveQuote, ClientError> {
        let url = self.effective_quote_url(quote_id, destination_account)?;
        self.get_json(&url, "GET /corridors/quotes/{quoteId}").await
    }

    /// Applies headers and the timeout to a request.
    fn prepare(&self, mut req: RequestBuilder) -> RequestBuilder {
        for (key, value) in self.headers.iter() {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        req
    }

    /// Sends a request and maps the response: 2xx bodies are decoded as `R`,
    /// anything else becomes [`ClientError::Api`] with the body kept verbatim.
    async fn send_json<R>(
        &self,
        req: RequestBuilder,
        context: &'static str,
    ) -> Result<R, ClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        let http_response = self
            .prepare(req)
            .send()
            .await
            .map_err(|e| ClientError::Http { context, source: e })?;

        let result = if http_response.status().is_success() {
            http_response
                .json::<R>()
                .await
                .map_err(|e| ClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| ClientError::ResponseBodyRead { context, source: e })?;
            Err(ClientError::Api {
                context,
                status,
                body,
            })
        };

        record_result(&result, context);

        result
    }

    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, ClientError>
    where
        T: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let req = self.client.post(url.clone()).json(payload);
        self.send_json(req, context).await
    }

    /// `GET` with retries of transport failures.
    async fn get_json<R>(&self, url: &Url, context: &'static str) -> Result<R, ClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        let mut retries = 0;
        loop {
            let req = self.client.get(url.clone());
            match self.send_json(req, context).await {
                Err(error) if error.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    record_retry(&error, context, retries);
                    tokio::time::sleep(self.retry_delay).await;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl FeeQuoteSource for ClearingClient {
    async fn get_effective_quote(
        &self,
        quote_id: &str,
        destination_account: &str,
    ) -> Result<EffectiveQuote, QuoteSourceError> {
        ClearingClient::get_effective_quote(self, quote_id, destination_account)
            .await
            .map_err(|e| Box::new(e) as QuoteSourceError)
    }
}

/// Converts a string URL into a `ClearingClient`, normalizing it to a single trailing slash.
impl TryFrom<&str> for ClearingClient {
    type Error = ClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| ClientError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        ClearingClient::try_new(url)
    }
}

impl TryFrom<String> for ClearingClient {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClearingClient::try_from(value.as_str())
    }
}

fn append_segment(base: &Url, segment: &str, context: &'static str) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::UrlParse {
            context,
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        })?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

#[cfg(feature = "telemetry")]
fn record_result<R, E: Display>(result: &Result<R, E>, context: &'static str) {
    if let Err(err) = result {
        tracing::event!(
            tracing::Level::ERROR,
            error = %err,
            context,
            "Request to clearing service failed"
        );
    }
}

#[cfg(not(feature = "telemetry"))]
fn record_result<R, E: Display>(_result: &Result<R, E>, _context: &'static str) {}

#[cfg(feature = "telemetry")]
fn record_retry(error: &ClientError, context: &'static str, retry: u32) {
    tracing::warn!(error = %error, context, retry, "Transport failure, retrying");
}

#[cfg(not(feature = "telemetry"))]
fn record_retry(_error: &ClientError, _context: &'static str, _retry: u32) {}
