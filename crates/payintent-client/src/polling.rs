//! Tracking submitted payments to a terminal status.
//!
//! The poll loop asks `GET /payments/{id}` at a constant interval until the
//! payment is `COMPLETED`, `FAILED` or `CANCELLED`, the attempt budget runs
//! out, or the caller cancels. There is no backoff.

use payintent_chain_eip155::{AuthorizeOptions, PaymentIntentAuthorizer, SignerLike};
use payintent_types::api::{CreatePaymentResponse, Payment, PaymentStatus};
use payintent_types::config::ClientConfig;
use payintent_types::intent::PaymentIntent;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::client::ClearingClient;
use crate::error::ClientError;

/// Interval and attempt budget of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollOptions {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
    /// About twenty minutes at the default interval.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 600;

    /// Derives the attempt budget from an overall timeout, rounding up.
    pub fn with_timeout(interval: Duration, timeout: Duration) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let attempts = timeout.as_millis().div_ceil(interval_ms).max(1);
        Self {
            interval,
            max_attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_attempts: config.poll_max_attempts(),
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ClearingClient {
    /// Polls a payment until it reaches a terminal status.
    ///
    /// - `COMPLETED` returns the payment.
    /// - `FAILED` and `CANCELLED` return [`ClientError::PaymentFailed`] with the
    ///   service's error detail.
    /// - An exhausted attempt budget returns [`ClientError::PollingTimeout`].
    /// - Cancellation returns [`ClientError::PollingAborted`] without another request.
    ///
    /// Request errors abort the loop; transport failures are retried inside each request.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "payintent.client.poll_payment",
            skip(self, cancel),
            fields(interval = ?options.interval, max_attempts = options.max_attempts),
            err
        )
    )]
    pub async fn poll_payment(
        &self,
        id: &str,
        options: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<Payment, ClientError> {
        let mut last_status: Option<PaymentStatus> = None;
        for attempt in 1..=options.max_attempts {
            if cancel.is_cancelled() {
                return Err(ClientError::PollingAborted {
                    id: id.to_string(),
                    last_status,
                });
            }

            let payment = self.get_payment(id).await?;
            #[cfg(feature = "telemetry")]
            if last_status != Some(payment.status) {
                tracing::info!(status = %payment.status, attempt, "Payment status changed");
            }
            last_status = Some(payment.status);

            match payment.status {
                PaymentStatus::Completed => return Ok(payment),
                PaymentStatus::Failed | PaymentStatus::Cancelled => {
                    return Err(ClientError::PaymentFailed {
                        id: id.to_string(),
                        status: payment.status,
                        reason: payment.failure_reason(),
                    });
                }
                PaymentStatus::Scheduled
                | PaymentStatus::Processing
                | PaymentStatus::ReleasedToGateway => {}
            }

            if attempt < options.max_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(options.interval) => {}
                }
            }
        }

        Err(ClientError::PollingTimeout {
            id: id.to_string(),
            attempts: options.max_attempts,
            last_status,
        })
    }

    /// Submits an already signed intent and polls it to a terminal status.
    pub async fn submit_and_wait(
        &self,
        intent: &PaymentIntent,
        options: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<Payment, ClientError> {
        let created = self.create_payment(intent).await?;
        #[cfg(feature = "telemetry")]
        tracing::info!(id = %created.id, status = %created.status, "Payment submitted");
        self.poll_payment(&created.id, options, cancel).await
    }

    /// Signs an intent with `signer` and submits it. Does not wait for completion.
    pub async fn authorize_and_submit<S>(
        &self,
        authorizer: &PaymentIntentAuthorizer,
        signer: &S,
        intent: PaymentIntent,
        options: &AuthorizeOptions,
    ) -> Result<(PaymentIntent, CreatePaymentResponse), ClientError>
    where
        S: SignerLike + ?Sized,
    {
        let signed = authorizer.authorize_intent(signer, intent, options).await?;
        let created = self.create_payment(&signed).await?;
        Ok((signed, created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::intent_json;
    use alloy_signer_local::PrivateKeySigner;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const FAST: PollOptions = PollOptions {
        interval: Duration::from_millis(5),
        max_attempts: 10,
    };

    /// Answers with the given statuses in order, repeating the last one.
    struct StatusSequence {
        statuses: Vec<serde_json::Value>,
        calls: Arc<AtomicUsize>,
    }

    impl StatusSequence {
        fn new(statuses: &[serde_json::Value]) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let responder = Self {
                statuses: statuses.to_vec(),
                calls: calls.clone(),
            };
            (responder, calls)
        }
    }

    impl Respond for StatusSequence {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let body = &self.statuses[call.min(self.statuses.len() - 1)];
            ResponseTemplate::new(200).set_body_json(body)
        }
    }

    fn payment(status: &str) -> serde_json::Value {
        serde_json::json!({"id": "pay_1", "status": status})
    }

    async fn server_with(statuses: &[serde_json::Value]) -> (MockServer, Arc<AtomicUsize>) {
        let server = MockServer::start().await;
        let (responder, calls) = StatusSequence::new(statuses);
        Mock::given(method("GET"))
            .and(path("/payments/pay_1"))
            .respond_with(responder)
            .mount(&server)
            .await;
        (server, calls)
    }

    fn client(server: &MockServer) -> ClearingClient {
        ClearingClient::try_from(server.uri())
            .unwrap()
            .with_api_key("sk_test_123")
            .unwrap()
    }

    #[test]
    fn test_poll_options_from_timeout() {
        let options = PollOptions::with_timeout(Duration::from_secs(2), Duration::from_secs(1200));
        assert_eq!(options.max_attempts, 600);
        let options = PollOptions::with_timeout(Duration::from_secs(2), Duration::from_secs(5));
        assert_eq!(options.max_attempts, 3);
        assert_eq!(PollOptions::default().max_attempts, 600);
    }

    #[tokio::test]
    async fn test_poll_until_completed() {
        let (server, calls) = server_with(&[
            payment("SCHEDULED"),
            payment("PROCESSING"),
            serde_json::json!({
                "id": "pay_1",
                "status": "COMPLETED",
                "destinationTransaction": "0xdead"
            }),
        ])
        .await;

        let payment = client(&server)
            .poll_payment("pay_1", &FAST, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.destination_transaction.as_deref(), Some("0xdead"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_failed_carries_error_detail() {
        let (server, _) = server_with(&[
            payment("PROCESSING"),
            serde_json::json!({
                "id": "pay_1",
                "status": "FAILED",
                "error": {"code": "INSUFFICIENT_FUNDS", "message": "source balance too low"}
            }),
        ])
        .await;

        let err = client(&server)
            .poll_payment("pay_1", &FAST, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ClientError::PaymentFailed { id, status, reason } => {
                assert_eq!(id, "pay_1");
                assert_eq!(status, PaymentStatus::Failed);
                assert_eq!(reason, "INSUFFICIENT_FUNDS: source balance too low");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_poll_cancelled_payment_is_failure() {
        let (server, _) = server_with(&[payment("CANCELLED")]).await;
        let err = client(&server)
            .poll_payment("pay_1", &FAST, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::PaymentFailed {
                status: PaymentStatus::Cancelled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_poll_timeout_reports_last_status() {
        let statuses = [payment("SCHEDULED"), payment("RELEASED_TO_GATEWAY")];
        let (server, calls) = server_with(&statuses).await;
        let options = PollOptions {
            interval: Duration::from_millis(1),
            max_attempts: 4,
        };

        let err = client(&server)
            .poll_payment("pay_1", &options, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ClientError::PollingTimeout {
                attempts,
                last_status,
                ..
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(last_status, Some(PaymentStatus::ReleasedToGateway));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_poll_aborted_before_first_request() {
        let (server, calls) = server_with(&[payment("PROCESSING")]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client(&server)
            .poll_payment("pay_1", &FAST, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::PollingAborted {
                last_status: None,
                ..
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_poll_aborted_while_waiting() {
        let (server, calls) = server_with(&[payment("PROCESSING")]).await;
        let cancel = CancellationToken::new();
        let options = PollOptions {
            interval: Duration::from_secs(60),
            max_attempts: 10,
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = client(&server)
            .poll_payment("pay_1", &options, &cancel)
            .await
            .unwrap_err();
        match err {
            ClientError::PollingAborted { last_status, .. } => {
                assert_eq!(last_status, Some(PaymentStatus::Processing));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_authorize_and_submit_then_wait() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .respond_with(ResponseTemplate::new(201).set_body_json(payment("SCHEDULED")))
            .expect(2)
            .mount(&server)
            .await;
        let (responder, _) = StatusSequence::new(&[payment("COMPLETED")]);
        Mock::given(method("GET"))
            .and(path("/payments/pay_1"))
            .respond_with(responder)
            .mount(&server)
            .await;

        let signer: PrivateKeySigner =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse()
                .unwrap();
        let intent: PaymentIntent = serde_json::from_value(intent_json()).unwrap();
        let client = client(&server);

        let (signed, created) = client
            .authorize_and_submit(
                &PaymentIntentAuthorizer::default(),
                &signer,
                intent,
                &AuthorizeOptions::default(),
            )
            .await
            .unwrap();
        assert!(signed.authorizations.permit2.is_some());
        assert_eq!(created.status, PaymentStatus::Scheduled);

        let completed = client
            .submit_and_wait(&signed, &FAST, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(completed.status, PaymentStatus::Completed);
    }
}
