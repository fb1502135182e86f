use http::StatusCode;
use payintent_chain_eip155::AuthorizationError;
use payintent_types::api::PaymentStatus;
use payintent_types::config::ConfigError;

/// Errors that can occur while talking to the clearing service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid API key header value: {0}")]
    InvalidApiKey(#[source] http::header::InvalidHeaderValue),
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status. The body is kept verbatim.
    #[error("Clearing service returned {status}: {context}: {body}")]
    Api {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error(
        "Payment {id} did not reach a terminal status after {attempts} attempts (last status: {})",
        status_label(.last_status)
    )]
    PollingTimeout {
        id: String,
        attempts: u32,
        last_status: Option<PaymentStatus>,
    },
    #[error("Payment {id} ended with status {status}: {reason}")]
    PaymentFailed {
        id: String,
        status: PaymentStatus,
        reason: String,
    },
    #[error(
        "Polling payment {id} was aborted (last status: {})",
        status_label(.last_status)
    )]
    PollingAborted {
        id: String,
        last_status: Option<PaymentStatus>,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
}

impl ClientError {
    /// Transport-level failures are the only ones worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Http { source, .. }
                if source.is_timeout() || source.is_connect() || source.is_request()
        )
    }

    /// HTTP status reported by the service, if the failure came from one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn status_label(status: &Option<PaymentStatus>) -> &'static str {
    status.as_ref().map(PaymentStatus::as_str).unwrap_or("none")
}
