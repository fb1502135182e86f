//! Responses and statuses reported by the clearing service.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::intent::{PaymentIntent, PaymentType};
use crate::timestamp::UnixTimestamp;

/// Lifecycle status of a submitted payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Scheduled,
    Processing,
    ReleasedToGateway,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// `COMPLETED`, `FAILED` and `CANCELLED` end the lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Scheduled => "SCHEDULED",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::ReleasedToGateway => "RELEASED_TO_GATEWAY",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure detail attached to a `FAILED` or `CANCELLED` payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A payment as reported by `GET /payments/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    /// Source chain transaction pulling the funds, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_transaction: Option<String>,
    /// Destination chain transaction releasing the funds, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_transaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PaymentError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<UnixTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<UnixTimestamp>,
}

impl Payment {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Human-readable reason for a failed payment.
    pub fn failure_reason(&self) -> String {
        match &self.error {
            Some(error) => error.to_string(),
            None => format!("payment ended with status {}", self.status),
        }
    }
}

/// Body of `POST /payments`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest<'a> {
    pub payment_intent: &'a PaymentIntent,
}

/// Response of `POST /payments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub id: String,
    pub status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!PaymentStatus::Scheduled.is_terminal());
        assert!(!PaymentStatus::Processing.is_terminal());
        assert!(!PaymentStatus::ReleasedToGateway.is_terminal());
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_payment_deserializes_with_error_detail() {
        let payment: Payment = serde_json::from_value(serde_json::json!({
            "id": "pay_1",
            "status": "FAILED",
            "error": {"code": "INSUFFICIENT_FUNDS", "message": "balance too low"},
            "updatedAt": "1700000000"
        }))
        .unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(
            payment.failure_reason(),
            "INSUFFICIENT_FUNDS: balance too low"
        );
        assert_eq!(
            payment.updated_at,
            Some(UnixTimestamp::from_secs(1_700_000_000))
        );
    }

    #[test]
    fn test_released_to_gateway_wire_name() {
        let status: PaymentStatus = serde_json::from_str("\"RELEASED_TO_GATEWAY\"").unwrap();
        assert_eq!(status, PaymentStatus::ReleasedToGateway);
        assert_eq!(status.to_string(), "RELEASED_TO_GATEWAY");
    }
}
