//! The payment intent wire model.
//!
//! A [`PaymentIntent`] describes a one-time or recurring cross-chain payment:
//! who pays, who receives, on which networks and in which tokens, how much,
//! and which operator collects a fee. The client signs it (filling
//! [`PaymentIntent::authorizations`]) and submits it to the clearing service.
//!
//! Addresses are kept as strings here. The chain-specific crates parse and
//! normalize them when building signing payloads, so an empty or malformed
//! address surfaces as a signing error naming the offending field.

use alloy_primitives::{Bytes, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::timestamp::UnixTimestamp;
use crate::util::decimal_u256;

/// Whether the intent is executed once or on a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    OneTime,
    Recurring,
}

impl PaymentType {
    /// Small integer code embedded in the signed witness.
    pub const fn code(&self) -> u8 {
        match self {
            PaymentType::OneTime => 0,
            PaymentType::Recurring => 1,
        }
    }
}

/// The operator facilitating the payment and collecting a fee on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorData {
    /// 32-byte operator identifier, `0x`-prefixed hex.
    pub id: String,
    /// Operator account address.
    pub operator: String,
    /// Address receiving the operator fee leg.
    pub treasury: String,
    /// Operator fee rate in basis points, `0..=10000`.
    pub fee_bps: u16,
    /// Addresses allowed to act on behalf of the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegates: Option<Vec<String>>,
    /// Endpoint notified on status changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<Url>,
}

/// One side of the payment: an account on a network, holding a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDomain {
    /// Account address.
    pub address: String,
    /// Network key, e.g. `base` or `ethereum-sepolia`.
    pub network: String,
    /// Token symbol, e.g. `USDC`.
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
}

/// Recurrence parameters. Passed through to the clearing service untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub interval_unit: IntervalUnit,
    pub interval_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration_count: Option<u32>,
    pub start_date: UnixTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<UnixTimestamp>,
}

/// A signed permit as sent to the clearing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPermit {
    /// 65-byte `r || s || v` signature.
    pub signature: Bytes,
    #[serde(with = "decimal_u256")]
    pub nonce: U256,
    pub deadline: UnixTimestamp,
}

/// Signatures authorizing the token movement of an intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorizations {
    /// Batched Permit2 transfer permit carrying the intent as witness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permit2: Option<SignedPermit>,
    /// Single-token approval of Permit2 for tokens with a legacy permit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_permit: Option<SignedPermit>,
}

impl Authorizations {
    pub fn is_empty(&self) -> bool {
        self.permit2.is_none() && self.legacy_permit.is_none()
    }
}

/// Which party carries the corridor fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeBearer {
    Operator,
    Payee,
    Payer,
    Gateway,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingFees {
    /// Corridor fee amount, decimal string in the source token's whole units.
    pub corridor_fees: Decimal,
    pub charge_bearer: ChargeBearer,
    /// Identifier of an external corridor quote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<String>,
}

/// A JSON-like value stored in [`Metadata`]. Never interpreted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<MetadataValue>),
    Object(BTreeMap<String, MetadataValue>),
}

/// Opaque, ordered passthrough bag.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A declarative cross-chain payment instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub payment_type: PaymentType,
    pub operator_data: OperatorData,
    /// Amount in cents (two implied decimals), not in token units.
    pub amount: u64,
    pub source: AccountDomain,
    pub destination: AccountDomain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_date: Option<UnixTimestamp>,
    /// Becomes the permit deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<UnixTimestamp>,
    #[serde(default, skip_serializing_if = "Authorizations::is_empty")]
    pub authorizations: Authorizations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_fees: Option<ProcessingFees>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl PaymentIntent {
    /// Returns the quote id when the payer carries an externally quoted corridor fee.
    pub fn payer_quote_id(&self) -> Option<&str> {
        let fees = self.processing_fees.as_ref()?;
        if fees.charge_bearer != ChargeBearer::Payer {
            return None;
        }
        fees.quote_id.as_deref()
    }

    /// Returns the intent with the given authorizations attached.
    pub fn with_authorizations(mut self, authorizations: Authorizations) -> Self {
        self.authorizations = authorizations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn intent_json() -> serde_json::Value {
        serde_json::json!({
            "paymentType": "RECURRING",
            "operatorData": {
                "id": "0x0000000000000000000000000000000000000000000000000000000000000001",
                "operator": "0x1111111111111111111111111111111111111111",
                "treasury": "0x2222222222222222222222222222222222222222",
                "feeBps": 50
            },
            "amount": 1000,
            "source": {
                "address": "0x3333333333333333333333333333333333333333",
                "network": "base",
                "token": "USDC"
            },
            "destination": {
                "address": "0x4444444444444444444444444444444444444444",
                "network": "polygon",
                "token": "USDC"
            },
            "schedule": {
                "intervalUnit": "MONTH",
                "intervalCount": 1,
                "startDate": 1700000000
            },
            "expirationDate": 1800000000,
            "processingFees": {
                "corridorFees": "0.25",
                "chargeBearer": "PAYER",
                "quoteId": "q-1"
            },
            "metadata": {
                "order": {"id": 42, "tags": ["a", "b"]},
                "note": null
            }
        })
    }

    #[test]
    fn test_intent_deserializes_wire_format() {
        let intent: PaymentIntent = serde_json::from_value(intent_json()).unwrap();
        assert_eq!(intent.payment_type, PaymentType::Recurring);
        assert_eq!(intent.operator_data.fee_bps, 50);
        assert!(intent.operator_data.webhook_url.is_none());
        assert_eq!(
            intent.processing_fees.as_ref().unwrap().corridor_fees,
            Decimal::from_str("0.25").unwrap()
        );
        assert_eq!(intent.metadata.len(), 2);
        assert_eq!(intent.metadata["note"], MetadataValue::Null);
        assert!(intent.authorizations.is_empty());
    }

    #[test]
    fn test_absent_optionals_are_not_serialized() {
        let mut intent: PaymentIntent = serde_json::from_value(intent_json()).unwrap();
        intent.schedule = None;
        intent.metadata.clear();
        let value = serde_json::to_value(&intent).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("schedule"));
        assert!(!object.contains_key("metadata"));
        assert!(!object.contains_key("authorizations"));
        assert!(!object.contains_key("processingDate"));
    }

    #[test]
    fn test_payer_quote_id_requires_payer_bearer() {
        let mut intent: PaymentIntent = serde_json::from_value(intent_json()).unwrap();
        assert_eq!(intent.payer_quote_id(), Some("q-1"));
        intent.processing_fees.as_mut().unwrap().charge_bearer = ChargeBearer::Operator;
        assert_eq!(intent.payer_quote_id(), None);
    }

    #[test]
    fn test_signed_permit_wire_format() {
        let permit = SignedPermit {
            signature: Bytes::from(vec![0xab; 65]),
            nonce: U256::from(12345u64),
            deadline: UnixTimestamp::from_secs(1_800_000_000),
        };
        let value = serde_json::to_value(&permit).unwrap();
        assert_eq!(value["nonce"], "12345");
        assert_eq!(value["deadline"], 1_800_000_000u64);
        assert!(value["signature"].as_str().unwrap().starts_with("0xabab"));
    }

    #[test]
    fn test_payment_type_codes() {
        assert_eq!(PaymentType::OneTime.code(), 0);
        assert_eq!(PaymentType::Recurring.code(), 1);
    }
}
