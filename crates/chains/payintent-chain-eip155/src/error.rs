use alloy_primitives::U256;

use crate::registry::RegistryError;

/// Errors raised while building or signing an authorization payload.
///
/// None of these are retried locally: a failed payload build aborts the
/// authorization. The corridor fee quote is the only step with a local
/// fallback, and its failure never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    #[error("Unsupported network or token: {0}")]
    UnsupportedNetworkOrToken(#[from] RegistryError),
    #[error("Token {token} on {network} has no legacy permit, use the batch permit only")]
    PermitNotSupported { token: String, network: String },
    #[error("Could not read a permit nonce for {owner} from token {token}: {reason}")]
    NonceUnavailable {
        token: String,
        owner: String,
        reason: String,
    },
    #[error(
        "Fee split does not reconcile: payee {payee} + operator {operator_fee} + gateway {gateway_fee} != gross {gross}"
    )]
    AmountReconciliation {
        gross: U256,
        payee: U256,
        operator_fee: U256,
        gateway_fee: U256,
    },
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

impl AuthorizationError {
    pub fn invalid(field: &'static str, reason: impl ToString) -> Self {
        AuthorizationError::InvalidField {
            field,
            reason: reason.to_string(),
        }
    }
}
