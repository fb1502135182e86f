//! EIP-712 authorization payloads.
//!
//! - [`batch`] - Permit2 `PermitBatchWitnessTransferFrom` carrying the payment intent as witness
//! - [`legacy`] - Single-token EIP-2612 and DAI-style permits approving Permit2

use alloy_dyn_abi::{DynSolType, TypedData};
use alloy_primitives::{Address, B256, Bytes, address};
use alloy_sol_types::{Eip712Domain, SolStruct};
use serde::Serialize;
use serde_json::Value;

use crate::error::AuthorizationError;
use crate::signer::{SignerLike, sign_typed_data};

pub mod batch;
pub mod legacy;

pub use batch::*;
pub use legacy::*;

/// The canonical Permit2 contract address, identical on every EVM chain.
pub const PERMIT2_ADDRESS: Address = address!("0x000000000022D473030F116dDEE9F6B43aC78BA3");

/// Permit validity when the intent carries no expiration date.
pub const DEFAULT_DEADLINE_SECS: u64 = 3600;

/// A domain plus a typed message, ready to be hashed or signed.
///
/// Built per signing call and discarded afterwards.
#[derive(Debug, Clone)]
pub struct AuthorizationPayload<T> {
    pub domain: Eip712Domain,
    pub message: T,
}

impl<T> AuthorizationPayload<T>
where
    T: SolStruct + Serialize,
{
    pub fn new(domain: Eip712Domain, message: T) -> Self {
        Self { domain, message }
    }

    /// `keccak256(0x19 0x01 ‖ domainSeparator ‖ hashStruct(message))`.
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.domain)
    }

    /// The JSON typed-data view (`domain`, `types`, `primaryType`, `message`).
    ///
    /// Addresses in `message` are EIP-55 checksummed, as wallets display them.
    pub fn typed_data(&self) -> TypedData {
        let mut typed = TypedData::from_struct(&self.message, Some(self.domain.clone()));
        if let Ok(ty) = typed.resolver.resolve(&typed.primary_type) {
            checksum_addresses(&ty, &mut typed.message);
        }
        typed
    }

    pub async fn sign<S>(&self, signer: &S) -> Result<Bytes, AuthorizationError>
    where
        S: SignerLike + ?Sized,
    {
        sign_typed_data(signer, &self.typed_data()).await
    }
}

/// Rewrites every `address` value in `value` to its checksummed form.
fn checksum_addresses(ty: &DynSolType, value: &mut Value) {
    match (ty, value) {
        (DynSolType::Address, Value::String(text)) => {
            if let Ok(address) = text.parse::<Address>() {
                *text = address.to_checksum(None);
            }
        }
        (DynSolType::Array(inner) | DynSolType::FixedArray(inner, _), Value::Array(items)) => {
            for item in items {
                checksum_addresses(inner, item);
            }
        }
        (DynSolType::CustomStruct { prop_names, tuple, .. }, Value::Object(fields)) => {
            for (name, ty) in prop_names.iter().zip(tuple) {
                if let Some(field) = fields.get_mut(name) {
                    checksum_addresses(ty, field);
                }
            }
        }
        _ => {}
    }
}
