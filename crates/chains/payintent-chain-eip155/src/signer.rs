//! Signer capability and the typed-data signing façade.
//!
//! Signers come in two shapes: wallets that sign EIP-712 typed data natively,
//! and raw key holders that only sign a 32-byte digest. [`sign_typed_data`]
//! accepts either. Without native support it computes
//! `keccak256(0x19 0x01 ‖ domainSeparator ‖ structHash)` itself and asks for a
//! digest signature, which yields the same bytes as the native path.

use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, B256, Bytes, Signature, keccak256};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::error::AuthorizationError;

/// A trait that abstracts signing operations, allowing both owned signers and Arc-wrapped signers.
#[async_trait]
pub trait SignerLike: Send + Sync {
    /// Returns the address of the signer.
    fn address(&self) -> Address;

    /// Signs the given digest.
    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error>;

    /// Whether [`SignerLike::sign_typed_data`] is implemented natively.
    fn supports_typed_data(&self) -> bool {
        false
    }

    /// Signs EIP-712 typed data.
    async fn sign_typed_data(
        &self,
        _payload: &TypedData,
    ) -> Result<Signature, alloy_signer::Error> {
        Err(alloy_signer::Error::other(
            "signer does not support EIP-712 typed data",
        ))
    }
}

#[async_trait]
impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }

    fn supports_typed_data(&self) -> bool {
        true
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_dynamic_typed_data(self, payload).await
    }
}

#[async_trait]
impl<T: SignerLike + ?Sized> SignerLike for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_hash(hash).await
    }

    fn supports_typed_data(&self) -> bool {
        (**self).supports_typed_data()
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_typed_data(payload).await
    }
}

/// Exposes only digest signing of the wrapped signer.
///
/// Wrap hardware or remote signers whose typed-data endpoint is unreliable,
/// or force the manual digest path in tests.
#[derive(Debug, Clone)]
pub struct HashOnlySigner<S>(pub S);

#[async_trait]
impl<S: SignerLike> SignerLike for HashOnlySigner<S> {
    fn address(&self) -> Address {
        self.0.address()
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        self.0.sign_hash(hash).await
    }
}

/// `keccak256(0x19 0x01 ‖ domainSeparator ‖ structHash)`.
pub fn eip712_digest(domain_separator: B256, struct_hash: B256) -> B256 {
    let mut preimage = [0u8; 66];
    preimage[0] = 0x19;
    preimage[1] = 0x01;
    preimage[2..34].copy_from_slice(domain_separator.as_slice());
    preimage[34..].copy_from_slice(struct_hash.as_slice());
    keccak256(preimage)
}

/// Computes the EIP-712 signing digest of `payload` from its parts.
pub fn typed_data_digest(payload: &TypedData) -> Result<B256, AuthorizationError> {
    let struct_hash = payload
        .hash_struct()
        .map_err(|e| AuthorizationError::SigningFailed(format!("cannot hash typed data: {e}")))?;
    Ok(eip712_digest(payload.domain().separator(), struct_hash))
}

/// Signs `payload` and returns the 65-byte `r ‖ s ‖ v` signature.
///
/// Uses the signer's native typed-data support when advertised, otherwise
/// signs the manually computed digest.
#[cfg_attr(
    feature = "telemetry",
    instrument(
        name = "payintent.sign_typed_data",
        skip_all,
        err,
        fields(signer = %signer.address(), primary_type = %payload.primary_type)
    )
)]
pub async fn sign_typed_data<S>(
    signer: &S,
    payload: &TypedData,
) -> Result<Bytes, AuthorizationError>
where
    S: SignerLike + ?Sized,
{
    let signature = if signer.supports_typed_data() {
        signer.sign_typed_data(payload).await
    } else {
        let digest = typed_data_digest(payload)?;
        signer.sign_hash(&digest).await
    }
    .map_err(|e| AuthorizationError::SigningFailed(e.to_string()))?;
    Ok(Bytes::copy_from_slice(&signature.as_bytes()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy_sol_types::{SolStruct, eip712_domain, sol};

    pub const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    pub fn test_signer() -> PrivateKeySigner {
        TEST_PRIVATE_KEY.parse().unwrap()
    }

    sol! {
        #[derive(serde::Serialize)]
        struct Mail {
            address to;
            string contents;
        }
    }

    fn mail_typed_data() -> (Mail, alloy_sol_types::Eip712Domain, TypedData) {
        let domain = eip712_domain! {
            name: "Mailer",
            version: "1",
            chain_id: 1,
            verifying_contract: Address::repeat_byte(0x11),
        };
        let mail = Mail {
            to: Address::repeat_byte(0x22),
            contents: "hello".to_string(),
        };
        let typed = TypedData::from_struct(&mail, Some(domain.clone()));
        (mail, domain, typed)
    }

    #[test]
    fn test_manual_digest_matches_struct_hash() {
        let (mail, domain, typed) = mail_typed_data();
        assert_eq!(
            typed_data_digest(&typed).unwrap(),
            mail.eip712_signing_hash(&domain)
        );
        assert_eq!(
            typed_data_digest(&typed).unwrap(),
            typed.eip712_signing_hash().unwrap()
        );
    }

    #[tokio::test]
    async fn test_native_and_fallback_signatures_identical() {
        let (_, _, typed) = mail_typed_data();
        let signer = test_signer();
        let native = sign_typed_data(&signer, &typed).await.unwrap();
        let fallback = sign_typed_data(&HashOnlySigner(signer.clone()), &typed)
            .await
            .unwrap();
        assert_eq!(native.len(), 65);
        assert_eq!(native, fallback);
    }

    #[tokio::test]
    async fn test_arc_signer_delegates() {
        let (_, _, typed) = mail_typed_data();
        let signer = Arc::new(test_signer());
        assert!(signer.supports_typed_data());
        let signature = sign_typed_data(&signer, &typed).await.unwrap();
        let recovered = Signature::try_from(signature.as_ref())
            .unwrap()
            .recover_address_from_prehash(&typed.eip712_signing_hash().unwrap())
            .unwrap();
        assert_eq!(recovered, signer.address());
    }

    struct FailingSigner;

    #[async_trait]
    impl SignerLike for FailingSigner {
        fn address(&self) -> Address {
            Address::ZERO
        }

        async fn sign_hash(&self, _hash: &B256) -> Result<Signature, alloy_signer::Error> {
            Err(alloy_signer::Error::other("device disconnected"))
        }
    }

    #[tokio::test]
    async fn test_signer_failure_is_signing_failed() {
        let (_, _, typed) = mail_typed_data();
        let err = sign_typed_data(&FailingSigner, &typed).await.unwrap_err();
        match err {
            AuthorizationError::SigningFailed(reason) => {
                assert!(reason.contains("device disconnected"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
