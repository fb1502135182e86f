//! Single-token legacy permits.
//!
//! Tokens that predate Permit2 need a one-off approval of the Permit2 contract
//! before a batch permit can be settled. When the token supports an off-chain
//! permit, that approval is signed here instead of sent as a transaction.
//! Which permit shape applies comes from the registry's static table:
//!
//! - [`LegacyPermitKind::Eip2612`]: `Permit(owner, spender, value, nonce, deadline)`,
//!   domain name and version read from the token.
//! - [`LegacyPermitKind::DaiLike`]: `Permit(holder, spender, nonce, expiry, allowed)`,
//!   domain version fixed to `"1"`.
//! - [`LegacyPermitKind::Unsupported`]: batch permit only.

use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::eip712_domain;
use futures_util::FutureExt;
use futures_util::future::join;

use crate::chain::ledger::ILegacyPermitToken;
use crate::chain::{Eip155TokenDeployment, LedgerQuery, LegacyPermitKind, first_ok, read_view};
use crate::error::AuthorizationError;
use crate::permit::{AuthorizationPayload, PERMIT2_ADDRESS};
use crate::signer::SignerLike;
use payintent_types::timestamp::UnixTimestamp;

/// Domain name used when the token does not expose `name()`.
pub const FALLBACK_TOKEN_NAME: &str = "Unknown Token";
/// Domain version used when the token does not expose `version()`.
pub const FALLBACK_TOKEN_VERSION: &str = "1";

pub mod eip2612 {
    use alloy_sol_types::sol;
    use serde::{Deserialize, Serialize};

    sol! {
        /// EIP-2612 permit.
        #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
        struct Permit {
            address owner;
            address spender;
            uint256 value;
            uint256 nonce;
            uint256 deadline;
        }
    }
}

pub mod dai {
    use alloy_sol_types::sol;
    use serde::{Deserialize, Serialize};

    sol! {
        /// DAI-style permit: an unlimited approval toggled by `allowed`.
        #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
        struct Permit {
            address holder;
            address spender;
            uint256 nonce;
            uint256 expiry;
            bool allowed;
        }
    }
}

/// Inputs of [`build_legacy_permit`].
#[derive(Debug, Clone)]
pub struct LegacyPermitRequest {
    pub owner: Address,
    /// Defaults to the Permit2 contract.
    pub spender: Option<Address>,
    /// Approved amount. Ignored by DAI-style permits, which approve without limit.
    pub value: U256,
    /// Read from the token when absent.
    pub nonce: Option<U256>,
    pub deadline: UnixTimestamp,
}

/// A legacy permit payload in one of the supported shapes.
#[derive(Debug, Clone)]
pub enum LegacyPermit {
    Eip2612(AuthorizationPayload<eip2612::Permit>),
    DaiLike(AuthorizationPayload<dai::Permit>),
}

impl LegacyPermit {
    pub fn kind(&self) -> LegacyPermitKind {
        match self {
            LegacyPermit::Eip2612(_) => LegacyPermitKind::Eip2612,
            LegacyPermit::DaiLike(_) => LegacyPermitKind::DaiLike,
        }
    }

    pub fn nonce(&self) -> U256 {
        match self {
            LegacyPermit::Eip2612(payload) => payload.message.nonce,
            LegacyPermit::DaiLike(payload) => payload.message.nonce,
        }
    }

    pub fn signing_hash(&self) -> B256 {
        match self {
            LegacyPermit::Eip2612(payload) => payload.signing_hash(),
            LegacyPermit::DaiLike(payload) => payload.signing_hash(),
        }
    }

    pub fn typed_data(&self) -> TypedData {
        match self {
            LegacyPermit::Eip2612(payload) => payload.typed_data(),
            LegacyPermit::DaiLike(payload) => payload.typed_data(),
        }
    }

    pub async fn sign<S>(&self, signer: &S) -> Result<Bytes, AuthorizationError>
    where
        S: SignerLike + ?Sized,
    {
        match self {
            LegacyPermit::Eip2612(payload) => payload.sign(signer).await,
            LegacyPermit::DaiLike(payload) => payload.sign(signer).await,
        }
    }
}

/// Reads the owner's permit nonce, trying `nonces(owner)` then `getNonce(owner)`.
pub async fn read_permit_nonce<L>(
    ledger: &L,
    token: Address,
    owner: Address,
) -> Result<U256, AuthorizationError>
where
    L: LedgerQuery + ?Sized,
{
    let probes = vec![
        read_view(ledger, token, ILegacyPermitToken::noncesCall { owner }).boxed(),
        read_view(ledger, token, ILegacyPermitToken::getNonceCall { owner }).boxed(),
    ];
    first_ok(probes).await.map_err(|errors| {
        let reason = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        AuthorizationError::NonceUnavailable {
            token: token.to_checksum(None),
            owner: owner.to_checksum(None),
            reason,
        }
    })
}

async fn read_name<L: LedgerQuery + ?Sized>(ledger: &L, token: Address) -> String {
    read_view(ledger, token, ILegacyPermitToken::nameCall {})
        .await
        .unwrap_or_else(|_e| {
            #[cfg(feature = "telemetry")]
            tracing::debug!(%token, error = %_e, "name() unavailable, using fallback domain name");
            FALLBACK_TOKEN_NAME.to_string()
        })
}

async fn read_version<L: LedgerQuery + ?Sized>(ledger: &L, token: Address) -> String {
    read_view(ledger, token, ILegacyPermitToken::versionCall {})
        .await
        .unwrap_or_else(|_e| {
            #[cfg(feature = "telemetry")]
            tracing::debug!(
                %token,
                error = %_e,
                "version() unavailable, using fallback domain version"
            );
            FALLBACK_TOKEN_VERSION.to_string()
        })
}

/// Builds the legacy permit payload for `token`, dispatching on its permit variant.
///
/// Reads the nonce (unless given) and the domain parameters from the token
/// through `ledger`.
pub async fn build_legacy_permit<L>(
    ledger: &L,
    network: &str,
    token: &Eip155TokenDeployment,
    request: &LegacyPermitRequest,
) -> Result<LegacyPermit, AuthorizationError>
where
    L: LedgerQuery + ?Sized,
{
    let spender = request.spender.unwrap_or(PERMIT2_ADDRESS);
    let chain_id = token.chain_reference.inner();
    let deadline = U256::from(request.deadline.as_secs());
    match token.permit {
        LegacyPermitKind::Unsupported => Err(AuthorizationError::PermitNotSupported {
            token: token.symbol.clone(),
            network: network.to_string(),
        }),
        LegacyPermitKind::Eip2612 => {
            let nonce = match request.nonce {
                Some(nonce) => nonce,
                None => read_permit_nonce(ledger, token.address, request.owner).await?,
            };
            let (name, version) = join(
                read_name(ledger, token.address),
                read_version(ledger, token.address),
            )
            .await;
            let domain = eip712_domain! {
                name: name,
                version: version,
                chain_id: chain_id,
                verifying_contract: token.address,
            };
            let message = eip2612::Permit {
                owner: request.owner,
                spender,
                value: request.value,
                nonce,
                deadline,
            };
            Ok(LegacyPermit::Eip2612(AuthorizationPayload::new(
                domain, message,
            )))
        }
        LegacyPermitKind::DaiLike => {
            let nonce = match request.nonce {
                Some(nonce) => nonce,
                None => read_permit_nonce(ledger, token.address, request.owner).await?,
            };
            let name = read_name(ledger, token.address).await;
            let domain = eip712_domain! {
                name: name,
                version: FALLBACK_TOKEN_VERSION,
                chain_id: chain_id,
                verifying_contract: token.address,
            };
            let message = dai::Permit {
                holder: request.owner,
                spender,
                nonce,
                expiry: deadline,
                allowed: true,
            };
            Ok(LegacyPermit::DaiLike(AuthorizationPayload::new(
                domain, message,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ledger::tests::FakeLedger;
    use crate::registry::Registry;

    fn request(nonce: Option<U256>) -> LegacyPermitRequest {
        LegacyPermitRequest {
            owner: Address::repeat_byte(0x33),
            spender: None,
            value: U256::from(10_000_000u64),
            nonce,
            deadline: UnixTimestamp::from_secs(1_900_000_000),
        }
    }

    #[tokio::test]
    async fn test_dai_on_ethereum_uses_holder_shape() {
        let ledger = FakeLedger::default()
            .with_nonces(3)
            .with_name("Dai Stablecoin");
        let token = Registry::builtin().get_token("DAI", "ethereum").unwrap();
        let permit = build_legacy_permit(&ledger, "ethereum", token, &request(None))
            .await
            .unwrap();
        let LegacyPermit::DaiLike(payload) = &permit else {
            panic!("expected a DAI-style permit, got {:?}", permit.kind());
        };
        assert_eq!(payload.message.holder, Address::repeat_byte(0x33));
        assert_eq!(payload.message.spender, PERMIT2_ADDRESS);
        assert_eq!(payload.message.nonce, U256::from(3u8));
        assert_eq!(payload.message.expiry, U256::from(1_900_000_000u64));
        assert!(payload.message.allowed);
        assert_eq!(payload.domain.name.as_deref(), Some("Dai Stablecoin"));
        assert_eq!(payload.domain.version.as_deref(), Some("1"));
        assert_eq!(payload.domain.chain_id, Some(U256::from(1u8)));

        let typed = permit.typed_data();
        let json = serde_json::to_value(&typed).unwrap();
        let fields = json["types"]["Permit"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(fields, ["holder", "spender", "nonce", "expiry", "allowed"]);
    }

    #[tokio::test]
    async fn test_usdc_uses_eip2612_shape_with_onchain_domain() {
        let ledger = FakeLedger::default()
            .with_nonces(0)
            .with_name("USD Coin")
            .with_version("2");
        let token = Registry::builtin().get_token("USDC", "base").unwrap();
        let permit = build_legacy_permit(&ledger, "base", token, &request(None))
            .await
            .unwrap();
        let LegacyPermit::Eip2612(payload) = &permit else {
            panic!("expected an EIP-2612 permit, got {:?}", permit.kind());
        };
        assert_eq!(payload.message.owner, Address::repeat_byte(0x33));
        assert_eq!(payload.message.value, U256::from(10_000_000u64));
        assert_eq!(payload.domain.name.as_deref(), Some("USD Coin"));
        assert_eq!(payload.domain.version.as_deref(), Some("2"));
        assert_eq!(payload.domain.verifying_contract, Some(token.address));

        let json = serde_json::to_value(permit.typed_data()).unwrap();
        let fields = json["types"]["Permit"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(fields, ["owner", "spender", "value", "nonce", "deadline"]);
    }

    #[tokio::test]
    async fn test_domain_falls_back_when_accessors_missing() {
        let ledger = FakeLedger::default().with_nonces(1);
        let token = Registry::builtin().get_token("USDC", "polygon").unwrap();
        let LegacyPermit::Eip2612(payload) =
            build_legacy_permit(&ledger, "polygon", token, &request(None))
                .await
                .unwrap()
        else {
            panic!("expected an EIP-2612 permit");
        };
        assert_eq!(payload.domain.name.as_deref(), Some(FALLBACK_TOKEN_NAME));
        assert_eq!(payload.domain.version.as_deref(), Some(FALLBACK_TOKEN_VERSION));
    }

    #[tokio::test]
    async fn test_nonce_falls_back_to_get_nonce() {
        let ledger = FakeLedger::default().with_get_nonce(9);
        let nonce = read_permit_nonce(&ledger, Address::ZERO, Address::repeat_byte(1))
            .await
            .unwrap();
        assert_eq!(nonce, U256::from(9u8));
    }

    #[tokio::test]
    async fn test_nonce_unavailable_when_no_accessor_responds() {
        let ledger = FakeLedger::default();
        let token = Registry::builtin().get_token("USDC", "base").unwrap();
        let result = build_legacy_permit(&ledger, "base", token, &request(None)).await;
        assert!(matches!(
            result,
            Err(AuthorizationError::NonceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_supplied_nonce_skips_ledger() {
        let ledger = FakeLedger::default();
        let token = Registry::builtin().get_token("DAI", "ethereum").unwrap();
        let request = request(Some(U256::from(5u8)));
        let permit = build_legacy_permit(&ledger, "ethereum", token, &request)
            .await
            .unwrap();
        assert_eq!(permit.nonce(), U256::from(5u8));
    }

    #[tokio::test]
    async fn test_batch_only_token_rejected() {
        let ledger = FakeLedger::default().with_nonces(0);
        let token = Registry::builtin().get_token("USDT", "ethereum").unwrap();
        let result = build_legacy_permit(&ledger, "ethereum", token, &request(None)).await;
        assert!(matches!(
            result,
            Err(AuthorizationError::PermitNotSupported { .. })
        ));
    }
}
