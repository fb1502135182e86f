//! EVM value types shared by the registry and the payload builders.

use alloy_primitives::{Address, B256, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::AuthorizationError;

/// An Ethereum address that serializes with EIP-55 checksum encoding.
///
/// Addresses end up inside EIP-712 hash inputs and in the JSON typed data
/// handed to wallets, so they are always rendered in one canonical case.
///
/// # Example
///
/// ```
/// use payintent_chain_eip155::chain::ChecksummedAddress;
///
/// let addr: ChecksummedAddress = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045".parse().unwrap();
/// assert_eq!(addr.to_string(), "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ChecksummedAddress(pub Address);

impl ChecksummedAddress {
    /// Parses a wire address, naming `field` in the error.
    ///
    /// An empty value is a missing field, anything else that fails to parse
    /// is an invalid one.
    pub fn parse_field(field: &'static str, value: &str) -> Result<Self, AuthorizationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AuthorizationError::MissingRequiredField(field));
        }
        value
            .parse()
            .map_err(|e: hex::FromHexError| AuthorizationError::invalid(field, e))
    }
}

impl FromStr for ChecksummedAddress {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Address::from_str(s)?;
        Ok(Self(address))
    }
}

impl Display for ChecksummedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_checksum(None))
    }
}

impl Serialize for ChecksummedAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_checksum(None))
    }
}

impl<'de> Deserialize<'de> for ChecksummedAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<ChecksummedAddress> for Address {
    fn from(value: ChecksummedAddress) -> Self {
        value.0
    }
}

impl From<Address> for ChecksummedAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

/// Parses a 32-byte `0x`-prefixed identifier, naming `field` in the error.
pub fn parse_bytes32(field: &'static str, value: &str) -> Result<B256, AuthorizationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthorizationError::MissingRequiredField(field));
    }
    B256::from_str(value).map_err(|e| AuthorizationError::invalid(field, e))
}

/// A numeric chain ID for EVM-compatible networks, e.g. `8453` for Base.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Eip155ChainReference(u64);

impl Eip155ChainReference {
    /// Creates a new chain reference from a numeric chain ID.
    pub const fn new(chain_id: u64) -> Self {
        Self(chain_id)
    }

    /// Returns the numeric chain ID.
    pub const fn inner(&self) -> u64 {
        self.0
    }
}

impl Display for Eip155ChainReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single-token approval a token supports besides Permit2.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegacyPermitKind {
    /// `Permit(owner, spender, value, nonce, deadline)` with an on-chain domain name and version.
    Eip2612,
    /// `Permit(holder, spender, nonce, expiry, allowed)` as deployed by DAI.
    DaiLike,
    /// Batch permit only.
    Unsupported,
}

/// A token deployment on an EVM chain.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Eip155TokenDeployment {
    /// Token symbol, e.g. `USDC`.
    pub symbol: String,
    /// The chain this token is deployed on.
    pub chain_reference: Eip155ChainReference,
    /// The token contract address.
    pub address: Address,
    /// Number of decimal places for the token (e.g., 6 for USDC, 18 for DAI).
    pub decimals: u8,
    pub permit: LegacyPermitKind,
}
