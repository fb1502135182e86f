//! Read-only contract calls against an EVM ledger.
//!
//! Legacy permits need a few values only the token contract knows: the
//! owner's permit nonce and the EIP-712 domain name and version. They are
//! read through the [`LedgerQuery`] capability, which keeps the payload
//! builders independent of any particular RPC stack. [`ProviderLedger`] is
//! the production implementation over an alloy [`RootProvider`].

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::{SolCall, sol};
use alloy_transport::layers::ThrottleLayer;
use alloy_transport_http::Http;
use async_trait::async_trait;
use payintent_types::config::RpcConfig;
use tower::ServiceBuilder;
use url::Url;

use crate::chain::types::Eip155ChainReference;

sol! {
    /// View functions probed on tokens with a legacy permit.
    #[allow(missing_docs)]
    interface ILegacyPermitToken {
        function nonces(address owner) external view returns (uint256);
        function getNonce(address owner) external view returns (uint256);
        function name() external view returns (string);
        function version() external view returns (string);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("eth_call to {contract} failed: {reason}")]
    Call { contract: Address, reason: String },
    #[error("Could not decode return data of {function} from {contract}: {reason}")]
    Decode {
        contract: Address,
        function: &'static str,
        reason: String,
    },
}

/// Capability to execute a read-only call against a contract.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Executes `eth_call` with raw calldata and returns the raw return data.
    async fn read_view_call(&self, contract: Address, input: Bytes) -> Result<Bytes, LedgerError>;
}

/// Encodes `call`, executes it through `ledger`, and decodes the return value.
pub async fn read_view<L, C>(
    ledger: &L,
    contract: Address,
    call: C,
) -> Result<C::Return, LedgerError>
where
    L: LedgerQuery + ?Sized,
    C: SolCall + Send,
{
    let output = ledger
        .read_view_call(contract, call.abi_encode().into())
        .await?;
    C::abi_decode_returns(&output).map_err(|e| LedgerError::Decode {
        contract,
        function: C::SIGNATURE,
        reason: e.to_string(),
    })
}

#[async_trait]
impl<T: LedgerQuery + ?Sized> LedgerQuery for std::sync::Arc<T> {
    async fn read_view_call(&self, contract: Address, input: Bytes) -> Result<Bytes, LedgerError> {
        (**self).read_view_call(contract, input).await
    }
}

/// [`LedgerQuery`] over a JSON-RPC HTTP endpoint.
#[derive(Debug, Clone)]
pub struct ProviderLedger {
    chain: Eip155ChainReference,
    inner: RootProvider,
}

impl ProviderLedger {
    /// Connects to `rpc_url`, throttled to `rate_limit` requests per second when set.
    ///
    /// No request is made until the first call.
    pub fn new(chain: Eip155ChainReference, rpc_url: Url, rate_limit: Option<u32>) -> Self {
        #[cfg(feature = "telemetry")]
        tracing::info!(
            chain = %chain,
            rpc_url = %rpc_url,
            rate_limit = ?rate_limit,
            "Using HTTP transport"
        );
        let rate_limit = rate_limit.unwrap_or(u32::MAX);
        let service = ServiceBuilder::new()
            .layer(ThrottleLayer::new(rate_limit))
            .service(Http::new(rpc_url));
        let client = RpcClient::new(service, false);
        Self {
            chain,
            inner: RootProvider::new(client),
        }
    }

    pub fn from_config(chain: Eip155ChainReference, config: &RpcConfig) -> Self {
        Self::new(chain, config.http.inner().clone(), config.rate_limit)
    }
}

#[async_trait]
impl LedgerQuery for ProviderLedger {
    async fn read_view_call(&self, contract: Address, input: Bytes) -> Result<Bytes, LedgerError> {
        let tx = TransactionRequest::default()
            .with_to(contract)
            .with_input(input);
        self.inner
            .call(tx)
            .await
            .map_err(|e| LedgerError::Call {
                contract,
                reason: format!("{} on {}", e, self.chain),
            })
    }
}
