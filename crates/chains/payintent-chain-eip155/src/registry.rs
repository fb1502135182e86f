//! Static network and token lookup tables.
//!
//! The registry answers two questions for the payload builders:
//!
//! - network key → chain id, gateway contract address, RPC endpoint
//! - (token symbol, network key) → token contract address, decimals, legacy permit variant
//!
//! The built-in tables are immutable and shared process-wide. A [`Registry`]
//! value starts as a copy of them and can be extended or overridden (gateway
//! address, RPC endpoint) before it is handed to an authorizer. Pinning a
//! registry to an [`Environment`] hides the networks of the other one.

use alloy_primitives::{Address, address};
use payintent_types::config::{Environment, LiteralOrEnv, RpcConfig};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use url::Url;

use crate::chain::{
    Eip155ChainReference, Eip155TokenDeployment, LegacyPermitKind, ProviderLedger,
};

/// Gateway contract pulling funds on the source network.
///
/// Deployed with CREATE2, so the address is the same on every supported network.
pub const DEFAULT_GATEWAY_ADDRESS: Address = address!("0x5a7e0c3d9b2f4e6a81c0d4f3b2a19e8c7d6f5b40");

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown network {0}")]
    UnknownNetwork(String),
    #[error("Unknown token {symbol} on network {network}")]
    UnknownToken { symbol: String, network: String },
    #[error("Network {network} is not available in the {environment} environment")]
    WrongEnvironment {
        network: String,
        environment: Environment,
    },
}

/// A supported EVM network.
#[derive(Debug, Clone, PartialEq)]
pub struct Eip155Network {
    /// Network key used in payment intents, e.g. `base-sepolia`.
    pub key: String,
    pub chain_reference: Eip155ChainReference,
    /// Gateway contract, the spender of batch permits signed on this network.
    pub gateway: Address,
    pub rpc: RpcConfig,
    /// Reachable only from the testnet environment.
    pub testnet: bool,
}

struct NetworkEntry {
    key: &'static str,
    chain_id: u64,
    rpc_url: &'static str,
    testnet: bool,
}

struct TokenEntry {
    symbol: &'static str,
    network: &'static str,
    address: Address,
    decimals: u8,
    permit: LegacyPermitKind,
}

const NETWORKS: &[NetworkEntry] = &[
    NetworkEntry {
        key: "ethereum",
        chain_id: 1,
        rpc_url: "https://ethereum-rpc.publicnode.com",
        testnet: false,
    },
    NetworkEntry {
        key: "ethereum-sepolia",
        chain_id: 11155111,
        rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
        testnet: true,
    },
    NetworkEntry {
        key: "base",
        chain_id: 8453,
        rpc_url: "https://mainnet.base.org",
        testnet: false,
    },
    NetworkEntry {
        key: "base-sepolia",
        chain_id: 84532,
        rpc_url: "https://sepolia.base.org",
        testnet: true,
    },
    NetworkEntry {
        key: "polygon",
        chain_id: 137,
        rpc_url: "https://polygon-rpc.com",
        testnet: false,
    },
    NetworkEntry {
        key: "polygon-amoy",
        chain_id: 80002,
        rpc_url: "https://rpc-amoy.polygon.technology",
        testnet: true,
    },
    NetworkEntry {
        key: "arbitrum",
        chain_id: 42161,
        rpc_url: "https://arb1.arbitrum.io/rpc",
        testnet: false,
    },
    NetworkEntry {
        key: "arbitrum-sepolia",
        chain_id: 421614,
        rpc_url: "https://sepolia-rollup.arbitrum.io/rpc",
        testnet: true,
    },
    NetworkEntry {
        key: "optimism",
        chain_id: 10,
        rpc_url: "https://mainnet.optimism.io",
        testnet: false,
    },
    NetworkEntry {
        key: "avalanche",
        chain_id: 43114,
        rpc_url: "https://api.avax.network/ext/bc/C/rpc",
        testnet: false,
    },
];

const TOKENS: &[TokenEntry] = &[
    // USDC
    TokenEntry {
        symbol: "USDC",
        network: "ethereum",
        address: address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "USDC",
        network: "ethereum-sepolia",
        address: address!("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "USDC",
        network: "base",
        address: address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "USDC",
        network: "base-sepolia",
        address: address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "USDC",
        network: "polygon",
        address: address!("0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "USDC",
        network: "polygon-amoy",
        address: address!("0x41E94Eb019C0762f9Bfcf9Fb1E58725BfB0e7582"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "USDC",
        network: "arbitrum",
        address: address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "USDC",
        network: "arbitrum-sepolia",
        address: address!("0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "USDC",
        network: "optimism",
        address: address!("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "USDC",
        network: "avalanche",
        address: address!("0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
    // DAI
    TokenEntry {
        symbol: "DAI",
        network: "ethereum",
        address: address!("0x6B175474E89094C44Da98b954EedeAC495271d0F"),
        decimals: 18,
        permit: LegacyPermitKind::DaiLike,
    },
    TokenEntry {
        symbol: "DAI",
        network: "arbitrum",
        address: address!("0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1"),
        decimals: 18,
        permit: LegacyPermitKind::Eip2612,
    },
    TokenEntry {
        symbol: "DAI",
        network: "optimism",
        address: address!("0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1"),
        decimals: 18,
        permit: LegacyPermitKind::Eip2612,
    },
    // USDT
    TokenEntry {
        symbol: "USDT",
        network: "ethereum",
        address: address!("0xdAC17F958D2ee523a2206206994597C13D831ec7"),
        decimals: 6,
        permit: LegacyPermitKind::Unsupported,
    },
    TokenEntry {
        symbol: "USDT",
        network: "polygon",
        address: address!("0xc2132D05D31c914a87C6611C10748AEb04B58e8F"),
        decimals: 6,
        permit: LegacyPermitKind::Unsupported,
    },
    TokenEntry {
        symbol: "USDT",
        network: "arbitrum",
        address: address!("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"),
        decimals: 6,
        permit: LegacyPermitKind::Eip2612,
    },
];

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    let networks = NETWORKS
        .iter()
        .map(|entry| {
            let network = Eip155Network {
                key: entry.key.to_string(),
                chain_reference: Eip155ChainReference::new(entry.chain_id),
                gateway: DEFAULT_GATEWAY_ADDRESS,
                rpc: RpcConfig {
                    http: LiteralOrEnv::from_literal(
                        Url::parse(entry.rpc_url).expect("valid built-in RPC URL"),
                    ),
                    rate_limit: None,
                },
                testnet: entry.testnet,
            };
            (network.key.clone(), network)
        })
        .collect::<HashMap<_, _>>();
    let tokens = TOKENS
        .iter()
        .map(|entry| {
            let chain_id = NETWORKS
                .iter()
                .find(|n| n.key == entry.network)
                .map(|n| n.chain_id)
                .expect("built-in token on a built-in network");
            let deployment = Eip155TokenDeployment {
                symbol: entry.symbol.to_string(),
                chain_reference: Eip155ChainReference::new(chain_id),
                address: entry.address,
                decimals: entry.decimals,
                permit: entry.permit,
            };
            (token_key(entry.symbol, entry.network), deployment)
        })
        .collect::<HashMap<_, _>>();
    Registry {
        networks,
        tokens,
        environment: None,
    }
});

fn token_key(symbol: &str, network: &str) -> (String, String) {
    (symbol.to_ascii_uppercase(), network.to_string())
}

/// Network and token lookup tables.
#[derive(Debug, Clone)]
pub struct Registry {
    networks: HashMap<String, Eip155Network>,
    tokens: HashMap<(String, String), Eip155TokenDeployment>,
    environment: Option<Environment>,
}

impl Default for Registry {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl Registry {
    /// The immutable built-in tables.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    /// Restricts lookups to the networks of `environment`.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn environment(&self) -> Option<Environment> {
        self.environment
    }

    pub fn get_network(&self, key: &str) -> Result<&Eip155Network, RegistryError> {
        let network = self
            .networks
            .get(key)
            .ok_or_else(|| RegistryError::UnknownNetwork(key.to_string()))?;
        match self.environment {
            Some(environment) if environment.is_testnet() != network.testnet => {
                Err(RegistryError::WrongEnvironment {
                    network: key.to_string(),
                    environment,
                })
            }
            _ => Ok(network),
        }
    }

    /// Looks up a token by symbol (case-insensitive) on a network.
    pub fn get_token(
        &self,
        symbol: &str,
        network: &str,
    ) -> Result<&Eip155TokenDeployment, RegistryError> {
        self.get_network(network)?;
        self.tokens
            .get(&token_key(symbol, network))
            .ok_or_else(|| RegistryError::UnknownToken {
                symbol: symbol.to_string(),
                network: network.to_string(),
            })
    }

    /// The legacy permit variant of a token.
    pub fn permit_kind(
        &self,
        symbol: &str,
        network: &str,
    ) -> Result<LegacyPermitKind, RegistryError> {
        self.get_token(symbol, network).map(|token| token.permit)
    }

    pub fn networks(&self) -> impl Iterator<Item = &Eip155Network> {
        self.networks.values()
    }

    pub fn insert_network(&mut self, network: Eip155Network) {
        self.networks.insert(network.key.clone(), network);
    }

    /// Adds or replaces a token deployment on `network`.
    ///
    /// The deployment takes the chain id of `network`.
    pub fn insert_token(
        &mut self,
        network: &str,
        mut token: Eip155TokenDeployment,
    ) -> Result<(), RegistryError> {
        token.chain_reference = self.get_network(network)?.chain_reference;
        self.tokens.insert(token_key(&token.symbol, network), token);
        Ok(())
    }

    pub fn with_gateway(mut self, network: &str, gateway: Address) -> Result<Self, RegistryError> {
        let entry = self
            .networks
            .get_mut(network)
            .ok_or_else(|| RegistryError::UnknownNetwork(network.to_string()))?;
        entry.gateway = gateway;
        Ok(self)
    }

    /// Replaces the RPC endpoints of the networks named in `overrides`.
    pub fn with_rpc_overrides(
        mut self,
        overrides: &BTreeMap<String, RpcConfig>,
    ) -> Result<Self, RegistryError> {
        for (key, rpc) in overrides {
            let entry = self
                .networks
                .get_mut(key)
                .ok_or_else(|| RegistryError::UnknownNetwork(key.clone()))?;
            entry.rpc = rpc.clone();
        }
        Ok(self)
    }

    /// A ledger connected to the network's RPC endpoint.
    pub fn ledger(&self, network: &str) -> Result<ProviderLedger, RegistryError> {
        let network = self.get_network(network)?;
        Ok(ProviderLedger::from_config(
            network.chain_reference,
            &network.rpc,
        ))
    }
}
