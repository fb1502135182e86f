//! Client configuration.
//!
//! [`ClientConfig`] is loaded from JSON and validated eagerly: every
//! constructor in the client crates calls [`ClientConfig::validate`] so an
//! out-of-range value fails at startup, not at the first request.
//!
//! # Environment Variable Resolution
//!
//! The [`LiteralOrEnv`] wrapper type allows configuration values to be specified
//! either as literal values or as references to environment variables:
//!
//! ```json
//! {
//!   "environment": "testnet",
//!   "apiKey": "$PAYINTENT_API_KEY",
//!   "rpc": {
//!     "base-sepolia": { "http": "${BASE_SEPOLIA_RPC}", "rateLimit": 20 }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::ops::{Deref, DerefMut, RangeInclusive};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MAINNET_API_URL: &str = "https://api.payintent.io/v1/";
pub const DEFAULT_TESTNET_API_URL: &str = "https://api.sandbox.payintent.io/v1/";

const TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 1..=300;
const MAX_RETRIES_RANGE: RangeInclusive<u32> = 0..=10;
const POLL_INTERVAL_SECS_RANGE: RangeInclusive<u64> = 1..=60;
const POLL_TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 1..=86_400;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("Invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Which deployment of the clearing service to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    #[default]
    Testnet,
}

impl Environment {
    pub fn default_api_url(&self) -> &'static str {
        match self {
            Environment::Mainnet => DEFAULT_MAINNET_API_URL,
            Environment::Testnet => DEFAULT_TESTNET_API_URL,
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(self, Environment::Testnet)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Mainnet => "mainnet",
            Environment::Testnet => "testnet",
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RPC provider configuration for a single network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RpcConfig {
    /// HTTP URL for the RPC endpoint.
    pub http: LiteralOrEnv<Url>,
    /// Rate limit for requests per second (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default)]
    pub environment: Environment,
    pub api_key: LiteralOrEnv<String>,
    /// Overrides the environment's default API URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<LiteralOrEnv<Url>>,
    /// RPC endpoints keyed by network key, overriding the registry defaults.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rpc: BTreeMap<String, RpcConfig>,
    #[serde(default = "config_defaults::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "config_defaults::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "config_defaults::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "config_defaults::default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

mod config_defaults {
    pub fn default_timeout_secs() -> u64 {
        30
    }

    pub fn default_max_retries() -> u32 {
        3
    }

    pub fn default_poll_interval_secs() -> u64 {
        2
    }

    pub fn default_poll_timeout_secs() -> u64 {
        1200
    }
}

fn check_range<T>(
    field: &'static str,
    value: T,
    range: RangeInclusive<T>,
) -> Result<(), ConfigError>
where
    T: PartialOrd + Copy + Into<u64>,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value.into(),
            min: (*range.start()).into(),
            max: (*range.end()).into(),
        })
    }
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but the API key.
    pub fn new(environment: Environment, api_key: impl Into<String>) -> Self {
        Self {
            environment,
            api_key: LiteralOrEnv::from_literal(api_key.into()),
            api_url: None,
            rpc: BTreeMap::new(),
            timeout_secs: config_defaults::default_timeout_secs(),
            max_retries: config_defaults::default_max_retries(),
            poll_interval_secs: config_defaults::default_poll_interval_secs(),
            poll_timeout_secs: config_defaults::default_poll_timeout_secs(),
        }
    }

    /// Loads and validates a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: display.clone(),
            source,
        })?;
        let config: ClientConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: display,
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every bounded field, naming the first offender and its legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Empty { field: "apiKey" });
        }
        check_range("timeoutSecs", self.timeout_secs, TIMEOUT_SECS_RANGE)?;
        check_range("maxRetries", self.max_retries, MAX_RETRIES_RANGE)?;
        check_range(
            "pollIntervalSecs",
            self.poll_interval_secs,
            POLL_INTERVAL_SECS_RANGE,
        )?;
        check_range(
            "pollTimeoutSecs",
            self.poll_timeout_secs,
            POLL_TIMEOUT_SECS_RANGE,
        )?;
        Ok(())
    }

    /// The API base URL, from the override or the environment default.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        match &self.api_url {
            Some(url) => Ok(url.inner().clone()),
            None => Url::parse(self.environment.default_api_url()).map_err(|source| {
                ConfigError::InvalidUrl {
                    field: "apiUrl",
                    source,
                }
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Number of polls that fit in the configured poll timeout.
    pub fn poll_max_attempts(&self) -> u32 {
        let attempts = self.poll_timeout_secs.div_ceil(self.poll_interval_secs.max(1));
        u32::try_from(attempts).unwrap_or(u32::MAX)
    }
}

// ============================================================================
// Environment Variable Resolution
// ============================================================================

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"sk_test_123"`
/// - Simple env var: `"$PAYINTENT_API_KEY"`
/// - Braced env var: `"${PAYINTENT_API_KEY}"`
///
/// The wrapper implements `Deref` to provide transparent access to the inner type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    /// Get a reference to the inner value
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the variable name if the string matches `$VAR` or `${VAR}` syntax.
    fn parse_env_var_syntax(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            return Some(braced);
        }
        let var_name = s.strip_prefix('$')?;
        if !var_name.is_empty() && var_name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            Some(var_name)
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for LiteralOrEnv<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = match Self::parse_env_var_syntax(&s) {
            Some(var_name) => std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{}' not found (referenced as '{}')",
                    var_name, s
                ))
            })?,
            None => s,
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {}", e)))?;

        Ok(LiteralOrEnv(parsed))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}
