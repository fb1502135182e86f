//! Unix timestamp utilities for payment intents.
//!
//! This module provides the [`UnixTimestamp`] type used for processing dates,
//! expiration dates, schedule bounds, and permit deadlines.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

/// Whole seconds since 1970-01-01T00:00:00Z.
///
/// # Serialization
///
/// Serialized as a JSON integer. Deserialization also accepts a stringified
/// integer, which some clearing API responses use for 64-bit values.
///
/// ```json
/// 1699999999
/// ```
///
/// # Example
///
/// ```
/// use payintent_types::timestamp::UnixTimestamp;
///
/// let issued = UnixTimestamp::now();
/// let deadline = issued + 3600;
/// assert!(deadline.is_after(issued));
///
/// let expiration = UnixTimestamp::from_secs(1_900_000_000);
/// assert_eq!(expiration.as_secs(), 1_900_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(u64),
            String(String),
        }

        let secs = match Wire::deserialize(deserializer)? {
            Wire::Number(n) => n,
            Wire::String(s) => s.parse::<u64>().map_err(|_| {
                serde::de::Error::custom("timestamp must be a non-negative integer")
            })?,
        };
        Ok(UnixTimestamp(secs))
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_add(rhs))
    }
}

impl UnixTimestamp {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Wall-clock time. A clock set before the Unix epoch yields `0`.
    pub fn now() -> Self {
        let secs = SystemTime::UNIX_EPOCH
            .elapsed()
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Returns `true` if this timestamp lies strictly after `now`.
    pub fn is_after(&self, now: UnixTimestamp) -> bool {
        self.0 > now.0
    }
}
