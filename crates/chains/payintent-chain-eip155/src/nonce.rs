//! Nonces for Permit2 batch permits.
//!
//! Permit2 signature-transfer nonces are unordered: any unused 256-bit value
//! works. The default source hands out millisecond timestamps that never
//! repeat within the process, which keeps nonces readable in logs while
//! avoiding collisions between concurrent authorizations.

use alloy_primitives::U256;
use rand::{Rng, rng};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Source of batch permit nonces.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> U256;
}

/// Strictly increasing nonces seeded from the millisecond clock.
///
/// Each value is `max(now_ms, previous + 1)`.
#[derive(Debug, Default)]
pub struct MonotonicNonce {
    last: AtomicU64,
}

impl MonotonicNonce {
    pub fn new() -> Self {
        Self::default()
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }

    pub fn next(&self) -> u64 {
        let now = Self::now_ms();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_default();
        now.max(previous.saturating_add(1))
    }
}

impl NonceSource for MonotonicNonce {
    fn next_nonce(&self) -> U256 {
        U256::from(self.next())
    }
}

static PROCESS_NONCE: LazyLock<MonotonicNonce> = LazyLock::new(MonotonicNonce::new);

/// The process-wide [`MonotonicNonce`]. Every authorizer built with default
/// settings shares it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessNonce;

impl NonceSource for ProcessNonce {
    fn next_nonce(&self) -> U256 {
        PROCESS_NONCE.next_nonce()
    }
}

/// Uniformly random 256-bit nonces.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn next_nonce(&self) -> U256 {
        let nonce: [u8; 32] = rng().random();
        U256::from_be_bytes(nonce)
    }
}

/// Always returns the same nonce. Useful for reproducible payloads.
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub U256);

impl NonceSource for FixedNonce {
    fn next_nonce(&self) -> U256 {
        self.0
    }
}
