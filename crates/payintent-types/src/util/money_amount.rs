//! Human-readable currency amounts and their conversion to token units.
//!
//! The clearing API expresses amounts in cents (two implied decimals). Before
//! any signing payload is built, that amount has to be rescaled into the
//! source token's native integer unit. [`MoneyAmount`] carries the exact
//! decimal value between those two representations.
//!
//! # Example
//!
//! ```rust
//! use alloy_primitives::U256;
//! use payintent_types::util::MoneyAmount;
//!
//! let amount = MoneyAmount::parse("$10.50").unwrap();
//! assert_eq!(amount.to_cents().unwrap(), 1050);
//! assert_eq!(amount.to_native_units(6).unwrap(), U256::from(10_500_000u64));
//! ```

use alloy_primitives::U256;
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

/// Number of implied decimals in an API amount.
pub const CENTS_SCALE: u32 = 2;

/// A non-negative monetary amount with exact decimal precision.
///
/// The [`scale`](MoneyAmount::scale) method returns the number of decimal places,
/// and [`mantissa`](MoneyAmount::mantissa) returns the value as an integer.
/// For example, `"10.50"` has scale 2 and mantissa 1050.
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyAmount(pub Decimal);

impl MoneyAmount {
    /// Returns the number of decimal places.
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Returns the value as an unsigned integer (without decimal point).
    pub fn mantissa(&self) -> u128 {
        self.0.mantissa().unsigned_abs()
    }

    /// Builds an amount from an API value expressed in cents.
    pub fn from_cents(cents: u64) -> Self {
        MoneyAmount(Decimal::from_i128_with_scale(cents as i128, CENTS_SCALE))
    }

    /// Converts the amount to cents, rejecting sub-cent precision.
    pub fn to_cents(&self) -> Result<u64, MoneyAmountParseError> {
        let normalized = self.0.normalize();
        if normalized.scale() > CENTS_SCALE {
            return Err(MoneyAmountParseError::WrongPrecision {
                money: normalized.scale(),
                token: CENTS_SCALE,
            });
        }
        let mut rescaled = normalized;
        rescaled.rescale(CENTS_SCALE);
        u64::try_from(rescaled.mantissa()).map_err(|_| MoneyAmountParseError::OutOfRange)
    }

    /// Adds another amount, failing on decimal overflow.
    pub fn checked_add(&self, other: &MoneyAmount) -> Option<MoneyAmount> {
        self.0.checked_add(other.0).map(MoneyAmount)
    }

    /// Converts the amount to a token's native integer unit, rounding down.
    ///
    /// `floor(value * 10^decimals)`, computed exactly in 256-bit integers.
    pub fn to_native_units(&self, decimals: u8) -> Result<U256, MoneyAmountParseError> {
        if self.0.is_sign_negative() && !self.0.is_zero() {
            return Err(MoneyAmountParseError::Negative);
        }
        let ten = U256::from(10u8);
        let numerator = U256::from(self.mantissa())
            .checked_mul(ten.pow(U256::from(decimals)))
            .ok_or(MoneyAmountParseError::OutOfRange)?;
        let denominator = ten.pow(U256::from(self.scale()));
        Ok(numerator / denominator)
    }
}

/// Errors that can occur when parsing or converting a monetary amount.
#[derive(Debug, thiserror::Error)]
pub enum MoneyAmountParseError {
    /// The input string could not be parsed as a number.
    #[error("Invalid number format")]
    InvalidFormat,
    /// The value is outside the allowed range.
    #[error(
        "Amount must be between {} and {}",
        constants::MIN_STR,
        constants::MAX_STR
    )]
    OutOfRange,
    /// Negative values are not allowed.
    #[error("Negative value is not allowed")]
    Negative,
    /// The input has more decimal places than the target unit supports.
    #[error("Too big of a precision: {money} vs {token} supported")]
    WrongPrecision {
        /// Decimal places in the input.
        money: u32,
        /// Decimal places supported by the target unit.
        token: u32,
    },
}

mod constants {
    use super::*;

    pub const MIN_STR: &str = "0";
    pub const MAX_STR: &str = "999999999999";

    pub static MIN: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MIN_STR).expect("valid decimal"));
    pub static MAX: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));
}

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d\.\-]+").expect("valid regex"));

impl MoneyAmount {
    /// Parses a human-readable currency string into a [`MoneyAmount`].
    ///
    /// Currency symbols, thousand separators, and whitespace are stripped
    /// before parsing.
    pub fn parse(input: &str) -> Result<Self, MoneyAmountParseError> {
        let cleaned = NON_NUMERIC.replace_all(input, "").to_string();

        let parsed =
            Decimal::from_str(&cleaned).map_err(|_| MoneyAmountParseError::InvalidFormat)?;

        if parsed.is_sign_negative() && !parsed.is_zero() {
            return Err(MoneyAmountParseError::Negative);
        }

        if parsed < *constants::MIN || parsed > *constants::MAX {
            return Err(MoneyAmountParseError::OutOfRange);
        }

        Ok(MoneyAmount(parsed))
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoneyAmount::parse(s)
    }
}

impl From<Decimal> for MoneyAmount {
    fn from(value: Decimal) -> Self {
        MoneyAmount(value)
    }
}

impl Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
