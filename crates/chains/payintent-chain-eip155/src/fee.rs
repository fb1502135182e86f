//! Three-way split of a gross token amount between payee, operator, and gateway.
//!
//! Both fee legs are floored; the payee leg is whatever remains, so the three
//! legs always add up to the gross amount.

use alloy_primitives::U256;

use crate::error::AuthorizationError;

/// Protocol fee charged by the gateway, in basis points.
pub const GATEWAY_FEE_BPS: u16 = 10;

/// 100% in basis points.
pub const MAX_BPS: u16 = 10_000;

/// An exact partition of a gross amount, in token native units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub payee: U256,
    pub operator_fee: U256,
    pub gateway_fee: U256,
}

impl FeeSplit {
    /// Sum of the three legs, `None` on overflow.
    pub fn total(&self) -> Option<U256> {
        self.payee
            .checked_add(self.operator_fee)?
            .checked_add(self.gateway_fee)
    }
}

fn bps_of(gross: U256, bps: u16) -> Result<U256, AuthorizationError> {
    gross
        .checked_mul(U256::from(bps))
        .map(|scaled| scaled / U256::from(MAX_BPS))
        .ok_or_else(|| {
            AuthorizationError::invalid("amount", "gross amount overflows fee arithmetic")
        })
}

fn check_bps(field: &'static str, bps: u16) -> Result<(), AuthorizationError> {
    if bps > MAX_BPS {
        return Err(AuthorizationError::invalid(
            field,
            format!("{bps} bps exceeds {MAX_BPS}"),
        ));
    }
    Ok(())
}

/// Splits `gross` into payee, operator, and gateway legs.
///
/// When the two rates add up to more than 100%, the gateway leg is clamped to
/// what the operator leg leaves.
pub fn split(
    gross: U256,
    operator_bps: u16,
    gateway_bps: u16,
) -> Result<FeeSplit, AuthorizationError> {
    check_bps("operatorData.feeBps", operator_bps)?;
    check_bps("gatewayFeeBps", gateway_bps)?;
    let operator_fee = bps_of(gross, operator_bps)?;
    let remaining = gross - operator_fee;
    let gateway_fee = bps_of(gross, gateway_bps)?.min(remaining);
    Ok(FeeSplit {
        payee: remaining - gateway_fee,
        operator_fee,
        gateway_fee,
    })
}

/// Verifies that `split` partitions `gross` exactly.
pub fn reconcile(gross: U256, split: &FeeSplit) -> Result<(), AuthorizationError> {
    if split.total() == Some(gross) {
        Ok(())
    } else {
        Err(AuthorizationError::AmountReconciliation {
            gross,
            payee: split.payee,
            operator_fee: split.operator_fee,
            gateway_fee: split.gateway_fee,
        })
    }
}
