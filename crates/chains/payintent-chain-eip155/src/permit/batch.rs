//! Permit2 batch transfer permit with the payment intent as witness.
//!
//! The signed permit authorizes the source gateway to pull three legs of the
//! source token (payee, operator fee, gateway fee) in one
//! `permitWitnessTransferFrom` call. The witness binds those transfers to the
//! payment intent, so the gateway cannot settle the legs for anything else.
//!
//! Unlike the legacy single-token permits, the Permit2 domain has no version.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{eip712_domain, sol};
use payintent_types::intent::PaymentIntent as IntentRecord;
use payintent_types::timestamp::UnixTimestamp;
use serde::{Deserialize, Serialize};

use crate::chain::{ChecksummedAddress, parse_bytes32};
use crate::error::AuthorizationError;
use crate::fee::{FeeSplit, GATEWAY_FEE_BPS, reconcile, split};
use crate::permit::{AuthorizationPayload, PERMIT2_ADDRESS};
use crate::registry::Registry;

sol! {
    /// Amount of a token the spender may pull.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct TokenPermissions {
        address token;
        uint256 amount;
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct OperatorData {
        bytes32 id;
        address operatorAddress;
        address treasury;
        uint16 feeBps;
    }

    /// An account holding a token on a chain.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct PaymentDomain {
        address account;
        uint256 chainId;
        address token;
    }

    /// Witness binding the permitted transfers to a payment intent.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct PaymentIntent {
        uint8 paymentType;
        OperatorData operatorData;
        uint256 amount;
        PaymentDomain source;
        PaymentDomain destination;
        uint256 processingDate;
        uint256 expiresAt;
    }

    /// Permit2 batch signature transfer extended with a [`PaymentIntent`] witness.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct PermitBatchWitnessTransferFrom {
        TokenPermissions[] permitted;
        address spender;
        uint256 nonce;
        uint256 deadline;
        PaymentIntent witness;
    }
}

/// Witness type string handed to `permitWitnessTransferFrom`.
///
/// Permit2 appends it to its own
/// `PermitBatchWitnessTransferFrom(TokenPermissions[] permitted,address spender,uint256 nonce,uint256 deadline,`
/// prefix, so it starts with the witness field and lists every referenced
/// struct in alphabetical order.
pub const WITNESS_TYPE_STRING: &str = concat!(
    "PaymentIntent witness)",
    "OperatorData(bytes32 id,address operatorAddress,address treasury,uint16 feeBps)",
    "PaymentDomain(address account,uint256 chainId,address token)",
    "PaymentIntent(uint8 paymentType,OperatorData operatorData,uint256 amount,PaymentDomain source,PaymentDomain destination,uint256 processingDate,uint256 expiresAt)",
    "TokenPermissions(address token,uint256 amount)",
);

/// Prefix Permit2 puts in front of [`WITNESS_TYPE_STRING`].
pub const PERMIT_BATCH_WITNESS_TYPE_STUB: &str = "PermitBatchWitnessTransferFrom(TokenPermissions[] permitted,address spender,uint256 nonce,uint256 deadline,";

/// A batch permit payload together with the values it commits to.
#[derive(Debug, Clone)]
pub struct BatchPermit {
    pub payload: AuthorizationPayload<PermitBatchWitnessTransferFrom>,
    pub split: FeeSplit,
    pub gross: U256,
    pub nonce: U256,
    pub deadline: UnixTimestamp,
}

/// Inputs of [`build_batch_permit`] that are not part of the intent.
#[derive(Debug, Clone, Copy)]
pub struct BatchPermitParams {
    /// Gross amount in source token native units, fees included.
    pub gross: U256,
    pub nonce: U256,
    pub deadline: UnixTimestamp,
}

/// Builds the batch permit payload for `intent`.
///
/// Resolves both sides against `registry`, splits `params.gross` into the
/// three permitted legs, and checks the split reconciles before anything is
/// assembled for signing.
pub fn build_batch_permit(
    intent: &IntentRecord,
    registry: &Registry,
    params: BatchPermitParams,
) -> Result<BatchPermit, AuthorizationError> {
    let source_network = registry.get_network(&intent.source.network)?;
    let source_token = registry.get_token(&intent.source.token, &intent.source.network)?;
    let destination_network = registry.get_network(&intent.destination.network)?;
    let destination_token =
        registry.get_token(&intent.destination.token, &intent.destination.network)?;

    let source_account = ChecksummedAddress::parse_field("source.address", &intent.source.address)?;
    let destination_account =
        ChecksummedAddress::parse_field("destination.address", &intent.destination.address)?;
    let operator = &intent.operator_data;
    let operator_id = parse_bytes32("operatorData.id", &operator.id)?;
    let operator_address =
        ChecksummedAddress::parse_field("operatorData.operator", &operator.operator)?;
    let treasury = ChecksummedAddress::parse_field("operatorData.treasury", &operator.treasury)?;

    let split = split(params.gross, operator.fee_bps, GATEWAY_FEE_BPS)?;
    reconcile(params.gross, &split)?;

    let leg = |amount: U256| TokenPermissions {
        token: source_token.address,
        amount,
    };
    let processing_date = intent
        .processing_date
        .map(|date| date.as_secs())
        .unwrap_or_default();

    let message = PermitBatchWitnessTransferFrom {
        permitted: vec![
            leg(split.payee),
            leg(split.operator_fee),
            leg(split.gateway_fee),
        ],
        spender: source_network.gateway,
        nonce: params.nonce,
        deadline: U256::from(params.deadline.as_secs()),
        witness: PaymentIntent {
            paymentType: intent.payment_type.code(),
            operatorData: OperatorData {
                id: operator_id,
                operatorAddress: Address::from(operator_address),
                treasury: Address::from(treasury),
                feeBps: operator.fee_bps,
            },
            amount: params.gross,
            source: PaymentDomain {
                account: source_account.into(),
                chainId: U256::from(source_network.chain_reference.inner()),
                token: source_token.address,
            },
            destination: PaymentDomain {
                account: destination_account.into(),
                chainId: U256::from(destination_network.chain_reference.inner()),
                token: destination_token.address,
            },
            processingDate: U256::from(processing_date),
            expiresAt: U256::from(params.deadline.as_secs()),
        },
    };

    let domain = eip712_domain! {
        name: "Permit2",
        chain_id: source_network.chain_reference.inner(),
        verifying_contract: PERMIT2_ADDRESS,
    };

    Ok(BatchPermit {
        payload: AuthorizationPayload::new(domain, message),
        split,
        gross: params.gross,
        nonce: params.nonce,
        deadline: params.deadline,
    })
}
