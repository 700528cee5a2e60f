//! Rule for the Staking pallet.
//!
//! Bonding calls move funds to the staking module, so the counterparty is
//! the `"Staking"` placeholder rather than an account.

use chronicle_core::error::DecodeResult;
use chronicle_core::models::{Asset, ChainEvent, TransactionKind, normalize_name};
use chronicle_core::ports::{CallSummary, PalletRule, RawExtrinsic};

use crate::utils::CallArgs;

/// Counterparty placeholder for staking calls.
pub const STAKING_MODULE: &str = "Staking";

/// Decoded Staking call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakingCall {
    /// `bond(controller, value, payee)`.
    Bond { value: u128 },
    BondExtra { max_additional: u128 },
    Unbond { value: u128 },
    /// The payout amount comes from the `Reward` events, not the call.
    PayoutStakers,
}

impl StakingCall {
    pub fn decode(ext: &RawExtrinsic) -> DecodeResult<Option<Self>> {
        let args = CallArgs::new(ext);
        let call = match normalize_name(&ext.method).as_str() {
            "bond" => StakingCall::Bond {
                value: args.amount(1)?,
            },
            "bondextra" => StakingCall::BondExtra {
                max_additional: args.amount(0)?,
            },
            "unbond" => StakingCall::Unbond {
                value: args.amount(0)?,
            },
            "payoutstakers" => StakingCall::PayoutStakers,
            _ => return Ok(None),
        };
        Ok(Some(call))
    }
}

/// Rule for the Staking pallet.
pub struct StakingRule;

impl PalletRule for StakingRule {
    fn pallet_name(&self) -> &'static str {
        "staking"
    }

    fn summarize(
        &self,
        ext: &RawExtrinsic,
        events: &[ChainEvent],
    ) -> DecodeResult<Option<CallSummary>> {
        let Some(call) = StakingCall::decode(ext)? else {
            return Ok(None);
        };

        let (amount, description) = match call {
            StakingCall::Bond { value } => (value, "Bond stake"),
            StakingCall::BondExtra { max_additional } => (max_additional, "Bond extra stake"),
            StakingCall::Unbond { value } => (value, "Unbond stake"),
            StakingCall::PayoutStakers => (first_reward(events), "Payout staking rewards"),
        };

        Ok(Some(CallSummary {
            kind: TransactionKind::Staking,
            from: CallArgs::new(ext).signer()?,
            to: STAKING_MODULE.to_string(),
            amount,
            asset: Asset::Dalla,
            description: description.to_string(),
        }))
    }
}

fn first_reward(events: &[ChainEvent]) -> u128 {
    events
        .iter()
        .find_map(|event| match event {
            ChainEvent::Reward { amount, .. } => Some(*amount),
            _ => None,
        })
        .unwrap_or(0)
}
