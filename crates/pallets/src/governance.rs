//! Rule for the Governance pallet.

use chronicle_core::error::DecodeResult;
use chronicle_core::models::{Asset, ChainEvent, TransactionKind, normalize_name};
use chronicle_core::ports::{CallSummary, PalletRule, RawExtrinsic};

use crate::utils::CallArgs;

/// Counterparty placeholder for governance calls.
pub const GOVERNANCE_MODULE: &str = "Governance";

/// Decoded Governance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernanceCall {
    /// `propose(proposal, value)`, locking `value` as deposit.
    Propose { deposit: u128 },
    /// Votes carry no transferred amount.
    Vote { proposal: Option<u64> },
}

impl GovernanceCall {
    pub fn decode(ext: &RawExtrinsic) -> DecodeResult<Option<Self>> {
        let args = CallArgs::new(ext);
        let call = match normalize_name(&ext.method).as_str() {
            "propose" => GovernanceCall::Propose {
                deposit: args.amount(1)?,
            },
            "vote" => GovernanceCall::Vote {
                proposal: args.number(0).ok(),
            },
            _ => return Ok(None),
        };
        Ok(Some(call))
    }
}

/// Rule for the Governance pallet.
pub struct GovernanceRule;

impl PalletRule for GovernanceRule {
    fn pallet_name(&self) -> &'static str {
        "governance"
    }

    fn summarize(
        &self,
        ext: &RawExtrinsic,
        _events: &[ChainEvent],
    ) -> DecodeResult<Option<CallSummary>> {
        let Some(call) = GovernanceCall::decode(ext)? else {
            return Ok(None);
        };

        let (amount, description) = match call {
            GovernanceCall::Propose { deposit } => (deposit, "Submit proposal".to_string()),
            GovernanceCall::Vote {
                proposal: Some(id),
            } => (0, format!("Vote on proposal #{}", id)),
            GovernanceCall::Vote { proposal: None } => (0, "Vote on proposal".to_string()),
        };

        Ok(Some(CallSummary {
            kind: TransactionKind::Governance,
            from: CallArgs::new(ext).signer()?,
            to: GOVERNANCE_MODULE.to_string(),
            amount,
            asset: Asset::Dalla,
            description,
        }))
    }
}
