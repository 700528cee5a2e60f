//! Rule for the Balances pallet.
//!
//! # Supported Calls
//!
//! - `transfer` / `transfer_allow_death`: native transfer
//! - `transfer_keep_alive`: native transfer that keeps the sender alive

use chronicle_core::error::DecodeResult;
use chronicle_core::models::{Asset, ChainEvent, TransactionKind, normalize_name};
use chronicle_core::ports::{CallSummary, PalletRule, RawExtrinsic};

use crate::utils::CallArgs;

/// Decoded Balances call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalancesCall {
    Transfer { dest: String, value: u128 },
    TransferKeepAlive { dest: String, value: u128 },
}

impl BalancesCall {
    /// Decode a call, `Ok(None)` for methods this rule ignores.
    pub fn decode(ext: &RawExtrinsic) -> DecodeResult<Option<Self>> {
        let args = CallArgs::new(ext);
        let call = match normalize_name(&ext.method).as_str() {
            "transfer" | "transferallowdeath" => BalancesCall::Transfer {
                dest: args.account(0)?,
                value: args.amount(1)?,
            },
            "transferkeepalive" => BalancesCall::TransferKeepAlive {
                dest: args.account(0)?,
                value: args.amount(1)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(call))
    }
}

/// Rule for the Balances pallet.
pub struct BalancesRule;

impl PalletRule for BalancesRule {
    fn pallet_name(&self) -> &'static str {
        "balances"
    }

    fn summarize(
        &self,
        ext: &RawExtrinsic,
        _events: &[ChainEvent],
    ) -> DecodeResult<Option<CallSummary>> {
        let Some(call) = BalancesCall::decode(ext)? else {
            return Ok(None);
        };
        let from = CallArgs::new(ext).signer()?;

        let (dest, value) = match call {
            BalancesCall::Transfer { dest, value }
            | BalancesCall::TransferKeepAlive { dest, value } => (dest, value),
        };

        Ok(Some(CallSummary {
            kind: TransactionKind::Transfer,
            description: format!("Transfer to {}", dest),
            from,
            to: dest,
            amount: value,
            asset: Asset::Dalla,
        }))
    }
}
