//! Rule for the BelizeX DEX pallet.
//!
//! Swap output amounts are not read from events: there is no confirmed
//! event schema for them, so swaps are recorded with a zero amount.

use chronicle_core::error::DecodeResult;
use chronicle_core::models::{Asset, ChainEvent, TransactionKind, normalize_name};
use chronicle_core::ports::{CallSummary, PalletRule, RawExtrinsic};

use crate::utils::CallArgs;

/// Counterparty placeholder for DEX swaps.
pub const DEX_MODULE: &str = "BelizeX DEX";

/// Rule for the BelizeX pallet.
pub struct BelizexRule;

impl PalletRule for BelizexRule {
    fn pallet_name(&self) -> &'static str {
        "belizex"
    }

    fn summarize(
        &self,
        ext: &RawExtrinsic,
        _events: &[ChainEvent],
    ) -> DecodeResult<Option<CallSummary>> {
        if normalize_name(&ext.method) != "swap" {
            return Ok(None);
        }

        Ok(Some(CallSummary {
            kind: TransactionKind::MerchantSwap,
            from: CallArgs::new(ext).signer()?,
            to: DEX_MODULE.to_string(),
            amount: 0,
            asset: Asset::Dalla,
            description: "Swap on BelizeX".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_swap_is_merchant_swap_with_zero_amount() {
        let ext = RawExtrinsic {
            index: 0,
            hash: "0xee".into(),
            pallet: "BelizeX".into(),
            method: "swap".into(),
            signer: Some("Grace".into()),
            args: vec![json!("DALLA"), json!("bBZD"), json!(1_000_000)],
        };
        let summary = BelizexRule.summarize(&ext, &[]).unwrap().unwrap();
        assert_eq!(summary.kind, TransactionKind::MerchantSwap);
        assert_eq!(summary.to, DEX_MODULE);
        assert_eq!(summary.amount, 0);
    }
}
