//! Rule for the Economy pallet, which moves both DALLA and bBZD.

use chronicle_core::error::DecodeResult;
use chronicle_core::models::{Asset, ChainEvent, TransactionKind, normalize_name};
use chronicle_core::ports::{CallSummary, PalletRule, RawExtrinsic};

use crate::utils::CallArgs;

/// Decoded Economy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EconomyCall {
    /// `transfer(dest, amount, currency?)`.
    Transfer {
        dest: String,
        amount: u128,
        asset: Asset,
    },
}

impl EconomyCall {
    pub fn decode(ext: &RawExtrinsic) -> DecodeResult<Option<Self>> {
        if normalize_name(&ext.method) != "transfer" {
            return Ok(None);
        }
        let args = CallArgs::new(ext);
        let asset = if args.any_variant(2, Asset::BBzd.symbol()) {
            Asset::BBzd
        } else {
            Asset::Dalla
        };
        Ok(Some(EconomyCall::Transfer {
            dest: args.account(0)?,
            amount: args.amount(1)?,
            asset,
        }))
    }
}

/// Rule for the Economy pallet.
pub struct EconomyRule;

impl PalletRule for EconomyRule {
    fn pallet_name(&self) -> &'static str {
        "economy"
    }

    fn summarize(
        &self,
        ext: &RawExtrinsic,
        _events: &[ChainEvent],
    ) -> DecodeResult<Option<CallSummary>> {
        let Some(EconomyCall::Transfer {
            dest,
            amount,
            asset,
        }) = EconomyCall::decode(ext)?
        else {
            return Ok(None);
        };

        Ok(Some(CallSummary {
            kind: TransactionKind::Transfer,
            from: CallArgs::new(ext).signer()?,
            description: format!("{} transfer to {}", asset, dest),
            to: dest,
            amount,
            asset,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ext(args: Vec<serde_json::Value>) -> RawExtrinsic {
        RawExtrinsic {
            index: 0,
            hash: "0xbb".into(),
            pallet: "Economy".into(),
            method: "transfer".into(),
            signer: Some("Alice".into()),
            args,
        }
    }

    #[test]
    fn test_currency_argument_selects_bbzd() {
        let summary = EconomyRule
            .summarize(&ext(vec![json!("Bob"), json!(100), json!("bBZD")]), &[])
            .unwrap()
            .unwrap();
        assert_eq!(summary.asset, Asset::BBzd);
        assert_eq!(summary.amount, 100);
    }

    #[test]
    fn test_missing_currency_defaults_to_dalla() {
        let call = EconomyCall::decode(&ext(vec![json!("Bob"), json!(100)]))
            .unwrap()
            .unwrap();
        assert!(matches!(call, EconomyCall::Transfer { asset: Asset::Dalla, .. }));

        let call = EconomyCall::decode(&ext(vec![json!("Bob"), json!(100), json!("Dalla")]))
            .unwrap()
            .unwrap();
        assert!(matches!(call, EconomyCall::Transfer { asset: Asset::Dalla, .. }));
    }
}
