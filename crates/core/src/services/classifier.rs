//! Transaction classifier - maps one extrinsic to at most one transaction.
//!
//! Pallet-specific decoding lives behind [`PalletRule`]; this module owns the
//! parts every rule shares: reward fallback, relevance filtering, status,
//! fee extraction and amount formatting.

use std::sync::Arc;

use crate::error::DecodeResult;
use crate::models::{
    Asset, ChainEvent, DEFAULT_DECIMALS, Transaction, TransactionKind, TransactionMetadata,
    TransactionStatus, fee_paid, format_amount,
};
use crate::ports::{CallSummary, RawExtrinsic, RuleRegistry};

/// Placeholder `from` for rewards paid by the runtime.
pub const REWARD_SOURCE: &str = "Reward";

/// Configuration for the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Fixed-point decimals of on-chain amounts.
    pub decimals: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
        }
    }
}

/// One extrinsic together with everything the classifier needs about it.
#[derive(Debug, Clone, Copy)]
pub struct ExtrinsicContext<'a> {
    pub extrinsic: &'a RawExtrinsic,
    /// Events whose phase points at this extrinsic, in emission order.
    pub events: &'a [ChainEvent],
    pub block_number: u64,
    /// Block timestamp in epoch milliseconds.
    pub timestamp: u64,
    pub succeeded: bool,
}

/// Stateless transaction classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Arc<RuleRegistry>,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(rules: Arc<RuleRegistry>, config: ClassifierConfig) -> Self {
        Self { rules, config }
    }

    /// Classify an extrinsic for one account.
    ///
    /// Returns `Ok(None)` when no rule matches or the account is neither
    /// sender nor recipient. Returns an error when a recognised call or
    /// event does not decode.
    pub fn classify(
        &self,
        ctx: &ExtrinsicContext<'_>,
        account: &str,
    ) -> DecodeResult<Option<Transaction>> {
        let ext = ctx.extrinsic;

        let matched = match self.rules.get(&ext.pallet) {
            Some(rule) => rule.summarize(ext, ctx.events)?,
            None => None,
        };

        let Some(summary) = matched.or_else(|| reward_fallback(ctx.events, account)) else {
            return Ok(None);
        };

        if summary.from != account && summary.to != account {
            return Ok(None);
        }

        Ok(Some(self.build(ctx, summary)))
    }

    fn build(&self, ctx: &ExtrinsicContext<'_>, summary: CallSummary) -> Transaction {
        let ext = ctx.extrinsic;
        let fee = match fee_paid(ctx.events) {
            0 => "0".to_string(),
            raw => format_amount(raw, self.config.decimals),
        };

        Transaction {
            hash: ext.hash.clone(),
            block_number: ctx.block_number,
            timestamp: ctx.timestamp,
            kind: summary.kind,
            from: summary.from,
            to: summary.to,
            amount: format_amount(summary.amount, self.config.decimals),
            asset: summary.asset,
            status: if ctx.succeeded {
                TransactionStatus::Success
            } else {
                TransactionStatus::Failed
            },
            fee,
            metadata: Some(TransactionMetadata {
                pallet_name: ext.pallet.clone(),
                method_name: ext.method.clone(),
                description: summary.description,
            }),
        }
    }
}

/// Reward detection for calls no rule claimed.
///
/// Only a reward paid to `account` counts; rewards to other accounts in the
/// same extrinsic are someone else's history.
fn reward_fallback(events: &[ChainEvent], account: &str) -> Option<CallSummary> {
    events.iter().find_map(|event| match event {
        ChainEvent::Reward {
            beneficiary: Some(who),
            amount,
        } if who == account => Some(CallSummary {
            kind: TransactionKind::Reward,
            from: REWARD_SOURCE.to_string(),
            to: account.to_string(),
            amount: *amount,
            asset: Asset::Dalla,
            description: "Reward received".to_string(),
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::services::testing::pay_registry;
    use serde_json::json;

    fn classifier() -> Classifier {
        Classifier::new(Arc::new(pay_registry()), ClassifierConfig { decimals: 9 })
    }

    fn extrinsic(pallet: &str, method: &str, args: Vec<serde_json::Value>) -> RawExtrinsic {
        RawExtrinsic {
            index: 1,
            hash: "0xfeed".into(),
            pallet: pallet.into(),
            method: method.into(),
            signer: Some("Alice".into()),
            args,
        }
    }

    fn ctx<'a>(ext: &'a RawExtrinsic, events: &'a [ChainEvent]) -> ExtrinsicContext<'a> {
        ExtrinsicContext {
            extrinsic: ext,
            events,
            block_number: 42,
            timestamp: 1_700_000_000_000,
            succeeded: true,
        }
    }

    #[test]
    fn test_matched_rule_builds_transaction() {
        let ext = extrinsic("Payments", "pay", vec![json!("Bob"), json!(500_000_000_000u64)]);
        let events = [
            ChainEvent::FeeWithdrawn {
                who: Some("Alice".into()),
                amount: 15_000_000,
            },
            ChainEvent::ExtrinsicSuccess,
        ];
        let tx = classifier()
            .classify(&ctx(&ext, &events), "Alice")
            .unwrap()
            .unwrap();

        assert_eq!(tx.block_number, 42);
        assert_eq!(tx.amount, "500.00");
        assert_eq!(tx.fee, "0.01");
        assert_eq!(tx.status, TransactionStatus::Success);
        let meta = tx.metadata.unwrap();
        assert_eq!(meta.pallet_name, "Payments");
        assert_eq!(meta.method_name, "pay");
    }

    #[test]
    fn test_relevance_filter_applies_to_matched_rules() {
        let ext = extrinsic("payments", "pay", vec![json!("Bob"), json!(1)]);
        let result = classifier().classify(&ctx(&ext, &[]), "Carol").unwrap();
        assert!(result.is_none());

        // Le destinataire voit aussi la transaction
        let received = classifier().classify(&ctx(&ext, &[]), "Bob").unwrap();
        assert!(received.is_some());
    }

    #[test]
    fn test_failed_status_and_missing_fee() {
        let ext = extrinsic("payments", "pay", vec![json!("Bob"), json!(1)]);
        let mut context = ctx(&ext, &[]);
        context.succeeded = false;
        let tx = classifier().classify(&context, "Alice").unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.fee, "0");
    }

    #[test]
    fn test_reward_fallback_for_unknown_call() {
        let ext = extrinsic("Custom", "claim", vec![]);
        let events = [ChainEvent::Reward {
            beneficiary: Some("Eve".into()),
            amount: 7_500_000_000,
        }];

        let tx = classifier()
            .classify(&ctx(&ext, &events), "Eve")
            .unwrap()
            .unwrap();
        assert_eq!(tx.kind, TransactionKind::Reward);
        assert_eq!(tx.from, REWARD_SOURCE);
        assert_eq!(tx.to, "Eve");
        assert_eq!(tx.amount, "7.50");

        let other = classifier().classify(&ctx(&ext, &events), "Alice").unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_unrecognised_method_falls_through() {
        let ext = extrinsic("payments", "refund", vec![]);
        assert!(classifier().classify(&ctx(&ext, &[]), "Alice").unwrap().is_none());
    }

    #[test]
    fn test_decode_error_is_propagated() {
        let ext = extrinsic("payments", "pay", vec![json!("Bob"), json!("lots")]);
        let err = classifier().classify(&ctx(&ext, &[]), "Alice").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidArgument { index: 1, .. }));
    }
}
