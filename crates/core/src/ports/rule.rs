//! Port trait for pallet-specific classification rules.
//!
//! This is the main extensibility point of the classifier. Each pallet whose
//! calls map to a transaction kind implements [`PalletRule`], and rules are
//! registered in a [`RuleRegistry`] keyed by normalized pallet name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DecodeResult;
use crate::models::{Asset, ChainEvent, TransactionKind, normalize_name};
use crate::ports::gateway::RawExtrinsic;

/// What a pallet rule learned from one call, before the relevance filter
/// and amount formatting are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSummary {
    pub kind: TransactionKind,
    pub from: String,
    pub to: String,
    /// Raw fixed-point amount.
    pub amount: u128,
    pub asset: Asset,
    pub description: String,
}

/// Classification rule for one pallet.
///
/// Rules are pure: no I/O, no shared state.
pub trait PalletRule: Send + Sync {
    /// Pallet name this rule handles (e.g., "balances").
    fn pallet_name(&self) -> &'static str;

    /// Summarize a call from this pallet.
    ///
    /// Returns `Ok(None)` for methods the rule does not recognise, so the
    /// classifier can fall through to reward detection. Returns an error when
    /// a recognised method's arguments do not have the expected shape.
    fn summarize(
        &self,
        extrinsic: &RawExtrinsic,
        events: &[ChainEvent],
    ) -> DecodeResult<Option<CallSummary>>;
}

/// Registry of pallet rules.
#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn PalletRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, replacing any rule for the same pallet.
    pub fn register(&mut self, rule: Arc<dyn PalletRule>) {
        self.rules.insert(normalize_name(rule.pallet_name()), rule);
    }

    /// Get the rule for a pallet, matching names in any casing convention.
    pub fn get(&self, pallet: &str) -> Option<&Arc<dyn PalletRule>> {
        self.rules.get(&normalize_name(pallet))
    }

    /// Check if a pallet has a registered rule.
    pub fn has_rule(&self, pallet: &str) -> bool {
        self.get(pallet).is_some()
    }

    /// List all registered pallet names.
    pub fn registered_pallets(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.rules.values().map(|r| r.pallet_name()).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("pallets", &self.registered_pallets())
            .finish()
    }
}
