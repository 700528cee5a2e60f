//! Pallet classification rules for Chronicle.
//!
//! Each module implements [`PalletRule`] for one BelizeChain pallet and
//! defines a typed call enum decoded from positional arguments. Decoding
//! fails closed: a recognised call with malformed arguments is an error.
//!
//! # Adding a Rule
//!
//! ```ignore
//! use chronicle_core::ports::{PalletRule, RuleRegistry};
//!
//! pub struct TreasuryRule;
//!
//! impl PalletRule for TreasuryRule {
//!     fn pallet_name(&self) -> &'static str {
//!         "treasury"
//!     }
//!
//!     fn summarize(&self, ext: &RawExtrinsic, events: &[ChainEvent])
//!         -> DecodeResult<Option<CallSummary>> {
//!         // ...
//!     }
//! }
//!
//! let mut registry = chronicle_pallets::default_registry();
//! registry.register(Arc::new(TreasuryRule));
//! ```

use std::sync::Arc;

use chronicle_core::ports::{PalletRule, RuleRegistry};

pub mod balances;
pub mod belizex;
pub mod economy;
pub mod governance;
pub mod staking;

mod utils;

pub use balances::BalancesRule;
pub use belizex::BelizexRule;
pub use economy::EconomyRule;
pub use governance::GovernanceRule;
pub use staking::StakingRule;

/// Registry with every built-in BelizeChain rule.
pub fn default_registry() -> RuleRegistry {
    let rules: [Arc<dyn PalletRule>; 5] = [
        Arc::new(BalancesRule),
        Arc::new(EconomyRule),
        Arc::new(StakingRule),
        Arc::new(GovernanceRule),
        Arc::new(BelizexRule),
    ];

    let mut registry = RuleRegistry::new();
    for rule in rules {
        registry.register(rule);
    }
    registry
}
