//! Typed chain events.
//!
//! Raw events are decoded into [`ChainEvent`] before classification. Only the
//! events the classifier reads are modelled; everything else is `Other`.

use crate::error::{DecodeError, DecodeResult};
use crate::ports::RawEvent;

use super::{normalize_name, parse_address, parse_amount};

/// Event emitted while applying an extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// `System.ExtrinsicSuccess`.
    ExtrinsicSuccess,
    /// `System.ExtrinsicFailed`.
    ExtrinsicFailed,
    /// `Balances.Withdraw`, the fee debit.
    FeeWithdrawn { who: Option<String>, amount: u128 },
    /// `TransactionPayment.TransactionFeePaid`.
    FeePaid { who: Option<String>, fee: u128 },
    /// Any pallet's `Reward` or `Rewarded` event.
    Reward {
        beneficiary: Option<String>,
        amount: u128,
    },
    /// Anything the classifier does not read.
    Other { pallet: String, method: String },
}

impl ChainEvent {
    /// Decode a raw event.
    ///
    /// Fails closed when a recognised event carries an unparseable amount.
    pub fn decode(raw: &RawEvent) -> DecodeResult<Self> {
        let pallet = normalize_name(&raw.pallet);
        let method = normalize_name(&raw.method);

        let event = match (pallet.as_str(), method.as_str()) {
            (_, "extrinsicsuccess") => ChainEvent::ExtrinsicSuccess,
            (_, "extrinsicfailed") => ChainEvent::ExtrinsicFailed,
            ("balances", "withdraw") => ChainEvent::FeeWithdrawn {
                who: raw.data.first().and_then(parse_address),
                amount: amount_field(raw, 1)?,
            },
            ("transactionpayment", "transactionfeepaid") => ChainEvent::FeePaid {
                who: raw.data.first().and_then(parse_address),
                fee: amount_field(raw, 1)?,
            },
            (_, "reward" | "rewarded") => ChainEvent::Reward {
                beneficiary: raw.data.first().and_then(parse_address),
                amount: amount_field(raw, 1)?,
            },
            _ => ChainEvent::Other {
                pallet: raw.pallet.clone(),
                method: raw.method.clone(),
            },
        };

        Ok(event)
    }
}

fn amount_field(raw: &RawEvent, index: usize) -> DecodeResult<u128> {
    raw.data
        .get(index)
        .and_then(parse_amount)
        .ok_or_else(|| DecodeError::InvalidEventField {
            pallet: raw.pallet.clone(),
            method: raw.method.clone(),
            index,
            expected: "amount",
        })
}

/// Whether an extrinsic succeeded, judged from its events.
///
/// Absence of `ExtrinsicSuccess`, or presence of `ExtrinsicFailed`, is failure.
pub fn extrinsic_succeeded(events: &[ChainEvent]) -> bool {
    events.contains(&ChainEvent::ExtrinsicSuccess) && !events.contains(&ChainEvent::ExtrinsicFailed)
}

/// Fee charged for an extrinsic, `0` when no fee event is present.
pub fn fee_paid(events: &[ChainEvent]) -> u128 {
    events
        .iter()
        .find_map(|event| match event {
            ChainEvent::FeeWithdrawn { amount, .. } => Some(*amount),
            ChainEvent::FeePaid { fee, .. } => Some(*fee),
            _ => None,
        })
        .unwrap_or(0)
}
