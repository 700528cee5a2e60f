//! Shared argument decoding for pallet rules.
//!
//! Every accessor fails closed: a missing or malformed argument is a
//! [`DecodeError`], never a default value.

use chronicle_core::error::{DecodeError, DecodeResult};
use chronicle_core::models::{parse_address, parse_amount};
use chronicle_core::ports::RawExtrinsic;

/// Positional view over an extrinsic's call arguments.
pub(crate) struct CallArgs<'a> {
    ext: &'a RawExtrinsic,
}

impl<'a> CallArgs<'a> {
    pub(crate) fn new(ext: &'a RawExtrinsic) -> Self {
        Self { ext }
    }

    /// Signer of the extrinsic.
    pub(crate) fn signer(&self) -> DecodeResult<String> {
        self.ext
            .signer
            .clone()
            .ok_or_else(|| DecodeError::MissingSigner {
                pallet: self.ext.pallet.clone(),
                method: self.ext.method.clone(),
            })
    }

    /// Account or `MultiAddress` argument at `index`.
    pub(crate) fn account(&self, index: usize) -> DecodeResult<String> {
        parse_address(self.get(index)?).ok_or_else(|| self.invalid(index, "account address"))
    }

    /// Balance argument at `index`.
    pub(crate) fn amount(&self, index: usize) -> DecodeResult<u128> {
        parse_amount(self.get(index)?).ok_or_else(|| self.invalid(index, "amount"))
    }

    /// Unsigned integer argument at `index` (proposal ids, eras).
    pub(crate) fn number(&self, index: usize) -> DecodeResult<u64> {
        parse_amount(self.get(index)?)
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| self.invalid(index, "unsigned integer"))
    }

    /// Any argument past `from` that names the given variant.
    ///
    /// Unit enum variants arrive either as a plain string or as a
    /// single-key object, depending on the client.
    pub(crate) fn any_variant(&self, from: usize, variant: &str) -> bool {
        self.ext
            .args
            .iter()
            .skip(from)
            .any(|arg| names_variant(arg, variant))
    }

    fn get(&self, index: usize) -> DecodeResult<&'a serde_json::Value> {
        self.ext
            .args
            .get(index)
            .ok_or_else(|| DecodeError::MissingArgument {
                pallet: self.ext.pallet.clone(),
                method: self.ext.method.clone(),
                index,
            })
    }

    fn invalid(&self, index: usize, expected: &'static str) -> DecodeError {
        DecodeError::InvalidArgument {
            pallet: self.ext.pallet.clone(),
            method: self.ext.method.clone(),
            index,
            expected,
        }
    }
}

fn names_variant(value: &serde_json::Value, variant: &str) -> bool {
    match value {
        serde_json::Value::String(s) => s.eq_ignore_ascii_case(variant),
        serde_json::Value::Object(obj) if obj.len() == 1 => {
            obj.keys().any(|k| k.eq_ignore_ascii_case(variant))
        }
        _ => false,
    }
}
