//! SCALE value to JSON conversion.
//!
//! Call arguments and event fields come out of dynamic metadata decoding as
//! `scale_value` trees. The classifier reads them as positional JSON, so
//! each top-level field becomes one array element and account ids are
//! rendered as SS58 addresses.

use subxt::ext::scale_value::{Composite, Primitive, Value, ValueDef};
use subxt::utils::AccountId32;

/// Top-level fields of a call or event, in declaration order.
pub(crate) fn fields_to_args<T>(composite: &Composite<T>) -> Vec<serde_json::Value> {
    match composite {
        Composite::Named(fields) => fields.iter().map(|(_, v)| value_to_json(v)).collect(),
        Composite::Unnamed(values) => values.iter().map(value_to_json).collect(),
    }
}

/// Convert a Composite to a JSON value.
pub(crate) fn composite_to_json<T>(composite: &Composite<T>) -> serde_json::Value {
    match composite {
        Composite::Unnamed(values) => {
            if let Some(rendered) = try_as_byte_array(values) {
                return serde_json::Value::String(rendered);
            }
            // Newtype wrappers (AccountId32, Compact) collapse to their inner value
            if values.len() == 1 {
                return value_to_json(&values[0]);
            }
            serde_json::Value::Array(values.iter().map(value_to_json).collect())
        }
        Composite::Named(fields) => {
            let obj: serde_json::Map<String, serde_json::Value> = fields
                .iter()
                .map(|(name, v)| (name.clone(), value_to_json(v)))
                .collect();
            serde_json::Value::Object(obj)
        }
    }
}

/// Render a fixed-size byte array.
///
/// 32 bytes is an account id (or a hash, which cannot be told apart here)
/// and becomes SS58; 20 and 64 byte arrays become hex.
fn try_as_byte_array<T>(values: &[Value<T>]) -> Option<String> {
    let len = values.len();
    if len != 32 && len != 20 && len != 64 {
        return None;
    }

    let mut bytes = Vec::with_capacity(len);
    for value in values {
        match &value.value {
            ValueDef::Primitive(Primitive::U128(n)) if *n <= 255 => bytes.push(*n as u8),
            _ => return None,
        }
    }

    Some(render_bytes(&bytes))
}

fn render_bytes(bytes: &[u8]) -> String {
    match <[u8; 32]>::try_from(bytes) {
        Ok(account) => ss58(account),
        Err(_) => format!("0x{}", hex::encode(bytes)),
    }
}

/// SS58 rendering of a 32-byte account id (generic substrate prefix).
pub(crate) fn ss58(account: [u8; 32]) -> String {
    AccountId32(account).to_string()
}

fn value_to_json<T>(value: &Value<T>) -> serde_json::Value {
    value_def_to_json(&value.value)
}

fn value_def_to_json<T>(value: &ValueDef<T>) -> serde_json::Value {
    match value {
        ValueDef::Composite(composite) => composite_to_json(composite),
        ValueDef::Variant(variant) => {
            let inner = composite_to_json(&variant.values);
            match variant.name.as_str() {
                "None" => serde_json::Value::Null,
                // Option and MultiAddress::Id unwrap to their payload
                "Some" | "Id" => match inner {
                    serde_json::Value::Array(mut arr) if arr.len() == 1 => arr.remove(0),
                    other => other,
                },
                // Fieldless variants (currency ids, vote choices) are plain names
                name if variant.values.is_empty() => serde_json::Value::String(name.to_string()),
                name => {
                    let mut map = serde_json::Map::new();
                    map.insert(name.to_string(), inner);
                    serde_json::Value::Object(map)
                }
            }
        }
        ValueDef::Primitive(primitive) => primitive_to_json(primitive),
        ValueDef::BitSequence(bits) => serde_json::Value::String(format!("{:?}", bits)),
    }
}

/// Integers are strings so that u128 balances survive JSON.
fn primitive_to_json(primitive: &Primitive) -> serde_json::Value {
    match primitive {
        Primitive::Bool(b) => serde_json::Value::Bool(*b),
        Primitive::Char(c) => serde_json::Value::String(c.to_string()),
        Primitive::String(s) => serde_json::Value::String(s.clone()),
        Primitive::U128(n) => serde_json::Value::String(n.to_string()),
        Primitive::I128(n) => serde_json::Value::String(n.to_string()),
        Primitive::U256(n) => serde_json::Value::String(format!("0x{}", hex::encode(n))),
        Primitive::I256(n) => serde_json::Value::String(format!("0x{}", hex::encode(n))),
    }
}
