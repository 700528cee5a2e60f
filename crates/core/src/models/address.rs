//! Account address parsing.

/// Parse an account address from various JSON representations.
///
/// Handles the shapes nodes and clients produce for `AccountId` and
/// `MultiAddress` values:
/// - Plain string: `"5Grw..."` or `"0x1234..."`
/// - Wrapped object: `{ "Id": "5Grw..." }`
/// - Array wrapper: `["5Grw..."]`
pub fn parse_address(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Object(obj) => obj
            .get("Id")
            .or_else(|| obj.get("id"))
            .and_then(parse_address),
        serde_json::Value::Array(arr) if arr.len() == 1 => parse_address(&arr[0]),
        _ => None,
    }
}
