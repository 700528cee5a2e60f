//! Fixed-point amount parsing and formatting.
//!
//! Raw chain amounts are integers scaled by `10^decimals`. Formatting stays in
//! integer arithmetic so the integer part survives the full `u128` range.

/// Decimal places of DALLA and bBZD balances on BelizeChain.
///
/// Some published BelizeChain figures (`500000000000` shown as `500.00`)
/// assume 9 decimals instead. Set `CHAIN_DECIMALS` to match the runtime's
/// token metadata when amounts come out a factor of 1000 off.
pub const DEFAULT_DECIMALS: u32 = 12;

/// Number of fractional digits shown to users.
const DISPLAY_DIGITS: u32 = 2;

fn pow10(exp: u32) -> Option<u128> {
    10u128.checked_pow(exp)
}

/// Format a raw amount in human units with exactly two fractional digits.
///
/// Excess precision is truncated, not rounded.
pub fn format_amount(raw: u128, decimals: u32) -> String {
    let (integer, fraction) = if decimals <= DISPLAY_DIGITS {
        // Every decimal is shown, pad the rest with zeros.
        let scale = 10u128.pow(decimals);
        let pad = 10u128.pow(DISPLAY_DIGITS - decimals);
        (raw / scale, (raw % scale) * pad)
    } else {
        match pow10(decimals) {
            Some(scale) => {
                let divisor = 10u128.pow(decimals - DISPLAY_DIGITS);
                (raw / scale, (raw % scale) / divisor)
            }
            // Scale exceeds u128, so the integer part is zero.
            None => {
                let fraction = pow10(decimals - DISPLAY_DIGITS)
                    .map(|divisor| raw / divisor)
                    .unwrap_or(0);
                (0, fraction)
            }
        }
    };

    format!("{}.{:02}", integer, fraction)
}

/// Parse a raw amount from JSON.
///
/// Handles JSON numbers, decimal strings (with optional thousands separators)
/// and `0x`-prefixed hex strings. JSON numbers are limited to u64 but chain
/// amounts can be u128, so large values arrive as strings.
pub fn parse_amount(value: &serde_json::Value) -> Option<u128> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(u128::from),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if let Some(hex_digits) = s.strip_prefix("0x") {
                return u128::from_str_radix(hex_digits, 16).ok();
            }
            let digits: String = s.chars().filter(|c| *c != ',').collect();
            digits.parse().ok()
        }
        _ => None,
    }
}
