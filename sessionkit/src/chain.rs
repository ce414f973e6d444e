//! Chain id helpers.
//!
//! EIP-1193 exchanges chain ids as `0x`-prefixed hex strings while the
//! remote wallet and relayer use plain integers. These helpers convert
//! between the two and accept the looser forms wallets send in practice.

use serde_json::Value;

/// An EIP-155 chain ID (e.g., 1 for Ethereum, 8453 for Base).
pub type ChainId = u64;

/// Formats a chain ID as the hex string returned by `eth_chainId`.
///
/// Example: `to_hex_chain_id(137)` returns `"0x89"`.
#[must_use]
pub fn to_hex_chain_id(chain_id: ChainId) -> String {
    format!("0x{chain_id:x}")
}

/// Parses a chain ID given either as `0x`-prefixed hex or as a decimal string.
#[must_use]
pub fn parse_chain_id(input: &str) -> Option<ChainId> {
    let input = input.trim();
    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        if hex.is_empty() {
            return None;
        }
        ChainId::from_str_radix(hex, 16).ok()
    } else {
        input.parse().ok()
    }
}

/// Parses a chain ID from a JSON value (string or non-negative integer).
#[must_use]
pub fn parse_chain_id_value(value: &Value) -> Option<ChainId> {
    match value {
        Value::String(s) => parse_chain_id(s),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}
