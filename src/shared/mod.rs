//! Small helpers shared by the codec, the envelope builder and the signer.

use chrono::Utc;

/// Strip a single leading `0x` from a hex string, if present.
pub fn strip_hex_prefix(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}

/// True if the string is non-empty and contains only hex digits (no `0x`).
pub fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Current time in Unix epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
