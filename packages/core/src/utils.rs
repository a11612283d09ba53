// ABOUTME: Shared utility functions for Tether
// ABOUTME: Log-safe rendering of token values

use crate::constants::REDACTED_PREFIX_LEN;

/// Render a token value for logs: keeps a short prefix, never the full secret
pub fn redact_token(value: &str) -> String {
    let prefix: String = value.chars().take(REDACTED_PREFIX_LEN).collect();
    if prefix.len() < value.len() {
        format!("{}…", prefix)
    } else {
        // Short values are test fixtures or garbage input; hide them entirely
        "…".to_string()
    }
}
