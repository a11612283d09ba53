// ABOUTME: Shared constants for token generation and user-facing messages
// ABOUTME: Defaults mirror the behaviour callers get when no TokenConfig overrides are set

/// Number of characters in a generated token unless configured otherwise
pub const DEFAULT_TOKEN_LENGTH: usize = 64;

/// Mixed-case alphanumeric alphabet used for generated tokens
pub const DEFAULT_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Maximum number of values generated for a single issue before giving up on collisions
pub const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Message shown for both unknown tokens and tokens bound to another owner
pub const NOT_FOUND_MESSAGE: &str = "The token could not be found.";

/// Message shown for tokens past their expiry
pub const EXPIRED_MESSAGE: &str = "The token has expired.";

/// Number of leading characters kept when a token value is written to logs
pub const REDACTED_PREFIX_LEN: usize = 8;
