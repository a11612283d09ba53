// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Tether

// Storage Configuration
pub const TETHER_DATABASE_PATH: &str = "TETHER_DATABASE_PATH";
pub const TETHER_MAX_CONNECTIONS: &str = "TETHER_MAX_CONNECTIONS";
pub const TETHER_BUSY_TIMEOUT_SECS: &str = "TETHER_BUSY_TIMEOUT_SECS";

// Token Defaults
pub const TETHER_TOKEN_LENGTH: &str = "TETHER_TOKEN_LENGTH";
pub const TETHER_TOKEN_EXPIRES_AFTER_MINUTES: &str = "TETHER_TOKEN_EXPIRES_AFTER_MINUTES";
pub const TETHER_TOKEN_ALPHABET: &str = "TETHER_TOKEN_ALPHABET";

// Service Configuration
pub const TETHER_STORE_TIMEOUT_SECS: &str = "TETHER_STORE_TIMEOUT_SECS";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";
