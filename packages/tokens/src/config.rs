// ABOUTME: Per-call configuration for token issuance and service-wide store settings
// ABOUTME: Replaces class-level length/expiry settings with explicit values

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tether_core::{
    validate_alphabet, validate_token_length, ValidationError, DEFAULT_ALPHABET,
    DEFAULT_TOKEN_LENGTH,
};

/// Settings for one class of tokens (password reset, invitation, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Number of characters in each generated value
    pub token_length: usize,
    /// Default lifetime; 0 means tokens never expire
    pub expires_after_minutes: u32,
    /// Characters token values are drawn from
    pub alphabet: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            token_length: DEFAULT_TOKEN_LENGTH,
            expires_after_minutes: 0,
            alphabet: DEFAULT_ALPHABET.to_string(),
        }
    }
}

impl TokenConfig {
    pub fn with_length(mut self, token_length: usize) -> Self {
        self.token_length = token_length;
        self
    }

    pub fn expiring_after_minutes(mut self, minutes: u32) -> Self {
        self.expires_after_minutes = minutes;
        self
    }

    pub fn with_alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = alphabet.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_token_length(self.token_length)?;
        validate_alphabet(&self.alphabet)
    }
}

/// Caller overrides for a single issued token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueOptions {
    /// Explicit expiry; always wins over the configured default
    pub expires_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
}

impl IssueOptions {
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Service-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Upper bound for every individual store call
    pub store_timeout: Option<Duration>,
}
