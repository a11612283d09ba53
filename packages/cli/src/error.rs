// ABOUTME: Error type for CLI commands
// ABOUTME: Separates token failures (shown with their public message) from usage errors

use tether_tokens::TokenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Invalid timestamp {0:?}: expected RFC 3339, e.g. 2024-06-01T12:00:00Z")]
    InvalidTimestamp(String),
}

impl CliError {
    /// Text shown to the operator. Token errors use the same wording an end user would see.
    pub fn user_message(&self, verbose: bool) -> String {
        match self {
            CliError::Token(err) if verbose => format!("{} ({})", err.public_message(), err),
            CliError::Token(err) => err.public_message().to_string(),
            other => other.to_string(),
        }
    }
}
