// ABOUTME: Error types for issuing and verifying tokens
// ABOUTME: Typed kinds for callers plus the user-facing message policy

use chrono::{DateTime, Utc};
use tether_core::{ValidationError, EXPIRED_MESSAGE, NOT_FOUND_MESSAGE};
use thiserror::Error;

use crate::store::StoreError;

pub type TokenResult<T> = Result<T, TokenError>;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token generation failed: {0}")]
    Generation(String),

    #[error("Token not found")]
    NotFound,

    // Details about the real owner stay out of the message; the service logs them
    #[error("Token is bound to a different owner")]
    OwnershipMismatch,

    #[error("The token is expired, it expired at {}", .expired_at.to_rfc3339())]
    Expired { expired_at: DateTime<Utc> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Discriminant of [`TokenError`] for branching without matching on payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenErrorKind {
    Generation,
    NotFound,
    OwnershipMismatch,
    Expired,
    InvalidArgument,
    Storage,
}

impl TokenError {
    pub fn kind(&self) -> TokenErrorKind {
        match self {
            Self::Generation(_) => TokenErrorKind::Generation,
            Self::NotFound => TokenErrorKind::NotFound,
            Self::OwnershipMismatch => TokenErrorKind::OwnershipMismatch,
            Self::Expired { .. } => TokenErrorKind::Expired,
            Self::InvalidArgument(_) => TokenErrorKind::InvalidArgument,
            Self::Storage(_) => TokenErrorKind::Storage,
        }
    }

    /// True for the kinds that must look identical to an end user
    pub fn is_not_found_class(&self) -> bool {
        matches!(self, Self::NotFound | Self::OwnershipMismatch)
    }

    /// Message safe to show the person who presented the token.
    ///
    /// Unknown tokens and tokens owned by someone else share one message so the
    /// response cannot be used to probe which tokens exist.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::NotFound | Self::OwnershipMismatch => NOT_FOUND_MESSAGE,
            Self::Expired { .. } => EXPIRED_MESSAGE,
            Self::InvalidArgument(_) => "The request was invalid.",
            Self::Generation(_) | Self::Storage(_) => "The token service is unavailable.",
        }
    }
}
