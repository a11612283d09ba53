// ABOUTME: Input validation for token configuration and owner references
// ABOUTME: Rejects caller misuse before any randomness is drawn or any store is touched

use std::collections::HashSet;

use thiserror::Error;

use crate::types::TokenOwner;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Token length must be at least 1, got {0}")]
    TokenLength(usize),

    #[error("Token alphabet must not be empty")]
    EmptyAlphabet,

    #[error("Token alphabet may only contain printable ASCII characters, found {0:?}")]
    NonAsciiAlphabet(char),

    #[error("Token alphabet contains duplicate character {0:?}")]
    DuplicateAlphabetChar(char),

    #[error("Owner type must not be empty")]
    EmptyOwnerType,

    #[error("Owner {0} has not been persisted; tokens can only be bound to saved entities")]
    UnresolvedOwner(String),

    #[error("Expiry of {0} minutes from the issue time is out of range")]
    ExpiryOutOfRange(u32),
}

pub fn validate_token_length(length: usize) -> Result<(), ValidationError> {
    if length == 0 {
        return Err(ValidationError::TokenLength(length));
    }
    Ok(())
}

pub fn validate_alphabet(alphabet: &str) -> Result<(), ValidationError> {
    if alphabet.is_empty() {
        return Err(ValidationError::EmptyAlphabet);
    }

    let mut seen = HashSet::new();
    for c in alphabet.chars() {
        if !c.is_ascii_graphic() {
            return Err(ValidationError::NonAsciiAlphabet(c));
        }
        if !seen.insert(c) {
            return Err(ValidationError::DuplicateAlphabetChar(c));
        }
    }
    Ok(())
}

/// Returns the owner's id when the owner is persisted and well-formed
pub fn validate_owner<O: TokenOwner + ?Sized>(owner: &O) -> Result<String, ValidationError> {
    if owner.owner_type().trim().is_empty() {
        return Err(ValidationError::EmptyOwnerType);
    }

    match owner.owner_id() {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ValidationError::UnresolvedOwner(
            owner.owner_type().to_string(),
        )),
    }
}
