// ABOUTME: Core types, constants, and validation for Tether owner-bound tokens
// ABOUTME: Foundational package shared by the token service, storage adapters, and CLI

pub mod constants;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types
pub use types::{NewToken, OwnerRef, TokenOwner, TokenRecord};

// Re-export constants
pub use constants::{
    DEFAULT_ALPHABET, DEFAULT_TOKEN_LENGTH, EXPIRED_MESSAGE, MAX_GENERATION_ATTEMPTS,
    NOT_FOUND_MESSAGE,
};

// Re-export utilities
pub use utils::redact_token;

// Re-export validation
pub use validation::{validate_alphabet, validate_owner, validate_token_length, ValidationError};
