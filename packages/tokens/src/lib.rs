// ABOUTME: Tether token library: issue, store, and verify opaque owner-bound tokens
// ABOUTME: Secure generation, load-time expiry checks, and strict ownership matching

pub mod config;
pub mod error;
pub mod expiry;
pub mod generator;
pub mod memory;
pub mod service;
pub mod store;

// Re-export main types
pub use config::{IssueOptions, ServiceConfig, TokenConfig};
pub use error::{TokenError, TokenErrorKind, TokenResult};
pub use expiry::ExpiryPolicy;
pub use generator::RandomStringGenerator;
pub use memory::InMemoryTokenStore;
pub use service::TokenService;
pub use store::{StoreError, StoreResult, TokenStore};

pub use tether_core::{NewToken, OwnerRef, TokenOwner, TokenRecord};
