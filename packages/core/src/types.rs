// ABOUTME: Core type definitions for owner-bound tokens
// ABOUTME: Owner references, persisted token records, and the pre-insert token shape

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::redact_token;

/// Anything a token can be bound to.
///
/// `owner_id` returns `None` while the entity has not been persisted; tokens can
/// neither be issued for nor verified against such an owner.
pub trait TokenOwner {
    fn owner_type(&self) -> &str;
    fn owner_id(&self) -> Option<String>;
}

/// Explicit owner reference: a type tag plus the id of a persisted instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub owner_type: String,
    pub owner_id: Option<String>,
}

impl OwnerRef {
    pub fn new(owner_type: impl Into<String>, owner_id: impl ToString) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id: Some(owner_id.to_string()),
        }
    }

    /// Reference to an owner that has not been saved yet
    pub fn unsaved(owner_type: impl Into<String>) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&self.owner_id, Some(id) if !id.is_empty())
    }
}

impl TokenOwner for OwnerRef {
    fn owner_type(&self) -> &str {
        &self.owner_type
    }

    fn owner_id(&self) -> Option<String> {
        self.owner_id.clone()
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner_id {
            Some(id) => write!(f, "{}#{}", self.owner_type, id),
            None => write!(f, "{}#<unsaved>", self.owner_type),
        }
    }
}

/// Token stored in the database
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub id: String,
    pub value: String,
    pub name: Option<String>,
    pub owner_type: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    pub fn owner(&self) -> OwnerRef {
        OwnerRef::new(self.owner_type.clone(), &self.owner_id)
    }

    /// Exact match on both the owner type tag and the owner id
    pub fn is_bound_to(&self, owner_type: &str, owner_id: &str) -> bool {
        self.owner_type == owner_type && self.owner_id == owner_id
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("id", &self.id)
            .field("value", &redact_token(&self.value))
            .field("name", &self.name)
            .field("owner_type", &self.owner_type)
            .field("owner_id", &self.owner_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token ready to be inserted; the store assigns the id
#[derive(Clone, PartialEq, Eq)]
pub struct NewToken {
    pub value: String,
    pub name: Option<String>,
    pub owner_type: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewToken {
    pub fn into_record(self, id: String) -> TokenRecord {
        TokenRecord {
            id,
            value: self.value,
            name: self.name,
            owner_type: self.owner_type,
            owner_id: self.owner_id,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

impl fmt::Debug for NewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewToken")
            .field("value", &redact_token(&self.value))
            .field("name", &self.name)
            .field("owner_type", &self.owner_type)
            .field("owner_id", &self.owner_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
