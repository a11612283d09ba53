// ABOUTME: Expiry computation at issue time and expiry evaluation at load time
// ABOUTME: Expiry is a query-time predicate; nothing here deletes records

use chrono::{DateTime, Duration, Utc};
use tether_core::{TokenRecord, ValidationError};

use crate::error::{TokenError, TokenResult};

/// Default lifetime for one class of tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryPolicy {
    expires_after_minutes: u32,
}

impl ExpiryPolicy {
    pub fn new(expires_after_minutes: u32) -> Self {
        Self {
            expires_after_minutes,
        }
    }

    /// `now + minutes` when `minutes > 0`, otherwise no expiry.
    ///
    /// A sum past the representable range is an error, never "no expiry".
    pub fn compute_default_expiry(
        now: DateTime<Utc>,
        minutes: u32,
    ) -> TokenResult<Option<DateTime<Utc>>> {
        if minutes == 0 {
            return Ok(None);
        }
        now.checked_add_signed(Duration::minutes(i64::from(minutes)))
            .map(Some)
            .ok_or(TokenError::InvalidArgument(
                ValidationError::ExpiryOutOfRange(minutes),
            ))
    }

    /// Expiry to store for a new token; an explicit value is never replaced
    pub fn stamp(
        &self,
        explicit: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> TokenResult<Option<DateTime<Utc>>> {
        match explicit {
            Some(at) => Ok(Some(at)),
            None => Self::compute_default_expiry(now, self.expires_after_minutes),
        }
    }

    /// True iff the record has an expiry strictly before `now`
    pub fn is_expired(record: &TokenRecord, now: DateTime<Utc>) -> bool {
        matches!(record.expires_at, Some(expires_at) if expires_at < now)
    }

    pub fn ensure_not_expired(record: &TokenRecord, now: DateTime<Utc>) -> TokenResult<()> {
        match record.expires_at {
            Some(expired_at) if expired_at < now => Err(TokenError::Expired { expired_at }),
            _ => Ok(()),
        }
    }
}
