// ABOUTME: Environment-driven configuration for the tether binary
// ABOUTME: Builds storage, token default and service settings from TETHER_* variables

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use tether_config::{
    TETHER_BUSY_TIMEOUT_SECS, TETHER_DATABASE_PATH, TETHER_MAX_CONNECTIONS,
    TETHER_STORE_TIMEOUT_SECS, TETHER_TOKEN_ALPHABET, TETHER_TOKEN_EXPIRES_AFTER_MINUTES,
    TETHER_TOKEN_LENGTH,
};
use tether_core::ValidationError;
use tether_storage::StorageConfig;
use tether_tokens::{ServiceConfig, TokenConfig};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {source}")]
    InvalidNumber {
        name: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("Invalid token defaults: {0}")]
    InvalidTokenDefaults(#[from] ValidationError),
    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub token: TokenConfig,
    pub service: ServiceConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut storage = StorageConfig::default();
        if let Ok(path) = env::var(TETHER_DATABASE_PATH) {
            if !path.trim().is_empty() {
                storage.database_path = PathBuf::from(path);
            }
        }
        if let Some(max) = parse_var::<u32>(TETHER_MAX_CONNECTIONS)? {
            if max == 0 {
                return Err(ConfigError::MustBePositive(TETHER_MAX_CONNECTIONS));
            }
            storage.max_connections = max;
        }
        if let Some(secs) = parse_var::<u64>(TETHER_BUSY_TIMEOUT_SECS)? {
            storage.busy_timeout_seconds = secs;
        }

        let mut token = TokenConfig::default();
        if let Some(length) = parse_var::<usize>(TETHER_TOKEN_LENGTH)? {
            token.token_length = length;
        }
        if let Some(minutes) = parse_var::<u32>(TETHER_TOKEN_EXPIRES_AFTER_MINUTES)? {
            token.expires_after_minutes = minutes;
        }
        if let Ok(alphabet) = env::var(TETHER_TOKEN_ALPHABET) {
            if !alphabet.is_empty() {
                token.alphabet = alphabet;
            }
        }
        token.validate()?;

        // 0 disables the per-call store timeout
        let store_timeout = parse_var::<u64>(TETHER_STORE_TIMEOUT_SECS)?.unwrap_or(10);
        let service = ServiceConfig {
            store_timeout: (store_timeout > 0).then(|| Duration::from_secs(store_timeout)),
        };

        Ok(Config {
            storage,
            token,
            service,
        })
    }
}

fn parse_var<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|source| ConfigError::InvalidNumber { name, source }),
        _ => Ok(None),
    }
}
