// ABOUTME: Storage configuration for the SQLite token database
// ABOUTME: Database location and connection pool settings

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
    pub enable_wal: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_connections: 10,
            busy_timeout_seconds: 30,
            enable_wal: true,
        }
    }
}

impl StorageConfig {
    pub fn at(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }
}

/// `~/.tether/tokens.db`, or `./tokens.db` when no home directory is known
pub fn default_database_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".tether").join("tokens.db"),
        None => PathBuf::from("tokens.db"),
    }
}
