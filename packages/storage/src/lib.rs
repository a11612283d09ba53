// ABOUTME: Data layer and persistence for Tether tokens
// ABOUTME: SQLite-backed TokenStore with embedded migrations

pub mod config;
pub mod sqlite;

use thiserror::Error;

pub use config::StorageConfig;
pub use sqlite::SqliteTokenStore;

/// Errors raised while opening or migrating the database
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StorageResult<T> = Result<T, StorageError>;
