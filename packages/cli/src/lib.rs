// ABOUTME: Tether command-line library: configuration, logging, and token commands
// ABOUTME: The `tether` binary is a thin wrapper over these modules

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use commands::TokenCommands;
pub use config::{Config, ConfigError};
pub use error::CliError;
