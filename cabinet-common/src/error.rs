//! Common error types for the cabinet crates

use thiserror::Error;

/// Common result type for cabinet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the cabinet crates
#[derive(Error, Debug)]
pub enum Error {
    /// TOML file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
