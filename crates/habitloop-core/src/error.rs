//! Core error types for habitloop-core.
//!
//! This module defines the error hierarchy using thiserror. The engines are
//! total for well-formed input, so the only analytics failures are a reversed
//! date range and an out-of-bounds frequency; everything else comes from
//! validating caller-supplied data or from the configuration file.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for habitloop-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Requested end date precedes the start date
    #[error("Empty range: to_date ({to}) precedes from_date ({from})")]
    EmptyRange { from: NaiveDate, to: NaiveDate },

    /// Frequency numerator or denominator outside 1..=365
    #[error("Invalid frequency {numerator}/{denominator}: both parts must be in 1..=365")]
    InvalidFrequency { numerator: u32, denominator: u32 },

    /// Validation errors on caller-supplied data
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Integer code that maps to no entry status
    #[error("Unknown entry status code: {0}")]
    UnknownStatusCode(i64),

    /// Weekday mask wider than seven bits
    #[error("Invalid weekday mask {0}: must be in 0..=127")]
    InvalidWeekdayMask(u8),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
