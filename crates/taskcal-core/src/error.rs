//! Core error types for taskcal-core.
//!
//! This module defines the error hierarchy using thiserror. Configuration
//! errors are fatal at startup; calendar read failures never reach this type
//! (they are logged and replaced by an empty result, see
//! [`crate::calendar::events_between`]); calendar write failures and history
//! persistence failures propagate to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for taskcal-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote calendar errors
    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// History store errors
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Credential storage errors
    #[error("Credential error: {0}")]
    Credentials(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Remote calendar errors.
#[derive(Error, Debug)]
pub enum CalendarError {
    /// The API answered with a non-success status
    #[error("calendar api error: http {status}: {body}")]
    Api { status: u16, body: String },

    /// The request never produced a response
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded
    #[error("invalid calendar payload: {0}")]
    Payload(String),

    /// No access token could be found
    #[error("no access token configured (set TASKCAL_GOOGLE_TOKEN or run `taskcal auth set-token`)")]
    MissingToken,

    /// A local date-time does not exist or is ambiguous in the configured zone
    #[error("cannot place {0} in the configured time zone")]
    InvalidInstant(String),

    /// Event not found (in-memory calendar)
    #[error("event '{0}' not found")]
    NotFound(String),
}

/// History store errors.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Failed to read/write a history file
    #[error("Failed to access history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A history file could not be (de)serialized
    #[error("Malformed history file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A history identifier is not a `YYYYMMDDHHMMSS` timestamp
    #[error("Invalid history identifier '{0}'")]
    InvalidId(String),
}

impl From<reqwest::Error> for CalendarError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CalendarError::Payload(err.to_string())
        } else {
            CalendarError::Network(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
