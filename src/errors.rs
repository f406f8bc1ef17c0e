//! Error types for the house tracker
//!
//! Category enums carry the context; `TrackerError` is the root that crosses
//! module boundaries. Feed errors live in their own module and convert into
//! the root here. Decode failures never reach the root; the poller counts them.

use crate::feed::FeedError;
use std::fmt;

/// Root error type for all tracker operations
#[derive(Debug)]
pub enum TrackerError {
    /// Configuration loading and validation
    Configuration(ConfigurationError),

    /// Remote event feed failures
    Feed(FeedError),

    /// Checkpoint storage
    Storage(StorageError),
}

/// Configuration and validation errors
#[derive(Debug)]
pub enum ConfigurationError {
    ValidationFailed(String),
    MissingRequired(String),
    InvalidValue { field: String, value: String, reason: String },
    UnknownGame(String),
    LoadFailed(String),
    SaveFailed(String),
}

/// Checkpoint storage errors
#[derive(Debug)]
pub enum StorageError {
    DatabaseOpenFailed(String),
    ReadFailed(String),
    WriteFailed(String),
    CorruptedData(String),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Configuration(e) => write!(f, "Configuration error: {}", e),
            TrackerError::Feed(e) => write!(f, "Feed error: {}", e),
            TrackerError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            ConfigurationError::MissingRequired(field) => write!(f, "Missing required field: {}", field),
            ConfigurationError::InvalidValue { field, value, reason } => {
                write!(f, "Invalid value for {}: '{}' ({})", field, value, reason)
            }
            ConfigurationError::UnknownGame(id) => write!(f, "Unknown game: {}", id),
            ConfigurationError::LoadFailed(msg) => write!(f, "Failed to load configuration: {}", msg),
            ConfigurationError::SaveFailed(msg) => write!(f, "Failed to save configuration: {}", msg),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseOpenFailed(msg) => write!(f, "Database open failed: {}", msg),
            StorageError::ReadFailed(msg) => write!(f, "Read failed: {}", msg),
            StorageError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            StorageError::CorruptedData(msg) => write!(f, "Corrupted data: {}", msg),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackerError::Configuration(e) => Some(e),
            TrackerError::Feed(e) => Some(e),
            TrackerError::Storage(e) => Some(e),
        }
    }
}

impl std::error::Error for ConfigurationError {}
impl std::error::Error for StorageError {}

impl From<ConfigurationError> for TrackerError {
    fn from(e: ConfigurationError) -> Self {
        TrackerError::Configuration(e)
    }
}

impl From<StorageError> for TrackerError {
    fn from(e: StorageError) -> Self {
        TrackerError::Storage(e)
    }
}

impl From<FeedError> for TrackerError {
    fn from(e: FeedError) -> Self {
        TrackerError::Feed(e)
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(e: std::io::Error) -> Self {
        TrackerError::Storage(StorageError::ReadFailed(e.to_string()))
    }
}

/// Convenience alias for tracker results
pub type TrackerResult<T> = Result<T, TrackerError>;
