//! Centralized error types for the Zenith application.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for UI display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// All errors in the Zenith application should be convertible to this type.
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Service-level errors (task store, reminders) that can be mapped from
    /// consumer crates.
    #[error("Service error: {0}")]
    Service(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    ///
    /// These messages are designed to be actionable and non-technical.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Storage(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Session(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Service(_) => "Something went wrong. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Local storage errors (key-value files, SQLite).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => {
                "Unable to access local data. Try restarting the app."
            }
            StorageError::ReadFailed(_) => "Failed to load your tasks. Please try again.",
            StorageError::WriteFailed(_) => {
                "Your latest change may not have been saved. Please try again."
            }
            StorageError::Corruption(_) => {
                "Local data may be corrupted. Consider resetting app data."
            }
            StorageError::MigrationFailed(_) => {
                "Failed to update local data. Try restarting the app."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

/// Session errors.
///
/// The session is a plain display name with no identity verification, so the
/// taxonomy is small.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid username: {0}")]
    InvalidUsername(String),
}

impl SessionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::NotSignedIn => "Not signed in. Enter a username to get started.",
            SessionError::InvalidUsername(_) => "Please enter a username.",
        }
    }
}
