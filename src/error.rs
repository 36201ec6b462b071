//! Error types for Clinicbot
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Clinicbot operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, chat provider calls, session and appointment
/// persistence, and outbound message delivery.
#[derive(Error, Debug)]
pub enum ClinicbotError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chat provider errors (API calls, authentication, malformed replies)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Session or appointment storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Outbound message delivery errors
    #[error("Send error: {0}")]
    Send(String),

    /// Missing credentials for an external service
    #[error("Missing credentials for: {0}")]
    MissingCredentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Clinicbot operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
