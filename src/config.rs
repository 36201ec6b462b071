//! Configuration management for Clinicbot
//!
//! This module handles loading, parsing, and validating configuration
//! from a YAML file with environment variable overrides for credentials.

use crate::error::{ClinicbotError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Clinicbot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gemini chat provider settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Twilio outbound messaging settings
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Session and appointment storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Webhook server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Conversation behavior settings
    #[serde(default)]
    pub bot: BotConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model to use for chat completions
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Optional API base URL override (useful for tests and local mocks)
    #[serde(default)]
    pub api_base: Option<String>,

    /// API key; falls back to the `GEMINI_API_KEY` environment variable
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_base: None,
            api_key: None,
        }
    }
}

/// Twilio messaging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwilioConfig {
    /// Twilio account SID
    #[serde(default)]
    pub account_sid: String,

    /// Auth token; falls back to the `TWILIO_AUTH_TOKEN` environment variable
    #[serde(default)]
    pub auth_token: Option<String>,

    /// The WhatsApp-enabled sender number, e.g. "whatsapp:+15550000000"
    #[serde(default)]
    pub from_number: String,

    /// Optional API base URL override (useful for tests and local mocks)
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the session database directory
    #[serde(default = "default_sessions_path")]
    pub sessions_path: String,

    /// Path to the appointment database directory
    #[serde(default = "default_appointments_path")]
    pub appointments_path: String,
}

fn default_sessions_path() -> String {
    "data/sessions.db".to_string()
}

fn default_appointments_path() -> String {
    "data/appointments.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sessions_path: default_sessions_path(),
            appointments_path: default_appointments_path(),
        }
    }
}

/// Webhook server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the webhook
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Dispatch queue depth before inbound requests see backpressure
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Conversation behavior configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// Send a "Thinking..." message before processing each reply
    #[serde(default)]
    pub thinking_message: bool,
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// Missing files fall back to defaults with a warning, so `serve
    /// --dry-run` works out of the box.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClinicbotError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ClinicbotError::Config(format!("Failed to parse config: {}", e)).into())
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns error if a value is structurally invalid (credentials are
    /// checked later, when the component needing them is built)
    pub fn validate(&self) -> Result<()> {
        if self.gemini.model.is_empty() {
            return Err(ClinicbotError::Config("gemini.model must not be empty".to_string()).into());
        }
        if self.server.queue_capacity == 0 {
            return Err(
                ClinicbotError::Config("server.queue_capacity must be at least 1".to_string())
                    .into(),
            );
        }
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ClinicbotError::Config(format!(
                "server.bind is not a valid socket address: {}",
                self.server.bind
            ))
            .into());
        }
        Ok(())
    }
}
