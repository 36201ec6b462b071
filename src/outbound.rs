//! Outbound message delivery
//!
//! The orchestrator sends replies through the [`MessageSender`] seam.
//! [`TwilioSender`] posts to the Twilio Messages API; [`ConsoleSender`]
//! logs instead of sending, for local runs without credentials.
//!
//! Delivery failures are logged by callers and never retried or
//! escalated; the user simply resends if a reply goes missing.

use crate::config::TwilioConfig;
use crate::error::{ClinicbotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.twilio.com/2010-04-01";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Outbound messaging capability
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Sends one message to a user identity
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers log and move on.
    async fn send(&self, user_id: &str, text: &str) -> Result<()>;
}

/// Twilio Messages API sender
///
/// Posts form-encoded messages with basic auth. `api_base` can be
/// overridden to point at a mock server in tests.
pub struct TwilioSender {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSender {
    /// Creates a sender from configuration
    ///
    /// # Errors
    ///
    /// Returns `ClinicbotError::MissingCredentials` if no auth token is
    /// configured and `TWILIO_AUTH_TOKEN` is unset, or an HTTP error if
    /// the client cannot be built.
    pub fn new(config: TwilioConfig) -> Result<Self> {
        let auth_token = match config.auth_token {
            Some(token) if !token.is_empty() => token,
            _ => std::env::var("TWILIO_AUTH_TOKEN")
                .map_err(|_| ClinicbotError::MissingCredentials("twilio".to_string()))?,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ClinicbotError::Http)?;

        Ok(Self {
            client,
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            account_sid: config.account_sid,
            auth_token,
            from_number: config.from_number,
        })
    }
}

#[async_trait]
impl MessageSender for TwilioSender {
    async fn send(&self, user_id: &str, text: &str) -> Result<()> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", user_id), ("From", &self.from_number), ("Body", text)])
            .send()
            .await
            .map_err(ClinicbotError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClinicbotError::Send(format!(
                "Twilio API returned {}: {}",
                status, body
            ))
            .into());
        }

        tracing::debug!("Sent message to {} ({} characters)", user_id, text.len());
        Ok(())
    }
}

/// Sender that logs messages instead of delivering them
///
/// Used by `serve --dry-run` so the full pipeline can be exercised
/// without Twilio credentials.
pub struct ConsoleSender;

#[async_trait]
impl MessageSender for ConsoleSender {
    async fn send(&self, user_id: &str, text: &str) -> Result<()> {
        tracing::info!("[outbound to {}] {}", user_id, text);
        Ok(())
    }
}
