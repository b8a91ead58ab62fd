use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

pub mod log;
pub mod webhook;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Templating error: {0}")]
    TemplatingError(String),
}

/// Delivers monitor alert and recovery messages to one channel.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Short channel name used in logs.
    fn channel(&self) -> &str;

    /// Sends a notification.
    ///
    /// * `message` - Human-readable event text.
    /// * `context` - Event fields for channels that render templates
    ///   (`service`, `kind`, `message`, `consecutive_failures`, `timestamp`).
    async fn send(
        &self,
        message: &str,
        context: &HashMap<String, String>,
    ) -> Result<(), SenderError>;
}
