use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{info, warn};

use super::{NotificationSender, SenderError};

/// Writes events to the tracing subscriber; always enabled.
#[derive(Debug, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    fn channel(&self) -> &str {
        "log"
    }

    async fn send(
        &self,
        message: &str,
        context: &HashMap<String, String>,
    ) -> Result<(), SenderError> {
        let service = context.get("service").map(String::as_str).unwrap_or("unknown");
        match context.get("kind").map(String::as_str) {
            Some("alert") => warn!(service = %service, "{message}"),
            _ => info!(service = %service, "{message}"),
        }
        Ok(())
    }
}
