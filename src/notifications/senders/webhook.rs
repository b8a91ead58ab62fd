use async_trait::async_trait;
use reqwest::{Client, header};
use std::collections::HashMap;
use std::time::Duration;
use tera::{Context, Tera};

use super::{NotificationSender, SenderError};

const DEFAULT_BODY_TEMPLATE: &str = r#"{"event": {{ kind | json_encode() }}, "service": {{ service | json_encode() }}, "message": {{ message | json_encode() }}, "timestamp": {{ timestamp | json_encode() }}}"#;

/// Pushes events to an HTTP endpoint as a JSON POST rendered from a Tera template.
pub struct WebhookSender {
    client: Client,
    url: String,
    body_template: String,
}

impl WebhookSender {
    /// `timeout` bounds each delivery, connect through response.
    pub fn new(
        url: impl Into<String>,
        body_template: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SenderError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(SenderError::InvalidConfiguration(
                "webhook url cannot be empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            body_template: body_template.unwrap_or_else(|| DEFAULT_BODY_TEMPLATE.to_string()),
        })
    }

    fn render(&self, message: &str, context: &HashMap<String, String>) -> Result<String, SenderError> {
        let mut tera_context = Context::new();
        for (key, value) in context {
            tera_context.insert(key, value);
        }
        if !context.contains_key("message") {
            tera_context.insert("message", message);
        }

        // The body is JSON, not HTML, so no autoescaping.
        Tera::one_off(&self.body_template, &tera_context, false)
            .map_err(|e| SenderError::TemplatingError(e.to_string()))
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    fn channel(&self) -> &str {
        "webhook"
    }

    async fn send(
        &self,
        message: &str,
        context: &HashMap<String, String>,
    ) -> Result<(), SenderError> {
        let rendered_body = self.render(message, context)?;

        let response = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(rendered_body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(SenderError::SendFailed(format!(
                "Webhook returned non-success status: {status}. Body: {error_body}"
            )));
        }

        Ok(())
    }
}
