use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error};

use super::senders::{NotificationSender, SenderError};
use super::senders::log::LogSender;
use super::senders::webhook::WebhookSender;
use crate::config::MonitorConfig;
use crate::monitor::alert::MonitorEvent;

/// Fans monitor events out to every configured sender.
///
/// Delivery failures and deliveries slower than `delivery_timeout` are logged
/// and dropped; a broken channel must never stop the check loop.
#[derive(Clone)]
pub struct NotificationService {
    senders: Vec<Arc<dyn NotificationSender>>,
    delivery_timeout: Duration,
}

const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

impl NotificationService {
    pub fn new(senders: Vec<Arc<dyn NotificationSender>>) -> Self {
        Self {
            senders,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    pub fn with_delivery_timeout(mut self, delivery_timeout: Duration) -> Self {
        self.delivery_timeout = delivery_timeout;
        self
    }

    /// Log channel, plus a webhook when one is configured. Deliveries share the
    /// probe timeout.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, SenderError> {
        let mut senders: Vec<Arc<dyn NotificationSender>> = vec![Arc::new(LogSender)];
        if let Some(url) = &config.alert_webhook_url {
            senders.push(Arc::new(WebhookSender::new(
                url.clone(),
                config.alert_webhook_template.clone(),
                config.timeout,
            )?));
        }
        Ok(Self::new(senders).with_delivery_timeout(config.timeout))
    }

    pub fn channel_count(&self) -> usize {
        self.senders.len()
    }

    pub async fn send_event(&self, event: &MonitorEvent) {
        let message = event.to_string();
        let context = event_context(event, &message);

        for sender in &self.senders {
            match timeout(self.delivery_timeout, sender.send(&message, &context)).await {
                Ok(Ok(())) => debug!(channel = sender.channel(), kind = event.kind(), "Notification delivered."),
                Ok(Err(e)) => error!(
                    channel = sender.channel(),
                    service = %event.service(),
                    error = %e,
                    "Failed to deliver monitor notification."
                ),
                Err(_) => error!(
                    channel = sender.channel(),
                    service = %event.service(),
                    timeout_ms = self.delivery_timeout.as_millis() as u64,
                    "Monitor notification timed out."
                ),
            }
        }
    }
}

fn event_context(event: &MonitorEvent, message: &str) -> HashMap<String, String> {
    let mut context = HashMap::from([
        ("service".to_string(), event.service().to_string()),
        ("kind".to_string(), event.kind().to_string()),
        ("message".to_string(), message.to_string()),
        (
            "timestamp".to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    ]);
    if let MonitorEvent::Alert {
        consecutive_failures,
        ..
    } = event
    {
        context.insert(
            "consecutive_failures".to_string(),
            consecutive_failures.to_string(),
        );
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::senders::SenderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, HashMap<String, String>)>>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        fn channel(&self) -> &str {
            "recording"
        }

        async fn send(&self, message: &str, context: &HashMap<String, String>) -> Result<(), SenderError> {
            self.sent
                .lock()
                .unwrap()
                .push((message.to_string(), context.clone()));
            Ok(())
        }
    }

    struct FailingSender;

    #[async_trait]
    impl NotificationSender for FailingSender {
        fn channel(&self) -> &str {
            "failing"
        }

        async fn send(&self, _: &str, _: &HashMap<String, String>) -> Result<(), SenderError> {
            Err(SenderError::SendFailed("unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn failing_channel_does_not_block_others() {
        let recorder = Arc::new(RecordingSender::default());
        let senders: Vec<Arc<dyn NotificationSender>> = vec![Arc::new(FailingSender), recorder.clone()];
        let service = NotificationService::new(senders);

        service
            .send_event(&MonitorEvent::Alert {
                service: "Frontend".to_string(),
                consecutive_failures: 4,
            })
            .await;

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ALERT: Frontend has been down for 4 consecutive checks");
        assert_eq!(sent[0].1["kind"], "alert");
        assert_eq!(sent[0].1["consecutive_failures"], "4");
    }

    struct StalledSender;

    #[async_trait]
    impl NotificationSender for StalledSender {
        fn channel(&self) -> &str {
            "stalled"
        }

        async fn send(&self, _: &str, _: &HashMap<String, String>) -> Result<(), SenderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_channel_is_cut_off() {
        let recorder = Arc::new(RecordingSender::default());
        let senders: Vec<Arc<dyn NotificationSender>> = vec![Arc::new(StalledSender), recorder.clone()];
        let service = NotificationService::new(senders).with_delivery_timeout(Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        service
            .send_event(&MonitorEvent::Recovery {
                service: "Frontend".to_string(),
            })
            .await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(3600));
        assert_eq!(recorder.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn webhook_channel_is_optional() {
        let mut config = MonitorConfig::default();
        assert_eq!(NotificationService::from_config(&config).unwrap().channel_count(), 1);

        config.alert_webhook_url = Some("https://hooks.example/uptime".to_string());
        assert_eq!(NotificationService::from_config(&config).unwrap().channel_count(), 2);

        config.alert_webhook_url = Some(String::new());
        assert!(matches!(
            NotificationService::from_config(&config),
            Err(SenderError::InvalidConfiguration(_))
        ));
    }
}
