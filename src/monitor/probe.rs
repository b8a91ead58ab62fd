use async_trait::async_trait;
use reqwest::{Client, redirect::Policy};
use std::time::{Duration, Instant};
use tracing::debug;

use super::MonitorError;
use super::models::{ProbeResult, ServiceTarget};
use crate::version::monitor_user_agent;

/// Issues a single health-check request against a target.
///
/// Implementations never fail: every outcome, including timeouts and
/// connection errors, is reported as a [`ProbeResult`].
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &ServiceTarget) -> ProbeResult;
}

/// Probes targets with a plain HTTP GET.
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, MonitorError> {
        // Redirects are not followed: a 3xx answer already proves the service is up.
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .user_agent(monitor_user_agent())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &ServiceTarget) -> ProbeResult {
        let start_time = Instant::now();
        let result = self.client.get(target.url().clone()).send().await;
        let response_time_ms = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let status = response.status();
                debug!(service = %target.name(), status = %status, "Probe answered.");
                if (200..400).contains(&status.as_u16()) {
                    ProbeResult::up(target.name(), status.as_u16(), response_time_ms)
                } else {
                    ProbeResult::down(
                        target.name(),
                        Some(status.as_u16()),
                        Some(format!("Unexpected status {status}")),
                        response_time_ms,
                    )
                }
            }
            Err(e) => {
                let error_details = if e.is_timeout() {
                    "Request timeout".to_string()
                } else {
                    e.to_string()
                };
                ProbeResult::down(target.name(), None, Some(error_details), response_time_ms)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::models::ServiceStatus;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn probe_status(code: u16) -> ProbeResult {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(code).insert_header("Location", "/moved"))
            .mount(&server)
            .await;

        let target = ServiceTarget::new("Backend API", &format!("{}/api/health", server.uri())).unwrap();
        HttpProber::new(Duration::from_secs(5)).unwrap().probe(&target).await
    }

    #[tokio::test]
    async fn success_status_is_up() {
        let result = probe_status(200).await;
        assert_eq!(result.status, ServiceStatus::Up);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(result.service, "Backend API");
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn redirect_is_up_and_not_followed() {
        let result = probe_status(302).await;
        assert_eq!(result.status, ServiceStatus::Up);
        assert_eq!(result.status_code, Some(302));
    }

    #[tokio::test]
    async fn client_and_server_errors_are_down() {
        for code in [400, 404, 503] {
            let result = probe_status(code).await;
            assert_eq!(result.status, ServiceStatus::Down, "status {code}");
            assert_eq!(result.status_code, Some(code));
            assert!(result.error.is_some());
        }
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let target = ServiceTarget::new("Frontend", &server.uri()).unwrap();
        let result = HttpProber::new(Duration::from_millis(100))
            .unwrap()
            .probe(&target)
            .await;

        assert_eq!(result.status, ServiceStatus::Down);
        assert_eq!(result.error.as_deref(), Some("Request timeout"));
        assert!(result.status_code.is_none());
    }

    #[tokio::test]
    async fn connection_error_is_down() {
        let target = ServiceTarget::new("Nowhere", "http://127.0.0.1:1/").unwrap();
        let result = HttpProber::new(Duration::from_secs(2))
            .unwrap()
            .probe(&target)
            .await;

        assert_eq!(result.status, ServiceStatus::Down);
        assert!(result.status_code.is_none());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let target = ServiceTarget::new("Frontend", &server.uri()).unwrap();
        let result = HttpProber::new(Duration::from_secs(5))
            .unwrap()
            .probe(&target)
            .await;
        assert!(result.is_up());
    }
}
