use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

/// An endpoint under observation. Immutable once built from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    name: String,
    url: Url,
    protocol: Protocol,
}

impl ServiceTarget {
    pub fn new(name: &str, url: &str) -> Result<Self, ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid("service name cannot be empty".to_string()));
        }
        let parsed = Url::parse(url)
            .map_err(|e| ConfigError::Invalid(format!("service '{name}' has invalid url '{url}': {e}")))?;
        let protocol = match parsed.scheme() {
            "http" => Protocol::Http,
            "https" => Protocol::Https,
            other => {
                return Err(ConfigError::Invalid(format!(
                    "service '{name}' uses unsupported scheme '{other}'"
                )));
            }
        };
        Ok(Self {
            name: name.to_string(),
            url: parsed,
            protocol,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Up,
    Down,
    #[default]
    Unknown,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Up => "up",
            ServiceStatus::Down => "down",
            ServiceStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single probe attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub service: String,
    pub status: ServiceStatus,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl ProbeResult {
    pub fn up(service: &str, status_code: u16, response_time_ms: u64) -> Self {
        Self {
            service: service.to_string(),
            status: ServiceStatus::Up,
            status_code: Some(status_code),
            error: None,
            response_time_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn down(
        service: &str,
        status_code: Option<u16>,
        error: Option<String>,
        response_time_ms: u64,
    ) -> Self {
        Self {
            service: service.to_string(),
            status: ServiceStatus::Down,
            status_code,
            error,
            response_time_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == ServiceStatus::Up
    }
}

/// Per-target counters, mutated only by the monitor's check loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub total_checks: u64,
    pub uptime: u64,
    pub downtime: u64,
    pub consecutive_failures: u32,
    pub last_check: Option<DateTime<Utc>>,
    pub status: ServiceStatus,
}

impl ServiceStats {
    /// Folds one logical check result into the counters.
    pub fn record(&mut self, result: &ProbeResult) {
        self.total_checks += 1;
        self.last_check = Some(result.timestamp);

        match result.status {
            ServiceStatus::Up => {
                self.uptime += 1;
                self.consecutive_failures = 0;
                self.status = ServiceStatus::Up;
            }
            ServiceStatus::Down | ServiceStatus::Unknown => {
                self.downtime += 1;
                self.consecutive_failures += 1;
                self.status = ServiceStatus::Down;
            }
        }
    }

    /// Share of successful checks, rounded to two decimals; 0 before any check.
    pub fn uptime_percentage(&self) -> f64 {
        if self.total_checks == 0 {
            return 0.0;
        }
        let pct = self.uptime as f64 / self.total_checks as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }
}

/// One line of the append-only uptime log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub service: String,
    pub status: ServiceStatus,
    pub response_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ProbeResult> for LogEntry {
    fn from(result: &ProbeResult) -> Self {
        Self {
            timestamp: result.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            service: result.service.clone(),
            status: result.status,
            response_time: result.response_time_ms,
            status_code: result.status_code,
            error: result.error.clone(),
        }
    }
}
