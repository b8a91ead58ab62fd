use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;
use tracing::info;

use super::models::ServiceStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReport {
    pub name: String,
    pub url: String,
    pub status: ServiceStatus,
    pub uptime_percentage: f64,
    pub total_checks: u64,
    pub last_check: Option<DateTime<Utc>>,
}

/// Point-in-time summary of every target's statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeReport {
    /// 1-based count of reports emitted by the monitor; 0 for ad-hoc snapshots.
    pub sequence: u64,
    pub generated_at: DateTime<Utc>,
    pub services: Vec<ServiceReport>,
}

impl UptimeReport {
    /// Emits the report through the tracing subscriber, one event per service.
    pub fn log(&self) {
        info!(sequence = self.sequence, services = self.services.len(), "UPTIME REPORT");
        for service in &self.services {
            info!(
                service = %service.name,
                url = %service.url,
                status = %service.status,
                uptime_percentage = service.uptime_percentage,
                total_checks = service.total_checks,
                last_check = %format_last_check(service.last_check),
                "Service uptime summary."
            );
        }
    }
}

fn format_last_check(last_check: Option<DateTime<Utc>>) -> String {
    last_check
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "Never".to_string())
}

impl fmt::Display for UptimeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "UPTIME REPORT")?;
        writeln!(f, "================")?;
        for service in &self.services {
            writeln!(f, "[{}] {}", service.status.as_str().to_uppercase(), service.name)?;
            writeln!(f, "   URL: {}", service.url)?;
            writeln!(f, "   Uptime: {:.2}%", service.uptime_percentage)?;
            writeln!(f, "   Total Checks: {}", service.total_checks)?;
            writeln!(f, "   Last Check: {}", format_last_check(service.last_check))?;
        }
        Ok(())
    }
}
