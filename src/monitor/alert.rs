use serde::Serialize;
use std::fmt;

use super::models::{ProbeResult, ServiceStats};

/// Signal raised for the notification layer after a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MonitorEvent {
    Alert {
        service: String,
        consecutive_failures: u32,
    },
    Recovery {
        service: String,
    },
}

impl MonitorEvent {
    pub fn service(&self) -> &str {
        match self {
            MonitorEvent::Alert { service, .. } | MonitorEvent::Recovery { service } => service,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MonitorEvent::Alert { .. } => "alert",
            MonitorEvent::Recovery { .. } => "recovery",
        }
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::Alert {
                service,
                consecutive_failures,
            } => write!(
                f,
                "ALERT: {service} has been down for {consecutive_failures} consecutive checks"
            ),
            MonitorEvent::Recovery { service } => write!(f, "RECOVERY: {service} is back online"),
        }
    }
}

/// Decides which event, if any, a check raises. `stats` must already include `result`.
///
/// The alert is level-triggered: it repeats on every check while the failure
/// streak stays at or above `threshold`. Recovery fires on any `up` result once
/// the target has been down at least once.
pub fn evaluate_alert(stats: &ServiceStats, result: &ProbeResult, threshold: u32) -> Option<MonitorEvent> {
    if stats.consecutive_failures >= threshold {
        return Some(MonitorEvent::Alert {
            service: result.service.clone(),
            consecutive_failures: stats.consecutive_failures,
        });
    }

    if result.is_up() && stats.consecutive_failures == 0 && stats.downtime > 0 {
        return Some(MonitorEvent::Recovery {
            service: result.service.clone(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down() -> ProbeResult {
        ProbeResult::down("svc", None, Some("Request timeout".to_string()), 10_000)
    }

    fn up() -> ProbeResult {
        ProbeResult::up("svc", 200, 8)
    }

    #[test]
    fn alert_repeats_past_threshold_then_recovers() {
        let mut stats = ServiceStats::default();
        let mut events = Vec::new();

        for result in [down(), down(), down(), down(), up()] {
            stats.record(&result);
            events.push(evaluate_alert(&stats, &result, 3));
        }

        assert_eq!(events[0], None);
        assert_eq!(events[1], None);
        assert_eq!(
            events[2],
            Some(MonitorEvent::Alert {
                service: "svc".to_string(),
                consecutive_failures: 3
            })
        );
        assert_eq!(
            events[3],
            Some(MonitorEvent::Alert {
                service: "svc".to_string(),
                consecutive_failures: 4
            })
        );
        assert_eq!(
            events[4],
            Some(MonitorEvent::Recovery {
                service: "svc".to_string()
            })
        );
    }

    #[test]
    fn healthy_target_never_signals() {
        let mut stats = ServiceStats::default();
        for _ in 0..5 {
            let result = up();
            stats.record(&result);
            assert_eq!(evaluate_alert(&stats, &result, 3), None);
        }
    }

    #[test]
    fn event_messages() {
        let alert = MonitorEvent::Alert {
            service: "Frontend".to_string(),
            consecutive_failures: 3,
        };
        assert_eq!(
            alert.to_string(),
            "ALERT: Frontend has been down for 3 consecutive checks"
        );
        assert_eq!(alert.kind(), "alert");

        let recovery = MonitorEvent::Recovery {
            service: "Frontend".to_string(),
        };
        assert_eq!(recovery.to_string(), "RECOVERY: Frontend is back online");
        assert_eq!(recovery.service(), "Frontend");
    }
}
