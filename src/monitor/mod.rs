//! Polling uptime supervisor.
//!
//! [`UptimeMonitor`] probes a fixed list of targets on an interval, retries
//! failed probes, folds each logical check into per-target statistics, appends
//! it to the JSON-lines log and raises alert or recovery notifications.
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at, sleep};
use tracing::{error, info, warn};

use crate::config::{ConfigError, MonitorConfig};
use crate::notifications::NotificationService;
use crate::notifications::senders::SenderError;

pub mod alert;
pub mod models;
pub mod probe;
pub mod report;
pub mod uptime_log;

use alert::{MonitorEvent, evaluate_alert};
use models::{LogEntry, ProbeResult, ServiceStats, ServiceTarget};
use probe::{HttpProber, Prober};
use report::{ServiceReport, UptimeReport};
use uptime_log::UptimeLog;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Failed to write uptime log {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize log entry: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to set up notifications: {0}")]
    Notification(#[from] SenderError),
}

pub struct UptimeMonitor {
    config: MonitorConfig,
    targets: Vec<ServiceTarget>,
    stats: HashMap<String, ServiceStats>,
    prober: Arc<dyn Prober>,
    uptime_log: UptimeLog,
    notifications: NotificationService,
    reports_emitted: u64,
}

impl UptimeMonitor {
    pub fn new(
        config: MonitorConfig,
        prober: Arc<dyn Prober>,
        notifications: NotificationService,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        let targets = config.targets()?;
        let stats = targets
            .iter()
            .map(|t| (t.name().to_string(), ServiceStats::default()))
            .collect();
        let uptime_log = UptimeLog::new(config.log_file.clone());

        Ok(Self {
            config,
            targets,
            stats,
            prober,
            uptime_log,
            notifications,
            reports_emitted: 0,
        })
    }

    /// Builds a monitor with the HTTP prober and the configured notification channels.
    pub fn from_config(config: MonitorConfig) -> Result<Self, MonitorError> {
        let prober = Arc::new(HttpProber::new(config.timeout)?);
        let notifications = NotificationService::from_config(&config)?;
        Self::new(config, prober, notifications)
    }

    pub fn targets(&self) -> &[ServiceTarget] {
        &self.targets
    }

    pub fn stats(&self, service: &str) -> Option<&ServiceStats> {
        self.stats.get(service)
    }

    /// Probes `target` until it answers `up` or `retries` attempts are spent,
    /// waiting `retry_delay` between attempts. Returns the last result.
    pub async fn check_with_retry(&self, target: &ServiceTarget) -> ProbeResult {
        let mut attempts = 0;
        loop {
            let result = self.prober.probe(target).await;
            attempts += 1;

            if result.is_up() || attempts >= self.config.retries {
                return result;
            }

            warn!(
                service = %target.name(),
                attempt = attempts,
                retries = self.config.retries,
                error = result.error.as_deref().unwrap_or("none"),
                "Probe failed, retrying."
            );
            sleep(self.config.retry_delay).await;
        }
    }

    pub fn update_stats(&mut self, result: &ProbeResult) -> &ServiceStats {
        let stats = self.stats.entry(result.service.clone()).or_default();
        stats.record(result);
        stats
    }

    pub fn evaluate_alert(&self, result: &ProbeResult) -> Option<MonitorEvent> {
        self.stats
            .get(&result.service)
            .and_then(|stats| evaluate_alert(stats, result, self.config.alert_threshold))
    }

    /// Runs one cycle over every target, in order. Each target's retries finish
    /// before the next target is probed.
    pub async fn check_all(&mut self) -> Result<Vec<ProbeResult>, MonitorError> {
        let mut results = Vec::with_capacity(self.targets.len());

        for index in 0..self.targets.len() {
            let target = self.targets[index].clone();
            let result = self.check_with_retry(&target).await;

            self.update_stats(&result);
            self.log_result(&result)?;
            if let Some(event) = self.evaluate_alert(&result) {
                self.notifications.send_event(&event).await;
            }

            results.push(result);
        }

        Ok(results)
    }

    fn log_result(&self, result: &ProbeResult) -> Result<(), MonitorError> {
        self.uptime_log.append(&LogEntry::from(result))?;

        if result.is_up() {
            info!(
                service = %result.service,
                status_code = result.status_code,
                response_time_ms = result.response_time_ms,
                "Service is UP."
            );
        } else {
            warn!(
                service = %result.service,
                status_code = result.status_code,
                response_time_ms = result.response_time_ms,
                error = result.error.as_deref().unwrap_or("none"),
                "Service is DOWN."
            );
        }
        Ok(())
    }

    pub fn report(&self) -> UptimeReport {
        let services = self
            .targets
            .iter()
            .map(|target| {
                let stats = self.stats.get(target.name()).cloned().unwrap_or_default();
                ServiceReport {
                    name: target.name().to_string(),
                    url: target.url().to_string(),
                    status: stats.status,
                    uptime_percentage: stats.uptime_percentage(),
                    total_checks: stats.total_checks,
                    last_check: stats.last_check,
                }
            })
            .collect();

        UptimeReport {
            sequence: self.reports_emitted,
            generated_at: Utc::now(),
            services,
        }
    }

    fn emit_report(&mut self) -> UptimeReport {
        self.reports_emitted += 1;
        let report = self.report();
        report.log();
        report
    }

    /// Checks immediately, then every `interval`, and logs a report every
    /// `report_interval`. Returns after a shutdown signal (or the sender being
    /// dropped), abandoning any in-flight check, and hands back the final report.
    /// A log write failure ends the loop with an error.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<()>) -> Result<UptimeReport, MonitorError> {
        info!(
            services = self.targets.len(),
            interval_secs = self.config.interval.as_secs(),
            log_file = %self.uptime_log.path().display(),
            "Starting uptime monitoring."
        );
        for target in &self.targets {
            info!(
                service = %target.name(),
                url = %target.url(),
                protocol = ?target.protocol(),
                "Monitoring target."
            );
        }

        let mut check_interval = interval(self.config.interval);
        check_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut report_interval = interval_at(
            Instant::now() + self.config.report_interval,
            self.config.report_interval,
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                _ = check_interval.tick() => {
                    tokio::select! {
                        biased;

                        _ = shutdown.changed() => {
                            info!("Shutdown requested during a check cycle, abandoning in-flight probes.");
                            break;
                        }
                        outcome = self.check_all() => {
                            if let Err(e) = outcome {
                                error!(error = %e, "Uptime log is no longer writable, stopping monitor.");
                                self.emit_report();
                                return Err(e);
                            }
                        }
                    }
                }

                _ = report_interval.tick() => {
                    self.emit_report();
                }
            }
        }

        info!("Shutting down uptime monitor.");
        Ok(self.emit_report())
    }
}
