use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::MonitorError;
use super::models::LogEntry;

/// Append-only JSON-lines record of every logical check.
///
/// This file is the monitor's only durable output, so write failures are
/// returned to the caller instead of being logged and dropped.
#[derive(Debug, Clone)]
pub struct UptimeLog {
    path: PathBuf,
}

impl UptimeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &LogEntry) -> Result<(), MonitorError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let persistence = |source| MonitorError::Persistence {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(persistence)?;
        file.write_all(line.as_bytes()).map_err(persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::models::ProbeResult;

    #[test]
    fn appends_one_json_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = UptimeLog::new(dir.path().join("uptime.log"));

        log.append(&LogEntry::from(&ProbeResult::up("Frontend", 200, 12)))
            .unwrap();
        log.append(&LogEntry::from(&ProbeResult::down(
            "Backend API",
            Some(502),
            Some("Unexpected status 502 Bad Gateway".to_string()),
            30,
        )))
        .unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let entries: Vec<LogEntry> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].service, "Frontend");
        assert_eq!(entries[1].status_code, Some(502));
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn unwritable_path_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = UptimeLog::new(dir.path().join("missing").join("uptime.log"));

        let result = log.append(&LogEntry::from(&ProbeResult::up("Frontend", 200, 1)));
        assert!(matches!(result, Err(MonitorError::Persistence { .. })));
    }
}
