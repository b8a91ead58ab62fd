use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::monitor::models::ServiceTarget;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Reads a partial config from an optional TOML file. A missing file yields
/// the empty partial so environment variables alone can configure a process.
fn read_partial<T: DeserializeOwned + Default>(config_path: Option<&str>) -> Result<T, ConfigError> {
    let Some(path_str) = config_path else {
        return Ok(T::default());
    };
    let path = Path::new(path_str);
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_str.to_string(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path_str.to_string(),
        source,
    })
}

// --- API server ---

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub database_url: Option<String>,
    pub listen_address: String,
    pub frontend_url: Option<String>,
    pub log_dir: String,
}

#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    jwt_secret: Option<String>,
    jwt_expire_hours: Option<i64>,
    database_url: Option<String>,
    listen_address: Option<String>,
    frontend_url: Option<String>,
    log_dir: Option<String>,
}

const DEFAULT_JWT_EXPIRE_HOURS: i64 = 30 * 24;
const MAX_JWT_EXPIRE_HOURS: i64 = 10 * 365 * 24;

fn default_listen_address() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ServerConfig {
    /// Loads `.env`, then layers environment variables over the optional TOML file.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_from(config_path, std::env::vars())
    }

    pub fn load_from<I>(config_path: Option<&str>, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let file_config: PartialServerConfig = read_partial(config_path)?;
        let env_config: PartialServerConfig = envy::from_iter(vars)?;

        let config = ServerConfig {
            jwt_secret: env_config
                .jwt_secret
                .or(file_config.jwt_secret)
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::Missing("JWT_SECRET"))?,
            jwt_expire_hours: env_config
                .jwt_expire_hours
                .or(file_config.jwt_expire_hours)
                .unwrap_or(DEFAULT_JWT_EXPIRE_HOURS),
            database_url: env_config.database_url.or(file_config.database_url),
            listen_address: env_config
                .listen_address
                .or(file_config.listen_address)
                .unwrap_or_else(default_listen_address),
            frontend_url: env_config.frontend_url.or(file_config.frontend_url),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
        };

        if !(1..=MAX_JWT_EXPIRE_HOURS).contains(&config.jwt_expire_hours) {
            return Err(ConfigError::Invalid(format!(
                "jwt_expire_hours must be between 1 and {MAX_JWT_EXPIRE_HOURS}"
            )));
        }

        Ok(config)
    }
}

// --- Uptime monitor ---

/// A monitored endpoint as written in configuration.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub report_interval: Duration,
    pub alert_threshold: u32,
    pub log_file: PathBuf,
    pub log_dir: String,
    pub alert_webhook_url: Option<String>,
    pub alert_webhook_template: Option<String>,
    pub services: Vec<ServiceEntry>,
}

#[derive(Deserialize, Default, Debug)]
struct PartialMonitorConfig {
    interval_secs: Option<u64>,
    timeout_secs: Option<u64>,
    retries: Option<u32>,
    retry_delay_secs: Option<u64>,
    report_interval_secs: Option<u64>,
    alert_threshold: Option<u32>,
    log_file: Option<PathBuf>,
    log_dir: Option<String>,
    alert_webhook_url: Option<String>,
    alert_webhook_template: Option<String>,
    services: Option<Vec<ServiceEntry>>,
}

const MONITOR_ENV_PREFIX: &str = "UPTIME_";

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(10),
            retries: 3,
            retry_delay: Duration::from_secs(2),
            report_interval: Duration::from_secs(60 * 60),
            alert_threshold: 3,
            log_file: PathBuf::from("uptime.log"),
            log_dir: default_log_dir(),
            alert_webhook_url: None,
            alert_webhook_template: None,
            services: Vec::new(),
        }
    }
}

/// The blog deployment's own endpoints, used when no services are configured.
fn default_services(vars: &HashMap<String, String>) -> Vec<ServiceEntry> {
    let frontend = vars
        .get("FRONTEND_URL")
        .cloned()
        .unwrap_or_else(|| "http://localhost:3000".to_string());
    let backend = vars
        .get("BACKEND_URL")
        .cloned()
        .unwrap_or_else(|| "http://localhost:5000".to_string());

    vec![
        ServiceEntry {
            name: "Frontend".to_string(),
            url: frontend,
        },
        ServiceEntry {
            name: "Backend API".to_string(),
            url: format!("{}/api/health", backend.trim_end_matches('/')),
        },
        ServiceEntry {
            name: "Backend Root".to_string(),
            url: backend,
        },
    ]
}

impl MonitorConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_from(config_path, std::env::vars())
    }

    /// Environment (`UPTIME_*`) overrides the file, which overrides defaults.
    /// The service list only comes from the file.
    pub fn load_from<I>(config_path: Option<&str>, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let file_config: PartialMonitorConfig = read_partial(config_path)?;
        let env_config: PartialMonitorConfig = envy::prefixed(MONITOR_ENV_PREFIX)
            .from_iter(vars.iter().map(|(k, v)| (k.clone(), v.clone())))?;

        let defaults = MonitorConfig::default();
        let secs = |env: Option<u64>, file: Option<u64>, fallback: Duration| {
            env.or(file).map(Duration::from_secs).unwrap_or(fallback)
        };

        let services = match file_config.services {
            Some(services) if !services.is_empty() => services,
            _ => default_services(&vars),
        };

        let config = MonitorConfig {
            interval: secs(env_config.interval_secs, file_config.interval_secs, defaults.interval),
            timeout: secs(env_config.timeout_secs, file_config.timeout_secs, defaults.timeout),
            retries: env_config
                .retries
                .or(file_config.retries)
                .unwrap_or(defaults.retries),
            retry_delay: secs(
                env_config.retry_delay_secs,
                file_config.retry_delay_secs,
                defaults.retry_delay,
            ),
            report_interval: secs(
                env_config.report_interval_secs,
                file_config.report_interval_secs,
                defaults.report_interval,
            ),
            alert_threshold: env_config
                .alert_threshold
                .or(file_config.alert_threshold)
                .unwrap_or(defaults.alert_threshold),
            log_file: env_config
                .log_file
                .or(file_config.log_file)
                .unwrap_or(defaults.log_file),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or(defaults.log_dir),
            alert_webhook_url: env_config.alert_webhook_url.or(file_config.alert_webhook_url),
            alert_webhook_template: env_config
                .alert_webhook_template
                .or(file_config.alert_webhook_template),
            services,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retries == 0 {
            return Err(ConfigError::Invalid("retries must be at least 1".to_string()));
        }
        if self.interval.is_zero() {
            return Err(ConfigError::Invalid("interval must be at least 1 second".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be at least 1 second".to_string()));
        }
        if self.report_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "report interval must be at least 1 second".to_string(),
            ));
        }
        if self.alert_threshold == 0 {
            return Err(ConfigError::Invalid(
                "alert_threshold must be at least 1".to_string(),
            ));
        }
        if self.services.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one service must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if !seen.insert(service.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate service name '{}'",
                    service.name
                )));
            }
        }
        self.targets().map(|_| ())
    }

    /// Parses the configured services into monitor targets.
    pub fn targets(&self) -> Result<Vec<ServiceTarget>, ConfigError> {
        self.services
            .iter()
            .map(|s| ServiceTarget::new(&s.name, &s.url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn server_config_requires_jwt_secret() {
        let result = ServerConfig::load_from(None, vars(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn server_config_env_overrides_file() {
        let file = write_toml(
            r#"
            jwt_secret = "from-file"
            listen_address = "127.0.0.1:9000"
            jwt_expire_hours = 12
            "#,
        );
        let config = ServerConfig::load_from(
            file.path().to_str(),
            vars(&[("JWT_SECRET", "from-env")]),
        )
        .unwrap();

        assert_eq!(config.jwt_secret, "from-env");
        assert_eq!(config.listen_address, "127.0.0.1:9000");
        assert_eq!(config.jwt_expire_hours, 12);
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn server_config_defaults_expiry_to_thirty_days() {
        let config = ServerConfig::load_from(None, vars(&[("JWT_SECRET", "s")])).unwrap();
        assert_eq!(config.jwt_expire_hours, 720);
        assert_eq!(config.listen_address, "0.0.0.0:5000");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn server_config_bounds_token_lifetime() {
        for hours in ["0", "-5", "87601", "2400000000"] {
            let result =
                ServerConfig::load_from(None, vars(&[("JWT_SECRET", "s"), ("JWT_EXPIRE_HOURS", hours)]));
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "{hours} should be rejected");
        }

        let config =
            ServerConfig::load_from(None, vars(&[("JWT_SECRET", "s"), ("JWT_EXPIRE_HOURS", "87600")]))
                .unwrap();
        assert_eq!(config.jwt_expire_hours, 87600);
    }

    #[test]
    fn monitor_config_uses_blog_defaults() {
        let config = MonitorConfig::load_from(
            None,
            vars(&[("BACKEND_URL", "https://api.blog.example")]),
        )
        .unwrap();

        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.report_interval, Duration::from_secs(3600));
        assert_eq!(config.alert_threshold, 3);
        assert_eq!(config.services.len(), 3);
        assert_eq!(config.services[0].url, "http://localhost:3000");
        assert_eq!(config.services[1].name, "Backend API");
        assert_eq!(config.services[1].url, "https://api.blog.example/api/health");
        assert_eq!(config.services[2].url, "https://api.blog.example");
    }

    #[test]
    fn monitor_config_layers_file_and_env() {
        let file = write_toml(
            r#"
            interval_secs = 30
            retries = 5
            log_file = "/tmp/monitor.log"

            [[services]]
            name = "Blog"
            url = "https://blog.example"
            "#,
        );
        let config = MonitorConfig::load_from(
            file.path().to_str(),
            vars(&[("UPTIME_RETRIES", "2"), ("UPTIME_TIMEOUT_SECS", "4")]),
        )
        .unwrap();

        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.retries, 2);
        assert_eq!(config.timeout, Duration::from_secs(4));
        assert_eq!(config.log_file, PathBuf::from("/tmp/monitor.log"));
        assert_eq!(
            config.services,
            vec![ServiceEntry {
                name: "Blog".to_string(),
                url: "https://blog.example".to_string(),
            }]
        );
    }

    #[test]
    fn monitor_config_rejects_zero_retries() {
        let result = MonitorConfig::load_from(None, vars(&[("UPTIME_RETRIES", "0")]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn monitor_config_rejects_duplicate_names_and_bad_urls() {
        let mut config = MonitorConfig {
            services: vec![
                ServiceEntry {
                    name: "a".to_string(),
                    url: "http://a".to_string(),
                },
                ServiceEntry {
                    name: "a".to_string(),
                    url: "http://b".to_string(),
                },
            ],
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());

        config.services[1].name = "b".to_string();
        assert!(config.validate().is_ok());

        config.services[1].url = "ftp://b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unparseable_file_is_reported() {
        let file = write_toml("retries = \"many\"");
        let result = MonitorConfig::load_from(file.path().to_str(), vars(&[]));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
