use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub worker: WorkerConfig,
    pub export: ExportConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: DatabaseConfig) -> Self {
        Self {
            url: config.url,
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Sleep between two polls of the job table.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// How long shutdown waits for an export in progress.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    #[serde(default = "default_pool_metrics_interval")]
    pub pool_metrics_interval_secs: u64,
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn pool_metrics_interval(&self) -> Duration {
        Duration::from_secs(self.pool_metrics_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Public storage root of the web application.
    pub root: PathBuf,

    /// Storage root of the local deployment, used for jobs flagged
    /// `local_host`.
    #[serde(default)]
    pub local_root: Option<PathBuf>,

    /// Hours between the users' wall clock and the timestamps stored in
    /// orders_logs. Order log bounds are shifted back by this amount.
    #[serde(default = "default_store_offset_hours")]
    pub store_offset_hours: i64,
}

impl ExportConfig {
    /// Root directory for a job. Falls back to `root` when no local root is
    /// configured.
    pub fn root_for(&self, local: bool) -> &Path {
        match (&self.local_root, local) {
            (Some(local_root), true) => local_root,
            _ => &self.root,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Address of the Prometheus scrape endpoint. Disabled when unset.
    #[serde(default)]
    pub listen_addr: Option<SocketAddr>,
}

// Default value functions
fn default_max_connections() -> u32 {
    5
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_poll_interval() -> u64 {
    10
}
fn default_shutdown_timeout() -> u64 {
    120
}
fn default_pool_metrics_interval() -> u64 {
    30
}
fn default_store_offset_hours() -> i64 {
    3
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with WMS__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("WMS").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides, without
    /// touching config files.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [database]
            url = ""
            max_connections = 5
            min_connections = 1
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [worker]
            poll_interval_secs = 10
            shutdown_timeout_secs = 120
            pool_metrics_interval_secs = 30

            [export]
            root = "/tmp/wms-exports"
            store_offset_hours = 3
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "WMS__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.export.root.as_os_str().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "WMS__EXPORT__ROOT environment variable must be set".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.worker.poll_interval_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }

        if self.worker.pool_metrics_interval_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "pool_metrics_interval_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
