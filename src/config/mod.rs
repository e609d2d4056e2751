//! Configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for a queued consumer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Consumer name, used for the worker and its logs
    pub name: String,

    /// Maximum number of tasks held by the default memory queue
    pub queue_capacity: usize,

    /// Per-task timeout in seconds, 0 disables it
    pub task_timeout_secs: u64,

    /// Pause in milliseconds after a fetch that returned nothing
    pub idle_backoff_ms: u64,

    /// How long callers wait for the completion signal, in seconds
    pub shutdown_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "queued-consumer".to_string(),
            queue_capacity: 10000,
            task_timeout_secs: 0,
            idle_backoff_ms: 100,
            shutdown_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Create a new configuration with the given consumer name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load configuration from file, environment variables, or defaults
    pub fn load() -> crate::Result<Self> {
        if let Ok(config_path) = env::var("QUEUED_CONSUMER_CONFIG") {
            info!("Loading config from QUEUED_CONSUMER_CONFIG: {}", config_path);
            return Self::from_file(&config_path);
        }

        let default_paths = [
            "consumer.yaml",
            "consumer.toml",
            "config/consumer.yaml",
            "config/consumer.toml",
        ];

        for path in default_paths {
            if Path::new(path).exists() {
                info!("Loading config from: {}", path);
                return Self::from_file(path);
            }
        }

        if env_overrides_present() {
            let config = Self::from_env()?;
            info!("Loaded config from environment variables");
            return Ok(config);
        }

        warn!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .map_err(|e| {
                crate::ConsumerError::ConfigError(format!("Failed to load config file: {}", e))
            })?;

        let config: Config = settings.try_deserialize().map_err(|e| {
            crate::ConsumerError::ConfigError(format!("Failed to parse config: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();
        let mut found_any = false;

        if let Ok(val) = env::var("QUEUED_CONSUMER_NAME") {
            config.name = val;
            found_any = true;
        }

        if let Some(val) = parse_env("QUEUED_CONSUMER_QUEUE_CAPACITY")? {
            config.queue_capacity = val;
            found_any = true;
        }

        if let Some(val) = parse_env("QUEUED_CONSUMER_TASK_TIMEOUT_SECS")? {
            config.task_timeout_secs = val;
            found_any = true;
        }

        if let Some(val) = parse_env("QUEUED_CONSUMER_IDLE_BACKOFF_MS")? {
            config.idle_backoff_ms = val;
            found_any = true;
        }

        if let Some(val) = parse_env("QUEUED_CONSUMER_SHUTDOWN_TIMEOUT_SECS")? {
            config.shutdown_timeout_secs = val;
            found_any = true;
        }

        if !found_any {
            return Err(crate::ConsumerError::ConfigError(
                "No environment variables found".to_string(),
            ));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::ConsumerError::ConfigError(
                "Consumer name must not be empty".to_string(),
            ));
        }

        if self.queue_capacity == 0 {
            return Err(crate::ConsumerError::ConfigError(
                "Queue capacity must be greater than 0".to_string(),
            ));
        }

        if self.idle_backoff_ms == 0 {
            return Err(crate::ConsumerError::ConfigError(
                "Idle backoff must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Per-task timeout, `None` when disabled
    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout_secs > 0).then(|| Duration::from_secs(self.task_timeout_secs))
    }

    /// Pause after an empty fetch
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    /// Bound for waiting on the completion signal
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

const ENV_OVERRIDES: [&str; 5] = [
    "QUEUED_CONSUMER_NAME",
    "QUEUED_CONSUMER_QUEUE_CAPACITY",
    "QUEUED_CONSUMER_TASK_TIMEOUT_SECS",
    "QUEUED_CONSUMER_IDLE_BACKOFF_MS",
    "QUEUED_CONSUMER_SHUTDOWN_TIMEOUT_SECS",
];

fn env_overrides_present() -> bool {
    ENV_OVERRIDES.iter().any(|key| env::var_os(key).is_some())
}

fn parse_env<V>(key: &str) -> crate::Result<Option<V>>
where
    V: std::str::FromStr,
    V::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.parse().map(Some).map_err(|e| {
            crate::ConsumerError::ConfigError(format!(
                "Invalid {}: {}",
                key.trim_start_matches("QUEUED_CONSUMER_"),
                e
            ))
        }),
        Err(_) => Ok(None),
    }
}
