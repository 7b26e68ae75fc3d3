use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;
use crate::application::services::{DEFAULT_MAX_MESSAGE_SIZE, RetryPolicy};

/// Service settings: optional `appsettings.<env>` file overlaid with
/// `APP__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    pub queue: QueueSettings,
    pub worker: WorkerSettings,
    pub sync: SyncSettings,
    pub lock: LockSettings,
    pub ntp: NtpSettings,
    #[serde(default)]
    pub github: Option<GithubSection>,
    #[serde(default)]
    pub hints: HintsSettings,
    #[serde(default)]
    pub service: Option<ServiceSeedSettings>,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    /// Serialized message size limit in bytes.
    pub max_message_size: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    pub concurrency: usize,
    /// Analyzer executable, spawned once per work unit.
    pub analyzer_command: String,
    #[serde(default)]
    pub analyzer_args: Vec<String>,
    pub webhint_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockSettings {
    pub attempts: u32,
    pub delay_ms: u64,
    pub ttl_secs: u64,
}

impl LockSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.delay_ms))
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NtpSettings {
    pub enabled: bool,
    pub server: String,
    pub attempts: u32,
    pub delay_ms: u64,
    pub timeout_ms: u64,
}

impl NtpSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.delay_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubSection {
    pub token: String,
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HintsSettings {
    #[serde(default)]
    pub catalog_path: Option<String>,
}

/// Configuration activated at startup when the store has no active one.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSeedSettings {
    pub name: String,
    pub job_cache_time: u64,
    pub job_run_time: u64,
    /// JSON file holding the list of hint configurations.
    pub configs_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub json: bool,
}

impl Settings {
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("queue.max_message_size", DEFAULT_MAX_MESSAGE_SIZE as u64)?
            .set_default("queue.capacity", 1024)?
            .set_default("worker.concurrency", 2)?
            .set_default("worker.analyzer_command", "webhint-analyzer")?
            .set_default("worker.webhint_version", "unknown")?
            .set_default("sync.concurrency", 1)?
            .set_default("lock.attempts", 10)?
            .set_default("lock.delay_ms", 500)?
            .set_default("lock.ttl_secs", 120)?
            .set_default("ntp.enabled", false)?
            .set_default("ntp.server", "time-a-g.nist.gov:123")?
            .set_default("ntp.attempts", 10)?
            .set_default("ntp.delay_ms", 500)?
            .set_default("ntp.timeout_ms", 2000)?
            .set_default("logging.json", environment.is_production())?
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(" ")
                    .with_list_parse_key("worker.analyzer_args")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
