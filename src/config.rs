use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tracing: TracingConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TracingConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

/// Backend holding job records and pause flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process-local store, lost on restart
    Memory,
    /// SQL database reached through `sea-orm`
    Database(DatabaseConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Zone recurring cron expressions are evaluated in (default: UTC)
    #[serde(default = "default_time_zone")]
    pub time_zone: Tz,
    /// Queue new jobs are placed on (default: "default")
    #[serde(default = "default_queue")]
    pub queue: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            queue: default_queue(),
        }
    }
}

const fn default_time_zone() -> Tz {
    Tz::UTC
}

fn default_queue() -> String {
    "default".to_string()
}
