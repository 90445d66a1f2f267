use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub fetch: FetchConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub shutdown_grace: Duration,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub tax_table_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// `None` keeps logs on the console only.
    pub file_name: Option<String>,
    pub ansi: bool,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_concurrent_fetches: usize,
    pub flush_policy: FlushPolicy,
    pub default_jurisdiction: String,
    /// Finished job statuses kept for polling; older ones are evicted.
    pub max_finished_jobs: usize,
}

/// When the result table is written to the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Units only merge; the table is written once after every unit finished.
    #[default]
    BatchEnd,
    /// Every finishing unit rewrites the whole table.
    EachUnit,
}

impl std::str::FromStr for FlushPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "batch_end" | "batch-end" => Ok(Self::BatchEnd),
            "each_unit" | "each-unit" => Ok(Self::EachUnit),
            _ => Err(ConfigError::Invalid {
                key: "FLUSH_POLICY",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
