use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use super::env::{
    AppConfig, BatchConfig, ConfigError, DirectoryConfig, FetchConfig, FlushPolicy,
    LoggingConfig, ServerConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let server = ServerConfig {
            bind_addr: parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 5000)))?,
            shutdown_grace: Duration::from_millis(parse_or("SHUTDOWN_GRACE_MS", 5_000u64)?),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            tax_table_filename: env::var("TAX_TABLE_FILENAME")
                .unwrap_or_else(|_| "salestax.json".to_string()),
        };

        let file_name = env::var("LOG_FILE").unwrap_or_else(|_| "scraper.log".to_string());
        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            file_name: match file_name.trim() {
                "" | "off" | "none" => None,
                name => Some(name.to_string()),
            },
            ansi: parse_or("LOG_ANSI", true)?,
        };

        let fetch = FetchConfig {
            timeout: Duration::from_millis(parse_or("FETCH_TIMEOUT_MS", 10_000u64)?),
        };

        let max_concurrent_fetches = parse_or("MAX_CONCURRENT_FETCHES", 32usize)?;
        if max_concurrent_fetches == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_CONCURRENT_FETCHES",
                value: "0".to_string(),
            });
        }

        let batch = BatchConfig {
            max_concurrent_fetches,
            flush_policy: parse_or("FLUSH_POLICY", FlushPolicy::default())?,
            default_jurisdiction: env::var("DEFAULT_JURISDICTION")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "Colorado".to_string()),
            max_finished_jobs: parse_or("MAX_FINISHED_JOBS", 100usize)?,
        };

        Ok(Self {
            server,
            directories,
            logging,
            fetch,
            batch,
        })
    }
}

/// Reads `key`, falling back to `default` when unset or blank. A set value
/// that does not parse is an error rather than a silent fallback.
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            let trimmed = value.trim().to_string();
            trimmed
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid { key, value })
        }
        _ => Ok(default),
    }
}
