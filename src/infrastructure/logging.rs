use std::io;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::{config::env::LoggingConfig, infrastructure::directories::ResolvedPaths};

static INIT: OnceCell<()> = OnceCell::new();
static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Console output, plus a daily-rolling file in the logs directory unless
/// `file_name` is unset. `RUST_LOG` wins over `LOG_LEVEL` when both are set.
pub fn init_tracing(config: &LoggingConfig, paths: &ResolvedPaths) -> Result<()> {
    INIT.get_or_try_init::<_, anyhow::Error>(|| {
        let (env_filter, level_rejected) = match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, false),
            Err(_) => level_filter(&config.level),
        };

        let file_layer = config.file_name.as_deref().map(|name| {
            let appender = tracing_appender::rolling::daily(&paths.logs_dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = GUARD.set(guard);
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
        });

        let console_layer = fmt::layer()
            .with_writer(io::stdout)
            .with_target(true)
            .with_ansi(config.ansi);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        if level_rejected {
            tracing::warn!(
                target: "lifecycle",
                level = %config.level,
                "LOG_LEVEL is not a valid filter; using info"
            );
        }
        tracing::info!(
            target: "lifecycle",
            logs = %paths.logs_dir.display(),
            file = config.file_name.as_deref().unwrap_or("-"),
            level = %config.level,
            "tracing initialized"
        );
        Ok(())
    })?;
    Ok(())
}

/// Filter for a `LOG_LEVEL` directive. The flag is set when the directive was
/// rejected and `info` was used instead.
fn level_filter(directive: &str) -> (EnvFilter, bool) {
    match EnvFilter::try_new(directive) {
        Ok(filter) => (filter, false),
        Err(_) => (EnvFilter::new("info"), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_target_directives_are_accepted() {
        let (filter, rejected) = level_filter("warn,batch=debug,fetch=trace");
        assert!(!rejected);
        let rendered = filter.to_string();
        assert!(rendered.contains("batch=debug"));
        assert!(rendered.contains("fetch=trace"));
    }

    #[test]
    fn unparsable_level_falls_back_to_info() {
        let (filter, rejected) = level_filter("batch=loud");
        assert!(rejected);
        assert_eq!(filter.to_string(), "info");
    }
}
