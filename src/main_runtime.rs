use tracing_subscriber::EnvFilter;

use rlboard::config::LoggingConfig;

/// Filter used when `RUST_LOG` is unset: dependencies at `base`, this crate at `logging.level`
fn default_filter(base: &str, logging: &LoggingConfig) -> String {
    format!("{base},rlboard={}", logging.level)
}

/// Console logging plus a daily file under `RLBOARD_LOG_DIR` (or `LOG_DIR`) when writable
pub fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter("info", logging)));

    let log_dir = std::env::var("RLBOARD_LOG_DIR").or_else(|_| std::env::var("LOG_DIR")).ok();

    // `tracing_appender::rolling::daily` panics if it can't create the initial
    // log file, so writability is checked first.
    let file_layer = log_dir.as_deref().and_then(|dir| {
        if std::fs::create_dir_all(dir).is_err() {
            eprintln!("Warning: Could not create log directory {dir}, file logging disabled");
            return None;
        }
        let probe = std::path::Path::new(dir).join(".rlboard_write_test");
        match std::fs::OpenOptions::new().create(true).append(true).open(&probe) {
            Ok(_) => {
                let _ = std::fs::remove_file(&probe);

                let file_appender = tracing_appender::rolling::daily(dir, "rlboard.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                // Lives for the rest of the process
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!("Warning: Could not write to log directory {dir} ({e}), file logging disabled");
                None
            }
        }
    });

    let (console_text, console_json) = if logging.json {
        (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_target(true).with_writer(std::io::stderr)),
        )
    } else {
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            ),
            None,
        )
    };

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(console_text)
        .with(console_json)
        .with(file_layer)
        .init();

    if let (true, Some(dir)) = (file_logging_enabled, log_dir) {
        eprintln!("Logging to: {dir}/rlboard.log");
    }
}

/// Minimal logging for short CLI commands
pub fn init_logging_simple(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter("warn", logging)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_follows_configured_level() {
        let logging = LoggingConfig {
            level: "trace".to_string(),
            json: false,
        };
        assert_eq!(default_filter("info", &logging), "info,rlboard=trace");
        assert_eq!(default_filter("warn", &LoggingConfig::default()), "warn,rlboard=info");
        assert!(EnvFilter::try_new(default_filter("info", &logging)).is_ok());
    }
}
