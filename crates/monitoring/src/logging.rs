//! A set of utilities to enable logging configuration using tracing_subscriber.

use std::{io::IsTerminal, sync::Once};

use tracing_subscriber::{EnvFilter, filter::LevelFilter};

static WEIR_LOG_ENV_VAR: &str = "WEIR_LOG";

/// Initializes a tracing subscriber for logging.
pub fn init() {
    // Since we also use this function to enable logging in tests, wrap it in
    // `Once` to prevent multiple initializations.
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (env_filter, log_level) = env_filter_and_log_level();

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();

        tracing::debug!("log level: {}", log_level);
    });
}

fn env_filter_and_log_level() -> (EnvFilter, String) {
    let log_level = std::env::var(WEIR_LOG_ENV_VAR).unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(WEIR_LOG_ENV_VAR)
        .from_env_lossy();

    (env_filter, log_level)
}

/// Renders the full source chain of an error for log fields.
pub fn error_source(err: &dyn std::error::Error) -> String {
    let mut rendered = String::new();
    let mut source = err.source();
    while let Some(err) = source {
        if !rendered.is_empty() {
            rendered.push_str(": ");
        }
        rendered.push_str(&err.to_string());
        source = err.source();
    }
    rendered
}
