//! Structured logging setup. Logs go to stderr so report output on stdout
//! stays clean.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "retention_lift=debug".
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// `--log-json` or `LOG_JSON=1|true` selects JSON lines.
    pub fn from_env(json_flag: bool, verbose: bool) -> Self {
        let json = json_flag
            || std::env::var("LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false);
        let filter = if verbose { "info" } else { "warn" };
        Self::default().with_filter(filter).with_json(json)
    }
}

/// `RUST_LOG` wins over the configured filter.
pub fn init(config: LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!(filter = %config.filter, json = config.json, "logging initialized");
}
