use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing configuration for the CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }

    /// Install the global subscriber. Logs go to stderr so command output on
    /// stdout stays scriptable.
    pub fn init(&self) -> Result<()> {
        let env_filter = self.env_filter();

        if self.json {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_writer(io::stderr);

            Registry::default()
                .with(env_filter)
                .with(json_layer)
                .try_init()?;
        } else {
            let simple_layer = fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(io::stderr);

            Registry::default()
                .with(env_filter)
                .with(simple_layer)
                .try_init()?;
        }

        Ok(())
    }
}
