//! Orchestrator configuration

use mosaic_loader::LoaderConfig;
use mosaic_types::{MosaicError, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Resource loading
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Event stream
    #[serde(default)]
    pub events: EventConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OrchestratorConfig {
    /// Layer defaults, an optional file and `MOSAIC_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `MOSAIC_LOGGING__LEVEL=debug`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(
            config::Config::try_from(&OrchestratorConfig::default()).map_err(config_error)?,
        );

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MOSAIC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)
    }
}

fn config_error(e: config::ConfigError) -> MosaicError {
    MosaicError::Config(e.to_string())
}

/// Event stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Broadcast channel capacity; slow subscribers lag past this
    #[serde(default = "default_event_buffer")]
    pub buffer: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            buffer: default_event_buffer(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_event_buffer() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}
