use std::fmt;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::{AppEnvironment, EngineConfig};

#[derive(Debug)]
pub enum TelemetryError {
    Filter { directive: String, source: ParseError },
    Install(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Filter { directive, .. } => {
                write!(f, "log filter '{directive}' does not parse")
            }
            TelemetryError::Install(err) => write!(f, "subscriber install failed: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Filter { source, .. } => Some(source),
            TelemetryError::Install(err) => Some(&**err),
        }
    }
}

/// Install the global subscriber. An explicit `RUST_LOG` wins over the
/// configured level; production output is compact and ANSI-free.
pub fn init(config: &EngineConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(&config.telemetry.log_level).map_err(|source| {
            TelemetryError::Filter {
                directive: config.telemetry.log_level.clone(),
                source,
            }
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match config.environment {
        AppEnvironment::Production => builder.compact().with_ansi(false).try_init(),
        AppEnvironment::Development | AppEnvironment::Test => builder.pretty().try_init(),
    }
    .map_err(TelemetryError::Install)
}
