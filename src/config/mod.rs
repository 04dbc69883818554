use std::env;
use std::fmt;

use crate::lifecycle::duration::ProgramKind;
use crate::lifecycle::validation::ValidationLimits;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration. Loaded once at startup and passed by reference;
/// nothing here mutates after load.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub environment: AppEnvironment,
    pub limits: ValidationLimits,
    pub sync: SyncConfig,
    pub telemetry: TelemetryConfig,
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = ValidationLimits::default();
        let limits = ValidationLimits {
            max_background_len: read_limit("ENROLLMENT_MAX_BACKGROUND_LEN", defaults.max_background_len)?,
            max_content_note_len: read_limit(
                "ENROLLMENT_MAX_CONTENT_NOTE_LEN",
                defaults.max_content_note_len,
            )?,
            max_reason_detail_len: read_limit(
                "ENROLLMENT_MAX_REASON_DETAIL_LEN",
                defaults.max_reason_detail_len,
            )?,
        };

        Ok(Self {
            environment,
            limits,
            sync: SyncConfig::from_env()?,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Controls for the upstream consumption pipeline.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Program kinds enabled for reconciliation. Notifications for anything
    /// else are acknowledged and dropped.
    pub enabled_programs: Vec<ProgramKind>,
}

impl SyncConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let enabled_programs = match env::var("SYNC_ENABLED_PROGRAMS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(|key| {
                    ProgramKind::from_key(key)
                        .ok_or_else(|| ConfigError::UnknownProgramKind(key.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => ProgramKind::ordered().to_vec(),
        };

        Ok(Self { enabled_programs })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled_programs: ProgramKind::ordered().to_vec(),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn read_limit(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidLimit { var }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidLimit { var: &'static str },
    UnknownProgramKind(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidLimit { var } => {
                write!(f, "{var} must be a non-negative integer")
            }
            ConfigError::UnknownProgramKind(key) => {
                write!(f, "SYNC_ENABLED_PROGRAMS contains unknown program kind '{key}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
