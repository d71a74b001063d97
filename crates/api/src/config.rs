//! Server configuration
//!
//! Loaded from an optional `pupil-fatigue.toml` and `PUPIL_FATIGUE__*`
//! environment variables, on top of built-in defaults.

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `record_assembler=debug`
    pub level: String,
    pub format: LogFormat,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Anonymous identity every record is stored under
    pub user_id: String,
    /// Eye-test duration used for blink rates (seconds)
    pub test_duration_seconds: f64,
    pub log: LogConfig,
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    /// Load from `pupil-fatigue.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("pupil-fatigue")
    }

    /// Load from `<file_stem>.{toml,yaml,json,...}` (if present) and the environment
    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("user_id", "anonymous")?
            .set_default("test_duration_seconds", 30.0)?
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")?
            .set_default("rate_limit.per_second", 2_i64)?
            .set_default("rate_limit.burst_size", 5_i64)?
            .add_source(File::with_name(file_stem).required(false))
            .add_source(Environment::with_prefix("PUPIL_FATIGUE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
