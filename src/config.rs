//! Build configuration.
//!
//! Loaded from a JSON document or from `FLOWSMITH_*` environment variables
//! (a `.env` file in the working directory is honoured). Every field has a
//! default, so an empty document is a valid configuration.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ir::rest::FlowStatus;
use crate::retry::RetryPolicy;

pub const ENV_CONFIG_FILE: &str = "FLOWSMITH_CONFIG";
pub const ENV_PACING_MS: &str = "FLOWSMITH_PACING_MS";
pub const ENV_STATUS: &str = "FLOWSMITH_STATUS";
pub const ENV_MAX_ATTEMPTS: &str = "FLOWSMITH_MAX_ATTEMPTS";
pub const ENV_CAPTURE_SCREENSHOTS: &str = "FLOWSMITH_CAPTURE_SCREENSHOTS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {var}: '{value}'")]
    InvalidVar { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Fixed delay between consecutive collaborator calls.
    pub pacing_ms: u64,
    /// Status to set after a successful REST creation.
    pub status: FlowStatus,
    /// Ask the UI driver to capture its state after a failed step.
    pub capture_screenshots: bool,
    pub retry: RetryConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            pacing_ms: 250,
            status: FlowStatus::Draft,
            capture_screenshots: true,
            retry: RetryConfig::default(),
        }
    }
}

/// One policy per kind of collaborator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub create: RetryPolicy,
    pub lookup: RetryPolicy,
    pub content: RetryPolicy,
    pub ui: RetryPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            create: RetryPolicy::default(),
            lookup: RetryPolicy::default(),
            content: RetryPolicy::default(),
            // UI steps fail for reasons the driver cannot classify.
            ui: RetryPolicy::new(3, Duration::from_millis(500), 2.0, Duration::from_millis(5_000)),
        }
    }
}

impl BuildConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults, then the file named by `FLOWSMITH_CONFIG`, then individual
    /// variable overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let base = match env::var(ENV_CONFIG_FILE) {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path, source })?;
                BuildConfig::from_json(&raw)?
            }
            Err(_) => BuildConfig::default(),
        };
        base.apply_overrides(|var| env::var(var).ok())
    }

    /// Apply `FLOWSMITH_*` overrides read through `get`.
    pub fn apply_overrides<F>(mut self, get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = get(ENV_PACING_MS) {
            self.pacing_ms = value.trim().parse().map_err(|_| ConfigError::InvalidVar {
                var: ENV_PACING_MS,
                value,
            })?;
        }
        if let Some(value) = get(ENV_STATUS) {
            self.status = FlowStatus::parse(value.trim().to_lowercase().as_str()).ok_or(
                ConfigError::InvalidVar {
                    var: ENV_STATUS,
                    value,
                },
            )?;
        }
        if let Some(value) = get(ENV_MAX_ATTEMPTS) {
            let attempts: u32 = value
                .trim()
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidVar {
                    var: ENV_MAX_ATTEMPTS,
                    value,
                })?;
            for policy in [
                &mut self.retry.create,
                &mut self.retry.lookup,
                &mut self.retry.content,
                &mut self.retry.ui,
            ] {
                policy.max_attempts = attempts;
            }
        }
        if let Some(value) = get(ENV_CAPTURE_SCREENSHOTS) {
            self.capture_screenshots = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        var: ENV_CAPTURE_SCREENSHOTS,
                        value,
                    });
                }
            };
        }
        Ok(self)
    }
}
