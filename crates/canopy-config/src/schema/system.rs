//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Extra `tracing_subscriber::EnvFilter` directives, e.g. `canopy_bridge=trace`.
    pub directives: Vec<String>,
}

impl LoggingConfig {
    /// Filter string for a binary whose crate target is `target`.
    pub fn filter_for(&self, target: &str) -> String {
        let mut parts = vec![format!("{target}={}", self.level.as_str())];
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }
}
