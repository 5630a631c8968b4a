//! Error types shared across the pipeline, sources and monitor.

use thiserror::Error;

/// Invalid configuration detected at construction time.
///
/// Carries a dotted field path (e.g. `"series.capacity"`) so that every
/// violation can be reported against the TOML key that caused it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path.
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure to retrieve data from, or send a command to, the telemetry backend.
///
/// A fetch error never aborts the monitor: the affected tick is skipped and the
/// previously published values stay in place.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// The backend refused a command for this device, e.g. a motor-only
    /// command sent to a lighting circuit.
    #[error("command rejected: {0}")]
    Rejected(String),

    #[error("no grid context available")]
    NoGridContext,

    #[error("monitor is not running")]
    Closed,
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // Bodies are decoded with serde_json, so reqwest never reports decode errors here.
        match err.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => FetchError::Transport(err.to_string()),
        }
    }
}
