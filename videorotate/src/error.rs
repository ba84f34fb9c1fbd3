//! Error types for the rotation override subsystem.
//!
//! Nothing in this crate is fatal to its host. The variants map onto the three
//! failure classes the controller distinguishes:
//!
//! - [`SourceError`]: transient lookup failures (task query, identity
//!   resolution, playback snapshot). Always collapsed to a "none" sentinel at
//!   the call site.
//! - [`PolicyError`]: rotation-lock reads and writes. Logged; the state machine
//!   is left as it was and the next evaluation tries again.
//! - Missing capabilities surface as [`SourceError::Unavailable`] and make the
//!   affected feature inert rather than failing startup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by external event and lookup sources.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The backing service is not available (yet).
    #[error("{0} is unavailable")]
    Unavailable(&'static str),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The query itself failed.
    #[error("query failed: {0}")]
    Query(String),
}

/// Errors reported by the rotation-lock policy store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Reading the lock state failed.
    #[error("failed to read rotation lock: {0}")]
    Read(String),

    /// Writing the lock angle failed.
    #[error("failed to set rotation lock: {0}")]
    Write(String),
}

/// Errors from the service lifecycle surface.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// `start()` was called outside of a Tokio runtime.
    #[error("no Tokio runtime available to host the control loop")]
    NoRuntime,

    /// The control loop is not running.
    #[error("rotation override service is not running")]
    NotRunning,

    /// The control loop went away while a request was in flight.
    #[error("control loop channel closed")]
    ChannelClosed,

    /// The control loop task panicked or was aborted.
    #[error("control loop task failed to join: {0}")]
    Join(String),
}

/// Errors from loading an [`OverrideConfig`](crate::config::OverrideConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The INI text is malformed.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A key holds a value that can't be used.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Unavailable("audio service");
        assert_eq!(err.to_string(), "audio service is unavailable");

        let err = SourceError::NotFound("com.example.player".to_string());
        assert!(err.to_string().contains("com.example.player"));
    }

    #[test]
    fn test_policy_error_display() {
        let err = PolicyError::Write("permission denied".to_string());
        assert!(err.to_string().contains("set rotation lock"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::InvalidValue {
            key: "poll_interval_ms",
            value: "soon".to_string(),
        };
        assert!(err.to_string().contains("poll_interval_ms"));
        assert!(err.to_string().contains("soon"));
    }
}
