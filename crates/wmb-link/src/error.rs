//! Link error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use wmb_protocol::{CommandCode, ProtocolError};

/// Invalid or unreadable link configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid YAML for [`LinkConfig`](crate::LinkConfig).
    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Hop limit does not fit the transport's 4-bit field.
    #[error("hop limit {value} exceeds maximum {max}")]
    HopLimit {
        /// Configured value.
        value: u8,
        /// Largest accepted value.
        max: u8,
    },

    /// Unknown quality-of-service class.
    #[error("qos class {value} out of range 0..={max}")]
    Qos {
        /// Configured value.
        value: u8,
        /// Largest accepted value.
        max: u8,
    },

    #[error("reply timeout must be greater than zero")]
    ZeroReplyTimeout,

    /// Commands need a device address.
    #[error("destination address must be non-zero")]
    MissingDestination,
}

/// Errors raised while talking to a device.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Encoding or decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transport reported a failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport has shut down.
    #[error("transport closed")]
    Closed,

    /// No matching reply arrived in time.
    #[error("no reply to {command:?} within {timeout:?}")]
    Timeout {
        /// Command that was sent.
        command: CommandCode,
        /// How long the controller waited.
        timeout: Duration,
    },
}

impl LinkError {
    /// Short, stable label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            LinkError::Protocol(err) => err.kind(),
            LinkError::Config(_) => "config",
            LinkError::Transport(_) => "transport",
            LinkError::Closed => "closed",
            LinkError::Timeout { .. } => "timeout",
        }
    }
}
