//! Link configuration.
//!
//! ```yaml
//! destination: 11259375
//! source_endpoint: 77
//! destination_endpoint: 66
//! hop_limit: 15
//! framing: structured
//! reply_timeout_ms: 5000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wmb_protocol::Framing;

use crate::error::ConfigError;
use crate::transport::SendOptions;

/// Largest hop limit the transport accepts (4-bit field).
pub const MAX_HOP_LIMIT: u8 = 15;
/// Highest quality-of-service class.
pub const MAX_QOS: u8 = 1;
/// Endpoint the controller sends from and listens on.
pub const DEFAULT_SOURCE_ENDPOINT: u8 = 77;
/// Endpoint the device listens on.
pub const DEFAULT_DESTINATION_ENDPOINT: u8 = 66;
/// How long to wait for a matching reply.
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 5_000;

/// Addressing and transport parameters for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Mesh address of the device; must be set before sending.
    pub destination: u32,
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    /// Quality-of-service class (0 normal, 1 high priority).
    pub qos: u8,
    /// Delay before the sink transmits.
    pub initial_delay_ms: u32,
    /// Send without acknowledgement using CSMA-CA.
    pub unack_csma_ca: bool,
    pub hop_limit: u8,
    /// Framing scheme for outgoing commands and incoming replies.
    pub framing: Framing,
    pub reply_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            destination: 0,
            source_endpoint: DEFAULT_SOURCE_ENDPOINT,
            destination_endpoint: DEFAULT_DESTINATION_ENDPOINT,
            qos: 0,
            initial_delay_ms: 0,
            unack_csma_ca: false,
            hop_limit: MAX_HOP_LIMIT,
            framing: Framing::default(),
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
        }
    }
}

impl LinkConfig {
    /// Default configuration for the given device address.
    pub fn for_destination(destination: u32) -> Self {
        Self {
            destination,
            ..Self::default()
        }
    }

    /// Check value ranges.
    ///
    /// A zero destination is allowed here so that a file can carry only
    /// defaults; [`Controller::new`](crate::Controller::new) rejects it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hop_limit > MAX_HOP_LIMIT {
            return Err(ConfigError::HopLimit {
                value: self.hop_limit,
                max: MAX_HOP_LIMIT,
            });
        }
        if self.qos > MAX_QOS {
            return Err(ConfigError::Qos {
                value: self.qos,
                max: MAX_QOS,
            });
        }
        if self.reply_timeout_ms == 0 {
            return Err(ConfigError::ZeroReplyTimeout);
        }
        Ok(())
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: LinkConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Transport parameters for outgoing frames.
    pub fn send_options(&self) -> SendOptions {
        SendOptions {
            source_endpoint: self.source_endpoint,
            destination_endpoint: self.destination_endpoint,
            qos: self.qos,
            initial_delay_ms: self.initial_delay_ms,
            unack_csma_ca: self.unack_csma_ca,
            hop_limit: self.hop_limit,
        }
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}
