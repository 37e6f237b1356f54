//! # wmb-link
//!
//! Talks to WMB devices over a mesh transport supplied by the caller.
//!
//! - [`LinkConfig`]: addressing, endpoints, hop limit and framing, loadable
//!   from YAML.
//! - [`Transport`]: the seam to the mesh (send a frame, receive a frame).
//! - [`Controller`]: encodes commands, sends them, and decodes replies.
//! - [`ChannelTransport`]: in-memory transport pair for loopback use.
//!
//! ```rust
//! use std::time::Duration;
//! use wmb_link::{ChannelTransport, Controller, LinkConfig, Transport};
//! use wmb_protocol::{Command, FrameCodec, Message, StructuredCodec};
//!
//! let (host, mut device) = ChannelTransport::pair(1, 0x2A);
//! let mut controller = Controller::new(host, LinkConfig::for_destination(0x2A))?;
//!
//! controller.send(&Command::Diagnostics)?;
//! let frame = device.receive(Duration::from_secs(1))?.expect("frame");
//! assert_eq!(
//!     StructuredCodec.decode_message(&frame.data)?,
//!     Message::Command(Command::Diagnostics)
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod channel;
mod config;
mod controller;
mod error;
mod transport;

pub use channel::ChannelTransport;
pub use config::{
    LinkConfig, DEFAULT_DESTINATION_ENDPOINT, DEFAULT_REPLY_TIMEOUT_MS, DEFAULT_SOURCE_ENDPOINT,
    MAX_HOP_LIMIT, MAX_QOS,
};
pub use controller::{Controller, Reply};
pub use error::{ConfigError, LinkError};
pub use transport::{InboundFrame, OutboundFrame, SendOptions, Transport};
