//! WMB Protocol
//!
//! This crate provides types and utilities for talking to WMB field devices
//! (wireless Modbus bridges) over a constrained mesh transport. The device
//! accepts device-management commands and Modbus proxy requests, and replies
//! with acknowledgements, diagnostics snapshots and embedded Modbus frames.
//!
//! # Protocol Overview
//!
//! Every frame ends with a big-endian CRC-16 trailer computed over all
//! preceding bytes. Two framing schemes exist side by side:
//!
//! - **Length-prefixed** ([`LengthPrefixedCodec`]): a fixed envelope
//!   `header | version | command | length(2) | payload | crc(2)` around a
//!   hand-packed payload.
//! - **Structured** ([`StructuredCodec`]): a protocol-buffers
//!   [`schema::MbMessage`] carrying header, version and command as fields,
//!   followed by the CRC trailer.
//!
//! Both codecs are stateless and may be shared freely between threads.
//!
//! # Example
//!
//! ```rust
//! use wmb_protocol::{Command, FrameCodec, Message, ModbusPort, StructuredCodec};
//!
//! let cmd = Command::modbus_one_shot(ModbusPort::One, vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x02])?;
//! let frame = StructuredCodec.encode_command(&cmd)?;
//!
//! let decoded = StructuredCodec.decode_message(&frame)?;
//! assert_eq!(decoded, Message::Command(cmd));
//! # Ok::<(), wmb_protocol::ProtocolError>(())
//! ```

pub mod checksum;
mod commands;
mod constants;
mod error;
mod frame;
mod responses;
pub mod schema;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use responses::*;
pub use types::*;
