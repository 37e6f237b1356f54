//! Protocol-buffers schema for the structured framing.
//!
//! Field numbers match the device firmware. Messages are declared by hand
//! with the `prost` derives instead of generated from a `.proto` file, so no
//! build script or `protoc` is needed.
//!
//! ```text
//! MbMessage { header=1, version=2, cmd=3, payload=5 }
//! Payload   { oneof frame { CmdFrame=1, AnswerFrame=2 } }
//! ```
//!
//! Selector fields (`cmd`, ports, modes, baud rates) are plain `int32`.
//! Proto3 omits a field equal to zero, and zero is not a valid command or
//! baud rate, so every real selector value is always written. Range checks
//! happen when converting to the typed enums.

use crate::constants::{PROTOCOL_HEADER, PROTOCOL_VERSION};
use crate::types::CommandCode;

/// Top-level structured message.
#[derive(Clone, PartialEq, prost::Message)]
pub struct MbMessage {
    #[prost(uint32, tag = "1")]
    pub header: u32,
    #[prost(uint32, tag = "2")]
    pub version: u32,
    #[prost(int32, tag = "3")]
    pub cmd: i32,
    #[prost(message, optional, tag = "5")]
    pub payload: Option<Payload>,
}

impl MbMessage {
    /// Build a message with the fixed header and version.
    pub fn new(command: CommandCode, frame: payload::Frame) -> Self {
        Self {
            header: u32::from(PROTOCOL_HEADER),
            version: u32::from(PROTOCOL_VERSION),
            cmd: command as i32,
            payload: Some(Payload { frame: Some(frame) }),
        }
    }
}

/// Either a command (host to device) or an answer (device to host).
#[derive(Clone, PartialEq, prost::Message)]
pub struct Payload {
    #[prost(oneof = "payload::Frame", tags = "1, 2")]
    pub frame: Option<payload::Frame>,
}

pub mod payload {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Frame {
        #[prost(message, tag = "1")]
        PayloadCmdFrame(super::CmdFrame),
        #[prost(message, tag = "2")]
        PayloadAnswerFrame(super::AnswerFrame),
    }
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct CmdFrame {
    #[prost(oneof = "cmd_frame::Kind", tags = "1, 2, 3, 4, 5, 6")]
    pub kind: Option<cmd_frame::Kind>,
}

pub mod cmd_frame {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        /// Commands without parameters.
        #[prost(message, tag = "1")]
        Empty(super::EmptyFrame),
        #[prost(message, tag = "2")]
        DeviceMode(super::DeviceModeFrame),
        #[prost(message, tag = "3")]
        AntennaSettings(super::AntennaSettingsFrame),
        #[prost(message, tag = "4")]
        BaudrateSettings(super::BaudrateSettingsFrame),
        #[prost(message, tag = "5")]
        ModbusOneShot(super::ModbusOneShotFrame),
        #[prost(message, tag = "6")]
        ModbusPeriodical(super::ModbusPeriodicalFrame),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EmptyFrame {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeviceModeFrame {
    #[prost(int32, tag = "1")]
    pub device_mode: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AntennaSettingsFrame {
    #[prost(int32, tag = "1")]
    pub antenna_settings: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BaudrateSettingsFrame {
    #[prost(int32, tag = "1")]
    pub modbus_port: i32,
    #[prost(int32, tag = "2")]
    pub modbus_baud: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModbusOneShotFrame {
    #[prost(int32, tag = "1")]
    pub modbus_port: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub modbus_frame: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModbusPeriodicalFrame {
    #[prost(int32, tag = "1")]
    pub modbus_port: i32,
    #[prost(uint32, tag = "2")]
    pub configuration_index: u32,
    #[prost(uint32, tag = "3")]
    pub interval: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub modbus_frame: Vec<u8>,
}

// ============================================================================
// Answers
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct AnswerFrame {
    #[prost(oneof = "answer_frame::Kind", tags = "1, 2, 3")]
    pub kind: Option<answer_frame::Kind>,
}

pub mod answer_frame {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        AckFrame(super::AckFrame),
        #[prost(message, tag = "2")]
        DiagnosticsFrame(super::DiagnosticsFrame),
        #[prost(message, tag = "3")]
        ModbusResponseFrame(super::ModbusResponseFrame),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AckFrame {
    #[prost(int32, tag = "1")]
    pub acknowledge: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModbusResponseFrame {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(int32, tag = "2")]
    pub modbus_port: i32,
    /// Zero for one-shot responses.
    #[prost(uint32, tag = "3")]
    pub configuration_index: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub modbus_frame: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DiagnosticsFrame {
    #[prost(string, tag = "1")]
    pub firmware_version: String,
    /// Seconds since boot.
    #[prost(uint32, tag = "2")]
    pub uptime: u32,
    #[prost(int32, tag = "3")]
    pub device_mode: i32,
    #[prost(int32, tag = "4")]
    pub antenna_settings: i32,
    #[prost(uint32, tag = "5")]
    pub reset_count: u32,
    #[prost(uint32, tag = "6")]
    pub modbus_requests: u32,
    #[prost(uint32, tag = "7")]
    pub modbus_errors: u32,
}
