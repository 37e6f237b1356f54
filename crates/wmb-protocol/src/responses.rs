//! Answers from the device and decoded messages.

use serde::{Deserialize, Serialize};

use crate::commands::Command;
use crate::constants::*;
use crate::error::{DecodeError, ValidationError};
use crate::schema::{self, answer_frame::Kind, payload, AnswerFrame, MbMessage};
use crate::types::*;

/// Status code carried by acknowledgements and Modbus responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    /// Command accepted.
    Ok,
    /// The device does not implement the command.
    UnsupportedCommand,
    /// A parameter was rejected by the device.
    InvalidArgument,
    /// The device is busy with a previous request.
    Busy,
    /// The Modbus slave did not answer.
    ModbusTimeout,
    /// Status code not known to this crate.
    Unknown(i32),
}

impl AckStatus {
    /// Whether the device accepted the command.
    pub fn is_ok(self) -> bool {
        self == AckStatus::Ok
    }
}

impl From<i32> for AckStatus {
    fn from(code: i32) -> Self {
        match code {
            ACK_OK => AckStatus::Ok,
            ACK_UNSUPPORTED_COMMAND => AckStatus::UnsupportedCommand,
            ACK_INVALID_ARGUMENT => AckStatus::InvalidArgument,
            ACK_BUSY => AckStatus::Busy,
            ACK_MODBUS_TIMEOUT => AckStatus::ModbusTimeout,
            other => AckStatus::Unknown(other),
        }
    }
}

impl From<AckStatus> for i32 {
    fn from(status: AckStatus) -> Self {
        match status {
            AckStatus::Ok => ACK_OK,
            AckStatus::UnsupportedCommand => ACK_UNSUPPORTED_COMMAND,
            AckStatus::InvalidArgument => ACK_INVALID_ARGUMENT,
            AckStatus::Busy => ACK_BUSY,
            AckStatus::ModbusTimeout => ACK_MODBUS_TIMEOUT,
            AckStatus::Unknown(code) => code,
        }
    }
}

/// Device state reported in answer to a diagnostics request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    /// Firmware version string.
    pub firmware_version: String,
    /// Seconds since boot.
    pub uptime_secs: u32,
    /// Current Modbus operating mode.
    pub device_mode: DeviceMode,
    /// Current antenna selection.
    pub antenna: AntennaConfig,
    /// Number of resets since manufacturing.
    pub reset_count: u32,
    /// Modbus requests issued since boot.
    pub modbus_requests: u32,
    /// Modbus requests that failed since boot.
    pub modbus_errors: u32,
}

/// Application protocol of an embedded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddedProtocol {
    /// Modbus RTU frame, including its own CRC.
    ModbusRtu,
}

/// Decoder for embedded application frames.
///
/// The codec hands embedded frames over as opaque bytes; implementations of
/// this trait turn them into register values, coil states and so on.
pub trait EmbeddedFrameDecoder {
    /// Decoded representation.
    type Output;
    /// Decoding failure.
    type Error;

    /// Decode `frame`, which was tagged as `protocol`.
    fn decode(&self, protocol: EmbeddedProtocol, frame: &[u8]) -> Result<Self::Output, Self::Error>;
}

/// Response to a one-shot or periodic Modbus request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModbusResponse {
    /// Outcome of the request.
    pub status: AckStatus,
    /// Port the request ran on.
    pub port: ModbusPort,
    /// Periodic configuration slot, `None` for one-shot requests.
    pub config_index: Option<u8>,
    /// How to interpret `frame`.
    pub protocol: EmbeddedProtocol,
    /// Raw embedded response frame.
    #[serde(with = "hex::serde")]
    pub frame: Vec<u8>,
}

impl ModbusResponse {
    /// Whether this response comes from a periodic configuration.
    pub fn is_periodic(&self) -> bool {
        self.config_index.is_some()
    }

    /// Hand the embedded frame to an external decoder.
    pub fn decode_with<D: EmbeddedFrameDecoder>(&self, decoder: &D) -> Result<D::Output, D::Error> {
        decoder.decode(self.protocol, &self.frame)
    }
}

/// Answer sent by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    /// Plain acknowledgement.
    Ack(AckStatus),
    /// Diagnostics snapshot.
    Diagnostics(DiagnosticsSnapshot),
    /// Result of a Modbus request.
    ModbusResponse(ModbusResponse),
}

impl Answer {
    /// Whether the device reports success.
    pub fn is_success(&self) -> bool {
        match self {
            Answer::Ack(status) => status.is_ok(),
            Answer::Diagnostics(_) => true,
            Answer::ModbusResponse(resp) => resp.status.is_ok(),
        }
    }

    /// Check size and range constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Answer::Ack(_) | Answer::Diagnostics(_) => Ok(()),
            Answer::ModbusResponse(resp) => {
                if resp.port == ModbusPort::NoEffect {
                    let command = if resp.is_periodic() {
                        CommandCode::ModbusPeriodic
                    } else {
                        CommandCode::ModbusOneShot
                    };
                    return Err(ValidationError::NoEffectPort { command });
                }
                if let Some(index) = resp.config_index {
                    if !(MIN_CONFIG_INDEX..=MAX_CONFIG_INDEX).contains(&index) {
                        return Err(ValidationError::ConfigIndexOutOfRange {
                            index,
                            min: MIN_CONFIG_INDEX,
                            max: MAX_CONFIG_INDEX,
                        });
                    }
                }
                if resp.frame.len() > MAX_MODBUS_FRAME_SIZE {
                    return Err(ValidationError::EmbeddedFrameTooLarge {
                        size: resp.frame.len(),
                        max: MAX_MODBUS_FRAME_SIZE,
                    });
                }
                Ok(())
            }
        }
    }

    /// Convert to the structured answer payload.
    pub fn to_answer_frame(&self) -> AnswerFrame {
        let kind = match self {
            Answer::Ack(status) => Kind::AckFrame(schema::AckFrame {
                acknowledge: i32::from(*status),
            }),
            Answer::Diagnostics(diag) => Kind::DiagnosticsFrame(schema::DiagnosticsFrame {
                firmware_version: diag.firmware_version.clone(),
                uptime: diag.uptime_secs,
                device_mode: diag.device_mode as i32,
                antenna_settings: diag.antenna as i32,
                reset_count: diag.reset_count,
                modbus_requests: diag.modbus_requests,
                modbus_errors: diag.modbus_errors,
            }),
            Answer::ModbusResponse(resp) => {
                Kind::ModbusResponseFrame(schema::ModbusResponseFrame {
                    status: i32::from(resp.status),
                    modbus_port: resp.port as i32,
                    configuration_index: resp.config_index.map(u32::from).unwrap_or(0),
                    modbus_frame: resp.frame.clone(),
                })
            }
        };

        AnswerFrame { kind: Some(kind) }
    }

    /// Rebuild an answer from a structured payload and its command code.
    pub fn from_answer_frame(command: CommandCode, frame: AnswerFrame) -> Result<Self, DecodeError> {
        let kind = frame
            .kind
            .ok_or(DecodeError::MissingField("payload_answer_frame"))?;

        let answer = match kind {
            Kind::AckFrame(f) => Answer::Ack(AckStatus::from(f.acknowledge)),

            Kind::DiagnosticsFrame(f) => {
                if command != CommandCode::Diagnostics {
                    return Err(DecodeError::PayloadMismatch { command });
                }
                Answer::Diagnostics(DiagnosticsSnapshot {
                    firmware_version: f.firmware_version,
                    uptime_secs: f.uptime,
                    device_mode: selector("device_mode", f.device_mode)?,
                    antenna: selector("antenna_settings", f.antenna_settings)?,
                    reset_count: f.reset_count,
                    modbus_requests: f.modbus_requests,
                    modbus_errors: f.modbus_errors,
                })
            }

            Kind::ModbusResponseFrame(f) => {
                if !command.carries_modbus_frame() {
                    return Err(DecodeError::PayloadMismatch { command });
                }
                let config_index = match f.configuration_index {
                    0 => None,
                    index => Some(u8::try_from(index).map_err(|_| DecodeError::InvalidField {
                        field: "configuration_index",
                        value: i64::from(index),
                    })?),
                };
                Answer::ModbusResponse(ModbusResponse {
                    status: AckStatus::from(f.status),
                    port: selector("modbus_port", f.modbus_port)?,
                    config_index,
                    protocol: EmbeddedProtocol::ModbusRtu,
                    frame: f.modbus_frame,
                })
            }
        };

        answer.validate()?;
        Ok(answer)
    }
}

/// A decoded structured message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum Message {
    /// Host to device.
    Command(Command),
    /// Device to host.
    Answer {
        /// Command being answered.
        command: CommandCode,
        /// Answer content.
        answer: Answer,
    },
}

impl Message {
    /// Command code carried by the message.
    pub fn code(&self) -> CommandCode {
        match self {
            Message::Command(cmd) => cmd.code(),
            Message::Answer { command, .. } => *command,
        }
    }

    /// Build the structured message for this value.
    pub fn to_mb_message(&self) -> MbMessage {
        match self {
            Message::Command(cmd) => MbMessage::new(
                cmd.code(),
                payload::Frame::PayloadCmdFrame(cmd.to_cmd_frame()),
            ),
            Message::Answer { command, answer } => MbMessage::new(
                *command,
                payload::Frame::PayloadAnswerFrame(answer.to_answer_frame()),
            ),
        }
    }
}

impl TryFrom<MbMessage> for Message {
    type Error = DecodeError;

    fn try_from(msg: MbMessage) -> Result<Self, Self::Error> {
        if msg.header != u32::from(PROTOCOL_HEADER) {
            return Err(DecodeError::InvalidHeader {
                expected: u32::from(PROTOCOL_HEADER),
                actual: msg.header,
            });
        }
        if msg.version != u32::from(PROTOCOL_VERSION) {
            return Err(DecodeError::UnsupportedVersion {
                expected: u32::from(PROTOCOL_VERSION),
                actual: msg.version,
            });
        }

        let command =
            CommandCode::try_from(msg.cmd).map_err(|_| DecodeError::UnknownCommand(msg.cmd))?;

        let frame = msg
            .payload
            .and_then(|p| p.frame)
            .ok_or(DecodeError::MissingField("payload"))?;

        match frame {
            payload::Frame::PayloadCmdFrame(f) => {
                Ok(Message::Command(Command::from_cmd_frame(command, f)?))
            }
            payload::Frame::PayloadAnswerFrame(f) => Ok(Message::Answer {
                command,
                answer: Answer::from_answer_frame(command, f)?,
            }),
        }
    }
}
