//! Frame encoding/decoding.
//!
//! Two framing schemes are in use. The length-prefixed scheme wraps a
//! hand-packed payload in a fixed envelope:
//!
//! ```text
//! +------+---------+---------+--------+--------+-----------------+--------+--------+
//! | 0x47 | version | command | len_hi | len_lo | payload[0..len] | crc_hi | crc_lo |
//! +------+---------+---------+--------+--------+-----------------+--------+--------+
//! ```
//!
//! The structured scheme serializes a [`MbMessage`] (which carries header,
//! version and command as fields) and appends the same CRC trailer:
//!
//! ```text
//! +------------------------------+--------+--------+
//! | MbMessage (protocol buffers) | crc_hi | crc_lo |
//! +------------------------------+--------+--------+
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut};
use prost::Message as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::checksum;
use crate::commands::Command;
use crate::constants::*;
use crate::error::{DecodeError, ProtocolError};
use crate::responses::{Answer, Message};
use crate::schema::{payload, MbMessage};
use crate::types::CommandCode;

/// Framing scheme selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// Fixed envelope with a 16-bit length prefix.
    LengthPrefixed,
    /// Protocol-buffers message with embedded header fields.
    #[default]
    Structured,
}

impl Framing {
    /// Codec implementing this scheme.
    pub fn codec(self) -> &'static dyn FrameCodec {
        match self {
            Framing::LengthPrefixed => &LengthPrefixedCodec,
            Framing::Structured => &StructuredCodec,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Framing::LengthPrefixed => "length-prefixed",
            Framing::Structured => "structured",
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised framing name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown framing `{0}` (expected `structured` or `length-prefixed`)")]
pub struct ParseFramingError(pub String);

impl FromStr for Framing {
    type Err = ParseFramingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "length-prefixed" | "length_prefixed" | "legacy" => Ok(Framing::LengthPrefixed),
            "structured" | "protobuf" => Ok(Framing::Structured),
            _ => Err(ParseFramingError(s.to_string())),
        }
    }
}

/// Turns commands into frames and frames into messages.
///
/// Implementations are stateless; a single instance may be shared between
/// threads.
pub trait FrameCodec: Send + Sync {
    /// Scheme implemented by this codec.
    fn framing(&self) -> Framing;

    /// Validate a command and build its frame.
    fn encode_command(&self, command: &Command) -> Result<Vec<u8>, ProtocolError>;

    /// Verify a frame's checksum and decode its content.
    fn decode_message(&self, frame: &[u8]) -> Result<Message, ProtocolError>;
}

// ============================================================================
// Length-prefixed framing
// ============================================================================

/// A verified length-prefixed frame whose payload has not been interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Command byte.
    pub command: u8,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl RawFrame {
    /// Typed command code.
    pub fn command_code(&self) -> Result<CommandCode, DecodeError> {
        CommandCode::from_u8(self.command)
    }
}

/// Codec for the length-prefixed envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthPrefixedCodec;

impl LengthPrefixedCodec {
    /// Wrap an already-built payload in the envelope and append the checksum.
    pub fn encode_raw(&self, command: CommandCode, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let size = ENVELOPE_HEADER_SIZE + payload.len() + CHECKSUM_SIZE;
        let oversize = ProtocolError::OversizeFrame {
            size,
            max: MAX_FRAME_SIZE,
        };
        if payload.len() > MAX_PAYLOAD_SIZE || size > MAX_FRAME_SIZE {
            return Err(oversize);
        }
        let len = u16::try_from(payload.len()).map_err(|_| oversize)?;

        let mut buf = Vec::with_capacity(size);
        buf.put_u8(PROTOCOL_HEADER);
        buf.put_u8(PROTOCOL_VERSION);
        buf.put_u8(command.as_u8());
        buf.put_u16(len);
        buf.put_slice(payload);
        checksum::append(&mut buf);

        trace!(?command, len = buf.len(), "encoded length-prefixed frame");
        Ok(buf)
    }

    /// Verify the checksum and split the envelope.
    pub fn decode_frame(&self, frame: &[u8]) -> Result<RawFrame, ProtocolError> {
        let body = checksum::verify(frame)?;
        if body.len() < ENVELOPE_HEADER_SIZE {
            return Err(DecodeError::Truncated {
                expected: ENVELOPE_HEADER_SIZE,
                actual: body.len(),
            }
            .into());
        }

        let mut buf = body;
        let header = buf.get_u8();
        if header != PROTOCOL_HEADER {
            return Err(DecodeError::InvalidHeader {
                expected: u32::from(PROTOCOL_HEADER),
                actual: u32::from(header),
            }
            .into());
        }
        let version = buf.get_u8();
        if version != PROTOCOL_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                expected: u32::from(PROTOCOL_VERSION),
                actual: u32::from(version),
            }
            .into());
        }
        let command = buf.get_u8();
        let declared = usize::from(buf.get_u16());
        if declared != buf.remaining() {
            return Err(DecodeError::LengthMismatch {
                declared,
                actual: buf.remaining(),
            }
            .into());
        }

        Ok(RawFrame {
            command,
            payload: buf.to_vec(),
        })
    }

    /// Verify and decode a command frame.
    pub fn decode_command(&self, frame: &[u8]) -> Result<Command, ProtocolError> {
        let raw = self.decode_frame(frame)?;
        let code = raw.command_code()?;
        Ok(Command::decode_payload(code, &raw.payload)?)
    }
}

impl FrameCodec for LengthPrefixedCodec {
    fn framing(&self) -> Framing {
        Framing::LengthPrefixed
    }

    fn encode_command(&self, command: &Command) -> Result<Vec<u8>, ProtocolError> {
        command.validate()?;
        self.encode_raw(command.code(), &command.encode_payload())
    }

    /// The length-prefixed scheme has no answer layout, so only commands
    /// are decoded.
    fn decode_message(&self, frame: &[u8]) -> Result<Message, ProtocolError> {
        self.decode_command(frame)
            .map(Message::Command)
            .inspect(|msg| trace!(command = ?msg.code(), len = frame.len(), "decoded length-prefixed frame"))
            .inspect_err(|err| debug!(kind = err.kind(), %err, "rejected length-prefixed frame"))
    }
}

// ============================================================================
// Structured framing
// ============================================================================

/// Codec for protocol-buffers messages with a CRC trailer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuredCodec;

impl StructuredCodec {
    /// Build a device-side answer frame.
    pub fn encode_answer(&self, command: CommandCode, answer: &Answer) -> Result<Vec<u8>, ProtocolError> {
        answer.validate()?;
        self.seal(&MbMessage::new(
            command,
            payload::Frame::PayloadAnswerFrame(answer.to_answer_frame()),
        ))
    }

    /// Build the frame for any message.
    pub fn encode_message(&self, message: &Message) -> Result<Vec<u8>, ProtocolError> {
        match message {
            Message::Command(cmd) => self.encode_command(cmd),
            Message::Answer { command, answer } => self.encode_answer(*command, answer),
        }
    }

    fn seal(&self, msg: &MbMessage) -> Result<Vec<u8>, ProtocolError> {
        let size = msg.encoded_len() + CHECKSUM_SIZE;
        if size > MAX_FRAME_SIZE {
            return Err(ProtocolError::OversizeFrame {
                size,
                max: MAX_FRAME_SIZE,
            });
        }

        let mut buf = Vec::with_capacity(size);
        buf.extend_from_slice(&msg.encode_to_vec());
        checksum::append(&mut buf);

        trace!(cmd = msg.cmd, len = buf.len(), "encoded structured frame");
        Ok(buf)
    }

    fn open(&self, frame: &[u8]) -> Result<Message, ProtocolError> {
        let body = checksum::verify(frame)?;
        let msg = MbMessage::decode(body).map_err(DecodeError::from)?;
        Ok(Message::try_from(msg)?)
    }
}

impl FrameCodec for StructuredCodec {
    fn framing(&self) -> Framing {
        Framing::Structured
    }

    fn encode_command(&self, command: &Command) -> Result<Vec<u8>, ProtocolError> {
        command.validate()?;
        self.seal(&MbMessage::new(
            command.code(),
            payload::Frame::PayloadCmdFrame(command.to_cmd_frame()),
        ))
    }

    fn decode_message(&self, frame: &[u8]) -> Result<Message, ProtocolError> {
        self.open(frame)
            .inspect(|msg| trace!(command = ?msg.code(), len = frame.len(), "decoded structured frame"))
            .inspect_err(|err| debug!(kind = err.kind(), %err, "rejected structured frame"))
    }
}
