//! Protocol error types.

use thiserror::Error;

use crate::types::CommandCode;

/// Errors that can occur when building or parsing WMB frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A command parameter violates a documented constraint.
    #[error("invalid command parameters: {0}")]
    Validation(#[from] ValidationError),

    /// Frame is too short to contain a checksum.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Recomputed checksum disagrees with the frame trailer.
    #[error("checksum mismatch: computed 0x{computed:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        /// Checksum computed over the received bytes.
        computed: u16,
        /// Checksum carried in the trailer.
        received: u16,
    },

    /// Checksum passed but the content could not be interpreted.
    #[error("malformed frame content: {0}")]
    Deserialization(#[from] DecodeError),

    /// Assembled frame would exceed the transport limit.
    #[error("frame too large: {size} bytes (max {max})")]
    OversizeFrame {
        /// Size the frame would have.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

impl ProtocolError {
    /// Short, stable label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::Validation(_) => "validation",
            ProtocolError::FrameTooShort { .. } => "frame_too_short",
            ProtocolError::ChecksumMismatch { .. } => "checksum_mismatch",
            ProtocolError::Deserialization(_) => "deserialization",
            ProtocolError::OversizeFrame { .. } => "oversize_frame",
        }
    }
}

/// A command parameter is outside its allowed range or set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Modbus commands need a real port.
    #[error("{command:?} requires a concrete Modbus port, not \"no effect\"")]
    NoEffectPort {
        /// The command that was being built.
        command: CommandCode,
    },

    /// Periodic configuration slot out of range.
    #[error("configuration index {index} out of range {min}..={max}")]
    ConfigIndexOutOfRange {
        /// Requested slot.
        index: u8,
        /// Lowest valid slot.
        min: u8,
        /// Highest valid slot.
        max: u8,
    },

    /// Periodic interval out of range.
    #[error("interval {interval}s out of range {min}..={max}s")]
    IntervalOutOfRange {
        /// Requested interval in seconds.
        interval: i64,
        /// Shortest valid interval.
        min: i64,
        /// Longest valid interval.
        max: i64,
    },

    /// Embedded Modbus frame is too large.
    #[error("embedded Modbus frame too large: {size} bytes (max {max})")]
    EmbeddedFrameTooLarge {
        /// Actual size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

/// The checksum matched but the frame content is not a valid message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The structured message could not be parsed.
    #[error("structured message: {0}")]
    Schema(#[from] prost::DecodeError),

    /// Header byte is not the protocol header.
    #[error("invalid header: expected 0x{expected:02X}, got 0x{actual:02X}")]
    InvalidHeader {
        /// Expected header.
        expected: u32,
        /// Header found.
        actual: u32,
    },

    /// Version byte is not the supported version.
    #[error("unsupported protocol version: expected {expected}, got {actual}")]
    UnsupportedVersion {
        /// Supported version.
        expected: u32,
        /// Version found.
        actual: u32,
    },

    /// Unknown command identifier.
    #[error("unknown command code: 0x{0:02X}")]
    UnknownCommand(i32),

    /// Not enough bytes for a fixed-size field.
    #[error("truncated: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes needed.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Length prefix disagrees with the bytes present.
    #[error("length prefix says {declared} payload bytes, frame carries {actual}")]
    LengthMismatch {
        /// Length from the prefix.
        declared: usize,
        /// Payload bytes present.
        actual: usize,
    },

    /// A selector field holds a value outside its table.
    #[error("invalid value {value} for field `{field}`")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: i64,
    },

    /// A required message field is absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// The payload kind does not belong to the command.
    #[error("payload does not match command {command:?}")]
    PayloadMismatch {
        /// Command carried by the frame.
        command: CommandCode,
    },

    /// Trailing bytes after a fixed-size payload.
    #[error("unexpected {len}-byte payload for command {command:?}")]
    UnexpectedPayload {
        /// Command carried by the frame.
        command: CommandCode,
        /// Payload length found.
        len: usize,
    },

    /// Decoded parameters violate a command constraint.
    #[error("decoded parameters rejected: {0}")]
    Constraint(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::ChecksumMismatch {
            computed: 0xD37C,
            received: 0x0000,
        };
        assert!(err.to_string().contains("0xD37C"));

        let err = ProtocolError::from(ValidationError::ConfigIndexOutOfRange {
            index: 65,
            min: 1,
            max: 64,
        });
        assert!(err.to_string().contains("65"));
        assert_eq!(err.kind(), "validation");

        let err = ProtocolError::from(DecodeError::UnknownCommand(0x2A));
        assert!(err.to_string().contains("0x2A"));
        assert_eq!(err.kind(), "deserialization");
    }
}
