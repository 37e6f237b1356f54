use std::fmt;
use std::io;

use wmb_link::ConfigError;
use wmb_protocol::ProtocolError;

// Exit codes follow sysexits.h where one fits.
pub const SUCCESS: i32 = 0;
/// A frame failed verification or decoding.
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NO_INPUT: i32 = 66;
pub const CONFIG: i32 = 78;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => NO_INPUT,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn protocol_error(context: &str, err: ProtocolError) -> CliError {
    let code = match err {
        // Builder inputs come from the command line.
        ProtocolError::Validation(_) => USAGE,
        ProtocolError::FrameTooShort { .. }
        | ProtocolError::ChecksumMismatch { .. }
        | ProtocolError::Deserialization(_)
        | ProtocolError::OversizeFrame { .. } => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    match err {
        ConfigError::Io { path, source } => {
            io_error(&format!("{context}: {}", path.display()), source)
        }
        other => CliError::new(CONFIG, format!("{context}: {other}")),
    }
}
