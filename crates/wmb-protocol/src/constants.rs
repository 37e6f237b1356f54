//! Protocol constants
//!
//! These constants define the envelope bytes, command identifiers, selector
//! codes and size limits of the WMB wire protocol.

// ============================================================================
// Envelope
// ============================================================================

/// Fixed first byte of every frame (and value of the structured `header` field).
pub const PROTOCOL_HEADER: u8 = 0x47;
/// Protocol version. There is no negotiation; any other value is rejected.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Size of the CRC-16 trailer.
pub const CHECKSUM_SIZE: usize = 2;
/// Size of `header | version | command | length(2)` in the length-prefixed scheme.
pub const ENVELOPE_HEADER_SIZE: usize = 5;

// ============================================================================
// Size Limits
// ============================================================================

/// Largest frame the mesh transport accepts in one unit.
pub const MAX_FRAME_SIZE: usize = 1024;
/// Largest payload the length-prefixed envelope may carry.
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - ENVELOPE_HEADER_SIZE - CHECKSUM_SIZE;
/// Largest embedded Modbus frame carried by the Modbus commands.
pub const MAX_MODBUS_FRAME_SIZE: usize = 256;

// ============================================================================
// Command Codes (host → device)
// ============================================================================

/// Reset the device.
pub const CMD_DEVICE_RESET: u8 = 0x01;
/// Request a diagnostics snapshot.
pub const CMD_DIAGNOSTICS: u8 = 0x02;
/// Announce a firmware update (the image transfer runs out of band).
pub const CMD_FIRMWARE_UPDATE_NOTIFY: u8 = 0x03;
/// Select the Modbus operating mode.
pub const CMD_DEVICE_MODE: u8 = 0x04;
/// Select the antenna.
pub const CMD_ANTENNA_CONFIG: u8 = 0x05;
/// Configure the baud rate of an RS-485 port.
pub const CMD_BAUDRATE_CONFIG: u8 = 0x06;
/// Forward one Modbus request and return its response.
pub const CMD_MODBUS_ONE_SHOT: u8 = 0x07;
/// Install a Modbus request that the device repeats on an interval.
pub const CMD_MODBUS_PERIODIC: u8 = 0x08;

// ============================================================================
// Selector Codes
// ============================================================================

/// Device acts as Modbus master (default).
pub const DEVICE_MODE_MODBUS_MASTER: u8 = 0x00;
/// Device passively listens to bus traffic.
pub const DEVICE_MODE_MODBUS_SNIFFER: u8 = 0x01;

/// Internal antenna (default).
pub const ANTENNA_INTERNAL: u8 = 0x00;
/// External antenna connector.
pub const ANTENNA_EXTERNAL: u8 = 0x01;

/// Leave the port selection unchanged.
pub const MODBUS_PORT_NO_EFFECT: u8 = 0x00;
/// First RS-485 port.
pub const MODBUS_PORT_ONE: u8 = 0x01;
/// Second RS-485 port.
pub const MODBUS_PORT_TWO: u8 = 0x02;

pub const BAUD_4800: u8 = 0x0C;
pub const BAUD_9600: u8 = 0x0D;
pub const BAUD_19200: u8 = 0x0E;
pub const BAUD_28800: u8 = 0x0F;
pub const BAUD_38400: u8 = 0x10;
pub const BAUD_57600: u8 = 0x11;
pub const BAUD_76800: u8 = 0x12;
pub const BAUD_115200: u8 = 0x13;

// ============================================================================
// Periodic Modbus Limits
// ============================================================================

/// Lowest periodic configuration slot.
pub const MIN_CONFIG_INDEX: u8 = 1;
/// Highest periodic configuration slot.
pub const MAX_CONFIG_INDEX: u8 = 64;
/// Longest periodic interval: 30 days in seconds.
pub const MAX_INTERVAL_SECS: u32 = 30 * 24 * 60 * 60;
/// Width of the interval field in the length-prefixed payload.
pub const INTERVAL_FIELD_SIZE: usize = 3;

// ============================================================================
// Answer Status Codes (device → host)
// ============================================================================

pub const ACK_OK: i32 = 0;
pub const ACK_UNSUPPORTED_COMMAND: i32 = 1;
pub const ACK_INVALID_ARGUMENT: i32 = 2;
pub const ACK_BUSY: i32 = 3;
pub const ACK_MODBUS_TIMEOUT: i32 = 4;
