//! Common types used in the protocol.
//!
//! The selector enums derive `prost::Enumeration` for their `i32`
//! conversions. The structured schema stores them as plain `int32` fields
//! and converts through `selector`, so an absent field is reported as
//! value 0 instead of falling back to the enum's first variant.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Command identifier carried by every frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum CommandCode {
    /// Reset the device.
    DeviceReset = 1,
    /// Request a diagnostics snapshot.
    Diagnostics = 2,
    /// Announce a firmware update.
    FirmwareUpdateNotify = 3,
    /// Select the Modbus operating mode.
    DeviceMode = 4,
    /// Select the antenna.
    AntennaConfig = 5,
    /// Configure a port's baud rate.
    BaudrateConfig = 6,
    /// Single Modbus request.
    ModbusOneShot = 7,
    /// Repeating Modbus request.
    ModbusPeriodic = 8,
}

impl CommandCode {
    /// Wire byte for this command.
    pub fn as_u8(self) -> u8 {
        self as i32 as u8
    }

    /// Look up a command by its wire byte.
    pub fn from_u8(code: u8) -> Result<Self, DecodeError> {
        Self::try_from(i32::from(code)).map_err(|_| DecodeError::UnknownCommand(i32::from(code)))
    }

    /// Stable snake_case name, as used in JSON and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            CommandCode::DeviceReset => "device_reset",
            CommandCode::Diagnostics => "diagnostics",
            CommandCode::FirmwareUpdateNotify => "firmware_update_notify",
            CommandCode::DeviceMode => "device_mode",
            CommandCode::AntennaConfig => "antenna_config",
            CommandCode::BaudrateConfig => "baudrate_config",
            CommandCode::ModbusOneShot => "modbus_one_shot",
            CommandCode::ModbusPeriodic => "modbus_periodic",
        }
    }

    /// Whether answers to this command carry an embedded Modbus frame.
    pub fn carries_modbus_frame(self) -> bool {
        matches!(self, CommandCode::ModbusOneShot | CommandCode::ModbusPeriodic)
    }
}

/// Modbus operating mode of the device.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum DeviceMode {
    /// The device drives the bus as Modbus master.
    ModbusMaster = 0,
    /// The device only listens to bus traffic.
    ModbusSniffer = 1,
}

/// Antenna selection.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum AntennaConfig {
    Internal = 0,
    External = 1,
}

/// RS-485 port selection.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ModbusPort {
    /// Keep the current port; not a valid Modbus target.
    NoEffect = 0,
    One = 1,
    Two = 2,
}

/// Serial baud rate table.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum BaudRate {
    B4800 = 0x0C,
    B9600 = 0x0D,
    B19200 = 0x0E,
    B28800 = 0x0F,
    B38400 = 0x10,
    B57600 = 0x11,
    B76800 = 0x12,
    B115200 = 0x13,
}

impl BaudRate {
    /// All supported rates, slowest first.
    pub const ALL: [BaudRate; 8] = [
        BaudRate::B4800,
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B28800,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B76800,
        BaudRate::B115200,
    ];

    /// Line speed in bits per second.
    pub fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B4800 => 4800,
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B28800 => 28800,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B76800 => 76800,
            BaudRate::B115200 => 115200,
        }
    }

    /// Find the table entry for a line speed.
    pub fn from_bits_per_second(bps: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.bits_per_second() == bps)
    }
}

macro_rules! wire_byte {
    ($($ty:ident => $field:literal),* $(,)?) => {
        $(
            impl $ty {
                /// Wire byte for this value.
                pub fn as_u8(self) -> u8 {
                    self as i32 as u8
                }

                /// Look up a value by its wire byte.
                pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
                    selector($field, i32::from(value))
                }
            }
        )*
    };
}

wire_byte! {
    DeviceMode => "device_mode",
    AntennaConfig => "antenna_settings",
    ModbusPort => "modbus_port",
    BaudRate => "modbus_baud",
}

/// Convert a raw enumeration value, naming the field on failure.
pub(crate) fn selector<T: TryFrom<i32>>(field: &'static str, value: i32) -> Result<T, DecodeError> {
    T::try_from(value).map_err(|_| DecodeError::InvalidField {
        field,
        value: i64::from(value),
    })
}

/// Format bytes as space-separated lowercase hex (`47 01 01 00 00`).
pub fn hex_string(data: &[u8]) -> String {
    data.iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse hex text, tolerating whitespace, `:` separators and `0x` prefixes.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let cleaned: String = text
        .split(|c: char| c.is_whitespace() || c == ':' || c == ',')
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            chunk
                .strip_prefix("0x")
                .or_else(|| chunk.strip_prefix("0X"))
                .unwrap_or(chunk)
        })
        .collect();
    hex::decode(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_bytes() {
        assert_eq!(CommandCode::DeviceReset.as_u8(), 0x01);
        assert_eq!(CommandCode::ModbusPeriodic.as_u8(), 0x08);
        assert_eq!(CommandCode::from_u8(0x05).unwrap(), CommandCode::AntennaConfig);
        assert_eq!(
            CommandCode::from_u8(0x09).unwrap_err(),
            DecodeError::UnknownCommand(0x09)
        );
        assert!(CommandCode::from_u8(0x00).is_err());
        assert_eq!(CommandCode::ModbusOneShot.name(), "modbus_one_shot");
        assert!(CommandCode::ModbusPeriodic.carries_modbus_frame());
        assert!(!CommandCode::Diagnostics.carries_modbus_frame());
    }

    #[test]
    fn test_selector_bytes() {
        assert_eq!(DeviceMode::from_u8(1).unwrap(), DeviceMode::ModbusSniffer);
        assert_eq!(AntennaConfig::External.as_u8(), 0x01);
        assert_eq!(ModbusPort::from_u8(0).unwrap(), ModbusPort::NoEffect);
        assert_eq!(BaudRate::from_u8(0x0E).unwrap(), BaudRate::B19200);
        assert_eq!(
            ModbusPort::from_u8(3).unwrap_err(),
            DecodeError::InvalidField {
                field: "modbus_port",
                value: 3
            }
        );
        assert!(BaudRate::from_u8(0x0B).is_err());
        assert!(BaudRate::from_u8(0x14).is_err());
    }

    #[test]
    fn test_wire_values_match_constants() {
        use crate::constants::*;

        let commands = [
            (CommandCode::DeviceReset, CMD_DEVICE_RESET),
            (CommandCode::Diagnostics, CMD_DIAGNOSTICS),
            (CommandCode::FirmwareUpdateNotify, CMD_FIRMWARE_UPDATE_NOTIFY),
            (CommandCode::DeviceMode, CMD_DEVICE_MODE),
            (CommandCode::AntennaConfig, CMD_ANTENNA_CONFIG),
            (CommandCode::BaudrateConfig, CMD_BAUDRATE_CONFIG),
            (CommandCode::ModbusOneShot, CMD_MODBUS_ONE_SHOT),
            (CommandCode::ModbusPeriodic, CMD_MODBUS_PERIODIC),
        ];
        for (code, byte) in commands {
            assert_eq!(code.as_u8(), byte);
        }

        assert_eq!(DeviceMode::ModbusMaster.as_u8(), DEVICE_MODE_MODBUS_MASTER);
        assert_eq!(DeviceMode::ModbusSniffer.as_u8(), DEVICE_MODE_MODBUS_SNIFFER);
        assert_eq!(AntennaConfig::Internal.as_u8(), ANTENNA_INTERNAL);
        assert_eq!(AntennaConfig::External.as_u8(), ANTENNA_EXTERNAL);
        assert_eq!(ModbusPort::NoEffect.as_u8(), MODBUS_PORT_NO_EFFECT);
        assert_eq!(ModbusPort::One.as_u8(), MODBUS_PORT_ONE);
        assert_eq!(ModbusPort::Two.as_u8(), MODBUS_PORT_TWO);

        let bauds = [
            BAUD_4800,
            BAUD_9600,
            BAUD_19200,
            BAUD_28800,
            BAUD_38400,
            BAUD_57600,
            BAUD_76800,
            BAUD_115200,
        ];
        for (rate, byte) in BaudRate::ALL.into_iter().zip(bauds) {
            assert_eq!(rate.as_u8(), byte);
        }
    }

    #[test]
    fn test_baud_rate_table() {
        for rate in BaudRate::ALL {
            assert_eq!(BaudRate::from_bits_per_second(rate.bits_per_second()), Some(rate));
        }
        assert_eq!(BaudRate::B115200.as_u8(), 0x13);
        assert_eq!(BaudRate::from_bits_per_second(14400), None);
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(hex_string(&[0x47, 0x01, 0xEF]), "47 01 ef");
        assert_eq!(hex_string(&[]), "");
        assert_eq!(parse_hex("47 01 ef").unwrap(), vec![0x47, 0x01, 0xEF]);
        assert_eq!(parse_hex("0x47 0x01").unwrap(), vec![0x47, 0x01]);
        assert_eq!(parse_hex("4701EF").unwrap(), vec![0x47, 0x01, 0xEF]);
        assert!(parse_hex("4").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
