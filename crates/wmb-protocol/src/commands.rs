//! Commands that can be sent to the device.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{DecodeError, ValidationError};
use crate::schema::{self, cmd_frame::Kind, CmdFrame};
use crate::types::*;

/// Commands that can be sent to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Reboot the device.
    DeviceReset,

    /// Request a diagnostics snapshot.
    Diagnostics,

    /// Tell the device a firmware image is about to be distributed.
    FirmwareUpdateNotify,

    /// Select the Modbus operating mode.
    SetDeviceMode {
        /// Master or sniffer.
        mode: DeviceMode,
    },

    /// Select the antenna.
    SetAntennaConfig {
        /// Internal or external.
        antenna: AntennaConfig,
    },

    /// Configure the baud rate of an RS-485 port.
    SetBaudrate {
        /// Target port (`NoEffect` keeps the current selection).
        port: ModbusPort,
        /// Line speed.
        baudrate: BaudRate,
    },

    /// Forward a single Modbus request.
    ModbusOneShot {
        /// Target port.
        port: ModbusPort,
        /// Raw Modbus RTU request, at most 256 bytes.
        #[serde(with = "hex::serde")]
        frame: Vec<u8>,
    },

    /// Install a Modbus request the device repeats on an interval.
    ModbusPeriodic {
        /// Target port.
        port: ModbusPort,
        /// Configuration slot, 1 to 64.
        config_index: u8,
        /// Repeat interval in seconds, at most 30 days.
        interval_secs: u32,
        /// Raw Modbus RTU request, at most 256 bytes.
        #[serde(with = "hex::serde")]
        frame: Vec<u8>,
    },
}

impl Command {
    /// Build a one-shot Modbus request, checking its constraints.
    pub fn modbus_one_shot(
        port: ModbusPort,
        frame: impl Into<Vec<u8>>,
    ) -> Result<Self, ValidationError> {
        let cmd = Command::ModbusOneShot {
            port,
            frame: frame.into(),
        };
        cmd.validate()?;
        Ok(cmd)
    }

    /// Build a periodic Modbus request, checking its constraints.
    ///
    /// The interval is taken as a signed value so that negative input is
    /// reported instead of wrapping.
    pub fn modbus_periodic(
        port: ModbusPort,
        config_index: u8,
        interval_secs: i64,
        frame: impl Into<Vec<u8>>,
    ) -> Result<Self, ValidationError> {
        let out_of_range = ValidationError::IntervalOutOfRange {
            interval: interval_secs,
            min: 0,
            max: i64::from(MAX_INTERVAL_SECS),
        };
        if !(0..=i64::from(MAX_INTERVAL_SECS)).contains(&interval_secs) {
            return Err(out_of_range);
        }
        let interval_secs = u32::try_from(interval_secs).map_err(|_| out_of_range)?;

        let cmd = Command::ModbusPeriodic {
            port,
            config_index,
            interval_secs,
            frame: frame.into(),
        };
        cmd.validate()?;
        Ok(cmd)
    }

    /// Get the command code for this command.
    pub fn code(&self) -> CommandCode {
        match self {
            Command::DeviceReset => CommandCode::DeviceReset,
            Command::Diagnostics => CommandCode::Diagnostics,
            Command::FirmwareUpdateNotify => CommandCode::FirmwareUpdateNotify,
            Command::SetDeviceMode { .. } => CommandCode::DeviceMode,
            Command::SetAntennaConfig { .. } => CommandCode::AntennaConfig,
            Command::SetBaudrate { .. } => CommandCode::BaudrateConfig,
            Command::ModbusOneShot { .. } => CommandCode::ModbusOneShot,
            Command::ModbusPeriodic { .. } => CommandCode::ModbusPeriodic,
        }
    }

    /// Check the per-command constraints.
    ///
    /// Every codec calls this before producing bytes and after parsing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Command::DeviceReset
            | Command::Diagnostics
            | Command::FirmwareUpdateNotify
            | Command::SetDeviceMode { .. }
            | Command::SetAntennaConfig { .. }
            | Command::SetBaudrate { .. } => Ok(()),

            Command::ModbusOneShot { port, frame } => {
                check_port(self.code(), *port)?;
                check_embedded_frame(frame)
            }

            Command::ModbusPeriodic {
                port,
                config_index,
                interval_secs,
                frame,
            } => {
                check_port(self.code(), *port)?;
                if !(MIN_CONFIG_INDEX..=MAX_CONFIG_INDEX).contains(config_index) {
                    return Err(ValidationError::ConfigIndexOutOfRange {
                        index: *config_index,
                        min: MIN_CONFIG_INDEX,
                        max: MAX_CONFIG_INDEX,
                    });
                }
                if *interval_secs > MAX_INTERVAL_SECS {
                    return Err(ValidationError::IntervalOutOfRange {
                        interval: i64::from(*interval_secs),
                        min: 0,
                        max: i64::from(MAX_INTERVAL_SECS),
                    });
                }
                check_embedded_frame(frame)
            }
        }
    }

    /// The embedded Modbus frame, for the Modbus commands.
    pub fn modbus_frame(&self) -> Option<&[u8]> {
        match self {
            Command::ModbusOneShot { frame, .. } | Command::ModbusPeriodic { frame, .. } => {
                Some(frame)
            }
            _ => None,
        }
    }

    /// Encode the length-prefixed payload (without envelope).
    ///
    /// Callers are expected to have run [`Command::validate`].
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Command::DeviceReset | Command::Diagnostics | Command::FirmwareUpdateNotify => {}

            Command::SetDeviceMode { mode } => {
                buf.put_u8(mode.as_u8());
            }

            Command::SetAntennaConfig { antenna } => {
                buf.put_u8(antenna.as_u8());
            }

            Command::SetBaudrate { port, baudrate } => {
                buf.put_u8(port.as_u8());
                buf.put_u8(baudrate.as_u8());
            }

            Command::ModbusOneShot { port, frame } => {
                buf.reserve(1 + frame.len());
                buf.put_u8(port.as_u8());
                buf.put_slice(frame);
            }

            Command::ModbusPeriodic {
                port,
                config_index,
                interval_secs,
                frame,
            } => {
                buf.reserve(2 + INTERVAL_FIELD_SIZE + frame.len());
                buf.put_u8(port.as_u8());
                buf.put_u8(*config_index);
                buf.put_uint(u64::from(*interval_secs), INTERVAL_FIELD_SIZE);
                buf.put_slice(frame);
            }
        }

        buf
    }

    /// Parse a length-prefixed payload for the given command code.
    pub fn decode_payload(code: CommandCode, payload: &[u8]) -> Result<Self, DecodeError> {
        let cmd = match code {
            CommandCode::DeviceReset => {
                let [] = fixed::<0>(code, payload)?;
                Command::DeviceReset
            }

            CommandCode::Diagnostics => {
                let [] = fixed::<0>(code, payload)?;
                Command::Diagnostics
            }

            CommandCode::FirmwareUpdateNotify => {
                let [] = fixed::<0>(code, payload)?;
                Command::FirmwareUpdateNotify
            }

            CommandCode::DeviceMode => {
                let [mode] = fixed::<1>(code, payload)?;
                Command::SetDeviceMode {
                    mode: DeviceMode::from_u8(mode)?,
                }
            }

            CommandCode::AntennaConfig => {
                let [antenna] = fixed::<1>(code, payload)?;
                Command::SetAntennaConfig {
                    antenna: AntennaConfig::from_u8(antenna)?,
                }
            }

            CommandCode::BaudrateConfig => {
                let [port, baudrate] = fixed::<2>(code, payload)?;
                Command::SetBaudrate {
                    port: ModbusPort::from_u8(port)?,
                    baudrate: BaudRate::from_u8(baudrate)?,
                }
            }

            CommandCode::ModbusOneShot => {
                let mut buf = at_least(payload, 1)?;
                let port = ModbusPort::from_u8(buf.get_u8())?;
                Command::ModbusOneShot {
                    port,
                    frame: buf.to_vec(),
                }
            }

            CommandCode::ModbusPeriodic => {
                let mut buf = at_least(payload, 2 + INTERVAL_FIELD_SIZE)?;
                let port = ModbusPort::from_u8(buf.get_u8())?;
                let config_index = buf.get_u8();
                let interval_secs = buf.get_uint(INTERVAL_FIELD_SIZE) as u32;
                Command::ModbusPeriodic {
                    port,
                    config_index,
                    interval_secs,
                    frame: buf.to_vec(),
                }
            }
        };

        cmd.validate()?;
        Ok(cmd)
    }

    /// Convert to the structured command payload.
    pub fn to_cmd_frame(&self) -> CmdFrame {
        let kind = match self {
            Command::DeviceReset | Command::Diagnostics | Command::FirmwareUpdateNotify => {
                Kind::Empty(schema::EmptyFrame {})
            }
            Command::SetDeviceMode { mode } => Kind::DeviceMode(schema::DeviceModeFrame {
                device_mode: *mode as i32,
            }),
            Command::SetAntennaConfig { antenna } => {
                Kind::AntennaSettings(schema::AntennaSettingsFrame {
                    antenna_settings: *antenna as i32,
                })
            }
            Command::SetBaudrate { port, baudrate } => {
                Kind::BaudrateSettings(schema::BaudrateSettingsFrame {
                    modbus_port: *port as i32,
                    modbus_baud: *baudrate as i32,
                })
            }
            Command::ModbusOneShot { port, frame } => {
                Kind::ModbusOneShot(schema::ModbusOneShotFrame {
                    modbus_port: *port as i32,
                    modbus_frame: frame.clone(),
                })
            }
            Command::ModbusPeriodic {
                port,
                config_index,
                interval_secs,
                frame,
            } => Kind::ModbusPeriodical(schema::ModbusPeriodicalFrame {
                modbus_port: *port as i32,
                configuration_index: u32::from(*config_index),
                interval: *interval_secs,
                modbus_frame: frame.clone(),
            }),
        };

        CmdFrame { kind: Some(kind) }
    }

    /// Rebuild a command from a structured payload and its command code.
    pub fn from_cmd_frame(code: CommandCode, frame: CmdFrame) -> Result<Self, DecodeError> {
        let kind = frame.kind.ok_or(DecodeError::MissingField("payload_cmd_frame"))?;

        let cmd = match kind {
            Kind::Empty(_) => match code {
                CommandCode::DeviceReset => Command::DeviceReset,
                CommandCode::Diagnostics => Command::Diagnostics,
                CommandCode::FirmwareUpdateNotify => Command::FirmwareUpdateNotify,
                CommandCode::DeviceMode
                | CommandCode::AntennaConfig
                | CommandCode::BaudrateConfig
                | CommandCode::ModbusOneShot
                | CommandCode::ModbusPeriodic => {
                    return Err(DecodeError::PayloadMismatch { command: code })
                }
            },

            Kind::DeviceMode(f) => Command::SetDeviceMode {
                mode: selector("device_mode", f.device_mode)?,
            },

            Kind::AntennaSettings(f) => Command::SetAntennaConfig {
                antenna: selector("antenna_settings", f.antenna_settings)?,
            },

            Kind::BaudrateSettings(f) => Command::SetBaudrate {
                port: selector("modbus_port", f.modbus_port)?,
                baudrate: selector("modbus_baud", f.modbus_baud)?,
            },

            Kind::ModbusOneShot(f) => Command::ModbusOneShot {
                port: selector("modbus_port", f.modbus_port)?,
                frame: f.modbus_frame,
            },

            Kind::ModbusPeriodical(f) => Command::ModbusPeriodic {
                port: selector("modbus_port", f.modbus_port)?,
                config_index: u8::try_from(f.configuration_index).map_err(|_| {
                    DecodeError::InvalidField {
                        field: "configuration_index",
                        value: i64::from(f.configuration_index),
                    }
                })?,
                interval_secs: f.interval,
                frame: f.modbus_frame,
            },
        };

        if cmd.code() != code {
            return Err(DecodeError::PayloadMismatch { command: code });
        }

        cmd.validate()?;
        Ok(cmd)
    }
}

fn check_port(command: CommandCode, port: ModbusPort) -> Result<(), ValidationError> {
    match port {
        ModbusPort::NoEffect => Err(ValidationError::NoEffectPort { command }),
        ModbusPort::One | ModbusPort::Two => Ok(()),
    }
}

fn check_embedded_frame(frame: &[u8]) -> Result<(), ValidationError> {
    if frame.len() > MAX_MODBUS_FRAME_SIZE {
        return Err(ValidationError::EmbeddedFrameTooLarge {
            size: frame.len(),
            max: MAX_MODBUS_FRAME_SIZE,
        });
    }
    Ok(())
}

/// Take a payload that must be exactly `N` bytes long.
fn fixed<const N: usize>(command: CommandCode, payload: &[u8]) -> Result<[u8; N], DecodeError> {
    if payload.len() < N {
        return Err(DecodeError::Truncated {
            expected: N,
            actual: payload.len(),
        });
    }
    payload
        .try_into()
        .map_err(|_| DecodeError::UnexpectedPayload {
            command,
            len: payload.len(),
        })
}

fn at_least(payload: &[u8], min: usize) -> Result<&[u8], DecodeError> {
    if payload.len() < min {
        return Err(DecodeError::Truncated {
            expected: min,
            actual: payload.len(),
        });
    }
    Ok(payload)
}
