use std::path::{Path, PathBuf};

use clap::{Args, Subcommand, ValueEnum};
use tracing::debug;
use wmb_link::LinkConfig;
use wmb_protocol::{AntennaConfig, DeviceMode, Framing};

use crate::exit::{config_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod crc;
pub mod decode;
pub mod encode;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a command frame and print it.
    Encode(EncodeArgs),
    /// Verify and decode a frame.
    Decode(DecodeArgs),
    /// Compute the CRC-16 of some bytes.
    Crc(CrcArgs),
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub framing: Framing,
    pub format: OutputFormat,
}

impl Context {
    /// An explicit `--framing` wins over the configuration file.
    pub fn resolve(
        framing: Option<Framing>,
        config: Option<&Path>,
        format: OutputFormat,
    ) -> CliResult<Self> {
        let from_config = match config {
            Some(path) => {
                let config = LinkConfig::from_file(path)
                    .map_err(|err| config_error("failed loading configuration", err))?;
                debug!(path = %path.display(), framing = %config.framing, "loaded configuration");
                Some(config.framing)
            }
            None => None,
        };
        Ok(Self {
            framing: framing.or(from_config).unwrap_or_default(),
            format,
        })
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, ctx),
        Command::Decode(args) => decode::run(args, ctx),
        Command::Crc(args) => crc::run(args, ctx),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub command: EncodeCommand,
}

#[derive(Subcommand, Debug)]
pub enum EncodeCommand {
    /// Reboot the device.
    Reset,
    /// Request a diagnostics snapshot.
    Diagnostics,
    /// Announce an incoming firmware update.
    FirmwareUpdate,
    /// Switch between Modbus master and sniffer.
    DeviceMode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Select the antenna.
    Antenna {
        #[arg(value_enum)]
        antenna: AntennaArg,
    },
    /// Set the serial speed of a Modbus port.
    Baudrate {
        /// Port number (0 leaves the port unchanged).
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=2))]
        port: u8,
        /// Speed in bits per second.
        bps: u32,
    },
    /// Forward one Modbus request.
    OneShot {
        /// Port number.
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=2))]
        port: u8,
        #[command(flatten)]
        frame: FrameInput,
    },
    /// Install a periodic Modbus request.
    Periodic {
        /// Port number.
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=2))]
        port: u8,
        /// Configuration slot, 1 to 64.
        #[arg(long)]
        index: u8,
        /// Repeat interval in seconds.
        #[arg(long, allow_negative_numbers = true)]
        interval: i64,
        #[command(flatten)]
        frame: FrameInput,
    },
}

/// Where the embedded Modbus frame comes from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct FrameInput {
    /// Frame as hex text.
    #[arg(long)]
    pub frame: Option<String>,
    /// Read the raw frame from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Master,
    Sniffer,
}

impl From<ModeArg> for DeviceMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Master => DeviceMode::ModbusMaster,
            ModeArg::Sniffer => DeviceMode::ModbusSniffer,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AntennaArg {
    Internal,
    External,
}

impl From<AntennaArg> for AntennaConfig {
    fn from(arg: AntennaArg) -> Self {
        match arg {
            AntennaArg::Internal => AntennaConfig::Internal,
            AntennaArg::External => AntennaConfig::External,
        }
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame as hex; may be split across several arguments.
    #[arg(required = true, num_args = 1..)]
    pub hex: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CrcArgs {
    /// Bytes as hex; may be split across several arguments.
    #[arg(required = true, num_args = 1..)]
    pub hex: Vec<String>,
    /// Treat the last two bytes as a trailer and check them.
    #[arg(long)]
    pub verify: bool,
}

/// Join hex arguments and parse them.
pub(crate) fn hex_arg(parts: &[String]) -> CliResult<Vec<u8>> {
    let text = parts.join(" ");
    wmb_protocol::parse_hex(&text)
        .map_err(|err| CliError::new(USAGE, format!("invalid hex `{text}`: {err}")))
}
