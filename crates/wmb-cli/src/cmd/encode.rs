use std::fs;

use tracing::debug;
use wmb_protocol::{BaudRate, Command, ModbusPort};

use crate::cmd::{hex_arg, Context, EncodeArgs, EncodeCommand, FrameInput};
use crate::exit::{io_error, protocol_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::render_encoded;

pub fn run(args: EncodeArgs, ctx: &Context) -> CliResult<i32> {
    let command = build(args.command)?;
    let frame = ctx
        .framing
        .codec()
        .encode_command(&command)
        .map_err(|err| protocol_error("encode failed", err))?;

    debug!(
        command = command.code().name(),
        framing = %ctx.framing,
        len = frame.len(),
        "encoded command"
    );
    println!("{}", render_encoded(ctx.framing, &command, &frame, ctx.format)?);
    Ok(SUCCESS)
}

/// Turn parsed arguments into a command. Range checks that the codec also
/// performs are left to it.
pub fn build(command: EncodeCommand) -> CliResult<Command> {
    let command = match command {
        EncodeCommand::Reset => Command::DeviceReset,
        EncodeCommand::Diagnostics => Command::Diagnostics,
        EncodeCommand::FirmwareUpdate => Command::FirmwareUpdateNotify,
        EncodeCommand::DeviceMode { mode } => Command::SetDeviceMode { mode: mode.into() },
        EncodeCommand::Antenna { antenna } => Command::SetAntennaConfig {
            antenna: antenna.into(),
        },
        EncodeCommand::Baudrate { port, bps } => Command::SetBaudrate {
            port: port_arg(port)?,
            baudrate: baud_arg(bps)?,
        },
        EncodeCommand::OneShot { port, frame } => Command::ModbusOneShot {
            port: port_arg(port)?,
            frame: frame_arg(&frame)?,
        },
        EncodeCommand::Periodic {
            port,
            index,
            interval,
            frame,
        } => Command::modbus_periodic(port_arg(port)?, index, interval, frame_arg(&frame)?)
            .map_err(|err| protocol_error("invalid periodic request", err.into()))?,
    };
    Ok(command)
}

fn port_arg(port: u8) -> CliResult<ModbusPort> {
    ModbusPort::from_u8(port).map_err(|err| CliError::new(USAGE, format!("invalid port: {err}")))
}

fn baud_arg(bps: u32) -> CliResult<BaudRate> {
    BaudRate::from_bits_per_second(bps).ok_or_else(|| {
        let supported: Vec<String> = BaudRate::ALL
            .iter()
            .map(|rate| rate.bits_per_second().to_string())
            .collect();
        CliError::new(
            USAGE,
            format!(
                "unsupported baud rate {bps} (supported: {})",
                supported.join(", ")
            ),
        )
    })
}

fn frame_arg(input: &FrameInput) -> CliResult<Vec<u8>> {
    match (&input.frame, &input.file) {
        (Some(text), _) => hex_arg(std::slice::from_ref(text)),
        (None, Some(path)) => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err)),
        (None, None) => Err(CliError::new(USAGE, "an embedded frame is required")),
    }
}
