mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;
use wmb_protocol::Framing;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "wmbc", version, about = "Encode and decode WMB device frames")]
struct Cli {
    /// Framing scheme: `structured` or `length-prefixed`.
    #[arg(long, value_name = "FRAMING", global = true)]
    framing: Option<Framing>,

    /// Link configuration (YAML); its framing is used unless --framing is given.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    format: OutputFormat,

    /// Minimum log level (stderr). Defaults to $WM_DEBUG_LEVEL, then info.
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let result = Context::resolve(cli.framing, cli.config.as_deref(), cli.format)
        .and_then(|ctx| cmd::run(cli.command, &ctx));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::EncodeCommand;

    #[test]
    fn parses_encode_reset() {
        let cli =
            Cli::try_parse_from(["wmbc", "encode", "reset"]).expect("encode args should parse");
        assert!(matches!(
            cli.command,
            Command::Encode(ref args) if matches!(args.command, EncodeCommand::Reset)
        ));
        assert_eq!(cli.framing, None);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wmbc",
            "decode",
            "47 01 01 00 00 d3 7c",
            "--framing",
            "length-prefixed",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("decode args should parse");

        assert_eq!(cli.framing, Some(Framing::LengthPrefixed));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert!(matches!(cli.command, Command::Decode(_)));
    }

    #[test]
    fn parses_periodic_with_negative_interval() {
        let cli = Cli::try_parse_from([
            "wmbc",
            "encode",
            "periodic",
            "--port",
            "1",
            "--index",
            "3",
            "--interval",
            "-1",
            "--frame",
            "0103",
        ])
        .expect("periodic args should parse");

        let Command::Encode(args) = cli.command else {
            panic!("expected encode");
        };
        assert!(matches!(
            args.command,
            EncodeCommand::Periodic { interval: -1, index: 3, port: 1, .. }
        ));
    }

    #[test]
    fn rejects_conflicting_frame_sources() {
        let err = Cli::try_parse_from([
            "wmbc",
            "encode",
            "one-shot",
            "--port",
            "1",
            "--frame",
            "0103",
            "--file",
            "frame.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_missing_frame() {
        let err = Cli::try_parse_from(["wmbc", "encode", "one-shot", "--port", "1"])
            .expect_err("a frame source is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_port_out_of_range() {
        let err = Cli::try_parse_from(["wmbc", "encode", "baudrate", "--port", "3", "9600"])
            .expect_err("port 3 does not exist");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_unknown_framing() {
        let err = Cli::try_parse_from(["wmbc", "--framing", "xml", "crc", "00"])
            .expect_err("unknown framing");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
