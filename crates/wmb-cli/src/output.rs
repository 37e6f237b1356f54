use clap::ValueEnum;
use serde::Serialize;
use wmb_protocol::{hex_string, Command, Framing, Message};

use crate::exit::{CliError, CliResult, INTERNAL};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON document.
    Json,
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    framing: Framing,
    command: &'a Command,
    length: usize,
    frame: String,
}

#[derive(Serialize)]
struct DecodedOutput<'a> {
    framing: Framing,
    length: usize,
    message: &'a Message,
}

#[derive(Serialize)]
struct CrcOutput {
    length: usize,
    crc: String,
    framed: String,
}

fn to_json<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(INTERNAL, format!("failed serializing output: {err}")))
}

pub fn render_encoded(
    framing: Framing,
    command: &Command,
    frame: &[u8],
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(hex_string(frame)),
        OutputFormat::Json => to_json(&EncodedOutput {
            framing,
            command,
            length: frame.len(),
            frame: hex_string(frame),
        }),
    }
}

pub fn render_decoded(
    framing: Framing,
    frame: &[u8],
    message: &Message,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Text => {
            let mut lines = vec![
                format!("framing: {framing}"),
                format!("length: {}", frame.len()),
            ];
            match message {
                Message::Command(cmd) => {
                    lines.push("direction: command".to_string());
                    lines.push(format!("command: {}", cmd.code().name()));
                    lines.push(format!("content: {cmd:?}"));
                }
                Message::Answer { command, answer } => {
                    lines.push("direction: answer".to_string());
                    lines.push(format!("command: {}", command.name()));
                    lines.push(format!("success: {}", answer.is_success()));
                    lines.push(format!("content: {answer:?}"));
                }
            }
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => to_json(&DecodedOutput {
            framing,
            length: frame.len(),
            message,
        }),
    }
}

pub fn render_crc(data: &[u8], crc: u16, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(format!("0x{crc:04X}")),
        OutputFormat::Json => {
            let mut framed = data.to_vec();
            framed.extend_from_slice(&crc.to_be_bytes());
            to_json(&CrcOutput {
                length: data.len(),
                crc: format!("0x{crc:04X}"),
                framed: hex_string(&framed),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wmb_protocol::{AckStatus, Answer, CommandCode};

    #[test]
    fn test_encoded_text_is_hex() {
        let frame = [0x47, 0x01, 0x01, 0x00, 0x00, 0xD3, 0x7C];
        assert_eq!(
            render_encoded(
                Framing::LengthPrefixed,
                &Command::DeviceReset,
                &frame,
                OutputFormat::Text
            )
            .unwrap(),
            "47 01 01 00 00 d3 7c"
        );
    }

    #[test]
    fn test_encoded_json() {
        let frame = [0x47, 0x01, 0x01, 0x00, 0x00, 0xD3, 0x7C];
        let out = render_encoded(
            Framing::LengthPrefixed,
            &Command::DeviceReset,
            &frame,
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["framing"], "length-prefixed");
        assert_eq!(value["command"]["command"], "device_reset");
        assert_eq!(value["length"], 7);
        assert_eq!(value["frame"], "47 01 01 00 00 d3 7c");
    }

    #[test]
    fn test_decoded_text() {
        let message = Message::Answer {
            command: CommandCode::DeviceReset,
            answer: Answer::Ack(AckStatus::Busy),
        };
        let out = render_decoded(Framing::Structured, &[0; 14], &message, OutputFormat::Text)
            .unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "framing: structured");
        assert_eq!(lines[1], "length: 14");
        assert_eq!(lines[2], "direction: answer");
        assert_eq!(lines[3], "command: device_reset");
        assert_eq!(lines[4], "success: false");
    }

    #[test]
    fn test_crc_output() {
        assert_eq!(
            render_crc(b"123456789", 0x9ECF, OutputFormat::Text).unwrap(),
            "0x9ECF"
        );

        let out = render_crc(&[0x47, 0x01], 0x9224, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["crc"], "0x9224");
        assert_eq!(value["framed"], "47 01 92 24");
    }

    #[test]
    fn test_serialization_failure_is_internal() {
        // JSON object keys must be strings.
        let value = std::collections::HashMap::from([((1u8, 2u8), 3u8)]);
        let err = to_json(&value).unwrap_err();
        assert_eq!(err.code, INTERNAL);
        assert!(err.message.starts_with("failed serializing output"));
    }
}
