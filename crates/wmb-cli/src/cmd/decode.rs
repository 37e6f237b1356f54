use tracing::debug;

use crate::cmd::{hex_arg, Context, DecodeArgs};
use crate::exit::{protocol_error, CliResult, SUCCESS};
use crate::output::render_decoded;

pub fn run(args: DecodeArgs, ctx: &Context) -> CliResult<i32> {
    let frame = hex_arg(&args.hex)?;
    debug!(framing = %ctx.framing, len = frame.len(), "decoding frame");

    let message = ctx
        .framing
        .codec()
        .decode_message(&frame)
        .map_err(|err| protocol_error("decode failed", err))?;

    println!("{}", render_decoded(ctx.framing, &frame, &message, ctx.format)?);
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;
    use crate::output::OutputFormat;
    use wmb_protocol::Framing;

    fn args(hex: &str) -> DecodeArgs {
        DecodeArgs {
            hex: vec![hex.to_string()],
        }
    }

    #[test]
    fn test_decode_valid_frames() {
        let ctx = Context {
            framing: Framing::Structured,
            format: OutputFormat::Json,
        };
        assert_eq!(
            run(args("08 47 10 01 18 01 2a 04 12 02 0a 00 8f 35"), &ctx).unwrap(),
            SUCCESS
        );

        let ctx = Context {
            framing: Framing::LengthPrefixed,
            format: OutputFormat::Text,
        };
        assert_eq!(run(args("47 01 01 00 00 d3 7c"), &ctx).unwrap(), SUCCESS);
    }

    #[test]
    fn test_decode_rejects_tampered_frame() {
        let ctx = Context {
            framing: Framing::LengthPrefixed,
            format: OutputFormat::Text,
        };
        let err = run(args("47 01 01 00 00 57 43"), &ctx).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("checksum mismatch"));
    }

    #[test]
    fn test_decode_wrong_framing() {
        let ctx = Context {
            framing: Framing::Structured,
            format: OutputFormat::Text,
        };
        let err = run(args("47 01 01 00 00 d3 7c"), &ctx).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
