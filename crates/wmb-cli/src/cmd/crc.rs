use wmb_protocol::checksum;

use crate::cmd::{hex_arg, Context, CrcArgs};
use crate::exit::{protocol_error, CliResult, SUCCESS};
use crate::output::render_crc;

pub fn run(args: CrcArgs, ctx: &Context) -> CliResult<i32> {
    let data = hex_arg(&args.hex)?;
    let body = if args.verify {
        checksum::verify(&data).map_err(|err| protocol_error("verification failed", err))?
    } else {
        &data[..]
    };

    println!("{}", render_crc(body, checksum::compute(body), ctx.format)?);
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;
    use crate::output::OutputFormat;
    use wmb_protocol::Framing;

    const CTX: Context = Context {
        framing: Framing::Structured,
        format: OutputFormat::Text,
    };

    fn args(hex: &str, verify: bool) -> CrcArgs {
        CrcArgs {
            hex: vec![hex.to_string()],
            verify,
        }
    }

    #[test]
    fn test_crc_plain() {
        assert_eq!(run(args("47 01 01 00 00", false), &CTX).unwrap(), SUCCESS);
    }

    #[test]
    fn test_crc_verify() {
        assert_eq!(run(args("47 01 01 00 00 d3 7c", true), &CTX).unwrap(), SUCCESS);

        let err = run(args("47 01 01 00 00 57 43", true), &CTX).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);

        let err = run(args("47", true), &CTX).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
