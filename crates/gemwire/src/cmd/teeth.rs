use serde::Serialize;

use crate::cmd::TeethCommand;
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_properties, OutputFormat};

#[derive(Serialize)]
struct TeethOutput {
    input_len: usize,
    output_len: usize,
    output: String,
}

pub fn run(command: TeethCommand, format: OutputFormat) -> CliResult<i32> {
    let (input, output) = match command {
        TeethCommand::Encode(args) => {
            let input = parse_hex(&args.hex)?;
            let output = gemwire_teeth::encode(&input);
            (input, output)
        }
        TeethCommand::Decode(args) => {
            let input = parse_hex(&args.hex)?;
            let output = gemwire_teeth::decode(&input)
                .map_err(|err| CliError::new(DATA_INVALID, format!("decode failed: {err}")))?;
            (input, output)
        }
    };

    let out = TeethOutput {
        input_len: input.len(),
        output_len: output.len(),
        output: to_hex(&output),
    };
    match format {
        OutputFormat::Pretty => println!("{}", out.output),
        OutputFormat::Json | OutputFormat::Table => {
            let rows = [
                ("input bytes", out.input_len.to_string()),
                ("output bytes", out.output_len.to_string()),
                ("output", out.output.clone()),
            ];
            print_properties("teeth", &rows, &out, format);
        }
    }
    Ok(SUCCESS)
}

/// Parse hex digits, ignoring whitespace and an optional `0x` prefix.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input.split_whitespace().collect();
    let digits = digits.strip_prefix("0x").unwrap_or(&digits);
    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }

    (0..digits.len())
        .step_by(2)
        .map(|at| {
            let pair = digits
                .get(at..at + 2)
                .ok_or_else(|| CliError::new(USAGE, "hex input is not ASCII"))?;
            u8::from_str_radix(pair, 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex byte '{pair}'")))
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
