mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, DeviceArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "gemwire", version, about = "Winterbloom Gemini SysEx CLI")]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.device, format);

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
    use std::path::PathBuf;

    use super::*;
    use crate::cmd::{Mode, SettingsCommand, TeethCommand};

    #[test]
    fn parses_settings_set_with_global_device() {
        let cli = Cli::try_parse_from([
            "gemwire",
            "settings",
            "set",
            "--file",
            "changes.json",
            "--device",
            "/dev/snd/midiC1D0",
            "--profile",
            "legacy",
        ])
        .expect("settings args should parse");

        assert_eq!(cli.device.device, Some(PathBuf::from("/dev/snd/midiC1D0")));
        assert_eq!(cli.device.profile, "legacy");
        assert!(matches!(
            cli.command,
            Command::Settings(SettingsCommand::Set(ref args)) if args.file == PathBuf::from("changes.json")
        ));
    }

    #[test]
    fn parses_mode_values() {
        let cli = Cli::try_parse_from(["gemwire", "mode", "calibration"])
            .expect("mode args should parse");
        assert!(matches!(cli.command, Command::Mode(ref args) if args.mode == Mode::Calibration));

        let err = Cli::try_parse_from(["gemwire", "mode", "turbo"])
            .expect_err("unknown mode should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parses_teeth_and_defaults() {
        let cli = Cli::try_parse_from(["gemwire", "teeth", "decode", "1001020304"])
            .expect("teeth args should parse");
        assert!(matches!(cli.command, Command::Teeth(TeethCommand::Decode(_))));
        assert_eq!(cli.device.settings_layout, "gem_settings");
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn monitor_count_must_be_a_number() {
        let err = Cli::try_parse_from(["gemwire", "monitor", "--count", "many"])
            .expect_err("non-numeric count should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
