use std::fs;

use gemwire_record::Record;
use tracing::info;

use crate::cmd::{DeviceArgs, SettingsCommand, SettingsSetArgs};
use crate::exit::{device_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_record, print_status, OutputFormat};

pub fn run(command: SettingsCommand, args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        SettingsCommand::Get => get(args, format),
        SettingsCommand::Set(set_args) => set(set_args, args, format),
        SettingsCommand::Reset => reset(args, format),
    }
}

fn get(args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let mut device = args.open()?;
    let settings = device
        .read_settings()
        .map_err(|err| device_error("settings read failed", err))?;
    print_record(&settings, format);
    Ok(SUCCESS)
}

fn set(set_args: SettingsSetArgs, args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let changes = read_changes(&set_args)?;

    if set_args.dry_run {
        // Merge against defaults so the file can be checked without hardware.
        let mut settings = Record::new(args.settings_layout()?);
        apply_changes(&mut settings, &changes)?;
        print_record(&settings, format);
        return Ok(SUCCESS);
    }

    let mut device = args.open()?;
    let mut settings = device
        .read_settings()
        .map_err(|err| device_error("settings read failed", err))?;
    apply_changes(&mut settings, &changes)?;
    device
        .write_settings(&settings)
        .map_err(|err| device_error("settings write failed", err))?;
    info!(file = %set_args.file.display(), "settings written");

    print_record(&settings, format);
    Ok(SUCCESS)
}

fn reset(args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let mut device = args.open()?;
    device
        .reset_settings()
        .map_err(|err| device_error("settings reset failed", err))?;
    print_status("settings reset to factory defaults", format);
    Ok(SUCCESS)
}

fn read_changes(set_args: &SettingsSetArgs) -> CliResult<serde_json::Value> {
    let path = &set_args.file;
    let text = fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("{} is not valid JSON: {err}", path.display()),
        )
    })
}

fn apply_changes(settings: &mut Record, changes: &serde_json::Value) -> CliResult<()> {
    settings
        .update_from_json(changes)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid settings: {err}")))
}
