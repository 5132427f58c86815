use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gemwire_device::{FirmwareProfile, SettingsTransfer};

use crate::cmd::{DeviceArgs, ProfileCommand};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

pub fn run(command: ProfileCommand, args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        ProfileCommand::Show => {
            let profile = args.load_profile()?;
            show(&profile, format)
        }
    }
}

fn show(profile: &FirmwareProfile, format: OutputFormat) -> CliResult<i32> {
    match format {
        OutputFormat::Json => print_json(profile),
        OutputFormat::Pretty => {
            let json = profile
                .to_json_pretty()
                .map_err(|err| device_error("profile encode failed", err))?;
            println!("{json}");
        }
        OutputFormat::Table => {
            println!(
                "profile {} (marker {:#04x}, command table {}, settings {})",
                profile.name(),
                profile.device_marker(),
                profile.commands().version(),
                transfer_label(profile.settings_transfer())
            );
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "CODE"]);
            for (command, code) in profile.commands().iter() {
                table.add_row(vec![command.name().to_string(), format!("{code:#04x}")]);
            }
            println!("{table}");
        }
    }
    Ok(SUCCESS)
}

fn transfer_label(transfer: SettingsTransfer) -> String {
    match transfer {
        SettingsTransfer::Chunked { chunk_size } => format!("chunked by {chunk_size}"),
        SettingsTransfer::ChunkedDecoded { chunk_size } => {
            format!("chunked by {chunk_size}, decoded per chunk")
        }
        SettingsTransfer::SingleShot => "single shot".to_string(),
    }
}
