use serde::Serialize;

use crate::cmd::DeviceArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_properties, OutputFormat};

#[derive(Serialize)]
struct InfoOutput {
    firmware_version: String,
    serial_number: String,
    hardware_revision: Option<u8>,
    profile: String,
}

pub fn run(args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let mut device = args.open()?;

    let firmware_version = device
        .firmware_version()
        .map_err(|err| device_error("hello failed", err))?;
    let serial = device
        .serial_number()
        .map_err(|err| device_error("serial number request failed", err))?;

    let out = InfoOutput {
        firmware_version,
        serial_number: serial.serial,
        hardware_revision: serial.hardware_revision,
        profile: device.profile().name().to_string(),
    };
    let rows = [
        ("Firmware", out.firmware_version.clone()),
        ("Serial number", out.serial_number.clone()),
        (
            "Hardware revision",
            out.hardware_revision
                .map_or_else(|| "unavailable".to_string(), |rev| rev.to_string()),
        ),
        ("Profile", out.profile.clone()),
    ];
    print_properties("Device Info", &rows, &out, format);

    Ok(SUCCESS)
}
