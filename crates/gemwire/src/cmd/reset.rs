use crate::cmd::{DeviceArgs, ResetArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_status, OutputFormat};

pub fn run(args: ResetArgs, device_args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let mut device = device_args.open()?;
    if args.bootloader {
        device
            .reset_into_bootloader()
            .map_err(|err| device_error("bootloader reset failed", err))?;
        print_status("rebooting into bootloader", format);
    } else {
        device
            .soft_reset()
            .map_err(|err| device_error("soft reset failed", err))?;
        print_status("restarting", format);
    }
    Ok(SUCCESS)
}
