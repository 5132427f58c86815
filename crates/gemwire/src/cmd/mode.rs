use crate::cmd::{DeviceArgs, Mode, ModeArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_status, OutputFormat};

pub fn run(args: ModeArgs, device_args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let mut device = device_args.open()?;
    match args.mode {
        Mode::Calibration => {
            device
                .enter_calibration_mode()
                .map_err(|err| device_error("enter calibration failed", err))?;
            print_status("calibration mode", format);
        }
        Mode::Normal => {
            device
                .exit_calibration_mode()
                .map_err(|err| device_error("exit calibration failed", err))?;
            print_status("normal mode", format);
        }
    }
    Ok(SUCCESS)
}
