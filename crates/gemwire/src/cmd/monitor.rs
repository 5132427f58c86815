use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::cmd::{DeviceArgs, MonitorArgs};
use crate::exit::{device_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_record_line, OutputFormat};

pub fn run(args: MonitorArgs, device_args: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let mut device = device_args.open()?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    // Dropping the session sends the disable request, on every exit path.
    let mut session = device
        .monitor()
        .map_err(|err| device_error("monitor enable failed", err))?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
        let update = match session.next() {
            Some(update) => update.map_err(|err| device_error("monitor read failed", err))?,
            None => break,
        };
        print_record_line(&update, format);
        printed = printed.saturating_add(1);
    }

    info!(updates = printed, "monitor stopped");
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
