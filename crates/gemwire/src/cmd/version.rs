use serde::Serialize;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_properties, OutputFormat};

#[derive(Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
    target: &'static str,
    target_os: &'static str,
    target_arch: &'static str,
    profiles: [&'static str; 2],
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.extended {
        println!("gemwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let out = VersionOutput {
        name: "gemwire",
        version: env!("CARGO_PKG_VERSION"),
        target: option_env!("GEMWIRE_BUILD_TARGET").unwrap_or("unknown"),
        target_os: std::env::consts::OS,
        target_arch: std::env::consts::ARCH,
        profiles: gemwire_device::FirmwareProfile::BUILTIN_NAMES,
    };
    let rows = [
        ("name", out.name.to_string()),
        ("version", out.version.to_string()),
        ("target", out.target.to_string()),
        ("target_os", out.target_os.to_string()),
        ("target_arch", out.target_arch.to_string()),
        ("profiles", out.profiles.join(", ")),
    ];
    print_properties("gemwire", &rows, &out, format);

    Ok(SUCCESS)
}
