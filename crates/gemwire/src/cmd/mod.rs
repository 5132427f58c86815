use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};
use gemwire_device::{Device, FirmwareProfile};
use gemwire_record::{LayoutRegistry, RecordLayout};
use gemwire_transport::RawMidiPort;
use tracing::debug;

use crate::exit::{device_error, transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod info;
pub mod layout;
pub mod mode;
pub mod monitor;
pub mod profile;
pub mod reset;
pub mod settings;
pub mod teeth;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show version information.
    Version(VersionArgs),
    /// Print firmware version, serial number and hardware revision.
    Info,
    /// Read, write or reset the settings record.
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Stream monitor updates until interrupted.
    Monitor(MonitorArgs),
    /// Switch between calibration and normal operation.
    Mode(ModeArgs),
    /// Restart the device.
    Reset(ResetArgs),
    /// Encode or decode Teeth data offline.
    #[command(subcommand)]
    Teeth(TeethCommand),
    /// Inspect the active firmware profile.
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Inspect record layouts.
    #[command(subcommand)]
    Layout(LayoutCommand),
}

/// Options shared by every subcommand that talks to a device.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Raw MIDI device node (e.g. /dev/snd/midiC1D0).
    #[arg(long, env = "GEMWIRE_DEVICE", value_name = "PATH", global = true)]
    pub device: Option<PathBuf>,

    /// Firmware profile: a built-in name (legacy, current) or a JSON file.
    #[arg(
        long,
        env = "GEMWIRE_PROFILE",
        value_name = "PROFILE",
        default_value = "current",
        global = true
    )]
    pub profile: String,

    /// Directory of additional *.layout.json record layouts.
    #[arg(long, env = "GEMWIRE_LAYOUT_DIR", value_name = "DIR", global = true)]
    pub layout_dir: Option<PathBuf>,

    /// Layout of the settings record.
    #[arg(long, value_name = "NAME", default_value = "gem_settings", global = true)]
    pub settings_layout: String,
}

impl DeviceArgs {
    pub fn load_profile(&self) -> CliResult<FirmwareProfile> {
        FirmwareProfile::load(&self.profile).map_err(|err| device_error("profile load failed", err))
    }

    pub fn load_layouts(&self) -> CliResult<LayoutRegistry> {
        let registry = match &self.layout_dir {
            Some(dir) => LayoutRegistry::from_directory(dir),
            None => Ok(LayoutRegistry::with_builtins()),
        };
        registry.map_err(|err| CliError::new(USAGE, format!("layout load failed: {err}")))
    }

    pub fn settings_layout(&self) -> CliResult<Arc<RecordLayout>> {
        self.load_layouts()?
            .get(&self.settings_layout)
            .map_err(|err| CliError::new(USAGE, err.to_string()))
    }

    /// Open the configured device node with the configured profile.
    pub fn open(&self) -> CliResult<Device<RawMidiPort>> {
        let Some(path) = &self.device else {
            return Err(CliError::new(
                USAGE,
                "no device given (use --device or GEMWIRE_DEVICE)",
            ));
        };
        let profile = self.load_profile()?;
        let settings_layout = self.settings_layout()?;

        let port = RawMidiPort::open(path).map_err(|err| transport_error("open failed", err))?;
        debug!(device = %path.display(), profile = profile.name(), "device opened");
        Ok(Device::new(port, profile).with_settings_layout(settings_layout))
    }
}

pub fn run(command: Command, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Version(args) => version::run(args, format),
        Command::Info => info::run(device, format),
        Command::Settings(command) => settings::run(command, device, format),
        Command::Monitor(args) => monitor::run(args, device, format),
        Command::Mode(args) => mode::run(args, device, format),
        Command::Reset(args) => reset::run(args, device, format),
        Command::Teeth(command) => teeth::run(command, format),
        Command::Profile(command) => profile::run(command, device, format),
        Command::Layout(command) => layout::run(command, device, format),
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Read and print the settings record.
    Get,
    /// Read the settings, apply fields from a JSON file and write them back.
    Set(SettingsSetArgs),
    /// Restore factory defaults on the device.
    Reset,
}

#[derive(Args, Debug)]
pub struct SettingsSetArgs {
    /// JSON object with the fields to change. Omitted fields keep their value.
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,
    /// Print the merged record without writing it.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Exit after N updates.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Calibration,
    Normal,
}

#[derive(Args, Debug)]
pub struct ModeArgs {
    pub mode: Mode,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Reboot into the UF2 bootloader instead of restarting the firmware.
    #[arg(long)]
    pub bootloader: bool,
}

#[derive(Subcommand, Debug)]
pub enum TeethCommand {
    /// Encode hex bytes.
    Encode(HexArgs),
    /// Decode hex bytes.
    Decode(HexArgs),
}

#[derive(Args, Debug)]
pub struct HexArgs {
    /// Input bytes as hex, whitespace allowed.
    pub hex: String,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Print the active profile.
    Show,
}

#[derive(Subcommand, Debug)]
pub enum LayoutCommand {
    /// List known record layouts.
    List,
    /// Print one layout with field offsets.
    Show(LayoutShowArgs),
}

#[derive(Args, Debug)]
pub struct LayoutShowArgs {
    /// Layout name.
    pub name: String,
}
