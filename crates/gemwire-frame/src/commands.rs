use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

/// Symbolic device operations.
///
/// The byte each one maps to is not fixed: it comes from a [`CommandTable`]
/// matching the firmware on the other end of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Identify; the device answers with its build-info string.
    Hello,
    WriteAdcGain,
    WriteAdcOffset,
    ReadAdc,
    /// All four DAC outputs at once.
    SetDac,
    /// One DAC output with its reference selection.
    SetDacChannel,
    SetPeriod,
    /// Erase the stored settings back to firmware defaults.
    ResetSettings,
    ReadSettings,
    WriteSettings,
    WriteLutEntry,
    WriteLut,
    EraseLut,
    DisableAdcCorrection,
    EnableAdcCorrection,
    GetSerialNumber,
    /// Enable or disable the telemetry stream.
    Monitor,
    SoftReset,
    EnterCalibration,
    ResetIntoBootloader,
    SetFrequency,
    SetOsc8mFreq,
}

impl Command {
    /// Every known command, in declaration order.
    pub const ALL: [Command; 22] = [
        Command::Hello,
        Command::WriteAdcGain,
        Command::WriteAdcOffset,
        Command::ReadAdc,
        Command::SetDac,
        Command::SetDacChannel,
        Command::SetPeriod,
        Command::ResetSettings,
        Command::ReadSettings,
        Command::WriteSettings,
        Command::WriteLutEntry,
        Command::WriteLut,
        Command::EraseLut,
        Command::DisableAdcCorrection,
        Command::EnableAdcCorrection,
        Command::GetSerialNumber,
        Command::Monitor,
        Command::SoftReset,
        Command::EnterCalibration,
        Command::ResetIntoBootloader,
        Command::SetFrequency,
        Command::SetOsc8mFreq,
    ];

    /// The snake_case name used in command table files.
    pub fn name(self) -> &'static str {
        match self {
            Command::Hello => "hello",
            Command::WriteAdcGain => "write_adc_gain",
            Command::WriteAdcOffset => "write_adc_offset",
            Command::ReadAdc => "read_adc",
            Command::SetDac => "set_dac",
            Command::SetDacChannel => "set_dac_channel",
            Command::SetPeriod => "set_period",
            Command::ResetSettings => "reset_settings",
            Command::ReadSettings => "read_settings",
            Command::WriteSettings => "write_settings",
            Command::WriteLutEntry => "write_lut_entry",
            Command::WriteLut => "write_lut",
            Command::EraseLut => "erase_lut",
            Command::DisableAdcCorrection => "disable_adc_correction",
            Command::EnableAdcCorrection => "enable_adc_correction",
            Command::GetSerialNumber => "get_serial_number",
            Command::Monitor => "monitor",
            Command::SoftReset => "soft_reset",
            Command::EnterCalibration => "enter_calibration",
            Command::ResetIntoBootloader => "reset_into_bootloader",
            Command::SetFrequency => "set_frequency",
            Command::SetOsc8mFreq => "set_osc8m_freq",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Versioned mapping from [`Command`] to wire codes.
///
/// This is a wire contract with the firmware. A wrong code is not detected
/// by the protocol; the device will simply run a different command or ignore
/// the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CommandTableRepr", into = "CommandTableRepr")]
pub struct CommandTable {
    version: String,
    codes: BTreeMap<Command, u8>,
}

#[derive(Serialize, Deserialize)]
struct CommandTableRepr {
    version: String,
    commands: BTreeMap<Command, u8>,
}

impl TryFrom<CommandTableRepr> for CommandTable {
    type Error = FrameError;

    fn try_from(repr: CommandTableRepr) -> Result<Self> {
        CommandTable::new(repr.version, repr.commands)
    }
}

impl From<CommandTable> for CommandTableRepr {
    fn from(table: CommandTable) -> Self {
        Self {
            version: table.version,
            commands: table.codes,
        }
    }
}

/// Version tag of the chunked-settings firmware table.
pub const LEGACY_VERSION: &str = "legacy";

/// Version tag of the single-shot-settings firmware table.
pub const CURRENT_VERSION: &str = "current";

impl CommandTable {
    /// Build a table, rejecting codes that are not 7-bit or not unique.
    pub fn new(
        version: impl Into<String>,
        codes: impl IntoIterator<Item = (Command, u8)>,
    ) -> Result<Self> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(FrameError::InvalidCommandTable(
                "version must not be empty".to_string(),
            ));
        }

        let mut table = BTreeMap::new();
        let mut seen: BTreeMap<u8, Command> = BTreeMap::new();
        for (command, code) in codes {
            if code & 0x80 != 0 {
                return Err(FrameError::InvalidCommandTable(format!(
                    "{command} code {code:#04x} is not a 7-bit value"
                )));
            }
            if let Some(other) = seen.insert(code, command) {
                if other != command {
                    return Err(FrameError::InvalidCommandTable(format!(
                        "code {code:#04x} assigned to both {other} and {command}"
                    )));
                }
            }
            table.insert(command, code);
        }

        Ok(Self {
            version,
            codes: table,
        })
    }

    /// Parse and validate a table from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the table as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Firmware with chunked settings transfer (`0x08`/`0x09`).
    pub fn legacy() -> Self {
        Self {
            version: LEGACY_VERSION.to_string(),
            codes: BTreeMap::from([
                (Command::Hello, 0x01),
                (Command::WriteAdcGain, 0x02),
                (Command::WriteAdcOffset, 0x03),
                (Command::ReadAdc, 0x04),
                (Command::SetDacChannel, 0x05),
                (Command::SetPeriod, 0x06),
                (Command::ResetSettings, 0x07),
                (Command::ReadSettings, 0x08),
                (Command::WriteSettings, 0x09),
                (Command::WriteLutEntry, 0x0A),
                (Command::WriteLut, 0x0B),
                (Command::EraseLut, 0x0C),
                (Command::DisableAdcCorrection, 0x0D),
                (Command::EnableAdcCorrection, 0x0E),
                (Command::GetSerialNumber, 0x0F),
                (Command::Monitor, 0x10),
                (Command::SoftReset, 0x11),
                (Command::EnterCalibration, 0x12),
                (Command::ResetIntoBootloader, 0x13),
            ]),
        }
    }

    /// Firmware with single-shot settings transfer (`0x18`/`0x19`).
    pub fn current() -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            codes: BTreeMap::from([
                (Command::Hello, 0x01),
                (Command::WriteAdcGain, 0x02),
                (Command::WriteAdcOffset, 0x03),
                (Command::ReadAdc, 0x04),
                (Command::SetDac, 0x05),
                (Command::ResetSettings, 0x07),
                (Command::WriteLutEntry, 0x0A),
                (Command::WriteLut, 0x0B),
                (Command::EraseLut, 0x0C),
                (Command::DisableAdcCorrection, 0x0D),
                (Command::EnableAdcCorrection, 0x0E),
                (Command::GetSerialNumber, 0x0F),
                (Command::Monitor, 0x10),
                (Command::SoftReset, 0x11),
                (Command::EnterCalibration, 0x12),
                (Command::ResetIntoBootloader, 0x13),
                (Command::ReadSettings, 0x18),
                (Command::WriteSettings, 0x19),
                (Command::SetFrequency, 0x20),
                (Command::SetOsc8mFreq, 0x21),
            ]),
        }
    }

    /// Table version tag.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Wire code for a command, if this firmware supports it.
    pub fn code(&self, command: Command) -> Option<u8> {
        self.codes.get(&command).copied()
    }

    /// Reverse lookup, used for logging responses.
    pub fn command_for(&self, code: u8) -> Option<Command> {
        self.codes
            .iter()
            .find_map(|(command, c)| (*c == code).then_some(*command))
    }

    /// Iterate `(command, code)` pairs ordered by command.
    pub fn iter(&self) -> impl Iterator<Item = (Command, u8)> + '_ {
        self.codes.iter().map(|(command, code)| (*command, *code))
    }

    /// Number of mapped commands.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the table maps no commands.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
