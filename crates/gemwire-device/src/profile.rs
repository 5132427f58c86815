use std::path::Path;

use gemwire_frame::{CommandTable, DEFAULT_DEVICE_MARKER};
use gemwire_teeth::{BYTES_PER_GROUP, GROUP_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

/// Chunk size used by firmware that transfers settings piecewise.
pub const LEGACY_CHUNK_SIZE: usize = 10;

/// Chunk indexes travel as a single 7-bit byte.
pub const MAX_CHUNKS: usize = 128;

/// How the settings record crosses the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SettingsTransfer {
    /// The encoded record is split into `chunk_size` pieces, one request each,
    /// addressed by a raw chunk index byte.
    Chunked { chunk_size: usize },
    /// Like `Chunked`, but every chunk is a self-contained Teeth buffer that
    /// is decoded on receipt. `chunk_size` counts encoded bytes and must be a
    /// whole number of groups.
    ChunkedDecoded { chunk_size: usize },
    /// The whole record in one Teeth-encoded payload.
    SingleShot,
}

impl SettingsTransfer {
    /// Encoded bytes per chunk, if the record is split at all.
    pub fn chunk_size(self) -> Option<usize> {
        match self {
            SettingsTransfer::Chunked { chunk_size }
            | SettingsTransfer::ChunkedDecoded { chunk_size } => Some(chunk_size),
            SettingsTransfer::SingleShot => None,
        }
    }

    /// Packed (decoded) bytes carried by each chunk in `ChunkedDecoded` mode.
    pub fn decoded_chunk_size(self) -> Option<usize> {
        match self {
            SettingsTransfer::ChunkedDecoded { chunk_size } => {
                Some(chunk_size / GROUP_SIZE * BYTES_PER_GROUP)
            }
            _ => None,
        }
    }
}

/// Everything that varies between firmware revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FirmwareProfileRepr", into = "FirmwareProfileRepr")]
pub struct FirmwareProfile {
    name: String,
    device_marker: u8,
    commands: CommandTable,
    settings_transfer: SettingsTransfer,
}

#[derive(Serialize, Deserialize)]
struct FirmwareProfileRepr {
    name: String,
    #[serde(default = "default_device_marker")]
    device_marker: u8,
    commands: CommandTable,
    settings_transfer: SettingsTransfer,
}

fn default_device_marker() -> u8 {
    DEFAULT_DEVICE_MARKER
}

impl TryFrom<FirmwareProfileRepr> for FirmwareProfile {
    type Error = DeviceError;

    fn try_from(repr: FirmwareProfileRepr) -> Result<Self> {
        FirmwareProfile::new(
            repr.name,
            repr.device_marker,
            repr.commands,
            repr.settings_transfer,
        )
    }
}

impl From<FirmwareProfile> for FirmwareProfileRepr {
    fn from(profile: FirmwareProfile) -> Self {
        Self {
            name: profile.name,
            device_marker: profile.device_marker,
            commands: profile.commands,
            settings_transfer: profile.settings_transfer,
        }
    }
}

impl FirmwareProfile {
    /// Names accepted by [`FirmwareProfile::builtin`].
    pub const BUILTIN_NAMES: [&'static str; 2] = ["legacy", "current"];

    /// Build a profile, validating the marker and transfer settings.
    pub fn new(
        name: impl Into<String>,
        device_marker: u8,
        commands: CommandTable,
        settings_transfer: SettingsTransfer,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DeviceError::InvalidProfile(
                "name must not be empty".to_string(),
            ));
        }
        if device_marker & 0x80 != 0 {
            return Err(DeviceError::InvalidProfile(format!(
                "{name}: device marker {device_marker:#04x} is not a 7-bit value"
            )));
        }
        match settings_transfer {
            SettingsTransfer::Chunked { chunk_size: 0 } => {
                return Err(DeviceError::InvalidProfile(format!(
                    "{name}: chunk_size must be at least 1"
                )));
            }
            SettingsTransfer::ChunkedDecoded { chunk_size }
                if chunk_size == 0 || chunk_size % GROUP_SIZE != 0 =>
            {
                return Err(DeviceError::InvalidProfile(format!(
                    "{name}: chunk_size {chunk_size} must be a nonzero multiple of {GROUP_SIZE}"
                )));
            }
            _ => {}
        }

        Ok(Self {
            name,
            device_marker,
            commands,
            settings_transfer,
        })
    }

    /// Factory firmware: settings codes `0x08`/`0x09`, 10-byte chunks.
    pub fn legacy() -> Self {
        Self {
            name: "legacy".to_string(),
            device_marker: DEFAULT_DEVICE_MARKER,
            commands: CommandTable::legacy(),
            settings_transfer: SettingsTransfer::Chunked {
                chunk_size: LEGACY_CHUNK_SIZE,
            },
        }
    }

    /// Released firmware: settings codes `0x18`/`0x19`, single-shot transfer.
    pub fn current() -> Self {
        Self {
            name: "current".to_string(),
            device_marker: DEFAULT_DEVICE_MARKER,
            commands: CommandTable::current(),
            settings_transfer: SettingsTransfer::SingleShot,
        }
    }

    /// Look up a built-in profile by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "legacy" => Some(Self::legacy()),
            "current" => Some(Self::current()),
            _ => None,
        }
    }

    /// Parse and validate a profile from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a profile from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| DeviceError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Resolve a built-in name, or else treat `name_or_path` as a JSON file.
    pub fn load(name_or_path: &str) -> Result<Self> {
        match Self::builtin(name_or_path) {
            Some(profile) => Ok(profile),
            None => Self::from_file(Path::new(name_or_path)),
        }
    }

    /// Serialize the profile as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_marker(&self) -> u8 {
        self.device_marker
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn settings_transfer(&self) -> SettingsTransfer {
        self.settings_transfer
    }
}

impl Default for FirmwareProfile {
    fn default() -> Self {
        Self::current()
    }
}
