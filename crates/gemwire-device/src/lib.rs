//! Command framing layer for Winterbloom Gemini.
//!
//! A [`Device`] owns one [`Transport`](gemwire_transport::Transport) and
//! speaks the SysEx command protocol over it: one request frame out, at most
//! one response frame back. Which byte each [`Command`](gemwire_frame::Command)
//! maps to, and how the settings record is transferred, come from a
//! [`FirmwareProfile`].
//!
//! ```no_run
//! use gemwire_device::{Device, FirmwareProfile};
//! use gemwire_transport::RawMidiPort;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let port = RawMidiPort::open("/dev/snd/midiC1D0")?;
//! let mut gemini = Device::new(port, FirmwareProfile::current());
//! println!("{}", gemini.firmware_version()?);
//! let settings = gemini.read_settings()?;
//! println!("{}", settings.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

pub mod chunks;
pub mod device;
pub mod error;
pub mod profile;

pub use chunks::{chunk_count, reassemble_chunks, split_chunks};
pub use device::{Device, MonitorSession, ResponseMode, SerialNumber, SERIAL_NUMBER_LEN};
pub use error::{DeviceError, Result};
pub use profile::{FirmwareProfile, SettingsTransfer, LEGACY_CHUNK_SIZE, MAX_CHUNKS};
