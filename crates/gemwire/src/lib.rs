//! Talk to Winterbloom Gemini firmware over MIDI SysEx.
//!
//! # Crate Structure
//!
//! - [`teeth`]: the 7-bit safe Teeth codec
//! - [`transport`]: message transports (raw MIDI ports, in-memory queues)
//! - [`frame`]: SysEx frame encode/parse and versioned command tables
//! - [`record`]: settings and monitor record layouts
//! - [`device`]: the command framing layer and the full firmware command set
//!
//! The most common types are also re-exported at the crate root.

/// Re-export codec functions.
pub mod teeth {
    pub use gemwire_teeth::*;
}

/// Re-export transport types.
pub mod transport {
    pub use gemwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use gemwire_frame::*;
}

/// Re-export record types.
pub mod record {
    pub use gemwire_record::*;
}

/// Re-export device types.
pub mod device {
    pub use gemwire_device::*;
}

pub use gemwire_device::{Device, DeviceError, FirmwareProfile, SettingsTransfer};
pub use gemwire_frame::{Command, CommandTable, Payload};
pub use gemwire_record::{Record, RecordLayout, Value};
pub use gemwire_transport::{MemoryTransport, RawMidiPort, Transport};
