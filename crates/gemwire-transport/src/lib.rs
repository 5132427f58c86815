//! Message-oriented transport abstraction for SysEx device links.
//!
//! The framing layer only needs two operations: send one message and block
//! until the next inbound message arrives. This crate provides:
//! - [`Transport`], the trait the framing layer is generic over
//! - [`SysExStream`], which splits a raw MIDI byte stream into SysEx messages
//! - [`RawMidiPort`], a raw MIDI character device (e.g. ALSA `/dev/snd/midiC1D0`)
//! - [`MemoryTransport`], an in-memory queue for tests and dry runs
//!
//! This is the lowest layer of gemwire. Everything else builds on top of
//! the [`Transport`] trait provided here.

pub mod error;
pub mod memory;
pub mod rawmidi;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use rawmidi::RawMidiPort;
pub use stream::{SysExStream, DEFAULT_MAX_MESSAGE_SIZE, SYSEX_END, SYSEX_START};
pub use traits::Transport;
