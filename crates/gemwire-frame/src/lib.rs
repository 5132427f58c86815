//! SysEx command framing for gemwire devices.
//!
//! Every request and response is one SysEx message:
//! - `0xF0` SysEx start
//! - a 1-byte device marker (`0x77` for Gemini)
//! - a 1-byte command code, resolved through a versioned [`CommandTable`]
//! - zero or more 7-bit payload bytes, raw or Teeth-encoded
//! - `0xF7` SysEx end
//!
//! There is no checksum and no request ID. Integrity relies on the SysEx
//! delimiters and the deterministic Teeth length law.

pub mod codec;
pub mod commands;
pub mod error;

pub use codec::{
    decode_frame, encode_frame, encode_request, Frame, FrameConfig, Payload,
    DEFAULT_DEVICE_MARKER, DEFAULT_MAX_MESSAGE_SIZE, HEADER_SIZE, MIN_FRAME_SIZE, SYSEX_END,
    SYSEX_START, TRAILER_SIZE,
};
pub use commands::{Command, CommandTable};
pub use error::{FrameError, Result};
