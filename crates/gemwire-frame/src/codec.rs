use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

pub use gemwire_transport::{DEFAULT_MAX_MESSAGE_SIZE, SYSEX_END, SYSEX_START};

use crate::error::{FrameError, Result};

/// Frame header: start (1) + device marker (1) + command (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Frame trailer: end (1).
pub const TRAILER_SIZE: usize = 1;

/// Smallest valid frame: header + trailer, empty payload.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + TRAILER_SIZE;

/// Winterbloom's SysEx identifier byte.
pub const DEFAULT_DEVICE_MARKER: u8 = 0x77;

/// A parsed frame with the SysEx delimiters and device marker stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command code from the header.
    pub command: u8,
    /// Payload bytes between the header and the trailer, still encoded.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(command: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload + trailer).
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }

    /// Teeth-decode the payload.
    pub fn decode_payload(&self) -> Result<Vec<u8>> {
        Ok(gemwire_teeth::decode(&self.payload)?)
    }
}

/// How a request payload is placed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// No payload bytes.
    Empty,
    /// Bytes sent verbatim. Every byte must already be 7-bit clean.
    Raw(&'a [u8]),
    /// Arbitrary bytes, Teeth-encoded before sending.
    Teeth(&'a [u8]),
}

impl Payload<'_> {
    /// Number of payload bytes this will occupy on the wire.
    pub fn wire_len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Raw(bytes) => bytes.len(),
            Payload::Teeth(bytes) => gemwire_teeth::encoded_length(bytes.len()),
        }
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Device marker placed after the SysEx start byte. Default: `0x77`.
    pub device_marker: u8,
    /// Maximum encoded frame size in bytes. Default: 4 KiB.
    pub max_message_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            device_marker: DEFAULT_DEVICE_MARKER,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Encode a frame with a raw payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬────────┬─────────┬──────────────────┬──────┐
/// │ 0xF0 │ Marker │ Command │ Payload (7-bit)  │ 0xF7 │
/// └──────┴────────┴─────────┴──────────────────┴──────┘
/// ```
pub fn encode_frame(device_marker: u8, command: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if let Some(offset) = payload.iter().position(|byte| byte & 0x80 != 0) {
        return Err(FrameError::PayloadNotSevenBit {
            offset,
            byte: payload[offset],
        });
    }

    put_header(device_marker, command, payload.len(), dst)?;
    dst.put_slice(payload);
    dst.put_u8(SYSEX_END);
    Ok(())
}

/// Encode a request frame, Teeth-encoding the payload when asked to.
pub fn encode_request(
    config: &FrameConfig,
    command: u8,
    payload: Payload<'_>,
    dst: &mut BytesMut,
) -> Result<()> {
    let size = MIN_FRAME_SIZE + payload.wire_len();
    if size > config.max_message_size {
        return Err(FrameError::FrameTooLarge {
            size,
            max: config.max_message_size,
        });
    }

    match payload {
        Payload::Empty => encode_frame(config.device_marker, command, &[], dst),
        Payload::Raw(bytes) => encode_frame(config.device_marker, command, bytes, dst),
        Payload::Teeth(bytes) => {
            put_header(config.device_marker, command, payload.wire_len(), dst)?;
            gemwire_teeth::encode_into(bytes, dst);
            dst.put_u8(SYSEX_END);
            Ok(())
        }
    }
}

/// Parse one complete message into a [`Frame`].
///
/// Checks the length, both SysEx delimiters, and the device marker. The
/// command byte is returned as-is and is not checked against any request.
pub fn decode_frame(src: &[u8], device_marker: u8) -> Result<Frame> {
    check_frame(src, device_marker).inspect_err(|err| {
        debug!(len = src.len(), error = %err, "rejected inbound frame");
        trace!(bytes = ?src, "rejected frame bytes");
    })?;

    let frame = Frame {
        command: src[2],
        payload: Bytes::copy_from_slice(&src[HEADER_SIZE..src.len() - TRAILER_SIZE]),
    };
    trace!(command = frame.command, len = frame.payload.len(), "decoded frame");
    Ok(frame)
}

fn check_frame(src: &[u8], device_marker: u8) -> Result<()> {
    if src.len() < MIN_FRAME_SIZE {
        return Err(FrameError::TooShort { len: src.len() });
    }

    if src[0] != SYSEX_START {
        return Err(FrameError::MissingStart { found: src[0] });
    }

    if src[1] != device_marker {
        return Err(FrameError::WrongDeviceMarker {
            expected: device_marker,
            found: src[1],
        });
    }

    let last = src[src.len() - 1];
    if last != SYSEX_END {
        return Err(FrameError::MissingEnd { found: last });
    }
    Ok(())
}

fn put_header(device_marker: u8, command: u8, payload_len: usize, dst: &mut BytesMut) -> Result<()> {
    if command & 0x80 != 0 {
        return Err(FrameError::CommandOutOfRange(command));
    }

    dst.reserve(MIN_FRAME_SIZE + payload_len);
    dst.put_u8(SYSEX_START);
    dst.put_u8(device_marker);
    dst.put_u8(command);
    Ok(())
}
