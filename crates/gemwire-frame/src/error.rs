use gemwire_teeth::TeethError;

/// Errors that can occur while building or parsing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The message is shorter than start + marker + command + end.
    #[error("frame too short ({len} bytes, min {min})", min = crate::MIN_FRAME_SIZE)]
    TooShort { len: usize },

    /// The message does not begin with the SysEx start byte.
    #[error("frame does not start with 0xF0 (found {found:#04x})")]
    MissingStart { found: u8 },

    /// The message is addressed to a different device.
    #[error("unexpected device marker {found:#04x} (expected {expected:#04x})")]
    WrongDeviceMarker { expected: u8, found: u8 },

    /// The message does not end with the SysEx end byte.
    #[error("frame does not end with 0xF7 (found {found:#04x})")]
    MissingEnd { found: u8 },

    /// Command codes must fit in a SysEx data byte.
    #[error("command code {0:#04x} is not a 7-bit value")]
    CommandOutOfRange(u8),

    /// A raw payload byte would collide with a SysEx status byte.
    #[error("payload byte {byte:#04x} at offset {offset} is not a 7-bit value")]
    PayloadNotSevenBit { offset: usize, byte: u8 },

    /// The encoded frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The payload failed Teeth decoding.
    #[error("payload decode failed: {0}")]
    Teeth(#[from] TeethError),

    /// A command table failed validation.
    #[error("invalid command table: {0}")]
    InvalidCommandTable(String),

    /// A command table could not be parsed.
    #[error("command table json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
