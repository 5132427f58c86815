use std::path::PathBuf;

use gemwire_frame::Command;

/// Errors that can occur while talking to a device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] gemwire_transport::TransportError),

    /// The response was not a well-formed frame.
    #[error("protocol error: {0}")]
    Protocol(#[from] gemwire_frame::FrameError),

    /// A Teeth payload could not be decoded.
    #[error("payload decode error: {0}")]
    Teeth(#[from] gemwire_teeth::TeethError),

    /// Record packing or unpacking failed.
    #[error("record error: {0}")]
    Record(#[from] gemwire_record::RecordError),

    /// A response had the wrong size for the command.
    #[error("malformed {command} response: expected {expected} bytes, got {actual}")]
    MalformedResponse {
        command: Command,
        expected: usize,
        actual: usize,
    },

    /// A response had the right size but unusable content.
    #[error("invalid {command} response: {reason}")]
    InvalidResponse { command: Command, reason: String },

    /// The active firmware profile has no code for this command.
    #[error("{command} is not supported by firmware profile '{profile}'")]
    UnsupportedCommand { command: Command, profile: String },

    /// A record of the wrong layout was passed in.
    #[error("expected a '{expected}' record, got '{actual}'")]
    LayoutMismatch { expected: String, actual: String },

    /// An argument cannot be represented on the wire.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A firmware profile failed validation.
    #[error("invalid firmware profile: {0}")]
    InvalidProfile(String),

    /// A firmware profile file could not be read.
    #[error("failed to read profile {path}: {source}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
