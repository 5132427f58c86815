use std::fmt;
use std::io;

use gemwire_device::DeviceError;
use gemwire_frame::FrameError;
use gemwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, path } => {
            io_error(&format!("{context}: {}", path.display()), source)
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::InvalidCommandTable(_) | FrameError::Json(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        FrameError::FrameTooLarge { .. } => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    match err {
        DeviceError::Transport(err) => transport_error(context, err),
        DeviceError::Protocol(err) => frame_error(context, err),
        DeviceError::Teeth(_)
        | DeviceError::Record(_)
        | DeviceError::MalformedResponse { .. }
        | DeviceError::InvalidResponse { .. }
        | DeviceError::LayoutMismatch { .. }
        | DeviceError::Json(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        DeviceError::UnsupportedCommand { .. }
        | DeviceError::InvalidArgument(_)
        | DeviceError::InvalidProfile(_) => CliError::new(USAGE, format!("{context}: {err}")),
        DeviceError::ProfileRead { source, path } => {
            io_error(&format!("{context}: {}", path.display()), source)
        }
    }
}

#[cfg(test)]
mod tests {
    use gemwire_frame::Command;

    use super::*;

    #[test]
    fn closed_transport_is_a_plain_failure() {
        let err = device_error("read failed", DeviceError::Transport(TransportError::Closed));
        assert_eq!(err.code, FAILURE);
        assert_eq!(err.message, "read failed: transport closed");
    }

    #[test]
    fn malformed_responses_are_invalid_data() {
        let err = device_error(
            "read failed",
            DeviceError::MalformedResponse {
                command: Command::ReadSettings,
                expected: 14,
                actual: 9,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn unsupported_commands_are_usage_errors() {
        let err = device_error(
            "set failed",
            DeviceError::UnsupportedCommand {
                command: Command::SetPeriod,
                profile: "current".to_string(),
            },
        );
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn missing_device_node_is_a_transport_error() {
        let err = transport_error(
            "open failed",
            TransportError::Open {
                path: "/dev/snd/midiC9D9".into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.contains("/dev/snd/midiC9D9"));
    }
}
