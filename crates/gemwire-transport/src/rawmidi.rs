use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::{SysExStream, DEFAULT_MAX_MESSAGE_SIZE};
use crate::traits::Transport;

/// A raw MIDI character device opened for exclusive read/write use.
///
/// On Linux this is an ALSA rawmidi node such as `/dev/snd/midiC1D0`. The
/// port is owned by exactly one framing layer; reads block until a complete
/// SysEx message arrives.
pub struct RawMidiPort {
    path: PathBuf,
    stream: SysExStream<File, File>,
}

impl RawMidiPort {
    /// Open a raw MIDI device with the default maximum message size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_max_message_size(path, DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Open a raw MIDI device with an explicit maximum inbound message size.
    pub fn open_with_max_message_size(path: impl AsRef<Path>, max_message_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let writer = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;
        let reader = writer.try_clone().map_err(|source| TransportError::Open {
            path: path.clone(),
            source,
        })?;

        info!(?path, "opened raw midi port");

        Ok(Self {
            path,
            stream: SysExStream::with_max_message_size(reader, writer, max_message_size),
        })
    }

    /// Filesystem path of the device.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transport for RawMidiPort {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        debug!(len = message.len(), "raw midi send");
        self.stream.send(message)
    }

    fn receive(&mut self) -> Result<Bytes> {
        let message = self.stream.receive()?;
        debug!(len = message.len(), "raw midi receive");
        Ok(message)
    }
}

impl std::fmt::Debug for RawMidiPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawMidiPort")
            .field("path", &self.path)
            .finish()
    }
}
