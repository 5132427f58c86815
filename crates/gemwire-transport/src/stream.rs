use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{trace, warn};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// MIDI System Exclusive start byte.
pub const SYSEX_START: u8 = 0xF0;

/// MIDI System Exclusive end byte.
pub const SYSEX_END: u8 = 0xF7;

/// Default maximum inbound message size, delimiters included.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4 * 1024;

const READ_CHUNK_SIZE: usize = 512;

/// Splits a raw MIDI byte stream into SysEx messages.
///
/// Inbound handling follows the MIDI byte-stream rules:
/// - bytes outside `0xF0 .. 0xF7` are dropped
/// - real-time bytes (`0xF8..=0xFF`) interleaved inside a message are ignored
/// - any other status byte inside a message aborts it
///
/// Outbound messages are written as-is, so callers pass complete SysEx
/// messages to [`Transport::send`].
pub struct SysExStream<R, W> {
    reader: R,
    writer: W,
    pending: BytesMut,
    message: BytesMut,
    in_message: bool,
    max_message_size: usize,
}

impl<R: Read, W: Write> SysExStream<R, W> {
    /// Create a stream with the default maximum message size.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_max_message_size(reader, writer, DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a stream with an explicit maximum inbound message size.
    pub fn with_max_message_size(reader: R, writer: W, max_message_size: usize) -> Self {
        Self {
            reader,
            writer,
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
            message: BytesMut::with_capacity(256),
            in_message: false,
            max_message_size,
        }
    }

    /// Current maximum inbound message size.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Borrow the reader half.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Borrow the writer half.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consume the stream and return both halves.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Scan already-read bytes for one complete message.
    fn scan(&mut self) -> Result<Option<Bytes>> {
        while self.pending.has_remaining() {
            let byte = self.pending.get_u8();
            match byte {
                SYSEX_START => {
                    if self.in_message {
                        warn!(
                            discarded = self.message.len(),
                            "sysex restarted before end marker"
                        );
                    }
                    self.message.clear();
                    self.message.put_u8(byte);
                    self.in_message = true;
                }
                SYSEX_END if self.in_message => {
                    self.message.put_u8(byte);
                    self.in_message = false;
                    let message = self.message.split().freeze();
                    trace!(len = message.len(), "sysex message complete");
                    return Ok(Some(message));
                }
                0xF8..=0xFF => trace!(byte, "ignoring real-time byte"),
                _ if !self.in_message => trace!(byte, "dropping byte outside sysex"),
                0x80..=0xF7 => {
                    warn!(
                        byte,
                        discarded = self.message.len(),
                        "sysex interrupted by status byte"
                    );
                    self.message.clear();
                    self.in_message = false;
                }
                _ => {
                    // Room must remain for the end marker.
                    if self.message.len() + 2 > self.max_message_size {
                        let size = self.message.len() + 1;
                        self.message.clear();
                        self.in_message = false;
                        return Err(TransportError::MessageTooLarge {
                            size,
                            max: self.max_message_size,
                        });
                    }
                    self.message.put_u8(byte);
                }
            }
        }

        Ok(None)
    }
}

impl<R: Read, W: Write> Transport for SysExStream<R, W> {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < message.len() {
            match self.writer.write(&message[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.writer.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn receive(&mut self) -> Result<Bytes> {
        loop {
            if let Some(message) = self.scan()? {
                return Ok(message);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.reader.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return Err(TransportError::Closed);
            }

            self.pending.extend_from_slice(&chunk[..read]);
        }
    }
}

impl<R, W> std::fmt::Debug for SysExStream<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysExStream")
            .field("pending", &self.pending.len())
            .field("in_message", &self.in_message)
            .field("max_message_size", &self.max_message_size)
            .finish()
    }
}
