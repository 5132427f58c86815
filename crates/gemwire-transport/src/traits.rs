use bytes::Bytes;

use crate::error::Result;

/// A message-oriented, strictly alternating device link.
///
/// One call to [`send`](Transport::send) delivers one complete message (for
/// MIDI, one SysEx message including its `0xF0`/`0xF7` delimiters). One call
/// to [`receive`](Transport::receive) blocks until the next complete inbound
/// message is available. Message boundaries are defined by the transport.
///
/// No timeout semantics are implied. Implementations that can time out
/// surface it as a [`TransportError`](crate::TransportError).
pub trait Transport {
    /// Send one complete message.
    fn send(&mut self, message: &[u8]) -> Result<()>;

    /// Block until the next complete inbound message is available.
    fn receive(&mut self) -> Result<Bytes>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self) -> Result<Bytes> {
        (**self).receive()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self) -> Result<Bytes> {
        (**self).receive()
    }
}
