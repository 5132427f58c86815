use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// In-memory transport with a scripted inbound queue.
///
/// Every sent message is recorded; every `receive` pops the next queued
/// message and fails with [`TransportError::Closed`] once the queue is empty.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<Bytes>,
    sent: Vec<Bytes>,
}

impl MemoryTransport {
    /// Create a transport with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with the given inbound messages queued in order.
    pub fn with_inbound<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        Self {
            inbound: messages.into_iter().map(Into::into).collect(),
            sent: Vec::new(),
        }
    }

    /// Queue one inbound message.
    pub fn push_inbound(&mut self, message: impl Into<Bytes>) {
        self.inbound.push_back(message.into());
    }

    /// Number of inbound messages not yet received.
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> &[Bytes] {
        &self.sent
    }

    /// Drain and return the sent log.
    pub fn take_sent(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.sent.push(Bytes::copy_from_slice(message));
        Ok(())
    }

    fn receive(&mut self) -> Result<Bytes> {
        self.inbound.pop_front().ok_or(TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_sent_messages() {
        let mut transport = MemoryTransport::new();
        transport.send(&[0xF0, 0x77, 0x01, 0xF7]).unwrap();
        transport.send(&[0xF0, 0x77, 0x11, 0xF7]).unwrap();

        assert_eq!(transport.sent().len(), 2);
        assert_eq!(transport.sent()[1].as_ref(), &[0xF0, 0x77, 0x11, 0xF7]);

        let taken = transport.take_sent();
        assert_eq!(taken.len(), 2);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn receives_in_queue_order_then_closes() {
        let mut transport =
            MemoryTransport::with_inbound([vec![0xF0, 0x77, 0x01, 0xF7], vec![0xF0, 0x77, 0x02, 0xF7]]);
        assert_eq!(transport.pending_inbound(), 2);

        assert_eq!(transport.receive().unwrap()[2], 0x01);
        assert_eq!(transport.receive().unwrap()[2], 0x02);
        assert!(matches!(transport.receive(), Err(TransportError::Closed)));
    }

    #[test]
    fn works_through_mutable_reference() {
        fn roundtrip<T: Transport>(mut transport: T) -> Bytes {
            transport.send(b"ping").unwrap();
            transport.receive().unwrap()
        }

        let mut transport = MemoryTransport::with_inbound([b"pong".to_vec()]);
        assert_eq!(roundtrip(&mut transport).as_ref(), b"pong");
        assert_eq!(transport.sent()[0].as_ref(), b"ping");
    }
}
