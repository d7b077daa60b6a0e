use crate::error::{Result, TransportError};
use crate::traits::Channel;

/// In-memory channel that records every write.
///
/// In manual mode a write stays in flight until [`MemoryChannel::complete`]
/// is called, which models a link whose writes finish asynchronously.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    writes: Vec<Vec<u8>>,
    in_flight: Option<usize>,
    manual: bool,
    closed: bool,
}

impl MemoryChannel {
    /// A channel whose writes are accepted immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose writes stay in flight until [`MemoryChannel::complete`].
    pub fn manual() -> Self {
        Self {
            manual: true,
            ..Self::default()
        }
    }

    /// Confirm the in-flight write. Returns its length, if one was pending.
    pub fn complete(&mut self) -> Option<usize> {
        self.in_flight.take()
    }

    /// Length of the write still awaiting confirmation.
    pub fn in_flight(&self) -> Option<usize> {
        self.in_flight
    }

    /// Every write issued so far, in order.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// Drain the recorded writes, returning their concatenation.
    pub fn take_written(&mut self) -> Vec<u8> {
        let out = self.writes.concat();
        self.writes.clear();
        out
    }

    /// Refuse all further writes.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Channel for MemoryChannel {
    fn is_ready(&self) -> bool {
        !self.closed && self.in_flight.is_none()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if let Some(pending) = self.in_flight {
            return Err(TransportError::NotReady { pending });
        }
        self.writes.push(data.to_vec());
        if self.manual {
            self.in_flight = Some(data.len());
        }
        Ok(())
    }
}
