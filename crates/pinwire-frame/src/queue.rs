//! Bounded byte FIFO shared by every producer of outgoing messages and the
//! transmit pump.
//!
//! All access goes through a short critical section, so producers running
//! in event callbacks never interleave with each other or with the pump.
//! Overflow policy is reject-and-signal: a message that does not fit is not
//! written at all.

use std::cell::RefCell;
use std::collections::VecDeque;

use critical_section::Mutex;
use tracing::warn;

use crate::error::QueueError;

/// Default queue capacity in bytes.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// The outgoing byte queue.
pub struct OutgoingQueue {
    bytes: Mutex<RefCell<VecDeque<u8>>>,
    capacity: usize,
}

/// Exclusive view of the queue inside a critical section.
pub struct LockedQueue<'a> {
    bytes: &'a mut VecDeque<u8>,
    capacity: usize,
}

impl LockedQueue<'_> {
    /// Bytes resident.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the queue holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes that can still be enqueued.
    pub fn free(&self) -> usize {
        self.capacity - self.bytes.len()
    }

    /// Append `header` followed by `trailer`, or nothing if both do not fit.
    pub fn push_with_trailer(&mut self, header: &[u8], trailer: &[u8]) -> Result<(), QueueError> {
        let needed = header.len() + trailer.len();
        let available = self.free();
        if needed > available {
            warn!(needed, available, "outgoing queue full, message rejected");
            return Err(QueueError::Full { needed, available });
        }
        self.bytes.extend(header);
        self.bytes.extend(trailer);
        Ok(())
    }

    /// Append `data`, or nothing if it does not fit.
    pub fn push(&mut self, data: &[u8]) -> Result<(), QueueError> {
        self.push_with_trailer(data, &[])
    }

    /// Remove up to `n` bytes from the front. Returns how many were removed.
    pub fn pull(&mut self, n: usize) -> usize {
        let n = n.min(self.bytes.len());
        self.bytes.drain(..n);
        n
    }

    /// The longest contiguous span at the front of the queue.
    ///
    /// May be shorter than [`LockedQueue::len`] when the storage wraps.
    pub fn head(&self) -> &[u8] {
        self.bytes.as_slices().0
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl OutgoingQueue {
    /// Create a queue holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Mutex::new(RefCell::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Run `f` with exclusive access to the queue.
    ///
    /// `f` must not call back into this queue.
    pub fn lock<R>(&self, f: impl FnOnce(&mut LockedQueue<'_>) -> R) -> R {
        critical_section::with(|cs| {
            let mut bytes = self.bytes.borrow_ref_mut(cs);
            let mut locked = LockedQueue {
                bytes: &mut *bytes,
                capacity: self.capacity,
            };
            f(&mut locked)
        })
    }

    /// Maximum bytes resident.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes resident.
    pub fn len(&self) -> usize {
        self.lock(|q| q.len())
    }

    /// Whether the queue holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.lock(|q| q.is_empty())
    }

    /// Bytes that can still be enqueued.
    pub fn free(&self) -> usize {
        self.lock(|q| q.free())
    }

    /// Append a complete message.
    pub fn enqueue(&self, data: &[u8]) -> Result<(), QueueError> {
        self.lock(|q| q.push(data))
    }

    /// Append a message and its variable trailer as one unit.
    pub fn enqueue_with_trailer(&self, header: &[u8], trailer: &[u8]) -> Result<(), QueueError> {
        self.lock(|q| q.push_with_trailer(header, trailer))
    }

    /// Remove up to `n` bytes from the front.
    pub fn pull(&self, n: usize) -> usize {
        self.lock(|q| q.pull(n))
    }

    /// Copy of the contiguous span at the front, without removing it.
    pub fn peek(&self) -> Vec<u8> {
        self.lock(|q| q.head().to_vec())
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.lock(|q| q.clear())
    }
}

impl Default for OutgoingQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl std::fmt::Debug for OutgoingQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutgoingQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
