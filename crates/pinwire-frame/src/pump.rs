use pinwire_transport::Channel;
use tracing::trace;

use crate::error::Result;
use crate::queue::OutgoingQueue;

/// Drains an [`OutgoingQueue`] into a [`Channel`], one write at a time.
///
/// Bytes handed to the channel stay in the queue until the channel reports
/// ready again, so the queue itself is the retry buffer.
#[derive(Debug, Default)]
pub struct TransmitPump {
    in_flight: usize,
    writes: u64,
    bytes_confirmed: u64,
}

impl TransmitPump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one pump step.
    ///
    /// When the channel is ready, confirms the previous write by removing its
    /// bytes from the queue, then hands the new contiguous head to the
    /// channel. Returns the number of bytes handed over (0 if nothing was
    /// written).
    pub fn tick<C>(&mut self, queue: &OutgoingQueue, channel: &mut C) -> Result<usize>
    where
        C: Channel + ?Sized,
    {
        if !channel.is_ready() {
            return Ok(0);
        }

        queue.lock(|q| -> Result<usize> {
            if self.in_flight > 0 {
                q.pull(self.in_flight);
                self.bytes_confirmed += self.in_flight as u64;
                self.in_flight = 0;
            }

            let head = q.head();
            if head.is_empty() {
                return Ok(0);
            }

            channel.write(head)?;
            self.in_flight = head.len();
            self.writes += 1;
            trace!(len = head.len(), queued = q.len(), "pump write issued");
            Ok(self.in_flight)
        })
    }

    /// Bytes of the outstanding write, or 0.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Writes issued so far.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Bytes confirmed sent and removed from the queue.
    pub fn bytes_confirmed(&self) -> u64 {
        self.bytes_confirmed
    }

    /// Forget the outstanding write. Used when the queue is cleared.
    pub fn reset(&mut self) {
        self.in_flight = 0;
    }
}

#[cfg(test)]
mod tests {
    use pinwire_transport::{MemoryChannel, TransportError};

    use super::*;
    use crate::error::FrameError;

    #[test]
    fn idle_queue_issues_nothing() {
        let queue = OutgoingQueue::new(16);
        let mut channel = MemoryChannel::new();
        let mut pump = TransmitPump::new();

        assert_eq!(pump.tick(&queue, &mut channel).unwrap(), 0);
        assert!(channel.writes().is_empty());
    }

    #[test]
    fn bytes_stay_queued_until_write_is_confirmed() {
        let queue = OutgoingQueue::new(16);
        let mut channel = MemoryChannel::manual();
        let mut pump = TransmitPump::new();

        queue.enqueue(&[1, 2, 3]).unwrap();
        assert_eq!(pump.tick(&queue, &mut channel).unwrap(), 3);
        assert_eq!(pump.in_flight(), 3);
        assert_eq!(queue.len(), 3);

        queue.enqueue(&[4, 5]).unwrap();
        assert_eq!(pump.tick(&queue, &mut channel).unwrap(), 0);
        assert_eq!(queue.len(), 5);
        assert_eq!(channel.writes().len(), 1);

        channel.complete();
        assert_eq!(pump.tick(&queue, &mut channel).unwrap(), 2);
        assert_eq!(queue.len(), 2);
        assert_eq!(pump.bytes_confirmed(), 3);
        assert_eq!(channel.writes(), &[vec![1, 2, 3], vec![4, 5]]);
    }

    #[test]
    fn at_most_one_write_outstanding() {
        let queue = OutgoingQueue::new(64);
        let mut channel = MemoryChannel::manual();
        let mut pump = TransmitPump::new();

        for round in 0..10u8 {
            queue.enqueue(&[round; 3]).unwrap();
            pump.tick(&queue, &mut channel).unwrap();
            pump.tick(&queue, &mut channel).unwrap();
            assert!(channel.in_flight().is_some());
            channel.complete();
        }
        pump.tick(&queue, &mut channel).unwrap();

        assert_eq!(channel.written().len(), 30);
        assert!(queue.is_empty());
        assert_eq!(pump.write_count(), 10);
    }

    #[test]
    fn immediate_channel_drains_in_consecutive_ticks() {
        let queue = OutgoingQueue::new(16);
        let mut channel = MemoryChannel::new();
        let mut pump = TransmitPump::new();

        queue.enqueue(&[7; 5]).unwrap();
        pump.tick(&queue, &mut channel).unwrap();
        pump.tick(&queue, &mut channel).unwrap();

        assert!(queue.is_empty());
        assert_eq!(pump.in_flight(), 0);
        assert_eq!(channel.written(), vec![7; 5]);
    }

    #[test]
    fn failed_write_keeps_bytes_queued() {
        let queue = OutgoingQueue::new(16);
        let mut channel = FailingChannel;
        let mut pump = TransmitPump::new();

        queue.enqueue(&[1, 2]).unwrap();
        let err = pump.tick(&queue, &mut channel).unwrap_err();

        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
        assert_eq!(pump.in_flight(), 0);
        assert_eq!(queue.len(), 2);
    }

    struct FailingChannel;

    impl Channel for FailingChannel {
        fn is_ready(&self) -> bool {
            true
        }

        fn write(&mut self, _data: &[u8]) -> pinwire_transport::Result<()> {
            Err(TransportError::Closed)
        }
    }
}
