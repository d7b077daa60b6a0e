use std::io::{ErrorKind, Write};

use tracing::trace;

use crate::error::{Result, TransportError};

/// The byte channel the protocol engine transmits on.
///
/// A channel accepts one write at a time. After [`Channel::write`] returns,
/// the span is considered in flight until [`Channel::is_ready`] reports true
/// again, at which point the caller may treat those bytes as sent.
pub trait Channel {
    /// Whether the previous write (if any) has been accepted and the channel
    /// can take another one.
    fn is_ready(&self) -> bool;

    /// Hand a contiguous span to the channel for transmission.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }
}

/// Adapts any blocking `Write` stream (serial port, socket, file, stdout)
/// into a [`Channel`].
///
/// Every write completes before returning, so the channel is always ready
/// unless it has been closed because the stream stopped accepting bytes.
///
/// The stream must be blocking. A `WouldBlock` from a non-blocking stream is
/// returned as [`TransportError::Io`] rather than retried.
pub struct StreamChannel<W> {
    inner: W,
    closed: bool,
    bytes_written: u64,
}

impl<W: Write> StreamChannel<W> {
    /// Wrap a stream.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            closed: false,
            bytes_written: 0,
        }
    }

    /// Total bytes written through this channel.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the channel and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<W: Write> Channel for StreamChannel<W> {
    fn is_ready(&self) -> bool {
        !self.closed
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        let mut offset = 0usize;
        while offset < data.len() {
            match self.inner.write(&data[offset..]) {
                Ok(0) => {
                    self.closed = true;
                    return Err(TransportError::Closed);
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        self.bytes_written += data.len() as u64;
        trace!(len = data.len(), "stream channel write");
        self.flush()
    }
}

impl<W> std::fmt::Debug for StreamChannel<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamChannel")
            .field("closed", &self.closed)
            .field("bytes_written", &self.bytes_written)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn stream_channel_writes_through() {
        let mut channel = StreamChannel::new(Cursor::new(Vec::<u8>::new()));

        assert!(channel.is_ready());
        channel.write(&[1, 2, 3]).unwrap();
        channel.write(&[4]).unwrap();

        assert_eq!(channel.bytes_written(), 4);
        assert_eq!(channel.into_inner().into_inner(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn closes_when_write_returns_zero() {
        let mut channel = StreamChannel::new(ZeroWriter);

        let err = channel.write(b"x").unwrap_err();
        assert!(matches!(err, TransportError::Closed));
        assert!(!channel.is_ready());
        assert!(matches!(
            channel.write(b"y").unwrap_err(),
            TransportError::Closed
        ));
    }

    #[test]
    fn retries_interrupted_write_and_flush() {
        let mut channel = StreamChannel::new(InterruptedOnce {
            write_interrupted: false,
            flush_interrupted: false,
            data: Vec::new(),
        });

        channel.write(b"retry").unwrap();
        assert_eq!(channel.get_ref().data, b"retry");
    }

    #[test]
    fn io_errors_propagate() {
        let mut channel = StreamChannel::new(BrokenPipe);
        let err = channel.write(b"x").unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn would_block_is_returned_not_retried() {
        let mut channel = StreamChannel::new(NonBlocking { attempts: 0 });
        let err = channel.write(b"x").unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::WouldBlock));
        assert_eq!(channel.get_ref().attempts, 1);
        assert_eq!(channel.bytes_written(), 0);
    }

    #[test]
    fn mutable_reference_is_a_channel() {
        let mut channel = StreamChannel::new(Vec::<u8>::new());
        {
            let mut borrowed = &mut channel;
            assert!(Channel::is_ready(&borrowed));
            Channel::write(&mut borrowed, &[9]).unwrap();
        }
        assert_eq!(channel.get_ref(), &vec![9]);
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct NonBlocking {
        attempts: usize,
    }

    impl Write for NonBlocking {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.attempts += 1;
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedOnce {
        write_interrupted: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.write_interrupted {
                self.write_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }
}
