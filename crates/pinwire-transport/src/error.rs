/// Errors that can occur when handing bytes to a channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write was issued while the channel was not ready for it.
    #[error("channel not ready ({pending} bytes still in flight)")]
    NotReady { pending: usize },

    /// The channel has been closed by its owner.
    #[error("channel closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
