/// Errors raised while reassembling messages from the incoming byte stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The type byte does not name a declared message type.
    #[error("unknown message type 0x{0:02X}")]
    UnknownMessageType(u8),

    /// A previous failure stopped decoding; the decoder must be reset.
    #[error("decoder halted by an earlier failure")]
    Halted,
}

/// Errors raised by the outgoing queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The message does not fit in the remaining space. Nothing was written.
    #[error("outgoing queue full ({needed} bytes needed, {available} available)")]
    Full { needed: usize, available: usize },
}

/// Errors that can occur during message encoding, decoding and transmission.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Incoming stream could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Outgoing queue rejected a message.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A variable-length trailer is outside the range its size field can express.
    #[error("trailer of {len} bytes outside {min}..={max}")]
    TrailerLength { len: usize, min: usize, max: usize },

    /// The channel refused a write.
    #[error("transport error: {0}")]
    Transport(#[from] pinwire_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
