use pinwire_frame::MessageType;

/// Reasons a fully decoded command is refused.
///
/// Every variant except [`DispatchError::Outgoing`] is raised before the
/// hardware is touched.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A pin, PWM, UART or mode field is outside what the board provides.
    #[error("{field} {value} out of range (limit {limit})")]
    InvalidField {
        field: &'static str,
        value: u8,
        limit: u8,
    },

    /// HARD_RESET carried the wrong magic value.
    #[error("bad reset magic 0x{0:08X}")]
    BadMagic(u32),

    /// The message type is declared but has no handler.
    #[error("no handler for {0}")]
    Unsupported(MessageType),

    /// The echo or report could not be queued. The hardware action has
    /// already run.
    #[error("outgoing message not queued: {0}")]
    Outgoing(#[from] pinwire_frame::FrameError),
}

/// Errors that can occur in protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The incoming stream could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] pinwire_frame::DecodeError),

    /// A decoded command was refused.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Frame-level error while encoding, queueing or pumping.
    #[error("frame error: {0}")]
    Frame(#[from] pinwire_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
