//! Type-tagged message framing for the pinwire peripheral protocol.
//!
//! Every message on the wire is:
//! - a 1-byte type tag
//! - a fixed argument block whose size is looked up by tag and direction
//! - for variable-length types only, a trailer whose length is announced in
//!   the fixed block
//!
//! There is no length prefix, delimiter or checksum. Both ends must agree on
//! the tables in [`message_type`].

pub mod args;
pub mod decoder;
pub mod error;
pub mod incoming;
pub mod message_type;
pub mod outgoing;
pub mod pump;
pub mod queue;

pub use decoder::{decode_all, Direction, FailurePolicy, Incoming, MessageDecoder, Outgoing, Received};
pub use error::{DecodeError, FrameError, QueueError, Result};
pub use incoming::IncomingMessage;
pub use message_type::{
    MessageType, INCOMING_ARG_SIZE, MAX_MESSAGE_SIZE, MESSAGE_TYPE_COUNT, OUTGOING_ARG_SIZE,
    PROTOCOL_MAGIC, PWM_DISABLE,
};
pub use outgoing::OutgoingMessage;
pub use pump::TransmitPump;
pub use queue::{LockedQueue, OutgoingQueue, DEFAULT_QUEUE_CAPACITY};
