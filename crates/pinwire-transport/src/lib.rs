//! Byte channel abstraction between a pinwire device and its host.
//!
//! The protocol engine never opens connections or drives a physical link
//! itself. It only needs two things from whatever carries its bytes:
//! - whether the channel can accept another write right now
//! - a way to hand it a contiguous span of bytes to transmit
//!
//! This is the lowest layer of pinwire. Everything else builds on top of
//! the [`Channel`] trait provided here.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryChannel;
pub use traits::{Channel, StreamChannel};
