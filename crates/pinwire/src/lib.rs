//! Pin-level peripheral control over a byte channel.
//!
//! pinwire is the protocol engine of a peripheral controller that exposes
//! digital I/O, PWM, analog input and UARTs to a host. Commands arrive as
//! type-tagged binary messages over any byte channel; the device validates
//! them, drives its hardware, and answers with echoes and status reports.
//!
//! # Crate Structure
//!
//! - [`transport`]: Channel abstraction the transmit pump writes to
//! - [`frame`]: Message types, size tables, decoder, outgoing queue and pump
//! - [`device`]: Dispatcher, hardware trait and protocol session (behind `device` feature)

/// Re-export transport types.
pub mod transport {
    pub use pinwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pinwire_frame::*;
}

/// Re-export device types (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use pinwire_device::*;
}
