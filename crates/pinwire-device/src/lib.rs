//! Device side of the pinwire protocol.
//!
//! Decoded commands are validated against the board, executed through a
//! [`Hardware`] implementation, and acknowledged on the shared outgoing
//! queue. [`Protocol`] ties the decoder, dispatcher and transmit pump to one
//! channel.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod hardware;
pub mod protocol;
pub mod sender;
pub mod sim;

pub use config::{BoardConfig, DeviceIdentity, ProtocolConfig};
pub use dispatch::Dispatcher;
pub use error::{DeviceError, DispatchError, Result};
pub use hardware::{Hardware, Parity, PullMode, UartSettings};
pub use protocol::Protocol;
pub use sender::MessageSender;
pub use sim::{HardwareCall, SimulatedBoard};
