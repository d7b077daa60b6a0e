use pinwire_frame::{FailurePolicy, DEFAULT_QUEUE_CAPACITY};
use serde::{Deserialize, Serialize};

/// Peripheral counts the dispatcher validates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Number of addressable pins.
    pub num_pins: u8,
    /// Number of PWM channels.
    pub num_pwms: u8,
    /// Number of UARTs.
    pub num_uarts: u8,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            num_pins: 48,
            num_pwms: 9,
            num_uarts: 4,
        }
    }
}

/// Version fields announced in ESTABLISH_CONNECTION.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceIdentity {
    pub hardware: u16,
    pub bootloader: u16,
    pub firmware: u64,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            hardware: 0,
            bootloader: 1,
            firmware: 1,
        }
    }
}

/// Configuration for a [`Protocol`](crate::Protocol) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Outgoing queue capacity in bytes.
    pub queue_capacity: usize,
    /// What to do when a message cannot be decoded or dispatched.
    pub failure_policy: FailurePolicy,
    pub board: BoardConfig,
    pub identity: DeviceIdentity,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            failure_policy: FailurePolicy::default(),
            board: BoardConfig::default(),
            identity: DeviceIdentity::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ProtocolConfig =
            serde_json::from_str(r#"{"failure_policy":"resync","board":{"num_uarts":2}}"#)
                .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Resync);
        assert_eq!(config.board.num_uarts, 2);
        assert_eq!(config.board.num_pins, 48);
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.identity, DeviceIdentity::default());
    }

    #[test]
    fn empty_json_is_default() {
        let config: ProtocolConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProtocolConfig::default());
    }
}
