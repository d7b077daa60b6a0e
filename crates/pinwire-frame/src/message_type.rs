//! Message type tags and the per-direction argument size tables.
//!
//! Message boundaries on the wire are derived purely from these tables, so
//! both ends must agree on every entry, including the unused slots.

use std::fmt;

use crate::error::DecodeError;

/// Number of declared message types.
pub const MESSAGE_TYPE_COUNT: usize = 16;

/// Magic value carried by HARD_RESET and ESTABLISH_CONNECTION ("IOIO").
pub const PROTOCOL_MAGIC: u32 = 0x4F49_4F49;

/// `pwm_num` value in SET_PIN_PWM that unbinds the pin from any PWM.
pub const PWM_DISABLE: u8 = 0x0F;

/// Fixed argument bytes per incoming message type, indexed by tag.
pub const INCOMING_ARG_SIZE: [u8; MESSAGE_TYPE_COUNT] = [
    4, // HARD_RESET
    0, // SOFT_RESET
    1, // SET_PIN_DIGITAL_OUT
    1, // SET_DIGITAL_OUT_LEVEL
    1, // SET_PIN_DIGITAL_IN
    1, // SET_CHANGE_NOTIFY
    0, // REGISTER_PERIODIC_DIGITAL_SAMPLING
    0, // RESERVED
    2, // SET_PIN_PWM
    3, // SET_PWM_DUTY_CYCLE
    3, // SET_PWM_PERIOD
    1, // SET_PIN_ANALOG_IN
    2, // UART_DATA (trailer follows)
    3, // UART_CONFIG
    2, // SET_PIN_UART_RX
    2, // SET_PIN_UART_TX
];

/// Fixed argument bytes per outgoing message type, indexed by tag.
pub const OUTGOING_ARG_SIZE: [u8; MESSAGE_TYPE_COUNT] = [
    16, // ESTABLISH_CONNECTION
    0,  // SOFT_RESET
    1,  // SET_PIN_DIGITAL_OUT
    1,  // REPORT_DIGITAL_IN_STATUS
    1,  // SET_PIN_DIGITAL_IN
    1,  // SET_CHANGE_NOTIFY
    0,  // REGISTER_PERIODIC_DIGITAL_SAMPLING
    0,  // RESERVED
    1,  // REPORT_ANALOG_IN_FORMAT (trailer follows)
    1,  // REPORT_ANALOG_IN_STATUS (trailer follows)
    2,  // UART_REPORT_TX_STATUS
    1,  // SET_PIN_ANALOG_IN
    2,  // UART_DATA (trailer follows)
    3,  // UART_CONFIG
    2,  // SET_PIN_UART_RX
    2,  // SET_PIN_UART_TX
];

/// Largest fixed argument block in either direction.
pub const MAX_FIXED_ARG_SIZE: usize = 16;

/// Largest variable trailer in either direction (255 analog samples).
pub const MAX_TRAILER_SIZE: usize = 255 * 2;

/// Largest complete message in either direction.
pub const MAX_MESSAGE_SIZE: usize = 1 + MAX_FIXED_ARG_SIZE + MAX_TRAILER_SIZE;

/// A message type tag.
///
/// The same numeric tag identifies an incoming command and an outgoing
/// report. Variants are named after the incoming meaning; the associated
/// constants name the outgoing meaning where it differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MessageType {
    HardReset = 0,
    SoftReset = 1,
    SetPinDigitalOut = 2,
    SetDigitalOutLevel = 3,
    SetPinDigitalIn = 4,
    SetChangeNotify = 5,
    RegisterPeriodicDigitalSampling = 6,
    Reserved = 7,
    SetPinPwm = 8,
    SetPwmDutyCycle = 9,
    SetPwmPeriod = 10,
    SetPinAnalogIn = 11,
    UartData = 12,
    UartConfig = 13,
    SetPinUartRx = 14,
    SetPinUartTx = 15,
}

impl MessageType {
    pub const ESTABLISH_CONNECTION: Self = Self::HardReset;
    pub const REPORT_DIGITAL_IN_STATUS: Self = Self::SetDigitalOutLevel;
    pub const REPORT_ANALOG_IN_FORMAT: Self = Self::SetPinPwm;
    pub const REPORT_ANALOG_IN_STATUS: Self = Self::SetPwmDutyCycle;
    pub const UART_REPORT_TX_STATUS: Self = Self::SetPwmPeriod;

    /// All declared types in tag order.
    pub const ALL: [Self; MESSAGE_TYPE_COUNT] = [
        Self::HardReset,
        Self::SoftReset,
        Self::SetPinDigitalOut,
        Self::SetDigitalOutLevel,
        Self::SetPinDigitalIn,
        Self::SetChangeNotify,
        Self::RegisterPeriodicDigitalSampling,
        Self::Reserved,
        Self::SetPinPwm,
        Self::SetPwmDutyCycle,
        Self::SetPwmPeriod,
        Self::SetPinAnalogIn,
        Self::UartData,
        Self::UartConfig,
        Self::SetPinUartRx,
        Self::SetPinUartTx,
    ];

    /// The wire tag.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Fixed argument size of this type as an incoming command.
    pub const fn incoming_arg_size(self) -> usize {
        INCOMING_ARG_SIZE[self as usize] as usize
    }

    /// Fixed argument size of this type as an outgoing message.
    pub const fn outgoing_arg_size(self) -> usize {
        OUTGOING_ARG_SIZE[self as usize] as usize
    }

    /// Protocol name of the incoming command.
    pub const fn incoming_name(self) -> &'static str {
        match self {
            Self::HardReset => "HARD_RESET",
            Self::SoftReset => "SOFT_RESET",
            Self::SetPinDigitalOut => "SET_PIN_DIGITAL_OUT",
            Self::SetDigitalOutLevel => "SET_DIGITAL_OUT_LEVEL",
            Self::SetPinDigitalIn => "SET_PIN_DIGITAL_IN",
            Self::SetChangeNotify => "SET_CHANGE_NOTIFY",
            Self::RegisterPeriodicDigitalSampling => "REGISTER_PERIODIC_DIGITAL_SAMPLING",
            Self::Reserved => "RESERVED",
            Self::SetPinPwm => "SET_PIN_PWM",
            Self::SetPwmDutyCycle => "SET_PWM_DUTY_CYCLE",
            Self::SetPwmPeriod => "SET_PWM_PERIOD",
            Self::SetPinAnalogIn => "SET_PIN_ANALOG_IN",
            Self::UartData => "UART_DATA",
            Self::UartConfig => "UART_CONFIG",
            Self::SetPinUartRx => "SET_PIN_UART_RX",
            Self::SetPinUartTx => "SET_PIN_UART_TX",
        }
    }

    /// Protocol name of the outgoing message.
    pub const fn outgoing_name(self) -> &'static str {
        match self {
            Self::HardReset => "ESTABLISH_CONNECTION",
            Self::SetDigitalOutLevel => "REPORT_DIGITAL_IN_STATUS",
            Self::SetPinPwm => "REPORT_ANALOG_IN_FORMAT",
            Self::SetPwmDutyCycle => "REPORT_ANALOG_IN_STATUS",
            Self::SetPwmPeriod => "UART_REPORT_TX_STATUS",
            other => other.incoming_name(),
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(tag as usize)
            .copied()
            .ok_or(DecodeError::UnknownMessageType(tag))
    }
}

impl From<MessageType> for u8 {
    fn from(ty: MessageType) -> Self {
        ty.tag()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.incoming_name(), self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_try_from() {
        for (index, ty) in MessageType::ALL.iter().enumerate() {
            assert_eq!(ty.tag() as usize, index);
            assert_eq!(MessageType::try_from(index as u8).unwrap(), *ty);
        }
    }

    #[test]
    fn undeclared_tags_are_rejected() {
        for tag in [16u8, 17, 0x7F, 0xFF] {
            assert!(matches!(
                MessageType::try_from(tag),
                Err(DecodeError::UnknownMessageType(t)) if t == tag
            ));
        }
    }

    #[test]
    fn table_values_are_pinned() {
        assert_eq!(
            INCOMING_ARG_SIZE,
            [4, 0, 1, 1, 1, 1, 0, 0, 2, 3, 3, 1, 2, 3, 2, 2]
        );
        assert_eq!(
            OUTGOING_ARG_SIZE,
            [16, 0, 1, 1, 1, 1, 0, 0, 1, 1, 2, 1, 2, 3, 2, 2]
        );
    }

    #[test]
    fn max_fixed_size_covers_both_tables() {
        let max = INCOMING_ARG_SIZE
            .iter()
            .chain(OUTGOING_ARG_SIZE.iter())
            .copied()
            .max()
            .unwrap();
        assert_eq!(max as usize, MAX_FIXED_ARG_SIZE);
    }

    #[test]
    fn outgoing_names_differ_only_where_payloads_differ() {
        assert_eq!(
            MessageType::ESTABLISH_CONNECTION.outgoing_name(),
            "ESTABLISH_CONNECTION"
        );
        assert_eq!(MessageType::UartConfig.outgoing_name(), "UART_CONFIG");
        assert_eq!(
            MessageType::UART_REPORT_TX_STATUS.incoming_name(),
            "SET_PWM_PERIOD"
        );
    }

    #[test]
    fn display_includes_tag() {
        assert_eq!(MessageType::UartData.to_string(), "UART_DATA(0x0C)");
    }
}
