//! The capability surface the dispatcher drives.
//!
//! Every call is made only after the command's fields were validated against
//! the [`BoardConfig`](crate::BoardConfig), so implementations may treat
//! their arguments as in range and need not report failure.

use serde::{Deserialize, Serialize};

/// Input pull configuration for SET_PIN_DIGITAL_IN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullMode {
    Floating,
    Up,
    Down,
}

impl TryFrom<u8> for PullMode {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0 => Ok(Self::Floating),
            1 => Ok(Self::Up),
            2 => Ok(Self::Down),
            other => Err(other),
        }
    }
}

/// UART parity for UART_CONFIG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl TryFrom<u8> for Parity {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Even),
            2 => Ok(Self::Odd),
            other => Err(other),
        }
    }
}

/// UART line settings from UART_CONFIG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UartSettings {
    /// Baud rate generator value.
    pub rate: u16,
    pub speed4x: bool,
    pub two_stop_bits: bool,
    pub parity: Parity,
}

/// Pin-level hardware drivers.
pub trait Hardware {
    /// Reboot the controller. On a real board this does not return.
    fn hard_reset(&mut self);

    /// Return every pin and peripheral to its power-on state.
    fn soft_reset(&mut self);

    fn set_pin_digital_out(&mut self, pin: u8, value: bool, open_drain: bool);

    fn set_digital_out_level(&mut self, pin: u8, value: bool);

    fn set_pin_digital_in(&mut self, pin: u8, pull: PullMode);

    fn set_change_notify(&mut self, pin: u8, enabled: bool);

    /// Current level of a digital input.
    fn digital_in_level(&mut self, pin: u8) -> bool;

    /// Bind `pin` to a PWM channel, or unbind it with `None`.
    fn set_pin_pwm(&mut self, pin: u8, pwm: Option<u8>);

    fn set_pwm_duty_cycle(&mut self, pwm: u8, dc: u16, fraction: u8);

    fn set_pwm_period(&mut self, pwm: u8, period: u16, scale256: bool);

    fn set_pin_analog_in(&mut self, pin: u8);

    /// Queue `data` (1 to 256 bytes) for transmission on a UART.
    fn uart_transmit(&mut self, uart: u8, data: &[u8]);

    fn uart_config(&mut self, uart: u8, settings: UartSettings);

    /// Bytes still waiting in a UART's transmit buffer.
    fn uart_tx_remaining(&mut self, uart: u8) -> u16;

    fn set_pin_uart_rx(&mut self, pin: u8, uart: u8, enable: bool);

    fn set_pin_uart_tx(&mut self, pin: u8, uart: u8, enable: bool);

    /// Periodic UART housekeeping, run before each transmit pump step.
    fn uart_tasks(&mut self) {}
}

impl<H: Hardware + ?Sized> Hardware for &mut H {
    fn hard_reset(&mut self) {
        (**self).hard_reset()
    }

    fn soft_reset(&mut self) {
        (**self).soft_reset()
    }

    fn set_pin_digital_out(&mut self, pin: u8, value: bool, open_drain: bool) {
        (**self).set_pin_digital_out(pin, value, open_drain)
    }

    fn set_digital_out_level(&mut self, pin: u8, value: bool) {
        (**self).set_digital_out_level(pin, value)
    }

    fn set_pin_digital_in(&mut self, pin: u8, pull: PullMode) {
        (**self).set_pin_digital_in(pin, pull)
    }

    fn set_change_notify(&mut self, pin: u8, enabled: bool) {
        (**self).set_change_notify(pin, enabled)
    }

    fn digital_in_level(&mut self, pin: u8) -> bool {
        (**self).digital_in_level(pin)
    }

    fn set_pin_pwm(&mut self, pin: u8, pwm: Option<u8>) {
        (**self).set_pin_pwm(pin, pwm)
    }

    fn set_pwm_duty_cycle(&mut self, pwm: u8, dc: u16, fraction: u8) {
        (**self).set_pwm_duty_cycle(pwm, dc, fraction)
    }

    fn set_pwm_period(&mut self, pwm: u8, period: u16, scale256: bool) {
        (**self).set_pwm_period(pwm, period, scale256)
    }

    fn set_pin_analog_in(&mut self, pin: u8) {
        (**self).set_pin_analog_in(pin)
    }

    fn uart_transmit(&mut self, uart: u8, data: &[u8]) {
        (**self).uart_transmit(uart, data)
    }

    fn uart_config(&mut self, uart: u8, settings: UartSettings) {
        (**self).uart_config(uart, settings)
    }

    fn uart_tx_remaining(&mut self, uart: u8) -> u16 {
        (**self).uart_tx_remaining(uart)
    }

    fn set_pin_uart_rx(&mut self, pin: u8, uart: u8, enable: bool) {
        (**self).set_pin_uart_rx(pin, uart, enable)
    }

    fn set_pin_uart_tx(&mut self, pin: u8, uart: u8, enable: bool) {
        (**self).set_pin_uart_tx(pin, uart, enable)
    }

    fn uart_tasks(&mut self) {
        (**self).uart_tasks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_mode_rejects_reserved_encoding() {
        assert_eq!(PullMode::try_from(1), Ok(PullMode::Up));
        assert_eq!(PullMode::try_from(3), Err(3));
    }

    #[test]
    fn parity_rejects_reserved_encoding() {
        assert_eq!(Parity::try_from(2), Ok(Parity::Odd));
        assert_eq!(Parity::try_from(3), Err(3));
    }
}
