//! A [`Hardware`] implementation with no hardware behind it.
//!
//! Records every capability call so host tools and tests can inspect what a
//! command stream would have done to a board.

use serde::Serialize;

use crate::config::BoardConfig;
use crate::hardware::{Hardware, PullMode, UartSettings};

/// Bytes each UART drains from its transmit backlog per housekeeping pass.
pub const UART_DRAIN_PER_TASK: u16 = 16;

/// One recorded capability call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HardwareCall {
    HardReset,
    SoftReset,
    SetPinDigitalOut {
        pin: u8,
        value: bool,
        open_drain: bool,
    },
    SetDigitalOutLevel {
        pin: u8,
        value: bool,
    },
    SetPinDigitalIn {
        pin: u8,
        pull: PullMode,
    },
    SetChangeNotify {
        pin: u8,
        enabled: bool,
    },
    SetPinPwm {
        pin: u8,
        pwm: Option<u8>,
    },
    SetPwmDutyCycle {
        pwm: u8,
        dc: u16,
        fraction: u8,
    },
    SetPwmPeriod {
        pwm: u8,
        period: u16,
        scale256: bool,
    },
    SetPinAnalogIn {
        pin: u8,
    },
    UartTransmit {
        uart: u8,
        data: Vec<u8>,
    },
    UartConfig {
        uart: u8,
        settings: UartSettings,
    },
    SetPinUartRx {
        pin: u8,
        uart: u8,
        enable: bool,
    },
    SetPinUartTx {
        pin: u8,
        uart: u8,
        enable: bool,
    },
}

/// Simulated board state.
#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    calls: Vec<HardwareCall>,
    input_levels: Vec<bool>,
    tx_backlog: Vec<u16>,
    hard_resets: u32,
}

impl SimulatedBoard {
    pub fn new(board: BoardConfig) -> Self {
        Self {
            calls: Vec::new(),
            input_levels: vec![false; board.num_pins as usize],
            tx_backlog: vec![0; board.num_uarts as usize],
            hard_resets: 0,
        }
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> &[HardwareCall] {
        &self.calls
    }

    /// Drain the recorded calls.
    pub fn take_calls(&mut self) -> Vec<HardwareCall> {
        std::mem::take(&mut self.calls)
    }

    /// Drive the level a digital input reads as. Out-of-range pins are ignored.
    pub fn set_input_level(&mut self, pin: u8, level: bool) {
        if let Some(slot) = self.input_levels.get_mut(pin as usize) {
            *slot = level;
        }
    }

    /// How many times the board was hard reset.
    pub fn hard_resets(&self) -> u32 {
        self.hard_resets
    }
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

impl Hardware for SimulatedBoard {
    fn hard_reset(&mut self) {
        self.hard_resets += 1;
        self.calls.push(HardwareCall::HardReset);
    }

    fn soft_reset(&mut self) {
        self.input_levels.fill(false);
        self.tx_backlog.fill(0);
        self.calls.push(HardwareCall::SoftReset);
    }

    fn set_pin_digital_out(&mut self, pin: u8, value: bool, open_drain: bool) {
        self.calls.push(HardwareCall::SetPinDigitalOut {
            pin,
            value,
            open_drain,
        });
    }

    fn set_digital_out_level(&mut self, pin: u8, value: bool) {
        self.calls
            .push(HardwareCall::SetDigitalOutLevel { pin, value });
    }

    fn set_pin_digital_in(&mut self, pin: u8, pull: PullMode) {
        self.calls.push(HardwareCall::SetPinDigitalIn { pin, pull });
    }

    fn set_change_notify(&mut self, pin: u8, enabled: bool) {
        self.calls
            .push(HardwareCall::SetChangeNotify { pin, enabled });
    }

    fn digital_in_level(&mut self, pin: u8) -> bool {
        self.input_levels
            .get(pin as usize)
            .copied()
            .unwrap_or(false)
    }

    fn set_pin_pwm(&mut self, pin: u8, pwm: Option<u8>) {
        self.calls.push(HardwareCall::SetPinPwm { pin, pwm });
    }

    fn set_pwm_duty_cycle(&mut self, pwm: u8, dc: u16, fraction: u8) {
        self.calls
            .push(HardwareCall::SetPwmDutyCycle { pwm, dc, fraction });
    }

    fn set_pwm_period(&mut self, pwm: u8, period: u16, scale256: bool) {
        self.calls.push(HardwareCall::SetPwmPeriod {
            pwm,
            period,
            scale256,
        });
    }

    fn set_pin_analog_in(&mut self, pin: u8) {
        self.calls.push(HardwareCall::SetPinAnalogIn { pin });
    }

    fn uart_transmit(&mut self, uart: u8, data: &[u8]) {
        if let Some(backlog) = self.tx_backlog.get_mut(uart as usize) {
            *backlog = backlog.saturating_add(data.len() as u16);
        }
        self.calls.push(HardwareCall::UartTransmit {
            uart,
            data: data.to_vec(),
        });
    }

    fn uart_config(&mut self, uart: u8, settings: UartSettings) {
        self.calls.push(HardwareCall::UartConfig { uart, settings });
    }

    fn uart_tx_remaining(&mut self, uart: u8) -> u16 {
        self.tx_backlog.get(uart as usize).copied().unwrap_or(0)
    }

    fn set_pin_uart_rx(&mut self, pin: u8, uart: u8, enable: bool) {
        self.calls
            .push(HardwareCall::SetPinUartRx { pin, uart, enable });
    }

    fn set_pin_uart_tx(&mut self, pin: u8, uart: u8, enable: bool) {
        self.calls
            .push(HardwareCall::SetPinUartTx { pin, uart, enable });
    }

    fn uart_tasks(&mut self) {
        for backlog in &mut self.tx_backlog {
            *backlog = backlog.saturating_sub(UART_DRAIN_PER_TASK);
        }
    }
}
