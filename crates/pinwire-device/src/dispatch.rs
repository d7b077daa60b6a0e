//! Validation and execution of decoded commands.
//!
//! Each handler checks every field first, then calls the hardware, then
//! queues the echo and any status report. A field that fails its check stops
//! the handler before the hardware is touched.

use pinwire_frame::{IncomingMessage, MessageType, PROTOCOL_MAGIC, PWM_DISABLE};
use tracing::{debug, warn};

use crate::config::BoardConfig;
use crate::error::DispatchError;
use crate::hardware::{Hardware, Parity, PullMode, UartSettings};
use crate::sender::MessageSender;

type Result<T> = std::result::Result<T, DispatchError>;

/// Routes commands to the hardware and produces echoes and reports.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    board: BoardConfig,
}

impl Dispatcher {
    pub fn new(board: BoardConfig) -> Self {
        Self { board }
    }

    /// The board limits commands are checked against.
    pub fn board(&self) -> &BoardConfig {
        &self.board
    }

    /// Handle one complete command.
    ///
    /// `wire` is the exact byte image the command arrived as; echoes send it
    /// back unchanged.
    pub fn dispatch<H>(
        &self,
        hardware: &mut H,
        sender: &MessageSender,
        message: &IncomingMessage,
        wire: &[u8],
    ) -> Result<()>
    where
        H: Hardware + ?Sized,
    {
        let ty = message.message_type();
        let outcome = self.execute(hardware, sender, message, wire);
        match &outcome {
            Ok(()) => debug!(ty = %ty, "command dispatched"),
            Err(err) => warn!(ty = %ty, error = %err, "command refused"),
        }
        outcome
    }

    fn execute<H>(
        &self,
        hw: &mut H,
        sender: &MessageSender,
        message: &IncomingMessage,
        wire: &[u8],
    ) -> Result<()>
    where
        H: Hardware + ?Sized,
    {
        let echo = || sender.send_raw(wire).map_err(DispatchError::from);

        match message {
            IncomingMessage::HardReset(args) => {
                if args.magic != PROTOCOL_MAGIC {
                    return Err(DispatchError::BadMagic(args.magic));
                }
                hw.hard_reset();
                Ok(())
            }
            IncomingMessage::SoftReset => {
                hw.soft_reset();
                echo()
            }
            IncomingMessage::SetPinDigitalOut(args) => {
                self.check_pin(args.pin)?;
                hw.set_pin_digital_out(args.pin, args.value, args.open_drain);
                echo()
            }
            IncomingMessage::SetDigitalOutLevel(args) => {
                self.check_pin(args.pin)?;
                hw.set_digital_out_level(args.pin, args.value);
                Ok(())
            }
            IncomingMessage::SetPinDigitalIn(args) => {
                self.check_pin(args.pin)?;
                let pull = PullMode::try_from(args.pull).map_err(|value| invalid("pull", value, 3))?;
                hw.set_pin_digital_in(args.pin, pull);
                echo()
            }
            IncomingMessage::SetChangeNotify(args) => {
                self.check_pin(args.pin)?;
                hw.set_change_notify(args.pin, args.cn);
                echo()?;
                if args.cn {
                    let level = hw.digital_in_level(args.pin);
                    sender.report_digital_in_status(args.pin, level)?;
                }
                Ok(())
            }
            IncomingMessage::SetPinPwm(args) => {
                self.check_pin(args.pin)?;
                let pwm = if args.pwm_num == PWM_DISABLE {
                    None
                } else {
                    self.check_pwm(args.pwm_num)?;
                    Some(args.pwm_num)
                };
                hw.set_pin_pwm(args.pin, pwm);
                Ok(())
            }
            IncomingMessage::SetPwmDutyCycle(args) => {
                self.check_pwm(args.pwm_num)?;
                hw.set_pwm_duty_cycle(args.pwm_num, args.dc, args.fraction);
                Ok(())
            }
            IncomingMessage::SetPwmPeriod(args) => {
                self.check_pwm(args.pwm_num)?;
                hw.set_pwm_period(args.pwm_num, args.period, args.scale256);
                Ok(())
            }
            IncomingMessage::SetPinAnalogIn(args) => {
                self.check_pin(args.pin)?;
                hw.set_pin_analog_in(args.pin);
                echo()
            }
            IncomingMessage::UartData(args) => {
                self.check_uart(args.uart_num)?;
                hw.uart_transmit(args.uart_num, &args.data);
                Ok(())
            }
            IncomingMessage::UartConfig(args) => {
                self.check_uart(args.uart_num)?;
                let parity =
                    Parity::try_from(args.parity).map_err(|value| invalid("parity", value, 3))?;
                hw.uart_config(
                    args.uart_num,
                    UartSettings {
                        rate: args.rate,
                        speed4x: args.speed4x,
                        two_stop_bits: args.two_stop_bits,
                        parity,
                    },
                );
                echo()?;
                let remaining = hw.uart_tx_remaining(args.uart_num);
                sender.report_uart_tx_status(args.uart_num, remaining)?;
                Ok(())
            }
            IncomingMessage::SetPinUartRx(args) => {
                self.check_pin(args.pin)?;
                self.check_uart(args.uart_num)?;
                hw.set_pin_uart_rx(args.pin, args.uart_num, args.enable);
                echo()
            }
            IncomingMessage::SetPinUartTx(args) => {
                self.check_pin(args.pin)?;
                self.check_uart(args.uart_num)?;
                hw.set_pin_uart_tx(args.pin, args.uart_num, args.enable);
                echo()
            }
            IncomingMessage::RegisterPeriodicDigitalSampling => Err(DispatchError::Unsupported(
                MessageType::RegisterPeriodicDigitalSampling,
            )),
            IncomingMessage::Reserved => Err(DispatchError::Unsupported(MessageType::Reserved)),
        }
    }

    fn check_pin(&self, pin: u8) -> Result<()> {
        below("pin", pin, self.board.num_pins)
    }

    fn check_pwm(&self, pwm_num: u8) -> Result<()> {
        below("pwm", pwm_num, self.board.num_pwms)
    }

    fn check_uart(&self, uart_num: u8) -> Result<()> {
        below("uart", uart_num, self.board.num_uarts)
    }
}

fn below(field: &'static str, value: u8, limit: u8) -> Result<()> {
    if value < limit {
        Ok(())
    } else {
        Err(invalid(field, value, limit))
    }
}

fn invalid(field: &'static str, value: u8, limit: u8) -> DispatchError {
    DispatchError::InvalidField {
        field,
        value,
        limit,
    }
}
