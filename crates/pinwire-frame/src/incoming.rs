use bytes::{BufMut, BytesMut};

use crate::args::*;
use crate::error::Result;
use crate::message_type::MessageType;

/// A command sent by the host to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    HardReset(HardResetArgs),
    SoftReset,
    SetPinDigitalOut(SetPinDigitalOutArgs),
    SetDigitalOutLevel(SetDigitalOutLevelArgs),
    SetPinDigitalIn(SetPinDigitalInArgs),
    SetChangeNotify(SetChangeNotifyArgs),
    RegisterPeriodicDigitalSampling,
    Reserved,
    SetPinPwm(SetPinPwmArgs),
    SetPwmDutyCycle(SetPwmDutyCycleArgs),
    SetPwmPeriod(SetPwmPeriodArgs),
    SetPinAnalogIn(SetPinAnalogInArgs),
    UartData(UartDataArgs),
    UartConfig(UartConfigArgs),
    SetPinUartRx(SetPinUartArgs),
    SetPinUartTx(SetPinUartArgs),
}

impl IncomingMessage {
    /// The type tag of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::HardReset(_) => MessageType::HardReset,
            Self::SoftReset => MessageType::SoftReset,
            Self::SetPinDigitalOut(_) => MessageType::SetPinDigitalOut,
            Self::SetDigitalOutLevel(_) => MessageType::SetDigitalOutLevel,
            Self::SetPinDigitalIn(_) => MessageType::SetPinDigitalIn,
            Self::SetChangeNotify(_) => MessageType::SetChangeNotify,
            Self::RegisterPeriodicDigitalSampling => MessageType::RegisterPeriodicDigitalSampling,
            Self::Reserved => MessageType::Reserved,
            Self::SetPinPwm(_) => MessageType::SetPinPwm,
            Self::SetPwmDutyCycle(_) => MessageType::SetPwmDutyCycle,
            Self::SetPwmPeriod(_) => MessageType::SetPwmPeriod,
            Self::SetPinAnalogIn(_) => MessageType::SetPinAnalogIn,
            Self::UartData(_) => MessageType::UartData,
            Self::UartConfig(_) => MessageType::UartConfig,
            Self::SetPinUartRx(_) => MessageType::SetPinUartRx,
            Self::SetPinUartTx(_) => MessageType::SetPinUartTx,
        }
    }

    /// Length of the variable trailer announced by a complete fixed block.
    pub fn trailer_size(ty: MessageType, fixed: &[u8]) -> usize {
        match ty {
            MessageType::UartData => UartDataArgs::trailer_size(fixed),
            _ => 0,
        }
    }

    /// Build a message from its fixed block and trailer.
    ///
    /// The slices must be exactly as long as the incoming table and
    /// [`IncomingMessage::trailer_size`] say.
    pub fn parse(ty: MessageType, fixed: &[u8], trailer: &[u8]) -> Self {
        match ty {
            MessageType::HardReset => Self::HardReset(HardResetArgs::decode(fixed)),
            MessageType::SoftReset => Self::SoftReset,
            MessageType::SetPinDigitalOut => {
                Self::SetPinDigitalOut(SetPinDigitalOutArgs::decode(fixed))
            }
            MessageType::SetDigitalOutLevel => {
                Self::SetDigitalOutLevel(SetDigitalOutLevelArgs::decode(fixed))
            }
            MessageType::SetPinDigitalIn => {
                Self::SetPinDigitalIn(SetPinDigitalInArgs::decode(fixed))
            }
            MessageType::SetChangeNotify => {
                Self::SetChangeNotify(SetChangeNotifyArgs::decode(fixed))
            }
            MessageType::RegisterPeriodicDigitalSampling => Self::RegisterPeriodicDigitalSampling,
            MessageType::Reserved => Self::Reserved,
            MessageType::SetPinPwm => Self::SetPinPwm(SetPinPwmArgs::decode(fixed)),
            MessageType::SetPwmDutyCycle => {
                Self::SetPwmDutyCycle(SetPwmDutyCycleArgs::decode(fixed))
            }
            MessageType::SetPwmPeriod => Self::SetPwmPeriod(SetPwmPeriodArgs::decode(fixed)),
            MessageType::SetPinAnalogIn => Self::SetPinAnalogIn(SetPinAnalogInArgs::decode(fixed)),
            MessageType::UartData => Self::UartData(UartDataArgs::decode(fixed, trailer)),
            MessageType::UartConfig => Self::UartConfig(UartConfigArgs::decode(fixed)),
            MessageType::SetPinUartRx => Self::SetPinUartRx(SetPinUartArgs::decode(fixed)),
            MessageType::SetPinUartTx => Self::SetPinUartTx(SetPinUartArgs::decode(fixed)),
        }
    }

    /// Encode the complete message (type, fixed block, trailer).
    ///
    /// Used on the host side to build command streams.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        dst.put_u8(self.message_type().tag());
        match self {
            Self::HardReset(args) => args.encode(dst),
            Self::SoftReset | Self::RegisterPeriodicDigitalSampling | Self::Reserved => {}
            Self::SetPinDigitalOut(args) => args.encode(dst),
            Self::SetDigitalOutLevel(args) => args.encode(dst),
            Self::SetPinDigitalIn(args) => args.encode(dst),
            Self::SetChangeNotify(args) => args.encode(dst),
            Self::SetPinPwm(args) => args.encode(dst),
            Self::SetPwmDutyCycle(args) => args.encode(dst),
            Self::SetPwmPeriod(args) => args.encode(dst),
            Self::SetPinAnalogIn(args) => args.encode(dst),
            Self::UartData(args) => {
                if let Err(err) = args.encode_header(dst) {
                    dst.truncate(start);
                    return Err(err);
                }
                dst.put_slice(&args.data);
            }
            Self::UartConfig(args) => args.encode(dst),
            Self::SetPinUartRx(args) | Self::SetPinUartTx(args) => args.encode(dst),
        }
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(1 + self.message_type().incoming_arg_size());
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_type::PROTOCOL_MAGIC;

    fn samples() -> Vec<IncomingMessage> {
        vec![
            IncomingMessage::HardReset(HardResetArgs {
                magic: PROTOCOL_MAGIC,
            }),
            IncomingMessage::SoftReset,
            IncomingMessage::SetPinDigitalOut(SetPinDigitalOutArgs {
                pin: 47,
                value: true,
                open_drain: true,
            }),
            IncomingMessage::SetDigitalOutLevel(SetDigitalOutLevelArgs {
                pin: 12,
                value: true,
            }),
            IncomingMessage::SetPinDigitalIn(SetPinDigitalInArgs { pin: 9, pull: 2 }),
            IncomingMessage::SetChangeNotify(SetChangeNotifyArgs { pin: 5, cn: true }),
            IncomingMessage::RegisterPeriodicDigitalSampling,
            IncomingMessage::Reserved,
            IncomingMessage::SetPinPwm(SetPinPwmArgs { pin: 10, pwm_num: 3 }),
            IncomingMessage::SetPwmDutyCycle(SetPwmDutyCycleArgs {
                pwm_num: 8,
                dc: 40_000,
                fraction: 3,
            }),
            IncomingMessage::SetPwmPeriod(SetPwmPeriodArgs {
                pwm_num: 1,
                period: 999,
                scale256: true,
            }),
            IncomingMessage::SetPinAnalogIn(SetPinAnalogInArgs { pin: 33 }),
            IncomingMessage::UartData(UartDataArgs {
                uart_num: 2,
                data: b"hello".to_vec(),
            }),
            IncomingMessage::UartConfig(UartConfigArgs {
                uart_num: 3,
                rate: 416,
                speed4x: false,
                two_stop_bits: true,
                parity: 2,
            }),
            IncomingMessage::SetPinUartRx(SetPinUartArgs {
                pin: 6,
                uart_num: 1,
                enable: true,
            }),
            IncomingMessage::SetPinUartTx(SetPinUartArgs {
                pin: 7,
                uart_num: 0,
                enable: false,
            }),
        ]
    }

    #[test]
    fn encoded_length_matches_table() {
        for msg in samples() {
            let ty = msg.message_type();
            let bytes = msg.to_bytes().unwrap();
            let fixed = &bytes[1..1 + ty.incoming_arg_size()];
            let expected = 1 + ty.incoming_arg_size() + IncomingMessage::trailer_size(ty, fixed);
            assert_eq!(bytes.len(), expected, "{ty}");
            assert_eq!(bytes[0], ty.tag());
        }
    }

    #[test]
    fn parse_restores_every_variant() {
        for msg in samples() {
            let ty = msg.message_type();
            let bytes = msg.to_bytes().unwrap();
            let split = 1 + ty.incoming_arg_size();
            let parsed = IncomingMessage::parse(ty, &bytes[1..split], &bytes[split..]);
            assert_eq!(parsed, msg);
        }
    }

    #[test]
    fn uart_data_size_field_is_length_minus_one() {
        let msg = IncomingMessage::UartData(UartDataArgs {
            uart_num: 0,
            data: vec![0xAA, 0xBB, 0xCC],
        });
        assert_eq!(msg.to_bytes().unwrap().as_ref(), &[12, 0, 2, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn failed_encode_leaves_buffer_untouched() {
        let mut buf = BytesMut::from(&[1u8, 2][..]);
        let msg = IncomingMessage::UartData(UartDataArgs {
            uart_num: 0,
            data: Vec::new(),
        });
        assert!(msg.encode(&mut buf).is_err());
        assert_eq!(buf.as_ref(), &[1, 2]);
    }
}
