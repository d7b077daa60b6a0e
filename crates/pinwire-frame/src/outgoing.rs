use bytes::{BufMut, BytesMut};

use crate::args::*;
use crate::error::Result;
use crate::message_type::MessageType;

/// A message sent by the device to the host.
///
/// Commands that are echoed back share their payload shape with
/// [`crate::IncomingMessage`]; the remaining variants exist only outbound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    EstablishConnection(EstablishConnectionArgs),
    SoftReset,
    SetPinDigitalOut(SetPinDigitalOutArgs),
    ReportDigitalInStatus(ReportDigitalInStatusArgs),
    SetPinDigitalIn(SetPinDigitalInArgs),
    SetChangeNotify(SetChangeNotifyArgs),
    RegisterPeriodicDigitalSampling,
    Reserved,
    ReportAnalogInFormat(ReportAnalogInFormatArgs),
    ReportAnalogInStatus(ReportAnalogInStatusArgs),
    UartReportTxStatus(UartReportTxStatusArgs),
    SetPinAnalogIn(SetPinAnalogInArgs),
    UartData(UartDataArgs),
    UartConfig(UartConfigArgs),
    SetPinUartRx(SetPinUartArgs),
    SetPinUartTx(SetPinUartArgs),
}

impl OutgoingMessage {
    /// The type tag of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::EstablishConnection(_) => MessageType::ESTABLISH_CONNECTION,
            Self::SoftReset => MessageType::SoftReset,
            Self::SetPinDigitalOut(_) => MessageType::SetPinDigitalOut,
            Self::ReportDigitalInStatus(_) => MessageType::REPORT_DIGITAL_IN_STATUS,
            Self::SetPinDigitalIn(_) => MessageType::SetPinDigitalIn,
            Self::SetChangeNotify(_) => MessageType::SetChangeNotify,
            Self::RegisterPeriodicDigitalSampling => MessageType::RegisterPeriodicDigitalSampling,
            Self::Reserved => MessageType::Reserved,
            Self::ReportAnalogInFormat(_) => MessageType::REPORT_ANALOG_IN_FORMAT,
            Self::ReportAnalogInStatus(_) => MessageType::REPORT_ANALOG_IN_STATUS,
            Self::UartReportTxStatus(_) => MessageType::UART_REPORT_TX_STATUS,
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
            MessageType::REPORT_ANALOG_IN_FORMAT => ReportAnalogInFormatArgs::trailer_size(fixed),
            MessageType::REPORT_ANALOG_IN_STATUS => ReportAnalogInStatusArgs::trailer_size(fixed),
            MessageType::UartData => UartDataArgs::trailer_size(fixed),
            _ => 0,
        }
    }

    /// Build a message from its fixed block and trailer.
    ///
    /// The slices must be exactly as long as the outgoing table and
    /// [`OutgoingMessage::trailer_size`] say.
    pub fn parse(ty: MessageType, fixed: &[u8], trailer: &[u8]) -> Self {
        match ty {
            MessageType::HardReset => {
                Self::EstablishConnection(EstablishConnectionArgs::decode(fixed))
            }
            MessageType::SoftReset => Self::SoftReset,
            MessageType::SetPinDigitalOut => {
                Self::SetPinDigitalOut(SetPinDigitalOutArgs::decode(fixed))
            }
            MessageType::SetDigitalOutLevel => {
                Self::ReportDigitalInStatus(ReportDigitalInStatusArgs::decode(fixed))
            }
            MessageType::SetPinDigitalIn => {
                Self::SetPinDigitalIn(SetPinDigitalInArgs::decode(fixed))
            }
            MessageType::SetChangeNotify => {
                Self::SetChangeNotify(SetChangeNotifyArgs::decode(fixed))
            }
            MessageType::RegisterPeriodicDigitalSampling => Self::RegisterPeriodicDigitalSampling,
            MessageType::Reserved => Self::Reserved,
            MessageType::SetPinPwm => {
                Self::ReportAnalogInFormat(ReportAnalogInFormatArgs::decode(trailer))
            }
            MessageType::SetPwmDutyCycle => {
                Self::ReportAnalogInStatus(ReportAnalogInStatusArgs::decode(trailer))
            }
            MessageType::SetPwmPeriod => {
                Self::UartReportTxStatus(UartReportTxStatusArgs::decode(fixed))
            }
            MessageType::SetPinAnalogIn => Self::SetPinAnalogIn(SetPinAnalogInArgs::decode(fixed)),
            MessageType::UartData => Self::UartData(UartDataArgs::decode(fixed, trailer)),
            MessageType::UartConfig => Self::UartConfig(UartConfigArgs::decode(fixed)),
            MessageType::SetPinUartRx => Self::SetPinUartRx(SetPinUartArgs::decode(fixed)),
            MessageType::SetPinUartTx => Self::SetPinUartTx(SetPinUartArgs::decode(fixed)),
        }
    }

    /// Whether this message carries a variable trailer.
    pub fn has_trailer(&self) -> bool {
        matches!(
            self,
            Self::ReportAnalogInFormat(_) | Self::ReportAnalogInStatus(_) | Self::UartData(_)
        )
    }

    /// Encode the type tag and fixed argument block.
    ///
    /// On error nothing is appended to `dst`.
    pub fn encode_header(&self, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        dst.put_u8(self.message_type().tag());
        let outcome = match self {
            Self::ReportAnalogInFormat(args) => args.encode_header(dst),
            Self::ReportAnalogInStatus(args) => args.encode_header(dst),
            Self::UartData(args) => args.encode_header(dst),
            fixed => {
                fixed.encode_fixed(dst);
                Ok(())
            }
        };
        if outcome.is_err() {
            dst.truncate(start);
        }
        outcome
    }

    fn encode_fixed(&self, dst: &mut BytesMut) {
        match self {
            Self::EstablishConnection(args) => args.encode(dst),
            Self::SetPinDigitalOut(args) => args.encode(dst),
            Self::ReportDigitalInStatus(args) => args.encode(dst),
            Self::SetPinDigitalIn(args) => args.encode(dst),
            Self::SetChangeNotify(args) => args.encode(dst),
            Self::UartReportTxStatus(args) => args.encode(dst),
            Self::SetPinAnalogIn(args) => args.encode(dst),
            Self::UartConfig(args) => args.encode(dst),
            Self::SetPinUartRx(args) | Self::SetPinUartTx(args) => args.encode(dst),
            Self::SoftReset
            | Self::RegisterPeriodicDigitalSampling
            | Self::Reserved
            | Self::ReportAnalogInFormat(_)
            | Self::ReportAnalogInStatus(_)
            | Self::UartData(_) => {}
        }
    }

    /// Encode the variable trailer, if this message has one.
    pub fn encode_trailer(&self, dst: &mut BytesMut) {
        match self {
            Self::ReportAnalogInFormat(args) => args.encode_trailer(dst),
            Self::ReportAnalogInStatus(args) => args.encode_trailer(dst),
            Self::UartData(args) => dst.put_slice(&args.data),
            _ => {}
        }
    }

    /// Encode the complete message.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        self.encode_header(dst)?;
        self.encode_trailer(dst);
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(1 + self.message_type().outgoing_arg_size());
        self.encode(&mut buf)?;
        Ok(buf)
    }
}
