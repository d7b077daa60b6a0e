//! Fixed argument blocks.
//!
//! Multi-byte integers are little-endian. Bit fields are packed least
//! significant bit first; unnamed bits are written as zero and ignored when
//! read. Field values are carried raw: range checks belong to the dispatcher.

use bytes::{Buf, BufMut, BytesMut};

const PIN_MASK: u8 = 0x3F;

fn bit(byte: u8, n: u8) -> bool {
    byte & (1 << n) != 0
}

fn flag(value: bool, n: u8) -> u8 {
    u8::from(value) << n
}

/// HARD_RESET arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardResetArgs {
    pub magic: u32,
}

impl HardResetArgs {
    pub(crate) fn decode(mut src: &[u8]) -> Self {
        Self {
            magic: src.get_u32_le(),
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.magic);
    }
}

/// SET_PIN_DIGITAL_OUT arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPinDigitalOutArgs {
    pub pin: u8,
    pub value: bool,
    pub open_drain: bool,
}

impl SetPinDigitalOutArgs {
    pub(crate) fn decode(src: &[u8]) -> Self {
        let b = src[0];
        Self {
            open_drain: bit(b, 0),
            value: bit(b, 1),
            pin: b >> 2,
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(flag(self.open_drain, 0) | flag(self.value, 1) | (self.pin & PIN_MASK) << 2);
    }
}

/// SET_DIGITAL_OUT_LEVEL arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetDigitalOutLevelArgs {
    pub pin: u8,
    pub value: bool,
}

impl SetDigitalOutLevelArgs {
    pub(crate) fn decode(src: &[u8]) -> Self {
        Self {
            value: bit(src[0], 0),
            pin: src[0] >> 2,
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(flag(self.value, 0) | (self.pin & PIN_MASK) << 2);
    }
}

/// SET_PIN_DIGITAL_IN arguments. `pull` is 0 floating, 1 pull-up, 2 pull-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPinDigitalInArgs {
    pub pin: u8,
    pub pull: u8,
}

impl SetPinDigitalInArgs {
    pub(crate) fn decode(src: &[u8]) -> Self {
        Self {
            pull: src[0] & 0x03,
            pin: src[0] >> 2,
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8((self.pull & 0x03) | (self.pin & PIN_MASK) << 2);
    }
}

/// SET_CHANGE_NOTIFY arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetChangeNotifyArgs {
    pub pin: u8,
    pub cn: bool,
}

impl SetChangeNotifyArgs {
    pub(crate) fn decode(src: &[u8]) -> Self {
        Self {
            cn: bit(src[0], 0),
            pin: src[0] >> 2,
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(flag(self.cn, 0) | (self.pin & PIN_MASK) << 2);
    }
}

/// SET_PIN_PWM arguments. `pwm_num == PWM_DISABLE` unbinds the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPinPwmArgs {
    pub pin: u8,
    pub pwm_num: u8,
}

impl SetPinPwmArgs {
    pub(crate) fn decode(src: &[u8]) -> Self {
        Self {
            pin: src[0] & PIN_MASK,
            pwm_num: src[1] & 0x0F,
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.pin & PIN_MASK);
        dst.put_u8(self.pwm_num & 0x0F);
    }
}

/// SET_PWM_DUTY_CYCLE arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPwmDutyCycleArgs {
    pub pwm_num: u8,
    pub dc: u16,
    pub fraction: u8,
}

impl SetPwmDutyCycleArgs {
    pub(crate) fn decode(mut src: &[u8]) -> Self {
        let b = src.get_u8();
        Self {
            fraction: b & 0x03,
            pwm_num: (b >> 2) & 0x0F,
            dc: src.get_u16_le(),
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8((self.fraction & 0x03) | (self.pwm_num & 0x0F) << 2);
        dst.put_u16_le(self.dc);
    }
}

/// SET_PWM_PERIOD arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPwmPeriodArgs {
    pub pwm_num: u8,
    pub period: u16,
    pub scale256: bool,
}

impl SetPwmPeriodArgs {
    pub(crate) fn decode(mut src: &[u8]) -> Self {
        let b = src.get_u8();
        Self {
            scale256: bit(b, 0),
            pwm_num: (b >> 1) & 0x0F,
            period: src.get_u16_le(),
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(flag(self.scale256, 0) | (self.pwm_num & 0x0F) << 1);
        dst.put_u16_le(self.period);
    }
}

/// SET_PIN_ANALOG_IN arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPinAnalogInArgs {
    pub pin: u8,
}

impl SetPinAnalogInArgs {
    pub(crate) fn decode(src: &[u8]) -> Self {
        Self {
            pin: src[0] & PIN_MASK,
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.pin & PIN_MASK);
    }
}

/// UART_DATA arguments: the fixed header plus its 1..=256 byte trailer.
///
/// On the wire the size field holds `data.len() - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UartDataArgs {
    pub uart_num: u8,
    pub data: Vec<u8>,
}

impl UartDataArgs {
    pub const MIN_DATA: usize = 1;
    pub const MAX_DATA: usize = 256;

    pub(crate) fn trailer_size(fixed: &[u8]) -> usize {
        fixed[1] as usize + 1
    }

    pub(crate) fn decode(fixed: &[u8], trailer: &[u8]) -> Self {
        Self {
            uart_num: fixed[0] & 0x03,
            data: trailer.to_vec(),
        }
    }

    pub(crate) fn encode_header(&self, dst: &mut BytesMut) -> crate::Result<()> {
        let len = self.data.len();
        if !(Self::MIN_DATA..=Self::MAX_DATA).contains(&len) {
            return Err(crate::FrameError::TrailerLength {
                len,
                min: Self::MIN_DATA,
                max: Self::MAX_DATA,
            });
        }
        dst.put_u8(self.uart_num & 0x03);
        dst.put_u8((len - 1) as u8);
        Ok(())
    }
}

/// UART_CONFIG arguments. `parity` is 0 none, 1 even, 2 odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfigArgs {
    pub uart_num: u8,
    pub rate: u16,
    pub speed4x: bool,
    pub two_stop_bits: bool,
    pub parity: u8,
}

impl UartConfigArgs {
    pub(crate) fn decode(mut src: &[u8]) -> Self {
        let b = src.get_u8();
        Self {
            parity: b & 0x03,
            two_stop_bits: bit(b, 2),
            speed4x: bit(b, 3),
            uart_num: b >> 6,
            rate: src.get_u16_le(),
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(
            (self.parity & 0x03)
                | flag(self.two_stop_bits, 2)
                | flag(self.speed4x, 3)
                | (self.uart_num & 0x03) << 6,
        );
        dst.put_u16_le(self.rate);
    }
}

/// SET_PIN_UART_RX / SET_PIN_UART_TX arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPinUartArgs {
    pub pin: u8,
    pub uart_num: u8,
    pub enable: bool,
}

impl SetPinUartArgs {
    pub(crate) fn decode(src: &[u8]) -> Self {
        Self {
            pin: src[0] & PIN_MASK,
            uart_num: src[1] & 0x03,
            enable: bit(src[1], 7),
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.pin & PIN_MASK);
        dst.put_u8((self.uart_num & 0x03) | flag(self.enable, 7));
    }
}

/// ESTABLISH_CONNECTION arguments, sent once per session by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstablishConnectionArgs {
    pub magic: u32,
    pub hardware: u16,
    pub bootloader: u16,
    pub firmware: u64,
}

impl EstablishConnectionArgs {
    pub(crate) fn decode(mut src: &[u8]) -> Self {
        Self {
            magic: src.get_u32_le(),
            hardware: src.get_u16_le(),
            bootloader: src.get_u16_le(),
            firmware: src.get_u64_le(),
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.magic);
        dst.put_u16_le(self.hardware);
        dst.put_u16_le(self.bootloader);
        dst.put_u64_le(self.firmware);
    }
}

/// REPORT_DIGITAL_IN_STATUS arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportDigitalInStatusArgs {
    pub pin: u8,
    pub level: bool,
}

impl ReportDigitalInStatusArgs {
    pub(crate) fn decode(src: &[u8]) -> Self {
        Self {
            level: bit(src[0], 0),
            pin: src[0] >> 2,
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(flag(self.level, 0) | (self.pin & PIN_MASK) << 2);
    }
}

/// REPORT_ANALOG_IN_FORMAT arguments: the pins whose samples follow in
/// subsequent status reports, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportAnalogInFormatArgs {
    pub pins: Vec<u8>,
}

impl ReportAnalogInFormatArgs {
    pub const MAX_PINS: usize = u8::MAX as usize;

    pub(crate) fn trailer_size(fixed: &[u8]) -> usize {
        fixed[0] as usize
    }

    pub(crate) fn decode(trailer: &[u8]) -> Self {
        Self {
            pins: trailer.to_vec(),
        }
    }

    pub(crate) fn encode_header(&self, dst: &mut BytesMut) -> crate::Result<()> {
        if self.pins.len() > Self::MAX_PINS {
            return Err(crate::FrameError::TrailerLength {
                len: self.pins.len(),
                min: 0,
                max: Self::MAX_PINS,
            });
        }
        dst.put_u8(self.pins.len() as u8);
        Ok(())
    }

    pub(crate) fn encode_trailer(&self, dst: &mut BytesMut) {
        dst.put_slice(&self.pins);
    }
}

/// REPORT_ANALOG_IN_STATUS arguments: one sample per reported pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportAnalogInStatusArgs {
    pub samples: Vec<u16>,
}

impl ReportAnalogInStatusArgs {
    pub const MAX_SAMPLES: usize = u8::MAX as usize;

    pub(crate) fn trailer_size(fixed: &[u8]) -> usize {
        fixed[0] as usize * 2
    }

    pub(crate) fn decode(mut trailer: &[u8]) -> Self {
        let mut samples = Vec::with_capacity(trailer.len() / 2);
        while trailer.remaining() >= 2 {
            samples.push(trailer.get_u16_le());
        }
        Self { samples }
    }

    pub(crate) fn encode_header(&self, dst: &mut BytesMut) -> crate::Result<()> {
        if self.samples.len() > Self::MAX_SAMPLES {
            return Err(crate::FrameError::TrailerLength {
                len: self.samples.len(),
                min: 0,
                max: Self::MAX_SAMPLES,
            });
        }
        dst.put_u8(self.samples.len() as u8);
        Ok(())
    }

    pub(crate) fn encode_trailer(&self, dst: &mut BytesMut) {
        for sample in &self.samples {
            dst.put_u16_le(*sample);
        }
    }
}

/// UART_REPORT_TX_STATUS arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartReportTxStatusArgs {
    pub uart_num: u8,
    /// Bytes still waiting in the UART transmit buffer (14 bits on the wire).
    pub bytes_remaining: u16,
}

impl UartReportTxStatusArgs {
    pub const MAX_REMAINING: u16 = 0x3FFF;

    pub(crate) fn decode(mut src: &[u8]) -> Self {
        let word = src.get_u16_le();
        Self {
            uart_num: (word & 0x03) as u8,
            bytes_remaining: word >> 2,
        }
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        let remaining = self.bytes_remaining.min(Self::MAX_REMAINING);
        dst.put_u16_le(u16::from(self.uart_num & 0x03) | remaining << 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digital_out_packs_pin_above_flags() {
        let mut buf = BytesMut::new();
        SetPinDigitalOutArgs {
            pin: 3,
            value: true,
            open_drain: false,
        }
        .encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0b0000_1110]);
    }

    #[test]
    fn unnamed_bits_are_ignored_on_decode() {
        let args = SetDigitalOutLevelArgs::decode(&[0b1111_0110]);
        assert_eq!(args.pin, 0b11_1101);
        assert!(!args.value);

        let uart = SetPinUartArgs::decode(&[0xC5, 0b0111_1110]);
        assert_eq!(uart.pin, 5);
        assert_eq!(uart.uart_num, 2);
        assert!(!uart.enable);
    }

    #[test]
    fn uart_config_layout() {
        let mut buf = BytesMut::new();
        UartConfigArgs {
            uart_num: 2,
            rate: 0x1234,
            speed4x: true,
            two_stop_bits: false,
            parity: 1,
        }
        .encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0b1000_1001, 0x34, 0x12]);
        assert_eq!(UartConfigArgs::decode(&buf).rate, 0x1234);
    }

    #[test]
    fn uart_data_rejects_out_of_range_trailers() {
        let mut buf = BytesMut::new();
        let empty = UartDataArgs {
            uart_num: 0,
            data: Vec::new(),
        };
        assert!(matches!(
            empty.encode_header(&mut buf),
            Err(crate::FrameError::TrailerLength { len: 0, .. })
        ));

        let oversized = UartDataArgs {
            uart_num: 0,
            data: vec![0; 257],
        };
        assert!(oversized.encode_header(&mut buf).is_err());
        assert!(buf.is_empty());

        let full = UartDataArgs {
            uart_num: 1,
            data: vec![0; 256],
        };
        full.encode_header(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[1, 255]);
        assert_eq!(UartDataArgs::trailer_size(&buf), 256);
    }

    #[test]
    fn tx_status_saturates_remaining_count() {
        let mut buf = BytesMut::new();
        UartReportTxStatusArgs {
            uart_num: 3,
            bytes_remaining: u16::MAX,
        }
        .encode(&mut buf);
        let decoded = UartReportTxStatusArgs::decode(&buf);
        assert_eq!(decoded.uart_num, 3);
        assert_eq!(decoded.bytes_remaining, UartReportTxStatusArgs::MAX_REMAINING);
    }

    #[test]
    fn establish_connection_is_little_endian() {
        let mut buf = BytesMut::new();
        EstablishConnectionArgs {
            magic: crate::PROTOCOL_MAGIC,
            hardware: 0,
            bootloader: 1,
            firmware: 1,
        }
        .encode(&mut buf);
        assert_eq!(&buf[..4], b"IOIO");
        assert_eq!(buf.len(), 16);
    }
}
