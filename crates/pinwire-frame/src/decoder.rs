//! Incremental reassembly of type-tagged messages from a chunked byte stream.
//!
//! Bytes are copied into a single message buffer under a cursor. A phase
//! transition is evaluated only once the current phase has all the bytes it
//! asked for, so one `feed` call may complete many messages or none.

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::incoming::IncomingMessage;
use crate::message_type::{MessageType, MAX_MESSAGE_SIZE};
use crate::outgoing::OutgoingMessage;

/// Which side's size tables and payload shapes a decoder uses.
pub trait Direction {
    /// The decoded message type.
    type Message: fmt::Debug;

    /// Short name for logging.
    const NAME: &'static str;

    /// Protocol name of a type in this direction.
    fn type_name(ty: MessageType) -> &'static str;

    /// Fixed argument size for a type in this direction.
    fn fixed_size(ty: MessageType) -> usize;

    /// Variable trailer size announced by a complete fixed block.
    fn trailer_size(ty: MessageType, fixed: &[u8]) -> usize;

    /// Build the typed message.
    fn parse(ty: MessageType, fixed: &[u8], trailer: &[u8]) -> Self::Message;
}

/// Host-to-device commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct Incoming;

/// Device-to-host messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Outgoing;

impl Direction for Incoming {
    type Message = IncomingMessage;
    const NAME: &'static str = "incoming";

    fn type_name(ty: MessageType) -> &'static str {
        ty.incoming_name()
    }

    fn fixed_size(ty: MessageType) -> usize {
        ty.incoming_arg_size()
    }

    fn trailer_size(ty: MessageType, fixed: &[u8]) -> usize {
        IncomingMessage::trailer_size(ty, fixed)
    }

    fn parse(ty: MessageType, fixed: &[u8], trailer: &[u8]) -> Self::Message {
        IncomingMessage::parse(ty, fixed, trailer)
    }
}

impl Direction for Outgoing {
    type Message = OutgoingMessage;
    const NAME: &'static str = "outgoing";

    fn type_name(ty: MessageType) -> &'static str {
        ty.outgoing_name()
    }

    fn fixed_size(ty: MessageType) -> usize {
        ty.outgoing_arg_size()
    }

    fn trailer_size(ty: MessageType, fixed: &[u8]) -> usize {
        OutgoingMessage::trailer_size(ty, fixed)
    }

    fn parse(ty: MessageType, fixed: &[u8], trailer: &[u8]) -> Self::Message {
        OutgoingMessage::parse(ty, fixed, trailer)
    }
}

/// A completely reassembled message.
#[derive(Debug)]
pub struct Received<'a, M> {
    /// The typed message.
    pub message: M,
    /// The exact bytes the message arrived as: tag, fixed block, trailer.
    pub wire: &'a [u8],
}

/// What the decoder does when a message cannot be decoded or handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FailurePolicy {
    /// Stop at the first failure. The rest of the chunk is discarded and every
    /// later `feed` fails until the decoder is reset.
    #[default]
    Abort,
    /// Drop the offending message (or the unknown type byte) and carry on
    /// with the next byte as a new type tag.
    Resync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Type,
    Args,
    VarArgs,
}

/// Incremental message decoder.
pub struct MessageDecoder<D: Direction> {
    phase: Phase,
    remaining: usize,
    cursor: usize,
    fixed_end: usize,
    message_type: Option<MessageType>,
    buf: [u8; MAX_MESSAGE_SIZE],
    policy: FailurePolicy,
    halted: bool,
    decoded: u64,
    dropped: u64,
    _direction: PhantomData<D>,
}

impl<D: Direction> MessageDecoder<D> {
    /// Create a decoder with the default [`FailurePolicy::Abort`].
    pub fn new() -> Self {
        Self::with_policy(FailurePolicy::default())
    }

    /// Create a decoder with an explicit failure policy.
    pub fn with_policy(policy: FailurePolicy) -> Self {
        Self {
            phase: Phase::Type,
            remaining: 1,
            cursor: 0,
            fixed_end: 0,
            message_type: None,
            buf: [0; MAX_MESSAGE_SIZE],
            policy,
            halted: false,
            decoded: 0,
            dropped: 0,
            _direction: PhantomData,
        }
    }

    /// Forget any partial message and clear a halt.
    pub fn reset(&mut self) {
        self.restart();
        self.halted = false;
    }

    /// Drop any partial message and refuse input until [`MessageDecoder::reset`].
    pub fn halt(&mut self) {
        self.restart();
        self.halted = true;
    }

    /// Feed a chunk of any length.
    ///
    /// `on_message` runs for each message completed by this chunk, in order.
    /// A decode error or an error returned by `on_message` is handled per the
    /// configured [`FailurePolicy`].
    pub fn feed<E, F>(&mut self, mut data: &[u8], mut on_message: F) -> Result<(), E>
    where
        E: From<DecodeError> + fmt::Display,
        F: FnMut(Received<'_, D::Message>) -> Result<(), E>,
    {
        if self.halted {
            return Err(DecodeError::Halted.into());
        }

        while !data.is_empty() {
            let take = data.len().min(self.remaining);
            self.buf[self.cursor..self.cursor + take].copy_from_slice(&data[..take]);
            self.cursor += take;
            self.remaining -= take;
            data = &data[take..];

            while self.remaining == 0 {
                match self.phase {
                    Phase::Type => match MessageType::try_from(self.buf[0]) {
                        Ok(ty) => {
                            self.message_type = Some(ty);
                            self.phase = Phase::Args;
                            self.remaining = D::fixed_size(ty);
                        }
                        Err(err) => {
                            self.fail(E::from(err))?;
                            break;
                        }
                    },
                    Phase::Args => {
                        let ty = self.current_type();
                        self.fixed_end = self.cursor;
                        self.phase = Phase::VarArgs;
                        self.remaining = D::trailer_size(ty, &self.buf[1..self.fixed_end]);
                    }
                    Phase::VarArgs => {
                        let ty = self.current_type();
                        let len = self.cursor;
                        let message = D::parse(
                            ty,
                            &self.buf[1..self.fixed_end],
                            &self.buf[self.fixed_end..len],
                        );
                        self.restart();
                        self.decoded += 1;
                        debug!(
                            direction = D::NAME,
                            ty = D::type_name(ty),
                            tag = ty.tag(),
                            len,
                            "message decoded"
                        );

                        let outcome = on_message(Received {
                            message,
                            wire: &self.buf[..len],
                        });
                        if let Err(err) = outcome {
                            self.fail(err)?;
                        }
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Whether a failure under [`FailurePolicy::Abort`] stopped decoding.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Whether bytes of an unfinished message are buffered.
    pub fn has_partial(&self) -> bool {
        self.cursor > 0
    }

    /// Messages completed since creation.
    pub fn decoded_count(&self) -> u64 {
        self.decoded
    }

    /// Messages (or stray type bytes) dropped under [`FailurePolicy::Resync`].
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// The configured failure policy.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    fn current_type(&self) -> MessageType {
        // Phase::Args and Phase::VarArgs are only entered after a valid tag.
        self.message_type.unwrap_or(MessageType::Reserved)
    }

    fn restart(&mut self) {
        self.phase = Phase::Type;
        self.remaining = 1;
        self.cursor = 0;
        self.fixed_end = 0;
        self.message_type = None;
    }

    fn fail<E: fmt::Display>(&mut self, err: E) -> Result<(), E> {
        self.restart();
        match self.policy {
            FailurePolicy::Abort => {
                warn!(direction = D::NAME, error = %err, "decoding halted");
                self.halted = true;
                Err(err)
            }
            FailurePolicy::Resync => {
                warn!(direction = D::NAME, error = %err, "message dropped, resynchronizing");
                self.dropped += 1;
                Ok(())
            }
        }
    }
}

impl<D: Direction> Default for MessageDecoder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Direction> fmt::Debug for MessageDecoder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDecoder")
            .field("direction", &D::NAME)
            .field("phase", &self.phase)
            .field("remaining", &self.remaining)
            .field("cursor", &self.cursor)
            .field("policy", &self.policy)
            .field("halted", &self.halted)
            .finish()
    }
}

/// Decode a complete byte stream into messages.
///
/// Convenience for host-side tools. Stops at the first error; trailing bytes
/// of an unfinished message are ignored.
pub fn decode_all<D: Direction>(data: &[u8]) -> Result<Vec<D::Message>, DecodeError> {
    let mut decoder = MessageDecoder::<D>::new();
    let mut out = Vec::new();
    decoder.feed(data, |received: Received<'_, D::Message>| {
        out.push(received.message);
        Ok::<(), DecodeError>(())
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::args::*;
    use crate::message_type::PROTOCOL_MAGIC;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Decode(DecodeError),
        Rejected,
    }

    impl From<DecodeError> for TestError {
        fn from(err: DecodeError) -> Self {
            Self::Decode(err)
        }
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn stream(messages: &[IncomingMessage]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for msg in messages {
            msg.encode(&mut buf).unwrap();
        }
        buf.to_vec()
    }

    fn sample_stream() -> (Vec<IncomingMessage>, Vec<u8>) {
        let messages = vec![
            IncomingMessage::SoftReset,
            IncomingMessage::SetPinDigitalOut(SetPinDigitalOutArgs {
                pin: 3,
                value: true,
                open_drain: false,
            }),
            IncomingMessage::UartData(UartDataArgs {
                uart_num: 1,
                data: (0..=255).collect(),
            }),
            IncomingMessage::Reserved,
            IncomingMessage::SetPwmPeriod(SetPwmPeriodArgs {
                pwm_num: 2,
                period: 0xBEEF,
                scale256: false,
            }),
        ];
        let bytes = stream(&messages);
        (messages, bytes)
    }

    fn collect_chunked(bytes: &[u8], chunk: usize) -> Vec<(IncomingMessage, Vec<u8>)> {
        let mut decoder = MessageDecoder::<Incoming>::new();
        let mut out = Vec::new();
        for piece in bytes.chunks(chunk) {
            decoder
                .feed(piece, |r: Received<'_, IncomingMessage>| {
                    out.push((r.message, r.wire.to_vec()));
                    Ok::<(), TestError>(())
                })
                .unwrap();
        }
        assert!(!decoder.has_partial());
        out
    }

    #[test]
    fn whole_stream_in_one_chunk() {
        let (messages, bytes) = sample_stream();
        let decoded = collect_chunked(&bytes, bytes.len());
        let decoded: Vec<_> = decoded.into_iter().map(|(m, _)| m).collect();
        assert_eq!(decoded, messages);
    }

    #[test]
    fn every_chunk_size_yields_the_same_messages() {
        let (_, bytes) = sample_stream();
        let reference = collect_chunked(&bytes, bytes.len());
        for chunk in 1..=17 {
            assert_eq!(collect_chunked(&bytes, chunk), reference, "chunk {chunk}");
        }
    }

    #[test]
    fn wire_slice_is_the_exact_message_image() {
        let msg = IncomingMessage::SetChangeNotify(SetChangeNotifyArgs { pin: 5, cn: true });
        let bytes = stream(&[msg]);
        let decoded = collect_chunked(&bytes, 1);
        assert_eq!(decoded[0].1, bytes);
    }

    #[test]
    fn zero_size_types_complete_on_the_type_byte() {
        let mut decoder = MessageDecoder::<Incoming>::new();
        let mut count = 0;
        decoder
            .feed(&[1, 7, 6], |_r: Received<'_, IncomingMessage>| {
                count += 1;
                Ok::<(), TestError>(())
            })
            .unwrap();
        assert_eq!(count, 3);
        assert!(!decoder.has_partial());
    }

    #[test]
    fn partial_message_waits_for_more_bytes() {
        let mut decoder = MessageDecoder::<Incoming>::new();
        let mut seen = Vec::new();
        let magic = PROTOCOL_MAGIC.to_le_bytes();

        decoder
            .feed(&[0, magic[0], magic[1]], |r: Received<'_, IncomingMessage>| {
                seen.push(r.message);
                Ok::<(), TestError>(())
            })
            .unwrap();
        assert!(seen.is_empty());
        assert!(decoder.has_partial());

        decoder
            .feed(&magic[2..], |r: Received<'_, IncomingMessage>| {
                seen.push(r.message);
                Ok::<(), TestError>(())
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![IncomingMessage::HardReset(HardResetArgs {
                magic: PROTOCOL_MAGIC
            })]
        );
    }

    #[test]
    fn unknown_type_aborts_and_latches() {
        let mut decoder = MessageDecoder::<Incoming>::new();
        let mut count = 0;
        let err = decoder
            .feed(&[1, 0x42, 1], |_r: Received<'_, IncomingMessage>| {
                count += 1;
                Ok::<(), TestError>(())
            })
            .unwrap_err();

        assert_eq!(err, TestError::Decode(DecodeError::UnknownMessageType(0x42)));
        assert_eq!(count, 1);
        assert!(decoder.is_halted());

        let err = decoder
            .feed(&[1], |_r: Received<'_, IncomingMessage>| Ok::<(), TestError>(()))
            .unwrap_err();
        assert_eq!(err, TestError::Decode(DecodeError::Halted));

        decoder.reset();
        decoder
            .feed(&[1], |_r: Received<'_, IncomingMessage>| {
                count += 1;
                Ok::<(), TestError>(())
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn explicit_halt_latches_under_any_policy() {
        let mut decoder = MessageDecoder::<Incoming>::with_policy(FailurePolicy::Resync);
        decoder
            .feed(&[0x02], |_r: Received<'_, IncomingMessage>| Ok::<(), TestError>(()))
            .unwrap();
        assert!(decoder.has_partial());

        decoder.halt();
        assert!(decoder.is_halted());
        assert!(!decoder.has_partial());
        let err = decoder
            .feed(&[1], |_r: Received<'_, IncomingMessage>| Ok::<(), TestError>(()))
            .unwrap_err();
        assert_eq!(err, TestError::Decode(DecodeError::Halted));

        decoder.reset();
        assert!(!decoder.is_halted());
    }

    #[test]
    fn handler_failure_aborts_remaining_bytes() {
        let mut decoder = MessageDecoder::<Incoming>::new();
        let mut count = 0;
        let err = decoder
            .feed(&[1, 1, 1], |_r: Received<'_, IncomingMessage>| {
                count += 1;
                Err(TestError::Rejected)
            })
            .unwrap_err();

        assert_eq!(err, TestError::Rejected);
        assert_eq!(count, 1);
        assert!(decoder.is_halted());
    }

    #[test]
    fn resync_drops_unknown_bytes_and_continues() {
        let mut decoder = MessageDecoder::<Incoming>::with_policy(FailurePolicy::Resync);
        let mut seen = Vec::new();
        decoder
            .feed(&[0xFF, 0x20, 1, 0x99, 1], |r: Received<'_, IncomingMessage>| {
                seen.push(r.message);
                Ok::<(), TestError>(())
            })
            .unwrap();

        assert_eq!(seen, vec![IncomingMessage::SoftReset, IncomingMessage::SoftReset]);
        assert_eq!(decoder.dropped_count(), 3);
        assert!(!decoder.is_halted());
    }

    #[test]
    fn resync_drops_only_the_rejected_message() {
        let mut decoder = MessageDecoder::<Incoming>::with_policy(FailurePolicy::Resync);
        let bytes = stream(&[
            IncomingMessage::SetPinAnalogIn(SetPinAnalogInArgs { pin: 60 }),
            IncomingMessage::SetPinAnalogIn(SetPinAnalogInArgs { pin: 4 }),
        ]);
        let mut accepted = Vec::new();
        decoder
            .feed(&bytes, |r: Received<'_, IncomingMessage>| match r.message {
                IncomingMessage::SetPinAnalogIn(args) if args.pin >= 48 => {
                    Err(TestError::Rejected)
                }
                other => {
                    accepted.push(other);
                    Ok(())
                }
            })
            .unwrap();

        assert_eq!(
            accepted,
            vec![IncomingMessage::SetPinAnalogIn(SetPinAnalogInArgs { pin: 4 })]
        );
        assert_eq!(decoder.dropped_count(), 1);
        assert_eq!(decoder.decoded_count(), 2);
    }

    #[test]
    fn outgoing_direction_decodes_reports() {
        let mut buf = BytesMut::new();
        let messages = vec![
            OutgoingMessage::EstablishConnection(EstablishConnectionArgs {
                magic: PROTOCOL_MAGIC,
                hardware: 2,
                bootloader: 1,
                firmware: 7,
            }),
            OutgoingMessage::ReportAnalogInFormat(ReportAnalogInFormatArgs {
                pins: vec![31, 40],
            }),
            OutgoingMessage::ReportAnalogInStatus(ReportAnalogInStatusArgs {
                samples: vec![100, 200],
            }),
        ];
        for msg in &messages {
            msg.encode(&mut buf).unwrap();
        }

        assert_eq!(decode_all::<Outgoing>(&buf).unwrap(), messages);
    }

    #[test]
    fn type_names_follow_the_direction() {
        let ty = MessageType::UART_REPORT_TX_STATUS;
        assert_eq!(Incoming::type_name(ty), "SET_PWM_PERIOD");
        assert_eq!(Outgoing::type_name(ty), "UART_REPORT_TX_STATUS");
        assert_eq!(Outgoing::type_name(MessageType::UartData), "UART_DATA");
    }

    #[test]
    fn decode_all_reports_unknown_tag() {
        assert_eq!(
            decode_all::<Incoming>(&[1, 200]).unwrap_err(),
            DecodeError::UnknownMessageType(200)
        );
    }
}
