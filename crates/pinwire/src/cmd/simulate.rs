use std::path::Path;

use pinwire_device::{HardwareCall, Protocol, ProtocolConfig, SimulatedBoard};
use pinwire_frame::{FailurePolicy, Outgoing};
use pinwire_transport::{Channel, StreamChannel};
use serde::Serialize;

use crate::cmd::decode::{decode_stream, MessageRecord};
use crate::cmd::{DirectionArg, SimulateArgs};
use crate::exit::{device_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{emit, OutputFormat, Rows};

#[derive(Serialize)]
struct SimulateOutput {
    schema_id: &'static str,
    config: ProtocolConfig,
    calls: Vec<HardwareCall>,
    outgoing: Vec<MessageRecord>,
    decoded: u64,
    dropped: u64,
    error: Option<String>,
    output_error: Option<String>,
}

/// Everything a simulated session did with one input stream.
pub struct Session {
    pub calls: Vec<HardwareCall>,
    pub outgoing: Vec<u8>,
    pub decoded: u64,
    pub dropped: u64,
    pub error: Option<pinwire_device::DeviceError>,
}

/// Feed `bytes` to a fresh session in `chunk`-sized pieces, then drain the
/// outgoing queue into a byte buffer.
pub fn run_session(
    config: &ProtocolConfig,
    bytes: &[u8],
    chunk: usize,
    high_pins: &[u8],
) -> CliResult<Session> {
    let mut board = SimulatedBoard::new(config.board);
    for pin in high_pins {
        board.set_input_level(*pin, true);
    }

    let mut proto = Protocol::new(config.clone(), board);
    proto
        .initialize()
        .map_err(|err| device_error("initialize failed", err))?;

    let mut error = None;
    for piece in bytes.chunks(chunk) {
        if let Err(err) = proto.on_bytes_received(piece) {
            error = Some(err);
            break;
        }
    }

    let mut channel = StreamChannel::new(Vec::new());
    drain(&mut proto, &mut channel)?;

    Ok(Session {
        decoded: proto.decoded_count(),
        dropped: proto.dropped_count(),
        calls: proto.into_hardware().take_calls(),
        outgoing: channel.into_inner(),
        error,
    })
}

/// Pump the queue until it is empty or the channel stops taking writes.
fn drain<C: Channel>(proto: &mut Protocol<SimulatedBoard>, channel: &mut C) -> CliResult<()> {
    while !proto.queue().is_empty() {
        let written = proto
            .on_tick(channel)
            .map_err(|err| device_error("transmit failed", err))?;
        if written == 0 && !channel.is_ready() {
            break;
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> CliResult<ProtocolConfig> {
    let Some(path) = path else {
        return Ok(ProtocolConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::new(
            USAGE,
            format!("invalid configuration {}: {err}", path.display()),
        )
    })
}

/// Decode what the session sent. Records up to the first undecodable byte
/// are kept alongside the reason decoding stopped.
fn outgoing_records(bytes: &[u8]) -> (Vec<MessageRecord>, Option<String>) {
    let decoded = decode_stream::<Outgoing>(
        DirectionArg::Out,
        bytes,
        bytes.len().max(1),
        FailurePolicy::Abort,
    );
    let error = match decoded.error {
        Some(err) => Some(err.to_string()),
        None if decoded.trailing_bytes => Some("output ends inside a message".to_string()),
        None => None,
    };
    (decoded.messages, error)
}

fn call_rows(calls: &[HardwareCall], outgoing: &[MessageRecord]) -> Rows {
    let mut rows = Rows::new(vec!["KIND", "#", "DETAIL"]);
    for (i, call) in calls.iter().enumerate() {
        rows.push(vec!["call".to_string(), i.to_string(), format!("{call:?}")]);
    }
    for (i, msg) in outgoing.iter().enumerate() {
        rows.push(vec![
            "sent".to_string(),
            i.to_string(),
            format!("{} [{}] {}", msg.name, msg.wire, msg.fields),
        ]);
    }
    rows
}

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(policy) = args.policy {
        config.failure_policy = policy.into();
    }

    let bytes = args.input.read()?;
    let chunk = args.input.chunk_size(bytes.len());
    let session = run_session(&config, &bytes, chunk, &args.high)?;

    let (outgoing, output_error) = outgoing_records(&session.outgoing);
    let rows = call_rows(&session.calls, &outgoing);
    let error = session.error;
    let out = SimulateOutput {
        schema_id: "https://schemas.3leaps.dev/pinwire/cli/v1/simulate-report.schema.json",
        config,
        calls: session.calls,
        outgoing,
        decoded: session.decoded,
        dropped: session.dropped,
        error: error.as_ref().map(ToString::to_string),
        output_error: output_error.clone(),
    };
    emit(&out, &rows, format);

    if let Some(err) = error {
        return Err(device_error("stream rejected", err));
    }
    match output_error {
        Some(reason) => Err(CliError::new(
            DATA_INVALID,
            format!("device output undecodable: {reason}"),
        )),
        None => Ok(SUCCESS),
    }
}

#[cfg(test)]
mod tests {
    use pinwire_transport::MemoryChannel;

    use super::*;

    #[test]
    fn change_notify_session_reports_level() {
        let config = ProtocolConfig::default();
        // SET_CHANGE_NOTIFY pin 5, enable
        let session = run_session(&config, &[0x05, 0x15], 1, &[5]).unwrap();

        assert_eq!(
            session.calls,
            vec![HardwareCall::SetChangeNotify {
                pin: 5,
                enabled: true
            }]
        );
        let (records, output_error) = outgoing_records(&session.outgoing);
        assert!(output_error.is_none());
        let names: Vec<_> = records.into_iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            ["ESTABLISH_CONNECTION", "SET_CHANGE_NOTIFY", "REPORT_DIGITAL_IN_STATUS"]
        );
        assert!(session.error.is_none());
    }

    #[test]
    fn resync_policy_survives_bad_commands() {
        let config = ProtocolConfig {
            failure_policy: FailurePolicy::Resync,
            ..ProtocolConfig::default()
        };
        // bad HARD_RESET magic, then SOFT_RESET
        let stream = [0x00, 0x00, 0x00, 0x00, 0x00, 0x01];
        let session = run_session(&config, &stream, stream.len(), &[]).unwrap();

        assert!(session.error.is_none());
        assert_eq!(session.dropped, 1);
        assert_eq!(session.calls, vec![HardwareCall::SoftReset]);
    }

    #[test]
    fn abort_policy_reports_the_failure() {
        let config = ProtocolConfig::default();
        let session = run_session(&config, &[0x07, 0x01], 2, &[]).unwrap();
        assert!(session.error.is_some());
        assert!(session.calls.is_empty());
        assert_eq!(outgoing_records(&session.outgoing).0.len(), 1);
    }

    #[test]
    fn undecodable_output_is_reported() {
        let (records, error) = outgoing_records(&[0x42]);
        assert!(records.is_empty());
        assert_eq!(error.as_deref(), Some("unknown message type 0x42"));

        // SOFT_RESET, then a SET_PIN_DIGITAL_OUT echo cut short
        let (records, error) = outgoing_records(&[0x01, 0x02]);
        assert_eq!(records.len(), 1);
        assert_eq!(error.as_deref(), Some("output ends inside a message"));
    }

    #[test]
    fn drain_stops_on_a_busy_channel() {
        let mut proto = Protocol::new(ProtocolConfig::default(), SimulatedBoard::default());
        proto.initialize().unwrap();

        let mut channel = MemoryChannel::manual();
        drain(&mut proto, &mut channel).unwrap();
        assert_eq!(channel.written().len(), 17);
        assert_eq!(proto.queue().len(), 17);
    }
}
