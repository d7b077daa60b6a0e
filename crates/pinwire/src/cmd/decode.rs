use pinwire_frame::{
    DecodeError, Direction, FailurePolicy, Incoming, MessageDecoder, MessageType, Outgoing,
    Received,
};
use serde::Serialize;

use crate::cmd::{DecodeArgs, DirectionArg};
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{emit, OutputFormat, Rows};

/// One decoded message as printed by `decode` and `simulate`.
#[derive(Serialize)]
pub struct MessageRecord {
    pub tag: u8,
    pub name: &'static str,
    pub len: usize,
    pub wire: String,
    pub fields: String,
}

impl MessageRecord {
    pub fn new(direction: DirectionArg, wire: &[u8], fields: String) -> Self {
        let tag = wire.first().copied().unwrap_or_default();
        let name = match (MessageType::try_from(tag), direction) {
            (Ok(ty), DirectionArg::In) => ty.incoming_name(),
            (Ok(ty), DirectionArg::Out) => ty.outgoing_name(),
            (Err(_), _) => "UNKNOWN",
        };
        Self {
            tag,
            name,
            len: wire.len(),
            wire: crate::hex::format(wire),
            fields,
        }
    }
}

pub fn message_rows(messages: &[MessageRecord]) -> Rows {
    let mut rows = Rows::new(vec!["#", "TYPE", "LEN", "WIRE", "FIELDS"]);
    for (i, msg) in messages.iter().enumerate() {
        rows.push(vec![
            i.to_string(),
            msg.name.to_string(),
            msg.len.to_string(),
            msg.wire.clone(),
            msg.fields.clone(),
        ]);
    }
    rows
}

#[derive(Serialize)]
struct DecodeOutput {
    schema_id: &'static str,
    direction: &'static str,
    bytes: usize,
    messages: Vec<MessageRecord>,
    dropped: u64,
    trailing_bytes: bool,
    error: Option<String>,
}

pub(crate) struct Decoded {
    pub messages: Vec<MessageRecord>,
    pub dropped: u64,
    pub trailing_bytes: bool,
    pub error: Option<DecodeError>,
}

pub(crate) fn decode_stream<D: Direction>(
    direction: DirectionArg,
    bytes: &[u8],
    chunk: usize,
    policy: FailurePolicy,
) -> Decoded {
    let mut decoder = MessageDecoder::<D>::with_policy(policy);
    let mut messages = Vec::new();
    let mut error = None;

    for piece in bytes.chunks(chunk) {
        let fed = decoder.feed(piece, |received: Received<'_, D::Message>| {
            messages.push(MessageRecord::new(
                direction,
                received.wire,
                format!("{:?}", received.message),
            ));
            Ok::<(), DecodeError>(())
        });
        if let Err(err) = fed {
            error = Some(err);
            break;
        }
    }

    Decoded {
        messages,
        dropped: decoder.dropped_count(),
        trailing_bytes: decoder.has_partial(),
        error,
    }
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = args.input.read()?;
    let chunk = args.input.chunk_size(bytes.len());
    let policy = if args.resync {
        FailurePolicy::Resync
    } else {
        FailurePolicy::Abort
    };

    let decoded = match args.direction {
        DirectionArg::In => decode_stream::<Incoming>(args.direction, &bytes, chunk, policy),
        DirectionArg::Out => decode_stream::<Outgoing>(args.direction, &bytes, chunk, policy),
    };

    let rows = message_rows(&decoded.messages);
    let error = decoded.error.as_ref().map(ToString::to_string);
    let out = DecodeOutput {
        schema_id: "https://schemas.3leaps.dev/pinwire/cli/v1/decode-report.schema.json",
        direction: match args.direction {
            DirectionArg::In => Incoming::NAME,
            DirectionArg::Out => Outgoing::NAME,
        },
        bytes: bytes.len(),
        messages: decoded.messages,
        dropped: decoded.dropped,
        trailing_bytes: decoded.trailing_bytes,
        error: error.clone(),
    };
    emit(&out, &rows, format);

    if let Some(message) = error {
        return Err(CliError::new(DATA_INVALID, format!("decode failed: {message}")));
    }
    if decoded.trailing_bytes {
        tracing::warn!("stream ends inside a message");
    }
    Ok(SUCCESS)
}
