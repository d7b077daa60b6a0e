use pinwire_frame::MessageType;
use serde::Serialize;

use crate::cmd::TableArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{emit, OutputFormat, Rows};

#[derive(Serialize)]
struct TypeEntry {
    tag: u8,
    incoming: &'static str,
    incoming_args: usize,
    outgoing: &'static str,
    outgoing_args: usize,
}

#[derive(Serialize)]
struct TableOutput {
    schema_id: &'static str,
    types: Vec<TypeEntry>,
}

pub fn run(_args: TableArgs, format: OutputFormat) -> CliResult<i32> {
    let types: Vec<TypeEntry> = MessageType::ALL
        .iter()
        .map(|ty| TypeEntry {
            tag: ty.tag(),
            incoming: ty.incoming_name(),
            incoming_args: ty.incoming_arg_size(),
            outgoing: ty.outgoing_name(),
            outgoing_args: ty.outgoing_arg_size(),
        })
        .collect();

    let mut rows = Rows::new(vec!["TAG", "INCOMING", "IN", "OUTGOING", "OUT"]);
    for entry in &types {
        rows.push(vec![
            format!("0x{:02X}", entry.tag),
            entry.incoming.to_string(),
            entry.incoming_args.to_string(),
            entry.outgoing.to_string(),
            entry.outgoing_args.to_string(),
        ]);
    }

    let out = TableOutput {
        schema_id: "https://schemas.3leaps.dev/pinwire/cli/v1/type-table.schema.json",
        types,
    };
    emit(&out, &rows, format);
    Ok(SUCCESS)
}
