//! Hex text for byte streams on the command line.

use crate::exit::{CliError, CliResult, USAGE};

/// Parse hex digits into bytes.
///
/// Whitespace, `:` and `,` separators and `0x` prefixes on each group are
/// ignored, so `"02 0e"`, `"020e"` and `"0x02,0x0e"` are the same stream.
pub fn parse(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ':' || c == ',')
        .map(|group| {
            group
                .strip_prefix("0x")
                .or_else(|| group.strip_prefix("0X"))
                .unwrap_or(group)
        })
        .collect();

    hex::decode(&digits).map_err(|err| match err {
        hex::FromHexError::OddLength => CliError::new(
            USAGE,
            format!("hex input has an odd number of digits ({})", digits.len()),
        ),
        other => CliError::new(USAGE, format!("invalid hex input: {other}")),
    })
}

/// Lowercase hex, one space between bytes.
pub fn format(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}
