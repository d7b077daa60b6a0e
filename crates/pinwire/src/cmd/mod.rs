use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use pinwire_frame::FailurePolicy;

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod simulate;
pub mod table;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the message type and argument size tables.
    Table(TableArgs),
    /// Decode a captured byte stream into messages.
    Decode(DecodeArgs),
    /// Run a command stream against a simulated board.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Table(args) => table::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Simulate(args) => simulate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where a byte stream comes from.
#[derive(Args, Debug)]
pub struct StreamInput {
    /// Stream as hex digits (e.g. "02 0e").
    #[arg(conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read the raw stream from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Feed the stream in chunks of this many bytes.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk: Option<u64>,
}

impl StreamInput {
    pub fn read(&self) -> CliResult<Vec<u8>> {
        if let Some(hex) = &self.hex {
            return crate::hex::parse(hex);
        }
        if let Some(path) = &self.file {
            return std::fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
        }
        Err(CliError::new(USAGE, "a hex stream or --file is required"))
    }

    /// Chunk size to feed with; the whole stream when unset.
    pub fn chunk_size(&self, len: usize) -> usize {
        self.chunk
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .unwrap_or(len)
            .max(1)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Host-to-device commands.
    In,
    /// Device-to-host messages.
    Out,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Abort,
    Resync,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Abort => FailurePolicy::Abort,
            PolicyArg::Resync => FailurePolicy::Resync,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct TableArgs {}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub input: StreamInput,
    /// Which side produced the stream.
    #[arg(long, value_enum, default_value = "in")]
    pub direction: DirectionArg,
    /// Skip undecodable bytes instead of stopping at the first one.
    #[arg(long)]
    pub resync: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub input: StreamInput,
    /// Protocol configuration (JSON). Missing fields take their defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Failure policy; overrides the configuration file.
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,
    /// Digital input pins that read high (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "PINS")]
    pub high: Vec<u8>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
