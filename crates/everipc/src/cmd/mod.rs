use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod flags;
pub mod inspect;
pub mod layout;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print structure sizes, field offsets and flag values.
    Layout(LayoutArgs),
    /// Compose and validate a request-flags expression.
    Flags(FlagsArgs),
    /// Encode a QUERY2 request buffer.
    Encode(EncodeArgs),
    /// Decode a QUERY2 request buffer from a file.
    InspectRequest(InspectArgs),
    /// Decode a QUERY2 result-list buffer from a file.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Layout(args) => layout::run(args, format),
        Command::Flags(args) => flags::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::InspectRequest(args) => inspect::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct LayoutArgs {}

#[derive(Args, Debug)]
pub struct FlagsArgs {
    /// Flags expression, e.g. `NAME|SIZE`, `0x11` or `17`.
    pub expr: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Search string.
    pub search: String,
    /// Window id that receives the reply.
    #[arg(long, env = "EVERIPC_REPLY_TARGET", default_value = "0")]
    pub reply_target: u32,
    /// Copy-data kind the reply should carry.
    #[arg(long, env = "EVERIPC_REPLY_MESSAGE", default_value = "0")]
    pub reply_message: u32,
    /// Search flags (comma-separated names, e.g. match-case,regex).
    #[arg(long, value_delimiter = ',')]
    pub search_flags: Vec<String>,
    /// Index of the first result.
    #[arg(long, default_value = "0")]
    pub offset: u32,
    /// Maximum number of results, or `all`.
    #[arg(long, default_value = "all")]
    pub max_results: String,
    /// Requested fields expression.
    #[arg(long, default_value = "NAME|PATH")]
    pub request: String,
    /// Sort code or name (e.g. 1, NAME_ASCENDING).
    #[arg(long, default_value = "1")]
    pub sort: String,
    /// Write the encoded buffer to a file instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// File holding a request buffer.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding a result-list buffer.
    pub file: PathBuf,
    /// Accept replies whose numitems exceeds totitems.
    #[arg(long)]
    pub lenient: bool,
    /// Print only this field for each item.
    #[arg(long, conflicts_with = "all_fields")]
    pub field: Option<String>,
    /// Print every requested field (default).
    #[arg(long)]
    pub all_fields: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
