use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod checksum;
pub mod decode;
pub mod frames;
pub mod input;
pub mod labels;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a TeleInfo stream and print changed readings.
    Decode(DecodeArgs),
    /// Print every completed frame with its checksum status.
    Frames(FramesArgs),
    /// Compute the checksum character for a `LABEL VALUE` group.
    Checksum(ChecksumArgs),
    /// List the known labels.
    Labels,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Frames(args) => frames::run(args, format),
        Command::Checksum(args) => checksum::run(args, format),
        Command::Labels => labels::run(format),
        Command::Version(args) => version::run(args),
    }
}

/// Where meter bytes come from. Standard input when neither is given.
#[derive(Args, Debug, Default)]
pub struct InputArgs {
    /// Serial device wired to the meter's TIC output.
    #[arg(long, value_name = "DEV", conflicts_with = "file")]
    pub serial: Option<PathBuf>,
    /// Replay a captured byte stream from a file.
    #[arg(long, value_name = "PATH", conflicts_with = "serial")]
    pub file: Option<PathBuf>,
    /// Serial line speed: 1200 (historic mode) or 9600 (standard mode).
    #[arg(long, default_value_t = 1200)]
    pub baud: u32,
    /// Discard frames longer than this many bytes.
    #[arg(long, default_value_t = teleinfo_frame::DEFAULT_MAX_FRAME_LEN)]
    pub max_frame_len: usize,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Time between two publications of changed readings (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s")]
    pub interval: String,
    /// Exit after printing N readings.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct FramesArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Group payload, e.g. "IINST 023".
    pub line: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
