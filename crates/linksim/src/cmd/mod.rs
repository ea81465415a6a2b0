mod frames;
mod transmit;
mod version;

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Segment a file into 100-bit frames and show them.
    Frames(FramesArgs),
    /// Transmit a file over the simulated lossy channel.
    Transmit(TransmitArgs),
    /// Print version information.
    Version,
}

#[derive(Args, Debug)]
pub struct FramesArgs {
    /// Input file to segment.
    pub path: PathBuf,

    /// Include each frame's payload bits.
    #[arg(long)]
    pub bits: bool,
}

#[derive(Args, Debug)]
pub struct TransmitArgs {
    /// Input file to transmit.
    pub path: PathBuf,

    /// Channel seed. Omit for a fresh random channel.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Retry delay in milliseconds. The post-ACK pause is twice this.
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub delay_ms: u64,

    /// Use the legacy modulo-256 aggregate checksum.
    #[arg(long)]
    pub legacy_checksum: bool,
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Frames(args) => frames::run(&args, format),
        Command::Transmit(args) => transmit::run(&args, format),
        Command::Version => version::run(format),
    }
}
