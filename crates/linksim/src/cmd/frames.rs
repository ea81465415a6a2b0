use std::fs;

use linksim_frame::segment;

use crate::cmd::FramesArgs;
use crate::exit::{self, CliResult, SUCCESS};
use crate::output::{self, OutputFormat};

pub fn run(args: &FramesArgs, format: OutputFormat) -> CliResult<i32> {
    let data = fs::read(&args.path)
        .map_err(|err| exit::io_error(&format!("reading {}", args.path.display()), err))?;
    let frames = segment(&data)
        .map_err(|err| exit::frame_error(&format!("segmenting {}", args.path.display()), err))?;

    tracing::info!(bytes = data.len(), frames = frames.len(), "segmented input");
    output::print_frames(&frames, args.bits, format);
    Ok(SUCCESS)
}
