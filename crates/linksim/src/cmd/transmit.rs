use std::fs;
use std::time::Duration;

use linksim_engine::{ChecksumMode, DataLink, EngineConfig, Event};

use crate::cmd::TransmitArgs;
use crate::exit::{self, CliResult, FAILURE, SUCCESS};
use crate::output::{self, OutputFormat};

pub fn run(args: &TransmitArgs, format: OutputFormat) -> CliResult<i32> {
    let data = fs::read(&args.path)
        .map_err(|err| exit::io_error(&format!("reading {}", args.path.display()), err))?;

    let config = EngineConfig {
        retry_delay: Duration::from_millis(args.delay_ms),
        ack_delay: Duration::from_millis(args.delay_ms.saturating_mul(2)),
        checksum_mode: if args.legacy_checksum {
            ChecksumMode::Modulo256
        } else {
            ChecksumMode::Sum32
        },
    };

    let mut link = DataLink::with_config(config);
    if let Some(seed) = args.seed {
        link = link.seeded(seed);
    }

    let count = link
        .load(&data)
        .map_err(|err| exit::link_error("loading input", err))?;
    tracing::info!(frames = count, seed = ?args.seed, "starting transmission");

    let rx = link
        .start()
        .map_err(|err| exit::link_error("starting transmission", err))?;

    let stop = link.stop_handle();
    if let Err(err) = ctrlc::set_handler(move || stop.stop()) {
        tracing::warn!(%err, "could not install interrupt handler");
    }

    let mut summary = None;
    for event in rx {
        if let Event::TransmissionComplete(s) = &event {
            summary = Some(s.clone());
        }
        output::print_event(&event, format);
    }

    match summary {
        Some(summary) => {
            output::print_summary(&summary, format);
            Ok(SUCCESS)
        }
        None => {
            // No summary means the run was cancelled.
            tracing::warn!("transmission stopped before completion");
            Ok(FAILURE)
        }
    }
}
