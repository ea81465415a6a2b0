use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use linksim_engine::{Checksum, Event, Summary};
use linksim_frame::Frame;
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    index: usize,
    bit_len: usize,
    padded: bool,
    crc: String,
    status: String,
    errors: Vec<ErrorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bits: Option<String>,
}

#[derive(Serialize)]
struct ErrorOutput {
    kind: String,
    message: String,
    attempt: u32,
}

fn frame_output(frame: &Frame, show_bits: bool) -> FrameOutput {
    FrameOutput {
        index: frame.index(),
        bit_len: frame.bit_len(),
        padded: frame.is_padded(),
        crc: format!("{:04X}", frame.crc()),
        status: frame.status().to_string(),
        errors: frame
            .error_log()
            .iter()
            .map(|entry| ErrorOutput {
                kind: entry.kind.to_string(),
                message: entry.message.clone(),
                attempt: entry.attempt,
            })
            .collect(),
        bits: show_bits.then(|| frame.binary_string()),
    }
}

pub fn print_frames(frames: &[Frame], show_bits: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<FrameOutput> = frames.iter().map(|f| frame_output(f, show_bits)).collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            let mut header = vec!["FRAME", "BITS", "PADDED", "CRC", "STATUS", "ERRORS"];
            if show_bits {
                header.push("PAYLOAD");
            }
            table.set_header(header);
            for frame in frames {
                let mut row = vec![
                    frame.index().to_string(),
                    frame.bit_len().to_string(),
                    if frame.is_padded() { "yes" } else { "no" }.to_string(),
                    format!("{:04X}", frame.crc()),
                    frame.status().to_string(),
                    frame.error_log().len().to_string(),
                ];
                if show_bits {
                    row.push(frame.binary_string());
                }
                table.add_row(row);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!("{frame}");
                if show_bits {
                    println!("  {}", frame.binary_string());
                }
            }
        }
    }
}

pub fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_event_json(event),
        OutputFormat::Table | OutputFormat::Pretty => match event {
            Event::FrameProcessed(frame) => {
                println!("frame {} sent ({} wire bytes)", frame.index(), frame.payload().len());
            }
            Event::StatusUpdate(text) => println!("{text}"),
            Event::ChecksumCalculated(checksum) => println!("Checksum calculated: {checksum}"),
            Event::ChecksumFrameSent(checksum) => println!("Checksum frame sent: {checksum}"),
            Event::Error(reason) => println!("error: {reason}"),
            // The summary gets its own rendering.
            Event::TransmissionComplete(_) => {}
        },
    }
}

fn print_event_json(event: &Event) {
    let value = match event {
        Event::FrameProcessed(frame) => serde_json::json!({
            "event": "frame_processed",
            "frame": serde_json::to_value(frame_output(frame, false)).unwrap_or_default(),
        }),
        Event::StatusUpdate(text) => serde_json::json!({
            "event": "status_update",
            "message": text,
        }),
        Event::ChecksumCalculated(checksum) => serde_json::json!({
            "event": "checksum_calculated",
            "checksum": checksum.to_string(),
        }),
        Event::ChecksumFrameSent(checksum) => serde_json::json!({
            "event": "checksum_frame_sent",
            "checksum": checksum.to_string(),
        }),
        Event::Error(reason) => serde_json::json!({
            "event": "error",
            "reason": reason,
        }),
        Event::TransmissionComplete(_) => return,
    };
    println!("{value}");
}

#[derive(Serialize)]
struct SummaryOutput {
    total_frames: usize,
    acked: usize,
    failed: usize,
    problem_frames: Vec<usize>,
    checksum: String,
    checksum_mode: &'static str,
    checksum_frame_corrupted: bool,
}

fn checksum_mode_name(checksum: Checksum) -> &'static str {
    match checksum {
        Checksum::Sum32(_) => "sum32",
        Checksum::Modulo256(_) => "modulo256",
    }
}

pub fn print_summary(summary: &Summary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SummaryOutput {
                total_frames: summary.total_frames,
                acked: summary.acked,
                failed: summary.failed,
                problem_frames: summary.problem_frames.clone(),
                checksum: summary.checksum.to_string(),
                checksum_mode: checksum_mode_name(summary.checksum),
                checksum_frame_corrupted: summary.checksum_frame_corrupted,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TRANSMISSION SUMMARY", ""]);
            table
                .add_row(vec!["Total frames".to_string(), summary.total_frames.to_string()])
                .add_row(vec!["Acknowledged".to_string(), summary.acked.to_string()])
                .add_row(vec!["Failed".to_string(), summary.failed.to_string()])
                .add_row(vec![
                    "Problem frames".to_string(),
                    join_indices(&summary.problem_frames),
                ])
                .add_row(vec!["Checksum".to_string(), summary.checksum.to_string()])
                .add_row(vec![
                    "Checksum frame".to_string(),
                    if summary.checksum_frame_corrupted {
                        "CORRUPTED"
                    } else {
                        "delivered"
                    }
                    .to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("=== Transmission Summary ===");
            println!("Total frames: {}", summary.total_frames);
            println!("Acknowledged: {}", summary.acked);
            println!("Failed: {}", summary.failed);
            if !summary.problem_frames.is_empty() {
                println!("Problem frames: {}", join_indices(&summary.problem_frames));
            }
            println!(
                "Checksum: {} ({})",
                summary.checksum,
                if summary.checksum_frame_corrupted {
                    "checksum frame CORRUPTED"
                } else {
                    "checksum frame delivered"
                }
            );
        }
    }
}

fn join_indices(indices: &[usize]) -> String {
    if indices.is_empty() {
        return "none".to_string();
    }
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
