//! Events emitted by a transmission run.
//!
//! Every event carries owned data; frame events carry a snapshot of
//! the frame as it looked on the wire at that moment.

use std::fmt;

use linksim_frame::Frame;

/// Aggregate checksum over every frame's canonical CRC, in frame order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checksum {
    /// Canonical mode: 32-bit wrapping sum of the 16-bit CRCs.
    Sum32(u32),
    /// Legacy mode: 8-bit modulo-256 sum, kept for compatibility with
    /// the original call path that used it.
    Modulo256(u8),
}

impl Checksum {
    /// The raw accumulator value, widened.
    pub fn value(self) -> u32 {
        match self {
            Checksum::Sum32(v) => v,
            Checksum::Modulo256(v) => u32::from(v),
        }
    }

    /// Big-endian bytes of the accumulator, sized to the mode.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            Checksum::Sum32(v) => v.to_be_bytes().to_vec(),
            Checksum::Modulo256(v) => vec![v],
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checksum::Sum32(v) => write!(f, "{v:08X}"),
            Checksum::Modulo256(v) => write!(f, "{v:02X}"),
        }
    }
}

/// Final report of a completed (uncancelled) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Frames in the set.
    pub total_frames: usize,
    /// Frames that reached `Acked`.
    pub acked: usize,
    /// Frames that exhausted their retries.
    pub failed: usize,
    /// Indices of frames that experienced any non-nominal event.
    pub problem_frames: Vec<usize>,
    /// Aggregate checksum over canonical CRCs.
    pub checksum: Checksum,
    /// Whether the checksum trailer frame was reported corrupted.
    pub checksum_frame_corrupted: bool,
}

/// One progress notification from the engine to its observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A frame was delivered (not lost or corrupted) on this attempt.
    /// The snapshot shows the stuffed wire form; the ACK outcome is not
    /// yet known.
    FrameProcessed(Frame),
    /// Human-readable progress narration.
    StatusUpdate(String),
    /// The aggregate checksum was computed.
    ChecksumCalculated(Checksum),
    /// The checksum trailer frame was sent.
    ChecksumFrameSent(Checksum),
    /// Exactly one per uncancelled run, after every frame is terminal.
    TransmissionComplete(Summary),
    /// A run-level error (currently: checksum frame corruption).
    Error(String),
}
