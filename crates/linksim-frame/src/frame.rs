//! The frame data model.
//!
//! A `Frame` owns its bit payload (packed MSB-first into bytes), the
//! CRC of that payload, its transmission status, and an append-only log
//! of every channel event it suffered. The CRC is recomputed whenever
//! the payload is reassigned, so `crc()` always describes the current
//! payload.

use std::fmt;

use bytes::Bytes;

use crate::crc;

/// Bits per frame. Fixed by the protocol.
pub const FRAME_SIZE_BITS: usize = 100;

/// Bytes needed to hold one canonical frame payload (100 bits).
pub const FRAME_SIZE_BYTES: usize = FRAME_SIZE_BITS.div_ceil(8);

/// Transmission status of a single frame.
///
/// `Acked` and `Failed` are terminal; a frame never transitions out of
/// them within a run. `Lost`, `Corrupted`, and `AckLost` are transient
/// per-attempt outcomes that lead back to `Sending` on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Waiting,
    Sending,
    Acked,
    Lost,
    Corrupted,
    AckLost,
    Failed,
}

impl FrameStatus {
    /// True for `Acked` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, FrameStatus::Acked | FrameStatus::Failed)
    }
}

impl fmt::Display for FrameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameStatus::Waiting => "Waiting",
            FrameStatus::Sending => "Sending",
            FrameStatus::Acked => "Acked",
            FrameStatus::Lost => "Lost",
            FrameStatus::Corrupted => "Corrupted",
            FrameStatus::AckLost => "ACK Lost",
            FrameStatus::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Kind of failure recorded in a frame's error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The frame never arrived.
    Lost,
    /// The frame arrived damaged.
    Corrupted,
    /// The frame arrived but its acknowledgment did not.
    AckLost,
    /// All retry attempts were exhausted.
    RetryExhausted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Lost => "Lost",
            FailureKind::Corrupted => "Corrupted",
            FailureKind::AckLost => "ACK Lost",
            FailureKind::RetryExhausted => "Transmission Failed",
        };
        f.write_str(name)
    }
}

/// One entry in a frame's error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: FailureKind,
    pub message: String,
    /// 1-based attempt number the event occurred on.
    pub attempt: u32,
}

/// A fixed-size unit of segmented data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    index: usize,
    payload: Bytes,
    bit_len: usize,
    padded: bool,
    crc: u16,
    status: FrameStatus,
    error_log: Vec<LogEntry>,
}

impl Frame {
    /// Create a frame from a packed bit payload.
    ///
    /// `bit_len` counts the valid bits (MSB-first per byte); `padded`
    /// marks a frame whose source data ran out before 100 bits.
    pub fn new(index: usize, payload: impl Into<Bytes>, bit_len: usize, padded: bool) -> Self {
        let payload = payload.into();
        let crc = crc::crc16(&payload, bit_len);
        Self {
            index,
            payload,
            bit_len,
            padded,
            crc,
            status: FrameStatus::Waiting,
            error_log: Vec::new(),
        }
    }

    /// Ordinal position within the frame set, assigned at creation.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The current payload bytes (canonical or stuffed wire form).
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Number of valid bits in the current payload.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// True iff fewer than 100 source bits were available.
    pub fn is_padded(&self) -> bool {
        self.padded
    }

    /// CRC-16 of the current payload.
    pub fn crc(&self) -> u16 {
        self.crc
    }

    pub fn status(&self) -> FrameStatus {
        self.status
    }

    pub fn error_log(&self) -> &[LogEntry] {
        &self.error_log
    }

    /// Replace the payload and recompute the CRC over all its bits.
    ///
    /// Used when stuffing or destuffing swaps the payload between its
    /// canonical and wire forms.
    pub fn set_payload(&mut self, payload: impl Into<Bytes>) {
        self.payload = payload.into();
        self.bit_len = self.payload.len() * 8;
        self.crc = crc::crc16(&self.payload, self.bit_len);
    }

    /// Replace the payload, tracking an explicit bit count.
    pub fn set_payload_bits(&mut self, payload: impl Into<Bytes>, bit_len: usize) {
        self.payload = payload.into();
        self.bit_len = bit_len;
        self.crc = crc::crc16(&self.payload, bit_len);
    }

    /// Update the transmission status.
    ///
    /// Terminal statuses are sticky: once `Acked` or `Failed`, further
    /// updates are ignored.
    pub fn set_status(&mut self, status: FrameStatus) {
        if !self.status.is_terminal() {
            self.status = status;
        }
    }

    /// Recompute the CRC of the current payload.
    pub fn verify_crc(&self) -> bool {
        crc::verify(&self.payload, self.bit_len, self.crc)
    }

    /// Append an entry to the error log. The log is never cleared.
    pub fn log_failure(&mut self, kind: FailureKind, message: impl Into<String>, attempt: u32) {
        self.error_log.push(LogEntry {
            kind,
            message: message.into(),
            attempt,
        });
    }

    /// Read bit `i` of the payload, MSB-first within each byte.
    pub fn bit(&self, i: usize) -> bool {
        assert!(i < self.bit_len, "bit index {i} out of range");
        self.payload[i / 8] >> (7 - (i % 8)) & 1 == 1
    }

    /// The payload as a string of '0'/'1' characters.
    pub fn binary_string(&self) -> String {
        (0..self.bit_len)
            .map(|i| if self.bit(i) { '1' } else { '0' })
            .collect()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame {}: {} bits, CRC {:04X}, {}",
            self.index, self.bit_len, self.crc, self.status
        )?;
        if self.padded {
            write!(f, ", padded")?;
        }
        if !self.error_log.is_empty() {
            write!(f, ", {} errors", self.error_log.len())?;
        }
        Ok(())
    }
}
