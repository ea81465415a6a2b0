//! Fixed-size bit framing, CRC-16, and byte stuffing for the data-link simulator.
//!
//! This is the leaf layer of linksim. A byte stream is segmented into
//! 100-bit frames (the last frame zero-padded), each frame carries:
//! - A 16-bit CRC over its current payload (polynomial 0x1021)
//! - A status tracking its progress through the simulated channel
//! - An append-only log of channel events it suffered
//!
//! Byte stuffing (0x7E flag / 0x7D escape) wraps a payload for the
//! "wire" and is fully reversible.

pub mod crc;
pub mod error;
pub mod frame;
pub mod segment;
pub mod stuff;

pub use crc::{crc16, verify, CRC_POLY};
pub use error::{FrameError, Result};
pub use frame::{FailureKind, Frame, FrameStatus, LogEntry, FRAME_SIZE_BITS, FRAME_SIZE_BYTES};
pub use segment::segment;
pub use stuff::{destuff, stuff, ESCAPE, ESCAPE_XOR, FLAG};
