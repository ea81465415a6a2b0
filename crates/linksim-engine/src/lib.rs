//! Lossy-channel transmission engine for the data-link simulator.
//!
//! Frames produced by `linksim-frame` are driven one at a time through
//! a simulated channel that can lose a frame, corrupt it, or drop its
//! acknowledgment. Each frame retries up to [`engine::MAX_RETRIES`]
//! times before it is marked failed; the run then aggregates every
//! frame's CRC into an end-to-end checksum and sends it as a stuffed
//! trailer frame subject to its own corruption roll.
//!
//! The engine runs on a worker thread and reports progress as owned
//! [`Event`] values over an `mpsc` channel, so observers never see
//! references into live state.

pub mod channel;
pub mod engine;
pub mod error;
pub mod event;
pub mod link;

pub use channel::{
    Channel, Sampler, ACK_LOSS_PROBABILITY, CHECKSUM_CORRUPTION_PROBABILITY,
    CORRUPTION_PROBABILITY, LOSS_PROBABILITY,
};
pub use engine::{ChecksumMode, EngineConfig, MAX_RETRIES};
pub use error::{LinkError, Result};
pub use event::{Checksum, Event, Summary};
pub use link::{DataLink, StopHandle};
