use linksim_frame::FrameError;

/// Errors that can occur at the data-link boundary.
///
/// Channel events (loss, corruption, ACK loss) are not errors; they
/// are expected, retried, and recorded in the owning frame's log. Only
/// input problems and concurrent-run misuse surface here.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Framing-level error (empty input, bad stuffing).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// `start` was called before any data was loaded.
    #[error("no frames to transmit")]
    NoFrames,

    /// A transmission run is already active for this frame set.
    #[error("transmission already in progress")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, LinkError>;
