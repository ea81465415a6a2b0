/// Errors that can occur while framing or deframing payloads.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The input byte stream was empty; no frames can be produced.
    #[error("empty input (no frames produced)")]
    EmptyInput,

    /// A stuffed payload is missing its leading or trailing flag byte,
    /// or is too short to contain both.
    #[error("bad framing: {0}")]
    BadFraming(&'static str),
}

pub type Result<T> = std::result::Result<T, FrameError>;
