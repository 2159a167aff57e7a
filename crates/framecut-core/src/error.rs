// crates/framecut-core/src/error.rs
//
// Error taxonomy shared by every engine operation.
//
// Per-operation failures (one capture, one extraction) come back to the
// caller as one of these and never poison the session. The profiler is the
// only component that swallows its errors — it degrades to
// ProfileOutcome::Failed instead of returning Err.

/// Result alias carrying [`FrameCutError`].
pub type Result<T> = std::result::Result<T, FrameCutError>;

#[derive(Debug, thiserror::Error)]
pub enum FrameCutError {
    /// Dimensions or duration of the source are not known yet.
    #[error("source not ready: {0}")]
    SourceNotReady(String),

    /// The selected file is not a video (or has no decodable video stream).
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// Audio or video decode rejected the payload.
    #[error("decode failed: {0}")]
    DecodeFailure(String),

    /// A size or duration limit was hit. The message names the bound.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Trim end ≤ start, or a degenerate sample count.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Container, image or archive serialization failed.
    #[error("encoding failed: {0}")]
    EncodingFailure(String),

    /// A batch job failed or was cancelled; partial output was discarded.
    #[error("pipeline aborted: {0}")]
    PipelineAborted(String),

    /// A second job of the same kind was started while one is running.
    #[error("a {0} job is already running")]
    JobAlreadyRunning(&'static str),

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Reason string carried by a cancelled [`FrameCutError::PipelineAborted`].
pub const CANCELLED: &str = "cancelled";

impl FrameCutError {
    /// True for the user-initiated cancel of a batch job, as opposed to a
    /// real failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FrameCutError::PipelineAborted(reason) if reason == CANCELLED)
    }

    pub(crate) fn encoding(e: impl std::fmt::Display) -> Self {
        FrameCutError::EncodingFailure(e.to_string())
    }
}
