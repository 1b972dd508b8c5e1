//! Error types for the replay engine.

/// Errors raised by a media backend while mounting or decoding a segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("Failed to attach media '{uri}': {reason}")]
    AttachFailed { uri: String, reason: String },

    #[error("Failed to decode media '{uri}': {reason}")]
    DecodeFailed { uri: String, reason: String },
}

/// Errors that can occur while building or driving a replay.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Segment index {index} is out of range (replay has {len} segments)")]
    InvalidSegmentIndex { index: usize, len: usize },

    #[error("Segment {index} has no usable media: {source}")]
    MediaLoadFailure {
        index: usize,
        #[source]
        source: MediaError,
    },

    #[error("Segment {index} starts at {start} before the previous segment ({previous})")]
    UnsortedSegments { index: usize, start: u64, previous: u64 },

    #[error("Segment {index} starts at {start} inside the previous segment (ends at {previous_end})")]
    OverlappingSegments {
        index: usize,
        start: u64,
        previous_end: u64,
    },

    #[error("Playback speed must be a positive finite number (got {0})")]
    InvalidSpeed(f64),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReplayError>;
