//! Player state and shared types
//!
//! Contains the playback state machine states, the options a player is
//! built with, and the payloads handed to host callbacks.

use serde::{Deserialize, Serialize};

/// Playback state machine.
///
/// `Idle` → `Playing` ⇄ `Paused` → `Finished`. `Finished` is only entered when
/// the last segment's handle reports natural completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Constructed, first segment prepared, nothing playing
    Idle,
    Playing,
    Paused,
    /// Last segment completed
    Finished,
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PlayerState::Idle => "idle",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Finished => "finished",
        };
        f.write_str(label)
    }
}

/// What to do when a segment's media cannot be attached or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadFailurePolicy {
    /// Treat the segment as a gap and continue with the next one
    #[default]
    Skip,
    /// Leave playback where it is (the timeline keeps running, nothing shows)
    Stall,
}

/// Options a [`SegmentPlayer`](super::SegmentPlayer) is built with.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    /// Absolute time of relative offset 0. Defaults to the replay's start.
    pub origin_timestamp: Option<u64>,
    /// Initial playback speed multiplier
    pub speed: f64,
    /// Let the playback speed also shorten/lengthen waits across gaps
    pub scale_gaps_with_speed: bool,
    pub on_load_failure: LoadFailurePolicy,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            origin_timestamp: None,
            speed: 1.0,
            scale_gaps_with_speed: false,
            on_load_failure: LoadFailurePolicy::Skip,
        }
    }
}

/// Host-facing runtime configuration update (`setConfig`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigUpdate {
    pub speed: Option<f64>,
}

/// Payload of the `on_loaded` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedEvent {
    /// Position of the segment in the replay
    pub segment_index: usize,
    pub media_ref: String,
    pub duration_ms: u64,
}

/// Timer payload for a wait across a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GapWait {
    /// Start playing this segment
    Segment(usize),
    /// End of the timeline reached with no media left
    End,
}
