//! Media handle abstraction.
//!
//! The replay engine never decodes anything itself. A host provides a
//! [`MediaRoot`] that mounts one decodable [`MediaHandle`] per segment; the
//! player only toggles visibility, seeks, starts and pauses handles, and
//! listens for their lifecycle events.

pub mod simulated;

use crate::error::MediaError;
use crate::segments::Segment;

pub use simulated::{SimulatedHandle, SimulatedRoot};

/// Lifecycle signals emitted by a media handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleEvent {
    /// Media is decodable (metadata loaded)
    Loaded,
    /// Playback reached the end of the media
    Ended,
    /// Media could not be decoded
    Failed(MediaError),
}

/// A decodable media object bound to exactly one segment.
pub trait MediaHandle {
    /// Make this handle the visible one.
    fn show(&mut self);

    fn hide(&mut self);

    fn is_visible(&self) -> bool;

    /// Move the playhead to `offset_ms` into the segment.
    ///
    /// Offsets past the media length clamp to its end.
    fn seek(&mut self, offset_ms: u64);

    /// Current playhead position within the segment (ms).
    fn position(&self) -> u64;

    fn play(&mut self);

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    fn set_playback_rate(&mut self, rate: f64);

    fn playback_rate(&self) -> f64;

    /// Whether the media is decodable yet.
    fn is_ready(&self) -> bool;

    /// Length of the media (ms).
    fn duration_ms(&self) -> u64;

    /// Drain the events emitted since the last call.
    fn poll_events(&mut self) -> Vec<HandleEvent>;
}

/// Mount point that creates media handles for segments.
pub trait MediaRoot {
    /// Create and mount the handle for `segment`. Called once per segment.
    fn attach(&mut self, segment: &Segment) -> Result<Box<dyn MediaHandle>, MediaError>;
}
