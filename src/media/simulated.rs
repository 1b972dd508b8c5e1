//! Clock-driven stand-in for decodable media.
//!
//! Used by the CLI host and by tests. A simulated handle becomes ready after
//! a configurable load latency, advances its playhead with the shared clock
//! times the playback rate, and emits `Ended` when it reaches its duration.

use std::collections::HashSet;
use std::rc::Rc;

use super::{HandleEvent, MediaHandle, MediaRoot};
use crate::error::MediaError;
use crate::segments::Segment;
use crate::timer::Clock;

/// Mount point producing [`SimulatedHandle`]s.
pub struct SimulatedRoot {
    clock: Rc<dyn Clock>,
    load_latency_ms: u64,
    attach_failures: HashSet<String>,
    decode_failures: HashSet<String>,
    attached: usize,
}

impl SimulatedRoot {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            load_latency_ms: 0,
            attach_failures: HashSet::new(),
            decode_failures: HashSet::new(),
            attached: 0,
        }
    }

    /// Delay between attaching a handle and it becoming decodable.
    pub fn with_load_latency(mut self, ms: u64) -> Self {
        self.load_latency_ms = ms;
        self
    }

    /// Make attaching the media at `uri` fail.
    pub fn fail_attach(mut self, uri: impl Into<String>) -> Self {
        self.attach_failures.insert(uri.into());
        self
    }

    /// Make the media at `uri` attach but fail to decode once loaded.
    pub fn fail_decode(mut self, uri: impl Into<String>) -> Self {
        self.decode_failures.insert(uri.into());
        self
    }

    /// Number of handles mounted so far.
    pub fn attached(&self) -> usize {
        self.attached
    }
}

impl MediaRoot for SimulatedRoot {
    fn attach(&mut self, segment: &Segment) -> Result<Box<dyn MediaHandle>, MediaError> {
        if self.attach_failures.contains(&segment.media_ref) {
            return Err(MediaError::AttachFailed {
                uri: segment.media_ref.clone(),
                reason: "simulated attach failure".to_string(),
            });
        }

        let failure = self
            .decode_failures
            .contains(&segment.media_ref)
            .then(|| MediaError::DecodeFailed {
                uri: segment.media_ref.clone(),
                reason: "simulated decode failure".to_string(),
            });

        let ready_at = self.clock.now_ms() + self.load_latency_ms;
        self.attached += 1;
        Ok(Box::new(SimulatedHandle::new(
            self.clock.clone(),
            segment.duration_ms,
            ready_at,
            failure,
        )))
    }
}

/// Simulated media element.
pub struct SimulatedHandle {
    clock: Rc<dyn Clock>,
    duration: u64,
    ready_at: u64,
    failure: Option<MediaError>,
    load_reported: bool,
    visible: bool,
    playing: bool,
    rate: f64,
    /// Playhead at the last anchor point
    base_position: u64,
    /// Clock reading at the last anchor point
    anchor: u64,
    ended_reported: bool,
}

impl SimulatedHandle {
    pub fn new(
        clock: Rc<dyn Clock>,
        duration: u64,
        ready_at: u64,
        failure: Option<MediaError>,
    ) -> Self {
        let anchor = clock.now_ms();
        Self {
            clock,
            duration,
            ready_at,
            failure,
            load_reported: false,
            visible: false,
            playing: false,
            rate: 1.0,
            base_position: 0,
            anchor,
            ended_reported: false,
        }
    }

    fn load_complete(&self) -> bool {
        self.clock.now_ms() >= self.ready_at
    }

    fn reanchor(&mut self) {
        self.base_position = self.position();
        self.anchor = self.clock.now_ms();
    }
}

impl MediaHandle for SimulatedHandle {
    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn seek(&mut self, offset_ms: u64) {
        self.base_position = offset_ms.min(self.duration);
        self.anchor = self.clock.now_ms();
        self.ended_reported = false;
    }

    fn position(&self) -> u64 {
        if !self.playing || !self.is_ready() {
            return self.base_position;
        }
        // Playback cannot progress before the media is decodable
        let started = self.anchor.max(self.ready_at);
        let elapsed = self.clock.now_ms().saturating_sub(started);
        let advanced = (elapsed as f64 * self.rate).round() as u64;
        (self.base_position + advanced).min(self.duration)
    }

    fn play(&mut self) {
        if !self.playing {
            self.anchor = self.clock.now_ms();
            self.playing = true;
            self.ended_reported = false;
        }
    }

    fn pause(&mut self) {
        if self.playing {
            self.reanchor();
            self.playing = false;
        }
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.reanchor();
        self.rate = rate;
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn is_ready(&self) -> bool {
        self.failure.is_none() && self.load_complete()
    }

    fn duration_ms(&self) -> u64 {
        self.duration
    }

    fn poll_events(&mut self) -> Vec<HandleEvent> {
        let mut events = Vec::new();

        if !self.load_reported && self.load_complete() {
            self.load_reported = true;
            match &self.failure {
                Some(err) => events.push(HandleEvent::Failed(err.clone())),
                None => events.push(HandleEvent::Loaded),
            }
        }

        if self.playing && self.is_ready() && !self.ended_reported {
            let position = self.position();
            if position >= self.duration {
                self.base_position = self.duration;
                self.anchor = self.clock.now_ms();
                self.playing = false;
                self.ended_reported = true;
                events.push(HandleEvent::Ended);
            }
        }

        events
    }
}
