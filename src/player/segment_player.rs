//! Segment player: one seekable timeline over gapped media segments.
//!
//! The player owns one media handle per segment and a [`VirtualTimer`]. The
//! timer is the source of truth for the current playback time; handles are
//! shown, seeked and started so that the visible frame follows it, including
//! across gaps where no segment has media.
//!
//! Only the active handle is subscribed: `Loaded`/`Ended` events from any
//! other handle are drained and dropped so a superseded segment can never
//! trigger a transition.

use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::{MediaError, ReplayError};
use crate::media::{HandleEvent, MediaHandle, MediaRoot};
use crate::segments::{Location, SegmentIndex, SegmentList};
use crate::timer::{Clock, NotificationId, VirtualTimer};

use super::state::{
    ConfigUpdate, GapWait, LoadFailurePolicy, LoadedEvent, PlayerOptions, PlayerState,
};

enum Slot {
    Ready(Box<dyn MediaHandle>),
    Failed(MediaError),
}

/// Drives playback of a replay made of discrete media segments.
pub struct SegmentPlayer {
    index: SegmentIndex,
    slots: Vec<Slot>,
    timer: VirtualTimer<GapWait>,
    origin: u64,
    options: PlayerOptions,
    speed: f64,
    state: PlayerState,
    /// Segment whose handle is subscribed (shown or prepared)
    active: Option<usize>,
    /// Whether play or pause has positioned the replay yet
    activated: bool,
    gap_wait: Option<NotificationId>,
    loaded: Vec<bool>,
    on_loaded: Option<Box<dyn FnMut(LoadedEvent)>>,
    on_finished: Option<Box<dyn FnMut()>>,
}

impl SegmentPlayer {
    /// Build a player, mounting one handle per segment into `root`.
    ///
    /// Segments whose media cannot be attached are kept as failed slots and
    /// handled per [`PlayerOptions::on_load_failure`] when playback reaches them.
    pub fn new(
        segments: SegmentList,
        root: &mut dyn MediaRoot,
        clock: Rc<dyn Clock>,
        options: PlayerOptions,
    ) -> Self {
        let origin = options
            .origin_timestamp
            .unwrap_or_else(|| segments.origin_timestamp());

        let speed = if is_valid_speed(options.speed) {
            options.speed
        } else {
            warn!(error = %ReplayError::InvalidSpeed(options.speed), "falling back to 1x");
            1.0
        };

        let segments = segments.into_segments();
        let mut slots = Vec::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            match root.attach(segment) {
                Ok(mut handle) => {
                    handle.hide();
                    handle.set_playback_rate(speed);
                    slots.push(Slot::Ready(handle));
                }
                Err(source) => {
                    let err = ReplayError::MediaLoadFailure {
                        index: i,
                        source: source.clone(),
                    };
                    warn!(error = %err, "segment media unavailable");
                    slots.push(Slot::Failed(source));
                }
            }
        }

        let mut timer = VirtualTimer::new(clock);
        if options.scale_gaps_with_speed {
            timer.set_rate(speed);
        }

        // First segment is prepared but stays hidden until playback starts
        if let Some(Slot::Ready(handle)) = slots.first_mut() {
            handle.seek(0);
        }

        debug!(segments = segments.len(), origin, "replay player ready");

        let loaded = vec![false; segments.len()];
        Self {
            index: SegmentIndex::new(segments),
            slots,
            timer,
            origin,
            options,
            speed,
            state: PlayerState::Idle,
            active: None,
            activated: false,
            gap_wait: None,
            loaded,
            on_loaded: None,
            on_finished: None,
        }
    }

    /// Called once per segment when it is active and its media is decodable.
    pub fn on_loaded(&mut self, callback: impl FnMut(LoadedEvent) + 'static) {
        self.on_loaded = Some(Box::new(callback));
    }

    /// Called when the last segment completes.
    pub fn on_finished(&mut self, callback: impl FnMut() + 'static) {
        self.on_finished = Some(Box::new(callback));
    }

    /// Start playback from `offset_ms` on the replay timeline.
    ///
    /// Inside a gap the upcoming segment's first frame is shown paused until
    /// the timeline reaches its start. A segment that ends naturally into a
    /// gap is hidden instead, so `pause(t)` followed by `play(t)` restores the
    /// previous picture only when `t` is inside a segment or the gap was
    /// itself entered through `play`.
    ///
    /// Ignored once the replay has finished.
    pub fn play(&mut self, offset_ms: u64) {
        if self.state == PlayerState::Finished {
            debug!(offset_ms, "play ignored, replay finished");
            return;
        }
        self.cancel_gap_wait();
        if self.index.is_empty() {
            debug!(offset_ms, "play ignored, replay has no segments");
            return;
        }

        self.timer.start(offset_ms);
        self.state = PlayerState::Playing;
        self.activated = true;

        let target = self.origin.saturating_add(offset_ms);
        let location = self.index.locate(target);
        debug!(offset_ms, ?location, "play");

        match location {
            Location::Exact(i) => {
                let intra = target - self.segment_start(i);
                self.start_segment_at(i, intra);
            }
            Location::Gap { preceding } if preceding + 1 >= self.index.len() => {
                // Past the end: run the last segment out so it completes normally
                if self.is_playable(preceding) {
                    let end = self.segment_duration(preceding);
                    self.start_segment_at(preceding, end);
                } else {
                    self.detach_active();
                    self.wait_for_end();
                }
            }
            location => self.resume_from(location.upcoming(), true),
        }
    }

    /// Pause at `offset_ms`, showing the frame for that position.
    ///
    /// Ignored once the replay has finished.
    pub fn pause(&mut self, offset_ms: u64) {
        if self.state == PlayerState::Finished {
            debug!(offset_ms, "pause ignored, replay finished");
            return;
        }
        self.cancel_gap_wait();
        if let Some(i) = self.active {
            if let Ok(handle) = self.handle_mut(i) {
                handle.pause();
            }
        }
        self.timer.stop(offset_ms);

        if self.index.is_empty() {
            debug!(offset_ms, "pause ignored, replay has no segments");
            return;
        }
        self.state = PlayerState::Paused;
        self.activated = true;

        let target = self.origin.saturating_add(offset_ms);
        let (segment, intra) = match self.index.locate(target) {
            Location::Exact(i) => (i, target - self.segment_start(i)),
            // Nearest preceding segment, on its last frame
            Location::Gap { preceding } => (preceding, self.segment_duration(preceding)),
            Location::BeforeStart => (0, 0),
        };
        debug!(offset_ms, segment, intra, "pause");

        match self.activate(segment) {
            Ok(()) => {
                if let Ok(handle) = self.handle_mut(segment) {
                    handle.pause();
                    handle.seek(intra);
                }
            }
            Err(err) => debug!(error = %err, "nothing to show while paused"),
        }
    }

    /// Change the playback speed multiplier.
    ///
    /// Applies to the shown handle immediately. Neither the handle's position
    /// nor the elapsed timeline time is reset.
    pub fn set_speed(&mut self, speed: f64) {
        if !is_valid_speed(speed) {
            warn!(error = %ReplayError::InvalidSpeed(speed), "speed change ignored");
            return;
        }

        self.speed = speed;
        if let Some(i) = self.active {
            if let Ok(handle) = self.handle_mut(i) {
                handle.set_playback_rate(speed);
            }
        }
        if self.options.scale_gaps_with_speed {
            self.timer.set_rate(speed);
        }
        debug!(speed, "playback speed changed");
    }

    pub fn set_config(&mut self, update: ConfigUpdate) {
        if let Some(speed) = update.speed {
            self.set_speed(speed);
        }
    }

    /// Current position on the replay timeline (ms).
    ///
    /// Always read from the virtual timer, never from a media handle.
    pub fn current_time(&self) -> u64 {
        if !self.activated {
            return 0;
        }
        self.timer.time()
    }

    /// Run one step of the playback loop.
    ///
    /// Drains handle events and due timer wake-ups, then returns the state.
    pub fn tick(&mut self) -> PlayerState {
        let mut events = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Slot::Ready(handle) = slot {
                events.extend(handle.poll_events().into_iter().map(|event| (i, event)));
            }
        }
        for (i, event) in events {
            self.dispatch(i, event);
        }

        for wake in self.timer.poll_due() {
            self.gap_wait = None;
            if self.state != PlayerState::Playing {
                continue;
            }
            match wake {
                GapWait::Segment(i) => self.start_segment_at(i, 0),
                GapWait::End => self.finish(),
            }
        }

        self.state
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Segment whose handle is currently subscribed.
    pub fn active_segment(&self) -> Option<usize> {
        self.active
    }

    /// Segment whose handle is currently shown, if any.
    pub fn visible_segment(&self) -> Option<usize> {
        self.slots.iter().position(|slot| match slot {
            Slot::Ready(handle) => handle.is_visible(),
            Slot::Failed(_) => false,
        })
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn origin_timestamp(&self) -> u64 {
        self.origin
    }

    pub fn segments(&self) -> &[crate::segments::Segment] {
        self.index.segments()
    }

    /// Length of the replay timeline (ms).
    pub fn duration(&self) -> u64 {
        self.index
            .segments()
            .last()
            .map(|s| s.end_timestamp().saturating_sub(self.origin))
            .unwrap_or(0)
    }

    /// Media handle of segment `index`, unless its media failed.
    pub fn handle(&self, index: usize) -> Option<&dyn MediaHandle> {
        match self.slots.get(index) {
            Some(Slot::Ready(handle)) => Some(handle.as_ref()),
            _ => None,
        }
    }

    fn dispatch(&mut self, index: usize, event: HandleEvent) {
        match event {
            HandleEvent::Failed(err) => self.on_media_failed(index, err),
            event if self.active != Some(index) => {
                debug!(segment = index, ?event, "dropping event from detached handle");
            }
            HandleEvent::Loaded => self.report_loaded(index),
            HandleEvent::Ended => self.on_segment_ended(index),
        }
    }

    fn on_segment_ended(&mut self, index: usize) {
        if self.state != PlayerState::Playing {
            return;
        }
        debug!(segment = index, at = self.timer.time(), "segment ended");

        if index + 1 >= self.index.len() {
            self.finish();
            return;
        }

        // Nothing is visible while waiting across a gap
        self.detach_active();
        self.resume_from(index + 1, false);
    }

    fn on_media_failed(&mut self, index: usize, source: MediaError) {
        let err = ReplayError::MediaLoadFailure {
            index,
            source: source.clone(),
        };
        warn!(error = %err, "media failed to load");

        let was_active = self.active == Some(index);
        if was_active {
            self.detach_active();
        }
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Slot::Failed(source);
        }

        if was_active && self.state == PlayerState::Playing {
            self.skip_or_stall(index);
        }
    }

    /// Continue with segment `from` or the first playable one after it.
    fn resume_from(&mut self, from: usize, preview: bool) {
        let next = match self.options.on_load_failure {
            LoadFailurePolicy::Skip => self.playable_from(from),
            LoadFailurePolicy::Stall => (from < self.index.len()).then_some(from),
        };

        match next {
            Some(next) => self.wait_for_segment(next, preview),
            None => self.wait_for_end(),
        }
    }

    /// Start `index` once the timeline reaches its start.
    ///
    /// With `preview`, its first frame is shown while waiting.
    fn wait_for_segment(&mut self, index: usize, preview: bool) {
        let start = self.segment_start(index).saturating_sub(self.origin);
        if start <= self.timer.time() {
            self.start_segment_at(index, 0);
            return;
        }

        if preview {
            match self.activate(index) {
                Ok(()) => {
                    if let Ok(handle) = self.handle_mut(index) {
                        handle.pause();
                        handle.seek(0);
                    }
                }
                Err(err) => debug!(error = %err, "no preview frame"),
            }
        }

        self.gap_wait = Some(self.timer.add_notification_at(start, GapWait::Segment(index)));
        debug!(segment = index, at = start, "waiting across gap");
    }

    /// No media left: let the timeline run to its end, then finish.
    fn wait_for_end(&mut self) {
        let end = self.duration();
        if end <= self.timer.time() {
            self.finish();
            return;
        }
        self.gap_wait = Some(self.timer.add_notification_at(end, GapWait::End));
    }

    fn start_segment_at(&mut self, index: usize, offset_ms: u64) {
        if let Err(err) = self.activate(index) {
            warn!(error = %err, "cannot start segment");
            self.skip_or_stall(index);
            return;
        }
        if let Ok(handle) = self.handle_mut(index) {
            handle.seek(offset_ms);
            handle.play();
        }
        debug!(segment = index, offset_ms, "segment playing");
    }

    fn skip_or_stall(&mut self, failed: usize) {
        match self.options.on_load_failure {
            LoadFailurePolicy::Skip => {
                self.cancel_gap_wait();
                self.resume_from(failed + 1, true);
            }
            LoadFailurePolicy::Stall => debug!(segment = failed, "stalling on unavailable segment"),
        }
    }

    fn finish(&mut self) {
        if self.state == PlayerState::Finished {
            return;
        }
        // Nothing may wake the player after completion
        self.gap_wait = None;
        self.timer.cancel_all();
        let now = self.timer.time();
        self.timer.stop(now);
        if let Some(i) = self.active {
            if let Ok(handle) = self.handle_mut(i) {
                handle.pause();
            }
        }
        self.state = PlayerState::Finished;
        info!(at = now, "replay finished");

        if let Some(callback) = self.on_finished.as_mut() {
            callback();
        }
    }

    /// Make `index` the shown, subscribed segment.
    ///
    /// The previous handle is paused and hidden first, so at most one handle
    /// is ever visible.
    fn activate(&mut self, index: usize) -> Result<(), ReplayError> {
        if self.active != Some(index) {
            self.detach_active();
        }

        let speed = self.speed;
        let handle = self.handle_mut(index)?;
        handle.set_playback_rate(speed);
        handle.show();
        let ready = handle.is_ready();

        self.active = Some(index);
        if ready {
            self.report_loaded(index);
        }
        Ok(())
    }

    fn detach_active(&mut self) {
        if let Some(prev) = self.active.take() {
            if let Ok(handle) = self.handle_mut(prev) {
                handle.pause();
                handle.hide();
            }
        }
    }

    fn report_loaded(&mut self, index: usize) {
        let Some(reported) = self.loaded.get_mut(index) else {
            return;
        };
        if *reported {
            return;
        }
        let duration_ms = match self.slots.get(index) {
            Some(Slot::Ready(handle)) => handle.duration_ms(),
            _ => return,
        };
        *reported = true;

        let media_ref = self
            .index
            .get(index)
            .map(|s| s.media_ref.clone())
            .unwrap_or_default();
        debug!(segment = index, %media_ref, "segment loaded");

        if let Some(callback) = self.on_loaded.as_mut() {
            callback(LoadedEvent {
                segment_index: index,
                media_ref,
                duration_ms,
            });
        }
    }

    fn cancel_gap_wait(&mut self) {
        if let Some(id) = self.gap_wait.take() {
            self.timer.cancel(id);
        }
    }

    fn handle_mut(&mut self, index: usize) -> Result<&mut dyn MediaHandle, ReplayError> {
        let len = self.slots.len();
        match self.slots.get_mut(index) {
            Some(Slot::Ready(handle)) => Ok(handle.as_mut()),
            Some(Slot::Failed(source)) => Err(ReplayError::MediaLoadFailure {
                index,
                source: source.clone(),
            }),
            None => Err(ReplayError::InvalidSegmentIndex { index, len }),
        }
    }

    fn is_playable(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Ready(_)))
    }

    fn playable_from(&self, from: usize) -> Option<usize> {
        (from..self.slots.len()).find(|&i| self.is_playable(i))
    }

    fn segment_start(&self, index: usize) -> u64 {
        self.index.get(index).map(|s| s.start_timestamp).unwrap_or(0)
    }

    fn segment_duration(&self, index: usize) -> u64 {
        self.index.get(index).map(|s| s.duration_ms).unwrap_or(0)
    }
}

impl Drop for SegmentPlayer {
    fn drop(&mut self) {
        self.cancel_gap_wait();
        self.detach_active();
    }
}

impl std::fmt::Debug for SegmentPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentPlayer")
            .field("segments", &self.index.len())
            .field("origin", &self.origin)
            .field("state", &self.state)
            .field("active", &self.active)
            .field("speed", &self.speed)
            .field("timer", &self.timer)
            .finish()
    }
}

fn is_valid_speed(speed: f64) -> bool {
    speed.is_finite() && speed > 0.0
}
