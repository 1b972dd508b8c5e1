//! Virtual playback clock.
//!
//! The replay timeline keeps advancing while no media is playing (gaps
//! between segments), so the current playback time cannot be read off a
//! media handle. `VirtualTimer` tracks it independently and lets the player
//! schedule one-shot wake-ups at future virtual times.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of wall-clock milliseconds.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed epoch. Must never go backwards.
    fn now_ms(&self) -> u64;
}

/// Monotonic clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for deterministic playback (tests, simulations).
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Jump to `ms`. Earlier values are ignored.
    pub fn set(&self, ms: u64) {
        if ms > self.now.get() {
            self.now.set(ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Handle for a registered notification, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

#[derive(Debug)]
struct Notification<T> {
    id: NotificationId,
    target: u64,
    payload: T,
}

/// Elapsed-time tracker with one-shot notifications.
///
/// Notifications carry a payload instead of a callback; the owner polls
/// [`VirtualTimer::poll_due`] from its run loop and acts on what comes back.
pub struct VirtualTimer<T> {
    clock: Rc<dyn Clock>,
    running: bool,
    /// Virtual time at the last anchor point
    base_time: u64,
    /// Wall clock reading at the last anchor point
    anchor: u64,
    /// Virtual ms per wall-clock ms
    rate: f64,
    next_id: u64,
    pending: Vec<Notification<T>>,
}

impl<T> VirtualTimer<T> {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        let anchor = clock.now_ms();
        Self {
            clock,
            running: false,
            base_time: 0,
            anchor,
            rate: 1.0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Start (or restart) running from `at_ms`.
    pub fn start(&mut self, at_ms: u64) {
        self.base_time = at_ms;
        self.anchor = self.clock.now_ms();
        self.running = true;
    }

    /// Freeze at `at_ms`. Pending notifications stay registered.
    pub fn stop(&mut self, at_ms: u64) {
        self.base_time = at_ms;
        self.anchor = self.clock.now_ms();
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current virtual time in ms.
    pub fn time(&self) -> u64 {
        if !self.running {
            return self.base_time;
        }
        let elapsed = self.clock.now_ms().saturating_sub(self.anchor);
        self.base_time + (elapsed as f64 * self.rate).round() as u64
    }

    /// Change how fast virtual time runs against the wall clock.
    ///
    /// Re-anchors first so the value returned by `time()` does not jump.
    pub fn set_rate(&mut self, rate: f64) {
        self.base_time = self.time();
        self.anchor = self.clock.now_ms();
        self.rate = rate;
    }

    /// Register `payload` to be returned by `poll_due` once `time() >= target_ms`.
    pub fn add_notification_at(&mut self, target_ms: u64, payload: T) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        self.pending.push(Notification {
            id,
            target: target_ms,
            payload,
        });
        id
    }

    /// Drop a pending notification. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: NotificationId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|n| n.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return the payloads that are due, earliest target first.
    ///
    /// Nothing fires while the timer is stopped.
    pub fn poll_due(&mut self) -> Vec<T> {
        if !self.running || self.pending.is_empty() {
            return Vec::new();
        }

        let now = self.time();
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|n| n.target <= now);
        self.pending = waiting;

        due.sort_by_key(|n| (n.target, n.id.0));
        due.into_iter().map(|n| n.payload).collect()
    }
}

impl<T> std::fmt::Debug for VirtualTimer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualTimer")
            .field("running", &self.running)
            .field("time", &self.time())
            .field("rate", &self.rate)
            .field("pending", &self.pending.len())
            .finish()
    }
}
