//! End-to-end playback tests against the simulated backend and a manual clock

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use segreplay::media::SimulatedRoot;
use segreplay::player::{
    ConfigUpdate, LoadFailurePolicy, LoadedEvent, PlayerOptions, PlayerState, SegmentPlayer,
};
use segreplay::segments::SegmentList;
use segreplay::timer::ManualClock;

use crate::helpers::fixtures_dir;

struct Harness {
    clock: Rc<ManualClock>,
    player: SegmentPlayer,
    finished: Rc<Cell<usize>>,
    loaded: Rc<RefCell<Vec<LoadedEvent>>>,
}

impl Harness {
    fn new(options: PlayerOptions, root: impl FnOnce(SimulatedRoot) -> SimulatedRoot) -> Self {
        let list = SegmentList::parse(fixtures_dir().join("scenario.json")).unwrap();
        let clock = Rc::new(ManualClock::new());
        let mut root = root(SimulatedRoot::new(clock.clone()));
        let mut player = SegmentPlayer::new(list, &mut root, clock.clone(), options);

        let finished = Rc::new(Cell::new(0));
        let counter = finished.clone();
        player.on_finished(move || counter.set(counter.get() + 1));

        let loaded = Rc::new(RefCell::new(Vec::new()));
        let sink = loaded.clone();
        player.on_loaded(move |event| sink.borrow_mut().push(event));

        Self {
            clock,
            player,
            finished,
            loaded,
        }
    }

    fn scenario() -> Self {
        Self::new(PlayerOptions::default(), |root| root)
    }

    /// Advance wall time and run one tick.
    fn step(&mut self, ms: u64) -> PlayerState {
        self.clock.advance(ms);
        self.player.tick()
    }

    fn playing(&self, index: usize) -> bool {
        self.player
            .handle(index)
            .map(|h| h.is_playing() && h.is_visible())
            .unwrap_or(false)
    }
}

#[test]
fn plays_through_gaps_and_finishes_once() {
    let mut h = Harness::scenario();
    h.player.play(0);
    assert!(h.playing(0));

    // Segment 0 ends; nothing is visible while waiting for segment 1
    h.step(1000);
    assert_eq!(h.player.visible_segment(), None);
    assert_eq!(h.player.state(), PlayerState::Playing);

    h.step(200);
    assert_eq!(h.player.current_time(), 1200);
    assert_eq!(h.player.visible_segment(), None);

    h.step(300);
    assert!(h.playing(1));

    h.step(1000);
    assert_eq!(h.player.visible_segment(), None);

    h.step(500);
    assert!(h.playing(2));
    assert_eq!(h.finished.get(), 0);

    assert_eq!(h.step(500), PlayerState::Finished);
    assert_eq!(h.finished.get(), 1);
    assert_eq!(h.player.current_time(), 3500);

    // Time stops and the callback does not fire again
    assert_eq!(h.step(1000), PlayerState::Finished);
    assert_eq!(h.player.current_time(), 3500);
    assert_eq!(h.finished.get(), 1);
}

#[test]
fn pause_in_gap_shows_last_frame_of_preceding_segment() {
    let mut h = Harness::scenario();
    h.player.play(0);
    h.step(100);

    h.player.pause(1200);
    assert_eq!(h.player.state(), PlayerState::Paused);
    assert_eq!(h.player.current_time(), 1200);
    assert_eq!(h.player.visible_segment(), Some(0));
    let handle = h.player.handle(0).unwrap();
    assert_eq!(handle.position(), 1000);
    assert!(!handle.is_playing());

    // Paused time does not move
    h.step(700);
    assert_eq!(h.player.current_time(), 1200);
}

#[test]
fn play_from_gap_waits_then_starts_next_segment() {
    let mut h = Harness::scenario();
    h.player.pause(1200);
    h.player.play(1200);

    // First frame of the upcoming segment is shown but not played
    assert_eq!(h.player.visible_segment(), Some(1));
    assert!(!h.player.handle(1).unwrap().is_playing());

    h.step(299);
    assert!(!h.playing(1));
    h.step(1);
    assert!(h.playing(1));
    assert_eq!(h.player.handle(1).unwrap().position(), 0);
}

#[test]
fn seeking_into_a_segment_resumes_at_the_right_offset() {
    let mut h = Harness::scenario();
    h.player.play(2000);
    assert!(h.playing(1));
    assert_eq!(h.player.handle(1).unwrap().position(), 500);

    h.step(250);
    assert_eq!(h.player.current_time(), 2250);
    assert_eq!(h.player.handle(1).unwrap().position(), 750);
}

#[test]
fn superseded_gap_wait_does_not_fire() {
    let mut h = Harness::scenario();
    h.player.play(1200);
    h.step(100);

    // Jump into segment 2; the pending wait for segment 1 is dropped
    h.player.play(3100);
    h.step(300);
    assert!(h.playing(2));
    assert_eq!(h.player.visible_segment(), Some(2));
}

#[test]
fn speed_change_keeps_position_and_time() {
    let options = PlayerOptions {
        scale_gaps_with_speed: true,
        ..PlayerOptions::default()
    };
    let mut h = Harness::new(options, |root| root);
    h.player.play(0);
    h.step(200);

    h.player.set_config(ConfigUpdate { speed: Some(2.0) });
    assert_eq!(h.player.current_time(), 200);
    assert_eq!(h.player.handle(0).unwrap().position(), 200);
    assert_eq!(h.player.handle(0).unwrap().playback_rate(), 2.0);

    h.step(100);
    assert_eq!(h.player.current_time(), 400);
    assert_eq!(h.player.handle(0).unwrap().position(), 400);
}

#[test]
fn loaded_is_reported_once_per_segment() {
    let mut h = Harness::new(PlayerOptions::default(), |root| root.with_load_latency(50));
    h.player.play(0);
    assert!(h.loaded.borrow().is_empty());

    h.step(50);
    h.step(1);
    assert_eq!(h.loaded.borrow().len(), 1);
    assert_eq!(h.loaded.borrow()[0].segment_index, 0);
    assert_eq!(h.loaded.borrow()[0].media_ref, "seg-0.mp4");

    h.player.pause(500);
    h.player.play(500);
    h.step(10);
    assert_eq!(h.loaded.borrow().len(), 1);
}

#[test]
fn failed_segment_is_skipped_like_a_gap() {
    let mut h = Harness::new(PlayerOptions::default(), |root| root.fail_attach("seg-1.mp4"));
    h.player.play(0);

    h.step(1000);
    h.step(1000);
    assert_eq!(h.player.current_time(), 2000);
    assert_eq!(h.player.visible_segment(), None);

    h.step(1000);
    assert!(h.playing(2));

    h.step(500);
    assert_eq!(h.finished.get(), 1);
}

#[test]
fn stall_policy_leaves_nothing_playing() {
    let options = PlayerOptions {
        on_load_failure: LoadFailurePolicy::Stall,
        ..PlayerOptions::default()
    };
    let mut h = Harness::new(options, |root| root.fail_attach("seg-1.mp4"));
    h.player.play(1600);

    h.step(2000);
    assert_eq!(h.player.visible_segment(), None);
    assert_eq!(h.player.state(), PlayerState::Playing);
    assert_eq!(h.finished.get(), 0);
}

/// Active segment, visible segment and the active handle's offset.
fn snapshot(player: &SegmentPlayer) -> (Option<usize>, Option<usize>, Option<u64>) {
    let active = player.active_segment();
    let offset = active.and_then(|i| player.handle(i)).map(|h| h.position());
    (active, player.visible_segment(), offset)
}

#[test]
fn pause_then_play_inside_a_segment_restores_position() {
    let mut h = Harness::scenario();
    h.player.play(0);
    h.step(600);
    let before = snapshot(&h.player);
    assert_eq!(before, (Some(0), Some(0), Some(600)));

    h.player.pause(600);
    h.player.play(600);
    assert_eq!(snapshot(&h.player), before);
    assert!(h.playing(0));

    // Same for a seek target inside a later segment
    h.player.play(2200);
    let before = snapshot(&h.player);
    h.player.pause(2200);
    h.player.play(2200);
    assert_eq!(snapshot(&h.player), before);
    assert_eq!(before, (Some(1), Some(1), Some(700)));
}

#[test]
fn pause_then_play_in_a_gap_entered_by_play_restores_preview() {
    let mut h = Harness::scenario();
    h.player.play(1200);
    let before = snapshot(&h.player);
    assert_eq!(before, (Some(1), Some(1), Some(0)));

    h.player.pause(1200);
    assert_eq!(snapshot(&h.player), (Some(0), Some(0), Some(1000)));
    h.player.play(1200);
    assert_eq!(snapshot(&h.player), before);

    h.step(300);
    assert!(h.playing(1));
}

#[test]
fn natural_end_into_a_gap_hides_everything() {
    let mut h = Harness::scenario();
    h.player.play(0);
    h.step(1000);
    h.step(200);
    assert_eq!(snapshot(&h.player), (None, None, None));
}

#[test]
fn current_time_never_decreases_during_playback() {
    for speed in [1.0, 2.0] {
        for scale_gaps_with_speed in [false, true] {
            let options = PlayerOptions {
                speed,
                scale_gaps_with_speed,
                ..PlayerOptions::default()
            };
            let mut h = Harness::new(options, |root| root);
            h.player.play(0);

            let mut last = h.player.current_time();
            let mut steps = 0;
            while h.step(7) != PlayerState::Finished {
                let now = h.player.current_time();
                assert!(now >= last, "time went back from {} to {}", last, now);
                last = now;
                steps += 1;
                assert!(steps < 2000, "replay never finished");
            }
            assert!(h.player.current_time() >= last);
            assert_eq!(h.finished.get(), 1);
        }
    }
}

#[test]
fn failed_last_segment_finishes_at_timeline_end() {
    let mut h = Harness::new(PlayerOptions::default(), |root| root.fail_attach("seg-2.mp4"));
    h.player.play(0);

    let mut steps = 0;
    while h.step(10) != PlayerState::Finished {
        assert_eq!(h.finished.get(), 0);
        steps += 1;
        assert!(steps < 1000, "replay never finished");
    }
    assert_eq!(h.player.current_time(), h.player.duration());
    assert_eq!(h.player.duration(), 3500);
    assert_eq!(h.finished.get(), 1);
}

#[test]
fn play_past_end_with_failed_last_segment_finishes_once() {
    let mut h = Harness::new(PlayerOptions::default(), |root| root.fail_attach("seg-2.mp4"));
    h.player.play(4000);
    assert_eq!(h.player.state(), PlayerState::Finished);
    assert_eq!(h.finished.get(), 1);

    h.step(100);
    h.player.play(0);
    assert_eq!(h.player.state(), PlayerState::Finished);
    assert_eq!(h.finished.get(), 1);
}
