//! Replay segment player
//!
//! Plays a replay recorded as discrete, possibly gapped media segments as if
//! it were one continuous, seekable timeline.
//!
//! # Architecture
//!
//! The player is organized into submodules:
//! - `state`: state machine states, options and callback payloads
//! - `segment_player`: the scheduler driving media handles and the virtual timer
//! - `render/`: text rendering of the timeline (progress bar, status line)
//!
//! # Usage
//!
//! ```no_run
//! use std::rc::Rc;
//! use segreplay::media::SimulatedRoot;
//! use segreplay::player::{PlayerOptions, PlayerState, SegmentPlayer};
//! use segreplay::segments::SegmentList;
//! use segreplay::timer::{Clock, SystemClock};
//!
//! let segments = SegmentList::parse("replay.json").unwrap();
//! let clock: Rc<dyn Clock> = Rc::new(SystemClock::new());
//! let mut root = SimulatedRoot::new(clock.clone());
//! let mut player = SegmentPlayer::new(segments, &mut root, clock, PlayerOptions::default());
//!
//! player.play(0);
//! while player.tick() != PlayerState::Finished {
//!     std::thread::sleep(std::time::Duration::from_millis(50));
//! }
//! ```

pub mod render;
mod segment_player;
pub mod state;

pub use segment_player::SegmentPlayer;
pub use state::{ConfigUpdate, LoadFailurePolicy, LoadedEvent, PlayerOptions, PlayerState};
