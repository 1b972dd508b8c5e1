//! segreplay - play gapped screen-recording segments as one seekable timeline
//!
//! A replay is stored as discrete video chunks with absolute start timestamps
//! and possible gaps between them. This crate indexes the chunks, keeps a
//! virtual clock that runs across gaps, and schedules which chunk is shown
//! and playing at every point of the timeline.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod player;
pub mod segments;
pub mod timer;

pub use config::Config;
pub use error::{MediaError, ReplayError};
pub use player::{PlayerOptions, PlayerState, SegmentPlayer};
pub use segments::{Segment, SegmentList};
