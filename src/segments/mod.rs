//! Replay segments and the attachment manifest they are loaded from.
//!
//! A replay is recorded as a series of video chunks. Each chunk knows its
//! absolute start time (epoch milliseconds) and its length; chunks never
//! overlap but there may be gaps between them (the app was backgrounded,
//! the recorder stalled, ...).
//!
//! The manifest is JSON, either a bare array of attachments:
//!
//! ```json
//! [{"timestamp": 1700000000000, "duration": 5000, "uri": "seg-0.mp4"}]
//! ```
//!
//! or an object carrying the replay start as well:
//!
//! ```json
//! {"start_timestamp": 1700000000000, "attachments": [...]}
//! ```

mod gaps;
mod index;

use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

pub use gaps::{collect_gaps, GapPosition};
pub use index::{find_segment_index, Location, SegmentIndex};

/// One recorded media attachment as it appears in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Absolute start time (ms)
    pub timestamp: u64,
    /// Length of the chunk (ms)
    pub duration: u64,
    /// Where the decodable content lives
    pub uri: String,
}

/// One contiguous recorded media chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start_timestamp: u64,
    pub duration_ms: u64,
    pub media_ref: String,
}

impl Segment {
    pub fn new(start_timestamp: u64, duration_ms: u64, media_ref: impl Into<String>) -> Self {
        Self {
            start_timestamp,
            duration_ms,
            media_ref: media_ref.into(),
        }
    }

    /// Absolute end time (ms).
    pub fn end_timestamp(&self) -> u64 {
        self.start_timestamp.saturating_add(self.duration_ms)
    }

    /// Whether `timestamp` falls inside `[start, start + duration]`.
    pub fn contains(&self, timestamp: u64) -> bool {
        timestamp >= self.start_timestamp && timestamp <= self.end_timestamp()
    }
}

impl From<Attachment> for Segment {
    fn from(attachment: Attachment) -> Self {
        Self {
            start_timestamp: attachment.timestamp,
            duration_ms: attachment.duration,
            media_ref: attachment.uri,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestRepr {
    Bare(Vec<Attachment>),
    Full {
        #[serde(default)]
        start_timestamp: Option<u64>,
        attachments: Vec<Attachment>,
    },
}

/// Sorted, non-overlapping list of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentList {
    segments: Vec<Segment>,
    start_timestamp: Option<u64>,
}

impl SegmentList {
    /// Validate and wrap an already ordered list of segments.
    pub fn new(segments: Vec<Segment>) -> Result<Self, ReplayError> {
        for (i, pair) in segments.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start_timestamp < prev.start_timestamp {
                return Err(ReplayError::UnsortedSegments {
                    index: i + 1,
                    start: next.start_timestamp,
                    previous: prev.start_timestamp,
                });
            }
            if next.start_timestamp < prev.end_timestamp() {
                return Err(ReplayError::OverlappingSegments {
                    index: i + 1,
                    start: next.start_timestamp,
                    previous_end: prev.end_timestamp(),
                });
            }
        }

        Ok(Self {
            segments,
            start_timestamp: None,
        })
    }

    /// Build from manifest attachments.
    pub fn from_attachments(attachments: Vec<Attachment>) -> Result<Self, ReplayError> {
        Self::new(attachments.into_iter().map(Segment::from).collect())
    }

    /// Set the replay start recorded in the manifest.
    pub fn with_start_timestamp(mut self, start_timestamp: Option<u64>) -> Self {
        self.start_timestamp = start_timestamp;
        self
    }

    /// Load a manifest from a path
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            fs::File::open(path).with_context(|| format!("Failed to open manifest: {:?}", path))?;
        Self::parse_reader(BufReader::new(file))
            .with_context(|| format!("Invalid manifest: {:?}", path))
    }

    /// Load a manifest from a reader
    pub fn parse_reader<R: Read>(reader: R) -> Result<Self> {
        let repr: ManifestRepr =
            serde_json::from_reader(reader).context("Failed to parse manifest JSON")?;

        let (start_timestamp, attachments) = match repr {
            ManifestRepr::Bare(attachments) => (None, attachments),
            ManifestRepr::Full {
                start_timestamp,
                attachments,
            } => (start_timestamp, attachments),
        };

        let list = Self::from_attachments(attachments)?;
        Ok(list.with_start_timestamp(start_timestamp))
    }

    /// Parse from a string
    pub fn parse_str(content: &str) -> Result<Self> {
        Self::parse_reader(content.as_bytes())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Absolute time that maps to relative offset 0.
    ///
    /// Falls back to the first segment's start when the manifest does not
    /// carry an explicit replay start.
    pub fn origin_timestamp(&self) -> u64 {
        self.start_timestamp
            .or_else(|| self.segments.first().map(|s| s.start_timestamp))
            .unwrap_or(0)
    }

    /// Length of the replay timeline from `origin` to the end of the last segment.
    pub fn duration_from(&self, origin: u64) -> u64 {
        self.segments
            .last()
            .map(|s| s.end_timestamp().saturating_sub(origin))
            .unwrap_or(0)
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }
}
