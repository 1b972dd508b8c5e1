//! Gap collection for the replay timeline.
//!
//! Gaps are the stretches of the timeline that no segment covers. They are
//! shown on the progress bar and listed by `inspect`.

use serde::Serialize;

use super::Segment;

/// A stretch of the timeline with no recorded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GapPosition {
    /// Relative start of the gap (ms from the replay origin)
    pub start: u64,
    /// Relative end of the gap (ms from the replay origin)
    pub end: u64,
    /// Index of the segment playback resumes with after the gap
    pub next_segment: usize,
}

impl GapPosition {
    pub fn duration(&self) -> u64 {
        self.end - self.start
    }
}

/// Collect the gaps between segments, relative to `origin`.
///
/// A leading gap is reported when the first segment starts after the origin.
pub fn collect_gaps(segments: &[Segment], origin: u64) -> Vec<GapPosition> {
    let mut gaps = Vec::new();
    let mut covered_until = origin;

    for (i, segment) in segments.iter().enumerate() {
        if segment.start_timestamp > covered_until {
            gaps.push(GapPosition {
                start: covered_until - origin,
                end: segment.start_timestamp - origin,
                next_segment: i,
            });
        }
        covered_until = covered_until.max(segment.end_timestamp());
    }

    gaps
}
