//! Timestamp lookup over the sorted segment list.

use super::Segment;

/// Find the segment for an absolute `target` timestamp.
///
/// Returns the segment containing `target` if there is one. Otherwise returns
/// the latest segment starting at or before `target`, so callers can tell
/// they are in a gap by re-checking containment. `None` means `target`
/// precedes every segment (or there are none).
pub fn find_segment_index(segments: &[Segment], target: u64) -> Option<usize> {
    let mut start = 0;
    let mut end = segments.len();

    while start < end {
        let mid = start + (end - start) / 2;
        let segment = &segments[mid];

        if segment.contains(target) {
            return Some(mid);
        }

        if target < segment.start_timestamp {
            end = mid;
        } else {
            start = mid + 1;
        }
    }

    // `start` now counts the segments beginning at or before `target`
    start.checked_sub(1)
}

/// Where an absolute timestamp lands on the segment timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Inside segment `i`
    Exact(usize),
    /// Between segment `preceding` and the one after it (or after the last)
    Gap { preceding: usize },
    /// Before the first segment
    BeforeStart,
}

impl Location {
    /// Segment that playback should continue with from here.
    pub fn upcoming(&self) -> usize {
        match *self {
            Location::Exact(i) => i,
            Location::Gap { preceding } => preceding + 1,
            Location::BeforeStart => 0,
        }
    }
}

/// Immutable lookup structure built once per replay.
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex {
    segments: Vec<Segment>,
}

impl SegmentIndex {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
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

    /// Classify an absolute timestamp.
    pub fn locate(&self, target: u64) -> Location {
        match find_segment_index(&self.segments, target) {
            None => Location::BeforeStart,
            Some(i) if self.segments[i].contains(target) => Location::Exact(i),
            Some(i) => Location::Gap { preceding: i },
        }
    }
}
