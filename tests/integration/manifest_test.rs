//! Integration tests for manifest loading and timestamp lookup

use segreplay::segments::{collect_gaps, find_segment_index, Location, SegmentIndex, SegmentList};

use crate::helpers::{fixtures_dir, load_fixture, temp_fixture};

const START: u64 = 1_700_000_000_000;

#[test]
fn scenario_manifest_loads_with_start_timestamp() {
    let list = SegmentList::parse(fixtures_dir().join("scenario.json")).unwrap();

    assert_eq!(list.len(), 3);
    assert_eq!(list.origin_timestamp(), START);
    assert_eq!(list.duration_from(START), 3500);
    assert_eq!(list.get(1).unwrap().media_ref, "seg-1.mp4");
}

#[test]
fn bare_array_manifest_uses_first_segment_as_origin() {
    let list = SegmentList::parse_str(&load_fixture("short_replay.json")).unwrap();
    assert_eq!(list.origin_timestamp(), 0);
    assert_eq!(list.duration_from(0), 120);
}

#[test]
fn manifest_from_temp_copy() {
    let (temp_dir, path) = temp_fixture("short_replay.json");
    let list = SegmentList::parse(&path).unwrap();
    assert_eq!(list.len(), 3);
    drop(temp_dir);
}

#[test]
fn unsorted_manifest_is_rejected() {
    let err = SegmentList::parse(fixtures_dir().join("unsorted.json")).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("unsorted.json"));
    assert!(message.contains("before the previous segment"));
}

#[test]
fn overlapping_manifest_is_rejected() {
    let err = SegmentList::parse(fixtures_dir().join("overlapping.json")).unwrap_err();
    assert!(format!("{:#}", err).contains("inside the previous segment"));
}

#[test]
fn missing_manifest_mentions_path() {
    let err = SegmentList::parse("/nonexistent/replay.json").unwrap_err();
    assert!(err.to_string().contains("Failed to open manifest"));
}

#[test]
fn empty_manifest_is_valid() {
    let list = SegmentList::parse(fixtures_dir().join("empty.json")).unwrap();
    assert!(list.is_empty());
    assert_eq!(list.origin_timestamp(), 0);
    assert_eq!(list.duration_from(0), 0);
}

#[test]
fn lookup_across_the_scenario_timeline() {
    let list = SegmentList::parse(fixtures_dir().join("scenario.json")).unwrap();
    let segments = list.segments();

    assert_eq!(find_segment_index(segments, START - 1), None);
    assert_eq!(find_segment_index(segments, START), Some(0));
    assert_eq!(find_segment_index(segments, START + 1000), Some(0));
    // In the first gap: the preceding segment, which does not contain it
    assert_eq!(find_segment_index(segments, START + 1200), Some(0));
    assert_eq!(find_segment_index(segments, START + 1500), Some(1));
    assert_eq!(find_segment_index(segments, START + 2800), Some(1));
    assert_eq!(find_segment_index(segments, START + 3200), Some(2));
    assert_eq!(find_segment_index(segments, START + 9000), Some(2));
}

#[test]
fn lookup_result_always_starts_at_or_before_target() {
    let list = SegmentList::parse(fixtures_dir().join("scenario.json")).unwrap();
    let segments = list.segments();

    for offset in (0..4000).step_by(50) {
        let target = START + offset;
        if let Some(i) = find_segment_index(segments, target) {
            assert!(segments[i].start_timestamp <= target);
            if let Some(next) = segments.get(i + 1) {
                assert!(next.start_timestamp > target);
            }
        }
    }
}

#[test]
fn index_locates_gaps() {
    let list = SegmentList::parse(fixtures_dir().join("scenario.json")).unwrap();
    let index = SegmentIndex::new(list.segments().to_vec());

    assert_eq!(index.locate(START + 1200), Location::Gap { preceding: 0 });
    assert_eq!(index.locate(START + 1200).upcoming(), 1);
    assert_eq!(index.locate(START + 3200), Location::Exact(2));
}

#[test]
fn gaps_of_scenario() {
    let list = SegmentList::parse(fixtures_dir().join("scenario.json")).unwrap();
    let gaps = collect_gaps(list.segments(), list.origin_timestamp());

    let spans: Vec<(u64, u64, usize)> = gaps
        .iter()
        .map(|g| (g.start, g.end, g.next_segment))
        .collect();
    assert_eq!(spans, vec![(1000, 1500, 1), (2500, 3000, 2)]);
}
