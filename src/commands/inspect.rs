//! Inspect command handler

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use segreplay::cli::InspectArgs;
use segreplay::player::render::format_duration;
use segreplay::segments::{collect_gaps, GapPosition, SegmentList};

#[derive(Debug, Serialize)]
struct SegmentRow {
    index: usize,
    offset_ms: u64,
    duration_ms: u64,
    uri: String,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    start_timestamp: u64,
    /// `start_timestamp` as RFC 3339, when it is a representable date
    replay_start: Option<String>,
    duration_ms: u64,
    segments: Vec<SegmentRow>,
    gaps: Vec<GapPosition>,
}

impl InspectReport {
    fn build(list: &SegmentList) -> Self {
        let origin = list.origin_timestamp();
        let segments = list
            .segments()
            .iter()
            .enumerate()
            .map(|(index, s)| SegmentRow {
                index,
                offset_ms: s.start_timestamp.saturating_sub(origin),
                duration_ms: s.duration_ms,
                uri: s.media_ref.clone(),
            })
            .collect();

        Self {
            start_timestamp: origin,
            replay_start: replay_start(origin).map(|dt| dt.to_rfc3339()),
            duration_ms: list.duration_from(origin),
            segments,
            gaps: collect_gaps(list.segments(), origin),
        }
    }
}

fn replay_start(origin: u64) -> Option<DateTime<Utc>> {
    i64::try_from(origin)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

/// Print the segments and gaps of a manifest.
pub fn handle(args: &InspectArgs) -> Result<()> {
    let list = SegmentList::parse(&args.manifest)?;
    let report = InspectReport::build(&list);

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
        return Ok(());
    }

    let started = replay_start(report.start_timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| report.start_timestamp.to_string());
    println!("Replay start: {}", started);
    println!(
        "Duration:     {} ({} ms)",
        format_duration(report.duration_ms),
        report.duration_ms
    );
    println!();

    if report.segments.is_empty() {
        println!("No segments.");
        return Ok(());
    }

    println!("{:>4}  {:>10}  {:>10}  URI", "#", "OFFSET", "DURATION");
    for row in &report.segments {
        println!(
            "{:>4}  {:>10}  {:>10}  {}",
            row.index + 1,
            row.offset_ms,
            row.duration_ms,
            row.uri
        );
    }

    println!();
    if report.gaps.is_empty() {
        println!("No gaps.");
    } else {
        println!("Gaps ({}):", report.gaps.len());
        for gap in &report.gaps {
            println!(
                "  {} - {} ({} ms, resumes with #{})",
                gap.start,
                gap.end,
                gap.duration(),
                gap.next_segment + 1
            );
        }
    }

    Ok(())
}
