//! Progress bar rendering for the replay timeline.
//!
//! Displays playback progress with the gaps between segments marked.

use crate::segments::GapPosition;

/// Format a duration in milliseconds to MM:SS format.
///
/// # Arguments
/// * `ms` - Duration in milliseconds
///
/// # Returns
/// A string in MM:SS format
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}", mins, secs)
}

/// Build the progress bar character array.
///
/// Creates a visual representation of the progress bar including
/// the playhead position and the gaps with no recorded media.
///
/// # Arguments
/// * `bar_width` - Width of the bar in characters
/// * `current_time` - Current playback time (ms)
/// * `total_duration` - Total duration of the replay (ms)
/// * `gaps` - Gaps on the timeline
///
/// # Returns
/// A tuple of (bar_chars, filled_count) where bar_chars contains the visual
/// representation and filled_count is the number of filled positions.
pub fn build_progress_bar_chars(
    bar_width: usize,
    current_time: u64,
    total_duration: u64,
    gaps: &[GapPosition],
) -> (Vec<char>, usize) {
    let progress = if total_duration > 0 {
        (current_time as f64 / total_duration as f64).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let filled = (bar_width as f64 * progress) as usize;

    let mut bar: Vec<char> = vec!['─'; bar_width];

    if total_duration > 0 {
        for gap in gaps {
            let from = (gap.start as f64 / total_duration as f64 * bar_width as f64) as usize;
            let to = (gap.end as f64 / total_duration as f64 * bar_width as f64) as usize;
            for cell in bar.iter_mut().take(to.min(bar_width)).skip(from) {
                *cell = '┄';
            }
        }
    }

    if filled < bar_width {
        bar[filled] = '⏺';
    }

    (bar, filled)
}

/// Render the progress line as a plain string (no cursor movement).
///
/// # Arguments
/// * `width` - Total width available
/// * `current_time` - Current playback time (ms)
/// * `total_duration` - Total duration of the replay (ms)
/// * `gaps` - Gaps on the timeline
/// * `color` - Whether to emit ANSI colors
pub fn render_progress_line(
    width: usize,
    current_time: u64,
    total_duration: u64,
    gaps: &[GapPosition],
    color: bool,
) -> String {
    let time_display = format!(
        " {}/{}",
        format_duration(current_time),
        format_duration(total_duration)
    );
    let bar_width = width.saturating_sub(time_display.chars().count() + 1);
    let (bar, filled) = build_progress_bar_chars(bar_width, current_time, total_duration, gaps);

    const GREEN: &str = "\x1b[32m";
    const WHITE: &str = "\x1b[97m";
    const DARK_GREY: &str = "\x1b[90m";
    const GREY: &str = "\x1b[37m";
    const RESET: &str = "\x1b[0m";

    let mut output = String::with_capacity(width * 4);
    output.push(' ');

    for (i, &c) in bar.iter().enumerate() {
        let (style, glyph) = if i < filled {
            (GREEN, if c == '┄' { c } else { '━' })
        } else if i == filled {
            (WHITE, c)
        } else {
            (DARK_GREY, c)
        };
        if color {
            output.push_str(style);
        }
        output.push(glyph);
    }

    if color {
        output.push_str(GREY);
    }
    output.push_str(&time_display);
    if color {
        output.push_str(RESET);
    }

    output
}
