//! Status line rendering for the replay player.
//!
//! Displays playback state, speed and which segment is on screen.

use crate::player::PlayerState;

/// Count digits in a number (for width calculation).
///
/// # Arguments
/// * `n` - The number to count digits of
///
/// # Returns
/// The number of digits in the base-10 representation
#[inline]
pub fn count_digits(n: usize) -> usize {
    if n == 0 {
        1
    } else {
        (n as f64).log10().floor() as usize + 1
    }
}

/// Render the status line as a plain string (no cursor movement).
///
/// The segment counter is padded to the width of `segment_count` so the line
/// does not jitter while moving between segments. `None` means no segment is
/// visible (the playhead is in a gap).
///
/// # Arguments
/// * `state` - Current player state
/// * `speed` - Current playback speed
/// * `visible_segment` - Index of the visible segment, if any
/// * `segment_count` - Number of segments in the replay
/// * `color` - Whether to emit ANSI colors
pub fn render_status_line(
    state: PlayerState,
    speed: f64,
    visible_segment: Option<usize>,
    segment_count: usize,
    color: bool,
) -> String {
    const WHITE: &str = "\x1b[97m";
    const DARK_GREY: &str = "\x1b[90m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    let paint = |out: &mut String, code: &str| {
        if color {
            out.push_str(code);
        }
    };

    let mut output = String::with_capacity(64);

    paint(&mut output, WHITE);
    let icon = match state {
        PlayerState::Playing => '▶',
        PlayerState::Paused => '⏸',
        PlayerState::Idle => '■',
        PlayerState::Finished => '✔',
    };
    output.push(' ');
    output.push(icon);
    output.push(' ');
    output.push_str(&format!("{:<8}", state.to_string()));

    paint(&mut output, DARK_GREY);
    output.push_str("spd:");
    paint(&mut output, WHITE);
    output.push_str(&format!("{:.1}x ", speed));

    paint(&mut output, DARK_GREY);
    output.push_str("seg:");
    let width = count_digits(segment_count);
    match visible_segment {
        Some(i) => {
            paint(&mut output, WHITE);
            output.push_str(&format!("{:>width$}/{}", i + 1, segment_count, width = width));
        }
        None => {
            paint(&mut output, YELLOW);
            output.push_str(&format!("{:>width$}/{}", "-", segment_count, width = width));
        }
    }

    paint(&mut output, RESET);
    output
}
