//! Rendering components for the replay player.
//!
//! Plain text renderers for the timeline progress bar and the status line.
//! They return strings so the host decides where (and whether) to draw them.

mod progress;
mod status;

pub use progress::{build_progress_bar_chars, format_duration, render_progress_line};
pub use status::{count_digits, render_status_line};
