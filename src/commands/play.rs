//! Play command handler
//!
//! Drives a [`SegmentPlayer`] in real time against the simulated media
//! backend and draws the timeline on a single terminal line.

use std::cell::{Cell, RefCell};
use std::io::{self, IsTerminal, Write};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use terminal_size::{terminal_size, Width};

use segreplay::cli::PlayArgs;
use segreplay::media::SimulatedRoot;
use segreplay::player::render::{format_duration, render_progress_line, render_status_line};
use segreplay::player::{LoadedEvent, PlayerState, SegmentPlayer};
use segreplay::segments::{collect_gaps, GapPosition, SegmentList};
use segreplay::timer::{Clock, SystemClock};
use segreplay::Config;

const DEFAULT_WIDTH: usize = 80;

/// Terminal-side state of the play loop.
struct Display {
    quiet: bool,
    color: bool,
    width: usize,
    /// Whether a progress line is currently drawn and must be cleared first
    drawn: bool,
}

impl Display {
    fn new(quiet: bool, config: &Config) -> Self {
        let is_tty = io::stdout().is_terminal();
        let color = is_tty && std::env::var_os("NO_COLOR").is_none();
        let width = match config.display.progress_width {
            0 => terminal_size()
                .map(|(Width(w), _)| w as usize)
                .unwrap_or(DEFAULT_WIDTH),
            w => w,
        };
        Self {
            // A progress line full of carriage returns is useless in a pipe
            quiet: quiet || !is_tty,
            color,
            width,
            drawn: false,
        }
    }

    fn line(&mut self, text: &str) {
        if self.drawn {
            print!("\r\x1b[2K");
            self.drawn = false;
        }
        println!("{}", text);
    }

    fn draw(&mut self, player: &SegmentPlayer, gaps: &[GapPosition]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        let status = render_status_line(
            player.state(),
            player.speed(),
            player.visible_segment(),
            player.segments().len(),
            false,
        );
        let progress_width = self.width.saturating_sub(status.chars().count() + 1);
        let status = if self.color {
            render_status_line(
                player.state(),
                player.speed(),
                player.visible_segment(),
                player.segments().len(),
                true,
            )
        } else {
            status
        };
        let progress = render_progress_line(
            progress_width,
            player.current_time(),
            player.duration(),
            gaps,
            self.color,
        );

        let mut stdout = io::stdout();
        write!(stdout, "\r{} {}", status, progress)?;
        stdout.flush()?;
        self.drawn = true;
        Ok(())
    }
}

fn describe_position(player: &SegmentPlayer) -> String {
    let total = player.segments().len();
    match player.visible_segment() {
        Some(i) => format!("segment {}/{}", i + 1, total),
        None => "gap".to_string(),
    }
}

/// Play a manifest until it finishes, is paused via `--pause-at`, or Ctrl+C.
pub fn handle(args: &PlayArgs, config: &Config) -> Result<()> {
    let segments = SegmentList::parse(&args.manifest)?;
    let origin = segments.origin_timestamp();
    let gaps = collect_gaps(segments.segments(), origin);

    let mut options = config.player_options();
    if let Some(speed) = args.speed {
        options.speed = speed;
    }

    let clock: Rc<dyn Clock> = Rc::new(SystemClock::new());
    let mut root = SimulatedRoot::new(clock.clone()).with_load_latency(args.load_latency);
    for uri in &args.fail_uri {
        root = root.fail_attach(uri.as_str());
    }

    let mut player = SegmentPlayer::new(segments, &mut root, clock, options);

    let loaded: Rc<RefCell<Vec<LoadedEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = loaded.clone();
    player.on_loaded(move |event| sink.borrow_mut().push(event));

    let finished = Rc::new(Cell::new(false));
    let flag = finished.clone();
    player.on_finished(move || flag.set(true));

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .context("Failed to set Ctrl+C handler")?;

    let mut display = Display::new(args.quiet, config);
    let tick = Duration::from_millis(config.playback.tick_interval_ms);
    let total = player.segments().len();

    if total == 0 {
        display.line("Replay has no segments.");
        return Ok(());
    }

    display.line(&format!(
        "Playing {} segment(s), {} at {:.1}x",
        total,
        format_duration(player.duration()),
        player.speed()
    ));
    player.play(args.from);

    loop {
        let state = player.tick();

        for event in loaded.borrow_mut().drain(..) {
            display.line(&format!(
                "loaded segment {}/{} {} ({} ms)",
                event.segment_index + 1,
                total,
                event.media_ref,
                event.duration_ms
            ));
        }

        if finished.get() || state == PlayerState::Finished {
            display.line(&format!(
                "finished at {}",
                format_duration(player.current_time())
            ));
            break;
        }

        if let Some(pause_at) = args.pause_at {
            if player.current_time() >= pause_at {
                player.pause(pause_at);
                display.line(&format!(
                    "paused at {} ({})",
                    format_duration(player.current_time()),
                    describe_position(&player)
                ));
                break;
            }
        }

        if !running.load(Ordering::SeqCst) {
            let at = player.current_time();
            player.pause(at);
            display.line(&format!("interrupted at {}", format_duration(at)));
            break;
        }

        display.draw(&player, &gaps)?;
        std::thread::sleep(tick);
    }

    Ok(())
}
