//! Command-line interface definition
//!
//! Shared between the binary and the `xtask` man page generator.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Version string with build date and, for dev builds, the git commit.
pub fn long_version() -> String {
    let mut version = format!(
        "{} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("SEGREPLAY_BUILD_DATE")
    );
    if let Some(sha) = short_sha(option_env!("VERGEN_GIT_SHA")) {
        version.push_str(&format!(" [{}]", sha));
    }
    version
}

/// First 7 characters of a git SHA, or `None` when the build had no git info
/// (`unknown`, or vergen's `VERGEN_*` placeholder).
fn short_sha(sha: Option<&str>) -> Option<String> {
    let sha = sha?.trim();
    if sha.is_empty() || sha == "unknown" || sha.starts_with("VERGEN_") {
        return None;
    }
    Some(sha.chars().take(7).collect())
}

#[derive(Debug, Parser)]
#[command(
    name = "segreplay",
    version,
    about = "Replay gapped screen-recording segments as one seekable timeline",
    long_about = "Replay gapped screen-recording segments as one seekable timeline.\n\n\
        A replay manifest lists media segments with absolute start timestamps and \
        durations. segreplay indexes them, reports the gaps between them and drives \
        a playback scheduler that keeps one virtual clock across segments and gaps."
)]
pub struct Cli {
    /// Enable debug logging (SEGREPLAY_LOG / RUST_LOG take precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the segments and gaps of a replay manifest
    Inspect(InspectArgs),

    /// Play a replay manifest against the simulated media backend
    Play(PlayArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Path to the manifest (JSON)
    pub manifest: PathBuf,

    /// Print machine-readable JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Path to the manifest (JSON)
    pub manifest: PathBuf,

    /// Playback speed multiplier (overrides config)
    #[arg(long, value_parser = parse_speed)]
    pub speed: Option<f64>,

    /// Start offset in milliseconds from the replay start
    #[arg(long, default_value_t = 0, value_name = "MS")]
    pub from: u64,

    /// Pause at this offset, print the paused state and exit
    #[arg(long, value_name = "MS")]
    pub pause_at: Option<u64>,

    /// Simulated media load latency in milliseconds
    #[arg(long, default_value_t = 0, value_name = "MS")]
    pub load_latency: u64,

    /// Simulate a media failure for this URI (repeatable)
    #[arg(long = "fail-uri", value_name = "URI")]
    pub fail_uri: Vec<String>,

    /// Do not draw the progress line; only print events
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration as TOML
    Show,
    /// Print the config file location
    Path,
}

/// Parse a playback speed, rejecting zero, negative and non-finite values.
pub fn parse_speed(value: &str) -> Result<f64, String> {
    let speed: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("speed must be greater than 0 (got {})", value))
    }
}
