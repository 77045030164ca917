//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::{ArgAction, Parser};
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_KEY_UP_DELAY_MS, DEFAULT_OPTION_LIST_DELAY_MS, DEFAULT_PROBE_INTERVAL_MS,
    DEFAULT_PROBE_MAX_ATTEMPTS, DEFAULT_RUN_MS, DEFAULT_SETTLE_DELAY_MS, DEFAULT_SYNC_INTERVAL_MS,
    DEFAULT_UNMUTE_VOLUME, DEFAULT_VISIBILITY_INTERVAL_MS,
};

/// CLI options for the overlay simulator. Validated values keep the dispatcher bounded.
#[derive(Debug, Parser, Clone)]
#[command(about = "Settings overlay simulator", author, version)]
pub struct OverlayConfig {
    /// Interval between host anchor checks (milliseconds)
    #[arg(long = "probe-interval-ms", default_value_t = DEFAULT_PROBE_INTERVAL_MS)]
    pub probe_interval_ms: u64,

    /// Anchor checks before the overlay gives up
    #[arg(long = "probe-max-attempts", default_value_t = DEFAULT_PROBE_MAX_ATTEMPTS)]
    pub probe_max_attempts: u32,

    /// State-sync period (milliseconds)
    #[arg(long = "sync-interval-ms", default_value_t = DEFAULT_SYNC_INTERVAL_MS)]
    pub sync_interval_ms: u64,

    /// Visibility-enforcement period (milliseconds)
    #[arg(long = "visibility-interval-ms", default_value_t = DEFAULT_VISIBILITY_INTERVAL_MS)]
    pub visibility_interval_ms: u64,

    /// Delay between a synthesized key-down and its key-up (milliseconds)
    #[arg(long = "key-up-delay-ms", default_value_t = DEFAULT_KEY_UP_DELAY_MS)]
    pub key_up_delay_ms: u64,

    /// Wait after a host command before re-reading its result (milliseconds)
    #[arg(long = "settle-delay-ms", default_value_t = DEFAULT_SETTLE_DELAY_MS)]
    pub settle_delay_ms: u64,

    /// Delay between wiring and filling the scene/weather lists (milliseconds)
    #[arg(long = "option-list-delay-ms", default_value_t = DEFAULT_OPTION_LIST_DELAY_MS)]
    pub option_list_delay_ms: u64,

    /// Level restored by unmute when no earlier level was seen
    #[arg(long = "default-volume", default_value_t = DEFAULT_UNMUTE_VOLUME)]
    pub default_volume: f64,

    /// Host contract JSON (defaults to the built-in contract)
    #[arg(long)]
    pub contract: Option<PathBuf>,

    /// Static host document JSON (defaults to the built-in demo host)
    #[arg(long = "host-fixture")]
    pub host_fixture: Option<PathBuf>,

    /// Delay before the demo host renders its menu bar (milliseconds)
    #[arg(long = "host-render-delay-ms", default_value_t = 0)]
    pub host_render_delay_ms: u64,

    /// Skip rendering the demo host menu bar entirely
    #[arg(long = "host-never-renders", default_value_t = false)]
    pub host_never_renders: bool,

    /// Simulated run length after the last scripted action (milliseconds)
    #[arg(long = "run-ms", default_value_t = DEFAULT_RUN_MS)]
    pub run_ms: u64,

    /// Scripted user action (repeatable), e.g. `open`, `scene:Venus`, `volume:0.8`, `wait:500`
    #[arg(long = "action", action = ArgAction::Append, value_name = "ACTION")]
    pub actions: Vec<String>,

    /// Drive timers from the wall clock instead of virtual time
    #[arg(long, default_value_t = false)]
    pub realtime: bool,

    /// Print the final report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable file logging
    #[arg(long = "logs", env = "OVERLAY_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "OVERLAY_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}

/// Library-facing timing knobs for one overlay session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub probe_interval_ms: u64,
    pub probe_max_attempts: u32,
    pub sync_interval_ms: u64,
    pub visibility_interval_ms: u64,
    pub key_up_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub option_list_delay_ms: u64,
    pub default_volume: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            probe_max_attempts: DEFAULT_PROBE_MAX_ATTEMPTS,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            visibility_interval_ms: DEFAULT_VISIBILITY_INTERVAL_MS,
            key_up_delay_ms: DEFAULT_KEY_UP_DELAY_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            option_list_delay_ms: DEFAULT_OPTION_LIST_DELAY_MS,
            default_volume: DEFAULT_UNMUTE_VOLUME,
        }
    }
}

impl OverlayConfig {
    pub fn timings(&self) -> Timings {
        Timings {
            probe_interval_ms: self.probe_interval_ms,
            probe_max_attempts: self.probe_max_attempts,
            sync_interval_ms: self.sync_interval_ms,
            visibility_interval_ms: self.visibility_interval_ms,
            key_up_delay_ms: self.key_up_delay_ms,
            settle_delay_ms: self.settle_delay_ms,
            option_list_delay_ms: self.option_list_delay_ms,
            default_volume: self.default_volume,
        }
    }

    pub fn logging_enabled(&self) -> bool {
        self.logs && !self.no_logs
    }
}
