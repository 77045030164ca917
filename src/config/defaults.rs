pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 500;
/// 30 seconds of probing at the default interval.
pub const DEFAULT_PROBE_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 500;
pub const DEFAULT_VISIBILITY_INTERVAL_MS: u64 = 500;
pub const DEFAULT_KEY_UP_DELAY_MS: u64 = 50;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;
pub const DEFAULT_OPTION_LIST_DELAY_MS: u64 = 500;
pub const DEFAULT_UNMUTE_VOLUME: f64 = 0.5;
pub const DEFAULT_RUN_MS: u64 = 3_000;

pub(super) const MAX_PERIOD_MS: u64 = 60_000;
pub(super) const MAX_PROBE_ATTEMPTS: u32 = 10_000;
pub(super) const MAX_DELAY_MS: u64 = 10_000;
pub(super) const MAX_RUN_MS: u64 = 3_600_000;
pub(super) const MAX_ACTIONS: usize = 256;
