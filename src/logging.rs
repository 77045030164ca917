use crate::config::OverlayConfig;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// JSON-lines trace file. `OVERLAY_TRACE_LOG` overrides the temp-dir default.
pub fn trace_log_path() -> PathBuf {
    env::var("OVERLAY_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("settings_overlay_trace.jsonl"))
}

/// Install the global JSON subscriber once, and only when `--logs` is set without
/// `--no-logs` (see [`OverlayConfig::logging_enabled`]). Logging never affects the
/// overlay: an unopenable file or an existing subscriber leaves tracing disabled.
pub fn init_logging(config: &OverlayConfig) {
    if !config.logging_enabled() {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        let path = trace_log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn disabled_logging_installs_nothing() {
        let config = OverlayConfig::parse_from(["overlay-sim", "--no-logs"]);
        init_logging(&config);
        assert!(TRACING_INIT.get().is_none());
    }

    #[test]
    fn trace_path_defaults_to_temp_dir() {
        if env::var("OVERLAY_TRACE_LOG").is_err() {
            assert_eq!(
                trace_log_path(),
                env::temp_dir().join("settings_overlay_trace.jsonl")
            );
        }
    }
}
