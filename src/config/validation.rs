use super::defaults::{MAX_ACTIONS, MAX_DELAY_MS, MAX_PERIOD_MS, MAX_PROBE_ATTEMPTS, MAX_RUN_MS};
use super::OverlayConfig;
use crate::script::ScriptAction;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;

impl OverlayConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values before anything is scheduled.
    pub fn validate(&self) -> Result<()> {
        for (flag, value) in [
            ("--probe-interval-ms", self.probe_interval_ms),
            ("--sync-interval-ms", self.sync_interval_ms),
            ("--visibility-interval-ms", self.visibility_interval_ms),
        ] {
            if !(1..=MAX_PERIOD_MS).contains(&value) {
                bail!("{flag} must be between 1 and {MAX_PERIOD_MS} ms, got {value}");
            }
        }
        if !(1..=MAX_PROBE_ATTEMPTS).contains(&self.probe_max_attempts) {
            bail!(
                "--probe-max-attempts must be between 1 and {MAX_PROBE_ATTEMPTS}, got {}",
                self.probe_max_attempts
            );
        }
        for (flag, value) in [
            ("--key-up-delay-ms", self.key_up_delay_ms),
            ("--settle-delay-ms", self.settle_delay_ms),
            ("--option-list-delay-ms", self.option_list_delay_ms),
        ] {
            if value > MAX_DELAY_MS {
                bail!("{flag} must be at most {MAX_DELAY_MS} ms, got {value}");
            }
        }
        if !(self.default_volume > 0.0 && self.default_volume <= 1.0) {
            bail!(
                "--default-volume must be in (0, 1], got {}",
                self.default_volume
            );
        }
        if !(1..=MAX_RUN_MS).contains(&self.run_ms) {
            bail!("--run-ms must be between 1 and {MAX_RUN_MS}, got {}", self.run_ms);
        }
        if self.host_render_delay_ms > MAX_RUN_MS {
            bail!("--host-render-delay-ms must be at most {MAX_RUN_MS}");
        }
        if self.host_fixture.is_some()
            && (self.host_render_delay_ms > 0 || self.host_never_renders)
        {
            bail!("--host-render-delay-ms and --host-never-renders only apply to the demo host");
        }

        if let Some(path) = &self.contract {
            ensure_file(path, "--contract")?;
        }
        if let Some(path) = &self.host_fixture {
            ensure_file(path, "--host-fixture")?;
        }

        if self.actions.len() > MAX_ACTIONS {
            bail!("at most {MAX_ACTIONS} --action values are allowed");
        }
        for action in self.script()? {
            if let ScriptAction::Wait(ms) = action {
                if ms > MAX_RUN_MS {
                    bail!("--action wait:{ms} must be at most {MAX_RUN_MS} ms");
                }
            }
        }
        Ok(())
    }

    /// Scripted actions in the order given.
    pub fn script(&self) -> Result<Vec<ScriptAction>> {
        self.actions
            .iter()
            .map(|raw| {
                raw.parse::<ScriptAction>()
                    .with_context(|| format!("invalid --action '{raw}'"))
            })
            .collect()
    }
}

fn ensure_file(path: &Path, flag: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{flag} path '{}' does not exist", path.display());
    }
    Ok(())
}
