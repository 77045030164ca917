//! Virtual-time and wall-clock ways of playing a script against the runtime.

use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver};
use settings_overlay::driver::run_realtime;
use settings_overlay::script::ScriptAction;
use settings_overlay::Runtime;
use tracing::{debug, warn};

/// Max pending stdin actions before backpressure.
const INPUT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default)]
pub(crate) struct DriveOutcome {
    pub actions_performed: usize,
    pub failures: Vec<String>,
    pub tasks_run: usize,
}

impl DriveOutcome {
    fn perform(&mut self, runtime: &mut Runtime, action: &ScriptAction) {
        match runtime.perform(action) {
            Ok(()) => self.actions_performed += 1,
            Err(err) => {
                warn!(%action, error = %err, "scripted action failed");
                self.failures.push(format!("{action}: {err}"));
            }
        }
    }
}

/// Play the script instantly in virtual time, then let timers run for `run_ms`.
pub(crate) fn run_virtual(runtime: &mut Runtime, script: &[ScriptAction], run_ms: u64) -> DriveOutcome {
    let mut outcome = DriveOutcome::default();
    for action in script {
        outcome.perform(runtime, action);
    }
    outcome.tasks_run += runtime.advance(run_ms);
    outcome
}

/// Play the script against the wall clock. Lines typed on stdin are parsed as further
/// actions while the run lasts.
pub(crate) fn run_live(runtime: &mut Runtime, script: &[ScriptAction], run_ms: u64) -> DriveOutcome {
    let inputs = spawn_stdin_reader();
    let mut outcome = DriveOutcome::default();
    for action in script {
        match action {
            ScriptAction::Wait(ms) => {
                let stats = run_realtime(runtime, &inputs, Duration::from_millis(*ms));
                absorb(&mut outcome, stats);
            }
            _ => outcome.perform(runtime, action),
        }
    }
    let stats = run_realtime(runtime, &inputs, Duration::from_millis(run_ms));
    absorb(&mut outcome, stats);
    outcome
}

fn absorb(outcome: &mut DriveOutcome, stats: settings_overlay::driver::DriverStats) {
    outcome.tasks_run += stats.tasks_run;
    outcome.actions_performed += stats.actions_performed;
    if stats.action_failures > 0 {
        outcome
            .failures
            .push(format!("{} live action(s) failed", stats.action_failures));
    }
}

fn spawn_stdin_reader() -> Receiver<ScriptAction> {
    let (tx, rx) = bounded(INPUT_CHANNEL_CAPACITY);
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<ScriptAction>() {
                Ok(action) => {
                    if tx.send(action).is_err() {
                        break;
                    }
                }
                Err(err) => eprintln!("ignored input: {err:#}"),
            }
        }
        debug!("stdin closed");
    });
    rx
}
