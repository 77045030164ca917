//! Wall-clock driver: maps elapsed real time onto the virtual dispatcher and performs
//! user actions from a channel, so nothing blocks between timer deadlines.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, warn};

use crate::runtime::Runtime;
use crate::script::ScriptAction;

/// Longest single wait, so a far-off timer never hides a closed input channel for long.
const MAX_WAIT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub tasks_run: usize,
    pub actions_performed: usize,
    pub action_failures: usize,
}

/// Run `runtime` for `duration` of real time, performing actions from `inputs` as they
/// arrive. A `wait` received over the channel is a no-op; real time already passes.
pub fn run_realtime(
    runtime: &mut Runtime,
    inputs: &Receiver<ScriptAction>,
    duration: Duration,
) -> DriverStats {
    let mut stats = DriverStats::default();
    let origin_ms = runtime.now_ms();
    let started = Instant::now();
    let mut inputs_open = true;

    loop {
        let elapsed = started.elapsed();
        stats.tasks_run += runtime.advance_to(origin_ms + elapsed.as_millis() as u64);
        if elapsed >= duration {
            break;
        }
        let until_deadline = duration - elapsed;
        let until_timer = runtime
            .timers()
            .next_due_at()
            .map(|due| Duration::from_millis(due.saturating_sub(runtime.now_ms())))
            .unwrap_or(MAX_WAIT);
        let wait = until_deadline.min(until_timer).min(MAX_WAIT);

        if !inputs_open {
            thread::sleep(wait);
            continue;
        }
        match inputs.recv_timeout(wait) {
            Ok(ScriptAction::Wait(_)) => {}
            Ok(action) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                stats.tasks_run += runtime.advance_to(origin_ms + elapsed_ms);
                match runtime.perform(&action) {
                    Ok(()) => stats.actions_performed += 1,
                    Err(err) => {
                        warn!(%action, error = %err, "live action failed");
                        stats.action_failures += 1;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("input channel closed; timers only from here");
                inputs_open = false;
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timings;
    use crate::contract::HostContract;
    use crate::dom::{Document, ReadyState};
    use crossbeam_channel::bounded;

    #[test]
    fn realtime_run_fires_probe_timers() {
        let mut doc = Document::new();
        doc.set_ready_state(ReadyState::Complete);
        let timings = Timings {
            probe_interval_ms: 5,
            probe_max_attempts: 3,
            ..Timings::default()
        };
        let mut runtime = Runtime::new(doc, HostContract::default(), timings);
        runtime.start();
        let (_tx, rx) = bounded::<ScriptAction>(1);
        let stats = run_realtime(&mut runtime, &rx, Duration::from_millis(60));
        assert_eq!(stats.tasks_run, 3);
        assert!(!runtime.session().prober().is_active());
    }

    #[test]
    fn performs_queued_actions() {
        let mut runtime = Runtime::new(Document::new(), HostContract::default(), Timings::default());
        let (tx, rx) = bounded(4);
        tx.send(ScriptAction::Outside).unwrap();
        tx.send(ScriptAction::Wait(10_000)).unwrap();
        tx.send(ScriptAction::Open).unwrap();
        drop(tx);
        let stats = run_realtime(&mut runtime, &rx, Duration::from_millis(20));
        assert_eq!(stats.actions_performed, 1);
        // Nothing attached, so there is no icon to open.
        assert_eq!(stats.action_failures, 1);
        assert_eq!(runtime.doc().event_log().len(), 2);
    }
}
