//! Bounded readiness polling for the host anchor.

use tracing::{debug, info, warn};

use crate::contract::HostContract;
use crate::dom::{Document, ReadyState};
use crate::scheduler::{Scheduler, TimerId};
use crate::session::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Idle,
    /// `start` ran while the document was still loading.
    AwaitingDocument,
    Probing { attempts: u32 },
    Attached { attempts: u32 },
    GaveUp { attempts: u32 },
}

impl ProbeState {
    pub fn label(self) -> &'static str {
        match self {
            ProbeState::Idle => "idle",
            ProbeState::AwaitingDocument => "awaiting-document",
            ProbeState::Probing { .. } => "probing",
            ProbeState::Attached { .. } => "attached",
            ProbeState::GaveUp { .. } => "gave-up",
        }
    }

    pub fn attempts(self) -> u32 {
        match self {
            ProbeState::Idle | ProbeState::AwaitingDocument => 0,
            ProbeState::Probing { attempts }
            | ProbeState::Attached { attempts }
            | ProbeState::GaveUp { attempts } => attempts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Pending,
    Found,
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct AttachmentProber {
    interval_ms: u64,
    max_attempts: u32,
    state: ProbeState,
    timer: Option<TimerId>,
}

impl AttachmentProber {
    pub fn new(interval_ms: u64, max_attempts: u32) -> Self {
        Self {
            interval_ms,
            max_attempts: max_attempts.max(1),
            state: ProbeState::Idle,
            timer: None,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// True while checks are scheduled.
    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    pub fn start(&mut self, doc: &Document, timers: &mut Scheduler<Task>) {
        if self.state != ProbeState::Idle {
            return;
        }
        if doc.ready_state() == ReadyState::Loading {
            debug!("document still loading; probe deferred");
            self.state = ProbeState::AwaitingDocument;
            return;
        }
        self.begin(timers);
    }

    /// Content-loaded notification. Starts a deferred probe.
    pub fn document_ready(&mut self, timers: &mut Scheduler<Task>) {
        if self.state == ProbeState::AwaitingDocument {
            self.begin(timers);
        }
    }

    fn begin(&mut self, timers: &mut Scheduler<Task>) {
        self.timer = Some(timers.set_interval(self.interval_ms, Task::Probe));
        self.state = ProbeState::Probing { attempts: 0 };
        debug!(interval_ms = self.interval_ms, "attachment probe started");
    }

    /// One readiness check. Stops the probe on success or once attempts run out.
    pub fn check(
        &mut self,
        doc: &Document,
        contract: &HostContract,
        timers: &mut Scheduler<Task>,
    ) -> ProbeOutcome {
        let ProbeState::Probing { attempts } = self.state else {
            return ProbeOutcome::Pending;
        };
        let attempts = attempts + 1;
        if doc.get_element_by_id(&contract.anchor_id).is_some() {
            self.stop(timers);
            self.state = ProbeState::Attached { attempts };
            info!(attempts, anchor = %contract.anchor_id, "host anchor found");
            return ProbeOutcome::Found;
        }
        if attempts >= self.max_attempts {
            self.stop(timers);
            self.state = ProbeState::GaveUp { attempts };
            warn!(attempts, anchor = %contract.anchor_id, "host anchor never appeared; giving up");
            return ProbeOutcome::Exhausted;
        }
        self.state = ProbeState::Probing { attempts };
        ProbeOutcome::Pending
    }

    fn stop(&mut self, timers: &mut Scheduler<Task>) {
        if let Some(timer) = self.timer.take() {
            timers.clear(timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        prober: &mut AttachmentProber,
        doc: &Document,
        timers: &mut Scheduler<Task>,
        until_ms: u64,
    ) -> Vec<ProbeOutcome> {
        let contract = HostContract::default();
        let mut outcomes = Vec::new();
        while let Some((_, task)) = timers.pop_due(until_ms) {
            assert_eq!(task, Task::Probe);
            outcomes.push(prober.check(doc, &contract, timers));
        }
        outcomes
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut doc = Document::new();
        doc.set_ready_state(ReadyState::Complete);
        let mut timers = Scheduler::new();
        let mut prober = AttachmentProber::new(500, 3);
        prober.start(&doc, &mut timers);
        let outcomes = run(&mut prober, &doc, &mut timers, 10_000);
        assert_eq!(
            outcomes,
            vec![ProbeOutcome::Pending, ProbeOutcome::Pending, ProbeOutcome::Exhausted]
        );
        assert_eq!(prober.state(), ProbeState::GaveUp { attempts: 3 });
        assert!(!prober.is_active());
        assert!(timers.is_empty());
    }

    #[test]
    fn stops_when_anchor_appears() {
        let mut doc = Document::new();
        doc.set_ready_state(ReadyState::Interactive);
        let mut timers = Scheduler::new();
        let mut prober = AttachmentProber::new(500, 60);
        prober.start(&doc, &mut timers);
        assert_eq!(run(&mut prober, &doc, &mut timers, 1_000).len(), 2);

        let anchor = doc.create_element("div");
        doc.set_id(anchor, "menu-bar-left");
        let body = doc.body();
        doc.append_child(body, anchor).unwrap();
        let outcomes = run(&mut prober, &doc, &mut timers, 5_000);
        assert_eq!(outcomes, vec![ProbeOutcome::Found]);
        assert_eq!(prober.state(), ProbeState::Attached { attempts: 3 });
        assert!(timers.is_empty());
    }

    #[test]
    fn defers_until_document_ready() {
        let doc = Document::new();
        let mut timers = Scheduler::new();
        let mut prober = AttachmentProber::new(500, 60);
        prober.start(&doc, &mut timers);
        assert_eq!(prober.state(), ProbeState::AwaitingDocument);
        assert!(timers.is_empty());
        prober.document_ready(&mut timers);
        assert!(prober.is_active());
        assert_eq!(timers.len(), 1);
    }
}
