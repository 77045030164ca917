//! The single overlay session for one host document.
//!
//! Initialization order: probe, then registry scan, styles, icon, panel, control wiring
//! (which also schedules option lists and starts the recurring tasks), then suppression.

use tracing::{debug, info, warn};

use crate::bridge::{HostContext, HostControl};
use crate::config::Timings;
use crate::contract::HostContract;
use crate::dom::{Document, Event, EventKind, EventTarget};
use crate::error::OverlayError;
use crate::panel::{OverlayState, PanelActionContext};
use crate::presentation::{self, ids, ControlRegistry};
use crate::prober::{AttachmentProber, ProbeOutcome};
use crate::reconcile;
use crate::registry::{Category, HostRegistry};
use crate::scheduler::{Scheduler, TimerId};
use crate::suppress;

/// Deferred work on the shared dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Probe,
    SyncTick,
    EnforceVisibility,
    KeyUp(char),
    RefreshCheckboxes,
    RefreshButtons(Category),
    PopulateOptionLists,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub completed: Vec<&'static str>,
    pub failures: Vec<OverlayError>,
    pub intervals_started: bool,
}

impl SetupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, step: &'static str, result: Result<(), OverlayError>) {
        match result {
            Ok(()) => {
                debug!(step, "setup step complete");
                self.completed.push(step);
            }
            Err(err) => {
                warn!(step, error = %err, "setup step failed");
                self.failures.push(OverlayError::SetupStep {
                    step,
                    reason: err.to_string(),
                });
            }
        }
    }
}

#[derive(Debug)]
pub struct OverlaySession {
    contract: HostContract,
    timings: Timings,
    prober: AttachmentProber,
    registry: HostRegistry,
    controls: ControlRegistry,
    state: OverlayState,
    recurring: Vec<TimerId>,
    setup: Option<SetupReport>,
}

impl OverlaySession {
    pub fn new(contract: HostContract, timings: Timings) -> Self {
        let prober = AttachmentProber::new(timings.probe_interval_ms, timings.probe_max_attempts);
        Self {
            contract,
            timings,
            prober,
            registry: HostRegistry::default(),
            controls: ControlRegistry::new(),
            state: OverlayState::default(),
            recurring: Vec::new(),
            setup: None,
        }
    }

    pub fn contract(&self) -> &HostContract {
        &self.contract
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn prober(&self) -> &AttachmentProber {
        &self.prober
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    pub fn controls(&self) -> &ControlRegistry {
        &self.controls
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn setup_report(&self) -> Option<&SetupReport> {
        self.setup.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.setup.is_some()
    }

    pub fn recurring_timers(&self) -> &[TimerId] {
        &self.recurring
    }

    pub fn start(&mut self, doc: &Document, timers: &mut Scheduler<Task>) {
        self.prober.start(doc, timers);
    }

    pub fn document_ready(&mut self, timers: &mut Scheduler<Task>) {
        self.prober.document_ready(timers);
    }

    /// Run the one-time setup. A second call is a no-op returning the first report.
    pub fn setup(&mut self, doc: &mut Document, timers: &mut Scheduler<Task>) -> &SetupReport {
        if self.setup.is_none() {
            let report = self.run_setup(doc, timers);
            if report.is_clean() {
                info!("overlay initialized");
            } else {
                warn!(failures = report.failures.len(), "overlay initialized with failures");
            }
            self.setup = Some(report);
        }
        self.setup.get_or_insert_with(SetupReport::default)
    }

    fn run_setup(&mut self, doc: &mut Document, timers: &mut Scheduler<Task>) -> SetupReport {
        let mut report = SetupReport::default();

        self.registry = HostRegistry::scan(doc, &self.contract);
        report.record("scan registry", Ok(()));

        report.record(
            "inject styles",
            presentation::inject_styles(doc).map(|_| ()),
        );
        report.record(
            "inject icon",
            presentation::inject_icon(doc, &self.contract).map(|_| ()),
        );
        report.record(
            "create panel",
            presentation::build_panel(doc, &self.contract).map(|_| ()),
        );
        let wired = self.wire_controls(doc, timers);
        report.intervals_started = matches!(wired, Ok(true));
        report.record("wire controls", wired.map(|_| ()));

        suppress::suppress_host_controls(doc, &self.contract);
        report.record("suppress host controls", Ok(()));
        report
    }

    /// Returns whether the recurring tasks were started.
    fn wire_controls(
        &mut self,
        doc: &Document,
        timers: &mut Scheduler<Task>,
    ) -> Result<bool, OverlayError> {
        let panel = doc
            .get_element_by_id(ids::PANEL)
            .ok_or_else(|| OverlayError::missing(ids::PANEL))?;
        let icon = doc.get_element_by_id(ids::ICON);
        self.controls.wire(doc, panel, icon);
        timers.set_timeout(self.timings.option_list_delay_ms, Task::PopulateOptionLists);

        if doc.get_element_by_id(&self.contract.anchor_id).is_none() {
            warn!("anchor gone before wiring; recurring sync not started");
            return Ok(false);
        }
        self.recurring = vec![
            timers.set_interval(self.timings.sync_interval_ms, Task::SyncTick),
            timers.set_interval(self.timings.visibility_interval_ms, Task::EnforceVisibility),
        ];
        debug!(
            sync_ms = self.timings.sync_interval_ms,
            visibility_ms = self.timings.visibility_interval_ms,
            "recurring tasks started"
        );
        Ok(true)
    }

    pub fn run_task(
        &mut self,
        task: Task,
        doc: &mut Document,
        timers: &mut Scheduler<Task>,
        control: &mut dyn HostControl,
    ) {
        match task {
            Task::Probe => {
                if self.prober.check(doc, &self.contract, timers) == ProbeOutcome::Found {
                    self.setup(doc, timers);
                }
            }
            Task::SyncTick => {
                reconcile::sync_tick(doc, &self.contract, &self.registry, &mut self.state);
            }
            Task::EnforceVisibility => {
                reconcile::enforce_visibility(doc, &self.contract, &self.state);
            }
            Task::KeyUp(key) => {
                control.release_shortcut(&mut HostContext::new(doc, timers), key);
            }
            Task::RefreshCheckboxes => {
                reconcile::refresh_checkboxes(doc, &self.contract);
            }
            Task::RefreshButtons(category) => {
                if let Err(err) = reconcile::refresh_button_group(
                    doc,
                    &self.contract,
                    &self.registry,
                    category,
                    &mut self.state,
                ) {
                    debug!(error = %err, "button refresh skipped");
                }
            }
            Task::PopulateOptionLists => self.populate_option_lists(doc),
        }
    }

    fn populate_option_lists(&mut self, doc: &mut Document) {
        for category in Category::ALL.into_iter().filter(|c| c.is_expandable()) {
            if let Err(err) =
                presentation::populate_option_list(doc, &self.registry, &mut self.controls, category)
            {
                debug!(category = category.label(), error = %err, "option list skipped");
                continue;
            }
            if let Err(err) = reconcile::refresh_selection(
                doc,
                &self.contract,
                &self.registry,
                category,
                &mut self.state,
            ) {
                debug!(category = category.label(), error = %err, "selector refresh skipped");
            }
        }
    }

    /// Route a user-delivered event after the host's own listeners have seen it.
    pub fn handle_user_event(
        &mut self,
        event: &Event,
        doc: &mut Document,
        timers: &mut Scheduler<Task>,
        control: &mut dyn HostControl,
    ) {
        if !self.is_attached() {
            return;
        }
        let action = self.controls.action_for(doc, event);
        let over_overlay = self.targets_overlay(doc, event.target);
        let mut panel = PanelActionContext::new(
            HostContext::new(doc, timers),
            control,
            &self.contract,
            &self.registry,
            &self.timings,
            &mut self.state,
        );
        if let Some(action) = action {
            if let Err(err) = panel.handle(action) {
                debug!(error = %err, "overlay action degraded");
            }
        }
        match event.kind {
            EventKind::Click => {
                panel.dismiss_if_outside(event.target);
            }
            EventKind::PointerEnter if over_overlay => panel.pointer_over_overlay(true),
            EventKind::PointerLeave if over_overlay => panel.pointer_over_overlay(false),
            _ => {}
        }
    }

    /// Event landed directly on the panel or the icon.
    fn targets_overlay(&self, doc: &Document, target: EventTarget) -> bool {
        let Some(node) = target.node() else {
            return false;
        };
        [ids::PANEL, ids::ICON]
            .into_iter()
            .filter_map(|id| doc.get_element_by_id(id))
            .any(|overlay| overlay == node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Host with the menu bar but none of its left-hand items.
    fn bare_menu_bar(contract: &HostContract) -> Document {
        let mut doc = Document::new();
        let body = doc.body();
        let menu_bar = doc.create_element("div");
        doc.set_id(menu_bar, &contract.menu_bar_id);
        doc.append_child(body, menu_bar).unwrap();
        doc
    }

    #[test]
    fn failed_step_does_not_block_later_steps() {
        let contract = HostContract::default();
        let mut doc = bare_menu_bar(&contract);
        let mut timers = Scheduler::new();
        let mut session = OverlaySession::new(contract, Timings::default());

        let report = session.setup(&mut doc, &mut timers).clone();
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            OverlayError::SetupStep { step: "inject icon", .. }
        ));
        assert_eq!(
            report.completed,
            vec![
                "scan registry",
                "inject styles",
                "create panel",
                "wire controls",
                "suppress host controls",
            ]
        );
        assert!(!report.intervals_started);
        assert!(session.recurring_timers().is_empty());
        assert!(doc.get_element_by_id(ids::PANEL).is_some());
        assert!(doc.get_element_by_id(ids::ICON).is_none());
        assert!(timers
            .pending()
            .iter()
            .all(|timer| timer.period_ms.is_none()));
    }

    #[test]
    fn second_setup_returns_first_report() {
        let contract = HostContract::default();
        let mut doc = bare_menu_bar(&contract);
        let mut timers = Scheduler::new();
        let mut session = OverlaySession::new(contract, Timings::default());

        let first = session.setup(&mut doc, &mut timers).clone();
        let pending = timers.len();
        let second = session.setup(&mut doc, &mut timers).clone();
        assert_eq!(first, second);
        assert_eq!(timers.len(), pending);
    }
}
