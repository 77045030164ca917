//! End-of-run summary, printed as text or JSON.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;
use settings_overlay::host_sim::HostObservations;
use settings_overlay::presentation::{ids, HostToggle};
use settings_overlay::{Category, Runtime};

use crate::driver_mode::DriveOutcome;

#[derive(Debug, Serialize)]
pub(crate) struct SimSummary {
    pub elapsed_ms: u64,
    pub probe_state: &'static str,
    pub probe_attempts: u32,
    pub attached: bool,
    pub setup_steps: Vec<&'static str>,
    pub setup_failures: Vec<String>,
    pub intervals_started: bool,
    pub panel_open: bool,
    /// Host-side active item per category, read straight from the document.
    pub host_selection: BTreeMap<&'static str, Option<String>>,
    /// What the overlay last rendered per category.
    pub overlay_selection: BTreeMap<&'static str, Option<String>>,
    pub checkboxes: BTreeMap<&'static str, bool>,
    pub volume: Option<String>,
    pub actions_performed: usize,
    pub action_failures: Vec<String>,
    pub pending_timers: usize,
    pub host: Option<HostObservations>,
}

impl SimSummary {
    pub(crate) fn collect(
        runtime: &Runtime,
        outcome: &DriveOutcome,
        host: Option<HostObservations>,
    ) -> Self {
        let session = runtime.session();
        let doc = runtime.doc();
        let probe = session.prober().state();
        let setup = session.setup_report();

        let mut host_selection = BTreeMap::new();
        let mut overlay_selection = BTreeMap::new();
        for category in Category::ALL {
            host_selection.insert(
                category.label(),
                session
                    .registry()
                    .active_name(doc, session.contract(), category),
            );
            overlay_selection.insert(
                category.label(),
                session
                    .state()
                    .rendered_selection(category)
                    .map(str::to_string),
            );
        }

        let mut checkboxes = BTreeMap::new();
        for toggle in [HostToggle::Autodrive, HostToggle::Headlights, HostToggle::ShowUi] {
            if let Some(node) = doc.get_element_by_id(&ids::checkbox(toggle.key())) {
                checkboxes.insert(toggle.key(), doc.has_class(node, ids::ACTIVE_CLASS));
            }
        }

        Self {
            elapsed_ms: runtime.now_ms(),
            probe_state: probe.label(),
            probe_attempts: probe.attempts(),
            attached: session.is_attached(),
            setup_steps: setup.map(|report| report.completed.clone()).unwrap_or_default(),
            setup_failures: setup
                .map(|report| report.failures.iter().map(ToString::to_string).collect())
                .unwrap_or_default(),
            intervals_started: setup.map(|report| report.intervals_started).unwrap_or(false),
            panel_open: session.state().open,
            host_selection,
            overlay_selection,
            checkboxes,
            volume: doc
                .get_element_by_id(ids::VOLUME_SLIDER)
                .and_then(|node| doc.value(node))
                .map(str::to_string),
            actions_performed: outcome.actions_performed,
            action_failures: outcome.failures.clone(),
            pending_timers: runtime.timers().len(),
            host,
        }
    }

    pub(crate) fn render_text(&self) -> String {
        let mut report = TextReport::new("Settings Overlay Simulation");
        report.push_kv("version", env!("CARGO_PKG_VERSION"));
        report.push_kv("elapsed_ms", self.elapsed_ms);

        report.section("Attachment");
        report.push_kv("probe", self.probe_state);
        report.push_kv("attempts", self.probe_attempts);
        report.push_kv("attached", self.attached);
        report.push_kv("intervals", self.intervals_started);
        if !self.setup_steps.is_empty() {
            report.push_kv("setup", self.setup_steps.join(", "));
        }
        for failure in &self.setup_failures {
            report.push_kv("setup_error", failure);
        }

        report.section("Panel");
        report.push_kv("open", self.panel_open);
        for (category, host) in &self.host_selection {
            let overlay = self
                .overlay_selection
                .get(category)
                .cloned()
                .flatten();
            report.push_kv(
                category,
                format!(
                    "host={} overlay={}",
                    host.as_deref().unwrap_or("-"),
                    overlay.as_deref().unwrap_or("-")
                ),
            );
        }
        for (toggle, on) in &self.checkboxes {
            report.push_kv(toggle, if *on { "on" } else { "off" });
        }
        if let Some(volume) = &self.volume {
            report.push_kv("volume", volume);
        }

        report.section("Actions");
        report.push_kv("performed", self.actions_performed);
        for failure in &self.action_failures {
            report.push_kv("failed", failure);
        }
        report.push_kv("pending_timers", self.pending_timers);

        if let Some(host) = &self.host {
            report.section("Host");
            report.push_kv("activations", host.activations.join(", "));
            report.push_kv("headlights", host.headlights);
            report.push_kv("ui_visible", host.ui_visible);
            report.push_kv("resets", host.resets);
            report.push_kv("camera_changes", host.camera_changes);
            report.push_kv("volume", host.volume);
        }
        report.render()
    }
}

struct TextReport {
    lines: Vec<String>,
}

impl TextReport {
    fn new(title: &str) -> Self {
        Self {
            lines: vec![title.to_string()],
        }
    }

    fn section(&mut self, title: &str) {
        self.lines.push(String::new());
        self.lines.push(format!("{title}:"));
    }

    fn push_kv(&mut self, key: &str, value: impl Display) {
        self.lines.push(format!("  {key}: {value}"));
    }

    fn render(&self) -> String {
        self.lines.join("\n")
    }
}
