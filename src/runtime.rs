//! Owns the document, the dispatcher and the overlay session, and advances them together.

use tracing::{debug, warn};

use crate::bridge::{format_level, EventBridge, HostControl};
use crate::config::Timings;
use crate::contract::HostContract;
use crate::dom::{Document, Event, EventKind, NodeId, ReadyState};
use crate::error::OverlayError;
use crate::presentation::{ids, OverlayAction};
use crate::scheduler::Scheduler;
use crate::script::ScriptAction;
use crate::session::{OverlaySession, Task};

/// Upper bound on tasks run by one `advance` call.
const TASK_STEP_LIMIT: usize = 100_000;

pub struct Runtime {
    doc: Document,
    timers: Scheduler<Task>,
    session: OverlaySession,
    control: Box<dyn HostControl>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("now_ms", &self.timers.now_ms())
            .field("pending", &self.timers.len())
            .field("session", &self.session)
            .finish()
    }
}

impl Runtime {
    pub fn new(doc: Document, contract: HostContract, timings: Timings) -> Self {
        let control = Box::new(EventBridge::new(timings.key_up_delay_ms));
        Self {
            doc,
            timers: Scheduler::new(),
            session: OverlaySession::new(contract, timings),
            control,
        }
    }

    /// Replace the synthesized-event bridge, e.g. with a direct host API.
    pub fn with_control(mut self, control: Box<dyn HostControl>) -> Self {
        self.control = control;
        self
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn session(&self) -> &OverlaySession {
        &self.session
    }

    pub fn timers(&self) -> &Scheduler<Task> {
        &self.timers
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Begin probing for the host anchor.
    pub fn start(&mut self) {
        self.session.start(&self.doc, &mut self.timers);
    }

    /// Content-loaded: the document becomes parseable and a deferred probe starts.
    pub fn mark_document_ready(&mut self) {
        if self.doc.ready_state() == ReadyState::Loading {
            self.doc.set_ready_state(ReadyState::Interactive);
        }
        self.session.document_ready(&mut self.timers);
    }

    /// Run every task due within the next `ms` milliseconds. Returns how many ran.
    pub fn advance(&mut self, ms: u64) -> usize {
        let target = self.timers.now_ms().saturating_add(ms);
        self.advance_to(target)
    }

    pub fn advance_to(&mut self, target_ms: u64) -> usize {
        let mut ran = 0;
        while let Some((_, task)) = self.timers.pop_due(target_ms) {
            self.session
                .run_task(task, &mut self.doc, &mut self.timers, self.control.as_mut());
            ran += 1;
            if ran >= TASK_STEP_LIMIT {
                warn!(ran, "task step limit reached; remaining work deferred");
                return ran;
            }
        }
        self.timers.advance_clock_to(target_ms);
        ran
    }

    /// A user-delivered event: host listeners first, then the overlay.
    pub fn deliver(&mut self, event: Event) {
        self.doc.dispatch(event.clone());
        self.session.handle_user_event(
            &event,
            &mut self.doc,
            &mut self.timers,
            self.control.as_mut(),
        );
    }

    /// Mouse press followed by click, as a pointer device produces them.
    pub fn click(&mut self, node: NodeId) {
        self.deliver(Event::on_node(EventKind::MouseDown, node));
        self.deliver(Event::on_node(EventKind::Click, node));
    }

    pub fn click_document(&mut self) {
        let body = self.doc.body();
        self.click(body);
    }

    /// Drag the overlay's slider to `level`.
    pub fn set_slider(&mut self, level: f64) -> Result<(), OverlayError> {
        let slider = self
            .doc
            .get_element_by_id(ids::VOLUME_SLIDER)
            .ok_or_else(|| OverlayError::missing(ids::VOLUME_SLIDER))?;
        self.doc.set_value(slider, &format_level(level));
        self.deliver(Event::on_node(EventKind::Input, slider));
        Ok(())
    }

    pub fn pointer_enter(&mut self, node: NodeId) {
        self.deliver(Event::pointer(EventKind::PointerEnter, node));
    }

    pub fn pointer_leave(&mut self, node: NodeId) {
        self.deliver(Event::pointer(EventKind::PointerLeave, node));
    }

    /// Overlay node bound to `action`, once wired.
    pub fn overlay_node(&self, action: &OverlayAction) -> Option<NodeId> {
        self.session.controls().node_for(action)
    }

    fn required(&self, action: &OverlayAction, label: &str) -> Result<NodeId, OverlayError> {
        self.overlay_node(action)
            .ok_or_else(|| OverlayError::missing(label))
    }

    /// Perform one scripted user action.
    pub fn perform(&mut self, action: &ScriptAction) -> Result<(), OverlayError> {
        debug!(%action, at_ms = self.now_ms(), "scripted action");
        match action {
            ScriptAction::Open | ScriptAction::Close => {
                let want_open = matches!(action, ScriptAction::Open);
                if self.session.state().open == want_open {
                    return Ok(());
                }
                let node = if want_open {
                    self.required(&OverlayAction::TogglePanel, ids::ICON)?
                } else {
                    self.required(&OverlayAction::ClosePanel, ids::CLOSE_BUTTON)?
                };
                self.click(node);
            }
            ScriptAction::Outside => self.click_document(),
            ScriptAction::Toggle(toggle) => {
                let node = self.required(&OverlayAction::Toggle(*toggle), toggle.key())?;
                self.click(node);
            }
            ScriptAction::Quick(quick) => {
                let node = self.required(&OverlayAction::Quick(*quick), quick.key())?;
                self.click(node);
            }
            ScriptAction::Choose { category, name } => {
                let node = if category.is_expandable() {
                    self.session
                        .controls()
                        .choices(*category)
                        .into_iter()
                        .find(|(_, choice)| *choice == name.as_str())
                        .map(|(node, _)| node)
                } else {
                    self.overlay_node(&OverlayAction::Choose {
                        category: *category,
                        name: name.clone(),
                    })
                };
                let node = node.ok_or_else(|| OverlayError::missing(name.as_str()))?;
                self.click(node);
            }
            ScriptAction::Volume(level) => self.set_slider(*level)?,
            ScriptAction::Mute => {
                let node = self.required(&OverlayAction::Mute, ids::MUTE_BUTTON)?;
                self.click(node);
            }
            ScriptAction::Wait(ms) => {
                self.advance(*ms);
            }
        }
        Ok(())
    }
}
