//! Indirect control of the host: the overlay has no API into it, only the host's own
//! listeners, so every command is delivered as an input event the host already handles.
//!
//! The rest of the crate talks to [`HostControl`]; [`EventBridge`] is the synthesized-event
//! implementation and can be swapped for a direct API if the host ever grows one.

use tracing::{debug, warn};

use crate::dom::{Document, Event, EventKind, NodeId};
use crate::error::OverlayError;
use crate::registry::HostElementRef;
use crate::scheduler::Scheduler;
use crate::session::Task;

/// Borrowed view of everything a host command may touch.
pub struct HostContext<'a> {
    pub doc: &'a mut Document,
    pub timers: &'a mut Scheduler<Task>,
}

impl<'a> HostContext<'a> {
    pub fn new(doc: &'a mut Document, timers: &'a mut Scheduler<Task>) -> Self {
        Self { doc, timers }
    }
}

pub trait HostControl {
    /// Trigger the host's native activation on a captured element.
    fn activate(
        &mut self,
        host: &mut HostContext<'_>,
        target: &HostElementRef,
    ) -> Result<(), OverlayError>;

    /// Press a single-character host shortcut. The matching release follows later.
    fn send_shortcut(&mut self, host: &mut HostContext<'_>, key: char);

    /// Release half of a shortcut tap.
    fn release_shortcut(&mut self, host: &mut HostContext<'_>, key: char);

    /// Push a level to every host range control except `own_slider`. Returns how many
    /// host controls were updated.
    fn set_volume(
        &mut self,
        host: &mut HostContext<'_>,
        level: f64,
        own_slider: Option<NodeId>,
    ) -> usize;
}

/// Drives the host by dispatching synthesized DOM events.
#[derive(Debug, Clone)]
pub struct EventBridge {
    key_up_delay_ms: u64,
}

impl EventBridge {
    pub fn new(key_up_delay_ms: u64) -> Self {
        Self { key_up_delay_ms }
    }

    pub fn key_up_delay_ms(&self) -> u64 {
        self.key_up_delay_ms
    }
}

impl HostControl for EventBridge {
    fn activate(
        &mut self,
        host: &mut HostContext<'_>,
        target: &HostElementRef,
    ) -> Result<(), OverlayError> {
        let node = target.resolve(host.doc)?;
        let listeners = host.doc.dispatch(Event::on_node(EventKind::Click, node));
        debug!(name = %target.name, listeners, "activated host element");
        Ok(())
    }

    fn send_shortcut(&mut self, host: &mut HostContext<'_>, key: char) {
        let listeners = host.doc.dispatch(Event::key(EventKind::KeyDown, key));
        host.timers
            .set_timeout(self.key_up_delay_ms, Task::KeyUp(key));
        debug!(%key, listeners, "shortcut key down");
        if listeners == 0 {
            warn!(%key, "no host listener reacted to shortcut");
        }
    }

    fn release_shortcut(&mut self, host: &mut HostContext<'_>, key: char) {
        host.doc.dispatch(Event::key(EventKind::KeyUp, key));
        debug!(%key, "shortcut key up");
    }

    fn set_volume(
        &mut self,
        host: &mut HostContext<'_>,
        level: f64,
        own_slider: Option<NodeId>,
    ) -> usize {
        let value = format_level(level);
        let sliders: Vec<NodeId> = host
            .doc
            .elements_by_tag("input")
            .into_iter()
            .filter(|node| host.doc.attr(*node, "type") == Some("range"))
            .filter(|node| Some(*node) != own_slider)
            .collect();
        for slider in &sliders {
            host.doc.set_value(*slider, &value);
            host.doc.dispatch(Event::on_node(EventKind::Input, *slider));
            host.doc.dispatch(Event::on_node(EventKind::Change, *slider));
        }
        debug!(level, updated = sliders.len(), "forwarded volume to host");
        sliders.len()
    }
}

/// Level on the 0.01 slider step.
pub fn snap_level(level: f64) -> f64 {
    (level * 100.0).round() / 100.0
}

/// Range-input text for a level, without trailing noise (`0.8`, `0`, `1`).
pub fn format_level(level: f64) -> String {
    format!("{}", snap_level(level))
}
