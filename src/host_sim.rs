//! Simulated host page with live listeners, laid out like the Speed Verse menu bar.
//!
//! The host knows nothing about the overlay. It only reacts to clicks on its own items,
//! document-level shortcut keys and its own volume input, exactly as a real page would.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use crate::contract::HostContract;
use crate::dom::{listener, Document, Event, EventKind, EventTarget, MouseLook, NodeId};
use crate::error::OverlayError;
use crate::registry::Category;

/// Everything the host "felt", for reports and assertions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostObservations {
    pub activations: Vec<String>,
    pub key_downs: Vec<char>,
    pub key_ups: Vec<char>,
    pub autodrive: bool,
    pub headlights: bool,
    pub ui_visible: bool,
    pub resets: u32,
    pub camera_changes: u32,
    pub volume: f64,
    pub volume_changes: u32,
    /// Last value passed to the mouse-look capability, if ever called.
    pub mouse_enabled: Option<bool>,
}

struct MouseLookRecorder(Rc<RefCell<HostObservations>>);

impl MouseLook for MouseLookRecorder {
    fn set_mouse_enabled(&self, enabled: bool) {
        self.0.borrow_mut().mouse_enabled = Some(enabled);
    }
}

/// Which items the demo host marks active on first render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoHostOptions {
    pub scene: String,
    pub weather: String,
    pub vehicle: String,
    pub input: String,
    pub autodrive: bool,
}

impl Default for DemoHostOptions {
    fn default() -> Self {
        Self {
            scene: "Mars".to_string(),
            weather: "Clear".to_string(),
            vehicle: "Car".to_string(),
            input: "Mouse".to_string(),
            autodrive: false,
        }
    }
}

impl DemoHostOptions {
    fn initial(&self, category: Category) -> &str {
        match category {
            Category::Scene => &self.scene,
            Category::Weather => &self.weather,
            Category::Vehicle => &self.vehicle,
            Category::InputMethod => &self.input,
        }
    }
}

#[derive(Clone)]
pub struct DemoHost {
    contract: HostContract,
    options: DemoHostOptions,
    observations: Rc<RefCell<HostObservations>>,
}

impl std::fmt::Debug for DemoHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoHost")
            .field("options", &self.options)
            .field("observations", &self.observations.borrow())
            .finish()
    }
}

impl DemoHost {
    pub fn new(contract: HostContract, options: DemoHostOptions) -> Self {
        let observations = HostObservations {
            autodrive: options.autodrive,
            ui_visible: true,
            volume: 0.5,
            ..HostObservations::default()
        };
        Self {
            contract,
            options,
            observations: Rc::new(RefCell::new(observations)),
        }
    }

    pub fn observations(&self) -> HostObservations {
        self.observations.borrow().clone()
    }

    /// Build the host markup into `doc` and register the host's listeners.
    pub fn render(&self, doc: &mut Document) -> Result<(), OverlayError> {
        let contract = &self.contract;
        let body = doc.body();
        let menu_bar = el(doc, body, "div", Some(contract.menu_bar_id.as_str()), &[])?;
        doc.set_display(menu_bar, Some(contract.menu_bar_display.as_str()));
        let left = el(doc, menu_bar, "div", Some(contract.anchor_id.as_str()), &[])?;

        for (index, category) in Category::ALL.into_iter().enumerate() {
            if index > 0 {
                el(doc, left, "div", None, &[contract.divider_class.as_str()])?;
            }
            self.render_group(doc, left, category)?;
        }
        el(doc, left, "div", None, &[contract.divider_class.as_str()])?;
        self.menu_item(doc, left, "Help")?;

        let right = el(doc, menu_bar, "div", Some(contract.side_bar_id.as_str()), &[])?;
        let audio = self.menu_item(doc, right, "Audio")?;
        self.render_volume(doc, audio)?;

        self.render_autodrive(doc, body)?;
        let pause = el(doc, body, "div", Some(contract.pause_indicator_id.as_str()), &[])?;
        doc.set_display(pause, Some("none"));
        el(doc, body, "canvas", None, &[])?;

        self.register_shortcuts(doc, menu_bar);
        doc.set_mouse_look(Rc::new(MouseLookRecorder(self.observations.clone())));
        debug!(nodes = doc.node_count(), "demo host rendered");
        Ok(())
    }

    fn menu_item(&self, doc: &mut Document, parent: NodeId, label: &str) -> Result<NodeId, OverlayError> {
        let item = el(doc, parent, "div", None, &[self.contract.menu_item_class.as_str()])?;
        let img = el(doc, item, &self.contract.label_tag, None, &[])?;
        doc.set_attr(img, &self.contract.label_attr, label);
        Ok(item)
    }

    fn render_group(
        &self,
        doc: &mut Document,
        parent: NodeId,
        category: Category,
    ) -> Result<(), OverlayError> {
        let mut group = Vec::new();
        for name in self.contract.vocabulary(category) {
            let item = self.menu_item(doc, parent, name)?;
            if name == self.options.initial(category) {
                doc.add_class(item, &self.contract.active_class);
            }
            group.push((item, name.clone()));
        }
        let members: Vec<NodeId> = group.iter().map(|(node, _)| *node).collect();
        for (item, name) in group {
            let members = members.clone();
            let active_class = self.contract.active_class.clone();
            let observations = self.observations.clone();
            doc.add_listener(
                EventTarget::Node(item),
                EventKind::Click,
                listener(move |doc, _| {
                    for member in &members {
                        doc.remove_class(*member, &active_class);
                    }
                    doc.add_class(item, &active_class);
                    observations.borrow_mut().activations.push(name.clone());
                }),
            );
        }
        Ok(())
    }

    fn render_volume(&self, doc: &mut Document, parent: NodeId) -> Result<(), OverlayError> {
        let input = el(doc, parent, "input", None, &["host-volume"])?;
        doc.set_attr(input, "type", "range");
        doc.set_value(input, "0.5");
        let observations = self.observations.clone();
        doc.add_listener(
            EventTarget::Node(input),
            EventKind::Input,
            listener(move |doc, event| {
                let Some(node) = event.target.node() else {
                    return;
                };
                if let Some(level) = doc.value(node).and_then(|raw| raw.parse::<f64>().ok()) {
                    observations.borrow_mut().volume = level;
                }
            }),
        );
        let observations = self.observations.clone();
        doc.add_listener(
            EventTarget::Node(input),
            EventKind::Change,
            listener(move |_, _| observations.borrow_mut().volume_changes += 1),
        );
        Ok(())
    }

    fn render_autodrive(&self, doc: &mut Document, parent: NodeId) -> Result<(), OverlayError> {
        let hud = el(doc, parent, "div", Some("hud"), &[])?;
        let button = el(doc, hud, "div", Some(self.contract.autodrive_id.as_str()), &[])?;
        if self.options.autodrive {
            doc.add_class(button, &self.contract.autodrive_active_class);
        }
        let engaged_class = self.contract.autodrive_active_class.clone();
        let observations = self.observations.clone();
        doc.add_listener(
            EventTarget::Node(button),
            EventKind::Click,
            listener(move |doc, _| {
                let engaged = !doc.has_class(button, &engaged_class);
                doc.set_class(button, &engaged_class, engaged);
                let mut seen = observations.borrow_mut();
                seen.autodrive = engaged;
                seen.activations.push("autodrive".to_string());
            }),
        );
        Ok(())
    }

    fn register_shortcuts(&self, doc: &mut Document, menu_bar: NodeId) {
        let shortcuts = self.contract.shortcuts;
        let ui_reference = self.contract.ui_reference_id.clone();
        let bar_display = self.contract.menu_bar_display.clone();
        let observations = self.observations.clone();
        doc.add_listener(
            EventTarget::Document,
            EventKind::KeyDown,
            listener(move |doc, event: &Event| {
                let Some(key) = event.key.as_ref().map(|info| info.key.to_ascii_uppercase()) else {
                    return;
                };
                let mut seen = observations.borrow_mut();
                seen.key_downs.push(key);
                if key == shortcuts.headlights {
                    seen.headlights = !seen.headlights;
                } else if key == shortcuts.toggle_ui {
                    seen.ui_visible = !seen.ui_visible;
                    let hidden = (!seen.ui_visible).then_some("none");
                    if let Some(node) = doc.get_element_by_id(&ui_reference) {
                        doc.set_display(node, hidden);
                    }
                    // The host hides its whole chrome, menu bar included.
                    doc.set_display(menu_bar, hidden.or(Some(bar_display.as_str())));
                } else if key == shortcuts.reset {
                    seen.resets += 1;
                } else if key == shortcuts.camera {
                    seen.camera_changes += 1;
                }
            }),
        );
        let observations = self.observations.clone();
        doc.add_listener(
            EventTarget::Document,
            EventKind::KeyUp,
            listener(move |_, event: &Event| {
                if let Some(info) = &event.key {
                    observations.borrow_mut().key_ups.push(info.key.to_ascii_uppercase());
                }
            }),
        );
    }
}

fn el(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    id: Option<&str>,
    classes: &[&str],
) -> Result<NodeId, OverlayError> {
    let node = doc.create_element(tag);
    if let Some(id) = id {
        doc.set_id(node, id);
    }
    for class in classes {
        doc.add_class(node, class);
    }
    doc.append_child(parent, node)?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HostRegistry;

    fn rendered() -> (Document, DemoHost) {
        let mut doc = Document::new();
        let host = DemoHost::new(HostContract::default(), DemoHostOptions::default());
        host.render(&mut doc).unwrap();
        (doc, host)
    }

    #[test]
    fn menu_items_are_exclusive_within_their_group() {
        let (mut doc, host) = rendered();
        let contract = HostContract::default();
        let registry = HostRegistry::scan(&doc, &contract);
        assert_eq!(registry.roster(Category::Scene).len(), 4);
        assert_eq!(registry.roster(Category::Weather).len(), 5);

        let venus = registry.roster(Category::Scene).find("Venus").unwrap().node;
        doc.dispatch(Event::on_node(EventKind::Click, venus));
        assert_eq!(
            registry.active_name(&doc, &contract, Category::Scene).as_deref(),
            Some("Venus")
        );
        assert_eq!(
            registry.active_name(&doc, &contract, Category::Weather).as_deref(),
            Some("Clear")
        );
        assert_eq!(host.observations().activations, vec!["Venus".to_string()]);
    }

    #[test]
    fn ui_shortcut_hides_chrome() {
        let (mut doc, host) = rendered();
        doc.dispatch(Event::key(EventKind::KeyDown, 'U'));
        let autodrive = doc.get_element_by_id("autodrive").unwrap();
        let menu_bar = doc.get_element_by_id("menu-bar").unwrap();
        assert!(!doc.is_rendered(autodrive));
        assert_eq!(doc.display(menu_bar), Some("none"));
        assert!(!host.observations().ui_visible);

        doc.dispatch(Event::key(EventKind::KeyDown, 'U'));
        assert!(doc.is_rendered(autodrive));
        assert_eq!(doc.display(menu_bar), Some("flex"));
    }

    #[test]
    fn autodrive_click_toggles_marker() {
        let (mut doc, host) = rendered();
        let autodrive = doc.get_element_by_id("autodrive").unwrap();
        doc.dispatch(Event::on_node(EventKind::Click, autodrive));
        assert!(doc.has_class(autodrive, "autodrive-active"));
        assert!(host.observations().autodrive);
    }

    #[test]
    fn unlabelled_vocabulary_items_are_ignored_by_scan() {
        let (doc, _) = rendered();
        let registry = HostRegistry::scan(&doc, &HostContract::default());
        assert_eq!(registry.total(), 14);
        assert!(registry.autodrive().is_some());
    }
}
