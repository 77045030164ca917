//! Maps overlay nodes to the intent they carry.
//!
//! Tracks which overlay node answers which trigger, the way a click target maps to a
//! button action, so input can be resolved by walking up from the event target.

use tracing::debug;

use crate::dom::{Document, Event, EventKind, NodeId};
use crate::registry::Category;

use super::ids;

/// Host toggles mirrored as overlay checkboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostToggle {
    Autodrive,
    Headlights,
    ShowUi,
}

impl HostToggle {
    pub const ALL: [HostToggle; 3] = [HostToggle::Autodrive, HostToggle::Headlights, HostToggle::ShowUi];

    pub fn key(self) -> &'static str {
        match self {
            HostToggle::Autodrive => "autodrive",
            HostToggle::Headlights => "headlights",
            HostToggle::ShowUi => "showui",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            HostToggle::Autodrive => "Autodrive",
            HostToggle::Headlights => "Headlights",
            HostToggle::ShowUi => "Show UI Elements",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|toggle| toggle.key() == key)
    }
}

/// One-shot host commands with no overlay state of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickAction {
    Reset,
    Camera,
}

impl QuickAction {
    pub const ALL: [QuickAction; 2] = [QuickAction::Reset, QuickAction::Camera];

    pub fn key(self) -> &'static str {
        match self {
            QuickAction::Reset => "reset",
            QuickAction::Camera => "camera",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayAction {
    TogglePanel,
    ClosePanel,
    Toggle(HostToggle),
    Quick(QuickAction),
    ToggleExpand(Category),
    Choose { category: Category, name: String },
    Volume,
    Mute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    node: NodeId,
    trigger: EventKind,
    action: OverlayAction,
}

#[derive(Debug, Clone, Default)]
pub struct ControlRegistry {
    bindings: Vec<Binding>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node: NodeId, trigger: EventKind, action: OverlayAction) {
        if self
            .bindings
            .iter()
            .any(|binding| binding.node == node && binding.trigger == trigger)
        {
            return;
        }
        self.bindings.push(Binding {
            node,
            trigger,
            action,
        });
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind every marked control inside `panel` plus the toolbar icon.
    pub fn wire(&mut self, doc: &Document, panel: NodeId, icon: Option<NodeId>) -> usize {
        let before = self.bindings.len();
        if let Some(icon) = icon {
            self.register(icon, EventKind::MouseDown, OverlayAction::TogglePanel);
        }
        for node in doc.descendants(panel) {
            if let Some(action) = action_for_node(doc, node) {
                let trigger = if action == OverlayAction::Volume {
                    EventKind::Input
                } else {
                    EventKind::Click
                };
                self.register(node, trigger, action);
            }
        }
        let wired = self.bindings.len() - before;
        debug!(wired, "overlay controls wired");
        wired
    }

    /// Innermost bound node on the path from the event target up to the root.
    pub fn action_for(&self, doc: &Document, event: &Event) -> Option<OverlayAction> {
        let mut current = event.target.node();
        while let Some(node) = current {
            if let Some(binding) = self
                .bindings
                .iter()
                .find(|binding| binding.node == node && binding.trigger == event.kind)
            {
                return Some(binding.action.clone());
            }
            current = doc.parent(node);
        }
        None
    }

    pub fn node_for(&self, action: &OverlayAction) -> Option<NodeId> {
        self.bindings
            .iter()
            .find(|binding| &binding.action == action)
            .map(|binding| binding.node)
    }

    /// Option nodes bound for `category`, with the roster name each one selects.
    pub fn choices(&self, category: Category) -> Vec<(NodeId, &str)> {
        self.bindings
            .iter()
            .filter_map(|binding| match &binding.action {
                OverlayAction::Choose {
                    category: bound,
                    name,
                } if *bound == category => Some((binding.node, name.as_str())),
                _ => None,
            })
            .collect()
    }
}

fn action_for_node(doc: &Document, node: NodeId) -> Option<OverlayAction> {
    if let Some(id) = doc.attr(node, "id") {
        match id {
            ids::CLOSE_BUTTON => return Some(OverlayAction::ClosePanel),
            ids::VOLUME_SLIDER => return Some(OverlayAction::Volume),
            ids::MUTE_BUTTON => return Some(OverlayAction::Mute),
            _ => {}
        }
        if let Some(category) = Category::ALL
            .into_iter()
            .find(|category| ids::expand_button(*category) == id)
        {
            return Some(OverlayAction::ToggleExpand(category));
        }
    }
    if let Some(toggle) = doc.attr(node, "data-control").and_then(HostToggle::from_key) {
        return Some(OverlayAction::Toggle(toggle));
    }
    if let Some(action) = doc.attr(node, "data-action").and_then(QuickAction::from_key) {
        return Some(OverlayAction::Quick(action));
    }
    for category in [Category::Vehicle, Category::InputMethod] {
        let Some(attr) = ids::button_attr(category) else {
            continue;
        };
        if let Some(name) = doc.attr(node, attr) {
            return Some(OverlayAction::Choose {
                category,
                name: name.to_string(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_for_walks_up_to_bound_ancestor() {
        let mut doc = Document::new();
        let body = doc.body();
        let item = doc.create_element("div");
        doc.set_attr(item, "data-control", "autodrive");
        let checkbox = doc.create_element("div");
        doc.append_child(item, checkbox).unwrap();
        doc.append_child(body, item).unwrap();

        let mut controls = ControlRegistry::new();
        assert_eq!(controls.wire(&doc, body, None), 1);
        let event = Event::on_node(EventKind::Click, checkbox);
        assert_eq!(
            controls.action_for(&doc, &event),
            Some(OverlayAction::Toggle(HostToggle::Autodrive))
        );
        let wrong_trigger = Event::on_node(EventKind::MouseDown, checkbox);
        assert_eq!(controls.action_for(&doc, &wrong_trigger), None);
    }

    #[test]
    fn wiring_twice_does_not_duplicate_bindings() {
        let mut doc = Document::new();
        let body = doc.body();
        let button = doc.create_element("button");
        doc.set_attr(button, "data-vehicle", "Bus");
        doc.append_child(body, button).unwrap();
        let mut controls = ControlRegistry::new();
        controls.wire(&doc, body, None);
        controls.wire(&doc, body, None);
        assert_eq!(controls.len(), 1);
        assert_eq!(controls.choices(Category::Vehicle), vec![(button, "Bus")]);
    }

    #[test]
    fn slider_binds_to_input_events() {
        let mut doc = Document::new();
        let body = doc.body();
        let slider = doc.create_element("input");
        doc.set_id(slider, ids::VOLUME_SLIDER);
        doc.append_child(body, slider).unwrap();
        let mut controls = ControlRegistry::new();
        controls.wire(&doc, body, None);
        let event = Event::on_node(EventKind::Input, slider);
        assert_eq!(controls.action_for(&doc, &event), Some(OverlayAction::Volume));
    }
}
