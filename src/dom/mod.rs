//! Arena-backed model of the host document so the overlay can be driven without a browser.
//!
//! Nodes are never freed; removal only detaches, which is what lets a captured
//! reference be recognised as stale instead of dangling.

mod events;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub use events::{listener, Event, EventKind, EventTarget, KeyInfo, Listener, MouseLook};
use events::ListenerStore;

use crate::error::OverlayError;

/// Most recent dispatched events kept for inspection; older ones are dropped.
pub const EVENT_LOG_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub classes: Vec<String>,
    /// Inline `display` style; `None` means the stylesheet default.
    pub display: Option<String>,
    pub text: String,
    pub value: String,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    element: Element,
}

pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    ready_state: ReadyState,
    listeners: ListenerStore,
    event_log: Vec<Event>,
    mouse_look: Option<Rc<dyn MouseLook>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("ready_state", &self.ready_state)
            .field("listeners", &self.listeners)
            .field("event_log", &self.event_log.len())
            .field("mouse_look", &self.mouse_look.is_some())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty `html > (head, body)` document, still parsing.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            ready_state: ReadyState::Loading,
            listeners: ListenerStore::default(),
            event_log: Vec::new(),
            mouse_look: None,
        };
        doc.root = doc.create_element("html");
        doc.head = doc.create_element("head");
        doc.body = doc.create_element("body");
        doc.nodes[doc.root.0].children = vec![doc.head, doc.body];
        doc.nodes[doc.head.0].parent = Some(doc.root);
        doc.nodes[doc.body.0].parent = Some(doc.root);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    pub fn set_mouse_look(&mut self, handle: Rc<dyn MouseLook>) {
        self.mouse_look = Some(handle);
    }

    pub fn mouse_look(&self) -> Option<Rc<dyn MouseLook>> {
        self.mouse_look.clone()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- construction -----------------------------------------------------

    /// New detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            element: Element {
                tag: tag.to_ascii_lowercase(),
                ..Element::default()
            },
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), OverlayError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference`, or at the end when `reference` is `None`.
    /// A child that already has a parent is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), OverlayError> {
        if !self.exists(parent) || !self.exists(child) {
            return Err(OverlayError::InvalidTree(format!(
                "unknown node in insert ({parent:?} <- {child:?})"
            )));
        }
        if self.contains(child, parent) {
            return Err(OverlayError::InvalidTree(format!(
                "{child:?} is an ancestor of {parent:?}"
            )));
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(OverlayError::InvalidTree(format!(
                    "{reference:?} is not a child of {parent:?}"
                )));
            }
        }
        self.detach(child);
        let position = reference
            .and_then(|reference| {
                self.nodes[parent.0]
                    .children
                    .iter()
                    .position(|c| *c == reference)
            })
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Remove a node from its parent. Its subtree stays in the arena, detached.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        self.nodes[node.0].parent = None;
    }

    /// Detach every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = self.children(node).to_vec();
        for child in children {
            self.detach(child);
        }
    }

    // --- navigation -------------------------------------------------------

    pub fn exists(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }

    /// Inclusive: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.exists(node) && self.contains(self.root, node)
    }

    /// Connected nodes in document (pre-)order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    pub fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|node| self.has_class(*node, class))
            .collect()
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|node| self.tag(*node) == Some(tag))
            .collect()
    }

    pub fn first_descendant_by_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|child| self.tag(*child) == Some(tag))
    }

    pub fn first_descendant_with_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|child| self.has_class(*child, class))
    }

    // --- element state ----------------------------------------------------

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node.0).map(|n| &n.element)
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(node.0).map(|n| &mut n.element)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .and_then(|e| e.attrs.get(name))
            .map(String::as_str)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.set_attr(node, "id", id);
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .map(|e| e.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.classes.retain(|c| c != class);
        }
    }

    pub fn set_class(&mut self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    pub fn display(&self, node: NodeId) -> Option<&str> {
        self.element(node).and_then(|e| e.display.as_deref())
    }

    pub fn set_display(&mut self, node: NodeId, display: Option<&str>) {
        if let Some(element) = self.element_mut(node) {
            element.display = display.map(str::to_string);
        }
    }

    /// Connected and no inclusive ancestor is `display: none`.
    pub fn is_rendered(&self, node: NodeId) -> bool {
        if !self.is_connected(node) {
            return false;
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if self.display(id) == Some("none") {
                return false;
            }
            current = self.parent(id);
        }
        true
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.text.as_str())
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(element) = self.element_mut(node) {
            element.text = text.to_string();
        }
    }

    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.value.as_str())
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.value = value.to_string();
        }
    }

    // --- events -----------------------------------------------------------

    pub fn add_listener(&mut self, target: EventTarget, kind: EventKind, listener: Listener) {
        self.listeners.add(target, kind, listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run host listeners for `event`: the target first, then ancestors and the document
    /// when the event bubbles. Returns how many listeners ran.
    pub fn dispatch(&mut self, event: Event) -> usize {
        if self.event_log.len() >= EVENT_LOG_CAPACITY {
            self.event_log.remove(0);
        }
        self.event_log.push(event.clone());
        let mut path = Vec::new();
        match event.target {
            EventTarget::Node(node) => {
                if !self.exists(node) {
                    return 0;
                }
                path.push(EventTarget::Node(node));
                if event.bubbles {
                    let mut current = self.parent(node);
                    while let Some(id) = current {
                        path.push(EventTarget::Node(id));
                        current = self.parent(id);
                    }
                    if self.is_connected(node) {
                        path.push(EventTarget::Document);
                    }
                }
            }
            EventTarget::Document => path.push(EventTarget::Document),
        }
        let mut ran = 0;
        for target in path {
            for listener in self.listeners.matching(target, event.kind) {
                (listener.as_ref())(self, &event);
                ran += 1;
            }
        }
        ran
    }

    pub fn event_log(&self) -> &[Event] {
        &self.event_log
    }

    pub fn take_event_log(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.event_log)
    }
}
