use std::fmt;
use std::rc::Rc;

use super::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    Click,
    KeyDown,
    KeyUp,
    Input,
    Change,
    PointerEnter,
    PointerLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Document,
    Node(NodeId),
}

impl EventTarget {
    pub fn node(self) -> Option<NodeId> {
        match self {
            EventTarget::Node(node) => Some(node),
            EventTarget::Document => None,
        }
    }
}

/// Keyboard payload in the shape host listeners read it: `key`, `code` and the legacy key code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub key: char,
    pub code: String,
    pub key_code: u32,
}

impl KeyInfo {
    pub fn letter(key: char) -> Self {
        let upper = key.to_ascii_uppercase();
        Self {
            key,
            code: format!("Key{upper}"),
            key_code: upper as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub target: EventTarget,
    pub key: Option<KeyInfo>,
    pub bubbles: bool,
}

impl Event {
    pub fn new(kind: EventKind, target: EventTarget) -> Self {
        Self {
            kind,
            target,
            key: None,
            bubbles: true,
        }
    }

    pub fn on_node(kind: EventKind, node: NodeId) -> Self {
        Self::new(kind, EventTarget::Node(node))
    }

    pub fn key(kind: EventKind, key: char) -> Self {
        Self {
            kind,
            target: EventTarget::Document,
            key: Some(KeyInfo::letter(key)),
            bubbles: true,
        }
    }

    /// Pointer enter/leave never bubble.
    pub fn pointer(kind: EventKind, node: NodeId) -> Self {
        Self {
            kind,
            target: EventTarget::Node(node),
            key: None,
            bubbles: false,
        }
    }
}

pub type Listener = Rc<dyn Fn(&mut Document, &Event)>;

/// Box a closure as a host listener.
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&mut Document, &Event) + 'static,
{
    Rc::new(f)
}

#[derive(Clone)]
struct Registration {
    target: EventTarget,
    kind: EventKind,
    listener: Listener,
}

#[derive(Default, Clone)]
pub(crate) struct ListenerStore {
    registrations: Vec<Registration>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, target: EventTarget, kind: EventKind, listener: Listener) {
        self.registrations.push(Registration {
            target,
            kind,
            listener,
        });
    }

    pub(crate) fn matching(&self, target: EventTarget, kind: EventKind) -> Vec<Listener> {
        self.registrations
            .iter()
            .filter(|reg| reg.target == target && reg.kind == kind)
            .map(|reg| reg.listener.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.len()
    }
}

impl fmt::Debug for ListenerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerStore")
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

/// Host-exposed global that toggles mouse-look while the cursor is over overlay surfaces.
pub trait MouseLook {
    fn set_mouse_enabled(&self, enabled: bool);
}
