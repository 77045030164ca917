//! Hides host controls the panel duplicates, without detaching them, so captured
//! references keep their listeners.

use tracing::{info, warn};

use crate::contract::HostContract;
use crate::dom::{Document, NodeId};
use crate::presentation::ids;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuppressionReport {
    pub anchor_hidden: usize,
    pub side_hidden: usize,
}

/// Hide every anchor-bar child except the overlay icon and the divider right after it,
/// then hide everything in the side bar. Missing containers are skipped.
pub fn suppress_host_controls(doc: &mut Document, contract: &HostContract) -> SuppressionReport {
    let mut report = SuppressionReport::default();

    match doc.get_element_by_id(&contract.anchor_id) {
        Some(anchor) => {
            let children = doc.children(anchor).to_vec();
            let keep = kept_children(doc, &children, contract);
            for child in children {
                if !keep.contains(&child) {
                    doc.set_display(child, Some("none"));
                    report.anchor_hidden += 1;
                }
            }
        }
        None => warn!(anchor = %contract.anchor_id, "anchor bar missing; nothing suppressed"),
    }

    if let Some(side) = doc.get_element_by_id(&contract.side_bar_id) {
        for child in doc.children(side).to_vec() {
            doc.set_display(child, Some("none"));
            report.side_hidden += 1;
        }
    }

    info!(
        anchor_hidden = report.anchor_hidden,
        side_hidden = report.side_hidden,
        "host controls suppressed"
    );
    report
}

fn kept_children(doc: &Document, children: &[NodeId], contract: &HostContract) -> Vec<NodeId> {
    let Some(position) = children
        .iter()
        .position(|node| doc.attr(*node, "id") == Some(ids::ICON))
    else {
        return Vec::new();
    };
    let mut keep = vec![children[position]];
    if let Some(next) = children.get(position + 1) {
        if doc.has_class(*next, &contract.divider_class) {
            keep.push(*next);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{listener, Event, EventKind, EventTarget};
    use crate::presentation::inject_icon;
    use std::cell::Cell;
    use std::rc::Rc;

    fn host() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let left = doc.create_element("div");
        doc.set_id(left, "menu-bar-left");
        doc.append_child(body, left).unwrap();
        for class in ["menu-item", "menu-bar-vertical-divider", "menu-item"] {
            let node = doc.create_element("div");
            doc.add_class(node, class);
            doc.append_child(left, node).unwrap();
        }
        let right = doc.create_element("div");
        doc.set_id(right, "menu-bar-right");
        doc.append_child(body, right).unwrap();
        for _ in 0..2 {
            let node = doc.create_element("div");
            doc.append_child(right, node).unwrap();
        }
        (doc, left, right)
    }

    #[test]
    fn keeps_icon_and_following_divider() {
        let (mut doc, left, right) = host();
        let contract = HostContract::default();
        let icon = inject_icon(&mut doc, &contract).unwrap();
        let report = suppress_host_controls(&mut doc, &contract);

        let children = doc.children(left).to_vec();
        assert_eq!(children[1], icon);
        assert!(doc.is_rendered(icon));
        assert!(doc.is_rendered(children[2]));
        assert!(!doc.is_rendered(children[0]));
        assert!(!doc.is_rendered(children[3]));
        assert_eq!(report.anchor_hidden, 2);
        assert_eq!(report.side_hidden, 2);
        assert!(doc.children(right).iter().all(|node| !doc.is_rendered(*node)));
    }

    #[test]
    fn hidden_items_stay_attached_and_listening() {
        let (mut doc, left, _) = host();
        let contract = HostContract::default();
        let item = doc.children(left)[0];
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        doc.add_listener(
            EventTarget::Node(item),
            EventKind::Click,
            listener(move |_, _| counter.set(counter.get() + 1)),
        );
        suppress_host_controls(&mut doc, &contract);
        assert!(doc.is_connected(item));
        doc.dispatch(Event::on_node(EventKind::Click, item));
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn missing_containers_are_tolerated() {
        let mut doc = Document::new();
        let report = suppress_host_controls(&mut doc, &HostContract::default());
        assert_eq!(report, SuppressionReport::default());
    }
}
