use super::*;
use std::cell::RefCell;

fn div(doc: &mut Document, parent: NodeId, id: &str) -> NodeId {
    let node = doc.create_element("div");
    doc.set_id(node, id);
    doc.append_child(parent, node).unwrap();
    node
}

#[test]
fn new_document_has_head_and_body() {
    let doc = Document::new();
    assert_eq!(doc.children(doc.root()), &[doc.head(), doc.body()]);
    assert_eq!(doc.ready_state(), ReadyState::Loading);
    assert!(doc.is_connected(doc.body()));
}

#[test]
fn insert_before_places_node_ahead_of_reference() {
    let mut doc = Document::new();
    let body = doc.body();
    let a = div(&mut doc, body, "a");
    let c = div(&mut doc, body, "c");
    let b = doc.create_element("div");
    doc.insert_before(body, b, Some(c)).unwrap();
    assert_eq!(doc.children(body), &[a, b, c]);
    assert_eq!(doc.next_sibling(a), Some(b));
    assert_eq!(doc.next_sibling(c), None);
}

#[test]
fn insert_rejects_cycles_and_foreign_reference() {
    let mut doc = Document::new();
    let body = doc.body();
    let outer = div(&mut doc, body, "outer");
    let inner = div(&mut doc, outer, "inner");
    assert!(doc.append_child(inner, outer).is_err());

    let stray = doc.create_element("span");
    assert!(doc.insert_before(body, stray, Some(inner)).is_err());
}

#[test]
fn detached_nodes_are_not_found_by_id() {
    let mut doc = Document::new();
    let body = doc.body();
    let node = div(&mut doc, body, "target");
    assert_eq!(doc.get_element_by_id("target"), Some(node));
    doc.detach(node);
    assert_eq!(doc.get_element_by_id("target"), None);
    assert!(!doc.is_connected(node));
    assert!(doc.exists(node));
}

#[test]
fn rendered_accounts_for_hidden_ancestors() {
    let mut doc = Document::new();
    let body = doc.body();
    let outer = div(&mut doc, body, "outer");
    let inner = div(&mut doc, outer, "inner");
    assert!(doc.is_rendered(inner));
    doc.set_display(outer, Some("none"));
    assert!(!doc.is_rendered(inner));
    doc.set_display(outer, Some("flex"));
    assert!(doc.is_rendered(inner));
}

#[test]
fn classes_are_deduplicated() {
    let mut doc = Document::new();
    let node = doc.create_element("div");
    doc.add_class(node, "active");
    doc.add_class(node, "active");
    assert_eq!(doc.element(node).unwrap().classes, vec!["active".to_string()]);
    doc.set_class(node, "active", false);
    assert!(!doc.has_class(node, "active"));
}

#[test]
fn dispatch_bubbles_to_ancestors_and_document() {
    let mut doc = Document::new();
    let body = doc.body();
    let outer = div(&mut doc, body, "outer");
    let inner = div(&mut doc, outer, "inner");
    let seen: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let log = seen.clone();
    doc.add_listener(
        EventTarget::Node(outer),
        EventKind::Click,
        listener(move |_, _| log.borrow_mut().push("outer")),
    );
    let log = seen.clone();
    doc.add_listener(
        EventTarget::Document,
        EventKind::Click,
        listener(move |_, _| log.borrow_mut().push("document")),
    );

    let ran = doc.dispatch(Event::on_node(EventKind::Click, inner));
    assert_eq!(ran, 2);
    assert_eq!(*seen.borrow(), vec!["outer", "document"]);
}

#[test]
fn pointer_events_do_not_bubble() {
    let mut doc = Document::new();
    let body = doc.body();
    let outer = div(&mut doc, body, "outer");
    let inner = div(&mut doc, outer, "inner");
    let hits = Rc::new(RefCell::new(0));
    let counter = hits.clone();
    doc.add_listener(
        EventTarget::Node(outer),
        EventKind::PointerEnter,
        listener(move |_, _| *counter.borrow_mut() += 1),
    );
    doc.dispatch(Event::pointer(EventKind::PointerEnter, inner));
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn listeners_may_mutate_the_document() {
    let mut doc = Document::new();
    let body = doc.body();
    let button = div(&mut doc, body, "button");
    doc.add_listener(
        EventTarget::Node(button),
        EventKind::Click,
        listener(move |doc, event| {
            if let Some(node) = event.target.node() {
                doc.add_class(node, "pressed");
            }
        }),
    );
    doc.dispatch(Event::on_node(EventKind::Click, button));
    assert!(doc.has_class(button, "pressed"));
    assert_eq!(doc.event_log().len(), 1);
}

#[test]
fn event_log_keeps_only_the_latest_events() {
    let mut doc = Document::new();
    for _ in 0..EVENT_LOG_CAPACITY + 5 {
        doc.dispatch(Event::key(EventKind::KeyDown, 'C'));
    }
    doc.dispatch(Event::key(EventKind::KeyUp, 'C'));
    assert_eq!(doc.event_log().len(), EVENT_LOG_CAPACITY);
    assert_eq!(doc.event_log().last().map(|e| e.kind), Some(EventKind::KeyUp));
}

#[test]
fn key_info_mirrors_browser_fields() {
    let info = KeyInfo::letter('H');
    assert_eq!(info.code, "KeyH");
    assert_eq!(info.key_code, 72);
}
