//! Static host documents loaded from JSON, for replaying a captured page layout.
//!
//! A fixture carries markup only; no host listeners are attached, so activations land
//! on inert elements and the overlay simply observes whatever the fixture declares.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::dom::{Document, NodeId, ReadyState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureReadyState {
    Loading,
    Interactive,
    #[default]
    Complete,
}

impl From<FixtureReadyState> for ReadyState {
    fn from(state: FixtureReadyState) -> Self {
        match state {
            FixtureReadyState::Loading => ReadyState::Loading,
            FixtureReadyState::Interactive => ReadyState::Interactive,
            FixtureReadyState::Complete => ReadyState::Complete,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FixtureNode {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub display: Option<String>,
    pub text: Option<String>,
    pub value: Option<String>,
    pub children: Vec<FixtureNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostFixture {
    pub ready_state: FixtureReadyState,
    pub head: Vec<FixtureNode>,
    pub body: Vec<FixtureNode>,
}

impl HostFixture {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse host fixture JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read host fixture {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn build(&self) -> Result<Document> {
        let mut doc = Document::new();
        doc.set_ready_state(self.ready_state.into());
        let (head, body) = (doc.head(), doc.body());
        for node in &self.head {
            append(&mut doc, head, node)?;
        }
        for node in &self.body {
            append(&mut doc, body, node)?;
        }
        Ok(doc)
    }
}

fn append(doc: &mut Document, parent: NodeId, spec: &FixtureNode) -> Result<()> {
    let tag = if spec.tag.is_empty() { "div" } else { &spec.tag };
    let node = doc.create_element(tag);
    if let Some(id) = &spec.id {
        doc.set_id(node, id);
    }
    for class in &spec.classes {
        doc.add_class(node, class);
    }
    for (name, value) in &spec.attrs {
        doc.set_attr(node, name, value);
    }
    if spec.display.is_some() {
        doc.set_display(node, spec.display.as_deref());
    }
    if let Some(text) = &spec.text {
        doc.set_text(node, text);
    }
    if let Some(value) = &spec.value {
        doc.set_value(node, value);
    }
    doc.append_child(parent, node)
        .with_context(|| format!("attach fixture <{tag}>"))?;
    for child in &spec.children {
        append(doc, node, child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::HostContract;
    use crate::registry::{Category, HostRegistry};

    const SAMPLE: &str = r#"{
        "body": [
            {"id": "menu-bar", "display": "flex", "children": [
                {"id": "menu-bar-left", "children": [
                    {"classes": ["menu-item", "menu-item-active"],
                     "children": [{"tag": "img", "attrs": {"alt": "Moon"}}]},
                    {"classes": ["menu-item"],
                     "children": [{"tag": "img", "attrs": {"alt": "Earth"}}]},
                    {"classes": ["menu-bar-vertical-divider"]}
                ]}
            ]},
            {"id": "autodrive", "classes": ["autodrive-active"]}
        ]
    }"#;

    #[test]
    fn builds_document_from_json() {
        let doc = HostFixture::from_json(SAMPLE).unwrap().build().unwrap();
        assert_eq!(doc.ready_state(), ReadyState::Complete);
        let bar = doc.get_element_by_id("menu-bar").unwrap();
        assert_eq!(doc.display(bar), Some("flex"));

        let contract = HostContract::default();
        let registry = HostRegistry::scan(&doc, &contract);
        assert_eq!(registry.roster(Category::Scene).names(), vec!["Moon", "Earth"]);
        assert_eq!(
            registry.active_name(&doc, &contract, Category::Scene).as_deref(),
            Some("Moon")
        );
        assert!(registry.autodrive().is_some());
    }

    #[test]
    fn loading_state_is_preserved() {
        let fixture = HostFixture::from_json(r#"{"ready_state": "loading"}"#).unwrap();
        assert_eq!(fixture.build().unwrap().ready_state(), ReadyState::Loading);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(HostFixture::from_json("{\"body\": 3}").is_err());
    }
}
