//! One-time capture of host-owned interactive elements, grouped by category.
//!
//! The scan runs once, before any hiding, and is authoritative for the session: elements
//! the host adds later are never picked up.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::HostContract;
use crate::dom::{Document, NodeId};
use crate::error::OverlayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Scene,
    Weather,
    Vehicle,
    InputMethod,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Scene,
        Category::Weather,
        Category::Vehicle,
        Category::InputMethod,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Scene => "scene",
            Category::Weather => "weather",
            Category::Vehicle => "vehicle",
            Category::InputMethod => "input",
        }
    }

    /// Categories presented as an expandable option list rather than a button group.
    pub fn is_expandable(self) -> bool {
        matches!(self, Category::Scene | Category::Weather)
    }

    fn index(self) -> usize {
        match self {
            Category::Scene => 0,
            Category::Weather => 1,
            Category::Vehicle => 2,
            Category::InputMethod => 3,
        }
    }
}

/// Weak handle to a host element. The host owns its existence and active state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostElementRef {
    pub node: NodeId,
    /// `None` for singleton host controls such as the autodrive button.
    pub category: Option<Category>,
    pub name: String,
}

impl HostElementRef {
    /// The node, provided the host has not detached it since the scan.
    pub fn resolve(&self, doc: &Document) -> Result<NodeId, OverlayError> {
        if doc.is_connected(self.node) {
            Ok(self.node)
        } else {
            Err(OverlayError::StaleReference {
                name: self.name.clone(),
                node: self.node,
            })
        }
    }
}

/// Refs for one category, in DOM encounter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRoster {
    category: Category,
    items: Vec<HostElementRef>,
}

impl CategoryRoster {
    fn new(category: Category) -> Self {
        Self {
            category,
            items: Vec::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn items(&self) -> &[HostElementRef] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.name.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&HostElementRef> {
        self.items.iter().find(|item| item.name == name)
    }

    /// The item currently carrying the host's active marker. Detached items are skipped.
    pub fn active<'a>(
        &'a self,
        doc: &Document,
        contract: &HostContract,
    ) -> Option<&'a HostElementRef> {
        self.items.iter().find(|item| {
            doc.is_connected(item.node) && doc.has_class(item.node, &contract.active_class)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRegistry {
    rosters: [CategoryRoster; 4],
    autodrive: Option<HostElementRef>,
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self {
            rosters: Category::ALL.map(CategoryRoster::new),
            autodrive: None,
        }
    }
}

impl HostRegistry {
    /// Single pass over every `menu item` container; labels outside all vocabularies are ignored.
    pub fn scan(doc: &Document, contract: &HostContract) -> Self {
        let mut registry = Self::default();
        for item in doc.elements_with_class(&contract.menu_item_class) {
            let Some(label) = doc
                .first_descendant_by_tag(item, &contract.label_tag)
                .and_then(|child| doc.attr(child, &contract.label_attr))
                .filter(|label| !label.is_empty())
            else {
                continue;
            };
            let Some(category) = contract.classify(label) else {
                debug!(label, "ignoring menu item outside known vocabularies");
                continue;
            };
            registry.rosters[category.index()].items.push(HostElementRef {
                node: item,
                category: Some(category),
                name: label.to_string(),
            });
        }
        registry.autodrive = doc
            .get_element_by_id(&contract.autodrive_id)
            .map(|node| HostElementRef {
                node,
                category: None,
                name: contract.autodrive_id.clone(),
            });

        info!(
            scenes = registry.roster(Category::Scene).len(),
            weathers = registry.roster(Category::Weather).len(),
            vehicles = registry.roster(Category::Vehicle).len(),
            inputs = registry.roster(Category::InputMethod).len(),
            autodrive = registry.autodrive.is_some(),
            "host registry captured"
        );
        registry
    }

    pub fn roster(&self, category: Category) -> &CategoryRoster {
        &self.rosters[category.index()]
    }

    pub fn autodrive(&self) -> Option<&HostElementRef> {
        self.autodrive.as_ref()
    }

    pub fn active_name(
        &self,
        doc: &Document,
        contract: &HostContract,
        category: Category,
    ) -> Option<String> {
        self.roster(category)
            .active(doc, contract)
            .map(|item| item.name.clone())
    }

    pub fn total(&self) -> usize {
        self.rosters.iter().map(CategoryRoster::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu_item(doc: &mut Document, parent: NodeId, label: &str, active: bool) -> NodeId {
        let item = doc.create_element("div");
        doc.add_class(item, "menu-item");
        if active {
            doc.add_class(item, "menu-item-active");
        }
        let img = doc.create_element("img");
        doc.set_attr(img, "alt", label);
        doc.append_child(item, img).unwrap();
        doc.append_child(parent, item).unwrap();
        item
    }

    fn host() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let bar = doc.create_element("div");
        doc.set_id(bar, "menu-bar-left");
        let body = doc.body();
        doc.append_child(body, bar).unwrap();
        let items = vec![
            menu_item(&mut doc, bar, "Earth", false),
            menu_item(&mut doc, bar, "Mars", true),
            menu_item(&mut doc, bar, "Rain", true),
            menu_item(&mut doc, bar, "Help", false),
            menu_item(&mut doc, bar, "Bike", false),
            menu_item(&mut doc, bar, "", false),
        ];
        (doc, items)
    }

    #[test]
    fn scan_groups_items_by_vocabulary_in_dom_order() {
        let (doc, items) = host();
        let contract = HostContract::default();
        let registry = HostRegistry::scan(&doc, &contract);
        assert_eq!(registry.roster(Category::Scene).names(), vec!["Earth", "Mars"]);
        assert_eq!(registry.roster(Category::Weather).names(), vec!["Rain"]);
        assert_eq!(registry.roster(Category::Vehicle).names(), vec!["Bike"]);
        assert!(registry.roster(Category::InputMethod).is_empty());
        assert_eq!(registry.total(), 4);
        assert_eq!(registry.roster(Category::Scene).items()[1].node, items[1]);
    }

    #[test]
    fn active_follows_host_marker() {
        let (mut doc, items) = host();
        let contract = HostContract::default();
        let registry = HostRegistry::scan(&doc, &contract);
        assert_eq!(
            registry.active_name(&doc, &contract, Category::Scene).as_deref(),
            Some("Mars")
        );
        doc.remove_class(items[1], "menu-item-active");
        doc.add_class(items[0], "menu-item-active");
        assert_eq!(
            registry.active_name(&doc, &contract, Category::Scene).as_deref(),
            Some("Earth")
        );
        assert_eq!(registry.active_name(&doc, &contract, Category::Vehicle), None);
    }

    #[test]
    fn roster_is_not_refreshed_by_later_host_changes() {
        let (mut doc, _) = host();
        let contract = HostContract::default();
        let registry = HostRegistry::scan(&doc, &contract);
        let bar = doc.get_element_by_id("menu-bar-left").unwrap();
        menu_item(&mut doc, bar, "Venus", false);
        assert_eq!(registry.roster(Category::Scene).len(), 2);
    }

    #[test]
    fn detached_reference_is_stale() {
        let (mut doc, items) = host();
        let contract = HostContract::default();
        let registry = HostRegistry::scan(&doc, &contract);
        doc.detach(items[1]);
        let mars = registry.roster(Category::Scene).find("Mars").unwrap();
        assert!(matches!(
            mars.resolve(&doc),
            Err(OverlayError::StaleReference { .. })
        ));
        assert_eq!(registry.active_name(&doc, &contract, Category::Scene), None);
    }

    #[test]
    fn empty_document_yields_empty_rosters() {
        let doc = Document::new();
        let registry = HostRegistry::scan(&doc, &HostContract::default());
        assert_eq!(registry.total(), 0);
        assert!(registry.autodrive().is_none());
    }
}
