//! Structural contract the overlay assumes of the host document.
//!
//! Every identifier the overlay reads lives here, versioned, so a host markup change
//! is a contract bump rather than a hunt through the engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::registry::Category;

pub const CONTRACT_VERSION: &str = "1";

/// Single-letter shortcuts the host listens for on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcuts {
    pub headlights: char,
    pub toggle_ui: char,
    pub reset: char,
    pub camera: char,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            headlights: 'H',
            toggle_ui: 'U',
            reset: 'R',
            camera: 'C',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostContract {
    pub version: String,
    /// Presence of this element means the host markup is ready.
    pub anchor_id: String,
    pub menu_bar_id: String,
    /// Display value restored on the menu bar when something hides it.
    pub menu_bar_display: String,
    pub side_bar_id: String,
    pub divider_class: String,
    pub menu_item_class: String,
    pub label_tag: String,
    pub label_attr: String,
    pub active_class: String,
    pub autodrive_id: String,
    pub autodrive_active_class: String,
    /// Visibility of this element stands in for "host UI elements shown".
    pub ui_reference_id: String,
    pub pause_indicator_id: String,
    pub vocabularies: BTreeMap<Category, Vec<String>>,
    pub shortcuts: Shortcuts,
}

impl Default for HostContract {
    fn default() -> Self {
        let vocab = |names: &[&str]| names.iter().map(|name| name.to_string()).collect();
        let mut vocabularies = BTreeMap::new();
        vocabularies.insert(Category::Scene, vocab(&["Earth", "Mars", "Moon", "Venus"]));
        vocabularies.insert(
            Category::Weather,
            vocab(&["Sunrise", "Clear", "Rain", "Sunset", "Night"]),
        );
        vocabularies.insert(Category::Vehicle, vocab(&["Car", "Bus", "Bike"]));
        vocabularies.insert(Category::InputMethod, vocab(&["Mouse", "Keyboard"]));
        Self {
            version: CONTRACT_VERSION.to_string(),
            anchor_id: "menu-bar-left".to_string(),
            menu_bar_id: "menu-bar".to_string(),
            menu_bar_display: "flex".to_string(),
            side_bar_id: "menu-bar-right".to_string(),
            divider_class: "menu-bar-vertical-divider".to_string(),
            menu_item_class: "menu-item".to_string(),
            label_tag: "img".to_string(),
            label_attr: "alt".to_string(),
            active_class: "menu-item-active".to_string(),
            autodrive_id: "autodrive".to_string(),
            autodrive_active_class: "autodrive-active".to_string(),
            ui_reference_id: "autodrive".to_string(),
            pause_indicator_id: "game-paused".to_string(),
            vocabularies,
            shortcuts: Shortcuts::default(),
        }
    }
}

impl HostContract {
    pub fn from_json(text: &str) -> Result<Self> {
        let contract: Self = serde_json::from_str(text).context("parse host contract JSON")?;
        contract.validate()?;
        Ok(contract)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read host contract {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn vocabulary(&self, category: Category) -> &[String] {
        self.vocabularies
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Category whose vocabulary contains `label`, if any. Matching is exact.
    pub fn classify(&self, label: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| self.vocabulary(*category).iter().any(|name| name == label))
    }

    pub fn validate(&self) -> Result<()> {
        let identifiers = [
            ("version", &self.version),
            ("anchor_id", &self.anchor_id),
            ("menu_bar_id", &self.menu_bar_id),
            ("side_bar_id", &self.side_bar_id),
            ("divider_class", &self.divider_class),
            ("menu_item_class", &self.menu_item_class),
            ("label_tag", &self.label_tag),
            ("label_attr", &self.label_attr),
            ("active_class", &self.active_class),
            ("autodrive_id", &self.autodrive_id),
            ("autodrive_active_class", &self.autodrive_active_class),
            ("ui_reference_id", &self.ui_reference_id),
            ("pause_indicator_id", &self.pause_indicator_id),
        ];
        for (field, value) in identifiers {
            if value.trim().is_empty() {
                bail!("host contract field `{field}` must not be empty");
            }
        }

        let mut seen: BTreeMap<&str, Category> = BTreeMap::new();
        for category in Category::ALL {
            for name in self.vocabulary(category) {
                if let Some(previous) = seen.insert(name.as_str(), category) {
                    bail!(
                        "label `{name}` appears in both {} and {} vocabularies",
                        previous.label(),
                        category.label()
                    );
                }
            }
        }

        let keys = [
            self.shortcuts.headlights,
            self.shortcuts.toggle_ui,
            self.shortcuts.reset,
            self.shortcuts.camera,
        ];
        if keys.iter().any(|key| !key.is_ascii_alphanumeric()) {
            bail!("host contract shortcuts must be single ASCII letters or digits");
        }
        Ok(())
    }
}
