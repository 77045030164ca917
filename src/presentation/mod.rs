//! Builds the overlay's own subtree: style block, toolbar icon and the settings panel.
//!
//! Construction is idempotent; every root node carries a reserved id and is reused when
//! already present.

mod controls;
mod styles;

pub use controls::{ControlRegistry, HostToggle, OverlayAction, QuickAction};

use tracing::{debug, info, warn};

use crate::contract::HostContract;
use crate::dom::{Document, EventKind, NodeId};
use crate::error::OverlayError;
use crate::registry::{Category, HostRegistry};

/// Reserved identifiers and class names owned by the overlay.
pub mod ids {
    use crate::registry::Category;

    pub const STYLE_BLOCK: &str = "settings-panel-styles";
    pub const PANEL: &str = "settings-panel";
    pub const ICON: &str = "settings-menu-item";
    pub const CLOSE_BUTTON: &str = "settings-close-button";
    pub const VOLUME_SLIDER: &str = "volume-slider";
    pub const MUTE_BUTTON: &str = "mute-button";
    pub const VOLUME_ICON: &str = "volume-icon";

    pub const ICON_ACTIVE_CLASS: &str = "settings-active";
    pub const ACTIVE_CLASS: &str = "active";
    pub const SELECTED_CLASS: &str = "selected";
    pub const OPTION_ITEM_CLASS: &str = "settings-option-item";

    pub const ARROW_COLLAPSED: &str = "▼";
    pub const ARROW_EXPANDED: &str = "▲";
    pub const LOADING_TEXT: &str = "Loading...";
    pub const UNKNOWN_TEXT: &str = "Unknown";

    pub const ICON_SRC: &str = "./static/media/config.fa1e0797.svg";
    pub const VOLUME_HIGH_SRC: &str = "./static/media/vol_high.30de055e.svg";
    pub const VOLUME_OFF_SRC: &str = "./static/media/vol_off.11497865.svg";

    pub fn checkbox(key: &str) -> String {
        format!("settings-{key}-checkbox")
    }

    pub fn expand_button(category: Category) -> String {
        format!("{}-expand-button", category.label())
    }

    pub fn expand_arrow(category: Category) -> String {
        format!("{}-expand-arrow", category.label())
    }

    pub fn option_list(category: Category) -> String {
        format!("{}-option-list", category.label())
    }

    pub fn current_name(category: Category) -> String {
        format!("{}-current-name", category.label())
    }

    /// Attribute naming the roster entry on button-group controls.
    pub fn button_attr(category: Category) -> Option<&'static str> {
        match category {
            Category::Vehicle => Some("data-vehicle"),
            Category::InputMethod => Some("data-input"),
            Category::Scene | Category::Weather => None,
        }
    }
}

/// Initial overlay slider value, before the user or the host says otherwise.
pub const INITIAL_VOLUME: &str = "0.5";

fn element(doc: &mut Document, tag: &str, class: &str, id: Option<&str>) -> NodeId {
    let node = doc.create_element(tag);
    if !class.is_empty() {
        for name in class.split_whitespace() {
            doc.add_class(node, name);
        }
    }
    if let Some(id) = id {
        doc.set_id(node, id);
    }
    node
}

fn child(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    class: &str,
    id: Option<&str>,
) -> Result<NodeId, OverlayError> {
    let node = element(doc, tag, class, id);
    doc.append_child(parent, node)?;
    Ok(node)
}

fn text_child(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    class: &str,
    text: &str,
) -> Result<NodeId, OverlayError> {
    let node = child(doc, parent, tag, class, None)?;
    doc.set_text(node, text);
    Ok(node)
}

/// Returns `true` when a new style block was inserted.
pub fn inject_styles(doc: &mut Document) -> Result<bool, OverlayError> {
    if doc.get_element_by_id(ids::STYLE_BLOCK).is_some() {
        return Ok(false);
    }
    let head = doc.head();
    let style = child(doc, head, "style", "", Some(ids::STYLE_BLOCK))?;
    doc.set_text(style, styles::PANEL_CSS);
    info!("overlay styles injected");
    Ok(true)
}

/// Toolbar icon, placed right before the first divider of the anchor bar (or at its end).
pub fn inject_icon(doc: &mut Document, contract: &HostContract) -> Result<NodeId, OverlayError> {
    if let Some(existing) = doc.get_element_by_id(ids::ICON) {
        return Ok(existing);
    }
    let Some(anchor) = doc.get_element_by_id(&contract.anchor_id) else {
        return Err(OverlayError::missing(&contract.anchor_id));
    };
    let icon = element(doc, "div", &contract.menu_item_class, Some(ids::ICON));
    doc.set_attr(icon, "tabindex", "-1");
    let img = child(doc, icon, "img", "menu-icon", None)?;
    doc.set_attr(img, "src", ids::ICON_SRC);
    doc.set_attr(img, "alt", "Settings");

    let divider = doc
        .children(anchor)
        .iter()
        .copied()
        .find(|node| doc.has_class(*node, &contract.divider_class));
    doc.insert_before(anchor, icon, divider)?;
    info!(before_divider = divider.is_some(), "settings icon injected");
    Ok(icon)
}

/// Settings panel, inserted right after the host menu bar or appended to the body.
/// Starts hidden.
pub fn build_panel(doc: &mut Document, contract: &HostContract) -> Result<NodeId, OverlayError> {
    if let Some(existing) = doc.get_element_by_id(ids::PANEL) {
        return Ok(existing);
    }
    let panel = element(doc, "div", "menu-panel", Some(ids::PANEL));
    doc.set_display(panel, Some("none"));

    let close = text_child(doc, panel, "button", "settings-close-button", "×")?;
    doc.set_id(close, ids::CLOSE_BUTTON);
    doc.set_attr(close, "title", "Close Settings (or click settings icon again)");
    let content = child(doc, panel, "div", "menu-panel-content", None)?;

    let driving = section(doc, content, "DRIVING CONTROLS")?;
    toggle_item(doc, driving, HostToggle::Autodrive)?;
    toggle_item(doc, driving, HostToggle::Headlights)?;

    let environment = section(doc, content, "ENVIRONMENT")?;
    selector(doc, environment, Category::Scene, "Scene:")?;
    selector(doc, environment, Category::Weather, "Weather:")?;

    let vehicle = section(doc, content, "VEHICLE")?;
    button_group(doc, vehicle, contract, Category::Vehicle)?;

    let controls = section(doc, content, "CONTROLS")?;
    button_group(doc, controls, contract, Category::InputMethod)?;

    let audio = section(doc, content, "AUDIO")?;
    let slider_row = child(doc, audio, "div", "settings-slider-container", None)?;
    let slider = child(
        doc,
        slider_row,
        "input",
        "settings-slider",
        Some(ids::VOLUME_SLIDER),
    )?;
    doc.set_attr(slider, "type", "range");
    doc.set_attr(slider, "min", "0");
    doc.set_attr(slider, "max", "1");
    doc.set_attr(slider, "step", "0.01");
    doc.set_value(slider, INITIAL_VOLUME);
    let mute = child(
        doc,
        slider_row,
        "button",
        "settings-mute-button",
        Some(ids::MUTE_BUTTON),
    )?;
    let volume_icon = child(doc, mute, "img", "", Some(ids::VOLUME_ICON))?;
    doc.set_attr(volume_icon, "src", ids::VOLUME_HIGH_SRC);
    doc.set_attr(volume_icon, "alt", "Volume");

    let display = section(doc, content, "DISPLAY")?;
    toggle_item(doc, display, HostToggle::ShowUi)?;

    let actions = section(doc, content, "QUICK ACTIONS")?;
    for (action, label) in [
        (QuickAction::Reset, "Reset Vehicle (R)"),
        (QuickAction::Camera, "Change Camera (C)"),
    ] {
        let row = child(doc, actions, "div", "settings-action-item", None)?;
        let button = text_child(doc, row, "button", "settings-action-button", label)?;
        doc.set_attr(button, "data-action", action.key());
    }

    let placement = doc
        .get_element_by_id(&contract.menu_bar_id)
        .and_then(|menu_bar| doc.parent(menu_bar).map(|parent| (parent, menu_bar)));
    match placement {
        Some((parent, menu_bar)) => {
            let next = doc.next_sibling(menu_bar);
            doc.insert_before(parent, panel, next)?;
        }
        None => {
            warn!(menu_bar = %contract.menu_bar_id, "menu bar missing; appending panel to body");
            let body = doc.body();
            doc.append_child(body, panel)?;
        }
    }
    info!("settings panel created");
    Ok(panel)
}

fn section(doc: &mut Document, content: NodeId, title: &str) -> Result<NodeId, OverlayError> {
    let section = child(doc, content, "div", "settings-section", None)?;
    text_child(doc, section, "div", "settings-section-title", title)?;
    Ok(section)
}

fn toggle_item(
    doc: &mut Document,
    parent: NodeId,
    toggle: HostToggle,
) -> Result<(), OverlayError> {
    let item = child(doc, parent, "div", "settings-item", None)?;
    doc.set_attr(item, "data-control", toggle.key());
    child(
        doc,
        item,
        "div",
        "settings-checkbox",
        Some(ids::checkbox(toggle.key()).as_str()),
    )?;
    text_child(doc, item, "span", "", toggle.title())?;
    Ok(())
}

fn selector(
    doc: &mut Document,
    parent: NodeId,
    category: Category,
    title: &str,
) -> Result<(), OverlayError> {
    let container = child(doc, parent, "div", "settings-expand-container", None)?;
    let button = child(
        doc,
        container,
        "button",
        "settings-expand-button",
        Some(ids::expand_button(category).as_str()),
    )?;
    let label = child(doc, button, "span", "", None)?;
    text_child(doc, label, "strong", "", title)?;
    let current = text_child(doc, label, "span", "", ids::LOADING_TEXT)?;
    doc.set_id(current, &ids::current_name(category));
    let arrow = text_child(doc, button, "span", "expand-arrow", ids::ARROW_COLLAPSED)?;
    doc.set_id(arrow, &ids::expand_arrow(category));
    let list = child(
        doc,
        container,
        "div",
        "settings-option-list",
        Some(ids::option_list(category).as_str()),
    )?;
    doc.set_display(list, Some("none"));
    Ok(())
}

fn button_group(
    doc: &mut Document,
    parent: NodeId,
    contract: &HostContract,
    category: Category,
) -> Result<(), OverlayError> {
    let group = child(doc, parent, "div", "settings-button-group", None)?;
    let Some(attr) = ids::button_attr(category) else {
        return Ok(());
    };
    for name in contract.vocabulary(category) {
        let button = text_child(doc, group, "button", "settings-button", name)?;
        doc.set_attr(button, attr, name);
    }
    Ok(())
}

/// Fill an expandable selector from its captured roster and bind each option.
/// Returns the number of options rendered. An empty roster leaves the list empty.
pub fn populate_option_list(
    doc: &mut Document,
    registry: &HostRegistry,
    controls: &mut ControlRegistry,
    category: Category,
) -> Result<usize, OverlayError> {
    let list_id = ids::option_list(category);
    let Some(list) = doc.get_element_by_id(&list_id) else {
        return Err(OverlayError::missing(list_id));
    };
    let roster = registry.roster(category);
    if roster.is_empty() {
        warn!(category = category.label(), "no host items captured for selector");
        return Ok(0);
    }
    doc.clear_children(list);
    for item in roster.items() {
        let option = text_child(doc, list, "div", ids::OPTION_ITEM_CLASS, &item.name)?;
        controls.register(
            option,
            EventKind::Click,
            OverlayAction::Choose {
                category,
                name: item.name.clone(),
            },
        );
    }
    debug!(category = category.label(), options = roster.len(), "option list populated");
    Ok(roster.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with_bar(with_divider: bool) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let bar = doc.create_element("div");
        doc.set_id(bar, "menu-bar");
        doc.append_child(body, bar).unwrap();
        let left = doc.create_element("div");
        doc.set_id(left, "menu-bar-left");
        doc.append_child(bar, left).unwrap();
        for _ in 0..3 {
            let item = doc.create_element("div");
            doc.add_class(item, "menu-item");
            doc.append_child(left, item).unwrap();
        }
        if with_divider {
            let divider = doc.create_element("div");
            doc.add_class(divider, "menu-bar-vertical-divider");
            doc.append_child(left, divider).unwrap();
            let trailing = doc.create_element("div");
            doc.append_child(left, trailing).unwrap();
        }
        let footer = doc.create_element("footer");
        doc.append_child(body, footer).unwrap();
        (doc, left)
    }

    #[test]
    fn styles_are_injected_once() {
        let mut doc = Document::new();
        assert!(inject_styles(&mut doc).unwrap());
        assert!(!inject_styles(&mut doc).unwrap());
        let styles: Vec<_> = doc
            .elements_by_tag("style")
            .into_iter()
            .filter(|node| doc.attr(*node, "id") == Some(ids::STYLE_BLOCK))
            .collect();
        assert_eq!(styles.len(), 1);
    }

    #[test]
    fn icon_goes_before_first_divider() {
        let (mut doc, left) = host_with_bar(true);
        let icon = inject_icon(&mut doc, &HostContract::default()).unwrap();
        let children = doc.children(left);
        assert_eq!(children[3], icon);
        assert!(doc.has_class(children[4], "menu-bar-vertical-divider"));
    }

    #[test]
    fn icon_is_appended_without_divider() {
        let (mut doc, left) = host_with_bar(false);
        let icon = inject_icon(&mut doc, &HostContract::default()).unwrap();
        assert_eq!(doc.children(left).last(), Some(&icon));
    }

    #[test]
    fn icon_requires_anchor() {
        let mut doc = Document::new();
        let err = inject_icon(&mut doc, &HostContract::default()).unwrap_err();
        assert_eq!(err, OverlayError::MissingAnchor("menu-bar-left".to_string()));
    }

    #[test]
    fn panel_is_built_once_after_menu_bar() {
        let (mut doc, _) = host_with_bar(true);
        let contract = HostContract::default();
        let panel = build_panel(&mut doc, &contract).unwrap();
        let again = build_panel(&mut doc, &contract).unwrap();
        assert_eq!(panel, again);
        let menu_bar = doc.get_element_by_id("menu-bar").unwrap();
        assert_eq!(doc.next_sibling(menu_bar), Some(panel));
        assert_eq!(doc.display(panel), Some("none"));
        let panels = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|node| doc.attr(*node, "id") == Some(ids::PANEL))
            .count();
        assert_eq!(panels, 1);
    }

    #[test]
    fn panel_falls_back_to_body() {
        let mut doc = Document::new();
        let panel = build_panel(&mut doc, &HostContract::default()).unwrap();
        assert_eq!(doc.parent(panel), Some(doc.body()));
    }

    #[test]
    fn panel_exposes_every_control() {
        let mut doc = Document::new();
        let panel = build_panel(&mut doc, &HostContract::default()).unwrap();
        let mut controls = ControlRegistry::new();
        // 3 toggles, 2 expanders, 3 vehicles, 2 inputs, slider, mute, 2 actions, close.
        assert_eq!(controls.wire(&doc, panel, None), 15);
        assert_eq!(
            doc.text(doc.get_element_by_id("scene-current-name").unwrap()),
            Some(ids::LOADING_TEXT)
        );
        assert_eq!(
            doc.value(doc.get_element_by_id(ids::VOLUME_SLIDER).unwrap()),
            Some(INITIAL_VOLUME)
        );
    }

    #[test]
    fn option_list_reflects_roster() {
        let mut doc = Document::new();
        let contract = HostContract::default();
        let body = doc.body();
        for label in ["Earth", "Mars"] {
            let item = doc.create_element("div");
            doc.add_class(item, "menu-item");
            let img = doc.create_element("img");
            doc.set_attr(img, "alt", label);
            doc.append_child(item, img).unwrap();
            doc.append_child(body, item).unwrap();
        }
        let registry = HostRegistry::scan(&doc, &contract);
        build_panel(&mut doc, &contract).unwrap();
        let mut controls = ControlRegistry::new();
        assert_eq!(
            populate_option_list(&mut doc, &registry, &mut controls, Category::Scene).unwrap(),
            2
        );
        assert_eq!(
            populate_option_list(&mut doc, &registry, &mut controls, Category::Weather).unwrap(),
            0
        );
        let list = doc.get_element_by_id("scene-option-list").unwrap();
        assert_eq!(doc.children(list).len(), 2);
        let names: Vec<&str> = controls
            .choices(Category::Scene)
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        assert_eq!(names, vec!["Earth", "Mars"]);
    }
}
