//! Periodic re-read of host state into the overlay, plus the visibility guard.
//!
//! Every sub-update stands alone: a missing overlay or host node skips that update and
//! the rest of the tick still runs. The next tick re-converges anything left behind.

use tracing::{debug, trace};

use crate::contract::HostContract;
use crate::dom::{Document, NodeId};
use crate::error::OverlayError;
use crate::panel::OverlayState;
use crate::presentation::{ids, HostToggle};
use crate::registry::{Category, HostRegistry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub applied: usize,
    pub skipped: usize,
}

impl TickOutcome {
    fn record<T>(&mut self, step: &'static str, result: Result<T, OverlayError>) {
        match result {
            Ok(_) => self.applied += 1,
            Err(err) => {
                trace!(step, error = %err, "sync sub-update skipped");
                self.skipped += 1;
            }
        }
    }
}

fn overlay_node(doc: &Document, id: &str) -> Result<NodeId, OverlayError> {
    doc.get_element_by_id(id)
        .ok_or_else(|| OverlayError::missing(id))
}

fn checkbox(doc: &Document, toggle: HostToggle) -> Result<NodeId, OverlayError> {
    overlay_node(doc, &ids::checkbox(toggle.key()))
}

/// Autodrive checkbox follows the host's engaged marker.
pub fn refresh_autodrive_checkbox(
    doc: &mut Document,
    contract: &HostContract,
) -> Result<bool, OverlayError> {
    let host = overlay_node(doc, &contract.autodrive_id)?;
    let mark = checkbox(doc, HostToggle::Autodrive)?;
    let engaged = doc.has_class(host, &contract.autodrive_active_class);
    doc.set_class(mark, ids::ACTIVE_CLASS, engaged);
    Ok(engaged)
}

/// Show-UI checkbox follows whether the host's reference element is rendered.
pub fn refresh_showui_checkbox(
    doc: &mut Document,
    contract: &HostContract,
) -> Result<bool, OverlayError> {
    let reference = overlay_node(doc, &contract.ui_reference_id)?;
    let mark = checkbox(doc, HostToggle::ShowUi)?;
    let shown = doc.is_rendered(reference);
    doc.set_class(mark, ids::ACTIVE_CLASS, shown);
    Ok(shown)
}

/// Both host-observable checkboxes. Headlights has no host indicator and is left alone.
pub fn refresh_checkboxes(doc: &mut Document, contract: &HostContract) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    outcome.record("autodrive", refresh_autodrive_checkbox(doc, contract));
    outcome.record("showui", refresh_showui_checkbox(doc, contract));
    outcome
}

/// Selector text and option highlighting for an expandable category.
pub fn refresh_selection(
    doc: &mut Document,
    contract: &HostContract,
    registry: &HostRegistry,
    category: Category,
    state: &mut OverlayState,
) -> Result<Option<String>, OverlayError> {
    let label = overlay_node(doc, &ids::current_name(category))?;
    let active = registry.active_name(doc, contract, category);
    doc.set_text(label, active.as_deref().unwrap_or(ids::UNKNOWN_TEXT));

    if let Some(list) = doc.get_element_by_id(&ids::option_list(category)) {
        for option in doc.children(list).to_vec() {
            let selected = active.is_some() && doc.text(option) == active.as_deref();
            doc.set_class(option, ids::SELECTED_CLASS, selected);
        }
    }
    state.set_rendered(category, active.clone());
    Ok(active)
}

/// Active highlighting for a button-group category.
pub fn refresh_button_group(
    doc: &mut Document,
    contract: &HostContract,
    registry: &HostRegistry,
    category: Category,
    state: &mut OverlayState,
) -> Result<Option<String>, OverlayError> {
    let Some(attr) = ids::button_attr(category) else {
        return Err(OverlayError::InvalidTree(format!(
            "{} has no button group",
            category.label()
        )));
    };
    let panel = overlay_node(doc, ids::PANEL)?;
    let active = registry.active_name(doc, contract, category);
    let buttons: Vec<NodeId> = doc
        .descendants(panel)
        .into_iter()
        .filter(|node| doc.attr(*node, attr).is_some())
        .collect();
    for button in buttons {
        let on = active.is_some() && doc.attr(button, attr) == active.as_deref();
        doc.set_class(button, ids::ACTIVE_CLASS, on);
    }
    state.set_rendered(category, active.clone());
    Ok(active)
}

pub fn refresh_category(
    doc: &mut Document,
    contract: &HostContract,
    registry: &HostRegistry,
    category: Category,
    state: &mut OverlayState,
) -> Result<Option<String>, OverlayError> {
    if category.is_expandable() {
        refresh_selection(doc, contract, registry, category, state)
    } else {
        refresh_button_group(doc, contract, registry, category, state)
    }
}

/// Current level of the overlay's own slider.
pub fn slider_level(doc: &Document) -> Result<f64, OverlayError> {
    let slider = overlay_node(doc, ids::VOLUME_SLIDER)?;
    let raw = doc.value(slider).unwrap_or_default();
    raw.trim()
        .parse::<f64>()
        .map_err(|_| OverlayError::InvalidTree(format!("volume slider holds `{raw}`")))
}

pub fn update_volume_icon(doc: &mut Document, level: f64) -> Result<(), OverlayError> {
    let icon = overlay_node(doc, ids::VOLUME_ICON)?;
    let src = if level == 0.0 {
        ids::VOLUME_OFF_SRC
    } else {
        ids::VOLUME_HIGH_SRC
    };
    doc.set_attr(icon, "src", src);
    Ok(())
}

pub fn refresh_volume_icon(doc: &mut Document) -> Result<(), OverlayError> {
    let level = slider_level(doc)?;
    update_volume_icon(doc, level)
}

/// One state-sync tick. Does nothing when the panel is gone.
pub fn sync_tick(
    doc: &mut Document,
    contract: &HostContract,
    registry: &HostRegistry,
    state: &mut OverlayState,
) -> TickOutcome {
    if doc.get_element_by_id(ids::PANEL).is_none() {
        debug!("panel missing; sync tick skipped");
        return TickOutcome {
            applied: 0,
            skipped: 1,
        };
    }
    let mut outcome = refresh_checkboxes(doc, contract);
    for category in Category::ALL {
        outcome.record(
            category.label(),
            refresh_category(doc, contract, registry, category, state),
        );
    }
    outcome.record("volume", refresh_volume_icon(doc));
    outcome
}

/// Re-show the panel when it should be open, and undo any hiding of the host menu bar.
/// Returns how many corrections were made.
pub fn enforce_visibility(
    doc: &mut Document,
    contract: &HostContract,
    state: &OverlayState,
) -> usize {
    let Some(panel) = doc.get_element_by_id(ids::PANEL) else {
        return 0;
    };
    let mut corrected = 0;
    if state.open && doc.display(panel) == Some("none") {
        doc.set_display(panel, Some("block"));
        corrected += 1;
    }
    if let Some(menu_bar) = doc.get_element_by_id(&contract.menu_bar_id) {
        if doc.display(menu_bar) == Some("none") {
            doc.set_display(menu_bar, Some(contract.menu_bar_display.as_str()));
            corrected += 1;
        }
    }
    if corrected > 0 {
        debug!(corrected, "visibility re-asserted");
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::build_panel;

    fn host_item(doc: &mut Document, label: &str, active: bool) -> NodeId {
        let body = doc.body();
        let item = doc.create_element("div");
        doc.add_class(item, "menu-item");
        if active {
            doc.add_class(item, "menu-item-active");
        }
        let img = doc.create_element("img");
        doc.set_attr(img, "alt", label);
        doc.append_child(item, img).unwrap();
        doc.append_child(body, item).unwrap();
        item
    }

    fn setup() -> (Document, HostContract, HostRegistry, Vec<NodeId>) {
        let mut doc = Document::new();
        let contract = HostContract::default();
        let items = vec![
            host_item(&mut doc, "Earth", false),
            host_item(&mut doc, "Mars", true),
            host_item(&mut doc, "Bus", true),
            host_item(&mut doc, "Car", false),
        ];
        let autodrive = doc.create_element("div");
        doc.set_id(autodrive, "autodrive");
        let body = doc.body();
        doc.append_child(body, autodrive).unwrap();
        let registry = HostRegistry::scan(&doc, &contract);
        build_panel(&mut doc, &contract).unwrap();
        (doc, contract, registry, items)
    }

    #[test]
    fn sync_tick_mirrors_active_markers() {
        let (mut doc, contract, registry, items) = setup();
        let mut state = OverlayState::default();
        let outcome = sync_tick(&mut doc, &contract, &registry, &mut state);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(state.rendered_selection(Category::Scene), Some("Mars"));
        assert_eq!(state.rendered_selection(Category::Vehicle), Some("Bus"));
        assert_eq!(state.rendered_selection(Category::Weather), None);
        let weather = doc.get_element_by_id("weather-current-name").unwrap();
        assert_eq!(doc.text(weather), Some(ids::UNKNOWN_TEXT));

        doc.remove_class(items[2], "menu-item-active");
        doc.add_class(items[3], "menu-item-active");
        sync_tick(&mut doc, &contract, &registry, &mut state);
        assert_eq!(state.rendered_selection(Category::Vehicle), Some("Car"));
        let car = doc
            .descendants(doc.root())
            .into_iter()
            .find(|node| doc.attr(*node, "data-vehicle") == Some("Car"))
            .unwrap();
        assert!(doc.has_class(car, ids::ACTIVE_CLASS));
    }

    #[test]
    fn checkboxes_follow_host_markers() {
        let (mut doc, contract, _, _) = setup();
        let autodrive = doc.get_element_by_id("autodrive").unwrap();
        doc.add_class(autodrive, "autodrive-active");
        refresh_checkboxes(&mut doc, &contract);
        let auto_box = doc.get_element_by_id("settings-autodrive-checkbox").unwrap();
        let ui_box = doc.get_element_by_id("settings-showui-checkbox").unwrap();
        assert!(doc.has_class(auto_box, ids::ACTIVE_CLASS));
        assert!(doc.has_class(ui_box, ids::ACTIVE_CLASS));

        doc.set_display(autodrive, Some("none"));
        doc.remove_class(autodrive, "autodrive-active");
        refresh_checkboxes(&mut doc, &contract);
        assert!(!doc.has_class(auto_box, ids::ACTIVE_CLASS));
        assert!(!doc.has_class(ui_box, ids::ACTIVE_CLASS));
    }

    #[test]
    fn missing_host_element_skips_only_its_update() {
        let (mut doc, contract, registry, _) = setup();
        let autodrive = doc.get_element_by_id("autodrive").unwrap();
        doc.detach(autodrive);
        let mut state = OverlayState::default();
        let outcome = sync_tick(&mut doc, &contract, &registry, &mut state);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(state.rendered_selection(Category::Scene), Some("Mars"));
    }

    #[test]
    fn volume_icon_tracks_slider() {
        let (mut doc, _, _, _) = setup();
        let slider = doc.get_element_by_id(ids::VOLUME_SLIDER).unwrap();
        let icon = doc.get_element_by_id(ids::VOLUME_ICON).unwrap();
        doc.set_value(slider, "0");
        refresh_volume_icon(&mut doc).unwrap();
        assert_eq!(doc.attr(icon, "src"), Some(ids::VOLUME_OFF_SRC));
        doc.set_value(slider, "0.3");
        refresh_volume_icon(&mut doc).unwrap();
        assert_eq!(doc.attr(icon, "src"), Some(ids::VOLUME_HIGH_SRC));
    }

    #[test]
    fn enforce_visibility_restores_menu_bar_and_open_panel() {
        let (mut doc, contract, _, _) = setup();
        let body = doc.body();
        let menu_bar = doc.create_element("div");
        doc.set_id(menu_bar, "menu-bar");
        doc.append_child(body, menu_bar).unwrap();
        doc.set_display(menu_bar, Some("none"));

        let mut state = OverlayState::default();
        assert_eq!(enforce_visibility(&mut doc, &contract, &state), 1);
        assert_eq!(doc.display(menu_bar), Some("flex"));

        state.open = true;
        let panel = doc.get_element_by_id(ids::PANEL).unwrap();
        assert_eq!(enforce_visibility(&mut doc, &contract, &state), 1);
        assert_eq!(doc.display(panel), Some("block"));
        assert_eq!(enforce_visibility(&mut doc, &contract, &state), 0);
    }

    #[test]
    fn sync_without_panel_is_a_no_op() {
        let mut doc = Document::new();
        let contract = HostContract::default();
        let registry = HostRegistry::scan(&doc, &contract);
        let mut state = OverlayState::default();
        let outcome = sync_tick(&mut doc, &contract, &registry, &mut state);
        assert_eq!(outcome.applied, 0);
    }
}
