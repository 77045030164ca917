//! Panel controller so overlay-local state and host commands change together.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::bridge::{format_level, snap_level, HostContext, HostControl};
use crate::config::Timings;
use crate::contract::HostContract;
use crate::dom::{EventTarget, NodeId};
use crate::error::OverlayError;
use crate::presentation::{ids, HostToggle, OverlayAction, QuickAction};
use crate::reconcile;
use crate::registry::{Category, HostRegistry};
use crate::session::Task;

/// Ephemeral panel state. Never persisted; never authoritative for host values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayState {
    pub open: bool,
    pub last_nonzero_volume: Option<f64>,
    expanded: BTreeSet<Category>,
    rendered: BTreeMap<Category, Option<String>>,
}

impl OverlayState {
    pub fn is_expanded(&self, category: Category) -> bool {
        self.expanded.contains(&category)
    }

    pub fn rendered_selection(&self, category: Category) -> Option<&str> {
        self.rendered.get(&category).and_then(|name| name.as_deref())
    }

    pub(crate) fn set_rendered(&mut self, category: Category, name: Option<String>) {
        self.rendered.insert(category, name);
    }

    fn set_expanded(&mut self, category: Category, expanded: bool) {
        if expanded {
            self.expanded.insert(category);
        } else {
            self.expanded.remove(&category);
        }
    }
}

pub struct PanelActionContext<'a> {
    pub host: HostContext<'a>,
    pub control: &'a mut dyn HostControl,
    pub contract: &'a HostContract,
    pub registry: &'a HostRegistry,
    pub timings: &'a Timings,
    pub state: &'a mut OverlayState,
}

impl<'a> PanelActionContext<'a> {
    pub fn new(
        host: HostContext<'a>,
        control: &'a mut dyn HostControl,
        contract: &'a HostContract,
        registry: &'a HostRegistry,
        timings: &'a Timings,
        state: &'a mut OverlayState,
    ) -> Self {
        Self {
            host,
            control,
            contract,
            registry,
            timings,
            state,
        }
    }

    pub fn handle(&mut self, action: OverlayAction) -> Result<(), OverlayError> {
        debug!(?action, "overlay action");
        match action {
            OverlayAction::TogglePanel => {
                self.toggle_panel();
                Ok(())
            }
            OverlayAction::ClosePanel => {
                if self.state.open {
                    self.toggle_panel();
                }
                Ok(())
            }
            OverlayAction::Toggle(toggle) => self.toggle_host(toggle),
            OverlayAction::Quick(action) => {
                self.quick_action(action);
                Ok(())
            }
            OverlayAction::ToggleExpand(category) => {
                let expanded = !self.state.is_expanded(category);
                self.set_expanded(category, expanded)
            }
            OverlayAction::Choose { category, name } => self.choose(category, &name),
            OverlayAction::Volume => self.volume_changed(),
            OverlayAction::Mute => self.toggle_mute(),
        }
    }

    pub fn toggle_panel(&mut self) {
        self.state.open = !self.state.open;
        let open = self.state.open;
        let doc = &mut *self.host.doc;
        let display = if open { "block" } else { "none" };

        if let Some(panel) = doc.get_element_by_id(ids::PANEL) {
            doc.set_display(panel, Some(display));
        }
        if let Some(icon) = doc.get_element_by_id(ids::ICON) {
            doc.set_class(icon, ids::ICON_ACTIVE_CLASS, open);
        }
        match doc.get_element_by_id(&self.contract.pause_indicator_id) {
            Some(pause) => doc.set_display(pause, Some(display)),
            None => debug!("pause indicator missing; host not paused"),
        }

        if open {
            for category in Category::ALL.into_iter().filter(|c| c.is_expandable()) {
                if let Err(err) = self.set_expanded(category, false) {
                    debug!(error = %err, "selector collapse skipped");
                }
            }
            reconcile::refresh_checkboxes(self.host.doc, self.contract);
        }
        info!(open, "settings panel toggled");
    }

    fn toggle_host(&mut self, toggle: HostToggle) -> Result<(), OverlayError> {
        match toggle {
            HostToggle::Autodrive => {
                let Some(autodrive) = self.registry.autodrive() else {
                    return Err(OverlayError::missing(&self.contract.autodrive_id));
                };
                self.control.activate(&mut self.host, autodrive)?;
                reconcile::refresh_checkboxes(self.host.doc, self.contract);
            }
            HostToggle::Headlights | HostToggle::ShowUi => {
                let key = if toggle == HostToggle::Headlights {
                    self.contract.shortcuts.headlights
                } else {
                    self.contract.shortcuts.toggle_ui
                };
                self.control.send_shortcut(&mut self.host, key);
                self.host
                    .timers
                    .set_timeout(self.timings.settle_delay_ms, Task::RefreshCheckboxes);
            }
        }
        Ok(())
    }

    fn quick_action(&mut self, action: QuickAction) {
        let key = match action {
            QuickAction::Reset => self.contract.shortcuts.reset,
            QuickAction::Camera => self.contract.shortcuts.camera,
        };
        self.control.send_shortcut(&mut self.host, key);
    }

    fn set_expanded(&mut self, category: Category, expanded: bool) -> Result<(), OverlayError> {
        self.state.set_expanded(category, expanded);
        let doc = &mut *self.host.doc;
        let list_id = ids::option_list(category);
        let list = doc
            .get_element_by_id(&list_id)
            .ok_or_else(|| OverlayError::missing(list_id))?;
        doc.set_display(list, Some(if expanded { "block" } else { "none" }));
        if let Some(arrow) = doc.get_element_by_id(&ids::expand_arrow(category)) {
            let glyph = if expanded {
                ids::ARROW_EXPANDED
            } else {
                ids::ARROW_COLLAPSED
            };
            doc.set_text(arrow, glyph);
        }
        Ok(())
    }

    fn choose(&mut self, category: Category, name: &str) -> Result<(), OverlayError> {
        let Some(target) = self.registry.roster(category).find(name) else {
            warn!(category = category.label(), name, "no captured host item for choice");
            return Err(OverlayError::missing(name));
        };
        self.control.activate(&mut self.host, target)?;
        if category.is_expandable() {
            let collapsed = self.set_expanded(category, false);
            reconcile::refresh_selection(
                self.host.doc,
                self.contract,
                self.registry,
                category,
                self.state,
            )?;
            collapsed?;
        } else {
            self.host
                .timers
                .set_timeout(self.timings.settle_delay_ms, Task::RefreshButtons(category));
        }
        Ok(())
    }

    fn own_slider(&self) -> Result<NodeId, OverlayError> {
        self.host
            .doc
            .get_element_by_id(ids::VOLUME_SLIDER)
            .ok_or_else(|| OverlayError::missing(ids::VOLUME_SLIDER))
    }

    fn volume_changed(&mut self) -> Result<(), OverlayError> {
        let level = reconcile::slider_level(self.host.doc)?;
        self.apply_volume(level)
    }

    fn apply_volume(&mut self, level: f64) -> Result<(), OverlayError> {
        let level = snap_level(level);
        if level > 0.0 {
            self.state.last_nonzero_volume = Some(level);
        }
        let own = self.own_slider().ok();
        self.control.set_volume(&mut self.host, level, own);
        reconcile::update_volume_icon(self.host.doc, level)
    }

    fn toggle_mute(&mut self) -> Result<(), OverlayError> {
        let slider = self.own_slider()?;
        let current = snap_level(reconcile::slider_level(self.host.doc)?);
        let next = if current > 0.0 {
            self.state.last_nonzero_volume = Some(current);
            0.0
        } else {
            self.state
                .last_nonzero_volume
                .unwrap_or(self.timings.default_volume)
        };
        self.host.doc.set_value(slider, &format_level(next));
        info!(muted = next == 0.0, level = next, "mute toggled");
        self.apply_volume(next)
    }

    /// Close the panel when a user click lands outside both the panel and the icon.
    pub fn dismiss_if_outside(&mut self, target: EventTarget) -> bool {
        if !self.state.open {
            return false;
        }
        let doc = &*self.host.doc;
        let (Some(panel), Some(icon)) = (
            doc.get_element_by_id(ids::PANEL),
            doc.get_element_by_id(ids::ICON),
        ) else {
            return false;
        };
        let inside = target
            .node()
            .map(|node| doc.contains(panel, node) || doc.contains(icon, node))
            .unwrap_or(false);
        if inside {
            return false;
        }
        self.toggle_panel();
        true
    }

    /// Pointer over an overlay surface disables host mouse-look; leaving re-enables it.
    pub fn pointer_over_overlay(&mut self, over: bool) {
        match self.host.doc.mouse_look() {
            Some(mouse_look) => mouse_look.set_mouse_enabled(!over),
            None => debug!("host exposes no mouse-look control"),
        }
    }
}
