pub(crate) const PANEL_CSS: &str = r#"
#settings-panel { width: 320px; max-height: 80vh; overflow-y: auto; }
.settings-section { padding: 8px 12px; border-bottom: 1px solid rgba(255, 255, 255, 0.1); }
.settings-section-title { font-size: 11px; letter-spacing: 0.08em; opacity: 0.6; margin-bottom: 6px; }
.settings-item { display: flex; align-items: center; gap: 8px; padding: 4px 0; cursor: pointer; }
.settings-checkbox { width: 14px; height: 14px; border: 1px solid #aaa; border-radius: 3px; }
.settings-checkbox.active { background: #4caf50; border-color: #4caf50; }
.settings-expand-button { width: 100%; display: flex; justify-content: space-between; }
.settings-option-list { margin-top: 4px; }
.settings-option-item { padding: 4px 8px; cursor: pointer; }
.settings-option-item.selected { background: rgba(76, 175, 80, 0.3); }
.settings-button-group { display: flex; gap: 6px; }
.settings-button.active { background: #4caf50; }
.settings-slider-container { display: flex; align-items: center; gap: 8px; }
.settings-slider { flex: 1; }
#settings-menu-item.settings-active { background: rgba(255, 255, 255, 0.2); }
.settings-close-button { position: absolute; top: 4px; right: 8px; }
"#;
