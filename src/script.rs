//! Scripted user input for the simulator (`--action`).

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};

use crate::presentation::{HostToggle, QuickAction};
use crate::registry::Category;

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    Open,
    Close,
    /// Click somewhere on the host page, outside the overlay.
    Outside,
    Toggle(HostToggle),
    Quick(QuickAction),
    Choose { category: Category, name: String },
    Volume(f64),
    Mute,
    Wait(u64),
}

impl FromStr for ScriptAction {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let text = raw.trim();
        let action = match text {
            "open" => ScriptAction::Open,
            "close" => ScriptAction::Close,
            "outside" => ScriptAction::Outside,
            "autodrive" => ScriptAction::Toggle(HostToggle::Autodrive),
            "headlights" => ScriptAction::Toggle(HostToggle::Headlights),
            "toggle-ui" => ScriptAction::Toggle(HostToggle::ShowUi),
            "reset" => ScriptAction::Quick(QuickAction::Reset),
            "camera" => ScriptAction::Quick(QuickAction::Camera),
            "mute" => ScriptAction::Mute,
            _ => return parse_with_argument(text),
        };
        Ok(action)
    }
}

fn parse_with_argument(text: &str) -> Result<ScriptAction> {
    let (verb, arg) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("unknown action `{text}`"))?;
    let arg = arg.trim();
    if arg.is_empty() {
        bail!("action `{verb}` needs a value");
    }
    let category = match verb {
        "scene" => Some(Category::Scene),
        "weather" => Some(Category::Weather),
        "vehicle" => Some(Category::Vehicle),
        "input" => Some(Category::InputMethod),
        _ => None,
    };
    if let Some(category) = category {
        return Ok(ScriptAction::Choose {
            category,
            name: arg.to_string(),
        });
    }
    match verb {
        "volume" => {
            let level: f64 = arg
                .parse()
                .map_err(|_| anyhow!("volume `{arg}` is not a number"))?;
            if !(0.0..=1.0).contains(&level) {
                bail!("volume must be between 0 and 1, got {level}");
            }
            Ok(ScriptAction::Volume(level))
        }
        "wait" => {
            let ms: u64 = arg
                .parse()
                .map_err(|_| anyhow!("wait `{arg}` is not a millisecond count"))?;
            Ok(ScriptAction::Wait(ms))
        }
        _ => bail!("unknown action `{text}`"),
    }
}

impl fmt::Display for ScriptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptAction::Open => f.write_str("open"),
            ScriptAction::Close => f.write_str("close"),
            ScriptAction::Outside => f.write_str("outside"),
            ScriptAction::Toggle(HostToggle::ShowUi) => f.write_str("toggle-ui"),
            ScriptAction::Toggle(toggle) => f.write_str(toggle.key()),
            ScriptAction::Quick(action) => f.write_str(action.key()),
            ScriptAction::Choose { category, name } => write!(f, "{}:{name}", category.label()),
            ScriptAction::Volume(level) => write!(f, "volume:{level}"),
            ScriptAction::Mute => f.write_str("mute"),
            ScriptAction::Wait(ms) => write!(f, "wait:{ms}"),
        }
    }
}
