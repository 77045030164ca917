//! Settings overlay for a browser-hosted driving game.
//!
//! The overlay attaches to a host page it does not own, hides the host's toolbar controls
//! and offers one consolidated panel that drives the host through its own event listeners.

pub mod bridge;
pub mod config;
pub mod contract;
pub mod dom;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod host_sim;
pub mod logging;
pub mod panel;
pub mod presentation;
pub mod prober;
pub mod reconcile;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod script;
pub mod session;
pub mod suppress;

pub use bridge::{EventBridge, HostContext, HostControl};
pub use config::{OverlayConfig, Timings};
pub use contract::HostContract;
pub use error::OverlayError;
pub use registry::{Category, HostRegistry};
pub use runtime::Runtime;
pub use session::{OverlaySession, SetupReport, Task};
