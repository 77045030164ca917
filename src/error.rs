//! Failure taxonomy for the overlay. Nothing here is ever surfaced to the end user;
//! callers log and degrade.

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    /// A host element the current step depends on is absent right now.
    #[error("host anchor `{0}` not found")]
    MissingAnchor(String),

    /// A captured host reference whose node has since left the document.
    #[error("host element `{name}` ({node:?}) is no longer attached")]
    StaleReference { name: String, node: NodeId },

    /// One-time setup step raised an error; sibling steps still run.
    #[error("setup step `{step}` failed: {reason}")]
    SetupStep { step: &'static str, reason: String },

    /// Tree operation that would corrupt the document (cycle, unknown node).
    #[error("invalid tree operation: {0}")]
    InvalidTree(String),
}

impl OverlayError {
    pub fn missing(anchor: impl Into<String>) -> Self {
        Self::MissingAnchor(anchor.into())
    }

    /// Missing anchors and stale references are handled identically: skip the step.
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::MissingAnchor(_) | Self::StaleReference { .. })
    }
}
