//! Known-label data model.
//!
//! Every distinct window title seen while tracking is recorded once, the
//! first time it lands in the log.

use serde::{Deserialize, Serialize};

/// Labels that stand in for "no real window" and are never registered.
pub const RESERVED_LABELS: &[&str] = &["Unknown Window", "Error getting active window.", "N/A"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownLabel {
    pub label: String,
    pub first_seen: String,
}

/// Whether a segment label belongs in the known-label registry.
pub fn is_registrable(label: &str) -> bool {
    !label.is_empty() && !RESERVED_LABELS.contains(&label)
}
