//! Planning-focused contract types.

use serde::{Deserialize, Serialize};

use crate::{Action, NeedKind};

/// Where a plan candidate came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "need", rename_all = "snake_case")]
pub enum PlanSource {
    Need(NeedKind),
    /// A composite action, or a prerequisite step toward one.
    Composite(NeedKind),
    Itinerary,
    Idle,
}

/// One candidate in a plan; plans are ordered highest priority first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanEntry {
    pub action: Action,
    pub priority: f64,
    pub source: PlanSource,
}

impl PlanEntry {
    pub fn new(action: Action, priority: f64, source: PlanSource) -> Self {
        Self {
            action,
            priority,
            source,
        }
    }
}
