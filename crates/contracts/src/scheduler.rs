//! Scheduling-focused contract types.

use serde::{Deserialize, Serialize};

use crate::Action;

/// A pre-planned action with the simulated time it is due by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ItineraryEntry {
    pub trigger_time: f64,
    pub action: Action,
}

/// Pacing state of the simulation loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    #[default]
    Idle,
    CatchingUp,
    Stepping,
}
