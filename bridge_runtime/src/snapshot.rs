//! Snapshot artifact: a point-in-time projection of the player, the
//! standing intents, and whatever responses were queued when it was taken.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::responses::Response;
use crate::spatial::{Direction, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlayerSnapshot {
    /// Absent while the player has no body (e.g. after death).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub health: f64,
    pub max_health: f64,
    pub walking: Option<Direction>,
    pub mining: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchSnapshot {
    pub name: String,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Snapshot {
    pub tick: u64,
    pub player: PlayerSnapshot,
    pub crafting_queue_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research: Option<ResearchSnapshot>,
    pub responses: Vec<Response>,
}
