use std::collections::{BTreeMap, VecDeque};

use bevy_ecs::prelude::*;

use crate::world::{Direction, EntityId, EntityKind, Position, WireColor, WorldEvent};

/// Stable id handed out to the bridge.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitNumber(pub EntityId);

#[derive(Component, Debug, Clone)]
pub struct Prototype {
    pub name: String,
    pub kind: EntityKind,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Placement(pub Position);

#[derive(Component, Debug, Clone, Copy)]
pub struct Facing(pub Direction);

/// Remaining yield of a resource patch.
#[derive(Component, Debug, Clone, Copy)]
pub struct Deposit {
    pub amount: u64,
}

#[derive(Component, Debug, Clone, Default)]
pub struct Storage {
    pub items: BTreeMap<String, u32>,
    /// Total item capacity across all item kinds.
    pub capacity: u32,
}

impl Storage {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            items: BTreeMap::new(),
            capacity,
        }
    }

    pub fn total(&self) -> u32 {
        self.items.values().copied().fold(0u32, u32::saturating_add)
    }

    pub fn count(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Returns how many fit.
    pub fn insert(&mut self, item: &str, count: u32) -> u32 {
        let accepted = count.min(self.capacity.saturating_sub(self.total()));
        if accepted > 0 {
            *self.items.entry(item.to_string()).or_default() += accepted;
        }
        accepted
    }

    /// Returns how many were present to remove.
    pub fn remove(&mut self, item: &str, count: u32) -> u32 {
        let Some(held) = self.items.get_mut(item) else {
            return 0;
        };
        let removed = count.min(*held);
        *held -= removed;
        if *held == 0 {
            self.items.remove(item);
        }
        removed
    }
}

#[derive(Component, Debug, Clone)]
pub struct AssignedRecipe(pub String);

#[derive(Component, Debug, Clone, Default)]
pub struct Circuit {
    pub links: Vec<(EntityId, WireColor)>,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct DeconstructionMark;

#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct Clock(pub u64);

#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct NextUnit(pub EntityId);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiningProgress {
    pub target: Position,
    pub ticks: u32,
}

#[derive(Resource, Debug, Clone)]
pub struct Character {
    pub position: Position,
    pub health: f64,
    pub max_health: f64,
    pub alive: bool,
    /// Cleared after every tick; the controller has to keep setting it.
    pub walking: Option<Direction>,
    pub mining: Option<MiningProgress>,
    pub inventory: BTreeMap<String, u32>,
}

impl Character {
    pub const MAX_HEALTH: f64 = 250.0;

    pub fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn add_items(&mut self, item: &str, count: u32) {
        if count > 0 {
            let held = self.inventory.entry(item.to_string()).or_default();
            *held = held.saturating_add(count);
        }
    }

    pub fn take_items(&mut self, item: &str, count: u32) -> u32 {
        let Some(held) = self.inventory.get_mut(item) else {
            return 0;
        };
        let removed = count.min(*held);
        *held -= removed;
        if *held == 0 {
            self.inventory.remove(item);
        }
        removed
    }
}

impl Default for Character {
    fn default() -> Self {
        Self {
            position: Position::default(),
            health: Self::MAX_HEALTH,
            max_health: Self::MAX_HEALTH,
            alive: true,
            walking: None,
            mining: None,
            inventory: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CraftJob {
    pub recipe: String,
    pub remaining: u32,
    pub ticks_left: u32,
}

#[derive(Resource, Debug, Default, Clone)]
pub struct CraftQueue {
    pub jobs: VecDeque<CraftJob>,
}

#[derive(Debug, Clone)]
pub struct ActiveResearch {
    pub name: String,
    pub elapsed: u32,
}

#[derive(Resource, Debug, Default, Clone)]
pub struct ResearchProgress {
    pub active: Option<ActiveResearch>,
}

#[derive(Resource, Debug, Default, Clone)]
pub struct PendingEvents(pub Vec<WorldEvent>);

#[derive(Resource, Debug, Default, Clone)]
pub struct Broadcasts(pub Vec<String>);
