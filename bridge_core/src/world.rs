//! The boundary to the simulation engine.
//!
//! The bridge never owns world state. Everything it reads or changes goes
//! through [`WorldAccess`], which the host implements over its engine. The
//! bridge calls into it only from the dispatch and step entry points, and
//! every call must return within that callback.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use bridge_runtime::{Direction, Position};

/// Stable identifier of a world entity (a unit number).
pub type EntityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Resource,
    Container,
    CraftingMachine,
    Inserter,
    Belt,
    Pole,
    Tree,
    DroppedItem,
    Other,
}

impl EntityKind {
    /// Kinds a player can mine by hand.
    pub fn is_minable(&self) -> bool {
        !matches!(self, EntityKind::DroppedItem)
    }

    pub fn has_inventory(&self) -> bool {
        matches!(
            self,
            EntityKind::Container | EntityKind::CraftingMachine | EntityKind::DroppedItem
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub position: Position,
    /// Remaining amount for resources, stack size for dropped items.
    pub amount: Option<u64>,
    pub direction: Option<Direction>,
}

impl EntityInfo {
    /// Identifying token used in handler messages.
    pub fn label(&self) -> String {
        format!("{} #{}", self.name, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireColor {
    Red,
    Green,
    Copper,
}

impl std::str::FromStr for WireColor {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "red" => Ok(WireColor::Red),
            "green" => Ok(WireColor::Green),
            "copper" => Ok(WireColor::Copper),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for WireColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireColor::Red => "red",
            WireColor::Green => "green",
            WireColor::Copper => "copper",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// `None` while the player has no character.
    pub position: Option<Position>,
    pub health: f64,
    pub max_health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchState {
    pub name: String,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemAmount {
    pub name: String,
    pub amount: u32,
}

impl ItemAmount {
    pub fn new(name: impl Into<String>, amount: u32) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeInfo {
    pub name: String,
    pub enabled: bool,
    pub energy: f64,
    pub ingredients: Vec<ItemAmount>,
    pub products: Vec<ItemAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnologyInfo {
    pub name: String,
    pub researched: bool,
    pub prerequisites: Vec<String>,
}

/// Asynchronous notifications raised by the world outside any command.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    MiningCompleted {
        entity: String,
        position: Position,
        item: String,
        count: u32,
        /// The mined entity is gone; mining it cannot continue.
        exhausted: bool,
    },
    CraftingCompleted {
        item: String,
        count: u32,
    },
    ResearchCompleted {
        name: String,
    },
    Damaged {
        amount: f64,
        health: f64,
        cause: Option<String>,
    },
    Died {
        cause: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("Player character is not available")]
    NoCharacter,
    #[error("Entity {0} no longer exists")]
    EntityGone(EntityId),
    #[error("Unknown item: {0}")]
    UnknownItem(String),
    #[error("Unknown recipe: {0}")]
    UnknownRecipe(String),
    #[error("Recipe not available: {0}")]
    RecipeLocked(String),
    #[error("Unknown technology: {0}")]
    UnknownTechnology(String),
    #[error("Technology already researched: {0}")]
    AlreadyResearched(String),
    #[error("Missing prerequisites for {0}")]
    MissingPrerequisites(String),
    #[error("Cannot place {name} at {position}")]
    PlacementBlocked { name: String, position: Position },
    #[error("{0}")]
    Rejected(String),
    #[error("Not supported by this world: {0}")]
    Unsupported(&'static str),
}

/// Capability surface of the simulation engine.
pub trait WorldAccess {
    /// Current simulation step.
    fn tick(&self) -> u64;

    fn player(&self) -> PlayerState;

    /// Continuous walking state. The engine may forget it between steps.
    fn set_walking(&mut self, direction: Option<Direction>);

    /// Continuous mining state. The engine may forget it between steps.
    fn set_mining(&mut self, target: Option<Position>);

    /// Entities whose position lies within `radius` of `center`, nearest first.
    fn entities_within(&self, center: Position, radius: f64) -> Vec<EntityInfo>;

    /// Build an entity from one matching item in the player inventory.
    fn place_entity(
        &mut self,
        name: &str,
        position: Position,
        direction: Direction,
    ) -> Result<EntityInfo, WorldError>;

    /// Rotate a quarter turn; returns the new facing.
    fn rotate_entity(&mut self, id: EntityId, reverse: bool) -> Result<Direction, WorldError>;

    fn order_deconstruction(&mut self, id: EntityId) -> Result<(), WorldError>;

    fn set_recipe(&mut self, id: EntityId, recipe: &str) -> Result<(), WorldError>;

    fn connect_wire(
        &mut self,
        from: EntityId,
        to: EntityId,
        color: WireColor,
    ) -> Result<(), WorldError>;

    fn copy_settings(&mut self, from: EntityId, to: EntityId) -> Result<(), WorldError>;

    fn player_inventory(&self) -> BTreeMap<String, u32>;

    fn player_item_count(&self, item: &str) -> u32 {
        self.player_inventory().get(item).copied().unwrap_or(0)
    }

    /// Returns how many were actually inserted.
    fn insert_player_items(&mut self, item: &str, count: u32) -> Result<u32, WorldError>;

    /// Returns how many were actually removed.
    fn remove_player_items(&mut self, item: &str, count: u32) -> Result<u32, WorldError>;

    fn entity_item_count(&self, id: EntityId, item: &str) -> Result<u32, WorldError>;

    fn insert_entity_items(
        &mut self,
        id: EntityId,
        item: &str,
        count: u32,
    ) -> Result<u32, WorldError>;

    fn remove_entity_items(
        &mut self,
        id: EntityId,
        item: &str,
        count: u32,
    ) -> Result<u32, WorldError>;

    /// How many times the recipe can be crafted from the player inventory.
    fn craftable_count(&self, recipe: &str) -> Result<u32, WorldError>;

    /// Queue crafts; returns the number queued.
    fn begin_crafting(&mut self, recipe: &str, count: u32) -> Result<u32, WorldError>;

    fn crafting_queue_size(&self) -> usize;

    fn start_research(&mut self, technology: &str) -> Result<(), WorldError>;

    fn current_research(&self) -> Option<ResearchState>;

    fn recipes(&self) -> Vec<RecipeInfo>;

    fn technologies(&self) -> Vec<TechnologyInfo>;

    fn broadcast(&mut self, message: &str);

    /// Privileged console evaluation. Worlds without an evaluator keep the default.
    fn run_console(&mut self, _source: &str) -> Result<String, WorldError> {
        Err(WorldError::Unsupported("console evaluation"))
    }

    /// Drain notifications raised since the last call, oldest first.
    fn poll_events(&mut self) -> Vec<WorldEvent>;
}
