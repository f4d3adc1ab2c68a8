//! In-memory world built on `bevy_ecs`, used by the server binary, tests and
//! benchmarks. It behaves like a small factory game: a character with an
//! inventory, resource patches, containers, crafting machines, a hand
//! crafting queue and a research tree. Walking is forgotten after every
//! tick, so a controller has to keep re-asserting it.

pub mod catalog;
pub mod components;
pub mod console;
pub mod systems;

use std::collections::BTreeMap;

use bevy_ecs::prelude::*;
use bevy_ecs::world::EntityRef;

use crate::world::{
    Direction, EntityId, EntityInfo, EntityKind, PlayerState, Position, RecipeInfo,
    ResearchState, TechnologyInfo, WireColor, WorldAccess, WorldError, WorldEvent,
};
use catalog::{placed_kind, storage_capacity, RecipeBook, TechTree};
use components::{
    ActiveResearch, AssignedRecipe, Broadcasts, Character, Circuit, Clock, CraftJob, CraftQueue,
    DeconstructionMark, Deposit, Facing, MiningProgress, NextUnit, PendingEvents, Placement,
    Prototype, ResearchProgress, Storage, UnitNumber,
};
use console::Statement;

/// Entities closer than this to a placement spot block it.
const PLACEMENT_CLEARANCE: f64 = 0.5;

pub struct SandboxWorld {
    world: World,
    schedule: Schedule,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    /// Empty map, living character at the origin, starter recipes and technologies.
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(Clock::default());
        world.insert_resource(NextUnit(1));
        world.insert_resource(Character::default());
        world.insert_resource(RecipeBook::default());
        world.insert_resource(TechTree::default());
        world.insert_resource(CraftQueue::default());
        world.insert_resource(ResearchProgress::default());
        world.insert_resource(PendingEvents::default());
        world.insert_resource(Broadcasts::default());
        Self {
            world,
            schedule: systems::build_schedule(),
        }
    }

    /// A small starting area: ore patches on each side of the origin, a
    /// grove of trees, a stocked chest and an idle assembler.
    pub fn with_starter_area() -> Self {
        let mut sandbox = Self::new();
        let patches = [
            ("iron-ore", Position::new(12.0, 0.0)),
            ("copper-ore", Position::new(-12.0, 0.0)),
            ("coal", Position::new(0.0, 12.0)),
            ("stone", Position::new(0.0, -12.0)),
        ];
        for (name, center) in patches {
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let amount = 500 + 100 * (dx + dy + 2) as u64;
                    sandbox.spawn_resource(name, center.offset(f64::from(dx), f64::from(dy)), amount);
                }
            }
        }
        for i in 0..5 {
            let offset = f64::from(i);
            sandbox.spawn_entity(
                "tree",
                EntityKind::Tree,
                Position::new(6.0 + offset, 6.0 - offset),
                None,
            );
        }
        sandbox.spawn_container(
            "wooden-chest",
            Position::new(3.0, 3.0),
            &[("iron-plate", 50), ("copper-plate", 30), ("wood", 10)],
        );
        sandbox.spawn_entity(
            "assembling-machine-1",
            EntityKind::CraftingMachine,
            Position::new(-4.0, 4.0),
            Some(Direction::North),
        );
        sandbox
    }

    /// Run one simulation tick.
    pub fn advance(&mut self) {
        self.schedule.run(&mut self.world);
    }

    pub fn advance_by(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.advance();
        }
    }

    fn character(&self) -> &Character {
        self.world.resource::<Character>()
    }

    fn character_mut(&mut self) -> Mut<'_, Character> {
        self.world.resource_mut::<Character>()
    }

    fn issue_unit(&mut self) -> EntityId {
        let mut next = self.world.resource_mut::<NextUnit>();
        let unit = next.0;
        next.0 += 1;
        unit
    }

    /// Spawn any entity. Containers and crafting machines get an inventory.
    pub fn spawn_entity(
        &mut self,
        name: &str,
        kind: EntityKind,
        position: Position,
        facing: Option<Direction>,
    ) -> EntityId {
        let unit = self.issue_unit();
        let mut entity = self.world.spawn((
            UnitNumber(unit),
            Prototype {
                name: name.to_string(),
                kind,
            },
            Placement(position),
        ));
        if let Some(direction) = facing {
            entity.insert(Facing(direction));
        }
        if kind.has_inventory() {
            entity.insert(Storage::with_capacity(storage_capacity(name, kind)));
        }
        if matches!(kind, EntityKind::Pole | EntityKind::Inserter) {
            entity.insert(Circuit::default());
        }
        unit
    }

    pub fn spawn_resource(&mut self, name: &str, position: Position, amount: u64) -> EntityId {
        let unit = self.spawn_entity(name, EntityKind::Resource, position, None);
        if let Some(entity) = self.find(unit) {
            self.world.entity_mut(entity).insert(Deposit { amount });
        }
        unit
    }

    pub fn spawn_container(
        &mut self,
        name: &str,
        position: Position,
        items: &[(&str, u32)],
    ) -> EntityId {
        let unit = self.spawn_entity(name, EntityKind::Container, position, None);
        if let Some(mut storage) = self.find(unit).and_then(|e| self.world.get_mut::<Storage>(e)) {
            for (item, count) in items {
                storage.insert(item, *count);
            }
        }
        unit
    }

    /// Put a stack of items on the ground.
    pub fn drop_item(&mut self, item: &str, position: Position, count: u32) -> EntityId {
        let unit = self.spawn_entity(item, EntityKind::DroppedItem, position, None);
        if let Some(mut storage) = self.find(unit).and_then(|e| self.world.get_mut::<Storage>(e)) {
            storage.insert(item, count);
        }
        unit
    }

    pub fn give(&mut self, item: &str, count: u32) {
        self.character_mut().add_items(item, count);
    }

    pub fn teleport(&mut self, position: Position) {
        self.character_mut().position = position;
    }

    /// Hurt the character. Lethal damage kills it and drops every action.
    pub fn damage(&mut self, amount: f64, cause: Option<String>) {
        let event = {
            let mut character = self.character_mut();
            if !character.alive {
                return;
            }
            character.health -= amount;
            if character.health <= 0.0 {
                character.health = 0.0;
                character.alive = false;
                character.walking = None;
                character.mining = None;
                WorldEvent::Died { cause }
            } else {
                WorldEvent::Damaged {
                    amount,
                    health: character.health,
                    cause,
                }
            }
        };
        self.world.resource_mut::<PendingEvents>().0.push(event);
    }

    pub fn heal(&mut self, amount: f64) {
        let mut character = self.character_mut();
        if character.alive {
            character.health = (character.health + amount).min(character.max_health);
        }
    }

    /// Bring the character back at the origin with full health.
    pub fn respawn(&mut self) {
        let mut character = self.character_mut();
        character.alive = true;
        character.health = character.max_health;
        character.position = Position::default();
    }

    pub fn broadcasts(&self) -> &[String] {
        &self.world.resource::<Broadcasts>().0
    }

    pub fn is_marked_for_deconstruction(&self, id: EntityId) -> bool {
        self.entity_ref(id)
            .is_some_and(|entity| entity.contains::<DeconstructionMark>())
    }

    pub fn assigned_recipe(&self, id: EntityId) -> Option<String> {
        self.entity_ref(id)?
            .get::<AssignedRecipe>()
            .map(|recipe| recipe.0.clone())
    }

    pub fn wire_links(&self, id: EntityId) -> Vec<(EntityId, WireColor)> {
        self.entity_ref(id)
            .and_then(|entity| entity.get::<Circuit>().map(|circuit| circuit.links.clone()))
            .unwrap_or_default()
    }

    fn entity_ref(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.world
            .iter_entities()
            .find(|entity| entity.get::<UnitNumber>().is_some_and(|unit| unit.0 == id))
    }

    fn find(&self, id: EntityId) -> Option<Entity> {
        self.entity_ref(id).map(|entity| entity.id())
    }

    fn require(&self, id: EntityId) -> Result<Entity, WorldError> {
        self.find(id).ok_or(WorldError::EntityGone(id))
    }

    fn kind_of(&self, entity: Entity) -> Option<EntityKind> {
        self.world.get::<Prototype>(entity).map(|prototype| prototype.kind)
    }

    fn describe(entity: &EntityRef<'_>) -> Option<EntityInfo> {
        let unit = entity.get::<UnitNumber>()?;
        let prototype = entity.get::<Prototype>()?;
        let placement = entity.get::<Placement>()?;
        let amount = match (entity.get::<Deposit>(), prototype.kind) {
            (Some(deposit), _) => Some(deposit.amount),
            (None, EntityKind::DroppedItem) => entity
                .get::<Storage>()
                .map(|storage| u64::from(storage.total())),
            _ => None,
        };
        Some(EntityInfo {
            id: unit.0,
            name: prototype.name.clone(),
            kind: prototype.kind,
            position: placement.0,
            amount,
            direction: entity.get::<Facing>().map(|facing| facing.0),
        })
    }

    fn storage_mut(&mut self, id: EntityId) -> Result<Mut<'_, Storage>, WorldError> {
        let entity = self.require(id)?;
        self.world
            .get_mut::<Storage>(entity)
            .ok_or_else(|| WorldError::Rejected(format!("Entity {id} has no inventory")))
    }

    fn run_statement(&mut self, statement: Statement) -> String {
        match statement {
            Statement::Give { item, count } => {
                self.give(&item, count);
                format!("Gave {count} {item}")
            }
            Statement::Teleport(position) => {
                self.teleport(position);
                format!("Teleported to {position}")
            }
            Statement::Damage(amount) => {
                self.damage(amount, Some("console".to_string()));
                format!("Dealt {amount} damage")
            }
            Statement::Heal(amount) => {
                self.heal(amount);
                format!("Healed {amount}")
            }
        }
    }
}

impl WorldAccess for SandboxWorld {
    fn tick(&self) -> u64 {
        self.world.resource::<Clock>().0
    }

    fn player(&self) -> PlayerState {
        let character = self.character();
        PlayerState {
            position: character.alive.then_some(character.position),
            health: character.health,
            max_health: character.max_health,
        }
    }

    fn set_walking(&mut self, direction: Option<Direction>) {
        let mut character = self.character_mut();
        if character.alive || direction.is_none() {
            character.walking = direction;
        }
    }

    fn set_mining(&mut self, target: Option<Position>) {
        let mut character = self.character_mut();
        if !character.alive {
            character.mining = None;
            return;
        }
        character.mining = match (target, character.mining) {
            (Some(target), Some(progress)) if progress.target == target => Some(progress),
            (Some(target), _) => Some(MiningProgress { target, ticks: 0 }),
            (None, _) => None,
        };
    }

    fn entities_within(&self, center: Position, radius: f64) -> Vec<EntityInfo> {
        let limit = radius * radius;
        let mut found: Vec<(f64, EntityInfo)> = self
            .world
            .iter_entities()
            .filter_map(|entity| Self::describe(&entity))
            .map(|info| (info.position.distance_sq(&center), info))
            .filter(|(distance, _)| *distance <= limit)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
        found.into_iter().map(|(_, info)| info).collect()
    }

    fn place_entity(
        &mut self,
        name: &str,
        position: Position,
        direction: Direction,
    ) -> Result<EntityInfo, WorldError> {
        if !self.character().alive {
            return Err(WorldError::NoCharacter);
        }
        let kind = placed_kind(name)
            .ok_or_else(|| WorldError::Rejected(format!("{name} cannot be placed")))?;
        if self.character().item_count(name) == 0 {
            return Err(WorldError::Rejected(format!("No {name} in inventory")));
        }
        let blocked = self
            .entities_within(position, PLACEMENT_CLEARANCE)
            .iter()
            .any(|entity| entity.kind != EntityKind::DroppedItem);
        if blocked {
            return Err(WorldError::PlacementBlocked {
                name: name.to_string(),
                position,
            });
        }

        self.character_mut().take_items(name, 1);
        let facing = matches!(
            kind,
            EntityKind::Inserter | EntityKind::Belt | EntityKind::CraftingMachine
        )
        .then_some(direction);
        let unit = self.spawn_entity(name, kind, position, facing);
        self.entity_ref(unit)
            .and_then(|entity| Self::describe(&entity))
            .ok_or(WorldError::EntityGone(unit))
    }

    fn rotate_entity(&mut self, id: EntityId, reverse: bool) -> Result<Direction, WorldError> {
        let entity = self.require(id)?;
        let mut facing = self
            .world
            .get_mut::<Facing>(entity)
            .ok_or_else(|| WorldError::Rejected(format!("Entity {id} cannot be rotated")))?;
        facing.0 = facing.0.turned(if reverse { -2 } else { 2 });
        Ok(facing.0)
    }

    fn order_deconstruction(&mut self, id: EntityId) -> Result<(), WorldError> {
        let entity = self.require(id)?;
        if self.world.get::<DeconstructionMark>(entity).is_some() {
            return Err(WorldError::Rejected(format!(
                "Entity {id} is already marked for deconstruction"
            )));
        }
        self.world.entity_mut(entity).insert(DeconstructionMark);
        Ok(())
    }

    fn set_recipe(&mut self, id: EntityId, recipe: &str) -> Result<(), WorldError> {
        let entity = self.require(id)?;
        if self.kind_of(entity) != Some(EntityKind::CraftingMachine) {
            return Err(WorldError::Rejected(format!(
                "Entity {id} is not a crafting machine"
            )));
        }
        self.world.resource::<RecipeBook>().available(recipe)?;
        self.world
            .entity_mut(entity)
            .insert(AssignedRecipe(recipe.to_string()));
        Ok(())
    }

    fn connect_wire(
        &mut self,
        from: EntityId,
        to: EntityId,
        color: WireColor,
    ) -> Result<(), WorldError> {
        let source = self.require(from)?;
        let target = self.require(to)?;
        if color == WireColor::Copper
            && (self.kind_of(source) != Some(EntityKind::Pole)
                || self.kind_of(target) != Some(EntityKind::Pole))
        {
            return Err(WorldError::Rejected(
                "Copper wire connects electric poles only".to_string(),
            ));
        }
        for (entity, other) in [(source, to), (target, from)] {
            let mut circuit = self
                .world
                .get_mut::<Circuit>(entity)
                .ok_or_else(|| WorldError::Rejected("Entity has no circuit connector".to_string()))?;
            if !circuit.links.contains(&(other, color)) {
                circuit.links.push((other, color));
            }
        }
        Ok(())
    }

    fn copy_settings(&mut self, from: EntityId, to: EntityId) -> Result<(), WorldError> {
        let source = self.require(from)?;
        let target = self.require(to)?;
        let recipe = self
            .world
            .get::<AssignedRecipe>(source)
            .cloned()
            .ok_or_else(|| WorldError::Rejected(format!("Entity {from} has no settings to copy")))?;
        if self.kind_of(source) != self.kind_of(target) {
            return Err(WorldError::Rejected(
                "Settings can only be copied between entities of the same kind".to_string(),
            ));
        }
        self.world.entity_mut(target).insert(recipe);
        Ok(())
    }

    fn player_inventory(&self) -> BTreeMap<String, u32> {
        self.character().inventory.clone()
    }

    fn insert_player_items(&mut self, item: &str, count: u32) -> Result<u32, WorldError> {
        self.character_mut().add_items(item, count);
        Ok(count)
    }

    fn remove_player_items(&mut self, item: &str, count: u32) -> Result<u32, WorldError> {
        Ok(self.character_mut().take_items(item, count))
    }

    fn entity_item_count(&self, id: EntityId, item: &str) -> Result<u32, WorldError> {
        let entity = self.entity_ref(id).ok_or(WorldError::EntityGone(id))?;
        entity
            .get::<Storage>()
            .map(|storage| storage.count(item))
            .ok_or_else(|| WorldError::Rejected(format!("Entity {id} has no inventory")))
    }

    fn insert_entity_items(
        &mut self,
        id: EntityId,
        item: &str,
        count: u32,
    ) -> Result<u32, WorldError> {
        Ok(self.storage_mut(id)?.insert(item, count))
    }

    fn remove_entity_items(
        &mut self,
        id: EntityId,
        item: &str,
        count: u32,
    ) -> Result<u32, WorldError> {
        let (removed, emptied) = {
            let mut storage = self.storage_mut(id)?;
            let removed = storage.remove(item, count);
            (removed, storage.items.is_empty())
        };
        if emptied {
            let entity = self.require(id)?;
            if self.kind_of(entity) == Some(EntityKind::DroppedItem) {
                self.world.despawn(entity);
            }
        }
        Ok(removed)
    }

    fn craftable_count(&self, recipe: &str) -> Result<u32, WorldError> {
        let recipe = self.world.resource::<RecipeBook>().available(recipe)?;
        let character = self.character();
        Ok(recipe
            .ingredients
            .iter()
            .map(|(item, needed)| character.item_count(item) / (*needed).max(1))
            .min()
            .unwrap_or(0))
    }

    fn begin_crafting(&mut self, recipe: &str, count: u32) -> Result<u32, WorldError> {
        let craftable = self.craftable_count(recipe)?;
        if craftable < count {
            return Err(WorldError::Rejected(format!(
                "Missing ingredients for {count} x {recipe}"
            )));
        }
        if count == 0 {
            return Ok(0);
        }
        let (ingredients, ticks) = {
            let book = self.world.resource::<RecipeBook>();
            let entry = book.available(recipe)?;
            (entry.ingredients.clone(), entry.craft_ticks())
        };
        {
            let mut character = self.character_mut();
            for (item, needed) in &ingredients {
                character.take_items(item, needed * count);
            }
        }
        self.world.resource_mut::<CraftQueue>().jobs.push_back(CraftJob {
            recipe: recipe.to_string(),
            remaining: count,
            ticks_left: ticks,
        });
        Ok(count)
    }

    fn crafting_queue_size(&self) -> usize {
        self.world.resource::<CraftQueue>().jobs.len()
    }

    fn start_research(&mut self, technology: &str) -> Result<(), WorldError> {
        self.world.resource::<TechTree>().startable(technology)?;
        self.world.resource_mut::<ResearchProgress>().active = Some(ActiveResearch {
            name: technology.to_string(),
            elapsed: 0,
        });
        Ok(())
    }

    fn current_research(&self) -> Option<ResearchState> {
        let active = self.world.resource::<ResearchProgress>().active.as_ref()?;
        let cost = self
            .world
            .resource::<TechTree>()
            .technologies
            .get(&active.name)
            .map_or(1, |tech| tech.cost_ticks.max(1));
        Some(ResearchState {
            name: active.name.clone(),
            progress: f64::from(active.elapsed) / f64::from(cost),
        })
    }

    fn recipes(&self) -> Vec<RecipeInfo> {
        self.world.resource::<RecipeBook>().info()
    }

    fn technologies(&self) -> Vec<TechnologyInfo> {
        self.world.resource::<TechTree>().info()
    }

    fn broadcast(&mut self, message: &str) {
        self.world
            .resource_mut::<Broadcasts>()
            .0
            .push(message.to_string());
    }

    fn run_console(&mut self, source: &str) -> Result<String, WorldError> {
        let statements = console::parse(source)?;
        let output: Vec<String> = statements
            .into_iter()
            .map(|statement| self.run_statement(statement))
            .collect();
        Ok(output.join("; "))
    }

    fn poll_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.world.resource_mut::<PendingEvents>().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use systems::{MINING_TICKS, WALK_SPEED};

    #[test]
    fn walking_is_forgotten_after_a_tick() {
        let mut world = SandboxWorld::new();
        world.set_walking(Some(Direction::South));
        world.advance();
        world.advance();
        let position = world.player().position.unwrap();
        assert!((position.y - WALK_SPEED).abs() < 1e-9);
        assert_eq!(world.tick(), 2);
    }

    #[test]
    fn mining_depletes_deposit_and_reports() {
        let mut world = SandboxWorld::new();
        let target = Position::new(1.0, 0.0);
        world.spawn_resource("coal", target, 2);
        world.set_mining(Some(target));

        world.advance_by(u64::from(MINING_TICKS) * 2);
        assert_eq!(world.player_item_count("coal"), 2);
        let events = world.poll_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            WorldEvent::MiningCompleted {
                exhausted: true,
                ..
            }
        ));
        assert!(world.entities_within(target, 1.0).is_empty());
    }

    #[test]
    fn entities_come_back_nearest_first() {
        let mut world = SandboxWorld::new();
        let far = world.spawn_resource("stone", Position::new(3.0, 0.0), 5);
        let near = world.spawn_resource("stone", Position::new(1.0, 0.0), 5);
        let ids: Vec<_> = world
            .entities_within(Position::default(), 5.0)
            .into_iter()
            .map(|entity| entity.id)
            .collect();
        assert_eq!(ids, vec![near, far]);
    }

    #[test]
    fn crafting_completes_and_raises_event() {
        let mut world = SandboxWorld::new();
        world.give("iron-plate", 2);
        assert_eq!(world.begin_crafting("iron-gear-wheel", 1), Ok(1));
        world.advance_by(30);
        assert_eq!(world.player_item_count("iron-gear-wheel"), 1);
        assert_eq!(world.crafting_queue_size(), 0);
        assert_eq!(
            world.poll_events(),
            vec![WorldEvent::CraftingCompleted {
                item: "iron-gear-wheel".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn research_unlocks_recipes() {
        let mut world = SandboxWorld::new();
        world.start_research("automation").unwrap();
        world.advance_by(75);
        let progress = world.current_research().unwrap().progress;
        assert!((progress - 0.5).abs() < 1e-9);
        world.advance_by(75);
        assert!(world.current_research().is_none());
        assert!(world
            .recipes()
            .iter()
            .any(|recipe| recipe.name == "assembling-machine-1" && recipe.enabled));
        assert_eq!(
            world.start_research("automation"),
            Err(WorldError::AlreadyResearched("automation".into()))
        );
    }

    #[test]
    fn lethal_damage_kills_and_respawn_restores() {
        let mut world = SandboxWorld::new();
        world.set_walking(Some(Direction::North));
        world.damage(300.0, None);
        assert!(world.player().position.is_none());
        assert_eq!(world.poll_events(), vec![WorldEvent::Died { cause: None }]);
        world.respawn();
        assert_eq!(world.player().position, Some(Position::default()));
        assert_eq!(world.player().health, 250.0);
    }

    #[test]
    fn dropped_stacks_vanish_when_emptied() {
        let mut world = SandboxWorld::new();
        let stack = world.drop_item("stone", Position::new(0.5, 0.5), 3);
        assert_eq!(world.remove_entity_items(stack, "stone", 5), Ok(3));
        assert_eq!(
            world.entity_item_count(stack, "stone"),
            Err(WorldError::EntityGone(stack))
        );
    }

    #[test]
    fn placement_needs_clear_ground() {
        let mut world = SandboxWorld::new();
        world.give("wooden-chest", 2);
        world
            .place_entity("wooden-chest", Position::new(2.0, 2.0), Direction::North)
            .unwrap();
        assert!(matches!(
            world.place_entity("wooden-chest", Position::new(2.2, 2.0), Direction::North),
            Err(WorldError::PlacementBlocked { .. })
        ));
        assert_eq!(world.player_item_count("wooden-chest"), 1);
    }

    #[test]
    fn console_runs_each_statement() {
        let mut world = SandboxWorld::new();
        let output = world.run_console("give coal 3; teleport 4 5").unwrap();
        assert_eq!(output, "Gave 3 coal; Teleported to (4, 5)");
        assert_eq!(world.player().position, Some(Position::new(4.0, 5.0)));
    }
}
