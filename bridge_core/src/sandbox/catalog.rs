//! Starter recipes and technologies for the sandbox.

use std::collections::BTreeMap;

use bevy_ecs::prelude::*;

use crate::world::{EntityKind, ItemAmount, RecipeInfo, TechnologyInfo, WorldError};

#[derive(Debug, Clone)]
pub struct Recipe {
    pub enabled: bool,
    /// Seconds of crafting time per craft.
    pub energy: f64,
    pub ingredients: Vec<(&'static str, u32)>,
    pub products: Vec<(&'static str, u32)>,
}

impl Recipe {
    fn new(
        energy: f64,
        ingredients: &[(&'static str, u32)],
        products: &[(&'static str, u32)],
    ) -> Self {
        Self {
            enabled: true,
            energy,
            ingredients: ingredients.to_vec(),
            products: products.to_vec(),
        }
    }

    fn locked(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn craft_ticks(&self) -> u32 {
        ((self.energy * 60.0).round() as u32).max(1)
    }
}

#[derive(Resource, Debug, Clone)]
pub struct RecipeBook {
    pub recipes: BTreeMap<String, Recipe>,
}

impl RecipeBook {
    pub fn get(&self, name: &str) -> Result<&Recipe, WorldError> {
        self.recipes
            .get(name)
            .ok_or_else(|| WorldError::UnknownRecipe(name.to_string()))
    }

    /// Known and enabled.
    pub fn available(&self, name: &str) -> Result<&Recipe, WorldError> {
        let recipe = self.get(name)?;
        if recipe.enabled {
            Ok(recipe)
        } else {
            Err(WorldError::RecipeLocked(name.to_string()))
        }
    }

    pub fn info(&self) -> Vec<RecipeInfo> {
        self.recipes
            .iter()
            .map(|(name, recipe)| RecipeInfo {
                name: name.clone(),
                enabled: recipe.enabled,
                energy: recipe.energy,
                ingredients: amounts(&recipe.ingredients),
                products: amounts(&recipe.products),
            })
            .collect()
    }
}

fn amounts(list: &[(&'static str, u32)]) -> Vec<ItemAmount> {
    list.iter()
        .map(|(name, amount)| ItemAmount::new(*name, *amount))
        .collect()
}

impl Default for RecipeBook {
    fn default() -> Self {
        let recipes = [
            ("iron-gear-wheel", Recipe::new(0.5, &[("iron-plate", 2)], &[("iron-gear-wheel", 1)])),
            ("copper-cable", Recipe::new(0.5, &[("copper-plate", 1)], &[("copper-cable", 2)])),
            (
                "electronic-circuit",
                Recipe::new(
                    0.5,
                    &[("iron-plate", 1), ("copper-cable", 3)],
                    &[("electronic-circuit", 1)],
                ),
            ),
            ("wooden-chest", Recipe::new(0.5, &[("wood", 2)], &[("wooden-chest", 1)])),
            ("iron-chest", Recipe::new(0.5, &[("iron-plate", 8)], &[("iron-chest", 1)])),
            ("stone-furnace", Recipe::new(0.5, &[("stone", 5)], &[("stone-furnace", 1)])),
            (
                "transport-belt",
                Recipe::new(
                    0.5,
                    &[("iron-plate", 1), ("iron-gear-wheel", 1)],
                    &[("transport-belt", 2)],
                ),
            ),
            (
                "inserter",
                Recipe::new(
                    0.5,
                    &[("electronic-circuit", 1), ("iron-gear-wheel", 1), ("iron-plate", 1)],
                    &[("inserter", 1)],
                ),
            ),
            (
                "small-electric-pole",
                Recipe::new(0.5, &[("wood", 1), ("copper-cable", 2)], &[("small-electric-pole", 2)]),
            ),
            (
                "assembling-machine-1",
                Recipe::new(
                    0.5,
                    &[("electronic-circuit", 3), ("iron-gear-wheel", 5), ("iron-plate", 9)],
                    &[("assembling-machine-1", 1)],
                )
                .locked(),
            ),
            (
                "long-handed-inserter",
                Recipe::new(
                    0.5,
                    &[("inserter", 1), ("iron-gear-wheel", 1), ("iron-plate", 1)],
                    &[("long-handed-inserter", 1)],
                )
                .locked(),
            ),
            (
                "underground-belt",
                Recipe::new(
                    1.0,
                    &[("iron-plate", 10), ("transport-belt", 5)],
                    &[("underground-belt", 2)],
                )
                .locked(),
            ),
            (
                "splitter",
                Recipe::new(
                    1.0,
                    &[("electronic-circuit", 5), ("iron-plate", 5), ("transport-belt", 4)],
                    &[("splitter", 1)],
                )
                .locked(),
            ),
            (
                "fast-transport-belt",
                Recipe::new(
                    0.5,
                    &[("iron-gear-wheel", 5), ("transport-belt", 1)],
                    &[("fast-transport-belt", 1)],
                )
                .locked(),
            ),
        ];
        Self {
            recipes: recipes
                .into_iter()
                .map(|(name, recipe)| (name.to_string(), recipe))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Technology {
    pub prerequisites: Vec<&'static str>,
    pub researched: bool,
    pub cost_ticks: u32,
    pub unlocks: Vec<&'static str>,
}

impl Technology {
    fn new(cost_ticks: u32, prerequisites: &[&'static str], unlocks: &[&'static str]) -> Self {
        Self {
            prerequisites: prerequisites.to_vec(),
            researched: false,
            cost_ticks,
            unlocks: unlocks.to_vec(),
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct TechTree {
    pub technologies: BTreeMap<String, Technology>,
}

impl TechTree {
    /// Checks that `name` can be started now.
    pub fn startable(&self, name: &str) -> Result<&Technology, WorldError> {
        let tech = self
            .technologies
            .get(name)
            .ok_or_else(|| WorldError::UnknownTechnology(name.to_string()))?;
        if tech.researched {
            return Err(WorldError::AlreadyResearched(name.to_string()));
        }
        let ready = tech.prerequisites.iter().all(|prerequisite| {
            self.technologies
                .get(*prerequisite)
                .is_some_and(|required| required.researched)
        });
        if !ready {
            return Err(WorldError::MissingPrerequisites(name.to_string()));
        }
        Ok(tech)
    }

    pub fn info(&self) -> Vec<TechnologyInfo> {
        self.technologies
            .iter()
            .map(|(name, tech)| TechnologyInfo {
                name: name.clone(),
                researched: tech.researched,
                prerequisites: tech.prerequisites.iter().map(|p| p.to_string()).collect(),
            })
            .collect()
    }
}

impl Default for TechTree {
    fn default() -> Self {
        let technologies = [
            (
                "automation",
                Technology::new(150, &[], &["assembling-machine-1", "long-handed-inserter"]),
            ),
            ("logistics", Technology::new(150, &[], &["underground-belt", "splitter"])),
            ("electronics", Technology::new(300, &["automation"], &[])),
            (
                "logistics-2",
                Technology::new(600, &["logistics"], &["fast-transport-belt"]),
            ),
        ];
        Self {
            technologies: technologies
                .into_iter()
                .map(|(name, tech)| (name.to_string(), tech))
                .collect(),
        }
    }
}

/// Entity kind an item turns into when placed; `None` for non-placeable items.
pub fn placed_kind(item: &str) -> Option<EntityKind> {
    let kind = match item {
        "wooden-chest" | "iron-chest" => EntityKind::Container,
        "assembling-machine-1" | "stone-furnace" => EntityKind::CraftingMachine,
        "inserter" | "long-handed-inserter" | "burner-inserter" => EntityKind::Inserter,
        "transport-belt" | "fast-transport-belt" | "underground-belt" | "splitter" => {
            EntityKind::Belt
        }
        "small-electric-pole" => EntityKind::Pole,
        _ => return None,
    };
    Some(kind)
}

/// Item capacity of a freshly placed entity's inventory.
pub fn storage_capacity(name: &str, kind: EntityKind) -> u32 {
    match (name, kind) {
        ("wooden-chest", _) => 800,
        ("iron-chest", _) => 1600,
        (_, EntityKind::CraftingMachine) => 200,
        (_, EntityKind::DroppedItem) => u32::MAX,
        _ => 800,
    }
}

/// Item yielded by mining an entity.
pub fn mined_item(name: &str, kind: EntityKind) -> String {
    match kind {
        EntityKind::Tree => "wood".to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_recipes_are_reported() {
        let book = RecipeBook::default();
        assert!(book.available("iron-gear-wheel").is_ok());
        assert_eq!(
            book.available("assembling-machine-1").unwrap_err(),
            WorldError::RecipeLocked("assembling-machine-1".into())
        );
        assert_eq!(
            book.available("warp-drive").unwrap_err(),
            WorldError::UnknownRecipe("warp-drive".into())
        );
    }

    #[test]
    fn prerequisites_gate_research() {
        let mut tree = TechTree::default();
        assert!(tree.startable("automation").is_ok());
        assert!(matches!(
            tree.startable("electronics"),
            Err(WorldError::MissingPrerequisites(_))
        ));
        if let Some(tech) = tree.technologies.get_mut("automation") {
            tech.researched = true;
        }
        assert!(tree.startable("electronics").is_ok());
        assert!(matches!(
            tree.startable("automation"),
            Err(WorldError::AlreadyResearched(_))
        ));
    }
}
