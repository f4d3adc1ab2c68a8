use bevy_ecs::prelude::*;

use super::catalog::{mined_item, RecipeBook, TechTree};
use super::components::{
    Character, Clock, CraftQueue, Deposit, MiningProgress, PendingEvents, Placement, Prototype,
    ResearchProgress, Storage, UnitNumber,
};
use crate::world::WorldEvent;

/// Tiles moved per tick while walking.
pub const WALK_SPEED: f64 = 0.15;
/// Ticks to mine one item.
pub const MINING_TICKS: u32 = 30;
/// How close the mined entity must be to the mining target.
const MINING_SNAP: f64 = 0.5;

pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            walk_character,
            progress_mining,
            progress_crafting,
            progress_research,
            advance_clock,
        )
            .chain(),
    );
    schedule
}

/// Move one step, then drop the walking state.
pub fn walk_character(mut character: ResMut<Character>) {
    if let Some(direction) = character.walking.take() {
        if character.alive {
            let (dx, dy) = direction.unit_vector();
            character.position = character.position.offset(dx * WALK_SPEED, dy * WALK_SPEED);
        }
    }
}

#[allow(clippy::type_complexity)]
pub fn progress_mining(
    mut commands: Commands,
    mut character: ResMut<Character>,
    mut events: ResMut<PendingEvents>,
    mut targets: Query<(
        Entity,
        &UnitNumber,
        &Prototype,
        &Placement,
        Option<&mut Deposit>,
        Option<&Storage>,
    )>,
) {
    if !character.alive {
        return;
    }
    let Some(mut progress) = character.mining else {
        return;
    };
    progress.ticks += 1;
    if progress.ticks < MINING_TICKS {
        character.mining = Some(progress);
        return;
    }

    let target = targets
        .iter_mut()
        .filter(|(_, _, prototype, placement, _, _)| {
            prototype.kind.is_minable() && placement.0.distance(&progress.target) <= MINING_SNAP
        })
        .min_by(|a, b| {
            let da = a.3 .0.distance_sq(&progress.target);
            let db = b.3 .0.distance_sq(&progress.target);
            da.total_cmp(&db).then(a.1 .0.cmp(&b.1 .0))
        });
    let Some((entity, unit, prototype, placement, deposit, storage)) = target else {
        character.mining = None;
        return;
    };

    let item = mined_item(&prototype.name, prototype.kind);
    let exhausted = match deposit {
        Some(mut deposit) => {
            deposit.amount = deposit.amount.saturating_sub(1);
            deposit.amount == 0
        }
        None => true,
    };
    if exhausted {
        if let Some(storage) = storage {
            for (name, count) in &storage.items {
                character.add_items(name, *count);
            }
        }
        commands.entity(entity).despawn();
    }
    character.add_items(&item, 1);
    character.mining = if exhausted {
        None
    } else {
        Some(MiningProgress {
            target: progress.target,
            ticks: 0,
        })
    };
    events.0.push(WorldEvent::MiningCompleted {
        entity: format!("{} #{}", prototype.name, unit.0),
        position: placement.0,
        item,
        count: 1,
        exhausted,
    });
}

pub fn progress_crafting(
    mut queue: ResMut<CraftQueue>,
    mut character: ResMut<Character>,
    mut events: ResMut<PendingEvents>,
    book: Res<RecipeBook>,
) {
    let Some(job) = queue.jobs.front_mut() else {
        return;
    };
    job.ticks_left = job.ticks_left.saturating_sub(1);
    if job.ticks_left > 0 {
        return;
    }

    let recipe = book.recipes.get(&job.recipe);
    if let Some(recipe) = recipe {
        for (product, count) in &recipe.products {
            character.add_items(product, *count);
            events.0.push(WorldEvent::CraftingCompleted {
                item: product.to_string(),
                count: *count,
            });
        }
    }
    job.remaining = job.remaining.saturating_sub(1);
    if job.remaining == 0 || recipe.is_none() {
        queue.jobs.pop_front();
    } else if let Some(recipe) = recipe {
        job.ticks_left = recipe.craft_ticks();
    }
}

pub fn progress_research(
    mut research: ResMut<ResearchProgress>,
    mut tree: ResMut<TechTree>,
    mut book: ResMut<RecipeBook>,
    mut events: ResMut<PendingEvents>,
) {
    let Some(active) = research.active.as_mut() else {
        return;
    };
    active.elapsed += 1;
    let Some(tech) = tree.technologies.get_mut(&active.name) else {
        research.active = None;
        return;
    };
    if active.elapsed < tech.cost_ticks {
        return;
    }

    tech.researched = true;
    for recipe in &tech.unlocks {
        if let Some(recipe) = book.recipes.get_mut(*recipe) {
            recipe.enabled = true;
        }
    }
    events.0.push(WorldEvent::ResearchCompleted {
        name: active.name.clone(),
    });
    research.active = None;
}

pub fn advance_clock(mut clock: ResMut<Clock>) {
    clock.0 = clock.0.wrapping_add(1);
}
