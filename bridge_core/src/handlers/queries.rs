//! Read-only queries. None of these call a mutating world method.

use std::collections::BTreeMap;

use bridge_runtime::Invocation;
use serde::Serialize;
use serde_json::json;

use super::{
    optional_point, truncate_tenths, FromInvocation, HandlerContext, HandlerError, HandlerResult,
    NoArgs, Reply, TypedCommand,
};
use crate::world::{EntityInfo, EntityKind, Position};

/// Same-name entities aggregated into one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceCluster {
    pub name: String,
    pub count: usize,
    /// Mean member position, truncated to one decimal place.
    pub center_x: f64,
    pub center_y: f64,
    pub total_amount: u64,
}

/// Group entities by name, sorted by name.
pub fn cluster_by_name(entities: &[EntityInfo]) -> Vec<ResourceCluster> {
    let mut groups: BTreeMap<&str, (usize, f64, f64, u64)> = BTreeMap::new();
    for entity in entities {
        let group = groups.entry(entity.name.as_str()).or_default();
        group.0 += 1;
        group.1 += entity.position.x;
        group.2 += entity.position.y;
        group.3 += entity.amount.unwrap_or(0);
    }
    groups
        .into_iter()
        .map(|(name, (count, sum_x, sum_y, total_amount))| ResourceCluster {
            name: name.to_string(),
            count,
            center_x: truncate_tenths(sum_x / count as f64),
            center_y: truncate_tenths(sum_y / count as f64),
            total_amount,
        })
        .collect()
}

fn entity_record(entity: &EntityInfo) -> serde_json::Value {
    let mut record = json!({
        "id": entity.id,
        "name": entity.name,
        "kind": entity.kind,
        "x": entity.position.x,
        "y": entity.position.y,
    });
    if let Some(amount) = entity.amount {
        record["amount"] = json!(amount);
    }
    if let Some(direction) = entity.direction {
        record["direction"] = json!(direction);
    }
    record
}

#[derive(Debug, Clone, Copy)]
pub struct Status;

impl TypedCommand for Status {
    const NAME: &'static str = "status";
    type Request = NoArgs;

    fn run(&self, _request: NoArgs, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let player = ctx.world.player();
        let message = match player.position {
            Some(position) => format!("Player at {position}"),
            None => "Player has no character".to_string(),
        };
        Ok(Reply::with_data(
            message,
            json!({
                "tick": ctx.world.tick(),
                "position": player.position,
                "health": player.health,
                "max_health": player.max_health,
                "walking": ctx.intents.walking(),
                "mining": ctx.intents.mining(),
                "crafting_queue_size": ctx.world.crafting_queue_size(),
                "research": ctx.world.current_research(),
            }),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Inventory;

impl TypedCommand for Inventory {
    const NAME: &'static str = "inventory";
    type Request = NoArgs;

    fn run(&self, _request: NoArgs, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let items = ctx.world.player_inventory();
        let total: u64 = items.values().map(|count| u64::from(*count)).sum();
        Ok(Reply::with_data(
            format!("{} item types, {total} items", items.len()),
            json!(items),
        ))
    }
}

/// Area query shared by `scan` and `find_resources`.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaRequest {
    pub center: Option<Position>,
    pub radius: Option<f64>,
    pub name: Option<String>,
    pub grouped: bool,
}

impl FromInvocation for AreaRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let radius = match invocation.get("radius") {
            None => None,
            Some(value) => match value.as_f64() {
                Some(radius) if radius > 0.0 => Some(radius),
                _ => return Err(HandlerError::invalid(format!("Invalid radius: {value}"))),
            },
        };
        Ok(Self {
            center: optional_point(invocation)?,
            radius,
            name: invocation
                .get("name")
                .map(|value| value.to_text())
                .filter(|name| !name.trim().is_empty()),
            grouped: invocation.flag("group").unwrap_or(false),
        })
    }
}

impl AreaRequest {
    fn collect(
        &self,
        ctx: &HandlerContext<'_>,
        default_radius: f64,
        accept: impl Fn(&EntityInfo) -> bool,
    ) -> Result<(Position, Vec<EntityInfo>), HandlerError> {
        let center = match self.center {
            Some(center) => center,
            None => ctx.player_position()?,
        };
        let found = ctx
            .world
            .entities_within(center, self.radius.unwrap_or(default_radius))
            .into_iter()
            .filter(|entity| self.name.as_deref().map_or(true, |name| entity.name == name))
            .filter(|entity| accept(entity))
            .collect();
        Ok((center, found))
    }
}

/// Entities around a point, as a flat list or grouped by name with `group=true`.
#[derive(Debug, Clone, Copy)]
pub struct Scan;

impl TypedCommand for Scan {
    const NAME: &'static str = "scan";
    type Request = AreaRequest;

    fn run(&self, request: AreaRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let (center, mut found) = request.collect(ctx, ctx.settings.scan_radius, |_| true)?;
        let total = found.len();

        // Groups aggregate everything in range; only the flat listing is capped.
        if request.grouped {
            let groups = cluster_by_name(&found);
            return Ok(Reply::with_data(
                format!("Found {} entity types near {center}", groups.len()),
                json!({ "total": total, "groups": groups }),
            ));
        }

        found.truncate(ctx.settings.max_scan_results);
        let entities: Vec<_> = found.iter().map(entity_record).collect();
        Ok(Reply::with_data(
            format!("Found {total} entities near {center}"),
            json!({ "total": total, "truncated": total > found.len(), "entities": entities }),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FindResources;

impl TypedCommand for FindResources {
    const NAME: &'static str = "find_resources";
    type Request = AreaRequest;

    fn run(&self, request: AreaRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let (center, found) = request.collect(ctx, ctx.settings.resource_radius, |entity| {
            entity.kind == EntityKind::Resource
        })?;
        if found.is_empty() {
            return Ok(Reply::with_data(
                format!("No resources found near {center}"),
                json!([]),
            ));
        }
        let clusters = cluster_by_name(&found);
        Ok(Reply::with_data(
            format!("Found {} resource types near {center}", clusters.len()),
            json!(clusters),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListRequest {
    pub all: bool,
}

impl FromInvocation for ListRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        Ok(Self {
            all: invocation.flag("all").unwrap_or(false),
        })
    }
}

/// Enabled recipes, or every recipe with `all=true`.
#[derive(Debug, Clone, Copy)]
pub struct Recipes;

impl TypedCommand for Recipes {
    const NAME: &'static str = "recipes";
    type Request = ListRequest;

    fn run(&self, request: ListRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let recipes: Vec<_> = ctx
            .world
            .recipes()
            .into_iter()
            .filter(|recipe| request.all || recipe.enabled)
            .collect();
        Ok(Reply::with_data(
            format!("{} recipes", recipes.len()),
            json!(recipes),
        ))
    }
}

/// Technologies not yet researched, or all of them with `all=true`.
#[derive(Debug, Clone, Copy)]
pub struct Technologies;

impl TypedCommand for Technologies {
    const NAME: &'static str = "technologies";
    type Request = ListRequest;

    fn run(&self, request: ListRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let technologies: Vec<_> = ctx
            .world
            .technologies()
            .into_iter()
            .filter(|tech| request.all || !tech.researched)
            .collect();
        Ok(Reply::with_data(
            format!("{} technologies", technologies.len()),
            json!(technologies),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CurrentResearch;

impl TypedCommand for CurrentResearch {
    const NAME: &'static str = "current_research";
    type Request = NoArgs;

    fn run(&self, _request: NoArgs, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        match ctx.world.current_research() {
            Some(research) => Ok(Reply::with_data(
                format!(
                    "Researching {} ({:.0}%)",
                    research.name,
                    research.progress * 100.0
                ),
                json!(research),
            )),
            None => Ok(Reply::new("No research in progress")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerSettings;
    use crate::handlers::test_support::run;
    use crate::intents::StandingIntents;
    use crate::sandbox::SandboxWorld;
    use crate::world::WorldAccess;

    fn entity(name: &str, x: f64, y: f64, amount: u64) -> EntityInfo {
        EntityInfo {
            id: 0,
            name: name.to_string(),
            kind: EntityKind::Resource,
            position: Position::new(x, y),
            amount: Some(amount),
            direction: None,
        }
    }

    #[test]
    fn clusters_use_truncated_mean_and_summed_amount() {
        let clusters = cluster_by_name(&[
            entity("iron-ore", 0.0, 0.0, 100),
            entity("iron-ore", 2.0, 0.0, 200),
            entity("iron-ore", 4.0, 0.0, 300),
            entity("coal", 1.0, 1.0, 5),
            entity("coal", 1.0, 2.0, 5),
            entity("coal", 1.0, 2.0, 5),
        ]);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].name, "coal");
        assert_eq!(clusters[0].center_y, 1.6);
        assert_eq!(clusters[1].count, 3);
        assert_eq!(clusters[1].center_x, 2.0);
        assert_eq!(clusters[1].total_amount, 600);
    }

    #[test]
    fn find_resources_reports_clusters() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        world.spawn_resource("iron-ore", Position::new(0.0, 0.0), 100);
        world.spawn_resource("iron-ore", Position::new(2.0, 0.0), 200);
        world.spawn_resource("iron-ore", Position::new(4.0, 0.0), 300);
        world.spawn_container("wooden-chest", Position::new(1.0, 1.0), &[]);

        let reply = run(&FindResources, &mut world, &mut intents, "find_resources").unwrap();
        let data = reply.data.unwrap();
        assert_eq!(data.as_array().unwrap().len(), 1);
        assert_eq!(data[0]["count"], 3);
        assert_eq!(data[0]["center_x"], 2.0);
        assert_eq!(data[0]["total_amount"], 600);
    }

    #[test]
    fn scan_groups_on_request_and_validates_radius() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        for i in 0..3 {
            world.spawn_entity("tree", EntityKind::Tree, Position::new(i as f64, 2.0), None);
        }

        let reply = run(&Scan, &mut world, &mut intents, "scan x=0,y=0,group=true").unwrap();
        let data = reply.data.unwrap();
        assert_eq!(data["groups"][0]["name"], "tree");
        assert_eq!(data["groups"][0]["count"], 3);

        let reply = run(&Scan, &mut world, &mut intents, "scan radius=2.5").unwrap();
        assert_eq!(reply.data.unwrap()["total"], 2);

        let err = run(&Scan, &mut world, &mut intents, "scan radius=-1").unwrap_err();
        assert_eq!(err.to_string(), "Invalid radius: -1");
    }

    #[test]
    fn grouped_scan_counts_past_the_listing_cap() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        let cap = HandlerSettings::default().max_scan_results;
        let trees = cap + 50;
        for i in 0..trees {
            let x = (i % 25) as f64 * 0.5;
            let y = (i / 25) as f64 * 0.5;
            world.spawn_entity("tree", EntityKind::Tree, Position::new(x, y), None);
        }

        let reply = run(&Scan, &mut world, &mut intents, "scan x=0,y=0,radius=20,group=true").unwrap();
        let data = reply.data.unwrap();
        assert_eq!(data["total"], trees);
        assert_eq!(data["groups"][0]["count"], trees);
        assert_eq!(data["groups"][0]["center_x"], 6.0);

        let reply = run(&Scan, &mut world, &mut intents, "scan x=0,y=0,radius=20").unwrap();
        let data = reply.data.unwrap();
        assert_eq!(data["total"], trees);
        assert_eq!(data["truncated"], true);
        assert_eq!(data["entities"].as_array().unwrap().len(), cap);
    }

    #[test]
    fn queries_leave_world_untouched() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        world.give("coal", 3);
        let before = world.player_inventory();

        for handler in [&Status as &dyn crate::handlers::CommandHandler, &Inventory, &Recipes] {
            run(handler, &mut world, &mut intents, handler.name()).unwrap();
        }
        assert_eq!(world.player_inventory(), before);
        assert!(intents.is_idle());
    }

    #[test]
    fn current_research_when_idle() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        let reply = run(&CurrentResearch, &mut world, &mut intents, "current_research").unwrap();
        assert_eq!(reply.message, "No research in progress");
        assert!(reply.data.is_none());
    }

    #[test]
    fn recipe_listing_hides_locked_by_default() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        let enabled = run(&Recipes, &mut world, &mut intents, "recipes").unwrap();
        let all = run(&Recipes, &mut world, &mut intents, "recipes all=true").unwrap();
        assert!(
            all.data.unwrap().as_array().unwrap().len()
                > enabled.data.unwrap().as_array().unwrap().len()
        );
    }
}
