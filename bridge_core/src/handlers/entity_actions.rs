//! Point-targeted actions: each resolves the nearest qualifying entity
//! within the search radius of a coordinate before touching the world.

use bridge_runtime::Invocation;
use serde_json::json;

use super::{
    point, suffixed_point, FromInvocation, HandlerContext, HandlerError, HandlerResult, NoArgs,
    Reply, TypedCommand,
};
use crate::world::{Direction, EntityInfo, EntityKind, Position, WireColor};

/// A bare coordinate target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRequest {
    pub position: Position,
}

impl FromInvocation for PointRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let position = point(invocation, 0)
            .ok_or_else(|| HandlerError::invalid("Missing x or y coordinate"))?;
        Ok(Self { position })
    }
}

/// Two coordinates: `x1,y1` is the source, `x2,y2` the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRequest {
    pub from: Position,
    pub to: Position,
    pub color: Option<WireColor>,
}

impl FromInvocation for PairRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let (Some(from), Some(to)) = (
            suffixed_point(invocation, "1", 0),
            suffixed_point(invocation, "2", 2),
        ) else {
            return Err(HandlerError::invalid("Missing x1, y1, x2, or y2"));
        };
        let color = match invocation.text("color", 4) {
            Some(raw) => Some(
                raw.parse::<WireColor>()
                    .map_err(|bad| HandlerError::invalid(format!("Invalid wire color: {bad}")))?,
            ),
            None => None,
        };
        Ok(Self { from, to, color })
    }
}

fn is_structure(entity: &EntityInfo) -> bool {
    !matches!(
        entity.kind,
        EntityKind::Resource | EntityKind::Tree | EntityKind::DroppedItem
    )
}

fn entity_json(entity: &EntityInfo) -> serde_json::Value {
    json!({
        "id": entity.id,
        "name": entity.name,
        "x": entity.position.x,
        "y": entity.position.y,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct Mine;

impl TypedCommand for Mine {
    const NAME: &'static str = "mine";
    type Request = PointRequest;

    fn run(&self, request: PointRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        ctx.player_position()?;
        let target = ctx
            .entity_near(request.position, |entity| entity.kind.is_minable())
            .ok_or_else(|| {
                HandlerError::precondition(format!("No minable entity at {}", request.position))
            })?;
        ctx.intents.set_mining(Some(target.position));
        ctx.world.set_mining(Some(target.position));
        Ok(Reply::with_data(
            format!("Mining {}", target.label()),
            entity_json(&target),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StopMining;

impl TypedCommand for StopMining {
    const NAME: &'static str = "stop_mining";
    type Request = NoArgs;

    fn run(&self, _request: NoArgs, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        if ctx.intents.mining().is_none() {
            return Err(HandlerError::precondition("Not mining"));
        }
        ctx.intents.set_mining(None);
        ctx.world.set_mining(None);
        Ok(Reply::new("Stopped mining"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRequest {
    pub name: String,
    pub position: Position,
    pub direction: Direction,
}

impl FromInvocation for PlaceRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let (Some(name), Some(position)) = (invocation.text("name", 0), point(invocation, 1))
        else {
            return Err(HandlerError::invalid("Missing name, x, or y"));
        };
        let direction = match invocation.text("direction", 3) {
            Some(raw) => raw
                .parse::<Direction>()
                .map_err(|bad| HandlerError::invalid(format!("Invalid direction: {bad}")))?,
            None => Direction::North,
        };
        Ok(Self {
            name,
            position,
            direction,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Place;

impl TypedCommand for Place {
    const NAME: &'static str = "place";
    type Request = PlaceRequest;

    fn run(&self, request: PlaceRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        if ctx.world.player_item_count(&request.name) == 0 {
            return Err(HandlerError::precondition(format!(
                "No {} in inventory",
                request.name
            )));
        }
        let placed = ctx
            .world
            .place_entity(&request.name, request.position, request.direction)?;
        Ok(Reply::with_data(
            format!("Placed {} at {}", placed.label(), placed.position),
            entity_json(&placed),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateRequest {
    pub position: Position,
    pub reverse: bool,
}

impl FromInvocation for RotateRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let PointRequest { position } = PointRequest::from_invocation(invocation)?;
        Ok(Self {
            position,
            reverse: invocation.flag("reverse").unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rotate;

impl TypedCommand for Rotate {
    const NAME: &'static str = "rotate";
    type Request = RotateRequest;

    fn run(&self, request: RotateRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let target = ctx
            .entity_near(request.position, |entity| entity.direction.is_some())
            .ok_or_else(|| {
                HandlerError::precondition(format!("No rotatable entity at {}", request.position))
            })?;
        let facing = ctx.world.rotate_entity(target.id, request.reverse)?;
        let mut data = entity_json(&target);
        data["direction"] = json!(facing);
        Ok(Reply::with_data(
            format!("Rotated {} to {facing}", target.label()),
            data,
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Deconstruct;

impl TypedCommand for Deconstruct {
    const NAME: &'static str = "deconstruct";
    type Request = PointRequest;

    fn run(&self, request: PointRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let target = ctx
            .entity_near(request.position, |entity| {
                !matches!(entity.kind, EntityKind::Resource | EntityKind::DroppedItem)
            })
            .ok_or_else(|| {
                HandlerError::precondition(format!("No entity at {}", request.position))
            })?;
        ctx.world.order_deconstruction(target.id)?;
        Ok(Reply::with_data(
            format!("Marked {} for deconstruction", target.label()),
            entity_json(&target),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetRecipeRequest {
    pub position: Position,
    pub recipe: String,
}

impl FromInvocation for SetRecipeRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let (Some(position), Some(recipe)) = (point(invocation, 0), invocation.text("recipe", 2))
        else {
            return Err(HandlerError::invalid("Missing recipe, x, or y"));
        };
        Ok(Self { position, recipe })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SetRecipe;

impl TypedCommand for SetRecipe {
    const NAME: &'static str = "set_recipe";
    type Request = SetRecipeRequest;

    fn run(&self, request: SetRecipeRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let target = ctx
            .entity_near(request.position, |entity| {
                entity.kind == EntityKind::CraftingMachine
            })
            .ok_or_else(|| {
                HandlerError::precondition(format!("No crafting machine at {}", request.position))
            })?;
        ctx.world.set_recipe(target.id, &request.recipe)?;
        let mut data = entity_json(&target);
        data["recipe"] = json!(request.recipe);
        Ok(Reply::with_data(
            format!("Set recipe of {} to {}", target.label(), request.recipe),
            data,
        ))
    }
}

fn resolve_pair(
    ctx: &HandlerContext<'_>,
    request: &PairRequest,
) -> Result<(EntityInfo, EntityInfo), HandlerError> {
    let from = ctx
        .entity_near(request.from, is_structure)
        .ok_or_else(|| HandlerError::precondition(format!("No entity at {}", request.from)))?;
    let to = ctx
        .entity_near(request.to, is_structure)
        .ok_or_else(|| HandlerError::precondition(format!("No entity at {}", request.to)))?;
    if from.id == to.id {
        return Err(HandlerError::precondition(format!(
            "Source and destination are both {}",
            from.label()
        )));
    }
    Ok((from, to))
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectWire;

impl TypedCommand for ConnectWire {
    const NAME: &'static str = "connect_wire";
    type Request = PairRequest;

    fn run(&self, request: PairRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let color = request.color.unwrap_or(WireColor::Red);
        let (from, to) = resolve_pair(ctx, &request)?;
        ctx.world.connect_wire(from.id, to.id, color)?;
        Ok(Reply::with_data(
            format!(
                "Connected {color} wire from {} to {}",
                from.label(),
                to.label()
            ),
            json!({ "from": entity_json(&from), "to": entity_json(&to), "color": color }),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CopySettings;

impl TypedCommand for CopySettings {
    const NAME: &'static str = "copy_settings";
    type Request = PairRequest;

    fn run(&self, request: PairRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let (from, to) = resolve_pair(ctx, &request)?;
        ctx.world.copy_settings(from.id, to.id)?;
        Ok(Reply::with_data(
            format!("Copied settings from {} to {}", from.label(), to.label()),
            json!({ "from": entity_json(&from), "to": entity_json(&to) }),
        ))
    }
}
