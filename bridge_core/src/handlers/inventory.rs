use std::collections::BTreeMap;

use bridge_runtime::Invocation;
use serde_json::json;

use super::{
    optional_count, point, FromInvocation, HandlerContext, HandlerError, HandlerResult, Reply,
    TypedCommand,
};
use crate::world::{EntityInfo, EntityKind, Position};

/// `item`, `x`, `y` and an optional `count`; no count means "everything".
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub item: String,
    pub position: Position,
    pub count: Option<u32>,
}

impl FromInvocation for TransferRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let (Some(item), Some(position)) = (invocation.text("item", 0), point(invocation, 1))
        else {
            return Err(HandlerError::invalid("Missing item, x, or y"));
        };
        Ok(Self {
            item,
            position,
            count: optional_count(invocation, 3)?,
        })
    }
}

impl TransferRequest {
    fn amount(&self, available: u32) -> u32 {
        self.count.map_or(available, |count| count.min(available))
    }
}

fn storage_near(ctx: &HandlerContext<'_>, position: Position) -> Result<EntityInfo, HandlerError> {
    ctx.entity_near(position, |entity| {
        entity.kind.has_inventory() && entity.kind != EntityKind::DroppedItem
    })
    .ok_or_else(|| HandlerError::precondition(format!("No container at {position}")))
}

/// Move items from the player into a container or machine.
#[derive(Debug, Clone, Copy)]
pub struct Put;

impl TypedCommand for Put {
    const NAME: &'static str = "put";
    type Request = TransferRequest;

    fn run(&self, request: TransferRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let target = storage_near(ctx, request.position)?;
        let available = ctx.world.player_item_count(&request.item);
        if available == 0 {
            return Err(HandlerError::precondition(format!(
                "No {} in inventory",
                request.item
            )));
        }

        let amount = request.amount(available);
        let removed = ctx.world.remove_player_items(&request.item, amount)?;
        let inserted = match ctx.world.insert_entity_items(target.id, &request.item, removed) {
            Ok(inserted) => inserted,
            Err(err) => {
                ctx.world.insert_player_items(&request.item, removed)?;
                return Err(err.into());
            }
        };
        if inserted < removed {
            ctx.world
                .insert_player_items(&request.item, removed - inserted)?;
        }

        Ok(Reply::with_data(
            format!("Inserted {inserted} {} into {}", request.item, target.label()),
            json!({
                "item": request.item,
                "requested": request.count.unwrap_or(available),
                "transferred": inserted,
                "entity": target.label(),
            }),
        ))
    }
}

/// Move items from a container or machine into the player inventory.
/// Finding none is still a success with a transferred count of zero.
#[derive(Debug, Clone, Copy)]
pub struct Take;

impl TypedCommand for Take {
    const NAME: &'static str = "take";
    type Request = TransferRequest;

    fn run(&self, request: TransferRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let target = storage_near(ctx, request.position)?;
        let available = ctx.world.entity_item_count(target.id, &request.item)?;
        let amount = request.amount(available);

        let mut taken = 0;
        if amount > 0 {
            let removed = ctx
                .world
                .remove_entity_items(target.id, &request.item, amount)?;
            taken = ctx.world.insert_player_items(&request.item, removed)?;
            if taken < removed {
                ctx.world
                    .insert_entity_items(target.id, &request.item, removed - taken)?;
            }
        }

        Ok(Reply::with_data(
            format!("Took {taken} {} from {}", request.item, target.label()),
            json!({
                "item": request.item,
                "requested": request.count.unwrap_or(available),
                "transferred": taken,
                "entity": target.label(),
            }),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickupRequest {
    pub item: Option<String>,
    pub count: Option<u32>,
}

impl FromInvocation for PickupRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        Ok(Self {
            item: invocation.text("item", 0),
            count: optional_count(invocation, 1)?,
        })
    }
}

/// Collect dropped items lying around the player.
#[derive(Debug, Clone, Copy)]
pub struct Pickup;

impl TypedCommand for Pickup {
    const NAME: &'static str = "pickup";
    type Request = PickupRequest;

    fn run(&self, request: PickupRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let origin = ctx.player_position()?;
        let stacks: Vec<EntityInfo> = ctx
            .world
            .entities_within(origin, ctx.settings.pickup_radius)
            .into_iter()
            .filter(|entity| entity.kind == EntityKind::DroppedItem)
            .filter(|entity| request.item.as_deref().map_or(true, |item| entity.name == item))
            .collect();

        let mut budget = request.count.unwrap_or(u32::MAX);
        let mut total = 0u32;
        let mut collected: BTreeMap<String, u32> = BTreeMap::new();
        for stack in stacks {
            if budget == 0 {
                break;
            }
            let available = ctx.world.entity_item_count(stack.id, &stack.name)?;
            let amount = available.min(budget);
            if amount == 0 {
                continue;
            }
            let removed = ctx.world.remove_entity_items(stack.id, &stack.name, amount)?;
            let inserted = ctx.world.insert_player_items(&stack.name, removed)?;
            if inserted < removed {
                ctx.world
                    .insert_entity_items(stack.id, &stack.name, removed - inserted)?;
            }
            budget -= inserted.min(budget);
            total += inserted;
            *collected.entry(stack.name).or_default() += inserted;
        }

        Ok(Reply::with_data(
            format!("Picked up {total} items"),
            json!({ "total": total, "items": collected }),
        ))
    }
}
