use bridge_runtime::Invocation;
use serde_json::json;

use super::{
    optional_count, FromInvocation, HandlerContext, HandlerError, HandlerResult, Reply,
    TypedCommand,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CraftRequest {
    pub recipe: String,
    pub count: u32,
}

impl FromInvocation for CraftRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let recipe = invocation
            .text("recipe", 0)
            .ok_or_else(|| HandlerError::invalid("Missing recipe"))?;
        Ok(Self {
            recipe,
            count: optional_count(invocation, 1)?.unwrap_or(1),
        })
    }
}

/// Queue hand crafting. All requested crafts must be feasible up front.
#[derive(Debug, Clone, Copy)]
pub struct Craft;

impl TypedCommand for Craft {
    const NAME: &'static str = "craft";
    type Request = CraftRequest;

    fn run(&self, request: CraftRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        ctx.player_position()?;
        let craftable = ctx.world.craftable_count(&request.recipe)?;
        if craftable == 0 {
            return Err(HandlerError::precondition(format!(
                "Missing ingredients for {}",
                request.recipe
            )));
        }
        if craftable < request.count {
            return Err(HandlerError::precondition(format!(
                "Can only craft {craftable} of {} x {}",
                request.count, request.recipe
            )));
        }

        let queued = ctx.world.begin_crafting(&request.recipe, request.count)?;
        Ok(Reply::with_data(
            format!("Crafting {queued} x {}", request.recipe),
            json!({
                "recipe": request.recipe,
                "queued": queued,
                "queue_size": ctx.world.crafting_queue_size(),
            }),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchRequest {
    pub technology: String,
}

impl FromInvocation for ResearchRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let technology = invocation
            .text("name", 0)
            .or_else(|| invocation.text("technology", 0))
            .ok_or_else(|| HandlerError::invalid("Missing technology name"))?;
        Ok(Self { technology })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Research;

impl TypedCommand for Research {
    const NAME: &'static str = "research";
    type Request = ResearchRequest;

    fn run(&self, request: ResearchRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        ctx.world.start_research(&request.technology)?;
        Ok(Reply::with_data(
            format!("Started research: {}", request.technology),
            json!({ "technology": request.technology }),
        ))
    }
}
