use bridge_runtime::Invocation;
use serde_json::json;

use super::{FromInvocation, HandlerContext, HandlerError, HandlerResult, NoArgs, Reply, TypedCommand};
use crate::world::Direction;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WalkRequest {
    Toward(Direction),
    Stop,
}

impl FromInvocation for WalkRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let raw = invocation
            .text("direction", 0)
            .ok_or_else(|| HandlerError::invalid("Missing direction"))?;
        if raw.eq_ignore_ascii_case("stop") {
            return Ok(WalkRequest::Stop);
        }
        raw.parse::<Direction>()
            .map(WalkRequest::Toward)
            .map_err(|bad| HandlerError::invalid(format!("Invalid direction: {bad}")))
    }
}

/// Start or stop sustained walking.
#[derive(Debug, Clone, Copy)]
pub struct Walk;

impl TypedCommand for Walk {
    const NAME: &'static str = "walk";
    type Request = WalkRequest;

    fn run(&self, request: WalkRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        match request {
            WalkRequest::Toward(direction) => {
                ctx.player_position()?;
                ctx.intents.set_walking(Some(direction));
                ctx.world.set_walking(Some(direction));
                Ok(Reply::with_data(
                    format!("Walking {direction}"),
                    json!({ "direction": direction }),
                ))
            }
            WalkRequest::Stop => {
                ctx.intents.set_walking(None);
                ctx.world.set_walking(None);
                Ok(Reply::new("Stopped walking"))
            }
        }
    }
}

/// Clear every standing intent.
#[derive(Debug, Clone, Copy)]
pub struct Stop;

impl TypedCommand for Stop {
    const NAME: &'static str = "stop";
    type Request = NoArgs;

    fn run(&self, _request: NoArgs, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let was_idle = ctx.intents.is_idle();
        ctx.intents.clear();
        ctx.world.set_walking(None);
        ctx.world.set_mining(None);
        if was_idle {
            Ok(Reply::new("Already idle"))
        } else {
            Ok(Reply::new("Stopped all actions"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::run;
    use crate::intents::StandingIntents;
    use crate::sandbox::SandboxWorld;
    use crate::world::Position;

    #[test]
    fn walk_sets_and_clears_intent() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();

        let reply = run(&Walk, &mut world, &mut intents, "walk direction=north").unwrap();
        assert_eq!(reply.message, "Walking north");
        assert_eq!(intents.walking(), Some(Direction::North));

        let reply = run(&Walk, &mut world, &mut intents, "walk direction=stop").unwrap();
        assert_eq!(reply.message, "Stopped walking");
        assert_eq!(intents.walking(), None);
    }

    #[test]
    fn positional_direction_is_accepted() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        run(&Walk, &mut world, &mut intents, "walk west").unwrap();
        assert_eq!(intents.walking(), Some(Direction::West));
    }

    #[test]
    fn unknown_direction_changes_nothing() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        intents.set_walking(Some(Direction::East));

        let err = run(&Walk, &mut world, &mut intents, "walk direction=up-ish").unwrap_err();
        assert_eq!(err.to_string(), "Invalid direction: up-ish");
        assert_eq!(intents.walking(), Some(Direction::East));

        let err = run(&Walk, &mut world, &mut intents, "walk").unwrap_err();
        assert_eq!(err.to_string(), "Missing direction");
    }

    #[test]
    fn stop_clears_walking_and_mining() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        intents.set_walking(Some(Direction::South));
        intents.set_mining(Some(Position::new(1.0, 1.0)));

        let reply = run(&Stop, &mut world, &mut intents, "stop").unwrap();
        assert_eq!(reply.message, "Stopped all actions");
        assert!(intents.is_idle());

        let reply = run(&Stop, &mut world, &mut intents, "stop").unwrap();
        assert_eq!(reply.message, "Already idle");
    }
}
