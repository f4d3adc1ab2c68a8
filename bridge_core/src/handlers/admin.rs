//! Privileged escape hatches. Registered only when the deployment opts in
//! through the `admin.execute` / `admin.broadcast` capabilities.

use bridge_runtime::Invocation;
use serde_json::json;

use super::{FromInvocation, HandlerContext, HandlerError, HandlerResult, Reply, TypedCommand};

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteRequest {
    pub code: String,
}

impl FromInvocation for ExecuteRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let code = invocation
            .text("code", 0)
            .ok_or_else(|| HandlerError::invalid("Missing code"))?;
        Ok(Self { code })
    }
}

/// Hand a source string to the world's console evaluator.
#[derive(Debug, Clone, Copy)]
pub struct Execute;

impl TypedCommand for Execute {
    const NAME: &'static str = "execute";
    type Request = ExecuteRequest;

    fn run(&self, request: ExecuteRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let output = ctx
            .world
            .run_console(&request.code)
            .map_err(|err| HandlerError::Failed(err.to_string()))?;
        let message = if output.is_empty() {
            "Executed".to_string()
        } else {
            output.clone()
        };
        Ok(Reply::with_data(message, json!({ "output": output })))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastRequest {
    pub message: String,
}

impl FromInvocation for BroadcastRequest {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError> {
        let message = invocation
            .text("message", 0)
            .ok_or_else(|| HandlerError::invalid("Missing message"))?;
        Ok(Self { message })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Broadcast;

impl TypedCommand for Broadcast {
    const NAME: &'static str = "broadcast";
    type Request = BroadcastRequest;

    fn run(&self, request: BroadcastRequest, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        ctx.world.broadcast(&request.message);
        Ok(Reply::new("Broadcast sent"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::run;
    use crate::intents::StandingIntents;
    use crate::sandbox::SandboxWorld;
    use crate::world::WorldAccess;

    #[test]
    fn execute_runs_console_statements() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();

        let reply = run(&Execute, &mut world, &mut intents, "execute code=give coal 7").unwrap();
        assert_eq!(reply.message, "Gave 7 coal");
        assert_eq!(world.player_item_count("coal"), 7);
    }

    #[test]
    fn console_failures_are_execution_failures() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();

        let err = run(&Execute, &mut world, &mut intents, "execute code=explode").unwrap_err();
        assert!(matches!(err, HandlerError::Failed(_)));
        assert!(err.to_string().starts_with("Command failed: "));

        let err = run(&Execute, &mut world, &mut intents, "execute").unwrap_err();
        assert_eq!(err.to_string(), "Missing code");
    }

    #[test]
    fn broadcast_reaches_world() {
        let mut world = SandboxWorld::new();
        let mut intents = StandingIntents::default();
        run(&Broadcast, &mut world, &mut intents, "broadcast message=hello base").unwrap();
        assert_eq!(world.broadcasts(), ["hello base".to_string()]);
    }
}
