use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use bridge_runtime::{parse_command_line, Outcome};
use tracing::warn;

use crate::config::HandlerSettings;
use crate::handlers::{HandlerContext, HandlerError};
use crate::intents::StandingIntents;
use crate::registry::HandlerRegistry;
use crate::world::WorldAccess;

/// Resolves one command line to exactly one [`Outcome`].
///
/// Nothing a handler does escapes this boundary: errors become error
/// outcomes and panics are caught and reported as execution failures.
pub struct Dispatcher {
    registry: HandlerRegistry,
    settings: HandlerSettings,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, settings: HandlerSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    pub fn settings(&self) -> &HandlerSettings {
        &self.settings
    }

    pub fn execute(
        &self,
        line: &str,
        world: &mut dyn WorldAccess,
        intents: &mut StandingIntents,
    ) -> Outcome {
        let invocation = match parse_command_line(line) {
            Ok(invocation) => invocation,
            Err(err) => return Outcome::error(err.to_string()),
        };
        let Some(handler) = self.registry.get(invocation.name()) else {
            return Outcome::error(format!("Unknown command: {}", invocation.literal_name()));
        };

        let mut ctx = HandlerContext {
            world,
            intents,
            settings: &self.settings,
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.invoke(&invocation, &mut ctx)
        }));

        match result {
            Ok(Ok(reply)) => Outcome::from_reply(true, reply.message, reply.data),
            Ok(Err(err)) => Outcome::from_reply(false, err.to_string(), None),
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                warn!(
                    target: "sim_bridge::dispatch",
                    command = invocation.name(),
                    detail = %detail,
                    "handler.panicked"
                );
                Outcome::error(HandlerError::Failed(detail).to_string())
            }
        }
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
