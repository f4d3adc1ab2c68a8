//! Command handlers.
//!
//! Each command is one type implementing [`TypedCommand`]: it declares a
//! request struct built from the [`Invocation`] (all validation happens
//! there, before the world is touched) and a `run` step that talks to the
//! world. The blanket [`CommandHandler`] impl is what the registry stores.

mod admin;
mod entity_actions;
mod inventory;
mod movement;
mod production;
mod queries;

use bridge_runtime::{capability_registry, CapabilityFlags, Invocation};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::config::HandlerSettings;
use crate::intents::StandingIntents;
use crate::world::{EntityInfo, Position, WorldAccess, WorldError};

pub use admin::{Broadcast, Execute};
pub use entity_actions::{
    ConnectWire, CopySettings, Deconstruct, Mine, Place, Rotate, SetRecipe, StopMining,
};
pub use inventory::{Pickup, Put, Take};
pub use movement::{Stop, Walk};
pub use production::{Craft, Research};
pub use queries::{
    cluster_by_name, CurrentResearch, FindResources, Inventory, Recipes, ResourceCluster, Scan,
    Status, Technologies,
};

/// Successful handler result.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub message: String,
    pub data: Option<JsonValue>,
}

impl Reply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: JsonValue) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Missing or malformed input, reported before any mutation.
    #[error("{0}")]
    Invalid(String),
    /// Target absent, unreachable, insufficient, or already in that state.
    #[error("{0}")]
    Precondition(String),
    #[error(transparent)]
    World(#[from] WorldError),
    /// Unexpected failure while executing.
    #[error("Command failed: {0}")]
    Failed(String),
}

impl HandlerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        HandlerError::Invalid(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        HandlerError::Precondition(message.into())
    }
}

pub type HandlerResult = Result<Reply, HandlerError>;

/// What a handler may touch while it runs.
pub struct HandlerContext<'a> {
    pub world: &'a mut dyn WorldAccess,
    pub intents: &'a mut StandingIntents,
    pub settings: &'a HandlerSettings,
}

impl HandlerContext<'_> {
    /// Nearest entity within the point-targeted search radius that passes `accept`.
    pub fn entity_near(
        &self,
        position: Position,
        accept: impl Fn(&EntityInfo) -> bool,
    ) -> Option<EntityInfo> {
        self.world
            .entities_within(position, self.settings.search_radius)
            .into_iter()
            .find(|entity| accept(entity))
    }

    pub fn player_position(&self) -> Result<Position, HandlerError> {
        self.world
            .player()
            .position
            .ok_or(HandlerError::World(WorldError::NoCharacter))
    }
}

/// The interface the registry and dispatcher work with.
pub trait CommandHandler {
    fn name(&self) -> &'static str;

    fn capability(&self) -> CapabilityFlags {
        capability_registry()
            .for_command(self.name())
            .map(|spec| spec.flag)
            .unwrap_or(CapabilityFlags::ACT)
    }

    fn invoke(&self, invocation: &Invocation, ctx: &mut HandlerContext<'_>) -> HandlerResult;
}

/// Validated request for one command.
pub trait FromInvocation: Sized {
    fn from_invocation(invocation: &Invocation) -> Result<Self, HandlerError>;
}

/// One command: a name, a request type, and the world-facing step.
pub trait TypedCommand {
    const NAME: &'static str;
    type Request: FromInvocation;

    fn run(&self, request: Self::Request, ctx: &mut HandlerContext<'_>) -> HandlerResult;
}

impl<T: TypedCommand> CommandHandler for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn invoke(&self, invocation: &Invocation, ctx: &mut HandlerContext<'_>) -> HandlerResult {
        let request = T::Request::from_invocation(invocation)?;
        self.run(request, ctx)
    }
}

/// Commands that take no arguments.
#[derive(Debug, Clone, Copy)]
pub struct NoArgs;

impl FromInvocation for NoArgs {
    fn from_invocation(_invocation: &Invocation) -> Result<Self, HandlerError> {
        Ok(NoArgs)
    }
}

/// Every built-in handler, privileged ones included.
pub fn builtin_handlers() -> Vec<Box<dyn CommandHandler>> {
    vec![
        Box::new(Walk),
        Box::new(Stop),
        Box::new(Mine),
        Box::new(StopMining),
        Box::new(Place),
        Box::new(Rotate),
        Box::new(Deconstruct),
        Box::new(SetRecipe),
        Box::new(ConnectWire),
        Box::new(CopySettings),
        Box::new(Put),
        Box::new(Take),
        Box::new(Pickup),
        Box::new(Craft),
        Box::new(Research),
        Box::new(Status),
        Box::new(Inventory),
        Box::new(Scan),
        Box::new(FindResources),
        Box::new(Recipes),
        Box::new(Technologies),
        Box::new(CurrentResearch),
        Box::new(Execute),
        Box::new(Broadcast),
    ]
}

/// `x`/`y` with positional fallback at `first`/`first + 1`.
pub(crate) fn point(invocation: &Invocation, first: usize) -> Option<Position> {
    let x = invocation.number("x", first)?;
    let y = invocation.number("y", first + 1)?;
    Some(Position::new(x, y))
}

/// Like [`point`] but for suffixed keys such as `x1`/`y1`.
pub(crate) fn suffixed_point(invocation: &Invocation, suffix: &str, first: usize) -> Option<Position> {
    let x = invocation.number(&format!("x{suffix}"), first)?;
    let y = invocation.number(&format!("y{suffix}"), first + 1)?;
    Some(Position::new(x, y))
}

/// Optional explicit center: both coordinates or neither.
pub(crate) fn optional_point(invocation: &Invocation) -> Result<Option<Position>, HandlerError> {
    match (invocation.number("x", 0), invocation.number("y", 1)) {
        (Some(x), Some(y)) => Ok(Some(Position::new(x, y))),
        (None, None) => Ok(None),
        _ => Err(HandlerError::invalid("Missing x or y coordinate")),
    }
}

/// Optional positive count; zero and non-numeric values are rejected.
pub(crate) fn optional_count(
    invocation: &Invocation,
    position: usize,
) -> Result<Option<u32>, HandlerError> {
    match invocation.field("count", position) {
        None => Ok(None),
        Some(value) => match value.as_count() {
            Some(count) if count > 0 => Ok(Some(count)),
            _ => Err(HandlerError::invalid(format!("Invalid count: {value}"))),
        },
    }
}

/// Round toward zero at one decimal place.
pub(crate) fn truncate_tenths(value: f64) -> f64 {
    (value * 10.0).trunc() / 10.0
}


#[cfg(test)]
mod tests {
    use super::*;
    use bridge_runtime::parse_command_line;

    #[test]
    fn builtin_names_are_unique_and_catalogued() {
        let mut seen = std::collections::HashSet::new();
        for handler in builtin_handlers() {
            assert!(seen.insert(handler.name()), "duplicate {}", handler.name());
            assert!(
                capability_registry().for_command(handler.name()).is_some(),
                "{} has no capability entry",
                handler.name()
            );
        }
    }

    #[test]
    fn privileged_handlers_report_their_flags() {
        assert_eq!(Execute.capability(), CapabilityFlags::EXECUTE);
        assert_eq!(Broadcast.capability(), CapabilityFlags::BROADCAST);
        assert_eq!(Scan.capability(), CapabilityFlags::QUERY);
    }

    #[test]
    fn optional_point_needs_both_coordinates() {
        let both = parse_command_line("scan x=1,y=2").unwrap();
        assert_eq!(optional_point(&both).unwrap(), Some(Position::new(1.0, 2.0)));
        let neither = parse_command_line("scan radius=4").unwrap();
        assert_eq!(optional_point(&neither).unwrap(), None);
        let half = parse_command_line("scan x=1").unwrap();
        assert_eq!(
            optional_point(&half).unwrap_err().to_string(),
            "Missing x or y coordinate"
        );
    }

    #[test]
    fn truncation_is_toward_zero() {
        assert_eq!(truncate_tenths(2.0), 2.0);
        assert_eq!(truncate_tenths(1.66), 1.6);
        assert_eq!(truncate_tenths(-1.66), -1.6);
    }
}
