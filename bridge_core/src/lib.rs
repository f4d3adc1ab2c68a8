//! Remote-control bridge for a tick-stepped simulation.
//!
//! An external controller sends one-line text commands; the bridge resolves
//! each against a [`WorldAccess`] implementation, queues one response per
//! command, relays asynchronous world events, and periodically writes a
//! state snapshot. The host drives it through [`Bridge::dispatch`] and
//! [`Bridge::step`].

pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod intents;
pub mod metrics;
pub mod queue;
pub mod registry;
pub mod relay;
pub mod sandbox;
pub mod scheduler;
pub mod session;
pub mod sink;
pub mod snapshot;
pub mod world;

pub use bridge::{Bridge, StepReport};
pub use config::{BridgeConfig, BridgeConfigError, HandlerSettings, BRIDGE_CONFIG_ENV};
pub use dispatcher::Dispatcher;
pub use handlers::{CommandHandler, HandlerContext, HandlerError, Reply, TypedCommand};
pub use intents::StandingIntents;
pub use metrics::BridgeMetrics;
pub use queue::ResponseQueue;
pub use registry::HandlerRegistry;
pub use relay::{EventRelay, RelayedEvent};
pub use sandbox::SandboxWorld;
pub use scheduler::StepScheduler;
pub use session::Session;
pub use sink::{ArtifactSink, FileSink, MemorySink, SinkError};
pub use snapshot::build_snapshot;
pub use world::{
    EntityId, EntityInfo, EntityKind, PlayerState, WireColor, WorldAccess, WorldError, WorldEvent,
};
