//! Shared runtime contracts for the simulation bridge.
//!
//! This crate holds everything that does not need a live world: the command
//! line and argument parsers, the response and snapshot artifact types, and
//! the capability registry used to gate privileged commands. The engine in
//! `bridge_core` builds on these types.

pub mod args;
pub mod capabilities;
pub mod command_text;
pub mod responses;
pub mod schema;
pub mod snapshot;
pub mod spatial;
pub mod value;

pub use args::{parse_args, ParsedArgs};
pub use capabilities::{
    capability_registry, CapabilityFlags, CapabilityRegistry, CapabilitySpec,
    CapabilityValidationError,
};
pub use command_text::{parse_command_line, CommandLineError, Invocation};
pub use responses::{Outcome, Response, Status, EVENT_RESPONSE_ID};
pub use snapshot::{PlayerSnapshot, ResearchSnapshot, Snapshot};
pub use spatial::{Direction, Position};
pub use value::Value;
