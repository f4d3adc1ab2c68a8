//! JSON Schemas describing the external artifacts.

use schemars::schema::RootSchema;

use crate::responses::Response;
use crate::snapshot::Snapshot;

/// Schema for the response artifact: an array of responses.
pub fn responses_schema() -> RootSchema {
    schemars::schema_for!(Vec<Response>)
}

pub fn snapshot_schema() -> RootSchema {
    schemars::schema_for!(Snapshot)
}
