use bridge_runtime::{Response, Status};
use serde::Serialize;

/// Running counters for one bridge instance.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeMetrics {
    pub commands_dispatched: u64,
    pub command_errors: u64,
    pub events_relayed: u64,
    /// Out-of-cadence flushes, at most one per step or relay call.
    pub urgent_flushes: u64,
    pub response_flushes: u64,
    pub snapshots_emitted: u64,
    pub sink_failures: u64,
    pub steps: u64,
}

impl BridgeMetrics {
    pub fn record_dispatch(&mut self, response: &Response) {
        self.commands_dispatched += 1;
        if response.status == Status::Error {
            self.command_errors += 1;
        }
    }

    pub fn record_event(&mut self) {
        self.events_relayed += 1;
    }
}
