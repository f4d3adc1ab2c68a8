//! The two entry points a host calls: [`Bridge::dispatch`] once per
//! external command line and [`Bridge::step`] once per simulation tick.
//! The host guarantees the two never overlap.

use bridge_runtime::Response;
use tracing::{debug, error, info};

use crate::config::{BridgeConfig, BridgeConfigError};
use crate::dispatcher::Dispatcher;
use crate::metrics::BridgeMetrics;
use crate::registry::HandlerRegistry;
use crate::relay::EventRelay;
use crate::scheduler::StepScheduler;
use crate::session::Session;
use crate::sink::{ArtifactSink, SinkError};
use crate::snapshot::build_snapshot;
use crate::world::{WorldAccess, WorldEvent};

/// What one call to [`Bridge::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    pub tick: u64,
    pub events_relayed: usize,
    pub urgent_flush: bool,
    pub snapshot_emitted: bool,
}

pub struct Bridge<S: ArtifactSink> {
    dispatcher: Dispatcher,
    scheduler: StepScheduler,
    relay: EventRelay,
    session: Session,
    sink: S,
    metrics: BridgeMetrics,
    flush_on_dispatch: bool,
}

impl<S: ArtifactSink> Bridge<S> {
    /// Build with the built-in handlers the config's capabilities allow.
    pub fn new(config: &BridgeConfig, sink: S) -> Result<Self, BridgeConfigError> {
        let registry = HandlerRegistry::with_defaults(config.capabilities()?);
        Ok(Self::with_registry(config, registry, sink))
    }

    pub fn with_registry(config: &BridgeConfig, registry: HandlerRegistry, sink: S) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry, config.handlers.clone()),
            scheduler: StepScheduler::new(config.snapshot_cadence()),
            relay: EventRelay::new(),
            session: Session::new(),
            sink,
            metrics: BridgeMetrics::default(),
            flush_on_dispatch: config.flush_on_dispatch,
        }
    }

    /// Resolve one command line into exactly one queued [`Response`].
    ///
    /// Artifact write failures are reported to the operator through the log
    /// and metrics; the caller still gets its response.
    pub fn dispatch(&mut self, world: &mut dyn WorldAccess, line: &str) -> Response {
        let id = self.session.issue_id();
        let outcome = self
            .dispatcher
            .execute(line, world, &mut self.session.intents);
        let response = self.session.record(id, world.tick(), outcome).clone();
        self.metrics.record_dispatch(&response);
        info!(
            target: "sim_bridge::dispatch",
            id = response.id,
            tick = response.step,
            status = ?response.status,
            message = %response.message,
            "command.dispatched"
        );

        if self.flush_on_dispatch {
            // Failure is already logged and counted; the queue keeps the entry.
            let _ = self.flush_responses();
        }
        response
    }

    /// Per-tick work, in order: re-assert standing intents, relay pending
    /// world events (flushing once if any was urgent), then emit the
    /// periodic snapshot when the cadence is reached.
    ///
    /// Every phase runs even if an earlier write failed; the first write
    /// error is returned after the step completes.
    pub fn step(&mut self, world: &mut dyn WorldAccess) -> Result<StepReport, SinkError> {
        let tick = world.tick();
        self.metrics.steps += 1;
        self.session.intents.reassert(world);

        let mut report = StepReport {
            tick,
            ..StepReport::default()
        };
        let mut first_error = None;

        for event in world.poll_events() {
            report.urgent_flush |= self.enqueue_event(tick, &event);
            report.events_relayed += 1;
        }
        if report.urgent_flush {
            self.metrics.urgent_flushes += 1;
            if let Err(err) = self.flush_responses() {
                first_error.get_or_insert(err);
            }
        }

        if self.scheduler.advance() {
            match self.emit_snapshot(world) {
                Ok(()) => report.snapshot_emitted = true,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Push one world event through the relay outside the regular step,
    /// for hosts that deliver notifications by callback.
    pub fn relay(&mut self, world: &dyn WorldAccess, event: &WorldEvent) -> Result<(), SinkError> {
        if self.enqueue_event(world.tick(), event) {
            self.metrics.urgent_flushes += 1;
            self.flush_responses()?;
        }
        Ok(())
    }

    fn enqueue_event(&mut self, tick: u64, event: &WorldEvent) -> bool {
        let relayed = self.relay.relay(event, &mut self.session.intents);
        self.metrics.record_event();
        debug!(
            target: "sim_bridge::relay",
            tick,
            urgent = relayed.urgent,
            message = %relayed.outcome.message,
            "event.relayed"
        );
        self.session.record_event(tick, relayed.outcome);
        relayed.urgent
    }

    /// Write the whole queue to the response artifact, then clear what was
    /// written. Returns the number of responses written.
    pub fn flush_responses(&mut self) -> Result<usize, SinkError> {
        let count = self.session.queue.len();
        match self.sink.write_responses(self.session.queue.entries()) {
            Ok(()) => {
                self.session.queue.clear_through(count);
                self.metrics.response_flushes += 1;
                debug!(target: "sim_bridge::sink", count, "responses.flushed");
                Ok(count)
            }
            Err(err) => {
                self.metrics.sink_failures += 1;
                error!(
                    target: "sim_bridge::sink",
                    artifact = "responses",
                    pending = count,
                    error = %err,
                    "sink.write_failed"
                );
                Err(err)
            }
        }
    }

    /// Write a snapshot carrying the queued responses, then clear them.
    pub fn emit_snapshot(&mut self, world: &dyn WorldAccess) -> Result<(), SinkError> {
        let snapshot = build_snapshot(world, &self.session.intents, &self.session.queue);
        let count = snapshot.responses.len();
        match self.sink.write_snapshot(&snapshot) {
            Ok(()) => {
                self.session.queue.clear_through(count);
                self.metrics.snapshots_emitted += 1;
                info!(
                    target: "sim_bridge::scheduler",
                    tick = snapshot.tick,
                    responses = count,
                    "snapshot.emitted"
                );
                Ok(())
            }
            Err(err) => {
                self.metrics.sink_failures += 1;
                error!(
                    target: "sim_bridge::sink",
                    artifact = "snapshot",
                    pending = count,
                    error = %err,
                    "sink.write_failed"
                );
                Err(err)
            }
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn scheduler(&self) -> &StepScheduler {
        &self.scheduler
    }

    pub fn metrics(&self) -> &BridgeMetrics {
        &self.metrics
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Final flush of anything still queued, handing the sink back.
    pub fn shutdown(mut self) -> Result<S, SinkError> {
        if !self.session.queue.is_empty() {
            self.flush_responses()?;
        }
        info!(
            target: "sim_bridge::dispatch",
            commands = self.metrics.commands_dispatched,
            events = self.metrics.events_relayed,
            snapshots = self.metrics.snapshots_emitted,
            "bridge.shutdown"
        );
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;
    use crate::sink::MemorySink;
    use crate::world::{Direction, Position};
    use bridge_runtime::Status;

    fn bridge(flush_on_dispatch: bool) -> Bridge<MemorySink> {
        let config = BridgeConfig {
            flush_on_dispatch,
            snapshot_cadence: 5,
            ..BridgeConfig::default()
        };
        Bridge::new(&config, MemorySink::new()).unwrap()
    }

    #[test]
    fn ids_increase_across_error_paths() {
        let mut world = SandboxWorld::new();
        let mut bridge = bridge(false);
        let ids: Vec<u64> = ["status", "bogus", "", "walk direction=sideways", "inventory"]
            .into_iter()
            .map(|line| bridge.dispatch(&mut world, line).id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(bridge.session().queue.len(), 5);
        assert_eq!(bridge.metrics().command_errors, 3);
    }

    #[test]
    fn dispatch_flush_clears_queue() {
        let mut world = SandboxWorld::new();
        let mut bridge = bridge(true);
        bridge.dispatch(&mut world, "walk direction=north");
        assert!(bridge.session().queue.is_empty());
        let written = bridge.sink().last_responses().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].message, "Walking north");

        bridge.flush_responses().unwrap();
        assert_eq!(bridge.sink().last_responses().unwrap().len(), 0);
    }

    #[test]
    fn failed_write_keeps_responses_queued() {
        let mut world = SandboxWorld::new();
        let mut bridge = bridge(true);
        bridge.sink_mut().set_failing(true);
        let response = bridge.dispatch(&mut world, "status");
        assert_eq!(response.status, Status::Ok);
        assert_eq!(bridge.session().queue.len(), 1);
        assert_eq!(bridge.metrics().sink_failures, 1);

        bridge.sink_mut().set_failing(false);
        bridge.dispatch(&mut world, "inventory");
        let written = bridge.sink().last_responses().unwrap();
        assert_eq!(written.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn step_reasserts_walking_every_tick() {
        let mut world = SandboxWorld::new();
        let mut bridge = bridge(false);
        bridge.dispatch(&mut world, "walk direction=east");
        for _ in 0..10 {
            world.advance();
            bridge.step(&mut world).unwrap();
        }
        let position = world.player().position.unwrap();
        assert!(position.x > 1.0, "walked to {position}");
        assert_eq!(bridge.session().intents.walking(), Some(Direction::East));
    }

    #[test]
    fn snapshot_drains_queue_on_cadence() {
        let mut world = SandboxWorld::new();
        let mut bridge = bridge(false);
        bridge.dispatch(&mut world, "status");
        for _ in 0..4 {
            assert!(!bridge.step(&mut world).unwrap().snapshot_emitted);
        }
        assert!(bridge.step(&mut world).unwrap().snapshot_emitted);
        assert!(bridge.session().queue.is_empty());
        assert_eq!(bridge.sink().last_snapshot().unwrap().responses.len(), 1);

        for _ in 0..5 {
            bridge.step(&mut world).unwrap();
        }
        assert!(bridge.sink().last_snapshot().unwrap().responses.is_empty());
    }

    #[test]
    fn death_flushes_immediately_and_clears_intents() {
        let mut world = SandboxWorld::new();
        let mut bridge = bridge(false);
        world.spawn_resource("stone", Position::new(0.5, 0.5), 100);
        bridge.dispatch(&mut world, "walk direction=south");
        bridge.dispatch(&mut world, "mine x=0.5,y=0.5");
        world.damage(500.0, Some("train".to_string()));

        let report = bridge.step(&mut world).unwrap();
        assert!(report.urgent_flush);
        assert!(!report.snapshot_emitted);
        assert!(bridge.session().intents.is_idle());
        let written = bridge.sink().last_responses().unwrap();
        let last = written.last().unwrap();
        assert_eq!(last.status, Status::Event);
        assert_eq!(last.id, 0);
        assert_eq!(last.message, "Player died: train");
    }

    #[test]
    fn urgent_flush_runs_before_snapshot_on_the_same_step() {
        let config = BridgeConfig {
            flush_on_dispatch: false,
            snapshot_cadence: 1,
            ..BridgeConfig::default()
        };
        let mut bridge = Bridge::new(&config, MemorySink::new()).unwrap();
        let mut world = SandboxWorld::new();
        bridge.dispatch(&mut world, "status");
        world.start_research("automation").unwrap();
        world.advance_by(150);
        world.damage(500.0, Some("train".to_string()));

        let report = bridge.step(&mut world).unwrap();
        assert!(report.urgent_flush);
        assert!(report.snapshot_emitted);
        assert_eq!(report.events_relayed, 2);
        assert_eq!(bridge.metrics().urgent_flushes, 1);

        let written = bridge.sink().last_responses().unwrap();
        let messages: Vec<&str> = written.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("Player at"));
        assert_eq!(messages[1], "Research completed: automation");
        assert_eq!(messages[2], "Player died: train");
        let snapshot = bridge.sink().last_snapshot().unwrap();
        assert!(snapshot.responses.is_empty());
        assert!(snapshot.player.position.is_none());
    }

    #[test]
    fn relay_flushes_only_urgent_events() {
        let mut world = SandboxWorld::new();
        let mut bridge = bridge(false);
        bridge.dispatch(&mut world, "inventory");

        let crafted = WorldEvent::CraftingCompleted {
            item: "iron-gear-wheel".to_string(),
            count: 1,
        };
        bridge.relay(&world, &crafted).unwrap();
        assert!(bridge.sink().response_writes().is_empty());
        assert_eq!(bridge.session().queue.len(), 2);

        let researched = WorldEvent::ResearchCompleted {
            name: "logistics".to_string(),
        };
        bridge.relay(&world, &researched).unwrap();
        assert!(bridge.session().queue.is_empty());
        let written = bridge.sink().last_responses().unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(written[2].message, "Research completed: logistics");
        assert_eq!(written[2].id, 0);
        assert_eq!(bridge.metrics().urgent_flushes, 1);
        assert_eq!(bridge.metrics().events_relayed, 2);
    }

    #[test]
    fn shutdown_flushes_pending() {
        let mut world = SandboxWorld::new();
        let mut bridge = bridge(false);
        bridge.dispatch(&mut world, "status");
        let sink = bridge.shutdown().unwrap();
        assert_eq!(sink.last_responses().unwrap().len(), 1);
    }
}
