use bridge_runtime::{PlayerSnapshot, ResearchSnapshot, Snapshot};

use crate::intents::StandingIntents;
use crate::queue::ResponseQueue;
use crate::world::WorldAccess;

/// Project the readable world state, the standing intents and every queued
/// response into one [`Snapshot`]. Reads only; the caller clears the queue
/// once the snapshot has been written.
pub fn build_snapshot(
    world: &dyn WorldAccess,
    intents: &StandingIntents,
    queue: &ResponseQueue,
) -> Snapshot {
    let player = world.player();
    Snapshot {
        tick: world.tick(),
        player: PlayerSnapshot {
            position: player.position,
            health: player.health,
            max_health: player.max_health,
            walking: intents.walking(),
            mining: intents.mining(),
        },
        crafting_queue_size: world.crafting_queue_size(),
        research: world.current_research().map(|research| ResearchSnapshot {
            name: research.name,
            progress: research.progress,
        }),
        responses: queue.entries().to_vec(),
    }
}
