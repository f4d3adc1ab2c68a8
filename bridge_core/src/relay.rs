use bridge_runtime::Outcome;
use serde_json::json;

use crate::intents::StandingIntents;
use crate::world::WorldEvent;

/// A world notification converted for the response queue.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayedEvent {
    pub outcome: Outcome,
    /// Deliver now instead of waiting for the next periodic write.
    pub urgent: bool,
}

/// Turns [`WorldEvent`]s into event outcomes and applies their effect on
/// the standing intents.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventRelay;

impl EventRelay {
    pub fn new() -> Self {
        Self
    }

    pub fn is_urgent(event: &WorldEvent) -> bool {
        matches!(
            event,
            WorldEvent::ResearchCompleted { .. } | WorldEvent::Died { .. }
        )
    }

    pub fn relay(&self, event: &WorldEvent, intents: &mut StandingIntents) -> RelayedEvent {
        let outcome = match event {
            WorldEvent::MiningCompleted {
                entity,
                position,
                item,
                count,
                exhausted,
            } => {
                if *exhausted
                    && intents
                        .mining()
                        .is_some_and(|target| target.distance_sq(position) < 1e-6)
                {
                    intents.set_mining(None);
                }
                Outcome::event(
                    format!("Mined {count} {item} from {entity}"),
                    Some(json!({
                        "entity": entity,
                        "item": item,
                        "count": count,
                        "x": position.x,
                        "y": position.y,
                        "exhausted": exhausted,
                    })),
                )
            }
            WorldEvent::CraftingCompleted { item, count } => Outcome::event(
                format!("Crafted {count} {item}"),
                Some(json!({ "item": item, "count": count })),
            ),
            WorldEvent::ResearchCompleted { name } => Outcome::event(
                format!("Research completed: {name}"),
                Some(json!({ "technology": name })),
            ),
            WorldEvent::Damaged {
                amount,
                health,
                cause,
            } => Outcome::event(
                format!("Took {amount:.1} damage"),
                Some(json!({ "amount": amount, "health": health, "cause": cause })),
            ),
            WorldEvent::Died { cause } => {
                intents.clear();
                let message = match cause {
                    Some(cause) => format!("Player died: {cause}"),
                    None => "Player died".to_string(),
                };
                Outcome::event(message, Some(json!({ "cause": cause })))
            }
        };
        RelayedEvent {
            outcome,
            urgent: Self::is_urgent(event),
        }
    }
}
