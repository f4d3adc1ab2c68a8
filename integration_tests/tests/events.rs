mod common;

use bridge_core::{SandboxWorld, WorldAccess};
use bridge_runtime::{Status, EVENT_RESPONSE_ID};

#[test]
fn snapshots_follow_the_cadence() {
    let mut bridge = common::test_bridge();
    let mut world = SandboxWorld::with_starter_area();

    common::run_ticks(&mut bridge, &mut world, 59);
    assert!(bridge.sink().snapshots().is_empty());

    common::tick(&mut bridge, &mut world);
    assert_eq!(bridge.sink().snapshots().len(), 1);
    assert_eq!(bridge.sink().last_snapshot().unwrap().tick, 60);

    common::run_ticks(&mut bridge, &mut world, 190);
    assert_eq!(bridge.sink().snapshots().len(), 250 / 60);
    assert_eq!(bridge.scheduler().steps(), 250);
}

#[test]
fn mining_events_ride_along_with_the_next_snapshot() {
    let mut bridge = common::test_bridge();
    let mut world = SandboxWorld::with_starter_area();

    let response = bridge.dispatch(&mut world, "mine 12,0");
    assert!(response.message.starts_with("Mining iron-ore #"));

    common::run_ticks(&mut bridge, &mut world, 60);
    let snapshot = bridge.sink().last_snapshot().unwrap();
    let messages: Vec<&str> = snapshot
        .responses
        .iter()
        .map(|response| response.message.as_str())
        .collect();
    assert_eq!(messages.len(), 3);
    assert!(messages[1].starts_with("Mined 1 iron-ore from iron-ore #"));
    assert_eq!(snapshot.responses[1].id, EVENT_RESPONSE_ID);
    assert_eq!(snapshot.responses[1].step, 30);
    assert_eq!(snapshot.responses[2].step, 60);
    assert_eq!(world.player_item_count("iron-ore"), 2);

    // Everything the snapshot carried was consumed.
    assert!(bridge.session().queue.is_empty());
    assert!(bridge.sink().response_writes().is_empty());
}

#[test]
fn finished_research_is_flushed_immediately() {
    let mut bridge = common::test_bridge();
    let mut world = SandboxWorld::with_starter_area();

    let response = bridge.dispatch(&mut world, "research automation");
    assert_eq!(response.message, "Started research: automation");

    common::run_ticks(&mut bridge, &mut world, 149);
    assert!(bridge.sink().response_writes().is_empty());

    common::tick(&mut bridge, &mut world);
    let flushed = bridge.sink().last_responses().unwrap();
    let last = flushed.last().unwrap();
    assert_eq!(last.status, Status::Event);
    assert_eq!(last.message, "Research completed: automation");
    assert!(bridge.session().queue.is_empty());
    assert_eq!(bridge.metrics().urgent_flushes, 1);

    let response = bridge.dispatch(&mut world, "current_research");
    assert_eq!(response.message, "No research in progress");
    let response = bridge.dispatch(&mut world, "recipes");
    let enabled = response.data.unwrap();
    assert!(enabled
        .as_array()
        .unwrap()
        .iter()
        .any(|recipe| recipe["name"] == "assembling-machine-1"));
}

#[test]
fn death_clears_intents_and_flushes() {
    let mut bridge = common::test_bridge();
    let mut world = SandboxWorld::with_starter_area();

    bridge.dispatch(&mut world, "walk north");
    bridge.dispatch(&mut world, "mine 12,0");
    common::run_ticks(&mut bridge, &mut world, 5);
    assert!(!bridge.session().intents.is_idle());

    world.damage(100.0, Some("biter".into()));
    common::tick(&mut bridge, &mut world);
    assert!(!bridge.session().intents.is_idle());
    assert!(bridge.sink().response_writes().is_empty());

    world.damage(500.0, Some("biter".into()));
    common::tick(&mut bridge, &mut world);
    assert!(bridge.session().intents.is_idle());
    let flushed = bridge.sink().last_responses().unwrap();
    let messages: Vec<&str> = flushed.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0], "Walking north");
    assert!(messages[1].starts_with("Mining iron-ore #"));
    assert_eq!(messages[2], "Took 100.0 damage");
    assert_eq!(messages[3], "Player died: biter");
    assert!(world.player().position.is_none());

    let response = bridge.dispatch(&mut world, "status");
    assert_eq!(response.message, "Player has no character");
    let response = bridge.dispatch(&mut world, "walk north");
    assert_eq!(response.status, Status::Error);
}
