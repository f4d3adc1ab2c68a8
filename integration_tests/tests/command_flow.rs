mod common;

use bridge_core::{SandboxWorld, WorldAccess};
use bridge_runtime::{Status, EVENT_RESPONSE_ID};
use serde_json::json;

#[test]
fn every_command_gets_the_next_id() {
    let mut bridge = common::test_bridge();
    let mut world = SandboxWorld::with_starter_area();

    let lines = ["status", "fly away", "", "walk sideways", "inventory"];
    let responses: Vec<_> = lines
        .iter()
        .map(|line| bridge.dispatch(&mut world, line))
        .collect();

    let ids: Vec<u64> = responses.iter().map(|response| response.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(responses[0].status, Status::Ok);
    assert_eq!(responses[1].message, "Unknown command: fly");
    assert_eq!(responses[2].message, "Invalid command format");
    assert_eq!(responses[3].message, "Invalid direction: sideways");
    assert_eq!(responses[4].status, Status::Ok);
    assert!(responses.iter().all(|response| response.id != EVENT_RESPONSE_ID));
    assert_eq!(bridge.session().queue.len(), lines.len());
}

#[test]
fn walking_is_held_until_stopped() {
    let mut bridge = common::test_bridge();
    let mut world = SandboxWorld::with_starter_area();

    let response = bridge.dispatch(&mut world, "walk east");
    assert_eq!(response.message, "Walking east");
    common::run_ticks(&mut bridge, &mut world, 10);
    let walked = common::player_x(&world);
    assert!((walked - 1.5).abs() < 1e-6, "walked to {walked}");

    let response = bridge.dispatch(&mut world, "stop");
    assert_eq!(response.message, "Stopped all actions");
    common::run_ticks(&mut bridge, &mut world, 10);
    assert!((common::player_x(&world) - walked).abs() < 1e-9);
    assert!(bridge.session().intents.is_idle());
}

#[test]
fn transfers_are_capped_by_what_is_available() {
    let mut bridge = common::test_bridge();
    let mut world = SandboxWorld::with_starter_area();

    let response = bridge.dispatch(&mut world, "take iron-plate,3,3,80");
    assert!(response.is_ok());
    assert!(response.message.starts_with("Took 50 iron-plate from wooden-chest #"));
    assert_eq!(response.data.as_ref().unwrap()["transferred"], json!(50));
    assert_eq!(world.player_item_count("iron-plate"), 50);

    let response = bridge.dispatch(&mut world, "take iron-plate,3,3,5");
    assert!(response.is_ok());
    assert!(response.message.starts_with("Took 0 iron-plate"));

    let response = bridge.dispatch(&mut world, "put iron-plate,3,3,20");
    assert!(response.message.starts_with("Inserted 20 iron-plate into wooden-chest #"));
    assert_eq!(world.player_item_count("iron-plate"), 30);

    let response = bridge.dispatch(&mut world, "put coal,3,3");
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.message, "No coal in inventory");

    let response = bridge.dispatch(&mut world, "take iron-plate,40,40");
    assert_eq!(response.status, Status::Error);
    assert!(response.message.starts_with("No container at"));
}

#[test]
fn resources_are_clustered_by_name() {
    let mut bridge = common::test_bridge();
    let mut world = SandboxWorld::with_starter_area();

    let response = bridge.dispatch(&mut world, "find_resources");
    let clusters = response.data.unwrap();
    let names: Vec<&str> = clusters
        .as_array()
        .unwrap()
        .iter()
        .map(|cluster| cluster["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["coal", "copper-ore", "iron-ore", "stone"]);

    let response = bridge.dispatch(&mut world, "find_resources name=iron-ore");
    assert_eq!(
        response.data.unwrap(),
        json!([{
            "name": "iron-ore",
            "count": 9,
            "center_x": 12.0,
            "center_y": 0.0,
            "total_amount": 6300,
        }])
    );

    let response = bridge.dispatch(&mut world, "find_resources name=uranium-ore");
    assert!(response.is_ok());
    assert!(response.message.starts_with("No resources found near"));
    assert_eq!(response.data.unwrap(), json!([]));
}

#[test]
fn crafting_runs_to_completion() {
    let mut bridge = common::test_bridge();
    let mut world = SandboxWorld::with_starter_area();
    world.give("iron-plate", 4);

    let response = bridge.dispatch(&mut world, "craft iron-gear-wheel,3");
    assert_eq!(response.message, "Can only craft 2 of 3 x iron-gear-wheel");
    assert_eq!(world.player_item_count("iron-plate"), 4);

    let response = bridge.dispatch(&mut world, "craft iron-gear-wheel,2");
    assert_eq!(response.message, "Crafting 2 x iron-gear-wheel");
    assert_eq!(world.player_item_count("iron-plate"), 0);

    common::run_ticks(&mut bridge, &mut world, 60);
    assert_eq!(world.player_item_count("iron-gear-wheel"), 2);
    assert_eq!(world.crafting_queue_size(), 0);
}
