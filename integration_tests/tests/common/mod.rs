#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use bridge_core::{Bridge, BridgeConfig, MemorySink, SandboxWorld, WorldAccess};

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = fixture("test_bridge_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test bridge config at {}",
            config_path.display()
        );

        std::env::set_var(bridge_core::BRIDGE_CONFIG_ENV, &config_path);
    });
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Bridge built from the fixture config, writing into memory.
pub fn test_bridge() -> Bridge<MemorySink> {
    ensure_test_config();
    let config = BridgeConfig::from_env().expect("fixture config parses");
    Bridge::new(&config, MemorySink::new()).expect("fixture capabilities resolve")
}

/// One host tick: advance the world, then step the bridge.
pub fn tick(bridge: &mut Bridge<MemorySink>, world: &mut SandboxWorld) {
    world.advance();
    bridge.step(world).expect("memory sink never fails unless asked");
}

pub fn run_ticks(bridge: &mut Bridge<MemorySink>, world: &mut SandboxWorld, ticks: u64) {
    for _ in 0..ticks {
        tick(bridge, world);
    }
}

pub fn player_x(world: &SandboxWorld) -> f64 {
    world.player().position.map(|p| p.x).unwrap_or(f64::NAN)
}
