//! Fixtures shared by the integration tests.

use rand::{rngs::StdRng, SeedableRng};
use racer_shared::{
    catalog::{SceneryConfig, TrackCatalog, TrackDefinition},
    config::RaceConfig,
    road::SegmentStore,
    track::{TrackBuilder, TrackDirective},
};

/// Installs a test-writer subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// A track definition without scenery.
pub fn bare_track(name: &str, directives: Vec<TrackDirective>) -> TrackDefinition {
    TrackDefinition {
        name: name.to_string(),
        description: String::new(),
        directives,
        scenery: SceneryConfig {
            frequency: 0.0,
            objects: Vec::new(),
        },
        background_color: "#87CEEB".to_string(),
        fog_color: "#000000".to_string(),
    }
}

/// `segments` straight segments.
pub fn straight_track(segments: usize) -> TrackDefinition {
    bare_track("straight", vec![TrackDirective::Straight { length: segments }])
}

pub fn catalog_of(tracks: Vec<TrackDefinition>) -> TrackCatalog {
    TrackCatalog { tracks }
}

/// Builds `track` with the default road geometry.
pub fn build_store(track: &TrackDefinition, seed: u64) -> anyhow::Result<SegmentStore> {
    let road = RaceConfig::default().road;
    TrackBuilder::new(road.segment_length, road.road_width)
        .build(track, &mut StdRng::seed_from_u64(seed))
}

/// Default config with `opponents` cars and `laps` laps.
pub fn race_config(opponents: usize, laps: u32) -> RaceConfig {
    let mut config = RaceConfig::default();
    config.race.opponent_count = opponents;
    config.race.laps = laps;
    config
}
