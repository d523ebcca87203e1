//! Configuration system.
//!
//! Loads race configuration from JSON strings (file IO left to the app).
//! Every field has a default, so a partial document such as
//! `{"race": {"laps": 3}}` is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for a race session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub viewport: ViewportConfig,
    pub camera: CameraConfig,
    pub road: RoadConfig,
    pub player: PlayerConfig,
    pub opponents: OpponentConfig,
    pub race: RaceRules,
}

impl RaceConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// Output surface size in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 600.0,
        }
    }
}

/// Camera and projection tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f64,
    /// Camera height used by `init` (world units).
    pub start_height: f64,
    /// How far the camera trails the player along z.
    pub distance_to_player: f64,
    /// Camera height above the player.
    pub player_height: f64,
    /// Depth limit for curve accumulation.
    pub draw_distance: f64,
    pub fog_density: f64,
    /// Height the sprite scale is normalised against.
    pub reference_height: f64,
    /// Exponential smoothing factor for x/y/rotation.
    pub follow_smoothing: f64,
    /// Rotation per unit of road curve.
    pub rotation_gain: f64,
    /// Seconds before a shake offset is removed again.
    pub shake_duration: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 100.0,
            start_height: 1000.0,
            distance_to_player: 500.0,
            player_height: 500.0,
            draw_distance: 3000.0,
            fog_density: 0.0025,
            reference_height: 480.0,
            follow_smoothing: 0.1,
            rotation_gain: 0.13,
            shake_duration: 0.05,
        }
    }
}

/// Road geometry and painting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub segment_length: f64,
    /// Half-width of the road in world units.
    pub road_width: f64,
    pub lanes: u32,
    pub lane_marker_width: f64,
    /// Rumble strip width as a fraction of the projected half-width.
    pub rumble_fraction: f64,
    /// Segments walked by the renderer from the camera's segment.
    pub visible_segments: usize,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            segment_length: 200.0,
            road_width: 2000.0,
            lanes: 3,
            lane_marker_width: 10.0,
            rumble_fraction: 0.2,
            visible_segments: 300,
        }
    }
}

/// Player car handling. Rates are per second unless noted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_speed: f64,
    pub acceleration: f64,
    pub braking: f64,
    /// Applied while coasting (negative).
    pub deceleration: f64,
    /// Lateral speed at full speed.
    pub turn_speed: f64,
    pub centrifugal: f64,
    /// Per-tick multiplier, skipped while turbo is active.
    pub ground_friction: f64,
    /// Per-tick loss is `speed * air_resistance`.
    pub air_resistance: f64,
    /// Speed-dependent hop above the road surface.
    pub lift: f64,
    pub max_turbo: f64,
    pub turbo_use_rate: f64,
    pub turbo_recharge_rate: f64,
    pub turbo_boost: f64,
    /// Fraction of the road half-width the car may use.
    pub bounds_fraction: f64,
    /// Speed multiplier on a wall or object hit.
    pub collision_slowdown: f64,
    pub collision_shake: f64,
    pub width: f64,
    /// Lateral footprint of a scenery object. Scenery starts at 1.2 road
    /// half-widths, so this must reach past the car's bound for roadside
    /// objects to be hittable from the rumble strip.
    pub object_footprint: f64,
    pub draft_distance: f64,
    pub draft_lateral: f64,
    pub draft_boost: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_speed: 12000.0,
            acceleration: 8000.0,
            braking: -20000.0,
            deceleration: -3000.0,
            turn_speed: 3000.0,
            centrifugal: 600.0,
            ground_friction: 0.995,
            air_resistance: 2e-7,
            lift: 0.0025,
            max_turbo: 100.0,
            turbo_use_rate: 60.0,
            turbo_recharge_rate: 12.0,
            turbo_boost: 1.5,
            bounds_fraction: 0.9,
            collision_slowdown: 0.5,
            collision_shake: 5.0,
            width: 200.0,
            object_footprint: 1600.0,
            draft_distance: 200.0,
            draft_lateral: 250.0,
            draft_boost: 1.002,
        }
    }
}

/// AI opponent tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentConfig {
    pub base_max_speed: f64,
    /// Extra max speed per starting slot (later slots are faster).
    pub max_speed_step: f64,
    pub start_spacing: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    pub turn_speed: f64,
    pub centrifugal: f64,
    pub ground_friction: f64,
    pub air_resistance: f64,
    pub lift: f64,
    pub bounds_fraction: f64,
    /// Segments ahead the AI inspects.
    pub look_ahead: usize,
    /// Longitudinal radius for "nearby" traffic.
    pub nearby_distance: f64,
    /// Curves sharper than this pull the AI to the inside lane.
    pub curve_threshold: f64,
    pub curve_slowdown: f64,
    pub avoid_lateral: f64,
    pub avoid_distance: f64,
    pub slow_lateral: f64,
    pub slow_distance: f64,
    pub traffic_slowdown: f64,
    /// Dead band around the target lane centre.
    pub steer_dead_band: f64,
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            base_max_speed: 11000.0,
            max_speed_step: 200.0,
            start_spacing: 100.0,
            acceleration: 6000.0,
            deceleration: 8000.0,
            turn_speed: 2500.0,
            centrifugal: 600.0,
            ground_friction: 0.995,
            air_resistance: 2e-7,
            lift: 0.0025,
            bounds_fraction: 0.9,
            look_ahead: 20,
            nearby_distance: 300.0,
            curve_threshold: 0.5,
            curve_slowdown: 0.3,
            avoid_lateral: 500.0,
            avoid_distance: 200.0,
            slow_lateral: 250.0,
            slow_distance: 150.0,
            traffic_slowdown: 0.9,
            steer_dead_band: 10.0,
        }
    }
}

/// Session rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceRules {
    pub laps: u32,
    pub opponent_count: usize,
    /// Fixed simulation tick rate.
    pub tick_hz: u32,
    /// Seed for scenery placement and camera shake.
    pub seed: u64,
}

impl Default for RaceRules {
    fn default() -> Self {
        Self {
            laps: 2,
            opponent_count: 5,
            tick_hz: 60,
            seed: 0x5eed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RaceConfig::from_json_str(r#"{"race": {"laps": 3}, "road": {"lanes": 4}}"#)
            .unwrap();
        assert_eq!(cfg.race.laps, 3);
        assert_eq!(cfg.race.opponent_count, 5);
        assert_eq!(cfg.road.lanes, 4);
        assert_eq!(cfg.road.segment_length, 200.0);
        assert_eq!(cfg.camera.fov_degrees, 100.0);
    }

    #[test]
    fn empty_object_is_default() {
        let cfg = RaceConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.viewport.width, 900.0);
        assert_eq!(cfg.camera.draw_distance, 3000.0);
    }
}
