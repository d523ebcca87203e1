//! Player car simulation.
//!
//! Integration order per tick: move along z (wrapping into the next lap),
//! apply controls, keep the car on the road, settle onto the surface, then
//! test scenery. Anything the outside world should react to (collisions,
//! turbo, laps) is queued as a [`RaceEvent`]; the player never touches the
//! camera or other cars directly.

use tracing::debug;

use crate::{
    config::PlayerConfig,
    event::{CollisionKind, EventQueue, RaceEvent, VehicleId},
    input::InputState,
    math::{overlap, wrapped_delta},
    road::{Segment, SegmentStore},
};

/// Read-only snapshot of a car, handed to other cars' updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficView {
    pub id: VehicleId,
    pub x: f64,
    pub z: f64,
    pub speed: f64,
}

impl TrafficView {
    pub fn is_player(&self) -> bool {
        self.id == VehicleId::Player
    }
}

/// Fires once when a condition becomes true and re-arms when it clears.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeTrigger {
    active: bool,
}

impl EdgeTrigger {
    /// Feeds this tick's state; returns true on the rising edge only.
    pub fn update(&mut self, active: bool) -> bool {
        let fired = active && !self.active;
        self.active = active;
        fired
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn reset(&mut self) {
        self.active = false;
    }
}

/// Clamps `x` to `±limit`; reports whether clamping moved it.
pub(crate) fn clamp_to_road(x: f64, limit: f64) -> (f64, bool) {
    let clamped = x.clamp(-limit, limit);
    (clamped, clamped != x)
}

/// Advances `z` by `distance`, wrapping at `track_length`. Returns the new z
/// and how many times the finish line was crossed.
pub(crate) fn advance_along_track(z: f64, distance: f64, track_length: f64) -> (f64, u32) {
    let mut z = z + distance;
    let mut laps = 0;
    if track_length > 0.0 {
        while z >= track_length {
            z -= track_length;
            laps += 1;
        }
    }
    (z, laps)
}

/// Lateral drift away from the inside of a bend. Positive `curve` bends
/// right, so the push is toward negative x.
pub(crate) fn centrifugal_push(curve: f64, strength: f64, speed_ratio: f64, dt: f64) -> f64 {
    -curve * strength * speed_ratio * dt
}

/// Ground friction (optional) followed by speed-dependent air resistance.
pub(crate) fn apply_drag(speed: f64, friction: Option<f64>, air_resistance: f64) -> f64 {
    let speed = friction.map_or(speed, |f| speed * f);
    speed * (1.0 - speed * air_resistance)
}

#[derive(Debug, Clone)]
pub struct Player {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub speed: f64,
    pub lap: u32,
    /// 1-based rank.
    pub race_position: usize,
    pub total_laps: u32,
    pub turbo: f64,
    turbo_active: bool,
    sprite: &'static str,
    wall: EdgeTrigger,
    scenery: EdgeTrigger,
    cfg: PlayerConfig,
}

impl Player {
    pub fn new(cfg: PlayerConfig, total_laps: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            speed: 0.0,
            lap: 1,
            race_position: 1,
            total_laps,
            turbo: cfg.max_turbo,
            turbo_active: false,
            sprite: "player_straight",
            wall: EdgeTrigger::default(),
            scenery: EdgeTrigger::default(),
            cfg,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.cfg, self.total_laps);
    }

    pub fn sprite(&self) -> &'static str {
        self.sprite
    }

    pub fn turbo_active(&self) -> bool {
        self.turbo_active
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.cfg
    }

    pub fn is_race_complete(&self) -> bool {
        self.lap > self.total_laps
    }

    pub fn view(&self) -> TrafficView {
        TrafficView {
            id: VehicleId::Player,
            x: self.x,
            z: self.z,
            speed: self.speed,
        }
    }

    /// Directly behind `other`, close enough to ride its slipstream.
    pub fn is_drafting(&self, other: &TrafficView, track_length: f64) -> bool {
        let distance = wrapped_delta(self.z, other.z, track_length);
        distance > 0.0
            && distance < self.cfg.draft_distance
            && (other.x - self.x).abs() < self.cfg.draft_lateral
            && self.speed > 0.0
    }

    /// One simulation step of `dt` seconds.
    pub fn update(
        &mut self,
        dt: f64,
        input: InputState,
        store: &SegmentStore,
        traffic: &[TrafficView],
        events: &mut EventQueue,
    ) {
        let segment = store.segment_at(self.z);
        let track_length = store.track_length();

        let (z, laps) = advance_along_track(self.z, self.speed * dt, track_length);
        self.z = z;
        for _ in 0..laps {
            self.lap += 1;
            debug!(lap = self.lap, "Player crossed the line");
            events.push(RaceEvent::LapCompleted {
                vehicle: VehicleId::Player,
                lap: self.lap - 1,
            });
        }

        self.apply_throttle(dt, input, events);
        if traffic.iter().any(|t| self.is_drafting(t, track_length)) {
            self.speed *= self.cfg.draft_boost;
        }
        let boost = if self.turbo_active {
            self.cfg.turbo_boost
        } else {
            1.0
        };
        self.speed = self.speed.clamp(0.0, self.cfg.max_speed * boost);

        self.steer(dt, input, segment);
        self.keep_on_road(store.road_width(), events);

        self.y = segment.y() + self.speed * self.cfg.lift * dt;
        let friction = (!self.turbo_active).then_some(self.cfg.ground_friction);
        self.speed = apply_drag(self.speed, friction, self.cfg.air_resistance);

        self.sprite = match input.steering() {
            s if s < 0.0 => "player_left",
            s if s > 0.0 => "player_right",
            _ => "player_straight",
        };

        self.check_scenery(segment, store.road_width(), events);
    }

    fn apply_throttle(&mut self, dt: f64, input: InputState, events: &mut EventQueue) {
        if input.contains(InputState::ACCELERATE) {
            self.speed += self.cfg.acceleration * dt;
        } else if input.contains(InputState::BRAKE) {
            self.speed += self.cfg.braking * dt;
        } else {
            self.speed += self.cfg.deceleration * dt;
        }

        let was_active = self.turbo_active;
        if input.contains(InputState::TURBO) && self.turbo > 0.0 {
            self.turbo_active = true;
            self.turbo = (self.turbo - self.cfg.turbo_use_rate * dt).max(0.0);
            self.speed *= self.cfg.turbo_boost;
        } else {
            self.turbo_active = false;
            self.turbo = (self.turbo + self.cfg.turbo_recharge_rate * dt).min(self.cfg.max_turbo);
        }
        match (was_active, self.turbo_active) {
            (false, true) => events.push(RaceEvent::TurboEngaged),
            (true, false) => events.push(RaceEvent::TurboDisengaged),
            _ => {}
        }
    }

    fn steer(&mut self, dt: f64, input: InputState, segment: &Segment) {
        if self.speed <= 0.0 {
            return;
        }
        let ratio = self.speed / self.cfg.max_speed;
        self.x += input.steering() * self.cfg.turn_speed * ratio * dt;
        self.x += centrifugal_push(segment.curve, self.cfg.centrifugal, ratio, dt);
    }

    fn keep_on_road(&mut self, road_width: f64, events: &mut EventQueue) {
        let (x, clamped) = clamp_to_road(self.x, road_width * self.cfg.bounds_fraction);
        self.x = x;
        if self.wall.update(clamped) {
            self.collide(CollisionKind::Wall, events);
        }
    }

    fn check_scenery(&mut self, segment: &Segment, road_width: f64, events: &mut EventQueue) {
        let hit = segment.objects().iter().any(|o| {
            overlap(
                self.x,
                self.cfg.width,
                o.offset * road_width,
                self.cfg.object_footprint,
            )
        });
        if self.scenery.update(hit) {
            self.collide(CollisionKind::Object, events);
        }
    }

    fn collide(&mut self, kind: CollisionKind, events: &mut EventQueue) {
        self.speed *= self.cfg.collision_slowdown;
        debug!(?kind, x = self.x, z = self.z, speed = self.speed, "Player collision");
        events.push(RaceEvent::Collision {
            vehicle: VehicleId::Player,
            kind,
            shake: self.cfg.collision_shake,
        });
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        catalog::{SceneryConfig, TrackDefinition},
        track::{TrackBuilder, TrackDirective},
    };

    const DT: f64 = 1.0 / 60.0;

    fn store(directives: Vec<TrackDirective>) -> SegmentStore {
        let def = TrackDefinition {
            name: "sim".to_string(),
            description: String::new(),
            directives,
            scenery: SceneryConfig {
                frequency: 0.0,
                objects: Vec::new(),
            },
            background_color: "#000".to_string(),
            fog_color: "#000".to_string(),
        };
        TrackBuilder::new(200.0, 2000.0)
            .build(&def, &mut StdRng::seed_from_u64(1))
            .unwrap()
    }

    fn straight(n: usize) -> SegmentStore {
        store(vec![TrackDirective::Straight { length: n }])
    }

    fn collisions(events: &[RaceEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, RaceEvent::Collision { kind: CollisionKind::Wall, .. }))
            .count()
    }

    #[test]
    fn edge_trigger_fires_once_per_activation() {
        let mut t = EdgeTrigger::default();
        assert!(t.update(true));
        assert!(!t.update(true));
        assert!(!t.update(false));
        assert!(t.update(true));
    }

    #[test]
    fn accelerates_and_moves_forward() {
        let track = straight(100);
        let mut player = Player::new(PlayerConfig::default(), 2);
        let mut events = EventQueue::default();
        for _ in 0..60 {
            player.update(DT, InputState::ACCELERATE, &track, &[], &mut events);
        }
        assert!(player.speed > 0.0);
        assert!(player.z > 0.0);
        assert_eq!(player.sprite(), "player_straight");
        assert!(events.is_empty());
    }

    #[test]
    fn coasting_never_goes_negative() {
        let track = straight(10);
        let mut player = Player::new(PlayerConfig::default(), 2);
        let mut events = EventQueue::default();
        player.speed = 100.0;
        for _ in 0..120 {
            player.update(DT, InputState::BRAKE, &track, &[], &mut events);
        }
        assert_eq!(player.speed, 0.0);
    }

    #[test]
    fn wrapping_counts_laps() {
        let track = straight(10);
        let mut player = Player::new(PlayerConfig::default(), 2);
        let mut events = EventQueue::default();
        player.z = 1990.0;
        player.speed = 1200.0;
        player.update(DT, InputState::ACCELERATE, &track, &[], &mut events);
        assert!(player.z < 100.0);
        assert_eq!(player.lap, 2);
        assert_eq!(
            events.drain()[0],
            RaceEvent::LapCompleted {
                vehicle: VehicleId::Player,
                lap: 1
            }
        );
        assert!(!player.is_race_complete());
        player.lap = 3;
        assert!(player.is_race_complete());
    }

    #[test]
    fn wall_collision_fires_once_per_excursion() {
        let track = straight(2000);
        let mut player = Player::new(PlayerConfig::default(), 2);
        let mut events = EventQueue::default();
        let limit = 2000.0 * 0.9;
        player.speed = 6000.0;

        let right = InputState::ACCELERATE | InputState::STEER_RIGHT;
        let left = InputState::ACCELERATE | InputState::STEER_LEFT;

        for _ in 0..120 {
            player.update(DT, right, &track, &[], &mut events);
        }
        assert_eq!(player.x, limit);
        let first = events.drain();
        assert_eq!(collisions(&first), 1);

        for _ in 0..30 {
            player.update(DT, left, &track, &[], &mut events);
        }
        assert!(player.x < limit);
        assert_eq!(collisions(&events.drain()), 0);

        for _ in 0..120 {
            player.update(DT, right, &track, &[], &mut events);
        }
        assert_eq!(collisions(&events.drain()), 1);
    }

    #[test]
    fn wall_hit_halves_speed() {
        let track = straight(100);
        let mut player = Player::new(PlayerConfig::default(), 2);
        let mut events = EventQueue::default();
        player.speed = 6000.0;
        player.x = 1799.0;
        player.update(DT, InputState::STEER_RIGHT, &track, &[], &mut events);
        assert_eq!(collisions(&events.drain()), 1);
        assert!(player.speed < 3000.0);
    }

    #[test]
    fn centrifugal_pushes_outward() {
        let track = store(vec![TrackDirective::Curve {
            length: 100,
            curve: 2.0,
        }]);
        let mut player = Player::new(PlayerConfig::default(), 2);
        let mut events = EventQueue::default();
        player.speed = 6000.0;
        player.update(DT, InputState::ACCELERATE, &track, &[], &mut events);
        assert!(player.x < 0.0);
    }

    #[test]
    fn turbo_drains_boosts_and_recharges() {
        let track = straight(1000);
        let cfg = PlayerConfig::default();
        let mut player = Player::new(cfg, 2);
        let mut events = EventQueue::default();
        player.speed = cfg.max_speed;

        let boost = InputState::ACCELERATE | InputState::TURBO;
        player.update(DT, boost, &track, &[], &mut events);
        assert!(player.turbo_active());
        assert!(player.turbo < cfg.max_turbo);
        assert!(player.speed > cfg.max_speed);
        assert_eq!(events.drain(), vec![RaceEvent::TurboEngaged]);

        for _ in 0..200 {
            player.update(DT, boost, &track, &[], &mut events);
            if !player.turbo_active() {
                break;
            }
        }
        assert!(!player.turbo_active());
        assert!(player.turbo < 1.0);
        assert!(events.iter().any(|e| *e == RaceEvent::TurboDisengaged));

        let drained = player.turbo;
        player.update(DT, InputState::ACCELERATE, &track, &[], &mut events);
        assert!(player.turbo > drained);
    }

    #[test]
    fn drafting_gate() {
        let player = Player {
            speed: 100.0,
            ..Player::new(PlayerConfig::default(), 2)
        };
        let ahead = TrafficView {
            id: VehicleId::Opponent(0),
            x: 50.0,
            z: 150.0,
            speed: 100.0,
        };
        assert!(player.is_drafting(&ahead, 10_000.0));
        let behind = TrafficView { z: -150.0, ..ahead };
        assert!(!player.is_drafting(&behind, 10_000.0));
        let wide = TrafficView { x: 1000.0, ..ahead };
        assert!(!player.is_drafting(&wide, 10_000.0));
        // Across the finish line.
        let mut near_line = player.clone();
        near_line.z = 9_950.0;
        let past_line = TrafficView { z: 50.0, ..ahead };
        assert!(near_line.is_drafting(&past_line, 10_000.0));
    }

    #[test]
    fn scenery_hit_is_edge_triggered() {
        let mut track = straight(50);
        track.push_object(
            0,
            crate::road::SceneryObject {
                sprite: "tree".to_string(),
                offset: 0.0,
            },
        );
        let mut player = Player::new(PlayerConfig::default(), 2);
        let mut events = EventQueue::default();
        player.update(DT, InputState::empty(), &track, &[], &mut events);
        player.update(DT, InputState::empty(), &track, &[], &mut events);
        let hits = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, RaceEvent::Collision { kind: CollisionKind::Object, .. }))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn hugging_the_wall_hits_roadside_scenery() {
        let def = TrackDefinition {
            name: "forest".to_string(),
            description: String::new(),
            directives: vec![TrackDirective::Straight { length: 500 }],
            scenery: SceneryConfig {
                frequency: 1.0,
                objects: vec!["tree".to_string()],
            },
            background_color: "#000".to_string(),
            fog_color: "#000".to_string(),
        };
        let track = TrackBuilder::new(200.0, 2000.0)
            .build(&def, &mut StdRng::seed_from_u64(11))
            .unwrap();
        let mut player = Player::new(PlayerConfig::default(), 2);
        let mut events = EventQueue::default();
        let right = InputState::ACCELERATE | InputState::STEER_RIGHT;
        for _ in 0..600 {
            player.update(DT, right, &track, &[], &mut events);
        }
        assert_eq!(player.x, 2000.0 * 0.9);
        let hits = events
            .iter()
            .filter(|e| matches!(e, RaceEvent::Collision { kind: CollisionKind::Object, .. }))
            .count();
        assert!(hits > 0);
    }

    #[test]
    fn reset_restores_start_state() {
        let mut player = Player::new(PlayerConfig::default(), 3);
        player.z = 500.0;
        player.lap = 3;
        player.turbo = 1.0;
        player.reset();
        assert_eq!(player.z, 0.0);
        assert_eq!(player.lap, 1);
        assert_eq!(player.total_laps, 3);
        assert_eq!(player.turbo, player.config().max_turbo);
    }
}
