//! Computer-controlled cars.
//!
//! Each opponent picks a lane and a target speed from the road under it and
//! the traffic around it, then steers and throttles toward them. Opponents
//! only see other cars through [`TrafficView`] snapshots taken at the start
//! of the tick, so update order never matters.

use tracing::debug;

use crate::{
    config::OpponentConfig,
    event::{EventQueue, RaceEvent, VehicleId},
    math::wrapped_delta,
    road::SegmentStore,
    vehicle::{advance_along_track, apply_drag, centrifugal_push, clamp_to_road, TrafficView},
};

/// Sprite colour variants, cycled by slot.
const COLORS: [&str; 3] = ["1", "2", "3"];

/// Sprite hysteresis around the target line.
const SPRITE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct Opponent {
    pub slot: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub speed: f64,
    pub max_speed: f64,
    pub lap: u32,
    pub race_position: usize,
    /// -1, 0 or 1.
    pub target_lane: i8,
    color: &'static str,
    sprite: String,
    cfg: OpponentConfig,
}

impl Opponent {
    pub fn new(slot: usize, cfg: OpponentConfig) -> Self {
        let color = COLORS[slot % COLORS.len()];
        Self {
            slot,
            x: 0.0,
            y: 0.0,
            z: slot as f64 * cfg.start_spacing,
            speed: 0.0,
            max_speed: cfg.base_max_speed + slot as f64 * cfg.max_speed_step,
            lap: 1,
            race_position: slot + 2,
            target_lane: 0,
            color,
            sprite: format!("opponent{color}_straight"),
            cfg,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.slot, self.cfg);
    }

    pub fn id(&self) -> VehicleId {
        VehicleId::Opponent(self.slot)
    }

    pub fn color(&self) -> &str {
        self.color
    }

    pub fn sprite(&self) -> &str {
        &self.sprite
    }

    pub fn view(&self) -> TrafficView {
        TrafficView {
            id: self.id(),
            x: self.x,
            z: self.z,
            speed: self.speed,
        }
    }

    /// Cars within `nearby_distance` along the track, either direction.
    pub fn nearby<'a>(
        &self,
        traffic: &'a [TrafficView],
        track_length: f64,
    ) -> impl Iterator<Item = &'a TrafficView> + 'a {
        let (id, z, reach) = (self.id(), self.z, self.cfg.nearby_distance);
        traffic
            .iter()
            .filter(move |t| t.id != id && wrapped_delta(z, t.z, track_length).abs() < reach)
    }

    /// Lane the car wants for this segment's `curve` given `traffic`.
    pub fn choose_lane(&self, curve: f64, traffic: &[TrafficView], track_length: f64) -> i8 {
        let mut lane = 0;
        if curve.abs() > self.cfg.curve_threshold {
            lane = if curve > 0.0 { 1 } else { -1 };
        }
        for car in self.nearby(traffic, track_length) {
            let ahead = wrapped_delta(self.z, car.z, track_length);
            if (car.x - self.x).abs() < self.cfg.avoid_lateral
                && ahead > 0.0
                && ahead < self.cfg.avoid_distance
            {
                lane = if car.x > self.x { -1 } else { 1 };
            }
        }
        lane
    }

    /// Speed the car aims for on `curve`, easing off behind slower traffic.
    pub fn target_speed(&self, curve: f64, traffic: &[TrafficView], track_length: f64) -> f64 {
        let mut target = self.max_speed * (1.0 - curve.abs() * self.cfg.curve_slowdown);
        for car in self.nearby(traffic, track_length) {
            let ahead = wrapped_delta(self.z, car.z, track_length);
            if (car.x - self.x).abs() < self.cfg.slow_lateral
                && ahead > 0.0
                && ahead < self.cfg.slow_distance
            {
                target *= self.cfg.traffic_slowdown;
            }
        }
        target.max(0.0)
    }

    fn lane_x(&self, road_width: f64) -> f64 {
        f64::from(self.target_lane) * road_width / 3.0
    }

    pub fn update(
        &mut self,
        dt: f64,
        store: &SegmentStore,
        traffic: &[TrafficView],
        events: &mut EventQueue,
    ) {
        let segment = store.segment_at(self.z);
        let track_length = store.track_length();
        let road_width = store.road_width();

        let (z, laps) = advance_along_track(self.z, self.speed * dt, track_length);
        self.z = z;
        for _ in 0..laps {
            self.lap += 1;
            debug!(slot = self.slot, lap = self.lap, "Opponent crossed the line");
            events.push(RaceEvent::LapCompleted {
                vehicle: self.id(),
                lap: self.lap - 1,
            });
        }

        // Prepare for the next bend while still on the straight before it.
        let upcoming = store
            .lookahead(segment.index, self.cfg.look_ahead)
            .map_or(0.0, |s| s.curve);
        let lane_curve = if segment.curve.abs() > self.cfg.curve_threshold {
            segment.curve
        } else {
            upcoming
        };
        self.target_lane = self.choose_lane(lane_curve, traffic, track_length);

        let target = self.target_speed(segment.curve, traffic, track_length);
        self.speed = if self.speed < target {
            (self.speed + self.cfg.acceleration * dt).min(target)
        } else {
            (self.speed - self.cfg.deceleration * dt).max(target)
        };

        let ratio = self.speed / self.max_speed;
        let target_x = self.lane_x(road_width);
        let turn = self.cfg.turn_speed * ratio * dt;
        if self.x < target_x - self.cfg.steer_dead_band {
            self.x += turn;
        } else if self.x > target_x + self.cfg.steer_dead_band {
            self.x -= turn;
        }
        self.x += centrifugal_push(segment.curve, self.cfg.centrifugal, ratio, dt);
        self.x = clamp_to_road(self.x, road_width * self.cfg.bounds_fraction).0;

        self.y = segment.y() + self.speed * self.cfg.lift * dt;
        self.speed = apply_drag(
            self.speed,
            Some(self.cfg.ground_friction),
            self.cfg.air_resistance,
        );

        let heading = if self.x < target_x - SPRITE_THRESHOLD {
            "right"
        } else if self.x > target_x + SPRITE_THRESHOLD {
            "left"
        } else {
            "straight"
        };
        self.sprite = format!("opponent{}_{heading}", self.color);
    }
}

/// The field of opponents.
#[derive(Debug, Clone, Default)]
pub struct OpponentField {
    cars: Vec<Opponent>,
}

impl OpponentField {
    pub fn new(count: usize, cfg: OpponentConfig) -> Self {
        Self {
            cars: (0..count).map(|slot| Opponent::new(slot, cfg)).collect(),
        }
    }

    pub fn reset(&mut self) {
        self.cars.iter_mut().for_each(Opponent::reset);
    }

    pub fn cars(&self) -> &[Opponent] {
        &self.cars
    }

    pub fn cars_mut(&mut self) -> &mut [Opponent] {
        &mut self.cars
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    pub fn views(&self) -> impl Iterator<Item = TrafficView> + '_ {
        self.cars.iter().map(Opponent::view)
    }

    /// Steps every car against the same start-of-tick traffic snapshot.
    pub fn update(
        &mut self,
        dt: f64,
        store: &SegmentStore,
        player: TrafficView,
        events: &mut EventQueue,
    ) {
        let traffic: Vec<TrafficView> = std::iter::once(player).chain(self.views()).collect();
        for car in &mut self.cars {
            car.update(dt, store, &traffic, events);
        }
    }
}
