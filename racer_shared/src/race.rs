//! Race orchestration.
//!
//! [`Race`] owns everything a race needs: the segment store, the camera, the
//! renderer, the cars, the event queue and the RNG. One frame is a
//! [`Race::tick`] followed by a [`Race::render`].

use anyhow::Context;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::{
    backdrop::{Backdrop, BackdropStyle},
    camera::Camera,
    catalog::{TrackCatalog, TrackDefinition},
    config::RaceConfig,
    event::{EventQueue, EventSink, RaceEvent, VehicleId},
    input::InputState,
    opponent::OpponentField,
    render::{Canvas, Color, FrameStats, Rect, RoadRenderer, VehicleSprite},
    road::SegmentStore,
    track::TrackBuilder,
    vehicle::{Player, TrafficView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceState {
    /// No race running; ticks do nothing.
    Title,
    Racing,
    Paused,
    /// The player finished; the field stays frozen.
    Complete,
}

/// 1-based positions for `(lap, z)` progress entries, leader first.
pub fn rank(progress: &[(u32, f64)]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..progress.len()).collect();
    order.sort_by(|&a, &b| {
        let (lap_a, z_a) = progress[a];
        let (lap_b, z_b) = progress[b];
        lap_b.cmp(&lap_a).then(z_b.total_cmp(&z_a))
    });
    let mut positions = vec![0; progress.len()];
    for (place, &entry) in order.iter().enumerate() {
        positions[entry] = place + 1;
    }
    positions
}

pub struct Race {
    config: RaceConfig,
    catalog: TrackCatalog,
    state: RaceState,
    track_index: usize,
    store: SegmentStore,
    camera: Camera,
    renderer: RoadRenderer,
    player: Player,
    opponents: OpponentField,
    events: EventQueue,
    rng: StdRng,
    background: Color,
    backdrop: Backdrop,
    elapsed: f64,
    ticks: u64,
}

impl Race {
    pub fn new(config: RaceConfig, catalog: TrackCatalog) -> Self {
        let mut camera = Camera::new(config.camera);
        camera.init(config.viewport.width, config.viewport.height);
        Self {
            state: RaceState::Title,
            track_index: 0,
            store: SegmentStore::new(config.road.segment_length, config.road.road_width),
            camera,
            renderer: RoadRenderer::new(config.road),
            player: Player::new(config.player, config.race.laps),
            opponents: OpponentField::new(config.race.opponent_count, config.opponents),
            events: EventQueue::default(),
            rng: StdRng::seed_from_u64(config.race.seed),
            background: Color::BLACK,
            backdrop: Backdrop::default(),
            elapsed: 0.0,
            ticks: 0,
            config,
            catalog,
        }
    }

    /// Builds track `track_index` and puts every car on the grid.
    ///
    /// On failure the race drops back to [`RaceState::Title`].
    pub fn start(&mut self, track_index: usize) -> anyhow::Result<()> {
        self.state = RaceState::Title;
        self.camera.clear_shakes();
        let track = self
            .catalog
            .get(track_index)
            .with_context(|| {
                format!(
                    "no track {track_index} in a catalog of {}",
                    self.catalog.len()
                )
            })?
            .clone();

        TrackBuilder::new(self.config.road.segment_length, self.config.road.road_width)
            .build_into(&mut self.store, &track, &mut self.rng)?;

        self.background = Color::from_hex(&track.background_color).unwrap_or_else(|| {
            warn!(color = %track.background_color, "Bad background colour, using black");
            Color::BLACK
        });
        let fog = Color::from_hex(&track.fog_color).unwrap_or_else(|| {
            warn!(color = %track.fog_color, "Bad fog colour, using black");
            Color::BLACK
        });
        self.renderer.set_fog_color(fog);
        self.backdrop = Backdrop::generate(BackdropStyle::for_track(&track.name), &mut self.rng);
        self.camera
            .init(self.config.viewport.width, self.config.viewport.height);
        self.player.reset();
        self.opponents.reset();
        self.events.clear();
        self.track_index = track_index;
        self.elapsed = 0.0;
        self.ticks = 0;
        self.state = RaceState::Racing;
        info!(
            track = %track.name,
            index = track_index,
            opponents = self.opponents.len(),
            laps = self.config.race.laps,
            "Race started"
        );
        Ok(())
    }

    pub fn restart(&mut self) -> anyhow::Result<()> {
        self.start(self.track_index)
    }

    /// Starts the following catalog entry, wrapping to the first.
    pub fn next_track(&mut self) -> anyhow::Result<()> {
        let count = self.catalog.len().max(1);
        self.start((self.track_index + 1) % count)
    }

    pub fn toggle_pause(&mut self) -> RaceState {
        self.state = match self.state {
            RaceState::Racing => RaceState::Paused,
            RaceState::Paused => RaceState::Racing,
            other => other,
        };
        info!(state = ?self.state, "Pause toggled");
        self.state
    }

    /// Ends the race; pending shakes are dropped.
    pub fn stop(&mut self) {
        self.camera.clear_shakes();
        self.state = RaceState::Title;
        info!("Race stopped");
    }

    /// Advances the simulation by `dt` seconds. Outside of
    /// [`RaceState::Racing`] this does nothing.
    pub fn tick(&mut self, dt: f64, input: InputState) {
        if self.state != RaceState::Racing || self.store.is_empty() {
            return;
        }
        self.ticks += 1;
        self.elapsed += dt;
        self.camera.advance(dt);
        let first_new = self.events.len();

        let opponents: Vec<TrafficView> = self.opponents.views().collect();
        let player_view = self.player.view();
        self.player
            .update(dt, input, &self.store, &opponents, &mut self.events);
        self.opponents
            .update(dt, &self.store, player_view, &mut self.events);

        self.update_positions();

        let segment = self.store.segment_at(self.player.z);
        self.camera
            .follow(self.player.x, self.player.y, self.player.z, segment);

        let shakes: Vec<f64> = self
            .events
            .iter()
            .skip(first_new)
            .filter_map(|event| match *event {
                RaceEvent::Collision {
                    vehicle: VehicleId::Player,
                    shake,
                    ..
                } => Some(shake),
                _ => None,
            })
            .collect();
        for intensity in shakes {
            self.camera.shake(intensity, &mut self.rng);
        }

        if self.player.is_race_complete() {
            let position = self.player.race_position;
            self.state = RaceState::Complete;
            self.events.push(RaceEvent::RaceComplete { position });
            info!(
                position,
                elapsed = self.elapsed,
                ticks = self.ticks,
                "Race complete"
            );
        }
    }

    fn update_positions(&mut self) {
        let progress: Vec<(u32, f64)> = std::iter::once((self.player.lap, self.player.z))
            .chain(self.opponents.cars().iter().map(|c| (c.lap, c.z)))
            .collect();
        let positions = rank(&progress);
        if positions[0] != self.player.race_position {
            debug!(
                from = self.player.race_position,
                to = positions[0],
                "Player position changed"
            );
        }
        self.player.race_position = positions[0];
        for (car, &position) in self.opponents.cars_mut().iter_mut().zip(&positions[1..]) {
            car.race_position = position;
        }
    }

    /// Draws the current frame onto `canvas`.
    pub fn render(&mut self, canvas: &mut dyn Canvas) -> FrameStats {
        let (width, height) = (self.config.viewport.width, self.config.viewport.height);
        canvas.begin_frame(width, height);
        canvas.fill_rect(Rect::spanning(0.0, width, 0.0, height), self.background);
        self.backdrop.paint(canvas, width, height);
        if self.store.is_empty() {
            canvas.end_frame();
            return FrameStats::default();
        }

        self.renderer.project(&mut self.store, &self.camera);
        let vehicles = self.vehicle_sprites();
        let stats = self
            .renderer
            .paint(canvas, &self.store, &self.camera, &vehicles);
        canvas.end_frame();
        stats
    }

    fn vehicle_sprites(&self) -> Vec<VehicleSprite> {
        let player = VehicleSprite {
            sprite: self.player.sprite().to_string(),
            x: self.player.x,
            y: self.player.y,
            z: self.player.z,
            is_player: true,
        };
        std::iter::once(player)
            .chain(self.opponents.cars().iter().map(|car| VehicleSprite {
                sprite: car.sprite().to_string(),
                x: car.x,
                y: car.y,
                z: car.z,
                is_player: false,
            }))
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<RaceEvent> {
        self.events.drain()
    }

    /// Hands queued events to `sink` in order.
    pub fn dispatch(&mut self, sink: &mut dyn EventSink) {
        for event in self.events.drain() {
            sink.on_event(&event);
        }
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn track_index(&self) -> usize {
        self.track_index
    }

    pub fn track(&self) -> Option<&TrackDefinition> {
        self.catalog.get(self.track_index)
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn opponents(&self) -> &OpponentField {
        &self.opponents
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    pub fn fog_color(&self) -> Color {
        self.renderer.palette().fog
    }

    /// Simulated seconds since the start.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
