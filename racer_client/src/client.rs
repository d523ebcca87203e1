//! Client implementation.
//!
//! The client maintains:
//! - The [`Race`] being driven, one tick plus one render per frame
//! - An [`EventLog`] standing in for the audio and HUD listeners
//! - Frame statistics from the last render
//! - Console for user commands

use std::time::Duration;

use anyhow::Context;
use racer_shared::{
    catalog::TrackCatalog,
    config::RaceConfig,
    event::{CollisionKind, EventSink, RaceEvent, VehicleId},
    race::{Race, RaceState},
    render::{Canvas, FrameStats, NullCanvas},
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::input::InputSource;

/// Counts what the audio and HUD layers would react to.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventLog {
    pub wall_hits: u32,
    pub object_hits: u32,
    pub turbo_engaged: u32,
    pub player_laps: u32,
    pub opponent_laps: u32,
    pub finish_position: Option<usize>,
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: &RaceEvent) {
        match *event {
            RaceEvent::Collision {
                vehicle: VehicleId::Player,
                kind,
                shake,
            } => {
                debug!(?kind, shake, "Collision");
                match kind {
                    CollisionKind::Wall => self.wall_hits += 1,
                    CollisionKind::Object => self.object_hits += 1,
                }
            }
            RaceEvent::Collision { .. } => {}
            RaceEvent::TurboEngaged => self.turbo_engaged += 1,
            RaceEvent::TurboDisengaged => {}
            RaceEvent::LapCompleted {
                vehicle: VehicleId::Player,
                lap,
            } => {
                info!(lap, "Lap completed");
                self.player_laps += 1;
            }
            RaceEvent::LapCompleted { .. } => self.opponent_laps += 1,
            RaceEvent::RaceComplete { position } => {
                info!(position, "Finished");
                self.finish_position = Some(position);
            }
        }
    }
}

/// End-of-run report, printed as JSON by the binary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub track: String,
    pub state: String,
    pub frames: u64,
    pub elapsed: f64,
    pub lap: u32,
    pub position: usize,
    pub speed: f64,
    pub last_frame_painted: usize,
    pub events: EventLog,
}

/// When the frame loop stops on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopOptions {
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
    /// Sleep between frames; `None` runs as fast as possible.
    pub pace: Option<Duration>,
    /// Stop once the race is complete.
    pub exit_on_finish: bool,
}

/// High-level game client.
pub struct GameClient {
    pub race: Race,
    pub events: EventLog,
    pub last_stats: FrameStats,
    frame: u64,
    dt: f64,
    canvas: Box<dyn Canvas + Send>,
    quit: bool,
}

impl GameClient {
    pub fn new(config: RaceConfig, catalog: TrackCatalog) -> Self {
        let tick_hz = config.race.tick_hz.max(1);
        Self {
            race: Race::new(config, catalog),
            events: EventLog::default(),
            last_stats: FrameStats::default(),
            frame: 0,
            dt: 1.0 / f64::from(tick_hz),
            canvas: Box::new(NullCanvas),
            quit: false,
        }
    }

    /// Replaces the drawing surface.
    pub fn with_canvas(mut self, canvas: Box<dyn Canvas + Send>) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn start(&mut self, track_index: usize) -> anyhow::Result<()> {
        self.events = EventLog::default();
        self.frame = 0;
        self.race
            .start(track_index)
            .with_context(|| format!("start track {track_index}"))
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds simulated per frame.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// One frame: sample input, tick, render, deliver events.
    pub fn step(&mut self, input: &mut dyn InputSource) -> FrameStats {
        let controls = input.sample(&self.race);
        self.race.tick(self.dt, controls);
        self.last_stats = self.race.render(self.canvas.as_mut());
        self.race.dispatch(&mut self.events);
        self.frame += 1;
        if self.frame % 600 == 0 {
            let player = self.race.player();
            info!(
                frame = self.frame,
                lap = player.lap,
                position = player.race_position,
                speed = player.speed,
                painted = self.last_stats.painted,
                "Frame"
            );
        }
        self.last_stats
    }

    /// Runs frames until `opts` says stop or `quit` is entered on the console.
    pub async fn run(
        &mut self,
        input: &mut dyn InputSource,
        mut console: Option<mpsc::Receiver<String>>,
        opts: LoopOptions,
    ) -> anyhow::Result<RunSummary> {
        let mut next = tokio::time::Instant::now();
        loop {
            if let Some(rx) = console.as_mut() {
                while let Ok(line) = rx.try_recv() {
                    match self.exec_console(&line) {
                        Ok(output) => {
                            for line in output {
                                println!("{line}");
                            }
                        }
                        Err(e) => println!("Error: {e:#}"),
                    }
                }
            }
            if self.quit {
                break;
            }
            if opts.max_frames.is_some_and(|max| self.frame >= max) {
                break;
            }
            if opts.exit_on_finish && self.race.state() == RaceState::Complete {
                break;
            }

            self.step(input);

            if let Some(pace) = opts.pace {
                next += pace;
                tokio::time::sleep_until(next).await;
            } else {
                tokio::task::yield_now().await;
            }
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        let player = self.race.player();
        RunSummary {
            track: self
                .race
                .track()
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            state: format!("{:?}", self.race.state()),
            frames: self.frame,
            elapsed: self.race.elapsed(),
            lap: player.lap,
            position: player.race_position,
            speed: player.speed,
            last_frame_painted: self.last_stats.painted,
            events: self.events.clone(),
        }
    }

    /// Executes a console command.
    pub fn exec_console(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        match tokens[0] {
            "status" => {
                let player = self.race.player();
                let mut out = vec![
                    format!("State: {:?}", self.race.state()),
                    format!("Frame: {}", self.frame),
                ];
                if let Some(track) = self.race.track() {
                    out.push(format!("Track: {} ({})", track.name, self.race.track_index()));
                }
                out.push(format!(
                    "Lap: {}/{}  Position: {}/{}",
                    player.lap.min(player.total_laps),
                    player.total_laps,
                    player.race_position,
                    self.race.opponents().len() + 1
                ));
                out.push(format!(
                    "Speed: {:.0}  Turbo: {:.0}",
                    player.speed, player.turbo
                ));
                out.push(format!(
                    "Painted: {}/{} segments, {} sprites",
                    self.last_stats.painted, self.last_stats.visible, self.last_stats.sprites
                ));
                Ok(out)
            }
            "tracks" => Ok(self
                .race
                .catalog()
                .tracks
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{i}: {} - {}", t.name, t.description))
                .collect()),
            "track" => {
                let Some(arg) = tokens.get(1) else {
                    return Ok(vec!["Usage: track <index>".to_string()]);
                };
                let index: usize = arg.parse().context("track index")?;
                self.start(index)?;
                Ok(vec![format!("Started track {index}")])
            }
            "next" => {
                self.race.next_track()?;
                self.events = EventLog::default();
                self.frame = 0;
                Ok(vec![format!("Started track {}", self.race.track_index())])
            }
            "restart" => {
                self.start(self.race.track_index())?;
                Ok(vec!["Restarted".to_string()])
            }
            "pause" => {
                let state = self.race.toggle_pause();
                Ok(vec![format!("State: {state:?}")])
            }
            "stop" => {
                self.race.stop();
                Ok(vec!["Stopped".to_string()])
            }
            "quit" | "exit" => {
                self.quit = true;
                Ok(vec![])
            }
            other => {
                warn!(command = other, "Unknown console command");
                Ok(vec![format!("Unknown command: {other}")])
            }
        }
    }
}
