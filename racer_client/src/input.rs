//! Input sources.
//!
//! The headless client has no keyboard, so each frame's [`InputState`] comes
//! from an [`InputSource`]: a simple driving heuristic or a fixed script.

use anyhow::{bail, Context};
use racer_shared::{input::InputState, race::Race};

/// Produces the controls held during the next tick.
pub trait InputSource {
    fn sample(&mut self, race: &Race) -> InputState;
}

/// Drives like an opponent would: full throttle, inside line through
/// bends, turbo on straights while the tank is above a reserve.
#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Turbo left untouched for later.
    pub turbo_reserve: f64,
    /// Distance from the chosen line tolerated before steering.
    pub tolerance: f64,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            turbo_reserve: 50.0,
            tolerance: 100.0,
        }
    }
}

impl InputSource for Autopilot {
    fn sample(&mut self, race: &Race) -> InputState {
        let mut input = InputState::ACCELERATE;
        let store = race.store();
        if store.is_empty() {
            return input;
        }
        let player = race.player();
        let curve = store.segment_at(player.z).curve;
        let line = if curve.abs() > 0.5 {
            curve.signum() * store.road_width() / 3.0
        } else {
            0.0
        };

        if player.x < line - self.tolerance {
            input |= InputState::STEER_RIGHT;
        } else if player.x > line + self.tolerance {
            input |= InputState::STEER_LEFT;
        }
        if curve == 0.0 && player.turbo > self.turbo_reserve {
            input |= InputState::TURBO;
        }
        input
    }
}

/// Replays `frames:keys` steps, then coasts.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    steps: Vec<(u64, InputState)>,
    step: usize,
    used: u64,
}

impl ScriptedInput {
    pub fn new(steps: Vec<(u64, InputState)>) -> Self {
        Self {
            steps,
            step: 0,
            used: 0,
        }
    }

    /// Parses a comma-separated script such as `"120:A,30:A+R,60:B"`.
    ///
    /// Keys use [`InputState::from_keys`] letters.
    pub fn parse(script: &str) -> anyhow::Result<Self> {
        let mut steps = Vec::new();
        for (i, part) in script.split(',').map(str::trim).enumerate() {
            if part.is_empty() {
                continue;
            }
            let Some((frames, keys)) = part.split_once(':') else {
                bail!("step {i} '{part}' is not frames:keys");
            };
            let frames: u64 = frames
                .trim()
                .parse()
                .with_context(|| format!("step {i} frame count"))?;
            steps.push((frames, InputState::from_keys(keys)));
        }
        Ok(Self::new(steps))
    }

    /// Frames covered by the whole script.
    pub fn len(&self) -> u64 {
        self.steps.iter().map(|(frames, _)| frames).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finished(&self) -> bool {
        self.step >= self.steps.len()
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self, _race: &Race) -> InputState {
        while let Some(&(frames, input)) = self.steps.get(self.step) {
            if self.used < frames {
                self.used += 1;
                return input;
            }
            self.step += 1;
            self.used = 0;
        }
        InputState::empty()
    }
}
