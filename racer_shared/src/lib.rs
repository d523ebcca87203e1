//! `racer_shared`
//!
//! Simulation and rendering core of the pseudo-3D racer.
//!
//! Design goals:
//! - Deterministic: every random choice comes from the race's seeded RNG.
//! - No globals: a [`race::Race`] owns all per-race state.
//! - Drawing goes through the [`render::Canvas`] trait; audio and UI listen
//!   through [`event::EventSink`].
//! - No `unsafe`.

pub mod backdrop;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod event;
pub mod input;
pub mod math;
pub mod opponent;
pub mod race;
pub mod render;
pub mod road;
pub mod track;
pub mod vehicle;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::camera::Camera;
    pub use crate::catalog::*;
    pub use crate::config::*;
    pub use crate::event::*;
    pub use crate::input::InputState;
    pub use crate::math::*;
    pub use crate::race::{Race, RaceState};
    pub use crate::render::{Canvas, FrameStats, NullCanvas, RecordingCanvas};
    pub use crate::road::{Segment, SegmentStore};
}
