//! `racer_client`
//!
//! Client-side systems:
//! - Frame loop driving a [`racer_shared::race::Race`]
//! - Input sources (autopilot, scripted)
//! - Console commands
//! - Event log standing in for audio and HUD

pub mod client;
pub mod input;

pub use client::GameClient;
