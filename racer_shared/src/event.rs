//! Race events.
//!
//! The simulation queues discrete notifications (collisions, turbo edges,
//! laps). Audio and UI collaborators receive them through an [`EventSink`]
//! after the tick; the race never waits on their response.

use serde::{Deserialize, Serialize};

/// Which car an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleId {
    Player,
    Opponent(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Scraped the road boundary.
    Wall,
    /// Hit a scenery object.
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RaceEvent {
    Collision {
        vehicle: VehicleId,
        kind: CollisionKind,
        /// Camera shake requested for this hit.
        shake: f64,
    },
    TurboEngaged,
    TurboDisengaged,
    LapCompleted {
        vehicle: VehicleId,
        lap: u32,
    },
    RaceComplete {
        position: usize,
    },
}

/// Receives events once per tick.
pub trait EventSink {
    fn on_event(&mut self, event: &RaceEvent);
}

/// Discards everything.
#[derive(Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _event: &RaceEvent) {}
}

impl EventSink for Vec<RaceEvent> {
    fn on_event(&mut self, event: &RaceEvent) {
        self.push(event.clone());
    }
}

/// FIFO queue of pending events.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<RaceEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: RaceEvent) {
        self.pending.push(event);
    }

    /// Removes and returns every queued event in push order.
    pub fn drain(&mut self) -> Vec<RaceEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RaceEvent> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
