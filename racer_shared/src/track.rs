//! Track builder.
//!
//! Expands a list of directives into segments, then scatters scenery.
//!
//! Hills follow a half-sine: segment `i` of an `n`-segment hill has its near
//! edge at `start + sin(i·π/n)·height` and its far edge at the value for
//! `i + 1`, so the run closes exactly where it started.

use std::f64::consts::PI;

use anyhow::{bail, Context};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{SceneryConfig, TrackDefinition};
use crate::road::{SceneryObject, SegmentStore};

/// One instruction of a track layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TrackDirective {
    Straight { length: usize },
    Curve { length: usize, curve: f64 },
    Hill { length: usize, height: f64 },
}

impl TrackDirective {
    pub fn length(&self) -> usize {
        match *self {
            TrackDirective::Straight { length }
            | TrackDirective::Curve { length, .. }
            | TrackDirective::Hill { length, .. } => length,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.length() == 0 {
            bail!("directive has zero length: {self:?}");
        }
        match *self {
            TrackDirective::Curve { curve, .. } if !curve.is_finite() => {
                bail!("curve is not finite: {curve}")
            }
            TrackDirective::Hill { height, .. } if !height.is_finite() => {
                bail!("hill height is not finite: {height}")
            }
            _ => Ok(()),
        }
    }
}

/// Lateral bands scenery is dropped into, in road half-widths.
const LEFT_BAND: std::ops::Range<f64> = -2.0..-1.2;
const RIGHT_BAND: std::ops::Range<f64> = 1.2..2.0;

/// Builds segment stores from track definitions.
#[derive(Debug, Clone, Copy)]
pub struct TrackBuilder {
    segment_length: f64,
    road_width: f64,
}

impl TrackBuilder {
    pub fn new(segment_length: f64, road_width: f64) -> Self {
        Self {
            segment_length,
            road_width,
        }
    }

    /// Builds a fresh store for `track`.
    pub fn build<R: Rng>(
        &self,
        track: &TrackDefinition,
        rng: &mut R,
    ) -> anyhow::Result<SegmentStore> {
        let mut store = SegmentStore::new(self.segment_length, self.road_width);
        self.build_into(&mut store, track, rng)?;
        Ok(store)
    }

    /// Rebuilds `store` in place.
    ///
    /// The store is reset first; on error it is left empty.
    pub fn build_into<R: Rng>(
        &self,
        store: &mut SegmentStore,
        track: &TrackDefinition,
        rng: &mut R,
    ) -> anyhow::Result<()> {
        store.reset();
        validate_directives(&track.directives)
            .with_context(|| format!("track '{}'", track.name))?;

        for directive in &track.directives {
            match *directive {
                TrackDirective::Straight { length } => add_run(store, length, 0.0),
                TrackDirective::Curve { length, curve } => add_run(store, length, curve),
                TrackDirective::Hill { length, height } => add_hill(store, length, height),
            }
        }
        add_scenery(store, &track.scenery, rng);

        let objects: usize = store.segments().iter().map(|s| s.objects().len()).sum();
        info!(
            track = %track.name,
            segments = store.len(),
            track_length = store.track_length(),
            objects,
            "Track built"
        );
        Ok(())
    }
}

fn validate_directives(directives: &[TrackDirective]) -> anyhow::Result<()> {
    if directives.is_empty() {
        bail!("track has no directives");
    }
    for (i, directive) in directives.iter().enumerate() {
        directive
            .validate()
            .with_context(|| format!("directive {i}"))?;
    }
    Ok(())
}

/// Flat run at the current elevation.
fn add_run(store: &mut SegmentStore, length: usize, curve: f64) {
    let y = store.last_y();
    for _ in 0..length {
        store.push_segment(curve, y, y);
    }
}

fn add_hill(store: &mut SegmentStore, length: usize, height: f64) {
    let start = store.last_y();
    let n = length as f64;
    let profile = |i: usize| start + (i as f64 * PI / n).sin() * height;
    for i in 0..length {
        store.push_segment(0.0, profile(i), profile(i + 1));
    }
}

fn add_scenery<R: Rng>(store: &mut SegmentStore, scenery: &SceneryConfig, rng: &mut R) {
    if scenery.objects.is_empty() {
        return;
    }
    for index in 0..store.len() {
        if rng.gen::<f64>() >= scenery.frequency {
            continue;
        }
        for band in [LEFT_BAND, RIGHT_BAND] {
            let sprite = scenery.objects[rng.gen_range(0..scenery.objects.len())].clone();
            let offset = rng.gen_range(band);
            store.push_object(index, SceneryObject { sprite, offset });
        }
    }
}
