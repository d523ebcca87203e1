//! Segment store.
//!
//! The track is a closed loop of equal-length segments. Segments are appended
//! by the track builder and never move or get reindexed afterwards; lookups by
//! z wrap around the loop in both directions.

use serde::{Deserialize, Serialize};

use crate::math::{ScreenPoint, WorldPoint};

/// Alternating palette selector, three segments per band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorBand {
    Light,
    Dark,
}

impl ColorBand {
    pub fn for_index(index: usize) -> Self {
        if (index / 3) % 2 == 1 {
            ColorBand::Dark
        } else {
            ColorBand::Light
        }
    }
}

/// A sprite placed beside (or on) the road.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneryObject {
    pub sprite: String,
    /// Lateral position in road half-widths; negative is left.
    pub offset: f64,
}

/// Corner slots in `Segment::world` and `Segment::screen`.
pub const NEAR_LEFT: usize = 0;
pub const NEAR_RIGHT: usize = 1;
pub const FAR_RIGHT: usize = 2;
pub const FAR_LEFT: usize = 3;

/// Fixed-length slice of track.
#[derive(Debug, Clone)]
pub struct Segment {
    pub index: usize,
    pub curve: f64,
    /// Near-left, near-right, far-right, far-left.
    pub world: [WorldPoint; 4],
    /// Projected corners, same order as `world`. Valid for the current frame.
    pub screen: [ScreenPoint; 4],
    pub color_band: ColorBand,
    pub clipped: bool,
    /// Only meaningful when not clipped.
    pub fog: f64,
    objects: Vec<SceneryObject>,
}

impl Segment {
    fn new(
        index: usize,
        curve: f64,
        near_y: f64,
        far_y: f64,
        length: f64,
        half_width: f64,
    ) -> Self {
        let z = index as f64 * length;
        Self {
            index,
            curve,
            world: [
                WorldPoint::new(-half_width, near_y, z),
                WorldPoint::new(half_width, near_y, z),
                WorldPoint::new(half_width, far_y, z + length),
                WorldPoint::new(-half_width, far_y, z + length),
            ],
            screen: [ScreenPoint::default(); 4],
            color_band: ColorBand::for_index(index),
            clipped: true,
            fog: 0.0,
            objects: Vec::new(),
        }
    }

    /// World z of the near edge.
    pub fn near_z(&self) -> f64 {
        self.world[NEAR_LEFT].z
    }

    pub fn far_z(&self) -> f64 {
        self.world[FAR_LEFT].z
    }

    /// Road surface height at the near edge.
    pub fn y(&self) -> f64 {
        self.world[NEAR_LEFT].y
    }

    pub fn far_y(&self) -> f64 {
        self.world[FAR_LEFT].y
    }

    /// Whether world `z` (already wrapped onto the track) lies in this segment.
    pub fn contains_z(&self, z: f64) -> bool {
        z >= self.near_z() && z < self.far_z()
    }

    pub fn objects(&self) -> &[SceneryObject] {
        &self.objects
    }
}

/// Owns the ordered segments of the current track.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    segments: Vec<Segment>,
    segment_length: f64,
    road_width: f64,
}

impl SegmentStore {
    pub fn new(segment_length: f64, road_width: f64) -> Self {
        Self {
            segments: Vec::new(),
            segment_length,
            road_width,
        }
    }

    /// Drops every segment; the track length becomes 0.
    pub fn reset(&mut self) {
        self.segments.clear();
    }

    pub(crate) fn push_segment(&mut self, curve: f64, near_y: f64, far_y: f64) -> usize {
        let index = self.segments.len();
        self.segments.push(Segment::new(
            index,
            curve,
            near_y,
            far_y,
            self.segment_length,
            self.road_width,
        ));
        index
    }

    pub(crate) fn push_object(&mut self, index: usize, object: SceneryObject) {
        if let Some(segment) = self.segments.get_mut(index) {
            segment.objects.push(object);
        }
    }

    /// Elevation the next appended segment continues from.
    pub fn last_y(&self) -> f64 {
        self.segments.last().map(Segment::far_y).unwrap_or(0.0)
    }

    /// Index of the segment containing `z`, wrapping around the loop.
    ///
    /// # Panics
    /// If the store is empty.
    pub fn index_at(&self, z: f64) -> usize {
        assert!(
            !self.segments.is_empty(),
            "segment lookup on an empty track"
        );
        let count = self.segments.len() as i64;
        let raw = (z / self.segment_length).floor() as i64;
        raw.rem_euclid(count) as usize
    }

    /// Segment containing `z`, wrapping around the loop.
    ///
    /// # Panics
    /// If the store is empty.
    pub fn segment_at(&self, z: f64) -> &Segment {
        &self.segments[self.index_at(z)]
    }

    /// Segment `n` places after `index`, wrapping.
    pub fn lookahead(&self, index: usize, n: usize) -> Option<&Segment> {
        if self.segments.is_empty() {
            return None;
        }
        self.segments.get((index + n) % self.segments.len())
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub(crate) fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    pub fn road_width(&self) -> f64 {
        self.road_width
    }

    pub fn track_length(&self) -> f64 {
        self.segments.len() as f64 * self.segment_length
    }

    /// Wraps a z coordinate onto `[0, track_length)`.
    pub fn wrap_z(&self, z: f64) -> f64 {
        let length = self.track_length();
        if length > 0.0 {
            z.rem_euclid(length)
        } else {
            z
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_store(n: usize) -> SegmentStore {
        let mut store = SegmentStore::new(200.0, 2000.0);
        for _ in 0..n {
            store.push_segment(0.0, 0.0, 0.0);
        }
        store
    }

    #[test]
    fn lookup_wraps_both_directions() {
        let store = straight_store(10);
        assert_eq!(store.track_length(), 2000.0);
        assert_eq!(store.segment_at(1999.0).index, 9);
        assert_eq!(store.segment_at(2000.0).index, 0);
        assert_eq!(store.segment_at(-1.0).index, 9);
        assert_eq!(store.segment_at(-2000.0).index, 0);
        for k in -3..=3 {
            let z = 730.0 + k as f64 * store.track_length();
            assert_eq!(store.segment_at(z).index, 3);
        }
    }

    #[test]
    fn color_bands_alternate_every_three() {
        let bands: Vec<_> = (0..7).map(ColorBand::for_index).collect();
        assert_eq!(
            bands,
            vec![
                ColorBand::Light,
                ColorBand::Light,
                ColorBand::Light,
                ColorBand::Dark,
                ColorBand::Dark,
                ColorBand::Dark,
                ColorBand::Light,
            ]
        );
    }

    #[test]
    fn corners_span_one_segment() {
        let store = straight_store(3);
        let seg = store.get(2).unwrap();
        assert_eq!(seg.near_z(), 400.0);
        assert_eq!(seg.far_z(), 600.0);
        assert_eq!(seg.world[NEAR_LEFT].x, -2000.0);
        assert_eq!(seg.world[FAR_RIGHT].x, 2000.0);
        assert!(seg.contains_z(599.9));
        assert!(!seg.contains_z(600.0));
    }

    #[test]
    fn reset_clears_track_length() {
        let mut store = straight_store(4);
        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.track_length(), 0.0);
    }

    #[test]
    #[should_panic(expected = "empty track")]
    fn lookup_on_empty_store_panics() {
        let store = SegmentStore::new(200.0, 2000.0);
        let _ = store.segment_at(0.0);
    }
}
