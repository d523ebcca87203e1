//! Camera and projector.
//!
//! Projection is the classic combined-scaling trick: translate into camera
//! space, rotate the (x, z) pair by a small yaw derived from the road curve,
//! then divide by depth. There is no pitch or roll and no matrix stack; road
//! bends come from [`accumulate_curves`], not from real 3D rotation.
//!
//! Projected x, y and w are rounded to whole pixels with browser rounding.
//! That blockiness is part of the look and is relied on by visual regression
//! tests, so do not replace it with `f64::round`.

use rand::Rng;

use crate::{
    config::CameraConfig,
    math::{lerp, round_half_up, ScreenPoint, WorldPoint},
    road::{Segment, NEAR_LEFT, NEAR_RIGHT},
};

/// Smallest camera-space depth fed into the perspective divide.
pub const MIN_DEPTH: f64 = 0.1;

/// Remaining lifetime treated as expired; absorbs drift from summing `dt`.
const SHAKE_EPSILON: f64 = 1e-9;

/// Output surface as seen by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenInfo {
    pub width: f64,
    pub height: f64,
    /// `height / reference_height`; sizes sprites and lane markers.
    pub scale: f64,
}

/// A temporary offset added on top of the followed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shake {
    pub offset_x: f64,
    pub offset_y: f64,
    /// Seconds until the offset is dropped.
    pub remaining: f64,
}

#[derive(Debug, Clone)]
pub struct Camera {
    /// Followed position, without shake.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Yaw in radians.
    pub rotation: f64,
    view_depth: f64,
    screen: ScreenInfo,
    shakes: Vec<Shake>,
    cfg: CameraConfig,
}

impl Camera {
    pub fn new(cfg: CameraConfig) -> Self {
        Self {
            x: 0.0,
            y: cfg.start_height,
            z: 0.0,
            rotation: 0.0,
            view_depth: 1.0 / half_fov_tan(cfg.fov_degrees),
            screen: ScreenInfo::default(),
            shakes: Vec::new(),
            cfg,
        }
    }

    /// Resets to the track start and derives depth/scale from the viewport.
    pub fn init(&mut self, width: f64, height: f64) {
        self.screen = ScreenInfo {
            width,
            height,
            scale: height / self.cfg.reference_height,
        };
        self.x = 0.0;
        self.y = self.cfg.start_height;
        self.z = 0.0;
        self.rotation = 0.0;
        self.shakes.clear();
        self.view_depth = (height / 2.0) / half_fov_tan(self.cfg.fov_degrees);
    }

    /// Trails the vehicle. Call once per frame before any projection.
    ///
    /// `segment` must be the segment the vehicle occupies; its curve drives
    /// the lean into bends.
    pub fn follow(&mut self, x: f64, y: f64, z: f64, segment: &Segment) {
        let k = self.cfg.follow_smoothing;
        self.x = lerp(self.x, x, k);
        self.y = lerp(self.y, self.cfg.player_height + y, k);
        self.z = z - self.cfg.distance_to_player;

        let target_rotation = -segment.curve * self.cfg.rotation_gain;
        self.rotation = lerp(self.rotation, target_rotation, k);
    }

    /// Followed position plus every active shake.
    pub fn position(&self) -> WorldPoint {
        let (dx, dy) = self.shake_offset();
        WorldPoint::new(self.x + dx, self.y + dy, self.z)
    }

    pub fn shake_offset(&self) -> (f64, f64) {
        self.shakes.iter().fold((0.0, 0.0), |(x, y), s| {
            (x + s.offset_x, y + s.offset_y)
        })
    }

    /// Projects a world point onto a `width` × `height` surface.
    pub fn project(&self, point: WorldPoint, width: f64, height: f64) -> ScreenPoint {
        let eye = self.position();
        let tx = point.x - eye.x;
        let ty = point.y - eye.y;
        let tz = (point.z - eye.z).max(MIN_DEPTH);

        let (sin, cos) = self.rotation.sin_cos();
        let rx = tx * cos - tz * sin;
        let rz = tx * sin + tz * cos;

        let perspective = self.view_depth / rz;
        ScreenPoint {
            x: round_half_up(width / 2.0 + rx * perspective * width / 2.0),
            y: round_half_up(height / 2.0 - ty * perspective * height / 2.0),
            w: round_half_up(perspective * self.screen.scale),
            z: rz,
        }
    }

    pub fn is_behind_camera(&self, z: f64) -> bool {
        z <= self.z
    }

    /// Fog weight for world `z`: 0 at the camera, tending to 1 with distance.
    pub fn fog(&self, z: f64) -> f64 {
        let distance = (z - self.z).max(0.0);
        let d = self.cfg.fog_density * distance;
        (1.0 - (-(d * d)).exp()).clamp(0.0, 1.0)
    }

    /// Projects the four corners of `segment` into its screen slots.
    ///
    /// `z_offset` moves the segment into the camera's unwrapped z range when
    /// it is seen across the track's wrap point.
    pub fn project_segment(&self, segment: &mut Segment, z_offset: f64) {
        let (width, height) = (self.screen.width, self.screen.height);
        for (screen, world) in segment.screen.iter_mut().zip(segment.world.iter()) {
            *screen = self.project(world.shifted_z(z_offset), width, height);
        }

        segment.clipped = self.is_behind_camera(segment.world[NEAR_LEFT].z + z_offset)
            || self.is_behind_camera(segment.world[NEAR_RIGHT].z + z_offset);

        if !segment.clipped {
            let mean_z = segment.world.iter().map(|p| p.z).sum::<f64>() / 4.0 + z_offset;
            segment.fog = self.fog(mean_z);
        }
    }

    /// Sprite scale at world `z`.
    pub fn scale_at(&self, z: f64) -> f64 {
        let depth = (z - self.z) * self.view_depth;
        self.screen.scale / depth.max(1.0)
    }

    /// Screen row for a world height, ignoring depth.
    pub fn screen_y(&self, world_y: f64, height: f64) -> f64 {
        height / 2.0 - ((world_y - self.y) / self.view_depth) * height / 2.0
    }

    /// Adds a random offset of up to `intensity / 2` on x and y.
    ///
    /// The offset lives for `shake_duration` seconds of [`Camera::advance`]
    /// and is then removed on its own; other active shakes are untouched.
    pub fn shake<R: Rng>(&mut self, intensity: f64, rng: &mut R) {
        let offset_x = (rng.gen::<f64>() - 0.5) * intensity;
        let offset_y = (rng.gen::<f64>() - 0.5) * intensity;
        self.push_shake(Shake {
            offset_x,
            offset_y,
            remaining: self.cfg.shake_duration,
        });
    }

    pub fn push_shake(&mut self, shake: Shake) {
        self.shakes.push(shake);
    }

    /// Ages active shakes by `dt` seconds and drops the expired ones.
    pub fn advance(&mut self, dt: f64) {
        for shake in &mut self.shakes {
            shake.remaining -= dt;
        }
        self.shakes.retain(|s| s.remaining > SHAKE_EPSILON);
    }

    pub fn clear_shakes(&mut self) {
        self.shakes.clear();
    }

    pub fn shakes(&self) -> &[Shake] {
        &self.shakes
    }

    pub fn view_depth(&self) -> f64 {
        self.view_depth
    }

    pub fn screen(&self) -> ScreenInfo {
        self.screen
    }

    pub fn draw_distance(&self) -> f64 {
        self.cfg.draw_distance
    }

    pub fn config(&self) -> &CameraConfig {
        &self.cfg
    }
}

fn half_fov_tan(fov_degrees: f64) -> f64 {
    (fov_degrees / 2.0).to_radians().tan()
}

/// Lateral screen shift for a segment with `curve` at depth `near_z`.
pub fn curve_shift(curve: f64, near_z: f64, draw_distance: f64) -> f64 {
    curve * (near_z / draw_distance)
}

/// Bends the road on screen.
///
/// Every curved segment whose projected near depth is within
/// `draw_distance` has both near-edge x values moved by [`curve_shift`].
/// Each shift only looks at its own segment, so long sharp curves show seams
/// between segments.
pub fn accumulate_curves<'a, I>(segments: I, draw_distance: f64)
where
    I: IntoIterator<Item = &'a mut Segment>,
{
    for segment in segments {
        let near_z = segment.screen[NEAR_LEFT].z;
        if segment.curve == 0.0 || near_z > draw_distance {
            continue;
        }
        let shift = curve_shift(segment.curve, near_z, draw_distance);
        segment.screen[NEAR_LEFT].x += shift;
        segment.screen[NEAR_RIGHT].x += shift;
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::road::SegmentStore;

    fn camera() -> Camera {
        let mut cam = Camera::new(CameraConfig::default());
        cam.init(900.0, 600.0);
        cam
    }

    fn curved_store(curve: f64, n: usize) -> SegmentStore {
        let mut store = SegmentStore::new(200.0, 2000.0);
        for _ in 0..n {
            store.push_segment(curve, 0.0, 0.0);
        }
        store
    }

    #[test]
    fn init_derives_depth_and_scale() {
        let cam = camera();
        let expected = 300.0 / (50.0f64).to_radians().tan();
        assert!((cam.view_depth() - expected).abs() < 1e-9);
        assert_eq!(cam.screen().scale, 1.25);
        assert_eq!(cam.position(), WorldPoint::new(0.0, 1000.0, 0.0));
    }

    #[test]
    fn point_ahead_projects_to_centre_column() {
        let cam = camera();
        let p = cam.project(WorldPoint::new(0.0, cam.y, 500.0), 900.0, 600.0);
        assert_eq!(p.x, 450.0);
        assert_eq!(p.y, 300.0);
        assert_eq!(p.z, 500.0);
        assert_eq!(cam.view_depth() / p.z, cam.view_depth() / 500.0);
        assert_eq!(p.w, round_half_up(cam.view_depth() / 500.0 * 1.25));
    }

    #[test]
    fn projection_rounds_to_whole_pixels() {
        let cam = camera();
        let p = cam.project(WorldPoint::new(3.0, 997.0, 800.0), 900.0, 600.0);
        let perspective = cam.view_depth() / 800.0;
        assert_eq!(p.x, (450.0 + 3.0 * perspective * 450.0 + 0.5).floor());
        assert_eq!(p.y, (300.0 + 3.0 * perspective * 300.0 + 0.5).floor());
        assert_eq!(p.x.fract(), 0.0);
        assert_eq!(p.y.fract(), 0.0);
    }

    #[test]
    fn depth_is_clamped_behind_camera() {
        let cam = camera();
        let p = cam.project(WorldPoint::new(0.0, 1000.0, -50.0), 900.0, 600.0);
        assert_eq!(p.z, MIN_DEPTH);
        assert!(p.w.is_finite());
    }

    #[test]
    fn rotation_moves_straight_ahead_point_off_centre() {
        let mut cam = camera();
        cam.rotation = 0.1;
        let p = cam.project(WorldPoint::new(0.0, 1000.0, 500.0), 900.0, 600.0);
        assert!(p.x < 450.0);
        assert!((p.z - 500.0 * 0.1f64.cos()).abs() < 1e-9);
    }

    #[test]
    fn follow_smooths_xy_and_sets_z() {
        let mut cam = camera();
        let store = curved_store(2.0, 1);
        let seg = store.get(0).unwrap();
        cam.follow(100.0, 0.0, 2000.0, seg);
        assert!((cam.x - 10.0).abs() < 1e-12);
        assert!((cam.y - (1000.0 + 0.1 * (500.0 - 1000.0))).abs() < 1e-12);
        assert_eq!(cam.z, 1500.0);
        assert!((cam.rotation - 0.1 * (-2.0 * 0.13)).abs() < 1e-12);

        for _ in 0..500 {
            cam.follow(100.0, 0.0, 2000.0, seg);
        }
        assert!((cam.x - 100.0).abs() < 1e-6);
        assert!((cam.rotation + 0.26).abs() < 1e-6);
    }

    #[test]
    fn behind_camera_is_inclusive() {
        let mut cam = camera();
        cam.z = 400.0;
        assert!(cam.is_behind_camera(400.0));
        assert!(cam.is_behind_camera(100.0));
        assert!(!cam.is_behind_camera(400.5));
    }

    #[test]
    fn fog_is_monotonic_and_saturates() {
        let mut cam = camera();
        cam.z = 1000.0;
        assert_eq!(cam.fog(1000.0), 0.0);
        assert_eq!(cam.fog(500.0), 0.0);
        let mut last = 0.0;
        for step in 0..200 {
            let f = cam.fog(1000.0 + step as f64 * 50.0);
            assert!(f >= last);
            assert!((0.0..=1.0).contains(&f));
            last = f;
        }
        assert_eq!(cam.fog(1000.0 + 20_000.0), 1.0);
    }

    #[test]
    fn segment_clipping_uses_near_edge() {
        let mut cam = camera();
        let mut store = curved_store(0.0, 3);
        cam.z = 200.0;
        let behind = &mut store.segments_mut()[1];
        cam.project_segment(behind, 0.0);
        assert!(behind.clipped);

        let ahead = &mut store.segments_mut()[2];
        cam.project_segment(ahead, 0.0);
        assert!(!ahead.clipped);
        assert!((ahead.fog - cam.fog(500.0)).abs() < 1e-12);

        // Segment 0 seen again one lap later.
        let wrapped = &mut store.segments_mut()[0];
        cam.project_segment(wrapped, 600.0);
        assert!(!wrapped.clipped);
        assert_eq!(wrapped.screen[NEAR_LEFT].z, 400.0);
    }

    #[test]
    fn curve_shift_is_proportional_to_depth() {
        let d = 3000.0;
        let c = 2.0;
        assert_eq!(curve_shift(c, 0.0, d), 0.0);
        assert_eq!(curve_shift(c, d / 2.0, d), 1.0);
        assert_eq!(curve_shift(c, d, d), 2.0);
    }

    #[test]
    fn accumulation_shifts_near_edge_within_draw_distance() {
        let cam = camera();
        let mut store = curved_store(1.5, 20);
        let draw_distance = 3000.0;
        let before: Vec<_> = (0..20)
            .map(|i| {
                let seg = &mut store.segments_mut()[i];
                cam.project_segment(seg, 0.0);
                seg.screen
            })
            .collect();

        let mut segs: Vec<Segment> = store.segments().to_vec();
        accumulate_curves(segs.iter_mut(), draw_distance);

        for (seg, screen) in segs.iter().zip(&before) {
            let near_z = screen[NEAR_LEFT].z;
            let expected = if near_z <= draw_distance {
                curve_shift(1.5, near_z, draw_distance)
            } else {
                0.0
            };
            assert_eq!(seg.screen[NEAR_LEFT].x, screen[NEAR_LEFT].x + expected);
            assert_eq!(seg.screen[NEAR_RIGHT].x, screen[NEAR_RIGHT].x + expected);
            assert_eq!(seg.screen[2].x, screen[2].x);
        }
    }

    #[test]
    fn straight_segments_are_not_shifted() {
        let cam = camera();
        let mut store = curved_store(0.0, 5);
        let mut segs: Vec<Segment> = Vec::new();
        for i in 0..5 {
            let seg = &mut store.segments_mut()[i];
            cam.project_segment(seg, 0.0);
            segs.push(seg.clone());
        }
        let before: Vec<_> = segs.iter().map(|s| s.screen).collect();
        accumulate_curves(segs.iter_mut(), 3000.0);
        for (seg, screen) in segs.iter().zip(before) {
            assert_eq!(seg.screen, screen);
        }
    }

    #[test]
    fn scale_and_screen_y_formulas() {
        let mut cam = camera();
        cam.z = 100.0;
        let v = cam.view_depth();
        assert_eq!(cam.scale_at(600.0), 1.25 / (500.0 * v));
        // Within one unit of depth the divisor is clamped to 1.
        assert_eq!(cam.scale_at(100.0), 1.25);
        assert_eq!(cam.screen_y(cam.y, 600.0), 300.0);
        assert!(cam.screen_y(cam.y + v, 600.0).abs() < 1e-9);
    }

    #[test]
    fn shakes_compose_and_expire_independently() {
        let mut cam = camera();
        cam.push_shake(Shake {
            offset_x: 2.0,
            offset_y: -1.0,
            remaining: 0.05,
        });
        cam.advance(0.03);
        cam.push_shake(Shake {
            offset_x: 0.5,
            offset_y: 0.25,
            remaining: 0.05,
        });
        assert_eq!(cam.shake_offset(), (2.5, -0.75));
        assert_eq!(cam.position().x, 2.5);

        // First shake expires; the second keeps its own offset.
        cam.advance(0.03);
        assert_eq!(cam.shakes().len(), 1);
        assert_eq!(cam.shake_offset(), (0.5, 0.25));

        cam.advance(0.03);
        assert!(cam.shakes().is_empty());
        assert_eq!(cam.position(), WorldPoint::new(0.0, 1000.0, 0.0));
    }

    #[test]
    fn random_shake_is_bounded_and_reverts() {
        let mut cam = camera();
        let mut rng = StdRng::seed_from_u64(9);
        cam.shake(5.0, &mut rng);
        cam.shake(5.0, &mut rng);
        let (dx, dy) = cam.shake_offset();
        assert!(dx.abs() <= 5.0 && dy.abs() <= 5.0);
        assert_eq!(cam.x, 0.0);
        cam.advance(0.06);
        assert_eq!(cam.shake_offset(), (0.0, 0.0));
    }

    #[test]
    fn shake_lasts_exactly_three_frames_at_60hz() {
        let mut cam = camera();
        cam.push_shake(Shake {
            offset_x: 1.0,
            offset_y: 1.0,
            remaining: 0.05,
        });
        let dt = 1.0 / 60.0;
        cam.advance(dt);
        cam.advance(dt);
        assert_eq!(cam.shakes().len(), 1);
        cam.advance(dt);
        assert!(
            cam.shakes().is_empty(),
            "remaining: {:?}",
            cam.shakes().first().map(|s| s.remaining)
        );
    }
}
