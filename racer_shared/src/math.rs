//! Math types.
//!
//! Everything here is `f64`: projected coordinates are rounded to whole
//! pixels and those results must match the browser build exactly.

use serde::{Deserialize, Serialize};

/// A point in track-relative space. `z` grows along the track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldPoint {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same point moved `dz` along the track.
    pub fn shifted_z(self, dz: f64) -> Self {
        Self::new(self.x, self.y, self.z + dz)
    }
}

/// Result of projecting a [`WorldPoint`].
///
/// `x`, `y` and `w` hold whole-pixel values (curve accumulation may later add
/// a fractional shift to `x`). `z` is the camera-space depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub z: f64,
}

/// Linear interpolation without clamping.
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Rounds halves toward positive infinity, like `Math.round`.
///
/// `f64::round` rounds halves away from zero, which differs for negative
/// inputs (`-2.5` → `-3` instead of `-2`).
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Whether the closed intervals `[a - aw/2, a + aw/2]` and
/// `[b - bw/2, b + bw/2]` intersect.
pub fn overlap(a: f64, a_width: f64, b: f64, b_width: f64) -> bool {
    let a_half = a_width / 2.0;
    let b_half = b_width / 2.0;
    a + a_half >= b - b_half && a - a_half <= b + b_half
}

/// Signed shortest distance from `from` to `to` on a loop of `length`.
///
/// Positive when `to` is ahead. Returns the plain difference for a
/// zero-length loop.
pub fn wrapped_delta(from: f64, to: f64, length: f64) -> f64 {
    if length <= 0.0 {
        return to - from;
    }
    let half = length / 2.0;
    (to - from + half).rem_euclid(length) - half
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_half_up_matches_browser_rounding() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.51), -3.0);
        assert_eq!(round_half_up(449.49), 449.0);
    }

    #[test]
    fn overlap_touching_and_disjoint() {
        assert!(overlap(0.0, 40.0, 60.0, 80.0));
        assert!(!overlap(0.0, 40.0, 61.0, 80.0));
        assert!(overlap(-10.0, 4.0, -10.0, 0.0));
    }

    #[test]
    fn wrapped_delta_prefers_short_way_round() {
        assert_eq!(wrapped_delta(100.0, 300.0, 2000.0), 200.0);
        assert_eq!(wrapped_delta(1900.0, 100.0, 2000.0), 200.0);
        assert_eq!(wrapped_delta(100.0, 1900.0, 2000.0), -200.0);
    }

    #[test]
    fn lerp_midpoint() {
        assert_eq!(lerp(10.0, 20.0, 0.5), 15.0);
        assert_eq!(lerp(0.0, 100.0, 0.1), 10.0);
    }
}
