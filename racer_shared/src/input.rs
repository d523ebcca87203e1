//! Per-tick control state.
//!
//! Sampled once per tick by the host (keyboard, autopilot, script) and handed
//! to the player update.

bitflags::bitflags! {
    /// Held controls.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputState: u8 {
        const STEER_LEFT = 1 << 0;
        const STEER_RIGHT = 1 << 1;
        const ACCELERATE = 1 << 2;
        const BRAKE = 1 << 3;
        const TURBO = 1 << 4;
    }
}

impl InputState {
    /// -1 for left, +1 for right, 0 when neither or both are held.
    pub fn steering(self) -> f64 {
        match (
            self.contains(Self::STEER_LEFT),
            self.contains(Self::STEER_RIGHT),
        ) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Parses a compact key string such as `"AL"` or `"A+T"`.
    ///
    /// `A` accelerate, `B` brake, `L` left, `R` right, `T` turbo; other
    /// characters are ignored.
    pub fn from_keys(keys: &str) -> Self {
        keys.chars().fold(Self::empty(), |acc, c| {
            acc | match c.to_ascii_uppercase() {
                'A' => Self::ACCELERATE,
                'B' => Self::BRAKE,
                'L' => Self::STEER_LEFT,
                'R' => Self::STEER_RIGHT,
                'T' => Self::TURBO,
                _ => Self::empty(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steering_direction() {
        assert_eq!(InputState::STEER_LEFT.steering(), -1.0);
        assert_eq!(InputState::STEER_RIGHT.steering(), 1.0);
        assert_eq!(
            (InputState::STEER_LEFT | InputState::STEER_RIGHT).steering(),
            0.0
        );
        assert_eq!(InputState::ACCELERATE.steering(), 0.0);
    }

    #[test]
    fn parses_key_strings() {
        assert_eq!(
            InputState::from_keys("a+t"),
            InputState::ACCELERATE | InputState::TURBO
        );
        assert_eq!(InputState::from_keys("BR"), InputState::BRAKE | InputState::STEER_RIGHT);
        assert_eq!(InputState::from_keys(""), InputState::empty());
    }
}
