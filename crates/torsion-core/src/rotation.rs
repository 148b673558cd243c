//! Rotation state: the (angle, speed, handedness) triple propagated through
//! a network and advanced one tick at a time.
//!
//! All arithmetic is Q32.32 fixed-point, so tick advancement and save/load
//! round-trips are bit-exact. The angle wraps at 2*pi; speed is signed
//! radians per tick.

use crate::fixed::{Fixed64, wrap_angle};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Handedness
// ---------------------------------------------------------------------------

/// Which way a shaft turns, viewed along its canonical facing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl Handedness {
    pub fn opposite(&self) -> Handedness {
        match self {
            Handedness::Clockwise => Handedness::CounterClockwise,
            Handedness::CounterClockwise => Handedness::Clockwise,
        }
    }
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// The resolved rotation of one node.
///
/// Sources own theirs authoritatively; every other node mirrors the value
/// the propagation pass derived for it. Two rotations agree mechanically
/// when speed and sense match -- the angle is derived state and never part
/// of conflict checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
    /// Current angle in radians, wrapped into [0, 2*pi).
    pub angle: Fixed64,
    /// Signed speed in radians per tick.
    pub speed: Fixed64,
    /// Rotation handedness.
    pub sense: Handedness,
}

impl Rotation {
    /// A rotation at rest.
    pub fn stopped() -> Self {
        Self::default()
    }

    /// A moving rotation starting at angle zero.
    pub fn with_speed(speed: Fixed64) -> Self {
        Self {
            angle: Fixed64::ZERO,
            speed,
            sense: Handedness::Clockwise,
        }
    }

    /// (Re)start motion at the given angle and speed.
    pub fn set(&mut self, angle: Fixed64, speed: Fixed64) {
        self.angle = wrap_angle(angle);
        self.speed = speed;
    }

    /// Stop motion and rewind the angle to zero.
    pub fn reset(&mut self) {
        self.angle = Fixed64::ZERO;
        self.speed = Fixed64::ZERO;
    }

    /// Advance one tick: angle moves by speed, wrapping at 2*pi.
    pub fn advance(&mut self) {
        self.angle = wrap_angle(self.angle + self.speed);
    }

    /// Whether this rotation is in motion.
    pub fn is_turning(&self) -> bool {
        self.speed != Fixed64::ZERO
    }

    /// Non-authoritative per-frame angle for rendering: the committed angle
    /// plus `partial` (0..1) of one tick's travel, wrapped.
    pub fn interpolated_angle(&self, partial: Fixed64) -> Fixed64 {
        wrap_angle(self.angle + self.speed * partial)
    }

    /// Mechanical agreement: same speed and same sense. Angle excluded.
    pub fn agrees_with(&self, other: &Rotation) -> bool {
        self.speed == other.speed && self.sense == other.sense
    }

    /// This rotation with the opposite handedness.
    pub fn inverted(&self) -> Rotation {
        Rotation {
            sense: self.sense.opposite(),
            ..*self
        }
    }

    /// This rotation with negated speed (flipped rotation convention).
    pub fn reversed(&self) -> Rotation {
        Rotation {
            speed: -self.speed,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::{TWO_PI, f64_to_fixed64};

    fn f(v: f64) -> Fixed64 {
        f64_to_fixed64(v)
    }

    #[test]
    fn stopped_is_at_rest() {
        let r = Rotation::stopped();
        assert_eq!(r.angle, Fixed64::ZERO);
        assert_eq!(r.speed, Fixed64::ZERO);
        assert!(!r.is_turning());
    }

    #[test]
    fn advance_accumulates_speed() {
        let mut r = Rotation::with_speed(f(0.5));
        r.advance();
        r.advance();
        assert_eq!(r.angle, f(1.0));
    }

    #[test]
    fn advance_wraps_at_two_pi() {
        let mut r = Rotation::stopped();
        r.set(TWO_PI - f(0.1), f(0.3));
        r.advance();
        assert_eq!(r.angle, f(0.2));
    }

    #[test]
    fn negative_speed_wraps_downward() {
        let mut r = Rotation::with_speed(f(-0.25));
        r.advance();
        assert_eq!(r.angle, TWO_PI - f(0.25));
    }

    #[test]
    fn set_wraps_angle() {
        let mut r = Rotation::stopped();
        r.set(TWO_PI + f(1.0), f(0.1));
        assert_eq!(r.angle, f(1.0));
        assert_eq!(r.speed, f(0.1));
    }

    #[test]
    fn reset_stops_motion() {
        let mut r = Rotation::with_speed(f(2.0));
        r.advance();
        r.reset();
        assert_eq!(r, Rotation::stopped());
    }

    #[test]
    fn interpolated_angle_is_partial_advance() {
        let r = Rotation {
            angle: f(1.0),
            speed: f(0.5),
            sense: Handedness::Clockwise,
        };
        assert_eq!(r.interpolated_angle(f(0.5)), f(1.25));
        // Interpolation never mutates committed state.
        assert_eq!(r.angle, f(1.0));
    }

    #[test]
    fn agreement_ignores_angle() {
        let a = Rotation {
            angle: f(0.0),
            speed: f(1.0),
            sense: Handedness::Clockwise,
        };
        let b = Rotation {
            angle: f(3.0),
            speed: f(1.0),
            sense: Handedness::Clockwise,
        };
        assert!(a.agrees_with(&b));
    }

    #[test]
    fn agreement_requires_matching_sense() {
        let a = Rotation::with_speed(f(1.0));
        let b = a.inverted();
        assert!(!a.agrees_with(&b));
        assert!(a.agrees_with(&b.inverted()));
    }

    #[test]
    fn agreement_requires_matching_speed() {
        let a = Rotation::with_speed(f(1.0));
        let b = a.reversed();
        assert!(!a.agrees_with(&b));
    }

    #[test]
    fn serde_round_trip_is_bit_exact() {
        let mut r = Rotation::with_speed(f(1.0) / f(3.0));
        r.advance();
        let encoded = bitcode_round_trip(&r);
        assert_eq!(encoded, r);

        // Tick advancement after the round trip matches the original timeline.
        let mut original = r;
        let mut restored = encoded;
        for _ in 0..100 {
            original.advance();
            restored.advance();
        }
        assert_eq!(original, restored);
    }

    /// Round-trip through bitcode, the engine's snapshot codec.
    fn bitcode_round_trip(r: &Rotation) -> Rotation {
        let bytes = bitcode::serialize(r).unwrap();
        bitcode::deserialize(&bytes).unwrap()
    }
}
