//! Consumer machines: crankshaft, trip hammer, pump.
//!
//! Each terminates a chain through a single-connection sink node and turns
//! resolved rotation into machine output. Behavior ticks run after the
//! world tick, reading committed rotation; nothing here mutates the graph.
//! Sinks are never independently invalid, so none of these carry a marker.

use torsion_core::fixed::{Fixed64, PI, TWO_PI};
use torsion_core::node::NodeSpec;
use torsion_core::rotation::Rotation;
use torsion_core::space::{BlockPos, Direction};

use crate::entity::RotatingBlockEntity;
use crate::world::WorldContext;

// ---------------------------------------------------------------------------
// Crankshaft
// ---------------------------------------------------------------------------

/// Converts rotation into reciprocation for a host machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crankshaft {
    pos: BlockPos,
    facing: Direction,
}

impl Crankshaft {
    pub fn new(pos: BlockPos, facing: Direction) -> Self {
        Self { pos, facing }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    /// Piston extension in [0, 1], a triangle wave over the shaft angle:
    /// 0 at angle zero, 1 at half a turn, back to 0 at a full turn.
    pub fn stroke_extension(&self, ctx: &WorldContext, partial: Fixed64) -> Fixed64 {
        let theta = self.rotation(ctx, partial);
        if theta <= PI {
            theta / PI
        } else {
            (TWO_PI - theta) / PI
        }
    }
}

impl RotatingBlockEntity for Crankshaft {
    fn node_spec(&self) -> NodeSpec {
        NodeSpec::sink(self.pos, self.facing)
    }
}

// ---------------------------------------------------------------------------
// TripHammer
// ---------------------------------------------------------------------------

/// Cam-driven hammer: counts a strike each time the shaft angle sweeps
/// past the cam's release threshold, whichever way it turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripHammer {
    pos: BlockPos,
    facing: Direction,
    strikes: u64,
    last_angle: Fixed64,
}

impl TripHammer {
    /// Cam release angle.
    pub const STRIKE_ANGLE: Fixed64 = PI;

    pub fn new(pos: BlockPos, facing: Direction) -> Self {
        Self {
            pos,
            facing,
            strikes: 0,
            last_angle: Fixed64::ZERO,
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn strikes(&self) -> u64 {
        self.strikes
    }

    /// Per-tick behavior, called after the world tick. Compares the angle
    /// swept since the previous tick against the release threshold.
    pub fn tick_behavior(&mut self, ctx: &WorldContext) {
        let Some(rotation) = ctx.manager().rotation_at(self.pos) else {
            return;
        };
        if !rotation.is_turning() {
            self.last_angle = rotation.angle;
            return;
        }
        if self.swept_past_threshold(&rotation) {
            self.strikes += 1;
        }
        self.last_angle = rotation.angle;
    }

    fn swept_past_threshold(&self, rotation: &Rotation) -> bool {
        let magnitude = rotation.speed.abs();
        // A full turn or more per tick always passes the cam once.
        if magnitude >= TWO_PI || self.last_angle == rotation.angle {
            return true;
        }
        if rotation.speed > Fixed64::ZERO {
            in_arc_excl_incl(self.last_angle, rotation.angle, Self::STRIKE_ANGLE)
        } else {
            in_arc_incl_excl(rotation.angle, self.last_angle, Self::STRIKE_ANGLE)
        }
    }
}

impl RotatingBlockEntity for TripHammer {
    fn node_spec(&self) -> NodeSpec {
        NodeSpec::sink(self.pos, self.facing)
    }
}

/// Whether `t` lies in the wrapped arc (from, to], walking upward.
fn in_arc_excl_incl(from: Fixed64, to: Fixed64, t: Fixed64) -> bool {
    if from < to {
        t > from && t <= to
    } else {
        t > from || t <= to
    }
}

/// Whether `t` lies in the wrapped arc [from, to), walking upward.
fn in_arc_incl_excl(from: Fixed64, to: Fixed64, t: Fixed64) -> bool {
    if from < to {
        t >= from && t < to
    } else {
        t >= from || t < to
    }
}

// ---------------------------------------------------------------------------
// Pump
// ---------------------------------------------------------------------------

/// Pumps while the shaft turns fast enough, in either direction. Volume
/// accumulates proportionally to speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pump {
    pos: BlockPos,
    facing: Direction,
    volume: Fixed64,
}

impl Pump {
    /// Minimum shaft speed magnitude that moves any fluid.
    pub const MIN_WORKING_SPEED: Fixed64 = Fixed64::lit("0.1");

    pub fn new(pos: BlockPos, facing: Direction) -> Self {
        Self {
            pos,
            facing,
            volume: Fixed64::ZERO,
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    /// Total volume pumped so far.
    pub fn pumped_volume(&self) -> Fixed64 {
        self.volume
    }

    /// Whether the shaft currently turns fast enough to pump.
    pub fn is_active(&self, ctx: &WorldContext) -> bool {
        ctx.manager()
            .rotation_at(self.pos)
            .is_some_and(|r| r.speed.abs() >= Self::MIN_WORKING_SPEED)
    }

    /// Per-tick behavior, called after the world tick.
    pub fn tick_behavior(&mut self, ctx: &WorldContext) {
        let Some(rotation) = ctx.manager().rotation_at(self.pos) else {
            return;
        };
        let magnitude = rotation.speed.abs();
        if magnitude >= Self::MIN_WORKING_SPEED {
            self.volume += magnitude;
        }
    }
}

impl RotatingBlockEntity for Pump {
    fn node_spec(&self) -> NodeSpec {
        NodeSpec::sink(self.pos, self.facing)
    }
}
