//! Rotation-originating devices: hand wheel, windmill, water wheel.
//!
//! Each owns a source node and drives its speed through the manager's
//! source-motion path. Speed changes re-propagate the whole component, so
//! a behavior tick that ramps a windmill also updates every axle hanging
//! off it before the frame's rotation reads.

use torsion_core::fixed::{Fixed64, Ticks};
use torsion_core::node::NodeSpec;
use torsion_core::network::NetworkAction;
use torsion_core::space::{BlockPos, Direction};

use crate::entity::{InvalidMarker, RotatingBlockEntity};
use crate::world::WorldContext;

/// Step `current` toward `target`, clamping at the target so ramps land
/// exactly despite fixed-point rounding of the step size.
fn step_toward(current: Fixed64, target: Fixed64, step: Fixed64) -> Fixed64 {
    if current < target {
        (current + step).min(target)
    } else {
        (current - step).max(target)
    }
}

// ---------------------------------------------------------------------------
// HandWheel
// ---------------------------------------------------------------------------

/// Player-driven source. Cranking holds a fixed speed; once released, the
/// wheel coasts down to rest over a few ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandWheel {
    pos: BlockPos,
    facing: Direction,
    cranked: bool,
    marker: InvalidMarker,
}

impl HandWheel {
    /// Speed while cranked, radians per tick.
    pub const CRANK_SPEED: Fixed64 = Fixed64::lit("0.4");
    /// Coast-down per behavior tick after release.
    pub const DECAY_STEP: Fixed64 = Fixed64::lit("0.1");

    pub fn new(pos: BlockPos, facing: Direction) -> Self {
        Self {
            pos,
            facing,
            cranked: false,
            marker: InvalidMarker::new(),
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    /// Start or sustain cranking at [`HandWheel::CRANK_SPEED`].
    pub fn crank(&mut self, ctx: &mut WorldContext) -> bool {
        self.cranked = true;
        ctx.set_source_speed(self.pos, Self::CRANK_SPEED)
    }

    /// Stop cranking; the behavior tick decays speed from here.
    pub fn release(&mut self) {
        self.cranked = false;
    }

    /// Per-tick behavior, called before the world tick. A released wheel
    /// sheds [`HandWheel::DECAY_STEP`] of speed until it rests.
    pub fn tick_behavior(&mut self, ctx: &mut WorldContext) {
        if self.cranked {
            return;
        }
        let Some(rotation) = ctx.manager().rotation_at(self.pos) else {
            return;
        };
        if !rotation.is_turning() {
            return;
        }
        let next = step_toward(rotation.speed, Fixed64::ZERO, Self::DECAY_STEP);
        ctx.set_source_speed(self.pos, next);
    }

    pub fn should_destroy(&mut self, now: Ticks) -> bool {
        self.marker.should_destroy(now)
    }
}

impl RotatingBlockEntity for HandWheel {
    fn node_spec(&self) -> NodeSpec {
        NodeSpec::source(self.pos, self.facing, Self::CRANK_SPEED)
    }

    fn network_action(&self) -> NetworkAction {
        NetworkAction::AddSource
    }

    fn mark_invalid_in_network(&mut self, now: Ticks) {
        self.marker.mark(now);
    }

    fn is_invalid_in_network(&self) -> bool {
        self.marker.is_invalid()
    }

    fn clear_invalid_in_network(&mut self) {
        self.marker.clear();
    }
}

// ---------------------------------------------------------------------------
// Windmill
// ---------------------------------------------------------------------------

/// Wind-driven source. Target speed scales with sail count and wind
/// strength; each behavior tick ramps the current speed one step toward
/// the target rather than jumping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windmill {
    pos: BlockPos,
    facing: Direction,
    sail_count: u8,
    wind_strength: Fixed64,
    marker: InvalidMarker,
}

impl Windmill {
    /// Speed contribution per sail at full wind, radians per tick.
    pub const SPEED_PER_SAIL: Fixed64 = Fixed64::lit("0.1");
    /// Ramp step per behavior tick.
    pub const RAMP_STEP: Fixed64 = Fixed64::lit("0.05");

    pub fn new(pos: BlockPos, facing: Direction, sail_count: u8) -> Self {
        Self {
            pos,
            facing,
            sail_count,
            wind_strength: Fixed64::ZERO,
            marker: InvalidMarker::new(),
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    /// The speed this windmill is ramping toward.
    pub fn target_speed(&self) -> Fixed64 {
        Self::SPEED_PER_SAIL * Fixed64::from_num(self.sail_count) * self.wind_strength
    }

    /// External wind input, 0 for calm, 1 for full wind.
    pub fn set_wind(&mut self, strength: Fixed64) {
        self.wind_strength = strength;
    }

    /// Per-tick behavior: move the current speed one ramp step toward the
    /// target and re-propagate.
    pub fn tick_behavior(&mut self, ctx: &mut WorldContext) {
        let Some(rotation) = ctx.manager().rotation_at(self.pos) else {
            return;
        };
        let target = self.target_speed();
        if rotation.speed == target {
            return;
        }
        let next = step_toward(rotation.speed, target, Self::RAMP_STEP);
        ctx.set_source_speed(self.pos, next);
    }

    pub fn should_destroy(&mut self, now: Ticks) -> bool {
        self.marker.should_destroy(now)
    }
}

impl RotatingBlockEntity for Windmill {
    fn node_spec(&self) -> NodeSpec {
        NodeSpec::source(self.pos, self.facing, self.target_speed())
    }

    fn network_action(&self) -> NetworkAction {
        NetworkAction::AddSource
    }

    fn mark_invalid_in_network(&mut self, now: Ticks) {
        self.marker.mark(now);
    }

    fn is_invalid_in_network(&self) -> bool {
        self.marker.is_invalid()
    }

    fn clear_invalid_in_network(&mut self) {
        self.marker.clear();
    }
}

// ---------------------------------------------------------------------------
// WaterWheel
// ---------------------------------------------------------------------------

/// Source driven by external water flow: constant speed while the flow
/// holds, no ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterWheel {
    pos: BlockPos,
    facing: Direction,
    flow_speed: Fixed64,
    marker: InvalidMarker,
}

impl WaterWheel {
    pub fn new(pos: BlockPos, facing: Direction) -> Self {
        Self {
            pos,
            facing,
            flow_speed: Fixed64::ZERO,
            marker: InvalidMarker::new(),
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn flow_speed(&self) -> Fixed64 {
        self.flow_speed
    }

    /// The host reports a flow change (water placed, removed, redirected).
    pub fn set_flow(&mut self, ctx: &mut WorldContext, flow: Fixed64) -> bool {
        self.flow_speed = flow;
        ctx.set_source_speed(self.pos, flow)
    }

    pub fn should_destroy(&mut self, now: Ticks) -> bool {
        self.marker.should_destroy(now)
    }
}

impl RotatingBlockEntity for WaterWheel {
    fn node_spec(&self) -> NodeSpec {
        NodeSpec::source(self.pos, self.facing, self.flow_speed)
    }

    fn network_action(&self) -> NetworkAction {
        NetworkAction::AddSource
    }

    fn mark_invalid_in_network(&mut self, now: Ticks) {
        self.marker.mark(now);
    }

    fn is_invalid_in_network(&self) -> bool {
        self.marker.is_invalid()
    }

    fn clear_invalid_in_network(&mut self) {
        self.marker.clear();
    }
}
