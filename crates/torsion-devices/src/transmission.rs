//! Passive transmission blocks: axles, gearboxes, clutches.
//!
//! These devices carry rotation without originating it. Their only
//! behavior is structural: a gearbox side toggles open or closed, a clutch
//! engages or disengages, and each change revalidates through the manager.
//! A rejected change reverts the entity's local state so it never drifts
//! from the committed graph.

use torsion_core::fixed::Ticks;
use torsion_core::node::NodeSpec;
use torsion_core::space::{Axis, BlockPos, DirSet, Direction};

use crate::entity::{InvalidMarker, RotatingBlockEntity};
use crate::world::WorldContext;

// ---------------------------------------------------------------------------
// AxleEntity
// ---------------------------------------------------------------------------

/// A straight shaft along one axis. Identity rule, two opposite faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxleEntity {
    pos: BlockPos,
    axis: Axis,
    marker: InvalidMarker,
}

impl AxleEntity {
    pub fn new(pos: BlockPos, axis: Axis) -> Self {
        Self {
            pos,
            axis,
            marker: InvalidMarker::new(),
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Whether the grace window for an invalid axle has elapsed.
    pub fn should_destroy(&mut self, now: Ticks) -> bool {
        self.marker.should_destroy(now)
    }
}

impl RotatingBlockEntity for AxleEntity {
    fn node_spec(&self) -> NodeSpec {
        NodeSpec::axle(self.pos, self.axis)
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
// GearBoxEntity
// ---------------------------------------------------------------------------

/// A gearbox mounted on one axis with a configurable set of open sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GearBoxEntity {
    pos: BlockPos,
    axis: Axis,
    open_sides: DirSet,
    marker: InvalidMarker,
}

impl GearBoxEntity {
    pub fn new(pos: BlockPos, axis: Axis, open_sides: DirSet) -> Self {
        Self {
            pos,
            axis,
            open_sides,
            marker: InvalidMarker::new(),
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn open_sides(&self) -> DirSet {
        self.open_sides
    }

    /// Open or close one side and revalidate. A rejected change (the new
    /// edge would close a contradictory loop) reverts the side and leaves
    /// the committed graph untouched.
    pub fn set_side(&mut self, ctx: &mut WorldContext, side: Direction, open: bool) -> bool {
        let before = self.open_sides;
        if open {
            self.open_sides.insert(side);
        } else {
            self.open_sides.remove(side);
        }
        if self.open_sides == before {
            return true;
        }
        if ctx.update(self) {
            true
        } else {
            self.open_sides = before;
            self.marker.clear();
            false
        }
    }

    pub fn should_destroy(&mut self, now: Ticks) -> bool {
        self.marker.should_destroy(now)
    }
}

impl RotatingBlockEntity for GearBoxEntity {
    fn node_spec(&self) -> NodeSpec {
        NodeSpec::gearbox(self.pos, self.axis, self.open_sides)
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
// ClutchEntity
// ---------------------------------------------------------------------------

/// A toggleable coupling along one axis. Disengaging disconnects everything
/// downstream without removing the node from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClutchEntity {
    pos: BlockPos,
    axis: Axis,
    engaged: bool,
    marker: InvalidMarker,
}

impl ClutchEntity {
    pub fn new(pos: BlockPos, axis: Axis, engaged: bool) -> Self {
        Self {
            pos,
            axis,
            engaged,
            marker: InvalidMarker::new(),
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Engage or disengage and revalidate. Disengaging cannot conflict;
    /// engaging can (it may close a loop), in which case the clutch stays
    /// disengaged.
    pub fn set_engaged(&mut self, ctx: &mut WorldContext, engaged: bool) -> bool {
        if self.engaged == engaged {
            return true;
        }
        self.engaged = engaged;
        if ctx.update(self) {
            true
        } else {
            self.engaged = !engaged;
            self.marker.clear();
            false
        }
    }

    pub fn should_destroy(&mut self, now: Ticks) -> bool {
        self.marker.should_destroy(now)
    }
}

impl RotatingBlockEntity for ClutchEntity {
    fn node_spec(&self) -> NodeSpec {
        NodeSpec::clutch(self.pos, self.axis, self.engaged)
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
