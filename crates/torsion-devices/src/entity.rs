//! The contract every rotating device block entity implements, and the
//! invalid-then-delayed-recheck marker.
//!
//! A rejected network action does not destroy a block immediately: the
//! condition is often transient (two halves of a machine placed in the same
//! tick, a neighbor unloading first). The entity marks itself invalid,
//! keeps retrying for a short grace window, and only reports
//! `should_destroy` once the window has elapsed without a successful
//! recheck.

use serde::{Deserialize, Serialize};
use torsion_core::fixed::{Fixed64, Ticks};
use torsion_core::network::NetworkAction;
use torsion_core::node::NodeSpec;

use crate::world::WorldContext;

/// Ticks an invalid entity waits for the situation to resolve before its
/// delayed recheck commits to destruction.
pub const GRACE_TICKS: Ticks = 3;

// ---------------------------------------------------------------------------
// RotatingBlockEntity
// ---------------------------------------------------------------------------

/// The interface each device block entity implements to participate in a
/// rotation network.
///
/// Implementations only describe their node and forward lifecycle events;
/// all graph reasoning stays in the manager. Sinks are never independently
/// invalid, so their marker methods keep the default no-op/false bodies.
pub trait RotatingBlockEntity {
    /// The node this device contributes to the graph.
    fn node_spec(&self) -> NodeSpec;

    /// The action used when this device loads. `AddSource` for devices that
    /// originate rotation, `Add` for everything else.
    fn network_action(&self) -> NetworkAction {
        NetworkAction::Add
    }

    /// Record a rejected action. No-op for sinks.
    fn mark_invalid_in_network(&mut self, _now: Ticks) {}

    /// Whether this entity is currently flagged invalid. Always false for
    /// sinks.
    fn is_invalid_in_network(&self) -> bool {
        false
    }

    /// Clear the invalid flag after a successful recheck.
    fn clear_invalid_in_network(&mut self) {}

    /// Interpolated render angle: the committed angle plus `partial` (0..1)
    /// of one tick's travel. Purely for rendering/animation; never feeds
    /// back into the network.
    fn rotation(&self, ctx: &WorldContext, partial: Fixed64) -> Fixed64 {
        ctx.manager()
            .rotation_at(self.node_spec().pos)
            .map(|r| r.interpolated_angle(partial))
            .unwrap_or(Fixed64::ZERO)
    }
}

// ---------------------------------------------------------------------------
// InvalidMarker
// ---------------------------------------------------------------------------

/// Per-entity invalid flag plus the delayed-recheck schedule.
///
/// The flag is persisted; the recheck deadline is runtime-only and is
/// re-armed on load so a freshly loaded invalid block still gets its grace
/// window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidMarker {
    invalid: bool,
    #[serde(skip)]
    recheck_at: Option<Ticks>,
}

impl InvalidMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag the entity invalid and schedule the delayed recheck.
    pub fn mark(&mut self, now: Ticks) {
        self.invalid = true;
        self.recheck_at = Some(now + GRACE_TICKS);
    }

    /// A successful recheck clears both the flag and the schedule.
    pub fn clear(&mut self) {
        self.invalid = false;
        self.recheck_at = None;
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Whether the grace window has elapsed without the flag clearing.
    /// A deserialized marker with no armed deadline re-arms first.
    pub fn should_destroy(&mut self, now: Ticks) -> bool {
        if !self.invalid {
            return false;
        }
        match self.recheck_at {
            Some(deadline) => now >= deadline,
            None => {
                self.recheck_at = Some(now + GRACE_TICKS);
                false
            }
        }
    }
}
