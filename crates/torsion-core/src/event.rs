//! Typed network events, emitted on state *transitions* only and delivered
//! in batch from [`RotationNetworkManager::tick`].
//!
//! [`RotationNetworkManager::tick`]: crate::network::RotationNetworkManager::tick

use crate::fixed::Ticks;
use crate::network::ComponentId;
use crate::space::BlockPos;

/// Why the manager rejected an action. Diagnostic only -- the contract
/// surface is the boolean return of `perform_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Add at a position that already holds a node.
    DuplicateNode,
    /// Remove/update of a position with no registered node.
    UnknownNode,
    /// The merged component would contain more than one source.
    MultipleSources,
    /// A cycle implied two different rotations for the same node.
    InconsistentCycle,
    /// AddSource without a source kind, or Add with one.
    KindMismatch,
}

/// A network event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A component transitioned from stopped to turning.
    ComponentPowered { component: ComponentId, tick: Ticks },
    /// A component transitioned from turning to stopped.
    ComponentStopped { component: ComponentId, tick: Ticks },
    /// An action was rejected. The offending entity marks itself invalid
    /// and schedules a delayed recheck.
    ActionRejected {
        pos: BlockPos,
        reason: RejectReason,
        tick: Ticks,
    },
}
