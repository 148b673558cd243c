//! Node kinds and the rotation-mapping rule.
//!
//! Each device block contributes one graph node: a position, a set of
//! connection directions, and a rule mapping an incoming rotation to an
//! outgoing one. The rule is a pure function of (incoming rotation, entry
//! direction, exit direction) so propagation is deterministic and
//! replayable; device behavior (ramps, cams, strokes) lives in the device
//! layer, never here.

use crate::fixed::Fixed64;
use crate::rotation::Rotation;
use crate::space::{Axis, BlockPos, Direction, DirSet};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// The device variants a node can represent, each carrying only the data
/// its rule needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Straight shaft: identity rule.
    Axle,
    /// Gearbox mounted on `axis`: same-axis passthrough inverts handedness,
    /// perpendicular-axis passthrough flips the rotation convention.
    GearBox { axis: Axis },
    /// Toggleable coupling. Disengaged, it contributes no usable
    /// connections and drops out of propagation without leaving the graph.
    Clutch { engaged: bool },
    /// Originates rotation (windmill, hand wheel, water wheel). Owns its
    /// rotation authoritatively and advances it every loaded tick.
    Source {
        rotation: Rotation,
        /// Speed the driving device is ramping toward.
        target_speed: Fixed64,
        /// Canonical output face.
        facing: Direction,
    },
    /// Terminal single-connection consumer (crankshaft). Never invalid.
    Sink,
}

impl NodeKind {
    /// Whether this kind originates rotation.
    pub fn is_source(&self) -> bool {
        matches!(self, NodeKind::Source { .. })
    }

    /// The source's owned rotation, if any.
    pub fn source_rotation(&self) -> Option<Rotation> {
        match self {
            NodeKind::Source { rotation, .. } => Some(*rotation),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// NodeSpec
// ---------------------------------------------------------------------------

/// A caller-supplied node description handed to `perform_action`. The
/// manager copies it into its arena; device entities keep their spec as the
/// single place their connections and kind are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub pos: BlockPos,
    pub connections: DirSet,
    pub kind: NodeKind,
}

impl NodeSpec {
    pub fn new(pos: BlockPos, connections: DirSet, kind: NodeKind) -> Self {
        Self {
            pos,
            connections,
            kind,
        }
    }

    /// An axle along `axis`: both axis faces, identity rule.
    pub fn axle(pos: BlockPos, axis: Axis) -> Self {
        Self::new(pos, DirSet::axis_pair(axis), NodeKind::Axle)
    }

    /// A gearbox mounted on `axis` with the given open sides.
    pub fn gearbox(pos: BlockPos, axis: Axis, open_sides: DirSet) -> Self {
        Self::new(pos, open_sides, NodeKind::GearBox { axis })
    }

    /// A clutch along `axis`. Disengaged clutches keep their nominal faces
    /// in the spec; usable connections are gated by `engaged`.
    pub fn clutch(pos: BlockPos, axis: Axis, engaged: bool) -> Self {
        Self::new(pos, DirSet::axis_pair(axis), NodeKind::Clutch { engaged })
    }

    /// A source facing `facing`, starting at rest and ramping toward
    /// `target_speed`.
    pub fn source(pos: BlockPos, facing: Direction, target_speed: Fixed64) -> Self {
        Self::new(
            pos,
            DirSet::single(facing),
            NodeKind::Source {
                rotation: Rotation::stopped(),
                target_speed,
                facing,
            },
        )
    }

    /// A sink. Exactly one connection, enforced here at construction.
    pub fn sink(pos: BlockPos, dir: Direction) -> Self {
        Self::new(pos, DirSet::single(dir), NodeKind::Sink)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A registered node in the manager's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub pos: BlockPos,
    pub connections: DirSet,
    pub kind: NodeKind,
}

impl Node {
    pub fn from_spec(spec: &NodeSpec) -> Self {
        Self {
            pos: spec.pos,
            connections: spec.connections,
            kind: spec.kind,
        }
    }

    /// The directions this node currently transmits through. A disengaged
    /// clutch transmits through nothing.
    pub fn usable_connections(&self) -> DirSet {
        match self.kind {
            NodeKind::Clutch { engaged: false } => DirSet::empty(),
            _ => self.connections,
        }
    }

    /// The coupling between this node's resolved value and the shaft
    /// rotation it presents at `face`.
    ///
    /// Every per-face coupling is an involution, so the same function
    /// converts in both directions (node value -> face shaft, face shaft
    /// -> node value). That makes each edge constraint a symmetric
    /// equation and the propagation result independent of traversal order.
    ///
    /// - Axle, clutch, source, sink: the whole block turns as one shaft.
    /// - Gearbox on `axis`: the positive mount-axis face turns with
    ///   opposite handedness; perpendicular faces turn with flipped
    ///   convention.
    pub fn face_rotation(&self, value: Rotation, face: Direction) -> Rotation {
        match self.kind {
            NodeKind::Axle
            | NodeKind::Clutch { .. }
            | NodeKind::Source { .. }
            | NodeKind::Sink => value,
            NodeKind::GearBox { axis } => {
                if face.axis() == axis {
                    if face.is_positive() {
                        value.inverted()
                    } else {
                        value
                    }
                } else {
                    value.reversed()
                }
            }
        }
    }

    /// The transformation rule: map a rotation entering through `in_dir`
    /// to the rotation leaving through `out_dir`. Pure function of its
    /// three inputs; never fails. Invalid configurations are the manager's
    /// concern, surfaced through its boolean return.
    ///
    /// Identity for axles, clutches, sources, and sinks. For a gearbox,
    /// same-axis passthrough inverts handedness and perpendicular-axis
    /// passthrough flips the rotation convention.
    pub fn map_rotation(
        &self,
        incoming: Rotation,
        in_dir: Direction,
        out_dir: Direction,
    ) -> Rotation {
        self.face_rotation(self.face_rotation(incoming, in_dir), out_dir)
    }
}
