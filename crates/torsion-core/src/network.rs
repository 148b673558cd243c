//! The rotation network manager: node arena, component membership, and the
//! BFS consistency-propagation algorithm.
//!
//! The manager is the sole mutation entry point. Every action is atomic per
//! component: the merged/split component either revalidates completely and
//! commits, or the action is rejected and prior committed state is left
//! untouched. Conflicts (a second source, a cycle that implies two
//! different rotations for one node) are surfaced as a boolean `false`,
//! never an error -- the caller marks itself invalid and schedules a
//! delayed recheck.
//!
//! # Storage
//!
//! Nodes live in a `SlotMap` arena with a `BTreeMap` position index and
//! `SecondaryMap`s for component membership and resolved rotation. BTree
//! keys make every traversal deterministic.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::event::{NetworkEvent, RejectReason};
use crate::fixed::{Fixed64, Ticks};
use crate::node::{Node, NodeKind, NodeSpec};
use crate::rotation::Rotation;
use crate::space::{BlockPos, Direction};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap, new_key_type};

new_key_type! {
    /// Identifies a node in the manager's arena.
    pub struct NodeId;
}

/// Identifies a connected component. Cheap to copy and compare.
///
/// Component identity is not stable across mutations: every commit assigns
/// a fresh id to the affected component, and a split never designates one
/// side as "the original".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

// ---------------------------------------------------------------------------
// NetworkAction
// ---------------------------------------------------------------------------

/// Structural/lifecycle mutation verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkAction {
    /// Register a non-source node (block entity load/placement).
    Add,
    /// Register a source-owning node.
    AddSource,
    /// Unregister a node (unload/destruction); former neighbors'
    /// sub-components are independently re-derived.
    Remove,
    /// Revalidate after a connection-set or rule change.
    Update,
}

// ---------------------------------------------------------------------------
// RotationNetworkManager
// ---------------------------------------------------------------------------

/// Per-world service owning the node->component mapping and driving the
/// propagation algorithm that assigns every node a resolved [`Rotation`]
/// derived from its component's source.
#[derive(Debug, Serialize, Deserialize)]
pub struct RotationNetworkManager {
    /// Node arena.
    nodes: SlotMap<NodeId, Node>,
    /// Position -> arena key index. Node identity is positional.
    index: BTreeMap<BlockPos, NodeId>,
    /// Component membership per node.
    components: SecondaryMap<NodeId, ComponentId>,
    /// Resolved rotation per node (sources authoritative, others mirrored).
    resolved: SecondaryMap<NodeId, Rotation>,
    /// Per-component turning flag from the last delivered tick, used to
    /// emit powered/stopped events only on transitions.
    turning: BTreeMap<ComponentId, bool>,
    /// Next component id to assign.
    next_component: u32,
    /// Rejections buffered between ticks, stamped and delivered by `tick`.
    #[serde(skip)]
    pending_rejections: Vec<(BlockPos, RejectReason)>,
}

impl Default for RotationNetworkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationNetworkManager {
    /// Create an empty manager. One per attached world.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            index: BTreeMap::new(),
            components: SecondaryMap::new(),
            resolved: SecondaryMap::new(),
            turning: BTreeMap::new(),
            next_component: 0,
            pending_rejections: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Mutation entry point
    // -----------------------------------------------------------------------

    /// Apply a structural action. Returns `false` without committing when
    /// the action would leave the graph inconsistent; the rejection is also
    /// buffered as an [`NetworkEvent::ActionRejected`] for the next tick.
    pub fn perform_action(&mut self, spec: &NodeSpec, action: NetworkAction) -> bool {
        let result = match action {
            NetworkAction::Add => self.add(spec, false),
            NetworkAction::AddSource => self.add(spec, true),
            NetworkAction::Remove => self.remove(spec.pos),
            NetworkAction::Update => self.update(spec),
        };
        match result {
            Ok(()) => true,
            Err(reason) => {
                self.pending_rejections.push((spec.pos, reason));
                false
            }
        }
    }

    fn add(&mut self, spec: &NodeSpec, expect_source: bool) -> Result<(), RejectReason> {
        if spec.kind.is_source() != expect_source {
            return Err(RejectReason::KindMismatch);
        }
        if self.index.contains_key(&spec.pos) {
            return Err(RejectReason::DuplicateNode);
        }

        let id = self.nodes.insert(Node::from_spec(spec));
        self.index.insert(spec.pos, id);

        let members = self.collect_component(id);
        match self.propagate(&members) {
            Ok(rotations) => {
                self.commit(rotations);
                Ok(())
            }
            Err(reason) => {
                // No commit happened; undo the insertion.
                self.nodes.remove(id);
                self.index.remove(&spec.pos);
                Err(reason)
            }
        }
    }

    fn remove(&mut self, pos: BlockPos) -> Result<(), RejectReason> {
        let Some(id) = self.index.remove(&pos) else {
            return Err(RejectReason::UnknownNode);
        };
        self.nodes.remove(id);
        self.components.remove(id);
        self.resolved.remove(id);

        // Re-derive each surviving sub-component from scratch. Removal only
        // drops constraints, so propagation cannot newly conflict; the
        // stopped fallback keeps the commit total either way.
        let mut reassigned: BTreeSet<NodeId> = BTreeSet::new();
        for dir in Direction::all() {
            let Some(&neighbor) = self.index.get(&pos.offset(dir)) else {
                continue;
            };
            if reassigned.contains(&neighbor) {
                continue;
            }
            let members = self.collect_component(neighbor);
            reassigned.extend(members.iter().copied());
            let rotations = match self.propagate(&members) {
                Ok(rotations) => rotations,
                Err(_) => self.stopped_assignment(&members),
            };
            self.commit(rotations);
        }
        Ok(())
    }

    fn update(&mut self, spec: &NodeSpec) -> Result<(), RejectReason> {
        let Some(&id) = self.index.get(&spec.pos) else {
            return Err(RejectReason::UnknownNode);
        };
        let old = self.nodes[id];
        if old.kind.is_source() != spec.kind.is_source() {
            // Source-ness changes go through Remove + AddSource.
            return Err(RejectReason::KindMismatch);
        }

        // Apply tentatively. A source keeps its owned rotation; the spec's
        // copy may be stale.
        let kind = match (old.kind, spec.kind) {
            (
                NodeKind::Source { rotation, .. },
                NodeKind::Source {
                    target_speed,
                    facing,
                    ..
                },
            ) => NodeKind::Source {
                rotation,
                target_speed,
                facing,
            },
            (_, kind) => kind,
        };
        self.nodes[id] = Node {
            pos: spec.pos,
            connections: spec.connections,
            kind,
        };

        // A connection change can merge or split components, so the node's
        // own component and every adjacent component revalidate together.
        let mut starts = vec![id];
        for dir in Direction::all() {
            if let Some(&neighbor) = self.index.get(&spec.pos.offset(dir)) {
                starts.push(neighbor);
            }
        }

        let mut staged: Vec<BTreeMap<NodeId, Rotation>> = Vec::new();
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        for start in starts {
            if visited.contains(&start) {
                continue;
            }
            let members = self.collect_component(start);
            visited.extend(members.iter().copied());
            match self.propagate(&members) {
                Ok(rotations) => staged.push(rotations),
                Err(reason) => {
                    self.nodes[id] = old;
                    return Err(reason);
                }
            }
        }
        for rotations in staged {
            self.commit(rotations);
        }
        Ok(())
    }

    /// Update a source's owned rotation (hand-wheel crank, windmill ramp,
    /// water flow change) and re-propagate its component.
    ///
    /// Returns `false` and rolls back when the new motion would expose a
    /// latent conflict (a convention-flipping cycle is consistent at zero
    /// speed but not in motion) or when `pos` is not a registered source.
    pub fn set_source_motion(&mut self, pos: BlockPos, angle: Fixed64, speed: Fixed64) -> bool {
        let Some(&id) = self.index.get(&pos) else {
            self.pending_rejections.push((pos, RejectReason::UnknownNode));
            return false;
        };
        let old = self.nodes[id].kind;
        let NodeKind::Source {
            mut rotation,
            target_speed,
            facing,
        } = old
        else {
            self.pending_rejections.push((pos, RejectReason::KindMismatch));
            return false;
        };

        rotation.set(angle, speed);
        self.nodes[id].kind = NodeKind::Source {
            rotation,
            target_speed,
            facing,
        };

        let members = self.collect_component(id);
        match self.propagate(&members) {
            Ok(rotations) => {
                self.commit(rotations);
                true
            }
            Err(reason) => {
                self.nodes[id].kind = old;
                self.pending_rejections.push((pos, reason));
                false
            }
        }
    }

    /// Change a source's speed while keeping its current angle. The ramp
    /// path for windmills and water wheels.
    pub fn set_source_speed(&mut self, pos: BlockPos, speed: Fixed64) -> bool {
        let angle = match self.node_at(pos).and_then(|n| n.kind.source_rotation()) {
            Some(rotation) => rotation.angle,
            None => Fixed64::ZERO,
        };
        self.set_source_motion(pos, angle, speed)
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance every resolved rotation one tick and deliver events: buffered
    /// rejections first, then per-component powered/stopped transitions.
    ///
    /// The host must call this after all structural mutations for the tick
    /// have been applied and before any rotation is read for gameplay or
    /// rendering.
    pub fn tick(&mut self, now: Ticks) -> Vec<NetworkEvent> {
        let mut events: Vec<NetworkEvent> = self
            .pending_rejections
            .drain(..)
            .map(|(pos, reason)| NetworkEvent::ActionRejected {
                pos,
                reason,
                tick: now,
            })
            .collect();

        for (_, rotation) in self.resolved.iter_mut() {
            rotation.advance();
        }
        for (_, node) in self.nodes.iter_mut() {
            if let NodeKind::Source { rotation, .. } = &mut node.kind {
                rotation.advance();
            }
        }

        // Powered/stopped transitions, fired only on change.
        let mut current: BTreeMap<ComponentId, bool> = BTreeMap::new();
        for (id, component) in self.components.iter() {
            let turning = self.resolved.get(id).is_some_and(|r| r.is_turning());
            *current.entry(*component).or_insert(false) |= turning;
        }
        for (&component, &turning) in &current {
            let was_turning = self.turning.get(&component).copied().unwrap_or(false);
            if turning && !was_turning {
                events.push(NetworkEvent::ComponentPowered {
                    component,
                    tick: now,
                });
            } else if !turning && was_turning {
                events.push(NetworkEvent::ComponentStopped {
                    component,
                    tick: now,
                });
            }
        }
        self.turning = current;

        events
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The resolved rotation of the node at `pos`.
    pub fn rotation_at(&self, pos: BlockPos) -> Option<Rotation> {
        let id = *self.index.get(&pos)?;
        self.resolved.get(id).copied()
    }

    /// The registered node at `pos`.
    pub fn node_at(&self, pos: BlockPos) -> Option<&Node> {
        let id = *self.index.get(&pos)?;
        self.nodes.get(id)
    }

    /// The component the node at `pos` belongs to.
    pub fn component_of(&self, pos: BlockPos) -> Option<ComponentId> {
        let id = *self.index.get(&pos)?;
        self.components.get(id).copied()
    }

    /// Number of nodes in a component.
    pub fn component_len(&self, component: ComponentId) -> usize {
        self.components
            .iter()
            .filter(|(_, c)| **c == component)
            .count()
    }

    /// The position of a component's source, if it has one.
    pub fn source_of_component(&self, component: ComponentId) -> Option<BlockPos> {
        self.components
            .iter()
            .filter(|(_, c)| **c == component)
            .map(|(id, _)| &self.nodes[id])
            .find(|node| node.kind.is_source())
            .map(|node| node.pos)
    }

    /// Total registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -----------------------------------------------------------------------
    // Propagation algorithm
    // -----------------------------------------------------------------------

    /// Collect the connected component containing `start` by BFS over
    /// mutual usable connections. Returned in key order (deterministic).
    fn collect_component(&self, start: NodeId) -> Vec<NodeId> {
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        seen.insert(start);
        queue.push_back(start);

        while let Some(id) = queue.pop_front() {
            let node = &self.nodes[id];
            for dir in node.usable_connections().iter() {
                let Some(&neighbor) = self.index.get(&node.pos.offset(dir)) else {
                    continue;
                };
                let neighbor_node = &self.nodes[neighbor];
                if neighbor_node.usable_connections().contains(dir.opposite())
                    && seen.insert(neighbor)
                {
                    queue.push_back(neighbor);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Derive a rotation for every member, seeded at the component's source.
    ///
    /// BFS in fixed direction order; an edge exists where both endpoints'
    /// connection sets agree. Each edge imposes a symmetric constraint --
    /// the two endpoints' face couplings must present the same shaft
    /// rotation on the shared face -- so a node reached twice must agree
    /// mechanically (speed and sense) with the previously derived value,
    /// otherwise the whole derivation is rejected. Sourceless components
    /// settle to stopped, keeping each node's last angle.
    fn propagate(&self, members: &[NodeId]) -> Result<BTreeMap<NodeId, Rotation>, RejectReason> {
        let sources: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|&id| self.nodes[id].kind.is_source())
            .collect();
        if sources.len() > 1 {
            return Err(RejectReason::MultipleSources);
        }
        let Some(&source) = sources.first() else {
            return Ok(self.stopped_assignment(members));
        };

        let seed = self.nodes[source].kind.source_rotation().unwrap_or_default();
        let mut assigned: BTreeMap<NodeId, Rotation> = BTreeMap::new();
        assigned.insert(source, seed);
        let mut queue: VecDeque<NodeId> = VecDeque::from([source]);

        while let Some(id) = queue.pop_front() {
            let node = &self.nodes[id];
            let current = assigned[&id];
            for dir in node.usable_connections().iter() {
                let Some(&neighbor) = self.index.get(&node.pos.offset(dir)) else {
                    continue;
                };
                let neighbor_node = &self.nodes[neighbor];
                let entry = dir.opposite();
                if !neighbor_node.usable_connections().contains(entry) {
                    continue;
                }
                let shaft = node.face_rotation(current, dir);
                let candidate = neighbor_node.face_rotation(shaft, entry);
                match assigned.get(&neighbor) {
                    Some(existing) => {
                        if !existing.agrees_with(&candidate) {
                            return Err(RejectReason::InconsistentCycle);
                        }
                    }
                    None => {
                        assigned.insert(neighbor, candidate);
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        Ok(assigned)
    }

    /// Every member stopped in place: speed zeroed, last angle kept.
    fn stopped_assignment(&self, members: &[NodeId]) -> BTreeMap<NodeId, Rotation> {
        members
            .iter()
            .map(|&id| {
                let prior = self.resolved.get(id).copied().unwrap_or_default();
                (
                    id,
                    Rotation {
                        speed: Fixed64::ZERO,
                        ..prior
                    },
                )
            })
            .collect()
    }

    /// Write a derived assignment under a fresh component id. The turning
    /// baseline carries over from the members' previous resolved state so
    /// renumbering does not re-fire powered/stopped events.
    fn commit(&mut self, rotations: BTreeMap<NodeId, Rotation>) -> ComponentId {
        let component = ComponentId(self.next_component);
        self.next_component += 1;

        let was_turning = rotations
            .keys()
            .any(|&id| self.resolved.get(id).is_some_and(|r| r.is_turning()));

        for (id, rotation) in rotations {
            self.components.insert(id, component);
            self.resolved.insert(id, rotation);
            if let NodeKind::Source {
                rotation: owned, ..
            } = &mut self.nodes[id].kind
            {
                *owned = rotation;
            }
        }
        self.turning.insert(component, was_turning);
        component
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;
    use crate::rotation::Handedness;
    use crate::space::{Axis, DirSet};

    fn f(v: f64) -> Fixed64 {
        f64_to_fixed64(v)
    }

    fn pos(x: i32) -> BlockPos {
        BlockPos::new(x, 0, 0)
    }

    /// A source at `p` facing East, already spinning at `speed`.
    fn spinning_source(p: BlockPos, speed: f64) -> NodeSpec {
        let mut spec = NodeSpec::source(p, Direction::East, f(speed));
        if let NodeKind::Source { rotation, .. } = &mut spec.kind {
            rotation.set(Fixed64::ZERO, f(speed));
        }
        spec
    }

    // -----------------------------------------------------------------------
    // Test 1: Windmill drives an adjacent axle unchanged
    // -----------------------------------------------------------------------
    #[test]
    fn source_drives_adjacent_axle() {
        let mut mgr = RotationNetworkManager::new();

        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));
        assert!(mgr.perform_action(&NodeSpec::axle(pos(1), Axis::X), NetworkAction::Add));

        let windmill = mgr.rotation_at(pos(0)).unwrap();
        let axle = mgr.rotation_at(pos(1)).unwrap();
        assert_eq!(axle, windmill);
        assert_eq!(axle.speed, f(0.5));
        assert_eq!(mgr.component_of(pos(0)), mgr.component_of(pos(1)));
    }

    // -----------------------------------------------------------------------
    // Test 2: Second source in the same component is rejected, graph unchanged
    // -----------------------------------------------------------------------
    #[test]
    fn second_source_rejected_and_graph_unchanged() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));
        assert!(mgr.perform_action(&NodeSpec::axle(pos(1), Axis::X), NetworkAction::Add));

        let before_axle = mgr.rotation_at(pos(1)).unwrap();
        let before_len = mgr.len();

        // Second source faces West into the axle from the East side.
        let mut second = NodeSpec::source(pos(2), Direction::West, f(1.0));
        if let NodeKind::Source { rotation, .. } = &mut second.kind {
            rotation.set(Fixed64::ZERO, f(1.0));
        }
        assert!(!mgr.perform_action(&second, NetworkAction::AddSource));

        assert_eq!(mgr.len(), before_len);
        assert!(mgr.node_at(pos(2)).is_none());
        assert_eq!(mgr.rotation_at(pos(1)).unwrap(), before_axle);
    }

    // -----------------------------------------------------------------------
    // Test 3: Action kind must match spec kind
    // -----------------------------------------------------------------------
    #[test]
    fn kind_mismatch_rejected() {
        let mut mgr = RotationNetworkManager::new();
        assert!(!mgr.perform_action(&NodeSpec::axle(pos(0), Axis::X), NetworkAction::AddSource));
        assert!(!mgr.perform_action(&spinning_source(pos(1), 0.5), NetworkAction::Add));
        assert!(mgr.is_empty());
    }

    // -----------------------------------------------------------------------
    // Test 4: Duplicate position rejected
    // -----------------------------------------------------------------------
    #[test]
    fn duplicate_position_rejected() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&NodeSpec::axle(pos(0), Axis::X), NetworkAction::Add));
        assert!(!mgr.perform_action(&NodeSpec::axle(pos(0), Axis::X), NetworkAction::Add));
        assert_eq!(mgr.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Test 5: Gearbox inverts handedness along its axis
    // -----------------------------------------------------------------------
    #[test]
    fn gearbox_inverts_handedness_in_chain() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));
        assert!(mgr.perform_action(
            &NodeSpec::gearbox(pos(1), Axis::X, DirSet::axis_pair(Axis::X)),
            NetworkAction::Add,
        ));
        assert!(mgr.perform_action(&NodeSpec::axle(pos(2), Axis::X), NetworkAction::Add));

        let source = mgr.rotation_at(pos(0)).unwrap();
        let gearbox = mgr.rotation_at(pos(1)).unwrap();
        let axle = mgr.rotation_at(pos(2)).unwrap();

        assert_eq!(source.sense, Handedness::Clockwise);
        // The gearbox's reference value matches its entry side; the shaft
        // leaving its far side turns the other way.
        assert_eq!(gearbox.sense, Handedness::Clockwise);
        assert_eq!(axle.sense, Handedness::CounterClockwise);
        assert_eq!(axle.speed, source.speed);
    }

    // -----------------------------------------------------------------------
    // Test 6: Removing a cut-vertex splits; only one side keeps the source
    // -----------------------------------------------------------------------
    #[test]
    fn cut_vertex_removal_splits_component() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));
        for x in 1..=3 {
            assert!(mgr.perform_action(&NodeSpec::axle(pos(x), Axis::X), NetworkAction::Add));
        }
        assert_eq!(mgr.component_of(pos(0)), mgr.component_of(pos(3)));

        // Remove the axle at x=2; x=3 is cut off from the source.
        assert!(mgr.perform_action(&NodeSpec::axle(pos(2), Axis::X), NetworkAction::Remove));

        let near = mgr.component_of(pos(1)).unwrap();
        let far = mgr.component_of(pos(3)).unwrap();
        assert_ne!(near, far);
        assert_eq!(mgr.source_of_component(near), Some(pos(0)));
        assert_eq!(mgr.source_of_component(far), None);

        assert_eq!(mgr.rotation_at(pos(1)).unwrap().speed, f(0.5));
        assert_eq!(mgr.rotation_at(pos(3)).unwrap().speed, Fixed64::ZERO);
    }

    // -----------------------------------------------------------------------
    // Test 7: Remove of an unregistered position is rejected
    // -----------------------------------------------------------------------
    #[test]
    fn remove_unknown_position_rejected() {
        let mut mgr = RotationNetworkManager::new();
        assert!(!mgr.perform_action(&NodeSpec::axle(pos(9), Axis::X), NetworkAction::Remove));
    }

    // -----------------------------------------------------------------------
    // Test 8: Update is idempotent
    // -----------------------------------------------------------------------
    #[test]
    fn update_is_idempotent() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));
        let axle = NodeSpec::axle(pos(1), Axis::X);
        assert!(mgr.perform_action(&axle, NetworkAction::Add));

        assert!(mgr.perform_action(&axle, NetworkAction::Update));
        let first = mgr.rotation_at(pos(1)).unwrap();
        assert!(mgr.perform_action(&axle, NetworkAction::Update));
        let second = mgr.rotation_at(pos(1)).unwrap();
        assert_eq!(first, second);
    }

    // -----------------------------------------------------------------------
    // Test 9: Disengaging a clutch disconnects downstream cleanly
    // -----------------------------------------------------------------------
    #[test]
    fn clutch_disengage_stops_downstream() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));
        assert!(mgr.perform_action(&NodeSpec::clutch(pos(1), Axis::X, true), NetworkAction::Add));
        assert!(mgr.perform_action(&NodeSpec::axle(pos(2), Axis::X), NetworkAction::Add));
        assert_eq!(mgr.rotation_at(pos(2)).unwrap().speed, f(0.5));

        assert!(mgr.perform_action(&NodeSpec::clutch(pos(1), Axis::X, false), NetworkAction::Update));

        // Downstream reverts to stopped; the source side is untouched.
        assert_eq!(mgr.rotation_at(pos(2)).unwrap().speed, Fixed64::ZERO);
        assert_eq!(mgr.rotation_at(pos(0)).unwrap().speed, f(0.5));
        assert_ne!(mgr.component_of(pos(0)), mgr.component_of(pos(2)));

        // Re-engage: downstream spins back up.
        assert!(mgr.perform_action(&NodeSpec::clutch(pos(1), Axis::X, true), NetworkAction::Update));
        assert_eq!(mgr.rotation_at(pos(2)).unwrap().speed, f(0.5));
    }

    // -----------------------------------------------------------------------
    // Test 10: Tick advances all members in lockstep
    // -----------------------------------------------------------------------
    #[test]
    fn tick_advances_component() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.25), NetworkAction::AddSource));
        assert!(mgr.perform_action(&NodeSpec::axle(pos(1), Axis::X), NetworkAction::Add));

        mgr.tick(1);
        mgr.tick(2);

        assert_eq!(mgr.rotation_at(pos(0)).unwrap().angle, f(0.5));
        assert_eq!(mgr.rotation_at(pos(1)).unwrap().angle, f(0.5));
    }

    // -----------------------------------------------------------------------
    // Test 11: Powered/stopped events fire only on transitions
    // -----------------------------------------------------------------------
    #[test]
    fn powered_event_fires_only_on_transition() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));

        let events = mgr.tick(1);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], NetworkEvent::ComponentPowered { tick: 1, .. }));

        // Still turning: no event.
        assert!(mgr.tick(2).is_empty());

        // Stop the source: one stopped event.
        assert!(mgr.set_source_motion(pos(0), Fixed64::ZERO, Fixed64::ZERO));
        let events = mgr.tick(3);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], NetworkEvent::ComponentStopped { tick: 3, .. }));

        assert!(mgr.tick(4).is_empty());
    }

    // -----------------------------------------------------------------------
    // Test 12: Rejections are delivered as events on the next tick
    // -----------------------------------------------------------------------
    #[test]
    fn rejection_event_delivered_on_tick() {
        let mut mgr = RotationNetworkManager::new();
        assert!(!mgr.perform_action(&NodeSpec::axle(pos(0), Axis::X), NetworkAction::Remove));

        let events = mgr.tick(1);
        assert_eq!(
            events,
            vec![NetworkEvent::ActionRejected {
                pos: pos(0),
                reason: RejectReason::UnknownNode,
                tick: 1,
            }]
        );
        assert!(mgr.tick(2).is_empty());
    }

    // -----------------------------------------------------------------------
    // Test 13: set_source_motion re-propagates the whole component
    // -----------------------------------------------------------------------
    #[test]
    fn set_source_motion_repropagates() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));
        assert!(mgr.perform_action(&NodeSpec::axle(pos(1), Axis::X), NetworkAction::Add));

        assert!(mgr.set_source_motion(pos(0), f(1.0), f(2.0)));

        let source = mgr.rotation_at(pos(0)).unwrap();
        let axle = mgr.rotation_at(pos(1)).unwrap();
        assert_eq!(source.angle, f(1.0));
        assert_eq!(source.speed, f(2.0));
        assert_eq!(axle.speed, f(2.0));
    }

    // -----------------------------------------------------------------------
    // Test 14: set_source_motion on a non-source is rejected
    // -----------------------------------------------------------------------
    #[test]
    fn set_source_motion_requires_source() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&NodeSpec::axle(pos(0), Axis::X), NetworkAction::Add));
        assert!(!mgr.set_source_motion(pos(0), Fixed64::ZERO, f(1.0)));
        assert!(!mgr.set_source_motion(pos(7), Fixed64::ZERO, f(1.0)));
    }

    // -----------------------------------------------------------------------
    // Test 15: Sink terminates a chain and mirrors the incoming rotation
    // -----------------------------------------------------------------------
    #[test]
    fn sink_mirrors_incoming_rotation() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));
        assert!(mgr.perform_action(&NodeSpec::axle(pos(1), Axis::X), NetworkAction::Add));
        assert!(mgr.perform_action(&NodeSpec::sink(pos(2), Direction::West), NetworkAction::Add));

        assert_eq!(mgr.rotation_at(pos(2)).unwrap().speed, f(0.5));
        assert_eq!(mgr.component_of(pos(0)), mgr.component_of(pos(2)));
    }

    // -----------------------------------------------------------------------
    // Test 16: A contradictory gearbox cycle is rejected
    // -----------------------------------------------------------------------
    //
    // Square loop in the XZ plane of four corner gearboxes. With all four
    // mounted on the X axis the loop closes consistently; mounting the
    // closing corner on the Z axis instead makes the two paths into it
    // derive opposite handedness, so the closing add must be rejected.
    #[test]
    fn contradictory_cycle_rejected() {
        let mut mgr = RotationNetworkManager::new();

        let corner = |p: BlockPos, sides: [Direction; 2], axis: Axis| {
            NodeSpec::gearbox(p, axis, sides.into_iter().collect())
        };

        // Loop: (0,0,0) -> (1,0,0) -> (1,0,1) -> (0,0,1) -> back.
        // The source sits on the West face of the first corner.
        assert!(mgr.perform_action(
            &spinning_source(BlockPos::new(-1, 0, 0), 0.5),
            NetworkAction::AddSource,
        ));
        assert!(mgr.perform_action(
            &NodeSpec::gearbox(
                BlockPos::new(0, 0, 0),
                Axis::X,
                [Direction::West, Direction::East, Direction::South]
                    .into_iter()
                    .collect(),
            ),
            NetworkAction::Add,
        ));
        assert!(mgr.perform_action(
            &corner(BlockPos::new(1, 0, 0), [Direction::West, Direction::South], Axis::X),
            NetworkAction::Add,
        ));
        assert!(mgr.perform_action(
            &corner(BlockPos::new(1, 0, 1), [Direction::North, Direction::West], Axis::X),
            NetworkAction::Add,
        ));

        let before = mgr.rotation_at(BlockPos::new(1, 0, 1)).unwrap();
        assert_eq!(before.sense, Handedness::CounterClockwise);
        assert_eq!(before.speed, f(0.5));

        // Closing corner mounted on the Z axis: rejected, prior state kept.
        assert!(!mgr.perform_action(
            &corner(BlockPos::new(0, 0, 1), [Direction::North, Direction::East], Axis::Z),
            NetworkAction::Add,
        ));
        assert!(mgr.node_at(BlockPos::new(0, 0, 1)).is_none());
        assert_eq!(mgr.rotation_at(BlockPos::new(1, 0, 1)).unwrap(), before);

        // The X-mounted closing corner is consistent and commits.
        assert!(mgr.perform_action(
            &corner(BlockPos::new(0, 0, 1), [Direction::North, Direction::East], Axis::X),
            NetworkAction::Add,
        ));
        assert_eq!(mgr.component_len(mgr.component_of(BlockPos::new(0, 0, 1)).unwrap()), 5);
    }

    // -----------------------------------------------------------------------
    // Test 17: A consistent loop commits
    // -----------------------------------------------------------------------
    #[test]
    fn consistent_straight_line_merges_components() {
        let mut mgr = RotationNetworkManager::new();
        // Two separate axles, then a middle axle joins them into one component.
        assert!(mgr.perform_action(&NodeSpec::axle(pos(0), Axis::X), NetworkAction::Add));
        assert!(mgr.perform_action(&NodeSpec::axle(pos(2), Axis::X), NetworkAction::Add));
        assert_ne!(mgr.component_of(pos(0)), mgr.component_of(pos(2)));

        assert!(mgr.perform_action(&NodeSpec::axle(pos(1), Axis::X), NetworkAction::Add));
        assert_eq!(mgr.component_of(pos(0)), mgr.component_of(pos(2)));
        assert_eq!(mgr.component_len(mgr.component_of(pos(1)).unwrap()), 3);
    }

    // -----------------------------------------------------------------------
    // Test 18: Serde round-trip preserves the whole manager
    // -----------------------------------------------------------------------
    #[test]
    fn manager_serde_round_trip() {
        let mut mgr = RotationNetworkManager::new();
        assert!(mgr.perform_action(&spinning_source(pos(0), 0.5), NetworkAction::AddSource));
        assert!(mgr.perform_action(&NodeSpec::axle(pos(1), Axis::X), NetworkAction::Add));
        mgr.tick(1);

        let bytes = bitcode::serialize(&mgr).unwrap();
        let mut restored: RotationNetworkManager = bitcode::deserialize(&bytes).unwrap();

        assert_eq!(restored.len(), mgr.len());
        assert_eq!(restored.rotation_at(pos(0)), mgr.rotation_at(pos(0)));

        // Both timelines advance identically after the round trip.
        mgr.tick(2);
        restored.tick(2);
        assert_eq!(restored.rotation_at(pos(1)), mgr.rotation_at(pos(1)));
    }
}
