//! Torsion Core -- the rotation network engine for block-world games.
//!
//! This crate provides the dynamic graph that models mechanical rotational
//! power transmission between device blocks: axles, gearboxes, clutches,
//! hand wheels, windmills, water wheels (via crankshafts), trip hammers,
//! and pumps. Devices register as nodes; the manager keeps every connected
//! component globally consistent (at most one power source, no cycle that
//! implies two different rotation directions for the same node) using only
//! local, incremental updates.
//!
//! # Mutation Pattern
//!
//! All structural changes go through a single entry point and are atomic
//! per component -- either the whole component revalidates, or the action
//! is rejected and prior committed state is untouched:
//!
//! ```rust,ignore
//! let ok = manager.perform_action(&spec, NetworkAction::Add);
//! if !ok {
//!     // caller marks itself invalid and schedules a delayed recheck
//! }
//! ```
//!
//! # Key Types
//!
//! - [`network::RotationNetworkManager`] -- node arena, component
//!   membership, and the BFS consistency-propagation algorithm.
//! - [`node::NodeKind`] -- tagged device variants (axle, gearbox, clutch,
//!   source, sink) with the pure rotation-mapping rule.
//! - [`rotation::Rotation`] -- the (angle, speed, handedness) state
//!   propagated through a network, advanced one tick at a time.
//! - [`space::BlockPos`] / [`space::Direction`] / [`space::DirSet`] --
//!   integer 3D positions and six-way connection sets.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`serialize`] -- versioned binary snapshots via bitcode.

pub mod event;
pub mod fixed;
pub mod network;
pub mod node;
pub mod rotation;
pub mod serialize;
pub mod space;
