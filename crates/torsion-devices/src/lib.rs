//! Device layer for the Torsion rotation network engine.
//!
//! Wires concrete device blocks (axles, gearboxes, clutches, hand wheels,
//! windmills, water wheels, crankshafts, trip hammers, pumps) to the graph
//! engine in `torsion-core`. Each device implements the
//! [`entity::RotatingBlockEntity`] contract: it describes its node, issues
//! lifecycle actions through the world-scoped [`world::WorldContext`], and
//! carries an [`entity::InvalidMarker`] that tolerates transient placement
//! races before committing to self-destruction.
//!
//! Device-specific behavior (windmill speed ramps, trip hammer cam timing,
//! pump activation, crankshaft strokes) lives here, reading resolved
//! rotation after the manager tick; the core never knows about it.

pub mod entity;
pub mod machine;
pub mod source;
pub mod transmission;
pub mod world;

pub use entity::{GRACE_TICKS, InvalidMarker, RotatingBlockEntity};
pub use machine::{Crankshaft, Pump, TripHammer};
pub use source::{HandWheel, WaterWheel, Windmill};
pub use transmission::{AxleEntity, ClutchEntity, GearBoxEntity};
pub use world::WorldContext;
