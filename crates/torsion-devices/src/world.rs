//! World-scoped context tying device entities to one network manager.
//!
//! One `WorldContext` exists per attached world; it owns the manager and
//! the tick counter and is threaded explicitly through every device call.
//! Structural mutations go through the context before `tick` is called for
//! the frame; rotation reads happen after. The context enforces nothing
//! about ordering itself -- the host's loop does -- but every mutation
//! helper here stamps rejections with the current tick so events line up.

use torsion_core::event::NetworkEvent;
use torsion_core::fixed::{Fixed64, Ticks};
use torsion_core::network::{NetworkAction, RotationNetworkManager};
use torsion_core::space::BlockPos;

use crate::entity::RotatingBlockEntity;

/// Owns the per-world [`RotationNetworkManager`] and the world clock.
#[derive(Debug, Default)]
pub struct WorldContext {
    manager: RotationNetworkManager,
    now: Ticks,
}

impl WorldContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a context around a restored manager, resuming at `now`.
    pub fn from_parts(manager: RotationNetworkManager, now: Ticks) -> Self {
        Self { manager, now }
    }

    /// Read-only access to the manager for rotation and component queries.
    pub fn manager(&self) -> &RotationNetworkManager {
        &self.manager
    }

    /// The current world tick.
    pub fn now(&self) -> Ticks {
        self.now
    }

    // -----------------------------------------------------------------------
    // Entity lifecycle
    // -----------------------------------------------------------------------

    /// Register an entity's node. On rejection the entity is marked invalid
    /// and will retry through [`WorldContext::retry_load`].
    pub fn load(&mut self, entity: &mut dyn RotatingBlockEntity) -> bool {
        let accepted = self
            .manager
            .perform_action(&entity.node_spec(), entity.network_action());
        if !accepted {
            entity.mark_invalid_in_network(self.now);
        }
        accepted
    }

    /// Retry a previously rejected registration; clears the invalid flag on
    /// success.
    pub fn retry_load(&mut self, entity: &mut dyn RotatingBlockEntity) -> bool {
        let accepted = self
            .manager
            .perform_action(&entity.node_spec(), entity.network_action());
        if accepted {
            entity.clear_invalid_in_network();
        }
        accepted
    }

    /// Unregister an entity's node (chunk unload or block destruction).
    pub fn unload(&mut self, entity: &dyn RotatingBlockEntity) -> bool {
        self.manager
            .perform_action(&entity.node_spec(), NetworkAction::Remove)
    }

    /// Revalidate an entity whose connections or rule changed in place.
    /// On rejection the manager has already rolled back; the entity is
    /// marked invalid.
    pub fn update(&mut self, entity: &mut dyn RotatingBlockEntity) -> bool {
        let accepted = self
            .manager
            .perform_action(&entity.node_spec(), NetworkAction::Update);
        if !accepted {
            entity.mark_invalid_in_network(self.now);
        }
        accepted
    }

    // -----------------------------------------------------------------------
    // Source motion
    // -----------------------------------------------------------------------

    /// Set a source's angle and speed, re-propagating its component.
    pub fn set_source_motion(&mut self, pos: BlockPos, angle: Fixed64, speed: Fixed64) -> bool {
        self.manager.set_source_motion(pos, angle, speed)
    }

    /// Set a source's speed, keeping its current angle.
    pub fn set_source_speed(&mut self, pos: BlockPos, speed: Fixed64) -> bool {
        self.manager.set_source_speed(pos, speed)
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the world one tick after all structural mutations for the
    /// frame have been applied. Returns the tick's network events.
    pub fn tick(&mut self) -> Vec<NetworkEvent> {
        self.now += 1;
        self.manager.tick(self.now)
    }
}
