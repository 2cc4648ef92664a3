use rapier3d::prelude::*;
use std::sync::{Arc, Mutex};

use super::body::BodyHandle;

/// Collision groups for filtering which bodies the engine lets touch
///
/// Gameplay never reads these bits back; they only decide which contact
/// pairs the narrow phase can produce in the first place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroups {
    /// Terrain slab under the playfield
    Ground = 0b0000_0001,

    /// Stacked structure bricks (movable and immovable)
    Brick = 0b0000_0010,

    /// Enemy bodies
    Enemy = 0b0000_0100,

    /// Rocks and bombs
    Projectile = 0b0000_1000,

    /// Cannon mount (static)
    Mount = 0b0001_0000,
}

impl CollisionGroups {
    /// Convert to rapier3d's InteractionGroups
    pub fn to_interaction_groups(self) -> InteractionGroups {
        let memberships = Group::from_bits_truncate(self as u32);

        let filter = match self {
            CollisionGroups::Ground => Group::from_bits_truncate(
                CollisionGroups::Brick as u32
                    | CollisionGroups::Enemy as u32
                    | CollisionGroups::Projectile as u32,
            ),

            CollisionGroups::Brick | CollisionGroups::Enemy => Group::from_bits_truncate(
                CollisionGroups::Ground as u32
                    | CollisionGroups::Brick as u32
                    | CollisionGroups::Enemy as u32
                    | CollisionGroups::Projectile as u32
                    | CollisionGroups::Mount as u32,
            ),

            // Projectiles spawn inside the mount's box, so they must ignore it
            CollisionGroups::Projectile => Group::from_bits_truncate(
                CollisionGroups::Ground as u32
                    | CollisionGroups::Brick as u32
                    | CollisionGroups::Enemy as u32
                    | CollisionGroups::Projectile as u32,
            ),

            CollisionGroups::Mount => Group::from_bits_truncate(
                CollisionGroups::Brick as u32 | CollisionGroups::Enemy as u32,
            ),
        };

        InteractionGroups::new(memberships, filter)
    }
}

/// Two bodies reported as touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyPair {
    pub first: BodyHandle,
    pub second: BodyHandle,
}

impl BodyPair {
    pub fn new(first: BodyHandle, second: BodyHandle) -> Self {
        Self { first, second }
    }

    /// Same pair regardless of order
    pub fn same_bodies(&self, other: &BodyPair) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

/// Queue for collider pairs that started touching during a physics step
///
/// Fast bodies can touch and separate inside a single step; the started
/// events catch those pairs even when the narrow phase no longer holds them.
pub struct CollisionEventQueue {
    started: Arc<Mutex<Vec<(ColliderHandle, ColliderHandle)>>>,
}

impl CollisionEventQueue {
    pub fn new() -> Self {
        Self {
            started: Arc::new(Mutex::new(Vec::with_capacity(32))),
        }
    }

    /// Clear all events (call at start of physics step)
    pub fn clear(&self) {
        if let Ok(mut started) = self.started.lock() {
            started.clear();
        }
    }

    /// Drain the pairs collected so far
    pub fn drain(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        self.started
            .lock()
            .map(|mut started| std::mem::take(&mut *started))
            .unwrap_or_default()
    }

    fn push(&self, pair: (ColliderHandle, ColliderHandle)) {
        if let Ok(mut started) = self.started.lock() {
            started.push(pair);
        }
    }
}

impl Default for CollisionEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CollisionEventQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(h1, h2, _flags) = event {
            self.push((h1, h2));
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}
