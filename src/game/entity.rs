// Game entities and their kind-specific state

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::physics::BodyHandle;
use crate::engine::timer::TimerHandle;

/// Unique identifier for an entity; ids are never reused within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u64);

impl EntityId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Projectile,
    Enemy,
    Brick,
    Ground,
    /// Scenery with no physics body and no gameplay role
    Decorative,
    /// Static cannon mount
    Mount,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Projectile,
        EntityKind::Enemy,
        EntityKind::Brick,
        EntityKind::Ground,
        EntityKind::Decorative,
        EntityKind::Mount,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectileKind {
    Rock,
    Bomb,
}

impl ProjectileKind {
    pub fn other(self) -> Self {
        match self {
            Self::Rock => Self::Bomb,
            Self::Bomb => Self::Rock,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Bomb => "bomb",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrickKind {
    /// Dynamic brick that can topple and crush enemies
    Movable,
    /// Static brick; absorbs hits with no gameplay effect
    Immovable,
}

/// Fuse state of a projectile
///
/// Rocks go straight from `Armed` to `Consumed`. Bombs pass through
/// `Exploding` while their fuse burns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FuseState {
    #[default]
    Armed,
    Exploding,
    Consumed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityData {
    Projectile {
        kind: ProjectileKind,
        fuse: FuseState,
    },
    Enemy,
    Brick {
        kind: BrickKind,
        mass: f32,
        /// Frozen until the level stabilizes
        locked: bool,
    },
    Ground,
    Decorative,
    Mount {
        model: CannonModel,
    },
}

/// Which cannon model stands on the mount; both use the same physics body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CannonModel {
    /// Model read from the named file
    Loaded(String),
    Procedural,
}

/// A gameplay object tracked independently of its physics body
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub data: EntityData,
    /// Cached from the physics body each tick
    pub position: Vec3,
    pub velocity: Vec3,
    /// Radius for the manual proximity checks, not the physics shape
    pub collision_radius: f32,
    /// Lookup only; the physics world owns the body
    pub body: Option<BodyHandle>,
    /// Pending detonation, cancelled when the entity is removed
    pub fuse_timer: Option<TimerHandle>,
}

impl Entity {
    pub fn new(id: EntityId, data: EntityData, position: Vec3, collision_radius: f32) -> Self {
        Self {
            id,
            data,
            position,
            velocity: Vec3::ZERO,
            collision_radius,
            body: None,
            fuse_timer: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self.data {
            EntityData::Projectile { .. } => EntityKind::Projectile,
            EntityData::Enemy => EntityKind::Enemy,
            EntityData::Brick { .. } => EntityKind::Brick,
            EntityData::Ground => EntityKind::Ground,
            EntityData::Decorative => EntityKind::Decorative,
            EntityData::Mount { .. } => EntityKind::Mount,
        }
    }

    pub fn projectile_kind(&self) -> Option<ProjectileKind> {
        match self.data {
            EntityData::Projectile { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn fuse(&self) -> Option<FuseState> {
        match self.data {
            EntityData::Projectile { fuse, .. } => Some(fuse),
            _ => None,
        }
    }

    pub fn is_bomb(&self) -> bool {
        self.projectile_kind() == Some(ProjectileKind::Bomb)
    }

    pub fn is_movable_brick(&self) -> bool {
        matches!(
            self.data,
            EntityData::Brick {
                kind: BrickKind::Movable,
                ..
            }
        )
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.data, EntityData::Brick { locked: true, .. })
    }

    /// Clear the locked flag on a brick; false if it was not locked
    pub fn unlock(&mut self) -> bool {
        match &mut self.data {
            EntityData::Brick { locked, .. } if *locked => {
                *locked = false;
                true
            }
            _ => false,
        }
    }

    /// Armed → Exploding. Returns false if the fuse was already lit or spent
    pub fn light_fuse(&mut self) -> bool {
        match &mut self.data {
            EntityData::Projectile { fuse, .. } if *fuse == FuseState::Armed => {
                *fuse = FuseState::Exploding;
                true
            }
            _ => false,
        }
    }

    /// Exploding → Consumed. Returns false unless the fuse was burning
    pub fn detonate(&mut self) -> bool {
        match &mut self.data {
            EntityData::Projectile { fuse, .. } if *fuse == FuseState::Exploding => {
                *fuse = FuseState::Consumed;
                true
            }
            _ => false,
        }
    }

    pub fn distance_to(&self, other: &Entity) -> f32 {
        self.position.distance(other.position)
    }
}
