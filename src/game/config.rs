// Game configuration
//
// Every gameplay constant lives here. `Default` reproduces the tuned
// values; a JSON file may override any subset of fields.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::entity::{EntityKind, ProjectileKind};
use super::error::GameError;
use crate::engine::physics::PhysicsSettings;

/// Top-level configuration for a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub physics: PhysicsSettings,
    pub collision: CollisionTuning,
    pub explosion: ExplosionTuning,
    pub bounds: BoundsConfig,
    pub entities: EntityDimensions,
    pub aim: AimConfig,
    /// Seconds after level start before frozen bricks are released
    pub stabilize_delay: f32,
    /// Seed for recoil randomness
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsSettings::default(),
            collision: CollisionTuning::default(),
            explosion: ExplosionTuning::default(),
            bounds: BoundsConfig::default(),
            entities: EntityDimensions::default(),
            aim: AimConfig::default(),
            stabilize_delay: 0.2,
            seed: 0x5EED,
        }
    }
}

/// Thresholds used by the collision resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// A movable brick must exceed this speed to eliminate an enemy
    pub brick_kill_speed: f32,
    /// Extra distance added to radii in the projectile proximity check
    pub projectile_margin: f32,
    /// Extra distance added to radii in the brick proximity check
    pub brick_margin: f32,
    /// Bombs below this height count as having hit the ground
    pub bomb_ground_height: f32,
    /// Height a landed bomb is snapped to
    pub bomb_rest_height: f32,
    /// Magnitude of the recoil impulse given to a brick after a kill
    pub recoil_impulse: f32,
    /// Vertical component of the recoil direction before normalising
    pub recoil_up_bias: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            brick_kill_speed: 2.0,
            projectile_margin: 0.2,
            brick_margin: 0.3,
            bomb_ground_height: 0.5,
            bomb_rest_height: 0.2,
            recoil_impulse: 8.0,
            recoil_up_bias: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionTuning {
    /// Seconds between a bomb landing and detonating
    pub fuse_delay: f32,
    pub radius: f32,
    /// Fraction of `radius` used by the second sweep
    pub sweep_factor: f32,
    /// Peak impulse given to movable bricks at the center
    pub force: f32,
}

impl Default for ExplosionTuning {
    fn default() -> Self {
        Self {
            fuse_delay: 1.0,
            radius: 8.0,
            sweep_factor: 0.7,
            force: 40.0,
        }
    }
}

/// Playable volume for one entity kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Limit on |x| and |z|
    pub horizontal: f32,
    /// Lowest allowed y
    pub floor: f32,
}

impl Bounds {
    pub const fn new(horizontal: f32, floor: f32) -> Self {
        Self { horizontal, floor }
    }

    pub fn contains(&self, position: Vec3) -> bool {
        position.y >= self.floor
            && position.x.abs() <= self.horizontal
            && position.z.abs() <= self.horizontal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    pub projectile: Bounds,
    pub enemy: Bounds,
    pub brick: Bounds,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            projectile: Bounds::new(300.0, -50.0),
            enemy: Bounds::new(150.0, -30.0),
            brick: Bounds::new(180.0, -40.0),
        }
    }
}

impl BoundsConfig {
    /// Bounds for kinds that get culled
    pub fn for_kind(&self, kind: EntityKind) -> Option<Bounds> {
        match kind {
            EntityKind::Projectile => Some(self.projectile),
            EntityKind::Enemy => Some(self.enemy),
            EntityKind::Brick => Some(self.brick),
            EntityKind::Ground | EntityKind::Decorative | EntityKind::Mount => None,
        }
    }
}

/// Physical sizes, masses and semantic collision radii
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDimensions {
    pub enemy_radius: f32,
    pub enemy_mass: f32,
    pub rock_radius: f32,
    pub rock_mass: f32,
    pub rock_collision_radius: f32,
    pub bomb_radius: f32,
    pub bomb_mass: f32,
    pub bomb_collision_radius: f32,
    /// Long side of a brick
    pub brick_length: f32,
    /// Short sides of a brick
    pub brick_thickness: f32,
    pub brick_mass: f32,
    pub brick_collision_radius: f32,
    pub ground_half_size: f32,
}

impl Default for EntityDimensions {
    fn default() -> Self {
        Self {
            enemy_radius: 0.5,
            enemy_mass: 1.0,
            rock_radius: 0.35,
            rock_mass: 1.2,
            rock_collision_radius: 0.35,
            bomb_radius: 0.4,
            bomb_mass: 0.8,
            bomb_collision_radius: 0.45,
            brick_length: 1.2,
            brick_thickness: 0.6,
            brick_mass: 2.0,
            brick_collision_radius: 0.6,
            ground_half_size: 50.0,
        }
    }
}

impl EntityDimensions {
    /// (physics radius, mass, semantic collision radius)
    pub fn projectile(&self, kind: ProjectileKind) -> (f32, f32, f32) {
        match kind {
            ProjectileKind::Rock => (self.rock_radius, self.rock_mass, self.rock_collision_radius),
            ProjectileKind::Bomb => (self.bomb_radius, self.bomb_mass, self.bomb_collision_radius),
        }
    }
}

/// Cannon placement and aiming limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    /// Base of the cannon mount on the ground
    pub mount_position: Vec3,
    pub mount_half_extents: Vec3,
    /// Direction the cannon faces at rotation zero, in degrees about +Y
    pub initial_heading_deg: f32,
    pub min_power: f32,
    pub max_power: f32,
    pub default_power: f32,
    pub min_elevation_deg: f32,
    pub max_elevation_deg: f32,
    pub default_elevation_deg: f32,
    /// Muzzle speed at zero power
    pub base_speed: f32,
    /// Muzzle speed added at full power
    pub power_speed: f32,
    /// Barrel length from the pivot to the muzzle
    pub muzzle_offset: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            mount_position: Vec3::new(0.0, 0.0, -20.0),
            mount_half_extents: Vec3::new(2.0, 1.0, 1.5),
            initial_heading_deg: 0.0,
            min_power: 5.0,
            max_power: 100.0,
            default_power: 50.0,
            min_elevation_deg: 10.0,
            max_elevation_deg: 80.0,
            default_elevation_deg: 45.0,
            base_speed: 20.0,
            power_speed: 30.0,
            muzzle_offset: 1.05,
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let config: Self = serde_json::from_str(json).map_err(GameError::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| GameError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check gameplay values; physics settings are checked when the world is built
    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |msg: &str| Err(GameError::InvalidConfig(msg.to_string()));

        let e = &self.entities;
        let positive = [
            e.enemy_radius,
            e.rock_radius,
            e.bomb_radius,
            e.brick_length,
            e.brick_thickness,
            e.ground_half_size,
            e.enemy_mass,
            e.rock_mass,
            e.bomb_mass,
            e.brick_mass,
        ];
        if positive.iter().any(|v| !(*v > 0.0)) {
            return invalid("entity sizes and masses must be positive");
        }

        let a = &self.aim;
        if a.min_power > a.max_power || a.min_elevation_deg > a.max_elevation_deg {
            return invalid("aim minimums must not exceed maximums");
        }

        let x = &self.explosion;
        if x.radius <= 0.0 || x.fuse_delay < 0.0 || !(0.0..=1.0).contains(&x.sweep_factor) {
            return invalid("explosion radius must be positive, fuse non-negative, sweep factor in [0, 1]");
        }

        if self.collision.brick_kill_speed < 0.0 || self.stabilize_delay < 0.0 {
            return invalid("speeds and delays must be non-negative");
        }

        Ok(())
    }
}
