// The live world of one level: physics, entities and pending timers

use glam::Vec3;
use log::{debug, info};

use super::aim::Launch;
use super::config::GameConfig;
use super::entity::{
    BrickKind, CannonModel, Entity, EntityData, EntityId, EntityKind, FuseState, ProjectileKind,
};
use super::error::GameError;
use super::level::{BrickSpec, LevelData};
use super::presentation::{GameEvent, RemovalReason};
use super::registry::EntityRegistry;
use crate::engine::physics::{presets, BodyBuilder, PhysicsWorld};
use crate::engine::timer::TimerQueue;

/// Deferred work run by the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Fuse of this bomb has burnt down
    Detonate(EntityId),
    /// Let the level's frozen bricks fall
    ReleaseBricks,
}

/// Everything alive in the current level
///
/// A fresh arena, with a fresh physics world, is built for every level
/// start or retry.
pub struct Arena {
    pub(super) physics: PhysicsWorld,
    pub(super) registry: EntityRegistry,
    pub(super) timers: TimerQueue<TimerAction>,
    pub(super) config: GameConfig,
    events: Vec<GameEvent>,
}

impl Arena {
    /// Empty arena with no ground
    pub fn new(config: &GameConfig) -> Result<Self, GameError> {
        Self::starting_at(config, EntityId(0))
    }

    /// Empty arena handing out entity ids from `first` on
    pub fn starting_at(config: &GameConfig, first: EntityId) -> Result<Self, GameError> {
        Ok(Self {
            physics: PhysicsWorld::new(&config.physics)?,
            registry: EntityRegistry::starting_at(first),
            timers: TimerQueue::new(),
            config: config.clone(),
            events: Vec::new(),
        })
    }

    /// Build the whole level: ground, cannon mount, structures, enemies, scenery
    pub fn from_level(
        config: &GameConfig,
        level: &LevelData,
        cannon: CannonModel,
        first: EntityId,
    ) -> Result<Self, GameError> {
        let mut arena = Self::starting_at(config, first)?;

        arena.spawn_ground();
        arena.spawn_mount(cannon);
        for brick in &level.bricks {
            arena.spawn_brick(brick);
        }
        for enemy in &level.enemies {
            arena.spawn_enemy(enemy.pos);
        }
        for scenery in &level.scenery {
            arena.spawn_decorative(scenery.pos);
        }

        arena
            .timers
            .schedule(config.stabilize_delay, TimerAction::ReleaseBricks);

        info!(
            "Built level '{}': {} bricks, {} enemies, {} bodies",
            level.difficulty,
            level.bricks.len(),
            level.enemies.len(),
            arena.physics.body_count()
        );
        Ok(arena)
    }

    fn insert(&mut self, mut entity: Entity, builder: Option<BodyBuilder>) -> EntityId {
        let id = entity.id;
        if let Some(builder) = builder {
            entity.body = Some(self.physics.add_body(id.as_u64(), &builder));
        }

        self.events.push(GameEvent::Spawned {
            id,
            kind: entity.kind(),
            position: entity.position,
        });
        self.registry.register(entity);
        id
    }

    pub fn spawn_ground(&mut self) -> EntityId {
        let id = self.registry.next_id();
        let entity = Entity::new(id, EntityData::Ground, Vec3::ZERO, 0.0);
        let builder = presets::ground(self.config.entities.ground_half_size);
        self.insert(entity, Some(builder))
    }

    pub fn spawn_mount(&mut self, model: CannonModel) -> EntityId {
        let aim = &self.config.aim;
        let center = aim.mount_position + Vec3::new(0.0, aim.mount_half_extents.y, 0.0);
        let builder = presets::mount(
            aim.mount_half_extents,
            center,
            aim.initial_heading_deg.to_radians(),
        );

        let id = self.registry.next_id();
        let entity = Entity::new(id, EntityData::Mount { model }, center, 0.0);
        self.insert(entity, Some(builder))
    }

    /// Movable bricks start locked until the level stabilizes
    pub fn spawn_brick(&mut self, spec: &BrickSpec) -> EntityId {
        let dims = &self.config.entities;
        let movable = spec.kind == BrickKind::Movable;
        let mass = if movable { dims.brick_mass } else { 0.0 };

        let builder = presets::brick(spec.half_extents(dims), mass, spec.pos, spec.yaw())
            .locked(movable);

        let id = self.registry.next_id();
        let data = EntityData::Brick {
            kind: spec.kind,
            mass,
            locked: movable,
        };
        let entity = Entity::new(id, data, spec.pos, dims.brick_collision_radius);
        self.insert(entity, Some(builder))
    }

    pub fn spawn_enemy(&mut self, position: Vec3) -> EntityId {
        let dims = &self.config.entities;
        let builder = presets::enemy(dims.enemy_radius, dims.enemy_mass, position);

        let id = self.registry.next_id();
        let entity = Entity::new(id, EntityData::Enemy, position, dims.enemy_radius);
        self.insert(entity, Some(builder))
    }

    /// Scenery gets a visual but no body
    pub fn spawn_decorative(&mut self, position: Vec3) -> EntityId {
        let id = self.registry.next_id();
        let entity = Entity::new(id, EntityData::Decorative, position, 0.0);
        self.insert(entity, None)
    }

    pub fn spawn_projectile(&mut self, kind: ProjectileKind, launch: Launch) -> EntityId {
        let (radius, mass, collision_radius) = self.config.entities.projectile(kind);
        let builder = presets::projectile(radius, mass, launch.position, launch.velocity);

        let id = self.registry.next_id();
        let data = EntityData::Projectile {
            kind,
            fuse: FuseState::Armed,
        };
        let mut entity = Entity::new(id, data, launch.position, collision_radius);
        entity.velocity = launch.velocity;

        let id = self.insert(entity, Some(builder));
        self.events.push(GameEvent::Fired { id, kind });
        id
    }

    /// Advance the physics simulation
    pub fn step(&mut self, dt: f32) {
        self.physics.step(dt);
    }

    /// Copy body positions and velocities into the entity snapshots
    pub fn sync_snapshots(&mut self) {
        let physics = &self.physics;
        for entity in self.registry.iter_mut() {
            let Some(body) = entity.body else {
                continue;
            };
            if let (Some(position), Some(velocity)) =
                (physics.translation(body), physics.linvel(body))
            {
                entity.position = position;
                entity.velocity = velocity;
            }
        }
    }

    pub fn enemy_count(&self) -> usize {
        self.registry.count_of_kind(EntityKind::Enemy)
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub(super) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Remove every entity ahead of a level change
    pub fn teardown(&mut self) {
        let ids: Vec<EntityId> = EntityKind::ALL
            .iter()
            .flat_map(|kind| self.registry.all_of_kind(*kind))
            .collect();
        for id in &ids {
            self.remove(*id, RemovalReason::LevelReset);
        }
        self.timers.clear();
        debug!("Arena torn down, {} entities removed", ids.len());
    }
}
