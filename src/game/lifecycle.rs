// Entity lifecycle: removal, deferred effects and culling
//
// All of this runs on the loop thread, between physics steps. Removal is
// the single path by which an entity leaves the arena, so the registry,
// the physics world and the timer queue always agree.

use glam::Vec3;
use log::{debug, info, trace};

use super::arena::{Arena, TimerAction};
use super::entity::{EntityId, EntityKind, FuseState};
use super::presentation::{GameEvent, RemovalReason};
use crate::core::math;

impl Arena {
    /// Remove an entity together with its body and pending timers
    ///
    /// Returns false if the entity was already gone.
    pub fn remove(&mut self, id: EntityId, reason: RemovalReason) -> bool {
        let Some(mut entity) = self.registry.unregister(id) else {
            trace!("Ignoring removal of stale entity {}", id);
            return false;
        };

        if let Some(body) = entity.body.take() {
            self.physics.remove_body(body);
        }
        let cancelled = entity
            .fuse_timer
            .take()
            .is_some_and(|handle| self.timers.cancel(handle));

        debug!(
            "Removed {:?} {} ({:?}, fuse cancelled: {})",
            entity.kind(),
            id,
            reason,
            cancelled
        );
        self.emit(GameEvent::Removed {
            id,
            kind: entity.kind(),
            reason,
        });
        true
    }

    /// Schedule a bomb to go off `delay` seconds from the current tick
    ///
    /// The handle is kept on the bomb; rescheduling replaces the old timer.
    pub fn schedule_explosion(&mut self, id: EntityId, delay: f32) {
        let Some(bomb) = self.registry.find_mut(id) else {
            trace!("Not scheduling explosion of stale bomb {}", id);
            return;
        };
        let handle = self.timers.schedule(delay, TimerAction::Detonate(id));
        if let Some(previous) = bomb.fuse_timer.replace(handle) {
            self.timers.cancel(previous);
        }
    }

    /// Move the timer clock to the current tick
    ///
    /// Runs before collision resolution so fuses lit this tick count their
    /// delay from now.
    pub fn advance_clock(&mut self, dt: f32) {
        self.timers.advance_clock(dt);
    }

    /// Run every timer that has come due
    pub fn process_timers(&mut self) {
        for action in self.timers.take_due() {
            match action {
                TimerAction::Detonate(id) => {
                    self.detonate(id);
                }
                TimerAction::ReleaseBricks => {
                    let released = self.release_bricks();
                    info!("Level stabilized, {} bricks released", released);
                }
            }
        }
    }

    /// Release every locked brick into the simulation, asleep
    pub fn release_bricks(&mut self) -> usize {
        let mut released = 0;
        for id in self.registry.all_of_kind(EntityKind::Brick) {
            if let Some(brick) = self.registry.find_mut(id) {
                if brick.unlock() {
                    if let Some(body) = brick.body {
                        self.physics.release(body);
                    }
                    released += 1;
                }
            }
        }
        released
    }

    /// Set off a bomb whose fuse is burning
    ///
    /// Returns false, doing nothing, unless the bomb is still registered and
    /// in the `Exploding` state.
    pub fn detonate(&mut self, id: EntityId) -> bool {
        let Some(bomb) = self.registry.find_mut(id) else {
            trace!("Detonation of stale bomb {} skipped", id);
            return false;
        };
        if bomb.fuse() != Some(FuseState::Exploding) {
            return false;
        }
        let cached = bomb.position;
        let center = bomb
            .body
            .and_then(|body| self.physics.translation(body))
            .unwrap_or(cached);
        bomb.detonate();
        bomb.fuse_timer = None;

        let radius = self.config.explosion.radius;
        let mut victims = Vec::new();

        // Primary sweep against live body positions
        for enemy_id in self.registry.all_of_kind(EntityKind::Enemy) {
            let Some(enemy) = self.registry.find(enemy_id) else {
                continue;
            };
            let position = enemy
                .body
                .and_then(|body| self.physics.translation(body))
                .unwrap_or(enemy.position);
            if position.distance(center) < radius
                && self.remove(enemy_id, RemovalReason::Explosion)
            {
                victims.push(enemy_id);
            }
        }

        self.push_bricks(center, radius);

        // Secondary sweep against cached snapshots
        let sweep = radius * self.config.explosion.sweep_factor;
        for enemy_id in self.registry.all_of_kind(EntityKind::Enemy) {
            let near = self
                .registry
                .find(enemy_id)
                .is_some_and(|enemy| enemy.position.distance(cached) < sweep);
            if near && self.remove(enemy_id, RemovalReason::Explosion) {
                victims.push(enemy_id);
            }
        }

        info!(
            "Bomb {} exploded at {}, {} enemies caught",
            id,
            center,
            victims.len()
        );
        self.remove(id, RemovalReason::Detonated);
        self.emit(GameEvent::Exploded {
            id,
            position: center,
            victims,
        });
        true
    }

    /// Radial impulse on movable bricks in range, waking locked ones
    fn push_bricks(&mut self, center: Vec3, radius: f32) {
        let force = self.config.explosion.force;
        for brick_id in self.registry.all_of_kind(EntityKind::Brick) {
            let Some(brick) = self.registry.find_mut(brick_id) else {
                continue;
            };
            if !brick.is_movable_brick() {
                continue;
            }
            let Some(body) = brick.body else {
                continue;
            };
            let Some(position) = self.physics.translation(body) else {
                continue;
            };

            let distance = position.distance(center);
            if distance >= radius {
                continue;
            }
            if brick.unlock() {
                self.physics.release(body);
            }

            let direction = (position - center).try_normalize().unwrap_or(Vec3::Y);
            let impulse = direction * force * math::linear_falloff(distance, radius);
            self.physics.apply_impulse(body, impulse);
        }
    }

    /// Remove projectiles, enemies and bricks that left their playable volume
    pub fn cull_out_of_bounds(&mut self) -> usize {
        let mut culled = 0;
        for kind in [EntityKind::Projectile, EntityKind::Enemy, EntityKind::Brick] {
            let Some(bounds) = self.config.bounds.for_kind(kind) else {
                continue;
            };
            for id in self.registry.all_of_kind(kind) {
                let outside = self
                    .registry
                    .find(id)
                    .is_some_and(|entity| !bounds.contains(entity.position));
                if outside && self.remove(id, RemovalReason::OutOfBounds) {
                    culled += 1;
                }
            }
        }
        if culled > 0 {
            debug!("Culled {} entities out of bounds", culled);
        }
        culled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::aim::Launch;
    use crate::game::config::GameConfig;
    use crate::game::entity::{BrickKind, ProjectileKind};
    use crate::game::level::BrickSpec;

    fn arena() -> Arena {
        Arena::new(&GameConfig::default()).unwrap()
    }

    fn bomb_at(arena: &mut Arena, position: Vec3) -> EntityId {
        arena.spawn_projectile(
            ProjectileKind::Bomb,
            Launch {
                position,
                velocity: Vec3::ZERO,
            },
        )
    }

    /// Light the fuse the way a landing would
    fn light(arena: &mut Arena, id: EntityId) {
        assert!(arena.registry.find_mut(id).unwrap().light_fuse());
        arena.schedule_explosion(id, 1.0);
    }

    fn run_timers(arena: &mut Arena, dt: f32) {
        arena.advance_clock(dt);
        arena.process_timers();
    }

    fn removed_ids(events: &[GameEvent]) -> Vec<EntityId> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Removed { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut arena = arena();
        let id = arena.spawn_enemy(Vec3::new(0.0, 0.5, 0.0));
        arena.drain_events();

        assert!(arena.remove(id, RemovalReason::Hit));
        assert!(!arena.remove(id, RemovalReason::Hit));
        assert_eq!(arena.physics.body_count(), 0);
        assert_eq!(removed_ids(&arena.drain_events()), vec![id]);
    }

    #[test]
    fn test_remove_cancels_fuse() {
        let mut arena = arena();
        let bomb = bomb_at(&mut arena, Vec3::new(0.0, 0.3, 0.0));
        light(&mut arena, bomb);
        assert_eq!(arena.timers.len(), 1);

        arena.remove(bomb, RemovalReason::OutOfBounds);
        assert!(arena.timers.is_empty());
    }

    #[test]
    fn test_reschedule_replaces_fuse() {
        let mut arena = arena();
        let bomb = bomb_at(&mut arena, Vec3::new(0.0, 0.3, 0.0));
        light(&mut arena, bomb);
        let first = arena.registry.find(bomb).unwrap().fuse_timer.unwrap();

        arena.schedule_explosion(bomb, 2.0);
        let second = arena.registry.find(bomb).unwrap().fuse_timer.unwrap();
        assert_ne!(first, second);
        assert_eq!(arena.timers.len(), 1);

        // The replaced one-second fuse no longer fires
        run_timers(&mut arena, 1.5);
        assert!(arena.registry.contains(bomb));
        run_timers(&mut arena, 0.5);
        assert!(!arena.registry.contains(bomb));
    }

    #[test]
    fn test_bomb_chain() {
        let mut arena = arena();
        let bomb = bomb_at(&mut arena, Vec3::new(0.0, 0.3, 0.0));
        let near = arena.spawn_enemy(Vec3::new(3.0, 0.3, 0.0));
        // Beyond the secondary sweep (5.6), inside the blast radius
        let edge = arena.spawn_enemy(Vec3::new(7.5, 0.3, 0.0));
        let far = arena.spawn_enemy(Vec3::new(0.0, 0.3, 8.5));
        light(&mut arena, bomb);
        arena.drain_events();

        // Fuse still burning
        run_timers(&mut arena, 0.5);
        assert!(arena.registry.contains(near));
        assert!(arena.registry.contains(bomb));

        run_timers(&mut arena, 0.6);
        assert!(!arena.registry.contains(near));
        assert!(!arena.registry.contains(edge));
        assert!(arena.registry.contains(far));
        assert!(!arena.registry.contains(bomb));

        let events = arena.drain_events();
        let exploded: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Exploded { id, victims, .. } => Some((*id, victims.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(exploded, vec![(bomb, vec![near, edge])]);
    }

    #[test]
    fn test_explosion_at_most_once() {
        let mut arena = arena();
        let bomb = bomb_at(&mut arena, Vec3::new(0.0, 0.3, 0.0));
        arena.spawn_enemy(Vec3::new(1.0, 0.3, 0.0));
        light(&mut arena, bomb);
        // A stray second timer for the same bomb must not explode it twice
        arena.timers.schedule(1.0, TimerAction::Detonate(bomb));
        arena.drain_events();

        run_timers(&mut arena, 1.5);
        assert!(!arena.detonate(bomb));

        let explosions = arena
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Exploded { .. }))
            .count();
        assert_eq!(explosions, 1);
    }

    #[test]
    fn test_detonate_requires_lit_fuse() {
        let mut arena = arena();
        let bomb = bomb_at(&mut arena, Vec3::new(0.0, 0.3, 0.0));
        let enemy = arena.spawn_enemy(Vec3::new(1.0, 0.3, 0.0));

        assert!(!arena.detonate(bomb));
        assert!(arena.registry.contains(enemy));
        assert!(arena.registry.contains(bomb));
    }

    #[test]
    fn test_explosion_pushes_movable_bricks() {
        let mut arena = arena();
        let bomb = bomb_at(&mut arena, Vec3::new(0.0, 0.3, 0.0));
        let movable = arena.spawn_brick(&BrickSpec {
            kind: BrickKind::Movable,
            pos: Vec3::new(2.0, 0.3, 0.0),
            rotation: None,
        });
        let fixed = arena.spawn_brick(&BrickSpec {
            kind: BrickKind::Immovable,
            pos: Vec3::new(-2.0, 0.3, 0.0),
            rotation: None,
        });
        light(&mut arena, bomb);

        run_timers(&mut arena, 1.0);

        let brick = arena.registry.find(movable).unwrap();
        assert!(!brick.is_locked());
        let body = brick.body.unwrap();
        assert!(!arena.physics.is_locked(body));
        assert!(arena.physics.linvel(body).unwrap().x > 0.0);

        let body = arena.registry.find(fixed).unwrap().body.unwrap();
        assert_eq!(arena.physics.linvel(body), Some(Vec3::ZERO));
    }

    #[test]
    fn test_release_bricks_on_timer() {
        let mut arena = arena();
        let brick = arena.spawn_brick(&BrickSpec {
            kind: BrickKind::Movable,
            pos: Vec3::new(0.0, 0.3, 0.0),
            rotation: None,
        });
        arena.timers.schedule(0.2, TimerAction::ReleaseBricks);

        run_timers(&mut arena, 0.1);
        assert!(arena.registry.find(brick).unwrap().is_locked());
        run_timers(&mut arena, 0.1);
        assert!(!arena.registry.find(brick).unwrap().is_locked());
        assert_eq!(arena.release_bricks(), 0);
    }

    #[test]
    fn test_cull_out_of_bounds() {
        let mut arena = arena();
        let sunk = arena.spawn_enemy(Vec3::new(0.0, -31.0, 0.0));
        let fine = arena.spawn_enemy(Vec3::new(0.0, 0.5, 0.0));
        let stray = arena.spawn_projectile(
            ProjectileKind::Rock,
            Launch {
                position: Vec3::new(0.0, 5.0, 301.0),
                velocity: Vec3::ZERO,
            },
        );

        assert_eq!(arena.cull_out_of_bounds(), 2);
        assert!(!arena.registry.contains(sunk));
        assert!(!arena.registry.contains(stray));
        assert!(arena.registry.contains(fine));
        assert_eq!(arena.cull_out_of_bounds(), 0);
    }

    #[test]
    fn test_cull_bricks_out_of_bounds() {
        let mut arena = arena();
        let brick = |arena: &mut Arena, pos| {
            arena.spawn_brick(&BrickSpec {
                kind: BrickKind::Movable,
                pos,
                rotation: None,
            })
        };
        let wide = brick(&mut arena, Vec3::new(181.0, 0.3, 0.0));
        let deep = brick(&mut arena, Vec3::new(0.0, -41.0, 0.0));
        let sideways = brick(&mut arena, Vec3::new(0.0, 0.3, -181.0));
        // Past the enemy limit but within the brick one
        let kept = brick(&mut arena, Vec3::new(170.0, -35.0, 0.0));
        arena.drain_events();

        assert_eq!(arena.cull_out_of_bounds(), 3);
        for id in [wide, deep, sideways] {
            assert!(!arena.registry.contains(id));
        }
        assert!(arena.registry.contains(kept));
        assert_eq!(arena.physics.body_count(), 1);
        assert!(arena.drain_events().iter().all(|e| matches!(
            e,
            GameEvent::Removed {
                kind: EntityKind::Brick,
                reason: RemovalReason::OutOfBounds,
                ..
            }
        )));
    }
}
