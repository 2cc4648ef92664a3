// Collision resolution
//
// Turns raw physics contacts into gameplay consequences. Three passes run
// each tick: engine contacts, a ground check for bombs, and a manual
// distance check that catches hits the engine missed. Every rule is
// guarded by registry membership and fuse state, so a hit seen by more
// than one pass is applied once.

use log::{debug, info, trace};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::arena::Arena;
use super::config::{CollisionTuning, GameConfig};
use super::entity::{EntityId, EntityKind, FuseState, ProjectileKind};
use super::presentation::{GameEvent, RemovalReason};
use crate::core::math;
use crate::engine::physics::BodyPair;

/// What one resolution pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolutionReport {
    /// Contact pairs between two live, non-decorative entities
    pub contacts: usize,
    pub enemies_removed: usize,
    pub bombs_armed: usize,
}

impl ResolutionReport {
    fn merge(&mut self, other: ResolutionReport) {
        self.contacts += other.contacts;
        self.enemies_removed += other.enemies_removed;
        self.bombs_armed += other.bombs_armed;
    }
}

pub struct CollisionResolver {
    tuning: CollisionTuning,
    fuse_delay: f32,
    rng: Pcg32,
}

impl CollisionResolver {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            tuning: config.collision.clone(),
            fuse_delay: config.explosion.fuse_delay,
            rng: Pcg32::seed_from_u64(config.seed),
        }
    }

    /// Run all three passes against the contacts of the last physics step
    pub fn resolve(&mut self, arena: &mut Arena) -> ResolutionReport {
        let contacts = arena.physics.contacts_this_step().to_vec();

        let mut report = self.resolve_contacts(arena, &contacts);
        report.merge(self.resolve_ground_proximity(arena));
        report.merge(self.resolve_proximity(arena));

        if report != ResolutionReport::default() {
            debug!("Collision pass: {:?}", report);
        }
        report
    }

    /// Pass 1: contacts reported by the physics engine
    pub fn resolve_contacts(
        &mut self,
        arena: &mut Arena,
        pairs: &[BodyPair],
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        let mut projectile_pairs = Vec::new();
        let mut brick_pairs = Vec::new();

        // Bodies carry their entity id; a body whose entity is gone is stale
        let owner = |body| {
            arena
                .physics
                .owner_of(body)
                .map(EntityId)
                .filter(|id| arena.registry.contains(*id))
        };

        for pair in pairs {
            let (Some(a), Some(b)) = (owner(pair.first), owner(pair.second)) else {
                trace!("Contact with an unregistered body ignored");
                continue;
            };
            let (Some(kind_a), Some(kind_b)) = (kind_of(arena, a), kind_of(arena, b)) else {
                continue;
            };
            if kind_a == EntityKind::Decorative || kind_b == EntityKind::Decorative {
                continue;
            }
            report.contacts += 1;

            // Active side first; projectile rules run before any brick rule
            match (kind_a, kind_b) {
                (EntityKind::Projectile, _) => projectile_pairs.push((a, b)),
                (_, EntityKind::Projectile) => projectile_pairs.push((b, a)),
                (EntityKind::Enemy, _) => brick_pairs.push((a, b)),
                (_, EntityKind::Enemy) => brick_pairs.push((b, a)),
                _ => {}
            }
        }

        for (subject, other) in projectile_pairs.into_iter().chain(brick_pairs) {
            self.resolve_pair(arena, subject, other, &mut report);
        }

        report
    }

    fn resolve_pair(
        &mut self,
        arena: &mut Arena,
        subject: EntityId,
        other: EntityId,
        report: &mut ResolutionReport,
    ) {
        let Some((subject_kind, projectile_kind)) = arena
            .registry
            .find(subject)
            .map(|e| (e.kind(), e.projectile_kind()))
        else {
            return;
        };
        let Some(other_kind) = kind_of(arena, other) else {
            return;
        };

        match (subject_kind, projectile_kind, other_kind) {
            (
                _,
                Some(ProjectileKind::Bomb),
                EntityKind::Enemy | EntityKind::Brick | EntityKind::Ground,
            ) => {
                if self.arm_bomb(arena, subject, other_kind == EntityKind::Ground) {
                    report.bombs_armed += 1;
                }
            }
            (_, Some(ProjectileKind::Rock), EntityKind::Enemy) => {
                if rock_hit(arena, subject, other) {
                    report.enemies_removed += 1;
                }
            }
            (EntityKind::Enemy, _, EntityKind::Brick) => {
                if self.brick_hit(arena, subject, other, false) {
                    report.enemies_removed += 1;
                }
            }
            _ => {}
        }
    }

    /// Pass 2: bombs that reached the ground without a reported contact
    pub fn resolve_ground_proximity(&mut self, arena: &mut Arena) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        for id in arena.registry.all_of_kind(EntityKind::Projectile) {
            let grounded = arena.registry.find(id).is_some_and(|p| {
                p.is_bomb()
                    && p.fuse() == Some(FuseState::Armed)
                    && p.position.y < self.tuning.bomb_ground_height
            });
            if grounded && self.arm_bomb(arena, id, true) {
                report.bombs_armed += 1;
            }
        }

        report
    }

    /// Pass 3: distance checks between enemies and projectiles or bricks
    pub fn resolve_proximity(&mut self, arena: &mut Arena) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        let projectiles = arena.registry.all_of_kind(EntityKind::Projectile);
        let bricks = arena.registry.all_of_kind(EntityKind::Brick);

        for enemy_id in arena.registry.all_of_kind(EntityKind::Enemy) {
            for &projectile_id in &projectiles {
                if !arena.registry.contains(enemy_id) {
                    break;
                }
                if !within(arena, enemy_id, projectile_id, self.tuning.projectile_margin) {
                    continue;
                }
                let Some((kind, fuse, height)) = arena
                    .registry
                    .find(projectile_id)
                    .map(|p| (p.projectile_kind(), p.fuse(), p.position.y))
                else {
                    continue;
                };
                match (kind, fuse) {
                    (Some(ProjectileKind::Rock), _) => {
                        if rock_hit(arena, projectile_id, enemy_id) {
                            report.enemies_removed += 1;
                        }
                    }
                    (Some(ProjectileKind::Bomb), Some(FuseState::Armed)) => {
                        let low = height < self.tuning.bomb_ground_height;
                        if self.arm_bomb(arena, projectile_id, low) {
                            report.bombs_armed += 1;
                        }
                    }
                    _ => {}
                }
            }

            if !arena.registry.contains(enemy_id) {
                continue;
            }

            for &brick_id in &bricks {
                let moving = arena.registry.find(brick_id).is_some_and(|brick| {
                    brick.is_movable_brick()
                        && !brick.is_locked()
                        && brick
                            .body
                            .and_then(|body| arena.physics.speed(body))
                            .is_some_and(|speed| speed > self.tuning.brick_kill_speed)
                });
                if moving
                    && within(arena, enemy_id, brick_id, self.tuning.brick_margin)
                    && self.brick_hit(arena, enemy_id, brick_id, true)
                {
                    report.enemies_removed += 1;
                    break;
                }
            }
        }

        report
    }

    /// Armed → Exploding: stop the bomb, settle it on the ground, light the fuse
    fn arm_bomb(&mut self, arena: &mut Arena, id: EntityId, on_ground: bool) -> bool {
        let Some(bomb) = arena.registry.find_mut(id) else {
            return false;
        };
        if !bomb.light_fuse() {
            return false;
        }

        let rest_height = self.tuning.bomb_rest_height;
        let snap = on_ground || bomb.position.y < self.tuning.bomb_ground_height;
        if snap {
            bomb.position.y = rest_height;
        }
        let position = bomb.position;

        if let Some(body) = bomb.body {
            arena.physics.stop(body);
            if snap {
                let mut translation = arena.physics.translation(body).unwrap_or(position);
                translation.y = rest_height;
                arena.physics.set_translation(body, translation);
            }
        }

        arena.schedule_explosion(id, self.fuse_delay);
        arena.emit(GameEvent::BombArmed { id });
        info!("Bomb {} landed, fuse lit ({:.1}s)", id, self.fuse_delay);
        true
    }

    /// Enemy struck by a movable brick
    ///
    /// `checked` skips the speed test when the caller has already done it.
    fn brick_hit(
        &mut self,
        arena: &mut Arena,
        enemy: EntityId,
        brick: EntityId,
        checked: bool,
    ) -> bool {
        let Some(body) = arena
            .registry
            .find(brick)
            .filter(|b| b.is_movable_brick())
            .and_then(|b| b.body)
        else {
            return false;
        };
        if !checked {
            let speed = arena.physics.speed(body).unwrap_or(0.0);
            if speed <= self.tuning.brick_kill_speed {
                return false;
            }
        }
        if !arena.remove(enemy, RemovalReason::Crushed) {
            return false;
        }

        let recoil = math::upward_biased_direction(&mut self.rng, self.tuning.recoil_up_bias)
            * self.tuning.recoil_impulse;
        arena.physics.apply_impulse(body, recoil);
        debug!("Enemy {} crushed by brick {}", enemy, brick);
        true
    }
}

/// Rock meets enemy: both go, provided both are still here
fn rock_hit(arena: &mut Arena, rock: EntityId, enemy: EntityId) -> bool {
    if !(arena.registry.contains(rock) && arena.registry.contains(enemy)) {
        return false;
    }
    arena.remove(enemy, RemovalReason::Hit);
    arena.remove(rock, RemovalReason::Hit);
    debug!("Rock {} hit enemy {}", rock, enemy);
    true
}

fn kind_of(arena: &Arena, id: EntityId) -> Option<EntityKind> {
    arena.registry.find(id).map(|e| e.kind())
}

/// Cached positions closer than the two collision radii plus `margin`
fn within(arena: &Arena, a: EntityId, b: EntityId, margin: f32) -> bool {
    match (arena.registry.find(a), arena.registry.find(b)) {
        (Some(a), Some(b)) => a.distance_to(b) < a.collision_radius + b.collision_radius + margin,
        _ => false,
    }
}
