// Boundaries between the game core and whatever presents it
//
// The core pushes to these sinks and never reads back from them. A
// renderer, a HUD widget or a plain logger can sit on the other side.

use glam::Vec3;
use log::{debug, trace};

use super::ammo::AmmoCount;
use super::entity::{EntityId, EntityKind, ProjectileKind};

/// Receives visual add/remove notifications for entities
pub trait SceneSink {
    fn add_visual(&mut self, id: EntityId, kind: EntityKind, position: Vec3);
    fn remove_visual(&mut self, id: EntityId);
}

/// What the heads-up display shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudSnapshot {
    pub ammo_remaining: AmmoCount,
    pub aim_angle_deg: f32,
    pub aim_power: f32,
    pub selected: ProjectileKind,
}

pub trait HudSink {
    fn update(&mut self, snapshot: &HudSnapshot);
}

/// Why an entity left the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Rock struck an enemy
    Hit,
    /// Enemy crushed by a fast brick
    Crushed,
    /// Caught in a bomb blast
    Explosion,
    /// The bomb itself after going off
    Detonated,
    OutOfBounds,
    /// Torn down with the level
    LevelReset,
}

/// Notable things that happened inside the core
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Spawned {
        id: EntityId,
        kind: EntityKind,
        position: Vec3,
    },
    Fired {
        id: EntityId,
        kind: ProjectileKind,
    },
    BombArmed {
        id: EntityId,
    },
    Exploded {
        id: EntityId,
        position: Vec3,
        victims: Vec<EntityId>,
    },
    Removed {
        id: EntityId,
        kind: EntityKind,
        reason: RemovalReason,
    },
}

/// Scene sink that only logs
#[derive(Debug, Default)]
pub struct LogScene {
    visuals: usize,
}

impl LogScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SceneSink for LogScene {
    fn add_visual(&mut self, id: EntityId, kind: EntityKind, position: Vec3) {
        self.visuals += 1;
        trace!(
            "Scene: add {:?} {} at {} ({} shown)",
            kind,
            id,
            position,
            self.visuals
        );
    }

    fn remove_visual(&mut self, id: EntityId) {
        self.visuals = self.visuals.saturating_sub(1);
        trace!("Scene: remove {} ({} shown)", id, self.visuals);
    }
}

/// HUD sink that logs every change
#[derive(Debug, Default)]
pub struct LogHud {
    last: Option<HudSnapshot>,
}

impl LogHud {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HudSink for LogHud {
    fn update(&mut self, snapshot: &HudSnapshot) {
        if self.last.as_ref() != Some(snapshot) {
            debug!(
                "HUD: rock {} bomb {} | {:.1}° power {:.0} | {}",
                snapshot.ammo_remaining.rock,
                snapshot.ammo_remaining.bomb,
                snapshot.aim_angle_deg,
                snapshot.aim_power,
                snapshot.selected.name()
            );
        }
        self.last = Some(*snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_scene_counts_visuals() {
        let mut scene = LogScene::new();
        scene.add_visual(EntityId(1), EntityKind::Enemy, Vec3::ZERO);
        scene.add_visual(EntityId(2), EntityKind::Brick, Vec3::ZERO);
        scene.remove_visual(EntityId(1));
        assert_eq!(scene.visuals, 1);
    }

    #[test]
    fn test_log_hud_keeps_last() {
        let mut hud = LogHud::new();
        let snapshot = HudSnapshot {
            ammo_remaining: AmmoCount::new(3, 1),
            aim_angle_deg: 45.0,
            aim_power: 50.0,
            selected: ProjectileKind::Bomb,
        };
        hud.update(&snapshot);
        assert_eq!(hud.last, Some(snapshot));
    }
}
