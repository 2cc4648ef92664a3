// Level data
//
// Levels are JSON documents describing the ammo budget, the brick
// structures, enemy positions and purely decorative scenery. The built-in
// campaign is embedded into the binary.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ammo::AmmoCount;
use super::config::EntityDimensions;
use super::entity::BrickKind;
use super::error::GameError;

const BUILTIN_LEVELS: [&str; 3] = [
    include_str!("../../levels/level1.json"),
    include_str!("../../levels/level2.json"),
    include_str!("../../levels/level3.json"),
];

/// Rotation value that stands a brick on its end
const UPRIGHT_ROTATION_DEG: f32 = 90.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub difficulty: String,
    pub ammo: AmmoCount,
    #[serde(default)]
    pub bricks: Vec<BrickSpec>,
    pub enemies: Vec<EnemySpec>,
    #[serde(default)]
    pub scenery: Vec<ScenerySpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickSpec {
    #[serde(rename = "type")]
    pub kind: BrickKind,
    /// Center of the brick
    pub pos: Vec3,
    /// Degrees; 90 stands the brick upright, anything else yaws it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
}

impl BrickSpec {
    pub fn is_upright(&self) -> bool {
        self.rotation == Some(UPRIGHT_ROTATION_DEG)
    }

    /// Half extents of the brick box in its local frame
    pub fn half_extents(&self, dims: &EntityDimensions) -> Vec3 {
        let long = dims.brick_length * 0.5;
        let short = dims.brick_thickness * 0.5;
        if self.is_upright() {
            Vec3::new(short, long, short)
        } else {
            Vec3::new(long, short, short)
        }
    }

    /// Yaw about +Y in radians
    pub fn yaw(&self) -> f32 {
        match self.rotation {
            Some(deg) if !self.is_upright() => deg.to_radians(),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    pub pos: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenerySpec {
    pub pos: Vec3,
}

impl LevelData {
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let level: Self = serde_json::from_str(json).map_err(GameError::LevelParse)?;
        level.validate()?;
        Ok(level)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| GameError::LevelIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.enemies.is_empty() {
            return Err(GameError::InvalidLevel(format!(
                "level '{}' has no enemies",
                self.difficulty
            )));
        }

        let mut positions = self
            .bricks
            .iter()
            .map(|b| b.pos)
            .chain(self.enemies.iter().map(|e| e.pos))
            .chain(self.scenery.iter().map(|s| s.pos));
        if positions.any(|p| !p.is_finite()) {
            return Err(GameError::InvalidLevel(format!(
                "level '{}' has a non-finite position",
                self.difficulty
            )));
        }

        if self.bricks.iter().any(|b| b.rotation.is_some_and(|r| !r.is_finite())) {
            return Err(GameError::InvalidLevel(format!(
                "level '{}' has a non-finite brick rotation",
                self.difficulty
            )));
        }

        Ok(())
    }
}

/// The embedded campaign, in play order
pub fn builtin_levels() -> Result<Vec<LevelData>, GameError> {
    BUILTIN_LEVELS
        .iter()
        .map(|json| LevelData::from_json_str(json))
        .collect()
}
