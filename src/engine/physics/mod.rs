// Physics adapter over rapier3d

pub mod body;
mod collision;
mod world;

pub use body::{presets, BodyBuilder, BodyHandle};
pub use collision::BodyPair;
pub use world::{PhysicsSettings, PhysicsWorld};

use glam::Vec3;
use rapier3d::na as nalgebra;
use rapier3d::prelude::{vector, Real, Vector};

/// Errors raised while bringing up the physics world
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("Gravity must be finite, got {0}")]
    InvalidGravity(Vec3),

    #[error("Fixed timestep must be positive, got {0}")]
    InvalidTimestep(f32),

    #[error("At least one sub-step per frame is required")]
    NoSubsteps,
}

pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

pub(crate) fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}
