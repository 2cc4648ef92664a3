use glam::Vec3;
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::body::{BodyBuilder, BodyHandle};
use super::collision::{BodyPair, CollisionEventQueue};
use super::{to_vec3, to_vector, PhysicsError};

/// Tunables for the simulation itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Gravity vector (default: -9.8 m/s² in y-axis)
    pub gravity: Vec3,
    /// Longest sub-step the world will integrate at once
    pub fixed_timestep: f32,
    /// Upper bound on sub-steps per `step` call; extra time is dropped
    pub max_substeps: u32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 10,
        }
    }
}

impl PhysicsSettings {
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidGravity(self.gravity));
        }
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(PhysicsError::InvalidTimestep(self.fixed_timestep));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::NoSubsteps);
        }
        Ok(())
    }
}

/// Physics world that manages all physics simulation
///
/// Every read and write of a body goes through this type; callers only ever
/// hold [`BodyHandle`]s.
pub struct PhysicsWorld {
    settings: PhysicsSettings,

    /// Integration parameters for the physics simulation
    integration_parameters: IntegrationParameters,

    /// Physics pipeline handles collision detection and solving
    physics_pipeline: PhysicsPipeline,

    /// Island manager for sleeping bodies
    island_manager: IslandManager,

    /// Broad phase collision detection
    broad_phase: DefaultBroadPhase,

    /// Narrow phase collision detection
    narrow_phase: NarrowPhase,

    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,

    /// CCD solver for fast-moving objects
    ccd_solver: CCDSolver,

    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,

    /// Started-contact events raised during the current step
    collision_event_queue: CollisionEventQueue,

    /// Pairs touching during the last `step`, deduplicated
    contacts: Vec<BodyPair>,
    seen_pairs: HashSet<((u32, u32), (u32, u32))>,
}

impl PhysicsWorld {
    /// Create a new physics world, rejecting unusable settings
    pub fn new(settings: &PhysicsSettings) -> Result<Self, PhysicsError> {
        settings.validate()?;

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = settings.fixed_timestep;

        Ok(Self {
            settings: *settings,
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            collision_event_queue: CollisionEventQueue::new(),
            contacts: Vec::with_capacity(64),
            seen_pairs: HashSet::with_capacity(64),
        })
    }

    /// Advance the simulation by `dt` seconds in equal sub-steps
    pub fn step(&mut self, dt: f32) {
        self.contacts.clear();
        self.seen_pairs.clear();
        self.collision_event_queue.clear();

        if !(dt.is_finite() && dt > 0.0) {
            return;
        }

        let fixed = self.settings.fixed_timestep;
        let substeps = ((dt / fixed).ceil() as u32).clamp(1, self.settings.max_substeps);
        self.integration_parameters.dt = (dt / substeps as f32).min(fixed);

        let gravity = to_vector(self.settings.gravity);
        for _ in 0..substeps {
            self.physics_pipeline.step(
                &gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                None,
                &(),
                &self.collision_event_queue,
            );
            self.collect_contacts();
        }
    }

    fn collect_contacts(&mut self) {
        let mut pairs = self.collision_event_queue.drain();
        pairs.extend(
            self.narrow_phase
                .contact_pairs()
                .filter(|pair| pair.has_any_active_contact)
                .map(|pair| (pair.collider1, pair.collider2)),
        );

        for (c1, c2) in pairs {
            let parent = |c: ColliderHandle| self.collider_set.get(c).and_then(|c| c.parent());
            let (Some(b1), Some(b2)) = (parent(c1), parent(c2)) else {
                continue;
            };
            if b1 == b2 {
                continue;
            }

            let (k1, k2) = (b1.into_raw_parts(), b2.into_raw_parts());
            let key = if k1 <= k2 { (k1, k2) } else { (k2, k1) };
            if self.seen_pairs.insert(key) {
                self.contacts
                    .push(BodyPair::new(BodyHandle(b1), BodyHandle(b2)));
            }
        }
    }

    /// Pairs that touched during the last `step`
    pub fn contacts_this_step(&self) -> &[BodyPair] {
        &self.contacts
    }

    /// Add a body and its collider, tagging it with the owning entity id
    pub fn add_body(&mut self, owner: u64, builder: &BodyBuilder) -> BodyHandle {
        let handle = self.rigid_body_set.insert(builder.build_body(owner));
        self.collider_set.insert_with_parent(
            builder.build_collider(),
            handle,
            &mut self.rigid_body_set,
        );
        BodyHandle(handle)
    }

    /// Remove a body and its collider; false if it was already gone
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle.0,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true, // remove attached colliders
            )
            .is_some()
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Entity id the body was created for
    pub fn owner_of(&self, handle: BodyHandle) -> Option<u64> {
        self.rigid_body_set
            .get(handle.0)
            .map(|body| body.user_data as u64)
    }

    pub fn translation(&self, handle: BodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle.0)
            .map(|body| to_vec3(body.translation()))
    }

    pub fn linvel(&self, handle: BodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle.0)
            .map(|body| to_vec3(body.linvel()))
    }

    /// Magnitude of the linear velocity
    pub fn speed(&self, handle: BodyHandle) -> Option<f32> {
        self.linvel(handle).map(Vec3::length)
    }

    /// Whether the body is still frozen from a locked start
    pub fn is_locked(&self, handle: BodyHandle) -> bool {
        self.rigid_body_set
            .get(handle.0)
            .is_some_and(|body| body.is_kinematic())
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle.0) {
            body.set_linvel(to_vector(velocity), true);
        }
    }

    /// Zero both linear and angular velocity
    pub fn stop(&mut self, handle: BodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle.0) {
            body.set_linvel(Vector::zeros(), true);
            body.set_angvel(Vector::zeros(), true);
        }
    }

    /// Apply an impulse at the center of mass
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle.0) {
            body.apply_impulse(to_vector(impulse), true);
        }
    }

    pub fn set_translation(&mut self, handle: BodyHandle, position: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle.0) {
            body.set_translation(to_vector(position), true);
        }
    }

    /// Turn a locked body into a resting dynamic one; false if not locked
    pub fn release(&mut self, handle: BodyHandle) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle.0) else {
            return false;
        };
        if !body.is_kinematic() {
            return false;
        }

        body.set_body_type(RigidBodyType::Dynamic, false);
        body.set_linvel(Vector::zeros(), false);
        body.set_angvel(Vector::zeros(), false);
        body.sleep();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::presets;
    use approx::assert_relative_eq;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(&PhysicsSettings::default()).unwrap()
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = PhysicsSettings::default();
        settings.fixed_timestep = 0.0;
        assert!(matches!(
            PhysicsWorld::new(&settings),
            Err(PhysicsError::InvalidTimestep(_))
        ));

        let mut settings = PhysicsSettings::default();
        settings.gravity = Vec3::new(0.0, f32::NAN, 0.0);
        assert!(PhysicsWorld::new(&settings).is_err());

        let mut settings = PhysicsSettings::default();
        settings.max_substeps = 0;
        assert!(matches!(
            PhysicsWorld::new(&settings),
            Err(PhysicsError::NoSubsteps)
        ));
    }

    #[test]
    fn test_add_and_remove_body() {
        let mut world = world();
        let handle = world.add_body(42, &presets::enemy(0.5, 1.0, Vec3::new(1.0, 2.0, 3.0)));

        assert_eq!(world.body_count(), 1);
        assert_eq!(world.owner_of(handle), Some(42));
        assert_eq!(world.translation(handle), Some(Vec3::new(1.0, 2.0, 3.0)));

        assert!(world.remove_body(handle));
        assert!(!world.remove_body(handle));
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.translation(handle), None);
        assert_eq!(world.owner_of(handle), None);
    }

    #[test]
    fn test_gravity_pulls_dynamic_body() {
        let mut world = world();
        let handle = world.add_body(1, &presets::enemy(0.5, 1.0, Vec3::new(0.0, 10.0, 0.0)));

        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }

        let y = world.translation(handle).unwrap().y;
        assert!(y < 10.0, "body should fall, y = {}", y);
    }

    #[test]
    fn test_non_positive_dt_is_noop() {
        let mut world = world();
        let handle = world.add_body(1, &presets::enemy(0.5, 1.0, Vec3::new(0.0, 10.0, 0.0)));
        world.step(0.0);
        world.step(-1.0);
        assert_eq!(world.translation(handle), Some(Vec3::new(0.0, 10.0, 0.0)));
    }

    #[test]
    fn test_ball_on_ground_reports_contact() {
        let mut world = world();
        let ground = world.add_body(1, &presets::ground(50.0));
        let ball = world.add_body(2, &presets::enemy(0.5, 1.0, Vec3::new(0.0, 1.0, 0.0)));
        let expected = BodyPair::new(ground, ball);

        let mut touched = false;
        for _ in 0..120 {
            world.step(1.0 / 60.0);
            touched |= world
                .contacts_this_step()
                .iter()
                .any(|pair| pair.same_bodies(&expected));
        }
        assert!(touched);
    }

    #[test]
    fn test_contacts_are_deduplicated() {
        let mut world = world();
        world.add_body(1, &presets::ground(50.0));
        world.add_body(2, &presets::enemy(0.5, 1.0, Vec3::new(0.0, 0.5, 0.0)));

        // Several sub-steps in one call must not duplicate the resting pair
        world.step(0.1);
        let contacts = world.contacts_this_step();
        for (i, a) in contacts.iter().enumerate() {
            for b in &contacts[i + 1..] {
                assert!(!a.same_bodies(b));
            }
        }
    }

    #[test]
    fn test_release_locked_body() {
        let mut world = world();
        let handle = world.add_body(
            3,
            &presets::brick(Vec3::new(0.6, 0.3, 0.3), 2.0, Vec3::new(0.0, 5.0, 0.0), 0.0)
                .locked(true),
        );
        assert!(world.is_locked(handle));

        // Locked bodies hold still under gravity
        world.step(0.5);
        assert_relative_eq!(world.translation(handle).unwrap().y, 5.0);

        assert!(world.release(handle));
        assert!(!world.is_locked(handle));
        assert!(!world.release(handle));
    }

    #[test]
    fn test_velocity_and_impulse() {
        let mut world = world();
        let handle = world.add_body(4, &presets::enemy(0.5, 1.0, Vec3::new(0.0, 5.0, 0.0)));

        world.set_velocity(handle, Vec3::new(3.0, 4.0, 0.0));
        assert_relative_eq!(world.speed(handle).unwrap(), 5.0, epsilon = 1e-5);

        world.stop(handle);
        assert_relative_eq!(world.speed(handle).unwrap(), 0.0);

        world.apply_impulse(handle, Vec3::new(0.0, 2.0, 0.0));
        assert!(world.linvel(handle).unwrap().y > 0.0);
    }
}
