use super::collision::CollisionGroups;
use super::to_vector;
use glam::Vec3;
use rapier3d::prelude::*;

/// Opaque handle to a body owned by the physics world
///
/// Wraps the engine's handle so no rapier types leak into gameplay code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(super) RigidBodyHandle);

/// Collision shape of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

/// Builder describing one body and its single collider
///
/// A mass of zero produces a fixed body. A locked body starts kinematic
/// (frozen in place) until [`super::PhysicsWorld::release`] is called.
#[derive(Debug, Clone)]
pub struct BodyBuilder {
    shape: BodyShape,
    mass: f32,
    position: Vec3,
    rotation: Vec3,
    linvel: Vec3,
    locked: bool,
    group: CollisionGroups,
    friction: f32,
    restitution: f32,
    ccd: bool,
    linear_damping: f32,
    angular_damping: f32,
}

impl BodyBuilder {
    pub fn new(shape: BodyShape, mass: f32) -> Self {
        Self {
            shape,
            mass,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            linvel: Vec3::ZERO,
            locked: false,
            group: CollisionGroups::Brick,
            friction: 0.5,
            restitution: 0.0,
            ccd: false,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    /// Set the initial position of the body
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the initial orientation as a scaled rotation axis (radians)
    pub fn rotation(mut self, axis_angle: Vec3) -> Self {
        self.rotation = axis_angle;
        self
    }

    /// Set the initial linear velocity
    pub fn linvel(mut self, linvel: Vec3) -> Self {
        self.linvel = linvel;
        self
    }

    /// Start frozen; only meaningful for bodies with mass
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn group(mut self, group: CollisionGroups) -> Self {
        self.group = group;
        self
    }

    /// Set friction coefficient (0.0 = no friction, 1.0 = high friction)
    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Set restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Continuous collision detection for fast movers
    pub fn ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    pub fn damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    pub fn body_type(&self) -> RigidBodyType {
        if self.is_static() {
            RigidBodyType::Fixed
        } else if self.locked {
            RigidBodyType::KinematicPositionBased
        } else {
            RigidBodyType::Dynamic
        }
    }

    /// Build the rigid body, tagging it with the owner id
    pub fn build_body(&self, owner: u64) -> RigidBody {
        let body_type = self.body_type();
        let mut builder = RigidBodyBuilder::new(body_type)
            .translation(to_vector(self.position))
            .rotation(to_vector(self.rotation))
            .ccd_enabled(self.ccd)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .user_data(owner as u128);

        if body_type == RigidBodyType::Dynamic {
            builder = builder.linvel(to_vector(self.linvel));
        }

        builder.build()
    }

    /// Build the collider that goes with the body
    pub fn build_collider(&self) -> Collider {
        let builder = match self.shape {
            BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
            BodyShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        };

        let builder = builder
            .collision_groups(self.group.to_interaction_groups())
            .friction(self.friction)
            .restitution(self.restitution)
            .active_events(ActiveEvents::COLLISION_EVENTS);

        if self.is_static() {
            builder.build()
        } else {
            builder.mass(self.mass).build()
        }
    }
}

/// Body configurations for the game's object kinds
pub mod presets {
    use super::*;

    /// Ground slab; its top face sits at y = 0
    pub fn ground(half_size: f32) -> BodyBuilder {
        BodyBuilder::new(
            BodyShape::Cuboid {
                half_extents: Vec3::new(half_size, 0.5, half_size),
            },
            0.0,
        )
        .position(Vec3::new(0.0, -0.5, 0.0))
        .group(CollisionGroups::Ground)
        .friction(0.8)
    }

    /// Structure brick; `mass` 0 makes it immovable
    pub fn brick(half_extents: Vec3, mass: f32, position: Vec3, yaw: f32) -> BodyBuilder {
        BodyBuilder::new(BodyShape::Cuboid { half_extents }, mass)
            .position(position)
            .rotation(Vec3::new(0.0, yaw, 0.0))
            .group(CollisionGroups::Brick)
            .friction(0.7)
            .damping(0.05, 0.1)
    }

    pub fn enemy(radius: f32, mass: f32, position: Vec3) -> BodyBuilder {
        BodyBuilder::new(BodyShape::Ball { radius }, mass)
            .position(position)
            .group(CollisionGroups::Enemy)
            .friction(0.6)
            .damping(0.1, 0.5)
    }

    pub fn projectile(radius: f32, mass: f32, position: Vec3, velocity: Vec3) -> BodyBuilder {
        BodyBuilder::new(BodyShape::Ball { radius }, mass)
            .position(position)
            .linvel(velocity)
            .group(CollisionGroups::Projectile)
            .friction(0.5)
            .restitution(0.2)
            .ccd(true)
    }

    /// Static cannon mount box
    pub fn mount(half_extents: Vec3, position: Vec3, yaw: f32) -> BodyBuilder {
        BodyBuilder::new(BodyShape::Cuboid { half_extents }, 0.0)
            .position(position)
            .rotation(Vec3::new(0.0, yaw, 0.0))
            .group(CollisionGroups::Mount)
    }
}
