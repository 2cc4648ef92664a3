// Cannon aiming state and launch parameters

use glam::{Quat, Vec3};

use super::config::AimConfig;
use super::entity::ProjectileKind;
use crate::core::math;

/// Height of the barrel pivot above the mount base
const PIVOT_HEIGHT: f32 = 1.0;

/// Discrete player commands, consumed by the session once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameInput {
    Fire,
    SwitchAmmo,
    /// Radians, positive raises the barrel
    AdjustElevation(f32),
    /// Radians about +Y
    AdjustHeading(f32),
    AdjustPower(f32),
}

/// Where and how fast a projectile leaves the barrel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub position: Vec3,
    pub velocity: Vec3,
}

#[derive(Debug, Clone)]
pub struct Aim {
    elevation: f32,
    heading: f32,
    power: f32,
    selected: ProjectileKind,
    config: AimConfig,
}

impl Aim {
    pub fn new(config: &AimConfig) -> Self {
        let mut aim = Self {
            elevation: 0.0,
            heading: 0.0,
            power: 0.0,
            selected: ProjectileKind::Rock,
            config: config.clone(),
        };
        aim.reset();
        aim
    }

    /// Back to the level-start aim
    pub fn reset(&mut self) {
        self.heading = self.config.initial_heading_deg.to_radians();
        self.selected = ProjectileKind::Rock;
        self.set_elevation(self.config.default_elevation_deg.to_radians());
        self.set_power(self.config.default_power);
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn elevation_deg(&self) -> f32 {
        self.elevation.to_degrees()
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn selected(&self) -> ProjectileKind {
        self.selected
    }

    pub fn set_elevation(&mut self, radians: f32) {
        let min = self.config.min_elevation_deg.to_radians();
        let max = self.config.max_elevation_deg.to_radians();
        self.elevation = radians.clamp(min, max);
    }

    pub fn set_power(&mut self, power: f32) {
        self.power = power.clamp(self.config.min_power, self.config.max_power);
    }

    pub fn adjust_elevation(&mut self, delta: f32) {
        self.set_elevation(self.elevation + delta);
    }

    /// Heading is unbounded; it wraps to (-PI, PI]
    pub fn adjust_heading(&mut self, delta: f32) {
        let heading = (self.heading + delta).rem_euclid(std::f32::consts::TAU);
        self.heading = if heading > std::f32::consts::PI {
            heading - std::f32::consts::TAU
        } else {
            heading
        };
    }

    pub fn adjust_power(&mut self, delta: f32) {
        self.set_power(self.power + delta);
    }

    pub fn switch_ammo(&mut self) {
        self.selected = self.selected.other();
    }

    pub fn barrel_rotation(&self) -> Quat {
        math::barrel_rotation(self.elevation, self.heading)
    }

    /// Muzzle speed for the current power
    pub fn launch_speed(&self) -> f32 {
        self.config.base_speed + self.power / 100.0 * self.config.power_speed
    }

    pub fn launch(&self) -> Launch {
        let rotation = self.barrel_rotation();
        let pivot = self.config.mount_position + Vec3::new(0.0, PIVOT_HEIGHT, 0.0);
        Launch {
            position: pivot + rotation * Vec3::new(0.0, 0.0, self.config.muzzle_offset),
            velocity: math::launch_direction(self.elevation, self.heading) * self.launch_speed(),
        }
    }
}
