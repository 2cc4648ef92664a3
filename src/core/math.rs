// Math utilities shared by aiming and collision code

use glam::{Quat, Vec3};
use rand::Rng;

/// Rotation of the barrel: pitch up by `elevation`, then yaw by `heading`
///
/// With both angles at zero the barrel points along +Z.
pub fn barrel_rotation(elevation: f32, heading: f32) -> Quat {
    Quat::from_rotation_y(heading) * Quat::from_rotation_x(-elevation)
}

/// Unit vector the barrel points along
pub fn launch_direction(elevation: f32, heading: f32) -> Vec3 {
    barrel_rotation(elevation, heading) * Vec3::Z
}

/// Random unit vector with a fixed upward component before normalising
///
/// The horizontal components are drawn from [-1, 1], so the result always
/// leans up by at least `atan(up_bias / sqrt(2))`.
pub fn upward_biased_direction<R: Rng + ?Sized>(rng: &mut R, up_bias: f32) -> Vec3 {
    let x = rng.random_range(-1.0..=1.0);
    let z = rng.random_range(-1.0..=1.0);
    Vec3::new(x, up_bias, z).try_normalize().unwrap_or(Vec3::Y)
}

/// Linear falloff from 1 at the center to 0 at `radius`
pub fn linear_falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::f32::consts::FRAC_PI_2;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_level_barrel_points_forward() {
        let dir = launch_direction(0.0, 0.0);
        assert_abs_diff_eq!(dir.z, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dir.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_elevation_raises_barrel() {
        let dir = launch_direction(FRAC_PI_4, 0.0);
        assert_abs_diff_eq!(dir.y, FRAC_PI_4.sin(), epsilon = 1e-5);
        assert_abs_diff_eq!(dir.z, FRAC_PI_4.cos(), epsilon = 1e-5);
        assert_abs_diff_eq!(dir.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_heading_turns_toward_x() {
        let dir = launch_direction(0.0, FRAC_PI_2);
        assert_abs_diff_eq!(dir.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(dir.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_upward_bias() {
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..100 {
            let dir = upward_biased_direction(&mut rng, 2.0);
            assert_abs_diff_eq!(dir.length(), 1.0, epsilon = 1e-5);
            // y >= 2 / sqrt(1 + 4 + 1)
            assert!(dir.y >= 0.81);
        }
    }

    #[test]
    fn test_linear_falloff() {
        assert_eq!(linear_falloff(0.0, 8.0), 1.0);
        assert_eq!(linear_falloff(4.0, 8.0), 0.5);
        assert_eq!(linear_falloff(10.0, 8.0), 0.0);
        assert_eq!(linear_falloff(1.0, 0.0), 0.0);
    }
}
