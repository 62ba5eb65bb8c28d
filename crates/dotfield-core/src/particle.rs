use glam::Vec2;

use crate::constants::{MASS_MAX, MASS_MIN, MASS_REF_RADIUS};

/// One dot in the field. Positions and radii are device pixels; velocities
/// are field units (see [`crate::constants::PIXEL_SCALE`]).
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Size assigned at spawn, fixed for the particle's lifetime.
    pub base_radius: f32,
    /// Radius actually drawn this frame. Tracks `base_radius` except while
    /// breathing inflates it.
    pub radius: f32,
    /// How strongly this dot adheres to neighbours, in `[0, 1)`.
    pub stickiness: f32,
    /// Per-dot scale on the drift field so the flow never looks uniform.
    pub drift_mul: f32,
    /// Phase offset into the shared breathing cycle.
    pub breath_offset: f32,
    /// Exhale intensity this frame: the positive half of the breathing
    /// sine, zero for non-breathers. Drives the contact repulsion pulse.
    pub breath: f32,
    /// Set once a dropped dot comes to rest in the pile; cleared when the
    /// drop ends or the field respawns.
    pub asleep: bool,
}

impl Particle {
    pub fn new(
        pos: Vec2,
        radius: f32,
        stickiness: f32,
        drift_mul: f32,
        breath_offset: f32,
    ) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            base_radius: radius,
            radius,
            stickiness,
            drift_mul,
            breath_offset,
            breath: 0.0,
            asleep: false,
        }
    }

    /// Collision mass, quadratic in radius and clamped so extreme sizes can
    /// neither freeze nor launch their partners.
    #[inline]
    pub fn mass(&self) -> f32 {
        ((self.base_radius / MASS_REF_RADIUS) * (self.base_radius / MASS_REF_RADIUS))
            .clamp(MASS_MIN, MASS_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_grows_with_radius_but_stays_clamped() {
        let small = Particle::new(Vec2::ZERO, 0.5, 0.0, 1.0, 0.0);
        let mid = Particle::new(Vec2::ZERO, 3.0, 0.0, 1.0, 0.0);
        let big = Particle::new(Vec2::ZERO, 30.0, 0.0, 1.0, 0.0);
        assert_eq!(small.mass(), MASS_MIN, "tiny dots clamp to the floor mass");
        assert!((mid.mass() - 1.0).abs() < 1e-6, "reference radius has unit mass");
        assert_eq!(big.mass(), MASS_MAX, "huge dots clamp to the ceiling mass");
    }
}
