//! Per-frame force integration.
//!
//! Forces are applied per particle in a fixed order: micro-jitter, ambient
//! drift, gravity drop, anchor attraction, damping and clamp, position
//! update, breathing, boundary bounce. Everything is scaled by the frame
//! delta so behaviour is refresh-rate independent within the clamped
//! delta range.

use std::f32::consts::TAU;
use std::f64::consts::TAU as TAU64;

use glam::Vec2;
use rand::Rng;

use crate::anchor::Anchor;
use crate::constants::{
    ANCHOR_PULL, ANCHOR_RANGE_PX, BREATH_AMP, BREATH_PERIOD_SECS, BREATH_SIZE_FRACTION,
    DRIFT_BAND_FLOOR, DRIFT_GAIN, DROP_ACTIVE_SPEED, DROP_SPEED, DROP_X_DECAY, EDGE_PAD,
    PIXEL_SCALE, REF_FPS, SIZE_BIAS_FLOOR, WALL_RESTITUTION,
};
use crate::noise::DriftField;
use crate::params::{FieldParams, StepTuning};
use crate::particle::Particle;
use crate::spawn::SpawnArea;

/// Downward motion requested by the gravity state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropMotion {
    None,
    /// Fast constant-rate fall, all sizes in lockstep.
    Fall,
    /// Slow descent while the pile settles.
    Settle,
}

/// Read-only context shared by every particle within one frame.
pub struct StepCtx<'a> {
    pub tuning: &'a StepTuning,
    pub params: &'a FieldParams,
    pub drift: &'a DriftField,
    pub anchors: &'a [Anchor],
    pub area: &'a SpawnArea,
    pub drop: DropMotion,
    pub clock: f64,
    pub dt: f32,
}

pub fn integrate(particles: &mut [Particle], ctx: &StepCtx, rng: &mut impl Rng) {
    let dt = ctx.dt;
    let (lo, hi) = ctx.params.radius_range();
    let breath_threshold = lo + BREATH_SIZE_FRACTION * (hi - lo);
    let radius_span = (hi - lo).max(f32::EPSILON);
    let damping = ctx.tuning.stability.powf(dt * REF_FPS);
    let drop_x_decay = DROP_X_DECAY.powf(dt * REF_FPS);
    let breathe = ctx.params.breathing && ctx.drop == DropMotion::None;
    let breath_phase = TAU64 * (ctx.clock / BREATH_PERIOD_SECS);

    for p in particles.iter_mut() {
        if p.asleep {
            // Settled pile members are fully frozen until the drop ends.
            p.radius = p.base_radius;
            p.breath = 0.0;
            continue;
        }

        // Micro-jitter, time-scaled.
        let angle = rng.gen::<f32>() * TAU;
        p.vel += Vec2::from_angle(angle) * (rng.gen::<f32>() * ctx.tuning.noise_amp * dt);

        // Ambient drift through the noise field. Large dots get a mild
        // speed bias; with physics on, the same force moves heavy dots
        // less.
        if ctx.params.speed > 0.0 && ctx.drop == DropMotion::None {
            let dir = ctx.drift.direction(p.pos, ctx.clock);
            let band =
                DRIFT_BAND_FLOOR + (1.0 - DRIFT_BAND_FLOOR) * ctx.drift.band(p.pos, ctx.clock);
            let norm_r = ((p.base_radius - lo) / radius_span).clamp(0.0, 1.0);
            let bias = SIZE_BIAS_FLOOR + (1.0 - SIZE_BIAS_FLOOR) * norm_r;
            let mut force = dir * (DRIFT_GAIN * ctx.params.speed * band * bias * p.drift_mul);
            if ctx.params.physics {
                force /= p.mass();
            }
            p.vel += force * dt;
        }

        // Gravity drop overrides drift: constant-rate descent so every
        // size falls in lockstep, vertical velocity zeroed, horizontal
        // decaying.
        if ctx.drop != DropMotion::None {
            let rate = match ctx.drop {
                DropMotion::Fall => DROP_SPEED,
                _ => DROP_ACTIVE_SPEED,
            };
            p.pos.y += rate * dt;
            p.vel.y = 0.0;
            p.vel.x *= drop_x_decay;
        }

        // Anchor attraction, inverse-square-like with a +1 softening so
        // zero distance is harmless.
        if ctx.tuning.cohesion > 0.0 {
            for a in ctx.anchors {
                let delta = a.pos - p.pos;
                let d2 = delta.length_squared() / (ANCHOR_RANGE_PX * ANCHOR_RANGE_PX);
                let pull = a.strength / (d2 + 1.0);
                p.vel +=
                    delta.normalize_or_zero() * (pull * ctx.tuning.cohesion * ANCHOR_PULL * dt);
            }
        }

        // Damping, then a component clamp.
        p.vel *= damping;
        p.vel = p
            .vel
            .clamp(Vec2::splat(-ctx.tuning.max_v), Vec2::splat(ctx.tuning.max_v));

        p.pos += p.vel * (PIXEL_SCALE * dt);

        // Breathing modulates the rendered radius only; the base radius
        // never changes outside a respawn.
        if breathe && p.base_radius > breath_threshold {
            let wave = (breath_phase + p.breath_offset as f64).sin() as f32;
            p.radius = p.base_radius * (1.0 + BREATH_AMP * wave);
            p.breath = wave.max(0.0);
        } else {
            p.radius = p.base_radius;
            p.breath = 0.0;
        }

        bounce_walls(p, ctx.area);
    }
}

/// Reflects a particle off the legal rectangle, damping the reflected
/// velocity component.
fn bounce_walls(p: &mut Particle, area: &SpawnArea) {
    let x_lo = EDGE_PAD + p.radius;
    let x_hi = area.width - EDGE_PAD - p.radius;
    let y_lo = area.top_exclusion + EDGE_PAD + p.radius;
    let y_hi = area.height - EDGE_PAD - p.radius;

    if p.pos.x < x_lo {
        p.pos.x = x_lo;
        p.vel.x = -p.vel.x * WALL_RESTITUTION;
    } else if p.pos.x > x_hi {
        p.pos.x = x_hi;
        p.vel.x = -p.vel.x * WALL_RESTITUTION;
    }
    if p.pos.y < y_lo {
        p.pos.y = y_lo;
        p.vel.y = -p.vel.y * WALL_RESTITUTION;
    } else if p.pos.y > y_hi {
        p.pos.y = y_hi;
        p.vel.y = -p.vel.y * WALL_RESTITUTION;
    }
}

/// Position-only clamp run after contact resolution, in case relaxation
/// pushed someone past a wall.
pub fn hard_clamp(particles: &mut [Particle], area: &SpawnArea) {
    for p in particles.iter_mut() {
        let x_lo = EDGE_PAD + p.radius;
        let x_hi = (area.width - EDGE_PAD - p.radius).max(x_lo);
        let y_lo = area.top_exclusion + EDGE_PAD + p.radius;
        let y_hi = (area.height - EDGE_PAD - p.radius).max(y_lo);
        p.pos.x = p.pos.x.clamp(x_lo, x_hi);
        p.pos.y = p.pos.y.clamp(y_lo, y_hi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiet_tuning() -> StepTuning {
        StepTuning {
            noise_amp: 0.0,
            stability: 1.0,
            max_v: 10.0,
            cohesion: 0.0,
        }
    }

    fn test_area() -> SpawnArea {
        SpawnArea::new(1000.0, 1000.0, 0.0)
    }

    fn run_step(
        particles: &mut [Particle],
        params: &FieldParams,
        tuning: &StepTuning,
        anchors: &[Anchor],
        drop: DropMotion,
        clock: f64,
        dt: f32,
    ) {
        let drift = DriftField::new(1);
        let area = test_area();
        let ctx = StepCtx {
            tuning,
            params,
            drift: &drift,
            anchors,
            area: &area,
            drop,
            clock,
            dt,
        };
        integrate(particles, &ctx, &mut StdRng::seed_from_u64(77));
    }

    #[test]
    fn all_sizes_fall_in_lockstep_during_a_drop() {
        let mut params = FieldParams::default();
        params.speed = 0.0;
        let tuning = quiet_tuning();
        let mut dots = vec![
            Particle::new(Vec2::new(100.0, 100.0), 2.0, 0.5, 1.0, 0.0),
            Particle::new(Vec2::new(300.0, 100.0), 9.0, 0.5, 1.0, 0.0),
        ];
        run_step(&mut dots, &params, &tuning, &[], DropMotion::Fall, 0.0, 0.016);
        let dy0 = dots[0].pos.y - 100.0;
        let dy1 = dots[1].pos.y - 100.0;
        assert_eq!(dy0, dy1, "fall rate must not depend on radius");
        assert_eq!(dots[0].vel.y, 0.0, "vertical velocity is zeroed while dropping");
    }

    #[test]
    fn anchors_pull_particles_toward_them() {
        let mut params = FieldParams::default();
        params.speed = 0.0;
        let tuning = StepTuning {
            cohesion: 1.0,
            ..quiet_tuning()
        };
        let anchor = Anchor {
            pos: Vec2::new(500.0, 300.0),
            strength: 1.0,
        };
        let mut dots = vec![Particle::new(Vec2::new(200.0, 300.0), 4.0, 0.5, 1.0, 0.0)];
        for i in 0..60 {
            run_step(
                &mut dots,
                &params,
                &tuning,
                &[anchor],
                DropMotion::None,
                i as f64 * 0.016,
                0.016,
            );
        }
        assert!(
            dots[0].pos.x > 210.0,
            "a second of anchor pull should move the dot visibly, got {}",
            dots[0].pos.x
        );
        assert!((dots[0].pos.y - 300.0).abs() < 1.0, "pull is along the line of centres");
    }

    #[test]
    fn velocity_never_exceeds_the_component_clamp() {
        let mut params = FieldParams::default();
        params.speed = 0.0;
        let tuning = StepTuning {
            max_v: 0.5,
            ..quiet_tuning()
        };
        let mut dots = vec![Particle::new(Vec2::new(500.0, 500.0), 4.0, 0.5, 1.0, 0.0)];
        dots[0].vel = Vec2::new(40.0, -35.0);
        run_step(&mut dots, &params, &tuning, &[], DropMotion::None, 0.0, 0.016);
        assert!(dots[0].vel.x.abs() <= 0.5);
        assert!(dots[0].vel.y.abs() <= 0.5);
    }

    #[test]
    fn walls_reflect_and_damp_the_crossing_component() {
        let mut params = FieldParams::default();
        params.speed = 0.0;
        let tuning = quiet_tuning();
        let mut dots = vec![Particle::new(Vec2::new(996.0, 500.0), 4.0, 0.5, 1.0, 0.0)];
        dots[0].vel = Vec2::new(8.0, 0.0);
        run_step(&mut dots, &params, &tuning, &[], DropMotion::None, 0.0, 0.016);
        assert_eq!(dots[0].pos.x, 1000.0 - EDGE_PAD - 4.0, "clamped back to the wall");
        assert!(dots[0].vel.x < 0.0, "velocity reflects off the wall");
        assert!(
            dots[0].vel.x.abs() <= 8.0 * WALL_RESTITUTION + 1e-3,
            "reflection is damped"
        );
    }

    #[test]
    fn breathing_follows_the_sine_law_without_touching_base_radius() {
        let mut params = FieldParams::default();
        params.speed = 0.0;
        params.breathing = true;
        params.set_min_radius(2.0);
        params.set_max_radius(8.0);
        let tuning = quiet_tuning();
        let mut dots = vec![Particle::new(Vec2::new(500.0, 500.0), 8.0, 0.5, 1.0, 0.0)];

        let steps = 512;
        let dt = (BREATH_PERIOD_SECS / steps as f64) as f32;
        let (mut seen_min, mut seen_max) = (f32::MAX, f32::MIN);
        for i in 0..steps {
            run_step(
                &mut dots,
                &params,
                &tuning,
                &[],
                DropMotion::None,
                i as f64 * dt as f64,
                dt,
            );
            seen_min = seen_min.min(dots[0].radius);
            seen_max = seen_max.max(dots[0].radius);
        }
        assert_eq!(dots[0].base_radius, 8.0, "base radius must never move");
        assert!((seen_max - 8.0 * (1.0 + BREATH_AMP)).abs() < 0.02, "peak {seen_max}");
        assert!((seen_min - 8.0 * (1.0 - BREATH_AMP)).abs() < 0.02, "trough {seen_min}");
    }

    #[test]
    fn small_particles_do_not_breathe() {
        let mut params = FieldParams::default();
        params.speed = 0.0;
        params.breathing = true;
        params.set_min_radius(2.0);
        params.set_max_radius(8.0);
        let tuning = quiet_tuning();
        let mut dots = vec![Particle::new(Vec2::new(500.0, 500.0), 2.5, 0.5, 1.0, 0.0)];
        run_step(&mut dots, &params, &tuning, &[], DropMotion::None, 1.3, 0.016);
        assert_eq!(dots[0].radius, 2.5);
        assert_eq!(dots[0].breath, 0.0);
    }

    #[test]
    fn sleeping_particles_are_pinned_in_place() {
        let params = FieldParams::default();
        let tuning = quiet_tuning();
        let mut dots = vec![Particle::new(Vec2::new(500.0, 994.0), 4.0, 0.5, 1.0, 0.0)];
        dots[0].asleep = true;
        dots[0].vel = Vec2::new(3.0, 3.0);
        run_step(&mut dots, &params, &tuning, &[], DropMotion::Settle, 2.0, 0.016);
        assert_eq!(dots[0].pos, Vec2::new(500.0, 994.0));
    }

    #[test]
    fn hard_clamp_returns_strays_to_the_legal_rectangle() {
        let area = test_area();
        let mut dots = vec![Particle::new(Vec2::new(-50.0, 2000.0), 4.0, 0.5, 1.0, 0.0)];
        hard_clamp(&mut dots, &area);
        assert_eq!(dots[0].pos.x, EDGE_PAD + 4.0);
        assert_eq!(dots[0].pos.y, 1000.0 - EDGE_PAD - 4.0);
    }
}
