//! Pairwise contact resolution.
//!
//! Runs a handful of relaxation passes after integration. Each pass builds
//! a fresh spatial hash, walks every unique pair in the 3x3 neighbourhood
//! (deduplicated by index order) and applies, depending on the signed rim
//! gap: positional separation plus an optional impulse, a short-range
//! adhesion pull with velocity coupling, and the breathing exhale pulse.
//! A final position-only clamp keeps relaxation from leaking particles
//! past the walls.

use glam::Vec2;

use crate::constants::{
    lerp, ADHESION_BAND, ADHESION_PULL, CONTACT_BUFFER, CONTACT_ITERS_BASE, CONTACT_ITERS_DROP,
    COUPLING_RATE, EXHALE_PUSH, EXHALE_RANGE, FRICTION_SLICK, FRICTION_STICKY, PUSH_SCALE_BASE,
    PUSH_SCALE_DROP, RESTITUTION_SLICK, RESTITUTION_STICKY,
};
use crate::grid::SpatialHash;
use crate::params::FieldParams;
use crate::particle::Particle;
use crate::spawn::SpawnArea;
use crate::step;

/// Contact behaviour for one frame.
#[derive(Debug, Clone, Copy)]
pub struct ContactCfg {
    pub iterations: usize,
    pub push_scale: f32,
    /// Velocity impulses on overlap. Off while gravity moves the field and
    /// whenever the physics-contact flag is off; collisions are then
    /// purely positional and tangential velocity is fully retained.
    pub impulses: bool,
    /// Gates adhesion and coupling.
    pub physics: bool,
    /// Velocity averaging for touching pairs; mutually exclusive with
    /// breathing.
    pub coupling: bool,
    pub dt: f32,
}

impl ContactCfg {
    /// `boosted` raises effort while a drop or its settle window needs the
    /// pile resolved quickly; `gravity_active` suppresses impulses during
    /// the descent itself.
    pub fn for_frame(params: &FieldParams, boosted: bool, gravity_active: bool, dt: f32) -> Self {
        let (iterations, push_scale) = if boosted {
            (CONTACT_ITERS_DROP, PUSH_SCALE_DROP)
        } else {
            (CONTACT_ITERS_BASE, PUSH_SCALE_BASE)
        };
        Self {
            iterations,
            push_scale,
            impulses: params.physics && !gravity_active,
            physics: params.physics,
            coupling: params.physics && !params.breathing,
            dt,
        }
    }
}

pub fn resolve(particles: &mut [Particle], cfg: &ContactCfg, area: &SpawnArea) {
    if particles.len() >= 2 {
        // Cell size covers the longest interaction: two max-size rims plus
        // the exhale reach, so the 3x3 query is exhaustive.
        let max_r = particles.iter().map(|p| p.radius).fold(0.0f32, f32::max);
        let cell = 2.0 * max_r + EXHALE_RANGE;

        for _ in 0..cfg.iterations {
            let hash = SpatialHash::build(particles, cell);
            for i in 0..particles.len() {
                let pos_i = particles[i].pos;
                hash.for_each_neighbor(pos_i, |j| {
                    let j = j as usize;
                    if j <= i {
                        return;
                    }
                    let (a, b) = pair_mut(particles, i, j);
                    respond(a, b, cfg);
                });
            }
        }
    }
    step::hard_clamp(particles, area);
}

fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert!(i < j);
    let (head, tail) = particles.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

fn respond(a: &mut Particle, b: &mut Particle, cfg: &ContactCfg) {
    let delta = b.pos - a.pos;
    let dist_sq = delta.length_squared();
    let reach = a.radius + b.radius + EXHALE_RANGE;
    if dist_sq > reach * reach {
        return;
    }

    let dist = dist_sq.sqrt();
    // Coincident centres have no usable normal; pick a fixed axis.
    let n = if dist > 1e-4 { delta / dist } else { Vec2::X };
    let gap = dist - (a.radius + b.radius + CONTACT_BUFFER);

    if gap < 0.0 {
        separate(a, b, n, gap, cfg);
    } else if cfg.physics && gap < ADHESION_BAND {
        attract(a, b, n, gap, cfg);
    }
    exhale(a, b, n, dist, cfg);
}

/// Positional separation plus, with impulses enabled, a 1D collision along
/// the normal. Restitution and friction come from the pair's averaged
/// stickiness: stickier pairs bounce less and shed more tangential
/// velocity.
fn separate(a: &mut Particle, b: &mut Particle, n: Vec2, gap: f32, cfg: &ContactCfg) {
    let shift = n * (-gap * 0.5 * cfg.push_scale);
    a.pos -= shift;
    b.pos += shift;

    if !cfg.impulses {
        return;
    }
    let rel = b.vel - a.vel;
    let vn = rel.dot(n);
    if vn >= 0.0 {
        return; // already separating
    }

    let stick = 0.5 * (a.stickiness + b.stickiness);
    let restitution = lerp(RESTITUTION_SLICK, RESTITUTION_STICKY, stick);
    let inv_ma = 1.0 / a.mass();
    let inv_mb = 1.0 / b.mass();
    let impulse = -(1.0 + restitution) * vn / (inv_ma + inv_mb);
    a.vel -= n * (impulse * inv_ma);
    b.vel += n * (impulse * inv_mb);

    let friction = lerp(FRICTION_SLICK, FRICTION_STICKY, stick);
    let tangential = rel - n * vn;
    a.vel += tangential * (0.5 * friction);
    b.vel -= tangential * (0.5 * friction);
}

/// Adhesion pull and velocity coupling for pairs resting within the band,
/// both scaled by stickiness and faded out across the band.
fn attract(a: &mut Particle, b: &mut Particle, n: Vec2, gap: f32, cfg: &ContactCfg) {
    let stick = 0.5 * (a.stickiness + b.stickiness);
    if stick <= 0.0 {
        return;
    }
    let fade = 1.0 - gap / ADHESION_BAND;
    let pull = n * (ADHESION_PULL * stick * fade * cfg.dt);
    a.vel += pull;
    b.vel -= pull;

    if cfg.coupling {
        let blend = (COUPLING_RATE * stick * fade * cfg.dt).min(0.5);
        let avg = (a.vel + b.vel) * 0.5;
        a.vel += (avg - a.vel) * blend;
        b.vel += (avg - b.vel) * blend;
    }
}

/// Breathing dots shove close neighbours outward on the exhale half-cycle,
/// proportional to the strongest breath in the pair.
fn exhale(a: &mut Particle, b: &mut Particle, n: Vec2, dist: f32, cfg: &ContactCfg) {
    let breath = a.breath.max(b.breath);
    if breath <= 0.0 {
        return;
    }
    let rim_gap = dist - (a.radius + b.radius);
    if rim_gap >= EXHALE_RANGE {
        return;
    }
    let fade = 1.0 - rim_gap.max(0.0) / EXHALE_RANGE;
    let push = n * (EXHALE_PUSH * breath * fade * cfg.dt);
    a.vel -= push;
    b.vel += push;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(x: f32, radius: f32, stickiness: f32) -> Particle {
        Particle::new(Vec2::new(x, 500.0), radius, stickiness, 1.0, 0.0)
    }

    fn area() -> SpawnArea {
        SpawnArea::new(1000.0, 1000.0, 0.0)
    }

    fn ambient_cfg() -> ContactCfg {
        ContactCfg::for_frame(&FieldParams::default(), false, false, 0.016)
    }

    fn gap_between(a: &Particle, b: &Particle) -> f32 {
        a.pos.distance(b.pos) - (a.radius + b.radius + CONTACT_BUFFER)
    }

    #[test]
    fn overlapping_pairs_are_pushed_back_out() {
        let mut dots = vec![dot(500.0, 4.0, 0.5), dot(506.0, 4.0, 0.5)];
        assert!(gap_between(&dots[0], &dots[1]) < 0.0, "setup must overlap");
        resolve(&mut dots, &ambient_cfg(), &area());
        assert!(
            gap_between(&dots[0], &dots[1]) > -0.15,
            "two passes should leave only residual overlap, gap {}",
            gap_between(&dots[0], &dots[1])
        );
        assert_eq!(
            dots[0].pos.y, dots[1].pos.y,
            "separation runs along the line of centres"
        );
    }

    #[test]
    fn slick_pairs_bounce_and_sticky_pairs_do_not() {
        for (stick, expect_bounce) in [(0.0, true), (1.0, false)] {
            let mut dots = vec![dot(500.0, 3.0, stick), dot(507.0, 3.0, stick)];
            dots[0].vel = Vec2::new(1.0, 0.0);
            dots[1].vel = Vec2::new(-1.0, 0.0);
            let cfg = ContactCfg {
                iterations: 1,
                ..ambient_cfg()
            };
            resolve(&mut dots, &cfg, &area());
            assert!(dots[0].vel.x < 0.0 && dots[1].vel.x > 0.0, "pair must rebound apart");
            let speed = dots[1].vel.x;
            if expect_bounce {
                assert!(
                    speed > 0.3,
                    "slick pair should keep a real rebound, got {speed}"
                );
            } else {
                assert!(
                    speed < 0.1,
                    "sticky pair should barely rebound, got {speed}"
                );
            }
        }
    }

    #[test]
    fn without_impulses_collisions_are_positional_only() {
        let mut dots = vec![dot(500.0, 4.0, 0.2), dot(505.0, 4.0, 0.2)];
        dots[0].vel = Vec2::new(0.7, 0.3);
        dots[1].vel = Vec2::new(-0.7, 0.3);
        let cfg = ContactCfg {
            impulses: false,
            physics: false,
            coupling: false,
            ..ambient_cfg()
        };
        let before = (dots[0].vel, dots[1].vel);
        resolve(&mut dots, &cfg, &area());
        assert_eq!((dots[0].vel, dots[1].vel), before, "velocities untouched");
        assert!(gap_between(&dots[0], &dots[1]) > -0.15, "positions still separated");
    }

    #[test]
    fn adhesion_pulls_near_neighbours_together() {
        // Rim gap of 3 sits inside the adhesion band but outside overlap.
        let mut dots = vec![dot(500.0, 4.0, 1.0), dot(513.0, 4.0, 1.0)];
        let cfg = ContactCfg {
            iterations: 1,
            coupling: false,
            ..ambient_cfg()
        };
        resolve(&mut dots, &cfg, &area());
        assert!(
            dots[0].vel.x > 0.0 && dots[1].vel.x < 0.0,
            "adhesion accelerates the pair toward each other: {:?} {:?}",
            dots[0].vel,
            dots[1].vel
        );
    }

    #[test]
    fn coupling_averages_velocities_and_breathing_disables_it() {
        let build = || {
            let mut dots = vec![dot(500.0, 4.0, 1.0), dot(513.0, 4.0, 1.0)];
            dots[0].vel = Vec2::new(0.0, 2.0);
            dots[1].vel = Vec2::new(0.0, -2.0);
            dots
        };

        let mut coupled = build();
        let cfg_on = ContactCfg {
            iterations: 1,
            ..ambient_cfg()
        };
        resolve(&mut coupled, &cfg_on, &area());
        let rel_on = (coupled[0].vel.y - coupled[1].vel.y).abs();

        let mut uncoupled = build();
        let cfg_off = ContactCfg {
            iterations: 1,
            coupling: false,
            ..ambient_cfg()
        };
        resolve(&mut uncoupled, &cfg_off, &area());
        let rel_off = (uncoupled[0].vel.y - uncoupled[1].vel.y).abs();

        assert!(
            rel_on < rel_off,
            "coupling must shrink relative velocity: {rel_on} vs {rel_off}"
        );
    }

    #[test]
    fn exhaling_dots_push_their_neighbours_away() {
        let mut breather = dot(500.0, 8.0, 0.5);
        breather.breath = 1.0;
        breather.radius = 8.0 * 1.16;
        let neighbor = dot(519.0, 4.0, 0.5);
        let mut dots = vec![breather, neighbor];
        let cfg = ContactCfg {
            iterations: 1,
            physics: false,
            impulses: false,
            coupling: false,
            ..ambient_cfg()
        };
        resolve(&mut dots, &cfg, &area());
        assert!(
            dots[0].vel.x < 0.0 && dots[1].vel.x > 0.0,
            "exhale must repel the pair: {:?} {:?}",
            dots[0].vel,
            dots[1].vel
        );
    }

    #[test]
    fn a_packed_row_relaxes_without_reordering() {
        let mut dots = vec![
            dot(500.0, 4.0, 0.3),
            dot(505.0, 4.0, 0.3),
            dot(510.0, 4.0, 0.3),
        ];
        let cfg = ContactCfg {
            iterations: 6,
            ..ambient_cfg()
        };
        resolve(&mut dots, &cfg, &area());
        assert!(dots[0].pos.x < dots[1].pos.x && dots[1].pos.x < dots[2].pos.x);
        assert!(gap_between(&dots[0], &dots[1]) > -0.15);
        assert!(gap_between(&dots[1], &dots[2]) > -0.15);
    }
}
