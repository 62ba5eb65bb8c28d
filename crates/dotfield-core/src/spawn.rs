//! Population spawn: bucket quotas, descending-radius placement and the
//! auto-fit ladder.
//!
//! Placement is rejection sampling against a spatial hash: each radius gets
//! a bounded number of uniform draws inside the usable rectangle and is
//! silently dropped when the budget runs out. Radii are placed largest
//! first, since large discs are the hardest to fit into a partially filled
//! field. Undercount is an accepted degraded mode, never an error.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::constants::{
    lerp, AREA_PER_DOT, AUTO_FIT_LADDER, CONTACT_BUFFER, EDGE_PAD, MAX_POPULATION, PLACE_ATTEMPTS,
};
use crate::grid::SpatialHash;
use crate::params::{FieldParams, SizeDistribution};
use crate::particle::Particle;

/// The rectangle particles may occupy, in device pixels. `top_exclusion`
/// reserves a band under the top edge (fixed header, hero copy).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnArea {
    pub width: f32,
    pub height: f32,
    pub top_exclusion: f32,
}

impl SpawnArea {
    pub fn new(width: f32, height: f32, top_exclusion: f32) -> Self {
        Self {
            width,
            height,
            top_exclusion,
        }
    }
}

/// How many dots the current density asks for in this area, before any
/// placement losses.
pub fn target_count(params: &FieldParams, area: &SpawnArea) -> usize {
    let usable_w = (area.width - 2.0 * EDGE_PAD).max(0.0);
    let usable_h = (area.height - area.top_exclusion - 2.0 * EDGE_PAD).max(0.0);
    let raw = usable_w * usable_h / AREA_PER_DOT * params.density;
    (raw.round() as usize).min(MAX_POPULATION)
}

/// Integer quota per size bucket using largest-remainder rounding, so the
/// quotas always sum to exactly `target` no matter the shape.
pub fn bucket_quotas(shape: SizeDistribution, buckets: u32, target: usize) -> Vec<usize> {
    let n = buckets.max(1) as usize;
    let mut quotas = vec![0usize; n];
    if target == 0 {
        return quotas;
    }

    let weights: Vec<f32> = (0..n).map(|k| shape.weight(bucket_pos(k, n))).collect();
    let total: f32 = weights.iter().sum();

    let mut assigned = 0usize;
    let mut remainders: Vec<(f32, usize)> = Vec::with_capacity(n);
    for (k, &w) in weights.iter().enumerate() {
        let exact = w / total * target as f32;
        let floor = exact.floor() as usize;
        quotas[k] = floor;
        assigned += floor;
        remainders.push((exact - floor as f32, k));
    }

    // Hand the leftover slots to the largest fractional remainders; ties
    // break toward the smaller bucket so the result is deterministic.
    remainders.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, k) in remainders.iter().take(target.saturating_sub(assigned)) {
        quotas[k] += 1;
    }
    quotas
}

/// One radius per slot, sorted descending.
pub fn radii_descending(
    lo: f32,
    hi: f32,
    shape: SizeDistribution,
    buckets: u32,
    target: usize,
) -> Vec<f32> {
    let quotas = bucket_quotas(shape, buckets, target);
    let n = quotas.len();
    let mut radii = Vec::with_capacity(target);
    for k in (0..n).rev() {
        let r = lerp(lo, hi, bucket_pos(k, n));
        radii.extend(std::iter::repeat(r).take(quotas[k]));
    }
    radii
}

fn bucket_pos(k: usize, n: usize) -> f32 {
    if n <= 1 {
        0.5
    } else {
        k as f32 / (n - 1) as f32
    }
}

/// Spawns a full population for the current parameters, walking the
/// auto-fit ladder when enabled and the initial target cannot be fully
/// placed.
pub fn spawn(params: &FieldParams, area: &SpawnArea, rng: &mut impl Rng) -> Vec<Particle> {
    let target = target_count(params, area);
    let (lo, hi) = params.radius_range();

    let first = place(
        &radii_descending(lo, hi, params.distribution, params.bucket_count, target),
        area,
        hi,
        rng,
    );
    if first.len() == target || !params.auto_fit {
        return first;
    }
    log::info!(
        "[spawn] placed {}/{} dots, walking the auto-fit ladder",
        first.len(),
        target
    );

    let mut last = first;
    let mut scaled = target;
    for factor in AUTO_FIT_LADDER {
        scaled = (target as f32 * factor).round() as usize;
        last = place(
            &radii_descending(lo, hi, params.distribution, params.bucket_count, scaled),
            area,
            hi,
            rng,
        );
        if last.len() == scaled {
            return last;
        }
    }
    // The bottom rung's partial yield is still a usable field.
    log::warn!(
        "[spawn] auto-fit ladder exhausted, keeping {}/{} dots",
        last.len(),
        scaled
    );
    last
}

/// Places each radius with a bounded attempt budget, accepting the first
/// draw whose disc clears every already placed neighbour by the contact
/// buffer. Exhausted budgets drop the slot silently.
pub fn place(radii: &[f32], area: &SpawnArea, max_radius: f32, rng: &mut impl Rng) -> Vec<Particle> {
    let mut hash = SpatialHash::new(2.0 * max_radius + CONTACT_BUFFER);
    let mut placed: Vec<Particle> = Vec::with_capacity(radii.len());

    for &r in radii {
        let x_lo = EDGE_PAD + r;
        let x_hi = area.width - EDGE_PAD - r;
        let y_lo = area.top_exclusion + EDGE_PAD + r;
        let y_hi = area.height - EDGE_PAD - r;
        if x_hi < x_lo || y_hi < y_lo {
            continue;
        }

        for _ in 0..PLACE_ATTEMPTS {
            let pos = Vec2::new(rng.gen_range(x_lo..=x_hi), rng.gen_range(y_lo..=y_hi));
            if !clears_neighbors(&hash, &placed, pos, r) {
                continue;
            }
            hash.insert(placed.len() as u32, pos);
            placed.push(Particle::new(
                pos,
                r,
                rng.gen::<f32>(),
                lerp(0.6, 1.4, rng.gen::<f32>()),
                rng.gen::<f32>() * TAU,
            ));
            break;
        }
    }
    placed
}

fn clears_neighbors(hash: &SpatialHash, placed: &[Particle], pos: Vec2, radius: f32) -> bool {
    let mut clear = true;
    hash.for_each_neighbor(pos, |j| {
        if !clear {
            return;
        }
        let other = &placed[j as usize];
        let min_dist = radius + other.base_radius + CONTACT_BUFFER;
        if pos.distance_squared(other.pos) < min_dist * min_dist {
            clear = false;
        }
    });
    clear
}
