//! Windowed value noise driving ambient drift.
//!
//! Two independent lattices supply the x/y components of a drift direction
//! and a third, coarser lattice gates its magnitude per region. Lattice
//! values are hashed from integer cell coordinates (gradient-free value
//! noise) and interpolated bilinearly with a smoothstep, so the field is
//! continuous without any stored state. Time is quantised into fixed
//! windows; consecutive windows are cross-faded so the field slowly
//! reshapes itself without visible discontinuities.

use glam::Vec2;

use crate::constants::{lerp, BAND_CELL_PX, DRIFT_CELL_PX, NOISE_WINDOW_SECS};

const CH_X: u64 = 0x517C_C1B7_2722_0A95;
const CH_Y: u64 = 0x6C62_272E_07BB_0142;
const CH_BAND: u64 = 0x2F8E_9B4C_1D37_5A63;

#[derive(Debug, Clone)]
pub struct DriftField {
    seed: u64,
}

impl DriftField {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Drift direction at `pos`, both components in `[-1, 1]`. Magnitude is
    /// deliberately not normalised; calm regions of the lattice read as
    /// calm motion.
    pub fn direction(&self, pos: Vec2, t: f64) -> Vec2 {
        let x = pos.x / DRIFT_CELL_PX;
        let y = pos.y / DRIFT_CELL_PX;
        Vec2::new(
            self.windowed(x, y, t, CH_X) * 2.0 - 1.0,
            self.windowed(x, y, t, CH_Y) * 2.0 - 1.0,
        )
    }

    /// Coarse magnitude gate in `[0, 1)`, sampled on a wider lattice so
    /// whole regions of the field breathe in and out of motion together.
    pub fn band(&self, pos: Vec2, t: f64) -> f32 {
        self.windowed(pos.x / BAND_CELL_PX, pos.y / BAND_CELL_PX, t, CH_BAND)
    }

    /// Cross-fades the two time windows bracketing `t`. The fade itself is
    /// smoothstepped, so the blend rate is zero exactly at window edges.
    fn windowed(&self, x: f32, y: f32, t: f64, channel: u64) -> f32 {
        let windows = t / NOISE_WINDOW_SECS;
        let base = windows.floor();
        let frac = smooth((windows - base) as f32);
        let w = base as i64;
        let a = self.value(x, y, w, channel);
        let b = self.value(x, y, w + 1, channel);
        lerp(a, b, frac)
    }

    fn value(&self, x: f32, y: f32, window: i64, channel: u64) -> f32 {
        let xf = x.floor();
        let yf = y.floor();
        let ix = xf as i64;
        let iy = yf as i64;
        let tx = smooth(x - xf);
        let ty = smooth(y - yf);
        let v00 = self.lattice(ix, iy, window, channel);
        let v10 = self.lattice(ix + 1, iy, window, channel);
        let v01 = self.lattice(ix, iy + 1, window, channel);
        let v11 = self.lattice(ix + 1, iy + 1, window, channel);
        lerp(lerp(v00, v10, tx), lerp(v01, v11, tx), ty)
    }

    fn lattice(&self, ix: i64, iy: i64, window: i64, channel: u64) -> f32 {
        let mut h = self.seed ^ channel;
        h ^= (ix as u64).wrapping_mul(0xA24B_AED4_963E_E407);
        h ^= (iy as u64).wrapping_mul(0x9FB2_1C65_1E98_DF25);
        h ^= (window as u64).wrapping_mul(0xD6E8_FEB8_6659_FD93);
        // Top 24 bits of the mixed hash, mapped onto [0, 1).
        (mix64(h) >> 40) as f32 * (1.0 / (1u64 << 24) as f32)
    }
}

#[inline]
fn smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// splitmix64 finaliser.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_inside_their_documented_ranges() {
        let field = DriftField::new(7);
        for i in 0..400 {
            let pos = Vec2::new((i % 20) as f32 * 53.7, (i / 20) as f32 * 41.3);
            let t = i as f64 * 0.37;
            let dir = field.direction(pos, t);
            assert!((-1.0..=1.0).contains(&dir.x), "direction x out of range: {dir:?}");
            assert!((-1.0..=1.0).contains(&dir.y), "direction y out of range: {dir:?}");
            let band = field.band(pos, t);
            assert!((0.0..1.0).contains(&band), "band out of range: {band}");
        }
    }

    #[test]
    fn same_seed_is_deterministic_and_seeds_differ() {
        let a = DriftField::new(42);
        let b = DriftField::new(42);
        let c = DriftField::new(43);
        let pos = Vec2::new(311.0, 942.0);
        assert_eq!(a.direction(pos, 1.25), b.direction(pos, 1.25));
        assert_ne!(a.direction(pos, 1.25), c.direction(pos, 1.25));
    }

    #[test]
    fn field_is_continuous_in_space() {
        let field = DriftField::new(9);
        let pos = Vec2::new(512.0, 384.0);
        let here = field.direction(pos, 3.0);
        let near = field.direction(pos + Vec2::splat(0.5), 3.0);
        assert!(
            (here - near).length() < 0.05,
            "half-pixel step moved the field too far: {here:?} vs {near:?}"
        );
    }

    #[test]
    fn window_crossfade_has_no_seam_at_the_boundary() {
        let field = DriftField::new(11);
        let pos = Vec2::new(777.0, 123.0);
        let boundary = NOISE_WINDOW_SECS * 4.0;
        let before = field.direction(pos, boundary - 1e-4);
        let after = field.direction(pos, boundary + 1e-4);
        assert!(
            (before - after).length() < 1e-3,
            "crossing a window boundary must not jump: {before:?} vs {after:?}"
        );
    }
}
