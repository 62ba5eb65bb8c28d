//! Runtime field parameters and the per-frame tuning derived from them.
//!
//! Setters clamp silently into documented ranges and ignore non-finite
//! input; slider values are untrusted but never fatal. Each setter reports
//! whether it actually changed anything so the engine can decide which
//! changes warrant a respawn.

use crate::constants::{
    lerp, BUCKETS_MAX, BUCKETS_MIN, COHESION_HIGH, COHESION_LOW, DENSITY_MAX, DENSITY_MIN,
    MAX_V_HIGH, MAX_V_LOW, NOISE_AMP_HIGH, NOISE_AMP_LOW, RADIUS_MAX, RADIUS_MIN, SPEED_MAX,
    SPEED_MIN, STABILITY_HIGH, STABILITY_LOW, TOP_EXCLUSION_MAX, TOP_EXCLUSION_MIN,
};

/// Shape of the radius histogram used when assigning spawn-bucket quotas.
/// `s` runs 0 (smallest bucket) to 1 (largest bucket).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeDistribution {
    SmallLinear,
    /// Matches drawing radii as `min + (max - min) * u^2` for uniform `u`.
    SmallCurved,
    Bell,
    #[default]
    Flat,
    UShaped,
    LargeLinear,
    LargeCurved,
}

impl SizeDistribution {
    /// Translation table for numeric selectors from external callers.
    /// Anything out of range falls back to `Flat`.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::SmallLinear,
            1 => Self::SmallCurved,
            2 => Self::Bell,
            3 => Self::Flat,
            4 => Self::UShaped,
            5 => Self::LargeLinear,
            6 => Self::LargeCurved,
            _ => Self::Flat,
        }
    }

    /// Relative weight of the bucket at normalised position `s` in `[0, 1]`.
    /// Always strictly positive so every shape survives largest-remainder
    /// rounding without degenerate all-zero rows.
    pub fn weight(self, s: f32) -> f32 {
        // The curved shapes integrate a 1/(2*sqrt(s)) density, which spikes
        // at the ends; clamp the sample point instead of special-casing.
        let s = s.clamp(0.02, 0.98);
        match self {
            Self::Flat => 1.0,
            Self::SmallLinear => 2.0 * (1.0 - s),
            Self::LargeLinear => 2.0 * s,
            Self::SmallCurved => 0.5 / s.sqrt(),
            Self::LargeCurved => 0.5 / (1.0 - s).sqrt(),
            Self::Bell => gaussian(s, 0.5),
            Self::UShaped => gaussian(s, 0.0) + gaussian(s, 1.0),
        }
    }
}

fn gaussian(s: f32, center: f32) -> f32 {
    let d = (s - center) / 0.18;
    (-0.5 * d * d).exp()
}

/// All externally tunable knobs, read fresh every frame. Spawn-geometry
/// fields only take effect through a respawn.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldParams {
    pub density: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub bucket_count: u32,
    pub distribution: SizeDistribution,
    pub speed: f32,
    pub react_ui: bool,
    pub physics: bool,
    pub breathing: bool,
    pub auto_fit: bool,
    pub top_exclusion: f32,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            density: 1.0,
            min_radius: 1.5,
            max_radius: 7.0,
            bucket_count: 5,
            distribution: SizeDistribution::SmallCurved,
            speed: 0.45,
            react_ui: true,
            physics: true,
            breathing: false,
            auto_fit: true,
            top_exclusion: 0.0,
        }
    }
}

impl FieldParams {
    pub fn set_density(&mut self, value: f32) -> bool {
        set_clamped(&mut self.density, value, DENSITY_MIN, DENSITY_MAX)
    }

    pub fn set_min_radius(&mut self, value: f32) -> bool {
        set_clamped(&mut self.min_radius, value, RADIUS_MIN, RADIUS_MAX)
    }

    pub fn set_max_radius(&mut self, value: f32) -> bool {
        set_clamped(&mut self.max_radius, value, RADIUS_MIN, RADIUS_MAX)
    }

    pub fn set_bucket_count(&mut self, value: u32) -> bool {
        let v = value.clamp(BUCKETS_MIN, BUCKETS_MAX);
        let changed = v != self.bucket_count;
        self.bucket_count = v;
        changed
    }

    pub fn set_distribution(&mut self, value: SizeDistribution) -> bool {
        let changed = value != self.distribution;
        self.distribution = value;
        changed
    }

    pub fn set_speed(&mut self, value: f32) -> bool {
        set_clamped(&mut self.speed, value, SPEED_MIN, SPEED_MAX)
    }

    pub fn set_top_exclusion(&mut self, value: f32) -> bool {
        set_clamped(&mut self.top_exclusion, value, TOP_EXCLUSION_MIN, TOP_EXCLUSION_MAX)
    }

    /// Spawn draws radii from `min..=max` regardless of which slider ended
    /// up higher; callers may cross them freely.
    pub fn radius_range(&self) -> (f32, f32) {
        if self.min_radius <= self.max_radius {
            (self.min_radius, self.max_radius)
        } else {
            (self.max_radius, self.min_radius)
        }
    }

    /// Derives the per-frame force tuning. `noise_mul` and `cohesion_mul`
    /// come from the active transition (hero intro, inversion) and are 1.0
    /// in the ambient state.
    pub fn tuning(&self, noise_mul: f32, cohesion_mul: f32) -> StepTuning {
        let s = self.speed;
        let cohesion = if self.react_ui {
            lerp(COHESION_LOW, COHESION_HIGH, s) * cohesion_mul
        } else {
            0.0
        };
        StepTuning {
            noise_amp: lerp(NOISE_AMP_LOW, NOISE_AMP_HIGH, s) * noise_mul,
            stability: lerp(STABILITY_LOW, STABILITY_HIGH, s),
            max_v: lerp(MAX_V_LOW, MAX_V_HIGH, s),
            cohesion,
        }
    }
}

/// Frame-constant force coefficients interpolated from the speed setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTuning {
    pub noise_amp: f32,
    /// Per-frame velocity retention at the reference frame rate; closer to
    /// 1 means less damping.
    pub stability: f32,
    pub max_v: f32,
    pub cohesion: f32,
}

fn set_clamped(slot: &mut f32, value: f32, lo: f32, hi: f32) -> bool {
    if !value.is_finite() {
        return false;
    }
    let v = value.clamp(lo, hi);
    let changed = v != *slot;
    *slot = v;
    changed
}
