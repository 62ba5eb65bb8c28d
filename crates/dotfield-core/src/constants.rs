// Simulation tuning constants shared across spawn, integration and contact.
// Distances are device pixels, velocities are field units (1 unit ~ 60 px/s),
// durations are seconds.

// Population and placement
pub const AREA_PER_DOT: f32 = 2_600.0; // usable px^2 per dot at density 1.0
pub const MAX_POPULATION: usize = 1_800;
pub const EDGE_PAD: f32 = 2.0; // inset from every canvas edge
pub const CONTACT_BUFFER: f32 = 2.0; // required clearance between dot rims
pub const PLACE_ATTEMPTS: usize = 32; // rejection-sampling tries per dot
pub const AUTO_FIT_LADDER: [f32; 5] = [0.92, 0.84, 0.76, 0.68, 0.60];

// Frame timing
pub const MAX_FRAME_DT: f32 = 0.034; // tab-switch spikes clamp to ~2 frames
pub const PIXEL_SCALE: f32 = 60.0; // px moved per field unit per second
pub const REF_FPS: f32 = 60.0; // damping factors are per-frame at this rate

// Per-frame forces, low..high over the speed range
pub const NOISE_AMP_LOW: f32 = 0.02;
pub const NOISE_AMP_HIGH: f32 = 0.55;
pub const STABILITY_LOW: f32 = 0.90;
pub const STABILITY_HIGH: f32 = 0.975;
pub const MAX_V_LOW: f32 = 0.35;
pub const MAX_V_HIGH: f32 = 2.4;
pub const COHESION_LOW: f32 = 0.25;
pub const COHESION_HIGH: f32 = 1.0;

// Drift field
pub const DRIFT_GAIN: f32 = 2.6;
pub const DRIFT_BAND_FLOOR: f32 = 0.35; // band gating never fully stalls a region
pub const SIZE_BIAS_FLOOR: f32 = 0.6; // small dots still feel 60% of the field
pub const DRIFT_CELL_PX: f32 = 140.0;
pub const BAND_CELL_PX: f32 = 420.0;
pub const NOISE_WINDOW_SECS: f64 = 2.5; // lattice reseed interval (cross-faded)

// Mass model (quadratic in radius, clamped)
pub const MASS_REF_RADIUS: f32 = 3.0;
pub const MASS_MIN: f32 = 0.5;
pub const MASS_MAX: f32 = 3.5;

// Anchors
pub const MAX_ELEMENT_ANCHORS: usize = 24;
pub const ANCHOR_RANGE_PX: f32 = 240.0; // distance normalisation for falloff
pub const ANCHOR_PULL: f32 = 1.2;
pub const ANCHOR_HOT_STRENGTH: f32 = 1.0;
pub const ANCHOR_SECTION_STRENGTH: f32 = 0.6;
pub const ANCHOR_NAV_STRENGTH: f32 = 0.35;
pub const ANCHOR_ELEMENT_STRENGTH: f32 = 0.22;

// Walls
pub const WALL_RESTITUTION: f32 = 0.5;

// Gravity drop
pub const DROP_SPEED: f32 = 1_500.0; // px/s, constant for all sizes
pub const DROP_ACTIVE_SPEED: f32 = 150.0; // px/s while the pile settles
pub const DROP_X_DECAY: f32 = 0.92; // per-frame horizontal decay at REF_FPS
pub const DROP_FALL_SECS: f64 = 1.15;
pub const DROP_ACTIVE_SECS: f64 = 2.4;
pub const DROP_SETTLE_SECS: f64 = 0.8;
pub const SLEEP_SPEED: f32 = 0.05; // below this a blocked faller is zeroed

// Breathing
pub const BREATH_PERIOD_SECS: f64 = 5.2;
pub const BREATH_AMP: f32 = 0.16;
pub const BREATH_SIZE_FRACTION: f32 = 0.62; // of the min..max radius range
pub const EXHALE_PUSH: f32 = 2.4;
pub const EXHALE_RANGE: f32 = 10.0; // px beyond the rim the pulse reaches

// Contact response
pub const CONTACT_ITERS_BASE: usize = 2;
pub const CONTACT_ITERS_DROP: usize = 6;
pub const PUSH_SCALE_BASE: f32 = 0.85;
pub const PUSH_SCALE_DROP: f32 = 1.0;
pub const RESTITUTION_SLICK: f32 = 0.45; // stickiness 0
pub const RESTITUTION_STICKY: f32 = 0.04; // stickiness 1
pub const FRICTION_SLICK: f32 = 0.03;
pub const FRICTION_STICKY: f32 = 0.4;
pub const ADHESION_BAND: f32 = 6.0; // px of rim gap where adhesion acts
pub const ADHESION_PULL: f32 = 1.5;
pub const COUPLING_RATE: f32 = 3.0; // velocity blend rate for touching pairs

// Transitions
pub const HERO_INTRO_SECS: f64 = 2.6;
pub const HERO_NOISE_MUL: f32 = 2.2;
pub const HERO_COHESION_MUL: f32 = 0.35;
pub const INVERT_SECS: f64 = 1.15;
pub const INVERT_SWAP_AT_SECS: f64 = 0.45;
pub const INVERT_NOISE_MUL: f32 = 2.8;
pub const INVERT_COHESION_MUL: f32 = 0.12;

// Parameter ranges (setters clamp into these)
pub const DENSITY_MIN: f32 = 0.0;
pub const DENSITY_MAX: f32 = 3.0;
pub const RADIUS_MIN: f32 = 0.5;
pub const RADIUS_MAX: f32 = 40.0;
pub const BUCKETS_MIN: u32 = 2;
pub const BUCKETS_MAX: u32 = 16;
pub const SPEED_MIN: f32 = 0.0;
pub const SPEED_MAX: f32 = 1.0;
pub const TOP_EXCLUSION_MIN: f32 = 0.0;
pub const TOP_EXCLUSION_MAX: f32 = 4_096.0;

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
