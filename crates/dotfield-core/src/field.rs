//! The engine driver.
//!
//! [`DotField`] owns the particle arena, the tunable parameters, the anchor
//! sources and the two transition state machines (full-field effects and
//! the gravity drop). The host calls [`DotField::step`] once per display
//! frame with the elapsed seconds; everything timed is measured against the
//! accumulated clock rather than wall time, which keeps the core free of
//! platform clocks and lets tests drive virtual time.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::anchor::{Anchor, AnchorList, AnchorSources, HotRect};
use crate::constants::{
    lerp, DROP_ACTIVE_SECS, DROP_ACTIVE_SPEED, DROP_FALL_SECS, DROP_SETTLE_SECS, HERO_COHESION_MUL,
    HERO_INTRO_SECS, HERO_NOISE_MUL, INVERT_COHESION_MUL, INVERT_NOISE_MUL, INVERT_SECS,
    INVERT_SWAP_AT_SECS, MAX_FRAME_DT, SLEEP_SPEED,
};
use crate::contact::{self, ContactCfg};
use crate::error::EngineError;
use crate::noise::DriftField;
use crate::palette::{Mode, Palette};
use crate::params::{FieldParams, SizeDistribution};
use crate::particle::Particle;
use crate::spawn::{self, SpawnArea};
use crate::step::{self, DropMotion, StepCtx};

/// Timed full-field effects. At most one runs at a time; each expires on
/// its own deadline checked at the top of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FxState {
    Ambient,
    HeroIntro {
        until: f64,
    },
    Invert {
        target: Mode,
        swap_at: f64,
        until: f64,
        swapped: bool,
    },
}

/// Gravity-drop lifecycle: fast fall, slow settling descent, then a boost
/// window that only raises contact effort while the pile relaxes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum GravityPhase {
    Inactive,
    Falling { until: f64, active_secs: f64 },
    Active { until: f64 },
    SettleBoost { until: f64 },
}

pub struct DotField {
    params: FieldParams,
    particles: Vec<Particle>,
    sources: AnchorSources,
    anchors: AnchorList,
    drift: DriftField,
    rng: StdRng,
    mode: Mode,
    fx: FxState,
    gravity: GravityPhase,
    width: f32,
    height: f32,
    clock: f64,
    paused: bool,
    reduced_motion: bool,
    respawn_pending: bool,
    sleep_scratch: Vec<f32>,
}

impl DotField {
    pub fn new(
        width: f32,
        height: f32,
        mode: Mode,
        reduced_motion: bool,
        seed: u64,
    ) -> Result<Self, EngineError> {
        if !(width > 0.0) || !(height > 0.0) {
            return Err(EngineError::ZeroSizedSurface { width, height });
        }
        let mut field = Self {
            params: FieldParams::default(),
            particles: Vec::new(),
            sources: AnchorSources::default(),
            anchors: AnchorList::new(),
            drift: DriftField::new(seed ^ 0x9E37_79B9_7F4A_7C15),
            rng: StdRng::seed_from_u64(seed),
            mode,
            fx: FxState::Ambient,
            gravity: GravityPhase::Inactive,
            width,
            height,
            clock: 0.0,
            paused: false,
            reduced_motion,
            respawn_pending: false,
            sleep_scratch: Vec::new(),
        };
        field.respawn_now();
        Ok(field)
    }

    // ---- frame driver ----

    /// Advances the simulation by `dt` seconds (clamped to one large-frame
    /// spike). A no-op under reduced motion; frozen while paused except for
    /// pending respawns, so parameter changes still land on screen.
    pub fn step(&mut self, dt: f32) {
        if self.reduced_motion {
            return;
        }
        if self.respawn_pending {
            self.respawn_now();
        }
        if self.paused {
            return;
        }

        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.clock += dt as f64;
        self.advance_fx();
        self.advance_gravity();

        let (noise_mul, cohesion_mul) = self.fx_multipliers();
        let tuning = self.params.tuning(noise_mul, cohesion_mul);
        let area = self.area();
        self.sources.collect(&mut self.anchors);

        let drop = match self.gravity {
            GravityPhase::Falling { .. } => DropMotion::Fall,
            GravityPhase::Active { .. } => DropMotion::Settle,
            _ => DropMotion::None,
        };
        let track_sleep = matches!(self.gravity, GravityPhase::Active { .. });
        if track_sleep {
            self.sleep_scratch.clear();
            self.sleep_scratch
                .extend(self.particles.iter().map(|p| p.pos.y));
        }

        let ctx = StepCtx {
            tuning: &tuning,
            params: &self.params,
            drift: &self.drift,
            anchors: &self.anchors,
            area: &area,
            drop,
            clock: self.clock,
            dt,
        };
        step::integrate(&mut self.particles, &ctx, &mut self.rng);

        let boosted = !matches!(self.gravity, GravityPhase::Inactive);
        let gravity_active = matches!(
            self.gravity,
            GravityPhase::Falling { .. } | GravityPhase::Active { .. }
        );
        let cfg = ContactCfg::for_frame(&self.params, boosted, gravity_active, dt);
        contact::resolve(&mut self.particles, &cfg, &area);

        if track_sleep {
            self.apply_sleep(dt);
        }
    }

    /// Applies a pending respawn immediately. Called by the frame driver,
    /// and by reduced-motion redraw paths that never run frames.
    pub fn flush_pending(&mut self) {
        if self.respawn_pending {
            self.respawn_now();
        }
    }

    // ---- commands ----

    /// Discards all particles, respawns and resets transient state.
    pub fn restart(&mut self) {
        self.fx = FxState::Ambient;
        self.gravity = GravityPhase::Inactive;
        self.respawn_now();
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Starts a gravity drop, optionally overriding the fall and settle
    /// window durations. Re-triggering mid-drop restarts it; the latest
    /// call always wins.
    pub fn drop_to_bottom(&mut self, fall_secs: Option<f64>, active_secs: Option<f64>) {
        if self.reduced_motion {
            log::debug!("[field] drop ignored under reduced motion");
            return;
        }
        let fall = fall_secs.unwrap_or(DROP_FALL_SECS).max(0.0);
        let active = active_secs.unwrap_or(DROP_ACTIVE_SECS).max(0.0);
        for p in &mut self.particles {
            p.asleep = false;
        }
        self.gravity = GravityPhase::Falling {
            until: self.clock + fall,
            active_secs: active,
        };
        log::info!("[field] gravity drop: fall {fall:.2}s, settle {active:.2}s");
    }

    /// Runs the three-phase inversion: disperse, swap the palette at a
    /// fixed offset, then ease the force multipliers back. Under reduced
    /// motion the palette swaps immediately with no dispersion.
    pub fn invert_to(&mut self, target: Mode) {
        if self.reduced_motion {
            self.mode = target;
            return;
        }
        self.fx = FxState::Invert {
            target,
            swap_at: self.clock + INVERT_SWAP_AT_SECS,
            until: self.clock + INVERT_SECS,
            swapped: false,
        };
    }

    /// Timed intro state: elevated noise, lowered cohesion, auto-expires.
    pub fn hero_intro(&mut self) {
        if self.reduced_motion {
            return;
        }
        self.fx = FxState::HeroIntro {
            until: self.clock + HERO_INTRO_SECS,
        };
    }

    pub fn set_reduced_motion(&mut self, on: bool) {
        if self.reduced_motion == on {
            return;
        }
        self.reduced_motion = on;
        if on {
            // A not-yet-swapped inversion still owes its palette flip.
            if let FxState::Invert {
                target,
                swapped: false,
                ..
            } = self.fx
            {
                self.mode = target;
            }
            // Settle into a genuinely static frame: no inflated radii, no
            // residual motion, no running transitions.
            self.fx = FxState::Ambient;
            self.gravity = GravityPhase::Inactive;
            for p in &mut self.particles {
                p.radius = p.base_radius;
                p.breath = 0.0;
                p.vel = Vec2::ZERO;
                p.asleep = false;
            }
        }
    }

    /// New viewport size in device pixels; the respawn lands on the next
    /// frame (or the next reduced-motion redraw).
    pub fn resize(&mut self, width: f32, height: f32) {
        let w = width.max(1.0);
        let h = height.max(1.0);
        if w == self.width && h == self.height {
            return;
        }
        self.width = w;
        self.height = h;
        self.respawn_pending = true;
    }

    // ---- parameter setters ----

    pub fn set_density(&mut self, value: f32) {
        if self.params.set_density(value) {
            self.respawn_pending = true;
        }
    }

    pub fn set_min_radius(&mut self, value: f32) {
        if self.params.set_min_radius(value) {
            self.respawn_pending = true;
        }
    }

    pub fn set_max_radius(&mut self, value: f32) {
        if self.params.set_max_radius(value) {
            self.respawn_pending = true;
        }
    }

    pub fn set_bucket_count(&mut self, value: u32) {
        if self.params.set_bucket_count(value) {
            self.respawn_pending = true;
        }
    }

    pub fn set_distribution(&mut self, value: SizeDistribution) {
        if self.params.set_distribution(value) {
            self.respawn_pending = true;
        }
    }

    pub fn set_auto_fit(&mut self, on: bool) {
        if self.params.auto_fit != on {
            self.params.auto_fit = on;
            self.respawn_pending = true;
        }
    }

    /// Device pixels reserved under the top edge. Spawn geometry, so it
    /// triggers a debounced respawn.
    pub fn set_top_exclusion(&mut self, value: f32) {
        if self.params.set_top_exclusion(value) {
            self.respawn_pending = true;
        }
    }

    pub fn set_speed(&mut self, value: f32) {
        self.params.set_speed(value);
    }

    pub fn set_react_ui(&mut self, on: bool) {
        self.params.react_ui = on;
    }

    pub fn set_physics(&mut self, on: bool) {
        self.params.physics = on;
    }

    pub fn set_breathing(&mut self, on: bool) {
        self.params.breathing = on;
    }

    /// Boolean gravity surface kept for callers that treat the drop as a
    /// toggle: enabling starts a default drop, disabling cancels it.
    pub fn set_gravity(&mut self, on: bool) {
        if on {
            self.drop_to_bottom(None, None);
        } else {
            self.end_drop();
        }
    }

    // ---- anchor feeds ----

    pub fn set_element_anchors(&mut self, anchors: &[Anchor]) {
        self.sources.set_elements(anchors);
    }

    pub fn set_hot_rect(&mut self, rect: Option<HotRect>) {
        self.sources.set_hot(rect);
    }

    pub fn set_active_section(&mut self, id: &str, pos: Vec2) {
        self.sources.set_active_section(id, pos);
    }

    pub fn clear_active_section(&mut self) {
        self.sources.clear_active_section();
    }

    pub fn set_nav_anchor(&mut self, pos: Option<Vec2>) {
        self.sources.set_nav(pos);
    }

    // ---- accessors ----

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn palette(&self) -> Palette {
        self.mode.palette()
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// True while the drop is actually moving particles (fall or settle
    /// descent); the trailing boost window no longer counts.
    pub fn gravity_active(&self) -> bool {
        matches!(
            self.gravity,
            GravityPhase::Falling { .. } | GravityPhase::Active { .. }
        )
    }

    // ---- internals ----

    fn area(&self) -> SpawnArea {
        SpawnArea::new(self.width, self.height, self.params.top_exclusion)
    }

    fn respawn_now(&mut self) {
        let area = self.area();
        self.particles = spawn::spawn(&self.params, &area, &mut self.rng);
        self.respawn_pending = false;
        log::info!(
            "[field] spawned {} dots in {:.0}x{:.0}",
            self.particles.len(),
            self.width,
            self.height
        );
    }

    fn end_drop(&mut self) {
        if self.gravity != GravityPhase::Inactive {
            for p in &mut self.particles {
                p.asleep = false;
            }
            self.gravity = GravityPhase::Inactive;
        }
    }

    fn advance_fx(&mut self) {
        match self.fx {
            FxState::Ambient => {}
            FxState::HeroIntro { until } => {
                if self.clock >= until {
                    self.fx = FxState::Ambient;
                }
            }
            FxState::Invert {
                target,
                swap_at,
                until,
                swapped,
            } => {
                if !swapped && self.clock >= swap_at {
                    self.mode = target;
                    self.fx = FxState::Invert {
                        target,
                        swap_at,
                        until,
                        swapped: true,
                    };
                }
                if self.clock >= until {
                    self.fx = FxState::Ambient;
                }
            }
        }
    }

    fn advance_gravity(&mut self) {
        match self.gravity {
            GravityPhase::Inactive => {}
            GravityPhase::Falling { until, active_secs } => {
                if self.clock >= until {
                    self.gravity = GravityPhase::Active {
                        until: self.clock + active_secs,
                    };
                }
            }
            GravityPhase::Active { until } => {
                if self.clock >= until {
                    log::info!("[field] drop settled, gravity off");
                    self.gravity = GravityPhase::SettleBoost {
                        until: self.clock + DROP_SETTLE_SECS,
                    };
                }
            }
            GravityPhase::SettleBoost { until } => {
                if self.clock >= until {
                    self.end_drop();
                }
            }
        }
    }

    /// Noise and cohesion multipliers for the current effect. The back
    /// half of an inversion eases both back to ambient.
    fn fx_multipliers(&self) -> (f32, f32) {
        match self.fx {
            FxState::Ambient => (1.0, 1.0),
            FxState::HeroIntro { .. } => (HERO_NOISE_MUL, HERO_COHESION_MUL),
            FxState::Invert { swap_at, until, .. } => {
                if self.clock < swap_at {
                    (INVERT_NOISE_MUL, INVERT_COHESION_MUL)
                } else {
                    let span = (until - swap_at).max(1e-6);
                    let t = ((self.clock - swap_at) / span).clamp(0.0, 1.0) as f32;
                    (
                        lerp(INVERT_NOISE_MUL, 1.0, t),
                        lerp(INVERT_COHESION_MUL, 1.0, t),
                    )
                }
            }
        }
    }

    /// A settling particle whose descent got blocked and whose speed has
    /// decayed away is zeroed for good, so the pile stops jittering.
    fn apply_sleep(&mut self, dt: f32) {
        let expected = DROP_ACTIVE_SPEED * dt;
        for (p, &y_before) in self.particles.iter_mut().zip(&self.sleep_scratch) {
            if p.asleep {
                continue;
            }
            let progressed = p.pos.y - y_before;
            if progressed < expected * 0.25 && p.vel.length_squared() < SLEEP_SPEED * SLEEP_SPEED {
                p.asleep = true;
                p.vel = Vec2::ZERO;
            }
        }
    }
}
