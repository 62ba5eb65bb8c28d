#![cfg(target_arch = "wasm32")]
//! WASM front-end: owns the canvas, the frame loop and the exported
//! command surface the page wiring calls. All positional inputs arrive in
//! CSS pixels and are scaled by the cached devicePixelRatio before they
//! reach the engine, which works in device pixels throughout.

mod dom;
mod frame;
mod render;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dotfield_core::constants::ANCHOR_ELEMENT_STRENGTH;
use dotfield_core::{Anchor, DotField, HotRect, Mode, SizeDistribution};
use glam::Vec2;
use js_sys::Float32Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::frame::FrameLoop;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("dotfield-web starting");
    Ok(())
}

/// The page-facing engine handle. Constructing it spawns the field, wires
/// resize and visibility listeners, and starts the frame loop unless the
/// visitor prefers reduced motion.
#[wasm_bindgen]
pub struct DotFieldHandle {
    field: Rc<RefCell<DotField>>,
    frame: FrameLoop,
    ctx: web::CanvasRenderingContext2d,
    dpr: Rc<Cell<f64>>,
}

#[wasm_bindgen]
impl DotFieldHandle {
    /// Fails fast when 2D drawing is unavailable or the canvas has zero
    /// area; the page reacts by hiding the layer.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: web::HtmlCanvasElement,
        mode: Option<String>,
        reduced_motion: Option<bool>,
    ) -> Result<DotFieldHandle, JsValue> {
        Self::init(canvas, mode, reduced_motion.unwrap_or(false))
            .map_err(|e| JsValue::from_str(&format!("{e:#}")))
    }

    // ---- commands ----

    /// Idempotent; a no-op under reduced motion.
    pub fn start(&self) {
        if !self.field.borrow().reduced_motion() {
            self.frame.start();
        }
    }

    /// Freezes integration. The loop keeps rendering, so palette swaps and
    /// respawns from queued setters still reach the screen.
    pub fn pause(&self) {
        self.field.borrow_mut().pause();
    }

    pub fn resume(&self) {
        self.field.borrow_mut().resume();
        self.start();
    }

    pub fn restart(&self) {
        self.field.borrow_mut().restart();
        self.redraw_if_static();
    }

    pub fn drop_to_bottom(&self, fall_secs: Option<f64>, active_secs: Option<f64>) {
        self.field.borrow_mut().drop_to_bottom(fall_secs, active_secs);
    }

    pub fn invert(&self, mode: &str) {
        let target = match Mode::from_name(mode) {
            Some(m) => m,
            None => {
                log::warn!("[web] unknown mode {mode:?} ignored");
                return;
            }
        };
        self.field.borrow_mut().invert_to(target);
        self.redraw_if_static();
    }

    pub fn hero_intro(&self) {
        self.field.borrow_mut().hero_intro();
    }

    pub fn set_reduced_motion(&self, on: bool) {
        self.field.borrow_mut().set_reduced_motion(on);
        if on {
            self.frame.halt();
            self.field.borrow_mut().flush_pending();
            render::draw(&self.ctx, &self.field.borrow());
        } else {
            self.frame.start();
        }
    }

    // ---- parameter setters ----

    pub fn set_density(&self, value: f32) {
        self.field.borrow_mut().set_density(value);
        self.redraw_if_static();
    }

    pub fn set_min_radius(&self, value: f32) {
        self.field.borrow_mut().set_min_radius(value);
        self.redraw_if_static();
    }

    pub fn set_max_radius(&self, value: f32) {
        self.field.borrow_mut().set_max_radius(value);
        self.redraw_if_static();
    }

    pub fn set_bucket_count(&self, value: u32) {
        self.field.borrow_mut().set_bucket_count(value);
        self.redraw_if_static();
    }

    /// Accepts the external numeric selector (0-6); unknown indices fall
    /// back to the flat distribution.
    pub fn set_distribution(&self, index: u32) {
        self.field
            .borrow_mut()
            .set_distribution(SizeDistribution::from_index(index));
        self.redraw_if_static();
    }

    pub fn set_speed(&self, value: f32) {
        self.field.borrow_mut().set_speed(value);
    }

    pub fn set_breathing(&self, on: bool) {
        self.field.borrow_mut().set_breathing(on);
    }

    pub fn set_gravity(&self, on: bool) {
        self.field.borrow_mut().set_gravity(on);
    }

    pub fn set_physics(&self, on: bool) {
        self.field.borrow_mut().set_physics(on);
    }

    pub fn set_react_ui(&self, on: bool) {
        self.field.borrow_mut().set_react_ui(on);
    }

    pub fn set_auto_fit(&self, on: bool) {
        self.field.borrow_mut().set_auto_fit(on);
        self.redraw_if_static();
    }

    /// CSS pixels reserved under the top edge (fixed header).
    pub fn set_top_exclusion(&self, css_px: f32) {
        let scaled = css_px * self.dpr.get() as f32;
        self.field.borrow_mut().set_top_exclusion(scaled);
        self.redraw_if_static();
    }

    // ---- anchor feeds ----

    /// Interactive-element centres as a flat `[x0, y0, x1, y1, ...]`
    /// CSS-pixel array; the engine caps the count.
    pub fn set_element_anchors(&self, points: &Float32Array) {
        let flat = points.to_vec();
        let dpr = self.dpr.get() as f32;
        let anchors: Vec<Anchor> = flat
            .chunks_exact(2)
            .map(|xy| Anchor {
                pos: Vec2::new(xy[0] * dpr, xy[1] * dpr),
                strength: ANCHOR_ELEMENT_STRENGTH,
            })
            .collect();
        self.field.borrow_mut().set_element_anchors(&anchors);
    }

    pub fn set_hot_rect(&self, x: f32, y: f32, width: f32, height: f32) {
        let dpr = self.dpr.get() as f32;
        self.field.borrow_mut().set_hot_rect(Some(HotRect {
            x: x * dpr,
            y: y * dpr,
            width: width * dpr,
            height: height * dpr,
        }));
    }

    pub fn clear_hot_rect(&self) {
        self.field.borrow_mut().set_hot_rect(None);
    }

    pub fn set_active_section(&self, id: &str, x: f32, y: f32) {
        let dpr = self.dpr.get() as f32;
        self.field
            .borrow_mut()
            .set_active_section(id, Vec2::new(x * dpr, y * dpr));
    }

    pub fn clear_active_section(&self) {
        self.field.borrow_mut().clear_active_section();
    }

    pub fn set_nav_anchor(&self, x: f32, y: f32) {
        let dpr = self.dpr.get() as f32;
        self.field
            .borrow_mut()
            .set_nav_anchor(Some(Vec2::new(x * dpr, y * dpr)));
    }

    pub fn clear_nav_anchor(&self) {
        self.field.borrow_mut().set_nav_anchor(None);
    }

    // ---- internals ----

    fn init(
        canvas: web::HtmlCanvasElement,
        mode: Option<String>,
        reduced_motion: bool,
    ) -> anyhow::Result<DotFieldHandle> {
        let ctx = dom::context_2d(&canvas)?;
        let (width, height, ratio) = dom::sync_backing_size(&canvas);
        let mode = mode.as_deref().and_then(Mode::from_name).unwrap_or_default();
        let field = DotField::new(width, height, mode, reduced_motion, rand::random())?;
        log::info!("[web] field ready: {width:.0}x{height:.0} at dpr {ratio:.2}");

        let field = Rc::new(RefCell::new(field));
        let dpr = Rc::new(Cell::new(ratio));
        render::draw(&ctx, &field.borrow());

        let frame = FrameLoop::new(field.clone(), ctx.clone());
        wire_resize(&canvas, &ctx, &field, &dpr)?;
        wire_visibility(&field, &frame)?;
        if !reduced_motion {
            frame.start();
        }

        Ok(DotFieldHandle {
            field,
            frame,
            ctx,
            dpr,
        })
    }

    /// Reduced motion never runs the loop, so state-changing calls repaint
    /// synchronously instead.
    fn redraw_if_static(&self) {
        if self.field.borrow().reduced_motion() {
            self.field.borrow_mut().flush_pending();
            render::draw(&self.ctx, &self.field.borrow());
        }
    }
}

fn wire_resize(
    canvas: &web::HtmlCanvasElement,
    ctx: &web::CanvasRenderingContext2d,
    field: &Rc<RefCell<DotField>>,
    dpr: &Rc<Cell<f64>>,
) -> anyhow::Result<()> {
    let window = dom::window()?;
    let canvas = canvas.clone();
    let ctx = ctx.clone();
    let field = field.clone();
    let dpr = dpr.clone();
    let closure = Closure::wrap(Box::new(move || {
        let (width, height, ratio) = dom::sync_backing_size(&canvas);
        dpr.set(ratio);
        field.borrow_mut().resize(width, height);
        if field.borrow().reduced_motion() {
            field.borrow_mut().flush_pending();
            render::draw(&ctx, &field.borrow());
        }
    }) as Box<dyn FnMut()>);
    window
        .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        .ok();
    closure.forget();
    Ok(())
}

fn wire_visibility(field: &Rc<RefCell<DotField>>, frame: &FrameLoop) -> anyhow::Result<()> {
    let document = dom::document()?;
    let doc = document.clone();
    let field = field.clone();
    let frame = frame.clone();
    let closure = Closure::wrap(Box::new(move || {
        if doc.hidden() {
            log::debug!("[web] document hidden, halting the frame loop");
            frame.halt();
        } else if !field.borrow().reduced_motion() {
            frame.start();
        }
    }) as Box<dyn FnMut()>);
    document
        .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())
        .ok();
    closure.forget();
    Ok(())
}
