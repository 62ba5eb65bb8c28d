//! The requestAnimationFrame loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dotfield_core::DotField;
use instant::Instant;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::render;

/// Drives the engine from requestAnimationFrame. The tick closure holds a
/// handle to itself so it can reschedule; `running` gates that scheduling,
/// which lets hidden tabs and reduced motion halt the loop and later
/// restart it without rebuilding anything. Elapsed-time spikes across a
/// halt are clamped inside the engine.
#[derive(Clone)]
pub struct FrameLoop {
    running: Rc<Cell<bool>>,
    tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl FrameLoop {
    pub fn new(field: Rc<RefCell<DotField>>, ctx: web::CanvasRenderingContext2d) -> Self {
        let running = Rc::new(Cell::new(false));
        let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

        let running_tick = running.clone();
        let tick_clone = tick.clone();
        let mut last = Instant::now();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if !running_tick.get() {
                return;
            }
            let now = Instant::now();
            let dt = (now - last).as_secs_f32();
            last = now;
            {
                let mut field = field.borrow_mut();
                field.step(dt);
                render::draw(&ctx, &field);
            }
            if let Some(w) = web::window() {
                let _ = w.request_animation_frame(
                    tick_clone.borrow().as_ref().unwrap().as_ref().unchecked_ref(),
                );
            }
        }) as Box<dyn FnMut()>));

        Self { running, tick }
    }

    /// Schedules the loop unless it is already running.
    pub fn start(&self) {
        if self.running.replace(true) {
            return;
        }
        if let Some(w) = web::window() {
            if let Some(tick) = self.tick.borrow().as_ref() {
                let _ = w.request_animation_frame(tick.as_ref().unchecked_ref());
            }
        }
    }

    /// Stops scheduling after the in-flight frame.
    pub fn halt(&self) {
        self.running.set(false);
    }
}
