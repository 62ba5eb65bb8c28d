//! DOM plumbing: window/document acquisition, 2D context acquisition and
//! canvas backing-store sizing.

use anyhow::anyhow;
use dotfield_core::EngineError;
use wasm_bindgen::JsCast;
use web_sys as web;

pub fn window() -> anyhow::Result<web::Window> {
    web::window().ok_or_else(|| anyhow!("no window"))
}

pub fn document() -> anyhow::Result<web::Document> {
    window()?.document().ok_or_else(|| anyhow!("no document"))
}

/// Acquires the 2D context or fails fast. The page treats this error as
/// "hide the canvas layer"; there is no software fallback.
pub fn context_2d(canvas: &web::HtmlCanvasElement) -> anyhow::Result<web::CanvasRenderingContext2d> {
    let ctx = canvas
        .get_context("2d")
        .map_err(|_| EngineError::ContextUnavailable)?
        .ok_or(EngineError::ContextUnavailable)?
        .dyn_into::<web::CanvasRenderingContext2d>()
        .map_err(|_| EngineError::ContextUnavailable)?;
    Ok(ctx)
}

/// Sizes the canvas backing store to its CSS rect times devicePixelRatio.
/// Returns the device-pixel size and the ratio used, so callers can keep
/// scaling CSS-pixel inputs consistently.
pub fn sync_backing_size(canvas: &web::HtmlCanvasElement) -> (f32, f32, f64) {
    let dpr = web::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0);
    let rect = canvas.get_bounding_client_rect();
    let width = (rect.width() * dpr) as u32;
    let height = (rect.height() * dpr) as u32;
    canvas.set_width(width);
    canvas.set_height(height);
    (width as f32, height as f32, dpr)
}
