//! Canvas-2D rasterisation. All dots share one fill colour, so the whole
//! field renders as a background clear plus a single batched path.

use std::f64::consts::TAU;

use dotfield_core::DotField;
use web_sys as web;

pub fn draw(ctx: &web::CanvasRenderingContext2d, field: &DotField) {
    let (width, height) = field.size();
    let palette = field.palette();

    ctx.set_fill_style_str(palette.background);
    ctx.fill_rect(0.0, 0.0, width as f64, height as f64);

    ctx.set_fill_style_str(palette.dot);
    ctx.begin_path();
    for p in field.particles() {
        let (x, y, r) = (p.pos.x as f64, p.pos.y as f64, p.radius as f64);
        // move_to breaks the subpath so arcs do not connect with chords.
        ctx.move_to(x + r, y);
        let _ = ctx.arc(x, y, r, 0.0, TAU);
    }
    ctx.fill();
}
