//! Error types for field construction and frontend wiring.

use thiserror::Error;

/// Errors that can occur while bringing a dot field up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The host canvas refused to hand out a 2d rendering context.
    #[error("2d canvas context unavailable")]
    ContextUnavailable,
    /// The drawing surface has no area to place dots in.
    #[error("drawing surface has zero area ({width:.0}x{height:.0})")]
    ZeroSizedSurface { width: f32, height: f32 },
}
