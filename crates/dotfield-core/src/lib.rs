//! Dot-field simulation engine: spawn under non-overlap constraints,
//! per-frame force integration, contact resolution and timed transitions.
//! Platform-free; the web frontend drives it from the display's frame
//! callback and rasterises the result.

pub mod anchor;
pub mod constants;
pub mod contact;
pub mod error;
pub mod field;
pub mod grid;
pub mod noise;
pub mod palette;
pub mod params;
pub mod particle;
pub mod spawn;
pub mod step;

pub use anchor::{Anchor, AnchorSources, HotRect};
pub use error::EngineError;
pub use field::DotField;
pub use palette::{Mode, Palette};
pub use params::{FieldParams, SizeDistribution};
pub use particle::Particle;
pub use spawn::SpawnArea;
