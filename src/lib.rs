pub mod config;
pub mod frame;
pub mod render;

// Re-export overlay types for convenience
pub use overlayrs_vision::{
    canvas, face, surface, transform, Detection, Projection, RenderSurface, TransformState,
};
