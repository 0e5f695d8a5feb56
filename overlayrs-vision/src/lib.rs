pub mod canvas;
pub mod face;
pub mod registry;
pub mod surface;
pub mod transform;

// Re-export commonly used types
pub use canvas::{Canvas, ImageCanvas};
pub use face::{Detection, FaceBoxGraphic, LandmarkGraphic};
pub use registry::GraphicRegistry;
pub use surface::{Decoration, DrawReport, Graphic, GuideOval, RenderSurface};
pub use transform::{Affine, Projection, TransformError, TransformState};
