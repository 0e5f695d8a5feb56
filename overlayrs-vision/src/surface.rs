//! Overlay surface: ties the transform and the graphic registry to a canvas
//!
//! Redraw cycle:
//! 1. refresh the transform against the canvas size (no-op unless dirty)
//! 2. draw every registered graphic, in insertion order, with a copy of the
//!    refreshed projection
//! 3. draw the static decoration, if any
//!
//! The surface state mutex guards the transform and every registry mutation.
//! The projection and the draw-order snapshot are taken together under it,
//! then released before any graphic runs, so a draw never pairs graphics
//! with a transform from a different `set_source_info` call.
//! Lock order: `state`, then the registry's own lock.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use image::Rgba;
use log::{debug, warn};

use crate::canvas::Canvas;
use crate::registry::GraphicRegistry;
use crate::transform::{Projection, TransformError, TransformState};

/// An annotation drawn on top of the feed.
///
/// Coordinates are authored in source-image space and converted with the
/// given projection before being drawn.
pub trait Graphic: Send + Sync {
    fn draw(&self, canvas: &mut dyn Canvas, projection: &Projection) -> Result<()>;
}

/// Static shape drawn after all graphics, independent of the transform.
pub trait Decoration: Send + Sync {
    fn draw(&self, canvas: &mut dyn Canvas);
}

/// Centered guide oval spanning the surface width and half its height.
pub struct GuideOval {
    pub color: Rgba<u8>,
    pub stroke: f32,
}

impl Default for GuideOval {
    fn default() -> Self {
        Self {
            color: Rgba([255, 0, 0, 255]),
            stroke: 5.0,
        }
    }
}

impl Decoration for GuideOval {
    fn draw(&self, canvas: &mut dyn Canvas) {
        let (width, height) = canvas.size();
        let cx = (width / 2) as f32;
        let cy = (height / 2) as f32;
        canvas.stroke_ellipse(
            cx,
            cy,
            (width / 2) as f32,
            (height / 4) as f32,
            self.stroke,
            self.color,
        );
    }
}

/// Outcome of one redraw pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawReport {
    pub drawn: usize,
    pub failed: usize,
}

struct SurfaceState {
    transform: TransformState,
    layout: (u32, u32),
}

pub struct RenderSurface {
    state: Mutex<SurfaceState>,
    graphics: GraphicRegistry<dyn Graphic>,
    decoration: Option<Box<dyn Decoration>>,
    invalidated: AtomicBool,
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SurfaceState {
                transform: TransformState::new(),
                layout: (0, 0),
            }),
            graphics: GraphicRegistry::new(),
            decoration: None,
            invalidated: AtomicBool::new(false),
        }
    }

    pub fn with_decoration(mut self, decoration: impl Decoration + 'static) -> Self {
        self.decoration = Some(Box::new(decoration));
        self
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }

    /// Consumes a pending redraw request.
    pub fn take_invalidated(&self) -> bool {
        self.invalidated.swap(false, Ordering::SeqCst)
    }

    /// Sets the size of the image sent to the detector and whether it is
    /// mirrored. Should be mirrored for front-camera frames.
    pub fn set_source_info(&self, width: u32, height: u32, mirrored: bool) {
        self.state()
            .transform
            .set_source_info(width, height, mirrored);
        self.invalidate();
    }

    pub fn notify_surface_resized(&self) {
        self.state().transform.notify_surface_resized();
        self.invalidate();
    }

    /// Layout callback from the host; marks the transform stale only when
    /// the pixel size actually changed.
    pub fn on_layout(&self, width: u32, height: u32) {
        let mut state = self.state();
        if state.layout == (width, height) {
            return;
        }
        state.layout = (width, height);
        state.transform.notify_surface_resized();
        drop(state);
        self.invalidate();
    }

    pub fn add(&self, graphic: Arc<dyn Graphic>) {
        let _state = self.state();
        self.graphics.add(graphic);
        self.invalidate();
    }

    pub fn remove(&self, graphic: &Arc<dyn Graphic>) -> bool {
        let removed = {
            let _state = self.state();
            self.graphics.remove(graphic)
        };
        if removed {
            self.invalidate();
        }
        removed
    }

    pub fn clear(&self) {
        let _state = self.state();
        self.graphics.clear();
        self.invalidate();
    }

    pub fn len(&self) -> usize {
        self.graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    /// Current projection; identity until the first successful refresh.
    pub fn projection(&self) -> Projection {
        self.state().transform.projection()
    }

    pub fn transform_status(&self) -> Result<(), TransformError> {
        self.state().transform.status()
    }

    pub fn is_mirrored(&self) -> bool {
        self.state().transform.is_mirrored()
    }

    /// Runs one redraw pass onto `canvas`.
    ///
    /// A graphic that errors or panics is logged and skipped; the rest of the
    /// pass continues. Panics still go through the process panic hook, which
    /// by default also prints them to stderr on every pass.
    pub fn redraw(&self, canvas: &mut dyn Canvas) -> DrawReport {
        self.invalidated.store(false, Ordering::SeqCst);
        let (width, height) = canvas.size();

        let (projection, graphics) = {
            let mut state = self.state();
            if state.transform.refresh_if_needed(width, height) {
                state.layout = (width, height);
            }
            (state.transform.projection(), self.graphics.snapshot())
        };

        let mut report = DrawReport::default();
        for (idx, graphic) in graphics.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| graphic.draw(&mut *canvas, &projection))) {
                Ok(Ok(())) => report.drawn += 1,
                Ok(Err(e)) => {
                    warn!("graphic {} failed to draw: {:#}", idx, e);
                    report.failed += 1;
                }
                Err(_) => {
                    warn!("graphic {} panicked while drawing", idx);
                    report.failed += 1;
                }
            }
        }

        if let Some(decoration) = &self.decoration {
            decoration.draw(canvas);
        }

        debug!(
            "redraw {}x{}: drawn={} failed={}",
            width, height, report.drawn, report.failed
        );
        report
    }
}
