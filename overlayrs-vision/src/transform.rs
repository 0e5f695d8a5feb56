//! Image-space to surface-space coordinate mapping
//!
//! Detections are expressed in the pixel space of the frame fed to the
//! detector. The overlay surface usually has a different size and aspect
//! ratio, so the source is scaled uniformly until it covers the surface and
//! the excess is cropped equally from both sides (crop-to-fill, never
//! stretched). Front-camera sources are additionally mirrored about the
//! vertical center line of the surface.
//!
//! Given scale `s` and crop offsets `(wo, ho)`:
//! x' = s * x - wo            (or W - (s * x - wo) when mirrored)
//! y' = s * y - ho

use log::debug;
use thiserror::Error;

/// Reasons the cached transform cannot be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("invalid source dimensions {width}x{height}")]
    InvalidSourceDimensions { width: u32, height: u32 },
    #[error("surface has zero area ({width}x{height})")]
    ZeroSurfaceArea { width: u32, height: u32 },
}

/// 2D affine matrix (3x2)
///
/// [ a  b  tx ]
/// [ c  d  ty ]
/// Where output = [a,b; c,d] * input + [tx, ty]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            tx,
            ty,
            ..Self::identity()
        }
    }

    /// Horizontal flip about the vertical line `x = width / 2`.
    pub fn mirror_x(width: f32) -> Self {
        Self {
            a: -1.0,
            tx: width,
            ..Self::identity()
        }
    }

    /// Compose: apply `self` first, then `next`.
    pub fn then(self, next: Affine) -> Self {
        Self {
            a: next.a * self.a + next.b * self.c,
            b: next.a * self.b + next.b * self.d,
            c: next.c * self.a + next.d * self.c,
            d: next.c * self.b + next.d * self.d,
            tx: next.a * self.tx + next.b * self.ty + next.tx,
            ty: next.c * self.tx + next.d * self.ty + next.ty,
        }
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.tx,
            self.c * x + self.d * y + self.ty,
        )
    }

    /// Inverse matrix, `None` if singular.
    pub fn invert(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + b * self.ty),
            ty: -(c * self.tx + d * self.ty),
        })
    }
}

/// Read-only snapshot of a refreshed transform, handed to draw callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    scale_factor: f32,
    width_crop_offset: f32,
    height_crop_offset: f32,
    surface_width: f32,
    flip_x: bool,
    mirrored: bool,
    matrix: Affine,
}

impl Default for Projection {
    fn default() -> Self {
        Self::identity()
    }
}

impl Projection {
    /// Unscaled pass-through, used while no valid transform is available.
    pub const fn identity() -> Self {
        Self {
            scale_factor: 1.0,
            width_crop_offset: 0.0,
            height_crop_offset: 0.0,
            surface_width: 0.0,
            flip_x: false,
            mirrored: false,
            matrix: Affine::identity(),
        }
    }

    /// Adjusts a length from image scale to surface scale.
    pub fn map_length(&self, value: f32) -> f32 {
        value * self.scale_factor
    }

    /// Adjusts an x coordinate from image space to surface space.
    pub fn map_x(&self, x: f32) -> f32 {
        let x = self.map_length(x) - self.width_crop_offset;
        if self.flip_x {
            self.surface_width - x
        } else {
            x
        }
    }

    /// Adjusts a y coordinate from image space to surface space.
    pub fn map_y(&self, y: f32) -> f32 {
        self.map_length(y) - self.height_crop_offset
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.map_x(x), self.map_y(y))
    }

    /// Maps a surface point back into image space.
    pub fn unmap_point(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        self.matrix.invert().map(|inv| inv.map_point(x, y))
    }

    /// Scale, crop-translate and optional mirror as a single matrix.
    pub fn matrix(&self) -> Affine {
        self.matrix
    }

    /// Mirror flag of the source, reported even while the mapping is the
    /// unflipped pass-through.
    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn width_crop_offset(&self) -> f32 {
        self.width_crop_offset
    }

    pub fn height_crop_offset(&self) -> f32 {
        self.height_crop_offset
    }
}

/// Source info plus lazily recomputed scale/crop values.
///
/// Setters only mark the state dirty; `refresh_if_needed` is the single place
/// the cached values are recomputed and the only place `dirty` is cleared.
/// While dirty, [`TransformState::projection`] is the identity mapping.
#[derive(Debug, Clone)]
pub struct TransformState {
    source_width: u32,
    source_height: u32,
    mirrored: bool,
    surface_width: u32,
    surface_height: u32,
    projection: Projection,
    dirty: bool,
}

impl Default for TransformState {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformState {
    pub fn new() -> Self {
        Self {
            source_width: 0,
            source_height: 0,
            mirrored: false,
            surface_width: 0,
            surface_height: 0,
            projection: Projection::identity(),
            dirty: true,
        }
    }

    /// Sets the size of the image sent to the detector and whether it is
    /// mirrored (front camera). Zero dimensions leave the state invalid.
    pub fn set_source_info(&mut self, width: u32, height: u32, mirrored: bool) {
        self.source_width = width;
        self.source_height = height;
        self.mirrored = mirrored;
        self.dirty = true;
    }

    pub fn notify_surface_resized(&mut self) {
        self.dirty = true;
    }

    /// Recomputes scale and crop offsets if dirty and the inputs are valid.
    ///
    /// Returns true when a recompute happened.
    pub fn refresh_if_needed(&mut self, surface_width: u32, surface_height: u32) -> bool {
        if !self.dirty {
            return false;
        }
        self.surface_width = surface_width;
        self.surface_height = surface_height;
        if let Err(e) = self.status() {
            debug!("transform refresh skipped: {}", e);
            return false;
        }

        let view_w = surface_width as f32;
        let view_h = surface_height as f32;
        let view_aspect = view_w / view_h;
        let source_aspect = self.source_width as f32 / self.source_height as f32;

        let mut width_crop_offset = 0.0;
        let mut height_crop_offset = 0.0;
        let scale_factor = if view_aspect > source_aspect {
            // Surface is relatively wider: crop top and bottom
            height_crop_offset = ((view_w / source_aspect - view_h) / 2.0).max(0.0);
            view_w / self.source_width as f32
        } else {
            // Surface is relatively taller: crop left and right
            width_crop_offset = ((view_h * source_aspect - view_w) / 2.0).max(0.0);
            view_h / self.source_height as f32
        };

        let mut matrix = Affine::scale(scale_factor, scale_factor)
            .then(Affine::translate(-width_crop_offset, -height_crop_offset));
        if self.mirrored {
            matrix = matrix.then(Affine::mirror_x(view_w));
        }

        self.projection = Projection {
            scale_factor,
            width_crop_offset,
            height_crop_offset,
            surface_width: view_w,
            flip_x: self.mirrored,
            mirrored: self.mirrored,
            matrix,
        };
        self.dirty = false;

        debug!(
            "transform refreshed: source={}x{} surface={}x{} scale={:.4} crop=({:.2}, {:.2}) mirrored={}",
            self.source_width,
            self.source_height,
            surface_width,
            surface_height,
            scale_factor,
            width_crop_offset,
            height_crop_offset,
            self.mirrored
        );
        true
    }

    /// Whether the current inputs allow a transform to be computed.
    pub fn status(&self) -> Result<(), TransformError> {
        if self.source_width == 0 || self.source_height == 0 {
            return Err(TransformError::InvalidSourceDimensions {
                width: self.source_width,
                height: self.source_height,
            });
        }
        if self.surface_width == 0 || self.surface_height == 0 {
            return Err(TransformError::ZeroSurfaceArea {
                width: self.surface_width,
                height: self.surface_height,
            });
        }
        Ok(())
    }

    /// Snapshot of the cached values, identity mapping while dirty.
    pub fn projection(&self) -> Projection {
        if self.dirty {
            Projection {
                mirrored: self.mirrored,
                ..Projection::identity()
            }
        } else {
            self.projection
        }
    }

    pub fn map_length(&self, value: f32) -> f32 {
        self.projection().map_length(value)
    }

    pub fn map_x(&self, x: f32) -> f32 {
        self.projection().map_x(x)
    }

    pub fn map_y(&self, y: f32) -> f32 {
        self.projection().map_y(y)
    }

    pub fn composed_matrix(&self) -> Affine {
        self.projection().matrix()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_portrait_surface_landscape_source() {
        let mut state = TransformState::new();
        state.set_source_info(640, 480, false);
        assert!(state.refresh_if_needed(1080, 1920));

        let p = state.projection();
        assert!(approx(p.scale_factor(), 4.0));
        assert!(approx(p.width_crop_offset(), 720.0));
        assert_eq!(p.height_crop_offset(), 0.0);
        assert!(approx(state.map_x(320.0), 560.0));
        assert!(approx(state.map_y(240.0), 960.0));
    }

    #[test]
    fn test_mirrored_x() {
        let mut state = TransformState::new();
        state.set_source_info(640, 480, true);
        state.refresh_if_needed(1080, 1920);

        assert!(approx(state.map_x(320.0), 520.0));
        // y is never mirrored
        assert!(approx(state.map_y(240.0), 960.0));
    }

    #[test]
    fn test_wide_surface_crops_vertically() {
        let mut state = TransformState::new();
        state.set_source_info(480, 640, false);
        state.refresh_if_needed(1920, 1080);

        let p = state.projection();
        // scale = 1920 / 480 = 4, scaled height 2560, excess 1480
        assert!(approx(p.scale_factor(), 4.0));
        assert_eq!(p.width_crop_offset(), 0.0);
        assert!(approx(p.height_crop_offset(), 740.0));
        assert!(approx(state.map_y(0.0), -740.0));
    }

    #[test]
    fn test_matrix_matches_pointwise_mapping() {
        for mirrored in [false, true] {
            let mut state = TransformState::new();
            state.set_source_info(640, 480, mirrored);
            state.refresh_if_needed(1080, 1920);

            let m = state.composed_matrix();
            for &(x, y) in &[(0.0, 0.0), (320.0, 240.0), (12.5, 400.0), (640.0, 480.0)] {
                let (mx, my) = m.map_point(x, y);
                assert!(approx(mx, state.map_x(x)), "x mismatch mirrored={}", mirrored);
                assert!(approx(my, state.map_y(y)), "y mismatch mirrored={}", mirrored);
            }
        }
    }

    #[test]
    fn test_zero_source_is_identity() {
        let mut state = TransformState::new();
        state.set_source_info(0, 480, false);
        assert!(!state.refresh_if_needed(1080, 1920));
        assert!(state.is_dirty());
        assert_eq!(
            state.status(),
            Err(TransformError::InvalidSourceDimensions {
                width: 0,
                height: 480
            })
        );
        assert_eq!(state.source_size(), (0, 480));
        assert_eq!(state.map_length(7.0), 7.0);
        assert_eq!(state.map_x(7.0), 7.0);
        assert_eq!(state.map_y(9.0), 9.0);
    }

    #[test]
    fn test_dirty_projection_keeps_mirror_flag() {
        let mut state = TransformState::new();
        state.set_source_info(640, 0, true);
        state.refresh_if_needed(1080, 1920);

        let p = state.projection();
        assert!(p.is_mirrored());
        // mapping stays the unflipped pass-through
        assert_eq!(p.map_x(7.0), 7.0);
        assert_eq!(p.matrix(), Affine::identity());
    }

    #[test]
    fn test_zero_surface_is_skipped() {
        let mut state = TransformState::new();
        state.set_source_info(640, 480, false);
        assert!(!state.refresh_if_needed(0, 1920));
        assert!(matches!(
            state.status(),
            Err(TransformError::ZeroSurfaceArea { .. })
        ));

        // Laid out later: the pending recompute still happens
        assert!(state.refresh_if_needed(1080, 1920));
        assert!(approx(state.map_length(1.0), 4.0));
    }

    #[test]
    fn test_refresh_is_lazy() {
        let mut state = TransformState::new();
        state.set_source_info(640, 480, false);
        state.refresh_if_needed(1080, 1920);
        let first = state.projection();

        // Different size without a resize notification: cached values stay
        assert!(!state.refresh_if_needed(1920, 1080));
        assert_eq!(state.projection(), first);

        state.notify_surface_resized();
        assert!(state.refresh_if_needed(1920, 1080));
        assert_ne!(state.projection(), first);
    }

    #[test]
    fn test_invert_round_trip() {
        let m = Affine::scale(4.0, 4.0)
            .then(Affine::translate(-720.0, 0.0))
            .then(Affine::mirror_x(1080.0));
        let inv = m.invert().unwrap();
        let (x, y) = m.map_point(100.0, 50.0);
        let (bx, by) = inv.map_point(x, y);
        assert!(approx(bx, 100.0));
        assert!(approx(by, 50.0));

        assert!(Affine::scale(0.0, 1.0).invert().is_none());
    }
}
