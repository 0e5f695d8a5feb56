use anyhow::Result;
use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::surface::Graphic;
use crate::transform::Projection;

/// Face detection in source-image pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: [f32; 4], // x, y, w, h
    pub score: f32,
    #[serde(default)]
    pub landmarks: [f32; 10], // 5 points: x1,y1,x2,y2,...,x5,y5
}

impl Detection {
    pub fn landmark_points(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.landmarks.chunks_exact(2).map(|p| (p[0], p[1]))
    }

    fn has_landmarks(&self) -> bool {
        self.landmarks.iter().any(|&v| v != 0.0)
    }
}

/// Outline around a detected face, mapped point by point.
pub struct FaceBoxGraphic {
    detection: Detection,
    color: Rgba<u8>,
    stroke: f32,
}

impl FaceBoxGraphic {
    pub fn new(detection: Detection, color: Rgba<u8>, stroke: f32) -> Self {
        Self {
            detection,
            color,
            stroke,
        }
    }
}

impl Graphic for FaceBoxGraphic {
    fn draw(&self, canvas: &mut dyn Canvas, projection: &Projection) -> Result<()> {
        let [x, y, w, h] = self.detection.bbox;
        if !(w > 0.0 && h > 0.0) || !x.is_finite() || !y.is_finite() {
            anyhow::bail!("degenerate face box {:?}", self.detection.bbox);
        }

        // Mirroring swaps left and right; the canvas normalizes corners
        canvas.stroke_rect(
            projection.map_x(x),
            projection.map_y(y),
            projection.map_x(x + w),
            projection.map_y(y + h),
            self.stroke,
            self.color,
        );
        Ok(())
    }
}

/// The five facial landmarks, mapped through the composed matrix.
pub struct LandmarkGraphic {
    detection: Detection,
    color: Rgba<u8>,
    radius: f32,
}

impl LandmarkGraphic {
    pub fn new(detection: Detection, color: Rgba<u8>, radius: f32) -> Self {
        Self {
            detection,
            color,
            radius,
        }
    }
}

impl Graphic for LandmarkGraphic {
    fn draw(&self, canvas: &mut dyn Canvas, projection: &Projection) -> Result<()> {
        if !self.detection.has_landmarks() {
            return Ok(());
        }
        if self.detection.landmarks.iter().any(|v| !v.is_finite()) {
            anyhow::bail!("non-finite landmark in {:?}", self.detection.landmarks);
        }

        let matrix = projection.matrix();
        for (x, y) in self.detection.landmark_points() {
            let (sx, sy) = matrix.map_point(x, y);
            canvas.fill_circle(sx, sy, self.radius, self.color);
        }
        Ok(())
    }
}
