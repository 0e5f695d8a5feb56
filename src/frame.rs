use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Detection;

/// Detector output for one frame, as written by the detection pipeline.
///
/// ```json
/// { "source_width": 640, "source_height": 480, "mirrored": true,
///   "detections": [{ "bbox": [280, 180, 80, 100], "score": 0.93,
///                    "landmarks": [300, 210, 340, 210, 320, 235, 305, 260, 335, 260] }] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameAnnotations {
    pub source_width: u32,
    pub source_height: u32,
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

pub fn load_frame(path: &Path) -> Result<FrameAnnotations> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading frame at {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing frame {}", path.display()))
}
