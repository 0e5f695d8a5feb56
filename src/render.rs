use std::sync::Arc;

use anyhow::Result;
use image::{imageops::FilterType, DynamicImage, Rgba, RgbaImage};
use log::{info, warn};
use overlayrs_vision::{FaceBoxGraphic, GuideOval, ImageCanvas, LandmarkGraphic, RenderSurface};

use crate::config::Config;
use crate::frame::FrameAnnotations;

/// Surface holding one box and one landmark graphic per detection.
pub fn build_surface(cfg: &Config, frame: &FrameAnnotations) -> RenderSurface {
    let mut surface = RenderSurface::new();
    if cfg.guide_oval {
        surface = surface.with_decoration(GuideOval {
            color: Rgba(cfg.oval_color),
            stroke: cfg.oval_stroke,
        });
    }
    surface.set_source_info(frame.source_width, frame.source_height, frame.mirrored);

    for detection in &frame.detections {
        surface.add(Arc::new(FaceBoxGraphic::new(
            detection.clone(),
            Rgba(cfg.box_color),
            cfg.box_stroke,
        )));
        surface.add(Arc::new(LandmarkGraphic::new(
            detection.clone(),
            Rgba(cfg.landmark_color),
            cfg.landmark_radius,
        )));
    }
    surface
}

/// Render the frame's annotations onto a `width` x `height` surface.
///
/// The background, if any, goes through the same crop-to-fill policy as the
/// annotations and is flipped for mirrored frames so both line up.
pub fn render_frame(
    cfg: &Config,
    frame: &FrameAnnotations,
    width: u32,
    height: u32,
    background: Option<&DynamicImage>,
) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        anyhow::bail!("surface must have a non-zero size, got {}x{}", width, height);
    }

    let surface = build_surface(cfg, frame);
    surface.on_layout(width, height);

    let base = match background {
        Some(img) => {
            let filled = img.resize_to_fill(width, height, FilterType::Triangle);
            let filled = if frame.mirrored { filled.fliph() } else { filled };
            filled.to_rgba8()
        }
        None => RgbaImage::new(width, height),
    };

    let mut canvas = ImageCanvas::from_image(base);
    let report = surface.redraw(&mut canvas);
    if let Err(e) = surface.transform_status() {
        warn!("annotations drawn unmapped: {}", e);
    }
    info!(
        "Rendered {} detection(s) onto {}x{}: {} graphic(s) drawn, {} failed",
        frame.detections.len(),
        width,
        height,
        report.drawn,
        report.failed
    );

    Ok(canvas.into_image())
}
