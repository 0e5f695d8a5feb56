use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_ellipse_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

/// Drawing context handed to graphics and decorations.
///
/// All coordinates are surface pixels. Implementations clip anything that
/// falls outside the surface.
pub trait Canvas {
    fn size(&self) -> (u32, u32);

    /// Outline of the rectangle spanned by the two corners, in any order.
    fn stroke_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, stroke: f32, color: Rgba<u8>);

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba<u8>);

    fn stroke_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, stroke: f32, color: Rgba<u8>);
}

/// Canvas backed by an in-memory RGBA buffer
pub struct ImageCanvas {
    image: RgbaImage,
}

impl ImageCanvas {
    /// Transparent canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

fn stroke_steps(stroke: f32) -> i32 {
    (stroke.round() as i32).max(1)
}

impl Canvas for ImageCanvas {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn stroke_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, stroke: f32, color: Rgba<u8>) {
        let left = x0.min(x1).round() as i32;
        let top = y0.min(y1).round() as i32;
        let width = (x0 - x1).abs().round() as i32;
        let height = (y0 - y1).abs().round() as i32;

        // Inset one pixel per stroke step
        for i in 0..stroke_steps(stroke) {
            let w = width - 2 * i;
            let h = height - 2 * i;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(left + i, top + i).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut self.image, rect, color);
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
        let radius = (radius.round() as i32).max(1);
        draw_filled_circle_mut(
            &mut self.image,
            (cx.round() as i32, cy.round() as i32),
            radius,
            color,
        );
    }

    fn stroke_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, stroke: f32, color: Rgba<u8>) {
        let center = (cx.round() as i32, cy.round() as i32);
        let rx = rx.round() as i32;
        let ry = ry.round() as i32;
        for i in 0..stroke_steps(stroke) {
            if rx - i <= 0 || ry - i <= 0 {
                break;
            }
            draw_hollow_ellipse_mut(&mut self.image, center, rx - i, ry - i, color);
        }
    }
}
