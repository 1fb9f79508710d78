//! Drawing seam shared by the two canvas renderers.

use glam::DVec2;

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A 2D drawing surface measured in CSS pixels.
pub trait DrawTarget {
    fn size(&self) -> (f64, f64);
    fn clear(&mut self);
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: &str);
    fn stroke_polyline(&mut self, points: &[DVec2], color: &str, width: f64);
}

/// CSS size plus device pixel ratio of a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 },
        }
    }

    /// Backing-store size in device pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round() as u32,
            (self.height * self.pixel_ratio).round() as u32,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
