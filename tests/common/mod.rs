#![allow(dead_code)]

use glam::DVec2;
use tradecall_viz::surface::{DrawTarget, Rect};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Clear,
    Rect { rect: Rect, radius: f64, color: String },
    Line { points: Vec<DVec2>, color: String, width: f64 },
}

/// Records every draw call instead of painting.
pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<Op>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn rects(&self) -> Vec<(Rect, &str)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Rect { rect, color, .. } => Some((*rect, color.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<&[DVec2]> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Line { points, .. } => Some(points.as_slice()),
                _ => None,
            })
            .collect()
    }
}

impl DrawTarget for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(Op::Clear);
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: &str) {
        self.ops.push(Op::Rect {
            rect,
            radius,
            color: color.to_string(),
        });
    }

    fn stroke_polyline(&mut self, points: &[DVec2], color: &str, width: f64) {
        self.ops.push(Op::Line {
            points: points.to_vec(),
            color: color.to_string(),
            width,
        });
    }
}
