//! Full-viewport line grid that bends away from the pointer.
//!
//! Every line is traced as short segments so each vertex can be displaced on
//! its own. Nothing is cached between frames: the cost is
//! O(lines x samples per line), a few hundred points on a typical screen.

use glam::DVec2;

use crate::config::GridParams;
use crate::surface::{DrawTarget, Viewport};

/// Offset applied to a grid vertex by a pointer at `pointer`.
///
/// Zero at or beyond the influence radius; `spacing * strength` at the
/// pointer itself, where the push is straight up.
pub fn displacement(vertex: DVec2, pointer: DVec2, params: &GridParams) -> DVec2 {
    let radius = params.influence_radius;
    let delta = vertex - pointer;
    let distance = delta.length();
    if distance >= radius {
        return DVec2::ZERO;
    }
    let force = (radius - distance) / radius;
    let direction = if distance > 0.0 {
        delta / distance
    } else {
        DVec2::NEG_Y
    };
    direction * force * params.max_displacement()
}

pub struct GridBackground {
    params: GridParams,
    viewport: Viewport,
    pointer: Option<DVec2>,
    scratch: Vec<DVec2>,
}

impl GridBackground {
    pub fn new(params: GridParams, viewport: Viewport) -> Self {
        Self {
            params,
            viewport,
            pointer: None,
            scratch: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Latest pointer position in canvas CSS pixels. Overwrites the previous.
    pub fn set_pointer(&mut self, position: DVec2) {
        self.pointer = Some(position);
    }

    pub fn pointer(&self) -> Option<DVec2> {
        self.pointer
    }

    /// Paint one frame. Skipped entirely for a zero-sized viewport.
    pub fn render<S: DrawTarget>(&mut self, surface: &mut S) {
        surface.clear();
        if self.viewport.is_empty() {
            return;
        }
        let Viewport { width, height, .. } = self.viewport;
        let spacing = self.params.spacing;

        let mut x = 0.0;
        while x <= width {
            self.trace(DVec2::new(x, 0.0), DVec2::Y, height);
            surface.stroke_polyline(&self.scratch, &self.params.line_color, self.params.line_width);
            x += spacing;
        }

        let mut y = 0.0;
        while y <= height {
            self.trace(DVec2::new(0.0, y), DVec2::X, width);
            surface.stroke_polyline(&self.scratch, &self.params.line_color, self.params.line_width);
            y += spacing;
        }
    }

    /// Fill `scratch` with the displaced vertices of one line.
    fn trace(&mut self, origin: DVec2, along: DVec2, length: f64) {
        self.scratch.clear();
        let mut t = 0.0;
        while t <= length {
            let vertex = origin + along * t;
            let offset = match self.pointer {
                Some(pointer) => displacement(vertex, pointer, &self.params),
                None => DVec2::ZERO,
            };
            self.scratch.push(vertex + offset);
            t += self.params.step;
        }
    }
}
