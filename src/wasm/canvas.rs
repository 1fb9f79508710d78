use glam::DVec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::surface::{DrawTarget, Rect, Viewport};

/// A 2D canvas whose backing store tracks the device pixel ratio while
/// drawing happens in CSS pixels.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    viewport: Viewport,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("2D canvas not supported")?
            .dyn_into()?;
        Ok(Self {
            canvas,
            ctx,
            viewport: Viewport::new(0.0, 0.0, 1.0),
        })
    }

    /// Resize the backing store and reset the transform so one drawing unit
    /// is one CSS pixel.
    pub fn fit(&mut self, viewport: Viewport) -> Result<(), JsValue> {
        let (width, height) = viewport.pixel_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let ratio = viewport.pixel_ratio;
        self.ctx.set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)?;
        self.viewport = viewport;
        Ok(())
    }

    /// Fit to the canvas element's laid-out size.
    pub fn fit_to_element(&mut self) -> Result<(), JsValue> {
        let rect = self.canvas.get_bounding_client_rect();
        let ratio = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        self.fit(Viewport::new(rect.width(), rect.height(), ratio))
    }

    fn rounded_rect_path(&self, rect: Rect, radius: f64) -> Result<(), JsValue> {
        let Rect {
            x,
            y,
            width: w,
            height: h,
        } = rect;
        let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
        let ctx = &self.ctx;
        ctx.begin_path();
        ctx.move_to(x + r, y);
        ctx.arc_to(x + w, y, x + w, y + h, r)?;
        ctx.arc_to(x + w, y + h, x, y + h, r)?;
        ctx.arc_to(x, y + h, x, y, r)?;
        ctx.arc_to(x, y, x + w, y, r)?;
        ctx.close_path();
        Ok(())
    }
}

impl DrawTarget for CanvasSurface {
    fn size(&self) -> (f64, f64) {
        (self.viewport.width, self.viewport.height)
    }

    fn clear(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
    }

    #[allow(deprecated)]
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: &str) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        self.ctx.set_fill_style(&JsValue::from_str(color));
        match self.rounded_rect_path(rect, radius) {
            Ok(()) => self.ctx.fill(),
            Err(e) => log::warn!("rounded rect failed: {:?}", e),
        }
    }

    #[allow(deprecated)]
    fn stroke_polyline(&mut self, points: &[DVec2], color: &str, width: f64) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.set_stroke_style(&JsValue::from_str(color));
        self.ctx.set_line_width(width);
        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for point in rest {
            self.ctx.line_to(point.x, point.y);
        }
        self.ctx.stroke();
    }
}
