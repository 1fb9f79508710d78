//! Bar-chart visualisation of the pipeline's frequency feed.

use crate::config::WaveformStyle;
use crate::playback::{AudioOutput, AudioPipeline, FrequencySnapshot, TimeCode};
use crate::surface::{DrawTarget, Rect};

/// Analyser bin drawn by `bar` out of `bars`. Only the lower half of the
/// `bin_count` bins is used.
pub fn source_index(bar: usize, bars: usize, bin_count: usize) -> usize {
    if bars == 0 {
        return 0;
    }
    ((bar as f64 / bars as f64) * (bin_count as f64 / 2.0)).floor() as usize
}

pub fn bar_height(magnitude: u8, surface_height: f64, style: &WaveformStyle) -> f64 {
    let scaled = (magnitude as f64 / 255.0) * surface_height * style.height_scale;
    scaled.max(style.min_bar_height)
}

/// `MM:SS / MM:SS`, elapsed clamped to the duration.
pub fn format_time_code(time: TimeCode) -> String {
    let duration = time.duration.max(0.0);
    let elapsed = time.elapsed.clamp(0.0, duration);
    format!(
        "{} / {}",
        mm_ss(elapsed.floor() as u64),
        mm_ss(duration.round() as u64)
    )
}

fn mm_ss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub struct WaveformRenderer {
    style: WaveformStyle,
    time: TimeCode,
    bars: Vec<Rect>,
}

impl WaveformRenderer {
    pub fn new(style: WaveformStyle) -> Self {
        Self {
            style,
            time: TimeCode::default(),
            bars: Vec::new(),
        }
    }

    /// One animation frame: advance the pipeline, then paint.
    pub fn frame<O: AudioOutput, S: DrawTarget>(
        &mut self,
        pipeline: &mut AudioPipeline<O>,
        surface: &mut S,
    ) {
        self.time = pipeline.tick();
        self.draw(surface, pipeline.sample_frequencies());
    }

    pub fn draw<S: DrawTarget>(&mut self, surface: &mut S, snapshot: Option<&FrequencySnapshot>) {
        surface.clear();
        let (width, height) = surface.size();
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.layout(snapshot, width, height);
        let (color, radius) = match snapshot {
            Some(_) => (&self.style.active_color, self.style.active_radius),
            None => (&self.style.idle_color, self.style.idle_radius),
        };
        for bar in &self.bars {
            surface.fill_rounded_rect(*bar, radius, color);
        }
    }

    /// Bar rectangles, vertically centred. `None` means idle.
    fn layout(&mut self, snapshot: Option<&FrequencySnapshot>, width: f64, height: f64) {
        let count = self.style.bars;
        let slot = width / count as f64;
        let bar_width = (slot - self.style.gap).max(0.0);
        self.bars.clear();
        for i in 0..count {
            let h = match snapshot {
                Some(snapshot) => {
                    let index = source_index(i, count, snapshot.bin_count());
                    let magnitude = snapshot.bins().get(index).copied().unwrap_or(0);
                    bar_height(magnitude, height, &self.style)
                }
                None => self.style.idle_bar_height,
            };
            self.bars.push(Rect {
                x: i as f64 * slot,
                y: (height - h) / 2.0,
                width: bar_width,
                height: h,
            });
        }
    }

    /// Bars painted by the last frame.
    pub fn bars(&self) -> &[Rect] {
        &self.bars
    }

    pub fn time_code(&self) -> TimeCode {
        self.time
    }

    pub fn readout(&self) -> String {
        format_time_code(self.time)
    }
}
