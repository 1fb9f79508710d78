//! Software frequency analyser with `AnalyserNode` byte-output semantics.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::config::AnalyserConfig;

pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyser {
    pub fn new(config: AnalyserConfig) -> Self {
        let size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self {
            window: (0..size).map(|i| blackman_window(i, size)).collect(),
            scratch: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; size / 2],
            fft,
            config,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Forget smoothing history, e.g. after a seek.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// Analyse the `fft_size` samples ending at `end` (zero-padded at the
    /// start of the buffer) and write one byte magnitude per bin into `out`.
    pub fn analyse(&mut self, samples: &[f32], end: usize, out: &mut [u8]) {
        let size = self.config.fft_size;
        let end = end.min(samples.len());
        let start = end.saturating_sub(size);
        let pad = size - (end - start);

        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { samples[start + i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let tau = self.config.smoothing as f32;
        let min_db = self.config.min_decibels;
        let range = self.config.max_decibels - min_db;
        for (k, (smoothed, bin)) in self.smoothed.iter_mut().zip(&self.scratch).enumerate() {
            let magnitude = bin.norm() / size as f32;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
            if let Some(byte) = out.get_mut(k) {
                *byte = to_byte(*smoothed, min_db, range);
            }
        }
    }
}

fn to_byte(magnitude: f32, min_db: f64, range: f64) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * (magnitude as f64).log10();
    let scaled = (255.0 / range) * (db - min_db);
    scaled.clamp(0.0, 255.0) as u8
}

/// Blackman window, as used by `AnalyserNode`.
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsmoothed() -> AnalyserConfig {
        AnalyserConfig {
            smoothing: 0.0,
            ..AnalyserConfig::default()
        }
    }

    #[test]
    fn test_blackman_window() {
        let size = 256;
        assert!(blackman_window(0, size).abs() < 1e-6);
        assert!((blackman_window(size / 2, size) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn silence_is_zero() {
        let mut analyser = SpectrumAnalyser::new(AnalyserConfig::default());
        let mut out = vec![7u8; analyser.bin_count()];
        analyser.analyse(&[0.0; 1024], 1024, &mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let config = unsmoothed();
        let rate = 24_000.0;
        let bin = 20;
        let freq = bin as f32 * rate / config.fft_size as f32;
        let samples: Vec<f32> = (0..2048)
            .map(|n| 0.01 * (2.0 * PI * freq * n as f32 / rate).sin())
            .collect();

        let mut analyser = SpectrumAnalyser::new(config);
        let mut out = vec![0u8; analyser.bin_count()];
        analyser.analyse(&samples, 1024, &mut out);

        let peak = (0..out.len()).max_by_key(|&k| out[k]).unwrap();
        assert_eq!(peak, bin);
        assert!(out[bin] > out[bin + 1]);
        assert!(out[bin] > out[60]);
    }

    #[test]
    fn short_history_is_zero_padded() {
        let mut analyser = SpectrumAnalyser::new(unsmoothed());
        let mut out = vec![0u8; analyser.bin_count()];
        analyser.analyse(&[0.5; 10], 10, &mut out);
        analyser.analyse(&[0.5; 10], 0, &mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn smoothing_decays_towards_silence() {
        let mut analyser = SpectrumAnalyser::new(AnalyserConfig::default());
        let loud: Vec<f32> = (0..256).map(|n| (n as f32 * 0.3).sin()).collect();
        let mut first = vec![0u8; analyser.bin_count()];
        let mut later = vec![0u8; analyser.bin_count()];
        for _ in 0..4 {
            analyser.analyse(&loud, 256, &mut first);
        }
        analyser.analyse(&[0.0; 256], 256, &mut later);
        let total = |bins: &[u8]| bins.iter().map(|&b| b as u32).sum::<u32>();
        assert!(total(&later) > 0);
        assert!(total(&later) < total(&first));
        analyser.reset();
        analyser.analyse(&[0.0; 256], 256, &mut later);
        assert!(later.iter().all(|&b| b == 0));
    }
}
