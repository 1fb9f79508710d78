//! Locally generated stand-in for the sample call, used when the demo runs
//! without remote synthesis.
//!
//! Two alternating "voices" at different pitches, each a few harmonics under
//! a syllable-rate envelope, with short pauses between turns. Deterministic,
//! so the visualiser looks the same on every load.

use std::f64::consts::TAU;

use crate::config::SAMPLE_RATE_HZ;
use crate::pcm::PcmBuffer;

const TURN_SECONDS: f64 = 2.5;
const PAUSE_SECONDS: f64 = 0.3;
const SYLLABLE_HZ: f64 = 4.0;
const VOICE_PITCH_HZ: [f64; 2] = [210.0, 125.0];
const HARMONIC_GAINS: [f64; 4] = [1.0, 0.5, 0.3, 0.15];

pub fn sample_call(seconds: f64) -> PcmBuffer {
    let total = (seconds.max(0.0) * SAMPLE_RATE_HZ as f64) as usize;
    let rate = SAMPLE_RATE_HZ as f64;
    let norm: f64 = HARMONIC_GAINS.iter().sum();

    let samples = (0..total)
        .map(|n| {
            let t = n as f64 / rate;
            let turn = (t / TURN_SECONDS) as usize;
            let in_turn = t - turn as f64 * TURN_SECONDS;
            if in_turn > TURN_SECONDS - PAUSE_SECONDS {
                return 0.0;
            }
            let pitch = VOICE_PITCH_HZ[turn % 2] * (1.0 + 0.05 * (TAU * 0.7 * t).sin());
            let envelope = (TAU * SYLLABLE_HZ * in_turn / 2.0).sin().abs().powf(0.6);
            let tone: f64 = HARMONIC_GAINS
                .iter()
                .enumerate()
                .map(|(h, gain)| gain * (TAU * pitch * (h + 1) as f64 * t).sin())
                .sum();
            (0.6 * envelope * tone / norm) as f32
        })
        .collect();

    PcmBuffer::new(samples, SAMPLE_RATE_HZ)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_and_range() {
        let buffer = sample_call(1.0);
        assert_eq!(buffer.len(), SAMPLE_RATE_HZ as usize);
        assert_eq!(buffer.duration(), 1.0);
        assert!(buffer.samples().iter().all(|s| (-1.0..1.0).contains(s)));
        assert!(buffer.samples().iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn pauses_between_turns_are_silent() {
        let buffer = sample_call(3.0);
        let i = buffer.index_at(TURN_SECONDS - PAUSE_SECONDS / 2.0);
        assert_eq!(buffer.samples()[i], 0.0);
    }

    #[test]
    fn deterministic() {
        assert_eq!(sample_call(0.5), sample_call(0.5));
    }
}
