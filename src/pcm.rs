//! Mono PCM buffers and the 16-bit little-endian decoder.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::PipelineError;

/// Decoded mono samples in [-1, 1). Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Index of the sample playing at `seconds`, clamped to the buffer.
    pub fn index_at(&self, seconds: f64) -> usize {
        let idx = (seconds.max(0.0) * self.sample_rate as f64) as usize;
        idx.min(self.samples.len())
    }
}

/// Interpret `bytes` as signed 16-bit little-endian samples and normalise each
/// by 32768. A trailing odd byte is ignored.
pub fn decode_pcm16le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Decode a base64 payload of 16-bit PCM into a buffer at `sample_rate`.
pub fn decode_base64_pcm(payload: &str, sample_rate: u32) -> Result<PcmBuffer, PipelineError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(PipelineError::NoAudioData);
    }
    let bytes = STANDARD.decode(payload).map_err(|e| {
        log::warn!("audio payload is not valid base64: {e}");
        PipelineError::NoAudioData
    })?;
    let samples = decode_pcm16le(&bytes);
    if samples.is_empty() {
        return Err(PipelineError::NoAudioData);
    }
    log::debug!("decoded {} samples at {} Hz", samples.len(), sample_rate);
    Ok(PcmBuffer::new(samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_extremes_exactly() {
        let bytes = [0x00, 0x80, 0xff, 0x7f, 0x00, 0x00, 0xff, 0xff];
        let samples = decode_pcm16le(&bytes);
        assert_eq!(samples, vec![-1.0, 32767.0 / 32768.0, 0.0, -1.0 / 32768.0]);
    }

    #[test]
    fn every_sample_matches_raw_value() {
        let raw: Vec<i16> = (-40..40).map(|i| i * 811).collect();
        let bytes: Vec<u8> = raw.iter().flat_map(|s| s.to_le_bytes()).collect();
        let samples = decode_pcm16le(&bytes);
        assert_eq!(samples.len(), raw.len());
        for (s, r) in samples.iter().zip(&raw) {
            assert_eq!(*s, *r as f32 / 32768.0);
            assert!((-1.0..1.0).contains(s));
        }
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        assert_eq!(decode_pcm16le(&[0x01, 0x00, 0x7f]).len(), 1);
        assert!(decode_pcm16le(&[0x7f]).is_empty());
    }

    #[test]
    fn base64_payloads() {
        // two samples: 1 and -2
        let buffer = decode_base64_pcm("AQD+/w==", 24_000).unwrap();
        assert_eq!(buffer.samples(), &[1.0 / 32768.0, -2.0 / 32768.0]);
        assert_eq!(buffer.sample_rate(), 24_000);

        assert_eq!(decode_base64_pcm("", 24_000), Err(PipelineError::NoAudioData));
        assert_eq!(decode_base64_pcm("AA==", 24_000), Err(PipelineError::NoAudioData));
        assert_eq!(decode_base64_pcm("@@@", 24_000), Err(PipelineError::NoAudioData));
    }

    #[test]
    fn duration_and_index() {
        let buffer = PcmBuffer::new(vec![0.0; 48_000], 24_000);
        assert_eq!(buffer.duration(), 2.0);
        assert_eq!(buffer.index_at(1.0), 24_000);
        assert_eq!(buffer.index_at(5.0), 48_000);
        assert_eq!(buffer.index_at(-1.0), 0);
    }
}
