//! Demo configuration and its defaults.
//!
//! Every value has a default matching the live site. The host page may
//! override any subset through JSON; omitted fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Sample rate of the speech payload and of every buffer the pipeline plays.
pub const SAMPLE_RATE_HZ: u32 = 24_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub source: SourceMode,
    pub synthesis: SynthesisConfig,
    pub analyser: AnalyserConfig,
    pub waveform: WaveformStyle,
    pub grid: GridParams,
}

/// Where the demo player gets its audio from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Locally generated placeholder call, no network.
    Mock,
    /// Remote text-to-speech of the scripted call.
    #[default]
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub endpoint: String,
    pub model: String,
    /// Never serialised back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub locale: String,
    pub speakers: [SpeakerVoice; 2],
    /// Seconds of placeholder audio used in mock mode.
    pub placeholder_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerVoice {
    pub speaker: String,
    pub voice: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.5-flash-preview-tts".to_string(),
            api_key: build_env_api_key(),
            locale: "en-GB".to_string(),
            speakers: [
                SpeakerVoice {
                    speaker: "Caller".to_string(),
                    voice: "Puck".to_string(),
                },
                SpeakerVoice {
                    speaker: "Receptionist".to_string(),
                    voice: "Kore".to_string(),
                },
            ],
            placeholder_seconds: 10.0,
        }
    }
}

impl SynthesisConfig {
    pub fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    /// The credential, if one is configured and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Credential baked in at build time, the same way the site's bundler
/// injects it.
fn build_env_api_key() -> Option<String> {
    option_env!("GEMINI_API_KEY").map(str::to_string)
}

/// Frequency analysis settings, mirroring an `AnalyserNode`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    pub fft_size: usize,
    pub smoothing: f64,
    pub min_decibels: f64,
    pub max_decibels: f64,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformStyle {
    pub bars: usize,
    pub gap: f64,
    pub min_bar_height: f64,
    pub idle_bar_height: f64,
    pub active_radius: f64,
    pub idle_radius: f64,
    /// Share of the surface height a full-scale bin may occupy.
    pub height_scale: f64,
    pub active_color: String,
    pub idle_color: String,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        Self {
            bars: 40,
            gap: 2.0,
            min_bar_height: 4.0,
            idle_bar_height: 10.0,
            active_radius: 4.0,
            idle_radius: 5.0,
            height_scale: 0.8,
            active_color: "#f97316".to_string(),
            idle_color: "rgba(100, 116, 139, 0.3)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub spacing: f64,
    /// Segment length along each line.
    pub step: f64,
    pub influence_radius: f64,
    /// Fraction of `spacing` a vertex may move at most.
    pub strength: f64,
    pub line_color: String,
    pub line_width: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            spacing: 40.0,
            step: 10.0,
            influence_radius: 200.0,
            strength: 0.4,
            line_color: "rgba(0, 0, 0, 0.05)".to_string(),
            line_width: 1.0,
        }
    }
}

impl GridParams {
    pub fn max_displacement(&self) -> f64 {
        self.spacing * self.strength
    }
}

impl DemoConfig {
    /// Parse a (possibly partial) JSON override and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: DemoConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        if config.synthesis.api_key.is_none() {
            config.synthesis.api_key = build_env_api_key();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waveform.bars == 0 {
            return Err(ConfigError::NoBars);
        }
        positive("grid.spacing", self.grid.spacing)?;
        positive("grid.step", self.grid.step)?;
        positive("grid.influence_radius", self.grid.influence_radius)?;
        positive("synthesis.placeholder_seconds", self.synthesis.placeholder_seconds)?;
        if !(self.grid.strength > 0.0 && self.grid.strength <= 1.0) {
            return Err(ConfigError::Strength(self.grid.strength));
        }
        let fft = self.analyser.fft_size;
        if !fft.is_power_of_two() || !(32..=32_768).contains(&fft) {
            return Err(ConfigError::FftSize(fft));
        }
        let AnalyserConfig {
            smoothing,
            min_decibels: min,
            max_decibels: max,
            ..
        } = self.analyser;
        if !(0.0..=1.0).contains(&smoothing) {
            return Err(ConfigError::Smoothing(smoothing));
        }
        if !(min < max) {
            return Err(ConfigError::DecibelRange { min, max });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
