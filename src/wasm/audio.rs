use js_sys::Promise;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{AnalyserNode, AudioBufferSourceNode, AudioContext};

use crate::config::AnalyserConfig;
use crate::error::PipelineError;
use crate::pcm::PcmBuffer;
use crate::playback::AudioOutput;

struct Engine {
    ctx: AudioContext,
    analyser: AnalyserNode,
}

/// Web Audio output: source -> analyser -> destination.
///
/// The `AudioContext` is created lazily. Call [`WebAudioOutput::unlock`] from
/// the click handler so strict autoplay policies let it run; audio arriving
/// later from a fetch is then played on an already running context.
pub struct WebAudioOutput {
    config: AnalyserConfig,
    engine: Option<Engine>,
    source: Option<AudioBufferSourceNode>,
}

fn output_error(e: JsValue) -> PipelineError {
    PipelineError::Output(
        e.as_string()
            .unwrap_or_else(|| format!("{:?}", e)),
    )
}

impl WebAudioOutput {
    pub fn new(config: AnalyserConfig) -> Self {
        Self {
            config,
            engine: None,
            source: None,
        }
    }

    fn engine(&mut self) -> Result<&Engine, JsValue> {
        if self.engine.is_none() {
            let ctx = AudioContext::new()?;
            let analyser = ctx.create_analyser()?;
            analyser.set_fft_size(self.config.fft_size as u32);
            analyser.set_smoothing_time_constant(self.config.smoothing);
            // Each setter throws if it would leave min >= max.
            if self.config.min_decibels >= analyser.max_decibels() {
                analyser.set_max_decibels(self.config.max_decibels);
                analyser.set_min_decibels(self.config.min_decibels);
            } else {
                analyser.set_min_decibels(self.config.min_decibels);
                analyser.set_max_decibels(self.config.max_decibels);
            }
            analyser.connect_with_audio_node(&ctx.destination())?;
            log::info!("audio context created ({} Hz)", ctx.sample_rate());
            self.engine = Some(Engine { ctx, analyser });
        }
        self.engine.as_ref().ok_or_else(|| JsValue::from_str("no audio engine"))
    }

    /// Create the context, or resume a suspended one. Must run inside a user
    /// gesture to take effect.
    pub fn unlock(&mut self) {
        let resumed = self.engine().and_then(|engine| engine.ctx.resume());
        match resumed {
            Ok(promise) => await_resume(promise),
            Err(e) => log::warn!("audio context unavailable: {:?}", e),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.engine.is_some()
    }

    fn play(&mut self, buffer: &PcmBuffer, offset: f64) -> Result<(), JsValue> {
        self.stop();
        let engine = self.engine()?;
        // A context created outside a gesture starts suspended.
        await_resume(engine.ctx.resume()?);

        let audio = engine
            .ctx
            .create_buffer(1, buffer.len() as u32, buffer.sample_rate() as f32)?;
        let mut channel = buffer.samples().to_vec();
        audio.copy_to_channel(&mut channel, 0)?;

        let source = engine.ctx.create_buffer_source()?;
        source.set_buffer(Some(&audio));
        source.connect_with_audio_node(&engine.analyser)?;
        source.start_with_when_and_grain_offset(0.0, offset)?;
        self.source = Some(source);
        Ok(())
    }
}

fn await_resume(resumed: Promise) {
    spawn_local(async move {
        if let Err(e) = JsFuture::from(resumed).await {
            log::warn!("audio context did not resume: {:?}", e);
        }
    });
}

impl AudioOutput for WebAudioOutput {
    fn now(&self) -> f64 {
        self.engine.as_ref().map_or(0.0, |e| e.ctx.current_time())
    }

    fn start(&mut self, buffer: &PcmBuffer, offset: f64) -> Result<(), PipelineError> {
        self.play(buffer, offset).map_err(output_error)
    }

    fn stop(&mut self) {
        if let Some(source) = self.source.take() {
            source.stop().ok();
            source.disconnect().ok();
        }
    }

    fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    fn frequencies(&mut self, bins: &mut [u8]) {
        match &self.engine {
            Some(engine) => engine.analyser.get_byte_frequency_data(bins),
            None => bins.fill(0),
        }
    }

    fn close(&mut self) {
        self.stop();
        if let Some(engine) = self.engine.take() {
            engine.analyser.disconnect().ok();
            engine.ctx.close().ok();
            log::info!("audio context closed");
        }
    }
}
