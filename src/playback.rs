//! Playback state machine for the demo call.
//!
//! `AudioPipeline` owns the decoded buffer, the cursor and an `AudioOutput`
//! (the audio engine handle). Acquiring audio is split in two: `request_play`
//! hands out a `SynthesisTicket` and enters `Loading`; whoever fetches the
//! audio reports back through `complete_synthesis`. This keeps the pipeline
//! synchronous and lets one frame callback drive it through `tick`.

use std::cell::Cell;
use std::rc::Rc;

use crate::analyser::SpectrumAnalyser;
use crate::config::AnalyserConfig;
use crate::error::PipelineError;
use crate::pcm::PcmBuffer;

/// Slack allowed when deciding the buffer has finished playing.
pub const COMPLETION_EPSILON: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Errored,
}

/// Elapsed offset into the buffer, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackCursor {
    pub offset: f64,
}

/// One byte magnitude per analyser bin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencySnapshot {
    bins: Vec<u8>,
}

impl FrequencySnapshot {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    /// Full analyser bin count; only the lower half is drawn.
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeCode {
    pub elapsed: f64,
    pub duration: f64,
}

/// Identifies one load attempt so that late results from an abandoned
/// attempt are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    Resumed,
    Paused,
    /// Audio must be fetched; report it with `complete_synthesis`.
    Loading(SynthesisTicket),
    Ignored,
}

/// The audio engine a pipeline plays through.
pub trait AudioOutput {
    /// Output clock in seconds.
    fn now(&self) -> f64;
    /// Begin playing `buffer` from `offset` seconds, replacing anything
    /// already playing.
    fn start(&mut self, buffer: &PcmBuffer, offset: f64) -> Result<(), PipelineError>;
    fn stop(&mut self);
    fn bin_count(&self) -> usize;
    /// Fill `bins` with the current byte frequency magnitudes.
    fn frequencies(&mut self, bins: &mut [u8]);
    /// Release the engine. Called once when the pipeline is dropped.
    fn close(&mut self) {}
}

pub struct AudioPipeline<O: AudioOutput> {
    output: O,
    state: PlaybackState,
    buffer: Option<PcmBuffer>,
    cursor: PlaybackCursor,
    started_at: f64,
    generation: u64,
    error: Option<PipelineError>,
    snapshot: FrequencySnapshot,
}

impl<O: AudioOutput> AudioPipeline<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            state: PlaybackState::Idle,
            buffer: None,
            cursor: PlaybackCursor::default(),
            started_at: 0.0,
            generation: 0,
            error: None,
            snapshot: FrequencySnapshot::default(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Message for the last failed attempt, while `Errored`.
    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    pub fn buffer(&self) -> Option<&PcmBuffer> {
        self.buffer.as_ref()
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// False once a configuration error has ended the session.
    pub fn can_retry(&self) -> bool {
        self.error.as_ref().map_or(true, PipelineError::is_retryable)
    }

    pub fn request_play(&mut self) -> PlayOutcome {
        match self.state {
            PlaybackState::Playing | PlaybackState::Loading => {
                log::debug!("play requested while {:?}, ignoring", self.state);
                PlayOutcome::Ignored
            }
            PlaybackState::Paused => self.resume(),
            PlaybackState::Errored if !self.can_retry() => {
                log::debug!("play requested after a fatal error, ignoring");
                PlayOutcome::Ignored
            }
            PlaybackState::Idle | PlaybackState::Errored => {
                if self.buffer.is_some() {
                    self.start_from(0.0);
                    if self.state == PlaybackState::Playing {
                        return PlayOutcome::Started;
                    }
                    return PlayOutcome::Ignored;
                }
                self.generation += 1;
                self.error = None;
                self.set_state(PlaybackState::Loading);
                PlayOutcome::Loading(SynthesisTicket(self.generation))
            }
        }
    }

    /// Deliver the result of a load attempt. Returns false when the attempt
    /// was abandoned (reset, or superseded) and the result was discarded.
    pub fn complete_synthesis(
        &mut self,
        ticket: SynthesisTicket,
        result: Result<PcmBuffer, PipelineError>,
    ) -> bool {
        if ticket.0 != self.generation || self.state != PlaybackState::Loading {
            log::debug!("dropping stale synthesis result {:?}", ticket);
            return false;
        }
        match result {
            Ok(buffer) if buffer.is_empty() => self.fail(PipelineError::NoAudioData),
            Ok(buffer) => {
                log::info!("audio ready: {:.2}s", buffer.duration());
                self.buffer = Some(buffer);
                self.start_from(0.0);
            }
            Err(e) => self.fail(e),
        }
        true
    }

    pub fn pause(&mut self) -> PlayOutcome {
        if self.state != PlaybackState::Playing {
            return PlayOutcome::Ignored;
        }
        self.cursor.offset = self.elapsed().min(self.duration());
        self.output.stop();
        self.set_state(PlaybackState::Paused);
        PlayOutcome::Paused
    }

    pub fn resume(&mut self) -> PlayOutcome {
        if self.state != PlaybackState::Paused {
            return PlayOutcome::Ignored;
        }
        self.start_from(self.cursor.offset);
        if self.state == PlaybackState::Playing {
            PlayOutcome::Resumed
        } else {
            PlayOutcome::Ignored
        }
    }

    /// Single-button control: play, pause or resume depending on state.
    /// Presses while `Loading`, or after a non-retryable error, are ignored.
    pub fn toggle(&mut self) -> PlayOutcome {
        match self.state {
            PlaybackState::Playing => self.pause(),
            _ => self.request_play(),
        }
    }

    /// Drop the buffer and cursor; the next play re-acquires audio.
    pub fn reset(&mut self) {
        if self.state == PlaybackState::Playing {
            self.output.stop();
        }
        self.buffer = None;
        self.cursor = PlaybackCursor::default();
        self.generation += 1;
        self.error = None;
        self.set_state(PlaybackState::Idle);
    }

    /// Per-frame update: detect completion and refresh the snapshot.
    pub fn tick(&mut self) -> TimeCode {
        if self.state == PlaybackState::Playing {
            if self.elapsed() + COMPLETION_EPSILON >= self.duration() {
                self.output.stop();
                self.cursor = PlaybackCursor::default();
                self.set_state(PlaybackState::Idle);
            } else {
                let bins = self.output.bin_count();
                self.snapshot.bins.resize(bins, 0);
                self.output.frequencies(&mut self.snapshot.bins);
            }
        }
        self.time_code()
    }

    /// The latest snapshot, only while `Playing`.
    pub fn sample_frequencies(&self) -> Option<&FrequencySnapshot> {
        match self.state {
            PlaybackState::Playing => Some(&self.snapshot),
            _ => None,
        }
    }

    pub fn time_code(&self) -> TimeCode {
        let duration = self.duration();
        TimeCode {
            elapsed: self.elapsed().clamp(0.0, duration),
            duration,
        }
    }

    fn duration(&self) -> f64 {
        self.buffer.as_ref().map_or(0.0, PcmBuffer::duration)
    }

    fn elapsed(&self) -> f64 {
        match self.state {
            PlaybackState::Playing => self.cursor.offset + (self.output.now() - self.started_at),
            _ => self.cursor.offset,
        }
    }

    fn start_from(&mut self, offset: f64) {
        let Some(buffer) = self.buffer.as_ref() else {
            return;
        };
        if let Err(e) = self.output.start(buffer, offset) {
            self.fail(e);
            return;
        }
        self.started_at = self.output.now();
        self.cursor.offset = offset;
        self.set_state(PlaybackState::Playing);
    }

    fn fail(&mut self, error: PipelineError) {
        log::warn!("playback failed: {error}");
        self.error = Some(error);
        self.set_state(PlaybackState::Errored);
    }

    fn set_state(&mut self, next: PlaybackState) {
        if self.state != next {
            log::debug!("playback {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

impl<O: AudioOutput> Drop for AudioPipeline<O> {
    fn drop(&mut self) {
        if self.state == PlaybackState::Playing {
            self.output.stop();
        }
        self.output.close();
    }
}

/// An output with a manually advanced clock and a software analyser. Plays
/// nothing audible; used off-browser and in tests.
pub struct OfflineOutput {
    clock: f64,
    analyser: SpectrumAnalyser,
    bin_count: usize,
    current: Option<OfflinePlayback>,
    starts: usize,
    fail_next_start: Option<String>,
    monitor: OutputMonitor,
}

/// Shared view of an [`OfflineOutput`]'s lifecycle that stays readable after
/// the output has been moved into, and dropped with, a pipeline.
#[derive(Debug, Clone, Default)]
pub struct OutputMonitor {
    playing: Rc<Cell<bool>>,
    closed: Rc<Cell<bool>>,
}

impl OutputMonitor {
    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

struct OfflinePlayback {
    buffer: PcmBuffer,
    offset: f64,
    started: f64,
}

impl OfflineOutput {
    pub fn new(config: AnalyserConfig) -> Self {
        Self {
            clock: 0.0,
            analyser: SpectrumAnalyser::new(config),
            bin_count: config.bin_count(),
            current: None,
            starts: 0,
            fail_next_start: None,
            monitor: OutputMonitor::default(),
        }
    }

    pub fn advance(&mut self, seconds: f64) {
        self.clock += seconds;
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// Offset the output was last started from.
    pub fn last_start_offset(&self) -> Option<f64> {
        self.current.as_ref().map(|p| p.offset)
    }

    pub fn start_count(&self) -> usize {
        self.starts
    }

    pub fn is_closed(&self) -> bool {
        self.monitor.is_closed()
    }

    pub fn monitor(&self) -> OutputMonitor {
        self.monitor.clone()
    }

    /// Make the next `start` fail, as a browser refusing playback would.
    pub fn fail_next_start(&mut self, message: impl Into<String>) {
        self.fail_next_start = Some(message.into());
    }
}

impl Default for OfflineOutput {
    fn default() -> Self {
        Self::new(AnalyserConfig::default())
    }
}

impl AudioOutput for OfflineOutput {
    fn now(&self) -> f64 {
        self.clock
    }

    fn start(&mut self, buffer: &PcmBuffer, offset: f64) -> Result<(), PipelineError> {
        if let Some(message) = self.fail_next_start.take() {
            return Err(PipelineError::Output(message));
        }
        self.starts += 1;
        self.analyser.reset();
        self.current = Some(OfflinePlayback {
            buffer: buffer.clone(),
            offset,
            started: self.clock,
        });
        self.monitor.playing.set(true);
        Ok(())
    }

    fn stop(&mut self) {
        self.current = None;
        self.monitor.playing.set(false);
    }

    fn bin_count(&self) -> usize {
        self.bin_count
    }

    fn frequencies(&mut self, bins: &mut [u8]) {
        match &self.current {
            Some(playback) => {
                let position = playback.offset + (self.clock - playback.started);
                let end = playback.buffer.index_at(position);
                self.analyser.analyse(playback.buffer.samples(), end, bins);
            }
            None => bins.fill(0),
        }
    }

    fn close(&mut self) {
        self.stop();
        self.monitor.closed.set(true);
    }
}
