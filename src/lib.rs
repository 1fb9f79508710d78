#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Audio demo player and reactive background grid for the landing page.
//!
//! Everything outside `wasm` is plain Rust and runs on the host; the `wasm`
//! module binds it to the DOM, canvas and Web Audio.

pub mod analyser;
pub mod config;
pub mod error;
pub mod grid;
pub mod pcm;
pub mod placeholder;
pub mod playback;
pub mod roi;
pub mod surface;
pub mod synthesis;
pub mod waveform;

pub use config::DemoConfig;
pub use error::PipelineError;
pub use playback::{AudioPipeline, PlaybackState};

// Only compile wasm-specific code when targeting wasm32.
#[cfg(target_arch = "wasm32")]
pub mod wasm;
