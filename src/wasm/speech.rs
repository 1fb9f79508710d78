use gloo_net::http::Request;

use crate::config::{DemoConfig, SourceMode, SynthesisConfig};
use crate::error::PipelineError;
use crate::pcm::PcmBuffer;
use crate::placeholder;
use crate::synthesis::{self, SynthesisRequest};

fn transport(e: gloo_net::Error) -> PipelineError {
    PipelineError::Transport(e.to_string())
}

/// Fetch and decode the scripted call. One attempt, no retry.
pub async fn fetch_sample_call(config: &SynthesisConfig) -> Result<PcmBuffer, PipelineError> {
    let key = synthesis::require_credential(config)?;
    let body = SynthesisRequest::for_sample_call(config);

    let response = Request::post(&config.url())
        .header("x-goog-api-key", key)
        .json(&body)
        .map_err(transport)?
        .send()
        .await
        .map_err(transport)?;

    if !response.ok() {
        return Err(PipelineError::Transport(format!(
            "speech synthesis failed with status {}",
            response.status()
        )));
    }
    let text = response.text().await.map_err(transport)?;
    synthesis::decode_response(&text)
}

/// Audio for the demo player, from whichever source is configured.
pub async fn acquire(config: &DemoConfig) -> Result<PcmBuffer, PipelineError> {
    match config.source {
        SourceMode::Mock => Ok(placeholder::sample_call(config.synthesis.placeholder_seconds)),
        SourceMode::Remote => {
            log::info!("requesting speech from {}", config.synthesis.model);
            fetch_sample_call(&config.synthesis).await
        }
    }
}
