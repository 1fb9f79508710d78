use thiserror::Error;

/// Failures surfaced by the audio pipeline. Each renders as a short message
/// suitable for display next to the play control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("credential missing")]
    CredentialMissing,
    #[error("{0}")]
    Transport(String),
    #[error("no audio data received")]
    NoAudioData,
    #[error("audio output unavailable: {0}")]
    Output(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Decode,
    Output,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::CredentialMissing => ErrorKind::Configuration,
            PipelineError::Transport(_) => ErrorKind::Transport,
            PipelineError::NoAudioData => ErrorKind::Decode,
            PipelineError::Output(_) => ErrorKind::Output,
        }
    }

    /// A missing credential needs operator intervention; a user retry cannot
    /// fix it.
    pub fn is_retryable(&self) -> bool {
        self.kind() != ErrorKind::Configuration
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("bar count must be > 0")]
    NoBars,
    #[error("{name} must be > 0, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("grid strength must be in (0, 1], got {0}")]
    Strength(f64),
    #[error("FFT size must be a power of 2 in [32, 32768], got {0}")]
    FftSize(usize),
    #[error("analyser smoothing must be in [0, 1], got {0}")]
    Smoothing(f64),
    #[error("analyser decibel range is empty: min {min} >= max {max}")]
    DecibelRange { min: f64, max: f64 },
    #[error("invalid config JSON: {0}")]
    Json(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_readout_copy() {
        assert_eq!(PipelineError::CredentialMissing.to_string(), "credential missing");
        assert_eq!(PipelineError::NoAudioData.to_string(), "no audio data received");
        assert_eq!(
            PipelineError::Transport("connection reset".into()).to_string(),
            "connection reset"
        );
    }

    #[test]
    fn only_configuration_is_fatal() {
        assert!(!PipelineError::CredentialMissing.is_retryable());
        assert!(PipelineError::NoAudioData.is_retryable());
        assert!(PipelineError::Transport(String::new()).is_retryable());
        assert_eq!(PipelineError::Output("x".into()).kind(), ErrorKind::Output);
    }
}
