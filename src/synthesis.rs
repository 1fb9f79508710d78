//! Remote speech synthesis of the scripted sample call.
//!
//! The dialogue is fixed; only speaker voices and locale come from config.
//! The request and response bodies follow the `generateContent` JSON shape,
//! with the audio returned as base64 16-bit PCM inside the first candidate.

use serde::{Deserialize, Serialize};

use crate::config::{SynthesisConfig, SAMPLE_RATE_HZ};
use crate::error::PipelineError;
use crate::pcm::{self, PcmBuffer};

/// Which side of the call a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Caller,
    Receptionist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub role: Role,
    pub text: &'static str,
}

pub const SAMPLE_CALL: &[Line] = &[
    Line {
        role: Role::Receptionist,
        text: "Good morning, Harris Plumbing and Heating, this is the virtual assistant. How can I help?",
    },
    Line {
        role: Role::Caller,
        text: "Hiya, my boiler's stopped working and there's no hot water. Can someone come out today?",
    },
    Line {
        role: Role::Receptionist,
        text: "Sorry to hear that. Is the boiler showing a fault code, and can I take your postcode?",
    },
    Line {
        role: Role::Caller,
        text: "It's flashing F28. Postcode is SE15 4QF.",
    },
    Line {
        role: Role::Receptionist,
        text: "Thanks. Dave has a slot at two this afternoon. I'll text you a confirmation now.",
    },
    Line {
        role: Role::Caller,
        text: "Brilliant, cheers.",
    },
];

/// Render the script as the prompt text, naming each speaker as configured.
pub fn prompt(config: &SynthesisConfig) -> String {
    let [caller, receptionist] = &config.speakers;
    let mut text = format!(
        "Read this phone call aloud in a natural {} accent, between {} and {}:\n",
        config.locale, receptionist.speaker, caller.speaker
    );
    for line in SAMPLE_CALL {
        let name = match line.role {
            Role::Caller => &caller.speaker,
            Role::Receptionist => &receptionist.speaker,
        };
        text.push_str(name);
        text.push_str(": ");
        text.push_str(line.text);
        text.push('\n');
    }
    text
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    language_code: String,
    multi_speaker_voice_config: MultiSpeakerVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MultiSpeakerVoiceConfig {
    speaker_voice_configs: Vec<SpeakerVoiceConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeakerVoiceConfig {
    speaker: String,
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoice {
    voice_name: String,
}

impl SynthesisRequest {
    pub fn for_sample_call(config: &SynthesisConfig) -> Self {
        let speaker_voice_configs = config
            .speakers
            .iter()
            .map(|s| SpeakerVoiceConfig {
                speaker: s.speaker.clone(),
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoice {
                        voice_name: s.voice.clone(),
                    },
                },
            })
            .collect();
        Self {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: prompt(config),
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO"],
                speech_config: SpeechConfig {
                    language_code: config.locale.clone(),
                    multi_speaker_voice_config: MultiSpeakerVoiceConfig {
                        speaker_voice_configs,
                    },
                },
            },
        }
    }
}

/// Response envelope; only the path to the inline audio is modelled.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SynthesisResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl SynthesisResponse {
    /// First inline audio payload, if any.
    pub fn audio_payload(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.inline_data.as_ref())
            .map(|d| {
                log::debug!("inline audio {}", d.mime_type);
                d.data.as_str()
            })
            .find(|data| !data.is_empty())
    }

    pub fn into_buffer(self) -> Result<PcmBuffer, PipelineError> {
        let payload = self.audio_payload().ok_or(PipelineError::NoAudioData)?;
        pcm::decode_base64_pcm(payload, SAMPLE_RATE_HZ)
    }
}

/// Parse a raw response body into a playable buffer.
pub fn decode_response(body: &str) -> Result<PcmBuffer, PipelineError> {
    let response: SynthesisResponse = serde_json::from_str(body).map_err(|e| {
        log::warn!("synthesis response is not valid JSON: {e}");
        PipelineError::NoAudioData
    })?;
    response.into_buffer()
}

/// Fail fast when no credential is configured.
pub fn require_credential(config: &SynthesisConfig) -> Result<&str, PipelineError> {
    config.credential().ok_or(PipelineError::CredentialMissing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_names_both_speakers() {
        let config = SynthesisConfig::default();
        let body = serde_json::to_value(SynthesisRequest::for_sample_call(&config)).unwrap();
        let voices = &body["generationConfig"]["speechConfig"]["multiSpeakerVoiceConfig"]
            ["speakerVoiceConfigs"];
        assert_eq!(voices[0]["speaker"], "Caller");
        assert_eq!(voices[1]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"], "Kore");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(body["generationConfig"]["speechConfig"]["languageCode"], "en-GB");

        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert_eq!(text.lines().count(), SAMPLE_CALL.len() + 1);
        assert!(text.contains("Receptionist: Good morning"));
        assert!(text.contains("Caller: Brilliant, cheers."));
    }

    #[test]
    fn extracts_inline_audio() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"ignored"},
            {"inlineData":{"mimeType":"audio/L16;rate=24000","data":"AQD+/w=="}}
        ]}}]}"#;
        let buffer = decode_response(body).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.sample_rate(), SAMPLE_RATE_HZ);
    }

    #[test]
    fn empty_envelopes_are_no_audio() {
        for body in [
            "{}",
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":""}}]}}]}"#,
            "<html>",
        ] {
            assert_eq!(decode_response(body), Err(PipelineError::NoAudioData), "{body}");
        }
    }

    #[test]
    fn missing_credential_is_configuration_error() {
        let mut config = SynthesisConfig::default();
        config.api_key = None;
        assert_eq!(require_credential(&config), Err(PipelineError::CredentialMissing));
    }
}
