use crate::error::VoiceError;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;

/// Maximum text input size for synthesis (64 KiB). Prevents resource
/// exhaustion from oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Default bounded wait for the synthesis call. Shorter than the
/// completion bound: audio is an enhancement, not the payload.
const DEFAULT_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for the synthesis client.
#[derive(Clone)]
pub struct TtsConfig {
    /// Provider base URL. Overridable so tests can point at a local mock.
    pub base_url: String,
    pub api_key: String,
    /// Fixed voice identity used for all synthesis.
    pub voice_id: String,
    pub model_id: String,
    /// Bounded wait for the whole call.
    pub timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            voice_id: "jBpfuIE2acCO8z3wKNLl".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            timeout: DEFAULT_SYNTHESIS_TIMEOUT,
        }
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Voice rendering parameters sent with every synthesis request.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.66,
            use_speaker_boost: true,
        }
    }
}

/// Client for the synthesis provider's text-to-speech endpoint.
#[derive(Debug, Clone)]
pub struct TtsClient {
    http: reqwest::Client,
    config: TtsConfig,
    settings: VoiceSettings,
}

impl TtsClient {
    pub fn new(config: TtsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            settings: VoiceSettings::default(),
        }
    }

    /// Synthesizes speech for `text`, returning MPEG audio bytes.
    ///
    /// The entire exchange is raced against the configured bound; if the
    /// timer wins, the call's eventual outcome is discarded and
    /// [`VoiceError::Timeout`] is returned.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::InputTooLarge(text.len()));
        }

        let body = json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": self.settings,
        });

        let call = async {
            let resp = self
                .http
                .post(format!(
                    "{}/v1/text-to-speech/{}",
                    self.config.base_url, self.config.voice_id
                ))
                .header("xi-api-key", &self.config.api_key)
                .header("accept", "audio/mpeg")
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(VoiceError::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(resp.bytes().await?.to_vec())
        };

        match tokio::time::timeout(self.config.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(VoiceError::Timeout(self.config.timeout)),
        }
    }
}
