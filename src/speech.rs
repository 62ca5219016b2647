use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tracing::instrument;

use crate::config::SpeechConfig;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech service returned status {0}")]
    Status(u16),
    #[error("speech service request failed: {0}")]
    Request(String),
}

#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Transcribe one finished audio recording. An empty transcript is a
    /// valid result (no speech detected), distinct from an error.
    async fn transcribe(&self, audio: Bytes, content_type: &str) -> Result<String, SpeechError>;
}

/// Deepgram prerecorded-audio transcription client.
#[derive(Debug)]
pub struct DeepgramClient {
    config: SpeechConfig,
    client: reqwest::Client,
}

impl DeepgramClient {
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    transcript: String,
}

/// Pull the first channel's best transcript out of the response, trimmed.
/// Missing pieces collapse to the empty transcript.
fn extract_transcript(response: &ListenResponse) -> String {
    response
        .results
        .as_ref()
        .and_then(|r| r.channels.first())
        .and_then(|c| c.alternatives.first())
        .map(|a| a.transcript.trim().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl SpeechClient for DeepgramClient {
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    async fn transcribe(&self, audio: Bytes, content_type: &str) -> Result<String, SpeechError> {
        let url = format!(
            "{}/v1/listen?model={}&smart_format=true",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.config.api_key))
            .header("Content-Type", content_type)
            .body(audio)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Status(status.as_u16()));
        }

        let parsed: ListenResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        Ok(extract_transcript(&parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> ListenResponse {
        serde_json::from_str(json).expect("valid listen response")
    }

    #[test]
    fn extracts_first_alternative_trimmed() {
        let parsed = response(
            r#"{"results":{"channels":[{"alternatives":[{"transcript":"  two eggs for breakfast  "}]}]}}"#,
        );
        assert_eq!(extract_transcript(&parsed), "two eggs for breakfast");
    }

    #[test]
    fn missing_results_is_empty_transcript() {
        let parsed = response("{}");
        assert_eq!(extract_transcript(&parsed), "");
    }

    #[test]
    fn empty_alternatives_is_empty_transcript() {
        let parsed = response(r#"{"results":{"channels":[{"alternatives":[]}]}}"#);
        assert_eq!(extract_transcript(&parsed), "");
    }
}
