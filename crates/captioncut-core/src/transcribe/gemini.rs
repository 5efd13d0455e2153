//! Google Gemini Transcription Client
//!
//! Sends the encoded audio payload to the Gemini `generateContent`
//! endpoint as inline base64 data together with the style prompt, and
//! returns the raw SRT text from the first candidate.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{build_prompt, CaptionStyle, Transcriber};
use crate::audio::EncodedAudio;
use crate::{CoreError, CoreResult};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for [`GeminiTranscriber`]
#[derive(Clone, Debug, Default)]
pub struct GeminiConfig {
    /// API key (required)
    pub api_key: Option<String>,
    /// Base URL override, mainly for tests
    pub base_url: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl GeminiConfig {
    /// Creates a config with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Sets a custom base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets a custom model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }
}

// =============================================================================
// Gemini Transcriber
// =============================================================================

/// Gemini API transcription client
pub struct GeminiTranscriber {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiTranscriber {
    /// Default Gemini API base URL
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    /// Default model for audio transcription
    pub const DEFAULT_MODEL: &'static str = "gemini-3-flash-preview";

    /// Creates a new transcriber.
    ///
    /// Requires a non-empty API key; other fields fall back to defaults.
    pub fn new(config: GeminiConfig) -> CoreResult<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            CoreError::TranscriptionFailed("Gemini API key is required".to_string())
        })?;

        if api_key.is_empty() {
            return Err(CoreError::TranscriptionFailed(
                "Gemini API key cannot be empty".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());
        let model = config.model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string());
        // Longer default timeout: the whole audio track rides in one request.
        let timeout_secs = config.timeout_secs.unwrap_or(120);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                CoreError::TranscriptionFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key,
            base_url,
            model,
            client,
        })
    }

    fn build_request(&self, audio: &EncodedAudio, style: CaptionStyle) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::inline_data(&audio.mime_type, BASE64.encode(&audio.data)),
                    Part::text(build_prompt(style)),
                ],
            }],
        }
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    async fn transcribe(&self, audio: &EncodedAudio, style: CaptionStyle) -> CoreResult<String> {
        let api_request = self.build_request(audio, style);

        // API key rides in a header to keep it out of logged URLs.
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        tracing::debug!(
            model = %self.model,
            audio_bytes = audio.data.len(),
            style = style.id(),
            "sending transcription request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| CoreError::TranscriptionFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CoreError::TranscriptionFailed(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            let error: ApiError = serde_json::from_str(&body).unwrap_or(ApiError {
                error: ApiErrorDetail {
                    message: body.clone(),
                    status: None,
                },
            });
            let status_str = error.error.status.as_deref().unwrap_or("unknown");
            return Err(CoreError::TranscriptionFailed(format!(
                "Gemini API error ({}; status={}): {}",
                status, status_str, error.error.message
            )));
        }

        let api_response: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| CoreError::TranscriptionFailed(format!("Failed to parse response: {}", e)))?;

        if let Some(feedback) = &api_response.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(CoreError::TranscriptionFailed(format!(
                    "Content blocked by Gemini safety filters: {}",
                    reason
                )));
            }
        }

        let candidates = api_response.candidates.ok_or_else(|| {
            CoreError::TranscriptionFailed("No candidates returned from Gemini".to_string())
        })?;

        let candidate = candidates.first().ok_or_else(|| {
            CoreError::TranscriptionFailed("Empty candidates array from Gemini".to_string())
        })?;

        let text = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }
}

// =============================================================================
// Gemini API Types
// =============================================================================

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    fn inline_data(mime_type: &str, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data,
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
