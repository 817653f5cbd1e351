use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::client::{ImageClient, ImageResponse, InlineImage, LlmClient};
use crate::error::PipelineError;
use crate::util::SecretString;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Gemini Client (Google Generative AI)
// ============================================================================

pub struct GeminiClient {
    api_key: SecretString,
    model: String,
    base_url: String,
    max_tokens: u32,
    thinking_level: Option<String>,
    image_size: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_level: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    image_size: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
    #[serde(default)]
    inline_data: Option<GeminiBlob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    /// Base64 encoded data
    data: String,
}

impl GeminiResponse {
    fn parts(&self) -> Result<&[GeminiResponsePart]> {
        if self.candidates.is_empty() {
            if let Some(reason) = self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref())
            {
                return Err(PipelineError::Blocked(reason.to_string()).into());
            }
            bail!("No candidates in Gemini response");
        }
        Ok(self.candidates[0]
            .content
            .as_ref()
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[]))
    }

    /// Visible text of the first candidate, thoughts excluded.
    fn text(&self) -> Result<String> {
        let text: String = self
            .parts()?
            .iter()
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text.as_deref())
            .collect();
        Ok(text)
    }

    fn into_image_response(self) -> Result<ImageResponse> {
        let mut response = ImageResponse {
            text: self.text()?,
            ..Default::default()
        };
        let engine = base64::engine::general_purpose::STANDARD;
        for part in self.parts()? {
            let Some(blob) = &part.inline_data else {
                continue;
            };
            if blob.data.is_empty() {
                continue;
            }
            match engine.decode(blob.data.as_bytes()) {
                Ok(data) => response.images.push(InlineImage {
                    mime_type: blob.mime_type.clone(),
                    data,
                }),
                Err(e) => warn!("Skipping undecodable inline {} data: {}", blob.mime_type, e),
            }
        }
        Ok(response)
    }
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, max_tokens: u32, timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(
            api_key,
            model,
            DEFAULT_GEMINI_BASE_URL.to_string(),
            max_tokens,
            timeout_secs,
        )
    }

    pub fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            thinking_level: None,
            image_size: None,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .context("failed to build HTTP client")?,
        })
    }

    pub fn with_thinking_level(mut self, level: impl Into<String>) -> Self {
        let level = level.into();
        self.thinking_level = (!level.trim().is_empty()).then_some(level);
        self
    }

    pub fn with_image_size(mut self, size: impl Into<String>) -> Self {
        let size = size.into();
        self.image_size = (!size.trim().is_empty()).then_some(size);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn text_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![user_content(prompt)],
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: Some(self.max_tokens),
                thinking_config: self.thinking_level.as_ref().map(|l| ThinkingConfig {
                    thinking_level: l.clone(),
                }),
                ..Default::default()
            }),
        }
    }

    fn image_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![user_content(prompt)],
            generation_config: Some(GeminiGenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
                image_config: self.image_size.as_ref().map(|s| ImageConfig {
                    image_size: s.clone(),
                }),
                ..Default::default()
            }),
        }
    }

    async fn send(&self, request: &GeminiRequest) -> Result<GeminiResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", self.api_key.expose())
            .json(request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse Gemini API response")
    }
}

fn user_content(prompt: &str) -> GeminiContent {
    GeminiContent {
        role: "user".to_string(),
        parts: vec![GeminiPart {
            text: prompt.to_string(),
        }],
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Calling Gemini API with model: {}", self.model);
        let response = self.send(&self.text_request(prompt)).await?;
        let text = response.text()?;
        if text.trim().is_empty() {
            bail!("No text content in Gemini response");
        }
        Ok(text)
    }
}

#[async_trait]
impl ImageClient for GeminiClient {
    async fn generate_image(&self, prompt: &str) -> Result<ImageResponse> {
        debug!("Calling Gemini image API with model: {}", self.model);
        let response = self.send(&self.image_request(prompt)).await?;
        response.into_image_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new("test_key".to_string(), "gemini-pro".to_string(), 8192, 120).unwrap()
    }

    #[test]
    fn test_gemini_client_creation() {
        let client = client();
        assert_eq!(client.api_key.expose(), "test_key");
        assert_eq!(client.model(), "gemini-pro");
        assert_eq!(client.base_url, DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GeminiClient::with_base_url(
            "k".to_string(),
            "m".to_string(),
            "http://localhost:1234/v1beta/".to_string(),
            100,
            5,
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:1234/v1beta");
    }

    #[test]
    fn test_text_request_structure() {
        let request = client().with_thinking_level("HIGH").text_request("describe");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "describe");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["thinkingLevel"],
            "HIGH"
        );
        assert!(json["generationConfig"].get("responseModalities").is_none());
    }

    #[test]
    fn test_text_request_without_thinking_level() {
        let request = client().with_thinking_level("  ").text_request("x");
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["generationConfig"].get("thinkingConfig").is_none());
    }

    #[test]
    fn test_image_request_structure() {
        let request = client().with_image_size("1K").image_request("draw");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE", "TEXT"])
        );
        assert_eq!(json["generationConfig"]["imageConfig"]["imageSize"], "1K");
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_response_text_concatenates_parts_and_skips_thoughts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "thinking...", "thought": true},
                        {"text": "Hello, "},
                        {"text": "world!"}
                    ]
                }
            }]
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text().unwrap(), "Hello, world!");
    }

    #[test]
    fn test_response_empty_candidates_is_error() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(response.text().is_err());
    }

    #[test]
    fn test_response_blocked_prompt() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = response.text().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Blocked(r)) if r == "SAFETY"
        ));
    }

    #[test]
    fn test_response_candidate_without_content() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text().unwrap(), "");
    }

    #[test]
    fn test_image_response_decodes_inline_data() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG-bytes");
        let json = format!(
            r#"{{
                "candidates": [{{
                    "content": {{
                        "parts": [
                            {{"text": "Here you go"}},
                            {{"inlineData": {{"mimeType": "image/png", "data": "{}"}}}},
                            {{"inlineData": {{"mimeType": "image/png", "data": "!!not-base64!!"}}}}
                        ]
                    }}
                }}]
            }}"#,
            encoded
        );
        let response: GeminiResponse = serde_json::from_str(&json).unwrap();
        let images = response.into_image_response().unwrap();
        assert_eq!(images.text, "Here you go");
        assert_eq!(images.images.len(), 1);
        assert_eq!(images.images[0].mime_type, "image/png");
        assert_eq!(images.images[0].data, b"\x89PNG-bytes");
    }
}
