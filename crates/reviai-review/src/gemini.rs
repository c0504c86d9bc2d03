//! Blocking client for the Gemini `generateContent` endpoint.
//!
//! The request asks for a JSON response constrained by
//! [`ReviewTable::response_schema`], so the candidate text can be parsed
//! directly into a [`ReviewTable`].

use std::time::Duration;

use reviai_core::ReviewTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReviewError, ReviewResult};

const USER_AGENT: &str = concat!("reviai/", env!("CARGO_PKG_VERSION"));

/// Settings for one client instance.
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl GeminiOptions {
    pub fn from_config(config: &reviai_core::Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            api_key: config.api_key().to_string(),
            model: config.model().to_string(),
            temperature: config.settings.temperature,
            max_output_tokens: config.settings.max_output_tokens,
            timeout: Duration::from_secs(config.settings.request_timeout_secs),
        }
    }
}

/// Gemini API client (blocking).
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    options: GeminiOptions,
}

/// A parsed review together with the raw response body.
#[derive(Debug, Clone)]
pub struct GeminiReview {
    pub table: ReviewTable,
    pub raw: Value,
    pub usage: Option<UsageMetadata>,
}

impl GeminiClient {
    pub fn new(options: GeminiOptions) -> ReviewResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(options.timeout)
            .build()?;
        Ok(Self { http, options })
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }

    pub fn api_key(&self) -> &str {
        &self.options.api_key
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.options.base_url.trim_end_matches('/'),
            self.options.model
        )
    }

    /// Send `prompt` and parse the structured review from the reply.
    ///
    /// The raw body is handed to `on_raw` before it is interpreted, so it can
    /// be kept for debugging even when parsing fails.
    pub fn review(
        &self,
        prompt: &str,
        on_raw: impl FnOnce(&Value),
    ) -> ReviewResult<GeminiReview> {
        let request = GenerateContentRequest::new(prompt, &self.options);

        tracing::info!("Calling Gemini API ({})", self.options.model);
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.options.api_key)
            .json(&request)
            .send()?;

        let status = resp.status().as_u16();
        let text = resp.text()?;
        let raw: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        on_raw(&raw);

        if !(200..300).contains(&status) {
            return Err(ReviewError::Api {
                status,
                message: error_message(&raw, status),
            });
        }

        let response: GenerateContentResponse =
            serde_json::from_value(raw.clone()).map_err(ReviewError::Parse)?;
        if let Some(usage) = &response.usage_metadata {
            tracing::info!(
                "Token usage: prompt={} candidates={} total={}",
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.total_token_count
            );
        }

        let table = response.review_table()?;
        Ok(GeminiReview {
            table,
            usage: response.usage_metadata,
            raw,
        })
    }
}

/// `error.message` from an API error body, or a generic message.
fn error_message(body: &Value, status: u16) -> String {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn new(prompt: &str, options: &GeminiOptions) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: ReviewTable::response_schema(),
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Token counts reported by the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

impl GenerateContentResponse {
    fn review_table(&self) -> ReviewResult<ReviewTable> {
        let block_reason = || {
            self.prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.clone())
        };

        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| ReviewError::EmptyResponse(block_reason()))?;

        if candidate.finish_reason.as_deref() == Some("MAX_TOKENS") {
            return Err(ReviewError::Truncated);
        }

        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            return Err(ReviewError::EmptyResponse(block_reason()));
        }

        serde_json::from_str(&text).map_err(ReviewError::Parse)
    }
}
