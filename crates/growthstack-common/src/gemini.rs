use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_timeout: Duration,
    pub max_error_body_bytes: usize,
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());

        let default_timeout = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(120));

        let max_error_body_bytes = std::env::var("GEMINI_MAX_ERROR_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(8 * 1024);

        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_timeout,
            max_error_body_bytes,
        }
    }

    /// Whether a model credential is configured. The credential itself is
    /// provisioned by the host environment; this only answers the probe.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No valid model credential is configured or accepted. Produced here,
    /// in the adapter, from the error envelope's machine-readable `status`
    /// field; callers must never infer this from message text.
    #[error("model credential missing or rejected: {message}")]
    Auth { message: String },

    #[error("model API error: status={status} message={message}")]
    Api { status: StatusCode, message: String },

    #[error("model API returned non-JSON error: status={status} body={body}")]
    ApiBody { status: StatusCode, body: String },
}

impl GeminiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, GeminiError::Auth { .. })
    }
}

/// Seam between the orchestrator and the hosted model. `GeminiClient` is the
/// production implementation; tests script their own.
#[async_trait]
pub trait ContentModel: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError>;
}

#[async_trait]
impl<T: ContentModel + ?Sized> ContentModel for std::sync::Arc<T> {
    async fn generate(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        (**self).generate(model, request).await
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .user_agent("growthstack/keyword-audit")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// One `generateContent` call, no retries. A request runs to completion
    /// or failure; recovery policy belongs to the caller.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(GeminiError::Auth {
                message: "GEMINI_API_KEY is not set".to_string(),
            });
        };

        let url = format!("{}/models/{}:generateContent", self.config.base_url, model);
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .timeout(self.config.default_timeout)
            .json(request)
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(resp.json::<GenerateContentResponse>().await?);
        }

        let status = resp.status();
        let body = read_limited_text(resp, self.config.max_error_body_bytes).await;
        Err(classify_error(status, &body))
    }
}

#[async_trait]
impl ContentModel for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        self.generate_content(model, &request).await
    }
}

/// Map a non-success response to the error taxonomy. The hosted
/// key-selection flow reports a missing credential as 404 NOT_FOUND, so that
/// status tag counts as an authorization failure alongside the obvious ones.
fn classify_error(status: StatusCode, body: &str) -> GeminiError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = envelope
            .error
            .message
            .unwrap_or_else(|| "unknown model API error".to_string());
        let tag = envelope.error.status.unwrap_or_default();
        if matches!(tag.as_str(), "UNAUTHENTICATED" | "PERMISSION_DENIED" | "NOT_FOUND") {
            return GeminiError::Auth { message };
        }
        return GeminiError::Api { status, message };
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return GeminiError::Auth {
            message: body.to_string(),
        };
    }
    GeminiError::ApiBody {
        status,
        body: body.to_string(),
    }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read model API error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
    status: Option<String>,
    #[allow(dead_code)]
    code: Option<i64>,
}

// --- Wire types (camelCase on the wire) ---

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A request carrying a single user text part, everything else default.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::from_text(prompt)],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Tool capability marker. Exactly one capability per entry, matching the
/// wire shape `{"googleSearch": {}}` / `{"googleMaps": {}}`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<EmptyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_maps: Option<EmptyConfig>,
}

impl Tool {
    pub fn web_search() -> Self {
        Self {
            google_search: Some(EmptyConfig {}),
            ..Self::default()
        }
    }

    pub fn maps_search() -> Self {
        Self {
            google_maps: Some(EmptyConfig {}),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyConfig {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

impl ToolConfig {
    pub fn near(latitude: f64, longitude: f64) -> Self {
        Self {
            retrieval_config: RetrievalConfig {
                lat_lng: LatLng {
                    latitude,
                    longitude,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationConfig {
    pub fn json(schema: serde_json::Value) -> Self {
        Self {
            response_mime_type: "application/json".to_string(),
            response_schema: Some(schema),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts. Empty when the
    /// model returned no usable text; callers decide what that means.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    /// Grounding sources from the first candidate. Chunks carrying neither a
    /// web nor a maps source are dropped.
    pub fn grounding_sources(&self) -> Vec<GroundingSource> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| {
                m.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.clone().or_else(|| chunk.maps.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<GroundingSource>,
    #[serde(default)]
    pub maps: Option<GroundingSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingSource {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}
