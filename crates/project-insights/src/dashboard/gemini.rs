use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::ProjectSummary;
use super::insights::{parse_model_text, InsightFailure, ModelInsights};
use crate::config::AiConfig;

const PROMPT_HEADER: &str = "You are an AI project management assistant.

STRICT RULES:
- Return ONLY valid JSON
- Do NOT use markdown
- Do NOT add explanations
- JSON must be COMPLETE

JSON schema:
{
  \"workloadInsight\": \"string\",
  \"riskAssessment\": \"string\",
  \"recommendations\": [\"string\"]
}

Project Data:
";

/// Builds the instruction prompt with the summary embedded as pretty JSON.
pub fn build_prompt(summary: &ProjectSummary) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string_pretty(summary)?;
    Ok(format!("{PROMPT_HEADER}{data}\n"))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ApiError {
    fn into_failure(self) -> InsightFailure {
        let quota = self.code == Some(429) || self.status.as_deref() == Some("RESOURCE_EXHAUSTED");
        if quota {
            InsightFailure::QuotaExceeded
        } else {
            InsightFailure::Upstream {
                code: self.code,
                message: self
                    .message
                    .unwrap_or_else(|| "upstream reported an error".to_string()),
            }
        }
    }
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn first_candidate_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Classifies the decoded body into insights or a failure.
    pub fn into_insights(self) -> Result<ModelInsights, InsightFailure> {
        if let Some(error) = self.error {
            return Err(error.into_failure());
        }

        let text = self.first_candidate_text();
        if text.is_empty() {
            return Err(InsightFailure::EmptyResponse);
        }

        debug!(chars = text.len(), "model text received");
        parse_model_text(&text)
    }
}

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(config: AiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http_client(http, config))
    }

    pub fn with_http_client(http: reqwest::Client, config: AiConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn request_body(&self, prompt: String) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    /// Issues exactly one `generateContent` call for `prompt`.
    pub async fn generate(&self, prompt: String) -> Result<ModelInsights, InsightFailure> {
        let body = self.request_body(prompt);

        let response = self
            .http
            .post(self.config.generate_content_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(InsightFailure::Transport)?;

        let status = response.status();
        let raw = response.text().await.map_err(InsightFailure::Transport)?;
        debug!(%status, bytes = raw.len(), "generateContent responded");

        let decoded = match serde_json::from_str::<GenerateContentResponse>(&raw) {
            Ok(decoded) => decoded,
            Err(err) if status.is_success() => return Err(InsightFailure::Parse(err)),
            Err(_) => {
                return Err(InsightFailure::Upstream {
                    code: Some(i64::from(status.as_u16())),
                    message: status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string(),
                })
            }
        };

        if !status.is_success() && decoded.error.is_none() {
            return Err(InsightFailure::Upstream {
                code: Some(i64::from(status.as_u16())),
                message: "non-success status without error details".to_string(),
            });
        }

        decoded.into_insights()
    }
}
