use serde::{Deserialize, Serialize};

pub const FALLBACK_WORKLOAD_INSIGHT: &str = "AI service temporarily unavailable.";
pub const FALLBACK_RISK_ASSESSMENT: &str = "Unable to assess project risk.";
pub const FALLBACK_RECOMMENDATIONS: [&str; 2] =
    ["Retry AI analysis later", "System handled AI failure gracefully"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiStatus {
    /// Insights came from the model.
    Full,
    /// Canned fallback text.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsMeta {
    pub ai_status: AiStatus,
}

/// Insights returned to the dashboard. Produced on every code path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_insight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    pub meta: InsightsMeta,
}

impl InsightsResult {
    pub fn fallback() -> Self {
        Self {
            workload_insight: Some(FALLBACK_WORKLOAD_INSIGHT.to_string()),
            risk_assessment: Some(FALLBACK_RISK_ASSESSMENT.to_string()),
            recommendations: Some(
                FALLBACK_RECOMMENDATIONS
                    .iter()
                    .map(|item| item.to_string())
                    .collect(),
            ),
            meta: InsightsMeta {
                ai_status: AiStatus::Partial,
            },
        }
    }

    pub fn from_model(insights: ModelInsights) -> Self {
        Self {
            workload_insight: insights.workload_insight,
            risk_assessment: insights.risk_assessment,
            recommendations: insights.recommendations,
            meta: InsightsMeta {
                ai_status: AiStatus::Full,
            },
        }
    }

    pub fn ai_status(&self) -> AiStatus {
        self.meta.ai_status
    }
}

/// Shape the model is asked to produce. Every field is optional; a field of
/// the wrong type fails deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInsights {
    #[serde(default)]
    pub workload_insight: Option<String>,
    #[serde(default)]
    pub risk_assessment: Option<String>,
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
}

/// Every way an insight request can fail. All of them collapse to
/// [`InsightsResult::fallback`].
#[derive(Debug, thiserror::Error)]
pub enum InsightFailure {
    #[error("upstream quota exceeded")]
    QuotaExceeded,
    #[error("upstream error{}: {message}", code_suffix(.code))]
    Upstream { code: Option<i64>, message: String },
    #[error("model returned no text")]
    EmptyResponse,
    #[error("model text contains no complete JSON object")]
    TruncatedJson,
    #[error("model JSON could not be parsed: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("project summary could not be serialized into the prompt: {0}")]
    Prompt(#[source] serde_json::Error),
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|code| format!(" {code}")).unwrap_or_default()
}

impl InsightFailure {
    /// Stable identifier used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            InsightFailure::QuotaExceeded => "QUOTA_EXCEEDED",
            InsightFailure::Upstream { .. } => "UPSTREAM_ERROR",
            InsightFailure::EmptyResponse => "EMPTY_RESPONSE",
            InsightFailure::TruncatedJson => "TRUNCATED_JSON",
            InsightFailure::Parse(_) => "PARSE_ERROR",
            InsightFailure::Prompt(_) => "PROMPT_ERROR",
            InsightFailure::Transport(_) => "TRANSPORT_ERROR",
        }
    }
}

/// Slice from the first `{` to the last `}` inclusive.
///
/// Tolerates prose around the object and trailing truncation artifacts.
pub fn extract_json_object(text: &str) -> Result<&str, InsightFailure> {
    let start = text.find('{').ok_or(InsightFailure::TruncatedJson)?;
    let end = text.rfind('}').ok_or(InsightFailure::TruncatedJson)?;
    if end <= start {
        return Err(InsightFailure::TruncatedJson);
    }
    Ok(&text[start..=end])
}

/// Extract and validate the insight object embedded in model output.
pub fn parse_model_text(text: &str) -> Result<ModelInsights, InsightFailure> {
    let candidate = extract_json_object(text)?;
    serde_json::from_str(candidate).map_err(InsightFailure::Parse)
}
