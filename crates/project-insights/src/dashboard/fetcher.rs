use tracing::{info, warn};

use super::domain::ProjectSummary;
use super::gemini::{build_prompt, GeminiClient};
use super::insights::{InsightFailure, InsightsResult, ModelInsights};
use crate::config::AiConfig;

/// Produces insights for a summary, falling back to canned text on any failure.
///
/// Holds no mutable state, so one instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct InsightFetcher {
    client: GeminiClient,
}

impl InsightFetcher {
    pub fn new(config: AiConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(GeminiClient::new(config)?))
    }

    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn config(&self) -> &AiConfig {
        self.client.config()
    }

    /// Never fails; every failure is logged and mapped to [`InsightsResult::fallback`].
    pub async fn fetch_insights(&self, summary: &ProjectSummary) -> InsightsResult {
        resolve(self.try_fetch(summary).await)
    }

    /// One attempt at the model, exposing the failure kind.
    pub async fn try_fetch(&self, summary: &ProjectSummary) -> Result<ModelInsights, InsightFailure> {
        let prompt = build_prompt(summary).map_err(InsightFailure::Prompt)?;
        self.client.generate(prompt).await
    }
}

/// The single point where failures turn into the fallback payload.
pub fn resolve(outcome: Result<ModelInsights, InsightFailure>) -> InsightsResult {
    match outcome {
        Ok(insights) => {
            info!(ai_status = "full", "insights generated");
            InsightsResult::from_model(insights)
        }
        Err(failure) => {
            warn!(kind = failure.code(), error = %failure, "insight generation failed, using fallback");
            InsightsResult::fallback()
        }
    }
}
