use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::domain::{DashboardInputError, DashboardRequest, ProjectSummary};
use super::fetcher::InsightFetcher;
use super::insights::InsightsResult;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub summary: ProjectSummary,
    pub insights: InsightsResult,
}

/// Router exposing the dashboard endpoint.
pub fn dashboard_router(fetcher: Arc<InsightFetcher>) -> Router {
    Router::new()
        .route(
            "/api/dashboard",
            post(dashboard_handler).fallback(method_not_allowed),
        )
        .with_state(fetcher)
}

/// Builds the summary and fetches insights for one request.
///
/// A configured request timeout bounds the insight call; expiry yields the
/// fallback payload.
pub async fn build_dashboard(
    fetcher: &InsightFetcher,
    request: DashboardRequest,
) -> Result<DashboardResponse, DashboardInputError> {
    let summary = request.summarize()?;

    let insights = match fetcher.config().request_timeout {
        Some(limit) => match tokio::time::timeout(limit, fetcher.fetch_insights(&summary)).await {
            Ok(insights) => insights,
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "insight request timed out, using fallback");
                InsightsResult::fallback()
            }
        },
        None => fetcher.fetch_insights(&summary).await,
    };

    Ok(DashboardResponse { summary, insights })
}

pub(crate) async fn dashboard_handler(
    State(fetcher): State<Arc<InsightFetcher>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DashboardResponse>, AppError> {
    let Json(value) =
        payload.map_err(|rejection| DashboardInputError::Malformed(rejection.body_text()))?;
    let request = DashboardRequest::from_value(value)?;

    let response = build_dashboard(&fetcher, request).await?;
    info!(
        members = response.summary.workload_by_person.len(),
        ai_status = ?response.insights.ai_status(),
        "dashboard generated"
    );
    Ok(Json(response))
}

pub(crate) async fn method_not_allowed() -> Response {
    let payload = json!({ "error": "Method not allowed" });
    (StatusCode::METHOD_NOT_ALLOWED, Json(payload)).into_response()
}
