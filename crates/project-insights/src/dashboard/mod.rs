//! Dashboard summaries and AI-generated project insights.

pub mod domain;
pub mod fetcher;
pub mod gemini;
pub mod insights;
pub mod router;

pub use domain::{DashboardInputError, DashboardRequest, ProjectSummary, TeamMemberInput};
pub use fetcher::InsightFetcher;
pub use gemini::GeminiClient;
pub use insights::{AiStatus, InsightFailure, InsightsMeta, InsightsResult, ModelInsights};
pub use router::{build_dashboard, dashboard_router, DashboardResponse};
