#![allow(dead_code)]

use project_insights::config::AiConfig;
use project_insights::dashboard::InsightFetcher;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "test-key";
pub const GENERATE_PATH: &str = "/v1/models/gemini-2.5-flash:generateContent";

pub fn fetcher_for(server: &MockServer) -> InsightFetcher {
    InsightFetcher::new(AiConfig::with_base_url(server.uri(), API_KEY)).expect("client builds")
}

/// A `generateContent` success body whose first candidate carries `parts`.
pub fn candidate_body(parts: &[&str]) -> Value {
    let parts: Vec<Value> = parts.iter().map(|text| json!({ "text": text })).collect();
    json!({
        "candidates": [{ "content": { "role": "model", "parts": parts } }]
    })
}

pub fn valid_insights_text() -> &'static str {
    "{\"workloadInsight\":\"Bob carries more hours than Alice.\",\"riskAssessment\":\"Moderate risk ahead of the deadline.\",\"recommendations\":[\"Rebalance work\",\"Track daily progress\"]}"
}

pub fn sample_dashboard_request() -> Value {
    json!({
        "project": "Website relaunch",
        "teamMembers": [
            { "name": "Alice", "hours": 30, "status": "Pending" },
            { "name": "Bob", "hours": 40, "status": "Pending" }
        ],
        "totalTasks": 4,
        "completedTasks": 1,
        "deadline": "2026-02-15"
    })
}
