mod common;

use std::collections::BTreeMap;

use common::{candidate_body, fetcher_for, valid_insights_text, API_KEY, GENERATE_PATH};
use project_insights::config::AiConfig;
use project_insights::dashboard::{
    AiStatus, InsightFailure, InsightFetcher, InsightsMeta, InsightsResult, ProjectSummary,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn summary() -> ProjectSummary {
    ProjectSummary {
        project: Some("Website relaunch".to_string()),
        deadline: chrono::NaiveDate::from_ymd_opt(2026, 2, 15),
        total_tasks: 4,
        completed_tasks: 1,
        workload_by_person: BTreeMap::from([
            ("Alice".to_string(), 30.0),
            ("Bob".to_string(), 40.0),
        ]),
        member_status: BTreeMap::from([
            ("Alice".to_string(), "Pending".to_string()),
            ("Bob".to_string(), "Pending".to_string()),
        ]),
    }
}

async fn mount_json(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn sends_single_request_with_key_and_generation_limits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", API_KEY))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user" }],
            "generationConfig": { "temperature": 0.0, "maxOutputTokens": 500 }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(candidate_body(&[valid_insights_text()])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher_for(&server).fetch_insights(&summary()).await;
    assert_eq!(result.ai_status(), AiStatus::Full);

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value = requests[0].body_json().expect("request body is JSON");
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text present");
    assert!(prompt.contains("\"workloadByPerson\""));
    assert!(prompt.contains("\"deadline\": \"2026-02-15\""));
}

#[tokio::test]
async fn extracts_object_from_surrounding_prose() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        200,
        candidate_body(&[
            "prefix {\"workloadInsight\":\"a\",",
            "\"riskAssessment\":\"b\",\"recommendations\":[\"c\"]} suffix",
        ]),
    )
    .await;

    let result = fetcher_for(&server).fetch_insights(&summary()).await;
    assert_eq!(
        result,
        InsightsResult {
            workload_insight: Some("a".to_string()),
            risk_assessment: Some("b".to_string()),
            recommendations: Some(vec!["c".to_string()]),
            meta: InsightsMeta {
                ai_status: AiStatus::Full,
            },
        }
    );
}

#[tokio::test]
async fn quota_error_yields_fallback() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        429,
        json!({ "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" } }),
    )
    .await;

    let fetcher = fetcher_for(&server);
    let failure = fetcher.try_fetch(&summary()).await.expect_err("quota fails");
    assert!(matches!(failure, InsightFailure::QuotaExceeded));

    let result = fetcher.fetch_insights(&summary()).await;
    assert_eq!(result, InsightsResult::fallback());
    assert_eq!(result.ai_status(), AiStatus::Partial);
}

#[tokio::test]
async fn upstream_error_in_success_body_yields_fallback() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        200,
        json!({ "error": { "code": 400, "message": "API key not valid" } }),
    )
    .await;

    let fetcher = fetcher_for(&server);
    match fetcher.try_fetch(&summary()).await {
        Err(InsightFailure::Upstream { code, message }) => {
            assert_eq!(code, Some(400));
            assert_eq!(message, "API key not valid");
        }
        other => panic!("expected upstream failure, got {other:?}"),
    }
    assert_eq!(fetcher.fetch_insights(&summary()).await, InsightsResult::fallback());
}

#[tokio::test]
async fn server_error_without_json_yields_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server);
    let failure = fetcher.try_fetch(&summary()).await.expect_err("502 fails");
    assert_eq!(failure.code(), "UPSTREAM_ERROR");
    assert_eq!(fetcher.fetch_insights(&summary()).await, InsightsResult::fallback());
}

#[tokio::test]
async fn text_without_braces_yields_fallback() {
    let server = MockServer::start().await;
    mount_json(&server, 200, candidate_body(&["I cannot produce JSON today."])).await;

    let fetcher = fetcher_for(&server);
    let failure = fetcher.try_fetch(&summary()).await.expect_err("no object");
    assert!(matches!(failure, InsightFailure::TruncatedJson));
    assert_eq!(fetcher.fetch_insights(&summary()).await, InsightsResult::fallback());
}

#[tokio::test]
async fn invalid_json_span_yields_fallback() {
    let server = MockServer::start().await;
    mount_json(&server, 200, candidate_body(&["{not json}"])).await;

    let fetcher = fetcher_for(&server);
    let failure = fetcher.try_fetch(&summary()).await.expect_err("invalid span");
    assert!(matches!(failure, InsightFailure::Parse(_)));
    assert_eq!(fetcher.fetch_insights(&summary()).await, InsightsResult::fallback());
}

#[tokio::test]
async fn empty_candidates_yield_fallback() {
    let server = MockServer::start().await;
    mount_json(&server, 200, json!({ "candidates": [] })).await;

    let fetcher = fetcher_for(&server);
    let failure = fetcher.try_fetch(&summary()).await.expect_err("no text");
    assert!(matches!(failure, InsightFailure::EmptyResponse));
    assert_eq!(fetcher.fetch_insights(&summary()).await, InsightsResult::fallback());
}

#[tokio::test]
async fn connection_refused_yields_fallback() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("ephemeral port");
        listener.local_addr().expect("local addr")
    };
    let fetcher = InsightFetcher::new(AiConfig::with_base_url(format!("http://{addr}"), API_KEY))
        .expect("client builds");

    let failure = fetcher.try_fetch(&summary()).await.expect_err("nothing listening");
    assert!(matches!(failure, InsightFailure::Transport(_)));
    assert_eq!(fetcher.fetch_insights(&summary()).await, InsightsResult::fallback());
}

#[tokio::test]
async fn identical_inputs_yield_identical_results() {
    let server = MockServer::start().await;
    mount_json(&server, 200, candidate_body(&[valid_insights_text()])).await;

    let fetcher = fetcher_for(&server);
    let first = fetcher.fetch_insights(&summary()).await;
    let second = fetcher.fetch_insights(&summary()).await;
    assert_eq!(first, second);
    assert_eq!(first.ai_status(), AiStatus::Full);
    assert_eq!(
        first.recommendations.as_deref(),
        Some(&["Rebalance work".to_string(), "Track daily progress".to_string()][..])
    );
}
