mod common;

use common::{spawn_app, test_config, valid_core_output, valid_request_body, StubProvider};
use reqwest::Client;
use serde_json::json;

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (addr, _h) = spawn_app(&test_config(), StubProvider::new()).await;
    let resp = Client::new()
        .get(format!("{}/api/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn root_endpoint_reports_ok() {
    let (addr, _h) = spawn_app(&test_config(), StubProvider::new()).await;
    let resp = Client::new().get(format!("{}/", addr)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn unknown_route_returns_structured_404() {
    let (addr, _h) = spawn_app(&test_config(), StubProvider::new()).await;
    let resp = Client::new()
        .get(format!("{}/api/nope", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Route not found");
    assert_eq!(json["path"], "/api/nope");
    assert_eq!(json["method"], "GET");
}

#[tokio::test]
async fn short_story_is_rejected_without_model_call() {
    let provider = StubProvider::new();
    let (addr, _h) = spawn_app(&test_config(), provider.clone()).await;
    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&json!({ "storyText": "too short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Invalid request body");
    assert_eq!(json["details"][0]["field"], "storyText");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn invalid_body_reports_all_field_errors() {
    let provider = StubProvider::new();
    let (addr, _h) = spawn_app(&test_config(), provider.clone()).await;
    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&json!({
            "storyText": "short",
            "context": { "country": 1, "severitySelfRating": 7 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let json: serde_json::Value = resp.json().await.unwrap();
    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn successful_analysis_is_enriched_with_metadata() {
    let provider = StubProvider::new();
    provider.push_output(valid_core_output());
    let (addr, _h) = spawn_app(&test_config(), provider.clone()).await;

    let body = valid_request_body();
    let story = body["storyText"].as_str().unwrap().to_string();
    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["unfairnessScore"].as_f64(), Some(55.0));
    assert_eq!(
        json["metadata"]["storyLength"],
        story.chars().count() as u64
    );
    assert_eq!(json["metadata"]["model"], "gpt-4o-mini");
    assert_eq!(json["metadata"]["context"]["stateOrRegion"], "MN");
    assert!(json["metadata"]["receivedAt"].as_str().is_some());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn story_length_counts_raw_text_not_scrubbed() {
    let provider = StubProvider::new();
    let (addr, _h) = spawn_app(&test_config(), provider.clone()).await;

    // Scrubbing shortens this story; the reported length must not change.
    let story = "Please email me at someone.longaddress@example.com about my shift.";
    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&json!({ "storyText": story }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        json["metadata"]["storyLength"],
        story.chars().count() as u64
    );
}

#[tokio::test]
async fn out_of_range_score_becomes_fallback_response() {
    let provider = StubProvider::new();
    provider.push_output(json!({
        "analysisSummary": "Summary.",
        "unfairnessScore": 150
    }));
    let (addr, _h) = spawn_app(&test_config(), provider.clone()).await;
    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&valid_request_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Failed to analyze story at this time.");
    // The invalid score never reaches the client.
    assert!(json.get("unfairnessScore").is_none());
    assert!(json["fallback"]["analysisSummary"].as_str().is_some());
    assert_eq!(json["fallback"]["suggestions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn provider_failure_returns_generic_fallback() {
    let provider = StubProvider::new();
    provider.push_error("upstream exploded: secret internal detail");
    let (addr, _h) = spawn_app(&test_config(), provider.clone()).await;
    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&valid_request_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let text = resp.text().await.unwrap();
    // Provider detail must never leak to the client.
    assert!(!text.contains("secret internal detail"));
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["error"], "Failed to analyze story at this time.");
}

#[tokio::test]
async fn exactly_one_provider_attempt_per_request() {
    let provider = StubProvider::new();
    provider.push_error("transient");
    let (addr, _h) = spawn_app(&test_config(), provider.clone()).await;
    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&valid_request_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn success_response_carries_rate_limit_headers() {
    let (addr, _h) = spawn_app(&test_config(), StubProvider::new()).await;
    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&valid_request_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("ratelimit-limit")
            .unwrap()
            .to_str()
            .unwrap(),
        "1000"
    );
    assert!(resp.headers().get("ratelimit-remaining").is_some());
    assert!(resp.headers().get("ratelimit-reset").is_some());
}
