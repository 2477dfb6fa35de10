mod common;

use common::{spawn_app, test_config, valid_request_body, StubProvider};
use fairlyhuman::audit::PrivacyMode;
use reqwest::Client;
use tempfile::tempdir;

#[tokio::test]
async fn strict_mode_writes_no_audit_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let mut config = test_config();
    config.privacy_mode = PrivacyMode::Strict;
    config.audit_log_file = Some(path.to_str().unwrap().to_string());
    let (addr, _h) = spawn_app(&config, StubProvider::new()).await;

    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&valid_request_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(!path.exists());
}

#[tokio::test]
async fn debug_mode_records_metadata_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let mut config = test_config();
    config.privacy_mode = PrivacyMode::Debug;
    config.audit_log_file = Some(path.to_str().unwrap().to_string());
    let (addr, _h) = spawn_app(&config, StubProvider::new()).await;

    let body = valid_request_body();
    let story = body["storyText"].as_str().unwrap().to_string();
    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["storyLength"], story.chars().count() as u64);
    assert_eq!(record["model"], "gpt-4o-mini");
    assert!(record["unfairnessScore"].is_number());
    // Never the story text itself.
    assert!(!content.contains("schedule"));
}

#[tokio::test]
async fn failed_analyses_are_not_audited() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let mut config = test_config();
    config.privacy_mode = PrivacyMode::Debug;
    config.audit_log_file = Some(path.to_str().unwrap().to_string());
    let provider = StubProvider::new();
    provider.push_error("provider down");
    let (addr, _h) = spawn_app(&config, provider).await;

    let resp = Client::new()
        .post(format!("{}/api/stories/analyze", addr))
        .json(&valid_request_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    assert!(content.is_empty());
}
