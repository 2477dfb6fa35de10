// Each integration test binary compiles this module; not every binary uses
// every helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::net::TcpListener as TokioTcpListener;
use tokio::task::JoinHandle;

use fairlyhuman::audit::{PrivacyMode, RotationConfig};
use fairlyhuman::provider::{ModelProvider, ProviderError};
use fairlyhuman::ratelimit::RateLimitSettings;
use fairlyhuman::{app, AppConfig, AppState};

/// Scripted model provider: pops queued outcomes in order and counts
/// invocations. An empty queue yields a default valid analysis.
pub struct StubProvider {
    responses: Mutex<VecDeque<Result<Value, String>>>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn push_output(&self, output: Value) {
        self.responses.lock().unwrap().push_back(Ok(output));
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn valid_core_output() -> Value {
    json!({
        "analysisSummary": "Your situation raises fairness concerns around communication.",
        "unfairnessScore": 55,
        "factors": [
            { "label": "Communication clarity", "description": "Expectations changed without notice.", "weight": 0.6 },
            { "label": "Documentation and records", "description": "Little is in writing.", "weight": 0.4 }
        ],
        "suggestions": ["Document each schedule change with dates."],
        "resourceLinks": [{ "label": "U.S. DOL", "url": "https://www.dol.gov" }],
        "reframes": ["I deserve clear, written expectations for my role."],
        "safetyNotes": ["This is not legal advice."]
    })
}

#[async_trait]
impl ModelProvider for StubProvider {
    async fn complete(&self, _instruction: &str, _payload: &Value) -> Result<Value, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(ProviderError::MalformedOutput(message)),
            None => Ok(valid_core_output()),
        }
    }
}

/// Test configuration: audit off, generous limits unless a test overrides.
pub fn test_config() -> AppConfig {
    AppConfig {
        privacy_mode: PrivacyMode::Strict,
        model: "gpt-4o-mini".to_string(),
        api_key: None,
        base_url: "http://127.0.0.1:1/v1".to_string(),
        model_timeout_ms: 1000,
        rate: RateLimitSettings {
            client_limit: 1000,
            client_window: Duration::from_secs(300),
            global_limit: 100_000,
            global_window: Duration::from_secs(3600),
        },
        trust_forwarded: false,
        max_request_bytes: 64 * 1024,
        audit_log_file: None,
        rotation: RotationConfig::default(),
    }
}

/// Spawn the app on an ephemeral port and return its base URL.
pub async fn spawn_app(config: &AppConfig, provider: Arc<StubProvider>) -> (String, JoinHandle<()>) {
    let listener = TokioTcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(config, provider);
    let app = app(state);
    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    (format!("http://{}", addr), handle)
}

pub fn valid_request_body() -> Value {
    json!({
        "storyText": "My manager keeps changing my schedule without telling me first.",
        "context": { "country": "US", "stateOrRegion": "MN" }
    })
}
