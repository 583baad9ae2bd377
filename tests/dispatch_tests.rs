//! Dispatcher behaviour against an in-process mock provider.
//!
//! Each test binds an axum server on `127.0.0.1:0` that records every
//! request and answers with a canned status and body.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::Router;
use serde_json::Value;

use genlearn::dispatch::{AiRequest, DispatchError, Dispatcher, TaskKind};
use genlearn::language::Language;
use genlearn::llm::catalog::{GEMINI_FLASH_MODEL, GEMINI_PRO_MODEL};
use genlearn::llm::{Catalog, ProviderId};
use genlearn::prompt::system_instruction;
use genlearn::settings::AiSettings;
use genlearn::tutor;

// ── Mock provider ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Value,
}

#[derive(Clone)]
struct MockProvider {
    base: String,
    status: StatusCode,
    body: &'static str,
    seen: Arc<Mutex<Vec<Captured>>>,
}

impl MockProvider {
    fn requests(&self) -> Vec<Captured> {
        self.seen.lock().unwrap().clone()
    }

    fn only_request(&self) -> Captured {
        let seen = self.requests();
        assert_eq!(seen.len(), 1, "expected exactly one outbound call");
        seen.into_iter().next().unwrap()
    }

    /// Catalog with every provider pointed at this server.
    fn catalog(&self) -> Catalog {
        ProviderId::ALL.iter().fold(Catalog::builtin(), |c, id| {
            let endpoint = match id {
                ProviderId::Gemini => format!("{}/v1beta/models", self.base),
                other => format!("{}/{}/chat/completions", self.base, other),
            };
            c.with_endpoint(*id, endpoint)
        })
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.catalog(), None).unwrap()
    }
}

async fn record(
    State(mock): State<MockProvider>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    mock.seen.lock().unwrap().push(Captured {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    });
    (mock.status, [(header::CONTENT_TYPE, "application/json")], mock.body)
}

async fn mock_provider(status: u16, body: &'static str) -> MockProvider {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mock = MockProvider {
        base: format!("http://{addr}"),
        status: StatusCode::from_u16(status).unwrap(),
        body,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new().fallback(record).with_state(mock.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    mock
}

// ── Helpers ────────────────────────────────────────────────────────────────

const KEY: &str = "sk-test";

fn settings_for(id: ProviderId) -> AiSettings {
    let mut s = AiSettings::default();
    s.select(id);
    s.set_api_key(id, KEY);
    s
}

fn request(task: TaskKind) -> AiRequest {
    AiRequest {
        task,
        system_instruction: "You are a mentor.".into(),
        prompt: "What is a closure?".into(),
        language: Language::En,
    }
}

const CHAT_OK: &str = r#"{"choices":[{"message":{"role":"assistant","content":"X"}}]}"#;
const GEMINI_OK: &str = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"},{"text":" world"}]}}]}"#;

// ── Missing credential ─────────────────────────────────────────────────────

#[tokio::test]
async fn missing_key_returns_hint_without_network_call() {
    let mock = mock_provider(200, CHAT_OK).await;
    let dispatcher = mock.dispatcher();

    for id in ProviderId::ALL {
        let mut settings = AiSettings::default();
        settings.select(id);
        // Keys for other providers must not leak into this one.
        for other in ProviderId::ALL.iter().filter(|o| **o != id) {
            settings.set_api_key(*other, "unused");
        }

        let err = dispatcher.dispatch(&request(TaskKind::Concept), &settings).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingCredential { provider } if provider == id));
        assert_eq!(
            err.user_message(Language::En),
            format!("Please configure the API Key for {} in settings.", id.display_name())
        );
        assert!(err.user_message(Language::Cn).contains(id.display_name()));
    }

    assert!(mock.requests().is_empty());
}

// ── Native provider ────────────────────────────────────────────────────────

#[tokio::test]
async fn native_creation_uses_capable_tier_and_low_temperature() {
    let mock = mock_provider(200, GEMINI_OK).await;
    let out = mock
        .dispatcher()
        .dispatch(&request(TaskKind::Creation), &settings_for(ProviderId::Gemini))
        .await
        .unwrap();
    assert_eq!(out, "Hello world");

    let req = mock.only_request();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, format!("/v1beta/models/{GEMINI_PRO_MODEL}:generateContent"));
    assert_eq!(req.headers.get("x-goog-api-key").unwrap(), KEY);
    assert!(req.headers.get(header::AUTHORIZATION).is_none());
    assert_eq!(req.body["generationConfig"]["temperature"].as_f64(), Some(0.2));
    assert_eq!(req.body["systemInstruction"]["parts"][0]["text"], "You are a mentor.");
    assert_eq!(req.body["contents"][0]["parts"][0]["text"], "What is a closure?");
}

#[tokio::test]
async fn native_concept_uses_fast_tier() {
    let mock = mock_provider(200, GEMINI_OK).await;
    mock.dispatcher()
        .dispatch(&request(TaskKind::Concept), &settings_for(ProviderId::Gemini))
        .await
        .unwrap();

    let req = mock.only_request();
    assert_eq!(req.path, format!("/v1beta/models/{GEMINI_FLASH_MODEL}:generateContent"));
    assert_eq!(req.body["generationConfig"]["temperature"].as_f64(), Some(0.7));
}

#[tokio::test]
async fn native_review_uses_capable_tier() {
    let mock = mock_provider(200, GEMINI_OK).await;
    mock.dispatcher()
        .dispatch(&request(TaskKind::Review), &settings_for(ProviderId::Gemini))
        .await
        .unwrap();
    let req = mock.only_request();
    assert!(req.path.contains(GEMINI_PRO_MODEL));
    assert_eq!(req.body["generationConfig"]["temperature"].as_f64(), Some(0.7));
}

#[tokio::test]
async fn native_override_wins_over_tier() {
    let mock = mock_provider(200, GEMINI_OK).await;
    let dispatcher = mock.dispatcher();
    let mut settings = settings_for(ProviderId::Gemini);
    settings.set_model_name(ProviderId::Gemini, "gemini-custom");

    for task in [TaskKind::Concept, TaskKind::Creation] {
        dispatcher.dispatch(&request(task), &settings).await.unwrap();
    }
    let paths: Vec<_> = mock.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/v1beta/models/gemini-custom:generateContent".to_string(),
            "/v1beta/models/gemini-custom:generateContent".to_string(),
        ]
    );
}

#[tokio::test]
async fn native_empty_reply_yields_placeholder() {
    let mock = mock_provider(200, r#"{"candidates":[]}"#).await;
    let out = mock
        .dispatcher()
        .dispatch(&request(TaskKind::Concept), &settings_for(ProviderId::Gemini))
        .await
        .unwrap();
    assert_eq!(out, "No response.");
}

#[tokio::test]
async fn native_http_error_is_attributed() {
    let mock = mock_provider(400, r#"{"error":{"code":400,"message":"API key not valid"}}"#).await;
    let err = mock
        .dispatcher()
        .dispatch(&request(TaskKind::Concept), &settings_for(ProviderId::Gemini))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::NonSuccessStatus { status: 400, .. }));
    let msg = err.user_message(Language::En);
    assert!(msg.starts_with("Google Gemini Error: API responded with 400"), "{msg}");
    assert!(msg.contains("API key not valid"), "{msg}");
}

// ── Chat completion providers ──────────────────────────────────────────────

#[tokio::test]
async fn chat_success_returns_first_choice_content() {
    let mock = mock_provider(200, CHAT_OK).await;
    let out = mock
        .dispatcher()
        .dispatch(&request(TaskKind::Review), &settings_for(ProviderId::Deepseek))
        .await
        .unwrap();
    assert_eq!(out, "X");

    let req = mock.only_request();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/deepseek/chat/completions");
    assert_eq!(req.headers.get(header::AUTHORIZATION).unwrap(), "Bearer sk-test");
    assert_eq!(req.headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(req.body["model"], "deepseek-chat");
    assert_eq!(req.body["stream"], false);
    assert_eq!(req.body["temperature"].as_f64(), Some(0.7));
    assert_eq!(
        req.body["messages"],
        serde_json::json!([
            {"role": "system", "content": "You are a mentor."},
            {"role": "user", "content": "What is a closure?"}
        ])
    );
}

#[tokio::test]
async fn chat_creation_uses_low_temperature_and_stored_model() {
    let mock = mock_provider(200, CHAT_OK).await;
    let mut settings = settings_for(ProviderId::Kimi);
    settings.set_model_name(ProviderId::Kimi, "moonshot-v1-32k");
    mock.dispatcher().dispatch(&request(TaskKind::Creation), &settings).await.unwrap();

    let req = mock.only_request();
    assert_eq!(req.path, "/kimi/chat/completions");
    assert_eq!(req.body["model"], "moonshot-v1-32k");
    assert_eq!(req.body["temperature"].as_f64(), Some(0.2));
}

#[tokio::test]
async fn chat_empty_model_name_falls_back_to_default() {
    let mock = mock_provider(200, CHAT_OK).await;
    let mut settings = settings_for(ProviderId::Volcano);
    settings.set_model_name(ProviderId::Volcano, "");
    mock.dispatcher().dispatch(&request(TaskKind::Concept), &settings).await.unwrap();
    assert_eq!(mock.only_request().body["model"], "doubao-pro-4k");
}

#[tokio::test]
async fn chat_server_error_carries_status_and_body() {
    let mock = mock_provider(500, r#"{"error":"boom"}"#).await;
    let err = mock
        .dispatcher()
        .dispatch(&request(TaskKind::Concept), &settings_for(ProviderId::Deepseek))
        .await
        .unwrap_err();

    match &err {
        DispatchError::NonSuccessStatus { provider, status, body } => {
            assert_eq!(*provider, ProviderId::Deepseek);
            assert_eq!(*status, 500);
            assert_eq!(body, &serde_json::json!({"error": "boom"}));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let msg = err.user_message(Language::En);
    assert!(msg.contains("DeepSeek"), "{msg}");
    assert!(msg.contains(r#"{"error":"boom"}"#), "{msg}");
    assert_eq!(mock.requests().len(), 1, "no retry");
}

#[tokio::test]
async fn chat_error_body_that_is_not_json_becomes_empty_object() {
    let mock = mock_provider(502, "<html>bad gateway</html>").await;
    let err = mock
        .dispatcher()
        .dispatch(&request(TaskKind::Concept), &settings_for(ProviderId::Glm))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Zhipu GLM Error: API responded with 502: {}");
}

// ── Diagnostics ────────────────────────────────────────────────────────────

/// In-memory sink for a thread-local `fmt` subscriber.
#[derive(Clone, Default)]
struct LogSink(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogSink {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[tokio::test]
async fn failure_writes_error_line_without_secrets() {
    let sink = LogSink::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    // Current-thread runtime: the dispatch future is polled on this thread.
    let _guard = tracing::subscriber::set_default(subscriber);

    let mock = mock_provider(500, r#"{"error":"boom"}"#).await;
    let mut settings = settings_for(ProviderId::Deepseek);
    settings.set_api_key(ProviderId::Deepseek, "sk-do-not-log");
    mock.dispatcher()
        .dispatch(&request(TaskKind::Concept), &settings)
        .await
        .unwrap_err();

    let logs = sink.text();
    let line = logs
        .lines()
        .find(|l| l.contains("ERROR") && l.contains("AI request failed"))
        .unwrap_or_else(|| panic!("no error line in:\n{logs}"));
    assert!(line.contains("provider=deepseek"), "{line}");
    assert!(line.contains("API responded with 500"), "{line}");
    assert!(!logs.contains("sk-do-not-log"), "secret leaked:\n{logs}");
}

#[tokio::test]
async fn missing_key_logs_warning() {
    let sink = LogSink::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dispatcher = Dispatcher::new(Catalog::builtin(), None).unwrap();
    let mut settings = AiSettings::default();
    settings.select(ProviderId::Kimi);
    dispatcher.dispatch(&request(TaskKind::Review), &settings).await.unwrap_err();

    let logs = sink.text();
    assert!(logs.contains("WARN") && logs.contains("no API key configured"), "{logs}");
    assert!(logs.contains("provider=kimi"), "{logs}");
}

#[tokio::test]
async fn chat_empty_choices_yields_placeholder() {
    let mock = mock_provider(200, r#"{"choices":[]}"#).await;
    let out = mock
        .dispatcher()
        .dispatch(&request(TaskKind::Concept), &settings_for(ProviderId::Glm))
        .await
        .unwrap();
    assert_eq!(out, "No response content.");
}

#[tokio::test]
async fn chat_null_content_yields_placeholder() {
    let mock = mock_provider(200, r#"{"choices":[{"message":{"content":null}}]}"#).await;
    let out = mock
        .dispatcher()
        .dispatch(&request(TaskKind::Concept), &settings_for(ProviderId::Kimi))
        .await
        .unwrap();
    assert_eq!(out, "No response content.");
}

#[tokio::test]
async fn chat_undecodable_success_body_is_malformed() {
    let mock = mock_provider(200, "not json").await;
    let err = mock
        .dispatcher()
        .dispatch(&request(TaskKind::Concept), &settings_for(ProviderId::Deepseek))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::MalformedResponse { provider: ProviderId::Deepseek, .. }));
    assert!(err.to_string().starts_with("DeepSeek Error:"));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let catalog = Catalog::builtin().with_endpoint(ProviderId::Kimi, format!("http://{addr}/v1/chat/completions"));
    let dispatcher = Dispatcher::new(catalog, None).unwrap();
    let settings = settings_for(ProviderId::Kimi);

    let err = dispatcher.dispatch(&request(TaskKind::Concept), &settings).await.unwrap_err();
    assert!(matches!(err, DispatchError::Transport { provider: ProviderId::Kimi, .. }));

    let text = dispatcher.dispatch_text(&request(TaskKind::Concept), &settings).await;
    assert!(text.starts_with("Kimi (Moonshot) Error:"), "{text}");
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let mock = mock_provider(200, CHAT_OK).await;
    let dispatcher = mock.dispatcher();
    let settings = settings_for(ProviderId::Deepseek);
    let concept = request(TaskKind::Concept);
    let creation = request(TaskKind::Creation);

    let (a, b) = tokio::join!(
        dispatcher.dispatch(&concept, &settings),
        dispatcher.dispatch(&creation, &settings),
    );
    assert_eq!(a.unwrap(), "X");
    assert_eq!(b.unwrap(), "X");

    let mut temps: Vec<f64> = mock
        .requests()
        .iter()
        .filter_map(|r| r.body["temperature"].as_f64())
        .collect();
    temps.sort_by(|x, y| x.partial_cmp(y).unwrap());
    assert_eq!(temps, vec![0.2, 0.7]);
}

// ── Tutor entry points ─────────────────────────────────────────────────────

#[tokio::test]
async fn explain_concept_sends_templated_prompt() {
    let mock = mock_provider(200, CHAT_OK).await;
    let system = system_instruction(TaskKind::Concept, Language::Cn, None);
    let out = tutor::explain_concept(
        &mock.dispatcher(),
        "Closures & Scope",
        &system,
        Language::Cn,
        &settings_for(ProviderId::Glm),
    )
    .await
    .unwrap();
    assert_eq!(out, "X");

    let req = mock.only_request();
    assert_eq!(req.body["messages"][0]["content"], system.as_str());
    assert_eq!(
        req.body["messages"][1]["content"],
        tutor::concept_prompt("Closures & Scope", Language::Cn).as_str()
    );
    assert_eq!(req.body["temperature"].as_f64(), Some(0.7));
}

#[tokio::test]
async fn generate_code_passes_prior_context() {
    let mock = mock_provider(200, CHAT_OK).await;
    tutor::generate_code(
        &mock.dispatcher(),
        "add a dark mode toggle",
        "sys",
        Language::En,
        "<button>Toggle</button>",
        &settings_for(ProviderId::Deepseek),
    )
    .await
    .unwrap();

    let req = mock.only_request();
    let prompt = req.body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.starts_with("User Request: add a dark mode toggle"));
    assert!(prompt.contains("Current Code Context: <button>Toggle</button>"));
    assert_eq!(req.body["temperature"].as_f64(), Some(0.2));
}

#[tokio::test]
async fn review_code_text_renders_failure() {
    let mock = mock_provider(500, r#"{"error":"boom"}"#).await;
    let out = tutor::review_code_text(
        &mock.dispatcher(),
        "const a = 1",
        "sys",
        Language::En,
        &settings_for(ProviderId::Volcano),
    )
    .await;
    assert_eq!(out, r#"Volcano Engine (Doubao) Error: API responded with 500: {"error":"boom"}"#);
}
