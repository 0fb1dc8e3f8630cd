#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use room_chat::common::{ChatMessage, NewMessage, SessionEvent};
use room_chat::config::CompletionConfig;
use room_chat::error::StoreError;
use room_chat::storage::{ErrorCallback, MessageStore, SnapshotCallback, Subscription};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

pub const REPLY_BODY: &str = r#"{"result":{"alternatives":[{"message":{"role":"assistant","text":"hi there"},"status":"ALTERNATIVE_STATUS_FINAL"}]}}"#;
pub const EMPTY_BODY: &str = r#"{"result":{"alternatives":[]}}"#;

pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

pub struct MockCompletion {
    pub url: String,
    pub captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockCompletion {
    pub fn request_count(&self) -> usize {
        self.captured.lock().unwrap().len()
    }
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: &'static str,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn handle_completion(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .captured
        .lock()
        .unwrap()
        .push(CapturedRequest { authorization, body });
    (state.status, state.body.to_string())
}

/// Local stand-in for the completion endpoint answering every request the same way.
pub async fn spawn_completion_server(status: StatusCode, body: &'static str) -> MockCompletion {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/completion", post(handle_completion))
        .with_state(MockState {
            status,
            body,
            captured: Arc::clone(&captured),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockCompletion {
        url: format!("http://{addr}/completion"),
        captured,
    }
}

pub fn completion_config(endpoint: &str) -> CompletionConfig {
    CompletionConfig {
        endpoint: endpoint.to_string(),
        api_key: "test-key".to_string(),
        model_uri: "gpt://test-folder/yandexgpt-lite".to_string(),
        timeout_secs: 5,
        ..CompletionConfig::default()
    }
}

pub async fn next_event(events: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
    timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("session event channel closed")
}

/// Collects events up to and including the end of the current send turn.
pub async fn events_until_finished(
    events: &mut UnboundedReceiver<SessionEvent>,
) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let finished = event == SessionEvent::SendFinished;
        seen.push(event);
        if finished {
            return seen;
        }
    }
}

pub fn notices(events: &[SessionEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Notice(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Store whose reads and subscriptions always fail; appends are accepted.
#[derive(Default)]
pub struct BrokenStore {
    pub appended: Mutex<Vec<ChatMessage>>,
}

impl MessageStore for BrokenStore {
    fn fetch_ordered(&self) -> Result<Vec<ChatMessage>, StoreError> {
        Err(StoreError::Poisoned)
    }

    fn append(&self, message: NewMessage) -> Result<ChatMessage, StoreError> {
        let mut appended = self.appended.lock().unwrap();
        let stored = message.into_message(format!("broken-{}", appended.len()));
        appended.push(stored.clone());
        Ok(stored)
    }

    fn subscribe(&self, _on_snapshot: SnapshotCallback, on_error: ErrorCallback) -> Subscription {
        on_error(StoreError::Poisoned);
        Subscription::new(|| {})
    }
}
