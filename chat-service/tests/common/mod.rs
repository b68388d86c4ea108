//! Test helpers: an in-memory task backend served on an ephemeral port,
//! plus application state wiring for handler-level tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use chat_service::config::{BackendSettings, ChatConfig, OpenAiSettings};
use chat_service::conversation::{Clock, SessionStore};
use chat_service::services::providers::ChatProvider;
use chat_service::AppState;

/// The only token the mock backend accepts.
pub const TEST_TOKEN: &str = "test-token";

#[derive(Clone)]
struct BackendState {
    tasks: Arc<Mutex<BTreeMap<i64, Value>>>,
    next_id: Arc<AtomicI64>,
}

/// A running in-memory task backend.
pub struct MockBackend {
    pub base_url: String,
    pub addr: SocketAddr,
}

/// Spawn the mock backend on an ephemeral port.
pub async fn spawn_backend() -> MockBackend {
    let state = BackendState {
        tasks: Arc::new(Mutex::new(BTreeMap::new())),
        next_id: Arc::new(AtomicI64::new(1)),
    };

    let router = Router::new()
        .route("/api/tasks", post(create_task).get(list_tasks))
        .route(
            "/api/tasks/:id",
            axum::routing::get(get_task)
                .patch(patch_task)
                .delete(delete_task),
        )
        .route("/api/tasks/:id/complete", patch(toggle_complete))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{addr}"),
        addr,
    }
}

/// Config pointing at the mock backend.
pub fn test_config(backend_url: &str) -> ChatConfig {
    ChatConfig {
        common: service_core::config::Config {
            port: 8001,
            log_level: "error".to_string(),
        },
        openai: OpenAiSettings {
            api_key: "sk-test".to_string(),
            model: "gpt-test".to_string(),
        },
        backend: BackendSettings {
            base_url: backend_url.to_string(),
            timeout_seconds: 5,
        },
    }
}

/// Application state wired to the mock backend and a supplied provider.
pub fn test_state(
    backend_url: &str,
    provider: Arc<dyn ChatProvider>,
    clock: Arc<dyn Clock>,
) -> AppState {
    AppState {
        config: test_config(backend_url),
        sessions: SessionStore::new(clock),
        provider,
    }
}

// ============================================================================
// Mock backend handlers
// ============================================================================

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TEST_TOKEN}");
    let supplied = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if supplied == Some(expected.as_str()) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid token" })),
        )
            .into_response())
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Task not found" })),
    )
        .into_response()
}

async fn create_task(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&headers) {
        return response;
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let now = Utc::now();
    let task = json!({
        "id": id,
        "user_id": "00000000-0000-0000-0000-000000000001",
        "title": body.get("title").and_then(Value::as_str).unwrap_or_default(),
        "description": body.get("description").and_then(Value::as_str).unwrap_or_default(),
        "completed": false,
        "created_at": now,
        "updated_at": now,
    });

    state.tasks.lock().unwrap().insert(id, task.clone());
    (StatusCode::CREATED, Json(task)).into_response()
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    completed: Option<bool>,
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn list_tasks(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    if let Err(response) = authorize(&headers) {
        return response;
    }

    let limit = query.limit.unwrap_or(100);
    let offset = query.offset.unwrap_or(0);

    let tasks = state.tasks.lock().unwrap();
    let filtered: Vec<Value> = tasks
        .values()
        .filter(|task| match query.completed {
            Some(completed) => task["completed"] == Value::Bool(completed),
            None => true,
        })
        .cloned()
        .collect();

    let total = filtered.len();
    let page: Vec<Value> = filtered.into_iter().skip(offset).take(limit).collect();

    Json(json!({
        "tasks": page,
        "total": total,
        "limit": limit,
        "offset": offset,
    }))
    .into_response()
}

async fn get_task(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = authorize(&headers) {
        return response;
    }

    match state.tasks.lock().unwrap().get(&id) {
        Some(task) => Json(task.clone()).into_response(),
        None => not_found(),
    }
}

async fn patch_task(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&headers) {
        return response;
    }

    let mut tasks = state.tasks.lock().unwrap();
    let Some(task) = tasks.get_mut(&id) else {
        return not_found();
    };

    for field in ["title", "description", "completed"] {
        if let Some(value) = body.get(field) {
            task[field] = value.clone();
        }
    }
    task["updated_at"] = json!(Utc::now());

    Json(task.clone()).into_response()
}

async fn delete_task(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = authorize(&headers) {
        return response;
    }

    match state.tasks.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

async fn toggle_complete(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = authorize(&headers) {
        return response;
    }

    let mut tasks = state.tasks.lock().unwrap();
    let Some(task) = tasks.get_mut(&id) else {
        return not_found();
    };

    let completed = task["completed"].as_bool().unwrap_or(false);
    task["completed"] = Value::Bool(!completed);
    task["updated_at"] = json!(Utc::now());

    Json(task.clone()).into_response()
}
