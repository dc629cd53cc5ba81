//! HTTP surface: operation endpoint, list shortcut, health, subscriptions.
//!
//! # Routes
//!
//! - `POST /graphql` - run a named query or mutation
//! - `GET /todos?filter=active` - list todos
//! - `GET /health` - liveness with store counters
//! - `GET /subscriptions` - WebSocket change subscriptions
//!
//! # Example
//!
//! ```bash
//! curl -X POST http://localhost:4000/graphql \
//!   -H "Content-Type: application/json" \
//!   -d '{"operation": "addTodo", "value": "Buy milk"}'
//! # {"data":{"id":"2","value":"Buy milk","completed":false}}
//! ```

use crate::error::AppError;
use crate::filter::Filter;
use crate::models::{Channel, Todo};
use crate::resolver::{self, Operation, OperationResult};
use crate::store::SharedStore;
use crate::subscriptions;
use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            started_at: Utc::now(),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/graphql", post(execute))
        .route("/todos", get(list_todos))
        .route("/health", get(health))
        .route("/subscriptions", get(subscriptions::handle))
        .with_state(state)
}

/// Serve `router(state)` on `listener` until Ctrl-C
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}

#[derive(Debug, Serialize)]
struct OperationResponse {
    data: OperationResult,
}

async fn execute(
    State(state): State<AppState>,
    payload: Result<Json<Operation>, JsonRejection>,
) -> Result<Json<OperationResponse>, AppError> {
    let Json(op) = payload?;

    let request_id = Uuid::now_v7();
    let span = info_span!("operation", %request_id, name = op.name());
    async move {
        info!(mutation = op.is_mutation(), "Operation received");
        let data = resolver::resolve(&state.store, op).await;
        Ok(Json(OperationResponse { data }))
    }
    .instrument(span)
    .await
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    filter: Filter,
}

async fn list_todos(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let Query(params) = params?;
    let todos = state.store.lock().await.list_filtered(params.filter);
    Ok(Json(todos))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Listeners {
    todo_added: usize,
    todo_updated: usize,
    todo_deleted: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct Health {
    status: String,
    todos: usize,
    listeners: Listeners,
    started_at: DateTime<Utc>,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let store = state.store.lock().await;
    Json(Health {
        status: "ok".to_string(),
        todos: store.len(),
        listeners: Listeners {
            todo_added: store.listener_count(Channel::TodoAdded),
            todo_updated: store.listener_count(Channel::TodoUpdated),
            todo_deleted: store.listener_count(Channel::TodoDeleted),
        },
        started_at: state.started_at,
    })
}
