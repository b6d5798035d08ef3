//! Liveness check that also confirms the database answers queries.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::AppState;

#[derive(Debug, Clone)]
pub struct HealthState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Respond with 200 `{"status": "ok"}` if the database can run `SELECT 1`,
/// otherwise 503 `{"status": "error"}`.
pub async fn get_health(State(state): State<HealthState>) -> Response {
    let check = state
        .db_connection
        .lock()
        .map_err(|error| error.to_string())
        .and_then(|connection| {
            connection
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(|error| error.to_string())
        });

    match check {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(error) => {
            tracing::error!("health check failed: {error}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error" })),
            )
                .into_response()
        }
    }
}
