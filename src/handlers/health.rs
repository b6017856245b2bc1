use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::handlers::notes::MessageResponse;
use crate::{NotesError, router::NotesState};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub initialized: bool,
}

#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub message: &'static str,
    pub database_host: String,
    pub database_name: String,
    pub database_initialized: bool,
    pub timestamp: f64,
}

/// GET /health -> initializes if needed, then checks connectivity.
pub async fn health(State(state): State<NotesState>) -> (StatusCode, Json<HealthReport>) {
    if !state.initializer.is_ready() {
        state.initializer.ensure_ready().await;
    }

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthReport {
                status: "healthy",
                database: "connected",
                initialized: state.initializer.is_ready(),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "health check could not reach database");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthReport {
                    status: "unhealthy",
                    database: "disconnected",
                    initialized: state.initializer.is_ready(),
                }),
            )
        }
    }
}

/// GET /init -> forces schema initialization.
pub async fn force_init(
    State(state): State<NotesState>,
) -> Result<Json<MessageResponse>, NotesError> {
    state.initializer.initialize().await?;
    Ok(Json(MessageResponse {
        message: "Database initialized successfully".to_string(),
    }))
}

/// GET /test -> static diagnostics; never touches the database.
pub async fn diagnostics(State(state): State<NotesState>) -> Json<Diagnostics> {
    let now = Utc::now();
    Json(Diagnostics {
        message: "API is working",
        database_host: state.database_host.to_string(),
        database_name: state.database_name.to_string(),
        database_initialized: state.initializer.is_ready(),
        timestamp: now.timestamp_micros() as f64 / 1_000_000.0,
    })
}
