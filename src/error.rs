use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum NotesError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Invalid database name: {0:?}")]
    InvalidDatabaseName(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Text cannot be empty")]
    EmptyText,

    #[error("Note {0} not found")]
    NoteNotFound(i32),

    #[error("Initialization task aborted: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Database initialization failed: {0}")]
    InitFailed(#[source] Box<NotesError>),
}

impl NotesError {
    pub fn status(&self) -> StatusCode {
        match self {
            NotesError::InvalidBody(_) | NotesError::EmptyText => StatusCode::BAD_REQUEST,
            NotesError::NoteNotFound(_) => StatusCode::NOT_FOUND,
            NotesError::DatabaseError(_)
            | NotesError::ConnectTimeout(_)
            | NotesError::InvalidDatabaseName(_)
            | NotesError::TaskJoin(_)
            | NotesError::InitFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NotesError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_body = match &self {
            NotesError::InvalidBody(reason) => ApiErrorBody {
                code: "INVALID_BODY".to_string(),
                message: reason.clone(),
            },
            NotesError::EmptyText => ApiErrorBody {
                code: "EMPTY_TEXT".to_string(),
                message: "Text cannot be empty".to_string(),
            },
            NotesError::NoteNotFound(_) => ApiErrorBody {
                code: "NOT_FOUND".to_string(),
                message: "Note not found".to_string(),
            },
            NotesError::InitFailed(_) | NotesError::TaskJoin(_) => ApiErrorBody {
                code: "INIT_FAILED".to_string(),
                message: "Database initialization failed".to_string(),
            },
            NotesError::DatabaseError(_)
            | NotesError::ConnectTimeout(_)
            | NotesError::InvalidDatabaseName(_) => ApiErrorBody {
                code: "DATABASE_ERROR".to_string(),
                message: "Database operation failed".to_string(),
            },
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
