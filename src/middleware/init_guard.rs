use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::router::NotesState;

/// Runs probe + initialization ahead of any request until the schema is
/// ready. A failure is logged and the request still goes through.
pub async fn ensure_initialized(
    State(state): State<NotesState>,
    req: Request,
    next: Next,
) -> Response {
    if !state.initializer.is_ready() {
        info!(path = %req.uri().path(), "schema not ready; initializing before request");
        if !state.initializer.ensure_ready().await {
            warn!("database not initialized; serving request degraded");
        }
    }
    next.run(req).await
}
