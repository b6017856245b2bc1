use crate::config::Config;
use crate::db::store::NoteStore;
use crate::handlers::{health, notes};
use crate::middleware::init_guard::ensure_initialized;
use crate::service::initializer::SchemaInitializer;
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct NotesState {
    pub store: Arc<dyn NoteStore>,
    pub initializer: Arc<SchemaInitializer>,
    pub database_host: Arc<str>,
    pub database_name: Arc<str>,
}

impl NotesState {
    pub fn new(
        store: Arc<dyn NoteStore>,
        initializer: Arc<SchemaInitializer>,
        cfg: &Config,
    ) -> Self {
        Self {
            store,
            initializer,
            database_host: Arc::from(cfg.db_host.as_str()),
            database_name: Arc::from(cfg.db_name.as_str()),
        }
    }
}

pub fn notes_router(state: NotesState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/test", get(health::diagnostics))
        .route("/init", get(health::force_init))
        .route("/notes", get(notes::list_notes))
        .route("/add", post(notes::add_note))
        .route("/delete/{id}", delete(notes::delete_note))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ensure_initialized,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
