use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::Deserialize;

use crate::NotesError;

#[derive(Debug, Deserialize)]
struct AddNoteBody {
    #[serde(default)]
    text: Option<String>,
}

/// Validated body of `POST /add`: the note text, trimmed and non-empty.
#[derive(Debug)]
pub struct NoteInput(pub String);

impl<S> FromRequest<S> for NoteInput
where
    S: Send + Sync,
{
    type Rejection = NotesError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<AddNoteBody>::from_request(req, state)
            .await
            .map_err(|rejection| NotesError::InvalidBody(rejection.body_text()))?;

        let text = body.text.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(NotesError::EmptyText);
        }
        Ok(NoteInput(text.to_string()))
    }
}
