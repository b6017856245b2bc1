use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::db::models::NoteSummary;
use crate::middleware::note_input::NoteInput;
use crate::{NotesError, router::NotesState};

#[derive(Debug, Serialize)]
pub struct AddNoteResponse {
    pub id: i32,
    pub text: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /notes -> all notes, newest first.
pub async fn list_notes(
    State(state): State<NotesState>,
) -> Result<Json<Vec<NoteSummary>>, NotesError> {
    let notes = state.store.list().await?;
    Ok(Json(notes.into_iter().map(NoteSummary::from).collect()))
}

/// POST /add -> stores the trimmed text.
pub async fn add_note(
    State(state): State<NotesState>,
    NoteInput(text): NoteInput,
) -> Result<Json<AddNoteResponse>, NotesError> {
    let note = state.store.insert(&text).await?;
    Ok(Json(AddNoteResponse {
        id: note.id,
        text: note.text,
        message: "Note added successfully",
    }))
}

/// DELETE /delete/{id}
pub async fn delete_note(
    State(state): State<NotesState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, NotesError> {
    if !state.store.delete(id).await? {
        return Err(NotesError::NoteNotFound(id));
    }
    Ok(Json(MessageResponse {
        message: format!("Note {id} deleted successfully"),
    }))
}
