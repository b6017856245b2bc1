use crate::db::models::Note;
use crate::error::NotesError;
use async_trait::async_trait;

/// Storage operations behind the note endpoints.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All notes, newest first.
    async fn list(&self) -> Result<Vec<Note>, NotesError>;

    /// Insert a note whose text has already been validated.
    async fn insert(&self, text: &str) -> Result<Note, NotesError>;

    /// Physically remove a note. Returns `false` when no row matched.
    async fn delete(&self, id: i32) -> Result<bool, NotesError>;

    /// Open and close a connection to the notes database.
    async fn ping(&self) -> Result<(), NotesError>;
}
