use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Note {
    pub id: i32,
    pub text: String,
    /// Filled by the column default; nullable in the table definition.
    pub created_at: Option<NaiveDateTime>,
}

/// Shape returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteSummary {
    pub id: i32,
    pub text: String,
}

impl From<Note> for NoteSummary {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            text: n.text,
        }
    }
}
