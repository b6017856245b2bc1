//! SQL for provisioning the notes database.

use crate::error::NotesError;

/// Postgres truncates identifiers longer than this.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Notes table:
/// - `id` SERIAL surrogate key
/// - `text` required body
/// - `created_at` defaulted by the server
pub const NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    id SERIAL PRIMARY KEY,
    text TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

pub const DATABASE_EXISTS: &str = "SELECT 1 FROM pg_database WHERE datname = $1";

pub const COUNT_NOTES: &str = "SELECT COUNT(*) FROM notes";

pub const INSERT_SEED: &str = "INSERT INTO notes (text) VALUES ($1)";

/// Quote a database name for use in DDL, which cannot take bind parameters.
pub fn quote_identifier(name: &str) -> Result<String, NotesError> {
    if name.is_empty() || name.len() > MAX_IDENTIFIER_LEN || name.contains('\0') {
        return Err(NotesError::InvalidDatabaseName(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

pub fn create_database(name: &str) -> Result<String, NotesError> {
    Ok(format!("CREATE DATABASE {}", quote_identifier(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_wrapped_in_quotes() {
        assert_eq!(quote_identifier("notesdb").unwrap(), "\"notesdb\"");
        assert_eq!(
            create_database("notesdb").unwrap(),
            "CREATE DATABASE \"notesdb\""
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(
            quote_identifier("no\"tes; DROP").unwrap(),
            "\"no\"\"tes; DROP\""
        );
    }

    #[test]
    fn unusable_names_are_rejected() {
        assert!(matches!(
            quote_identifier(""),
            Err(NotesError::InvalidDatabaseName(_))
        ));
        assert!(quote_identifier("bad\0name").is_err());
        assert!(quote_identifier(&"n".repeat(64)).is_err());
        assert!(quote_identifier(&"n".repeat(63)).is_ok());
    }
}
