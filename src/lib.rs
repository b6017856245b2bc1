pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;

pub use error::NotesError;
pub use router::{NotesState, notes_router};
pub use service::initializer::SchemaInitializer;
