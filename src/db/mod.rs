//! Database module: models, schema and PostgreSQL access.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL and identifier helpers
//! - `store.rs`: the `NoteStore` seam used by request handlers
//! - `postgres.rs`: connection settings and the Postgres-backed implementations
//! - `probe.rs`: availability probe with a configurable retry policy

pub mod models;
pub mod postgres;
pub mod probe;
pub mod schema;
pub mod store;

pub use models::{Note, NoteSummary};
pub use postgres::{ConnectionSettings, PgNoteStore, PgProvisioner};
pub use probe::{RetryPolicy, wait_for_database};
pub use store::NoteStore;
