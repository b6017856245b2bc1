use crate::db::models::Note;
use crate::db::probe::{RetryPolicy, wait_for_database};
use crate::db::schema::{
    COUNT_NOTES, DATABASE_EXISTS, INSERT_SEED, NOTES_TABLE, create_database,
};
use crate::db::store::NoteStore;
use crate::error::NotesError;
use crate::service::initializer::SchemaProvisioner;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Executor};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// SQLSTATE raised when `CREATE DATABASE` loses a race with another creator.
const DUPLICATE_DATABASE: &str = "42P04";

#[derive(Clone)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub maintenance_database: String,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("maintenance_database", &self.maintenance_database)
            .finish()
    }
}

impl ConnectionSettings {
    pub fn options_for(&self, database: &str) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(database)
    }

    pub fn target_options(&self) -> PgConnectOptions {
        self.options_for(&self.database)
    }

    pub fn maintenance_options(&self) -> PgConnectOptions {
        self.options_for(&self.maintenance_database)
    }
}

/// Open a single unpooled connection, bounded by `timeout`.
pub async fn connect(
    opts: &PgConnectOptions,
    timeout: Duration,
) -> Result<PgConnection, NotesError> {
    match tokio::time::timeout(timeout, PgConnection::connect_with(opts)).await {
        Ok(conn) => Ok(conn?),
        Err(_) => Err(NotesError::ConnectTimeout(timeout)),
    }
}

/// A committed write stands even if closing its connection fails.
fn keep_after_close<T>(value: T, closed: Result<(), sqlx::Error>) -> T {
    if let Err(e) = closed {
        warn!(error = %e, "failed to close connection after write");
    }
    value
}

/// Note storage that opens a fresh connection per operation.
#[derive(Clone)]
pub struct PgNoteStore {
    opts: PgConnectOptions,
    connect_timeout: Duration,
}

impl PgNoteStore {
    pub fn new(settings: &ConnectionSettings, connect_timeout: Duration) -> Self {
        Self {
            opts: settings.target_options(),
            connect_timeout,
        }
    }

    async fn connect(&self) -> Result<PgConnection, NotesError> {
        connect(&self.opts, self.connect_timeout).await
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn list(&self) -> Result<Vec<Note>, NotesError> {
        let mut conn = self.connect().await?;
        let notes = sqlx::query_as::<_, Note>(
            "SELECT id, text, created_at FROM notes ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;
        Ok(notes)
    }

    async fn insert(&self, text: &str) -> Result<Note, NotesError> {
        let mut conn = self.connect().await?;
        let note = sqlx::query_as::<_, Note>(
            "INSERT INTO notes (text) VALUES ($1) RETURNING id, text, created_at",
        )
        .bind(text)
        .fetch_one(&mut conn)
        .await?;
        Ok(keep_after_close(note, conn.close().await))
    }

    async fn delete(&self, id: i32) -> Result<bool, NotesError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&mut conn)
            .await?;
        Ok(keep_after_close(
            result.rows_affected() > 0,
            conn.close().await,
        ))
    }

    async fn ping(&self) -> Result<(), NotesError> {
        let conn = self.connect().await?;
        conn.close().await?;
        Ok(())
    }
}

/// Creates the notes database and table on a PostgreSQL server.
pub struct PgProvisioner {
    settings: ConnectionSettings,
    policy: RetryPolicy,
    seed_text: String,
}

impl PgProvisioner {
    pub fn new(settings: ConnectionSettings, policy: RetryPolicy, seed_text: String) -> Self {
        Self {
            settings,
            policy,
            seed_text,
        }
    }

    /// Create the target database if `pg_database` does not list it.
    /// Returns whether it was created by this call.
    pub async fn ensure_database(&self) -> Result<bool, NotesError> {
        let name = self.settings.database.as_str();
        let ddl = create_database(name)?;
        let mut conn = connect(
            &self.settings.maintenance_options(),
            self.policy.connect_timeout,
        )
        .await?;

        let exists: Option<i32> = sqlx::query_scalar(DATABASE_EXISTS)
            .bind(name)
            .fetch_optional(&mut conn)
            .await?;

        let created = match exists {
            Some(_) => {
                debug!(database = name, "database already exists");
                false
            }
            None => {
                // CREATE DATABASE refuses to run inside a transaction block,
                // so it goes through the simple query protocol.
                match conn.execute(ddl.as_str()).await {
                    Ok(_) => {
                        info!(database = name, "created database");
                        true
                    }
                    Err(sqlx::Error::Database(e))
                        if e.code().as_deref() == Some(DUPLICATE_DATABASE) =>
                    {
                        debug!(database = name, "database created concurrently");
                        false
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        conn.close().await?;
        Ok(created)
    }

    /// Create the notes table and seed it when empty, in one transaction.
    /// Returns whether the seed row was inserted.
    pub async fn ensure_table_and_seed(&self) -> Result<bool, NotesError> {
        let mut conn = connect(
            &self.settings.target_options(),
            self.policy.connect_timeout,
        )
        .await?;

        let mut tx = conn.begin().await?;
        sqlx::query(NOTES_TABLE).execute(&mut *tx).await?;
        let count: i64 = sqlx::query_scalar(COUNT_NOTES)
            .fetch_one(&mut *tx)
            .await?;
        let seeded = count == 0;
        if seeded {
            sqlx::query(INSERT_SEED)
                .bind(&self.seed_text)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        if seeded {
            info!("inserted seed note");
        }
        conn.close().await?;
        Ok(seeded)
    }
}

#[async_trait]
impl SchemaProvisioner for PgProvisioner {
    async fn wait_until_available(&self) -> bool {
        wait_for_database(&self.settings, &self.policy).await
    }

    async fn provision(&self) -> Result<(), NotesError> {
        self.ensure_database().await?;
        self.ensure_table_and_seed().await?;
        Ok(())
    }
}
