use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection, SqliteConnection};
use tracing::{debug, error, instrument, warn};

use super::DB_FILE_NAME;
use super::schema::{self, Outcome, Statement};
use crate::codec;
use crate::error::{PrefsError, Result};

/// Attempts per statement: the original run plus one after creating the table.
const SCHEMA_REPAIR_ATTEMPTS: usize = 2;

/// An open application store.
///
/// The handle is created without touching disk. The first operation creates
/// the application directory, opens the database and begins a transaction
/// that stays active until [`AppHandle::close`]. Dropping a handle without
/// closing it discards uncommitted writes.
pub struct AppHandle {
    app_id: String,
    dir: PathBuf,
    busy_timeout: Duration,
    conn: Option<SqliteConnection>,
}

impl std::fmt::Debug for AppHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppHandle")
            .field("app_id", &self.app_id)
            .field("dir", &self.dir)
            .field("open", &self.conn.is_some())
            .finish()
    }
}

impl AppHandle {
    pub(super) fn new(app_id: &str, dir: PathBuf, busy_timeout: Duration) -> Self {
        Self {
            app_id: app_id.to_owned(),
            dir,
            busy_timeout,
            conn: None,
        }
    }

    /// The application this handle belongs to.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Directory holding the application's database file.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a connection and its transaction are currently held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    async fn connection(&mut self) -> Result<&mut SqliteConnection> {
        if self.conn.is_none() {
            if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
                warn!(dir = %self.dir.display(), error = %e, "Failed to create store directory");
            }
            let mut conn = SqliteConnectOptions::new()
                .filename(self.dir.join(DB_FILE_NAME))
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Delete)
                .busy_timeout(self.busy_timeout)
                .connect()
                .await?;
            sqlx::query("BEGIN").execute(&mut conn).await?;
            debug!(app_id = %self.app_id, "Opened application store");
            self.conn = Some(conn);
        }
        self.conn.as_mut().ok_or(PrefsError::Internal)
    }

    /// Runs `statement`, creating the table and retrying once if it is missing.
    async fn run(&mut self, statement: Statement<'_>) -> Result<Outcome> {
        for attempt in 0..SCHEMA_REPAIR_ATTEMPTS {
            let conn = self.connection().await?;
            match statement.execute(conn).await.map_err(PrefsError::from) {
                Err(err) if err.is_missing_table() && attempt + 1 < SCHEMA_REPAIR_ATTEMPTS => {
                    debug!(app_id = %self.app_id, "Table missing, creating it");
                    let conn = self.connection().await?;
                    schema::create_table(conn).await?;
                }
                Err(err) => {
                    error!(app_id = %self.app_id, error = ?err, "Statement failed");
                    return Err(err);
                }
                Ok(outcome) => return Ok(outcome),
            }
        }
        Err(PrefsError::Internal)
    }

    /// Reads the raw JSON text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::NoSuchKey`] if no row exists and
    /// [`PrefsError::ValueNotJson`] if the stored text is not a document.
    #[instrument(skip(self), fields(app_id = %self.app_id))]
    pub async fn get(&mut self, key: &str) -> Result<String> {
        let Outcome::Value(value) = self.run(Statement::Lookup { key }).await? else {
            return Err(PrefsError::Internal);
        };
        let value = value.ok_or(PrefsError::NoSuchKey)?;
        if codec::validate_document(&value).is_err() {
            warn!(key, "Stored value is not a JSON document");
            return Err(PrefsError::ValueNotJson);
        }
        Ok(value)
    }

    /// Reads the value under `key` as parsed JSON.
    ///
    /// # Errors
    ///
    /// Same as [`AppHandle::get`].
    pub async fn get_document(&mut self, key: &str) -> Result<Value> {
        let text = self.get(key).await?;
        codec::parse_document(&text)
    }

    /// Reads a string written by [`AppHandle::set_string`].
    ///
    /// # Errors
    ///
    /// Same as [`AppHandle::get`], plus [`PrefsError::ValueNotJson`] if the
    /// value is not a one-element string array.
    pub async fn get_string(&mut self, key: &str) -> Result<String> {
        let value = self.get_document(key).await?;
        codec::unwrap_scalar(&value).map(str::to_owned)
    }

    /// Reads an integer written by [`AppHandle::set_int`].
    ///
    /// # Errors
    ///
    /// Same as [`AppHandle::get_string`], plus [`PrefsError::ValueNotJson`] if
    /// the string is not a base-10 integer.
    pub async fn get_int(&mut self, key: &str) -> Result<i64> {
        let value = self.get_document(key).await?;
        codec::unwrap_int(&value)
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::IllegalKey`] for an empty key and
    /// [`PrefsError::ValueNotJson`] if `value` is not an object or array. In
    /// both cases nothing is written.
    #[instrument(skip(self, value), fields(app_id = %self.app_id))]
    pub async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(PrefsError::IllegalKey);
        }
        codec::validate_document(value)?;
        self.run(Statement::Upsert { key, value }).await.map(drop)
    }

    /// Stores a parsed document under `key`.
    ///
    /// # Errors
    ///
    /// Same as [`AppHandle::set`].
    pub async fn set_document(&mut self, key: &str, value: &Value) -> Result<()> {
        if key.is_empty() {
            return Err(PrefsError::IllegalKey);
        }
        if !codec::is_document(value) {
            return Err(PrefsError::ValueNotJson);
        }
        self.set(key, &value.to_string()).await
    }

    /// Stores a plain string as `["value"]`.
    ///
    /// # Errors
    ///
    /// Same as [`AppHandle::set`].
    pub async fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_document(key, &codec::wrap_scalar(value)).await
    }

    /// Stores an integer as `["<decimal>"]`.
    ///
    /// # Errors
    ///
    /// Same as [`AppHandle::set`].
    pub async fn set_int(&mut self, key: &str, value: i64) -> Result<()> {
        self.set_document(key, &codec::wrap_int(value)).await
    }

    /// Deletes `key`. Removing a key that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete cannot run.
    #[instrument(skip(self), fields(app_id = %self.app_id))]
    pub async fn remove(&mut self, key: &str) -> Result<()> {
        self.run(Statement::Delete { key }).await.map(drop)
    }

    /// Lists every key in the store.
    ///
    /// # Errors
    ///
    /// Returns a database error if the scan cannot run.
    pub async fn list_keys(&mut self) -> Result<Vec<String>> {
        match self.run(Statement::Keys).await? {
            Outcome::Keys(keys) => Ok(keys),
            _ => Err(PrefsError::Internal),
        }
    }

    /// Lists every entry as a single-entry `{key: value}` object.
    ///
    /// Entries whose stored value is not a document are skipped.
    ///
    /// # Errors
    ///
    /// Returns a database error if the scan cannot run.
    pub async fn list_all(&mut self) -> Result<Vec<Value>> {
        let Outcome::Entries(entries) = self.run(Statement::Entries).await? else {
            return Err(PrefsError::Internal);
        };
        let mut pairs = Vec::with_capacity(entries.len());
        for (key, text) in entries {
            match codec::parse_document(&text) {
                Ok(value) => pairs.push(codec::pair(&key, value)),
                Err(_) => warn!(app_id = %self.app_id, key, "Skipping non-JSON value"),
            }
        }
        Ok(pairs)
    }

    /// Ends the transaction and releases the connection.
    ///
    /// A handle that never touched the store closes without any I/O.
    ///
    /// # Errors
    ///
    /// Returns the first failure from ending the transaction or closing the
    /// connection. The connection is released either way.
    #[instrument(skip(self), fields(app_id = %self.app_id))]
    pub async fn close(mut self, commit: bool) -> Result<()> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        let end = if commit { "COMMIT" } else { "ROLLBACK" };
        let ended = sqlx::query(end).execute(&mut conn).await;
        let closed = conn.close().await;
        ended?;
        closed?;
        debug!(commit, "Closed application store");
        Ok(())
    }
}
