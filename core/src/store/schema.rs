//! The statements run against an application's `data` table.

use sqlx::SqliteConnection;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS data (key TEXT PRIMARY KEY, value TEXT)";
const SELECT_VALUE: &str = "SELECT value FROM data WHERE key = ?";
// REPLACE keeps the primary key unique: last write wins.
const UPSERT: &str = "INSERT OR REPLACE INTO data (key, value) VALUES (?, ?)";
const DELETE: &str = "DELETE FROM data WHERE key = ?";
const SELECT_KEYS: &str = "SELECT key FROM data";
const SELECT_ENTRIES: &str = "SELECT key, value FROM data";

/// One statement against the table, with its bound parameters.
#[derive(Debug, Clone, Copy)]
pub(super) enum Statement<'a> {
    Lookup { key: &'a str },
    Upsert { key: &'a str, value: &'a str },
    Delete { key: &'a str },
    Keys,
    Entries,
}

/// What a statement produced.
#[derive(Debug)]
pub(super) enum Outcome {
    Value(Option<String>),
    Keys(Vec<String>),
    Entries(Vec<(String, String)>),
    Done,
}

impl Statement<'_> {
    pub(super) async fn execute(
        self,
        conn: &mut SqliteConnection,
    ) -> Result<Outcome, sqlx::Error> {
        match self {
            Self::Lookup { key } => {
                let value = sqlx::query_scalar::<_, Option<String>>(SELECT_VALUE)
                    .bind(key)
                    .fetch_optional(&mut *conn)
                    .await?;
                // A NULL value reads the same as a missing row.
                Ok(Outcome::Value(value.flatten()))
            }
            Self::Upsert { key, value } => {
                sqlx::query(UPSERT)
                    .bind(key)
                    .bind(value)
                    .execute(&mut *conn)
                    .await?;
                Ok(Outcome::Done)
            }
            Self::Delete { key } => {
                sqlx::query(DELETE).bind(key).execute(&mut *conn).await?;
                Ok(Outcome::Done)
            }
            Self::Keys => {
                let keys = sqlx::query_scalar::<_, Option<String>>(SELECT_KEYS)
                    .fetch_all(&mut *conn)
                    .await?;
                Ok(Outcome::Keys(keys.into_iter().flatten().collect()))
            }
            Self::Entries => {
                let rows = sqlx::query_as::<_, (Option<String>, Option<String>)>(SELECT_ENTRIES)
                    .fetch_all(&mut *conn)
                    .await?;
                let entries = rows
                    .into_iter()
                    .filter_map(|(key, value)| Some((key?, value?)))
                    .collect();
                Ok(Outcome::Entries(entries))
            }
        }
    }
}

/// Creates the table if it is missing. Safe to run any number of times.
pub(super) async fn create_table(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
    Ok(())
}
