//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the narrow storage contracts the engine depends on.
//! - Keep SQL details out of services.
//!
//! # Invariants
//! - Repositories are only constructed over fully migrated connections.
//! - Write paths validate records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod entry_type_repo;
pub mod environment_repo;
pub mod timeline_repo;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::validation::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all storage contracts.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// Target row does not exist; carries a human-readable key.
    NotFound(String),
    InvalidData(String),
    /// Connection has not been migrated to the schema this binary expects.
    SchemaNotReady { found: u32, expected: u32 },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "record not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::SchemaNotReady { found, expected } => write!(
                f,
                "connection schema version {found} does not match expected {expected}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Fails unless `conn` carries the latest schema version.
pub(crate) fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let found = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let expected = latest_version();
    if found != expected {
        return Err(RepoError::SchemaNotReady { found, expected });
    }
    Ok(())
}

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
