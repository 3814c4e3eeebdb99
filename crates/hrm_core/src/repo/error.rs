//! Repository error type shared by record and directory stores.

use crate::db::DbError;
use crate::model::validation::ValidationReport;
use serde_json::error::Category;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence and query failures.
#[derive(Debug)]
pub enum RepoError {
    /// Merged record failed validation; nothing was written.
    Validation(ValidationReport),
    Db(DbError),
    NotFound(Uuid),
    /// Stored data cannot be decoded into a valid record.
    InvalidData(String),
    /// Partial update names a field that cannot be written.
    InvalidPatch(String),
    /// Uniqueness constraint rejected the write.
    Conflict(String),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::InvalidPatch(message) => write!(f, "invalid partial update: {message}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
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

impl From<ValidationReport> for RepoError {
    fn from(value: ValidationReport) -> Self {
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

/// Describes a document decoding failure by category and position only.
///
/// serde messages quote the offending value, which may be record data.
pub(crate) fn decode_failure(err: &serde_json::Error) -> String {
    let category = match err.classify() {
        Category::Io => "io",
        Category::Syntax => "syntax",
        Category::Data => "data",
        Category::Eof => "eof",
    };
    if err.line() == 0 {
        format!("{category} error")
    } else {
        format!("{category} error at line {} column {}", err.line(), err.column())
    }
}

/// Maps SQLite uniqueness violations to [`RepoError::Conflict`].
pub(crate) fn map_constraint(err: rusqlite::Error, message: impl FnOnce() -> String) -> RepoError {
    match err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            RepoError::Conflict(message())
        }
        other => other.into(),
    }
}

/// Rejects connections that have not been migrated to the latest schema.
pub(crate) fn ensure_connection_ready(conn: &rusqlite::Connection) -> RepoResult<()> {
    let expected_version = crate::db::migrations::latest_version();
    let actual_version = crate::db::migrations::current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
