//! HR database: connection bootstrap, schema versions, and the column
//! conventions every repository shares.
//!
//! # Responsibility
//! - Open SQLite connections for the HR core and migrate them.
//! - Own the encodings of the tombstone flag and the record timestamps.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration.
//! - `employees.document` is the source of truth; the indexed columns
//!   (`employee_number`, names, `department`, `status`) only mirror it.
//! - `is_deleted` holds `0` or `1` and nothing else.
//! - Timestamps are epoch milliseconds and `updated_at` strictly increases
//!   across writes to one record.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Migration `version` failed; nothing from the batch was committed.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build of the HR core.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Migration { version, source } => {
                write!(f, "HR schema migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "HR database is at schema {db_version}; this build reads up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `updated_at` for a write that follows one stamped `previous`.
///
/// Two saves inside the same millisecond still order correctly.
pub fn next_update_stamp(previous: i64) -> i64 {
    now_epoch_ms().max(previous.saturating_add(1))
}

/// Column value for the soft-delete tombstone.
pub fn tombstone_column(deleted: bool) -> i64 {
    i64::from(deleted)
}

/// Reads a tombstone column; `None` for values the schema forbids.
pub fn tombstone_from_column(value: i64) -> Option<bool> {
    match value {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{next_update_stamp, tombstone_column, tombstone_from_column};

    #[test]
    fn tombstone_round_trips_and_rejects_other_values() {
        assert_eq!(tombstone_from_column(tombstone_column(true)), Some(true));
        assert_eq!(tombstone_from_column(tombstone_column(false)), Some(false));
        assert_eq!(tombstone_from_column(2), None);
    }

    #[test]
    fn update_stamp_moves_past_a_future_previous_value() {
        let future = i64::MAX - 10;
        assert_eq!(next_update_stamp(future), future + 1);
        assert_eq!(next_update_stamp(i64::MAX), i64::MAX);
    }
}
