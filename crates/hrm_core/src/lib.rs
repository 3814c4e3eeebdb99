//! Core domain logic for the HR records workspace.
//! This crate is the single source of truth for employee record invariants;
//! UI layers bind to its view models and state machines.

pub mod config;
pub mod db;
pub mod draft;
pub mod export;
pub mod list;
pub mod logging;
pub mod model;
pub mod notify;
pub mod references;
pub mod repo;
pub mod shell;
pub mod slice;

pub use config::AppConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use draft::{Draft, DraftError};
pub use export::{
    trigger_export, ExportArtifact, ExportError, ExportFormat, Exporter, JsonExporter,
};
pub use list::{
    filter_records, paginate, sort_records, DeleteConfirmation, DeleteResolution, EmptyReason,
    ListView, Page, RecordFilter, RecordList, RowAction, RowActionHandler, RowDispatch,
    SortDirection, SortKey,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::department::{Department, DepartmentId};
pub use model::employee::{Employee, EmployeeId};
pub use model::status::{format_status, Badge, EmployeeStatus, LeaveStatus, Severity};
pub use model::validation::{IssueKind, ValidationIssue, ValidationReport};
pub use notify::{LogNotifier, NoticeKind, Notifier};
pub use references::{
    manager_label, resolve_department_label, DepartmentDirectory, ReferenceLabel,
};
pub use repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::record_store::{EmployeeListQuery, RecordPatch, RecordStore, SqliteRecordStore};
pub use shell::{
    ConfirmDiscard, DetailShell, EditState, EnterEdit, NewRecordForm, SaveOutcome, ShellError,
    SubmitOutcome, TabChange,
};
pub use slice::SliceId;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
