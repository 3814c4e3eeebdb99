//! Employee record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide fetch/create/update/delete over employee documents.
//! - Apply partial updates as shallow merges of top-level fields.
//! - Replace temporary sub-item ids with server-assigned ids.
//!
//! # Invariants
//! - Every write validates the merged record before touching SQL.
//! - A patch may only name editable top-level fields (see [`crate::slice`]).
//! - Indexed columns always mirror the stored document.
//! - Column values (`is_deleted`, timestamps) win over the document copy.

use crate::db::{next_update_stamp, now_epoch_ms, tombstone_column, tombstone_from_column};
use crate::model::employee::{is_temp_id, Employee, EmployeeId};
use crate::model::status::EmployeeStatus;
use crate::repo::error::{decode_failure, ensure_connection_ready, RepoError, RepoResult};
use crate::slice::{record_document, SliceId, RESERVED_FIELDS};
use log::info;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    uuid,
    document,
    is_deleted,
    created_at,
    updated_at
FROM employees";

/// Top-level fields holding id-carrying sub-items.
const ITEM_LIST_FIELDS: &[&str] = &["documents", "skills", "leave_requests", "evaluations"];

/// Partial update: top-level field name to its complete new value.
///
/// List fields are replaced wholesale; there is no deep merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPatch(Map<String, Value>);

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Builder form of [`RecordPatch::insert`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for RecordPatch {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl FromIterator<(String, Value)> for RecordPatch {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Query options for listing employee records.
#[derive(Debug, Clone, Default)]
pub struct EmployeeListQuery {
    pub include_deleted: bool,
    pub status: Option<EmployeeStatus>,
    /// Exact department match, case-insensitive.
    pub department: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Data-access contract injected into shells, forms and lists.
pub trait RecordStore {
    /// Gets one active (non-deleted) record.
    fn fetch_one(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    /// Lists records ordered by last name, first name, id.
    fn fetch_many(&self, query: &EmployeeListQuery) -> RepoResult<Vec<Employee>>;
    /// Shallow-merges `patch` into the stored record and returns the result.
    fn update(&self, id: EmployeeId, patch: &RecordPatch) -> RepoResult<Employee>;
    /// Creates a record from field values and returns it with its new id.
    fn create(&self, fields: &RecordPatch) -> RepoResult<Employee>;
    /// Hard delete.
    fn remove(&self, id: EmployeeId) -> RepoResult<()>;
    /// Sets the tombstone flag. Idempotent.
    fn soft_delete(&self, id: EmployeeId) -> RepoResult<()>;
    /// Clears the tombstone flag.
    fn restore(&self, id: EmployeeId) -> RepoResult<()>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - [`RepoError::UninitializedConnection`] when migrations are missing.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn load(&self, id: EmployeeId, include_deleted: bool) -> RepoResult<Option<Employee>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EMPLOYEE_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), tombstone_column(include_deleted)])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_employee_row(row)?)),
            None => Ok(None),
        }
    }

    fn write_row(&self, employee: &Employee, insert: bool) -> RepoResult<usize> {
        let document = serde_json::to_string(employee)
            .map_err(|err| RepoError::InvalidData(format!("cannot encode record: {err}")))?;
        let sql = if insert {
            "INSERT INTO employees (
                uuid,
                employee_number,
                first_name,
                last_name,
                department,
                status,
                document,
                is_deleted,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);"
        } else {
            "UPDATE employees
             SET
                employee_number = ?2,
                first_name = ?3,
                last_name = ?4,
                department = ?5,
                status = ?6,
                document = ?7,
                is_deleted = ?8,
                created_at = ?9,
                updated_at = ?10
             WHERE uuid = ?1
               AND is_deleted = 0;"
        };
        let changed = self.conn.execute(
            sql,
            params![
                employee.id.to_string(),
                employee.employee_number.trim(),
                employee.first_name.trim(),
                employee.last_name.trim(),
                employee.department.trim(),
                employee.status.as_str(),
                document,
                tombstone_column(employee.is_deleted),
                employee.created_at,
                employee.updated_at,
            ],
        )?;
        Ok(changed)
    }

    fn set_deleted(&self, id: EmployeeId, deleted: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE employees
             SET
                is_deleted = ?2,
                updated_at = ?3
             WHERE uuid = ?1;",
            params![id.to_string(), tombstone_column(deleted), now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn fetch_one(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.load(id, false)
    }

    fn fetch_many(&self, query: &EmployeeListQuery) -> RepoResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EMPLOYEE_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY last_name COLLATE NOCASE ASC, first_name COLLATE NOCASE ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([tombstone_column(query.include_deleted)])?;

        // Status and department are matched on decoded documents so legacy
        // spellings stored before normalization still match.
        let department = query
            .department
            .as_deref()
            .map(|value| value.trim().to_lowercase());
        let limit = query.limit.map_or(usize::MAX, |limit| limit as usize);
        let mut skipped = 0_u32;
        let mut employees = Vec::new();

        while let Some(row) = rows.next()? {
            if employees.len() >= limit {
                break;
            }
            let employee = parse_employee_row(row)?;
            if query
                .status
                .as_ref()
                .is_some_and(|status| *status != employee.status)
            {
                continue;
            }
            if department
                .as_deref()
                .is_some_and(|value| employee.department.trim().to_lowercase() != value)
            {
                continue;
            }
            if skipped < query.offset {
                skipped += 1;
                continue;
            }
            employees.push(employee);
        }

        Ok(employees)
    }

    fn update(&self, id: EmployeeId, patch: &RecordPatch) -> RepoResult<Employee> {
        check_patch_fields(patch)?;
        let current = self.load(id, false)?.ok_or(RepoError::NotFound(id))?;

        let mut document = record_document(&current)
            .map_err(|err| RepoError::InvalidData(format!("cannot encode record: {err}")))?;
        merge_patch(&mut document, patch);
        let mut merged = decode_patched(document)?;
        merged.id = current.id;
        merged.created_at = current.created_at;
        merged.is_deleted = false;
        merged.updated_at = next_update_stamp(current.updated_at);
        merged.validate()?;

        if self.write_row(&merged, false)? == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!(
            "event=record_update module=store status=ok record_id={id} field_count={}",
            patch.len()
        );
        Ok(merged)
    }

    fn create(&self, fields: &RecordPatch) -> RepoResult<Employee> {
        check_patch_fields(fields)?;

        let mut document = record_document(&Employee::template())
            .map_err(|err| RepoError::InvalidData(format!("cannot encode template: {err}")))?;
        merge_patch(&mut document, fields);
        let mut created = decode_patched(document)?;
        let now = now_epoch_ms();
        created.id = Uuid::new_v4();
        created.created_at = now;
        created.updated_at = now;
        created.is_deleted = false;
        created.validate()?;

        self.write_row(&created, true)?;

        info!(
            "event=record_create module=store status=ok record_id={} field_count={}",
            created.id,
            fields.len()
        );
        Ok(created)
    }

    fn remove(&self, id: EmployeeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM employees WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        info!("event=record_remove module=store status=ok record_id={id}");
        Ok(())
    }

    fn soft_delete(&self, id: EmployeeId) -> RepoResult<()> {
        self.set_deleted(id, true)?;
        info!("event=record_soft_delete module=store status=ok record_id={id}");
        Ok(())
    }

    fn restore(&self, id: EmployeeId) -> RepoResult<()> {
        self.set_deleted(id, false)?;
        info!("event=record_restore module=store status=ok record_id={id}");
        Ok(())
    }
}

fn check_patch_fields(patch: &RecordPatch) -> RepoResult<()> {
    for field in patch.fields() {
        if RESERVED_FIELDS.contains(&field) {
            return Err(RepoError::InvalidPatch(format!(
                "`{field}` is managed by the store"
            )));
        }
        if SliceId::for_field(field).is_none() {
            return Err(RepoError::InvalidPatch(format!("unknown field `{field}`")));
        }
    }
    Ok(())
}

fn merge_patch(document: &mut Map<String, Value>, patch: &RecordPatch) {
    for (field, value) in patch.iter() {
        document.insert(field.clone(), value.clone());
    }
    assign_item_ids(document);
}

fn assign_item_ids(document: &mut Map<String, Value>) {
    for field in ITEM_LIST_FIELDS {
        let Some(Value::Array(items)) = document.get_mut(*field) else {
            continue;
        };
        for item in items.iter_mut().filter_map(Value::as_object_mut) {
            let needs_id = match item.get("id") {
                Some(Value::String(id)) => is_temp_id(id),
                _ => true,
            };
            if needs_id {
                item.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            }
        }
    }
}

fn decode_patched(document: Map<String, Value>) -> RepoResult<Employee> {
    serde_json::from_value(Value::Object(document))
        .map_err(|err| {
            RepoError::InvalidPatch(format!(
                "patched record does not decode ({})",
                decode_failure(&err)
            ))
        })
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in employees.uuid"))
    })?;

    let document_text: String = row.get("document")?;
    let mut employee: Employee = serde_json::from_str(&document_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "cannot decode employees.document for {uuid}: {}",
            decode_failure(&err)
        ))
    })?;
    if employee.id != uuid {
        return Err(RepoError::InvalidData(format!(
            "document id {} does not match row id {uuid}",
            employee.id
        )));
    }

    let tombstone: i64 = row.get("is_deleted")?;
    employee.is_deleted = tombstone_from_column(tombstone).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid is_deleted value `{tombstone}` in employees.is_deleted"
        ))
    })?;
    employee.created_at = row.get("created_at")?;
    employee.updated_at = row.get("updated_at")?;
    Ok(employee)
}
