//! Department directory persistence.
//!
//! # Invariants
//! - Department names and codes are unique case-insensitively; duplicates
//!   surface as [`RepoError::Conflict`].
//! - Removing a department never rewrites employee records; they keep the
//!   raw value and render it as-is.

use crate::db::now_epoch_ms;
use crate::model::department::{Department, DepartmentId};
use crate::repo::error::{ensure_connection_ready, map_constraint, RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

pub trait DepartmentRepository {
    fn create_department(&self, department: &Department) -> RepoResult<DepartmentId>;
    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>>;
    /// All departments sorted by name.
    fn list_departments(&self) -> RepoResult<Vec<Department>>;
    fn remove_department(&self, id: DepartmentId) -> RepoResult<()>;
}

pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn create_department(&self, department: &Department) -> RepoResult<DepartmentId> {
        department.validate()?;

        self.conn
            .execute(
                "INSERT INTO departments (uuid, name, code, created_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    department.id.to_string(),
                    department.name.trim(),
                    department.code.as_deref().map(str::trim),
                    now_epoch_ms(),
                ],
            )
            .map_err(|err| {
                map_constraint(err, || {
                    format!("department `{}` already exists", department.name.trim())
                })
            })?;

        info!(
            "event=department_create module=directory status=ok department_id={}",
            department.id
        );
        Ok(department.id)
    }

    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>> {
        self.conn
            .query_row(
                "SELECT uuid, name, code FROM departments WHERE uuid = ?1;",
                [id.to_string()],
                |row| Ok(parse_department_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_departments(&self) -> RepoResult<Vec<Department>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name, code
             FROM departments
             ORDER BY name COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut departments = Vec::new();
        while let Some(row) = rows.next()? {
            departments.push(parse_department_row(row)?);
        }
        Ok(departments)
    }

    fn remove_department(&self, id: DepartmentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM departments WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        info!("event=department_remove module=directory status=ok department_id={id}");
        Ok(())
    }
}

fn parse_department_row(row: &Row<'_>) -> RepoResult<Department> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in departments.uuid"
        ))
    })?;
    Ok(Department {
        id,
        name: row.get("name")?,
        code: row.get("code")?,
    })
}
