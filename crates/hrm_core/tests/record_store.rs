mod common;

use common::{create_employee, employee_fields};
use hrm_core::model::employee::is_temp_id;
use hrm_core::model::status::EmployeeStatus;
use hrm_core::{
    open_db_in_memory, EmployeeListQuery, IssueKind, RecordPatch, RecordStore, RepoError,
    SqliteRecordStore,
};
use rusqlite::{params, Connection};
use serde_json::json;
use uuid::Uuid;

#[test]
fn create_assigns_id_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();

    let created = create_employee(&store, "Lea", "Moreau", "E001");
    assert!(!created.id.is_nil());
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);

    let loaded = store.fetch_one(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn create_rejects_invalid_fields_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();

    let fields = employee_fields("Lea", "Moreau", "E001").with("email", "not-an-email");
    match store.create(&fields).unwrap_err() {
        RepoError::Validation(report) => {
            assert_eq!(report.issues()[0].field, "email");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store
        .fetch_many(&EmployeeListQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn create_and_update_reject_blank_status() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();

    let fields = employee_fields("Lea", "Moreau", "E001").with("status", "  ");
    match store.create(&fields).unwrap_err() {
        RepoError::Validation(report) => {
            assert_eq!(report.issues()[0].field, "status");
            assert_eq!(report.issues()[0].kind, IssueKind::Required);
        }
        other => panic!("unexpected error: {other}"),
    }

    let created = create_employee(&store, "Lea", "Moreau", "E001");
    assert!(matches!(
        store.update(created.id, &RecordPatch::new().with("status", "")),
        Err(RepoError::Validation(_))
    ));
    assert_eq!(store.fetch_one(created.id).unwrap().unwrap(), created);
}

#[test]
fn update_merges_only_patched_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let created = create_employee(&store, "Lea", "Moreau", "E001");

    let updated = store
        .update(created.id, &RecordPatch::new().with("department", "Sales"))
        .unwrap();

    assert_eq!(updated.department, "Sales");
    assert_eq!(updated.position, created.position);
    assert_eq!(updated.first_name, created.first_name);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(store.fetch_one(created.id).unwrap().unwrap(), updated);
}

#[test]
fn update_with_blank_required_field_leaves_row_untouched() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let created = create_employee(&store, "Lea", "Moreau", "E001");

    let err = store
        .update(created.id, &RecordPatch::new().with("department", "  "))
        .unwrap_err();
    match err {
        RepoError::Validation(report) => {
            assert_eq!(report.issues()[0].field, "department");
            assert_eq!(report.issues()[0].kind, IssueKind::Required);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.fetch_one(created.id).unwrap().unwrap(), created);
}

#[test]
fn update_rejects_store_managed_and_unknown_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let created = create_employee(&store, "Lea", "Moreau", "E001");

    for patch in [
        RecordPatch::new().with("id", Uuid::new_v4().to_string()),
        RecordPatch::new().with("is_deleted", true),
        RecordPatch::new().with("salary", 1000),
    ] {
        assert!(matches!(
            store.update(created.id, &patch),
            Err(RepoError::InvalidPatch(_))
        ));
    }
}

#[test]
fn undecodable_patch_error_does_not_echo_the_value() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let created = create_employee(&store, "Lea", "Moreau", "E001");

    let patch = RecordPatch::new().with("schedule", json!({"weekly_hours": "lea-private-note"}));
    let err = store.update(created.id, &patch).unwrap_err();
    assert!(matches!(err, RepoError::InvalidPatch(_)));
    let message = err.to_string();
    assert!(message.contains("data error"), "{message}");
    assert!(!message.contains("lea-private-note"), "{message}");
    assert_eq!(store.fetch_one(created.id).unwrap().unwrap(), created);
}

#[test]
fn update_replaces_temporary_item_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let created = create_employee(&store, "Lea", "Moreau", "E001");

    let patch = RecordPatch::new().with(
        "skills",
        json!([{"id": "tmp-1", "name": "Payroll", "level": 3}]),
    );
    let updated = store.update(created.id, &patch).unwrap();

    assert_eq!(updated.skills.len(), 1);
    assert!(!is_temp_id(&updated.skills[0].id));
    assert_eq!(updated.skills[0].name, "Payroll");
}

#[test]
fn soft_deleted_records_are_hidden_and_restorable() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let created = create_employee(&store, "Lea", "Moreau", "E001");

    store.soft_delete(created.id).unwrap();
    assert!(store.fetch_one(created.id).unwrap().is_none());
    assert!(matches!(
        store.update(created.id, &RecordPatch::new().with("department", "Sales")),
        Err(RepoError::NotFound(id)) if id == created.id
    ));

    let all = store
        .fetch_many(&EmployeeListQuery {
            include_deleted: true,
            ..EmployeeListQuery::default()
        })
        .unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].is_deleted);

    store.restore(created.id).unwrap();
    assert!(store.fetch_one(created.id).unwrap().is_some());
}

#[test]
fn remove_missing_record_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let id = Uuid::new_v4();
    assert!(matches!(store.remove(id), Err(RepoError::NotFound(missing)) if missing == id));
}

#[test]
fn fetch_many_orders_by_name_and_filters_legacy_status() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    create_employee(&store, "Zoe", "Bernard", "E002");
    create_employee(&store, "Adam", "Bernard", "E003");
    let legacy_id = insert_legacy_row(&conn, "Actif");
    let left = create_employee(&store, "Hugo", "Roux", "E004");
    store
        .update(left.id, &RecordPatch::new().with("status", "terminated"))
        .unwrap();

    let names: Vec<String> = store
        .fetch_many(&EmployeeListQuery::default())
        .unwrap()
        .iter()
        .map(|record| record.full_name())
        .collect();
    assert_eq!(
        names,
        vec!["Adam Bernard", "Zoe Bernard", "Marc Legrand", "Hugo Roux"]
    );

    let active = store
        .fetch_many(&EmployeeListQuery {
            status: Some(EmployeeStatus::Active),
            ..EmployeeListQuery::default()
        })
        .unwrap();
    assert_eq!(active.len(), 3);
    assert!(active.iter().any(|record| record.id == legacy_id));

    let paged = store
        .fetch_many(&EmployeeListQuery {
            limit: Some(2),
            offset: 1,
            ..EmployeeListQuery::default()
        })
        .unwrap();
    assert_eq!(paged.len(), 2);
    assert_eq!(paged[0].full_name(), "Zoe Bernard");
}

#[test]
fn legacy_document_shapes_are_normalized_on_read() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let id = insert_legacy_row(&conn, "En congé");

    let record = store.fetch_one(id).unwrap().unwrap();
    assert_eq!(record.status, EmployeeStatus::OnLeave);
    let address = record.address.unwrap();
    assert_eq!(address.street, "3 rue des Lilas, Lyon");
    assert_eq!(record.company.unwrap().name, "Acme SA");
}

#[test]
fn mismatched_document_id_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let row_id = Uuid::new_v4();
    let document = json!({
        "id": Uuid::new_v4(),
        "first_name": "Ghost",
        "last_name": "Row",
        "email": "ghost@example.com",
        "employee_number": "E999",
        "position": "None",
        "department": "None",
        "hire_date": "2020-01-01"
    });
    insert_row(&conn, row_id, &document);

    assert!(matches!(
        store.fetch_one(row_id),
        Err(RepoError::InvalidData(_))
    ));
}

fn insert_legacy_row(conn: &Connection, status: &str) -> Uuid {
    let id = Uuid::new_v4();
    let document = json!({
        "id": id,
        "first_name": "Marc",
        "last_name": "Legrand",
        "email": "marc@example.com",
        "address": "3 rue des Lilas, Lyon",
        "company": "Acme SA",
        "employee_number": "E010",
        "position": "Technician",
        "department": "Maintenance",
        "hire_date": "2015-04-13",
        "status": status
    });
    insert_row(conn, id, &document);
    id
}

fn insert_row(conn: &Connection, id: Uuid, document: &serde_json::Value) {
    conn.execute(
        "INSERT INTO employees (
            uuid, employee_number, first_name, last_name, department, status,
            document, is_deleted, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 1, 1);",
        params![
            id.to_string(),
            document["employee_number"].as_str().unwrap_or_default(),
            document["first_name"].as_str().unwrap_or_default(),
            document["last_name"].as_str().unwrap_or_default(),
            document["department"].as_str().unwrap_or_default(),
            document["status"].as_str().unwrap_or("active"),
            document.to_string(),
        ],
    )
    .unwrap();
}
