mod common;

use common::create_employee;
use hrm_core::{
    manager_label, open_db_in_memory, Department, DepartmentDirectory, DepartmentRepository,
    IssueKind, RecordPatch, RecordStore, ReferenceLabel, RepoError, SqliteDepartmentRepository,
    SqliteRecordStore,
};
use uuid::Uuid;

#[test]
fn departments_are_listed_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    repo.create_department(&Department::new("Sales", None)).unwrap();
    let finance_id = repo
        .create_department(&Department::new(" Finance ", Some("FIN".to_string())))
        .unwrap();
    repo.create_department(&Department::new("it", Some("IT".to_string())))
        .unwrap();

    let names: Vec<String> = repo
        .list_departments()
        .unwrap()
        .into_iter()
        .map(|department| department.name)
        .collect();
    assert_eq!(names, vec!["Finance", "it", "Sales"]);

    let finance = repo.get_department(finance_id).unwrap().unwrap();
    assert_eq!(finance.code.as_deref(), Some("FIN"));
}

#[test]
fn duplicate_name_or_code_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    repo.create_department(&Department::new("Finance", Some("FIN".to_string())))
        .unwrap();

    assert!(matches!(
        repo.create_department(&Department::new("FINANCE", None)),
        Err(RepoError::Conflict(_))
    ));
    assert!(matches!(
        repo.create_department(&Department::new("Treasury", Some("fin".to_string()))),
        Err(RepoError::Conflict(_))
    ));
    assert_eq!(repo.list_departments().unwrap().len(), 1);
}

#[test]
fn blank_department_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    match repo.create_department(&Department::new("  ", None)) {
        Err(RepoError::Validation(report)) => {
            assert_eq!(report.issues()[0].field, "name");
            assert_eq!(report.issues()[0].kind, IssueKind::Required);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn removing_a_department_twice_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    let id = repo
        .create_department(&Department::new("Legal", None))
        .unwrap();

    repo.remove_department(id).unwrap();
    assert!(repo.get_department(id).unwrap().is_none());
    assert!(matches!(
        repo.remove_department(id),
        Err(RepoError::NotFound(missing)) if missing == id
    ));
}

#[test]
fn directory_resolves_codes_and_keeps_unknown_values() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    repo.create_department(&Department::new("Ressources humaines", Some("RH".to_string())))
        .unwrap();

    let directory = DepartmentDirectory::load(&repo).unwrap();
    assert_eq!(
        directory.label_for("rh"),
        ReferenceLabel::Resolved("Ressources humaines".to_string())
    );
    assert_eq!(
        directory.label_for(" Logistics "),
        ReferenceLabel::Raw("Logistics".to_string())
    );
    assert_eq!(directory.label_for(""), ReferenceLabel::Unspecified);
}

#[test]
fn manager_label_tracks_the_referenced_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let manager = create_employee(&store, "Nora", "Faure", "E100");
    let report = create_employee(&store, "Paul", "Girard", "E101");
    let report = store
        .update(
            report.id,
            &RecordPatch::new().with("manager_id", manager.id.to_string()),
        )
        .unwrap();

    assert_eq!(
        manager_label(&store, report.manager_id),
        ReferenceLabel::Resolved("Nora Faure".to_string())
    );

    store.soft_delete(manager.id).unwrap();
    assert_eq!(
        manager_label(&store, report.manager_id),
        ReferenceLabel::Unknown
    );
    assert_eq!(manager_label(&store, None), ReferenceLabel::Unspecified);
    assert_eq!(
        manager_label(&store, Some(Uuid::new_v4())).text(),
        "Unknown"
    );
}
