//! Subcommand execution.
//!
//! Every command writes to the given output so results stay testable;
//! user notifications go to stderr and the log.

use clap::ArgMatches;
use hrm_core::export::{trigger_export, ExportFormat, JsonExporter};
use hrm_core::list::{
    DeleteResolution, ListView, RecordFilter, RecordList, RowAction, RowActionHandler,
    RowDispatch, SortDirection, SortKey,
};
use hrm_core::model::department::Department;
use hrm_core::model::employee::{Employee, EmployeeId};
use hrm_core::notify::{LogNotifier, NoticeKind, Notifier};
use hrm_core::references::{manager_label, DepartmentDirectory};
use hrm_core::repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
use hrm_core::repo::record_store::{EmployeeListQuery, RecordStore, SqliteRecordStore};
use hrm_core::shell::{DetailShell, EnterEdit, NewRecordForm, SaveOutcome, SubmitOutcome};
use hrm_core::slice::{field_spec, FieldKind, SliceId};
use hrm_core::{format_status, AppConfig};
use log::{info, warn};
use rusqlite::Connection;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

/// Prints notifications to stderr and forwards them to the log.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        eprintln!("[{}] {message}", kind.as_str());
        LogNotifier.notify(message, kind);
    }
}

pub fn dispatch(
    conn: &Connection,
    config: &AppConfig,
    matches: &ArgMatches,
    out: &mut dyn Write,
) -> Result<(), String> {
    let store = SqliteRecordStore::try_new(conn).map_err(|err| err.to_string())?;
    match matches.subcommand() {
        Some(("add", args)) => execute_add(&store, &add_fields(args), out),
        Some(("list", args)) => execute_list(&store, config, &list_options(args)?, out),
        Some(("show", args)) => {
            let id = record_id(args)?;
            let tab = parse_slice(text(args, "tab").unwrap_or("identity"))?;
            execute_show(conn, &store, id, tab, args.get_flag("json"), out)
        }
        Some(("edit", args)) => {
            let id = record_id(args)?;
            let slice = parse_slice(text(args, "slice").unwrap_or_default())?;
            let assignments = args
                .get_many::<String>("set")
                .map(|values| values.map(String::as_str).collect::<Vec<_>>())
                .unwrap_or_default();
            execute_edit(&store, id, slice, &assignments, out)
        }
        Some(("delete", args)) => execute_delete(
            &store,
            record_id(args)?,
            args.get_flag("hard"),
            args.get_flag("yes"),
            out,
        ),
        Some(("restore", args)) => execute_restore(&store, record_id(args)?, out),
        Some(("export", args)) => {
            let format = text(args, "format").unwrap_or("json");
            let format = ExportFormat::parse(format)
                .ok_or_else(|| format!("unknown export format `{format}`"))?;
            execute_export(
                &store,
                format,
                &filter_from(args),
                args.get_flag("include-deleted"),
                args.get_one::<PathBuf>("out"),
                out,
            )
        }
        Some(("dept", args)) => {
            let repo = SqliteDepartmentRepository::try_new(conn).map_err(|err| err.to_string())?;
            match args.subcommand() {
                Some(("add", sub)) => execute_dept_add(
                    &repo,
                    text(sub, "name").unwrap_or_default(),
                    text(sub, "code"),
                    out,
                ),
                Some(("list", _)) => execute_dept_list(&repo, out),
                Some(("remove", sub)) => execute_dept_remove(&repo, record_id(sub)?, out),
                _ => Err("missing dept subcommand".to_string()),
            }
        }
        Some(("status", args)) => execute_status(text(args, "raw").unwrap_or_default(), out),
        _ => Err("missing subcommand".to_string()),
    }
}

fn text<'a>(args: &'a ArgMatches, name: &str) -> Option<&'a str> {
    args.get_one::<String>(name).map(String::as_str)
}

fn record_id(args: &ArgMatches) -> Result<EmployeeId, String> {
    let raw = text(args, "id").unwrap_or_default();
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid id `{raw}`"))
}

fn parse_slice(raw: &str) -> Result<SliceId, String> {
    SliceId::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = SliceId::ALL.iter().map(|slice| slice.as_str()).collect();
        format!("unknown tab `{raw}`; expected {}", known.join("|"))
    })
}

fn write_line(out: &mut dyn Write, line: impl AsRef<str>) -> Result<(), String> {
    writeln!(out, "{}", line.as_ref()).map_err(|err| err.to_string())
}

fn filter_from(args: &ArgMatches) -> RecordFilter {
    let mut filter = RecordFilter::new();
    if let Some(query) = text(args, "query") {
        filter = filter.with_query(query);
    }
    if let Some(status) = text(args, "status") {
        filter = filter.with_status(status);
    }
    if let Some(department) = text(args, "department") {
        filter = filter.with_department(department);
    }
    filter
}

fn add_fields(args: &ArgMatches) -> Vec<(&'static str, String)> {
    [
        ("first_name", "first-name"),
        ("last_name", "last-name"),
        ("email", "email"),
        ("employee_number", "number"),
        ("position", "position"),
        ("department", "department"),
        ("hire_date", "hire-date"),
        ("status", "status"),
    ]
    .into_iter()
    .filter_map(|(field, arg)| text(args, arg).map(|value| (field, value.to_string())))
    .collect()
}

pub fn execute_add(
    store: &dyn RecordStore,
    fields: &[(&str, String)],
    out: &mut dyn Write,
) -> Result<(), String> {
    let mut form = NewRecordForm::new().map_err(|err| err.to_string())?;
    for (field, value) in fields {
        form.set_field(field, value.as_str())
            .map_err(|err| err.to_string())?;
    }
    match form.submit(store, &ConsoleNotifier) {
        SubmitOutcome::Created(record) => write_line(out, record.id.to_string()),
        SubmitOutcome::Invalid(report) => Err(report.to_string()),
        SubmitOutcome::Failed(message) => Err(message),
        SubmitOutcome::AlreadySubmitted(id) => write_line(out, id.to_string()),
    }
}

pub struct ListOptions {
    pub filter: RecordFilter,
    pub sort: Option<(SortKey, SortDirection)>,
    pub page: usize,
    pub include_deleted: bool,
}

fn list_options(args: &ArgMatches) -> Result<ListOptions, String> {
    let direction = if args.get_flag("desc") {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let sort = text(args, "sort")
        .map(|raw| {
            SortKey::parse(raw)
                .map(|key| (key, direction))
                .ok_or_else(|| format!("unknown sort key `{raw}`"))
        })
        .transpose()?;
    Ok(ListOptions {
        filter: filter_from(args),
        sort,
        page: args.get_one::<usize>("page").copied().unwrap_or(1),
        include_deleted: args.get_flag("include-deleted"),
    })
}

pub fn execute_list(
    store: &dyn RecordStore,
    config: &AppConfig,
    options: &ListOptions,
    out: &mut dyn Write,
) -> Result<(), String> {
    let records = store
        .fetch_many(&EmployeeListQuery {
            include_deleted: options.include_deleted,
            ..EmployeeListQuery::default()
        })
        .map_err(|err| err.to_string())?;

    let mut list = RecordList::new(records, config.page_size);
    list.set_filter(options.filter.clone());
    if let Some((key, direction)) = options.sort {
        list.set_sort(key, direction);
    }
    list.set_page(options.page);

    match list.view() {
        ListView::Empty { reason } => write_line(out, reason.message()),
        ListView::Rows(page) => {
            for record in &page.items {
                write_line(
                    out,
                    format!(
                        "{}  {:<8}  {:<28}  {:<18}  {}{}",
                        record.id,
                        record.employee_number,
                        record.full_name(),
                        record.department,
                        record.status.badge().label,
                        if record.is_deleted { "  (deleted)" } else { "" }
                    ),
                )?;
            }
            write_line(
                out,
                format!(
                    "page {}/{} ({} record(s))",
                    page.page, page.total_pages, page.total
                ),
            )
        }
    }
}

/// Department directory for label lookups; empty when it cannot be read.
fn load_directory(conn: &Connection) -> DepartmentDirectory {
    let loaded = SqliteDepartmentRepository::try_new(conn)
        .and_then(|repo| DepartmentDirectory::load(&repo));
    match loaded {
        Ok(directory) => directory,
        Err(err) => {
            warn!("event=directory_load module=cli status=error error={err}");
            DepartmentDirectory::default()
        }
    }
}

pub fn execute_show(
    conn: &Connection,
    store: &dyn RecordStore,
    id: EmployeeId,
    tab: SliceId,
    json: bool,
    out: &mut dyn Write,
) -> Result<(), String> {
    let record = store
        .fetch_one(id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("record {id} not found"))?;
    let shell = DetailShell::with_tab(record, tab);
    let view = shell.view().map_err(|err| err.to_string())?;

    if json {
        let text = serde_json::to_string_pretty(&view.fields).map_err(|err| err.to_string())?;
        return write_line(out, text);
    }

    let header = shell.header();
    write_line(
        out,
        format!(
            "{} ({}) - {} [{}]",
            header.full_name, header.employee_number, header.position, header.status.label
        ),
    )?;
    let tabs: Vec<String> = shell
        .tabs()
        .iter()
        .map(|tab| {
            if tab.selected {
                format!("[{}]", tab.label)
            } else {
                tab.label.to_string()
            }
        })
        .collect();
    write_line(out, tabs.join(" | "))?;

    let directory = load_directory(conn);
    for spec in view.slice.fields() {
        let value = view.fields.get(spec.name).unwrap_or(&Value::Null);
        let rendered = match spec.name {
            "department" => directory.label_for(value.as_str().unwrap_or_default()).to_string(),
            "manager_id" => manager_label(store, shell.record().manager_id).to_string(),
            "status" => shell.record().status.badge().label,
            _ => render_value(value),
        };
        write_line(out, format!("{:<16} {rendered}", spec.label))?;
    }
    Ok(())
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) if text.trim().is_empty() => "-".to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) if items.is_empty() => "-".to_string(),
        other => other.to_string(),
    }
}

/// Splits `field=value`; list and object fields parse the value as JSON.
fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got `{raw}`"))?;
    let field = field.trim();
    let kind = field_spec(field)
        .map(|spec| spec.kind)
        .ok_or_else(|| format!("unknown field `{field}`"))?;
    let value = match kind {
        FieldKind::List | FieldKind::Object => serde_json::from_str(value)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        _ => Value::String(value.to_string()),
    };
    Ok((field.to_string(), value))
}

pub fn execute_edit(
    store: &dyn RecordStore,
    id: EmployeeId,
    slice: SliceId,
    assignments: &[&str],
    out: &mut dyn Write,
) -> Result<(), String> {
    let record = store
        .fetch_one(id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("record {id} not found"))?;
    let mut shell = DetailShell::with_tab(record, slice);
    match shell.enter_edit(slice).map_err(|err| err.to_string())? {
        EnterEdit::Entered | EnterEdit::AlreadyEditing => {}
        EnterEdit::Blocked { active } => {
            return Err(format!("tab `{active}` has unsaved changes"));
        }
    }

    for raw in assignments {
        let (field, value) = parse_assignment(raw)?;
        shell
            .set_field(&field, value)
            .map_err(|err| err.to_string())?;
    }

    match shell.save(store, &ConsoleNotifier) {
        SaveOutcome::Saved { fields } => {
            info!(
                "event=cli_edit module=cli status=ok record_id={id} slice={slice} field_count={}",
                fields.len()
            );
            write_line(out, format!("saved {}", fields.join(", ")))
        }
        SaveOutcome::Unchanged => write_line(out, "no changes"),
        SaveOutcome::Invalid(report) => Err(report.to_string()),
        SaveOutcome::Failed(message) => Err(message),
        SaveOutcome::InFlight => Err("a save is already in progress".to_string()),
        SaveOutcome::NotEditing => Err("no tab is in edit mode".to_string()),
    }
}

/// Runs confirmed list deletes against the store.
struct StoreRowHandler<'a> {
    store: &'a dyn RecordStore,
    hard: bool,
    error: Option<String>,
}

impl RowActionHandler for StoreRowHandler<'_> {
    fn view(&mut self, _id: EmployeeId) {}

    fn edit(&mut self, _id: EmployeeId) {}

    fn delete(&mut self, id: EmployeeId) -> bool {
        let result = if self.hard {
            self.store.remove(id)
        } else {
            self.store.soft_delete(id)
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                self.error = Some(err.to_string());
                false
            }
        }
    }
}

pub fn execute_delete(
    store: &dyn RecordStore,
    id: EmployeeId,
    hard: bool,
    confirmed: bool,
    out: &mut dyn Write,
) -> Result<(), String> {
    let record = find_any(store, id)?;
    let mut list = RecordList::new(vec![record], 1);
    let mut handler = StoreRowHandler {
        store,
        hard,
        error: None,
    };

    let RowDispatch::NeedsConfirmation(confirmation) =
        list.dispatch(RowAction::Delete, id, &mut handler)
    else {
        return Err(format!("record {id} not found"));
    };
    if !confirmed {
        write_line(out, confirmation.prompt())?;
    }

    match list.resolve_delete(confirmed, &mut handler) {
        DeleteResolution::Deleted => {
            ConsoleNotifier.notify("Employee deleted.", NoticeKind::Success);
            write_line(out, format!("deleted {id}"))
        }
        DeleteResolution::Kept => Err("delete not confirmed; pass --yes".to_string()),
        DeleteResolution::Failed => {
            let message = handler.error.unwrap_or_else(|| "delete failed".to_string());
            ConsoleNotifier.notify(&format!("Delete failed: {message}"), NoticeKind::Error);
            Err(message)
        }
        DeleteResolution::NothingPending => Err("no delete pending".to_string()),
    }
}

fn find_any(store: &dyn RecordStore, id: EmployeeId) -> Result<Employee, String> {
    store
        .fetch_many(&EmployeeListQuery {
            include_deleted: true,
            ..EmployeeListQuery::default()
        })
        .map_err(|err| err.to_string())?
        .into_iter()
        .find(|record| record.id == id)
        .ok_or_else(|| format!("record {id} not found"))
}

pub fn execute_restore(
    store: &dyn RecordStore,
    id: EmployeeId,
    out: &mut dyn Write,
) -> Result<(), String> {
    store.restore(id).map_err(|err| err.to_string())?;
    ConsoleNotifier.notify("Employee restored.", NoticeKind::Success);
    write_line(out, format!("restored {id}"))
}

pub fn execute_export(
    store: &dyn RecordStore,
    format: ExportFormat,
    filter: &RecordFilter,
    include_deleted: bool,
    destination: Option<&PathBuf>,
    out: &mut dyn Write,
) -> Result<(), String> {
    let records = store
        .fetch_many(&EmployeeListQuery {
            include_deleted,
            ..EmployeeListQuery::default()
        })
        .map_err(|err| err.to_string())?;
    let rows = hrm_core::list::filter_records(&records, filter);
    let artifact = trigger_export(&JsonExporter, format, &rows, &ConsoleNotifier)
        .map_err(|err| err.to_string())?;

    match destination {
        Some(path) => {
            std::fs::write(path, &artifact.bytes)
                .map_err(|err| format!("cannot write `{}`: {err}", path.display()))?;
            write_line(
                out,
                format!("wrote {} record(s) to {}", artifact.row_count, path.display()),
            )
        }
        None => out.write_all(&artifact.bytes).map_err(|err| err.to_string()),
    }
}

pub fn execute_dept_add(
    repo: &dyn DepartmentRepository,
    name: &str,
    code: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), String> {
    let department = Department::new(name.trim(), code.map(|code| code.trim().to_string()));
    let id = repo
        .create_department(&department)
        .map_err(|err| err.to_string())?;
    write_line(out, id.to_string())
}

pub fn execute_dept_list(
    repo: &dyn DepartmentRepository,
    out: &mut dyn Write,
) -> Result<(), String> {
    let departments = repo.list_departments().map_err(|err| err.to_string())?;
    if departments.is_empty() {
        return write_line(out, "No departments configured.");
    }
    for department in departments {
        write_line(
            out,
            format!(
                "{}  {:<6}  {}",
                department.id,
                department.code.as_deref().unwrap_or("-"),
                department.name
            ),
        )?;
    }
    Ok(())
}

pub fn execute_dept_remove(
    repo: &dyn DepartmentRepository,
    id: Uuid,
    out: &mut dyn Write,
) -> Result<(), String> {
    repo.remove_department(id).map_err(|err| err.to_string())?;
    write_line(out, format!("removed {id}"))
}

pub fn execute_status(raw: &str, out: &mut dyn Write) -> Result<(), String> {
    let badge = format_status(raw);
    write_line(out, format!("{} ({})", badge.label, badge.class()))
}

#[cfg(test)]
mod tests {
    use super::{
        execute_add, execute_delete, execute_edit, execute_export, execute_list, execute_show,
        execute_status, parse_assignment, ListOptions,
    };
    use hrm_core::export::ExportFormat;
    use hrm_core::list::RecordFilter;
    use hrm_core::repo::record_store::{RecordStore, SqliteRecordStore};
    use hrm_core::slice::SliceId;
    use hrm_core::{open_db_in_memory, AppConfig};
    use serde_json::json;
    use uuid::Uuid;

    fn fields(last_name: &str, number: &str) -> Vec<(&'static str, String)> {
        vec![
            ("first_name", "Claire".to_string()),
            ("last_name", last_name.to_string()),
            ("email", "claire@example.com".to_string()),
            ("employee_number", number.to_string()),
            ("position", "Analyst".to_string()),
            ("department", "Finance".to_string()),
            ("hire_date", "2022-03-01".to_string()),
            ("status", "Actif".to_string()),
        ]
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    fn add(store: &SqliteRecordStore<'_>, last_name: &str, number: &str) -> Uuid {
        let mut out = Vec::new();
        execute_add(store, &fields(last_name, number), &mut out).unwrap();
        Uuid::parse_str(output(out).trim()).unwrap()
    }

    #[test]
    fn add_then_list_shows_normalized_status() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::try_new(&conn).unwrap();
        add(&store, "Durand", "E100");

        let mut out = Vec::new();
        let options = ListOptions {
            filter: RecordFilter::new().with_status("active"),
            sort: None,
            page: 1,
            include_deleted: false,
        };
        execute_list(&store, &AppConfig::default(), &options, &mut out).unwrap();
        let text = output(out);
        assert!(text.contains("Claire Durand"));
        assert!(text.contains("Active"));
        assert!(text.contains("page 1/1 (1 record(s))"));
    }

    #[test]
    fn list_reports_empty_state() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::try_new(&conn).unwrap();
        let mut out = Vec::new();
        let options = ListOptions {
            filter: RecordFilter::new(),
            sort: None,
            page: 1,
            include_deleted: false,
        };
        execute_list(&store, &AppConfig::default(), &options, &mut out).unwrap();
        assert_eq!(output(out).trim(), "No employees yet.");
    }

    #[test]
    fn edit_writes_only_the_given_field() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::try_new(&conn).unwrap();
        let id = add(&store, "Durand", "E100");

        let mut out = Vec::new();
        execute_edit(&store, id, SliceId::Employment, &["department=Sales"], &mut out).unwrap();
        assert_eq!(output(out).trim(), "saved department");

        let stored = store.fetch_one(id).unwrap().unwrap();
        assert_eq!(stored.department, "Sales");
        assert_eq!(stored.position, "Analyst");
    }

    #[test]
    fn edit_rejects_blank_required_field() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::try_new(&conn).unwrap();
        let id = add(&store, "Durand", "E100");

        let err = execute_edit(&store, id, SliceId::Employment, &["department="], &mut Vec::new())
            .unwrap_err();
        assert!(err.contains("department"));
        assert_eq!(store.fetch_one(id).unwrap().unwrap().department, "Finance");
    }

    #[test]
    fn delete_requires_confirmation() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::try_new(&conn).unwrap();
        let id = add(&store, "Durand", "E100");

        let mut out = Vec::new();
        assert!(execute_delete(&store, id, false, false, &mut out).is_err());
        assert!(output(out).contains("Delete Claire Durand?"));
        assert!(store.fetch_one(id).unwrap().is_some());

        execute_delete(&store, id, false, true, &mut Vec::new()).unwrap();
        assert!(store.fetch_one(id).unwrap().is_none());
    }

    #[test]
    fn export_jsonl_writes_filtered_rows() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::try_new(&conn).unwrap();
        add(&store, "Durand", "E100");
        add(&store, "Petit", "E200");

        let mut out = Vec::new();
        let filter = RecordFilter::new().with_query("petit");
        execute_export(&store, ExportFormat::JsonLines, &filter, false, None, &mut out).unwrap();
        let text = output(out);
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("\"E200\""));
    }

    #[test]
    fn assignments_parse_json_for_lists_only() {
        let (field, value) = parse_assignment("skills=[{\"name\":\"SQL\"}]").unwrap();
        assert_eq!(field, "skills");
        assert_eq!(value, json!([{"name": "SQL"}]));

        let (_, value) = parse_assignment("employee_number=123").unwrap();
        assert_eq!(value, json!("123"));

        assert!(parse_assignment("salary=1").is_err());
        assert!(parse_assignment("department").is_err());
    }

    #[test]
    fn show_falls_back_to_raw_department_when_directory_is_unreadable() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRecordStore::try_new(&conn).unwrap();
        let id = add(&store, "Durand", "E100");
        conn.execute_batch("DROP TABLE departments;").unwrap();

        let mut out = Vec::new();
        execute_show(&conn, &store, id, SliceId::Employment, false, &mut out).unwrap();
        let text = output(out);
        assert!(text
            .lines()
            .any(|line| line.starts_with("Department") && line.ends_with("Finance")));
    }

    #[test]
    fn status_prints_badge() {
        let mut out = Vec::new();
        execute_status("en congé", &mut out).unwrap();
        assert_eq!(output(out).trim(), "On leave (badge-info)");
    }
}
