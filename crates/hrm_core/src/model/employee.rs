//! Employee record model.
//!
//! # Responsibility
//! - Define the canonical employee record and its sub-item types.
//! - Normalize loosely-typed legacy shapes (`address`, `company`) once, at
//!   deserialization time.
//! - Provide whole-record validation shared by drafts and the store.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused.
//! - Sub-list items carry a non-empty `id`; ids starting with
//!   [`TEMP_ID_PREFIX`] are local placeholders replaced by the store.
//! - `is_deleted` is the soft-delete tombstone.

use crate::model::status::{EmployeeStatus, LeaveStatus};
use crate::model::validation::{IssueKind, ValidationReport};
use chrono::{NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable identifier of an employee record.
pub type EmployeeId = Uuid;

/// Identifier of one sub-list item (document, skill, leave, evaluation).
pub type ItemId = String;

/// Prefix of locally generated sub-item ids awaiting a server id.
pub const TEMP_ID_PREFIX: &str = "tmp-";

pub const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_FORMAT_LABEL: &str = "YYYY-MM-DD";
const MAX_WEEKLY_HOURS: u16 = 80;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Generates a temporary sub-item id.
pub fn new_temp_id() -> ItemId {
    format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4())
}

/// Returns whether `id` still needs a server-assigned replacement.
pub fn is_temp_id(id: &str) -> bool {
    id.trim().is_empty() || id.starts_with(TEMP_ID_PREFIX)
}

/// Postal address. Legacy single-line addresses land in `street`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AddressInput")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// One-line rendering that skips empty parts.
    pub fn one_line(&self) -> String {
        let locality = [self.postal_code.trim(), self.city.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let parts: Vec<&str> = [self.street.trim(), locality.as_str(), self.country.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
        parts.join(", ")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AddressInput {
    Line(String),
    Structured {
        #[serde(default)]
        street: String,
        #[serde(default)]
        city: String,
        #[serde(default)]
        postal_code: String,
        #[serde(default)]
        country: String,
    },
}

impl From<AddressInput> for Address {
    fn from(value: AddressInput) -> Self {
        match value {
            AddressInput::Line(line) => Self {
                street: line.trim().to_string(),
                ..Self::default()
            },
            AddressInput::Structured {
                street,
                city,
                postal_code,
                country,
            } => Self {
                street,
                city,
                postal_code,
                country,
            },
        }
    }
}

/// Employer entity. Legacy records store a bare company name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CompanyInput")]
pub struct Company {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompanyInput {
    Name(String),
    Structured {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: String,
    },
}

impl From<CompanyInput> for Company {
    fn from(value: CompanyInput) -> Self {
        match value {
            CompanyInput::Name(name) => Self {
                id: None,
                name: name.trim().to_string(),
            },
            CompanyInput::Structured { id, name } => Self { id, name },
        }
    }
}

/// Reference to a stored document (contract, ID card, certificate).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub issued_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    /// 1 (beginner) to 5 (expert).
    #[serde(default)]
    pub level: Option<u8>,
}

/// Contractual working pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSchedule {
    #[serde(default)]
    pub weekly_hours: Option<u16>,
    /// Weekday names (`monday`, `tue`, ...).
    #[serde(default)]
    pub work_days: Vec<String>,
    #[serde(default)]
    pub shift: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    #[serde(default)]
    pub id: ItemId,
    /// Leave category (`paid`, `sick`, `unpaid`, ...).
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub status: LeaveStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub reviewer: String,
    /// 1 to 5.
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Canonical employee record.
///
/// Top-level field names double as the partial-update keys used by drafts
/// and by [`crate::repo::record_store::RecordStore::update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    pub employee_number: String,
    pub position: String,
    pub department: String,
    #[serde(default)]
    pub company: Option<Company>,
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
    #[serde(default)]
    pub contract_type: Option<String>,
    pub hire_date: String,
    #[serde(default)]
    pub status: EmployeeStatus,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub schedule: WorkSchedule,
    #[serde(default)]
    pub leave_requests: Vec<LeaveRequest>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
    /// Epoch milliseconds, maintained by the store.
    #[serde(default)]
    pub created_at: i64,
    /// Epoch milliseconds, maintained by the store.
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Employee {
    /// Empty record used as the base of a new-record form.
    ///
    /// Required text fields are blank, so the template itself never passes
    /// [`Employee::validate`].
    pub fn template() -> Self {
        Self {
            id: Uuid::nil(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: None,
            birth_date: None,
            address: None,
            employee_number: String::new(),
            position: String::new(),
            department: String::new(),
            company: None,
            manager_id: None,
            contract_type: None,
            hire_date: String::new(),
            status: EmployeeStatus::Active,
            documents: Vec::new(),
            skills: Vec::new(),
            schedule: WorkSchedule::default(),
            leave_requests: Vec::new(),
            evaluations: Vec::new(),
            created_at: 0,
            updated_at: 0,
            is_deleted: false,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    pub fn restore(&mut self) {
        self.is_deleted = false;
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Validates the whole record.
    ///
    /// # Errors
    /// - Returns every issue found, keyed by field path.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();

        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("employee_number", &self.employee_number),
            ("position", &self.position),
            ("department", &self.department),
        ] {
            require_text(&mut report, field, value);
        }

        if matches!(&self.status, EmployeeStatus::Unknown(raw) if raw.trim().is_empty()) {
            report.push("status", IssueKind::Required);
        }

        if !self.email.trim().is_empty() && !EMAIL_RE.is_match(self.email.trim()) {
            report.push("email", IssueKind::InvalidFormat("an email address"));
        }

        check_required_date(&mut report, "hire_date", &self.hire_date);
        if let Some(birth_date) = self.birth_date.as_deref() {
            check_optional_date(&mut report, "birth_date", birth_date);
        }

        if self.manager_id == Some(self.id) && !self.id.is_nil() {
            report.push(
                "manager_id",
                IssueKind::InvalidValue("an employee cannot be their own manager".to_string()),
            );
        }

        self.validate_documents(&mut report);
        self.validate_skills(&mut report);
        self.validate_schedule(&mut report);
        self.validate_leave_requests(&mut report);
        self.validate_evaluations(&mut report);

        report.into_result()
    }

    fn validate_documents(&self, report: &mut ValidationReport) {
        check_unique_ids(report, "documents", self.documents.iter().map(|d| &d.id));
        for (index, document) in self.documents.iter().enumerate() {
            require_text(report, &format!("documents[{index}].title"), &document.title);
            require_text(report, &format!("documents[{index}].uri"), &document.uri);
            if let Some(issued_on) = document.issued_on.as_deref() {
                check_optional_date(report, &format!("documents[{index}].issued_on"), issued_on);
            }
        }
    }

    fn validate_skills(&self, report: &mut ValidationReport) {
        check_unique_ids(report, "skills", self.skills.iter().map(|s| &s.id));
        for (index, skill) in self.skills.iter().enumerate() {
            require_text(report, &format!("skills[{index}].name"), &skill.name);
            if let Some(level) = skill.level {
                if !(1..=5).contains(&level) {
                    report.push(
                        format!("skills[{index}].level"),
                        IssueKind::OutOfRange { min: 1, max: 5 },
                    );
                }
            }
        }
    }

    fn validate_schedule(&self, report: &mut ValidationReport) {
        if let Some(hours) = self.schedule.weekly_hours {
            if hours > MAX_WEEKLY_HOURS {
                report.push(
                    "schedule.weekly_hours",
                    IssueKind::OutOfRange {
                        min: 0,
                        max: i64::from(MAX_WEEKLY_HOURS),
                    },
                );
            }
        }
        for (index, day) in self.schedule.work_days.iter().enumerate() {
            if day.trim().parse::<Weekday>().is_err() {
                report.push(
                    format!("schedule.work_days[{index}]"),
                    IssueKind::InvalidFormat("a weekday name"),
                );
            }
        }
    }

    fn validate_leave_requests(&self, report: &mut ValidationReport) {
        check_unique_ids(
            report,
            "leave_requests",
            self.leave_requests.iter().map(|l| &l.id),
        );
        for (index, leave) in self.leave_requests.iter().enumerate() {
            require_text(report, &format!("leave_requests[{index}].kind"), &leave.kind);
            let start = check_required_date(
                report,
                &format!("leave_requests[{index}].start_date"),
                &leave.start_date,
            );
            let end = check_required_date(
                report,
                &format!("leave_requests[{index}].end_date"),
                &leave.end_date,
            );
            if let (Some(start), Some(end)) = (start, end) {
                if end < start {
                    report.push(
                        format!("leave_requests[{index}].end_date"),
                        IssueKind::InvalidValue("must not be earlier than start_date".to_string()),
                    );
                }
            }
        }
    }

    fn validate_evaluations(&self, report: &mut ValidationReport) {
        check_unique_ids(report, "evaluations", self.evaluations.iter().map(|e| &e.id));
        for (index, evaluation) in self.evaluations.iter().enumerate() {
            check_required_date(report, &format!("evaluations[{index}].date"), &evaluation.date);
            require_text(
                report,
                &format!("evaluations[{index}].reviewer"),
                &evaluation.reviewer,
            );
            if !(1..=5).contains(&evaluation.score) {
                report.push(
                    format!("evaluations[{index}].score"),
                    IssueKind::OutOfRange { min: 1, max: 5 },
                );
            }
        }
    }
}

/// Parses an ISO calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn require_text(report: &mut ValidationReport, field: &str, value: &str) {
    if value.trim().is_empty() {
        report.push(field, IssueKind::Required);
    }
}

fn check_required_date(
    report: &mut ValidationReport,
    field: &str,
    value: &str,
) -> Option<NaiveDate> {
    if value.trim().is_empty() {
        report.push(field, IssueKind::Required);
        return None;
    }
    let parsed = parse_date(value);
    if parsed.is_none() {
        report.push(field, IssueKind::InvalidFormat(DATE_FORMAT_LABEL));
    }
    parsed
}

fn check_optional_date(report: &mut ValidationReport, field: &str, value: &str) {
    if !value.trim().is_empty() && parse_date(value).is_none() {
        report.push(field, IssueKind::InvalidFormat(DATE_FORMAT_LABEL));
    }
}

fn check_unique_ids<'a>(
    report: &mut ValidationReport,
    field: &str,
    ids: impl Iterator<Item = &'a ItemId>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !id.is_empty() && !seen.insert(id.as_str()) {
            report.push(
                field,
                IssueKind::InvalidValue(format!("duplicate item id `{id}`")),
            );
        }
    }
}
