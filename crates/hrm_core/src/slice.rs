//! Slice schema: which record fields each detail tab owns.
//!
//! # Responsibility
//! - Enumerate slices and the top-level fields each one edits.
//! - Project a record onto one slice as a field map.
//!
//! # Invariants
//! - Every editable top-level field belongs to exactly one slice.
//! - Store-managed fields (`id`, timestamps, tombstone) belong to none.

use crate::model::employee::Employee;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// Fields maintained by the store; never part of a partial update.
pub const RESERVED_FIELDS: &[&str] = &["id", "created_at", "updated_at", "is_deleted"];

/// Named subset of an employee record shown in one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceId {
    Identity,
    Employment,
    Documents,
    Skills,
    Schedule,
    Leave,
    Evaluations,
}

/// Value shape of a field, used to pick an input widget and to gate
/// sub-list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Date,
    Status,
    /// Id of another record, resolved to a label for display.
    Reference,
    Object,
    /// Array of items, each carrying an `id`.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required,
    }
}

const IDENTITY_FIELDS: &[FieldSpec] = &[
    field("first_name", "First name", FieldKind::Text, true),
    field("last_name", "Last name", FieldKind::Text, true),
    field("email", "Email", FieldKind::Email, true),
    field("phone", "Phone", FieldKind::Text, false),
    field("birth_date", "Birth date", FieldKind::Date, false),
    field("address", "Address", FieldKind::Object, false),
];

const EMPLOYMENT_FIELDS: &[FieldSpec] = &[
    field("employee_number", "Employee number", FieldKind::Text, true),
    field("position", "Position", FieldKind::Text, true),
    field("department", "Department", FieldKind::Text, true),
    field("company", "Company", FieldKind::Object, false),
    field("manager_id", "Manager", FieldKind::Reference, false),
    field("contract_type", "Contract type", FieldKind::Text, false),
    field("hire_date", "Hire date", FieldKind::Date, true),
    field("status", "Status", FieldKind::Status, true),
];

const DOCUMENT_FIELDS: &[FieldSpec] = &[field("documents", "Documents", FieldKind::List, false)];
const SKILL_FIELDS: &[FieldSpec] = &[field("skills", "Skills", FieldKind::List, false)];
const SCHEDULE_FIELDS: &[FieldSpec] = &[field("schedule", "Schedule", FieldKind::Object, false)];
const LEAVE_FIELDS: &[FieldSpec] = &[field(
    "leave_requests",
    "Leave requests",
    FieldKind::List,
    false,
)];
const EVALUATION_FIELDS: &[FieldSpec] =
    &[field("evaluations", "Evaluations", FieldKind::List, false)];

impl SliceId {
    /// Tab order.
    pub const ALL: [SliceId; 7] = [
        Self::Identity,
        Self::Employment,
        Self::Documents,
        Self::Skills,
        Self::Schedule,
        Self::Leave,
        Self::Evaluations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Employment => "employment",
            Self::Documents => "documents",
            Self::Skills => "skills",
            Self::Schedule => "schedule",
            Self::Leave => "leave",
            Self::Evaluations => "evaluations",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Identity => "Personal information",
            Self::Employment => "Employment",
            Self::Documents => "Documents",
            Self::Skills => "Skills",
            Self::Schedule => "Schedule",
            Self::Leave => "Leave",
            Self::Evaluations => "Evaluations",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|slice| slice.as_str().eq_ignore_ascii_case(value))
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Identity => IDENTITY_FIELDS,
            Self::Employment => EMPLOYMENT_FIELDS,
            Self::Documents => DOCUMENT_FIELDS,
            Self::Skills => SKILL_FIELDS,
            Self::Schedule => SCHEDULE_FIELDS,
            Self::Leave => LEAVE_FIELDS,
            Self::Evaluations => EVALUATION_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    pub fn owns(self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Slice that owns the top-level field `name`.
    pub fn for_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slice| slice.owns(name))
    }
}

impl Display for SliceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up the schema entry for any editable top-level field.
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    SliceId::for_field(name).and_then(|slice| slice.field(name))
}

/// Serializes a record into its top-level field map.
pub fn record_document(record: &Employee) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(serde::ser::Error::custom("employee must serialize to an object")),
    }
}

/// Copies the fields owned by `slices` out of a record document.
pub fn project_document(document: &Map<String, Value>, slices: &[SliceId]) -> Map<String, Value> {
    slices
        .iter()
        .flat_map(|slice| slice.fields())
        .map(|spec| {
            let value = document.get(spec.name).cloned().unwrap_or(Value::Null);
            (spec.name.to_string(), value)
        })
        .collect()
}

/// Projects a record onto one slice.
pub fn project(record: &Employee, slice: SliceId) -> Result<Map<String, Value>, serde_json::Error> {
    Ok(project_document(&record_document(record)?, &[slice]))
}

#[cfg(test)]
mod tests {
    use super::{field_spec, project, FieldKind, SliceId, RESERVED_FIELDS};
    use crate::model::employee::Employee;
    use std::collections::HashSet;

    #[test]
    fn every_field_belongs_to_one_slice() {
        let mut seen = HashSet::new();
        for slice in SliceId::ALL {
            for spec in slice.fields() {
                assert!(seen.insert(spec.name), "{} is owned twice", spec.name);
                assert_eq!(SliceId::for_field(spec.name), Some(slice));
            }
        }
        for reserved in RESERVED_FIELDS {
            assert_eq!(SliceId::for_field(reserved), None);
        }
    }

    #[test]
    fn every_document_field_is_covered() {
        let document = super::record_document(&Employee::template()).unwrap();
        for key in document.keys() {
            assert!(
                RESERVED_FIELDS.contains(&key.as_str()) || SliceId::for_field(key).is_some(),
                "{key} has no slice"
            );
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(SliceId::parse(" Employment "), Some(SliceId::Employment));
        assert_eq!(SliceId::parse("payroll"), None);
    }

    #[test]
    fn projection_contains_only_slice_fields() {
        let mut record = Employee::template();
        record.department = "Sales".to_string();
        let projected = project(&record, SliceId::Employment).unwrap();

        assert_eq!(projected.len(), SliceId::Employment.fields().len());
        assert_eq!(projected["department"], "Sales");
        assert!(!projected.contains_key("first_name"));
        assert_eq!(field_spec("skills").map(|spec| spec.kind), Some(FieldKind::List));
    }
}
