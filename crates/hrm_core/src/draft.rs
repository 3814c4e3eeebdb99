//! Slice-scoped edit buffer.
//!
//! # Responsibility
//! - Hold a local copy of the fields of one slice (or of a new record).
//! - Apply field and sub-list mutations without touching the record.
//! - Compute the partial update and validate before save.
//!
//! # Invariants
//! - A draft is seeded once and never re-seeded; background refreshes of
//!   the record do not reach it.
//! - Only fields owned by the draft's slices can be written.
//! - New sub-items get a temporary id until the store assigns one.

use crate::model::employee::{new_temp_id, Employee, ItemId};
use crate::model::validation::{IssueKind, ValidationReport};
use crate::repo::record_store::RecordPatch;
use crate::slice::{project_document, record_document, FieldKind, FieldSpec, SliceId};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Misuse of the draft mutation API.
#[derive(Debug)]
pub enum DraftError {
    /// Field is not owned by any slice of this draft.
    UnknownField(String),
    /// Sub-list operation on a field that is not a list.
    NotAList(String),
    /// Sub-list items must be JSON objects.
    InvalidItem(String),
    ItemNotFound { field: String, item_id: ItemId },
    /// Record could not be encoded to seed the draft.
    Encode(serde_json::Error),
}

impl Display for DraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(field) => write!(f, "field `{field}` is not editable here"),
            Self::NotAList(field) => write!(f, "field `{field}` is not a list"),
            Self::InvalidItem(field) => write!(f, "items of `{field}` must be objects"),
            Self::ItemNotFound { field, item_id } => {
                write!(f, "no item `{item_id}` in `{field}`")
            }
            Self::Encode(err) => write!(f, "cannot encode record: {err}"),
        }
    }
}

impl Error for DraftError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DraftError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Local edit buffer for one slice, or for a new record across slices.
#[derive(Debug, Clone)]
pub struct Draft {
    slices: Vec<SliceId>,
    /// Full record document the draft is validated against.
    base: Map<String, Value>,
    /// Slice values at seed time.
    seed: Map<String, Value>,
    fields: Map<String, Value>,
    touched: bool,
}

impl Draft {
    /// Seeds a draft from the current record for one slice.
    pub fn seed(record: &Employee, slice: SliceId) -> Result<Self, DraftError> {
        Ok(Self::from_base(record_document(record)?, vec![slice]))
    }

    /// Starts a draft with no backing record (new-record form).
    pub fn blank(slices: &[SliceId]) -> Result<Self, DraftError> {
        Ok(Self::from_base(
            record_document(&Employee::template())?,
            slices.to_vec(),
        ))
    }

    fn from_base(base: Map<String, Value>, slices: Vec<SliceId>) -> Self {
        let seed = project_document(&base, &slices);
        Self {
            fields: seed.clone(),
            slices,
            base,
            seed,
            touched: false,
        }
    }

    pub fn slices(&self) -> &[SliceId] {
        &self.slices
    }

    pub fn owns(&self, field: &str) -> bool {
        self.spec(field).is_some()
    }

    fn spec(&self, field: &str) -> Option<&'static FieldSpec> {
        self.slices.iter().find_map(|slice| slice.field(field))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Whether any mutation has been applied since seeding.
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Whether the current values differ from the seed.
    pub fn has_changes(&self) -> bool {
        self.fields
            .iter()
            .any(|(field, value)| self.seed.get(field) != Some(value))
    }

    /// Replaces one field value.
    pub fn set_field(&mut self, field: &str, value: impl Into<Value>) -> Result<(), DraftError> {
        let spec = self
            .spec(field)
            .ok_or_else(|| DraftError::UnknownField(field.to_string()))?;
        let mut value = value.into();
        if spec.kind == FieldKind::Reference && value.as_str().is_some_and(|v| v.trim().is_empty())
        {
            value = Value::Null;
        }
        self.fields.insert(field.to_string(), value);
        self.touched = true;
        Ok(())
    }

    /// Appends a sub-item and returns its temporary id.
    pub fn push_item(&mut self, field: &str, item: Value) -> Result<ItemId, DraftError> {
        let Value::Object(mut item) = item else {
            return Err(DraftError::InvalidItem(field.to_string()));
        };
        let temp_id = new_temp_id();
        item.insert("id".to_string(), Value::String(temp_id.clone()));
        self.items_mut(field)?.push(Value::Object(item));
        self.touched = true;
        Ok(temp_id)
    }

    /// Removes the sub-item with `item_id`; `false` when absent.
    pub fn remove_item(&mut self, field: &str, item_id: &str) -> Result<bool, DraftError> {
        let items = self.items_mut(field)?;
        let before = items.len();
        items.retain(|item| item_id_of(item) != Some(item_id));
        let removed = items.len() != before;
        if removed {
            self.touched = true;
        }
        Ok(removed)
    }

    /// Sets `key` on the sub-item with `item_id`.
    pub fn update_item(
        &mut self,
        field: &str,
        item_id: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), DraftError> {
        let item = self
            .items_mut(field)?
            .iter_mut()
            .find(|item| item_id_of(item) == Some(item_id))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| DraftError::ItemNotFound {
                field: field.to_string(),
                item_id: item_id.to_string(),
            })?;
        item.insert(key.to_string(), value.into());
        self.touched = true;
        Ok(())
    }

    /// Current sub-items of a list field.
    pub fn items(&self, field: &str) -> &[Value] {
        self.fields
            .get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn items_mut(&mut self, field: &str) -> Result<&mut Vec<Value>, DraftError> {
        let spec = self
            .spec(field)
            .ok_or_else(|| DraftError::UnknownField(field.to_string()))?;
        if spec.kind != FieldKind::List {
            return Err(DraftError::NotAList(field.to_string()));
        }
        let slot = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        match slot {
            Value::Array(items) => Ok(items),
            _ => Err(DraftError::NotAList(field.to_string())),
        }
    }

    /// Fields whose value differs from the seed.
    pub fn changed_fields(&self) -> RecordPatch {
        self.fields
            .iter()
            .filter(|(field, value)| self.seed.get(*field) != Some(*value))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    /// Every field of the draft, changed or not.
    pub fn to_patch(&self) -> RecordPatch {
        self.fields.clone().into()
    }

    /// Runs required-field, format and range checks for the draft's fields.
    ///
    /// Issues on fields outside the draft's slices are not reported.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();

        for (field, value) in &self.fields {
            let required = self.spec(field).is_some_and(|spec| spec.required);
            if value.is_null() && required {
                report.push(field.as_str(), IssueKind::Required);
                continue;
            }
            let mut candidate = self.base.clone();
            candidate.insert(field.clone(), value.clone());
            if let Err(err) = serde_json::from_value::<Employee>(Value::Object(candidate)) {
                report.push(field.as_str(), IssueKind::InvalidValue(err.to_string()));
            }
        }
        if !report.is_empty() {
            return Err(report);
        }

        match self.preview() {
            Ok(record) => match record.validate() {
                Ok(()) => Ok(()),
                Err(mut report) => {
                    report.retain_fields(|field| self.owns(field));
                    report.into_result()
                }
            },
            Err(err) => {
                let mut report = ValidationReport::default();
                report.push("record", IssueKind::InvalidValue(err.to_string()));
                Err(report)
            }
        }
    }

    /// The base record with the draft's fields applied.
    pub fn preview(&self) -> Result<Employee, serde_json::Error> {
        let mut merged = self.base.clone();
        for (field, value) in &self.fields {
            merged.insert(field.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(merged))
    }
}

fn item_id_of(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::{Draft, DraftError};
    use crate::model::employee::{is_temp_id, Employee};
    use crate::model::validation::IssueKind;
    use crate::slice::SliceId;
    use serde_json::json;

    fn record() -> Employee {
        let mut employee = Employee::template();
        employee.id = uuid::Uuid::new_v4();
        employee.first_name = "Jean".to_string();
        employee.last_name = "Dupont".to_string();
        employee.email = "jean@example.com".to_string();
        employee.employee_number = "E1".to_string();
        employee.position = "Sales rep".to_string();
        employee.department = "Sales".to_string();
        employee.hire_date = "2020-01-06".to_string();
        employee
    }

    #[test]
    fn changed_fields_contains_only_modified_values() {
        let mut draft = Draft::seed(&record(), SliceId::Employment).unwrap();
        assert!(draft.changed_fields().is_empty());

        draft.set_field("department", "Finance").unwrap();
        let patch = draft.changed_fields();
        assert_eq!(patch.len(), 1);
        assert_eq!(patch.get("department"), Some(&json!("Finance")));
        assert!(draft.is_touched());
    }

    #[test]
    fn setting_back_the_seed_value_clears_changes() {
        let mut draft = Draft::seed(&record(), SliceId::Employment).unwrap();
        draft.set_field("department", "Finance").unwrap();
        draft.set_field("department", "Sales").unwrap();
        assert!(!draft.has_changes());
        assert!(draft.is_touched());
    }

    #[test]
    fn fields_outside_the_slice_are_rejected() {
        let mut draft = Draft::seed(&record(), SliceId::Employment).unwrap();
        let err = draft.set_field("first_name", "Paul").unwrap_err();
        assert!(matches!(err, DraftError::UnknownField(field) if field == "first_name"));
    }

    #[test]
    fn sub_items_get_temporary_ids_and_can_be_removed() {
        let mut draft = Draft::seed(&record(), SliceId::Skills).unwrap();
        let first = draft.push_item("skills", json!({"name": "Excel"})).unwrap();
        let second = draft.push_item("skills", json!({"name": "SAP"})).unwrap();
        assert!(is_temp_id(&first));
        assert_ne!(first, second);

        draft.update_item("skills", &second, "level", 4).unwrap();
        assert!(draft.remove_item("skills", &first).unwrap());
        assert!(!draft.remove_item("skills", &first).unwrap());

        let items = draft.items("skills");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["level"], 4);
    }

    #[test]
    fn sub_list_operations_require_list_fields() {
        let mut draft = Draft::seed(&record(), SliceId::Schedule).unwrap();
        let err = draft.push_item("schedule", json!({})).unwrap_err();
        assert!(matches!(err, DraftError::NotAList(_)));
    }

    #[test]
    fn blank_required_field_fails_validation() {
        let mut draft = Draft::seed(&record(), SliceId::Employment).unwrap();
        draft.set_field("department", "").unwrap();
        let report = draft.validate().unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(report.issues()[0].field, "department");
        assert_eq!(report.issues()[0].kind, IssueKind::Required);
    }

    #[test]
    fn wrongly_typed_value_is_flagged_on_its_field() {
        let mut draft = Draft::seed(&record(), SliceId::Schedule).unwrap();
        draft
            .set_field("schedule", json!({"weekly_hours": "many"}))
            .unwrap();
        let report = draft.validate().unwrap_err();
        assert_eq!(report.issues()[0].field, "schedule");
    }

    #[test]
    fn null_in_optional_non_nullable_field_is_flagged_on_its_field() {
        let mut draft = Draft::seed(&record(), SliceId::Schedule).unwrap();
        draft.set_field("schedule", json!(null)).unwrap();
        let report = draft.validate().unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(report.issues()[0].field, "schedule");

        let mut draft = Draft::seed(&record(), SliceId::Skills).unwrap();
        draft.set_field("skills", json!(null)).unwrap();
        assert_eq!(draft.validate().unwrap_err().issues()[0].field, "skills");
    }

    #[test]
    fn new_sub_item_missing_required_key_is_flagged() {
        let mut draft = Draft::seed(&record(), SliceId::Leave).unwrap();
        draft
            .push_item("leave_requests", json!({"kind": "paid", "start_date": "2024-02-01"}))
            .unwrap();
        let report = draft.validate().unwrap_err();
        assert_eq!(report.issues()[0].field, "leave_requests[0].end_date");
    }

    #[test]
    fn blank_manager_reference_becomes_null() {
        let mut draft = Draft::seed(&record(), SliceId::Employment).unwrap();
        draft.set_field("manager_id", "  ").unwrap();
        assert!(draft.get("manager_id").unwrap().is_null());
        draft.validate().unwrap();
    }
}
