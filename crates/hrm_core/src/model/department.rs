//! Department directory entry.

use crate::model::validation::{IssueKind, ValidationReport};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DepartmentId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    /// Display name; unique case-insensitively.
    pub name: String,
    /// Optional short code (`FIN`, `RH`) that employee records may use
    /// instead of the name.
    pub code: Option<String>,
}

impl Department {
    pub fn new(name: impl Into<String>, code: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();
        if self.name.trim().is_empty() {
            report.push("name", IssueKind::Required);
        }
        if matches!(self.code.as_deref(), Some(code) if code.trim().is_empty()) {
            report.push(
                "code",
                IssueKind::InvalidValue("must be omitted instead of blank".to_string()),
            );
        }
        report.into_result()
    }

    /// Returns whether `value` names this department by name or code.
    pub fn matches(&self, value: &str) -> bool {
        let value = value.trim().to_lowercase();
        self.name.trim().to_lowercase() == value
            || self
                .code
                .as_deref()
                .is_some_and(|code| code.trim().to_lowercase() == value)
    }
}
