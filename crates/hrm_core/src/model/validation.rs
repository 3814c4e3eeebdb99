//! Field-level validation results.
//!
//! Issues are keyed by a field path: a top-level field name (`email`) or a
//! sub-list item path (`skills[2].name`). The presentation layer renders
//! each issue next to the matching input.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// What is wrong with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Field is missing or blank.
    Required,
    /// Value does not match the expected format (e.g. `YYYY-MM-DD`).
    InvalidFormat(&'static str),
    /// Numeric value outside its allowed range.
    OutOfRange { min: i64, max: i64 },
    /// Value cannot be accepted for another reason.
    InvalidValue(String),
}

/// One validation issue bound to a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub kind: IssueKind,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// Top-level field this issue belongs to (`skills[2].name` -> `skills`).
    pub fn root_field(&self) -> &str {
        let end = self
            .field
            .find(['[', '.'])
            .unwrap_or(self.field.len());
        &self.field[..end]
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            IssueKind::Required => write!(f, "{} is required", self.field),
            IssueKind::InvalidFormat(expected) => {
                write!(f, "{} must be formatted as {expected}", self.field)
            }
            IssueKind::OutOfRange { min, max } => {
                write!(f, "{} must be between {min} and {max}", self.field)
            }
            IssueKind::InvalidValue(message) => write!(f, "{}: {message}", self.field),
        }
    }
}

/// Collected validation issues; empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn push(&mut self, field: impl Into<String>, kind: IssueKind) {
        self.issues.push(ValidationIssue::new(field, kind));
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Issues whose top-level field is `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues
            .iter()
            .filter(move |issue| issue.root_field() == field)
    }

    /// Keeps only issues whose top-level field satisfies `keep`.
    pub fn retain_fields(&mut self, keep: impl Fn(&str) -> bool) {
        self.issues.retain(|issue| keep(issue.root_field()));
    }

    /// Converts an accumulated report into a `Result`.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        write!(f, "validation failed: {}", messages.join("; "))
    }
}

impl Error for ValidationReport {}

#[cfg(test)]
mod tests {
    use super::{IssueKind, ValidationReport};

    #[test]
    fn root_field_strips_item_path() {
        let mut report = ValidationReport::default();
        report.push("skills[2].name", IssueKind::Required);
        report.push("email", IssueKind::InvalidFormat("an email address"));

        assert_eq!(report.issues()[0].root_field(), "skills");
        assert_eq!(report.for_field("skills").count(), 1);
        assert_eq!(report.for_field("email").count(), 1);
    }

    #[test]
    fn retain_fields_filters_by_root() {
        let mut report = ValidationReport::default();
        report.push("first_name", IssueKind::Required);
        report.push("department", IssueKind::Required);
        report.retain_fields(|field| field == "department");

        assert_eq!(report.len(), 1);
        assert_eq!(report.issues()[0].field, "department");
        assert!(report.into_result().is_err());
    }
}
