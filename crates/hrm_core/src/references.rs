//! Display labels for values that point at other records.
//!
//! A reference that no longer resolves renders a fallback label instead of
//! failing the view that shows it.

use crate::model::department::Department;
use crate::model::employee::EmployeeId;
use crate::repo::department_repo::DepartmentRepository;
use crate::repo::error::RepoResult;
use crate::repo::record_store::RecordStore;
use log::warn;
use std::fmt::{Display, Formatter};

pub const UNSPECIFIED_LABEL: &str = "Unspecified";
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceLabel {
    /// Target found; carries its display name.
    Resolved(String),
    /// Value kept as entered because nothing configured describes it.
    Raw(String),
    /// No reference set.
    Unspecified,
    /// Reference set but its target is gone.
    Unknown,
}

impl ReferenceLabel {
    pub fn text(&self) -> &str {
        match self {
            Self::Resolved(label) | Self::Raw(label) => label,
            Self::Unspecified => UNSPECIFIED_LABEL,
            Self::Unknown => UNKNOWN_LABEL,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl Display for ReferenceLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Label for a record's manager reference.
///
/// Lookup failures are logged and rendered as [`ReferenceLabel::Unknown`].
pub fn manager_label<S>(store: &S, manager_id: Option<EmployeeId>) -> ReferenceLabel
where
    S: RecordStore + ?Sized,
{
    let Some(manager_id) = manager_id else {
        return ReferenceLabel::Unspecified;
    };
    match store.fetch_one(manager_id) {
        Ok(Some(manager)) => ReferenceLabel::Resolved(manager.full_name()),
        Ok(None) => ReferenceLabel::Unknown,
        Err(err) => {
            warn!(
                "event=reference_resolve module=references status=error kind=manager target_id={manager_id} error={err}"
            );
            ReferenceLabel::Unknown
        }
    }
}

/// Snapshot of the configured departments used for label lookups.
#[derive(Debug, Clone, Default)]
pub struct DepartmentDirectory {
    departments: Vec<Department>,
}

impl DepartmentDirectory {
    pub fn new(departments: Vec<Department>) -> Self {
        Self { departments }
    }

    pub fn load<R>(repo: &R) -> RepoResult<Self>
    where
        R: DepartmentRepository + ?Sized,
    {
        Ok(Self::new(repo.list_departments()?))
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    /// Finds the department named by `value` (name or code).
    pub fn find(&self, value: &str) -> Option<&Department> {
        self.departments
            .iter()
            .find(|department| department.matches(value))
    }

    pub fn label_for(&self, value: &str) -> ReferenceLabel {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return ReferenceLabel::Unspecified;
        }
        match self.find(trimmed) {
            Some(department) => ReferenceLabel::Resolved(department.name.clone()),
            None => ReferenceLabel::Raw(trimmed.to_string()),
        }
    }
}

/// Configured name for a department value, the raw value when the directory
/// does not know it, "Unspecified" when blank.
pub fn resolve_department_label(directory: &DepartmentDirectory, value: &str) -> String {
    directory.label_for(value).text().to_string()
}

#[cfg(test)]
mod tests {
    use super::{resolve_department_label, DepartmentDirectory, ReferenceLabel};
    use crate::model::department::Department;

    fn directory() -> DepartmentDirectory {
        DepartmentDirectory::new(vec![
            Department::new("Finance", Some("FIN".to_string())),
            Department::new("Ressources humaines", Some("RH".to_string())),
        ])
    }

    #[test]
    fn code_resolves_to_configured_name() {
        assert_eq!(
            directory().label_for(" rh "),
            ReferenceLabel::Resolved("Ressources humaines".to_string())
        );
    }

    #[test]
    fn unknown_department_keeps_raw_value() {
        assert_eq!(resolve_department_label(&directory(), "Legal"), "Legal");
        assert_eq!(resolve_department_label(&directory(), "  "), "Unspecified");
    }
}
