//! Status enumerations and badge formatting.
//!
//! # Responsibility
//! - Map raw status strings (English/French, legacy casings) to closed enums.
//! - Map every enum value to a display label and a severity style class.
//!
//! # Invariants
//! - Parsing never fails: unmatched input becomes `Unknown(raw)`.
//! - Serialization writes the canonical snake_case name, so legacy
//!   spellings are normalized on the first write-back.
//! - `Unknown` keeps the trimmed raw value and renders it verbatim.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Visual severity of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Danger,
    Info,
    Neutral,
}

impl Severity {
    /// Style class consumed by the presentation layer.
    pub fn class(self) -> &'static str {
        match self {
            Self::Success => "badge-success",
            Self::Warning => "badge-warning",
            Self::Danger => "badge-danger",
            Self::Info => "badge-info",
            Self::Neutral => "badge-neutral",
        }
    }
}

/// Display label plus style for one status value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub severity: Severity,
}

impl Badge {
    fn new(label: impl Into<String>, severity: Severity) -> Self {
        Self {
            label: label.into(),
            severity,
        }
    }

    /// Style class for this badge.
    pub fn class(&self) -> &'static str {
        self.severity.class()
    }

    fn fallback(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::new("Unspecified", Severity::Neutral)
        } else {
            Self::new(trimmed, Severity::Neutral)
        }
    }
}

/// Employment status of an employee record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmployeeStatus {
    Active,
    OnLeave,
    Probation,
    Suspended,
    Inactive,
    Terminated,
    /// Value outside the mapping table, kept as written.
    Unknown(String),
}

impl EmployeeStatus {
    /// Parses a raw status string through the explicit mapping table.
    pub fn parse(raw: &str) -> Self {
        match normalize_key(raw).as_str() {
            "active" | "actif" | "en poste" | "employed" => Self::Active,
            "on leave" | "leave" | "en conge" | "en congé" | "conge" | "congé" => Self::OnLeave,
            "probation" | "trial" | "essai" | "periode d'essai" | "période d'essai"
            | "en periode d'essai" | "en période d'essai" => Self::Probation,
            "suspended" | "suspendu" | "suspendue" => Self::Suspended,
            "inactive" | "inactif" | "disabled" => Self::Inactive,
            "terminated" | "departed" | "left" | "licencie" | "licencié" | "licenciee"
            | "licenciée" | "parti" | "partie" | "sorti" | "sortie" => Self::Terminated,
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    /// Canonical storage name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::OnLeave => "on_leave",
            Self::Probation => "probation",
            Self::Suspended => "suspended",
            Self::Inactive => "inactive",
            Self::Terminated => "terminated",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn badge(&self) -> Badge {
        match self {
            Self::Active => Badge::new("Active", Severity::Success),
            Self::OnLeave => Badge::new("On leave", Severity::Info),
            Self::Probation => Badge::new("Probation", Severity::Warning),
            Self::Suspended => Badge::new("Suspended", Severity::Danger),
            Self::Inactive => Badge::new("Inactive", Severity::Neutral),
            Self::Terminated => Badge::new("Terminated", Severity::Danger),
            Self::Unknown(raw) => Badge::fallback(raw),
        }
    }

    /// Position used when sorting lists by status.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Probation => 1,
            Self::OnLeave => 2,
            Self::Suspended => 3,
            Self::Inactive => 4,
            Self::Terminated => 5,
            Self::Unknown(_) => 6,
        }
    }
}

impl Default for EmployeeStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl From<String> for EmployeeStatus {
    fn from(value: String) -> Self {
        Self::parse(value.as_str())
    }
}

impl From<EmployeeStatus> for String {
    fn from(value: EmployeeStatus) -> Self {
        value.as_str().to_string()
    }
}

impl Display for EmployeeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval state of a leave request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Unknown(String),
}

impl LeaveStatus {
    pub fn parse(raw: &str) -> Self {
        match normalize_key(raw).as_str() {
            "pending" | "submitted" | "en attente" | "soumis" | "soumise" => Self::Pending,
            "approved" | "accepted" | "approuve" | "approuvé" | "approuvee" | "approuvée"
            | "accepte" | "accepté" | "acceptee" | "acceptée" | "valide" | "validé"
            | "validee" | "validée" => Self::Approved,
            "rejected" | "denied" | "refuse" | "refusé" | "refusee" | "refusée" | "rejete"
            | "rejeté" | "rejetee" | "rejetée" => Self::Rejected,
            "cancelled" | "canceled" | "annule" | "annulé" | "annulee" | "annulée" => {
                Self::Cancelled
            }
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn badge(&self) -> Badge {
        match self {
            Self::Pending => Badge::new("Pending", Severity::Warning),
            Self::Approved => Badge::new("Approved", Severity::Success),
            Self::Rejected => Badge::new("Rejected", Severity::Danger),
            Self::Cancelled => Badge::new("Cancelled", Severity::Neutral),
            Self::Unknown(raw) => Badge::fallback(raw),
        }
    }
}

impl Default for LeaveStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl From<String> for LeaveStatus {
    fn from(value: String) -> Self {
        Self::parse(value.as_str())
    }
}

impl From<LeaveStatus> for String {
    fn from(value: LeaveStatus) -> Self {
        value.as_str().to_string()
    }
}

impl Display for LeaveStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a raw employee status string straight to a badge.
pub fn format_status(raw: &str) -> Badge {
    EmployeeStatus::parse(raw).badge()
}

// Lowercase, unify separators and apostrophes, collapse whitespace.
fn normalize_key(raw: &str) -> String {
    let lowered = raw
        .trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .replace('\u{2019}', "'");
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}
