//! Record list: filtering, sorting, pagination and row actions.
//!
//! # Responsibility
//! - Narrow a record sequence with a free-text query and structured filters.
//! - Produce a page view model where "nothing to show" is its own variant.
//! - Forward row actions to a parent-supplied handler.
//!
//! # Invariants
//! - Filtering only removes rows; it never reorders them.
//! - Applying filters one after another gives the same rows in any order.
//! - The list never talks to a store; deletes run through the handler after
//!   an explicit confirmation.

use crate::model::employee::{parse_date, Employee, EmployeeId};
use crate::model::status::EmployeeStatus;
use log::info;
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Free-text query plus structured filters, AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub query: String,
    pub status: Option<EmployeeStatus>,
    pub department: Option<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Raw status text is normalized, so legacy spellings select the same
    /// records as canonical ones.
    pub fn with_status(mut self, status: impl AsRef<str>) -> Self {
        self.status = Some(EmployeeStatus::parse(status.as_ref()));
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.status.is_none() && self.department.is_none()
    }

    pub fn matches(&self, record: &Employee) -> bool {
        self.matches_query(record) && self.matches_status(record) && self.matches_department(record)
    }

    fn matches_query(&self, record: &Employee) -> bool {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let full_name = record.full_name();
        let searchable = [
            record.first_name.as_str(),
            record.last_name.as_str(),
            full_name.as_str(),
            record.employee_number.as_str(),
            record.email.as_str(),
            record.position.as_str(),
            record.department.as_str(),
        ];
        let found = searchable
            .iter()
            .any(|value| value.to_lowercase().contains(&needle));
        found
    }

    fn matches_status(&self, record: &Employee) -> bool {
        match (&self.status, &record.status) {
            (None, _) => true,
            (Some(EmployeeStatus::Unknown(wanted)), EmployeeStatus::Unknown(actual)) => {
                wanted.trim().eq_ignore_ascii_case(actual.trim())
            }
            (Some(wanted), actual) => wanted == actual,
        }
    }

    fn matches_department(&self, record: &Employee) -> bool {
        self.department.as_deref().map_or(true, |department| {
            department.trim().to_lowercase() == record.department.trim().to_lowercase()
        })
    }
}

/// Keeps the records matching `filter`, in input order.
pub fn filter_records<'a, I>(records: I, filter: &RecordFilter) -> Vec<&'a Employee>
where
    I: IntoIterator<Item = &'a Employee>,
{
    records
        .into_iter()
        .filter(|record| filter.matches(record))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Last name, then first name.
    LastName,
    /// Unparseable dates sort after valid ones.
    HireDate,
    /// Lifecycle rank of the normalized status.
    Status,
    EmployeeNumber,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "last_name" | "name" => Some(Self::LastName),
            "hire_date" => Some(Self::HireDate),
            "status" => Some(Self::Status),
            "employee_number" | "number" => Some(Self::EmployeeNumber),
            _ => None,
        }
    }

    fn compare(self, left: &Employee, right: &Employee) -> Ordering {
        match self {
            Self::LastName => compare_text(&left.last_name, &right.last_name)
                .then_with(|| compare_text(&left.first_name, &right.first_name)),
            Self::HireDate => {
                match (parse_date(&left.hire_date), parse_date(&right.hire_date)) {
                    (Some(left), Some(right)) => left.cmp(&right),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
            Self::Status => left.status.rank().cmp(&right.status.rank()),
            Self::EmployeeNumber => compare_text(&left.employee_number, &right.employee_number),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

fn compare_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase().cmp(&right.to_lowercase())
}

/// Stable sort: rows with equal keys keep their relative order.
pub fn sort_records(records: &mut [&Employee], key: SortKey, direction: SortDirection) {
    records.sort_by(|left, right| {
        let ordering = key.compare(left, right);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// One page of rows; `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Cuts `rows` into pages of `page_size`; out-of-range pages clamp to the
/// nearest valid one.
pub fn paginate<T: Clone>(rows: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = rows.len();
    let total_pages = total.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total);

    Page {
        items: rows.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        page_size,
        total,
        total_pages,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The list has no records at all.
    NoRecords,
    /// Records exist but none match the active filters.
    NoMatches,
}

impl EmptyReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoRecords => "No employees yet.",
            Self::NoMatches => "No employees match the current filters.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView<'a> {
    Empty { reason: EmptyReason },
    Rows(Page<&'a Employee>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    View,
    Edit,
    Delete,
}

/// Callbacks supplied by the screen that owns the list.
pub trait RowActionHandler {
    fn view(&mut self, id: EmployeeId);
    fn edit(&mut self, id: EmployeeId);
    /// Runs a confirmed delete; `false` when it failed.
    fn delete(&mut self, id: EmployeeId) -> bool;
}

/// Delete awaiting user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub id: EmployeeId,
    pub label: String,
}

impl DeleteConfirmation {
    pub fn prompt(&self) -> String {
        format!("Delete {}? This cannot be undone from the list.", self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDispatch {
    Handled,
    NeedsConfirmation(DeleteConfirmation),
    UnknownRow(EmployeeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResolution {
    Deleted,
    Kept,
    Failed,
    NothingPending,
}

/// List screen state over an in-memory record sequence.
#[derive(Debug, Clone)]
pub struct RecordList {
    records: Vec<Employee>,
    filter: RecordFilter,
    sort: Option<(SortKey, SortDirection)>,
    page: usize,
    page_size: usize,
    pending_delete: Option<DeleteConfirmation>,
}

impl RecordList {
    pub fn new(records: Vec<Employee>, page_size: usize) -> Self {
        Self {
            records,
            filter: RecordFilter::default(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
            pending_delete: None,
        }
    }

    pub fn records(&self) -> &[Employee] {
        &self.records
    }

    /// Replaces the rows after a reload.
    pub fn set_records(&mut self, records: Vec<Employee>) {
        self.records = records;
        self.pending_delete = None;
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: RecordFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort = Some((key, direction));
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Filtered and sorted rows, before pagination.
    pub fn visible(&self) -> Vec<&Employee> {
        let mut rows = filter_records(&self.records, &self.filter);
        if let Some((key, direction)) = self.sort {
            sort_records(&mut rows, key, direction);
        }
        rows
    }

    pub fn view(&self) -> ListView<'_> {
        let rows = self.visible();
        if rows.is_empty() {
            let reason = if self.records.is_empty() {
                EmptyReason::NoRecords
            } else {
                EmptyReason::NoMatches
            };
            return ListView::Empty { reason };
        }
        ListView::Rows(paginate(&rows, self.page, self.page_size))
    }

    pub fn pending_delete(&self) -> Option<&DeleteConfirmation> {
        self.pending_delete.as_ref()
    }

    /// Routes a row action to `handler`. Deletes only record the request
    /// and return the confirmation to show.
    pub fn dispatch(
        &mut self,
        action: RowAction,
        id: EmployeeId,
        handler: &mut (impl RowActionHandler + ?Sized),
    ) -> RowDispatch {
        let Some(record) = self.records.iter().find(|record| record.id == id) else {
            return RowDispatch::UnknownRow(id);
        };
        match action {
            RowAction::View => handler.view(id),
            RowAction::Edit => handler.edit(id),
            RowAction::Delete => {
                let confirmation = DeleteConfirmation {
                    id,
                    label: record.full_name(),
                };
                self.pending_delete = Some(confirmation.clone());
                return RowDispatch::NeedsConfirmation(confirmation);
            }
        }
        RowDispatch::Handled
    }

    /// Answers the pending delete confirmation.
    ///
    /// On a successful handler delete the row leaves the list.
    pub fn resolve_delete(
        &mut self,
        confirmed: bool,
        handler: &mut (impl RowActionHandler + ?Sized),
    ) -> DeleteResolution {
        let Some(pending) = self.pending_delete.take() else {
            return DeleteResolution::NothingPending;
        };
        if !confirmed {
            return DeleteResolution::Kept;
        }
        if !handler.delete(pending.id) {
            return DeleteResolution::Failed;
        }
        self.records.retain(|record| record.id != pending.id);
        info!(
            "event=list_row_delete module=list status=ok record_id={}",
            pending.id
        );
        DeleteResolution::Deleted
    }
}
