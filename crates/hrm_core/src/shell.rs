//! Record detail shell: tab strip plus single-slice edit state machine.
//!
//! # Responsibility
//! - Track the displayed tab and which slice (if any) is in edit mode.
//! - Guard tab changes and edit entry against losing unsaved changes.
//! - Send only changed fields on save and merge the result into the record.
//! - Convert persistence failures into notifications at this boundary.
//!
//! # Invariants
//! - At most one slice is in edit mode at a time.
//! - Save is two-phase (`begin_save` / `finish_save`); while a save is
//!   pending, a second save, `cancel`, edit entry and tab changes are refused.
//! - A failed save keeps the draft and the dirty flag.
//! - `cancel` never writes and leaves the record untouched.
//! - `refresh` replaces the record snapshot but never re-seeds a draft.

use crate::draft::{Draft, DraftError};
use crate::model::employee::{Employee, EmployeeId, ItemId};
use crate::model::status::Badge;
use crate::model::validation::{ValidationIssue, ValidationReport};
use crate::notify::{NoticeKind, Notifier};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::record_store::{RecordPatch, RecordStore};
use crate::slice::{project, record_document, SliceId};
use log::{error, info, warn};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which slice is editable and whether it has unsaved changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditState {
    pub active_slice: Option<SliceId>,
    pub dirty: bool,
}

#[derive(Debug)]
pub enum ShellError {
    /// Operation needs an active edit slice.
    NotEditing,
    /// A save is outstanding for this shell.
    SaveInFlight,
    /// `finish_save` without a matching `begin_save`.
    NotSaving,
    /// Draft failed validation; nothing was sent.
    Invalid(ValidationReport),
    Draft(DraftError),
    /// Record passed in belongs to another id.
    RecordMismatch {
        expected: EmployeeId,
        actual: EmployeeId,
    },
    Persistence(RepoError),
}

impl Display for ShellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEditing => write!(f, "no slice is in edit mode"),
            Self::SaveInFlight => write!(f, "a save is already in progress"),
            Self::NotSaving => write!(f, "no save is in progress"),
            Self::Invalid(report) => write!(f, "{report}"),
            Self::Draft(err) => write!(f, "{err}"),
            Self::RecordMismatch { expected, actual } => {
                write!(f, "record {actual} does not belong to shell for {expected}")
            }
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ShellError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(report) => Some(report),
            Self::Draft(err) => Some(err),
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DraftError> for ShellError {
    fn from(value: DraftError) -> Self {
        Self::Draft(value)
    }
}

/// Asks the user whether unsaved changes on `slice` may be discarded.
pub trait ConfirmDiscard {
    fn confirm_discard(&self, slice: SliceId) -> bool;
}

impl<F: Fn(SliceId) -> bool> ConfirmDiscard for F {
    fn confirm_discard(&self, slice: SliceId) -> bool {
        self(slice)
    }
}

/// Result of [`DetailShell::enter_edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterEdit {
    Entered,
    AlreadyEditing,
    /// Another slice has unsaved changes or a save in flight; nothing changed.
    Blocked { active: SliceId },
}

/// Result of [`DetailShell::request_tab_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabChange {
    Switched,
    /// Target is already the displayed tab.
    Unchanged,
    /// User refused to discard changes, or a save is pending.
    Stayed,
}

/// Write request produced by [`DetailShell::begin_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub record_id: EmployeeId,
    pub slice: SliceId,
    pub patch: RecordPatch,
}

/// Result of the one-shot [`DetailShell::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// One write was sent and merged; lists the fields written.
    Saved { fields: Vec<String> },
    /// Draft matched the record; edit mode closed without a write.
    Unchanged,
    Invalid(ValidationReport),
    /// Write failed; the draft is still in edit mode.
    Failed(String),
    InFlight,
    NotEditing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Display,
    Editing { dirty: bool, saving: bool },
}

/// View model of one tab: the record projection, or the draft while that
/// tab is in edit mode.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceView {
    pub slice: SliceId,
    pub mode: ViewMode,
    pub fields: Map<String, Value>,
}

/// Identity line shown above the tab strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub id: EmployeeId,
    pub full_name: String,
    pub employee_number: String,
    pub position: String,
    pub department: String,
    pub status: Badge,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabInfo {
    pub slice: SliceId,
    pub label: &'static str,
    pub selected: bool,
    pub editing: bool,
}

/// Detail screen state for one open record.
#[derive(Debug, Clone)]
pub struct DetailShell {
    record: Employee,
    active_tab: SliceId,
    edit: EditState,
    draft: Option<Draft>,
    pending: Option<RecordPatch>,
    last_report: Option<ValidationReport>,
}

impl DetailShell {
    pub fn new(record: Employee) -> Self {
        Self::with_tab(record, SliceId::Identity)
    }

    pub fn with_tab(record: Employee, tab: SliceId) -> Self {
        Self {
            record,
            active_tab: tab,
            edit: EditState::default(),
            draft: None,
            pending: None,
            last_report: None,
        }
    }

    pub fn record(&self) -> &Employee {
        &self.record
    }

    pub fn active_tab(&self) -> SliceId {
        self.active_tab
    }

    pub fn edit_state(&self) -> EditState {
        self.edit
    }

    pub fn is_saving(&self) -> bool {
        self.pending.is_some()
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Issues from the last rejected save or live re-validation.
    pub fn validation(&self) -> Option<&ValidationReport> {
        self.last_report.as_ref()
    }

    /// Inline issues for one field of the edited slice.
    pub fn field_issues<'a>(&'a self, field: &'a str) -> Vec<&'a ValidationIssue> {
        self.last_report
            .as_ref()
            .map(|report| report.for_field(field).collect())
            .unwrap_or_default()
    }

    /// Puts `slice` into edit mode and seeds its draft.
    ///
    /// A clean draft on another slice is closed silently. A dirty one (or a
    /// pending save) blocks the request without changing anything.
    pub fn enter_edit(&mut self, slice: SliceId) -> Result<EnterEdit, ShellError> {
        if let Some(active) = self.edit.active_slice {
            if self.is_saving() || (active != slice && self.edit.dirty) {
                info!(
                    "event=shell_enter_edit module=shell status=blocked record_id={} slice={slice} active={active}",
                    self.record.id
                );
                return Ok(EnterEdit::Blocked { active });
            }
            if active == slice {
                return Ok(EnterEdit::AlreadyEditing);
            }
        }

        let draft = Draft::seed(&self.record, slice)?;
        self.draft = Some(draft);
        self.edit = EditState {
            active_slice: Some(slice),
            dirty: false,
        };
        self.last_report = None;
        self.active_tab = slice;
        info!(
            "event=shell_enter_edit module=shell status=ok record_id={} slice={slice}",
            self.record.id
        );
        Ok(EnterEdit::Entered)
    }

    /// Switches the displayed tab, asking before discarding unsaved changes.
    pub fn request_tab_change(
        &mut self,
        target: SliceId,
        confirm: &(impl ConfirmDiscard + ?Sized),
    ) -> TabChange {
        if target == self.active_tab {
            return TabChange::Unchanged;
        }
        if self.is_saving() {
            return TabChange::Stayed;
        }
        if let Some(active) = self.edit.active_slice {
            if self.edit.dirty && !confirm.confirm_discard(active) {
                info!(
                    "event=shell_tab_change module=shell status=refused record_id={} from={} to={target}",
                    self.record.id, self.active_tab
                );
                return TabChange::Stayed;
            }
            self.close_edit();
        }
        self.active_tab = target;
        TabChange::Switched
    }

    /// Applies a mutation to the active draft.
    pub fn edit<R>(
        &mut self,
        mutate: impl FnOnce(&mut Draft) -> Result<R, DraftError>,
    ) -> Result<R, ShellError> {
        if self.is_saving() {
            return Err(ShellError::SaveInFlight);
        }
        let draft = self.draft.as_mut().ok_or(ShellError::NotEditing)?;
        let result = mutate(draft)?;
        if draft.is_touched() {
            self.edit.dirty = true;
        }
        if self.last_report.is_some() {
            self.last_report = draft.validate().err();
        }
        Ok(result)
    }

    pub fn set_field(&mut self, field: &str, value: impl Into<Value>) -> Result<(), ShellError> {
        self.edit(|draft| draft.set_field(field, value))
    }

    pub fn push_item(&mut self, field: &str, item: Value) -> Result<ItemId, ShellError> {
        self.edit(|draft| draft.push_item(field, item))
    }

    pub fn remove_item(&mut self, field: &str, item_id: &str) -> Result<bool, ShellError> {
        self.edit(|draft| draft.remove_item(field, item_id))
    }

    pub fn update_item(
        &mut self,
        field: &str,
        item_id: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), ShellError> {
        self.edit(|draft| draft.update_item(field, item_id, key, value))
    }

    /// Whether the save control should be enabled.
    pub fn can_save(&self) -> bool {
        !self.is_saving()
            && self
                .draft
                .as_ref()
                .is_some_and(|draft| draft.validate().is_ok())
    }

    /// Validates the draft and reserves the single outstanding write.
    ///
    /// Returns `Ok(None)` when nothing changed; edit mode is then closed
    /// without a write.
    ///
    /// # Errors
    /// - [`ShellError::SaveInFlight`] while another save is pending.
    /// - [`ShellError::NotEditing`] without an active slice.
    /// - [`ShellError::Invalid`] when validation fails; the report is kept
    ///   for inline display.
    pub fn begin_save(&mut self) -> Result<Option<PendingSave>, ShellError> {
        if self.is_saving() {
            return Err(ShellError::SaveInFlight);
        }
        let (Some(draft), Some(slice)) = (self.draft.as_ref(), self.edit.active_slice) else {
            return Err(ShellError::NotEditing);
        };

        if let Err(report) = draft.validate() {
            warn!(
                "event=shell_save module=shell status=invalid record_id={} slice={slice} issue_count={}",
                self.record.id,
                report.len()
            );
            self.last_report = Some(report.clone());
            return Err(ShellError::Invalid(report));
        }
        self.last_report = None;

        let patch = draft.changed_fields();
        if patch.is_empty() {
            info!(
                "event=shell_save module=shell status=unchanged record_id={} slice={slice}",
                self.record.id
            );
            self.close_edit();
            return Ok(None);
        }

        info!(
            "event=shell_save module=shell status=start record_id={} slice={slice} field_count={}",
            self.record.id,
            patch.len()
        );
        self.pending = Some(patch.clone());
        Ok(Some(PendingSave {
            record_id: self.record.id,
            slice,
            patch,
        }))
    }

    /// Completes a save started by [`DetailShell::begin_save`].
    ///
    /// On success the written fields of `result` are merged into the
    /// record and edit mode closes. On failure the draft stays as it was.
    pub fn finish_save(&mut self, result: RepoResult<Employee>) -> Result<&Employee, ShellError> {
        let patch = self.pending.take().ok_or(ShellError::NotSaving)?;
        let saved = match result {
            Ok(saved) => saved,
            Err(err) => {
                error!(
                    "event=shell_save module=shell status=error record_id={} error={err}",
                    self.record.id
                );
                return Err(ShellError::Persistence(err));
            }
        };
        if saved.id != self.record.id {
            return Err(ShellError::RecordMismatch {
                expected: self.record.id,
                actual: saved.id,
            });
        }

        self.record = merge_saved_fields(&self.record, &saved, &patch);
        info!(
            "event=shell_save module=shell status=ok record_id={} field_count={}",
            self.record.id,
            patch.len()
        );
        self.close_edit();
        Ok(&self.record)
    }

    /// Validates, writes through `store` once, merges, and notifies.
    ///
    /// Persistence errors never escape: they become an error notification
    /// and [`SaveOutcome::Failed`].
    pub fn save<S, N>(&mut self, store: &S, notifier: &N) -> SaveOutcome
    where
        S: RecordStore + ?Sized,
        N: Notifier + ?Sized,
    {
        let pending = match self.begin_save() {
            Ok(Some(pending)) => pending,
            Ok(None) => return SaveOutcome::Unchanged,
            Err(ShellError::SaveInFlight) => return SaveOutcome::InFlight,
            Err(ShellError::NotEditing) => return SaveOutcome::NotEditing,
            Err(ShellError::Invalid(report)) => {
                notifier.notify(
                    &format!("{} field(s) need attention before saving.", report.len()),
                    NoticeKind::Warning,
                );
                return SaveOutcome::Invalid(report);
            }
            Err(other) => {
                notifier.notify(&format!("Save failed: {other}"), NoticeKind::Error);
                return SaveOutcome::Failed(other.to_string());
            }
        };

        let result = store.update(pending.record_id, &pending.patch);
        match self.finish_save(result) {
            Ok(_) => {
                notifier.notify("Changes saved.", NoticeKind::Success);
                SaveOutcome::Saved {
                    fields: pending.patch.fields().map(str::to_string).collect(),
                }
            }
            Err(err) => {
                notifier.notify(&format!("Save failed: {err}"), NoticeKind::Error);
                SaveOutcome::Failed(err.to_string())
            }
        }
    }

    /// Discards the draft and leaves edit mode.
    ///
    /// # Errors
    /// - [`ShellError::SaveInFlight`] while a save is pending.
    pub fn cancel(&mut self) -> Result<(), ShellError> {
        if self.is_saving() {
            return Err(ShellError::SaveInFlight);
        }
        if let Some(slice) = self.edit.active_slice {
            info!(
                "event=shell_cancel module=shell status=ok record_id={} slice={slice} dirty={}",
                self.record.id, self.edit.dirty
            );
        }
        self.close_edit();
        Ok(())
    }

    /// Replaces the record snapshot after an explicit reload.
    ///
    /// An active draft keeps its values.
    pub fn refresh(&mut self, record: Employee) -> Result<(), ShellError> {
        if record.id != self.record.id {
            return Err(ShellError::RecordMismatch {
                expected: self.record.id,
                actual: record.id,
            });
        }
        self.record = record;
        Ok(())
    }

    /// View model for the displayed tab.
    pub fn view(&self) -> Result<SliceView, ShellError> {
        self.view_of(self.active_tab)
    }

    pub fn view_of(&self, slice: SliceId) -> Result<SliceView, ShellError> {
        match (&self.draft, self.edit.active_slice) {
            (Some(draft), Some(active)) if active == slice => Ok(SliceView {
                slice,
                mode: ViewMode::Editing {
                    dirty: self.edit.dirty,
                    saving: self.is_saving(),
                },
                fields: draft.fields().clone(),
            }),
            _ => Ok(SliceView {
                slice,
                mode: ViewMode::Display,
                fields: project(&self.record, slice).map_err(DraftError::from)?,
            }),
        }
    }

    pub fn header(&self) -> RecordHeader {
        RecordHeader {
            id: self.record.id,
            full_name: self.record.full_name(),
            employee_number: self.record.employee_number.clone(),
            position: self.record.position.clone(),
            department: self.record.department.clone(),
            status: self.record.status.badge(),
            is_deleted: self.record.is_deleted,
        }
    }

    pub fn tabs(&self) -> Vec<TabInfo> {
        SliceId::ALL
            .into_iter()
            .map(|slice| TabInfo {
                slice,
                label: slice.label(),
                selected: slice == self.active_tab,
                editing: self.edit.active_slice == Some(slice),
            })
            .collect()
    }

    fn close_edit(&mut self) {
        self.draft = None;
        self.edit = EditState::default();
        self.last_report = None;
    }
}

// Shallow merge: copy the written top-level fields (and the new
// `updated_at`) from the stored record into the local snapshot.
fn merge_saved_fields(current: &Employee, saved: &Employee, patch: &RecordPatch) -> Employee {
    merge_documents(current, saved, patch).unwrap_or_else(|err| {
        warn!(
            "event=shell_merge module=shell status=fallback record_id={} error={err}",
            current.id
        );
        saved.clone()
    })
}

fn merge_documents(
    current: &Employee,
    saved: &Employee,
    patch: &RecordPatch,
) -> Result<Employee, serde_json::Error> {
    let mut target = record_document(current)?;
    let source = record_document(saved)?;
    for field in patch.fields().chain(["updated_at"]) {
        if let Some(value) = source.get(field) {
            target.insert(field.to_string(), value.clone());
        }
    }
    serde_json::from_value(Value::Object(target))
}

/// Create form: a draft over identity and employment with no backing id.
#[derive(Debug, Clone)]
pub struct NewRecordForm {
    draft: Draft,
    created: Option<EmployeeId>,
    last_report: Option<ValidationReport>,
}

/// Result of [`NewRecordForm::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Employee),
    Invalid(ValidationReport),
    Failed(String),
    /// The form already produced this record.
    AlreadySubmitted(EmployeeId),
}

impl NewRecordForm {
    pub const SLICES: [SliceId; 2] = [SliceId::Identity, SliceId::Employment];

    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            draft: Draft::blank(&Self::SLICES)?,
            created: None,
            last_report: None,
        })
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn validation(&self) -> Option<&ValidationReport> {
        self.last_report.as_ref()
    }

    pub fn set_field(&mut self, field: &str, value: impl Into<Value>) -> Result<(), ShellError> {
        self.draft.set_field(field, value)?;
        Ok(())
    }

    /// Validates and creates the record with exactly one store call.
    pub fn submit<S, N>(&mut self, store: &S, notifier: &N) -> SubmitOutcome
    where
        S: RecordStore + ?Sized,
        N: Notifier + ?Sized,
    {
        if let Some(id) = self.created {
            return SubmitOutcome::AlreadySubmitted(id);
        }
        if let Err(report) = self.draft.validate() {
            notifier.notify(
                &format!("{} field(s) need attention before saving.", report.len()),
                NoticeKind::Warning,
            );
            self.last_report = Some(report.clone());
            return SubmitOutcome::Invalid(report);
        }
        self.last_report = None;

        match store.create(&self.draft.to_patch()) {
            Ok(created) => {
                info!(
                    "event=record_form_submit module=shell status=ok record_id={}",
                    created.id
                );
                self.created = Some(created.id);
                notifier.notify("Employee created.", NoticeKind::Success);
                SubmitOutcome::Created(created)
            }
            Err(err) => {
                error!("event=record_form_submit module=shell status=error error={err}");
                notifier.notify(&format!("Create failed: {err}"), NoticeKind::Error);
                SubmitOutcome::Failed(err.to_string())
            }
        }
    }
}
