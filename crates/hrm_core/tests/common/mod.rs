#![allow(dead_code)]

use hrm_core::model::employee::{Employee, EmployeeId};
use hrm_core::notify::{NoticeKind, Notifier};
use hrm_core::repo::error::{RepoError, RepoResult};
use hrm_core::repo::record_store::{EmployeeListQuery, RecordPatch, RecordStore};
use std::cell::RefCell;

/// Field values for a valid record.
pub fn employee_fields(first: &str, last: &str, number: &str) -> RecordPatch {
    RecordPatch::new()
        .with("first_name", first)
        .with("last_name", last)
        .with("email", format!("{}@example.com", first.to_lowercase()))
        .with("employee_number", number)
        .with("position", "Accountant")
        .with("department", "Finance")
        .with("hire_date", "2021-09-01")
        .with("status", "active")
}

pub fn create_employee(
    store: &dyn RecordStore,
    first: &str,
    last: &str,
    number: &str,
) -> Employee {
    store.create(&employee_fields(first, last, number)).unwrap()
}

/// Store wrapper that records every write call.
pub struct RecordingStore<'a> {
    inner: &'a dyn RecordStore,
    pub updates: RefCell<Vec<(EmployeeId, RecordPatch)>>,
    pub creates: RefCell<Vec<RecordPatch>>,
}

impl<'a> RecordingStore<'a> {
    pub fn new(inner: &'a dyn RecordStore) -> Self {
        Self {
            inner,
            updates: RefCell::new(Vec::new()),
            creates: RefCell::new(Vec::new()),
        }
    }

    pub fn write_count(&self) -> usize {
        self.updates.borrow().len() + self.creates.borrow().len()
    }
}

impl RecordStore for RecordingStore<'_> {
    fn fetch_one(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.inner.fetch_one(id)
    }

    fn fetch_many(&self, query: &EmployeeListQuery) -> RepoResult<Vec<Employee>> {
        self.inner.fetch_many(query)
    }

    fn update(&self, id: EmployeeId, patch: &RecordPatch) -> RepoResult<Employee> {
        self.updates.borrow_mut().push((id, patch.clone()));
        self.inner.update(id, patch)
    }

    fn create(&self, fields: &RecordPatch) -> RepoResult<Employee> {
        self.creates.borrow_mut().push(fields.clone());
        self.inner.create(fields)
    }

    fn remove(&self, id: EmployeeId) -> RepoResult<()> {
        self.inner.remove(id)
    }

    fn soft_delete(&self, id: EmployeeId) -> RepoResult<()> {
        self.inner.soft_delete(id)
    }

    fn restore(&self, id: EmployeeId) -> RepoResult<()> {
        self.inner.restore(id)
    }
}

/// Store whose writes always fail.
#[derive(Default)]
pub struct FailingStore {
    pub attempts: RefCell<usize>,
}

impl FailingStore {
    fn fail<T>(&self) -> RepoResult<T> {
        *self.attempts.borrow_mut() += 1;
        Err(RepoError::Conflict("store unavailable".to_string()))
    }
}

impl RecordStore for FailingStore {
    fn fetch_one(&self, _id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.fail()
    }

    fn fetch_many(&self, _query: &EmployeeListQuery) -> RepoResult<Vec<Employee>> {
        self.fail()
    }

    fn update(&self, _id: EmployeeId, _patch: &RecordPatch) -> RepoResult<Employee> {
        self.fail()
    }

    fn create(&self, _fields: &RecordPatch) -> RepoResult<Employee> {
        self.fail()
    }

    fn remove(&self, _id: EmployeeId) -> RepoResult<()> {
        self.fail()
    }

    fn soft_delete(&self, _id: EmployeeId) -> RepoResult<()> {
        self.fail()
    }

    fn restore(&self, _id: EmployeeId) -> RepoResult<()> {
        self.fail()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: RefCell<Vec<(NoticeKind, String)>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.borrow().iter().map(|(kind, _)| *kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        self.notices.borrow_mut().push((kind, message.to_string()));
    }
}
