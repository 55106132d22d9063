//! In-memory storage for business records.

use std::collections::HashMap;
use std::sync::RwLock;

use workdesk_core::{DomainError, Page, PageRequest, RecordId};
use workdesk_records::{Customer, Expense, Project, Record, RecordKind};

use crate::error::{InfraResult, poisoned};

/// Soft-delete aware store for one record type.
#[derive(Debug)]
pub struct InMemoryRecordStore<R> {
    records: RwLock<HashMap<RecordId, R>>,
}

impl<R> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<R: Record> InMemoryRecordStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active record by id.
    pub fn get(&self, id: RecordId) -> InfraResult<R> {
        let records = self.records.read().map_err(|_| poisoned())?;
        records
            .get(&id)
            .filter(|r| r.is_active())
            .cloned()
            .ok_or_else(|| DomainError::NotFound.into())
    }

    pub fn exists(&self, id: RecordId) -> InfraResult<bool> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(&id).is_some_and(|r| r.is_active()))
    }

    /// Active records, newest first.
    pub fn list(&self, request: PageRequest) -> InfraResult<Page<R>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut active: Vec<R> = records.values().filter(|r| r.is_active()).cloned().collect();
        active.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()).then_with(|| b.id().cmp(a.id())));
        Ok(Page::from_items(active, request))
    }

    /// Insert a new record once `check` accepts it, under one write guard.
    fn insert_checked(&self, record: R, check: impl FnOnce(&R) -> InfraResult<()>) -> InfraResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        check(&record)?;
        records.insert(*record.id(), record);
        Ok(())
    }

    /// Edit the active record `id` in place. Read, `change` and write share
    /// one write guard; a failed `change` leaves the stored record untouched.
    fn modify(&self, id: RecordId, change: impl FnOnce(&mut R) -> InfraResult<()>) -> InfraResult<R> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let current = records
            .get(&id)
            .filter(|r| r.is_active())
            .ok_or(DomainError::NotFound)?;

        let mut next = current.clone();
        change(&mut next)?;
        records.insert(id, next.clone());
        Ok(next)
    }

    fn deactivate(&self, id: RecordId) -> InfraResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        match records.get_mut(&id) {
            Some(record) if record.is_active() => {
                record.deactivate();
                Ok(())
            }
            _ => Err(DomainError::NotFound.into()),
        }
    }
}

/// Record types kept in the [`RecordBook`].
pub trait Shelved: Record {
    fn shelf(book: &RecordBook) -> &InMemoryRecordStore<Self>;
}

impl Shelved for Customer {
    fn shelf(book: &RecordBook) -> &InMemoryRecordStore<Self> {
        &book.customers
    }
}

impl Shelved for Project {
    fn shelf(book: &RecordBook) -> &InMemoryRecordStore<Self> {
        &book.projects
    }
}

impl Shelved for Expense {
    fn shelf(book: &RecordBook) -> &InMemoryRecordStore<Self> {
        &book.expenses
    }
}

/// All record stores, with cross-record reference checks.
#[derive(Debug, Default)]
pub struct RecordBook {
    customers: InMemoryRecordStore<Customer>,
    projects: InMemoryRecordStore<Project>,
    expenses: InMemoryRecordStore<Expense>,
}

impl RecordBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<R: Shelved>(&self, id: RecordId) -> InfraResult<R> {
        R::shelf(self).get(id)
    }

    pub fn list<R: Shelved>(&self, request: PageRequest) -> InfraResult<Page<R>> {
        R::shelf(self).list(request)
    }

    pub fn create<R: Shelved>(&self, draft: R::Draft) -> InfraResult<R> {
        let record = R::create(draft)?;
        R::shelf(self).insert_checked(record.clone(), |r| self.check_links(r))?;
        tracing::info!(kind = %R::KIND, id = %record.id(), "record created");
        Ok(record)
    }

    pub fn update<R: Shelved>(&self, id: RecordId, patch: R::Patch) -> InfraResult<R> {
        let record = R::shelf(self).modify(id, |record| {
            record.apply(patch)?;
            self.check_links(record)
        })?;
        tracing::info!(kind = %R::KIND, %id, "record updated");
        Ok(record)
    }

    pub fn delete<R: Shelved>(&self, id: RecordId) -> InfraResult<()> {
        R::shelf(self).deactivate(id)?;
        tracing::info!(kind = %R::KIND, %id, "record deleted");
        Ok(())
    }

    fn exists(&self, kind: RecordKind, id: RecordId) -> InfraResult<bool> {
        match kind {
            RecordKind::Customer => self.customers.exists(id),
            RecordKind::Project => self.projects.exists(id),
            RecordKind::Expense => self.expenses.exists(id),
        }
    }

    /// Runs while the caller holds its own shelf's write guard. Links always
    /// point at another record kind, so only other shelves are read here.
    fn check_links<R: Record>(&self, record: &R) -> InfraResult<()> {
        for (kind, id) in record.links() {
            if !self.exists(kind, id)? {
                return Err(DomainError::validation(format!("referenced {kind} record {id} does not exist")).into());
            }
        }
        Ok(())
    }
}
