//! In-memory company repository.
//!
//! Rows live in a `DashMap` keyed by id; a second map indexes lowercased
//! names so uniqueness is claimed atomically through the entry API. Ids come
//! from a monotonically increasing counter, so ascending id order is
//! insertion order.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::company::repository::{CompanyRecord, CompanyRepository, StoreError};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    rows: DashMap<i64, CompanyRecord>,
    names: DashMap<String, i64>,
    next_id: AtomicI64,
    offline: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backing store going away. Every call fails with
    /// `StoreError::Unavailable` while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("repository is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn claim_name(&self, name: &str, id: i64) -> Result<(), StoreError> {
        match self.names.entry(name_key(name)) {
            Entry::Occupied(owner) if *owner.get() != id => Err(StoreError::UniqueViolation {
                field: "name",
                value: name.to_string(),
            }),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    fn release_name(&self, name: &str, id: i64) {
        self.names.remove_if(&name_key(name), |_, owner| *owner == id);
    }

    fn insert(&self, mut record: CompanyRecord) -> Result<CompanyRecord, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.claim_name(&record.name, id)?;

        let now = Utc::now();
        record.id = id;
        record.created_at = now;
        record.updated_at = now;
        self.rows.insert(id, record.clone());

        tracing::debug!(id, "company inserted");
        Ok(record)
    }

    fn update(&self, record: CompanyRecord) -> Result<CompanyRecord, StoreError> {
        let id = record.id;
        if !self.rows.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        self.claim_name(&record.name, id)?;

        let (previous_name, updated) = match self.rows.get_mut(&id) {
            Some(mut row) => {
                let previous = std::mem::replace(&mut row.name, record.name.clone());
                row.updated_at = Utc::now();
                (previous, row.clone())
            }
            None => {
                // Deleted between the existence check and the write.
                self.release_name(&record.name, id);
                return Err(StoreError::NotFound(id));
            }
        };

        if name_key(&previous_name) != name_key(&updated.name) {
            self.release_name(&previous_name, id);
        }

        tracing::debug!(id, "company updated");
        Ok(updated)
    }
}

#[async_trait]
impl CompanyRepository for MemoryRepository {
    async fn save(&self, record: CompanyRecord) -> Result<CompanyRecord, StoreError> {
        self.check_online()?;
        if record.id == 0 {
            self.insert(record)
        } else {
            self.update(record)
        }
    }

    async fn find(&self, id: i64) -> Result<CompanyRecord, StoreError> {
        self.check_online()?;
        self.rows
            .get(&id)
            .map(|row| row.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.check_online()?;
        let (_, removed) = self.rows.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.release_name(&removed.name, id);
        tracing::debug!(id, "company deleted");
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<CompanyRecord>, StoreError> {
        self.check_online()?;
        let mut all: Vec<CompanyRecord> = self.rows.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.id);
        Ok(all)
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
