//! Datastore interface for the company service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::company::model::Company;

/// Repository-facing representation of a company.
///
/// Timestamps are always present once a record has been written; the
/// repository assigns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyRecord {
    /// Build a record to write from a wire company. Timestamps on input are
    /// ignored by the repository.
    pub fn from_company(company: &Company) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id: company.id,
            name: company.name.clone(),
            created_at: company.created_at.unwrap_or(epoch),
            updated_at: company.updated_at.unwrap_or(epoch),
        }
    }

    pub fn into_company(self) -> Company {
        Company {
            id: self.id,
            name: self.name,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }
}

/// Errors reported by a repository implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record {0} does not exist")]
    NotFound(i64),

    #[error("unique constraint on {field} violated by '{value}'")]
    UniqueViolation { field: &'static str, value: String },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence collaborator for companies.
///
/// `save` inserts when `id == 0`; otherwise it confirms the id exists and
/// updates it. Both paths return the stored record with server-assigned
/// timestamps.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn save(&self, record: CompanyRecord) -> Result<CompanyRecord, StoreError>;

    async fn find(&self, id: i64) -> Result<CompanyRecord, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// All records in insertion order.
    async fn find_all(&self) -> Result<Vec<CompanyRecord>, StoreError>;
}
