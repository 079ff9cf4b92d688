//! Core company business logic.

use std::sync::Arc;

use async_trait::async_trait;

use crate::company::error::{CompanyError, CompanyResult, ValidationError};
use crate::company::model::Company;
use crate::company::repository::{CompanyRecord, CompanyRepository, StoreError};
use crate::company::service_middleware::ServiceMiddleware;
use crate::config::ValidationConfig;

/// The company capability set.
#[async_trait]
pub trait CompanyService: Send + Sync {
    async fn save(&self, company: Company) -> CompanyResult<Company>;

    async fn find(&self, id: i64) -> CompanyResult<Company>;

    async fn delete(&self, id: i64) -> CompanyResult<()>;

    /// Every company in insertion order.
    async fn find_all(&self) -> CompanyResult<Vec<Company>>;
}

/// Build the service and wrap it with `middleware`, first entry innermost.
pub fn new_service(
    repository: Arc<dyn CompanyRepository>,
    validation: ValidationConfig,
    middleware: &[ServiceMiddleware],
) -> Arc<dyn CompanyService> {
    let basic: Arc<dyn CompanyService> = Arc::new(BasicService::new(repository, validation));
    middleware.iter().fold(basic, |svc, mw| mw(svc))
}

/// Service implementation without middleware.
pub struct BasicService {
    repository: Arc<dyn CompanyRepository>,
    validation: ValidationConfig,
}

impl BasicService {
    pub fn new(repository: Arc<dyn CompanyRepository>, validation: ValidationConfig) -> Self {
        Self {
            repository,
            validation,
        }
    }

    fn validate(&self, company: &Company) -> Result<(), ValidationError> {
        let name = company.name.trim();
        if name.is_empty() {
            return Err(ValidationError::RequiredField("name"));
        }
        if self.validation.is_reserved(name) {
            return Err(ValidationError::InvalidValue {
                field: "name",
                reason: format!("'{}' is a reserved name", name),
            });
        }
        if name.chars().count() > self.validation.max_name_len {
            return Err(ValidationError::InvalidValue {
                field: "name",
                reason: format!("longer than {} characters", self.validation.max_name_len),
            });
        }
        if company.id < 0 {
            return Err(ValidationError::InvalidValue {
                field: "id",
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CompanyService for BasicService {
    async fn save(&self, company: Company) -> CompanyResult<Company> {
        self.validate(&company)?;

        let mut record = CompanyRecord::from_company(&company);
        record.name = record.name.trim().to_string();

        let saved = self.repository.save(record).await.map_err(store_error)?;
        Ok(saved.into_company())
    }

    async fn find(&self, id: i64) -> CompanyResult<Company> {
        let record = self.repository.find(id).await.map_err(store_error)?;
        Ok(record.into_company())
    }

    async fn delete(&self, id: i64) -> CompanyResult<()> {
        self.repository.delete(id).await.map_err(store_error)
    }

    async fn find_all(&self) -> CompanyResult<Vec<Company>> {
        let records = self.repository.find_all().await.map_err(store_error)?;
        Ok(records.into_iter().map(CompanyRecord::into_company).collect())
    }
}

/// Translate a repository failure into the service vocabulary.
fn store_error(err: StoreError) -> CompanyError {
    match err {
        StoreError::NotFound(id) => CompanyError::NotFound(id),
        StoreError::UniqueViolation { field, value } => {
            ValidationError::Duplicate { field, value }.into()
        }
        StoreError::Unavailable(reason) => {
            tracing::error!(error = %reason, "company repository failure");
            CompanyError::Repository(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::company::memory::MemoryRepository;

    /// Counts writes so tests can assert the repository was never reached.
    #[derive(Default)]
    struct CountingRepository {
        inner: MemoryRepository,
        saves: AtomicUsize,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl CompanyRepository for CountingRepository {
        async fn save(&self, record: CompanyRecord) -> Result<CompanyRecord, StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(record).await
        }

        async fn find(&self, id: i64) -> Result<CompanyRecord, StoreError> {
            self.inner.find(id).await
        }

        async fn delete(&self, id: i64) -> Result<(), StoreError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(id).await
        }

        async fn find_all(&self) -> Result<Vec<CompanyRecord>, StoreError> {
            self.inner.find_all().await
        }
    }

    fn service() -> (Arc<CountingRepository>, BasicService) {
        let repo = Arc::new(CountingRepository::default());
        let svc = BasicService::new(repo.clone(), ValidationConfig::default());
        (repo, svc)
    }

    #[tokio::test]
    async fn empty_name_is_required_field_and_skips_repository() {
        let (repo, svc) = service();

        for name in ["", "   "] {
            let err = svc.save(Company::named(name)).await.unwrap_err();
            assert_eq!(err, ValidationError::RequiredField("name").into());
        }
        assert_eq!(repo.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reserved_name_is_invalid_value_in_any_case() {
        let (repo, svc) = service();

        for name in ["duck", "Duck", "DUCK"] {
            let err = svc.save(Company::named(name)).await.unwrap_err();
            assert!(
                matches!(
                    err,
                    CompanyError::Validation(ValidationError::InvalidValue { field: "name", .. })
                ),
                "{name}: {err:?}"
            );
        }
        assert_eq!(repo.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn overlong_name_is_rejected() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = BasicService::new(
            repo,
            ValidationConfig {
                reserved_names: vec![],
                max_name_len: 3,
            },
        );
        assert!(svc.save(Company::named("abcd")).await.is_err());
        assert!(svc.save(Company::named("abc")).await.is_ok());
    }

    #[tokio::test]
    async fn insert_returns_identity_and_timestamps() {
        let (repo, svc) = service();

        let saved = svc.save(Company::named("  Acme ")).await.unwrap();
        assert_ne!(saved.id, 0);
        assert_eq!(saved.name, "Acme");
        assert!(saved.created_at.is_some());
        assert!(saved.updated_at.is_some());
        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_of_missing_company_is_not_found() {
        let (_, svc) = service();
        let company = Company {
            id: 99,
            ..Company::named("Acme")
        };
        assert_eq!(svc.save(company).await, Err(CompanyError::NotFound(99)));
    }

    #[tokio::test]
    async fn duplicate_name_is_validation_error() {
        let (_, svc) = service();
        svc.save(Company::named("Acme")).await.unwrap();

        let err = svc.save(Company::named("acme")).await.unwrap_err();
        assert!(matches!(
            err,
            CompanyError::Validation(ValidationError::Duplicate { field: "name", .. })
        ));
    }

    #[tokio::test]
    async fn find_missing_is_not_found() {
        let (_, svc) = service();
        assert_eq!(svc.find(5).await, Err(CompanyError::NotFound(5)));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found_without_side_effect() {
        let (_, svc) = service();
        let kept = svc.save(Company::named("Acme")).await.unwrap();

        assert_eq!(svc.delete(kept.id + 1).await, Err(CompanyError::NotFound(kept.id + 1)));
        assert_eq!(svc.find_all().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn delete_then_find_is_not_found() {
        let (_, svc) = service();
        let saved = svc.save(Company::named("Acme")).await.unwrap();

        svc.delete(saved.id).await.unwrap();
        assert_eq!(svc.find(saved.id).await, Err(CompanyError::NotFound(saved.id)));
    }

    #[tokio::test]
    async fn find_all_is_empty_then_insertion_ordered() {
        let (_, svc) = service();
        assert!(svc.find_all().await.unwrap().is_empty());

        for name in ["Zeta", "Alpha", "Mu"] {
            svc.save(Company::named(name)).await.unwrap();
        }
        let names: Vec<_> = svc
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mu"]);
    }

    #[tokio::test]
    async fn storage_failure_is_repository_error() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = BasicService::new(repo.clone(), ValidationConfig::default());
        repo.set_offline(true);

        assert!(matches!(
            svc.find_all().await,
            Err(CompanyError::Repository(_))
        ));
    }

    #[tokio::test]
    async fn middleware_list_is_applied_in_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let tag = |label: &'static str| -> ServiceMiddleware {
            let order = order.clone();
            Arc::new(move |next: Arc<dyn CompanyService>| {
                order.lock().unwrap().push(label);
                next
            })
        };

        let svc = new_service(
            Arc::new(MemoryRepository::new()),
            ValidationConfig::default(),
            &[tag("inner"), tag("outer")],
        );
        assert!(svc.find_all().await.unwrap().is_empty());
        assert_eq!(*order.lock().unwrap(), vec!["inner", "outer"]);
    }
}
