use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::domain::{Application, ApplicationId, ApplicationStatus};
use crate::error::FailureKind;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn next_id(&self) -> Result<ApplicationId, RepositoryError>;
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    /// Pending applications in submission order.
    fn pending(&self, limit: usize) -> Result<Vec<Application>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RepositoryError::Conflict => FailureKind::ConflictError,
            RepositoryError::NotFound => FailureKind::NotFound,
            RepositoryError::Unavailable(_) => FailureKind::Unavailable,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryApplicationRepository {
    sequence: AtomicU64,
    records: Mutex<BTreeMap<ApplicationId, Application>>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<ApplicationId, Application>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn next_id(&self) -> Result<ApplicationId, RepositoryError> {
        Ok(ApplicationId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id, application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.records()?;
        match guard.get_mut(&application.id) {
            Some(slot) => {
                *slot = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.records()?.get(&id).cloned())
    }

    fn pending(&self, limit: usize) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .records()?
            .values()
            .filter(|application| application.status == ApplicationStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }
}
