//! Storage seams for child accounts and compliance evidence.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::error::ServiceError;
use super::security_audit::SecurityAuditLog;
use crate::models::{ChildAccount, DeletionLog, DeletionStatus};

/// One document per child, keyed by id and unique by email.
#[async_trait]
pub trait ChildStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<ChildAccount>, ServiceError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ChildAccount>, ServiceError>;

    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn insert(&self, account: &ChildAccount) -> Result<(), ServiceError>;

    /// Replace the stored document only if its version is still
    /// `expected_version`; otherwise `VersionConflict`.
    async fn replace_if_version(
        &self,
        account: &ChildAccount,
        expected_version: i64,
    ) -> Result<(), ServiceError>;

    /// Remove the document only if its version is still `expected_version`.
    async fn delete_if_version(&self, id: &str, expected_version: i64) -> Result<(), ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

/// Append-only compliance records.
#[async_trait]
pub trait ComplianceLog: Send + Sync {
    async fn record_deletion(&self, log: &DeletionLog) -> Result<(), ServiceError>;

    /// Move a recorded deletion out of `pending`.
    async fn settle_deletion(&self, id: &str, status: DeletionStatus) -> Result<(), ServiceError>;

    async fn record_security_event(&self, log: &SecurityAuditLog) -> Result<(), ServiceError>;
}

/// Process-local store for tests and local runs without MongoDB.
#[derive(Default)]
pub struct InMemoryStore {
    accounts: Mutex<HashMap<String, ChildAccount>>,
    deletion_logs: Mutex<Vec<DeletionLog>>,
    security_events: Mutex<Vec<SecurityAuditLog>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deletion_logs(&self) -> Vec<DeletionLog> {
        lock(&self.deletion_logs).clone()
    }

    pub fn security_events(&self) -> Vec<SecurityAuditLog> {
        lock(&self.security_events).clone()
    }

    pub fn account_count(&self) -> usize {
        lock(&self.accounts).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // A poisoned lock only means another test thread panicked mid-write.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ChildStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<ChildAccount>, ServiceError> {
        Ok(lock(&self.accounts)
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ChildAccount>, ServiceError> {
        Ok(lock(&self.accounts).get(id).cloned())
    }

    async fn insert(&self, account: &ChildAccount) -> Result<(), ServiceError> {
        let mut accounts = lock(&self.accounts);
        if accounts.values().any(|a| a.email == account.email) {
            return Err(ServiceError::EmailAlreadyRegistered);
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn replace_if_version(
        &self,
        account: &ChildAccount,
        expected_version: i64,
    ) -> Result<(), ServiceError> {
        let mut accounts = lock(&self.accounts);
        match accounts.get_mut(&account.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = account.clone();
                Ok(())
            }
            _ => Err(ServiceError::VersionConflict),
        }
    }

    async fn delete_if_version(&self, id: &str, expected_version: i64) -> Result<(), ServiceError> {
        let mut accounts = lock(&self.accounts);
        match accounts.get(id) {
            Some(stored) if stored.version == expected_version => {
                accounts.remove(id);
                Ok(())
            }
            _ => Err(ServiceError::VersionConflict),
        }
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[async_trait]
impl ComplianceLog for InMemoryStore {
    async fn record_deletion(&self, log: &DeletionLog) -> Result<(), ServiceError> {
        lock(&self.deletion_logs).push(log.clone());
        Ok(())
    }

    async fn settle_deletion(&self, id: &str, status: DeletionStatus) -> Result<(), ServiceError> {
        match lock(&self.deletion_logs).iter_mut().find(|log| log.id == id) {
            Some(log) => {
                log.status = status;
                Ok(())
            }
            None => Err(ServiceError::Internal(anyhow::anyhow!(
                "deletion log {} not found",
                id
            ))),
        }
    }

    async fn record_security_event(&self, log: &SecurityAuditLog) -> Result<(), ServiceError> {
        lock(&self.security_events).push(log.clone());
        Ok(())
    }
}
