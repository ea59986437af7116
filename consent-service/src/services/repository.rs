use std::sync::Arc;

use super::error::ServiceError;
use super::restrictions::RestrictionPolicy;
use super::store::ChildStore;
use crate::models::ChildAccount;

/// Write path for child accounts.
///
/// Every insert and replace re-derives minor status and access restrictions
/// first, so a persisted account never carries drifted entitlements.
#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn ChildStore>,
    policy: RestrictionPolicy,
}

impl AccountRepository {
    pub fn new(store: Arc<dyn ChildStore>, policy: RestrictionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RestrictionPolicy {
        &self.policy
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<ChildAccount>, ServiceError> {
        self.store.find_by_email(email).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ChildAccount>, ServiceError> {
        self.store.find_by_id(id).await
    }

    pub async fn require_by_email(&self, email: &str) -> Result<ChildAccount, ServiceError> {
        self.find_by_email(email)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    pub async fn create(&self, mut account: ChildAccount) -> Result<ChildAccount, ServiceError> {
        account.enforce_access_restrictions(&self.policy);
        self.store.insert(&account).await?;
        Ok(account)
    }

    /// Persist `account` if nobody else wrote it since it was read.
    ///
    /// The version read from the store is taken from `account.version` and
    /// bumped on success.
    pub async fn save(&self, account: &mut ChildAccount) -> Result<(), ServiceError> {
        let expected = account.version;
        account.enforce_access_restrictions(&self.policy);
        account.version = expected + 1;

        if let Err(e) = self.store.replace_if_version(account, expected).await {
            account.version = expected;
            return Err(e);
        }
        Ok(())
    }

    pub async fn delete(&self, account: &ChildAccount) -> Result<(), ServiceError> {
        self.store
            .delete_if_version(&account.id, account.version)
            .await
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.store.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessRestrictions;
    use crate::services::store::InMemoryStore;

    fn repo() -> AccountRepository {
        AccountRepository::new(Arc::new(InMemoryStore::new()), RestrictionPolicy::default())
    }

    #[tokio::test]
    async fn test_save_rederives_restrictions_after_age_change() {
        let repo = repo();
        let mut child = repo
            .create(ChildAccount::new(
                "c@t.com".to_string(),
                25,
                false,
                &RestrictionPolicy::default(),
            ))
            .await
            .unwrap();
        assert!(child.access_restrictions.betting_allowed);

        child.age = 12;
        repo.save(&mut child).await.unwrap();

        let stored = repo.require_by_email("c@t.com").await.unwrap();
        assert!(stored.is_minor);
        assert!(!stored.access_restrictions.betting_allowed);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_save_cannot_persist_manual_unlock_for_minor() {
        let repo = repo();
        let mut child = repo
            .create(ChildAccount::new(
                "c@t.com".to_string(),
                10,
                false,
                &RestrictionPolicy::default(),
            ))
            .await
            .unwrap();

        child.access_restrictions = AccessRestrictions::unrestricted();
        repo.save(&mut child).await.unwrap();

        let stored = repo.require_by_email("c@t.com").await.unwrap();
        assert!(!stored.access_restrictions.payments_allowed);
    }

    #[tokio::test]
    async fn test_concurrent_writers_one_loses() {
        let repo = repo();
        let child = repo
            .create(ChildAccount::new(
                "c@t.com".to_string(),
                10,
                false,
                &RestrictionPolicy::default(),
            ))
            .await
            .unwrap();

        let mut first = child.clone();
        let mut second = child;
        repo.save(&mut first).await.unwrap();

        let err = repo.save(&mut second).await.unwrap_err();
        assert!(matches!(err, ServiceError::VersionConflict));
        assert_eq!(second.version, 0);
    }
}
