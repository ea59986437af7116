use async_trait::async_trait;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::error::ServiceError;
use super::security_audit::SecurityAuditLog;
use super::store::{ChildStore, ComplianceLog};
use crate::models::{ChildAccount, DeletionLog, DeletionStatus};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for consent-service");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();

        self.child_accounts()
            .create_index(email_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create email index on child_accounts collection: {}",
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on child_accounts.email");

        let deletion_index = IndexModel::builder()
            .keys(doc! { "childEmail": 1, "deletedAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("deletion_lookup".to_string())
                    .build(),
            )
            .build();

        self.deletion_logs()
            .create_index(deletion_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create index on deletion_logs collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created index on deletion_logs.(childEmail, deletedAt)");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn child_accounts(&self) -> Collection<ChildAccount> {
        self.db.collection("child_accounts")
    }

    pub fn deletion_logs(&self) -> Collection<DeletionLog> {
        self.db.collection("deletion_logs")
    }

    pub fn security_audit_logs(&self) -> Collection<SecurityAuditLog> {
        self.db.collection("security_audit_logs")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl ChildStore for MongoDb {
    async fn find_by_email(&self, email: &str) -> Result<Option<ChildAccount>, ServiceError> {
        Ok(self
            .child_accounts()
            .find_one(doc! { "email": email }, None)
            .await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ChildAccount>, ServiceError> {
        Ok(self
            .child_accounts()
            .find_one(doc! { "_id": id }, None)
            .await?)
    }

    async fn insert(&self, account: &ChildAccount) -> Result<(), ServiceError> {
        match self.child_accounts().insert_one(account, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::EmailAlreadyRegistered),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace_if_version(
        &self,
        account: &ChildAccount,
        expected_version: i64,
    ) -> Result<(), ServiceError> {
        let result = self
            .child_accounts()
            .replace_one(
                doc! { "_id": &account.id, "version": expected_version },
                account,
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ServiceError::VersionConflict);
        }
        Ok(())
    }

    async fn delete_if_version(&self, id: &str, expected_version: i64) -> Result<(), ServiceError> {
        let result = self
            .child_accounts()
            .delete_one(doc! { "_id": id, "version": expected_version }, None)
            .await?;

        if result.deleted_count == 0 {
            return Err(ServiceError::VersionConflict);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ComplianceLog for MongoDb {
    async fn record_deletion(&self, log: &DeletionLog) -> Result<(), ServiceError> {
        self.deletion_logs().insert_one(log, None).await?;
        Ok(())
    }

    async fn settle_deletion(&self, id: &str, status: DeletionStatus) -> Result<(), ServiceError> {
        let result = self
            .deletion_logs()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str() } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "deletion log {} not found",
                id
            )));
        }
        Ok(())
    }

    async fn record_security_event(&self, log: &SecurityAuditLog) -> Result<(), ServiceError> {
        self.security_audit_logs().insert_one(log, None).await?;
        Ok(())
    }
}
