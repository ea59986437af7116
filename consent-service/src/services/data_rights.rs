//! Export, erasure and rectification of a child's data on the parent's request.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::email::ConsentMailer;
use super::error::ServiceError;
use super::guardian::{code_matches, generate_deletion_code, hash_code, parent_matches};
use super::metrics::record_data_rights_operation;
use super::repository::AccountRepository;
use super::security_audit::{SecurityAuditLog, SecurityAuditService, SecurityEventType};
use super::store::ComplianceLog;
use crate::config::DataRightsConfig;
use crate::dtos::data_rights::{ConsentExport, ConsentSummary, DataExport, PersonalInfo};
use crate::models::{
    CallerContext, ChildAccount, ConfirmationMethod, DeletionCode, DeletionLog, DeletionStatus,
    Preferences,
};

/// Wrong confirmation codes tolerated before an issued code is discarded.
pub const MAX_DELETION_CODE_ATTEMPTS: u32 = 5;

/// Account fields a parent may correct.
pub const RECTIFIABLE_FIELDS: [&str; 2] = ["username", "preferences"];

#[derive(Clone)]
pub struct DataRightsService {
    accounts: AccountRepository,
    compliance: Arc<dyn ComplianceLog>,
    mailer: Arc<dyn ConsentMailer>,
    audit: SecurityAuditService,
    config: DataRightsConfig,
}

impl DataRightsService {
    pub fn new(
        accounts: AccountRepository,
        compliance: Arc<dyn ComplianceLog>,
        mailer: Arc<dyn ConsentMailer>,
        audit: SecurityAuditService,
        config: DataRightsConfig,
    ) -> Self {
        Self {
            accounts,
            compliance,
            mailer,
            audit,
            config,
        }
    }

    /// Load the child and check the caller is the parent on record.
    async fn authorize(
        &self,
        child_email: &str,
        parent_email: &str,
        caller: &CallerContext,
    ) -> Result<ChildAccount, ServiceError> {
        let account = self.accounts.require_by_email(child_email).await?;

        if !parent_matches(account.stored_parent_email(), parent_email) {
            self.audit
                .log(SecurityAuditLog::parent_email_mismatch(caller, child_email))
                .await;
            return Err(ServiceError::ParentEmailMismatch);
        }

        Ok(account)
    }

    pub async fn export_data(
        &self,
        child_email: &str,
        parent_email: &str,
        caller: &CallerContext,
    ) -> Result<DataExport, ServiceError> {
        let account = self.authorize(child_email, parent_email, caller).await?;

        record_data_rights_operation("export");
        tracing::info!(child_id = %account.id, "Child data exported");

        Ok(DataExport {
            personal_info: PersonalInfo {
                username: account.username,
                email: account.email,
                age: account.age,
                created_at: account.created_at,
                last_active: account.last_active,
            },
            consent: account.coppa_consent.as_ref().map(ConsentSummary::from),
            preferences: account.preferences,
            access_restrictions: account.access_restrictions,
            exported_at: Utc::now(),
            export_format: "JSON",
        })
    }

    pub async fn export_consent(
        &self,
        child_email: &str,
        parent_email: &str,
        caller: &CallerContext,
    ) -> Result<ConsentExport, ServiceError> {
        let account = self.authorize(child_email, parent_email, caller).await?;

        record_data_rights_operation("export_consent");

        Ok(ConsentExport {
            child_email: account.email,
            consent: account.coppa_consent,
            exported_at: Utc::now(),
            export_format: "JSON",
        })
    }

    /// Issue a one-time deletion code to the parent. Only its hash is stored
    /// and a new code replaces any earlier one.
    pub async fn issue_deletion_code(
        &self,
        child_email: &str,
        parent_email: &str,
        caller: &CallerContext,
    ) -> Result<DateTime<Utc>, ServiceError> {
        let mut account = self.authorize(child_email, parent_email, caller).await?;

        let code = generate_deletion_code();
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::minutes(self.config.deletion_code_ttl_minutes);
        account.deletion_code = Some(DeletionCode {
            code_hash: hash_code(&code),
            issued_at,
            expires_at,
            failed_attempts: 0,
        });
        self.accounts.save(&mut account).await?;

        record_data_rights_operation("deletion_code");
        tracing::info!(child_id = %account.id, "Deletion code issued");

        if let Err(e) = self
            .mailer
            .send_deletion_code(
                parent_email,
                child_email,
                &code,
                self.config.deletion_code_ttl_minutes,
            )
            .await
        {
            tracing::warn!(error = %e, "Deletion code email could not be sent");
        }

        Ok(expires_at)
    }

    /// Permanently erase the child's account.
    ///
    /// The deletion log is written `pending` before the account is removed
    /// and settled afterwards, so only a `completed` log attests an erasure.
    /// The confirmation code never appears in it.
    pub async fn delete_data(
        &self,
        child_email: &str,
        parent_email: &str,
        confirmation_code: &str,
        caller: &CallerContext,
    ) -> Result<DeletionLog, ServiceError> {
        let mut account = self.authorize(child_email, parent_email, caller).await?;

        let method = self
            .check_confirmation(&mut account, confirmation_code, caller)
            .await?;

        let mut log = DeletionLog::new(
            &account.id,
            &account.email,
            parent_email,
            &caller.ip_address,
            method,
        );
        self.compliance.record_deletion(&log).await?;

        if let Err(e) = self.accounts.delete(&account).await {
            tracing::error!(
                error = %e,
                child_id = %account.id,
                deletion_log_id = %log.id,
                "Account removal failed after deletion log was written"
            );
            if let Err(settle_err) = self
                .compliance
                .settle_deletion(&log.id, DeletionStatus::Failed)
                .await
            {
                tracing::error!(
                    error = %settle_err,
                    deletion_log_id = %log.id,
                    "Failed to mark deletion log as failed"
                );
            }
            return Err(e);
        }

        // The account is gone; a settle failure must not report the erasure as failed.
        if let Err(e) = self
            .compliance
            .settle_deletion(&log.id, DeletionStatus::Completed)
            .await
        {
            tracing::error!(
                error = %e,
                deletion_log_id = %log.id,
                "Account removed but deletion log is still pending"
            );
        }
        log.status = DeletionStatus::Completed;

        record_data_rights_operation("delete");
        tracing::info!(
            child_id = %account.id,
            confirmation_method = ?method,
            "Child data deleted"
        );

        Ok(log)
    }

    /// Check the supplied code against the issued one.
    ///
    /// Every wrong guess is counted on the account. After
    /// `MAX_DELETION_CODE_ATTEMPTS` the code is discarded and a new one must
    /// be issued.
    async fn check_confirmation(
        &self,
        account: &mut ChildAccount,
        supplied: &str,
        caller: &CallerContext,
    ) -> Result<ConfirmationMethod, ServiceError> {
        if supplied.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "confirmationCode is required".to_string(),
            ));
        }

        if !self.config.require_issued_deletion_code {
            return Ok(ConfirmationMethod::PresenceOnly);
        }

        let valid = match &account.deletion_code {
            Some(issued) => {
                issued.expires_at > Utc::now()
                    && issued.failed_attempts < MAX_DELETION_CODE_ATTEMPTS
                    && code_matches(&issued.code_hash, supplied)
            }
            None => false,
        };

        if valid {
            return Ok(ConfirmationMethod::IssuedCode);
        }

        self.audit
            .log(SecurityAuditLog::new(
                SecurityEventType::InvalidDeletionCode,
                caller,
                Some(&account.email),
                "Deletion confirmation code missing, wrong or expired",
            ))
            .await;

        if let Some(issued) = account.deletion_code.as_mut() {
            issued.failed_attempts += 1;
            if issued.failed_attempts >= MAX_DELETION_CODE_ATTEMPTS
                || issued.expires_at <= Utc::now()
            {
                tracing::warn!(
                    child_id = %account.id,
                    attempts = issued.failed_attempts,
                    "Deletion code discarded"
                );
                account.deletion_code = None;
            }
            // Fail closed: a lost write surfaces instead of an uncounted guess.
            self.accounts.save(account).await?;
        }

        Err(ServiceError::InvalidConfirmationCode)
    }

    /// Apply allowlisted corrections. Unknown keys are dropped; a known key
    /// with a malformed value fails the whole request.
    pub async fn rectify_data(
        &self,
        child_email: &str,
        parent_email: &str,
        updates: &Map<String, Value>,
        caller: &CallerContext,
    ) -> Result<Vec<String>, ServiceError> {
        let mut account = self.authorize(child_email, parent_email, caller).await?;
        let mut updated_fields = Vec::new();

        if let Some(value) = updates.get("username") {
            account.username = Some(parse_username(value)?);
            updated_fields.push("username".to_string());
        }

        if let Some(value) = updates.get("preferences") {
            account.preferences = merge_preferences(&account.preferences, value)?;
            updated_fields.push("preferences".to_string());
        }

        let ignored: Vec<&str> = updates
            .keys()
            .map(String::as_str)
            .filter(|k| !RECTIFIABLE_FIELDS.contains(k))
            .collect();
        if !ignored.is_empty() {
            tracing::debug!(ignored = ?ignored, "Dropped non-rectifiable fields");
        }

        if !updated_fields.is_empty() {
            account.last_active = Utc::now();
            self.accounts.save(&mut account).await?;
        }

        record_data_rights_operation("rectify");
        tracing::info!(child_id = %account.id, fields = ?updated_fields, "Child data rectified");

        Ok(updated_fields)
    }
}

fn parse_username(value: &Value) -> Result<String, ServiceError> {
    match value.as_str().map(str::trim) {
        Some(name) if !name.is_empty() && name.chars().count() <= 50 => Ok(name.to_string()),
        _ => Err(ServiceError::ValidationError(
            "username must be a non-empty string of at most 50 characters".to_string(),
        )),
    }
}

/// Overlay the supplied preference keys on the current preferences.
fn merge_preferences(current: &Preferences, supplied: &Value) -> Result<Preferences, ServiceError> {
    let supplied = supplied.as_object().ok_or_else(|| {
        ServiceError::ValidationError("preferences must be an object".to_string())
    })?;

    let mut merged = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => return Err(ServiceError::Internal(e.into())),
    };
    for (key, value) in supplied {
        merged.insert(key.clone(), value.clone());
    }

    serde_json::from_value(Value::Object(merged))
        .map_err(|e| ServiceError::ValidationError(format!("Invalid preferences: {}", e)))
}
